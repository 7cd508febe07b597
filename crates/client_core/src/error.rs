use std::time::Duration;

use shared::error::ApiError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CollectionError {
    #[error("{}", .0.message)]
    Rejected(ApiError),
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("unexpected response from data service: {0}")]
    Protocol(String),
    #[error("binding context {0} is not tracked by this collection")]
    UnknownContext(u64),
    #[error("invalid server url '{0}'")]
    InvalidServerUrl(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("an edit is already in progress")]
    EditInProgress,
    #[error("no edit in progress")]
    NoActiveSession,
    #[error("the edit dialog is waiting for the data service")]
    Busy,
    #[error(transparent)]
    Collection(#[from] CollectionError),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SaveFailure {
    #[error(transparent)]
    Remote(#[from] CollectionError),
    #[error("no confirmation from the data service within {}s", .0.as_secs())]
    TimedOut(Duration),
}
