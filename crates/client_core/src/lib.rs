pub mod browser;
pub mod collection;
pub mod config;
pub mod controller;
pub mod error;
pub mod http_collection;
pub mod messages;
pub mod session;

pub use browser::BookBrowser;
pub use collection::{BookCollection, ContextId, WorkingBook};
pub use config::{ControllerSettings, UpdateConfirmation, DEFAULT_SAVE_TIMEOUT};
pub use controller::{
    ConfirmationPrompt, ControllerDeps, DeleteOutcome, DialogSurface, EditSessionController,
    NotificationSink, PromptAnswer, SaveOutcome,
};
pub use error::{CollectionError, SaveFailure, SessionError};
pub use http_collection::HttpBookCollection;
pub use messages::Messages;
pub use session::{DialogState, EditSession};

#[cfg(test)]
#[path = "tests/test_support.rs"]
mod test_support;
