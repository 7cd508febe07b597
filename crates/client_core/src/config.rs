use std::{str::FromStr, time::Duration};

use serde::Deserialize;

use crate::messages::Messages;

pub const DEFAULT_SAVE_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateConfirmation {
    #[default]
    Awaited,
    /// Close right away and flush in the background. Flush failures are only
    /// logged; the user is never told.
    Deferred,
}

impl FromStr for UpdateConfirmation {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "awaited" => Ok(Self::Awaited),
            "deferred" => Ok(Self::Deferred),
            other => Err(format!(
                "unknown update confirmation '{other}', expected 'awaited' or 'deferred'"
            )),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ControllerSettings {
    /// Upper bound for waiting on a save confirmation. `None` waits forever.
    pub save_timeout: Option<Duration>,
    pub update_confirmation: UpdateConfirmation,
    pub messages: Messages,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            save_timeout: Some(DEFAULT_SAVE_TIMEOUT),
            update_confirmation: UpdateConfirmation::default(),
            messages: Messages::default(),
        }
    }
}

impl ControllerSettings {
    pub fn with_save_timeout_secs(mut self, secs: u64) -> Self {
        self.save_timeout = (secs > 0).then(|| Duration::from_secs(secs));
        self
    }

    pub fn with_update_confirmation(mut self, policy: UpdateConfirmation) -> Self {
        self.update_confirmation = policy;
        self
    }
}
