use std::{collections::HashMap, fs};

use client_core::{ControllerSettings, Messages, UpdateConfirmation, DEFAULT_SAVE_TIMEOUT};
use tracing::warn;

const SETTINGS_FILE: &str = "browser.toml";

#[derive(Debug)]
pub struct Settings {
    pub server_url: String,
    /// `0` waits for confirmations without bound.
    pub save_timeout_secs: u64,
    pub update_confirmation: UpdateConfirmation,
    pub messages: Messages,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_url: "http://127.0.0.1:4004".into(),
            save_timeout_secs: DEFAULT_SAVE_TIMEOUT.as_secs(),
            update_confirmation: UpdateConfirmation::default(),
            messages: Messages::default(),
        }
    }
}

impl Settings {
    pub fn controller_settings(&self) -> ControllerSettings {
        ControllerSettings {
            messages: self.messages.clone(),
            ..ControllerSettings::default()
        }
        .with_save_timeout_secs(self.save_timeout_secs)
        .with_update_confirmation(self.update_confirmation)
    }
}

pub fn load_settings() -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string(SETTINGS_FILE) {
        match toml::from_str::<HashMap<String, toml::Value>>(&raw) {
            Ok(file_cfg) => apply_file_settings(&mut settings, &file_cfg),
            Err(error) => warn!(%error, file = SETTINGS_FILE, "config: ignoring unreadable settings file"),
        }
    }

    apply_env_settings(&mut settings, |key| std::env::var(key).ok());
    settings
}

fn apply_file_settings(settings: &mut Settings, file_cfg: &HashMap<String, toml::Value>) {
    if let Some(v) = file_cfg.get("server_url").and_then(toml::Value::as_str) {
        settings.server_url = v.to_string();
    }
    if let Some(v) = file_cfg.get("save_timeout_secs").and_then(toml::Value::as_integer) {
        if let Ok(v) = u64::try_from(v) {
            settings.save_timeout_secs = v;
        }
    }
    if let Some(v) = file_cfg.get("update_confirmation").and_then(toml::Value::as_str) {
        match v.parse() {
            Ok(policy) => settings.update_confirmation = policy,
            Err(error) => warn!(%error, "config: keeping default update confirmation"),
        }
    }
    if let Some(v) = file_cfg.get("messages") {
        match v.clone().try_into::<Messages>() {
            Ok(messages) => settings.messages = messages,
            Err(error) => warn!(%error, "config: ignoring malformed [messages] table"),
        }
    }
}

fn apply_env_settings(settings: &mut Settings, env: impl Fn(&str) -> Option<String>) {
    if let Some(v) = env("BOOKS_SERVER_URL") {
        settings.server_url = v;
    }
    if let Some(v) = env("APP__SERVER_URL") {
        settings.server_url = v;
    }

    if let Some(v) = env("APP__SAVE_TIMEOUT_SECS") {
        if let Ok(parsed) = v.parse::<u64>() {
            settings.save_timeout_secs = parsed;
        }
    }

    if let Some(v) = env("APP__UPDATE_CONFIRMATION") {
        match v.parse() {
            Ok(policy) => settings.update_confirmation = policy,
            Err(error) => warn!(%error, "config: keeping update confirmation from file"),
        }
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
