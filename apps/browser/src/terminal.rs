//! Terminal implementations of the controller's collaborators.

use async_trait::async_trait;
use client_core::{
    ConfirmationPrompt, DialogSurface, NotificationSink, PromptAnswer, WorkingBook,
};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, warn};

/// Asks on stdout and reads the answer from stdin. End of input dismisses.
pub struct StdinPrompt {
    assume_yes: bool,
}

impl StdinPrompt {
    pub fn new(assume_yes: bool) -> Self {
        Self { assume_yes }
    }
}

#[async_trait]
impl ConfirmationPrompt for StdinPrompt {
    async fn confirm(&self, message: &str) -> PromptAnswer {
        if self.assume_yes {
            debug!(%message, "prompt: confirmed by --yes");
            return PromptAnswer::Confirmed;
        }

        let mut stdout = tokio::io::stdout();
        let question = format!("{message} [y/N] ");
        if let Err(error) = stdout.write_all(question.as_bytes()).await {
            warn!(%error, "prompt: could not write question");
            return PromptAnswer::Dismissed;
        }
        let _ = stdout.flush().await;

        let mut line = String::new();
        match BufReader::new(tokio::io::stdin()).read_line(&mut line).await {
            Ok(0) => PromptAnswer::Dismissed,
            Ok(_) => parse_answer(&line),
            Err(error) => {
                warn!(%error, "prompt: could not read answer");
                PromptAnswer::Dismissed
            }
        }
    }
}

fn parse_answer(line: &str) -> PromptAnswer {
    match line.trim().to_ascii_lowercase().as_str() {
        "y" | "yes" => PromptAnswer::Confirmed,
        _ => PromptAnswer::Declined,
    }
}

pub struct ConsoleNotifier;

impl NotificationSink for ConsoleNotifier {
    fn notify(&self, message: &str) {
        println!("{message}");
    }

    fn notify_error(&self, message: &str) {
        eprintln!("{message}");
    }
}

/// No form to render on a terminal; transitions only show up in the log.
pub struct LoggedDialog;

impl DialogSurface for LoggedDialog {
    fn open(&self, working: &WorkingBook) {
        debug!(
            context = working.context().0,
            transient = working.is_transient(),
            "dialog: opened"
        );
    }

    fn close(&self) {
        debug!("dialog: closed");
    }

    fn set_busy(&self, busy: bool) {
        debug!(busy, "dialog: busy state changed");
    }
}
