use std::{future::Future, sync::Arc};

use async_trait::async_trait;
use shared::domain::{Book, BookDraft, BookId, BookPatch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::{
    collection::{BookCollection, WorkingBook},
    config::{ControllerSettings, UpdateConfirmation},
    error::{CollectionError, SaveFailure, SessionError},
    session::{DialogState, EditSession},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptAnswer {
    Confirmed,
    Declined,
    Dismissed,
}

#[async_trait]
pub trait ConfirmationPrompt: Send + Sync {
    async fn confirm(&self, message: &str) -> PromptAnswer;
}

pub trait NotificationSink: Send + Sync {
    fn notify(&self, message: &str);
    fn notify_error(&self, message: &str);
}

pub trait DialogSurface: Send + Sync {
    fn open(&self, working: &WorkingBook);
    fn close(&self);
    fn set_busy(&self, busy: bool);
}

#[derive(Clone)]
pub struct ControllerDeps {
    pub collection: Arc<dyn BookCollection>,
    pub prompt: Arc<dyn ConfirmationPrompt>,
    pub notifier: Arc<dyn NotificationSink>,
    pub dialog: Arc<dyn DialogSurface>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    Created(Book),
    Updated(Book),
    UpdateQueued,
    Failed(SaveFailure),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    NoSelection,
    Declined,
    Deleted(BookId),
    Failed(CollectionError),
}

pub struct EditSessionController {
    deps: ControllerDeps,
    settings: ControllerSettings,
    session: EditSession,
    deferred_flushes: Vec<JoinHandle<()>>,
}

impl EditSessionController {
    pub fn new(deps: ControllerDeps, settings: ControllerSettings) -> Self {
        Self {
            deps,
            settings,
            session: EditSession::new(),
            deferred_flushes: Vec::new(),
        }
    }

    pub fn with_session(mut self, session: EditSession) -> Self {
        self.session = session;
        self
    }

    pub fn session(&self) -> &EditSession {
        &self.session
    }

    pub fn working(&self) -> Option<&WorkingBook> {
        self.session.working()
    }

    pub fn dialog_state(&self) -> DialogState {
        self.session.dialog_state()
    }

    pub fn settings(&self) -> &ControllerSettings {
        &self.settings
    }

    pub async fn working_values(&self) -> Result<Option<BookDraft>, SessionError> {
        let Some(working) = self.session.working() else {
            return Ok(None);
        };
        Ok(Some(self.deps.collection.values(working).await?))
    }

    pub async fn begin_create(&mut self) -> Result<WorkingBook, SessionError> {
        self.session.ensure_vacant()?;
        let working = self
            .deps
            .collection
            .create_transient(BookDraft::default())
            .await;
        self.session.open(working)?;
        self.deps.dialog.open(&working);
        debug!(context = working.context().0, "session: create started");
        Ok(working)
    }

    pub async fn begin_edit(
        &mut self,
        selected: Option<&Book>,
    ) -> Result<Option<WorkingBook>, SessionError> {
        let Some(book) = selected else {
            return Ok(None);
        };
        self.session.ensure_vacant()?;
        let working = self.deps.collection.bind(book).await;
        self.session.open(working)?;
        self.deps.dialog.open(&working);
        debug!(
            context = working.context().0,
            book_id = book.id.0,
            "session: edit started"
        );
        Ok(Some(working))
    }

    pub async fn stage_edit(&mut self, patch: BookPatch) -> Result<(), SessionError> {
        let working = self.session.editable()?;
        self.deps.collection.stage(&working, patch).await?;
        Ok(())
    }

    pub async fn save(&mut self) -> Result<SaveOutcome, SessionError> {
        let working = self.session.begin_save()?;
        self.deps.dialog.set_busy(true);

        if working.is_transient() {
            let confirmation = self.deps.collection.await_created(&working);
            return Ok(match self.await_confirmation(confirmation).await {
                Ok(book) => {
                    self.finish_session();
                    info!(book_id = book.id.0, "session: create confirmed");
                    self.deps
                        .notifier
                        .notify(&self.settings.messages.created(&book.title));
                    SaveOutcome::Created(book)
                }
                Err(failure) => {
                    self.reopen_after_failure(&failure);
                    self.deps
                        .notifier
                        .notify_error(&self.settings.messages.create_failed(&failure.to_string()));
                    SaveOutcome::Failed(failure)
                }
            });
        }

        match self.settings.update_confirmation {
            UpdateConfirmation::Awaited => {
                let confirmation = self.deps.collection.submit_changes(&working);
                Ok(match self.await_confirmation(confirmation).await {
                    Ok(book) => {
                        self.finish_session();
                        info!(book_id = book.id.0, "session: update confirmed");
                        self.deps
                            .notifier
                            .notify(&self.settings.messages.updated(&book.title));
                        SaveOutcome::Updated(book)
                    }
                    Err(failure) => {
                        self.reopen_after_failure(&failure);
                        self.deps.notifier.notify_error(
                            &self.settings.messages.update_failed(&failure.to_string()),
                        );
                        SaveOutcome::Failed(failure)
                    }
                })
            }
            UpdateConfirmation::Deferred => {
                let title = match self.deps.collection.values(&working).await {
                    Ok(values) => values.title,
                    Err(error) => {
                        self.session.save_failed();
                        self.deps.dialog.set_busy(false);
                        warn!(%error, "session: deferred update not queued; dialog stays open");
                        return Err(error.into());
                    }
                };
                self.finish_session();

                let collection = Arc::clone(&self.deps.collection);
                self.deferred_flushes.retain(|flush| !flush.is_finished());
                self.deferred_flushes.push(tokio::spawn(async move {
                    match collection.submit_changes(&working).await {
                        Ok(book) => debug!(book_id = book.id.0, "session: deferred update flushed"),
                        Err(error) => warn!(
                            book_id = working.book_id().map(|id| id.0),
                            %error,
                            "session: deferred update failed after the dialog closed"
                        ),
                    }
                }));

                self.deps
                    .notifier
                    .notify(&self.settings.messages.updated(&title));
                Ok(SaveOutcome::UpdateQueued)
            }
        }
    }

    pub async fn cancel(&mut self) -> Result<(), SessionError> {
        let working = self.session.editable()?;
        if working.is_transient() {
            self.deps.collection.discard_transient(&working).await;
        } else {
            self.deps.collection.discard_staged_edits(&working).await;
        }
        self.session.close();
        self.deps.dialog.close();
        debug!(context = working.context().0, "session: cancelled");
        Ok(())
    }

    pub async fn confirm_delete(
        &mut self,
        selected: Option<&Book>,
    ) -> Result<DeleteOutcome, SessionError> {
        let Some(book) = selected else {
            return Ok(DeleteOutcome::NoSelection);
        };
        self.session.ensure_vacant()?;

        let prompt = self.settings.messages.delete_prompt(&book.title);
        match self.deps.prompt.confirm(&prompt).await {
            PromptAnswer::Confirmed => {}
            PromptAnswer::Declined | PromptAnswer::Dismissed => {
                return Ok(DeleteOutcome::Declined);
            }
        }

        match self.deps.collection.delete(book).await {
            Ok(()) => {
                info!(book_id = book.id.0, "session: book deleted");
                self.deps
                    .notifier
                    .notify(&self.settings.messages.deleted(&book.title));
                Ok(DeleteOutcome::Deleted(book.id))
            }
            Err(error) => {
                warn!(book_id = book.id.0, %error, "session: delete failed");
                self.deps.notifier.notify_error(
                    &self
                        .settings
                        .messages
                        .delete_failed(&book.title, &error.to_string()),
                );
                Ok(DeleteOutcome::Failed(error))
            }
        }
    }

    /// Waits for background flushes started under
    /// [`UpdateConfirmation::Deferred`]. Their failures stay in the log.
    pub async fn settle_deferred_updates(&mut self) {
        for flush in self.deferred_flushes.drain(..) {
            if let Err(error) = flush.await {
                warn!(%error, "session: deferred update task did not finish");
            }
        }
    }

    async fn await_confirmation<F>(&self, confirmation: F) -> Result<Book, SaveFailure>
    where
        F: Future<Output = Result<Book, CollectionError>>,
    {
        match self.settings.save_timeout {
            Some(limit) => match tokio::time::timeout(limit, confirmation).await {
                Ok(result) => result.map_err(SaveFailure::Remote),
                Err(_) => Err(SaveFailure::TimedOut(limit)),
            },
            None => confirmation.await.map_err(SaveFailure::Remote),
        }
    }

    fn finish_session(&mut self) {
        self.session.close();
        self.deps.dialog.set_busy(false);
        self.deps.dialog.close();
    }

    fn reopen_after_failure(&mut self, failure: &SaveFailure) {
        self.session.save_failed();
        self.deps.dialog.set_busy(false);
        warn!(%failure, "session: save not confirmed; dialog stays open");
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
