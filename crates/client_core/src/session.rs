use crate::{collection::WorkingBook, error::SessionError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DialogState {
    #[default]
    Closed,
    OpenIdle,
    OpenBusy,
}

#[derive(Debug, Clone, Default)]
pub struct EditSession {
    working: Option<WorkingBook>,
    dialog: DialogState,
}

impl EditSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn working(&self) -> Option<&WorkingBook> {
        self.working.as_ref()
    }

    pub fn dialog_state(&self) -> DialogState {
        self.dialog
    }

    pub fn is_active(&self) -> bool {
        self.working.is_some()
    }

    pub fn ensure_vacant(&self) -> Result<(), SessionError> {
        if self.is_active() {
            return Err(SessionError::EditInProgress);
        }
        Ok(())
    }

    pub fn open(&mut self, working: WorkingBook) -> Result<(), SessionError> {
        self.ensure_vacant()?;
        self.working = Some(working);
        self.dialog = DialogState::OpenIdle;
        Ok(())
    }

    pub fn editable(&self) -> Result<WorkingBook, SessionError> {
        match (self.working, self.dialog) {
            (Some(_), DialogState::OpenBusy) => Err(SessionError::Busy),
            (Some(working), DialogState::OpenIdle) => Ok(working),
            _ => Err(SessionError::NoActiveSession),
        }
    }

    pub fn begin_save(&mut self) -> Result<WorkingBook, SessionError> {
        let working = self.editable()?;
        self.dialog = DialogState::OpenBusy;
        Ok(working)
    }

    pub fn save_failed(&mut self) {
        if self.dialog == DialogState::OpenBusy {
            self.dialog = DialogState::OpenIdle;
        }
    }

    pub fn close(&mut self) -> Option<WorkingBook> {
        self.dialog = DialogState::Closed;
        self.working.take()
    }
}
