use async_trait::async_trait;
use shared::domain::{Book, BookDraft, BookId, BookPatch};

use crate::error::CollectionError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContextId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkingBook {
    Transient(ContextId),
    Persisted { context: ContextId, book_id: BookId },
}

impl WorkingBook {
    pub fn context(&self) -> ContextId {
        match self {
            Self::Transient(context) => *context,
            Self::Persisted { context, .. } => *context,
        }
    }

    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient(_))
    }

    pub fn book_id(&self) -> Option<BookId> {
        match self {
            Self::Transient(_) => None,
            Self::Persisted { book_id, .. } => Some(*book_id),
        }
    }
}

#[async_trait]
pub trait BookCollection: Send + Sync {
    async fn list(&self, filter: Option<&str>) -> Result<Vec<Book>, CollectionError>;

    async fn create_transient(&self, defaults: BookDraft) -> WorkingBook;

    async fn bind(&self, book: &Book) -> WorkingBook;

    async fn values(&self, working: &WorkingBook) -> Result<BookDraft, CollectionError>;

    async fn stage(&self, working: &WorkingBook, patch: BookPatch) -> Result<(), CollectionError>;

    async fn await_created(&self, working: &WorkingBook) -> Result<Book, CollectionError>;

    async fn submit_changes(&self, working: &WorkingBook) -> Result<Book, CollectionError>;

    async fn delete(&self, book: &Book) -> Result<(), CollectionError>;

    async fn discard_transient(&self, working: &WorkingBook);

    async fn discard_staged_edits(&self, working: &WorkingBook);
}
