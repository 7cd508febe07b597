use serde::{Deserialize, Serialize};

use crate::domain::{BookDraft, BookPatch};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BookListQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
}

impl BookListQuery {
    /// Blank search text means "no filter".
    pub fn filter(&self) -> Option<&str> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|needle| !needle.is_empty())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateBookRequest {
    pub title: String,
    #[serde(default)]
    pub stock: i64,
}

impl From<&BookDraft> for CreateBookRequest {
    fn from(draft: &BookDraft) -> Self {
        Self {
            title: draft.title.clone(),
            stock: draft.stock,
        }
    }
}

pub type UpdateBookRequest = BookPatch;

pub fn books_route() -> &'static str {
    "/books"
}

pub fn book_route(book_id: i64) -> String {
    format!("/books/{book_id}")
}
