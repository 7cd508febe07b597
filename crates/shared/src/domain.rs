use serde::{Deserialize, Serialize};

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(pub i64);
    };
}

id_newtype!(BookId);

pub const MAX_TITLE_CHARS: usize = 111;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub id: BookId,
    pub title: String,
    pub stock: i64,
}

/// Editable values of a book that may not exist in the store yet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookDraft {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<BookId>,
    pub title: String,
    #[serde(default)]
    pub stock: i64,
}

impl BookDraft {
    pub fn apply(&mut self, patch: &BookPatch) {
        if let Some(title) = &patch.title {
            self.title = title.clone();
        }
        if let Some(stock) = patch.stock {
            self.stock = stock;
        }
    }
}

impl From<&Book> for BookDraft {
    fn from(book: &Book) -> Self {
        Self {
            id: Some(book.id),
            title: book.title.clone(),
            stock: book.stock,
        }
    }
}

/// Field edits staged against a book. Absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stock: Option<i64>,
}

impl BookPatch {
    pub fn title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            stock: None,
        }
    }

    pub fn stock(stock: i64) -> Self {
        Self {
            title: None,
            stock: Some(stock),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.stock.is_none()
    }

    /// Folds `later` on top of `self`; fields set in `later` win.
    pub fn merge(&mut self, later: BookPatch) {
        if later.title.is_some() {
            self.title = later.title;
        }
        if later.stock.is_some() {
            self.stock = later.stock;
        }
    }
}
