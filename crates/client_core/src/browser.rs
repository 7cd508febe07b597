use std::sync::Arc;

use shared::{
    domain::{Book, BookId},
    protocol::BookListQuery,
};
use tracing::debug;

use crate::{collection::BookCollection, error::CollectionError};

pub struct BookBrowser {
    collection: Arc<dyn BookCollection>,
    query: BookListQuery,
    rows: Vec<Book>,
    selected: Option<BookId>,
}

impl BookBrowser {
    pub fn new(collection: Arc<dyn BookCollection>) -> Self {
        Self {
            collection,
            query: BookListQuery::default(),
            rows: Vec::new(),
            selected: None,
        }
    }

    pub async fn refresh(&mut self) -> Result<&[Book], CollectionError> {
        let rows = self.collection.list(self.query.filter()).await?;
        if let Some(selected) = self.selected {
            if !rows.iter().any(|book| book.id == selected) {
                self.selected = None;
            }
        }
        debug!(rows = rows.len(), filter = ?self.query.filter(), "browser: refreshed");
        self.rows = rows;
        Ok(&self.rows)
    }

    pub async fn search(&mut self, text: impl Into<String>) -> Result<&[Book], CollectionError> {
        self.query.search = Some(text.into());
        self.refresh().await
    }

    pub fn search_text(&self) -> &str {
        self.query.search.as_deref().unwrap_or_default()
    }

    pub fn rows(&self) -> &[Book] {
        &self.rows
    }

    pub fn select(&mut self, index: usize) -> Option<&Book> {
        let book = self.rows.get(index)?;
        self.selected = Some(book.id);
        Some(book)
    }

    pub fn select_book(&mut self, book_id: BookId) -> Option<&Book> {
        let book = self.rows.iter().find(|book| book.id == book_id)?;
        self.selected = Some(book.id);
        Some(book)
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    pub fn selected(&self) -> Option<&Book> {
        let selected = self.selected?;
        self.rows.iter().find(|book| book.id == selected)
    }
}
