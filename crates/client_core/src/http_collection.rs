use std::{
    collections::HashMap,
    sync::atomic::{AtomicU64, Ordering},
};

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use shared::{
    domain::{Book, BookDraft, BookPatch},
    error::ApiError,
    protocol::{book_route, books_route, CreateBookRequest},
};
use tokio::sync::Mutex;
use tracing::{debug, info};
use url::Url;

use crate::{
    collection::{BookCollection, ContextId, WorkingBook},
    error::CollectionError,
};

enum BoundBook {
    Transient(BookDraft),
    Persisted { original: Book, staged: BookPatch },
}

pub struct HttpBookCollection {
    http: Client,
    server_url: String,
    contexts: Mutex<HashMap<ContextId, BoundBook>>,
    next_context: AtomicU64,
}

impl HttpBookCollection {
    pub fn new(server_url: &str) -> Result<Self, CollectionError> {
        let parsed = Url::parse(server_url)
            .map_err(|_| CollectionError::InvalidServerUrl(server_url.to_string()))?;
        if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
            return Err(CollectionError::InvalidServerUrl(server_url.to_string()));
        }
        Ok(Self {
            http: Client::new(),
            server_url: server_url.trim_end_matches('/').to_string(),
            contexts: Mutex::new(HashMap::new()),
            next_context: AtomicU64::new(1),
        })
    }

    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    pub async fn pending_contexts(&self) -> usize {
        self.contexts.lock().await.len()
    }

    async fn track(&self, bound: BoundBook) -> ContextId {
        let context = ContextId(self.next_context.fetch_add(1, Ordering::Relaxed));
        self.contexts.lock().await.insert(context, bound);
        context
    }

    fn url(&self, route: &str) -> String {
        format!("{}{route}", self.server_url)
    }
}

#[async_trait]
impl BookCollection for HttpBookCollection {
    async fn list(&self, filter: Option<&str>) -> Result<Vec<Book>, CollectionError> {
        let mut request = self.http.get(self.url(books_route()));
        if let Some(needle) = filter {
            request = request.query(&[("search", needle)]);
        }
        let response = request.send().await.map_err(transport)?;
        decode(check_status(response).await?).await
    }

    async fn create_transient(&self, defaults: BookDraft) -> WorkingBook {
        WorkingBook::Transient(self.track(BoundBook::Transient(defaults)).await)
    }

    async fn bind(&self, book: &Book) -> WorkingBook {
        let context = self
            .track(BoundBook::Persisted {
                original: book.clone(),
                staged: BookPatch::default(),
            })
            .await;
        WorkingBook::Persisted {
            context,
            book_id: book.id,
        }
    }

    async fn values(&self, working: &WorkingBook) -> Result<BookDraft, CollectionError> {
        let contexts = self.contexts.lock().await;
        match contexts.get(&working.context()) {
            Some(BoundBook::Transient(draft)) => Ok(draft.clone()),
            Some(BoundBook::Persisted { original, staged }) => {
                let mut values = BookDraft::from(original);
                values.apply(staged);
                Ok(values)
            }
            None => Err(CollectionError::UnknownContext(working.context().0)),
        }
    }

    async fn stage(&self, working: &WorkingBook, patch: BookPatch) -> Result<(), CollectionError> {
        let mut contexts = self.contexts.lock().await;
        match contexts.get_mut(&working.context()) {
            Some(BoundBook::Transient(draft)) => draft.apply(&patch),
            Some(BoundBook::Persisted { staged, .. }) => staged.merge(patch),
            None => return Err(CollectionError::UnknownContext(working.context().0)),
        }
        Ok(())
    }

    async fn await_created(&self, working: &WorkingBook) -> Result<Book, CollectionError> {
        let request = match self.contexts.lock().await.get(&working.context()) {
            Some(BoundBook::Transient(draft)) => CreateBookRequest::from(draft),
            _ => return Err(CollectionError::UnknownContext(working.context().0)),
        };

        let response = self
            .http
            .post(self.url(books_route()))
            .json(&request)
            .send()
            .await
            .map_err(transport)?;
        let book: Book = decode(check_status(response).await?).await?;

        self.contexts.lock().await.remove(&working.context());
        info!(book_id = book.id.0, "books: create confirmed by server");
        Ok(book)
    }

    async fn submit_changes(&self, working: &WorkingBook) -> Result<Book, CollectionError> {
        let (original, staged) = match self.contexts.lock().await.get(&working.context()) {
            Some(BoundBook::Persisted { original, staged }) => (original.clone(), staged.clone()),
            _ => return Err(CollectionError::UnknownContext(working.context().0)),
        };

        if staged.is_empty() {
            self.contexts.lock().await.remove(&working.context());
            debug!(book_id = original.id.0, "books: nothing staged, skipping flush");
            return Ok(original);
        }

        let response = self
            .http
            .patch(self.url(&book_route(original.id.0)))
            .json(&staged)
            .send()
            .await
            .map_err(transport)?;
        let book: Book = decode(check_status(response).await?).await?;

        self.contexts.lock().await.remove(&working.context());
        info!(book_id = book.id.0, "books: update confirmed by server");
        Ok(book)
    }

    async fn delete(&self, book: &Book) -> Result<(), CollectionError> {
        let response = self
            .http
            .delete(self.url(&book_route(book.id.0)))
            .send()
            .await
            .map_err(transport)?;
        check_status(response).await?;
        info!(book_id = book.id.0, "books: delete confirmed by server");
        Ok(())
    }

    async fn discard_transient(&self, working: &WorkingBook) {
        if self.contexts.lock().await.remove(&working.context()).is_some() {
            debug!(context = working.context().0, "books: transient entry discarded");
        }
    }

    async fn discard_staged_edits(&self, working: &WorkingBook) {
        if self.contexts.lock().await.remove(&working.context()).is_some() {
            debug!(context = working.context().0, "books: staged edits discarded");
        }
    }
}

fn transport(error: reqwest::Error) -> CollectionError {
    CollectionError::Transport(error.to_string())
}

async fn check_status(response: Response) -> Result<Response, CollectionError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.map_err(transport)?;
    match serde_json::from_str::<ApiError>(&body) {
        Ok(error) => Err(CollectionError::Rejected(error)),
        Err(_) => Err(CollectionError::Protocol(format!("{status}: {body}"))),
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, CollectionError> {
    response
        .json()
        .await
        .map_err(|e| CollectionError::Protocol(e.to_string()))
}

#[cfg(test)]
#[path = "tests/http_collection_tests.rs"]
mod tests;
