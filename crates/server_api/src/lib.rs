use shared::{
    domain::{Book, BookId, BookPatch, MAX_TITLE_CHARS},
    error::{ApiError, ErrorCode},
    protocol::{BookListQuery, CreateBookRequest},
};
use storage::Storage;
use tracing::info;

#[derive(Clone)]
pub struct ApiContext {
    pub storage: Storage,
}

pub async fn list_books(ctx: &ApiContext, query: &BookListQuery) -> Result<Vec<Book>, ApiError> {
    ctx.storage
        .list_books(query.filter())
        .await
        .map_err(internal)
}

pub async fn get_book(ctx: &ApiContext, book_id: BookId) -> Result<Book, ApiError> {
    ctx.storage
        .get_book(book_id)
        .await
        .map_err(internal)?
        .ok_or_else(|| book_not_found(book_id))
}

pub async fn create_book(ctx: &ApiContext, request: CreateBookRequest) -> Result<Book, ApiError> {
    let title = validate_title(&request.title)?;
    validate_stock(request.stock)?;
    let book = ctx
        .storage
        .create_book(&title, request.stock)
        .await
        .map_err(internal)?;
    info!(book_id = book.id.0, "books: created");
    Ok(book)
}

pub async fn update_book(
    ctx: &ApiContext,
    book_id: BookId,
    mut patch: BookPatch,
) -> Result<Book, ApiError> {
    if let Some(title) = patch.title.take() {
        patch.title = Some(validate_title(&title)?);
    }
    if let Some(stock) = patch.stock {
        validate_stock(stock)?;
    }
    let book = ctx
        .storage
        .update_book(book_id, &patch)
        .await
        .map_err(internal)?
        .ok_or_else(|| book_not_found(book_id))?;
    info!(book_id = book_id.0, "books: updated");
    Ok(book)
}

pub async fn delete_book(ctx: &ApiContext, book_id: BookId) -> Result<(), ApiError> {
    let removed = ctx
        .storage
        .delete_book(book_id)
        .await
        .map_err(internal)?;
    if !removed {
        return Err(book_not_found(book_id));
    }
    info!(book_id = book_id.0, "books: deleted");
    Ok(())
}

fn validate_title(raw: &str) -> Result<String, ApiError> {
    let title = raw.trim();
    if title.is_empty() {
        return Err(ApiError::validation("title must not be empty"));
    }
    if title.chars().count() > MAX_TITLE_CHARS {
        return Err(ApiError::validation(format!(
            "title must be at most {MAX_TITLE_CHARS} characters"
        )));
    }
    Ok(title.to_string())
}

fn validate_stock(stock: i64) -> Result<(), ApiError> {
    if stock < 0 {
        return Err(ApiError::validation("stock must not be negative"));
    }
    Ok(())
}

fn book_not_found(book_id: BookId) -> ApiError {
    ApiError::not_found(format!("book {} not found", book_id.0))
}

fn internal(err: anyhow::Error) -> ApiError {
    ApiError::new(ErrorCode::Internal, err.to_string())
}
