use std::{net::SocketAddr, sync::Arc};

use axum::{
    extract::State,
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use server_api::{create_book, delete_book, get_book, list_books, update_book, ApiContext};
use shared::{
    domain::{Book, BookId},
    error::{ApiError, ErrorCode},
    protocol::{BookListQuery, CreateBookRequest, UpdateBookRequest},
};
use storage::Storage;
use tower_http::limit::RequestBodyLimitLayer;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

mod app_state;
mod config;
mod extract;

use app_state::AppState;
use config::{load_settings, prepare_database_url};
use extract::{api_error_body, ApiJson, ApiPath, ApiQuery};

type ApiResult<T> = Result<T, (StatusCode, Json<ApiError>)>;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let settings = load_settings();
    let database_url = prepare_database_url(&settings.database_url)?;
    let storage = Storage::new(&database_url).await.map_err(|error| {
        error!(
            %database_url,
            %error,
            "failed to open SQLite database; verify parent directory exists and permissions are correct"
        );
        error
    })?;

    let state = AppState {
        api: ApiContext { storage },
    };
    let app = build_router(Arc::new(state), settings.max_body_bytes);

    let addr: SocketAddr = settings.server_bind.parse()?;
    info!(%addr, "server listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_router(state: Arc<AppState>, max_body_bytes: usize) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/books", get(http_list_books).post(http_create_book))
        .route(
            "/books/:book_id",
            get(http_get_book)
                .patch(http_update_book)
                .delete(http_delete_book),
        )
        .fallback(unknown_route)
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(middleware::map_response(api_error_body))
        .with_state(state)
}

async fn unknown_route() -> (StatusCode, Json<ApiError>) {
    (StatusCode::NOT_FOUND, Json(ApiError::not_found("no such route")))
}

async fn healthz(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.api.storage.health_check().await {
        Ok(()) => (StatusCode::OK, "ok"),
        Err(error) => {
            error!(%error, "healthz: storage unavailable");
            (StatusCode::SERVICE_UNAVAILABLE, "storage unavailable")
        }
    }
}

async fn http_list_books(
    State(state): State<Arc<AppState>>,
    ApiQuery(q): ApiQuery<BookListQuery>,
) -> ApiResult<Json<Vec<Book>>> {
    let books = list_books(&state.api, &q).await.map_err(api_failure)?;
    Ok(Json(books))
}

async fn http_get_book(
    State(state): State<Arc<AppState>>,
    ApiPath(book_id): ApiPath<i64>,
) -> ApiResult<Json<Book>> {
    let book = get_book(&state.api, BookId(book_id))
        .await
        .map_err(api_failure)?;
    Ok(Json(book))
}

async fn http_create_book(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<CreateBookRequest>,
) -> ApiResult<(StatusCode, Json<Book>)> {
    let book = create_book(&state.api, req).await.map_err(api_failure)?;
    Ok((StatusCode::CREATED, Json(book)))
}

async fn http_update_book(
    State(state): State<Arc<AppState>>,
    ApiPath(book_id): ApiPath<i64>,
    ApiJson(req): ApiJson<UpdateBookRequest>,
) -> ApiResult<Json<Book>> {
    let book = update_book(&state.api, BookId(book_id), req)
        .await
        .map_err(api_failure)?;
    Ok(Json(book))
}

async fn http_delete_book(
    State(state): State<Arc<AppState>>,
    ApiPath(book_id): ApiPath<i64>,
) -> ApiResult<StatusCode> {
    delete_book(&state.api, BookId(book_id))
        .await
        .map_err(api_failure)?;
    Ok(StatusCode::NO_CONTENT)
}

fn api_failure(error: ApiError) -> (StatusCode, Json<ApiError>) {
    let status = match error.code {
        ErrorCode::Validation => StatusCode::BAD_REQUEST,
        ErrorCode::NotFound => StatusCode::NOT_FOUND,
        ErrorCode::Internal => {
            error!(message = %error.message, "api: internal failure");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (status, Json(error))
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
