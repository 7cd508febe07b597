use std::sync::Mutex;

use super::*;
use async_trait::async_trait;
use axum::{body, body::Body, http::Request};
use client_core::{
    BookBrowser, ConfirmationPrompt, ControllerDeps, ControllerSettings, DeleteOutcome,
    DialogSurface, EditSessionController, HttpBookCollection, NotificationSink, PromptAnswer,
    SaveFailure, SaveOutcome, WorkingBook,
};
use shared::domain::BookPatch;
use tower::ServiceExt;

const TEST_BODY_LIMIT: usize = 1024;

async fn test_app() -> (Router, Storage) {
    let storage = Storage::new("sqlite::memory:").await.expect("db");
    let api = ApiContext {
        storage: storage.clone(),
    };
    let app = build_router(Arc::new(AppState { api }), TEST_BODY_LIMIT);
    (app, storage)
}

fn json_request(method: &str, uri: &str, json: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(json.to_string()))
        .expect("request")
}

async fn read_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    serde_json::from_slice(&bytes).expect("json")
}

#[tokio::test]
async fn healthz_reports_ok_when_storage_is_ready() {
    let (app, _storage) = test_app().await;
    let request = Request::get("/healthz")
        .body(Body::empty())
        .expect("request");
    let response = app.oneshot(request).await.expect("response");
    assert_eq!(response.status(), StatusCode::OK);

    let body = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    assert_eq!(body.as_ref(), b"ok");
}

#[tokio::test]
async fn create_then_list_and_search_books() {
    let (app, _storage) = test_app().await;

    for (title, stock) in [("Wuthering Heights", 12), ("Jane Eyre", 11), ("The Raven", 333)] {
        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/books",
                serde_json::json!({ "title": title, "stock": stock }),
            ))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let response = app
        .clone()
        .oneshot(Request::get("/books").body(Body::empty()).expect("request"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let books: Vec<Book> = read_json(response).await;
    assert_eq!(
        books.iter().map(|b| b.title.as_str()).collect::<Vec<_>>(),
        vec!["Wuthering Heights", "Jane Eyre", "The Raven"]
    );

    let response = app
        .oneshot(
            Request::get("/books?search=RAVEN")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    let books: Vec<Book> = read_json(response).await;
    assert_eq!(books.len(), 1);
    assert_eq!(books[0].stock, 333);
}

#[tokio::test]
async fn invalid_create_is_a_bad_request_with_api_error() {
    let (app, storage) = test_app().await;

    let response = app
        .oneshot(json_request(
            "POST",
            "/books",
            serde_json::json!({ "title": "   ", "stock": 1 }),
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let error: ApiError = read_json(response).await;
    assert_eq!(error.code, ErrorCode::Validation);
    assert_eq!(error.message, "title must not be empty");
    assert_eq!(storage.count_books().await.expect("count"), 0);
}

#[tokio::test]
async fn unknown_book_routes_answer_not_found() {
    let (app, _storage) = test_app().await;

    let get = app
        .clone()
        .oneshot(Request::get("/books/99").body(Body::empty()).expect("request"))
        .await
        .expect("response");
    assert_eq!(get.status(), StatusCode::NOT_FOUND);
    let error: ApiError = read_json(get).await;
    assert_eq!(error.code, ErrorCode::NotFound);

    let patch = app
        .clone()
        .oneshot(json_request(
            "PATCH",
            "/books/99",
            serde_json::json!({ "stock": 1 }),
        ))
        .await
        .expect("response");
    assert_eq!(patch.status(), StatusCode::NOT_FOUND);

    let delete = app
        .oneshot(
            Request::delete("/books/99")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(delete.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn patch_updates_only_given_fields_and_delete_removes() {
    let (app, storage) = test_app().await;
    let book = storage.create_book("Eleonora", 555).await.expect("book");
    let uri = format!("/books/{}", book.id.0);

    let response = app
        .clone()
        .oneshot(json_request(
            "PATCH",
            &uri,
            serde_json::json!({ "stock": 554 }),
        ))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let updated: Book = read_json(response).await;
    assert_eq!(updated.title, "Eleonora");
    assert_eq!(updated.stock, 554);

    let response = app
        .clone()
        .oneshot(Request::delete(uri.as_str()).body(Body::empty()).expect("request"))
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(storage.get_book(book.id).await.expect("get").is_none());
}

#[tokio::test]
async fn oversized_bodies_are_refused_with_api_error() {
    let (app, storage) = test_app().await;
    let title = "x".repeat(TEST_BODY_LIMIT * 2);

    let response = app
        .oneshot(json_request(
            "POST",
            "/books",
            serde_json::json!({ "title": title }),
        ))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    let error: ApiError = read_json(response).await;
    assert_eq!(error.code, ErrorCode::Validation);
    assert_eq!(storage.count_books().await.expect("count"), 0);
}

#[tokio::test]
async fn undecodable_bodies_answer_with_api_error() {
    let (app, storage) = test_app().await;

    let missing_title = app
        .clone()
        .oneshot(json_request(
            "POST",
            "/books",
            serde_json::json!({ "stock": 1 }),
        ))
        .await
        .expect("response");
    assert_eq!(missing_title.status(), StatusCode::BAD_REQUEST);
    let error: ApiError = read_json(missing_title).await;
    assert_eq!(error.code, ErrorCode::Validation);
    assert!(error.message.contains("title"), "{}", error.message);

    let malformed = Request::post("/books")
        .header("content-type", "application/json")
        .body(Body::from("{ not json"))
        .expect("request");
    let malformed = app.clone().oneshot(malformed).await.expect("response");
    assert_eq!(malformed.status(), StatusCode::BAD_REQUEST);
    let error: ApiError = read_json(malformed).await;
    assert_eq!(error.code, ErrorCode::Validation);

    let wrong_type = app
        .oneshot(json_request(
            "PATCH",
            "/books/1",
            serde_json::json!({ "stock": "many" }),
        ))
        .await
        .expect("response");
    assert_eq!(wrong_type.status(), StatusCode::BAD_REQUEST);
    let error: ApiError = read_json(wrong_type).await;
    assert_eq!(error.code, ErrorCode::Validation);
    assert_eq!(storage.count_books().await.expect("count"), 0);
}

#[tokio::test]
async fn non_numeric_book_id_answers_with_api_error() {
    let (app, _storage) = test_app().await;

    let response = app
        .oneshot(Request::get("/books/abc").body(Body::empty()).expect("request"))
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let error: ApiError = read_json(response).await;
    assert_eq!(error.code, ErrorCode::Validation);
    assert!(error.message.contains("abc"), "{}", error.message);
}

#[tokio::test]
async fn unknown_routes_and_methods_answer_with_api_error() {
    let (app, _storage) = test_app().await;

    let missing = app
        .clone()
        .oneshot(Request::get("/authors").body(Body::empty()).expect("request"))
        .await
        .expect("response");
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
    let error: ApiError = read_json(missing).await;
    assert_eq!(error.code, ErrorCode::NotFound);

    let wrong_method = app
        .oneshot(Request::put("/books").body(Body::empty()).expect("request"))
        .await
        .expect("response");
    assert_eq!(wrong_method.status(), StatusCode::METHOD_NOT_ALLOWED);
    let error: ApiError = read_json(wrong_method).await;
    assert_eq!(error.code, ErrorCode::Validation);
}

struct AnsweringPrompt(PromptAnswer);

#[async_trait]
impl ConfirmationPrompt for AnsweringPrompt {
    async fn confirm(&self, _message: &str) -> PromptAnswer {
        self.0
    }
}

#[derive(Default)]
struct CollectingNotifier {
    messages: Mutex<Vec<String>>,
}

impl CollectingNotifier {
    fn messages(&self) -> Vec<String> {
        self.messages.lock().expect("messages").clone()
    }
}

impl NotificationSink for CollectingNotifier {
    fn notify(&self, message: &str) {
        self.messages.lock().expect("messages").push(message.to_string());
    }

    fn notify_error(&self, message: &str) {
        self.messages
            .lock()
            .expect("messages")
            .push(format!("error: {message}"));
    }
}

struct HeadlessDialog;

impl DialogSurface for HeadlessDialog {
    fn open(&self, _working: &WorkingBook) {}
    fn close(&self) {}
    fn set_busy(&self, _busy: bool) {}
}

async fn serve_books() -> String {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let (app, _storage) = test_app().await;
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    format!("http://{addr}")
}

#[tokio::test]
async fn controller_round_trip_against_running_server() {
    let server_url = serve_books().await;
    let collection = Arc::new(HttpBookCollection::new(&server_url).expect("collection"));
    let notifier = Arc::new(CollectingNotifier::default());
    let deps = ControllerDeps {
        collection: collection.clone(),
        prompt: Arc::new(AnsweringPrompt(PromptAnswer::Confirmed)),
        notifier: notifier.clone(),
        dialog: Arc::new(HeadlessDialog),
    };
    let mut controller = EditSessionController::new(deps, ControllerSettings::default());
    let mut browser = BookBrowser::new(collection.clone());

    controller.begin_create().await.expect("begin create");
    let outcome = controller.save().await.expect("save");
    assert!(matches!(outcome, SaveOutcome::Failed(SaveFailure::Remote(_))));
    assert!(controller.working().is_some());

    controller
        .stage_edit(BookPatch::title("Catweazle"))
        .await
        .expect("stage");
    let SaveOutcome::Created(created) = controller.save().await.expect("save") else {
        panic!("create should be confirmed");
    };
    assert!(controller.working().is_none());

    browser.refresh().await.expect("refresh");
    let selected = browser.select_book(created.id).cloned();
    controller
        .begin_edit(selected.as_ref())
        .await
        .expect("begin edit");
    controller
        .stage_edit(BookPatch::stock(22))
        .await
        .expect("stage");
    let SaveOutcome::Updated(updated) = controller.save().await.expect("save") else {
        panic!("update should be confirmed");
    };
    assert_eq!(updated.stock, 22);

    browser.refresh().await.expect("refresh");
    let selected = browser.select_book(created.id).cloned();
    let outcome = controller
        .confirm_delete(selected.as_ref())
        .await
        .expect("delete");
    assert_eq!(outcome, DeleteOutcome::Deleted(created.id));

    assert!(browser.refresh().await.expect("refresh").is_empty());
    assert_eq!(collection.pending_contexts().await, 0);
    assert_eq!(
        notifier.messages(),
        vec![
            "error: Could not create book: title must not be empty".to_string(),
            "Book \"Catweazle\" created".to_string(),
            "Book \"Catweazle\" updated".to_string(),
            "Book \"Catweazle\" deleted".to_string(),
        ]
    );
}
