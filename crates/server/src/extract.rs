use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        FromRequest, FromRequestParts,
    },
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use shared::error::{ApiError, ErrorCode};

pub(crate) struct ApiRejection {
    status: StatusCode,
    error: ApiError,
}

impl ApiRejection {
    fn validation(status: StatusCode, message: String) -> Self {
        let status = match status {
            StatusCode::PAYLOAD_TOO_LARGE | StatusCode::UNSUPPORTED_MEDIA_TYPE => status,
            _ => StatusCode::BAD_REQUEST,
        };
        Self {
            status,
            error: ApiError::validation(message),
        }
    }
}

impl IntoResponse for ApiRejection {
    fn into_response(self) -> Response {
        (self.status, Json(self.error)).into_response()
    }
}

impl From<JsonRejection> for ApiRejection {
    fn from(rejection: JsonRejection) -> Self {
        Self::validation(rejection.status(), rejection.body_text())
    }
}

impl From<PathRejection> for ApiRejection {
    fn from(rejection: PathRejection) -> Self {
        Self::validation(rejection.status(), rejection.body_text())
    }
}

impl From<QueryRejection> for ApiRejection {
    fn from(rejection: QueryRejection) -> Self {
        Self::validation(rejection.status(), rejection.body_text())
    }
}

#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiRejection))]
pub(crate) struct ApiJson<T>(pub(crate) T);

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ApiRejection))]
pub(crate) struct ApiPath<T>(pub(crate) T);

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ApiRejection))]
pub(crate) struct ApiQuery<T>(pub(crate) T);

// Responses built outside the handlers (body limit, method mismatch, healthz)
// carry plain text.
pub(crate) async fn api_error_body(response: Response) -> Response {
    let status = response.status();
    let is_json = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|value| value.starts_with("application/json"));
    if is_json || !(status.is_client_error() || status.is_server_error()) {
        return response;
    }
    let error = match status {
        StatusCode::PAYLOAD_TOO_LARGE => ApiError::validation("request body too large"),
        other if other.is_server_error() => ApiError::new(ErrorCode::Internal, other.to_string()),
        other => ApiError::validation(other.to_string()),
    };
    (status, Json(error)).into_response()
}
