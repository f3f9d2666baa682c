//! HTTP error responses for the web adapter.

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};

use crate::domain::error::{error_body, DeepcoinError, ErrorKind};

#[derive(Debug)]
pub struct WebError {
    pub status: StatusCode,
    pub body: String,
}

impl WebError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        let message = message.into();
        let body = serde_json::json!({ "error": message }).to_string();
        Self { status, body }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }
}

pub fn status_for(err: &DeepcoinError) -> StatusCode {
    match err.kind() {
        ErrorKind::InsufficientHistory => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorKind::DataUnavailable => StatusCode::BAD_GATEWAY,
        ErrorKind::ModelUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        ErrorKind::ComputationError | ErrorKind::Config | ErrorKind::Io => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl From<DeepcoinError> for WebError {
    fn from(err: DeepcoinError) -> Self {
        Self {
            status: status_for(&err),
            body: error_body(&err),
        }
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        (
            self.status,
            [(header::CONTENT_TYPE, "application/json")],
            self.body,
        )
            .into_response()
    }
}
