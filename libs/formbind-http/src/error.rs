use axum::extract::multipart::MultipartError;
use axum::extract::multipart::MultipartRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

#[derive(Debug, thiserror::Error)]
pub enum RequestError {
    #[error("read body: {0}")]
    Body(#[source] axum::Error),

    #[error("multipart: {0}")]
    Multipart(#[from] MultipartError),

    #[error("multipart: {0}")]
    Rejected(#[from] MultipartRejection),

    #[error("content type: {0}")]
    ContentType(String),

    #[error("store upload {file:?}: {source}")]
    Spill { file: String, source: std::io::Error },
}

impl IntoResponse for RequestError {
    fn into_response(self) -> Response {
        let status = match &self {
            RequestError::Multipart(e) => e.status(),
            RequestError::Rejected(e) => e.status(),
            RequestError::Spill { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            RequestError::Body(_) | RequestError::ContentType(_) => StatusCode::BAD_REQUEST,
        };
        (status, format!("error: {self}")).into_response()
    }
}
