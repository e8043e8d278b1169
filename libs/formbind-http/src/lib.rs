//! axum glue for `formbind`: decode a request's query string, urlencoded
//! body, or multipart body into a `Binder`.

mod config;
mod decode;
mod error;

use axum::extract::{FromRequest, Request};

pub use config::RequestConfig;
pub use decode::bind_from_request;
pub use error::RequestError;

/// Extractor that decodes the request with `RequestConfig::default()`.
///
/// ```ignore
/// async fn signup(FormData(form): FormData) -> impl IntoResponse {
///     let mut user = User::default();
///     form.field("user", &mut user)?;
///     ...
/// }
/// ```
pub struct FormData(pub formbind::Binder);

impl<S> FromRequest<S> for FormData
where
    S: Send + Sync,
{
    type Rejection = RequestError;

    async fn from_request(req: Request, _state: &S) -> Result<Self, Self::Rejection> {
        bind_from_request(req, &RequestConfig::default()).await.map(FormData)
    }
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::StatusCode;
    use axum::http::header::CONTENT_TYPE;
    use axum::response::IntoResponse;

    use super::*;

    #[tokio::test]
    async fn extractor_decodes_form() {
        let req = axum::http::Request::builder()
            .method("POST")
            .uri("/?a=1")
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from("b=2"))
            .unwrap();

        let FormData(binder) = FormData::from_request(req, &()).await.unwrap();
        let (mut a, mut b) = (0u8, 0u8);
        binder.field("a", &mut a).unwrap();
        binder.field("b", &mut b).unwrap();
        assert_eq!((a, b), (1, 2));
    }

    #[tokio::test]
    async fn broken_multipart_is_a_client_error() {
        let req = axum::http::Request::builder()
            .method("POST")
            .uri("/")
            .header(CONTENT_TYPE, "multipart/form-data")
            .body(Body::from("garbage"))
            .unwrap();

        let err = match FormData::from_request(req, &()).await {
            Err(e) => e,
            Ok(_) => panic!("expected rejection"),
        };
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }
}
