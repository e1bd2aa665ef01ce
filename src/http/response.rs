//! Response rendering.
//!
//! # Responsibilities
//! - Turn a resolved resource into a 200 with its content type
//! - Render failure codes as minimal HTML pages
//!
//! # Design Decisions
//! - Bodies are fully buffered (local files, no range or streaming support)
//! - Failure pages name the method and URL so a typo is easy to spot

use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};

use crate::resolver::Resource;
use crate::routing::ResponseErrorCode;

impl From<ResponseErrorCode> for StatusCode {
    fn from(code: ResponseErrorCode) -> Self {
        match code {
            ResponseErrorCode::NotFound => StatusCode::NOT_FOUND,
            ResponseErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// HTML body for a failure page.
pub fn failure_body(code: ResponseErrorCode, method: &str, url: &str) -> String {
    let heading = format!("<h1>{}: {}</h1>", code.as_u16(), code.reason());
    match code {
        ResponseErrorCode::NotFound => format!("{heading}{method} {url} didn't match anything"),
        ResponseErrorCode::InternalError => format!("{heading}Failed to process request"),
    }
}

/// Render a failure code.
pub fn failure(code: ResponseErrorCode, method: &str, url: &str) -> Response {
    (StatusCode::from(code), Html(failure_body(code, method, url))).into_response()
}

/// Render a resolved resource.
pub fn resource(resource: Resource) -> Response {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, resource.content_type)],
        resource.bytes,
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_bodies() {
        assert_eq!(
            failure_body(ResponseErrorCode::NotFound, "GET", "/Pictures/dog.jpg"),
            "<h1>404: Not Found</h1>GET /Pictures/dog.jpg didn't match anything"
        );
        assert_eq!(
            failure_body(ResponseErrorCode::InternalError, "BREW", "/"),
            "<h1>500: Internal Error</h1>Failed to process request"
        );
    }

    #[tokio::test]
    async fn test_failure_response() {
        let response = failure(ResponseErrorCode::NotFound, "GET", "/x");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/html; charset=utf-8"
        );

        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert!(String::from_utf8_lossy(&body).contains("GET /x"));
    }

    #[tokio::test]
    async fn test_resource_response() {
        let response = resource(Resource {
            bytes: b"meow".to_vec(),
            content_type: "image/jpeg".into(),
        });
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "image/jpeg");

        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"meow");
    }
}
