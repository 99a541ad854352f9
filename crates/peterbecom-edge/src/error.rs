//! Error types for the edge server.
//!
//! Client input problems (bad paths, junk queries, unknown posts) are
//! modeled as plain responses elsewhere or as the `BadRequest`/`NotFound`
//! variants here; they are never retried and never reported. Infrastructure
//! failures render a generic error page without internal details.

use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use maud::{DOCTYPE, html};

use crate::upstream::UpstreamError;

/// Edge server error type.
#[derive(Debug, thiserror::Error)]
pub enum EdgeError {
    /// The request itself is malformed or filtered.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// The requested page or resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The backend could not be reached, or kept failing after retries.
    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    /// The backend answered but the payload did not match its schema.
    #[error("invalid upstream payload: {0}")]
    Validation(#[from] serde_json::Error),

    /// Local failure (file I/O, image transcoding, etc.).
    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for EdgeError {
    fn into_response(self) -> Response {
        match self {
            // Client input errors: short plain text, never cached.
            Self::BadRequest(message) => (
                StatusCode::BAD_REQUEST,
                [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
                message,
            )
                .into_response(),

            Self::NotFound(message) => {
                error_page(StatusCode::NOT_FOUND, "Page not found", &message)
            }

            Self::Upstream(err) => {
                tracing::error!(error = %err, "upstream failure");
                error_page(
                    StatusCode::BAD_GATEWAY,
                    "Something went wrong",
                    "The content backend could not be reached. Please try again later.",
                )
            }

            Self::Validation(err) => {
                tracing::error!(error = %err, "upstream payload failed validation");
                error_page(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Something went wrong",
                    "An internal error occurred. Please try again later.",
                )
            }

            Self::Internal(err) => {
                tracing::error!(error = %err, "internal server error");
                error_page(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Something went wrong",
                    "An internal error occurred. Please try again later.",
                )
            }
        }
    }
}

/// Minimal HTML error page. Never carries cache headers, so error responses
/// are not cached by the CDN.
fn error_page(status: StatusCode, title: &str, message: &str) -> Response {
    let markup = html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1";
                title { (title) " - Peterbe.com" }
                meta name="robots" content="noindex";
            }
            body {
                main {
                    h1 { (title) }
                    p { (message) }
                    a href="/" { "Back to the homepage" }
                }
            }
        }
    };

    (status, markup).into_response()
}
