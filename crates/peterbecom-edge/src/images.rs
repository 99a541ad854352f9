//! Dynamic image derivation.
//!
//! Requests under `/images/` for a `.webp` file are answered by transcoding
//! the sibling `.png` on demand. The derived bytes are persisted next to the
//! source and served as-is on later requests; once written, a derived file
//! is never revalidated against its source. Everything else under `/images/`
//! is plain static file serving with a one-day cache.
//!
//! Transcoding is deterministic (lossless), so concurrent first requests for
//! the same derived path may both transcode and race to write the file;
//! last writer wins with equivalent bytes.

use std::path::{Component, Path, PathBuf};

use axum::Router;
use axum::extract::{Request, State};
use axum::http::{HeaderValue, Method, StatusCode, header};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use tower_http::services::ServeDir;

use crate::error::EdgeError;
use crate::routes;
use crate::state::AppState;

/// Cache lifetime for derived and static images.
const IMAGE_CACHE_CONTROL: &str = "public, max-age=86400";

/// Cache lifetime for the negative (not found) result.
const NOT_FOUND_CACHE_CONTROL: &str = "public, max-age=3600";

/// Build the `/images` sub-router: the deriver in front of static serving.
pub fn router(state: AppState) -> Router {
    let images_dir = state.config.public_dir.join("images");
    Router::new()
        .fallback_service(ServeDir::new(images_dir).append_index_html_on_directories(false))
        .layer(middleware::from_fn_with_state(state, dynamic_images))
}

/// Intercept `.webp` requests and post-process static file responses.
async fn dynamic_images(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, EdgeError> {
    if req.method() != Method::GET && req.method() != Method::HEAD {
        return Ok(routes::plain_text(
            StatusCode::METHOD_NOT_ALLOWED,
            "Method Not Allowed",
        ));
    }

    // The router is nested under /images, so the path here is relative.
    let request_path = req.uri().path().to_string();
    if request_path.ends_with(".webp") {
        return derive_webp(&state, &request_path).await;
    }

    let mut response = next.run(req).await;
    let status = response.status();
    if status == StatusCode::NOT_FOUND {
        return Ok(image_not_found());
    }
    if status.is_success() || status == StatusCode::NOT_MODIFIED {
        response
            .headers_mut()
            .entry(header::CACHE_CONTROL)
            .or_insert(HeaderValue::from_static(IMAGE_CACHE_CONTROL));
    }
    Ok(response)
}

/// Serve a derived `.webp`, transcoding the sibling `.png` if needed.
async fn derive_webp(state: &AppState, request_path: &str) -> Result<Response, EdgeError> {
    let Some(relative) = safe_relative_path(request_path) else {
        return Err(EdgeError::BadRequest("invalid image path".to_string()));
    };
    let derived_path = state.config.public_dir.join("images").join(relative);

    // A previously derived file is served without a staleness check.
    match tokio::fs::read(&derived_path).await {
        Ok(bytes) => return Ok(webp_response(bytes)),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
        Err(err) => return Err(EdgeError::Internal(err.into())),
    }

    let source_path = derived_path.with_extension("png");
    let source = match tokio::fs::read(&source_path).await {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Ok(image_not_found());
        }
        Err(err) => return Err(EdgeError::Internal(err.into())),
    };

    let webp = transcode_to_webp(&source)?;

    if let Err(err) = tokio::fs::write(&derived_path, &webp).await {
        tracing::warn!(
            path = %derived_path.display(),
            error = %err,
            "failed to persist derived image"
        );
    } else {
        tracing::debug!(
            path = %derived_path.display(),
            bytes = webp.len(),
            "derived image persisted"
        );
    }

    Ok(webp_response(webp))
}

/// Decode a PNG and re-encode it as lossless WebP.
fn transcode_to_webp(png_bytes: &[u8]) -> Result<Vec<u8>, EdgeError> {
    let decoded = image::load_from_memory_with_format(png_bytes, image::ImageFormat::Png)
        .map_err(|err| EdgeError::Internal(anyhow::anyhow!("PNG decode error: {err}")))?;
    let rgba = decoded.to_rgba8();

    let mut out = Vec::new();
    let encoder = image::codecs::webp::WebPEncoder::new_lossless(&mut out);
    encoder
        .encode(
            rgba.as_raw(),
            rgba.width(),
            rgba.height(),
            image::ExtendedColorType::Rgba8,
        )
        .map_err(|err| EdgeError::Internal(anyhow::anyhow!("WebP encode error: {err}")))?;

    Ok(out)
}

fn webp_response(bytes: Vec<u8>) -> Response {
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, HeaderValue::from_static("image/webp")),
            (
                header::CACHE_CONTROL,
                HeaderValue::from_static(IMAGE_CACHE_CONTROL),
            ),
        ],
        bytes,
    )
        .into_response()
}

/// The 404 for missing images is cached as a negative result.
fn image_not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        [
            (
                header::CONTENT_TYPE,
                HeaderValue::from_static("text/plain; charset=utf-8"),
            ),
            (
                header::CACHE_CONTROL,
                HeaderValue::from_static(NOT_FOUND_CACHE_CONTROL),
            ),
        ],
        "image not found",
    )
        .into_response()
}

/// Turn a request path into a safe path relative to the images directory.
/// Rejects traversal components.
fn safe_relative_path(request_path: &str) -> Option<PathBuf> {
    let trimmed = request_path.trim_start_matches('/');
    let path = Path::new(trimmed);
    if !trimmed.is_empty()
        && path
            .components()
            .all(|component| matches!(component, Component::Normal(_)))
    {
        Some(path.to_path_buf())
    } else {
        None
    }
}
