//! Homepage listings and the terminal catch-all.
//!
//! The homepage is paginated (`/p{n}`) and filterable by category
//! (`/oc-{category}`, combinable and pageable). The catch-all also serves
//! public static files, strips trailing slashes, and enforces the read-only
//! method policy for everything that is not a registered page route.

use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::{Method, StatusCode, header};
use axum::response::Response;
use tower::ServiceExt;

use crate::error::EdgeError;
use crate::render;
use crate::state::AppState;
use crate::upstream::GetOptions;

use super::{CACHE_ONE_HOUR, page_response, plain_text, redirect};

/// Cache lifetime for plain public files served from the catch-all.
const STATIC_CACHE_CONTROL: &str = "public, max-age=86400";

/// A parsed listing path: page number plus category filters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Listing {
    pub page: u32,
    pub categories: Vec<String>,
}

impl Default for Listing {
    fn default() -> Self {
        Self {
            page: 1,
            categories: Vec::new(),
        }
    }
}

impl Listing {
    /// Path prefix for links to this listing, e.g. "/oc-Web+development".
    /// Empty for the unfiltered homepage.
    pub fn base_path(&self) -> String {
        self.categories
            .iter()
            .map(|category| format!("/oc-{}", category.replace(' ', "+")))
            .collect()
    }

    /// Canonical path of this listing page.
    pub fn canonical_path(&self) -> String {
        let base = self.base_path();
        if self.page > 1 {
            format!("{base}/p{}", self.page)
        } else if base.is_empty() {
            "/".to_string()
        } else {
            base
        }
    }
}

/// Parse a listing path like `p2/oc-JavaScript` (in any part order).
/// Returns `None` when any part is neither a page nor a category.
pub(crate) fn parse_listing(splat: &str) -> Option<Listing> {
    let mut listing = Listing::default();
    for part in splat.split('/') {
        if part.is_empty() {
            continue;
        }
        if let Some(digits) = part.strip_prefix('p')
            && !digits.is_empty()
            && digits.bytes().all(|b| b.is_ascii_digit())
        {
            listing.page = digits.parse().ok()?;
            continue;
        }
        if let Some(category) = part.strip_prefix("oc-")
            && !category.is_empty()
            && category
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'+')
        {
            listing.categories.push(category.replace('+', " "));
            continue;
        }
        return None;
    }
    Some(listing)
}

/// `GET /` - the unfiltered first page.
pub async fn home_page(State(state): State<AppState>) -> Result<Response, EdgeError> {
    render_listing(&state, Listing::default()).await
}

/// Terminal fallback for everything without a route: method policy,
/// trailing-slash canonicalization, public files, then listing paths.
pub async fn catchall(
    State(state): State<AppState>,
    req: Request,
) -> Result<Response, EdgeError> {
    if req.method() != Method::GET && req.method() != Method::HEAD {
        return Ok(plain_text(
            StatusCode::METHOD_NOT_ALLOWED,
            "Method Not Allowed",
        ));
    }

    // Work on the raw path so percent-encoding survives into redirects.
    let raw_path = req.uri().path().to_string();
    if raw_path.len() > 1 && raw_path.ends_with('/') {
        return Ok(redirect(
            StatusCode::FOUND,
            &raw_path[..raw_path.len() - 1],
        ));
    }

    // Try a public file before treating the path as a listing.
    let file_response = state
        .public_files
        .clone()
        .oneshot(req)
        .await
        .map_err(|err| EdgeError::Internal(err.into()))?;
    if file_response.status() != StatusCode::NOT_FOUND {
        let mut response = file_response.map(Body::new);
        if response.status().is_success() || response.status() == StatusCode::NOT_MODIFIED {
            response
                .headers_mut()
                .entry(header::CACHE_CONTROL)
                .or_insert(header::HeaderValue::from_static(STATIC_CACHE_CONTROL));
        }
        return Ok(response);
    }

    match parse_listing(raw_path.trim_start_matches('/')) {
        Some(listing) => render_listing(&state, listing).await,
        None => Err(EdgeError::NotFound(format!("no such page: {raw_path}"))),
    }
}

/// Fetch a homepage listing from the backend and render it.
///
/// The backend canonicalizes category casing with a 301; that surfaces to
/// the client as a 308 so the method is preserved and caches can keep it.
pub(crate) async fn render_listing(
    state: &AppState,
    listing: Listing,
) -> Result<Response, EdgeError> {
    let url = {
        let mut query = url::form_urlencoded::Serializer::new(String::new());
        query.append_pair("page", &listing.page.to_string());
        for category in &listing.categories {
            query.append_pair("oc", category);
        }
        format!("/api/v1/plog/homepage?{}", query.finish())
    };

    let response = state
        .upstream
        .get(
            &url,
            GetOptions {
                follow_redirect: false,
                ..Default::default()
            },
        )
        .await?;

    let status = response.status();
    if status == StatusCode::NOT_FOUND || status == StatusCode::BAD_REQUEST {
        return Err(EdgeError::NotFound(
            "no posts match that listing".to_string(),
        ));
    }
    if status == StatusCode::MOVED_PERMANENTLY {
        let location = response
            .headers()
            .get(header::LOCATION)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        return match location {
            Some(location) => Ok(redirect(StatusCode::PERMANENT_REDIRECT, &location)),
            None => Err(EdgeError::Internal(anyhow::anyhow!(
                "upstream 301 without a location for {url}"
            ))),
        };
    }
    if !status.is_success() {
        return Err(EdgeError::Internal(anyhow::anyhow!(
            "unexpected upstream status {status} for {url}"
        )));
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|err| EdgeError::Internal(err.into()))?;
    let homepage: peterbecom_core::Homepage = serde_json::from_slice(&bytes)?;
    Ok(page_response(
        render::home::page(&state.config, &listing, &homepage),
        CACHE_ONE_HOUR,
    ))
}
