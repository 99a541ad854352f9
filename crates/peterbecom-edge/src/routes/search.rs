//! Search page: `/search?q=...&debug=...`.
//!
//! The heavy lifting happens in the backend's search endpoint; this handler
//! fetches and renders results, memoizing them per `(q, debug)` so repeated
//! popular queries don't refetch within the page's cache window. Junk
//! queries never get this far - the junk filter runs earlier in the
//! pipeline.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::response::Response;
use serde::Deserialize;

use crate::error::EdgeError;
use crate::render;
use crate::state::AppState;
use crate::upstream::GetOptions;

use super::{CACHE_ONE_HOUR, page_response};

/// Query parameters of the search page.
#[derive(Debug, Deserialize)]
pub struct SearchParams {
    q: Option<String>,
    debug: Option<String>,
}

/// `GET /search`.
pub async fn search_page(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Response, EdgeError> {
    let q = params
        .q
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string);
    let debug = matches!(params.debug.as_deref(), Some("true") | Some("1"));

    let outcome = match &q {
        Some(q) => Some(fetch_results(&state, q, debug).await?),
        None => None,
    };

    Ok(page_response(
        render::search::page(&state.config, q.as_deref(), debug, outcome),
        CACHE_ONE_HOUR,
    ))
}

/// Fetch search results, memoized per query.
///
/// A definitive upstream 4xx becomes a user-facing message (`Err` in the
/// inner result); infrastructure failures propagate as [`EdgeError`].
async fn fetch_results(
    state: &AppState,
    q: &str,
    debug: bool,
) -> Result<Result<Arc<peterbecom_core::SearchData>, String>, EdgeError> {
    let cache_key = format!("{debug}:{q}");
    if let Some(hit) = state.search_cache.get(&cache_key).await {
        tracing::debug!(q = %q, "search cache hit");
        return Ok(Ok(hit));
    }
    tracing::debug!(q = %q, "search cache miss, fetching");

    let url = {
        let mut query = url::form_urlencoded::Serializer::new(String::new());
        query.append_pair("q", q);
        if debug {
            query.append_pair("debug", "true");
        }
        format!("/api/v1/search?{}", query.finish())
    };

    let response = state.upstream.get(&url, GetOptions::default()).await?;

    if response.status().is_client_error() {
        return Ok(Err(format!(
            "Search failed ({})",
            response.status().as_u16()
        )));
    }
    if !response.status().is_success() {
        return Err(EdgeError::Internal(anyhow::anyhow!(
            "unexpected upstream status {} for {url}",
            response.status()
        )));
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|err| EdgeError::Internal(err.into()))?;
    let data: peterbecom_core::SearchData = serde_json::from_slice(&bytes)?;
    let data = Arc::new(data);

    state.search_cache.insert(cache_key, data.clone()).await;
    Ok(Ok(data))
}
