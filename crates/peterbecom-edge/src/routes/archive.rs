//! Archive index: `/plog`.

use axum::extract::State;
use axum::response::Response;

use crate::error::EdgeError;
use crate::render;
use crate::state::AppState;
use crate::upstream::GetOptions;

use super::{CACHE_HALF_DAY, page_response};

/// `GET /plog` - every post, grouped by month.
///
/// The trailing-slash form redirects in the catch-all before reaching here.
pub async fn archive_page(State(state): State<AppState>) -> Result<Response, EdgeError> {
    let response = state
        .upstream
        .get("/api/v1/plog/", GetOptions::default())
        .await?;

    if !response.status().is_success() {
        return Err(EdgeError::Internal(anyhow::anyhow!(
            "unexpected upstream status {} for the archive",
            response.status()
        )));
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|err| EdgeError::Internal(err.into()))?;
    let archive: peterbecom_core::Archive = serde_json::from_slice(&bytes)?;

    Ok(page_response(
        render::archive::page(&state.config, &archive),
        CACHE_HALF_DAY,
    ))
}
