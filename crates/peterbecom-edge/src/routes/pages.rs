//! Static-ish pages: `/about` and `/contact`.

use axum::extract::State;
use axum::response::Response;

use crate::state::AppState;

use super::{CACHE_HALF_DAY, page_response};

/// `GET /about`.
pub async fn about_page(State(state): State<AppState>) -> Response {
    page_response(crate::render::statics::about(&state.config), CACHE_HALF_DAY)
}

/// `GET /contact`.
pub async fn contact_page(State(state): State<AppState>) -> Response {
    page_response(
        crate::render::statics::contact(&state.config),
        CACHE_HALF_DAY,
    )
}
