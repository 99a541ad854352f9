//! Blog post pages: `/plog/{oid}[/p{n}]`, plus the legacy lyrics-song
//! permalinks nested under the lyrics post.
//!
//! Redirect targets are computed from the raw request path so that
//! percent-encoded (non-ASCII) oids survive untouched.

use axum::extract::State;
use axum::http::{StatusCode, Uri};
use axum::response::Response;
use chrono::{DateTime, NaiveDate, Utc};

use crate::error::EdgeError;
use crate::render;
use crate::state::AppState;
use crate::upstream::GetOptions;

use super::{CACHE_HALF_DAY, page_response, redirect};

/// Cache lifetime for song lookup misses (not found / bad id).
const SONG_ERROR_CACHE_SECONDS: u32 = 60;

/// The oid of the lyrics post that hosts song permalinks.
const LYRICS_POST_OID: &str = "blogitem-040601-1";

/// Outcome of parsing the path after `/plog/`.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum PostPath {
    /// Redirect to the canonical form (trailing slash, `/p1`).
    Redirect(String),
    /// A post page.
    Post { oid: String, page: u32 },
    /// A lyrics song permalink.
    Song { id: u64 },
}

/// Parse the raw (still percent-encoded) path after `/plog/`.
pub(crate) fn parse_post_path(rest: &str) -> Result<PostPath, &'static str> {
    if rest.ends_with('/') {
        return Ok(PostPath::Redirect(format!(
            "/plog/{}",
            &rest[..rest.len() - 1]
        )));
    }
    if let Some(stripped) = rest.strip_suffix("/p1") {
        return Ok(PostPath::Redirect(format!("/plog/{stripped}")));
    }

    if let Some(song_rest) = rest
        .strip_prefix(LYRICS_POST_OID)
        .and_then(|after_oid| after_oid.strip_prefix("/song/"))
    {
        let id = song_rest
            .rsplit('/')
            .next()
            .and_then(|part| part.parse().ok())
            .ok_or("song id not valid")?;
        return Ok(PostPath::Song { id });
    }

    let mut oid: Option<&str> = None;
    let mut page: u32 = 1;
    for part in rest.split('/') {
        if part.is_empty() {
            continue;
        }
        if let Some(digits) = part.strip_prefix('p')
            && !digits.is_empty()
            && digits.bytes().all(|b| b.is_ascii_digit())
        {
            page = digits.parse().map_err(|_| "page not valid")?;
            continue;
        }
        if oid.is_some() {
            return Err("more than one oid");
        }
        oid = Some(part);
    }

    match oid {
        Some(oid) => Ok(PostPath::Post {
            oid: oid.to_string(),
            page,
        }),
        None => Err("oid empty"),
    }
}

/// `GET /plog/{*rest}`.
pub async fn post_page(
    State(state): State<AppState>,
    uri: Uri,
) -> Result<Response, EdgeError> {
    let raw_path = uri.path();
    let rest = raw_path.strip_prefix("/plog/").unwrap_or("");

    match parse_post_path(rest).map_err(|reason| EdgeError::NotFound(reason.to_string()))? {
        PostPath::Redirect(location) => Ok(redirect(StatusCode::FOUND, &location)),
        PostPath::Song { id } => song_page(&state, raw_path, id).await,
        PostPath::Post { oid, page } => render_post(&state, &oid, page).await,
    }
}

async fn render_post(state: &AppState, oid: &str, page: u32) -> Result<Response, EdgeError> {
    let url = format!("/api/v1/plog/{oid}?page={page}");
    let response = state.upstream.get(&url, GetOptions::default()).await?;

    if response.status() == StatusCode::NOT_FOUND {
        return Err(EdgeError::NotFound(format!("no post with oid {oid:?}")));
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
    let data: peterbecom_core::PostWithComments = serde_json::from_slice(&bytes)?;

    // Unpublished posts must not linger in CDN caches.
    let cache_seconds = if is_not_published(&data.post.pub_date) {
        0
    } else {
        CACHE_HALF_DAY
    };

    Ok(page_response(
        render::post::page(&state.config, &data, page),
        cache_seconds,
    ))
}

async fn song_page(state: &AppState, raw_path: &str, id: u64) -> Result<Response, EdgeError> {
    let url = format!("/api/v1/lyrics/song?id={id}");
    let response = state.upstream.get(&url, GetOptions::default()).await?;

    let status = response.status();
    if status == StatusCode::NOT_FOUND {
        return Ok(page_response(
            render::song::error_page(&state.config, "Song not found"),
            SONG_ERROR_CACHE_SECONDS,
        ));
    }
    if status == StatusCode::BAD_REQUEST {
        return Ok(page_response(
            render::song::error_page(&state.config, "Song lookup error"),
            SONG_ERROR_CACHE_SECONDS,
        ));
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
    let data: peterbecom_core::SongData = serde_json::from_slice(&bytes)?;
    Ok(page_response(
        render::song::page(&state.config, raw_path, &data.song),
        CACHE_HALF_DAY,
    ))
}

/// A post dated in the future is not yet published.
fn is_not_published(pub_date: &str) -> bool {
    let parsed = DateTime::parse_from_rfc3339(pub_date)
        .map(|date| date.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(pub_date, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
                .map(|datetime| datetime.and_utc())
        });
    matches!(parsed, Some(date) if date > Utc::now())
}
