//! Junk-request filtering.
//!
//! Rejects obvious spam and attack probes before any rendering work
//! happens. The decision is a pure function of path and query; no rule has
//! side effects beyond the response.

use axum::extract::Request;
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::Response;

use crate::routes;

/// Well-known attack probe filenames, matched against the final path
/// segment at any depth.
const JUNK_PATH_BASENAMES: &[&str] = &["wp-login.php", "wp-admin.php", "xmlrpc.php"];

/// Only inspect `q` values longer than this many characters.
const SUSPICIOUS_QUERY_MIN_LENGTH: usize = 10;

/// Reject when more than this many characters fall in the flagged range.
const SUSPICIOUS_CHARACTER_THRESHOLD: usize = 10;

/// Filter junk requests, passing clean ones through.
pub async fn junk_block(req: Request, next: Next) -> Response {
    // Spammy search queries are dominated by characters outside the basic
    // Latin range. The threshold is a blunt heuristic, not a language
    // block; short non-Latin queries pass.
    if let Some(q) = query_param(req.uri().query(), "q")
        && q.chars().count() > SUSPICIOUS_QUERY_MIN_LENGTH
        && count_suspicious_characters(&q) > SUSPICIOUS_CHARACTER_THRESHOLD
    {
        return routes::plain_text(StatusCode::BAD_REQUEST, "Too many suspicious characters");
    }

    let path = req.uri().path();

    if let Some(basename) = path.rsplit('/').next()
        && JUNK_PATH_BASENAMES.contains(&basename)
    {
        return routes::plain_text(StatusCode::BAD_REQUEST, "Junk path basename");
    }

    // A '&' in the path (rather than the query) is always junk; send the
    // client to the part before it.
    if let Some((clean, _)) = path.split_once('&') {
        let target = if clean.is_empty() { "/" } else { clean };
        return routes::redirect(StatusCode::FOUND, target);
    }

    next.run(req).await
}

/// Count characters in U+00FF..=U+FFFF.
fn count_suspicious_characters(value: &str) -> usize {
    value
        .chars()
        .filter(|c| ('\u{00ff}'..='\u{ffff}').contains(c))
        .count()
}

/// Extract a single decoded query parameter.
fn query_param(query: Option<&str>, name: &str) -> Option<String> {
    let query = query?;
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
}
