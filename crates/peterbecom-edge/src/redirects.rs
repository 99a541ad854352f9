//! Legacy URL redirects.
//!
//! Old URL shapes still arrive from search engines, bookmarks, and scrapers.
//! Each rule is a pure function of path and query; first match wins.

use std::sync::LazyLock;

use axum::extract::Request;
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::Response;
use regex::Regex;

use crate::routes;

/// Lyrics song permalinks used to live at the site root.
static ROOT_SONG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^/song/[-\w]+/[-\w]+/\d+").unwrap());

/// Prefix the root-song paths moved under.
const SONG_POST_PREFIX: &str = "/plog/blogitem-040601-1";

/// Query parameters of unknown origin that bypass the CDN cache. Requests
/// carrying them redirect to the bare path so the cache key stays bounded.
const OBSOLETE_QUERY_PARAMS: &[&str] = &["magmadomain", "author"];

/// Rewrite deprecated URL shapes to their canonical forms.
pub async fn legacy_redirects(req: Request, next: Next) -> Response {
    let path = req.uri().path();

    if ROOT_SONG.is_match(path) {
        return routes::redirect(
            StatusCode::PERMANENT_REDIRECT,
            &format!("{SONG_POST_PREFIX}{path}"),
        );
    }

    if let Some(query) = req.uri().query() {
        let mut strip_query = false;
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            if (key == "comments" && value == "all")
                || OBSOLETE_QUERY_PARAMS.contains(&key.as_ref())
            {
                strip_query = true;
                break;
            }
        }
        if strip_query {
            return routes::redirect(StatusCode::MOVED_PERMANENTLY, path);
        }
    }

    next.run(req).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, header};
    use axum::{Router, middleware};
    use tower::ServiceExt;

    fn app() -> Router {
        Router::new()
            .fallback(|| async { "ok" })
            .layer(middleware::from_fn(legacy_redirects))
    }

    async fn get(uri: &str) -> axum::response::Response {
        app()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn root_song_paths_move_under_the_lyrics_post() {
        let response = get("/song/foo-fighters/everlong/123").await;
        assert_eq!(response.status(), StatusCode::PERMANENT_REDIRECT);
        assert_eq!(
            response.headers().get(header::LOCATION).unwrap(),
            "/plog/blogitem-040601-1/song/foo-fighters/everlong/123"
        );
    }

    #[tokio::test]
    async fn comments_all_strips_the_query() {
        let response = get("/anything?comments=all").await;
        assert_eq!(response.status(), StatusCode::MOVED_PERMANENTLY);
        assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/anything");
    }

    #[tokio::test]
    async fn obsolete_tracking_params_strip_the_query() {
        for query in ["magmadomain=something", "author=someone&x=1"] {
            let response = get(&format!("/anything?{query}")).await;
            assert_eq!(response.status(), StatusCode::MOVED_PERMANENTLY, "{query}");
            assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/anything");
        }
    }

    #[tokio::test]
    async fn other_query_params_pass_through() {
        let response = get("/search?q=stuff").await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn comments_with_other_value_passes_through() {
        let response = get("/plog/some-post?comments=some").await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn song_path_must_have_numeric_id() {
        let response = get("/song/foo/bar/notanumber").await;
        assert_eq!(response.status(), StatusCode::OK);
    }
}
