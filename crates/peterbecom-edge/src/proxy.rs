//! Reverse proxy to the content backend.
//!
//! A fixed set of path shapes never renders at the edge: feeds, robots and
//! sitemap files, avatar endpoints, the API and cache namespaces, legacy
//! visit-counter pings, and the analytics beacon. Those are forwarded to the
//! backend origin with the original path and query intact, and the response
//! is streamed back without buffering.

use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::{HeaderMap, HeaderName, Method, StatusCode, Uri, header};
use axum::middleware::Next;
use axum::response::Response;

use crate::routes;
use crate::state::AppState;

/// Exact paths forwarded to the backend.
const PROXY_PATHS: &[&str] = &[
    "/robots.txt",
    "/sitemap.xml",
    "/avatar.png",
    "/avatar.random.png",
];

/// Path prefixes forwarded to the backend.
const PROXY_PREFIXES: &[&str] = &["/api/", "/cache/", "/__huey__"];

/// Path suffixes forwarded to the backend (feeds at any depth, legacy
/// visit-counter pings).
const PROXY_SUFFIXES: &[&str] = &["/rss.xml", "/ping"];

/// The analytics beacon posts here; the backend ingests it elsewhere.
const EVENTS_PATH: &str = "/events";
const EVENTS_BACKEND_PATH: &str = "/api/v1/events";

/// Cap on buffered request bodies (beacons and pings are small).
const MAX_PROXY_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Forward proxied path shapes to the backend, passing others through.
pub async fn backend_proxy(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Response {
    let Some(target) = proxy_target(req.method(), req.uri()) else {
        return next.run(req).await;
    };

    match forward(&state, req, &target).await {
        Ok(response) => response,
        Err(err) => {
            tracing::error!(target = %target, error = %err, "proxy request failed");
            routes::plain_text(StatusCode::BAD_GATEWAY, "Upstream request failed")
        }
    }
}

/// Decide whether a request is proxied and compute its backend path.
///
/// Returns the path (plus query) to request from the backend origin, or
/// `None` when the request should continue through the pipeline.
fn proxy_target(method: &Method, uri: &Uri) -> Option<String> {
    let path = uri.path();

    if method == Method::POST && path == EVENTS_PATH {
        return Some(EVENTS_BACKEND_PATH.to_string());
    }

    let forwarded = PROXY_PATHS.contains(&path)
        || PROXY_PREFIXES.iter().any(|prefix| path.starts_with(prefix))
        || PROXY_SUFFIXES.iter().any(|suffix| path.ends_with(suffix));

    if forwarded {
        Some(
            uri.path_and_query()
                .map(|pq| pq.as_str().to_string())
                .unwrap_or_else(|| path.to_string()),
        )
    } else {
        None
    }
}

async fn forward(state: &AppState, req: Request, target: &str) -> anyhow::Result<Response> {
    let url = format!("{}{}", state.config.api_base, target);
    let (parts, body) = req.into_parts();

    let body_bytes = axum::body::to_bytes(body, MAX_PROXY_BODY_BYTES)
        .await
        .map_err(|err| anyhow::anyhow!("failed to buffer request body: {err}"))?;

    let mut outbound_headers = HeaderMap::new();
    for (name, value) in parts.headers.iter() {
        // The Host header is replaced with the backend origin's.
        if name == header::HOST || is_hop_by_hop(name) {
            continue;
        }
        outbound_headers.append(name.clone(), value.clone());
    }

    let upstream = state
        .proxy_client
        .request(parts.method, url)
        .headers(outbound_headers)
        .body(body_bytes)
        .send()
        .await?;

    let mut response = Response::builder().status(upstream.status());
    if let Some(headers) = response.headers_mut() {
        for (name, value) in upstream.headers().iter() {
            if !is_hop_by_hop(name) {
                headers.append(name.clone(), value.clone());
            }
        }
    }

    Ok(response.body(Body::from_stream(upstream.bytes_stream()))?)
}

/// Headers that describe the connection rather than the message.
fn is_hop_by_hop(name: &HeaderName) -> bool {
    matches!(
        name.as_str(),
        "connection"
            | "keep-alive"
            | "proxy-authenticate"
            | "proxy-authorization"
            | "te"
            | "trailer"
            | "transfer-encoding"
            | "upgrade"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uri(raw: &str) -> Uri {
        raw.parse().unwrap()
    }

    #[test]
    fn api_namespace_is_proxied_with_query() {
        assert_eq!(
            proxy_target(&Method::GET, &uri("/api/v1/search?q=stuff&debug=false")),
            Some("/api/v1/search?q=stuff&debug=false".to_string())
        );
        assert_eq!(
            proxy_target(&Method::GET, &uri("/api/v1/typeahead?q=st&n=8")),
            Some("/api/v1/typeahead?q=st&n=8".to_string())
        );
    }

    #[test]
    fn well_known_files_are_proxied() {
        for path in ["/robots.txt", "/sitemap.xml", "/avatar.png", "/avatar.random.png"] {
            assert!(proxy_target(&Method::GET, &uri(path)).is_some(), "{path}");
        }
    }

    #[test]
    fn feeds_are_proxied_at_any_depth() {
        assert!(proxy_target(&Method::GET, &uri("/rss.xml")).is_some());
        assert!(proxy_target(&Method::GET, &uri("/plog/some-post/rss.xml")).is_some());
    }

    #[test]
    fn legacy_ping_is_proxied_for_any_method() {
        assert!(proxy_target(&Method::PUT, &uri("/plog/some-post/ping")).is_some());
        assert!(proxy_target(&Method::GET, &uri("/ping")).is_some());
    }

    #[test]
    fn events_beacon_rewrites_to_the_ingestion_endpoint() {
        assert_eq!(
            proxy_target(&Method::POST, &uri("/events")),
            Some("/api/v1/events".to_string())
        );
        // GET /events is a page path, not a beacon.
        assert_eq!(proxy_target(&Method::GET, &uri("/events")), None);
    }

    #[test]
    fn page_paths_are_not_proxied() {
        for path in ["/", "/plog/some-post", "/about", "/search?q=x", "/apiary"] {
            assert_eq!(proxy_target(&Method::GET, &uri(path)), None, "{path}");
        }
    }

    #[test]
    fn hop_by_hop_headers_are_recognized() {
        assert!(is_hop_by_hop(&header::CONNECTION));
        assert!(is_hop_by_hop(&header::TRANSFER_ENCODING));
        assert!(!is_hop_by_hop(&header::CONTENT_TYPE));
        assert!(!is_hop_by_hop(&header::COOKIE));
    }
}
