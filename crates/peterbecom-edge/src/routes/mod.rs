//! Route definitions and pipeline composition.
//!
//! ## Routes
//!
//! - `GET /` , `/p{n}`, `/oc-{category}[/p{n}]` - homepage listings
//! - `GET /plog` - archive index
//! - `GET /plog/{oid}[/p{n}]` - post with paginated comments
//! - `GET /about`, `/contact` - static-ish pages
//! - `GET /search?q=...` - search
//! - `GET /_ip` - connection debug info (JSON)
//! - `/build/*`, `/images/*` - static assets (with WebP derivation)
//! - proxied: feeds, robots/sitemap, avatars, `/api/*`, `/cache/*`,
//!   `*/ping`, `POST /events`
//!
//! Page routes only answer GET/HEAD; any other method gets a 405. The
//! system is read-mostly at the edge; mutations go through the proxied API
//! namespace only.

pub mod archive;
pub mod home;
pub mod pages;
pub mod post;
pub mod search;

use std::net::SocketAddr;

use axum::Json;
use axum::Router;
use axum::extract::ConnectInfo;
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::middleware;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use maud::Markup;
use tower::ServiceBuilder;
use tower_http::compression::CompressionLayer;
use tower_http::services::ServeDir;
use tower_http::set_header::SetResponseHeaderLayer;

use crate::state::AppState;
use crate::{images, junk, proxy, redirects};

/// Cache lifetime for listing and search pages.
pub(crate) const CACHE_ONE_HOUR: u32 = 60 * 60;

/// Cache lifetime for posts, the archive, and static-ish pages.
pub(crate) const CACHE_HALF_DAY: u32 = 60 * 60 * 12;

/// Build the complete edge router.
pub fn router(state: AppState) -> Router {
    // Fingerprinted build assets never change; cache them forever.
    let build_assets = ServiceBuilder::new()
        .layer(SetResponseHeaderLayer::if_not_present(
            header::CACHE_CONTROL,
            HeaderValue::from_static("public, max-age=31536000, immutable"),
        ))
        .service(
            ServeDir::new(state.config.public_dir.join("build"))
                .append_index_html_on_directories(false),
        );

    let mut page_routes = Router::new()
        .route("/", get(home::home_page))
        .route("/plog", get(archive::archive_page))
        .route("/plog/{*rest}", get(post::post_page))
        .route("/about", get(pages::about_page))
        .route("/contact", get(pages::contact_page))
        .route("/search", get(search::search_page))
        .route("/_ip", get(ip_address))
        .fallback(home::catchall)
        .layer(middleware::from_fn(junk::junk_block))
        .layer(middleware::from_fn(redirects::legacy_redirects))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            proxy::backend_proxy,
        ));

    if state.config.use_compression {
        page_routes = page_routes.layer(CompressionLayer::new());
    }

    Router::new()
        .nest_service("/build", build_assets)
        .nest_service("/images", images::router(state.clone()))
        .merge(page_routes.with_state(state))
}

/// Connection debug endpoint.
async fn ip_address(request: axum::extract::Request) -> Json<serde_json::Value> {
    let remote_addr = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string());
    let headers = request.headers();
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    let ip = forwarded
        .as_deref()
        .and_then(|value| value.split(',').next())
        .map(|value| value.trim().to_string())
        .or_else(|| remote_addr.clone());

    Json(serde_json::json!({
        "ip": ip,
        "remote-addr": remote_addr,
        "x-forwarded-for": forwarded,
    }))
}

/// Build a redirect response with an explicit status code.
pub(crate) fn redirect(status: StatusCode, location: &str) -> Response {
    match HeaderValue::from_str(location) {
        Ok(value) => {
            let mut response = status.into_response();
            response.headers_mut().insert(header::LOCATION, value);
            response
        }
        // Only reachable with a Location that is not a valid header value.
        Err(_) => plain_text(StatusCode::BAD_REQUEST, "invalid redirect target"),
    }
}

/// Short plain-text response, never cached.
pub(crate) fn plain_text(status: StatusCode, body: &'static str) -> Response {
    (
        status,
        [(
            header::CONTENT_TYPE,
            HeaderValue::from_static("text/plain; charset=utf-8"),
        )],
        body,
    )
        .into_response()
}

/// Standard success page response: HTML with an ETag and public caching.
pub(crate) fn page_response(markup: Markup, cache_seconds: u32) -> Response {
    let html = markup.into_string();

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/html; charset=utf-8"),
    );

    // ETag (xxHash of content)
    let hash = xxhash_rust::xxh3::xxh3_64(html.as_bytes());
    let etag = format!("\"{}\"", hex_fmt::HexFmt(&hash.to_be_bytes()));
    if let Ok(value) = HeaderValue::from_str(&etag) {
        headers.insert(header::ETAG, value);
    }

    let cache_value = format!("public, max-age={cache_seconds}");
    if let Ok(value) = HeaderValue::from_str(&cache_value) {
        headers.insert(header::CACHE_CONTROL, value);
    }

    (StatusCode::OK, headers, html).into_response()
}



#[cfg(test)]
mod backend_tests {
    //! End-to-end tests with a stubbed backend on an ephemeral port.

    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use axum::body::Body;
    use axum::http::{Method, Request};
    use axum::routing::get;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use super::*;
    use crate::config::Config;

    async fn spawn_backend(backend: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, backend).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn edge_router(api_base: &str, public_dir: &std::path::Path) -> Router {
        let state = AppState::new(Config {
            port: 0,
            api_base: api_base.to_string(),
            base_url: "https://www.peterbe.com".to_string(),
            public_dir: public_dir.to_path_buf(),
            use_compression: false,
            upstream_retries: 1,
            ga_tracking_id: Some("G-TEST123".to_string()),
            rollbar_access_token: None,
            screensaver_lazy_start_seconds: None,
        })
        .unwrap();
        router(state)
    }

    async fn send(router: Router, uri: &str) -> Response {
        router
            .oneshot(
                Request::builder()
                    .method(Method::GET)
                    .uri(uri)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap()
    }

    async fn body_string(response: Response) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8_lossy(&bytes).into_owned()
    }

    fn json_response(value: serde_json::Value) -> Response {
        (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/json")],
            value.to_string(),
        )
            .into_response()
    }

    fn post_payload() -> serde_json::Value {
        serde_json::json!({
            "post": {
                "oid": "blogitem-20030629-2128",
                "title": "Grep is my friend",
                "pub_date": "2003-06-29T21:28:00Z",
                "url": null,
                "categories": ["Linux"],
                "summary": "",
                "open_graph_image": null,
                "body": "<p>grep -r</p>",
                "hide_comments": false,
                "disallow_comments": false,
                "previous_post": null,
                "next_post": null
            },
            "comments": {
                "truncated": false,
                "count": 1,
                "next_page": null,
                "previous_page": null,
                "tree": [{
                    "id": 1,
                    "oid": "c1",
                    "comment": "<p>nice tip</p>",
                    "add_date": "2003-06-30T08:00:00Z",
                    "depth": 0,
                    "name": "Reader"
                }]
            }
        })
    }

    #[tokio::test]
    async fn category_casing_is_canonicalized_with_a_308() {
        let backend = Router::new().route(
            "/api/v1/plog/homepage",
            get(|| async {
                (
                    StatusCode::MOVED_PERMANENTLY,
                    [(header::LOCATION, "/oc-JavaScript")],
                    "",
                )
            }),
        );
        let base = spawn_backend(backend).await;
        let tmp = tempfile::tempdir().unwrap();

        let response = send(edge_router(&base, tmp.path()), "/oc-jAVAsCRIPT").await;
        assert_eq!(response.status(), StatusCode::PERMANENT_REDIRECT);
        assert_eq!(
            response.headers().get(header::LOCATION).unwrap(),
            "/oc-JavaScript"
        );
    }

    #[tokio::test]
    async fn homepage_renders_and_is_cached_an_hour() {
        let backend = Router::new().route(
            "/api/v1/plog/homepage",
            get(|| async {
                json_response(serde_json::json!({
                    "posts": [{
                        "title": "Grep is my friend",
                        "oid": "blogitem-20030629-2128",
                        "pub_date": "2003-06-29T21:28:00Z",
                        "html": "<p>teaser</p>",
                        "comments": 4,
                        "categories": ["Linux"]
                    }],
                    "next_page": 2,
                    "previous_page": null
                }))
            }),
        );
        let base = spawn_backend(backend).await;
        let tmp = tempfile::tempdir().unwrap();

        let response = send(edge_router(&base, tmp.path()), "/").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CACHE_CONTROL).unwrap(),
            "public, max-age=3600"
        );
        assert!(response.headers().contains_key(header::ETAG));
        let body = body_string(response).await;
        assert!(body.contains("Grep is my friend"));
        assert!(body.contains("G-TEST123"));
        assert!(body.contains("https://www.peterbe.com/"));
    }

    #[tokio::test]
    async fn post_page_renders_with_comments_and_half_day_cache() {
        let backend = Router::new().route(
            "/api/v1/plog/{oid}",
            get(|| async { json_response(post_payload()) }),
        );
        let base = spawn_backend(backend).await;
        let tmp = tempfile::tempdir().unwrap();

        let response = send(edge_router(&base, tmp.path()), "/plog/blogitem-20030629-2128").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CACHE_CONTROL).unwrap(),
            "public, max-age=43200"
        );
        let body = body_string(response).await;
        assert!(body.contains("Grep is my friend"));
        assert!(body.contains("nice tip"));
        assert!(body.contains("1 comment"));
    }

    #[tokio::test]
    async fn unknown_post_is_an_uncached_404() {
        let backend = Router::new().route(
            "/api/v1/plog/{oid}",
            get(|| async { (StatusCode::NOT_FOUND, "Not found") }),
        );
        let base = spawn_backend(backend).await;
        let tmp = tempfile::tempdir().unwrap();

        let response = send(edge_router(&base, tmp.path()), "/plog/thisdoesnotexist").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(response.headers().get(header::CACHE_CONTROL).is_none());
    }

    #[tokio::test]
    async fn search_results_are_memoized_per_query() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        let backend = Router::new().route(
            "/api/v1/search",
            get(move || {
                counter.fetch_add(1, Ordering::SeqCst);
                async {
                    json_response(serde_json::json!({
                        "results": {
                            "count_documents": 1,
                            "count_documents_shown": 1,
                            "documents": [{
                                "oid": "blogitem-20030629-2128",
                                "title": "Grep is my friend",
                                "date": "2003-06-29T21:28:00Z",
                                "comment_oid": null,
                                "summary": "my <mark>grep</mark> tip",
                                "score": 2.5
                            }],
                            "search_time": 0.002,
                            "search_terms": [[1.0, "grep"]]
                        }
                    }))
                }
            }),
        );
        let base = spawn_backend(backend).await;
        let tmp = tempfile::tempdir().unwrap();
        let app = edge_router(&base, tmp.path());

        let response = send(app.clone(), "/search?q=grep").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CACHE_CONTROL).unwrap(),
            "public, max-age=3600"
        );
        let body = body_string(response).await;
        assert!(body.contains("Grep is my friend"));
        assert!(body.contains("<mark>grep</mark>"));

        // Second identical query is answered from the in-process cache.
        let response = send(app, "/search?q=grep").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn unpublished_posts_are_not_cached() {
        let mut payload = post_payload();
        payload["post"]["pub_date"] = serde_json::json!("2999-01-01T00:00:00Z");
        let backend = Router::new().route(
            "/api/v1/plog/{oid}",
            get(move || {
                let payload = payload.clone();
                async move { json_response(payload) }
            }),
        );
        let base = spawn_backend(backend).await;
        let tmp = tempfile::tempdir().unwrap();

        let response = send(edge_router(&base, tmp.path()), "/plog/blogitem-20030629-2128").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CACHE_CONTROL).unwrap(),
            "public, max-age=0"
        );
    }
}
