//! Edge server for peterbe.com.
//!
//! This crate is the HTTP front door for a server-rendered personal blog.
//! It serves static build assets, derives WebP images on demand, filters
//! junk requests, rewrites legacy URLs, reverse-proxies selected path
//! prefixes to the content backend, and renders the pages themselves from
//! backend API payloads. It is designed to sit behind a CDN: every success
//! page carries `Cache-Control` and an `ETag`.
//!
//! # Request pipeline
//!
//! ```text
//! /build/*  -> fingerprinted assets, cached forever
//! /images/* -> WebP deriver, then static files (1 day)
//! proxied   -> robots.txt, sitemap.xml, feeds, /api/*, /cache/*, /events
//! pages     -> legacy redirects -> junk filter -> render (or 404/405)
//! ```
//!
//! Legitimate request outcomes (400, 404) are modeled as responses;
//! infrastructure failures surface as [`error::EdgeError`] and render a
//! generic error page with no internal details.

pub mod config;
pub mod error;
pub mod images;
pub mod junk;
pub mod proxy;
pub mod redirects;
pub mod render;
pub mod routes;
pub mod state;
pub mod upstream;

pub use config::Config;
pub use routes::router;
pub use state::AppState;
