//! HTML rendering for the edge server's pages.
//!
//! All rendering uses [maud](https://maud.lambda.xyz/) for compile-time HTML
//! generation with automatic escaping. The only pre-escaped fragments are
//! HTML bodies the backend already rendered and sanitized (post bodies,
//! comment texts, search snippets).

pub mod archive;
pub mod components;
pub mod home;
pub mod post;
pub mod search;
pub mod song;
pub mod statics;
