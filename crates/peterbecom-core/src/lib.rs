//! Shared typed payloads for the peterbe.com edge server.
//!
//! This crate defines the data transfer objects for every backend API
//! response the edge consumes. All payloads crossing the HTTP boundary are
//! deserialized against these types, so a malformed upstream shape fails as
//! a typed error at the boundary instead of leaking into rendering.

pub mod api;

pub use api::{
    Archive, ArchiveGroup, ArchivePost, Comment, Comments, Homepage, HomepagePost, Post,
    PostWithComments, RelatedPost, SearchData, SearchDocument, SearchResults, Song, SongArtist,
    SongData, Truncated,
};
