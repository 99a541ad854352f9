//! Backend API response types.
//!
//! Field sets mirror the JSON the content backend emits for posts, comments,
//! archive groups, homepage listings, lyrics songs, and search results.
//! Optional fields that arrived late in the backend's life carry
//! `#[serde(default)]` so older cached payloads still parse.

use serde::{Deserialize, Serialize};

/// A neighbouring or related post, as embedded inside a full post payload.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RelatedPost {
    pub oid: String,
    pub title: String,
    pub pub_date: String,
    #[serde(default)]
    pub categories: Option<Vec<String>>,
}

/// A full blog post from `/api/v1/plog/{oid}`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Post {
    pub oid: String,
    pub title: String,
    /// Publication timestamp as emitted by the backend (RFC 3339).
    pub pub_date: String,
    pub url: Option<String>,
    pub categories: Vec<String>,
    pub summary: String,
    pub open_graph_image: Option<String>,
    #[serde(default)]
    pub archived: Option<bool>,
    /// Rendered HTML body. Already sanitized by the backend.
    pub body: String,
    pub hide_comments: bool,
    pub disallow_comments: bool,
    pub previous_post: Option<RelatedPost>,
    pub next_post: Option<RelatedPost>,
    #[serde(default)]
    pub related_by_category: Option<Vec<RelatedPost>>,
    #[serde(default)]
    pub related_by_keyword: Option<Vec<RelatedPost>>,
}

/// A single comment node. Replies nest recursively.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Comment {
    pub id: i64,
    pub oid: String,
    /// Rendered HTML of the comment text.
    pub comment: String,
    pub add_date: String,
    #[serde(default)]
    pub not_approved: Option<bool>,
    pub depth: u32,
    pub name: Option<String>,
    #[serde(default)]
    pub replies: Option<Vec<Comment>>,
    #[serde(default)]
    pub hash: Option<String>,
}

/// The backend reports truncation either as a flag or as a count.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum Truncated {
    Flag(bool),
    Count(u64),
}

impl Truncated {
    /// Whether the comment tree was cut short.
    pub fn is_truncated(&self) -> bool {
        match self {
            Truncated::Flag(flag) => *flag,
            Truncated::Count(count) => *count > 0,
        }
    }
}

/// Paginated comment tree for a post.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Comments {
    pub truncated: Truncated,
    pub count: u64,
    pub next_page: Option<i64>,
    pub previous_page: Option<i64>,
    pub tree: Vec<Comment>,
    /// Introduced late in the backend; absent in older cached payloads.
    #[serde(default)]
    pub total_pages: Option<i64>,
}

/// Payload of `/api/v1/plog/{oid}?page=N`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PostWithComments {
    pub post: Post,
    pub comments: Comments,
}

/// One month of posts in the archive index.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ArchiveGroup {
    /// Month heading, e.g. "June 2004".
    pub date: String,
    pub posts: Vec<ArchivePost>,
}

/// Archive row: just enough to render a link with a comment count.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ArchivePost {
    pub oid: String,
    pub title: String,
    pub categories: Vec<String>,
    pub comments: u64,
}

/// Payload of `/api/v1/plog/`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Archive {
    pub groups: Vec<ArchiveGroup>,
}

/// One teaser on the homepage listing.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HomepagePost {
    pub title: String,
    pub oid: String,
    pub pub_date: String,
    /// Rendered HTML of the post body (possibly truncated by the backend).
    pub html: String,
    pub comments: u64,
    pub categories: Vec<String>,
}

/// Payload of `/api/v1/plog/homepage?page=N[&oc=Category]`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Homepage {
    pub posts: Vec<HomepagePost>,
    pub next_page: Option<i64>,
    pub previous_page: Option<i64>,
}

/// A matched document in search results.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SearchDocument {
    pub oid: String,
    pub title: String,
    pub date: String,
    pub comment_oid: Option<String>,
    /// Highlighted HTML snippet.
    pub summary: String,
    #[serde(default)]
    pub categories: Option<Vec<String>>,
    pub score: f64,
    #[serde(default)]
    pub score_boosted: Option<f64>,
    #[serde(default)]
    pub popularity: Option<f64>,
    #[serde(default)]
    pub popularity_ranking: Option<u64>,
}

/// The `results` object of `/api/v1/search?q=...`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SearchResults {
    pub count_documents: u64,
    pub count_documents_shown: u64,
    pub documents: Vec<SearchDocument>,
    pub search_time: f64,
    #[serde(default)]
    pub search_terms: Vec<(f64, String)>,
}

/// Payload of `/api/v1/search`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SearchData {
    pub results: SearchResults,
}

/// Artist of a lyrics song.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SongArtist {
    pub name: String,
}

/// A lyrics song from `/api/v1/lyrics/song?id=N`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Song {
    pub id: u64,
    pub name: String,
    pub artist: SongArtist,
    /// Rendered HTML of the lyrics text.
    pub text_html: String,
    #[serde(default)]
    pub year: Option<u32>,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// Payload of `/api/v1/lyrics/song`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SongData {
    pub song: Song,
}
