//! Blog post page: body, neighbours, related posts, and the comment tree.

use maud::{Markup, PreEscaped, html};
use peterbecom_core::{Comment, Comments, Post, PostWithComments, RelatedPost};

use crate::config::Config;

use super::components::{category_link, display_date, layout, pagination};

/// Hard ceiling on comment nesting. The backend limits depth long before
/// this; the guard keeps a malformed payload from recursing unboundedly.
const MAX_COMMENT_DEPTH: usize = 50;

/// Render a post with its paginated comment tree.
pub fn page(config: &Config, data: &PostWithComments, page: u32) -> Markup {
    let post = &data.post;

    let mut title = post.title.clone();
    if page > 1 {
        title.push_str(&format!(" (page {page})"));
    }
    title.push_str(" - Peterbe.com");

    let base_path = format!("/plog/{}", post.oid);
    let canonical_path = if page > 1 {
        format!("{base_path}/p{page}")
    } else {
        base_path.clone()
    };

    let content = html! {
        article class="post" {
            h1 { (post.title) }
            p class="post-meta" {
                (display_date(&post.pub_date))
                @for category in &post.categories {
                    " " (category_link(category))
                }
            }
            @if post.archived == Some(true) {
                p class="archived-notice" {
                    em { "This post is archived. The content might be outdated." }
                }
            }
            div class="post-body" { (PreEscaped(&post.body)) }
            @if let Some(url) = &post.url {
                p class="post-url" { a href=(url) rel="nofollow" { (url) } }
            }
        }
        (neighbours(post))
        (related(post))
        @if !post.hide_comments {
            (comments_section(&data.comments, post.disallow_comments))
        }
        (pagination(&base_path, data.comments.previous_page, data.comments.next_page))
    };

    layout(config, &title, &canonical_path, content)
}

/// Previous/next post links.
fn neighbours(post: &Post) -> Markup {
    html! {
        @if post.previous_post.is_some() || post.next_post.is_some() {
            nav class="post-neighbours" {
                @if let Some(previous) = &post.previous_post {
                    p { "Previous: " (related_link(previous)) }
                }
                @if let Some(next) = &post.next_post {
                    p { "Next: " (related_link(next)) }
                }
            }
        }
    }
}

/// Related-posts block, when the backend sent any.
fn related(post: &Post) -> Markup {
    let by_category = post.related_by_category.as_deref().unwrap_or_default();
    let by_keyword = post.related_by_keyword.as_deref().unwrap_or_default();
    html! {
        @if !by_category.is_empty() || !by_keyword.is_empty() {
            aside class="related-posts" {
                h2 { "Related posts" }
                ul {
                    @for related in by_category { li { (related_link(related)) } }
                    @for related in by_keyword { li { (related_link(related)) } }
                }
            }
        }
    }
}

fn related_link(related: &RelatedPost) -> Markup {
    html! {
        a href=(format!("/plog/{}", related.oid)) { (related.title) }
    }
}

/// The comment tree with count, truncation notice, and recursive replies.
fn comments_section(comments: &Comments, disallow_comments: bool) -> Markup {
    html! {
        section id="comments" {
            h2 {
                @if comments.count == 1 { "1 comment" } @else { (comments.count) " comments" }
            }
            @if comments.truncated.is_truncated() {
                p class="comments-truncated" {
                    "Only showing a page of comments. Use the pagination links for the rest."
                }
            }
            @for comment in &comments.tree {
                (comment_node(comment, 0))
            }
            @if disallow_comments {
                p class="comments-closed" { em { "Comments are closed for this post." } }
            }
        }
    }
}

/// One comment and, recursively, its replies.
fn comment_node(comment: &Comment, depth: usize) -> Markup {
    if depth >= MAX_COMMENT_DEPTH {
        return html! {};
    }
    html! {
        div class="comment" id=(format!("comment-{}", comment.id)) {
            p class="comment-meta" {
                b { (comment.name.as_deref().filter(|name| !name.is_empty()).unwrap_or("Anonymous")) }
                " "
                span class="comment-date" { (display_date(&comment.add_date)) }
                @if comment.not_approved == Some(true) {
                    " " em { "(not yet approved)" }
                }
            }
            div class="comment-text" { (PreEscaped(&comment.comment)) }
            @if let Some(replies) = &comment.replies {
                @if !replies.is_empty() {
                    div class="comment-replies" {
                        @for reply in replies {
                            (comment_node(reply, depth + 1))
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use peterbecom_core::Truncated;

    fn comment(id: i64, text: &str, replies: Option<Vec<Comment>>) -> Comment {
        Comment {
            id,
            oid: format!("c{id}"),
            comment: format!("<p>{text}</p>"),
            add_date: "2020-01-15T10:00:00Z".to_string(),
            not_approved: None,
            depth: 0,
            name: None,
            replies,
            hash: None,
        }
    }

    #[test]
    fn comment_tree_renders_replies_nested() {
        let tree = comment(1, "parent", Some(vec![comment(2, "child", None)]));
        let html = comment_node(&tree, 0).into_string();
        assert!(html.contains("comment-1"));
        assert!(html.contains("comment-2"));
        assert!(html.contains("comment-replies"));
        assert!(html.contains("Anonymous"));
    }

    #[test]
    fn comment_recursion_is_depth_limited() {
        // Build a chain deeper than the limit.
        let mut node = comment(0, "leaf", None);
        for id in 1..=(MAX_COMMENT_DEPTH as i64 + 10) {
            node = comment(id, "level", Some(vec![node]));
        }
        let html = comment_node(&node, 0).into_string();
        // The outermost comments render; the deepest do not.
        assert!(html.contains(&format!("comment-{}", MAX_COMMENT_DEPTH as i64 + 10)));
        assert!(!html.contains("comment-0\""));
    }

    #[test]
    fn comments_section_counts_and_truncation() {
        let comments = Comments {
            truncated: Truncated::Flag(true),
            count: 1,
            next_page: None,
            previous_page: None,
            tree: vec![comment(1, "only", None)],
            total_pages: Some(1),
        };
        let html = comments_section(&comments, false).into_string();
        assert!(html.contains("1 comment"));
        assert!(html.contains("Only showing a page of comments"));
    }
}
