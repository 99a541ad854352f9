//! Homepage listing page.

use maud::{Markup, PreEscaped, html};
use peterbecom_core::Homepage;

use crate::config::Config;
use crate::routes::home::Listing;

use super::components::{category_link, display_date, layout, pagination};

/// Render a (possibly category-filtered, possibly paginated) listing.
pub fn page(config: &Config, listing: &Listing, data: &Homepage) -> Markup {
    let mut title = if listing.categories.is_empty() {
        "Peterbe.com - Stuff in Peter's head".to_string()
    } else {
        format!("{} - Peterbe.com", listing.categories.join(", "))
    };
    if listing.page > 1 {
        title = format!("(Page {}) {title}", listing.page);
    }

    let content = html! {
        @if !listing.categories.is_empty() {
            h1 { "Posts in " (listing.categories.join(", ")) }
        }
        @for post in &data.posts {
            article class="post-teaser" {
                h2 { a href=(format!("/plog/{}", post.oid)) { (post.title) } }
                p class="post-meta" {
                    (display_date(&post.pub_date))
                    " · "
                    (post.comments) " comments"
                    @for category in &post.categories {
                        " " (category_link(category))
                    }
                }
                div class="post-body" { (PreEscaped(&post.html)) }
            }
        }
        @if data.posts.is_empty() {
            p { "No posts to show." }
        }
        (pagination(&listing.base_path(), data.previous_page, data.next_page))
    };

    layout(config, &title, &listing.canonical_path(), content)
}
