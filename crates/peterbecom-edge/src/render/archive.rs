//! Archive index page, grouped by month.

use maud::{Markup, html};
use peterbecom_core::Archive;

use crate::config::Config;

use super::components::layout;

pub fn page(config: &Config, archive: &Archive) -> Markup {
    let content = html! {
        h1 { "Blog archive" }
        dl {
            @for group in &archive.groups {
                dt { (group.date) }
                @for post in &group.posts {
                    dd {
                        a href=(format!("/plog/{}", post.oid)) { (post.title) }
                        @if post.comments > 0 {
                            " " span class="comment-count" { "(" (post.comments) " comments)" }
                        }
                    }
                }
            }
        }
    };

    layout(config, "Blog archive - Peterbe.com", "/plog", content)
}
