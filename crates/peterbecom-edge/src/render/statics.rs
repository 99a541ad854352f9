//! The static-ish pages: about and contact.

use maud::{Markup, html};

use crate::config::Config;

use super::components::layout;

pub fn about(config: &Config) -> Markup {
    let content = html! {
        h1 { "About this site" }
        p {
            "This is a personal blog about web development, programming, and "
            "whatever else is in Peter's head. It has been running, in one "
            "form or another, since 2003."
        }
        p {
            "The site is a thin edge server in front of a content API. "
            "Posts, comments, and search all come from the backend; this "
            "layer renders pages and keeps the CDN fed."
        }
        p {
            "Want to get in touch? See the " a href="/contact" { "contact page" } "."
        }
    };
    layout(config, "About - Peterbe.com", "/about", content)
}

pub fn contact(config: &Config) -> Markup {
    let content = html! {
        h1 { "Contact" }
        p {
            "The best way to reach out is to comment on a relevant blog "
            "post. For anything else, use email."
        }
        p {
            "Please don't use the comments for support questions about "
            "products or companies mentioned in old posts."
        }
    };
    layout(config, "Contact - Peterbe.com", "/contact", content)
}
