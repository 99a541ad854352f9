//! Shared page chrome: layout, navigation, pagination, date formatting.

use maud::{DOCTYPE, Markup, PreEscaped, html};

use crate::config::Config;

/// Inline CSS for all pages. Kept deliberately small; the real styling
/// arrives with the fingerprinted build assets.
pub const PAGE_CSS: &str = "\
body{font-family:-apple-system,BlinkMacSystemFont,\"Segoe UI\",Roboto,sans-serif;\
line-height:1.6;max-width:48rem;margin:0 auto;padding:0 1rem;color:#1a1a1a}\
a{color:#0069c2;text-decoration:none}a:hover{text-decoration:underline}\
ul.skip-to-nav{position:absolute;left:-9999px}\
nav#site-nav a{margin-right:.75rem}\
.post-meta,.comment-date{color:#666;font-size:.9rem}\
.comment-replies{margin-left:1.5rem;border-left:2px solid #eee;padding-left:1rem}\
.pagination{margin:1.5rem 0}.pagination a{margin-right:1rem}\
footer{margin:3rem 0 1rem;color:#666;font-size:.85rem}";

/// Full page layout: head with canonical link and analytics, skip links,
/// site navigation, main content, footer.
pub fn layout(config: &Config, title: &str, canonical_path: &str, content: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1";
                title { (title) }
                link rel="canonical" href=(format!("{}{}", config.base_url, canonical_path));
                link rel="icon" href="/favicon.ico" sizes="any";
                link rel="apple-touch-icon" href="/apple-touch-icon.png";
                style { (PreEscaped(PAGE_CSS)) }
                @if let Some(tracking_id) = &config.ga_tracking_id {
                    (analytics(tracking_id))
                }
                @if let Some(seconds) = config.screensaver_lazy_start_seconds {
                    script {
                        (PreEscaped(format!("window.SCREENSAVER_LAZY_START_SECONDS={seconds};")))
                    }
                }
            }
            body {
                ul class="skip-to-nav" {
                    li { a href="#main-content" { "Skip to main content" } }
                    li { a href="#site-nav" { "Skip to navigation" } }
                }
                nav id="site-nav" {
                    a href="/" { "Home" }
                    a href="/plog" { "Archive" }
                    a href="/search" { "Search" }
                    a href="/about" { "About" }
                    a href="/contact" { "Contact" }
                }
                main id="main-content" { (content) }
                footer {
                    p { "Peterbe.com - Stuff in Peter's head" }
                }
            }
        }
    }
}

/// Google Analytics snippet.
fn analytics(tracking_id: &str) -> Markup {
    html! {
        script async src=(format!("https://www.googletagmanager.com/gtag/js?id={tracking_id}")) {}
        script {
            (PreEscaped(format!(
                "window.dataLayer=window.dataLayer||[];\
                 function gtag(){{dataLayer.push(arguments);}}\
                 gtag('js',new Date());gtag('config','{tracking_id}');"
            )))
        }
    }
}

/// Previous/next page links.
pub fn pagination(base_path: &str, previous: Option<i64>, next: Option<i64>) -> Markup {
    html! {
        @if previous.is_some() || next.is_some() {
            nav class="pagination" {
                @if let Some(page) = previous {
                    a href=(page_href(base_path, page)) rel="prev" { "Previous page" }
                }
                @if let Some(page) = next {
                    a href=(page_href(base_path, page)) rel="next" { "Next page" }
                }
            }
        }
    }
}

/// Link target for a page of a paginated listing. Page 1 is the bare path.
fn page_href(base_path: &str, page: i64) -> String {
    if page <= 1 {
        if base_path.is_empty() {
            "/".to_string()
        } else {
            base_path.to_string()
        }
    } else {
        format!("{base_path}/p{page}")
    }
}

/// Category link chip.
pub fn category_link(category: &str) -> Markup {
    html! {
        a class="category" href=(format!("/oc-{}", category.replace(' ', "+"))) { (category) }
    }
}

/// Human date from the backend's RFC 3339 timestamps. Falls back to the raw
/// string for anything unparseable.
pub fn display_date(raw: &str) -> String {
    chrono::DateTime::parse_from_rfc3339(raw)
        .map(|date| date.format("%B %-d, %Y").to_string())
        .unwrap_or_else(|_| raw.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_href_elides_page_one() {
        assert_eq!(page_href("", 1), "/");
        assert_eq!(page_href("", 2), "/p2");
        assert_eq!(page_href("/plog/some-post", 1), "/plog/some-post");
        assert_eq!(page_href("/plog/some-post", 3), "/plog/some-post/p3");
        assert_eq!(page_href("/oc-Web+development", 2), "/oc-Web+development/p2");
    }

    #[test]
    fn display_date_formats_rfc3339() {
        assert_eq!(display_date("2004-06-01T12:00:00Z"), "June 1, 2004");
        assert_eq!(display_date("not a date"), "not a date");
    }

    #[test]
    fn layout_includes_analytics_when_configured() {
        let config = Config {
            port: 0,
            api_base: String::new(),
            base_url: "https://www.peterbe.com".to_string(),
            public_dir: "public".into(),
            use_compression: false,
            upstream_retries: 1,
            ga_tracking_id: Some("G-TEST123".to_string()),
            rollbar_access_token: None,
            screensaver_lazy_start_seconds: None,
        };
        let html = layout(&config, "Title", "/about", html! { p { "x" } }).into_string();
        assert!(html.contains("G-TEST123"));
        assert!(html.contains("https://www.peterbe.com/about"));
        assert!(html.contains("skip-to-nav"));
        assert!(html.contains("id=\"main-content\""));
        assert!(html.contains("id=\"site-nav\""));
    }

    #[test]
    fn layout_omits_analytics_by_default() {
        let config = Config {
            port: 0,
            api_base: String::new(),
            base_url: "https://www.peterbe.com".to_string(),
            public_dir: "public".into(),
            use_compression: false,
            upstream_retries: 1,
            ga_tracking_id: None,
            rollbar_access_token: None,
            screensaver_lazy_start_seconds: None,
        };
        let html = layout(&config, "Title", "/", html! {}).into_string();
        assert!(!html.contains("googletagmanager"));
    }
}
