//! Search page: form, results, and lookup errors.

use std::sync::Arc;

use maud::{Markup, PreEscaped, html};
use peterbecom_core::SearchData;

use crate::config::Config;

use super::components::{display_date, layout};

/// Render the search page.
///
/// `outcome` is `None` when no query was given (the bare form), otherwise
/// the fetched results or a user-facing lookup error.
pub fn page(
    config: &Config,
    q: Option<&str>,
    debug: bool,
    outcome: Option<Result<Arc<SearchData>, String>>,
) -> Markup {
    let title = match q {
        Some(q) => format!("Searching for {q:?}"),
        None => "Searching on Peterbe.com".to_string(),
    };

    let content = html! {
        h1 { "Search" }
        form action="/search" method="get" {
            input type="search" name="q" value=(q.unwrap_or("")) placeholder="Search the blog" aria-label="Search terms";
            button type="submit" { "Search" }
        }
        @match outcome {
            None => {}
            Some(Err(message)) => {
                p class="search-error" { (message) }
            }
            Some(Ok(data)) => {
                (results(&data, debug))
            }
        }
    };

    layout(config, &title, "/search", content)
}

fn results(data: &SearchData, debug: bool) -> Markup {
    let results = &data.results;
    html! {
        p class="search-summary" {
            (results.count_documents_shown) " of " (results.count_documents)
            " results in " (format!("{:.1}", results.search_time * 1000.0)) "ms"
        }
        @for document in &results.documents {
            article class="search-result" {
                h3 {
                    @if let Some(comment_oid) = &document.comment_oid {
                        a href=(format!("/plog/{}#{}", document.oid, comment_oid)) { "Comment on " (document.title) }
                    } @else {
                        a href=(format!("/plog/{}", document.oid)) { (document.title) }
                    }
                }
                p class="post-meta" { (display_date(&document.date)) }
                p class="search-snippet" { (PreEscaped(&document.summary)) }
                @if debug {
                    p class="search-debug" {
                        code {
                            "score=" (document.score)
                            @if let Some(boosted) = document.score_boosted { " boosted=" (boosted) }
                            @if let Some(popularity) = document.popularity { " popularity=" (popularity) }
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
    use peterbecom_core::{SearchDocument, SearchResults};

    fn test_config() -> Config {
        Config {
            port: 0,
            api_base: String::new(),
            base_url: "https://www.peterbe.com".to_string(),
            public_dir: "public".into(),
            use_compression: false,
            upstream_retries: 1,
            ga_tracking_id: None,
            rollbar_access_token: None,
            screensaver_lazy_start_seconds: None,
        }
    }

    fn sample_data() -> Arc<SearchData> {
        Arc::new(SearchData {
            results: SearchResults {
                count_documents: 2,
                count_documents_shown: 1,
                documents: vec![SearchDocument {
                    oid: "a-post".to_string(),
                    title: "A post".to_string(),
                    date: "2020-01-15T10:00:00Z".to_string(),
                    comment_oid: None,
                    summary: "matched <mark>term</mark>".to_string(),
                    categories: None,
                    score: 1.5,
                    score_boosted: None,
                    popularity: None,
                    popularity_ranking: None,
                }],
                search_time: 0.0123,
                search_terms: vec![(1.0, "term".to_string())],
            },
        })
    }

    #[test]
    fn bare_form_without_query() {
        let html = page(&test_config(), None, false, None).into_string();
        assert!(html.contains("Searching on Peterbe.com"));
        assert!(!html.contains("search-summary"));
    }

    #[test]
    fn results_render_with_counts() {
        let html = page(&test_config(), Some("term"), false, Some(Ok(sample_data()))).into_string();
        assert!(html.contains("1 of 2 results"));
        assert!(html.contains("<mark>term</mark>"));
        assert!(!html.contains("search-debug"));
    }

    #[test]
    fn debug_mode_shows_scores() {
        let html = page(&test_config(), Some("term"), true, Some(Ok(sample_data()))).into_string();
        assert!(html.contains("search-debug"));
        assert!(html.contains("score=1.5"));
    }

    #[test]
    fn lookup_errors_render_in_page() {
        let html = page(
            &test_config(),
            Some("term"),
            false,
            Some(Err("Search failed (400)".to_string())),
        )
        .into_string();
        assert!(html.contains("Search failed (400)"));
    }
}
