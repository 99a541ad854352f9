//! Lyrics song permalink pages.

use maud::{Markup, PreEscaped, html};
use peterbecom_core::Song;

use crate::config::Config;

use super::components::layout;

pub fn page(config: &Config, canonical_path: &str, song: &Song) -> Markup {
    let title = format!(
        "\"{}\" by \"{}\" - Find song by lyrics",
        song.name, song.artist.name
    );

    let content = html! {
        article class="song" {
            h1 { (song.name) }
            p class="post-meta" {
                "by " b { (song.artist.name) }
                @if let Some(year) = song.year { " (" (year) ")" }
            }
            @if let Some(image_url) = &song.image_url {
                img src=(image_url) alt=(format!("{} album art", song.name));
            }
            div class="song-lyrics" { (PreEscaped(&song.text_html)) }
            p {
                a href="/plog/blogitem-040601-1" { "Back to finding songs by lyrics" }
            }
        }
    };

    layout(config, &title, canonical_path, content)
}

/// Song lookup misses render a small page instead of a bare 404, so the
/// lyrics post stays one click away.
pub fn error_page(config: &Config, message: &str) -> Markup {
    let content = html! {
        h1 { (message) }
        p {
            a href="/plog/blogitem-040601-1" { "Back to finding songs by lyrics" }
        }
    };
    layout(config, message, "/plog/blogitem-040601-1", content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use peterbecom_core::SongArtist;

    #[test]
    fn song_page_titles_match_the_lookup() {
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
        let song = Song {
            id: 123,
            name: "Everlong".to_string(),
            artist: SongArtist {
                name: "Foo Fighters".to_string(),
            },
            text_html: "<p>Hello</p>".to_string(),
            year: Some(1997),
            image_url: None,
        };
        let html = page(
            &config,
            "/plog/blogitem-040601-1/song/foo-fighters/everlong/123",
            &song,
        )
        .into_string();
        assert!(html.contains("Everlong"));
        assert!(html.contains("Foo Fighters"));
        assert!(html.contains("(1997)"));
    }
}
