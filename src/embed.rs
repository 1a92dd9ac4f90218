//! Turns whatever an administrator pastes into the video form (a share link,
//! a watch URL or a full `<iframe>` snippet) into one canonical player URL.

use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

const CANONICAL_HOST: &str = "www.youtube.com";
const IMAGE_HOST: &str = "img.youtube.com";

/// Result of [`normalize`]. The derived URLs exist exactly when an id was found.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmbedReference {
    raw_input: String,
    video_id: Option<String>,
    canonical_url: Option<String>,
    thumbnail_url: Option<String>,
}

impl EmbedReference {
    pub fn video_id(&self) -> Option<&str> {
        self.video_id.as_deref()
    }

    pub fn canonical_url(&self) -> Option<&str> {
        self.canonical_url.as_deref()
    }

    pub fn thumbnail_url(&self) -> Option<&str> {
        self.thumbnail_url.as_deref()
    }

    pub fn is_match(&self) -> bool {
        self.video_id.is_some()
    }
}

type Matcher = fn(&str) -> Option<&str>;

/// Tried in order; the first matcher that yields an id wins.
const MATCHERS: [Matcher; 3] = [embed_path, watch_param, short_link];

pub fn normalize(raw_input: &str) -> EmbedReference {
    let working_url = iframe_src(raw_input).unwrap_or_else(|| raw_input.trim());
    let video_id = MATCHERS.iter().find_map(|matcher| matcher(working_url));

    match video_id {
        Some(id) => EmbedReference {
            raw_input: raw_input.to_string(),
            video_id: Some(id.to_string()),
            canonical_url: Some(format!("https://{CANONICAL_HOST}/embed/{id}")),
            thumbnail_url: Some(format!("https://{IMAGE_HOST}/vi/{id}/hqdefault.jpg")),
        },
        None => EmbedReference {
            raw_input: raw_input.to_string(),
            video_id: None,
            canonical_url: None,
            thumbnail_url: None,
        },
    }
}

fn first_capture<'a>(
    cell: &'static OnceLock<Regex>,
    pattern: &str,
    haystack: &'a str,
) -> Option<&'a str> {
    cell.get_or_init(|| Regex::new(pattern).expect("embed pattern"))
        .captures(haystack)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

fn iframe_src(input: &str) -> Option<&str> {
    static RE: OnceLock<Regex> = OnceLock::new();
    first_capture(&RE, r#"(?i)<iframe[^>]+src=["']([^"']+)["']"#, input)
}

fn embed_path(url: &str) -> Option<&str> {
    static RE: OnceLock<Regex> = OnceLock::new();
    first_capture(&RE, r"/embed/([A-Za-z0-9_-]+)", url)
}

fn watch_param(url: &str) -> Option<&str> {
    static RE: OnceLock<Regex> = OnceLock::new();
    first_capture(&RE, r"[?&]v=([A-Za-z0-9_-]+)", url)
}

fn short_link(url: &str) -> Option<&str> {
    static RE: OnceLock<Regex> = OnceLock::new();
    first_capture(&RE, r"youtu\.be/([A-Za-z0-9_-]+)", url)
}
