use anyhow::{bail, Result};
use chrono::{DateTime, Utc};
use tracing::debug;

use crate::embed;
use crate::models::{NewVideo, NewVideoView, Video};

/// Categories in the order their first video appears.
pub fn categories(videos: &[Video]) -> Vec<&str> {
    let mut seen: Vec<&str> = Vec::new();
    for video in videos {
        if !seen.contains(&video.category.as_str()) {
            seen.push(&video.category);
        }
    }
    seen
}

pub fn player_url(video: &Video) -> String {
    embed::normalize(&video.youtube_url)
        .canonical_url()
        .unwrap_or(&video.youtube_url)
        .to_string()
}

/// The stored thumbnail, else the preview image of the linked video.
pub fn thumbnail(video: &Video) -> Option<String> {
    let stored = video.thumbnail_url.trim();
    if !stored.is_empty() {
        return Some(stored.to_string());
    }
    embed::normalize(&video.youtube_url)
        .thumbnail_url()
        .map(str::to_string)
}

pub fn new_video(
    title: &str,
    embed_code: &str,
    category: &str,
    order_num: i64,
    thumbnail: Option<&str>,
) -> Result<NewVideo> {
    let reference = embed::normalize(embed_code);
    let (Some(youtube_url), Some(default_thumbnail)) =
        (reference.canonical_url(), reference.thumbnail_url())
    else {
        bail!(
            "no video id found in {embed_code:?}; accepted formats: <iframe> embed code, youtube.com/watch?v=..., youtu.be/..."
        );
    };
    if title.trim().is_empty() {
        bail!("video title is empty");
    }
    debug!(video_id = ?reference.video_id(), "embed code recognised");

    Ok(NewVideo {
        title: title.trim().to_string(),
        youtube_url: youtube_url.to_string(),
        thumbnail_url: thumbnail
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(default_thumbnail)
            .to_string(),
        category: category.trim().to_string(),
        order_num,
    })
}

/// View record logged each time a staff member opens a video.
pub fn view_record(video: &Video, user_name: &str, viewed_at: DateTime<Utc>) -> Result<NewVideoView> {
    let user_name = user_name.trim();
    if user_name.is_empty() {
        bail!("a user name is required to log a video view");
    }
    Ok(NewVideoView {
        user_name: user_name.to_string(),
        video_id: video.id.clone(),
        video_title: video.title.clone(),
        viewed_at,
    })
}
