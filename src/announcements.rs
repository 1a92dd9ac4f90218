use anyhow::{bail, Result};
use chrono::{DateTime, Utc};

use crate::models::{NewAnnouncement, Priority};

pub fn new_announcement(
    title: &str,
    content: &str,
    priority: Priority,
    is_pinned: bool,
    now: DateTime<Utc>,
) -> Result<NewAnnouncement> {
    let title = title.trim();
    let content = content.trim();
    if title.is_empty() || content.is_empty() {
        bail!("an announcement needs a title and content");
    }
    Ok(NewAnnouncement {
        title: title.to_string(),
        content: content.to_string(),
        priority: priority.label().to_string(),
        is_pinned,
        created_at: now,
    })
}
