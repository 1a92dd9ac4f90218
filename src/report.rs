use std::fmt::Write;

use chrono::{DateTime, Utc};

use crate::aggregate::{ActivityEvent, RankingEntry};
use crate::models::{Announcement, Priority};

pub const TITLE_DISPLAY_LIMIT: usize = 50;

/// Pinned announcements float to the top; otherwise the fetched order is kept.
pub fn pinned_first(announcements: &mut [Announcement]) {
    announcements.sort_by_key(|announcement| !announcement.is_pinned);
}

pub fn truncate_title(title: &str, limit: usize) -> String {
    let mut chars = title.chars();
    let head: String = chars.by_ref().take(limit).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}

pub fn time_ago(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let elapsed = now - then;
    let minutes = elapsed.num_minutes();
    let hours = elapsed.num_hours();
    let days = elapsed.num_days();

    if minutes < 1 {
        "just now".to_string()
    } else if minutes < 60 {
        format!("{minutes}m ago")
    } else if hours < 24 {
        format!("{hours}h ago")
    } else if days < 7 {
        format!("{days}d ago")
    } else {
        then.format("%b %-d").to_string()
    }
}

pub fn announcement_line(announcement: &Announcement) -> String {
    let priority = Priority::from_label(&announcement.priority);
    let pin = if announcement.is_pinned { "[pinned] " } else { "" };
    format!(
        "{}{} (priority {}, {})",
        pin,
        announcement.title,
        priority.as_str(),
        announcement.created_at.format("%Y-%m-%d %H:%M")
    )
}

pub fn update_line(event: &ActivityEvent, now: DateTime<Utc>) -> String {
    format!(
        "{} [{}] {}",
        truncate_title(&event.title, TITLE_DISPLAY_LIMIT),
        event.description,
        time_ago(event.occurred_at, now)
    )
}

pub fn ranking_line(position: usize, entry: &RankingEntry, unit: &str) -> String {
    format!("{}. {}: {} {}", position, entry.actor_name, entry.count, unit)
}

pub fn build_report(
    announcements: &[Announcement],
    updates: &[ActivityEvent],
    test_ranking: &[RankingEntry],
    video_ranking: &[RankingEntry],
    now: DateTime<Utc>,
) -> String {
    let mut output = String::new();

    let _ = writeln!(output, "# Staff Portal Digest");
    let _ = writeln!(output, "Generated {}", now.format("%Y-%m-%d %H:%M UTC"));
    let _ = writeln!(output);
    let _ = writeln!(output, "## Announcements");

    let mut ordered = announcements.to_vec();
    pinned_first(&mut ordered);

    if ordered.is_empty() {
        let _ = writeln!(output, "No announcements right now.");
    } else {
        for announcement in ordered.iter() {
            let _ = writeln!(output, "- {}", announcement_line(announcement));
            if !announcement.content.trim().is_empty() {
                let _ = writeln!(output, "  {}", announcement.content.trim());
            }
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Recent Updates");

    if updates.is_empty() {
        let _ = writeln!(output, "No recent updates.");
    } else {
        for event in updates {
            let _ = writeln!(output, "- {}", update_line(event, now));
        }
    }

    write_ranking(&mut output, "Quiz Challenge Ranking", test_ranking, "attempts");
    write_ranking(&mut output, "Video View Ranking", video_ranking, "views");

    output
}

fn write_ranking(output: &mut String, heading: &str, ranking: &[RankingEntry], unit: &str) {
    let _ = writeln!(output);
    let _ = writeln!(output, "## {heading}");

    if ranking.is_empty() {
        let _ = writeln!(output, "No data yet.");
        return;
    }

    for (index, entry) in ranking.iter().enumerate() {
        let _ = writeln!(output, "{}", ranking_line(index + 1, entry, unit));
    }
}
