use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::{
    Announcement, ChecklistItem, ChecklistResponse, TestQuestion, TestResponse, Video, VideoView,
};

pub const RANKING_LIMIT: usize = 10;
pub const RECENT_PER_SOURCE: usize = 3;
pub const RECENT_OVERALL: usize = 3;

/// A record attributable to a named staff member.
pub trait Actor {
    fn actor_name(&self) -> &str;
}

impl Actor for TestResponse {
    fn actor_name(&self) -> &str {
        &self.user_name
    }
}

impl Actor for VideoView {
    fn actor_name(&self) -> &str {
        &self.user_name
    }
}

impl Actor for ChecklistResponse {
    fn actor_name(&self) -> &str {
        &self.user_name
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankingEntry {
    pub actor_name: String,
    pub count: usize,
}

/// Counts records per actor and returns the busiest ten, most active first.
/// Actors with equal counts stay in the order they first appeared.
pub fn rank_by_actor<R: Actor>(records: &[R]) -> Vec<RankingEntry> {
    let mut positions: HashMap<&str, usize> = HashMap::new();
    let mut entries: Vec<RankingEntry> = Vec::new();

    for record in records {
        let name = record.actor_name();
        match positions.get(name) {
            Some(&index) => entries[index].count += 1,
            None => {
                positions.insert(name, entries.len());
                entries.push(RankingEntry {
                    actor_name: name.to_string(),
                    count: 1,
                });
            }
        }
    }

    entries.sort_by(|a, b| b.count.cmp(&a.count));
    entries.truncate(RANKING_LIMIT);
    entries
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityKind {
    Announcement,
    Video,
    Checklist,
    Test,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActivityEvent {
    pub kind: ActivityKind,
    pub title: String,
    pub description: String,
    pub occurred_at: DateTime<Utc>,
}

/// The four collections feeding the recent-activity feed, each newest first.
/// A source that could not be fetched is simply left empty.
#[derive(Debug, Clone, Default)]
pub struct ActivitySources {
    pub announcements: Vec<Announcement>,
    pub videos: Vec<Video>,
    pub checklist_items: Vec<ChecklistItem>,
    pub test_questions: Vec<TestQuestion>,
}

pub fn merge_recent_activity(
    sources: &ActivitySources,
    per_source_limit: usize,
    overall_limit: usize,
) -> Vec<ActivityEvent> {
    let announcements = sources
        .announcements
        .iter()
        .take(per_source_limit)
        .map(|item| ActivityEvent {
            kind: ActivityKind::Announcement,
            title: item.title.clone(),
            description: "announcement".to_string(),
            occurred_at: item.created_at,
        });
    let videos = sources
        .videos
        .iter()
        .take(per_source_limit)
        .map(|item| ActivityEvent {
            kind: ActivityKind::Video,
            title: item.title.clone(),
            description: "video manual".to_string(),
            occurred_at: item.created_at,
        });
    let checklist = sources
        .checklist_items
        .iter()
        .take(per_source_limit)
        .map(|item| ActivityEvent {
            kind: ActivityKind::Checklist,
            title: item.item_text.clone(),
            description: format!("checklist item ({})", item.category),
            occurred_at: item.created_at,
        });
    let questions = sources
        .test_questions
        .iter()
        .take(per_source_limit)
        .map(|item| ActivityEvent {
            kind: ActivityKind::Test,
            title: item.question.clone(),
            description: "test question".to_string(),
            occurred_at: item.created_at,
        });

    // Stable sort: equal timestamps keep kind order, then source order.
    let mut events: Vec<ActivityEvent> = announcements
        .chain(videos)
        .chain(checklist)
        .chain(questions)
        .collect();
    events.sort_by(|a, b| b.occurred_at.cmp(&a.occurred_at));
    events.truncate(overall_limit);
    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn base_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap()
    }

    fn view(name: &str) -> VideoView {
        VideoView {
            user_name: name.to_string(),
            video_title: "Register basics".to_string(),
            viewed_at: None,
            created_at: base_time(),
        }
    }

    fn views(names: &[&str]) -> Vec<VideoView> {
        names.iter().map(|name| view(name)).collect()
    }

    fn announcement(title: &str, minutes: i64) -> Announcement {
        Announcement {
            id: String::new(),
            title: title.to_string(),
            content: String::new(),
            priority: "中".to_string(),
            is_pinned: false,
            created_at: base_time() + Duration::minutes(minutes),
        }
    }

    fn video(title: &str, minutes: i64) -> Video {
        Video {
            id: String::new(),
            title: title.to_string(),
            youtube_url: "https://www.youtube.com/embed/abc".to_string(),
            thumbnail_url: String::new(),
            category: "basics".to_string(),
            order_num: 1,
            created_at: base_time() + Duration::minutes(minutes),
        }
    }

    fn checklist_item(text: &str, minutes: i64) -> ChecklistItem {
        ChecklistItem {
            id: String::new(),
            category: "Opening".to_string(),
            item_text: text.to_string(),
            order_num: 1,
            created_at: base_time() + Duration::minutes(minutes),
        }
    }

    fn question(text: &str, minutes: i64) -> TestQuestion {
        TestQuestion {
            id: String::new(),
            question: text.to_string(),
            options: "[\"a\",\"b\"]".to_string(),
            correct_answer: 0,
            created_at: base_time() + Duration::minutes(minutes),
        }
    }

    fn titles(events: &[ActivityEvent]) -> Vec<&str> {
        events.iter().map(|event| event.title.as_str()).collect()
    }

    #[test]
    fn ranks_by_frequency() {
        let ranking = rank_by_actor(&views(&["A", "B", "A"]));
        assert_eq!(
            ranking,
            vec![
                RankingEntry { actor_name: "A".to_string(), count: 2 },
                RankingEntry { actor_name: "B".to_string(), count: 1 },
            ]
        );
    }

    #[test]
    fn empty_input_ranks_nothing() {
        let ranking = rank_by_actor::<VideoView>(&[]);
        assert!(ranking.is_empty());
    }

    #[test]
    fn ties_keep_first_appearance_order() {
        let ranking = rank_by_actor(&views(&["Cam", "Ada", "Bo", "Ada", "Cam", "Bo", "Dee"]));
        let names: Vec<&str> = ranking.iter().map(|e| e.actor_name.as_str()).collect();
        assert_eq!(names, vec!["Cam", "Ada", "Bo", "Dee"]);
    }

    #[test]
    fn names_are_compared_exactly() {
        let ranking = rank_by_actor(&views(&["Avery", "avery", "Avery ", "Avery"]));
        assert_eq!(ranking.len(), 3);
        assert_eq!(ranking[0].actor_name, "Avery");
        assert_eq!(ranking[0].count, 2);
    }

    #[test]
    fn counts_sum_to_record_total_for_few_actors() {
        let records = views(&["A", "B", "C", "A", "D", "E", "B", "A", "F", "G", "H", "I", "J"]);
        let ranking = rank_by_actor(&records);
        assert_eq!(ranking.len(), 10);
        let total: usize = ranking.iter().map(|e| e.count).sum();
        assert_eq!(total, records.len());
    }

    #[test]
    fn more_than_ten_actors_keeps_top_ten() {
        let mut names: Vec<String> = Vec::new();
        for actor in 0..12 {
            // actor 0 appears 12 times, actor 11 once
            for _ in 0..(12 - actor) {
                names.push(format!("staff-{actor}"));
            }
        }
        let records: Vec<VideoView> = names.iter().map(|name| view(name)).collect();

        let ranking = rank_by_actor(&records);
        assert_eq!(ranking.len(), RANKING_LIMIT);
        assert_eq!(ranking[0].actor_name, "staff-0");
        assert_eq!(ranking[9].actor_name, "staff-9");
        assert!(ranking.iter().all(|e| e.actor_name != "staff-10"));

        let total: usize = ranking.iter().map(|e| e.count).sum();
        assert_eq!(total, records.len() - 2 - 1);
    }

    #[test]
    fn ranking_is_idempotent() {
        let records = views(&["Kiara", "Jules", "Kiara", "Avery"]);
        assert_eq!(rank_by_actor(&records), rank_by_actor(&records));
    }

    #[test]
    fn single_source_passes_through_in_order() {
        let sources = ActivitySources {
            videos: vec![video("Third", 30), video("Second", 20), video("First", 10)],
            ..Default::default()
        };
        let events = merge_recent_activity(&sources, RECENT_PER_SOURCE, RECENT_OVERALL);
        assert_eq!(titles(&events), vec!["Third", "Second", "First"]);
        assert!(events.iter().all(|e| e.kind == ActivityKind::Video));
        assert!(events.iter().all(|e| e.description == "video manual"));
    }

    #[test]
    fn merges_sources_newest_first() {
        let sources = ActivitySources {
            announcements: vec![announcement("Holiday hours", 50), announcement("Uniforms", 5)],
            videos: vec![video("Register basics", 40)],
            checklist_items: vec![checklist_item("Unlock doors", 60)],
            test_questions: vec![question("Where is the safe?", 1)],
        };
        let events = merge_recent_activity(&sources, RECENT_PER_SOURCE, RECENT_OVERALL);
        assert_eq!(titles(&events), vec!["Unlock doors", "Holiday hours", "Register basics"]);
        assert_eq!(events[0].description, "checklist item (Opening)");
        assert_eq!(events[1].description, "announcement");
    }

    #[test]
    fn equal_timestamps_follow_kind_order() {
        let sources = ActivitySources {
            announcements: vec![announcement("notice", 0)],
            videos: vec![video("clip", 0)],
            checklist_items: vec![checklist_item("task", 0)],
            test_questions: vec![question("quiz", 0)],
        };
        let events = merge_recent_activity(&sources, RECENT_PER_SOURCE, 10);
        let kinds: Vec<ActivityKind> = events.iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![
                ActivityKind::Announcement,
                ActivityKind::Video,
                ActivityKind::Checklist,
                ActivityKind::Test,
            ]
        );
    }

    #[test]
    fn per_source_limit_cuts_each_source() {
        let sources = ActivitySources {
            test_questions: vec![question("q4", 40), question("q3", 30), question("q2", 20)],
            announcements: vec![announcement("a1", 1)],
            ..Default::default()
        };
        let events = merge_recent_activity(&sources, 1, 10);
        assert_eq!(titles(&events), vec!["q4", "a1"]);
        assert_eq!(events[0].description, "test question");
    }

    #[test]
    fn empty_sources_give_empty_feed() {
        let events = merge_recent_activity(&ActivitySources::default(), 3, 3);
        assert!(events.is_empty());
    }

    #[test]
    fn merge_is_idempotent() {
        let sources = ActivitySources {
            announcements: vec![announcement("a", 3)],
            videos: vec![video("v", 3)],
            ..Default::default()
        };
        assert_eq!(
            merge_recent_activity(&sources, 3, 3),
            merge_recent_activity(&sources, 3, 3)
        );
    }
}
