use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Envelope returned by every `GET tables/{name}` call.
#[derive(Debug, Clone, Deserialize)]
pub struct Page<T> {
    pub data: Vec<T>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Announcement {
    #[serde(default)]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub priority: String,
    #[serde(default)]
    pub is_pinned: bool,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewAnnouncement {
    pub title: String,
    pub content: String,
    pub priority: String,
    pub is_pinned: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    /// Stored labels are free text; anything unrecognised is treated as low.
    pub fn from_label(label: &str) -> Self {
        match label.trim() {
            "高" => Priority::High,
            "中" => Priority::Medium,
            other if other.eq_ignore_ascii_case("high") => Priority::High,
            other if other.eq_ignore_ascii_case("medium") => Priority::Medium,
            _ => Priority::Low,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }

    /// Label written to the store.
    pub fn label(self) -> &'static str {
        match self {
            Priority::High => "高",
            Priority::Medium => "中",
            Priority::Low => "低",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Video {
    #[serde(default)]
    pub id: String,
    pub title: String,
    pub youtube_url: String,
    #[serde(default)]
    pub thumbnail_url: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub order_num: i64,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewVideo {
    pub title: String,
    pub youtube_url: String,
    pub thumbnail_url: String,
    pub category: String,
    pub order_num: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct VideoView {
    pub user_name: String,
    #[serde(default)]
    pub video_title: String,
    #[serde(default, with = "timestamp::option")]
    pub viewed_at: Option<DateTime<Utc>>,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewVideoView {
    pub user_name: String,
    pub video_id: String,
    pub video_title: String,
    pub viewed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChecklistItem {
    #[serde(default)]
    pub id: String,
    pub category: String,
    pub item_text: String,
    #[serde(default)]
    pub order_num: i64,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewChecklistItem {
    pub item_text: String,
    pub category: String,
    pub order_num: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChecklistResponse {
    pub user_name: String,
    pub category: String,
    /// JSON object of item text to checked flag.
    pub responses: String,
    #[serde(default, with = "timestamp::option")]
    pub submitted_at: Option<DateTime<Utc>>,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewChecklistResponse {
    pub user_name: String,
    pub category: String,
    pub responses: String,
    pub submitted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TestQuestion {
    #[serde(default)]
    pub id: String,
    pub question: String,
    /// JSON array of option labels.
    pub options: String,
    pub correct_answer: usize,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewTestQuestion {
    pub question: String,
    pub options: String,
    pub correct_answer: usize,
    pub order_num: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TestResponse {
    pub user_name: String,
    #[serde(default)]
    pub test_name: String,
    pub score: u32,
    pub total_questions: u32,
    #[serde(default, with = "timestamp::option")]
    pub submitted_at: Option<DateTime<Utc>>,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewTestResponse {
    pub user_name: String,
    pub test_name: String,
    pub score: u32,
    pub total_questions: u32,
    pub responses: String,
    pub submitted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ShiftVacancy {
    pub id: String,
    pub shift_date: NaiveDate,
    pub time_slot: String,
    pub job_description: String,
    #[serde(default)]
    pub notes: String,
    pub hourly_wage: i64,
    #[serde(default)]
    pub is_filled: bool,
}

/// Full vacancy body, used both to create a slot and to replace one.
#[derive(Debug, Clone, Serialize)]
pub struct NewShiftVacancy {
    pub shift_date: NaiveDate,
    pub time_slot: String,
    pub job_description: String,
    pub notes: String,
    pub hourly_wage: i64,
    pub is_filled: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ShiftEntry {
    pub id: String,
    pub vacancy_id: String,
    pub user_name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewShiftEntry {
    pub vacancy_id: String,
    pub user_name: String,
    pub entry_time: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ShiftPdfLink {
    #[serde(default)]
    pub id: String,
    pub title: String,
    pub pdf_url: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewShiftPdfLink {
    pub title: String,
    pub pdf_url: String,
    pub display_order: i64,
    pub updated_at: DateTime<Utc>,
}

/// Record timestamps arrive either as epoch milliseconds or as RFC 3339 text.
pub mod timestamp {
    use chrono::{DateTime, TimeZone, Utc};
    use serde::de::Error;
    use serde::{Deserialize, Deserializer};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Millis(i64),
        Text(String),
    }

    fn convert<E: Error>(raw: Raw) -> Result<DateTime<Utc>, E> {
        match raw {
            Raw::Millis(ms) => Utc
                .timestamp_millis_opt(ms)
                .single()
                .ok_or_else(|| E::custom(format!("timestamp out of range: {ms}"))),
            Raw::Text(text) => DateTime::parse_from_rfc3339(text.trim())
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|err| E::custom(format!("invalid timestamp {text:?}: {err}"))),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        convert(Raw::deserialize(deserializer)?)
    }

    pub mod option {
        use super::{convert, Raw};
        use chrono::{DateTime, Utc};
        use serde::{Deserialize, Deserializer};

        pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
        where
            D: Deserializer<'de>,
        {
            match Option::<Raw>::deserialize(deserializer)? {
                Some(raw) => convert(raw).map(Some),
                None => Ok(None),
            }
        }
    }
}
