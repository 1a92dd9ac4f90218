use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::aggregate::ActivitySources;
use crate::config::PortalConfig;
use crate::models::{Announcement, ChecklistItem, Page, TestQuestion, Video};

pub const LISTING_LIMIT: usize = 100;
pub const ADMIN_LIMIT: usize = 1000;
pub const EXPORT_LIMIT: usize = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Table {
    Announcements,
    Videos,
    VideoViews,
    ChecklistItems,
    ChecklistResponses,
    TestQuestions,
    TestResponses,
    ShiftVacancies,
    ShiftEntries,
    ShiftPdfLinks,
}

impl Table {
    pub fn as_str(self) -> &'static str {
        match self {
            Table::Announcements => "announcements",
            Table::Videos => "videos",
            Table::VideoViews => "video_views",
            Table::ChecklistItems => "checklist_items",
            Table::ChecklistResponses => "checklist_responses",
            Table::TestQuestions => "test_questions",
            Table::TestResponses => "test_responses",
            Table::ShiftVacancies => "shift_vacancies",
            Table::ShiftEntries => "shift_entries",
            Table::ShiftPdfLinks => "shift_pdf_links",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sort {
    Ascending(&'static str),
    Descending(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListQuery {
    pub limit: usize,
    pub sort: Option<Sort>,
}

impl ListQuery {
    pub fn new(limit: usize) -> Self {
        Self { limit, sort: None }
    }

    pub fn newest_first(limit: usize) -> Self {
        Self {
            limit,
            sort: Some(Sort::Descending("created_at")),
        }
    }

    pub fn sorted_by(limit: usize, field: &'static str) -> Self {
        Self {
            limit,
            sort: Some(Sort::Ascending(field)),
        }
    }

    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![("limit", self.limit.to_string())];
        match self.sort {
            Some(Sort::Ascending(field)) => pairs.push(("sort", field.to_string())),
            Some(Sort::Descending(field)) => pairs.push(("sort", format!("-{field}"))),
            None => {}
        }
        pairs
    }
}

pub fn decode_page<T: DeserializeOwned>(table: Table, body: &str) -> Result<Vec<T>> {
    let page: Page<T> = serde_json::from_str(body)
        .with_context(|| format!("decoding {} records", table.as_str()))?;
    Ok(page.data)
}

/// Client for the `tables/{name}` collection API backing the portal.
#[derive(Debug, Clone)]
pub struct RecordStore {
    client: Client,
    base_url: String,
}

impl RecordStore {
    pub fn new(config: &PortalConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .build()
            .context("failed to build http client")?;
        Ok(Self {
            client,
            base_url: config.api_url.trim_end_matches('/').to_string(),
        })
    }

    fn table_url(&self, table: Table) -> String {
        format!("{}/tables/{}", self.base_url, table.as_str())
    }

    fn record_url(&self, table: Table, id: &str) -> String {
        format!("{}/{}", self.table_url(table), id)
    }

    pub async fn list<T: DeserializeOwned>(
        &self,
        table: Table,
        query: ListQuery,
    ) -> Result<Vec<T>> {
        let url = self.table_url(table);
        debug!(table = table.as_str(), limit = query.limit, "listing records");

        let body = self
            .client
            .get(&url)
            .query(&query.query_pairs())
            .send()
            .await
            .with_context(|| format!("requesting {url}"))?
            .error_for_status()
            .with_context(|| format!("listing {}", table.as_str()))?
            .text()
            .await
            .with_context(|| format!("reading {} response", table.as_str()))?;

        decode_page(table, &body)
    }

    pub async fn create<B: Serialize>(&self, table: Table, record: &B) -> Result<()> {
        let url = self.table_url(table);
        self.client
            .post(&url)
            .json(record)
            .send()
            .await
            .with_context(|| format!("requesting {url}"))?
            .error_for_status()
            .with_context(|| format!("creating {} record", table.as_str()))?;
        debug!(table = table.as_str(), "record created");
        Ok(())
    }

    /// Replaces a record whole; the store keeps no field the body omits.
    pub async fn replace<B: Serialize>(&self, table: Table, id: &str, record: &B) -> Result<()> {
        let url = self.record_url(table, id);
        self.client
            .put(&url)
            .json(record)
            .send()
            .await
            .with_context(|| format!("requesting {url}"))?
            .error_for_status()
            .with_context(|| format!("replacing {} record {id}", table.as_str()))?;
        debug!(table = table.as_str(), id, "record replaced");
        Ok(())
    }

    pub async fn delete(&self, table: Table, id: &str) -> Result<()> {
        let url = self.record_url(table, id);
        self.client
            .delete(&url)
            .send()
            .await
            .with_context(|| format!("requesting {url}"))?
            .error_for_status()
            .with_context(|| format!("deleting {} record {id}", table.as_str()))?;
        debug!(table = table.as_str(), id, "record deleted");
        Ok(())
    }

    /// Fetches the four feed sources concurrently. A source that fails is
    /// logged and left empty so the rest of the feed still renders.
    pub async fn activity_sources(&self, per_source_limit: usize) -> ActivitySources {
        let query = ListQuery::newest_first(per_source_limit);
        let (announcements, videos, checklist_items, test_questions) = tokio::join!(
            self.list::<Announcement>(Table::Announcements, query),
            self.list::<Video>(Table::Videos, query),
            self.list::<ChecklistItem>(Table::ChecklistItems, query),
            self.list::<TestQuestion>(Table::TestQuestions, query),
        );

        ActivitySources {
            announcements: or_empty(Table::Announcements, announcements),
            videos: or_empty(Table::Videos, videos),
            checklist_items: or_empty(Table::ChecklistItems, checklist_items),
            test_questions: or_empty(Table::TestQuestions, test_questions),
        }
    }
}

fn or_empty<T>(table: Table, result: Result<Vec<T>>) -> Vec<T> {
    result.unwrap_or_else(|err| {
        warn!(table = table.as_str(), error = ?err, "source unavailable");
        Vec::new()
    })
}
