use std::path::Path;

use anyhow::{anyhow, Context, Result};
use csv::{QuoteStyle, Terminator, WriterBuilder};

use crate::models::{ChecklistResponse, TestResponse, VideoView};
use crate::quiz;

/// Spreadsheet tools need the BOM to pick UTF-8 for non-ASCII names.
const UTF8_BOM: &str = "\u{feff}";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvTable {
    pub headers: Vec<&'static str>,
    pub rows: Vec<Vec<String>>,
}

pub fn checklist_table(records: &[ChecklistResponse]) -> CsvTable {
    CsvTable {
        headers: vec!["Submitted At", "User", "Category", "Responses"],
        rows: records
            .iter()
            .map(|record| {
                vec![
                    record
                        .submitted_at
                        .unwrap_or(record.created_at)
                        .format(TIMESTAMP_FORMAT)
                        .to_string(),
                    record.user_name.clone(),
                    record.category.clone(),
                    record.responses.clone(),
                ]
            })
            .collect(),
    }
}

pub fn test_table(records: &[TestResponse]) -> CsvTable {
    CsvTable {
        headers: vec![
            "Submitted At",
            "User",
            "Test",
            "Score",
            "Total Questions",
            "Accuracy",
        ],
        rows: records
            .iter()
            .map(|record| {
                vec![
                    record
                        .submitted_at
                        .unwrap_or(record.created_at)
                        .format(TIMESTAMP_FORMAT)
                        .to_string(),
                    record.user_name.clone(),
                    record.test_name.clone(),
                    record.score.to_string(),
                    record.total_questions.to_string(),
                    format!(
                        "{}%",
                        quiz::percentage(record.score, record.total_questions)
                    ),
                ]
            })
            .collect(),
    }
}

pub fn video_view_table(records: &[VideoView]) -> CsvTable {
    CsvTable {
        headers: vec!["Viewed At", "User", "Video Title"],
        rows: records
            .iter()
            .map(|record| {
                vec![
                    record
                        .viewed_at
                        .unwrap_or(record.created_at)
                        .format(TIMESTAMP_FORMAT)
                        .to_string(),
                    record.user_name.clone(),
                    record.video_title.clone(),
                ]
            })
            .collect(),
    }
}

/// Every cell quoted, rows separated by `\n`, no trailing newline.
pub fn to_csv_string(table: &CsvTable) -> Result<String> {
    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Always)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer.write_record(&table.headers)?;
    for row in &table.rows {
        writer.write_record(row)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|err| anyhow!("flushing csv buffer: {}", err.error()))?;
    let mut text = String::from_utf8(bytes).context("csv output is not valid utf-8")?;
    if text.ends_with('\n') {
        text.pop();
    }
    Ok(text)
}

pub fn write_csv_file(path: &Path, table: &CsvTable) -> Result<()> {
    let body = to_csv_string(table)?;
    std::fs::write(path, format!("{UTF8_BOM}{body}"))
        .with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn test_response(user: &str, score: u32, total: u32) -> TestResponse {
        TestResponse {
            user_name: user.to_string(),
            test_name: "Staff knowledge check".to_string(),
            score,
            total_questions: total,
            submitted_at: Some(Utc.with_ymd_and_hms(2025, 2, 1, 8, 30, 0).unwrap()),
            created_at: Utc.with_ymd_and_hms(2025, 2, 1, 8, 31, 0).unwrap(),
        }
    }

    #[test]
    fn quotes_every_cell_and_doubles_quotes() {
        let table = CsvTable {
            headers: vec!["User", "Note"],
            rows: vec![vec!["Avery".to_string(), "said \"hi\", then left".to_string()]],
        };
        let csv = to_csv_string(&table).unwrap();
        assert_eq!(csv, "\"User\",\"Note\"\n\"Avery\",\"said \"\"hi\"\", then left\"");
    }

    #[test]
    fn empty_table_is_header_only() {
        let csv = to_csv_string(&video_view_table(&[])).unwrap();
        assert_eq!(csv, "\"Viewed At\",\"User\",\"Video Title\"");
    }

    #[test]
    fn test_rows_include_accuracy() {
        let table = test_table(&[test_response("Kiara", 7, 10)]);
        assert_eq!(
            table.rows[0],
            vec![
                "2025-02-01 08:30:00",
                "Kiara",
                "Staff knowledge check",
                "7",
                "10",
                "70%"
            ]
        );
    }

    #[test]
    fn view_time_falls_back_to_created_at() {
        let view = VideoView {
            user_name: "Jules".to_string(),
            video_title: "Closing routine".to_string(),
            viewed_at: None,
            created_at: Utc.with_ymd_and_hms(2025, 2, 3, 17, 0, 5).unwrap(),
        };
        let table = video_view_table(&[view]);
        assert_eq!(table.rows[0][0], "2025-02-03 17:00:05");
    }

    #[test]
    fn written_file_starts_with_bom() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tests.csv");
        write_csv_file(&path, &test_table(&[test_response("Avery", 1, 2)])).unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.starts_with('\u{feff}'));
        assert!(contents.ends_with("\"50%\""));
        assert_eq!(contents.lines().count(), 2);
    }
}
