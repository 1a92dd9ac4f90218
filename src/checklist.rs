use std::collections::BTreeMap;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};

use crate::models::{ChecklistItem, ChecklistResponse, NewChecklistItem, NewChecklistResponse};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryItems {
    pub category: String,
    pub items: Vec<String>,
}

/// Groups items by category. Items follow `order_num`; categories appear in
/// the order their first item does.
pub fn group_by_category(items: &[ChecklistItem]) -> Vec<CategoryItems> {
    let mut ordered: Vec<&ChecklistItem> = items.iter().collect();
    ordered.sort_by_key(|item| item.order_num);

    let mut groups: Vec<CategoryItems> = Vec::new();
    for item in ordered {
        match groups.iter_mut().find(|group| group.category == item.category) {
            Some(group) => group.items.push(item.item_text.clone()),
            None => groups.push(CategoryItems {
                category: item.category.clone(),
                items: vec![item.item_text.clone()],
            }),
        }
    }
    groups
}

/// Returns `(checked, total)` for a stored submission.
pub fn tally(response: &ChecklistResponse) -> Result<(usize, usize)> {
    tally_responses(&response.responses)
        .with_context(|| format!("decoding checklist responses of {}", response.user_name))
}

/// Same count as [`tally`], read from a submission before it is stored.
pub fn submission_tally(submission: &NewChecklistResponse) -> Result<(usize, usize)> {
    tally_responses(&submission.responses).context("decoding checklist submission")
}

fn tally_responses(responses: &str) -> Result<(usize, usize)> {
    let answers: BTreeMap<String, bool> = serde_json::from_str(responses)?;
    let checked = answers.values().filter(|done| **done).count();
    Ok((checked, answers.len()))
}

pub fn build_submission(
    user_name: &str,
    group: &CategoryItems,
    checked: &[String],
    submitted_at: DateTime<Utc>,
) -> Result<NewChecklistResponse> {
    if let Some(unknown) = checked.iter().find(|item| !group.items.contains(*item)) {
        bail!("{unknown:?} is not an item of category {:?}", group.category);
    }

    let answers: BTreeMap<&str, bool> = group
        .items
        .iter()
        .map(|item| (item.as_str(), checked.contains(item)))
        .collect();

    Ok(NewChecklistResponse {
        user_name: user_name.to_string(),
        category: group.category.clone(),
        responses: serde_json::to_string(&answers).context("encoding checklist responses")?,
        submitted_at,
    })
}

pub fn new_item(item_text: &str, category: &str, order_num: i64) -> Result<NewChecklistItem> {
    let item_text = item_text.trim();
    let category = category.trim();
    if item_text.is_empty() || category.is_empty() {
        bail!("a checklist item needs both text and a category");
    }
    Ok(NewChecklistItem {
        item_text: item_text.to_string(),
        category: category.to_string(),
        order_num,
    })
}

/// Looks up the stored item with this exact text in a category.
pub fn find_item<'a>(
    items: &'a [ChecklistItem],
    category: &str,
    item_text: &str,
) -> Option<&'a ChecklistItem> {
    items
        .iter()
        .find(|item| item.category == category && item.item_text == item_text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(category: &str, text: &str, order_num: i64) -> ChecklistItem {
        ChecklistItem {
            id: format!("{category}-{order_num}"),
            category: category.to_string(),
            item_text: text.to_string(),
            order_num,
            created_at: Utc::now(),
        }
    }

    fn opening() -> CategoryItems {
        CategoryItems {
            category: "Opening".to_string(),
            items: vec!["Unlock doors".to_string(), "Count float".to_string()],
        }
    }

    #[test]
    fn groups_follow_order_numbers() {
        let items = vec![
            item("Closing", "Lock doors", 3),
            item("Opening", "Count float", 2),
            item("Opening", "Unlock doors", 1),
            item("Closing", "Cash up", 4),
        ];
        let groups = group_by_category(&items);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].category, "Opening");
        assert_eq!(groups[0].items, vec!["Unlock doors", "Count float"]);
        assert_eq!(groups[1].items, vec!["Lock doors", "Cash up"]);
    }

    #[test]
    fn tallies_checked_items() {
        let response = ChecklistResponse {
            user_name: "Avery".to_string(),
            category: "Opening".to_string(),
            responses: r#"{"Unlock doors":true,"Count float":false,"Lights":true}"#.to_string(),
            submitted_at: None,
            created_at: Utc::now(),
        };
        assert_eq!(tally(&response).unwrap(), (2, 3));
    }

    #[test]
    fn tally_rejects_malformed_payload() {
        let response = ChecklistResponse {
            user_name: "Avery".to_string(),
            category: "Opening".to_string(),
            responses: "done".to_string(),
            submitted_at: None,
            created_at: Utc::now(),
        };
        assert!(tally(&response).is_err());
    }

    #[test]
    fn submission_marks_every_item() {
        let submission =
            build_submission("Jules", &opening(), &["Count float".to_string()], Utc::now())
                .unwrap();
        assert_eq!(submission.category, "Opening");
        assert_eq!(
            submission.responses,
            r#"{"Count float":true,"Unlock doors":false}"#
        );
    }

    #[test]
    fn submission_rejects_items_outside_category() {
        let err = build_submission("Jules", &opening(), &["Mop floor".to_string()], Utc::now())
            .unwrap_err();
        assert!(err.to_string().contains("Mop floor"));
    }

    #[test]
    fn repeated_checks_count_once() {
        let checked = vec!["Count float".to_string(), "Count float".to_string()];
        let submission = build_submission("Jules", &opening(), &checked, Utc::now()).unwrap();
        assert_eq!(submission_tally(&submission).unwrap(), (1, 2));
    }

    #[test]
    fn new_items_are_trimmed_and_validated() {
        let record = new_item("  Wipe counters ", "Closing", 5).unwrap();
        assert_eq!(record.item_text, "Wipe counters");
        assert_eq!(record.order_num, 5);
        assert!(new_item("   ", "Closing", 1).is_err());
        assert!(new_item("Wipe counters", "", 1).is_err());
    }

    #[test]
    fn finds_items_by_category_and_text() {
        let items = vec![
            item("Opening", "Lights", 1),
            item("Closing", "Lights", 2),
        ];
        let found = find_item(&items, "Closing", "Lights").unwrap();
        assert_eq!(found.id, "Closing-2");
        assert!(find_item(&items, "Closing", "Music").is_none());
    }
}
