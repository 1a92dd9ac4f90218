use anyhow::{bail, Result};
use chrono::{DateTime, NaiveDate, Utc};

use crate::models::{
    NewShiftEntry, NewShiftPdfLink, NewShiftVacancy, ShiftEntry, ShiftVacancy,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VacancyStatus {
    Entered,
    Closed,
    Open,
}

impl VacancyStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            VacancyStatus::Entered => "entered",
            VacancyStatus::Closed => "closed",
            VacancyStatus::Open => "open",
        }
    }
}

#[derive(Debug, Clone)]
pub struct VacancyBoard {
    pub vacancy: ShiftVacancy,
    pub entries: Vec<ShiftEntry>,
}

impl VacancyBoard {
    pub fn status_for(&self, user_name: Option<&str>) -> VacancyStatus {
        let entered = user_name
            .is_some_and(|name| self.entries.iter().any(|entry| entry.user_name == name));
        if entered {
            VacancyStatus::Entered
        } else if self.vacancy.is_filled {
            VacancyStatus::Closed
        } else {
            VacancyStatus::Open
        }
    }

    pub fn entrant_names(&self) -> Vec<&str> {
        self.entries
            .iter()
            .map(|entry| entry.user_name.as_str())
            .collect()
    }
}

pub fn attach_entries(vacancies: Vec<ShiftVacancy>, entries: &[ShiftEntry]) -> Vec<VacancyBoard> {
    vacancies
        .into_iter()
        .map(|vacancy| {
            let entries = entries
                .iter()
                .filter(|entry| entry.vacancy_id == vacancy.id)
                .cloned()
                .collect();
            VacancyBoard { vacancy, entries }
        })
        .collect()
}

pub fn prepare_entry(
    board: &VacancyBoard,
    user_name: &str,
    now: DateTime<Utc>,
) -> Result<NewShiftEntry> {
    match board.status_for(Some(user_name)) {
        VacancyStatus::Entered => bail!(
            "{} already entered the shift on {}",
            user_name,
            board.vacancy.shift_date
        ),
        VacancyStatus::Closed => bail!(
            "the shift on {} is no longer recruiting",
            board.vacancy.shift_date
        ),
        VacancyStatus::Open => Ok(NewShiftEntry {
            vacancy_id: board.vacancy.id.clone(),
            user_name: user_name.to_string(),
            entry_time: now,
        }),
    }
}

pub fn new_vacancy(
    shift_date: NaiveDate,
    time_slot: &str,
    job_description: &str,
    notes: &str,
    hourly_wage: i64,
    now: DateTime<Utc>,
) -> Result<NewShiftVacancy> {
    let time_slot = time_slot.trim();
    let job_description = job_description.trim();
    if time_slot.is_empty() || job_description.is_empty() {
        bail!("a shift slot needs a time slot and a job description");
    }
    if hourly_wage <= 0 {
        bail!("hourly wage must be positive, got {hourly_wage}");
    }
    Ok(NewShiftVacancy {
        shift_date,
        time_slot: time_slot.to_string(),
        job_description: job_description.to_string(),
        notes: notes.trim().to_string(),
        hourly_wage,
        is_filled: false,
        created_at: now,
    })
}

/// Replacement body that closes recruiting for a slot; every other field is
/// carried over since the store replaces records whole.
pub fn mark_filled(vacancy: &ShiftVacancy, now: DateTime<Utc>) -> NewShiftVacancy {
    NewShiftVacancy {
        shift_date: vacancy.shift_date,
        time_slot: vacancy.time_slot.clone(),
        job_description: vacancy.job_description.clone(),
        notes: vacancy.notes.clone(),
        hourly_wage: vacancy.hourly_wage,
        is_filled: true,
        created_at: now,
    }
}

pub fn new_pdf_link(
    title: &str,
    pdf_url: &str,
    display_order: i64,
    now: DateTime<Utc>,
) -> Result<NewShiftPdfLink> {
    let title = title.trim();
    let pdf_url = pdf_url.trim();
    if title.is_empty() || pdf_url.is_empty() {
        bail!("a shift schedule link needs a title and a URL");
    }
    Ok(NewShiftPdfLink {
        title: title.to_string(),
        pdf_url: pdf_url.to_string(),
        display_order,
        updated_at: now,
    })
}

/// `1200` becomes `¥1,200/h`.
pub fn format_wage(yen: i64) -> String {
    let digits = yen.unsigned_abs().to_string();
    let mut grouped = String::new();
    for (index, digit) in digits.chars().enumerate() {
        if index > 0 && (digits.len() - index) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    let sign = if yen < 0 { "-" } else { "" };
    format!("{sign}¥{grouped}/h")
}
