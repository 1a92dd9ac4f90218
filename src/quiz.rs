use std::collections::BTreeMap;

use anyhow::{bail, Context, Result};

use crate::models::{NewTestQuestion, TestQuestion};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub prompt: String,
    pub options: Vec<String>,
    pub correct: usize,
}

impl Question {
    pub fn from_record(record: &TestQuestion) -> Result<Self> {
        let options: Vec<String> = serde_json::from_str(&record.options)
            .with_context(|| format!("decoding options of question {:?}", record.question))?;
        Ok(Self {
            prompt: record.question.clone(),
            options,
            correct: record.correct_answer,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Excellent,
    Good,
    NearlyThere,
    NeedsReview,
}

impl Verdict {
    pub fn from_percentage(percentage: u32) -> Self {
        match percentage {
            90.. => Verdict::Excellent,
            70..=89 => Verdict::Good,
            50..=69 => Verdict::NearlyThere,
            _ => Verdict::NeedsReview,
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            Verdict::Excellent => "Outstanding, a perfect run!",
            Verdict::Good => "Well done!",
            Verdict::NearlyThere => "Almost there, keep going!",
            Verdict::NeedsReview => "Time for a review. Rewatch the training videos.",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizOutcome {
    pub score: u32,
    pub total: u32,
    pub percentage: u32,
    pub verdict: Verdict,
}

pub fn percentage(score: u32, total: u32) -> u32 {
    if total == 0 {
        return 0;
    }
    (f64::from(score) / f64::from(total) * 100.0).round() as u32
}

/// Scores one attempt. `answers[i]` is the chosen option for question `i`;
/// missing or `None` answers score nothing.
pub fn grade(questions: &[Question], answers: &[Option<usize>]) -> Result<QuizOutcome> {
    if answers.len() > questions.len() {
        bail!(
            "{} answers given for {} questions",
            answers.len(),
            questions.len()
        );
    }

    let mut score = 0u32;
    for (index, (question, answer)) in questions.iter().zip(answers).enumerate() {
        let Some(choice) = answer else {
            continue;
        };
        if *choice >= question.options.len() {
            bail!(
                "answer {} for question {} is out of range (options 0..{})",
                choice,
                index + 1,
                question.options.len()
            );
        }
        if *choice == question.correct {
            score += 1;
        }
    }

    let total = questions.len() as u32;
    let percentage = percentage(score, total);
    Ok(QuizOutcome {
        score,
        total,
        percentage,
        verdict: Verdict::from_percentage(percentage),
    })
}

/// Parses `0,2,-,1`; `-` or an empty slot means the question was skipped.
pub fn parse_answers(raw: &str) -> Result<Vec<Option<usize>>> {
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }
    raw.split(',')
        .map(|slot| {
            let slot = slot.trim();
            if slot.is_empty() || slot == "-" {
                Ok(None)
            } else {
                slot.parse::<usize>()
                    .map(Some)
                    .with_context(|| format!("invalid answer {slot:?}"))
            }
        })
        .collect()
}

/// JSON object stored alongside a submission, keyed `question{index}`.
pub fn encode_answers(answers: &[Option<usize>]) -> Result<String> {
    let map: BTreeMap<String, usize> = answers
        .iter()
        .enumerate()
        .filter_map(|(index, answer)| answer.map(|choice| (format!("question{index}"), choice)))
        .collect();
    serde_json::to_string(&map).context("encoding quiz answers")
}

/// Builds a question record. `correct` indexes into `options`.
pub fn new_question(
    prompt: &str,
    options: &[String],
    correct: usize,
    order_num: i64,
) -> Result<NewTestQuestion> {
    let prompt = prompt.trim();
    if prompt.is_empty() {
        bail!("question text is empty");
    }
    let options: Vec<&str> = options.iter().map(|option| option.trim()).collect();
    if options.len() < 2 {
        bail!("a question needs at least two options, got {}", options.len());
    }
    if let Some(position) = options.iter().position(|option| option.is_empty()) {
        bail!("option {position} is empty");
    }
    if correct >= options.len() {
        bail!(
            "correct answer {} is out of range (options 0..{})",
            correct,
            options.len()
        );
    }

    Ok(NewTestQuestion {
        question: prompt.to_string(),
        options: serde_json::to_string(&options).context("encoding question options")?,
        correct_answer: correct,
        order_num,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn question(correct: usize) -> Question {
        Question {
            prompt: "Where is the spare change kept?".to_string(),
            options: vec!["Safe".into(), "Register".into(), "Back office".into()],
            correct,
        }
    }

    #[test]
    fn decodes_options_from_record() {
        let record = TestQuestion {
            id: "q1".to_string(),
            question: "First step when opening?".to_string(),
            options: r#"["Lights","Register","Music"]"#.to_string(),
            correct_answer: 1,
            created_at: Utc::now(),
        };
        let parsed = Question::from_record(&record).unwrap();
        assert_eq!(parsed.options.len(), 3);
        assert_eq!(parsed.correct, 1);
    }

    #[test]
    fn rejects_malformed_options() {
        let record = TestQuestion {
            id: "q1".to_string(),
            question: "Broken".to_string(),
            options: "Lights, Register".to_string(),
            correct_answer: 0,
            created_at: Utc::now(),
        };
        assert!(Question::from_record(&record).is_err());
    }

    #[test]
    fn grades_correct_answers_and_skips() {
        let questions = vec![question(0), question(1), question(2), question(0)];
        let outcome = grade(&questions, &[Some(0), Some(2), None]).unwrap();
        assert_eq!(outcome.score, 1);
        assert_eq!(outcome.total, 4);
        assert_eq!(outcome.percentage, 25);
        assert_eq!(outcome.verdict, Verdict::NeedsReview);
    }

    #[test]
    fn perfect_score_is_excellent() {
        let questions = vec![question(2), question(1)];
        let outcome = grade(&questions, &[Some(2), Some(1)]).unwrap();
        assert_eq!(outcome.percentage, 100);
        assert_eq!(outcome.verdict, Verdict::Excellent);
    }

    #[test]
    fn out_of_range_answer_is_an_error() {
        let err = grade(&[question(0)], &[Some(7)]).unwrap_err();
        assert!(err.to_string().contains("out of range"));
        assert!(grade(&[question(0)], &[Some(0), Some(0)]).is_err());
    }

    #[test]
    fn percentage_rounds_and_handles_zero_total() {
        assert_eq!(percentage(2, 3), 67);
        assert_eq!(percentage(1, 3), 33);
        assert_eq!(percentage(0, 0), 0);
    }

    #[test]
    fn verdict_thresholds() {
        assert_eq!(Verdict::from_percentage(90), Verdict::Excellent);
        assert_eq!(Verdict::from_percentage(89), Verdict::Good);
        assert_eq!(Verdict::from_percentage(70), Verdict::Good);
        assert_eq!(Verdict::from_percentage(50), Verdict::NearlyThere);
        assert_eq!(Verdict::from_percentage(49), Verdict::NeedsReview);
    }

    #[test]
    fn parses_answer_lists() {
        assert_eq!(
            parse_answers("0, 2,-,,1").unwrap(),
            vec![Some(0), Some(2), None, None, Some(1)]
        );
        assert!(parse_answers("").unwrap().is_empty());
        assert!(parse_answers("a").is_err());
    }

    #[test]
    fn encodes_answered_questions_only() {
        let encoded = encode_answers(&[Some(1), None, Some(0)]).unwrap();
        assert_eq!(encoded, r#"{"question0":1,"question2":0}"#);
    }

    #[test]
    fn new_question_stores_options_as_json() {
        let options = vec!["Safe".to_string(), " Register ".to_string()];
        let record = new_question("Where is the float kept?", &options, 1, 3).unwrap();
        assert_eq!(record.options, r#"["Safe","Register"]"#);
        assert_eq!(record.correct_answer, 1);

        let stored = TestQuestion {
            id: "q2".to_string(),
            question: record.question.clone(),
            options: record.options.clone(),
            correct_answer: record.correct_answer,
            created_at: Utc::now(),
        };
        assert_eq!(Question::from_record(&stored).unwrap().options[1], "Register");
    }

    #[test]
    fn new_question_rejects_correct_answer_outside_options() {
        let options = vec!["Safe".to_string(), "Register".to_string()];
        let err = new_question("Where?", &options, 2, 1).unwrap_err();
        assert!(err.to_string().contains("out of range"));
    }

    #[test]
    fn new_question_rejects_blank_parts() {
        let options = vec!["Safe".to_string(), "  ".to_string()];
        assert!(new_question("Where?", &options, 0, 1).is_err());
        assert!(new_question("Where?", &options[..1], 0, 1).is_err());
        assert!(new_question(" ", &["a".to_string(), "b".to_string()], 0, 1).is_err());
    }
}
