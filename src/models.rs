use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One answer as it arrives off the wire: a single option code, a list of
/// option codes for multi-select questions, or anything else (free text is a
/// plain string; malformed values land in `Other` and never match a rule).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Answer {
    One(String),
    Many(Vec<String>),
    Other(Value),
}

impl Answer {
    pub fn as_code(&self) -> Option<&str> {
        match self {
            Answer::One(code) => Some(code.as_str()),
            _ => None,
        }
    }

    pub fn as_multi(&self) -> Option<&[String]> {
        match self {
            Answer::Many(codes) => Some(codes.as_slice()),
            _ => None,
        }
    }
}

/// A single survey submission. Metadata fields are optional because the sheet
/// backend returns whatever the form managed to capture; question answers keep
/// their `q1..q20` keys in a flattened map.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SurveyRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub occupation: Option<String>,
    #[serde(flatten)]
    pub answers: BTreeMap<String, Answer>,
}

impl SurveyRecord {
    /// A record counts only if it carries some identity: an id, a submission
    /// timestamp, or at least an age bucket.
    pub fn is_valid(&self) -> bool {
        has_text(&self.id) || has_text(&self.timestamp) || has_text(&self.age)
    }

    pub fn answer_code(&self, question: &str) -> Option<&str> {
        self.answers.get(question).and_then(Answer::as_code)
    }

    pub fn answer_multi(&self, question: &str) -> Option<&[String]> {
        self.answers.get(question).and_then(Answer::as_multi)
    }
}

fn has_text(field: &Option<String>) -> bool {
    field.as_deref().is_some_and(|value| !value.trim().is_empty())
}

/// Drops records that fail the identity check before any aggregation runs.
pub fn filter_valid(records: Vec<SurveyRecord>) -> Vec<SurveyRecord> {
    records.into_iter().filter(SurveyRecord::is_valid).collect()
}

/// Per-record point tally produced by the score calculator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RecordScore {
    pub knowledge: u32,
    pub behavior: u32,
}

/// Cohort-level statistics, recomputed on every aggregation call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CohortStats {
    pub total: usize,
    pub age_distribution: BTreeMap<String, usize>,
    pub occupation_distribution: BTreeMap<String, usize>,
    pub knowledge_score_pct: u32,
    pub behavior_score_pct: u32,
    pub participation_rate_pct: u32,
}
