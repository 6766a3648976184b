use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

/// How a knowledge rule matches an answer: exact equality for single-select
/// questions, membership of one target option for multi-select questions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchRule {
    Equals(String),
    Contains(String),
}

/// One awareness question worth a single point for the expected answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgeRule {
    pub question: String,
    #[serde(flatten)]
    pub matcher: MatchRule,
}

/// One habit question on a 0/1/2 tier: `full` answers earn 2 points,
/// `partial` answers 1, everything else 0.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BehaviorRule {
    pub question: String,
    pub full: Vec<String>,
    #[serde(default)]
    pub partial: Vec<String>,
}

/// The scoring configuration handed to the calculator and aggregator. Kept as
/// an explicit value so alternate rule sets can be versioned and loaded from
/// disk instead of living as module constants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringRules {
    pub knowledge: Vec<KnowledgeRule>,
    pub behavior: Vec<BehaviorRule>,
    #[serde(default = "default_participation_slope")]
    pub participation_slope: f64,
}

fn default_participation_slope() -> f64 {
    2.5
}

impl ScoringRules {
    /// Maximum knowledge points a single record can earn.
    pub fn max_knowledge_points(&self) -> u32 {
        self.knowledge.len() as u32
    }

    /// Maximum behavior points a single record can earn.
    pub fn max_behavior_points(&self) -> u32 {
        2 * self.behavior.len() as u32
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read rules file {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("invalid rules file {}", path.display()))
    }
}

impl Default for ScoringRules {
    fn default() -> Self {
        let knowledge = vec![
            knowledge_equals("q1", "a"),
            knowledge_equals("q2", "c"),
            KnowledgeRule {
                question: "q3".to_string(),
                matcher: MatchRule::Contains("d".to_string()),
            },
            knowledge_equals("q4", "yes"),
            knowledge_equals("q5", "b"),
            knowledge_equals("q6", "yes"),
            knowledge_equals("q18", "yes"),
        ];

        let behavior = vec![
            behavior_tiers("q7", &["rarely", "never"], &["monthly"]),
            behavior_tiers("q8", &["always"], &["sometimes"]),
            behavior_tiers("q9", &["always"], &["sometimes"]),
            behavior_tiers("q10", &["rarely", "never"], &["monthly"]),
            behavior_tiers("q11", &["always"], &["sometimes"]),
            behavior_tiers("q12", &["rarely", "never"], &["monthly"]),
            behavior_tiers("q13", &["avoid"], &["sometimes"]),
            behavior_tiers("q14", &["never"], &["rarely"]),
            behavior_tiers("q15", &["always"], &["sometimes"]),
        ];

        ScoringRules {
            knowledge,
            behavior,
            participation_slope: default_participation_slope(),
        }
    }
}

fn knowledge_equals(question: &str, expected: &str) -> KnowledgeRule {
    KnowledgeRule {
        question: question.to_string(),
        matcher: MatchRule::Equals(expected.to_string()),
    }
}

fn behavior_tiers(question: &str, full: &[&str], partial: &[&str]) -> BehaviorRule {
    BehaviorRule {
        question: question.to_string(),
        full: full.iter().map(|s| s.to_string()).collect(),
        partial: partial.iter().map(|s| s.to_string()).collect(),
    }
}
