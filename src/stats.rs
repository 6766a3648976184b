use std::collections::BTreeMap;

use crate::models::{CohortStats, SurveyRecord};
use crate::rules::ScoringRules;
use crate::scoring;

/// Reduces a cohort of records to summary statistics. Commutative over the
/// input order and total: an empty cohort yields zeroed stats rather than a
/// division by zero.
pub fn aggregate(records: &[SurveyRecord], rules: &ScoringRules) -> CohortStats {
    let mut age_distribution: BTreeMap<String, usize> = BTreeMap::new();
    let mut occupation_distribution: BTreeMap<String, usize> = BTreeMap::new();
    let mut knowledge_points: u64 = 0;
    let mut behavior_points: u64 = 0;

    for record in records {
        bump_category(&mut age_distribution, &record.age);
        bump_category(&mut occupation_distribution, &record.occupation);

        let score = scoring::score_record(record, rules);
        knowledge_points += u64::from(score.knowledge);
        behavior_points += u64::from(score.behavior);
    }

    let total = records.len();
    CohortStats {
        total,
        age_distribution,
        occupation_distribution,
        knowledge_score_pct: percentage(
            knowledge_points,
            total as u64 * u64::from(rules.max_knowledge_points()),
        ),
        behavior_score_pct: percentage(
            behavior_points,
            total as u64 * u64::from(rules.max_behavior_points()),
        ),
        participation_rate_pct: participation_rate(total, rules.participation_slope),
    }
}

fn bump_category(distribution: &mut BTreeMap<String, usize>, value: &Option<String>) {
    if let Some(code) = value.as_deref() {
        if !code.trim().is_empty() {
            *distribution.entry(code.to_string()).or_insert(0) += 1;
        }
    }
}

/// Integer percentage with round-half-away-from-zero; 0 when the denominator
/// is 0.
fn percentage(points: u64, max_points: u64) -> u32 {
    if max_points == 0 {
        return 0;
    }
    (100.0 * points as f64 / max_points as f64).round() as u32
}

/// Display metric scaling linearly with response count, capped at 100.
fn participation_rate(total: usize, slope: f64) -> u32 {
    let scaled = (total as f64 * slope).round() as u64;
    scaled.min(100) as u32
}
