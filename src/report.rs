use std::fmt::Write;

use chrono::NaiveDate;

use crate::labels;
use crate::models::{CohortStats, SurveyRecord};
use crate::rules::ScoringRules;
use crate::scoring;
use crate::stats;

const RECENT_RESPONSES_SHOWN: usize = 10;

pub fn knowledge_assessment(pct: u32) -> &'static str {
    match pct {
        70.. => "good awareness of plastic waste",
        50..=69 => "moderate awareness with gaps",
        _ => "limited awareness of plastic waste",
    }
}

pub fn behavior_assessment(pct: u32) -> &'static str {
    match pct {
        70.. => "consistently environment-friendly habits",
        50..=69 => "some positive habits",
        _ => "habits that need to change",
    }
}

pub fn build_report(
    generated_on: NaiveDate,
    records: &[SurveyRecord],
    rules: &ScoringRules,
) -> String {
    let stats = stats::aggregate(records, rules);
    let mut output = String::new();

    let _ = writeln!(output, "# EcoSurvey Cohort Report");
    let _ = writeln!(
        output,
        "Generated {} from {} responses",
        generated_on, stats.total
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Summary");

    if stats.total == 0 {
        let _ = writeln!(output, "No survey responses collected yet.");
        return output;
    }

    let _ = writeln!(output, "- Responses: {}", stats.total);
    let _ = writeln!(
        output,
        "- Knowledge score: {}% ({})",
        stats.knowledge_score_pct,
        knowledge_assessment(stats.knowledge_score_pct)
    );
    let _ = writeln!(
        output,
        "- Behavior score: {}% ({})",
        stats.behavior_score_pct,
        behavior_assessment(stats.behavior_score_pct)
    );
    let _ = writeln!(
        output,
        "- Participation rate: {}%",
        stats.participation_rate_pct
    );

    write_distribution(&mut output, "Age Groups", &stats.age_distribution, labels::age_label);
    write_distribution(
        &mut output,
        "Occupations",
        &stats.occupation_distribution,
        labels::occupation_label,
    );
    write_recommendations(&mut output, &stats);
    write_recent_responses(&mut output, records, rules);

    output
}

fn write_distribution(
    output: &mut String,
    title: &str,
    distribution: &std::collections::BTreeMap<String, usize>,
    label: fn(&str) -> &str,
) {
    let _ = writeln!(output);
    let _ = writeln!(output, "## {title}");
    if distribution.is_empty() {
        let _ = writeln!(output, "No responses carried this field.");
        return;
    }
    for (code, count) in distribution {
        let _ = writeln!(output, "- {}: {} responses", label(code), count);
    }
}

fn write_recommendations(output: &mut String, stats: &CohortStats) {
    let _ = writeln!(output);
    let _ = writeln!(output, "## Recommendations");

    let mut any = false;
    if stats.knowledge_score_pct < 50 {
        let _ = writeln!(
            output,
            "- [high] Strengthen education on the harm caused by plastic waste."
        );
        any = true;
    }
    if stats.behavior_score_pct < 50 {
        let _ = writeln!(
            output,
            "- [high] Launch a campaign to shift day-to-day plastic habits."
        );
        any = true;
    }
    if !any {
        let _ = writeln!(output, "- [medium] Keep up waste-sorting education.");
        let _ = writeln!(output, "- [medium] Encourage reusable bags over single-use plastic.");
    }
}

fn write_recent_responses(output: &mut String, records: &[SurveyRecord], rules: &ScoringRules) {
    let mut recent: Vec<&SurveyRecord> = records.iter().collect();
    recent.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

    let _ = writeln!(output);
    let _ = writeln!(output, "## Recent Responses");

    let max_knowledge = rules.max_knowledge_points();
    let max_behavior = rules.max_behavior_points();

    for record in recent.iter().take(RECENT_RESPONSES_SHOWN) {
        let score = scoring::score_record(record, rules);
        let _ = writeln!(
            output,
            "- {} ({}, {}) knowledge {}% behavior {}%",
            short_id(record),
            record
                .age
                .as_deref()
                .map(labels::age_label)
                .unwrap_or("n/a"),
            record
                .occupation
                .as_deref()
                .map(labels::occupation_label)
                .unwrap_or("n/a"),
            share(score.knowledge, max_knowledge),
            share(score.behavior, max_behavior),
        );
    }
}

fn short_id(record: &SurveyRecord) -> &str {
    let id = record.id.as_deref().unwrap_or("n/a");
    match id.char_indices().nth(8) {
        Some((end, _)) => &id[..end],
        None => id,
    }
}

fn share(points: u32, max: u32) -> u32 {
    if max == 0 {
        return 0;
    }
    (100.0 * f64::from(points) / f64::from(max)).round() as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records(json: &str) -> Vec<SurveyRecord> {
        serde_json::from_str(json).expect("records parse")
    }

    fn report_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 2, 2).expect("valid date")
    }

    #[test]
    fn empty_cohort_reports_a_placeholder() {
        let report = build_report(report_date(), &[], &ScoringRules::default());
        assert!(report.contains("# EcoSurvey Cohort Report"));
        assert!(report.contains("No survey responses collected yet."));
        assert!(!report.contains("## Recommendations"));
    }

    #[test]
    fn low_scores_raise_high_priority_recommendations() {
        let cohort = records(r#"[{"id":"r-1","age":"18-24","q1":"b","q7":"daily"}]"#);
        let report = build_report(report_date(), &cohort, &ScoringRules::default());
        assert!(report.contains("[high] Strengthen education"));
        assert!(report.contains("[high] Launch a campaign"));
    }

    #[test]
    fn strong_cohort_gets_default_recommendations() {
        let cohort = records(
            r#"[{
                "id": "r-1", "age": "25-34", "occupation": "student",
                "q1": "a", "q2": "c", "q3": ["d"], "q4": "yes", "q5": "b",
                "q6": "yes", "q18": "yes",
                "q7": "rarely", "q8": "always", "q9": "always", "q10": "never",
                "q11": "always", "q12": "rarely", "q13": "avoid", "q14": "never",
                "q15": "always"
            }]"#,
        );
        let report = build_report(report_date(), &cohort, &ScoringRules::default());
        assert!(report.contains("- Knowledge score: 100%"));
        assert!(report.contains("- Behavior score: 100%"));
        assert!(report.contains("[medium] Keep up waste-sorting education."));
        assert!(!report.contains("[high]"));
    }

    #[test]
    fn distributions_render_labels() {
        let cohort = records(
            r#"[
                {"id":"a","age":"under18","occupation":"student"},
                {"id":"b","age":"under18"},
                {"id":"c","age":"55+","occupation":"mystery"}
            ]"#,
        );
        let report = build_report(report_date(), &cohort, &ScoringRules::default());
        assert!(report.contains("- Under 18: 2 responses"));
        assert!(report.contains("- 55 and over: 1 responses"));
        assert!(report.contains("- Student: 1 responses"));
        assert!(report.contains("- mystery: 1 responses"));
    }

    #[test]
    fn recent_responses_are_newest_first_and_truncated() {
        let mut cohort = Vec::new();
        for day in 1..=12 {
            cohort.push(
                serde_json::from_str::<SurveyRecord>(&format!(
                    r#"{{"id":"resp-{day:02}","timestamp":"2026-01-{day:02}T08:00:00Z"}}"#
                ))
                .expect("record parse"),
            );
        }
        let report = build_report(report_date(), &cohort, &ScoringRules::default());
        let section = report.split("## Recent Responses").nth(1).expect("section");
        assert_eq!(section.matches("- resp-").count(), RECENT_RESPONSES_SHOWN);
        let newest = section.find("resp-12").expect("newest listed");
        let older = section.find("resp-03").expect("older listed");
        assert!(newest < older);
    }
}
