use crate::models::{RecordScore, SurveyRecord};
use crate::rules::{BehaviorRule, KnowledgeRule, MatchRule, ScoringRules};

/// Tallies one record against the rule set. Total over all inputs: missing,
/// unknown, or wrongly-typed answers simply contribute nothing.
pub fn score_record(record: &SurveyRecord, rules: &ScoringRules) -> RecordScore {
    let knowledge = rules
        .knowledge
        .iter()
        .filter(|rule| knowledge_matches(rule, record))
        .count() as u32;

    let behavior = rules
        .behavior
        .iter()
        .map(|rule| behavior_points(rule, record))
        .sum();

    RecordScore { knowledge, behavior }
}

fn knowledge_matches(rule: &KnowledgeRule, record: &SurveyRecord) -> bool {
    match &rule.matcher {
        MatchRule::Equals(expected) => {
            record.answer_code(&rule.question) == Some(expected.as_str())
        }
        // Membership rules only ever match list answers; a bare string with
        // the same text does not count.
        MatchRule::Contains(target) => record
            .answer_multi(&rule.question)
            .is_some_and(|selected| selected.iter().any(|code| code == target)),
    }
}

fn behavior_points(rule: &BehaviorRule, record: &SurveyRecord) -> u32 {
    let Some(code) = record.answer_code(&rule.question) else {
        return 0;
    };
    if rule.full.iter().any(|v| v == code) {
        2
    } else if rule.partial.iter().any(|v| v == code) {
        1
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(json: &str) -> SurveyRecord {
        serde_json::from_str(json).expect("record should deserialize")
    }

    #[test]
    fn empty_record_scores_zero() {
        let score = score_record(&SurveyRecord::default(), &ScoringRules::default());
        assert_eq!(score, RecordScore { knowledge: 0, behavior: 0 });
    }

    #[test]
    fn all_correct_answers_hit_the_maximum() {
        let rules = ScoringRules::default();
        let full = record(
            r#"{
                "id": "full-marks",
                "q1": "a", "q2": "c", "q3": ["d"], "q4": "yes", "q5": "b",
                "q6": "yes", "q18": "yes",
                "q7": "rarely", "q8": "always", "q9": "always", "q10": "never",
                "q11": "always", "q12": "rarely", "q13": "avoid", "q14": "never",
                "q15": "always"
            }"#,
        );
        let score = score_record(&full, &rules);
        assert_eq!(score.knowledge, rules.max_knowledge_points());
        assert_eq!(score.behavior, rules.max_behavior_points());
    }

    #[test]
    fn wrong_answers_score_zero() {
        let rules = ScoringRules::default();
        let wrong = record(
            r#"{"id":"x","q1":"b","q2":"a","q3":["a"],"q7":"daily","q8":"rarely"}"#,
        );
        assert_eq!(score_record(&wrong, &rules), RecordScore { knowledge: 0, behavior: 0 });
    }

    #[test]
    fn behavior_tiers_award_partial_credit() {
        let rules = ScoringRules::default();
        let partial = record(r#"{"id":"x","q7":"monthly","q8":"sometimes","q14":"rarely"}"#);
        assert_eq!(score_record(&partial, &rules).behavior, 3);

        let full = record(r#"{"id":"x","q7":"never","q8":"always","q14":"never"}"#);
        assert_eq!(score_record(&full, &rules).behavior, 6);
    }

    #[test]
    fn membership_rule_ignores_plain_string_answers() {
        let rules = ScoringRules::default();
        // q3 is multi-select; a bare "d" is the wrong shape and must not count.
        let stringly = record(r#"{"id":"x","q3":"d"}"#);
        assert_eq!(score_record(&stringly, &rules).knowledge, 0);

        let listed = record(r#"{"id":"x","q3":["a","d"]}"#);
        assert_eq!(score_record(&listed, &rules).knowledge, 1);
    }

    #[test]
    fn unknown_answer_codes_are_not_an_error() {
        let rules = ScoringRules::default();
        let odd = record(r#"{"id":"x","q1":"zzz","q7":"??","q99":"a","q8":7}"#);
        assert_eq!(score_record(&odd, &rules), RecordScore { knowledge: 0, behavior: 0 });
    }
}
