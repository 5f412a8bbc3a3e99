use serde::Serialize;

use super::model::ResultSet;
use super::tier::{format_average, humanize_metric_name, ScoreTier};

/// Mean of one metric over the results that actually report it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricAverage {
    pub name: String,
    pub label: String,
    pub mean: f64,
    pub samples: usize,
    pub tier: ScoreTier,
    pub display: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultSummary {
    pub total: usize,
    pub metrics: Vec<MetricAverage>,
}

/// Per-metric averages in `score_names` order.
///
/// Results without a metric are left out of both sum and count; a metric no
/// result reports gets no entry at all.
pub fn summarize(set: &ResultSet) -> ResultSummary {
    let metrics = set
        .score_names
        .iter()
        .filter_map(|name| {
            let (sum, samples) = set
                .results
                .iter()
                .filter_map(|r| r.score(name))
                .fold((0.0_f64, 0_usize), |(sum, n), s| (sum + s.value, n + 1));
            if samples == 0 {
                return None;
            }
            let mean = sum / samples as f64;
            Some(MetricAverage {
                name: name.clone(),
                label: humanize_metric_name(name),
                mean,
                samples,
                tier: ScoreTier::classify(mean),
                display: format_average(mean),
            })
        })
        .collect();

    ResultSummary {
        total: set.results.len(),
        metrics,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::results::job::JobId;
    use crate::results::model::{Outcome, Score, TestCaseResult};

    fn row(id: &str, scores: &[(&str, f64)]) -> TestCaseResult {
        let scores: BTreeMap<String, Score> = scores
            .iter()
            .map(|(name, value)| {
                (
                    name.to_string(),
                    Score {
                        name: name.to_string(),
                        value: *value,
                        context: None,
                        error: None,
                    },
                )
            })
            .collect();
        TestCaseResult {
            filename: format!("{id}.jsonl"),
            test_case_id: id.to_string(),
            result: Outcome::new("PASS"),
            scores,
        }
    }

    fn set(names: &[&str], results: Vec<TestCaseResult>) -> ResultSet {
        ResultSet::new(
            JobId::parse("11111111-1111-1111-1111-111111111111").unwrap(),
            names.iter().map(|s| s.to_string()).collect(),
            results,
        )
    }

    #[test]
    fn missing_metrics_are_excluded_not_zeroed() {
        let summary = summarize(&set(
            &["accuracy", "faithfulness"],
            vec![
                row("tc1", &[("accuracy", 0.8), ("faithfulness", 0.4)]),
                row("tc2", &[("accuracy", 0.6)]),
                row("tc3", &[("accuracy", 1.0)]),
            ],
        ));

        assert_eq!(summary.total, 3);
        let accuracy = &summary.metrics[0];
        assert_eq!(accuracy.samples, 3);
        assert!((accuracy.mean - 0.8).abs() < 1e-9);

        let faithfulness = &summary.metrics[1];
        assert_eq!(faithfulness.samples, 1);
        assert!((faithfulness.mean - 0.4).abs() < 1e-9);
        assert_eq!(faithfulness.tier, ScoreTier::Low);
        assert_eq!(faithfulness.display, "40.0%");
    }

    #[test]
    fn metric_present_in_no_result_has_no_card() {
        let summary = summarize(&set(
            &["accuracy", "toxicity"],
            vec![row("tc1", &[("accuracy", 0.9)])],
        ));
        assert_eq!(summary.metrics.len(), 1);
        assert_eq!(summary.metrics[0].name, "accuracy");
    }

    #[test]
    fn cards_follow_score_names_order() {
        let summary = summarize(&set(
            &["zeta", "alpha"],
            vec![row("tc1", &[("alpha", 0.5), ("zeta", 0.75)])],
        ));
        let names: Vec<_> = summary.metrics.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, ["zeta", "alpha"]);
        assert_eq!(summary.metrics[0].label, "Zeta");
        assert_eq!(summary.metrics[0].tier, ScoreTier::High);
    }

    #[test]
    fn empty_set_has_zero_total_and_no_cards() {
        let summary = summarize(&set(&["accuracy"], vec![]));
        assert_eq!(summary.total, 0);
        assert!(summary.metrics.is_empty());
    }
}
