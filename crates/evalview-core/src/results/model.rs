use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

use super::job::JobId;

/// A named metric value in `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Score {
    /// Filled from the map key when the score arrives inside a result row.
    #[serde(default)]
    pub name: String,
    pub value: f64,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub context: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.is_empty()))
}

/// Evaluator verdict for one test case, e.g. `PASS`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Outcome(String);

impl Outcome {
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    pub fn label(&self) -> &str {
        &self.0
    }

    /// Lower-cased label, used as the badge style key.
    pub fn badge_class(&self) -> String {
        self.0.to_lowercase()
    }
}

impl Default for Outcome {
    fn default() -> Self {
        Self("N/A".to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestCaseResult {
    pub filename: String,
    pub test_case_id: String,
    #[serde(default)]
    pub result: Outcome,
    #[serde(default)]
    pub scores: BTreeMap<String, Score>,
}

impl TestCaseResult {
    pub fn score(&self, name: &str) -> Option<&Score> {
        self.scores.get(name)
    }
}

/// Everything retrieved for one job. Replaced wholesale, never merged.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultSet {
    pub job_id: JobId,
    pub score_names: Vec<String>,
    pub results: Vec<TestCaseResult>,
}

impl ResultSet {
    pub fn new(job_id: JobId, score_names: Vec<String>, mut results: Vec<TestCaseResult>) -> Self {
        for result in &mut results {
            for (name, score) in result.scores.iter_mut() {
                if score.name.is_empty() {
                    score.name = name.clone();
                }
            }
        }
        Self {
            job_id,
            score_names,
            results,
        }
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}
