use serde::{Deserialize, Serialize};

/// Display band of a score value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreTier {
    High,
    Medium,
    Low,
}

impl ScoreTier {
    pub const HIGH_THRESHOLD: f64 = 0.75;
    pub const MEDIUM_THRESHOLD: f64 = 0.5;

    /// Lower bounds are inclusive: 0.75 is high, 0.5 is medium.
    pub fn classify(value: f64) -> Self {
        if value >= Self::HIGH_THRESHOLD {
            Self::High
        } else if value >= Self::MEDIUM_THRESHOLD {
            Self::Medium
        } else {
            Self::Low
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

impl std::fmt::Display for ScoreTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Whole-number percentage, as shown in table cells: `0.82` → `82%`.
pub fn format_percent(value: f64) -> String {
    format!("{:.0}%", (value * 100.0).round())
}

/// One-decimal percentage, as shown on summary cards: `0.82` → `82.0%`.
pub fn format_average(value: f64) -> String {
    format!("{:.1}%", (value * 1000.0).round() / 10.0)
}

/// `answer_relevance` → `Answer Relevance`.
pub fn humanize_metric_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut at_word_start = true;
    for ch in name.chars() {
        let ch = if ch == '_' { ' ' } else { ch };
        if ch.is_alphanumeric() {
            if at_word_start {
                out.extend(ch.to_uppercase());
            } else {
                out.push(ch);
            }
            at_word_start = false;
        } else {
            out.push(ch);
            at_word_start = true;
        }
    }
    out
}
