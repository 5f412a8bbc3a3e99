use std::cmp::Ordering;
use std::str::FromStr;

use serde::Serialize;

use super::aggregate::{summarize, ResultSummary};
use super::job::JobId;
use super::model::ResultSet;
use super::tier::{format_percent, humanize_metric_name, ScoreTier};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreCell {
    pub value: f64,
    pub text: String,
    pub tier: ScoreTier,
}

impl ScoreCell {
    pub fn new(value: f64) -> Self {
        Self {
            value,
            text: format_percent(value),
            tier: ScoreTier::classify(value),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultRow {
    /// Index in the order the server returned results.
    pub position: usize,
    pub test_case_id: String,
    pub outcome: String,
    pub badge_class: String,
    /// One entry per score column; `None` renders as absent, never as zero.
    pub cells: Vec<Option<ScoreCell>>,
    /// Target of the row's "view details" action.
    pub filename: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreColumn {
    pub name: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "name", rename_all = "snake_case")]
pub enum SortColumn {
    TestCase,
    Outcome,
    Score(String),
}

impl FromStr for SortColumn {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "test-case" | "test_case" | "id" => Self::TestCase,
            "result" | "outcome" => Self::Outcome,
            other => Self::Score(other.to_string()),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SortOrder {
    pub column: SortColumn,
    pub direction: SortDirection,
}

/// Table plus summary for the current job, ready for presentation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultsView {
    pub job_id: JobId,
    pub columns: Vec<ScoreColumn>,
    pub rows: Vec<ResultRow>,
    pub summary: ResultSummary,
    pub sort: Option<SortOrder>,
}

impl ResultsView {
    pub fn build(set: &ResultSet) -> Self {
        let columns = set
            .score_names
            .iter()
            .map(|name| ScoreColumn {
                name: name.clone(),
                label: humanize_metric_name(name),
            })
            .collect();

        let rows = set
            .results
            .iter()
            .enumerate()
            .map(|(position, result)| ResultRow {
                position,
                test_case_id: result.test_case_id.clone(),
                outcome: result.result.label().to_string(),
                badge_class: result.result.badge_class(),
                cells: set
                    .score_names
                    .iter()
                    .map(|name| result.score(name).map(|s| ScoreCell::new(s.value)))
                    .collect(),
                filename: result.filename.clone(),
            })
            .collect();

        Self {
            job_id: set.job_id.clone(),
            columns,
            rows,
            summary: summarize(set),
            sort: None,
        }
    }

    /// Reorder rows only. Ties keep server order and absent cells go last in
    /// either direction. Returns `false` for an unknown score column.
    pub fn sort_by(&mut self, order: SortOrder) -> bool {
        let score_index = match &order.column {
            SortColumn::Score(name) => match self.columns.iter().position(|c| &c.name == name) {
                Some(idx) => Some(idx),
                None => return false,
            },
            _ => None,
        };

        let direction = order.direction;
        let directed = |ord: Ordering| match direction {
            SortDirection::Ascending => ord,
            SortDirection::Descending => ord.reverse(),
        };

        self.rows.sort_by(|a, b| {
            let ord = match (&order.column, score_index) {
                (SortColumn::TestCase, _) => directed(a.test_case_id.cmp(&b.test_case_id)),
                (SortColumn::Outcome, _) => directed(a.outcome.cmp(&b.outcome)),
                (SortColumn::Score(_), Some(idx)) => match (&a.cells[idx], &b.cells[idx]) {
                    (Some(x), Some(y)) => {
                        directed(x.value.partial_cmp(&y.value).unwrap_or(Ordering::Equal))
                    }
                    (Some(_), None) => Ordering::Less,
                    (None, Some(_)) => Ordering::Greater,
                    (None, None) => Ordering::Equal,
                },
                (SortColumn::Score(_), None) => Ordering::Equal,
            };
            ord.then(a.position.cmp(&b.position))
        });
        self.sort = Some(order);
        true
    }
}
