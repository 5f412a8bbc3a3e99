use serde::{Deserialize, Serialize};

use crate::results::TestCaseResult;

// ---------------------------------------------------------------------------
// Request bodies
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub(crate) struct SessionRequest<'a> {
    pub socket_id: Option<&'a str>,
}

#[derive(Debug, Serialize)]
pub(crate) struct FetchResultsRequest<'a> {
    pub job_id: &'a str,
    pub socket_id: Option<&'a str>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ResultDetailRequest<'a> {
    pub job_id: &'a str,
    pub filename: &'a str,
    pub socket_id: Option<&'a str>,
}

// ---------------------------------------------------------------------------
// Credential responses
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncResponse {
    pub success: bool,
    #[serde(default)]
    pub count: Option<u32>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckResponse {
    pub success: bool,
    #[serde(default)]
    pub account: Option<String>,
    #[serde(default)]
    pub arn: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub synced: Option<bool>,
    #[serde(default)]
    pub error: Option<String>,
}

// ---------------------------------------------------------------------------
// Results responses
// ---------------------------------------------------------------------------

/// Business-level failure reported with `success: false`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiFailure {
    pub error: String,
    pub searched_path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultsPayload {
    pub score_names: Vec<String>,
    pub results: Vec<TestCaseResult>,
    pub file_count: usize,
    pub s3_path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "RawFetchResults")]
pub enum FetchResultsResponse {
    Found(ResultsPayload),
    Failed(ApiFailure),
}

#[derive(Debug, Deserialize)]
struct RawFetchResults {
    success: bool,
    #[serde(default)]
    score_names: Vec<String>,
    #[serde(default)]
    results: Vec<TestCaseResult>,
    #[serde(default)]
    file_count: Option<usize>,
    #[serde(default)]
    s3_path: Option<String>,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    searched_path: Option<String>,
}

impl From<RawFetchResults> for FetchResultsResponse {
    fn from(raw: RawFetchResults) -> Self {
        if raw.success {
            let file_count = raw.file_count.unwrap_or(raw.results.len());
            Self::Found(ResultsPayload {
                score_names: raw.score_names,
                results: raw.results,
                file_count,
                s3_path: raw.s3_path,
            })
        } else {
            Self::Failed(ApiFailure {
                error: raw
                    .error
                    .unwrap_or_else(|| "Failed to fetch results".to_string()),
                searched_path: raw.searched_path,
            })
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "RawDetail")]
pub enum DetailResponse {
    /// The stored record, verbatim.
    Found(serde_json::Value),
    Failed { error: String },
}

#[derive(Debug, Deserialize)]
struct RawDetail {
    success: bool,
    #[serde(default)]
    data: serde_json::Value,
    #[serde(default)]
    error: Option<String>,
}

impl From<RawDetail> for DetailResponse {
    fn from(raw: RawDetail) -> Self {
        if raw.success {
            Self::Found(raw.data)
        } else {
            Self::Failed {
                error: raw.error.unwrap_or_else(|| "unknown error".to_string()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetch_success_decodes_payload() {
        let body = r#"{
            "success": true,
            "job_id": "11111111-1111-1111-1111-111111111111",
            "file_count": 1,
            "score_names": ["accuracy"],
            "results": [{"filename":"a.jsonl","test_case_id":"tc1","result":"PASS",
                         "scores":{"accuracy":{"value":0.82}}}],
            "s3_path": "s3://bucket/11111111-1111-1111-1111-111111111111/llmAsJudgeEval/results/"
        }"#;
        let FetchResultsResponse::Found(payload) = serde_json::from_str(body).unwrap() else {
            panic!("expected success payload");
        };
        assert_eq!(payload.file_count, 1);
        assert_eq!(payload.score_names, ["accuracy"]);
        assert_eq!(payload.results[0].test_case_id, "tc1");
        assert!(payload.s3_path.unwrap().starts_with("s3://"));
    }

    #[test]
    fn fetch_failure_keeps_searched_path() {
        let body = r#"{"success": false, "error": "No results found for JOB_ID: x",
                       "searched_path": "s3://bucket/x/llmAsJudgeEval/results/"}"#;
        let resp: FetchResultsResponse = serde_json::from_str(body).unwrap();
        assert_eq!(
            resp,
            FetchResultsResponse::Failed(ApiFailure {
                error: "No results found for JOB_ID: x".into(),
                searched_path: Some("s3://bucket/x/llmAsJudgeEval/results/".into()),
            })
        );
    }

    #[test]
    fn fetch_failure_without_message_gets_fallback() {
        let resp: FetchResultsResponse = serde_json::from_str(r#"{"success": false}"#).unwrap();
        assert!(matches!(
            resp,
            FetchResultsResponse::Failed(f) if f.error == "Failed to fetch results"
        ));
    }

    #[test]
    fn detail_success_keeps_raw_record() {
        let body =
            r#"{"success": true, "data": {"scores": [], "original": "{}", "result": "PASS"}}"#;
        let DetailResponse::Found(data) = serde_json::from_str(body).unwrap() else {
            panic!("expected detail payload");
        };
        assert_eq!(data["result"], "PASS");
    }

    #[test]
    fn check_response_tolerates_missing_fields() {
        let resp: CheckResponse =
            serde_json::from_str(r#"{"success": false, "error": "expired"}"#).unwrap();
        assert!(!resp.success);
        assert_eq!(resp.account, None);
        assert_eq!(resp.error.as_deref(), Some("expired"));
    }

    #[test]
    fn requests_serialize_null_session() {
        let body = serde_json::to_value(FetchResultsRequest {
            job_id: "11111111-1111-1111-1111-111111111111",
            socket_id: None,
        })
        .unwrap();
        assert!(body["socket_id"].is_null());
    }
}
