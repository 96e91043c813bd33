// Judge wire format.
// Request bodies and the two response variants exactly as the judge sends
// them. Nothing here is canonical; the workspace normalizer is the only place
// these shapes are converted into `ExecutionResult`.

use serde::{Deserialize, Serialize};

use crate::types::Language;

pub const RUN_PATH: &str = "run";
pub const SUBMIT_PATH: &str = "submit";

/// Join the judge base URL and an endpoint path without doubling slashes.
pub fn endpoint_url(base_url: &str, path: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), path.trim_start_matches('/'))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunRequest {
    pub problem_id: String,
    pub code: String,
    pub language: Language,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_input: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitRequest {
    pub problem_id: String,
    pub code: String,
    pub language: Language,
}

/// One test case entry as reported by the judge.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTestCase {
    #[serde(default)]
    pub input: Option<String>,
    #[serde(default)]
    pub expected_output: Option<String>,
    #[serde(default, alias = "output")]
    pub actual_output: Option<String>,
    #[serde(default)]
    pub passed: bool,
    #[serde(default, alias = "status")]
    pub verdict: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub is_hidden: bool,
    #[serde(default)]
    pub is_custom: bool,
}

/// `POST run` response body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunResponse {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub verdict: Option<String>,
    #[serde(default)]
    pub test_cases_passed: Option<i64>,
    #[serde(default)]
    pub total_test_cases: Option<i64>,
    #[serde(default)]
    pub results: Option<Vec<RawTestCase>>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// `POST submit` response body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponse {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub verdict: Option<String>,
    #[serde(default)]
    pub results: Option<Vec<RawTestCase>>,
    #[serde(default)]
    pub coins_earned: Option<i64>,
    #[serde(default)]
    pub total_coins: Option<i64>,
    #[serde(default)]
    pub is_first_solve: Option<bool>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Either judge response, tagged by the endpoint that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JudgeResponse {
    Run(RunResponse),
    Submit(SubmitResponse),
}
