use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Languages the workspace can send to the judge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Python,
    Cpp,
    C,
    Java,
    Javascript,
    Rust,
}

impl Language {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "python" | "py" | "python3" => Some(Language::Python),
            "cpp" | "c++" => Some(Language::Cpp),
            "c" => Some(Language::C),
            "java" => Some(Language::Java),
            "javascript" | "js" | "node" => Some(Language::Javascript),
            "rust" | "rs" => Some(Language::Rust),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Python => "python",
            Language::Cpp => "cpp",
            Language::C => "c",
            Language::Java => "java",
            Language::Javascript => "javascript",
            Language::Rust => "rust",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Run checks the visible sample cases only; Submit runs the hidden suite
/// and is graded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    Run,
    Submit,
}

impl fmt::Display for ExecutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionMode::Run => f.write_str("run"),
            ExecutionMode::Submit => f.write_str("submit"),
        }
    }
}

/// Judge classification of an execution outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Verdict {
    Accepted,
    WrongAnswer,
    CompilationError,
    RuntimeError,
    TimeLimitExceeded,
    Error,
}

impl Verdict {
    /// Parse the judge's verdict string.
    ///
    /// Judges disagree on spelling ("Wrong Answer", "WRONG_ANSWER", "WA"),
    /// so separators and case are ignored. Anything unrecognized is `Error`.
    pub fn parse(raw: &str) -> Verdict {
        let key: String = raw
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect();

        match key.as_str() {
            "accepted" | "ac" | "passed" | "ok" => Verdict::Accepted,
            "wronganswer" | "wa" | "failed" => Verdict::WrongAnswer,
            "compilationerror" | "compileerror" | "ce" => Verdict::CompilationError,
            "runtimeerror" | "re" => Verdict::RuntimeError,
            "timelimitexceeded" | "tle" | "timeout" => Verdict::TimeLimitExceeded,
            _ => Verdict::Error,
        }
    }

    pub fn is_accepted(&self) -> bool {
        matches!(self, Verdict::Accepted)
    }

    /// Human readable label used in notices and terminal output.
    pub fn label(&self) -> &'static str {
        match self {
            Verdict::Accepted => "Accepted",
            Verdict::WrongAnswer => "Wrong Answer",
            Verdict::CompilationError => "Compilation Error",
            Verdict::RuntimeError => "Runtime Error",
            Verdict::TimeLimitExceeded => "Time Limit Exceeded",
            Verdict::Error => "Error",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Outcome of a single test case as shown to the learner.
///
/// Hidden cases only reveal pass/fail: `input` and `expected_output` are
/// always `None` for them.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCaseResult {
    pub input: Option<String>,
    pub expected_output: Option<String>,
    pub actual_output: Option<String>,
    pub passed: bool,
    pub verdict: Option<Verdict>,
    pub error: Option<String>,
    pub is_hidden: bool,
    pub is_custom: bool,
}

/// Canonical result of one completed run or submit round-trip.
///
/// Built once by the normalizer and never mutated afterwards; a new action
/// produces a new value with a fresh `request_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionResult {
    pub request_id: Uuid,
    pub mode: ExecutionMode,
    pub verdict: Verdict,
    pub test_cases_passed: u32,
    pub total_test_cases: u32,
    pub results: Vec<TestCaseResult>,
    pub error: Option<String>,
    pub coins_earned: u32,
    pub total_coins: u32,
    pub is_first_solve: bool,
    pub is_custom_input: bool,
    pub received_at: DateTime<Utc>,
}

impl ExecutionResult {
    pub fn is_compilation_error(&self) -> bool {
        self.verdict == Verdict::CompilationError
    }

    pub fn all_passed(&self) -> bool {
        self.total_test_cases > 0 && self.test_cases_passed == self.total_test_cases
    }
}
