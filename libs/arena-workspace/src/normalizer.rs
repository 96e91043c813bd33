/// Result Normalizer - Judge Responses to Canonical Results
///
/// **Core Responsibility:**
/// The single boundary where judge response variants become
/// `ExecutionResult`. Nothing past this module looks at wire shapes.
///
/// **Critical Properties:**
/// - Pure: (response, caller context) → outcome, no I/O
/// - Knows nothing about HTTP, editors or controller state
///
/// **Mapping Rules:**
/// - Missing counts are derived from `results`, or 0 when there are none
/// - `results` defaults to empty
/// - Reward fields default to 0/0/false and are never set for Run
/// - `is_custom_input` is true iff the caller supplied custom input
/// - `passed` never exceeds `total`; Accepted and WrongAnswer are reconciled
///   with the counts for judged (non-custom) executions
/// - Hidden cases never carry input or expected output
/// - `success=false` with a verdict or results still yields a result
///   (partial), with `error` taken from the failure message
/// - `success=false` with neither yields only an error
/// - A missing `success` counts as success only when there is a payload and
///   no `error`
use arena_common::types::{ExecutionMode, ExecutionResult, TestCaseResult, Verdict};
use arena_common::wire::{JudgeResponse, RawTestCase, RunResponse, SubmitResponse};
use chrono::Utc;
use tracing::warn;
use uuid::Uuid;

pub const DEFAULT_FAILURE_MESSAGE: &str = "Execution failed";

/// What a judge response amounts to once normalized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Normalized {
    /// The judge reported success.
    Complete(ExecutionResult),
    /// The judge reported failure but still sent a verdict or results.
    Partial(ExecutionResult),
    /// The judge reported failure with nothing to show.
    Failed(String),
}

impl Normalized {
    pub fn result(&self) -> Option<&ExecutionResult> {
        match self {
            Normalized::Complete(r) | Normalized::Partial(r) => Some(r),
            Normalized::Failed(_) => None,
        }
    }

    pub fn into_result(self) -> Option<ExecutionResult> {
        match self {
            Normalized::Complete(r) | Normalized::Partial(r) => Some(r),
            Normalized::Failed(_) => None,
        }
    }
}

/// Normalize either response variant.
pub fn normalize(response: JudgeResponse, custom_input: bool) -> Normalized {
    match response {
        JudgeResponse::Run(run) => normalize_run(run, custom_input),
        JudgeResponse::Submit(submit) => normalize_submit(submit),
    }
}

pub fn normalize_run(response: RunResponse, custom_input: bool) -> Normalized {
    let has_payload = response.verdict.is_some() || response.results.is_some();
    let success = response
        .success
        .unwrap_or(response.error.is_none() && has_payload);
    if !success && !has_payload {
        return Normalized::Failed(failure_message(response.error, response.message));
    }

    let cases = convert_cases(response.results.unwrap_or_default(), custom_input);
    let (passed, total) = counts(response.test_cases_passed, response.total_test_cases, &cases);
    let (verdict, passed) = resolve_verdict(response.verdict.as_deref(), passed, total, custom_input);

    let error = if success {
        response.error
    } else {
        Some(failure_message(response.error, response.message))
    };

    let result = ExecutionResult {
        request_id: Uuid::new_v4(),
        mode: ExecutionMode::Run,
        verdict,
        test_cases_passed: passed,
        total_test_cases: total,
        results: cases,
        error,
        coins_earned: 0,
        total_coins: 0,
        is_first_solve: false,
        is_custom_input: custom_input,
        received_at: Utc::now(),
    };

    if success {
        Normalized::Complete(result)
    } else {
        Normalized::Partial(result)
    }
}

pub fn normalize_submit(response: SubmitResponse) -> Normalized {
    let has_payload = response.verdict.is_some() || response.results.is_some();
    let success = response
        .success
        .unwrap_or(response.error.is_none() && has_payload);
    if !success && !has_payload {
        return Normalized::Failed(failure_message(response.error, response.message));
    }

    let cases = convert_cases(response.results.unwrap_or_default(), false);
    let (passed, total) = counts(None, None, &cases);
    let (verdict, passed) = resolve_verdict(response.verdict.as_deref(), passed, total, false);

    let error = if success {
        response.error
    } else {
        Some(failure_message(response.error, response.message))
    };

    let result = ExecutionResult {
        request_id: Uuid::new_v4(),
        mode: ExecutionMode::Submit,
        verdict,
        test_cases_passed: passed,
        total_test_cases: total,
        results: cases,
        error,
        coins_earned: non_negative(response.coins_earned),
        total_coins: non_negative(response.total_coins),
        is_first_solve: response.is_first_solve.unwrap_or(false),
        is_custom_input: false,
        received_at: Utc::now(),
    };

    if success {
        Normalized::Complete(result)
    } else {
        Normalized::Partial(result)
    }
}

fn failure_message(error: Option<String>, message: Option<String>) -> String {
    error
        .filter(|e| !e.trim().is_empty())
        .or(message.filter(|m| !m.trim().is_empty()))
        .unwrap_or_else(|| DEFAULT_FAILURE_MESSAGE.to_string())
}

fn non_negative(value: Option<i64>) -> u32 {
    value
        .map(|v| v.clamp(0, u32::MAX as i64) as u32)
        .unwrap_or(0)
}

fn convert_cases(raw: Vec<RawTestCase>, custom_input: bool) -> Vec<TestCaseResult> {
    raw.into_iter()
        .map(|case| {
            let hidden = case.is_hidden;
            TestCaseResult {
                input: if hidden { None } else { case.input },
                expected_output: if hidden { None } else { case.expected_output },
                actual_output: case.actual_output,
                passed: case.passed,
                verdict: case.verdict.as_deref().map(Verdict::parse),
                error: case.error,
                is_hidden: hidden,
                is_custom: case.is_custom || custom_input,
            }
        })
        .collect()
}

/// (passed, total) with `passed <= total`.
fn counts(passed: Option<i64>, total: Option<i64>, cases: &[TestCaseResult]) -> (u32, u32) {
    let counted_passed = cases.iter().filter(|c| c.passed).count() as u32;
    let counted_total = cases.len() as u32;

    let total = total.map(|t| non_negative(Some(t))).unwrap_or(counted_total);
    let passed = passed.map(|p| non_negative(Some(p))).unwrap_or(counted_passed);
    (passed.min(total), total)
}

/// Verdict and passed count, made to agree: Accepted exactly when every
/// judged case passed.
fn resolve_verdict(raw: Option<&str>, passed: u32, total: u32, custom_input: bool) -> (Verdict, u32) {
    let verdict = match raw {
        Some(v) => Verdict::parse(v),
        None if total > 0 && passed == total => Verdict::Accepted,
        None if total > 0 => Verdict::WrongAnswer,
        None => Verdict::Error,
    };

    // Custom input has no expected output to be judged against.
    if custom_input || total == 0 {
        return (verdict, passed);
    }

    match verdict {
        Verdict::Accepted if passed < total => {
            warn!(passed, total, "Judge reported Accepted with failing cases; using WrongAnswer");
            (Verdict::WrongAnswer, passed)
        }
        // Output mismatch is all Wrong Answer means, so a full pass overrides it.
        Verdict::WrongAnswer if passed == total => {
            warn!(passed, total, "Judge reported WrongAnswer with all cases passing; using Accepted");
            (Verdict::Accepted, passed)
        }
        // Crashes, timeouts and compile failures are not visible in the
        // counts; the verdict stands and at least one case counts as failed.
        other if !other.is_accepted() && passed == total => {
            warn!(passed, total, verdict = ?other, "Failing verdict with all cases passing; counting one failure");
            (other, total - 1)
        }
        other => (other, passed),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn case(passed: bool) -> RawTestCase {
        RawTestCase {
            input: Some("1 2".to_string()),
            expected_output: Some("3".to_string()),
            actual_output: Some(if passed { "3" } else { "4" }.to_string()),
            passed,
            ..RawTestCase::default()
        }
    }

    fn run_ok(verdict: &str, passed: i64, total: i64, results: Vec<RawTestCase>) -> RunResponse {
        RunResponse {
            success: Some(true),
            verdict: Some(verdict.to_string()),
            test_cases_passed: Some(passed),
            total_test_cases: Some(total),
            results: Some(results),
            ..RunResponse::default()
        }
    }

    #[test]
    fn test_run_accepted() {
        let response = run_ok("Accepted", 3, 3, vec![case(true), case(true), case(true)]);
        let Normalized::Complete(result) = normalize_run(response, false) else {
            panic!("expected complete result");
        };

        assert_eq!(result.mode, ExecutionMode::Run);
        assert_eq!(result.verdict, Verdict::Accepted);
        assert_eq!(result.test_cases_passed, 3);
        assert_eq!(result.total_test_cases, 3);
        assert_eq!(result.results.len(), 3);
        assert_eq!(result.coins_earned, 0);
        assert!(!result.is_first_solve);
        assert!(!result.is_custom_input);
    }

    #[test]
    fn test_missing_fields_default() {
        let response = RunResponse {
            success: Some(true),
            verdict: Some("Runtime Error".to_string()),
            ..RunResponse::default()
        };
        let result = normalize_run(response, false).into_result().unwrap();

        assert_eq!(result.verdict, Verdict::RuntimeError);
        assert_eq!(result.test_cases_passed, 0);
        assert_eq!(result.total_test_cases, 0);
        assert!(result.results.is_empty());
        assert!(result.error.is_none());
    }

    #[test]
    fn test_counts_derived_from_results_when_absent() {
        let response = RunResponse {
            success: Some(true),
            verdict: Some("Wrong Answer".to_string()),
            results: Some(vec![case(true), case(false)]),
            ..RunResponse::default()
        };
        let result = normalize_run(response, false).into_result().unwrap();
        assert_eq!(result.test_cases_passed, 1);
        assert_eq!(result.total_test_cases, 2);
    }

    #[test]
    fn test_passed_never_exceeds_total() {
        let response = run_ok("Accepted", 9, 3, vec![]);
        let result = normalize_run(response, false).into_result().unwrap();
        assert_eq!(result.test_cases_passed, 3);
        assert_eq!(result.total_test_cases, 3);
    }

    #[test]
    fn test_negative_counts_clamp_to_zero() {
        let response = run_ok("Wrong Answer", -1, 2, vec![]);
        let result = normalize_run(response, false).into_result().unwrap();
        assert_eq!(result.test_cases_passed, 0);
        assert_eq!(result.total_test_cases, 2);
    }

    #[test]
    fn test_accepted_reconciled_with_counts() {
        let shortfall = normalize_run(run_ok("Accepted", 2, 3, vec![]), false).into_result().unwrap();
        assert_eq!(shortfall.verdict, Verdict::WrongAnswer);

        let full = normalize_run(run_ok("Wrong Answer", 3, 3, vec![]), false).into_result().unwrap();
        assert_eq!(full.verdict, Verdict::Accepted);

        let tle = normalize_run(run_ok("TLE", 1, 3, vec![]), false).into_result().unwrap();
        assert_eq!(tle.verdict, Verdict::TimeLimitExceeded);
    }

    #[test]
    fn test_custom_input_flag() {
        let response = RunResponse {
            success: Some(true),
            verdict: Some("Accepted".to_string()),
            results: Some(vec![RawTestCase {
                input: Some("42".to_string()),
                actual_output: Some("42".to_string()),
                ..RawTestCase::default()
            }]),
            ..RunResponse::default()
        };
        let result = normalize_run(response, true).into_result().unwrap();

        assert!(result.is_custom_input);
        assert!(result.results[0].is_custom);
        // No expected output exists, so the verdict is left alone.
        assert_eq!(result.verdict, Verdict::Accepted);
    }

    #[test]
    fn test_hidden_cases_withhold_io() {
        let response = SubmitResponse {
            success: Some(true),
            verdict: Some("Wrong Answer".to_string()),
            results: Some(vec![
                case(true),
                RawTestCase {
                    is_hidden: true,
                    ..case(false)
                },
            ]),
            ..SubmitResponse::default()
        };
        let result = normalize_submit(response).into_result().unwrap();

        let hidden = &result.results[1];
        assert!(hidden.is_hidden);
        assert!(hidden.input.is_none());
        assert!(hidden.expected_output.is_none());
        assert!(!hidden.passed);
        assert!(result.results[0].input.is_some());
    }

    #[test]
    fn test_submit_rewards() {
        let response = SubmitResponse {
            success: Some(true),
            verdict: Some("Accepted".to_string()),
            results: Some(vec![case(true), case(true)]),
            coins_earned: Some(15),
            total_coins: Some(140),
            is_first_solve: Some(true),
            ..SubmitResponse::default()
        };
        let result = normalize_submit(response).into_result().unwrap();

        assert_eq!(result.mode, ExecutionMode::Submit);
        assert_eq!(result.verdict, Verdict::Accepted);
        assert_eq!(result.test_cases_passed, 2);
        assert_eq!(result.total_test_cases, 2);
        assert_eq!(result.coins_earned, 15);
        assert_eq!(result.total_coins, 140);
        assert!(result.is_first_solve);
    }

    #[test]
    fn test_submit_rewards_default() {
        let response = SubmitResponse {
            success: Some(true),
            verdict: Some("Wrong Answer".to_string()),
            ..SubmitResponse::default()
        };
        let result = normalize_submit(response).into_result().unwrap();
        assert_eq!(result.coins_earned, 0);
        assert_eq!(result.total_coins, 0);
        assert!(!result.is_first_solve);
    }

    #[test]
    fn test_compilation_error_keeps_error_text() {
        let response = SubmitResponse {
            success: Some(true),
            verdict: Some("CompilationError".to_string()),
            error: Some("main.cpp:7: error: expected ';'".to_string()),
            ..SubmitResponse::default()
        };
        let result = normalize_submit(response).into_result().unwrap();
        assert_eq!(result.verdict, Verdict::CompilationError);
        assert_eq!(result.error.as_deref(), Some("main.cpp:7: error: expected ';'"));
    }

    #[test]
    fn test_partial_failure_with_verdict() {
        let response = RunResponse {
            success: Some(false),
            verdict: Some("Runtime Error".to_string()),
            results: Some(vec![case(true), case(false)]),
            message: Some("Execution aborted".to_string()),
            ..RunResponse::default()
        };
        let Normalized::Partial(result) = normalize_run(response, false) else {
            panic!("expected partial result");
        };
        assert_eq!(result.verdict, Verdict::RuntimeError);
        assert_eq!(result.error.as_deref(), Some("Execution aborted"));
        assert_eq!(result.results.len(), 2);
    }

    #[test]
    fn test_partial_failure_results_only() {
        let response = SubmitResponse {
            success: Some(false),
            results: Some(vec![case(false)]),
            ..SubmitResponse::default()
        };
        let Normalized::Partial(result) = normalize_submit(response) else {
            panic!("expected partial result");
        };
        assert_eq!(result.verdict, Verdict::WrongAnswer);
        assert_eq!(result.error.as_deref(), Some(DEFAULT_FAILURE_MESSAGE));
    }

    #[test]
    fn test_failure_without_payload() {
        let response = RunResponse {
            success: Some(false),
            message: Some("Problem not found".to_string()),
            ..RunResponse::default()
        };
        assert_eq!(
            normalize_run(response, false),
            Normalized::Failed("Problem not found".to_string())
        );
    }

    #[test]
    fn test_missing_success_flag_uses_error_presence() {
        let failed = RunResponse {
            error: Some("Internal error".to_string()),
            ..RunResponse::default()
        };
        assert_eq!(normalize_run(failed, false), Normalized::Failed("Internal error".to_string()));

        let ok = RunResponse {
            verdict: Some("Accepted".to_string()),
            ..RunResponse::default()
        };
        assert!(matches!(normalize_run(ok, false), Normalized::Complete(_)));
    }

    #[test]
    fn test_message_only_body_is_failure() {
        let response = RunResponse {
            message: Some("Internal server error".to_string()),
            ..RunResponse::default()
        };
        assert_eq!(
            normalize_run(response, false),
            Normalized::Failed("Internal server error".to_string())
        );

        let empty = normalize_submit(SubmitResponse::default());
        assert_eq!(empty, Normalized::Failed(DEFAULT_FAILURE_MESSAGE.to_string()));
    }

    #[test]
    fn test_dispatch_by_variant() {
        let run = normalize(JudgeResponse::Run(run_ok("Accepted", 1, 1, vec![])), true);
        assert_eq!(run.result().unwrap().mode, ExecutionMode::Run);

        let submit = normalize(
            JudgeResponse::Submit(SubmitResponse {
                success: Some(true),
                verdict: Some("Accepted".to_string()),
                ..SubmitResponse::default()
            }),
            true,
        );
        // Submissions never use custom input.
        assert!(!submit.result().unwrap().is_custom_input);
    }

    #[test]
    fn test_accepted_iff_all_passed() {
        let verdicts = [
            "Accepted",
            "Wrong Answer",
            "Compilation Error",
            "Runtime Error",
            "TLE",
            "Internal Error",
        ];
        for verdict in verdicts {
            for passed in [0, 1, 3] {
                let response = run_ok(verdict, passed, 3, vec![]);
                let result = normalize_run(response, false).into_result().unwrap();
                assert!(result.test_cases_passed <= result.total_test_cases);
                assert_eq!(
                    result.verdict == Verdict::Accepted,
                    result.all_passed(),
                    "{} with {}/3 became {:?} {}/{}",
                    verdict,
                    passed,
                    result.verdict,
                    result.test_cases_passed,
                    result.total_test_cases
                );
            }
        }
    }

    #[test]
    fn test_failing_verdict_with_full_pass_keeps_verdict() {
        let result = normalize_run(run_ok("TLE", 3, 3, vec![]), false).into_result().unwrap();
        assert_eq!(result.verdict, Verdict::TimeLimitExceeded);
        assert_eq!(result.test_cases_passed, 2);
        assert_eq!(result.total_test_cases, 3);

        let submit = SubmitResponse {
            success: Some(true),
            verdict: Some("Runtime Error".to_string()),
            results: Some(vec![case(true), case(true)]),
            ..SubmitResponse::default()
        };
        let result = normalize_submit(submit).into_result().unwrap();
        assert_eq!(result.verdict, Verdict::RuntimeError);
        assert_eq!((result.test_cases_passed, result.total_test_cases), (1, 2));
    }
}
