// Terminal collaborators for the workspace: stdin confirmation, console
// notices and plain-text rendering of results and markers.
use anyhow::{Context, Result};
use arena_common::types::{ExecutionMode, ExecutionResult};
use arena_workspace::diagnostics::DiagnosticMarker;
use arena_workspace::host::{ConfirmGate, Notice, NoticeLevel, Notifier};
use std::fmt::Write as _;
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::Path;

/// Asks on stderr and reads y/N from stdin. Anything but "y"/"yes" declines.
pub struct StdinGate;

impl ConfirmGate for StdinGate {
    fn confirm(&self, prompt: &str) -> bool {
        eprint!("⚠️  {}\n\nContinue? (y/N): ", prompt);
        let _ = io::stderr().flush();

        let mut input = String::new();
        if io::stdin().lock().read_line(&mut input).is_err() {
            return false;
        }
        is_yes(&input)
    }
}

pub fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}

/// Prints notices to stderr so stdout stays clean for `--json`.
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, notice: Notice) {
        let icon = match notice.level {
            NoticeLevel::Info => "ℹ️ ",
            NoticeLevel::Success => "✅",
            NoticeLevel::Warning => "⚠️ ",
            NoticeLevel::Error => "❌",
        };
        eprintln!("{} {}", icon, notice.message);
    }
}

pub fn read_text(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

pub fn read_stdin() -> Result<String> {
    let mut text = String::new();
    for line in io::stdin().lock().lines() {
        let line = line.context("Failed to read stdin")?;
        text.push_str(&line);
        text.push('\n');
    }
    Ok(text)
}

/// Console report for a judged result.
pub fn render_result(result: &ExecutionResult) -> String {
    let mut out = String::new();
    let icon = if result.verdict.is_accepted() { "✅" } else { "❌" };

    if result.is_custom_input {
        let _ = writeln!(out, "{} {} (custom input)", icon, result.verdict.label());
    } else {
        let _ = writeln!(
            out,
            "{} {}: {}/{} test cases passed",
            icon,
            result.verdict.label(),
            result.test_cases_passed,
            result.total_test_cases
        );
    }

    if let Some(error) = &result.error {
        let _ = writeln!(out, "\n{}", error.trim_end());
    }

    for (idx, case) in result.results.iter().enumerate() {
        let mark = if case.passed { "✅" } else { "❌" };
        if case.is_hidden {
            let _ = writeln!(out, "\nCase {} (hidden): {}", idx + 1, mark);
            continue;
        }
        let _ = writeln!(out, "\nCase {}: {}", idx + 1, mark);
        if let Some(input) = &case.input {
            let _ = writeln!(out, "  input:    {}", input.trim_end());
        }
        if let Some(expected) = &case.expected_output {
            let _ = writeln!(out, "  expected: {}", expected.trim_end());
        }
        if let Some(actual) = &case.actual_output {
            let _ = writeln!(out, "  output:   {}", actual.trim_end());
        }
        if let Some(error) = &case.error {
            let _ = writeln!(out, "  error:    {}", error.trim_end());
        }
    }

    if result.mode == ExecutionMode::Submit && result.verdict.is_accepted() {
        let _ = writeln!(out, "\n🪙 +{} coins ({} total)", result.coins_earned, result.total_coins);
        if result.is_first_solve {
            let _ = writeln!(out, "🎉 First solve!");
        }
    }

    out
}

pub fn render_markers(markers: &[DiagnosticMarker], document: &str) -> String {
    let lines: Vec<&str> = document.split('\n').collect();
    let mut out = String::new();
    for marker in markers {
        let source = (marker.line as usize)
            .checked_sub(1)
            .and_then(|idx| lines.get(idx).copied())
            .unwrap_or_default();
        let _ = writeln!(out, "{:>4} | {}", marker.line, source.trim_end());
        let _ = writeln!(out, "     = {}", marker.message);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use arena_common::types::{TestCaseResult, Verdict};
    use arena_workspace::diagnostics::DiagnosticLocator;

    fn judged(mode: ExecutionMode, verdict: Verdict, cases: Vec<TestCaseResult>) -> ExecutionResult {
        let passed = cases.iter().filter(|c| c.passed).count() as u32;
        ExecutionResult {
            request_id: uuid::Uuid::nil(),
            mode,
            verdict,
            test_cases_passed: passed,
            total_test_cases: cases.len() as u32,
            results: cases,
            error: None,
            coins_earned: 0,
            total_coins: 0,
            is_first_solve: false,
            is_custom_input: false,
            received_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn test_is_yes() {
        assert!(is_yes("y\n"));
        assert!(is_yes("  YES "));
        assert!(!is_yes(""));
        assert!(!is_yes("nope"));
    }

    #[test]
    fn test_render_hides_hidden_case_details() {
        let cases = vec![
            TestCaseResult {
                input: Some("1 2".to_string()),
                expected_output: Some("3".to_string()),
                actual_output: Some("3".to_string()),
                passed: true,
                ..TestCaseResult::default()
            },
            TestCaseResult {
                passed: false,
                is_hidden: true,
                ..TestCaseResult::default()
            },
        ];
        let text = render_result(&judged(ExecutionMode::Submit, Verdict::WrongAnswer, cases));

        assert!(text.contains("Wrong Answer: 1/2 test cases passed"));
        assert!(text.contains("input:    1 2"));
        assert!(text.contains("Case 2 (hidden): ❌"));
        assert!(!text.contains("coins"));
    }

    #[test]
    fn test_render_markers_quotes_source_line() {
        let document = "int main() {\n  return 0\n}\n";
        let markers = DiagnosticLocator::default().locate("main.cpp:2:11: error: expected ';'", document);
        let text = render_markers(&markers, document);

        assert!(text.contains("   2 |   return 0"));
        assert!(text.contains("expected ';'"));
    }

    #[test]
    fn test_read_text_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("solution.py");
        let err = read_text(&missing).unwrap_err();
        assert!(err.to_string().contains("solution.py"));
    }
}
