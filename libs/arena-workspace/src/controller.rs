/// Execution Controller - Run/Submit Orchestration
///
/// **Responsibility:**
/// Accept Run and Submit actions from the view, call the judge, and keep the
/// displayable state (active result, diagnostics, flags) consistent.
///
/// **State machine:**
/// - Idle → Running → Idle (run result)
/// - Idle → Submitting → Idle (submit result)
/// - any in-flight state → Idle with an error when the request fails
///
/// **Guards (checked in order, each a no-op with a warning):**
/// 1. workspace unmounted
/// 2. blank code
/// 3. another Run or Submit in flight (rejected, never queued)
/// 4. Submit only: the user declines the confirmation prompt
///
/// This module is the glue layer. It knows nothing about:
/// - Wire shapes (normalizer's job)
/// - Diagnostic formats (locator's job)
/// - HTTP (backend's job)
use arena_common::types::{ExecutionMode, ExecutionResult, Language, Verdict};
use arena_common::wire::{JudgeResponse, RunRequest, SubmitRequest};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tracing::{info, instrument, warn};

use crate::backend::{BackendError, BackendErrorKind, ExecutionBackend};
use crate::diagnostics::{DiagnosticLocator, DiagnosticMarker};
use crate::host::{ConfirmGate, EditorHost, Notice, NoticeLevel, Notifier};
use crate::normalizer::{self, Normalized};
use crate::progress::{ProgressTicker, ProgressValue};
use crate::session::MountGuard;

pub const SUBMIT_CONFIRMATION: &str =
    "Submit your solution? Submissions are graded against all test cases and recorded.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Idle,
    Running,
    Submitting,
}

impl Phase {
    fn for_mode(mode: ExecutionMode) -> Self {
        match mode {
            ExecutionMode::Run => Phase::Running,
            ExecutionMode::Submit => Phase::Submitting,
        }
    }
}

/// Why an action was refused before reaching the judge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionRejection {
    EmptyCode,
    Busy { phase: Phase },
    Unmounted,
}

impl fmt::Display for ActionRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionRejection::EmptyCode => f.write_str("Please write some code first"),
            ActionRejection::Busy { phase: Phase::Submitting } => {
                f.write_str("A submission is already in progress")
            }
            ActionRejection::Busy { .. } => f.write_str("Code is already running"),
            ActionRejection::Unmounted => f.write_str("Workspace is closed"),
        }
    }
}

impl std::error::Error for ActionRejection {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FailureKind {
    Transport,
    HttpStatus(u16),
    Decode,
    Timeout,
    /// The judge answered `success=false`.
    Judge,
}

impl From<BackendErrorKind> for FailureKind {
    fn from(kind: BackendErrorKind) -> Self {
        match kind {
            BackendErrorKind::Transport => FailureKind::Transport,
            BackendErrorKind::Status(code) => FailureKind::HttpStatus(code),
            BackendErrorKind::Decode => FailureKind::Decode,
            BackendErrorKind::Timeout => FailureKind::Timeout,
        }
    }
}

/// Error payload left behind by the most recent action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionFailure {
    pub mode: ExecutionMode,
    pub kind: FailureKind,
    pub message: String,
}

/// What happened to one `run`/`submit` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    Rejected(ActionRejection),
    /// The user declined the submit confirmation.
    Declined,
    Completed(ExecutionResult),
    /// Judge reported failure but still sent a verdict or results.
    Partial(ExecutionResult),
    Failed(ExecutionFailure),
    /// The workspace was torn down before the response arrived.
    Dropped,
}

impl ActionOutcome {
    pub fn result(&self) -> Option<&ExecutionResult> {
        match self {
            ActionOutcome::Completed(r) | ActionOutcome::Partial(r) => Some(r),
            _ => None,
        }
    }
}

/// Expected case counts for the loaded problem; only used for progress.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CaseCounts {
    pub sample: u32,
    pub total: u32,
}

#[derive(Debug)]
struct ControllerState {
    phase: Phase,
    run_result: Option<ExecutionResult>,
    submit_result: Option<ExecutionResult>,
    last_error: Option<ExecutionFailure>,
    markers: Vec<DiagnosticMarker>,
    ticker: Option<ProgressTicker>,
    case_counts: CaseCounts,
}

impl ControllerState {
    fn slot(&mut self, mode: ExecutionMode) -> &mut Option<ExecutionResult> {
        match mode {
            ExecutionMode::Run => &mut self.run_result,
            ExecutionMode::Submit => &mut self.submit_result,
        }
    }

    fn active(&self) -> Option<&ExecutionResult> {
        // Starting either action clears the other slot, so at most one is set.
        // The same-mode slot is kept while its next request is in flight: the
        // previous run stays on screen until the new one resolves.
        self.run_result.as_ref().or(self.submit_result.as_ref())
    }
}

pub struct ExecutionController {
    backend: Arc<dyn ExecutionBackend>,
    editor: Arc<dyn EditorHost>,
    gate: Arc<dyn ConfirmGate>,
    notifier: Arc<dyn Notifier>,
    locator: DiagnosticLocator,
    mount: MountGuard,
    progress: ProgressValue,
    tick: Duration,
    timeout: Option<Duration>,
    state: Mutex<ControllerState>,
}

impl ExecutionController {
    pub fn new(
        backend: Arc<dyn ExecutionBackend>,
        editor: Arc<dyn EditorHost>,
        gate: Arc<dyn ConfirmGate>,
        notifier: Arc<dyn Notifier>,
        mount: MountGuard,
    ) -> Self {
        Self {
            backend,
            editor,
            gate,
            notifier,
            locator: DiagnosticLocator::default(),
            mount,
            progress: ProgressValue::default(),
            tick: Duration::from_millis(crate::config::DEFAULT_PROGRESS_TICK_MS),
            timeout: None,
            state: Mutex::new(ControllerState {
                phase: Phase::Idle,
                run_result: None,
                submit_result: None,
                last_error: None,
                markers: Vec::new(),
                ticker: None,
                case_counts: CaseCounts::default(),
            }),
        }
    }

    pub fn with_locator(mut self, locator: DiagnosticLocator) -> Self {
        self.locator = locator;
        self
    }

    pub fn with_progress_tick(mut self, tick: Duration) -> Self {
        self.tick = tick;
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    fn lock(&self) -> MutexGuard<'_, ControllerState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Case counts of the loaded problem, used to bound cosmetic progress.
    pub fn set_case_counts(&self, counts: CaseCounts) {
        self.lock().case_counts = counts;
    }

    pub fn phase(&self) -> Phase {
        self.lock().phase
    }

    pub fn is_running(&self) -> bool {
        self.phase() == Phase::Running
    }

    pub fn is_submitting(&self) -> bool {
        self.phase() == Phase::Submitting
    }

    /// Whether the Run and Submit triggers should be enabled.
    pub fn can_execute(&self) -> bool {
        self.phase() == Phase::Idle && self.mount.is_mounted()
    }

    pub fn active_result(&self) -> Option<ExecutionResult> {
        self.lock().active().cloned()
    }

    pub fn run_result(&self) -> Option<ExecutionResult> {
        self.lock().run_result.clone()
    }

    pub fn submit_result(&self) -> Option<ExecutionResult> {
        self.lock().submit_result.clone()
    }

    pub fn last_error(&self) -> Option<ExecutionFailure> {
        self.lock().last_error.clone()
    }

    pub fn markers(&self) -> Vec<DiagnosticMarker> {
        self.lock().markers.clone()
    }

    /// Cosmetic progress; not a completion signal.
    pub fn progress(&self) -> u32 {
        self.progress.get()
    }

    /// Run the code against the sample cases, or against `custom_input`.
    #[instrument(skip(self, code, custom_input), fields(problem_id = %problem_id, language = %language))]
    pub async fn run(
        &self,
        problem_id: &str,
        code: &str,
        language: Language,
        custom_input: Option<&str>,
    ) -> ActionOutcome {
        if let Err(rejection) = self.check_guards(code) {
            return self.reject(rejection);
        }
        if let Err(rejection) = self.begin(ExecutionMode::Run) {
            return self.reject(rejection);
        }

        let request = RunRequest {
            problem_id: problem_id.to_string(),
            code: code.to_string(),
            language,
            custom_input: custom_input.map(str::to_string),
        };
        info!(custom_input = request.custom_input.is_some(), "Dispatching run");

        let response = self.call(self.backend.run(&request)).await;
        self.finish(
            ExecutionMode::Run,
            response.map(JudgeResponse::Run),
            request.custom_input.is_some(),
        )
    }

    /// Submit the code for grading against the full hidden suite.
    #[instrument(skip(self, code), fields(problem_id = %problem_id, language = %language))]
    pub async fn submit(&self, problem_id: &str, code: &str, language: Language) -> ActionOutcome {
        if let Err(rejection) = self.check_guards(code) {
            return self.reject(rejection);
        }
        if !self.gate.confirm(SUBMIT_CONFIRMATION) {
            info!("Submission declined by user");
            return ActionOutcome::Declined;
        }
        if let Err(rejection) = self.begin(ExecutionMode::Submit) {
            return self.reject(rejection);
        }

        let request = SubmitRequest {
            problem_id: problem_id.to_string(),
            code: code.to_string(),
            language,
        };
        info!("Dispatching submission");

        let response = self.call(self.backend.submit(&request)).await;
        self.finish(ExecutionMode::Submit, response.map(JudgeResponse::Submit), false)
    }

    /// Clear the active result, error and markers. Idempotent.
    pub fn dismiss_result(&self) {
        {
            let mut state = self.lock();
            state.run_result = None;
            state.submit_result = None;
            state.last_error = None;
            state.markers.clear();
        }
        self.editor.set_markers(&[]);
    }

    /// Stop in-flight bookkeeping when the workspace goes away. Any response
    /// that arrives afterwards is dropped by the mount guard.
    pub fn teardown(&self) {
        let ticker = self.lock().ticker.take();
        drop(ticker);
    }

    fn check_guards(&self, code: &str) -> Result<(), ActionRejection> {
        if !self.mount.is_mounted() {
            return Err(ActionRejection::Unmounted);
        }
        if code.trim().is_empty() {
            return Err(ActionRejection::EmptyCode);
        }
        let phase = self.phase();
        if phase != Phase::Idle {
            return Err(ActionRejection::Busy { phase });
        }
        Ok(())
    }

    fn reject(&self, rejection: ActionRejection) -> ActionOutcome {
        warn!(reason = ?rejection, "Action rejected");
        if rejection != ActionRejection::Unmounted {
            self.notifier
                .notify(Notice::new(NoticeLevel::Warning, rejection.to_string()));
        }
        ActionOutcome::Rejected(rejection)
    }

    /// Enter the in-flight phase for `mode`. Checked and set under one lock.
    fn begin(&self, mode: ExecutionMode) -> Result<(), ActionRejection> {
        {
            let mut state = self.lock();
            if state.phase != Phase::Idle {
                return Err(ActionRejection::Busy { phase: state.phase });
            }

            state.phase = Phase::for_mode(mode);
            let other = match mode {
                ExecutionMode::Run => ExecutionMode::Submit,
                ExecutionMode::Submit => ExecutionMode::Run,
            };
            *state.slot(other) = None;
            state.last_error = None;
            state.markers.clear();

            let expected = match mode {
                ExecutionMode::Run => state.case_counts.sample,
                ExecutionMode::Submit => state.case_counts.total,
            };
            state.ticker = Some(ProgressTicker::start(self.progress.clone(), expected, self.tick));
        }
        self.editor.set_markers(&[]);
        Ok(())
    }

    async fn call<T>(&self, request: impl Future<Output = Result<T, BackendError>>) -> Result<T, BackendError> {
        match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, request).await {
                Ok(result) => result,
                Err(_) => Err(BackendError::timeout(limit)),
            },
            None => request.await,
        }
    }

    fn finish(
        &self,
        mode: ExecutionMode,
        response: Result<JudgeResponse, BackendError>,
        custom_input: bool,
    ) -> ActionOutcome {
        if !self.mount.is_mounted() {
            info!(mode = %mode, "Workspace unmounted; dropping response");
            self.teardown();
            return ActionOutcome::Dropped;
        }

        let outcome = match response {
            Ok(payload) => match normalizer::normalize(payload, custom_input) {
                Normalized::Complete(result) => ActionOutcome::Completed(result),
                Normalized::Partial(result) => ActionOutcome::Partial(result),
                Normalized::Failed(message) => ActionOutcome::Failed(ExecutionFailure {
                    mode,
                    kind: FailureKind::Judge,
                    message,
                }),
            },
            Err(e) => ActionOutcome::Failed(ExecutionFailure {
                mode,
                kind: e.kind.into(),
                message: e.to_string(),
            }),
        };

        let markers = match outcome.result() {
            Some(result) => self.locator.markers_for(result, &self.editor.document()),
            None => Vec::new(),
        };

        let ticker = {
            let mut state = self.lock();
            state.phase = Phase::Idle;
            match &outcome {
                ActionOutcome::Completed(result) => {
                    *state.slot(mode) = Some(result.clone());
                    state.last_error = None;
                }
                ActionOutcome::Partial(result) => {
                    *state.slot(mode) = Some(result.clone());
                    state.last_error = Some(ExecutionFailure {
                        mode,
                        kind: FailureKind::Judge,
                        message: result.error.clone().unwrap_or_default(),
                    });
                }
                ActionOutcome::Failed(failure) => {
                    *state.slot(mode) = None;
                    state.last_error = Some(failure.clone());
                }
                _ => {}
            }
            state.markers = markers.clone();
            state.ticker.take()
        };
        drop(ticker);

        self.editor.set_markers(&markers);
        self.announce(&outcome, markers.len());
        outcome
    }

    fn announce(&self, outcome: &ActionOutcome, marker_count: usize) {
        match outcome {
            ActionOutcome::Completed(result) => {
                info!(
                    mode = %result.mode,
                    verdict = ?result.verdict,
                    passed = result.test_cases_passed,
                    total = result.total_test_cases,
                    markers = marker_count,
                    "Execution completed"
                );
                self.notifier.notify(verdict_notice(result));
            }
            ActionOutcome::Partial(result) => {
                warn!(
                    mode = %result.mode,
                    verdict = ?result.verdict,
                    error = result.error.as_deref().unwrap_or_default(),
                    "Execution partially failed"
                );
                self.notifier.notify(Notice::new(
                    NoticeLevel::Warning,
                    result.error.clone().unwrap_or_else(|| "Execution failed".to_string()),
                ));
                self.notifier.notify(verdict_notice(result));
            }
            ActionOutcome::Failed(failure) => {
                warn!(mode = %failure.mode, kind = ?failure.kind, error = %failure.message, "Execution failed");
                self.notifier
                    .notify(Notice::new(NoticeLevel::Error, failure.message.clone()));
            }
            _ => {}
        }
    }
}

/// Toast text for a judged result.
pub fn verdict_notice(result: &ExecutionResult) -> Notice {
    match result.verdict {
        Verdict::Accepted => {
            let message = match result.mode {
                ExecutionMode::Run if result.is_custom_input => "Code executed with custom input".to_string(),
                ExecutionMode::Run => "All sample test cases passed!".to_string(),
                ExecutionMode::Submit if result.is_first_solve => {
                    format!("Accepted! First solve: +{} coins ({} total)", result.coins_earned, result.total_coins)
                }
                ExecutionMode::Submit if result.coins_earned > 0 => {
                    format!("Accepted! +{} coins ({} total)", result.coins_earned, result.total_coins)
                }
                ExecutionMode::Submit => "Accepted!".to_string(),
            };
            Notice::new(NoticeLevel::Success, message)
        }
        Verdict::WrongAnswer => Notice::new(
            NoticeLevel::Error,
            format!(
                "Wrong Answer: {}/{} test cases passed",
                result.test_cases_passed, result.total_test_cases
            ),
        ),
        Verdict::Error => Notice::new(
            NoticeLevel::Error,
            result.error.clone().unwrap_or_else(|| Verdict::Error.label().to_string()),
        ),
        other => Notice::new(NoticeLevel::Error, other.label()),
    }
}
