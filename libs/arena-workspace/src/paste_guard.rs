/// Paste Guard - Inline vs External Paste Detection
///
/// **Classification:**
/// - Inline: the first `prefix_chars` characters of the pasted text already
///   occur in the document (duplicating a snippet). Always allowed.
/// - Blank: whitespace only. Allowed.
/// - External: anything else. The default paste is suppressed, the attempt
///   counter goes up by one and the user has to confirm; the caller
///   re-inserts the text only on confirmation.
///
/// The counter belongs to the workspace session, not to the guard, so the
/// view can show "N pastes blocked" and reset it on teardown.
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

use crate::host::ConfirmGate;

/// Shared handle to the external paste attempt counter.
#[derive(Debug, Clone, Default)]
pub struct PasteCounter {
    attempts: Arc<AtomicU64>,
}

impl PasteCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> u64 {
        self.attempts.load(Ordering::SeqCst)
    }

    /// Record one attempt and return the new total.
    pub fn increment(&self) -> u64 {
        self.attempts.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn reset(&self) {
        self.attempts.store(0, Ordering::SeqCst);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasteKind {
    Inline,
    Blank,
    External,
}

/// What the editor should do with a paste event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasteDecision {
    /// Let the editor's default paste run.
    Inline,
    Blank,
    /// Default paste was suppressed; the user confirmed, so re-insert.
    ExternalConfirmed { attempts: u64 },
    /// Default paste was suppressed and the text is discarded.
    ExternalRejected { attempts: u64 },
}

impl PasteDecision {
    pub fn allows_default(&self) -> bool {
        matches!(self, PasteDecision::Inline | PasteDecision::Blank)
    }

    pub fn should_reinsert(&self) -> bool {
        matches!(self, PasteDecision::ExternalConfirmed { .. })
    }
}

/// Classify a paste without side effects.
pub fn classify(pasted: &str, document: &str, prefix_chars: usize) -> PasteKind {
    let prefix: String = pasted.chars().take(prefix_chars).collect();
    if document.contains(prefix.as_str()) {
        PasteKind::Inline
    } else if pasted.trim().is_empty() {
        PasteKind::Blank
    } else {
        PasteKind::External
    }
}

pub fn confirmation_prompt(attempts: u64) -> String {
    format!(
        "External paste detected (attempt #{}). Pasting code from outside the editor is tracked. Paste anyway?",
        attempts
    )
}

pub struct PasteGuard {
    counter: PasteCounter,
    gate: Arc<dyn ConfirmGate>,
    prefix_chars: usize,
}

impl PasteGuard {
    pub fn new(counter: PasteCounter, gate: Arc<dyn ConfirmGate>, prefix_chars: usize) -> Self {
        Self {
            counter,
            gate,
            prefix_chars: prefix_chars.max(1),
        }
    }

    pub fn counter(&self) -> &PasteCounter {
        &self.counter
    }

    /// Handle one paste event targeting the editor.
    pub fn on_paste(&self, pasted: &str, document: &str) -> PasteDecision {
        match classify(pasted, document, self.prefix_chars) {
            PasteKind::Inline => PasteDecision::Inline,
            PasteKind::Blank => PasteDecision::Blank,
            PasteKind::External => {
                let attempts = self.counter.increment();
                warn!(attempts, pasted_chars = pasted.chars().count(), "External paste blocked");

                if self.gate.confirm(&confirmation_prompt(attempts)) {
                    info!(attempts, "External paste confirmed by user");
                    PasteDecision::ExternalConfirmed { attempts }
                } else {
                    PasteDecision::ExternalRejected { attempts }
                }
            }
        }
    }
}
