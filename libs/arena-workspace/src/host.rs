// Seams to the embedding view: editor, confirmation prompt, notifications.

use serde::{Deserialize, Serialize};
use std::sync::{Mutex, MutexGuard};
use tracing::{error, info, warn};

use crate::diagnostics::DiagnosticMarker;

/// The code editor the workspace is attached to.
pub trait EditorHost: Send + Sync {
    /// Full current document text.
    fn document(&self) -> String;

    /// Number of lines as the editor counts them (an empty document has one).
    fn line_count(&self) -> usize {
        self.document().split('\n').count()
    }

    /// Replace every diagnostic marker in the editor with `markers`.
    fn set_markers(&self, markers: &[DiagnosticMarker]);
}

/// Synchronous yes/no prompt.
pub trait ConfirmGate: Send + Sync {
    fn confirm(&self, prompt: &str) -> bool;
}

/// Gate that always gives the same answer (`--yes` style automation).
#[derive(Debug, Clone, Copy)]
pub struct FixedAnswer(pub bool);

impl ConfirmGate for FixedAnswer {
    fn confirm(&self, _prompt: &str) -> bool {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// Transient user-visible message (a toast in the browser).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn new(level: NoticeLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }
}

pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// Notifier that only logs.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notice: Notice) {
        match notice.level {
            NoticeLevel::Info | NoticeLevel::Success => info!(level = ?notice.level, "{}", notice.message),
            NoticeLevel::Warning => warn!("{}", notice.message),
            NoticeLevel::Error => error!("{}", notice.message),
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// An in-memory notifier that keeps every notice it receives.
#[derive(Debug, Default)]
pub struct CollectingNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl CollectingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of all notices so far.
    pub fn notices(&self) -> Vec<Notice> {
        lock(&self.notices).clone()
    }

    pub fn count(&self, level: NoticeLevel) -> usize {
        lock(&self.notices).iter().filter(|n| n.level == level).count()
    }
}

impl Notifier for CollectingNotifier {
    fn notify(&self, notice: Notice) {
        lock(&self.notices).push(notice);
    }
}

/// Plain text buffer standing in for a real editor widget.
#[derive(Debug, Default)]
pub struct MemoryEditor {
    text: Mutex<String>,
    markers: Mutex<Vec<DiagnosticMarker>>,
}

impl MemoryEditor {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: Mutex::new(text.into()),
            markers: Mutex::new(Vec::new()),
        }
    }

    pub fn set_text(&self, text: impl Into<String>) {
        *lock(&self.text) = text.into();
    }

    pub fn insert(&self, text: &str) {
        lock(&self.text).push_str(text);
    }

    pub fn markers(&self) -> Vec<DiagnosticMarker> {
        lock(&self.markers).clone()
    }
}

impl EditorHost for MemoryEditor {
    fn document(&self) -> String {
        lock(&self.text).clone()
    }

    fn set_markers(&self, markers: &[DiagnosticMarker]) {
        *lock(&self.markers) = markers.to_vec();
    }
}
