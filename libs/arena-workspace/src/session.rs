// Workspace session: everything one open workspace view owns.
//
// Created on mount, torn down on unmount. The paste counter and the mount
// flag live here rather than in globals so two workspaces never share them.

use arena_common::types::{ExecutionResult, Language};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::info;

use crate::backend::ExecutionBackend;
use crate::config::WorkspaceConfig;
use crate::controller::{ActionOutcome, CaseCounts, ExecutionController, ExecutionFailure};
use crate::diagnostics::{DiagnosticLocator, DiagnosticMarker};
use crate::host::{ConfirmGate, EditorHost, Notifier};
use crate::layout::{ContainerRect, DragHandle, InteractionStyle, LayoutEngine, LayoutError, LayoutGeometry, PointerPosition};
use crate::paste_guard::{PasteCounter, PasteDecision, PasteGuard};

/// "Still mounted" flag checked around every async completion.
#[derive(Debug, Clone)]
pub struct MountGuard(Arc<AtomicBool>);

impl MountGuard {
    pub fn mounted() -> Self {
        Self(Arc::new(AtomicBool::new(true)))
    }

    pub fn is_mounted(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    pub fn unmount(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Read-only view state for the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceSnapshot {
    pub active_result: Option<ExecutionResult>,
    pub last_error: Option<ExecutionFailure>,
    pub markers: Vec<DiagnosticMarker>,
    pub layout: LayoutGeometry,
    pub right_pane_width: f64,
    pub interaction: InteractionStyle,
    pub paste_attempts: u64,
    pub is_running: bool,
    pub is_submitting: bool,
    pub can_execute: bool,
    /// Cosmetic only.
    pub progress: u32,
}

pub struct WorkspaceSession {
    mount: MountGuard,
    editor: Arc<dyn EditorHost>,
    controller: Arc<ExecutionController>,
    layout: Mutex<LayoutEngine>,
    paste_counter: PasteCounter,
    paste_guard: PasteGuard,
}

impl WorkspaceSession {
    /// Mount a workspace with a fresh paste counter and default layout.
    pub fn mount(
        config: &WorkspaceConfig,
        backend: Arc<dyn ExecutionBackend>,
        editor: Arc<dyn EditorHost>,
        gate: Arc<dyn ConfirmGate>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self::mount_with_locator(config, backend, editor, gate, notifier, DiagnosticLocator::default())
    }

    pub fn mount_with_locator(
        config: &WorkspaceConfig,
        backend: Arc<dyn ExecutionBackend>,
        editor: Arc<dyn EditorHost>,
        gate: Arc<dyn ConfirmGate>,
        notifier: Arc<dyn Notifier>,
        locator: DiagnosticLocator,
    ) -> Self {
        let mount = MountGuard::mounted();
        let paste_counter = PasteCounter::new();

        let controller = ExecutionController::new(backend, editor.clone(), gate.clone(), notifier, mount.clone())
            .with_locator(locator)
            .with_progress_tick(config.progress_tick())
            .with_timeout(config.request_timeout());

        info!(backend_url = %config.backend_url, "Workspace mounted");

        Self {
            mount,
            editor,
            controller: Arc::new(controller),
            layout: Mutex::new(LayoutEngine::new(config.layout)),
            paste_guard: PasteGuard::new(paste_counter.clone(), gate, config.paste_prefix_chars),
            paste_counter,
        }
    }

    fn layout(&self) -> MutexGuard<'_, LayoutEngine> {
        self.layout.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn controller(&self) -> &Arc<ExecutionController> {
        &self.controller
    }

    pub fn mount_guard(&self) -> &MountGuard {
        &self.mount
    }

    pub fn is_mounted(&self) -> bool {
        self.mount.is_mounted()
    }

    pub fn set_case_counts(&self, sample: u32, total: u32) {
        self.controller.set_case_counts(CaseCounts { sample, total });
    }

    /// Run whatever is currently in the editor.
    pub async fn run(&self, problem_id: &str, language: Language, custom_input: Option<&str>) -> ActionOutcome {
        let code = self.editor.document();
        self.controller.run(problem_id, &code, language, custom_input).await
    }

    /// Submit whatever is currently in the editor.
    pub async fn submit(&self, problem_id: &str, language: Language) -> ActionOutcome {
        let code = self.editor.document();
        self.controller.submit(problem_id, &code, language).await
    }

    /// Police a paste into the editor. On `ExternalConfirmed` the caller
    /// re-inserts the text itself.
    pub fn on_paste(&self, pasted: &str) -> PasteDecision {
        self.paste_guard.on_paste(pasted, &self.editor.document())
    }

    pub fn paste_attempts(&self) -> u64 {
        self.paste_counter.get()
    }

    pub fn reset_paste_attempts(&self) {
        self.paste_counter.reset();
    }

    pub fn paste_counter(&self) -> PasteCounter {
        self.paste_counter.clone()
    }

    pub fn begin_drag(&self, handle: DragHandle, pointer: PointerPosition) -> Result<(), LayoutError> {
        self.layout().begin_drag(handle, pointer)
    }

    pub fn pointer_move(&self, pointer: PointerPosition, container: ContainerRect) -> bool {
        self.layout().pointer_move(pointer, container)
    }

    pub fn end_drag(&self) -> Option<DragHandle> {
        self.layout().end_drag()
    }

    pub fn toggle_sidebar(&self) -> bool {
        self.layout().toggle_sidebar()
    }

    pub fn reset_layout(&self) {
        self.layout().reset();
    }

    pub fn geometry(&self) -> LayoutGeometry {
        self.layout().geometry()
    }

    pub fn snapshot(&self) -> WorkspaceSnapshot {
        let (layout, interaction) = {
            let engine = self.layout();
            (engine.geometry(), engine.interaction_style())
        };

        WorkspaceSnapshot {
            active_result: self.controller.active_result(),
            last_error: self.controller.last_error(),
            markers: self.controller.markers(),
            right_pane_width: layout.right_pane_width(),
            layout,
            interaction,
            paste_attempts: self.paste_counter.get(),
            is_running: self.controller.is_running(),
            is_submitting: self.controller.is_submitting(),
            can_execute: self.controller.can_execute(),
            progress: self.controller.progress(),
        }
    }

    /// Unmount: late responses are dropped, the ticker stops, any drag ends
    /// and the paste counter starts over for the next mount.
    pub fn teardown(&self) {
        if !self.mount.is_mounted() {
            return;
        }
        self.mount.unmount();
        self.controller.teardown();
        self.layout().end_drag();
        let attempts = self.paste_counter.get();
        self.paste_counter.reset();
        info!(paste_attempts = attempts, "Workspace torn down");
    }
}

impl Drop for WorkspaceSession {
    fn drop(&mut self) {
        self.teardown();
    }
}
