/// Layout Engine - Pane Geometry for the Workspace
///
/// **Layout:**
/// Three columns (sidebar, problem description, editor/console) with the
/// right column split vertically between editor and console.
///
/// **Stored vs derived:**
/// - sidebar width, description width and editor height are stored
///   percentages, each clamped to its own bounds
/// - right pane width is derived: `100 - sidebar - description`, where a
///   hidden sidebar contributes 0
///
/// **Drag sessions:**
/// Only one boundary can be dragged at a time. Pointer moves are accepted
/// from anywhere (the host forwards global pointer events) so a fast drag
/// that leaves the handle is not lost. Clamping saturates; no pointer
/// position is ever an error.
use anyhow::bail;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, warn};

/// Inclusive percentage range for one layout ratio.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: f64,
    pub max: f64,
}

impl Bounds {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Saturating clamp. Never panics: non-finite bounds widen to 0..100,
    /// inverted bounds are swapped and NaN input lands on the lower bound.
    pub fn clamp(&self, value: f64) -> f64 {
        let min = if self.min.is_finite() { self.min } else { 0.0 };
        let max = if self.max.is_finite() { self.max } else { 100.0 };
        let (low, high) = if min <= max { (min, max) } else { (max, min) };
        if value.is_nan() {
            return low;
        }
        value.max(low).min(high)
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    fn is_well_formed(&self) -> bool {
        self.min.is_finite()
            && self.max.is_finite()
            && self.min >= 0.0
            && self.max <= 100.0
            && self.min <= self.max
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutGeometry {
    pub sidebar_width: f64,
    pub description_width: f64,
    pub editor_height: f64,
    pub sidebar_visible: bool,
}

impl LayoutGeometry {
    /// Width of the editor/console column.
    pub fn right_pane_width(&self) -> f64 {
        let sidebar = if self.sidebar_visible { self.sidebar_width } else { 0.0 };
        100.0 - sidebar - self.description_width
    }

    /// Height of the console below the editor.
    pub fn console_height(&self) -> f64 {
        100.0 - self.editor_height
    }
}

impl Default for LayoutGeometry {
    fn default() -> Self {
        Self {
            sidebar_width: 18.0,
            description_width: 35.0,
            editor_height: 60.0,
            sidebar_visible: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LayoutConfig {
    pub sidebar: Bounds,
    pub description: Bounds,
    pub editor_height: Bounds,
    pub initial: LayoutGeometry,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            sidebar: Bounds::new(12.0, 30.0),
            description: Bounds::new(20.0, 50.0),
            editor_height: Bounds::new(15.0, 85.0),
            initial: LayoutGeometry::default(),
        }
    }
}

impl LayoutConfig {
    pub fn bounds(&self, handle: DragHandle) -> Bounds {
        match handle {
            DragHandle::Sidebar => self.sidebar,
            DragHandle::Description => self.description,
            DragHandle::EditorHeight => self.editor_height,
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        self.validate_bounds()?;
        for handle in [DragHandle::Sidebar, DragHandle::Description, DragHandle::EditorHeight] {
            let bounds = self.bounds(handle);
            if !bounds.contains(value_of(&self.initial, handle)) {
                bail!(
                    "Initial {} value {} outside [{}, {}]",
                    handle,
                    value_of(&self.initial, handle),
                    bounds.min,
                    bounds.max
                );
            }
        }
        Ok(())
    }

    /// Bounds only; an out-of-range initial geometry is clamped, not rejected.
    pub fn validate_bounds(&self) -> anyhow::Result<()> {
        for handle in [DragHandle::Sidebar, DragHandle::Description, DragHandle::EditorHeight] {
            let bounds = self.bounds(handle);
            if !bounds.is_well_formed() {
                bail!("Invalid {} bounds: [{}, {}]", handle, bounds.min, bounds.max);
            }
        }
        // Both columns at their maximum must still leave room for the editor.
        if self.sidebar.max + self.description.max >= 100.0 {
            bail!("sidebar.max + description.max must stay below 100");
        }
        Ok(())
    }
}

/// A draggable pane boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DragHandle {
    Sidebar,
    Description,
    EditorHeight,
}

impl DragHandle {
    pub fn axis(&self) -> Axis {
        match self {
            DragHandle::Sidebar | DragHandle::Description => Axis::Horizontal,
            DragHandle::EditorHeight => Axis::Vertical,
        }
    }
}

impl fmt::Display for DragHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DragHandle::Sidebar => f.write_str("sidebar"),
            DragHandle::Description => f.write_str("description"),
            DragHandle::EditorHeight => f.write_str("editorHeight"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Horizontal,
    Vertical,
}

/// Pointer position in host pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointerPosition {
    pub x: f64,
    pub y: f64,
}

impl PointerPosition {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Current bounding size of the workspace container in host pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContainerRect {
    pub width: f64,
    pub height: f64,
}

impl ContainerRect {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    fn extent(&self, axis: Axis) -> f64 {
        match axis {
            Axis::Horizontal => self.width,
            Axis::Vertical => self.height,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Cursor {
    Default,
    ColResize,
    RowResize,
}

/// Workspace-wide styling the host applies while a drag is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractionStyle {
    pub text_selection_enabled: bool,
    pub cursor: Cursor,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct DragSession {
    handle: DragHandle,
    origin: PointerPosition,
    start_value: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutError {
    /// Another boundary is already being dragged.
    DragInProgress { active: DragHandle },
    /// The sidebar boundary cannot be dragged while the sidebar is hidden.
    SidebarHidden,
}

impl fmt::Display for LayoutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LayoutError::DragInProgress { active } => {
                write!(f, "a drag of the {} boundary is already in progress", active)
            }
            LayoutError::SidebarHidden => f.write_str("sidebar is hidden"),
        }
    }
}

impl std::error::Error for LayoutError {}

fn value_of(geometry: &LayoutGeometry, handle: DragHandle) -> f64 {
    match handle {
        DragHandle::Sidebar => geometry.sidebar_width,
        DragHandle::Description => geometry.description_width,
        DragHandle::EditorHeight => geometry.editor_height,
    }
}

/// Owns the workspace geometry and the (single) active drag session.
#[derive(Debug, Clone)]
pub struct LayoutEngine {
    config: LayoutConfig,
    geometry: LayoutGeometry,
    session: Option<DragSession>,
}

impl LayoutEngine {
    /// Malformed bounds are replaced by the defaults.
    pub fn new(config: LayoutConfig) -> Self {
        let config = match config.validate_bounds() {
            Ok(()) => config,
            Err(e) => {
                warn!(error = %e, "Invalid layout bounds; using defaults");
                LayoutConfig {
                    initial: config.initial,
                    ..LayoutConfig::default()
                }
            }
        };
        let mut geometry = config.initial;
        // Initial values are trusted only after clamping.
        geometry.sidebar_width = config.sidebar.clamp(geometry.sidebar_width);
        geometry.description_width = config.description.clamp(geometry.description_width);
        geometry.editor_height = config.editor_height.clamp(geometry.editor_height);

        Self {
            config,
            geometry,
            session: None,
        }
    }

    pub fn geometry(&self) -> LayoutGeometry {
        self.geometry
    }

    pub fn is_dragging(&self) -> bool {
        self.session.is_some()
    }

    pub fn active_handle(&self) -> Option<DragHandle> {
        self.session.map(|s| s.handle)
    }

    /// Start dragging `handle` from `pointer`.
    pub fn begin_drag(&mut self, handle: DragHandle, pointer: PointerPosition) -> Result<(), LayoutError> {
        if let Some(active) = self.session {
            return Err(LayoutError::DragInProgress { active: active.handle });
        }
        if handle == DragHandle::Sidebar && !self.geometry.sidebar_visible {
            return Err(LayoutError::SidebarHidden);
        }

        let start_value = value_of(&self.geometry, handle);
        debug!(handle = %handle, start_value, "Drag started");
        self.session = Some(DragSession {
            handle,
            origin: pointer,
            start_value,
        });
        Ok(())
    }

    /// Apply a pointer move. Returns `true` when the geometry changed.
    ///
    /// Ignored when no drag is active or the container has no extent on the
    /// dragged axis.
    pub fn pointer_move(&mut self, pointer: PointerPosition, container: ContainerRect) -> bool {
        let Some(session) = self.session else {
            return false;
        };

        let axis = session.handle.axis();
        let extent = container.extent(axis);
        if !(extent.is_finite() && extent > 0.0) {
            return false;
        }

        let displacement = match axis {
            Axis::Horizontal => pointer.x - session.origin.x,
            Axis::Vertical => pointer.y - session.origin.y,
        };
        if !displacement.is_finite() {
            return false;
        }

        let bounds = self.config.bounds(session.handle);
        let next = bounds.clamp(session.start_value + displacement / extent * 100.0);

        let slot = match session.handle {
            DragHandle::Sidebar => &mut self.geometry.sidebar_width,
            DragHandle::Description => &mut self.geometry.description_width,
            DragHandle::EditorHeight => &mut self.geometry.editor_height,
        };
        if *slot == next {
            return false;
        }
        *slot = next;
        true
    }

    /// Finish the active drag, if any.
    pub fn end_drag(&mut self) -> Option<DragHandle> {
        let session = self.session.take()?;
        debug!(
            handle = %session.handle,
            value = value_of(&self.geometry, session.handle),
            "Drag ended"
        );
        Some(session.handle)
    }

    pub fn interaction_style(&self) -> InteractionStyle {
        match self.session {
            None => InteractionStyle {
                text_selection_enabled: true,
                cursor: Cursor::Default,
            },
            Some(session) => InteractionStyle {
                text_selection_enabled: false,
                cursor: match session.handle.axis() {
                    Axis::Horizontal => Cursor::ColResize,
                    Axis::Vertical => Cursor::RowResize,
                },
            },
        }
    }

    /// Show or hide the sidebar. Hiding gives its width to the right pane.
    pub fn set_sidebar_visible(&mut self, visible: bool) {
        if !visible && self.active_handle() == Some(DragHandle::Sidebar) {
            self.session = None;
        }
        self.geometry.sidebar_visible = visible;
    }

    pub fn toggle_sidebar(&mut self) -> bool {
        let visible = !self.geometry.sidebar_visible;
        self.set_sidebar_visible(visible);
        visible
    }

    /// Restore the configured initial geometry and drop any active drag.
    pub fn reset(&mut self) {
        *self = Self::new(self.config);
    }
}

impl Default for LayoutEngine {
    fn default() -> Self {
        Self::new(LayoutConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONTAINER: ContainerRect = ContainerRect::new(1000.0, 800.0);

    fn assert_in_bounds(engine: &LayoutEngine) {
        let config = LayoutConfig::default();
        let g = engine.geometry();
        assert!(config.sidebar.contains(g.sidebar_width), "sidebar {}", g.sidebar_width);
        assert!(config.description.contains(g.description_width), "description {}", g.description_width);
        assert!(config.editor_height.contains(g.editor_height), "editor {}", g.editor_height);
    }

    #[test]
    fn test_default_geometry_sums_to_100() {
        let engine = LayoutEngine::default();
        let g = engine.geometry();
        assert_eq!(g.sidebar_width + g.description_width + g.right_pane_width(), 100.0);
    }

    #[test]
    fn test_sidebar_drag_moves_by_container_fraction() {
        let mut engine = LayoutEngine::default();
        engine.begin_drag(DragHandle::Sidebar, PointerPosition::new(180.0, 400.0)).unwrap();

        // 50px of a 1000px container is 5%.
        assert!(engine.pointer_move(PointerPosition::new(230.0, 10.0), CONTAINER));
        assert!((engine.geometry().sidebar_width - 23.0).abs() < 1e-9);
    }

    #[test]
    fn test_sidebar_clamps_to_minimum() {
        let mut engine = LayoutEngine::default();
        engine.begin_drag(DragHandle::Sidebar, PointerPosition::new(180.0, 0.0)).unwrap();

        // 18% - 13% would be 5%, below the 12% floor.
        engine.pointer_move(PointerPosition::new(50.0, 0.0), CONTAINER);
        assert_eq!(engine.geometry().sidebar_width, 12.0);
    }

    #[test]
    fn test_clamping_saturates_far_outside_container() {
        let mut engine = LayoutEngine::default();

        engine.begin_drag(DragHandle::Description, PointerPosition::new(500.0, 0.0)).unwrap();
        engine.pointer_move(PointerPosition::new(1.0e9, 0.0), CONTAINER);
        assert_eq!(engine.geometry().description_width, 50.0);
        engine.pointer_move(PointerPosition::new(-1.0e9, 0.0), CONTAINER);
        assert_eq!(engine.geometry().description_width, 20.0);
        engine.end_drag();

        engine.begin_drag(DragHandle::EditorHeight, PointerPosition::new(0.0, 400.0)).unwrap();
        engine.pointer_move(PointerPosition::new(0.0, 5000.0), CONTAINER);
        assert_eq!(engine.geometry().editor_height, 85.0);
        engine.pointer_move(PointerPosition::new(0.0, -5000.0), CONTAINER);
        assert_eq!(engine.geometry().editor_height, 15.0);
        engine.end_drag();

        assert_in_bounds(&engine);
    }

    #[test]
    fn test_editor_height_uses_vertical_extent() {
        let mut engine = LayoutEngine::default();
        engine.begin_drag(DragHandle::EditorHeight, PointerPosition::new(0.0, 480.0)).unwrap();

        // Horizontal movement is irrelevant; 80px of 800px is 10%.
        engine.pointer_move(PointerPosition::new(900.0, 560.0), CONTAINER);
        assert!((engine.geometry().editor_height - 70.0).abs() < 1e-9);
    }

    #[test]
    fn test_drag_sessions_are_exclusive() {
        let mut engine = LayoutEngine::default();
        engine.begin_drag(DragHandle::Sidebar, PointerPosition::new(0.0, 0.0)).unwrap();

        let err = engine
            .begin_drag(DragHandle::EditorHeight, PointerPosition::new(0.0, 0.0))
            .unwrap_err();
        assert_eq!(err, LayoutError::DragInProgress { active: DragHandle::Sidebar });
        assert_eq!(engine.active_handle(), Some(DragHandle::Sidebar));

        assert_eq!(engine.end_drag(), Some(DragHandle::Sidebar));
        assert!(engine.begin_drag(DragHandle::EditorHeight, PointerPosition::new(0.0, 0.0)).is_ok());
    }

    #[test]
    fn test_move_without_session_is_ignored() {
        let mut engine = LayoutEngine::default();
        let before = engine.geometry();
        assert!(!engine.pointer_move(PointerPosition::new(999.0, 999.0), CONTAINER));
        assert_eq!(engine.geometry(), before);
        assert_eq!(engine.end_drag(), None);
    }

    #[test]
    fn test_zero_sized_container_is_ignored() {
        let mut engine = LayoutEngine::default();
        engine.begin_drag(DragHandle::Sidebar, PointerPosition::new(0.0, 0.0)).unwrap();
        assert!(!engine.pointer_move(PointerPosition::new(40.0, 0.0), ContainerRect::new(0.0, 800.0)));
        assert_eq!(engine.geometry().sidebar_width, 18.0);
    }

    #[test]
    fn test_interaction_style_during_drag() {
        let mut engine = LayoutEngine::default();
        assert!(engine.interaction_style().text_selection_enabled);

        engine.begin_drag(DragHandle::Description, PointerPosition::new(0.0, 0.0)).unwrap();
        let style = engine.interaction_style();
        assert!(!style.text_selection_enabled);
        assert_eq!(style.cursor, Cursor::ColResize);
        engine.end_drag();

        engine.begin_drag(DragHandle::EditorHeight, PointerPosition::new(0.0, 0.0)).unwrap();
        assert_eq!(engine.interaction_style().cursor, Cursor::RowResize);
        engine.end_drag();
        assert_eq!(engine.interaction_style().cursor, Cursor::Default);
    }

    #[test]
    fn test_hiding_sidebar_widens_right_pane_only() {
        let mut engine = LayoutEngine::default();
        let before = engine.geometry();

        assert!(!engine.toggle_sidebar());
        let after = engine.geometry();
        assert_eq!(after.description_width, before.description_width);
        assert_eq!(after.right_pane_width(), before.right_pane_width() + before.sidebar_width);
        assert_eq!(
            engine.begin_drag(DragHandle::Sidebar, PointerPosition::new(0.0, 0.0)),
            Err(LayoutError::SidebarHidden)
        );

        assert!(engine.toggle_sidebar());
        assert_eq!(engine.geometry().right_pane_width(), before.right_pane_width());
    }

    #[test]
    fn test_reset_restores_initial_geometry() {
        let mut engine = LayoutEngine::default();
        engine.begin_drag(DragHandle::Sidebar, PointerPosition::new(0.0, 0.0)).unwrap();
        engine.pointer_move(PointerPosition::new(100.0, 0.0), CONTAINER);
        engine.reset();
        assert_eq!(engine.geometry(), LayoutGeometry::default());
        assert!(!engine.is_dragging());
    }

    #[test]
    fn test_config_validation() {
        assert!(LayoutConfig::default().validate().is_ok());

        let inverted = LayoutConfig {
            sidebar: Bounds::new(30.0, 12.0),
            ..LayoutConfig::default()
        };
        assert!(inverted.validate().is_err());

        let crowded = LayoutConfig {
            sidebar: Bounds::new(12.0, 50.0),
            description: Bounds::new(20.0, 50.0),
            ..LayoutConfig::default()
        };
        assert!(crowded.validate().is_err());
    }

    #[test]
    fn test_malformed_bounds_fall_back_to_defaults() {
        let inverted = LayoutConfig {
            sidebar: Bounds::new(30.0, 12.0),
            ..LayoutConfig::default()
        };
        let mut engine = LayoutEngine::new(inverted);
        assert_in_bounds(&engine);

        engine.begin_drag(DragHandle::Sidebar, PointerPosition::new(180.0, 0.0)).unwrap();
        engine.pointer_move(PointerPosition::new(900.0, 0.0), CONTAINER);
        assert_eq!(engine.geometry().sidebar_width, 30.0);

        let nan = LayoutConfig {
            editor_height: Bounds::new(f64::NAN, 85.0),
            ..LayoutConfig::default()
        };
        assert_in_bounds(&LayoutEngine::new(nan));
    }

    #[test]
    fn test_clamp_never_panics() {
        assert_eq!(Bounds::new(30.0, 12.0).clamp(50.0), 30.0);
        assert_eq!(Bounds::new(30.0, 12.0).clamp(0.0), 12.0);
        assert_eq!(Bounds::new(f64::NAN, 40.0).clamp(-5.0), 0.0);
        assert_eq!(Bounds::new(10.0, f64::INFINITY).clamp(500.0), 100.0);
        assert_eq!(Bounds::new(10.0, 20.0).clamp(f64::NAN), 10.0);
    }

    #[test]
    fn test_out_of_range_initial_is_clamped() {
        let config = LayoutConfig {
            initial: LayoutGeometry {
                sidebar_width: 90.0,
                ..LayoutGeometry::default()
            },
            ..LayoutConfig::default()
        };
        assert_eq!(LayoutEngine::new(config).geometry().sidebar_width, 30.0);
    }
}
