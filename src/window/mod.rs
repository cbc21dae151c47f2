pub mod store;

mod window_manager;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::geometry::{Bounds, Point, SnapLayout};

pub use store::{OpenOutcome, WindowStore};
pub use window_manager::{CloseOutcome, WindowManager, WindowView, WmEvent, WmTask};

/// Identifies which application a window hosts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AppId(String);

impl AppId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for AppId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl From<String> for AppId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&AppId> for AppId {
    fn from(value: &AppId) -> Self {
        value.clone()
    }
}

impl fmt::Display for AppId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque window identifier, unique for the lifetime of a manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WindowId(u64);

impl WindowId {
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleState {
    Normal,
    Minimized,
    Maximized,
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LifecycleState::Normal => "Normal",
            LifecycleState::Minimized => "Minimized",
            LifecycleState::Maximized => "Maximized",
        };
        f.write_str(s)
    }
}

/// Endpoints of the shrink-toward-taskbar animation captured at minimize time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MinimizeAnchor {
    pub window_center: Point,
    pub target: Point,
}

/// Lifecycle state together with the data that only exists in that state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Lifecycle {
    Normal,
    Minimized {
        anchor: MinimizeAnchor,
        /// Saved rectangle of a window that was maximized when minimized;
        /// restoring puts it back into `Maximized`.
        resume: Option<Bounds>,
    },
    Maximized {
        saved: Bounds,
    },
}

impl Lifecycle {
    pub fn state(&self) -> LifecycleState {
        match self {
            Lifecycle::Normal => LifecycleState::Normal,
            Lifecycle::Minimized { .. } => LifecycleState::Minimized,
            Lifecycle::Maximized { .. } => LifecycleState::Maximized,
        }
    }
}

/// Transient description of the transition a window is going through. The
/// presentation layer decides how to draw it; the manager clears it when the
/// transition's duration has elapsed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AnimationHint {
    Minimize { from: Point, to: Point },
    Restore { from: Point, to: Point },
    Maximize,
    Unmaximize,
    Snap(SnapLayout),
    OverviewEnter,
    OverviewReturn,
}

#[derive(Debug, Clone)]
pub struct Window {
    id: WindowId,
    app_id: AppId,
    title: String,
    bounds: Bounds,
    z_order: u64,
    lifecycle: Lifecycle,
    snap_layout: Option<SnapLayout>,
    animation: Option<AnimationHint>,
    animation_seq: u64,
    transitions_enabled: bool,
    close_pending: bool,
}

impl Window {
    fn new(id: WindowId, app_id: AppId, title: String, bounds: Bounds, z_order: u64) -> Self {
        Self {
            id,
            app_id,
            title,
            bounds,
            z_order,
            lifecycle: Lifecycle::Normal,
            snap_layout: None,
            animation: None,
            animation_seq: 0,
            transitions_enabled: true,
            close_pending: false,
        }
    }

    pub fn id(&self) -> WindowId {
        self.id
    }

    pub fn app_id(&self) -> &AppId {
        &self.app_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn z_order(&self) -> u64 {
        self.z_order
    }

    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    pub fn state(&self) -> LifecycleState {
        self.lifecycle.state()
    }

    pub fn is_minimized(&self) -> bool {
        matches!(self.lifecycle, Lifecycle::Minimized { .. })
    }

    pub fn is_maximized(&self) -> bool {
        matches!(self.lifecycle, Lifecycle::Maximized { .. })
    }

    pub fn snap_layout(&self) -> Option<SnapLayout> {
        self.snap_layout
    }

    /// Rectangle to return to when leaving `Maximized`.
    pub fn saved_bounds(&self) -> Option<Bounds> {
        match self.lifecycle {
            Lifecycle::Maximized { saved } => Some(saved),
            _ => None,
        }
    }

    pub fn minimize_anchor(&self) -> Option<MinimizeAnchor> {
        match self.lifecycle {
            Lifecycle::Minimized { anchor, .. } => Some(anchor),
            _ => None,
        }
    }

    pub fn animation(&self) -> Option<AnimationHint> {
        self.animation
    }

    /// `false` for exactly one layout pass after the window was snapped back
    /// from the task view without animation.
    pub fn transitions_enabled(&self) -> bool {
        self.transitions_enabled
    }

    /// A close hook asked for confirmation and has not answered yet.
    pub fn close_pending(&self) -> bool {
        self.close_pending
    }

    /// Still drawn on screen: not minimized, or minimized with the shrink
    /// animation in flight.
    pub fn visible(&self) -> bool {
        !self.is_minimized() || matches!(self.animation, Some(AnimationHint::Minimize { .. }))
    }
}
