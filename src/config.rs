//! Runtime configuration for the window manager.
//!
//! Everything here has a default; the demo binary overrides fields from the
//! command line, embedders can deserialize a partial JSON object.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::geometry::Viewport;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WmConfig {
    pub viewport: Viewport,
    /// Dragging a window against a screen edge or corner proposes a snap.
    pub edge_snap_on_drag: bool,
    /// Resting on the maximize control opens the snap layout picker.
    pub hover_snap_menu: bool,
    pub timings: Timings,
}

impl Default for WmConfig {
    fn default() -> Self {
        Self {
            viewport: Viewport::default(),
            edge_snap_on_drag: true,
            hover_snap_menu: true,
            timings: Timings::default(),
        }
    }
}

/// Animation durations and hover delays, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timings {
    pub minimize_ms: u64,
    pub restore_ms: u64,
    pub maximize_ms: u64,
    pub snap_ms: u64,
    pub overview_ms: u64,
    /// How long the empty task view backdrop stays up before closing itself.
    pub overview_empty_ms: u64,
    pub hover_show_ms: u64,
    /// Grace period for crossing the gap between the maximize control and
    /// the picker.
    pub hover_hide_ms: u64,
    pub preview_hide_ms: u64,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            minimize_ms: 350,
            restore_ms: 350,
            maximize_ms: 250,
            snap_ms: 250,
            overview_ms: 300,
            overview_empty_ms: 600,
            hover_show_ms: 450,
            hover_hide_ms: 130,
            preview_hide_ms: 120,
        }
    }
}

impl Timings {
    pub fn minimize(&self) -> Duration {
        Duration::from_millis(self.minimize_ms)
    }

    pub fn restore(&self) -> Duration {
        Duration::from_millis(self.restore_ms)
    }

    pub fn maximize(&self) -> Duration {
        Duration::from_millis(self.maximize_ms)
    }

    pub fn snap(&self) -> Duration {
        Duration::from_millis(self.snap_ms)
    }

    pub fn overview(&self) -> Duration {
        Duration::from_millis(self.overview_ms)
    }

    pub fn overview_empty(&self) -> Duration {
        Duration::from_millis(self.overview_empty_ms)
    }

    pub fn hover_show(&self) -> Duration {
        Duration::from_millis(self.hover_show_ms)
    }

    pub fn hover_hide(&self) -> Duration {
        Duration::from_millis(self.hover_hide_ms)
    }

    pub fn preview_hide(&self) -> Duration {
        Duration::from_millis(self.preview_hide_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg: WmConfig = serde_json::from_str(
            r#"{ "edge_snap_on_drag": false, "timings": { "hover_hide_ms": 200 } }"#,
        )
        .unwrap();
        assert!(!cfg.edge_snap_on_drag);
        assert!(cfg.hover_snap_menu);
        assert_eq!(cfg.timings.hover_hide(), Duration::from_millis(200));
        assert_eq!(cfg.timings.minimize_ms, Timings::default().minimize_ms);
        assert_eq!(cfg.viewport, Viewport::default());
    }
}
