//! Task view: a temporary grid of scaled previews of every visible window.
//!
//! The session only records what the windows looked like when it opened
//! and where their previews go. The window store itself is never touched,
//! so leaving the overview cannot drift a window's real rectangle.

use crate::constants::{
    OVERVIEW_COLUMNS, OVERVIEW_GAP, OVERVIEW_MAX_SCALE, OVERVIEW_PADDING, OVERVIEW_Z_BASE,
};
use crate::geometry::{Bounds, Point, Viewport};
use crate::timer::TimerHandle;
use crate::window::WindowId;

/// One window's place in the task view. Stacking is not recorded: the store
/// keeps every window's z-order untouched while the overview is up, so there
/// is nothing to put back on exit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverviewEntry {
    pub window: WindowId,
    pub saved_bounds: Bounds,
    pub preview: Bounds,
    /// Elevated stacking value used while the backdrop is up.
    pub preview_z: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum OverviewSession {
    /// Nothing to show: a dimmed backdrop that closes itself.
    Empty { dismiss_timer: TimerHandle },
    Active { entries: Vec<OverviewEntry> },
}

impl OverviewSession {
    /// Start a session for `windows`, given back-to-front as `(id, bounds)`.
    pub fn begin(windows: &[(WindowId, Bounds)], viewport: Viewport) -> Self {
        let rects: Vec<Bounds> = windows.iter().map(|(_, bounds)| *bounds).collect();
        let previews = grid_layout(&rects, viewport);
        let entries = windows
            .iter()
            .zip(previews)
            .enumerate()
            .map(|(idx, (&(window, saved_bounds), preview))| OverviewEntry {
                window,
                saved_bounds,
                preview,
                preview_z: OVERVIEW_Z_BASE + idx as u64,
            })
            .collect();
        OverviewSession::Active { entries }
    }

    pub fn entries(&self) -> &[OverviewEntry] {
        match self {
            OverviewSession::Empty { .. } => &[],
            OverviewSession::Active { entries } => entries,
        }
    }

    pub fn entry(&self, window: WindowId) -> Option<&OverviewEntry> {
        self.entries().iter().find(|entry| entry.window == window)
    }

    pub fn contains(&self, window: WindowId) -> bool {
        self.entry(window).is_some()
    }

    /// Recompute preview cells after the viewport changed.
    pub fn relayout(&mut self, viewport: Viewport) {
        if let OverviewSession::Active { entries } = self {
            let rects: Vec<Bounds> = entries.iter().map(|entry| entry.saved_bounds).collect();
            for (entry, preview) in entries.iter_mut().zip(grid_layout(&rects, viewport)) {
                entry.preview = preview;
            }
        }
    }

    /// Drop a window that closed while the overview was open.
    pub fn remove(&mut self, window: WindowId) {
        if let OverviewSession::Active { entries } = self {
            entries.retain(|entry| entry.window != window);
        }
    }

    /// Frontmost preview under `point`.
    pub fn window_at(&self, point: Point) -> Option<WindowId> {
        self.entries()
            .iter()
            .filter(|entry| entry.preview.contains(point))
            .max_by_key(|entry| entry.preview_z)
            .map(|entry| entry.window)
    }

    /// How the session ends. With a selection only that window animates back;
    /// without one, everything does.
    pub fn exit(&self, selected: Option<WindowId>) -> OverviewExit {
        let mut exit = OverviewExit {
            selected,
            ..OverviewExit::default()
        };
        for entry in self.entries() {
            match selected {
                Some(sel) if sel != entry.window => exit.instant.push(entry.window),
                _ => exit.animated.push(entry.window),
            }
        }
        exit
    }
}

/// Which windows went back to their rectangles with an animation, and which
/// snapped back for one frame without transitions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OverviewExit {
    pub selected: Option<WindowId>,
    pub animated: Vec<WindowId>,
    pub instant: Vec<WindowId>,
}

/// Preview rectangles for `windows` on a three column grid inside the usable
/// area. Previews keep their aspect ratio, never grow past the max scale,
/// and sit centered in their cell; a short last row is centered as a whole.
pub fn grid_layout(windows: &[Bounds], viewport: Viewport) -> Vec<Bounds> {
    if windows.is_empty() {
        return Vec::new();
    }
    let cols = OVERVIEW_COLUMNS;
    let rows = windows.len().div_ceil(cols);
    let remainder = windows.len() % cols;

    let pad = OVERVIEW_PADDING as f64;
    let gap = OVERVIEW_GAP as f64;
    let area_w = (viewport.width as f64 - 2.0 * pad).max(1.0);
    let area_h = (viewport.usable_height() as f64 - 2.0 * pad).max(1.0);
    let cell_w = ((area_w - gap * (cols - 1) as f64) / cols as f64).max(1.0);
    let cell_h = ((area_h - gap * (rows - 1) as f64) / rows as f64).max(1.0);

    windows
        .iter()
        .enumerate()
        .map(|(idx, bounds)| {
            let row = idx / cols;
            let col = idx % cols;
            let in_row = if row == rows - 1 && remainder != 0 {
                remainder
            } else {
                cols
            };
            let row_offset = (cols - in_row) as f64 * (cell_w + gap) / 2.0;
            let cell_x = pad + row_offset + col as f64 * (cell_w + gap);
            let cell_y = pad + row as f64 * (cell_h + gap);

            let w = bounds.width.max(1) as f64;
            let h = bounds.height.max(1) as f64;
            let scale = (cell_w / w).min(cell_h / h).min(OVERVIEW_MAX_SCALE);
            let pw = (w * scale).round();
            let ph = (h * scale).round();
            Bounds::new(
                (cell_x + (cell_w - pw) / 2.0).round() as i32,
                (cell_y + (cell_h - ph) / 2.0).round() as i32,
                pw as i32,
                ph as i32,
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vp() -> Viewport {
        Viewport::new(1920, 1080, 48)
    }

    #[test]
    fn single_small_window_is_capped_and_centered() {
        let rects = grid_layout(&[Bounds::new(0, 0, 400, 300)], vp());
        // 400 * 0.75
        assert_eq!(rects[0].width, 300);
        assert_eq!(rects[0].height, 225);
        // short row centered: middle of the viewport horizontally
        let cx = rects[0].left + rects[0].width / 2;
        assert!((cx - 960).abs() <= 1, "center x {cx}");
    }

    #[test]
    fn previews_fit_cells_and_keep_aspect() {
        let windows = vec![Bounds::new(0, 0, 1600, 900); 5];
        let rects = grid_layout(&windows, vp());
        assert_eq!(rects.len(), 5);
        for r in &rects {
            assert!(r.left >= OVERVIEW_PADDING);
            assert!(r.right() <= 1920 - OVERVIEW_PADDING);
            assert!(r.bottom() <= vp().usable_height() - OVERVIEW_PADDING);
            let ratio = r.width as f64 / r.height as f64;
            assert!((ratio - 16.0 / 9.0).abs() < 0.02);
        }
        // two rows
        assert!(rects[3].top > rects[0].bottom());
        // no overlap in the first row
        assert!(rects[0].right() <= rects[1].left);
    }

    #[test]
    fn selection_animates_only_the_chosen_window() {
        let a = WindowId::from_raw(1);
        let b = WindowId::from_raw(2);
        let c = WindowId::from_raw(3);
        let r = Bounds::new(100, 100, 800, 600);
        let session = OverviewSession::begin(&[(a, r), (b, r), (c, r)], vp());
        let exit = session.exit(Some(b));
        assert_eq!(exit.animated, vec![b]);
        assert_eq!(exit.instant, vec![a, c]);

        let dismiss = session.exit(None);
        assert_eq!(dismiss.animated, vec![a, b, c]);
        assert!(dismiss.instant.is_empty());
    }

    #[test]
    fn window_at_hits_previews() {
        let a = WindowId::from_raw(1);
        let mut session = OverviewSession::begin(&[(a, Bounds::new(0, 0, 800, 600))], vp());
        let preview = session.entry(a).unwrap().preview;
        assert_eq!(session.window_at(preview.center()), Some(a));
        assert_eq!(session.window_at(Point::new(1.0, 1.0)), None);
        session.remove(a);
        assert!(session.entries().is_empty());
    }
}
