//! Geometry and bounds engine.
//!
//! Pure functions over window rectangles: clamping to the minimum usable
//! size, the snap-layout catalog, the screen edge/corner hit test used while
//! dragging, and resize-edge math. Nothing in this module holds state.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::constants::{
    CORNER_TRIGGER_DISTANCE, EDGE_TRIGGER_DISTANCE, MIN_WINDOW_HEIGHT, MIN_WINDOW_WIDTH,
    TWO_THIRDS_RATIO,
};

/// A window rectangle in viewport pixels.
///
/// `left` is unconstrained and may be negative; `top` is kept at or below
/// the visible top edge by [`clamp`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Bounds {
    pub left: i32,
    pub top: i32,
    pub width: i32,
    pub height: i32,
}

impl Bounds {
    pub const fn new(left: i32, top: i32, width: i32, height: i32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Build bounds from untrusted floating point values, rounding each field
    /// to whole pixels. Returns `None` when any field is NaN or infinite.
    pub fn from_f64(left: f64, top: f64, width: f64, height: f64) -> Option<Self> {
        let fields = [left, top, width, height];
        if fields.iter().any(|v| !v.is_finite()) {
            return None;
        }
        Some(Self {
            left: left.round() as i32,
            top: top.round() as i32,
            width: width.round() as i32,
            height: height.round() as i32,
        })
    }

    pub fn right(&self) -> i32 {
        self.left.saturating_add(self.width)
    }

    pub fn bottom(&self) -> i32 {
        self.top.saturating_add(self.height)
    }

    pub fn center(&self) -> Point {
        Point::new(
            self.left as f64 + self.width as f64 / 2.0,
            self.top as f64 + self.height as f64 / 2.0,
        )
    }

    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.left as f64
            && point.x < self.right() as f64
            && point.y >= self.top as f64
            && point.y < self.bottom() as f64
    }

    pub fn translate(self, dx: i32, dy: i32) -> Self {
        Self {
            left: self.left.saturating_add(dx),
            top: self.top.saturating_add(dy),
            ..self
        }
    }
}

/// Pointer or anchor position in viewport pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// The single virtual screen the manager lays windows out on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: i32,
    pub height: i32,
    /// Pixels at the bottom of the screen kept free for the taskbar.
    pub taskbar_reserved: i32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
            taskbar_reserved: 48,
        }
    }
}

impl Viewport {
    pub fn new(width: i32, height: i32, taskbar_reserved: i32) -> Self {
        Self {
            width,
            height,
            taskbar_reserved,
        }
    }

    /// Vertical space above the taskbar reservation.
    pub fn usable_height(&self) -> i32 {
        self.height.saturating_sub(self.taskbar_reserved).max(0)
    }

    /// The rectangle a maximized window fills.
    pub fn maximized_rect(&self) -> Bounds {
        Bounds::new(0, 0, self.width.max(0), self.usable_height())
    }

    /// Fallback target for minimize/restore animations when the taskbar has
    /// no icon for the application.
    pub fn bottom_center(&self) -> Point {
        Point::new(self.width as f64 / 2.0, self.height as f64)
    }

    /// A `width` x `height` rectangle centered in the usable area, after
    /// shrinking it to fit and applying [`clamp`].
    pub fn centered(&self, width: i32, height: i32) -> Bounds {
        let width = width.min(self.width).max(MIN_WINDOW_WIDTH);
        let height = height.min(self.usable_height()).max(MIN_WINDOW_HEIGHT);
        let left = (self.width - width) / 2;
        let top = (self.usable_height() - height) / 2;
        clamp(Bounds::new(left, top, width, height))
    }
}

/// Predefined screen regions a window can be snapped into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SnapLayout {
    LeftHalf,
    RightHalf,
    LeftTwoThirds,
    RightTwoThirds,
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl SnapLayout {
    /// Every layout, in the order the picker presents them.
    pub const ALL: [SnapLayout; 8] = [
        SnapLayout::LeftHalf,
        SnapLayout::RightHalf,
        SnapLayout::LeftTwoThirds,
        SnapLayout::RightTwoThirds,
        SnapLayout::TopLeft,
        SnapLayout::TopRight,
        SnapLayout::BottomLeft,
        SnapLayout::BottomRight,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SnapLayout::LeftHalf => "left-half",
            SnapLayout::RightHalf => "right-half",
            SnapLayout::LeftTwoThirds => "left-two-thirds",
            SnapLayout::RightTwoThirds => "right-two-thirds",
            SnapLayout::TopLeft => "top-left",
            SnapLayout::TopRight => "top-right",
            SnapLayout::BottomLeft => "bottom-left",
            SnapLayout::BottomRight => "bottom-right",
        }
    }
}

impl fmt::Display for SnapLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SnapLayout {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SnapLayout::ALL
            .into_iter()
            .find(|layout| layout.as_str() == s)
            .ok_or_else(|| format!("unknown snap layout: {s}"))
    }
}

/// Enforce the minimum usable size and keep the top edge on screen.
///
/// `left` and the bottom edge are deliberately left unbounded: windows may
/// hang off the sides or the bottom of the viewport.
pub fn clamp(bounds: Bounds) -> Bounds {
    Bounds {
        left: bounds.left,
        top: bounds.top.max(0),
        width: bounds.width.max(MIN_WINDOW_WIDTH),
        height: bounds.height.max(MIN_WINDOW_HEIGHT),
    }
}

/// Rectangle covered by `layout` on a viewport of the given size.
pub fn snap_rect(
    layout: SnapLayout,
    viewport_width: i32,
    viewport_height: i32,
    taskbar_reserved_height: i32,
) -> Bounds {
    let width = viewport_width.max(0);
    let usable = viewport_height.saturating_sub(taskbar_reserved_height).max(0);
    let half_w = width / 2;
    let half_h = usable / 2;
    let two_thirds = (width as f64 * TWO_THIRDS_RATIO).round() as i32;
    match layout {
        SnapLayout::LeftHalf => Bounds::new(0, 0, half_w, usable),
        SnapLayout::RightHalf => Bounds::new(half_w, 0, width - half_w, usable),
        SnapLayout::LeftTwoThirds => Bounds::new(0, 0, two_thirds, usable),
        SnapLayout::RightTwoThirds => Bounds::new(width - two_thirds, 0, two_thirds, usable),
        SnapLayout::TopLeft => Bounds::new(0, 0, half_w, half_h),
        SnapLayout::TopRight => Bounds::new(half_w, 0, width - half_w, half_h),
        SnapLayout::BottomLeft => Bounds::new(0, half_h, half_w, usable - half_h),
        SnapLayout::BottomRight => Bounds::new(half_w, half_h, width - half_w, usable - half_h),
    }
}

/// [`snap_rect`] for a [`Viewport`].
pub fn snap_rect_in(layout: SnapLayout, viewport: Viewport) -> Bounds {
    snap_rect(
        layout,
        viewport.width,
        viewport.height,
        viewport.taskbar_reserved,
    )
}

/// Which snap layout, if any, a dragged pointer at `(pointer_x, pointer_y)`
/// is proposing. Corners win over edges.
pub fn edge_hit(
    pointer_x: f64,
    pointer_y: f64,
    viewport_width: i32,
    viewport_height: i32,
) -> Option<SnapLayout> {
    let right = viewport_width as f64;
    let bottom = viewport_height as f64;
    let near_left = |d: f64| pointer_x <= d;
    let near_right = |d: f64| pointer_x >= right - d;
    let near_top = |d: f64| pointer_y <= d;
    let near_bottom = |d: f64| pointer_y >= bottom - d;

    let corner = CORNER_TRIGGER_DISTANCE;
    if near_left(corner) && near_top(corner) {
        return Some(SnapLayout::TopLeft);
    }
    if near_right(corner) && near_top(corner) {
        return Some(SnapLayout::TopRight);
    }
    if near_left(corner) && near_bottom(corner) {
        return Some(SnapLayout::BottomLeft);
    }
    if near_right(corner) && near_bottom(corner) {
        return Some(SnapLayout::BottomRight);
    }

    let edge = EDGE_TRIGGER_DISTANCE;
    if near_left(edge) {
        return Some(SnapLayout::LeftHalf);
    }
    if near_right(edge) {
        return Some(SnapLayout::RightHalf);
    }
    None
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeEdge {
    Left,
    Right,
    Top,
    Bottom,
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl ResizeEdge {
    fn moves_left(self) -> bool {
        matches!(
            self,
            ResizeEdge::Left | ResizeEdge::TopLeft | ResizeEdge::BottomLeft
        )
    }

    fn moves_right(self) -> bool {
        matches!(
            self,
            ResizeEdge::Right | ResizeEdge::TopRight | ResizeEdge::BottomRight
        )
    }

    fn moves_top(self) -> bool {
        matches!(
            self,
            ResizeEdge::Top | ResizeEdge::TopLeft | ResizeEdge::TopRight
        )
    }

    fn moves_bottom(self) -> bool {
        matches!(
            self,
            ResizeEdge::Bottom | ResizeEdge::BottomLeft | ResizeEdge::BottomRight
        )
    }
}

/// Apply a resize drag of `(dx, dy)` pixels on `edge` to `start`.
///
/// The edge opposite the grabbed one stays fixed. When the minimum size is
/// reached the grabbed edge is pinned instead of pushing the window, and a
/// top edge dragged above the screen stops at zero.
pub fn resize_bounds(start: Bounds, edge: ResizeEdge, dx: i32, dy: i32) -> Bounds {
    let mut left = start.left;
    let mut top = start.top;
    let mut width = start.width;
    let mut height = start.height;

    if edge.moves_left() {
        left += dx;
        width -= dx;
    } else if edge.moves_right() {
        width += dx;
    }
    if edge.moves_top() {
        top += dy;
        height -= dy;
    } else if edge.moves_bottom() {
        height += dy;
    }

    if width < MIN_WINDOW_WIDTH {
        if edge.moves_left() {
            left -= MIN_WINDOW_WIDTH - width;
        }
        width = MIN_WINDOW_WIDTH;
    }
    if height < MIN_WINDOW_HEIGHT {
        if edge.moves_top() {
            top -= MIN_WINDOW_HEIGHT - height;
        }
        height = MIN_WINDOW_HEIGHT;
    }
    if edge.moves_top() && top < 0 {
        height += top;
        top = 0;
    }

    clamp(Bounds::new(left, top, width, height))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn clamp_enforces_minimum_and_top() {
        let b = clamp(Bounds::new(-50, -20, 100, 100));
        assert_eq!(b, Bounds::new(-50, 0, 400, 300));
    }

    #[test]
    fn clamp_leaves_valid_bounds_alone() {
        let b = Bounds::new(100, 100, 800, 600);
        assert_eq!(clamp(b), b);
    }

    #[test]
    fn from_f64_rejects_non_finite() {
        assert!(Bounds::from_f64(f64::NAN, 0.0, 500.0, 400.0).is_none());
        assert!(Bounds::from_f64(0.0, 0.0, f64::INFINITY, 400.0).is_none());
        assert_eq!(
            Bounds::from_f64(10.4, 10.6, 500.5, 400.0),
            Some(Bounds::new(10, 11, 501, 400))
        );
    }

    #[test]
    fn snap_rects_on_full_hd() {
        let vw = 1920;
        let vh = 1080;
        let r = 50;
        assert_eq!(
            snap_rect(SnapLayout::LeftHalf, vw, vh, r),
            Bounds::new(0, 0, 960, 1030)
        );
        assert_eq!(
            snap_rect(SnapLayout::RightHalf, vw, vh, r),
            Bounds::new(960, 0, 960, 1030)
        );
        assert_eq!(
            snap_rect(SnapLayout::LeftTwoThirds, vw, vh, r),
            Bounds::new(0, 0, 1267, 1030)
        );
        assert_eq!(
            snap_rect(SnapLayout::RightTwoThirds, vw, vh, r),
            Bounds::new(653, 0, 1267, 1030)
        );
        assert_eq!(
            snap_rect(SnapLayout::TopLeft, vw, vh, r),
            Bounds::new(0, 0, 960, 515)
        );
        assert_eq!(
            snap_rect(SnapLayout::BottomRight, vw, vh, r),
            Bounds::new(960, 515, 960, 515)
        );
    }

    #[test]
    fn halves_cover_odd_widths_exactly() {
        let left = snap_rect(SnapLayout::LeftHalf, 1001, 800, 0);
        let right = snap_rect(SnapLayout::RightHalf, 1001, 800, 0);
        assert_eq!(left.width, 500);
        assert_eq!(right.left, 500);
        assert_eq!(left.width + right.width, 1001);
    }

    #[test]
    fn edge_hit_prefers_corners() {
        assert_eq!(edge_hit(2.0, 2.0, 1920, 1080), Some(SnapLayout::TopLeft));
        assert_eq!(edge_hit(30.0, 100.0, 1920, 1080), Some(SnapLayout::TopLeft));
        assert_eq!(
            edge_hit(1915.0, 1075.0, 1920, 1080),
            Some(SnapLayout::BottomRight)
        );
        assert_eq!(edge_hit(5.0, 540.0, 1920, 1080), Some(SnapLayout::LeftHalf));
        assert_eq!(
            edge_hit(1900.0, 540.0, 1920, 1080),
            Some(SnapLayout::RightHalf)
        );
        assert_eq!(edge_hit(960.0, 540.0, 1920, 1080), None);
        // near the top edge but away from corners proposes nothing
        assert_eq!(edge_hit(960.0, 0.0, 1920, 1080), None);
    }

    #[test]
    fn snap_layout_string_round_trip() {
        for layout in SnapLayout::ALL {
            assert_eq!(layout.as_str().parse::<SnapLayout>(), Ok(layout));
        }
        assert!("middle".parse::<SnapLayout>().is_err());
        let json = serde_json::to_string(&SnapLayout::LeftTwoThirds).unwrap();
        assert_eq!(json, "\"left-two-thirds\"");
    }

    #[test]
    fn resize_left_pins_at_minimum_width() {
        let start = Bounds::new(100, 100, 500, 400);
        let res = resize_bounds(start, ResizeEdge::Left, 300, 0);
        assert_eq!(res.width, MIN_WINDOW_WIDTH);
        assert_eq!(res.right(), start.right());
    }

    #[test]
    fn resize_top_stops_at_screen_edge() {
        let start = Bounds::new(0, 50, 500, 400);
        let res = resize_bounds(start, ResizeEdge::Top, 0, -200);
        assert_eq!(res.top, 0);
        assert_eq!(res.bottom(), start.bottom());
    }

    #[test]
    fn resize_bottom_right_grows() {
        let start = Bounds::new(10, 10, 500, 400);
        let res = resize_bounds(start, ResizeEdge::BottomRight, 40, 30);
        assert_eq!(res, Bounds::new(10, 10, 540, 430));
    }

    proptest! {
        #[test]
        fn clamp_is_idempotent(
            left in -5000i32..5000,
            top in -5000i32..5000,
            width in -100i32..4000,
            height in -100i32..4000,
        ) {
            let b = Bounds::new(left, top, width, height);
            prop_assert_eq!(clamp(clamp(b)), clamp(b));
        }

        #[test]
        fn left_half_round_trip(vw in 400i32..8000, vh in 300i32..5000, reserved in 0i32..120) {
            let rect = snap_rect(SnapLayout::LeftHalf, vw, vh, reserved);
            prop_assert_eq!(rect, Bounds::new(0, 0, vw / 2, vh - reserved));
        }

        #[test]
        fn resize_never_breaks_minimums(
            dx in -2000i32..2000,
            dy in -2000i32..2000,
            edge_idx in 0usize..8,
        ) {
            let edges = [
                ResizeEdge::Left,
                ResizeEdge::Right,
                ResizeEdge::Top,
                ResizeEdge::Bottom,
                ResizeEdge::TopLeft,
                ResizeEdge::TopRight,
                ResizeEdge::BottomLeft,
                ResizeEdge::BottomRight,
            ];
            let res = resize_bounds(Bounds::new(200, 150, 600, 450), edges[edge_idx], dx, dy);
            prop_assert!(res.width >= MIN_WINDOW_WIDTH);
            prop_assert!(res.height >= MIN_WINDOW_HEIGHT);
            prop_assert!(res.top >= 0);
        }
    }
}
