//! Shared crate-wide constants.

/// Smallest width a freely placed window may have, in viewport pixels.
pub const MIN_WINDOW_WIDTH: i32 = 400;

/// Smallest height a freely placed window may have, in viewport pixels.
pub const MIN_WINDOW_HEIGHT: i32 = 300;

/// Distance from a screen corner (on both axes) within which a dragged
/// pointer proposes a quadrant layout.
///
/// Corners are checked before edges and use a larger trigger so they stay
/// easy to hit while the pointer travels along an edge.
pub const CORNER_TRIGGER_DISTANCE: f64 = 110.0;

/// Distance from the left or right screen edge within which a dragged
/// pointer proposes a half-screen layout.
pub const EDGE_TRIGGER_DISTANCE: f64 = 42.0;

/// Width ratio used by the two-thirds snap layouts.
pub const TWO_THIRDS_RATIO: f64 = 0.66;

/// Fixed column count of the task view grid.
pub const OVERVIEW_COLUMNS: usize = 3;

/// Padding between the usable area border and the task view grid.
pub const OVERVIEW_PADDING: i32 = 48;

/// Gap between task view grid cells.
pub const OVERVIEW_GAP: i32 = 24;

/// Largest scale a task view preview may be drawn at.
pub const OVERVIEW_MAX_SCALE: f64 = 0.75;

/// Stacking value added to task view previews so they sit above the
/// backdrop and every regular window.
pub const OVERVIEW_Z_BASE: u64 = 1 << 32;

/// Upper bound on the magnitude of any persisted coordinate or extent.
/// Records outside this range are treated as corrupt.
pub const MAX_SANE_COORD: f64 = 20_000.0;

/// Settings-store key that holds the per-application bounds map.
pub const BOUNDS_SETTINGS_KEY: &str = "desk.windowBounds";
