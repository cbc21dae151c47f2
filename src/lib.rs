//! Window management core for a simulated desktop shell.
//!
//! [`WindowManager`] owns every open window and drives stacking, dragging,
//! resizing, edge and hover snapping, minimize/maximize transitions, bounds
//! persistence and the task view overlay. Time only moves when the host
//! calls [`WindowManager::advance`], so the whole core is deterministic.
//! The terminal modules (`drivers`, `event_loop`, `ui`, `runner`) are the
//! presentation used by the `desk-wm` binary.

pub mod config;
pub mod constants;
pub mod drivers;
pub mod error;
pub mod event_loop;
pub mod geometry;
pub mod overview;
pub mod persistence;
pub mod registry;
pub mod runner;
pub mod snap;
pub mod taskbar;
pub mod timer;
pub mod tracing_sub;
pub mod ui;
pub mod window;

pub use config::{Timings, WmConfig};
pub use error::{WmError, WmResult};
pub use geometry::{Bounds, Point, ResizeEdge, SnapLayout, Viewport};
pub use persistence::{JsonFileSettings, MemorySettings, SettingsStore};
pub use registry::{AppInfo, ApplicationRegistry, CloseHook, CloseVerdict, StaticRegistry};
pub use window::{AppId, CloseOutcome, LifecycleState, WindowId, WindowManager, WmEvent};
