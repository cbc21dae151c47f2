//! Error types for window manager operations.
//!
//! Most inconsistencies (bad persisted geometry, stale timers, settings
//! write failures) are corrected where they are found and only logged. What
//! reaches callers is the short list below.

use thiserror::Error;

use crate::window::{AppId, WindowId};

#[derive(Debug, Error)]
pub enum WmError {
    /// The application registry has no entry for this id; nothing was opened.
    #[error("application cannot be opened: unknown app id `{0}`")]
    UnknownApp(AppId),

    #[error("window not found: {0}")]
    WindowNotFound(WindowId),

    #[error("settings store error: {0}")]
    Settings(String),

    #[error("settings serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("settings io error: {0}")]
    Io(#[from] std::io::Error),
}

pub type WmResult<T> = Result<T, WmError>;
