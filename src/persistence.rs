//! Bounds memory: the last freely placed rectangle of every application,
//! kept in an external key-value settings store.
//!
//! All records live under one namespaced key as a JSON object mapping app id
//! to `{ left, top, width, height, snapLayout }`. Records are read leniently
//! (anything malformed falls back to a centered default) and written only
//! when the normalized value changed since the last write.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::constants::{BOUNDS_SETTINGS_KEY, MAX_SANE_COORD};
use crate::error::{WmError, WmResult};
use crate::geometry::{Bounds, SnapLayout, Viewport, clamp, snap_rect_in};
use crate::registry::AppInfo;
use crate::window::AppId;

/// Synchronous key-value settings blob; last write wins.
pub trait SettingsStore {
    fn get(&self, key: &str) -> Option<Value>;
    fn set(&mut self, key: &str, value: Value) -> WmResult<()>;
}

#[derive(Debug, Default)]
struct MemoryInner {
    values: HashMap<String, Value>,
    writes: usize,
}

/// In-process settings store. Clones share the same storage, so a test can
/// keep a handle after giving one to the window manager.
#[derive(Debug, Clone, Default)]
pub struct MemorySettings {
    inner: Rc<RefCell<MemoryInner>>,
}

impl MemorySettings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful `set` calls so far.
    pub fn writes(&self) -> usize {
        self.inner.borrow().writes
    }
}

impl SettingsStore for MemorySettings {
    fn get(&self, key: &str) -> Option<Value> {
        self.inner.borrow().values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: Value) -> WmResult<()> {
        let mut inner = self.inner.borrow_mut();
        inner.values.insert(key.to_owned(), value);
        inner.writes += 1;
        Ok(())
    }
}

/// Settings persisted as one pretty-printed JSON object on disk.
#[derive(Debug)]
pub struct JsonFileSettings {
    path: PathBuf,
    values: Map<String, Value>,
}

impl JsonFileSettings {
    /// Load `path`. A missing file starts empty; an unreadable or malformed
    /// one is logged and also starts empty (it is replaced on the next write).
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let values = match fs::read_to_string(&path) {
            Ok(text) => match serde_json::from_str::<Value>(&text) {
                Ok(Value::Object(map)) => map,
                Ok(_) => {
                    tracing::warn!(path = %path.display(), "settings file is not a JSON object; ignoring");
                    Map::new()
                }
                Err(err) => {
                    tracing::warn!(path = %path.display(), error = %err, "malformed settings file; ignoring");
                    Map::new()
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Map::new(),
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "failed to read settings file");
                Map::new()
            }
        };
        Self { path, values }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) -> WmResult<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        let text = serde_json::to_string_pretty(&self.values)?;
        fs::write(&self.path, text).map_err(|err| {
            WmError::Settings(format!("writing {}: {err}", self.path.display()))
        })
    }
}

impl SettingsStore for JsonFileSettings {
    fn get(&self, key: &str) -> Option<Value> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: Value) -> WmResult<()> {
        self.values.insert(key.to_owned(), value);
        self.flush()
    }
}

/// `<config dir>/desk-wm/settings.json`, when the platform has a config dir.
pub fn default_settings_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("desk-wm").join("settings.json"))
}

/// One application's remembered geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundsRecord {
    pub left: i32,
    pub top: i32,
    pub width: i32,
    pub height: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snap_layout: Option<SnapLayout>,
}

impl BoundsRecord {
    pub fn new(bounds: Bounds, snap_layout: Option<SnapLayout>) -> Self {
        Self {
            left: bounds.left,
            top: bounds.top,
            width: bounds.width,
            height: bounds.height,
            snap_layout,
        }
    }

    pub fn bounds(&self) -> Bounds {
        Bounds::new(self.left, self.top, self.width, self.height)
    }

    /// Parse a stored record without trusting its shape. Numbers may be
    /// fractional; an unknown snap layout name is dropped.
    fn from_value(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        let field = |name: &str| obj.get(name).and_then(Value::as_f64);
        let (left, top, width, height) =
            (field("left")?, field("top")?, field("width")?, field("height")?);
        if !in_sane_range(left, top, width, height) {
            return None;
        }
        let bounds = Bounds::from_f64(left, top, width, height)?;
        let snap_layout = obj
            .get("snapLayout")
            .and_then(Value::as_str)
            .and_then(|name| name.parse().ok());
        Some(Self::new(bounds, snap_layout))
    }
}

fn in_sane_range(left: f64, top: f64, width: f64, height: f64) -> bool {
    let finite = [left, top, width, height].iter().all(|v| v.is_finite());
    finite
        && left.abs() <= MAX_SANE_COORD
        && (0.0..=MAX_SANE_COORD).contains(&top)
        && (1.0..=MAX_SANE_COORD).contains(&width)
        && (1.0..=MAX_SANE_COORD).contains(&height)
}

pub struct BoundsMemory {
    store: Box<dyn SettingsStore>,
    last_written: HashMap<AppId, BoundsRecord>,
}

impl BoundsMemory {
    pub fn new(store: Box<dyn SettingsStore>) -> Self {
        Self {
            store,
            last_written: HashMap::new(),
        }
    }

    /// The stored record for `app_id`, if present and well formed.
    pub fn record(&self, app_id: &AppId) -> Option<BoundsRecord> {
        let map = self.store.get(BOUNDS_SETTINGS_KEY)?;
        let raw = map.get(app_id.as_str())?;
        let parsed = BoundsRecord::from_value(raw);
        if parsed.is_none() {
            tracing::warn!(app_id = %app_id, record = %raw, "discarding malformed bounds record");
        }
        parsed
    }

    /// Rectangle (and snap tag) a freshly opened window of `app_id` starts with.
    pub fn initial_bounds(
        &mut self,
        app_id: &AppId,
        info: &AppInfo,
        viewport: Viewport,
    ) -> (Bounds, Option<SnapLayout>) {
        let Some(record) = self.record(app_id) else {
            return (
                viewport.centered(info.preferred_width, info.preferred_height),
                None,
            );
        };
        self.last_written.insert(app_id.clone(), record);
        match record.snap_layout {
            Some(layout) => (snap_rect_in(layout, viewport), Some(layout)),
            None => (clamp(record.bounds()), None),
        }
    }

    /// Remember `bounds` for `app_id`. Returns `true` when the settings store
    /// was actually written.
    pub fn remember(
        &mut self,
        app_id: &AppId,
        bounds: Bounds,
        snap_layout: Option<SnapLayout>,
    ) -> bool {
        let bounds = if snap_layout.is_some() {
            bounds
        } else {
            clamp(bounds)
        };
        let record = BoundsRecord::new(bounds, snap_layout);
        if self.last_written.get(app_id) == Some(&record) {
            return false;
        }

        let mut map = match self.store.get(BOUNDS_SETTINGS_KEY) {
            Some(Value::Object(map)) => map,
            _ => Map::new(),
        };
        let value = match serde_json::to_value(record) {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!(app_id = %app_id, error = %err, "failed to encode bounds record");
                return false;
            }
        };
        map.insert(app_id.as_str().to_owned(), value);
        if let Err(err) = self.store.set(BOUNDS_SETTINGS_KEY, Value::Object(map)) {
            tracing::warn!(app_id = %app_id, error = %err, "failed to persist window bounds");
            return false;
        }
        tracing::debug!(app_id = %app_id, ?record, "persisted window bounds");
        self.last_written.insert(app_id.clone(), record);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn info() -> AppInfo {
        AppInfo::new("Notes", 720, 540)
    }

    fn viewport() -> Viewport {
        Viewport::new(1920, 1080, 48)
    }

    #[test]
    fn remember_dedups_identical_writes() {
        let settings = MemorySettings::new();
        let mut memory = BoundsMemory::new(Box::new(settings.clone()));
        let app = AppId::from("notes");
        assert!(memory.remember(&app, Bounds::new(10, 20, 800, 600), None));
        assert!(!memory.remember(&app, Bounds::new(10, 20, 800, 600), None));
        assert_eq!(settings.writes(), 1);
        // normalization happens before the comparison
        assert!(memory.remember(&app, Bounds::new(10, -5, 100, 100), None));
        assert!(!memory.remember(&app, Bounds::new(10, 0, 400, 300), None));
        assert_eq!(settings.writes(), 2);
    }

    #[test]
    fn records_for_different_apps_share_one_key() {
        let settings = MemorySettings::new();
        let mut memory = BoundsMemory::new(Box::new(settings.clone()));
        memory.remember(&AppId::from("a"), Bounds::new(0, 0, 500, 400), None);
        memory.remember(
            &AppId::from("b"),
            Bounds::new(960, 0, 960, 1032),
            Some(SnapLayout::RightHalf),
        );
        let stored = settings.get(BOUNDS_SETTINGS_KEY).unwrap();
        assert_eq!(stored["a"]["width"], json!(500));
        assert_eq!(stored["b"]["snapLayout"], json!("right-half"));
        assert!(stored["a"].get("snapLayout").is_none());
    }

    #[test]
    fn missing_record_falls_back_to_centered_default() {
        let mut memory = BoundsMemory::new(Box::new(MemorySettings::new()));
        let (bounds, snap) = memory.initial_bounds(&AppId::from("notes"), &info(), viewport());
        assert_eq!(bounds, Bounds::new(600, 246, 720, 540));
        assert_eq!(snap, None);
    }

    #[test]
    fn malformed_records_fall_back() {
        let mut settings = MemorySettings::new();
        settings
            .set(
                BOUNDS_SETTINGS_KEY,
                json!({
                    "text": { "left": "x", "top": 0, "width": 500, "height": 400 },
                    "huge": { "left": 0, "top": 0, "width": 1e9, "height": 400 },
                    "neg": { "left": 0, "top": -10, "width": 500, "height": 400 },
                    "zero": { "left": 0, "top": 0, "width": 0, "height": 400 },
                }),
            )
            .unwrap();
        let mut memory = BoundsMemory::new(Box::new(settings));
        let fallback = viewport().centered(720, 540);
        for app in ["text", "huge", "neg", "zero"] {
            let (bounds, _) = memory.initial_bounds(&AppId::from(app), &info(), viewport());
            assert_eq!(bounds, fallback, "{app}");
        }
    }

    #[test]
    fn stored_record_is_clamped_and_snap_recomputed() {
        let mut settings = MemorySettings::new();
        settings
            .set(
                BOUNDS_SETTINGS_KEY,
                json!({
                    "small": { "left": -30.4, "top": 12.6, "width": 200, "height": 100 },
                    "snapped": { "left": 0, "top": 0, "width": 10, "height": 10, "snapLayout": "left-half" },
                }),
            )
            .unwrap();
        let mut memory = BoundsMemory::new(Box::new(settings.clone()));
        let (small, snap) = memory.initial_bounds(&AppId::from("small"), &info(), viewport());
        assert_eq!(small, Bounds::new(-30, 13, 400, 300));
        assert_eq!(snap, None);
        let (snapped, snap) = memory.initial_bounds(&AppId::from("snapped"), &info(), viewport());
        assert_eq!(snapped, Bounds::new(0, 0, 960, 1032));
        assert_eq!(snap, Some(SnapLayout::LeftHalf));
        assert_eq!(settings.writes(), 1);
    }

    #[test]
    fn reading_a_record_seeds_the_dedup_cache() {
        let mut settings = MemorySettings::new();
        settings
            .set(
                BOUNDS_SETTINGS_KEY,
                json!({ "notes": { "left": 5, "top": 6, "width": 700, "height": 500 } }),
            )
            .unwrap();
        let mut memory = BoundsMemory::new(Box::new(settings.clone()));
        let app = AppId::from("notes");
        let (bounds, _) = memory.initial_bounds(&app, &info(), viewport());
        assert!(!memory.remember(&app, bounds, None));
        assert_eq!(settings.writes(), 1);
    }

    #[test]
    fn json_file_settings_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");
        let mut settings = JsonFileSettings::open(&path);
        assert!(settings.get("k").is_none());
        settings.set("k", json!({ "v": 1 })).unwrap();
        let reopened = JsonFileSettings::open(&path);
        assert_eq!(reopened.get("k"), Some(json!({ "v": 1 })));
    }

    #[test]
    fn json_file_settings_tolerate_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{ not json").unwrap();
        let mut settings = JsonFileSettings::open(&path);
        assert!(settings.get(BOUNDS_SETTINGS_KEY).is_none());
        settings.set("k", json!(true)).unwrap();
        assert_eq!(JsonFileSettings::open(&path).get("k"), Some(json!(true)));
    }
}
