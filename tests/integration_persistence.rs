use std::fs;

use desk_wm::constants::BOUNDS_SETTINGS_KEY;
use desk_wm::persistence::{JsonFileSettings, MemorySettings};
use desk_wm::{
    AppInfo, Bounds, Point, ResizeEdge, SettingsStore, SnapLayout, StaticRegistry, Viewport,
    WindowManager, WmConfig, WmEvent,
};
use serde_json::json;

fn registry() -> StaticRegistry {
    StaticRegistry::new()
        .with_app("notes", AppInfo::new("Notes", 720, 540))
        .with_app("clock", AppInfo::new("Clock", 480, 360))
}

fn config() -> WmConfig {
    WmConfig {
        viewport: Viewport::new(1920, 1080, 48),
        ..WmConfig::default()
    }
}

fn drag(wm: &mut WindowManager, app: &str, to: Point) {
    let id = wm.window_for_app(&app.into()).unwrap();
    let bounds = wm.window(id).unwrap().bounds();
    let grab = Point::new(bounds.left as f64 + 50.0, bounds.top as f64 + 10.0);
    wm.begin_drag(id, grab).unwrap();
    wm.drag_move(to);
    wm.end_drag();
}

#[test]
fn bounds_survive_restart_through_settings_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("desk-wm").join("settings.json");

    {
        let mut wm = WindowManager::new(config(), registry(), JsonFileSettings::open(&path));
        wm.open_app("notes").unwrap();
        drag(&mut wm, "notes", Point::new(400.0, 300.0));
        wm.open_app("clock").unwrap();
        let clock = wm.window_for_app(&"clock".into()).unwrap();
        wm.apply_snap_layout(clock, SnapLayout::RightHalf).unwrap();
    }

    let raw: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    let records = &raw[BOUNDS_SETTINGS_KEY];
    assert_eq!(records["clock"]["snapLayout"], json!("right-half"));
    assert!(records["notes"].get("snapLayout").is_none());

    let mut wm = WindowManager::new(config(), registry(), JsonFileSettings::open(&path));
    let notes = wm.open_app("notes").unwrap();
    let clock = wm.open_app("clock").unwrap();
    // notes was 720x540 at (600, 246); the title grab point moved to (400, 300)
    assert_eq!(wm.window(notes).unwrap().bounds(), Bounds::new(350, 290, 720, 540));
    let clock = wm.window(clock).unwrap();
    assert_eq!(clock.snap_layout(), Some(SnapLayout::RightHalf));
    assert_eq!(clock.bounds(), Bounds::new(960, 0, 960, 1032));
}

#[test]
fn snapped_records_follow_the_current_viewport() {
    let mut settings = MemorySettings::new();
    settings
        .set(
            BOUNDS_SETTINGS_KEY,
            json!({ "notes": { "left": 0, "top": 0, "width": 960, "height": 1032, "snapLayout": "left-half" } }),
        )
        .unwrap();
    let config = WmConfig {
        viewport: Viewport::new(1280, 800, 40),
        ..WmConfig::default()
    };
    let mut wm = WindowManager::new(config, registry(), settings);
    let notes = wm.open_app("notes").unwrap();
    assert_eq!(wm.window(notes).unwrap().bounds(), Bounds::new(0, 0, 640, 760));
}

#[test]
fn unchanged_bounds_are_written_once() {
    let settings = MemorySettings::new();
    let mut wm = WindowManager::new(config(), registry(), settings.clone());
    let notes = wm.open_app("notes").unwrap();

    drag(&mut wm, "notes", Point::new(500.0, 400.0));
    assert_eq!(settings.writes(), 1);

    // a click on the title bar without movement persists the same rectangle
    let bounds = wm.window(notes).unwrap().bounds();
    let grab = Point::new(bounds.left as f64 + 10.0, bounds.top as f64 + 10.0);
    wm.begin_drag(notes, grab).unwrap();
    wm.end_drag();
    assert_eq!(settings.writes(), 1);

    let persisted = wm
        .take_events()
        .into_iter()
        .filter(|e| matches!(e, WmEvent::BoundsPersisted { .. }))
        .count();
    assert_eq!(persisted, 1);
}

#[test]
fn resize_clamps_and_persists() {
    let settings = MemorySettings::new();
    let mut wm = WindowManager::new(config(), registry(), settings.clone());
    let clock = wm.open_app("clock").unwrap();
    let start = wm.window(clock).unwrap().bounds();

    let grab = Point::new(start.right() as f64 - 2.0, start.bottom() as f64 - 2.0);
    assert!(wm.begin_resize(clock, ResizeEdge::BottomRight, grab).unwrap());
    wm.resize_move(Point::new(grab.x - 500.0, grab.y - 500.0));
    wm.end_gesture();

    let bounds = wm.window(clock).unwrap().bounds();
    assert_eq!((bounds.left, bounds.top), (start.left, start.top));
    assert_eq!((bounds.width, bounds.height), (400, 300));
    assert_eq!(settings.writes(), 1);
    let stored = settings.get(BOUNDS_SETTINGS_KEY).unwrap();
    assert_eq!(stored["clock"]["width"], json!(400));
}

#[test]
fn maximized_and_minimized_windows_are_not_persisted() {
    let settings = MemorySettings::new();
    let mut wm = WindowManager::new(config(), registry(), settings.clone());
    let notes = wm.open_app("notes").unwrap();
    wm.toggle_maximize(notes).unwrap();
    wm.minimize(notes).unwrap();
    wm.focus(notes).unwrap();
    assert!(wm.window(notes).unwrap().is_maximized());
    assert_eq!(settings.writes(), 0);
}
