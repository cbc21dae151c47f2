use std::collections::BTreeSet;
use std::time::Duration;

use desk_wm::geometry::{clamp, snap_rect_in};
use desk_wm::persistence::MemorySettings;
use desk_wm::{
    AppInfo, Bounds, LifecycleState, SnapLayout, StaticRegistry, Viewport, WindowManager, WmConfig,
};
use proptest::prelude::*;

const APPS: [&str; 5] = ["notes", "calculator", "clock", "weather", "files"];

fn manager(viewport: Viewport) -> WindowManager {
    let registry = APPS.iter().fold(StaticRegistry::new(), |registry, app| {
        registry.with_app(*app, AppInfo::new(*app, 640, 480))
    });
    let config = WmConfig {
        viewport,
        ..WmConfig::default()
    };
    WindowManager::new(config, registry, MemorySettings::new())
}

#[derive(Debug, Clone)]
enum Op {
    Open(usize),
    Focus(usize),
    Close(usize),
    Minimize(usize),
    Maximize(usize),
    Snap(usize, SnapLayout),
    Overview,
    Advance(u64),
}

fn op() -> impl Strategy<Value = Op> {
    let app = 0..APPS.len();
    prop_oneof![
        3 => app.clone().prop_map(Op::Open),
        2 => app.clone().prop_map(Op::Focus),
        1 => app.clone().prop_map(Op::Close),
        1 => app.clone().prop_map(Op::Minimize),
        1 => app.clone().prop_map(Op::Maximize),
        1 => (app, proptest::sample::select(SnapLayout::ALL.to_vec()))
            .prop_map(|(idx, layout)| Op::Snap(idx, layout)),
        1 => Just(Op::Overview),
        1 => (0u64..800).prop_map(Op::Advance),
    ]
}

fn apply(wm: &mut WindowManager, op: &Op) {
    let find = |wm: &WindowManager, idx: usize| wm.window_for_app(&APPS[idx].into());
    match *op {
        Op::Open(idx) => {
            wm.open_app(APPS[idx]).unwrap();
        }
        Op::Focus(idx) => {
            if let Some(id) = find(wm, idx) {
                wm.focus(id).unwrap();
            }
        }
        Op::Close(idx) => {
            if let Some(id) = find(wm, idx) {
                wm.close_window(id).unwrap();
            }
        }
        Op::Minimize(idx) => {
            if let Some(id) = find(wm, idx) {
                wm.toggle_minimize(id).unwrap();
            }
        }
        Op::Maximize(idx) => {
            if let Some(id) = find(wm, idx) {
                wm.toggle_maximize(id).unwrap();
            }
        }
        Op::Snap(idx, layout) => {
            if let Some(id) = find(wm, idx) {
                wm.apply_snap_layout(id, layout).unwrap();
            }
        }
        Op::Overview => {
            if wm.overview_open() {
                wm.close_overview();
            } else {
                wm.open_overview();
            }
        }
        Op::Advance(ms) => wm.advance(Duration::from_millis(ms)),
    }
}

proptest! {
    #[test]
    fn z_order_unique_across_any_sequence(ops in proptest::collection::vec(op(), 1..60)) {
        let mut wm = manager(Viewport::default());
        for op in &ops {
            apply(&mut wm, op);
            let views = wm.windows();
            let zs: BTreeSet<u64> = views.iter().map(|v| v.z_order).collect();
            prop_assert_eq!(zs.len(), views.len());
        }
    }

    #[test]
    fn window_invariants_hold(ops in proptest::collection::vec(op(), 1..60)) {
        let mut wm = manager(Viewport::new(1600, 900, 40));
        let maximized = wm.viewport().maximized_rect();
        for op in &ops {
            apply(&mut wm, op);
            let mut any_maximized = false;
            for view in wm.windows() {
                let window = wm.window(view.id).unwrap();
                prop_assert!(window.bounds().top >= 0);
                prop_assert_eq!(window.saved_bounds().is_some(), window.state() == LifecycleState::Maximized);
                if window.state() == LifecycleState::Maximized {
                    any_maximized = true;
                    prop_assert_eq!(window.bounds(), maximized);
                }
                if let Some(layout) = window.snap_layout() {
                    prop_assert_eq!(window.bounds(), snap_rect_in(layout, wm.viewport()));
                }
            }
            prop_assert_eq!(wm.taskbar_visible(), !any_maximized);
        }
    }

    #[test]
    fn clamp_is_idempotent(left in -5000i32..5000, top in -5000i32..5000, width in -100i32..3000, height in -100i32..3000) {
        let once = clamp(Bounds::new(left, top, width, height));
        prop_assert_eq!(clamp(once), once);
    }

    #[test]
    fn left_half_round_trips(width in 800i32..4000, height in 600i32..3000, reserved in 0i32..100) {
        let viewport = Viewport::new(width, height, reserved);
        let mut wm = manager(viewport);
        let id = wm.open_app("notes").unwrap();
        wm.apply_snap_layout(id, SnapLayout::LeftHalf).unwrap();
        prop_assert_eq!(
            wm.window(id).unwrap().bounds(),
            Bounds::new(0, 0, width / 2, height - reserved)
        );
    }
}
