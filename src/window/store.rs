//! Authoritative list of open windows.
//!
//! The store owns window records, hands out ids, and keeps stacking values
//! unique: every open or raise takes the next value of a monotonic counter,
//! so the frontmost window is always the one with the highest `z_order`.

use std::collections::BTreeMap;

use super::{AppId, Window, WindowId};
use crate::geometry::{Bounds, Point, SnapLayout, clamp};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenOutcome {
    Created(WindowId),
    /// The application already had a window; nothing was inserted.
    Existing(WindowId),
}

impl OpenOutcome {
    pub fn id(self) -> WindowId {
        match self {
            OpenOutcome::Created(id) | OpenOutcome::Existing(id) => id,
        }
    }
}

#[derive(Debug, Default)]
pub struct WindowStore {
    windows: BTreeMap<WindowId, Window>,
    next_id: u64,
    z_counter: u64,
}

impl WindowStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a window for `app_id` unless one is already open.
    ///
    /// `initial` is clamped unless a snap layout governs it.
    pub fn open(
        &mut self,
        app_id: AppId,
        title: impl Into<String>,
        initial: Bounds,
        snap_layout: Option<SnapLayout>,
    ) -> OpenOutcome {
        if let Some(existing) = self.find_by_app(&app_id) {
            return OpenOutcome::Existing(existing);
        }
        self.next_id = self.next_id.saturating_add(1);
        let id = WindowId(self.next_id);
        let z = self.next_z();
        let bounds = if snap_layout.is_some() {
            initial
        } else {
            clamp(initial)
        };
        let mut window = Window::new(id, app_id, title.into(), bounds, z);
        window.snap_layout = snap_layout;
        self.windows.insert(id, window);
        OpenOutcome::Created(id)
    }

    pub fn get(&self, id: WindowId) -> Option<&Window> {
        self.windows.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: WindowId) -> Option<&mut Window> {
        self.windows.get_mut(&id)
    }

    pub fn contains(&self, id: WindowId) -> bool {
        self.windows.contains_key(&id)
    }

    pub fn find_by_app(&self, app_id: &AppId) -> Option<WindowId> {
        self.windows
            .values()
            .find(|window| &window.app_id == app_id)
            .map(|window| window.id)
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Window> {
        self.windows.values()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Window> {
        self.windows.values_mut()
    }

    /// Give `id` the next stacking value, making it frontmost.
    pub fn raise(&mut self, id: WindowId) -> bool {
        if !self.windows.contains_key(&id) {
            return false;
        }
        let z = self.next_z();
        if let Some(window) = self.windows.get_mut(&id) {
            window.z_order = z;
        }
        true
    }

    pub fn remove(&mut self, id: WindowId) -> Option<Window> {
        self.windows.remove(&id)
    }

    /// Store new bounds for `id` after clamping them.
    ///
    /// The snap tag is replaced by `snap_layout`, so plain geometry updates
    /// (drag, resize) drop it. Snapped rectangles skip the minimum-size clamp.
    pub fn update_bounds(
        &mut self,
        id: WindowId,
        bounds: Bounds,
        snap_layout: Option<SnapLayout>,
    ) -> bool {
        let Some(window) = self.windows.get_mut(&id) else {
            return false;
        };
        window.bounds = match snap_layout {
            Some(_) => Bounds {
                top: bounds.top.max(0),
                ..bounds
            },
            None => clamp(bounds),
        };
        window.snap_layout = snap_layout;
        true
    }

    /// Window ids ordered back-to-front.
    pub fn stacking_order(&self) -> Vec<WindowId> {
        let mut ordered: Vec<&Window> = self.windows.values().collect();
        ordered.sort_by_key(|window| window.z_order);
        ordered.into_iter().map(|window| window.id).collect()
    }

    /// The frontmost window that is not minimized.
    pub fn topmost_visible(&self) -> Option<WindowId> {
        self.windows
            .values()
            .filter(|window| !window.is_minimized())
            .max_by_key(|window| window.z_order)
            .map(|window| window.id)
    }

    /// The frontmost non-minimized window whose rectangle contains `point`.
    pub fn window_at(&self, point: Point) -> Option<WindowId> {
        self.windows
            .values()
            .filter(|window| !window.is_minimized() && window.bounds.contains(point))
            .max_by_key(|window| window.z_order)
            .map(|window| window.id)
    }

    pub fn any_maximized(&self) -> bool {
        self.windows.values().any(|window| window.is_maximized())
    }

    fn next_z(&mut self) -> u64 {
        self.z_counter = self.z_counter.saturating_add(1);
        self.z_counter
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::BTreeSet;

    fn rect() -> Bounds {
        Bounds::new(100, 100, 640, 480)
    }

    #[test]
    fn open_twice_returns_existing() {
        let mut store = WindowStore::new();
        let first = store.open(AppId::from("notes"), "Notes", rect(), None);
        let second = store.open(AppId::from("notes"), "Notes", rect(), None);
        assert!(matches!(first, OpenOutcome::Created(_)));
        assert_eq!(second, OpenOutcome::Existing(first.id()));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn raise_makes_window_frontmost() {
        let mut store = WindowStore::new();
        let a = store.open(AppId::from("a"), "A", rect(), None).id();
        let b = store.open(AppId::from("b"), "B", rect(), None).id();
        assert_eq!(store.topmost_visible(), Some(b));
        assert!(store.raise(a));
        assert_eq!(store.topmost_visible(), Some(a));
        assert_eq!(store.stacking_order(), vec![b, a]);
        assert!(!store.raise(WindowId::from_raw(99)));
    }

    #[test]
    fn update_bounds_clamps_and_clears_snap() {
        let mut store = WindowStore::new();
        let id = store
            .open(
                AppId::from("a"),
                "A",
                Bounds::new(0, 0, 960, 515),
                Some(SnapLayout::TopLeft),
            )
            .id();
        assert_eq!(store.get(id).unwrap().snap_layout(), Some(SnapLayout::TopLeft));
        store.update_bounds(id, Bounds::new(10, -40, 200, 100), None);
        let window = store.get(id).unwrap();
        assert_eq!(window.bounds(), Bounds::new(10, 0, 400, 300));
        assert_eq!(window.snap_layout(), None);
    }

    #[test]
    fn window_at_prefers_topmost() {
        let mut store = WindowStore::new();
        let a = store.open(AppId::from("a"), "A", Bounds::new(0, 0, 500, 400), None).id();
        let b = store
            .open(AppId::from("b"), "B", Bounds::new(200, 200, 500, 400), None)
            .id();
        assert_eq!(store.window_at(Point::new(250.0, 250.0)), Some(b));
        assert_eq!(store.window_at(Point::new(50.0, 50.0)), Some(a));
        assert_eq!(store.window_at(Point::new(1500.0, 50.0)), None);
    }

    proptest! {
        #[test]
        fn z_order_stays_unique(ops in proptest::collection::vec((0u8..3, 0usize..6), 1..80)) {
            let mut store = WindowStore::new();
            let apps = ["a", "b", "c", "d", "e", "f"];
            for (op, idx) in ops {
                let app = AppId::from(apps[idx]);
                match op {
                    0 => {
                        store.open(app, "w", rect(), None);
                    }
                    1 => {
                        if let Some(id) = store.find_by_app(&app) {
                            store.raise(id);
                        }
                    }
                    _ => {
                        if let Some(id) = store.find_by_app(&app) {
                            store.remove(id);
                        }
                    }
                }
                let zs: BTreeSet<u64> = store.iter().map(|w| w.z_order()).collect();
                prop_assert_eq!(zs.len(), store.len());
            }
        }
    }
}
