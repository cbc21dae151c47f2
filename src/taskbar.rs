//! Taskbar contract plus a simple strip implementation.
//!
//! The manager asks the taskbar where an app's icon sits (the target of the
//! minimize animation) and tells it when to hide because a window is
//! maximized.

use crate::geometry::{Bounds, Point, Viewport};
use crate::window::AppId;

pub trait Taskbar {
    /// On-screen rectangle of `app_id`'s icon, if it has one.
    fn icon_rect(&self, app_id: &AppId) -> Option<Bounds>;

    fn set_visible(&mut self, visible: bool);

    fn app_started(&mut self, _app_id: &AppId) {}

    fn app_stopped(&mut self, _app_id: &AppId) {}

    fn viewport_changed(&mut self, _viewport: Viewport) {}
}

const ICON_WIDTH: i32 = 56;
const ICON_GAP: i32 = 8;

/// Icons for running apps laid out left-to-right, centered in the reserved
/// strip at the bottom of the viewport.
#[derive(Debug, Clone)]
pub struct StripTaskbar {
    viewport: Viewport,
    apps: Vec<AppId>,
    visible: bool,
}

impl StripTaskbar {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            viewport,
            apps: Vec::new(),
            visible: true,
        }
    }

    pub fn visible(&self) -> bool {
        self.visible
    }

    pub fn apps(&self) -> &[AppId] {
        &self.apps
    }

    pub fn app_at(&self, point: Point) -> Option<&AppId> {
        self.apps
            .iter()
            .find(|app| self.icon_rect(app).is_some_and(|rect| rect.contains(point)))
    }
}

impl Taskbar for StripTaskbar {
    fn icon_rect(&self, app_id: &AppId) -> Option<Bounds> {
        let index = self.apps.iter().position(|app| app == app_id)? as i32;
        let count = self.apps.len() as i32;
        let strip_width = count * ICON_WIDTH + (count - 1).max(0) * ICON_GAP;
        let start = (self.viewport.width - strip_width) / 2;
        Some(Bounds::new(
            start + index * (ICON_WIDTH + ICON_GAP),
            self.viewport.usable_height(),
            ICON_WIDTH,
            self.viewport.taskbar_reserved,
        ))
    }

    fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    fn app_started(&mut self, app_id: &AppId) {
        if !self.apps.contains(app_id) {
            self.apps.push(app_id.clone());
        }
    }

    fn app_stopped(&mut self, app_id: &AppId) {
        self.apps.retain(|app| app != app_id);
    }

    fn viewport_changed(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn icons_are_centered_and_shift_when_apps_stop() {
        let mut bar = StripTaskbar::new(Viewport::new(1000, 800, 50));
        let a = AppId::from("a");
        let b = AppId::from("b");
        bar.app_started(&a);
        assert_eq!(bar.icon_rect(&a), Some(Bounds::new(472, 750, 56, 50)));
        bar.app_started(&b);
        let first = bar.icon_rect(&a).unwrap();
        let second = bar.icon_rect(&b).unwrap();
        assert_eq!(second.left - first.left, ICON_WIDTH + ICON_GAP);
        bar.app_stopped(&a);
        assert_eq!(bar.icon_rect(&a), None);
        assert_eq!(bar.icon_rect(&b), Some(Bounds::new(472, 750, 56, 50)));
        assert_eq!(
            bar.app_at(Point::new(480.0, 760.0)),
            Some(&b)
        );
    }
}
