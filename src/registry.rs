//! Contracts with the application layer: which apps exist and whether an
//! app agrees to have its window closed.

use std::collections::BTreeMap;

use crate::window::{AppId, WindowId};

/// What the window manager needs to know about an application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppInfo {
    pub title: String,
    pub icon: String,
    pub preferred_width: i32,
    pub preferred_height: i32,
}

impl AppInfo {
    pub fn new(title: impl Into<String>, preferred_width: i32, preferred_height: i32) -> Self {
        Self {
            title: title.into(),
            icon: String::new(),
            preferred_width,
            preferred_height,
        }
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = icon.into();
        self
    }
}

pub trait ApplicationRegistry {
    fn lookup(&self, app_id: &AppId) -> Option<AppInfo>;
}

/// Registry backed by a fixed table filled at startup.
#[derive(Debug, Clone, Default)]
pub struct StaticRegistry {
    apps: BTreeMap<AppId, AppInfo>,
}

impl StaticRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, app_id: impl Into<AppId>, info: AppInfo) {
        self.apps.insert(app_id.into(), info);
    }

    pub fn with_app(mut self, app_id: impl Into<AppId>, info: AppInfo) -> Self {
        self.register(app_id, info);
        self
    }

    pub fn app_ids(&self) -> impl Iterator<Item = &AppId> {
        self.apps.keys()
    }
}

impl ApplicationRegistry for StaticRegistry {
    fn lookup(&self, app_id: &AppId) -> Option<AppInfo> {
        self.apps.get(app_id).cloned()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseVerdict {
    Allow,
    Abort,
    /// The app needs to ask the user first; the answer arrives later through
    /// `WindowManager::resolve_close`.
    Defer,
}

/// Per-application veto over closing its window (unsaved changes and the like).
pub trait CloseHook {
    fn can_close(&mut self, window: WindowId, app_id: &AppId) -> CloseVerdict;
}

impl<F> CloseHook for F
where
    F: FnMut(WindowId, &AppId) -> CloseVerdict,
{
    fn can_close(&mut self, window: WindowId, app_id: &AppId) -> CloseVerdict {
        self(window, app_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_registry_lookup() {
        let registry =
            StaticRegistry::new().with_app("notes", AppInfo::new("Notes", 720, 540).with_icon("📝"));
        let info = registry.lookup(&AppId::from("notes")).expect("registered");
        assert_eq!(info.title, "Notes");
        assert_eq!(info.icon, "📝");
        assert!(registry.lookup(&AppId::from("paint")).is_none());
    }

    #[test]
    fn closures_are_close_hooks() {
        let mut calls = 0;
        let mut hook = |_: WindowId, _: &AppId| {
            calls += 1;
            CloseVerdict::Abort
        };
        let verdict = hook.can_close(WindowId::from_raw(1), &AppId::from("notes"));
        assert_eq!(verdict, CloseVerdict::Abort);
        assert_eq!(calls, 1);
    }
}
