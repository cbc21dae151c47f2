use std::collections::BTreeMap;
use std::time::Duration;

use super::{
    AnimationHint, AppId, Lifecycle, LifecycleState, MinimizeAnchor, OpenOutcome, Window,
    WindowId, WindowStore,
};
use crate::config::WmConfig;
use crate::error::{WmError, WmResult};
use crate::geometry::{
    Bounds, Point, ResizeEdge, SnapLayout, Viewport, resize_bounds, snap_rect_in,
};
use crate::overview::{OverviewExit, OverviewSession};
use crate::persistence::{BoundsMemory, SettingsStore};
use crate::registry::{ApplicationRegistry, CloseHook, CloseVerdict};
use crate::snap::{SnapInteraction, SnapPreview};
use crate::taskbar::{StripTaskbar, Taskbar};
use crate::timer::{Scheduler, TimerHandle};

/// Deferred work queued on the manager's clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WmTask {
    /// Clear a window's animation hint if it is still the one with `seq`.
    FinishAnimation { window: WindowId, seq: u64 },
    ShowSnapMenu { window: WindowId },
    HideSnapMenu { window: WindowId },
    HideSnapPreview { window: WindowId },
    DismissEmptyOverview,
    RaiseAfterOverview { window: WindowId },
}

/// Notifications for collaborators; drained with [`WindowManager::take_events`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WmEvent {
    WindowOpened { window: WindowId, app_id: AppId },
    WindowFocused { window: WindowId },
    WindowClosed { window: WindowId, app_id: AppId },
    /// The last window of an application closed.
    AppStopped { app_id: AppId },
    TaskbarVisibility { visible: bool },
    BoundsPersisted { app_id: AppId },
    OverviewOpened,
    OverviewClosed { exit: OverviewExit },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseOutcome {
    Closed,
    /// The application's close hook refused.
    Aborted,
    /// Waiting for [`WindowManager::resolve_close`].
    Pending,
}

/// Render-ready snapshot of one window.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowView {
    pub id: WindowId,
    pub app_id: AppId,
    pub title: String,
    /// Effective rectangle: the preview cell while the overview shows it.
    pub bounds: Bounds,
    pub z_order: u64,
    pub state: LifecycleState,
    pub snap_layout: Option<SnapLayout>,
    pub animation: Option<AnimationHint>,
    pub transitions_enabled: bool,
    pub visible: bool,
    pub focused: bool,
    pub in_overview: bool,
}

#[derive(Debug, Clone, Copy)]
enum Gesture {
    Drag {
        window: WindowId,
        grab: Point,
        start: Bounds,
    },
    Resize {
        window: WindowId,
        edge: ResizeEdge,
        grab: Point,
        start: Bounds,
    },
}

impl Gesture {
    fn window(&self) -> WindowId {
        match self {
            Gesture::Drag { window, .. } | Gesture::Resize { window, .. } => *window,
        }
    }
}

pub struct WindowManager {
    store: WindowStore,
    config: WmConfig,
    registry: Box<dyn ApplicationRegistry>,
    taskbar: Box<dyn Taskbar>,
    bounds_memory: BoundsMemory,
    close_hooks: BTreeMap<AppId, Box<dyn CloseHook>>,
    timers: Scheduler<WmTask>,
    snap: SnapInteraction,
    overview: Option<OverviewSession>,
    gesture: Option<Gesture>,
    /// Raise queued by an overview selection, fired when its animation ends.
    pending_raise: Option<TimerHandle>,
    taskbar_visible: bool,
    // runner drains via `take_events`
    events: Vec<WmEvent>,
}

impl WindowManager {
    pub fn new(
        config: WmConfig,
        registry: impl ApplicationRegistry + 'static,
        settings: impl SettingsStore + 'static,
    ) -> Self {
        let timings = config.timings;
        let snap = SnapInteraction::new(
            config.edge_snap_on_drag,
            config.hover_snap_menu,
            timings.hover_show(),
            timings.hover_hide(),
            timings.preview_hide(),
        );
        Self {
            store: WindowStore::new(),
            taskbar: Box::new(StripTaskbar::new(config.viewport)),
            registry: Box::new(registry),
            bounds_memory: BoundsMemory::new(Box::new(settings)),
            close_hooks: BTreeMap::new(),
            timers: Scheduler::new(),
            snap,
            overview: None,
            gesture: None,
            pending_raise: None,
            taskbar_visible: true,
            events: Vec::new(),
            config,
        }
    }

    /// Replace the built-in taskbar strip.
    pub fn with_taskbar(mut self, mut taskbar: impl Taskbar + 'static) -> Self {
        taskbar.viewport_changed(self.config.viewport);
        for window in self.store.iter() {
            taskbar.app_started(window.app_id());
        }
        taskbar.set_visible(self.taskbar_visible);
        self.taskbar = Box::new(taskbar);
        self
    }

    pub fn set_close_hook(&mut self, app_id: impl Into<AppId>, hook: impl CloseHook + 'static) {
        self.close_hooks.insert(app_id.into(), Box::new(hook));
    }

    pub fn remove_close_hook(&mut self, app_id: &AppId) {
        self.close_hooks.remove(app_id);
    }

    // ---- observers ----

    pub fn config(&self) -> &WmConfig {
        &self.config
    }

    pub fn viewport(&self) -> Viewport {
        self.config.viewport
    }

    pub fn now(&self) -> Duration {
        self.timers.now()
    }

    pub fn window(&self, id: WindowId) -> Option<&Window> {
        self.store.get(id)
    }

    pub fn window_for_app(&self, app_id: &AppId) -> Option<WindowId> {
        self.store.find_by_app(app_id)
    }

    pub fn window_count(&self) -> usize {
        self.store.len()
    }

    /// Frontmost window that is not minimized.
    pub fn focused_window(&self) -> Option<WindowId> {
        self.store.topmost_visible()
    }

    pub fn taskbar(&self) -> &dyn Taskbar {
        self.taskbar.as_ref()
    }

    pub fn taskbar_visible(&self) -> bool {
        self.taskbar_visible
    }

    pub fn snap_preview(&self) -> Option<SnapPreview> {
        self.snap.preview()
    }

    /// Window whose snap layout picker is on screen.
    pub fn snap_menu(&self) -> Option<WindowId> {
        self.snap.menu_window()
    }

    pub fn overview(&self) -> Option<&OverviewSession> {
        self.overview.as_ref()
    }

    pub fn overview_open(&self) -> bool {
        self.overview.is_some()
    }

    pub fn gesture_active(&self) -> bool {
        self.gesture.is_some()
    }

    pub fn take_events(&mut self) -> Vec<WmEvent> {
        std::mem::take(&mut self.events)
    }

    /// Every window back-to-front, as the presentation layer should draw it.
    pub fn windows(&self) -> Vec<WindowView> {
        let focused = self.focused_window();
        let session = self.overview.as_ref();
        let mut views: Vec<WindowView> = self
            .store
            .iter()
            .map(|window| {
                let entry = session.and_then(|s| s.entry(window.id()));
                let (bounds, z_order) = match entry {
                    Some(entry) => (entry.preview, entry.preview_z),
                    None => (window.bounds(), window.z_order()),
                };
                WindowView {
                    id: window.id(),
                    app_id: window.app_id().clone(),
                    title: window.title().to_owned(),
                    bounds,
                    z_order,
                    state: window.state(),
                    snap_layout: window.snap_layout(),
                    animation: window.animation(),
                    transitions_enabled: window.transitions_enabled(),
                    visible: window.visible(),
                    focused: focused == Some(window.id()),
                    in_overview: entry.is_some(),
                }
            })
            .collect();
        views.sort_by_key(|view| view.z_order);
        views
    }

    // ---- opening, focusing, closing ----

    /// Open `app_id`, or focus its window if it already has one.
    pub fn open_app(&mut self, app_id: impl Into<AppId>) -> WmResult<WindowId> {
        let app_id = app_id.into();
        let Some(info) = self.registry.lookup(&app_id) else {
            tracing::warn!(app_id = %app_id, "cannot open unknown application");
            return Err(WmError::UnknownApp(app_id));
        };
        self.leave_overview();
        if let Some(existing) = self.store.find_by_app(&app_id) {
            self.focus(existing)?;
            return Ok(existing);
        }

        self.cancel_pending_raise();
        let viewport = self.config.viewport;
        let (bounds, snap_layout) = self.bounds_memory.initial_bounds(&app_id, &info, viewport);
        let id = match self
            .store
            .open(app_id.clone(), info.title, bounds, snap_layout)
        {
            OpenOutcome::Created(id) | OpenOutcome::Existing(id) => id,
        };
        self.taskbar.app_started(&app_id);
        tracing::debug!(window_id = %id, app_id = %app_id, ?bounds, "opened window");
        self.events.push(WmEvent::WindowOpened {
            window: id,
            app_id,
        });
        self.events.push(WmEvent::WindowFocused { window: id });
        Ok(id)
    }

    /// Bring `app_id` to the front, opening it when it is not running.
    pub fn focus_app(&mut self, app_id: impl Into<AppId>) -> WmResult<WindowId> {
        let app_id = app_id.into();
        match self.store.find_by_app(&app_id) {
            Some(id) => {
                self.leave_overview();
                self.focus(id)?;
                Ok(id)
            }
            None => self.open_app(app_id),
        }
    }

    /// Raise `id`. A minimized window is restored first.
    pub fn focus(&mut self, id: WindowId) -> WmResult<()> {
        let minimized = self.get(id)?.is_minimized();
        self.leave_overview();
        if minimized {
            self.restore_minimized(id)
        } else {
            self.raise(id);
            Ok(())
        }
    }

    /// Ask the application, then close. Valid from every lifecycle state and
    /// never blocked by an animation in flight.
    pub fn close_window(&mut self, id: WindowId) -> WmResult<CloseOutcome> {
        let window = self.get(id)?;
        if window.close_pending() {
            return Ok(CloseOutcome::Pending);
        }
        let app_id = window.app_id().clone();
        let verdict = match self.close_hooks.get_mut(&app_id) {
            Some(hook) => hook.can_close(id, &app_id),
            None => CloseVerdict::Allow,
        };
        match verdict {
            CloseVerdict::Allow => {
                self.finish_close(id);
                Ok(CloseOutcome::Closed)
            }
            CloseVerdict::Abort => {
                tracing::debug!(window_id = %id, app_id = %app_id, "close aborted by application");
                Ok(CloseOutcome::Aborted)
            }
            CloseVerdict::Defer => {
                if let Some(window) = self.store.get_mut(id) {
                    window.close_pending = true;
                }
                Ok(CloseOutcome::Pending)
            }
        }
    }

    /// Answer a deferred close. Returns `true` when the window was closed.
    /// Answers for windows that are gone or were not asking are ignored.
    pub fn resolve_close(&mut self, id: WindowId, allowed: bool) -> bool {
        let Some(window) = self.store.get_mut(id) else {
            tracing::trace!(window_id = %id, "ignoring close answer for missing window");
            return false;
        };
        if !window.close_pending {
            return false;
        }
        window.close_pending = false;
        if allowed {
            self.finish_close(id);
        }
        allowed
    }

    fn finish_close(&mut self, id: WindowId) {
        let Some(window) = self.store.remove(id) else {
            return;
        };
        let app_id = window.app_id;
        tracing::debug!(window_id = %id, app_id = %app_id, "closing window");
        self.snap.forget_window(id, &mut self.timers);
        if let Some(session) = self.overview.as_mut() {
            session.remove(id);
        }
        if self.gesture.is_some_and(|g| g.window() == id) {
            self.gesture = None;
        }
        self.events.push(WmEvent::WindowClosed {
            window: id,
            app_id: app_id.clone(),
        });
        if self.store.find_by_app(&app_id).is_none() {
            self.taskbar.app_stopped(&app_id);
            self.events.push(WmEvent::AppStopped { app_id });
        }
        self.sync_taskbar();
    }

    // ---- lifecycle ----

    pub fn toggle_minimize(&mut self, id: WindowId) -> WmResult<()> {
        if self.get(id)?.is_minimized() {
            self.restore_minimized(id)
        } else {
            self.minimize(id)
        }
    }

    /// Hide `id` behind its taskbar icon. The rectangle is kept as is.
    pub fn minimize(&mut self, id: WindowId) -> WmResult<()> {
        let window = self.get(id)?;
        if window.is_minimized() {
            return Ok(());
        }
        let target = self.icon_target(window.app_id());
        let window_center = window.bounds().center();
        let resume = window.saved_bounds();
        self.leave_overview();
        self.drop_gesture_for(id);
        self.snap.forget_window(id, &mut self.timers);

        if let Some(window) = self.store.get_mut(id) {
            window.lifecycle = Lifecycle::Minimized {
                anchor: MinimizeAnchor {
                    window_center,
                    target,
                },
                resume,
            };
        }
        tracing::debug!(window_id = %id, "minimized window");
        self.start_animation(
            id,
            AnimationHint::Minimize {
                from: window_center,
                to: target,
            },
            self.config.timings.minimize(),
        );
        self.sync_taskbar();
        Ok(())
    }

    /// Bring a minimized window back and focus it. The animation anchors are
    /// recomputed because the icon may have moved since minimizing.
    pub fn restore_minimized(&mut self, id: WindowId) -> WmResult<()> {
        let window = self.get(id)?;
        let Lifecycle::Minimized { resume, .. } = window.lifecycle() else {
            self.raise(id);
            return Ok(());
        };
        let from = self.icon_target(window.app_id());
        let maximized_rect = self.config.viewport.maximized_rect();
        let mut to = window.bounds().center();
        self.leave_overview();

        if let Some(window) = self.store.get_mut(id) {
            match resume {
                Some(saved) => {
                    window.bounds = maximized_rect;
                    window.lifecycle = Lifecycle::Maximized { saved };
                    to = maximized_rect.center();
                }
                None => window.lifecycle = Lifecycle::Normal,
            }
        }
        tracing::debug!(window_id = %id, "restored window");
        self.start_animation(
            id,
            AnimationHint::Restore { from, to },
            self.config.timings.restore(),
        );
        self.raise(id);
        self.sync_taskbar();
        Ok(())
    }

    /// Maximize a normal window, restore a maximized one. A minimized window
    /// comes back first and is maximized unless it already was.
    pub fn toggle_maximize(&mut self, id: WindowId) -> WmResult<()> {
        let window = self.get(id)?;
        if window.is_minimized() {
            self.restore_minimized(id)?;
            if self.get(id)?.is_maximized() {
                return Ok(());
            }
        }
        let lifecycle = self.get(id)?.lifecycle();
        match lifecycle {
            Lifecycle::Maximized { saved } => self.unmaximize(id, saved),
            _ => self.maximize(id),
        }
        Ok(())
    }

    fn maximize(&mut self, id: WindowId) {
        let rect = self.config.viewport.maximized_rect();
        self.leave_overview();
        self.drop_gesture_for(id);
        self.snap.forget_window(id, &mut self.timers);
        if let Some(window) = self.store.get_mut(id) {
            let saved = window.bounds;
            window.lifecycle = Lifecycle::Maximized { saved };
            window.bounds = rect;
            window.snap_layout = None;
            tracing::debug!(window_id = %id, ?saved, "maximized window");
        }
        self.start_animation(id, AnimationHint::Maximize, self.config.timings.maximize());
        self.raise(id);
        self.sync_taskbar();
    }

    fn unmaximize(&mut self, id: WindowId, saved: Bounds) {
        self.leave_overview();
        self.snap.forget_window(id, &mut self.timers);
        if let Some(window) = self.store.get_mut(id) {
            window.lifecycle = Lifecycle::Normal;
            window.bounds = saved;
        }
        tracing::debug!(window_id = %id, ?saved, "unmaximized window");
        self.start_animation(id, AnimationHint::Unmaximize, self.config.timings.maximize());
        self.raise(id);
        self.sync_taskbar();
        self.persist(id);
    }

    /// Fill `layout`'s region with `id`, leaving any maximized or minimized
    /// state behind.
    pub fn apply_snap_layout(&mut self, id: WindowId, layout: SnapLayout) -> WmResult<()> {
        self.get(id)?;
        self.leave_overview();
        self.snap.forget_window(id, &mut self.timers);
        let rect = snap_rect_in(layout, self.config.viewport);
        if let Some(window) = self.store.get_mut(id) {
            window.lifecycle = Lifecycle::Normal;
        }
        self.store.update_bounds(id, rect, Some(layout));
        tracing::debug!(window_id = %id, %layout, ?rect, "snapped window");
        self.start_animation(id, AnimationHint::Snap(layout), self.config.timings.snap());
        self.raise(id);
        self.sync_taskbar();
        self.persist(id);
        Ok(())
    }

    // ---- drag and resize ----

    /// Start moving `id` with the pointer at `pointer`. The window is
    /// focused; minimized and maximized windows do not move. Returns whether
    /// a drag started.
    pub fn begin_drag(&mut self, id: WindowId, pointer: Point) -> WmResult<bool> {
        let window = self.get(id)?;
        if self.overview.is_some() || window.is_minimized() {
            return Ok(false);
        }
        let maximized = window.is_maximized();
        let start = window.bounds();
        self.raise(id);
        if maximized {
            return Ok(false);
        }
        self.snap.hide_menu(&mut self.timers);
        self.gesture = Some(Gesture::Drag {
            window: id,
            grab: pointer,
            start,
        });
        Ok(true)
    }

    pub fn drag_move(&mut self, pointer: Point) {
        let Some(Gesture::Drag {
            window: id,
            grab,
            start,
        }) = self.gesture
        else {
            return;
        };
        let dx = (pointer.x - grab.x).round() as i32;
        let dy = (pointer.y - grab.y).round() as i32;
        let moved = start.translate(dx, dy);
        if let Some(window) = self.store.get_mut(id) {
            window.bounds = Bounds {
                top: moved.top.max(0),
                ..moved
            };
        }
        let viewport = self.config.viewport;
        self.snap.drag_update(id, pointer, viewport, &mut self.timers);
    }

    /// Release the dragged window: commit an armed snap layout, or keep the
    /// free position. Returns the committed layout.
    pub fn end_drag(&mut self) -> Option<SnapLayout> {
        let Some(Gesture::Drag { window: id, start, .. }) = self.gesture else {
            return None;
        };
        self.gesture = None;
        let armed = self.snap.drag_finish(&mut self.timers);
        let current = self.store.get(id)?.bounds();
        if let Some(layout) = armed {
            return self.apply_snap_layout(id, layout).ok().map(|_| layout);
        }
        if current != start {
            self.store.update_bounds(id, current, None);
        }
        self.persist(id);
        None
    }

    /// Start resizing `id` from `edge`. Only normal windows resize.
    pub fn begin_resize(&mut self, id: WindowId, edge: ResizeEdge, pointer: Point) -> WmResult<bool> {
        let window = self.get(id)?;
        if self.overview.is_some() || window.state() != LifecycleState::Normal {
            return Ok(false);
        }
        let start = window.bounds();
        self.raise(id);
        self.snap.reset(&mut self.timers);
        self.gesture = Some(Gesture::Resize {
            window: id,
            edge,
            grab: pointer,
            start,
        });
        Ok(true)
    }

    pub fn resize_move(&mut self, pointer: Point) {
        let Some(Gesture::Resize {
            window: id,
            edge,
            grab,
            start,
        }) = self.gesture
        else {
            return;
        };
        let dx = (pointer.x - grab.x).round() as i32;
        let dy = (pointer.y - grab.y).round() as i32;
        if let Some(window) = self.store.get_mut(id) {
            window.bounds = resize_bounds(start, edge, dx, dy);
        }
    }

    pub fn end_resize(&mut self) {
        let Some(Gesture::Resize { window: id, start, .. }) = self.gesture else {
            return;
        };
        self.gesture = None;
        let Some(current) = self.store.get(id).map(Window::bounds) else {
            return;
        };
        if current != start {
            self.store.update_bounds(id, current, None);
        }
        self.persist(id);
    }

    /// Pointer released: end whichever gesture is running.
    pub fn end_gesture(&mut self) -> Option<SnapLayout> {
        match self.gesture {
            Some(Gesture::Drag { .. }) => self.end_drag(),
            Some(Gesture::Resize { .. }) => {
                self.end_resize();
                None
            }
            None => None,
        }
    }

    fn drop_gesture_for(&mut self, id: WindowId) {
        if self.gesture.is_some_and(|g| g.window() == id) {
            self.gesture = None;
            self.snap.drag_finish(&mut self.timers);
        }
    }

    // ---- snap layout picker ----

    pub fn snap_control_enter(&mut self, id: WindowId) {
        let usable = self.store.get(id).is_some_and(|w| !w.is_minimized());
        if !usable || self.overview.is_some() || self.gesture.is_some() {
            return;
        }
        self.snap.hover_enter_control(id, &mut self.timers);
    }

    pub fn snap_control_leave(&mut self, id: WindowId) {
        self.snap.hover_leave_control(id, &mut self.timers);
    }

    pub fn snap_menu_enter(&mut self) {
        self.snap.hover_enter_menu(&mut self.timers);
    }

    pub fn snap_menu_leave(&mut self) {
        self.snap.hover_leave_menu(&mut self.timers);
    }

    /// Pick `layout` in the visible picker. Returns the snapped window.
    pub fn choose_snap_option(&mut self, layout: SnapLayout) -> WmResult<Option<WindowId>> {
        let Some(id) = self.snap.menu_window() else {
            return Ok(None);
        };
        self.snap.hide_menu(&mut self.timers);
        self.apply_snap_layout(id, layout)?;
        Ok(Some(id))
    }

    pub fn set_edge_snap_enabled(&mut self, enabled: bool) {
        self.config.edge_snap_on_drag = enabled;
        self.snap.set_edge_snap_enabled(enabled, &mut self.timers);
    }

    pub fn set_hover_menu_enabled(&mut self, enabled: bool) {
        self.config.hover_snap_menu = enabled;
        self.snap.set_hover_menu_enabled(enabled, &mut self.timers);
    }

    // ---- overview ----

    /// Show every non-minimized window as a preview in a grid. With nothing
    /// to show, a backdrop appears and closes itself shortly after.
    pub fn open_overview(&mut self) {
        if self.overview.is_some() {
            return;
        }
        self.gesture = None;
        self.snap.reset(&mut self.timers);

        self.cancel_pending_raise();

        let visible: Vec<(WindowId, Bounds)> = self
            .store
            .stacking_order()
            .into_iter()
            .filter_map(|id| self.store.get(id))
            .filter(|window| !window.is_minimized())
            .map(|window| (window.id(), window.bounds()))
            .collect();

        if visible.is_empty() {
            let dismiss_timer = self
                .timers
                .schedule(self.config.timings.overview_empty(), WmTask::DismissEmptyOverview);
            self.overview = Some(OverviewSession::Empty { dismiss_timer });
        } else {
            let session = OverviewSession::begin(&visible, self.config.viewport);
            for (id, _) in &visible {
                self.start_animation(
                    *id,
                    AnimationHint::OverviewEnter,
                    self.config.timings.overview(),
                );
            }
            self.overview = Some(session);
        }
        tracing::debug!(windows = visible.len(), "opened overview");
        self.events.push(WmEvent::OverviewOpened);
    }

    /// Dismiss without a selection: every window animates back.
    pub fn close_overview(&mut self) -> Option<OverviewExit> {
        self.end_overview(None)
    }

    /// Pick `id` in the overview: it animates back and is raised when the
    /// animation ends, the rest jump back without transitions.
    pub fn select_in_overview(&mut self, id: WindowId) -> Option<OverviewExit> {
        if !self.overview.as_ref()?.contains(id) {
            return None;
        }
        self.end_overview(Some(id))
    }

    /// A click while the overview is open: a preview selects its window,
    /// anything else dismisses.
    pub fn overview_click(&mut self, point: Point) -> Option<OverviewExit> {
        match self.overview.as_ref()?.window_at(point) {
            Some(id) => self.select_in_overview(id),
            None => self.close_overview(),
        }
    }

    fn end_overview(&mut self, selected: Option<WindowId>) -> Option<OverviewExit> {
        let session = self.overview.take()?;
        let exit = session.exit(selected);
        if let OverviewSession::Empty { dismiss_timer } = session {
            self.timers.cancel(dismiss_timer);
        }
        let duration = self.config.timings.overview();
        for id in &exit.animated {
            self.start_animation(*id, AnimationHint::OverviewReturn, duration);
        }
        for id in &exit.instant {
            if let Some(window) = self.store.get_mut(*id) {
                window.animation = None;
                window.animation_seq += 1;
                window.transitions_enabled = false;
            }
        }
        if let Some(id) = selected {
            let timer = self
                .timers
                .schedule(duration, WmTask::RaiseAfterOverview { window: id });
            self.pending_raise = Some(timer);
        }
        tracing::debug!(selected = ?selected, "closed overview");
        self.events.push(WmEvent::OverviewClosed { exit: exit.clone() });
        Some(exit)
    }

    fn leave_overview(&mut self) {
        if self.overview.is_some() {
            self.close_overview();
        }
    }

    // ---- frame, clock, viewport, taskbar ----

    /// One layout pass happened: windows that jumped back from the overview
    /// may animate again.
    pub fn end_frame(&mut self) {
        for window in self.store.iter_mut() {
            window.transitions_enabled = true;
        }
    }

    /// Advance the clock by `dt`, running every task that fell due.
    pub fn advance(&mut self, dt: Duration) {
        let until = self.timers.now().saturating_add(dt);
        while let Some(task) = self.timers.pop_due(until) {
            self.run_task(task);
        }
        self.timers.settle(until);
    }

    fn run_task(&mut self, task: WmTask) {
        match task {
            WmTask::FinishAnimation { window: id, seq } => match self.store.get_mut(id) {
                Some(window) if window.animation_seq == seq => window.animation = None,
                Some(_) => tracing::trace!(window_id = %id, seq, "superseded animation timer"),
                None => tracing::trace!(window_id = %id, "dropping animation timer for closed window"),
            },
            WmTask::ShowSnapMenu { window } => {
                if self.store.contains(window) {
                    self.snap.on_show_timer(window, &mut self.timers);
                }
            }
            WmTask::HideSnapMenu { window } => {
                self.snap.on_hide_timer(window);
            }
            WmTask::HideSnapPreview { window } => {
                self.snap.on_preview_hide_timer(window);
            }
            WmTask::DismissEmptyOverview => {
                if matches!(self.overview, Some(OverviewSession::Empty { .. })) {
                    self.end_overview(None);
                }
            }
            WmTask::RaiseAfterOverview { window } => {
                self.pending_raise = None;
                if self.store.contains(window) && self.overview.is_none() {
                    self.raise(window);
                } else {
                    tracing::trace!(window_id = %window, "skipping raise after overview");
                }
            }
        }
    }

    /// Resize the screen. Snapped and maximized windows follow their
    /// formulas; freely placed windows keep their rectangles.
    pub fn set_viewport(&mut self, viewport: Viewport) {
        if viewport == self.config.viewport {
            return;
        }
        self.config.viewport = viewport;
        self.taskbar.viewport_changed(viewport);
        let maximized = viewport.maximized_rect();
        for window in self.store.iter_mut() {
            match window.lifecycle {
                Lifecycle::Maximized { .. } | Lifecycle::Minimized { resume: Some(_), .. } => {
                    window.bounds = maximized;
                }
                _ => {
                    if let Some(layout) = window.snap_layout {
                        window.bounds = snap_rect_in(layout, viewport);
                    }
                }
            }
        }
        if let Some(session) = self.overview.as_mut() {
            session.relayout(viewport);
        }
        tracing::debug!(?viewport, "viewport changed");
    }

    /// Taskbar button behaviour: restore a minimized window, minimize the
    /// focused one, focus any other, open the app when it is not running.
    /// An open overview is dismissed first.
    pub fn activate_from_taskbar(&mut self, app_id: impl Into<AppId>) -> WmResult<WindowId> {
        let app_id = app_id.into();
        self.leave_overview();
        let Some(id) = self.store.find_by_app(&app_id) else {
            return self.open_app(app_id);
        };
        if self.get(id)?.is_minimized() {
            self.restore_minimized(id)?;
        } else if self.focused_window() == Some(id) {
            self.minimize(id)?;
        } else {
            self.raise(id);
        }
        Ok(id)
    }

    /// Hide the taskbar while any window is maximized.
    pub fn sync_taskbar(&mut self) {
        let visible = !self.store.any_maximized();
        if visible == self.taskbar_visible {
            return;
        }
        self.taskbar_visible = visible;
        self.taskbar.set_visible(visible);
        tracing::debug!(visible, "taskbar visibility changed");
        self.events.push(WmEvent::TaskbarVisibility { visible });
    }

    /// Remember the rectangle of a normal window.
    fn persist(&mut self, id: WindowId) {
        let Some(window) = self.store.get(id) else {
            return;
        };
        if window.state() != LifecycleState::Normal {
            return;
        }
        let app_id = window.app_id().clone();
        if self
            .bounds_memory
            .remember(&app_id, window.bounds(), window.snap_layout())
        {
            self.events.push(WmEvent::BoundsPersisted { app_id });
        }
    }

    // ---- helpers ----

    fn get(&self, id: WindowId) -> WmResult<&Window> {
        self.store.get(id).ok_or(WmError::WindowNotFound(id))
    }

    fn raise(&mut self, id: WindowId) {
        self.cancel_pending_raise();
        if self.store.raise(id) {
            self.events.push(WmEvent::WindowFocused { window: id });
        }
    }

    /// Any newer focus change wins over the raise queued by an overview
    /// selection.
    fn cancel_pending_raise(&mut self) {
        if let Some(timer) = self.pending_raise.take() {
            self.timers.cancel(timer);
            tracing::trace!("dropped raise after overview");
        }
    }

    fn icon_target(&self, app_id: &AppId) -> Point {
        self.taskbar
            .icon_rect(app_id)
            .map(|rect| rect.center())
            .unwrap_or_else(|| self.config.viewport.bottom_center())
    }

    fn start_animation(&mut self, id: WindowId, hint: AnimationHint, duration: Duration) {
        let Some(window) = self.store.get_mut(id) else {
            return;
        };
        window.animation_seq += 1;
        window.animation = Some(hint);
        let seq = window.animation_seq;
        self.timers
            .schedule(duration, WmTask::FinishAnimation { window: id, seq });
    }
}
