//! Snap interaction state machine.
//!
//! Two affordances propose a snap layout: the layout picker that appears
//! after resting on a window's maximize control, and the outline preview
//! shown while a window is dragged against a screen edge or corner. At most
//! one of them is visible at any time. Delays run on the manager's
//! [`Scheduler`]; this module only decides what to schedule and cancel.

use std::time::Duration;

use crate::geometry::{Bounds, Point, SnapLayout, Viewport, edge_hit, snap_rect_in};
use crate::timer::{Scheduler, TimerHandle};
use crate::window::{WindowId, WmTask};

/// The outline drawn while a drag proposes a layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapPreview {
    pub window: WindowId,
    pub layout: SnapLayout,
    pub rect: Bounds,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MenuState {
    Hidden,
    /// Pointer is resting on the control; the picker shows when `timer` fires.
    Pending { window: WindowId, timer: TimerHandle },
    Visible {
        window: WindowId,
        hide_timer: Option<TimerHandle>,
    },
}

#[derive(Debug, Default)]
struct PreviewState {
    /// Layout committed if the drag ends now.
    armed: Option<SnapLayout>,
    /// Outline still on screen; may outlive `armed` by the hide delay.
    shown: Option<SnapPreview>,
    hide_timer: Option<TimerHandle>,
}

#[derive(Debug)]
pub struct SnapInteraction {
    edge_snap_enabled: bool,
    hover_menu_enabled: bool,
    show_delay: Duration,
    hide_delay: Duration,
    preview_hide_delay: Duration,
    menu: MenuState,
    preview: PreviewState,
}

impl SnapInteraction {
    pub fn new(
        edge_snap_enabled: bool,
        hover_menu_enabled: bool,
        show_delay: Duration,
        hide_delay: Duration,
        preview_hide_delay: Duration,
    ) -> Self {
        Self {
            edge_snap_enabled,
            hover_menu_enabled,
            show_delay,
            hide_delay,
            preview_hide_delay,
            menu: MenuState::Hidden,
            preview: PreviewState::default(),
        }
    }

    pub fn edge_snap_enabled(&self) -> bool {
        self.edge_snap_enabled
    }

    pub fn hover_menu_enabled(&self) -> bool {
        self.hover_menu_enabled
    }

    /// Window whose layout picker is currently on screen.
    pub fn menu_window(&self) -> Option<WindowId> {
        match self.menu {
            MenuState::Visible { window, .. } => Some(window),
            _ => None,
        }
    }

    /// Window whose picker is waiting for its show delay.
    pub fn menu_pending(&self) -> Option<WindowId> {
        match self.menu {
            MenuState::Pending { window, .. } => Some(window),
            _ => None,
        }
    }

    pub fn preview(&self) -> Option<SnapPreview> {
        self.preview.shown
    }

    pub fn armed(&self) -> Option<SnapLayout> {
        self.preview.armed
    }

    pub fn hover_enter_control(&mut self, window: WindowId, timers: &mut Scheduler<WmTask>) {
        if !self.hover_menu_enabled {
            return;
        }
        match self.menu {
            MenuState::Visible {
                window: current,
                hide_timer,
            } if current == window => {
                if let Some(timer) = hide_timer {
                    timers.cancel(timer);
                }
                self.menu = MenuState::Visible {
                    window,
                    hide_timer: None,
                };
            }
            MenuState::Pending { window: current, .. } if current == window => {}
            _ => {
                self.hide_menu(timers);
                let timer = timers.schedule(self.show_delay, WmTask::ShowSnapMenu { window });
                self.menu = MenuState::Pending { window, timer };
            }
        }
    }

    pub fn hover_leave_control(&mut self, window: WindowId, timers: &mut Scheduler<WmTask>) {
        match self.menu {
            MenuState::Pending {
                window: current,
                timer,
            } if current == window => {
                timers.cancel(timer);
                self.menu = MenuState::Hidden;
            }
            MenuState::Visible {
                window: current,
                hide_timer: None,
            } if current == window => self.schedule_menu_hide(window, timers),
            _ => {}
        }
    }

    /// Pointer moved onto the picker: keep it open.
    pub fn hover_enter_menu(&mut self, timers: &mut Scheduler<WmTask>) {
        if let MenuState::Visible {
            window,
            hide_timer: Some(timer),
        } = self.menu
        {
            timers.cancel(timer);
            self.menu = MenuState::Visible {
                window,
                hide_timer: None,
            };
        }
    }

    pub fn hover_leave_menu(&mut self, timers: &mut Scheduler<WmTask>) {
        if let MenuState::Visible {
            window,
            hide_timer: None,
        } = self.menu
        {
            self.schedule_menu_hide(window, timers);
        }
    }

    /// Show delay elapsed. Returns `true` when the picker became visible.
    pub fn on_show_timer(&mut self, window: WindowId, timers: &mut Scheduler<WmTask>) -> bool {
        match self.menu {
            MenuState::Pending { window: current, .. } if current == window => {
                self.clear_preview(timers);
                self.menu = MenuState::Visible {
                    window,
                    hide_timer: None,
                };
                true
            }
            _ => false,
        }
    }

    /// Hide grace period elapsed. Returns `true` when the picker went away.
    pub fn on_hide_timer(&mut self, window: WindowId) -> bool {
        match self.menu {
            MenuState::Visible {
                window: current,
                hide_timer: Some(_),
            } if current == window => {
                self.menu = MenuState::Hidden;
                true
            }
            _ => false,
        }
    }

    /// Close the picker immediately, dropping any pending show or hide.
    pub fn hide_menu(&mut self, timers: &mut Scheduler<WmTask>) {
        match self.menu {
            MenuState::Pending { timer, .. }
            | MenuState::Visible {
                hide_timer: Some(timer),
                ..
            } => {
                timers.cancel(timer);
            }
            _ => {}
        }
        self.menu = MenuState::Hidden;
    }

    /// Track a dragged pointer. A hit on an edge or corner arms that layout
    /// and shows its outline at once; leaving every zone disarms and hides
    /// the outline after a short delay.
    pub fn drag_update(
        &mut self,
        window: WindowId,
        pointer: Point,
        viewport: Viewport,
        timers: &mut Scheduler<WmTask>,
    ) {
        if !self.edge_snap_enabled {
            return;
        }
        match edge_hit(pointer.x, pointer.y, viewport.width, viewport.height) {
            Some(layout) => {
                self.hide_menu(timers);
                if let Some(timer) = self.preview.hide_timer.take() {
                    timers.cancel(timer);
                }
                self.preview.armed = Some(layout);
                self.preview.shown = Some(SnapPreview {
                    window,
                    layout,
                    rect: snap_rect_in(layout, viewport),
                });
            }
            None => {
                self.preview.armed = None;
                if self.preview.shown.is_some() && self.preview.hide_timer.is_none() {
                    let timer = timers
                        .schedule(self.preview_hide_delay, WmTask::HideSnapPreview { window });
                    self.preview.hide_timer = Some(timer);
                }
            }
        }
    }

    /// The drag ended. Returns the layout to commit, if one was armed and
    /// drag snapping is enabled; the outline is gone either way.
    pub fn drag_finish(&mut self, timers: &mut Scheduler<WmTask>) -> Option<SnapLayout> {
        let armed = self.preview.armed.filter(|_| self.edge_snap_enabled);
        self.clear_preview(timers);
        armed
    }

    /// Returns `true` when the outline was hidden.
    pub fn on_preview_hide_timer(&mut self, window: WindowId) -> bool {
        let matches = self
            .preview
            .shown
            .is_some_and(|preview| preview.window == window);
        if matches && self.preview.hide_timer.is_some() && self.preview.armed.is_none() {
            self.preview = PreviewState::default();
            return true;
        }
        false
    }

    pub fn set_edge_snap_enabled(&mut self, enabled: bool, timers: &mut Scheduler<WmTask>) {
        self.edge_snap_enabled = enabled;
        if !enabled {
            self.clear_preview(timers);
        }
    }

    pub fn set_hover_menu_enabled(&mut self, enabled: bool, timers: &mut Scheduler<WmTask>) {
        self.hover_menu_enabled = enabled;
        if !enabled {
            self.hide_menu(timers);
        }
    }

    /// Drop every affordance that refers to `window`.
    pub fn forget_window(&mut self, window: WindowId, timers: &mut Scheduler<WmTask>) {
        let menu_window = match self.menu {
            MenuState::Pending { window, .. } | MenuState::Visible { window, .. } => Some(window),
            MenuState::Hidden => None,
        };
        if menu_window == Some(window) {
            self.hide_menu(timers);
        }
        if self
            .preview
            .shown
            .is_some_and(|preview| preview.window == window)
        {
            self.clear_preview(timers);
        }
    }

    /// Hide both affordances immediately.
    pub fn reset(&mut self, timers: &mut Scheduler<WmTask>) {
        self.hide_menu(timers);
        self.clear_preview(timers);
    }

    fn schedule_menu_hide(&mut self, window: WindowId, timers: &mut Scheduler<WmTask>) {
        let timer = timers.schedule(self.hide_delay, WmTask::HideSnapMenu { window });
        self.menu = MenuState::Visible {
            window,
            hide_timer: Some(timer),
        };
    }

    fn clear_preview(&mut self, timers: &mut Scheduler<WmTask>) {
        if let Some(timer) = self.preview.hide_timer.take() {
            timers.cancel(timer);
        }
        self.preview = PreviewState::default();
    }
}
