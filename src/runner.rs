//! Glue between terminal input and the window manager for the demo binary.

use std::io;
use std::time::Duration;

use crossterm::event::{Event, KeyCode, KeyEvent, MouseButton, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;

use crate::drivers::{InputDriver, OutputDriver};
use crate::event_loop::{ControlFlow, EventLoop, LoopEvent};
use crate::geometry::ResizeEdge;
use crate::tracing_sub;
use crate::ui::{
    CellScale, TitleControl, UiFrame, on_title_bar, render_desktop, snap_menu_option_at,
    snap_menu_rect, title_control_at,
};
use crate::window::{AppId, WindowId, WindowManager};

pub struct Desktop {
    wm: WindowManager,
    scale: CellScale,
    launchers: Vec<AppId>,
    hovered_control: Option<WindowId>,
    over_menu: bool,
}

impl Desktop {
    /// `launchers` are bound to the number keys, in order.
    pub fn new(wm: WindowManager, launchers: Vec<AppId>) -> Self {
        let scale = CellScale::new(Rect::new(0, 0, 80, 24), wm.viewport());
        Self {
            wm,
            scale,
            launchers,
            hovered_control: None,
            over_menu: false,
        }
    }

    pub fn wm(&self) -> &WindowManager {
        &self.wm
    }

    pub fn wm_mut(&mut self) -> &mut WindowManager {
        &mut self.wm
    }

    /// Terminal area the desktop is drawn into.
    pub fn set_area(&mut self, area: Rect) {
        self.scale = CellScale::new(area, self.wm.viewport());
    }

    pub fn tick(&mut self, elapsed: Duration) {
        self.wm.advance(elapsed);
        for event in self.wm.take_events() {
            tracing::debug!(?event, "wm event");
        }
    }

    pub fn render(&mut self, mut frame: UiFrame<'_>) {
        self.set_area(frame.area());
        render_desktop(&mut frame, &self.wm, &self.scale);
        self.wm.end_frame();
    }

    pub fn handle_event(&mut self, event: &Event) -> ControlFlow {
        match event {
            Event::Key(key) => self.handle_key(key),
            Event::Mouse(mouse) => {
                self.handle_mouse(mouse);
                ControlFlow::Continue
            }
            _ => ControlFlow::Continue,
        }
    }

    fn handle_key(&mut self, key: &KeyEvent) -> ControlFlow {
        let focused = self.wm.focused_window();
        let result = match key.code {
            KeyCode::Char('q') => return ControlFlow::Quit,
            KeyCode::Char(c @ '1'..='9') => {
                let idx = (c as usize) - ('1' as usize);
                match self.launchers.get(idx).cloned() {
                    Some(app_id) => self.wm.focus_app(app_id).map(|_| ()),
                    None => Ok(()),
                }
            }
            KeyCode::Char('m') => focused.map_or(Ok(()), |id| self.wm.toggle_minimize(id)),
            KeyCode::Char('x') => focused.map_or(Ok(()), |id| self.wm.toggle_maximize(id)),
            KeyCode::Char('w') => focused.map_or(Ok(()), |id| self.wm.close_window(id).map(|_| ())),
            KeyCode::Tab => {
                if self.wm.overview_open() {
                    self.wm.close_overview();
                } else {
                    self.wm.open_overview();
                }
                Ok(())
            }
            KeyCode::Esc => {
                self.wm.close_overview();
                Ok(())
            }
            _ => Ok(()),
        };
        if let Err(err) = result {
            tracing::warn!(error = %err, "key action failed");
        }
        ControlFlow::Continue
    }

    fn handle_mouse(&mut self, mouse: &MouseEvent) {
        let (col, row) = (mouse.column, mouse.row);
        let point = self.scale.to_point(col, row);
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                if let Err(err) = self.pointer_down(col, row) {
                    tracing::warn!(error = %err, "pointer action failed");
                }
            }
            MouseEventKind::Drag(MouseButton::Left) => {
                self.wm.drag_move(point);
                self.wm.resize_move(point);
            }
            MouseEventKind::Up(MouseButton::Left) => {
                self.wm.end_gesture();
            }
            MouseEventKind::Moved => self.pointer_moved(col, row),
            _ => {}
        }
    }

    fn pointer_down(&mut self, col: u16, row: u16) -> crate::error::WmResult<()> {
        let point = self.scale.to_point(col, row);
        if self.wm.overview_open() {
            self.wm.overview_click(point);
            return Ok(());
        }
        if let Some(menu) = self.menu_rect()
            && menu.contains((col, row).into())
        {
            if let Some(layout) = snap_menu_option_at(menu, col, row) {
                self.wm.choose_snap_option(layout)?;
            }
            return Ok(());
        }
        if let Some(app_id) = self.taskbar_app_at(col, row) {
            self.wm.activate_from_taskbar(app_id)?;
            return Ok(());
        }

        let Some((id, rect)) = self.window_at(col, row) else {
            return Ok(());
        };
        let Some(bounds) = self.wm.window(id).map(|w| w.bounds()) else {
            return Ok(());
        };
        match title_control_at(&self.scale, bounds, col, row) {
            Some(TitleControl::Minimize) => return self.wm.toggle_minimize(id),
            Some(TitleControl::Maximize) => return self.wm.toggle_maximize(id),
            Some(TitleControl::Close) => return self.wm.close_window(id).map(|_| ()),
            None => {}
        }
        if on_title_bar(&self.scale, bounds, col, row) {
            self.wm.begin_drag(id, point)?;
        } else if let Some(edge) = border_edge(rect, col, row) {
            self.wm.begin_resize(id, edge, point)?;
        } else {
            self.wm.focus(id)?;
        }
        Ok(())
    }

    fn pointer_moved(&mut self, col: u16, row: u16) {
        let control = self.window_at(col, row).and_then(|(id, _)| {
            let bounds = self.wm.window(id)?.bounds();
            (title_control_at(&self.scale, bounds, col, row) == Some(TitleControl::Maximize))
                .then_some(id)
        });
        if control != self.hovered_control {
            if let Some(previous) = self.hovered_control {
                self.wm.snap_control_leave(previous);
            }
            if let Some(id) = control {
                self.wm.snap_control_enter(id);
            }
            self.hovered_control = control;
        }

        let over_menu = self
            .menu_rect()
            .is_some_and(|menu| menu.contains((col, row).into()));
        if over_menu != self.over_menu {
            if over_menu {
                self.wm.snap_menu_enter();
            } else {
                self.wm.snap_menu_leave();
            }
            self.over_menu = over_menu;
        }
    }

    fn menu_rect(&self) -> Option<Rect> {
        let id = self.wm.snap_menu()?;
        let bounds = self.wm.window(id)?.bounds();
        Some(snap_menu_rect(&self.scale, bounds))
    }

    /// Frontmost visible window whose cells contain `(col, row)`.
    fn window_at(&self, col: u16, row: u16) -> Option<(WindowId, Rect)> {
        self.wm
            .windows()
            .into_iter()
            .rev()
            .filter(|view| view.visible && !view.in_overview)
            .filter_map(|view| Some((view.id, self.scale.to_cells(view.bounds)?)))
            .find(|(_, rect)| rect.contains((col, row).into()))
    }

    fn taskbar_app_at(&self, col: u16, row: u16) -> Option<AppId> {
        if !self.wm.taskbar_visible() {
            return None;
        }
        let area = self.scale.area();
        if row < area.bottom().saturating_sub(self.scale.taskbar_rows()) {
            return None;
        }
        self.wm.windows().into_iter().find_map(|view| {
            let icon = self.wm.taskbar().icon_rect(&view.app_id)?;
            let cells = self.scale.to_cells(icon)?;
            (col >= cells.x && col < cells.right()).then_some(view.app_id)
        })
    }
}

/// Resize edge for a pointer on the window's left, right or bottom border.
/// The top border is the title bar.
fn border_edge(rect: Rect, col: u16, row: u16) -> Option<ResizeEdge> {
    let left = col == rect.x;
    let right = col + 1 == rect.right();
    let bottom = row + 1 == rect.bottom();
    match (left, right, bottom) {
        (true, _, true) => Some(ResizeEdge::BottomLeft),
        (_, true, true) => Some(ResizeEdge::BottomRight),
        (true, _, false) => Some(ResizeEdge::Left),
        (_, true, false) => Some(ResizeEdge::Right),
        (false, false, true) => Some(ResizeEdge::Bottom),
        _ => None,
    }
}

/// Run the desktop until the user quits. The terminal is restored on the way
/// out even when the loop fails.
pub fn run_desktop<I, O>(
    input: &mut I,
    output: &mut O,
    desktop: &mut Desktop,
    poll_interval: Duration,
) -> io::Result<()>
where
    I: InputDriver,
    O: OutputDriver,
{
    output.enter()?;
    tracing_sub::set_tui_active(true);
    let result = pump(input, output, desktop, poll_interval);
    tracing_sub::set_tui_active(false);
    output.exit()?;
    result
}

fn pump<I, O>(
    input: &mut I,
    output: &mut O,
    desktop: &mut Desktop,
    poll_interval: Duration,
) -> io::Result<()>
where
    I: InputDriver,
    O: OutputDriver,
{
    let mut event_loop = EventLoop::new(input, poll_interval);
    event_loop.driver().set_mouse_capture(true)?;
    event_loop.run(|_, event| match event {
        LoopEvent::Tick(elapsed) => {
            desktop.tick(elapsed);
            output.draw(|frame| desktop.render(frame))?;
            Ok(ControlFlow::Continue)
        }
        LoopEvent::Input(event) => Ok(desktop.handle_event(&event)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WmConfig;
    use crate::geometry::{Bounds, SnapLayout, Viewport};
    use crate::persistence::MemorySettings;
    use crate::registry::{AppInfo, StaticRegistry};
    use crate::window::LifecycleState;
    use crossterm::event::KeyModifiers;

    fn desktop() -> Desktop {
        let registry = StaticRegistry::new()
            .with_app("notes", AppInfo::new("Notes", 720, 540))
            .with_app("clock", AppInfo::new("Clock", 480, 360));
        let config = WmConfig {
            viewport: Viewport::new(1920, 1080, 40),
            ..WmConfig::default()
        };
        let wm = WindowManager::new(config, registry, MemorySettings::new());
        let mut desktop = Desktop::new(wm, vec![AppId::from("notes"), AppId::from("clock")]);
        desktop.set_area(Rect::new(0, 0, 192, 54));
        desktop
    }

    fn key(c: char) -> Event {
        Event::Key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE))
    }

    fn mouse(kind: MouseEventKind, column: u16, row: u16) -> Event {
        Event::Mouse(MouseEvent {
            kind,
            column,
            row,
            modifiers: KeyModifiers::NONE,
        })
    }

    #[test]
    fn keys_drive_lifecycle() {
        let mut d = desktop();
        d.handle_event(&key('1'));
        let notes = d.wm().focused_window().unwrap();
        d.handle_event(&key('x'));
        assert_eq!(d.wm().window(notes).unwrap().state(), LifecycleState::Maximized);
        d.handle_event(&key('m'));
        assert_eq!(d.wm().window(notes).unwrap().state(), LifecycleState::Minimized);
        d.handle_event(&key('1'));
        assert_eq!(d.wm().focused_window(), Some(notes));
        d.handle_event(&key('w'));
        assert_eq!(d.wm().window_count(), 0);
        assert!(matches!(d.handle_event(&key('q')), ControlFlow::Quit));
    }

    #[test]
    fn title_drag_to_corner_snaps() {
        let mut d = desktop();
        d.handle_event(&key('1'));
        let notes = d.wm().focused_window().unwrap();
        // title row of a 720x540 window centered above a 40px taskbar
        d.handle_event(&mouse(MouseEventKind::Down(MouseButton::Left), 70, 13));
        assert!(d.wm().gesture_active());
        d.handle_event(&mouse(MouseEventKind::Drag(MouseButton::Left), 0, 0));
        assert!(d.wm().snap_preview().is_some());
        d.handle_event(&mouse(MouseEventKind::Up(MouseButton::Left), 0, 0));
        let window = d.wm().window(notes).unwrap();
        assert_eq!(window.snap_layout(), Some(SnapLayout::TopLeft));
        assert_eq!(window.bounds(), Bounds::new(0, 0, 960, 520));
    }

    #[test]
    fn tab_toggles_overview() {
        let mut d = desktop();
        d.handle_event(&key('1'));
        d.handle_event(&Event::Key(KeyEvent::new(KeyCode::Tab, KeyModifiers::NONE)));
        assert!(d.wm().overview_open());
        d.handle_event(&Event::Key(KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE)));
        assert!(!d.wm().overview_open());
    }

    #[test]
    fn border_edges() {
        let rect = Rect::new(10, 5, 20, 10);
        assert_eq!(border_edge(rect, 10, 8), Some(ResizeEdge::Left));
        assert_eq!(border_edge(rect, 29, 8), Some(ResizeEdge::Right));
        assert_eq!(border_edge(rect, 15, 14), Some(ResizeEdge::Bottom));
        assert_eq!(border_edge(rect, 29, 14), Some(ResizeEdge::BottomRight));
        assert_eq!(border_edge(rect, 15, 8), None);
    }
}
