//! Terminal rendering of the desktop.
//!
//! The window manager works in virtual pixels; the terminal has cells. A
//! [`CellScale`] maps between the two, and [`UiFrame`] clips every draw to
//! the visible buffer because windows are allowed to hang off the left,
//! right and bottom edges of the screen.

use ratatui::Frame;
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, BorderType, Borders, Clear, Widget};

use crate::geometry::{Bounds, Point, SnapLayout, Viewport};
use crate::window::{AnimationHint, LifecycleState, WindowManager, WindowView};

/// Mapping between viewport pixels and terminal cells.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellScale {
    area: Rect,
    viewport: Viewport,
}

impl CellScale {
    pub fn new(area: Rect, viewport: Viewport) -> Self {
        Self { area, viewport }
    }

    pub fn area(&self) -> Rect {
        self.area
    }

    fn px_per_col(&self) -> f64 {
        self.viewport.width as f64 / self.area.width.max(1) as f64
    }

    fn px_per_row(&self) -> f64 {
        self.viewport.height as f64 / self.area.height.max(1) as f64
    }

    /// Center of the cell at `(col, row)` in viewport pixels.
    pub fn to_point(&self, col: u16, row: u16) -> Point {
        let col = col.saturating_sub(self.area.x) as f64;
        let row = row.saturating_sub(self.area.y) as f64;
        Point::new(
            (col + 0.5) * self.px_per_col(),
            (row + 0.5) * self.px_per_row(),
        )
    }

    /// Cells covered by `bounds`, clipped to the terminal. `None` when the
    /// rectangle is entirely off screen.
    pub fn to_cells(&self, bounds: Bounds) -> Option<Rect> {
        let x0 = (bounds.left as f64 / self.px_per_col()).round() as i64;
        let y0 = (bounds.top as f64 / self.px_per_row()).round() as i64;
        let x1 = (bounds.right() as f64 / self.px_per_col()).round() as i64;
        let y1 = (bounds.bottom() as f64 / self.px_per_row()).round() as i64;
        let max_x = self.area.width as i64;
        let max_y = self.area.height as i64;
        let (cx0, cy0) = (x0.clamp(0, max_x), y0.clamp(0, max_y));
        let (cx1, cy1) = (x1.clamp(0, max_x), y1.clamp(0, max_y));
        if cx1 <= cx0 || cy1 <= cy0 {
            return None;
        }
        Some(Rect::new(
            self.area.x + cx0 as u16,
            self.area.y + cy0 as u16,
            (cx1 - cx0) as u16,
            (cy1 - cy0) as u16,
        ))
    }

    /// Unclipped cell origin of `bounds`; title bar controls hang off it.
    fn origin(&self, bounds: Bounds) -> (i64, i64) {
        (
            (bounds.left as f64 / self.px_per_col()).round() as i64 + self.area.x as i64,
            (bounds.top as f64 / self.px_per_row()).round() as i64 + self.area.y as i64,
        )
    }

    fn unclipped_right(&self, bounds: Bounds) -> i64 {
        (bounds.right() as f64 / self.px_per_col()).round() as i64 + self.area.x as i64
    }

    /// Rows at the bottom taken by the taskbar.
    pub fn taskbar_rows(&self) -> u16 {
        let rows = (self.viewport.taskbar_reserved as f64 / self.px_per_row()).round() as u16;
        rows.clamp(1, self.area.height.max(1))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TitleControl {
    Minimize,
    Maximize,
    Close,
}

impl TitleControl {
    fn glyph(self) -> &'static str {
        match self {
            TitleControl::Minimize => "_",
            TitleControl::Maximize => "□",
            TitleControl::Close => "x",
        }
    }

    /// Column offset from the window's right edge.
    fn offset(self) -> i64 {
        match self {
            TitleControl::Minimize => 4,
            TitleControl::Maximize => 3,
            TitleControl::Close => 2,
        }
    }
}

/// Title bar control of `bounds` under the cell `(col, row)`.
pub fn title_control_at(scale: &CellScale, bounds: Bounds, col: u16, row: u16) -> Option<TitleControl> {
    let (_, top) = scale.origin(bounds);
    if row as i64 != top {
        return None;
    }
    let right = scale.unclipped_right(bounds);
    [TitleControl::Minimize, TitleControl::Maximize, TitleControl::Close]
        .into_iter()
        .find(|control| right - control.offset() == col as i64)
}

/// The cell row a window's title sits on, if `(col, row)` is on it.
pub fn on_title_bar(scale: &CellScale, bounds: Bounds, col: u16, row: u16) -> bool {
    let (left, top) = scale.origin(bounds);
    let right = scale.unclipped_right(bounds);
    row as i64 == top && (col as i64) >= left && (col as i64) < right
}

const MENU_WIDTH: u16 = 22;

/// Popup area of the snap layout picker opened from `bounds`' maximize
/// control.
pub fn snap_menu_rect(scale: &CellScale, bounds: Bounds) -> Rect {
    let area = scale.area();
    let height = SnapLayout::ALL.len() as u16 + 2;
    let control_col = scale.unclipped_right(bounds) - TitleControl::Maximize.offset();
    let (_, top) = scale.origin(bounds);
    let max_x = area.right().saturating_sub(MENU_WIDTH) as i64;
    let max_y = area.bottom().saturating_sub(height) as i64;
    let x = (control_col - MENU_WIDTH as i64 / 2).clamp(area.x as i64, max_x.max(area.x as i64));
    let y = (top + 1).clamp(area.y as i64, max_y.max(area.y as i64));
    Rect::new(x as u16, y as u16, MENU_WIDTH, height).intersection(area)
}

/// Layout listed on the picker row under `(col, row)`.
pub fn snap_menu_option_at(menu: Rect, col: u16, row: u16) -> Option<SnapLayout> {
    let inner = Rect::new(
        menu.x.saturating_add(1),
        menu.y.saturating_add(1),
        menu.width.saturating_sub(2),
        menu.height.saturating_sub(2),
    );
    if !inner.contains((col, row).into()) {
        return None;
    }
    SnapLayout::ALL.get((row - inner.y) as usize).copied()
}

/// Wrapper around a frame buffer that clips drawing to the visible area.
pub struct UiFrame<'a> {
    area: Rect,
    buffer: &'a mut Buffer,
}

impl<'a> UiFrame<'a> {
    pub fn new(frame: &'a mut Frame<'_>) -> Self {
        let area = frame.area();
        let buffer = frame.buffer_mut();
        Self { area, buffer }
    }

    pub fn from_parts(area: Rect, buffer: &'a mut Buffer) -> Self {
        Self { area, buffer }
    }

    pub fn area(&self) -> Rect {
        self.area
    }

    pub fn render_widget<W: Widget>(&mut self, widget: W, area: Rect) {
        let clipped = area.intersection(self.area);
        if clipped.width > 0 && clipped.height > 0 {
            widget.render(clipped, self.buffer);
        }
    }

    /// Write `text` at `(x, y)`, truncated at the right edge of `bounds`.
    pub fn set_string(&mut self, bounds: Rect, x: u16, y: u16, text: &str, style: Style) {
        let bounds = bounds.intersection(self.area);
        if x < bounds.x || x >= bounds.right() || y < bounds.y || y >= bounds.bottom() {
            return;
        }
        let available = (bounds.right() - x) as usize;
        let text: String = text.chars().take(available).collect();
        self.buffer.set_string(x, y, text, style);
    }
}

/// Draw the whole desktop: windows back-to-front, the drag preview, the
/// snap picker and the taskbar strip.
pub fn render_desktop(frame: &mut UiFrame<'_>, wm: &WindowManager, scale: &CellScale) {
    let area = scale.area();
    frame.render_widget(Clear, area);

    let views = wm.windows();
    if wm.overview_open() {
        frame.render_widget(
            Block::default().style(Style::default().bg(Color::Rgb(20, 20, 28))),
            area,
        );
    }
    for view in views.iter().filter(|view| view.visible) {
        render_window(frame, view, scale);
    }

    if let Some(preview) = wm.snap_preview()
        && let Some(rect) = scale.to_cells(preview.rect)
    {
        frame.render_widget(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Double)
                .border_style(Style::default().fg(Color::Cyan)),
            rect,
        );
    }

    if let Some(id) = wm.snap_menu()
        && let Some(window) = wm.window(id)
    {
        let menu = snap_menu_rect(scale, window.bounds());
        frame.render_widget(Clear, menu);
        frame.render_widget(
            Block::default()
                .borders(Borders::ALL)
                .title(" snap ")
                .border_style(Style::default().fg(Color::Cyan)),
            menu,
        );
        for (idx, layout) in SnapLayout::ALL.iter().enumerate() {
            let y = menu.y + 1 + idx as u16;
            frame.set_string(menu, menu.x + 2, y, layout.as_str(), Style::default());
        }
    }

    if wm.taskbar_visible() {
        render_taskbar(frame, wm, scale);
    }
}

fn render_window(frame: &mut UiFrame<'_>, view: &WindowView, scale: &CellScale) {
    let Some(rect) = scale.to_cells(view.bounds) else {
        return;
    };
    let mut border = Style::default().fg(Color::Gray);
    if view.focused {
        border = border.fg(Color::White).add_modifier(Modifier::BOLD);
    }
    match view.animation {
        Some(AnimationHint::Minimize { .. }) => border = border.fg(Color::DarkGray),
        Some(_) if view.transitions_enabled => border = border.fg(Color::Yellow),
        _ => {}
    }
    let marker = match view.state {
        LifecycleState::Maximized => " [max]",
        _ if view.snap_layout.is_some() => " [snap]",
        _ => "",
    };
    frame.render_widget(Clear, rect);
    frame.render_widget(
        Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(border)
            .title(format!(" {}{marker} ", view.title)),
        rect,
    );

    if view.in_overview {
        return;
    }
    let right = scale.unclipped_right(view.bounds);
    for control in [TitleControl::Minimize, TitleControl::Maximize, TitleControl::Close] {
        let col = right - control.offset();
        if col >= rect.x as i64 && col < rect.right() as i64 {
            frame.set_string(rect, col as u16, rect.y, control.glyph(), border);
        }
    }
}

fn render_taskbar(frame: &mut UiFrame<'_>, wm: &WindowManager, scale: &CellScale) {
    let area = scale.area();
    let rows = scale.taskbar_rows();
    let strip = Rect::new(area.x, area.bottom().saturating_sub(rows), area.width, rows);
    frame.render_widget(
        Block::default().style(Style::default().bg(Color::Rgb(32, 32, 40))),
        strip,
    );
    let focused = wm.focused_window();
    for view in wm.windows() {
        let Some(icon) = wm.taskbar().icon_rect(&view.app_id) else {
            continue;
        };
        let Some(cells) = scale.to_cells(icon) else {
            continue;
        };
        let mut style = Style::default().fg(Color::Gray);
        if Some(view.id) == focused {
            style = style.fg(Color::White).add_modifier(Modifier::BOLD);
        } else if view.state == LifecycleState::Minimized {
            style = style.add_modifier(Modifier::DIM);
        }
        let label: String = view.app_id.as_str().chars().take(cells.width as usize).collect();
        frame.set_string(strip, cells.x, strip.y + strip.height / 2, &label, style);
    }
}
