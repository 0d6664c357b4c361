pub mod board_view;
pub mod input_modal;
pub mod status_bar;
pub mod theme;

use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::Frame;

use crate::app::{AppState, Mode};
use crate::board::Board;
use crate::drag::Surface;

/// Create a centered rect within `area` using percentage-based sizing with minimums.
pub fn centered_rect(area: Rect, w_pct: u16, h_pct: u16, min_w: u16, min_h: u16) -> Rect {
    let scale = |len: u16, pct: u16| (u32::from(len) * u32::from(pct) / 100).min(u32::from(u16::MAX)) as u16;
    let width = scale(area.width, w_pct).max(min_w).min(area.width);
    let height = scale(area.height, h_pct).max(min_h).min(area.height);
    let x = area.x + (area.width - width) / 2;
    let y = area.y + (area.height - height) / 2;
    Rect::new(x, y, width, height)
}

/// Draw a frame. Returns the board geometry for the drag engine.
pub fn render(f: &mut Frame, board: &Board, state: &AppState) -> Surface {
    let full = f.area();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .split(full);

    let surface = board_view::render_board(f, chunks[0], board, state);
    status_bar::render_status_bar(f, chunks[1], state, board);

    match &state.mode {
        Mode::Space | Mode::Column => input_modal::render_hint_popup(f, chunks[0], &state.mode),
        Mode::Picker { title, items, selected, .. } => {
            input_modal::render_picker(f, chunks[0], title, items, *selected);
        }
        Mode::Help => input_modal::render_help(f, full),
        _ => {}
    }
    surface
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn centered_rect_respects_minimums_and_bounds() {
        let area = Rect::new(0, 0, 100, 40);
        let r = centered_rect(area, 10, 10, 30, 12);
        assert_eq!((r.width, r.height), (30, 12));
        assert_eq!((r.x, r.y), (35, 14));
        let big = centered_rect(area, 50, 50, 500, 500);
        assert_eq!(big, area);
    }

    #[test]
    fn centered_rect_handles_wide_terminals() {
        // 1200 * 60 does not fit in a u16
        let area = Rect::new(0, 0, 1200, 50);
        let r = centered_rect(area, 60, 80, 44, 20);
        assert_eq!((r.width, r.height), (720, 40));
        assert_eq!((r.x, r.y), (240, 5));
    }
}
