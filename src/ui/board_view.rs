use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Clear, Paragraph};
use ratatui::Frame;
use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthStr;

use super::theme::Theme;
use crate::app::AppState;
use crate::board::{Board, Card, Column};
use crate::drag::{DragState, Node, Surface};

/// Truncate `text` to `max_width` display cells on grapheme boundaries,
/// ending in `…` when anything was cut.
pub(crate) fn truncate(text: &str, max_width: usize) -> String {
    if text.width() <= max_width {
        return text.to_string();
    }
    if max_width == 0 {
        return String::new();
    }
    let avail = max_width - 1;
    let mut used = 0;
    let kept: String = text
        .graphemes(true)
        .take_while(|g| {
            used += g.width();
            used <= avail
        })
        .collect();
    format!("{kept}…")
}

/// A copy of `board` with columns reordered to `order`, for previewing a
/// column drag.
pub(crate) fn preview_column_order(board: &Board, order: &[String]) -> Board {
    let mut preview = board.clone();
    for column in &mut preview.columns {
        if let Some(i) = order.iter().position(|id| *id == column.id) {
            column.order = i as u32;
        }
    }
    preview
}

/// Draw the board and return the geometry it was drawn with, for the drag
/// engine to hit-test against.
pub fn render_board(f: &mut Frame, area: Rect, board: &Board, state: &AppState) -> Surface {
    let fresh = Surface::from_board(board, area, state.card_height);
    if board.columns.is_empty() {
        f.render_widget(
            Paragraph::new("No columns. Press c then a to add one.").style(Theme::dim_style()),
            area,
        );
        return fresh;
    }

    // While dragging, draw the engine's live view instead of the stored board.
    match state.drag.state() {
        DragState::DraggingCard { .. } => {
            let live = state.drag.surface().unwrap_or(&fresh);
            draw_surface(f, area, board, live, state);
            draw_ghost(f, area, board, live, state);
        }
        DragState::DraggingColumn { .. } => {
            let order = state.drag.column_order().unwrap_or_default();
            let preview = preview_column_order(board, order);
            let live = Surface::from_board(&preview, area, state.card_height);
            draw_surface(f, area, &preview, &live, state);
        }
        _ => draw_surface(f, area, board, &fresh, state),
    }
    fresh
}

fn draw_surface(f: &mut Frame, area: Rect, board: &Board, surface: &Surface, state: &AppState) {
    let selected = state.selected_card_id(board);
    let focused = state.focused_column_id(board);
    let has_lanes = !board.swim_lanes.is_empty();

    for (column_id, slot) in surface.header_rects() {
        let Some(column) = board.column(column_id) else {
            continue;
        };
        let column_area = Rect::new(slot.x, area.y, slot.width, area.height);
        let drag_over = surface
            .containers
            .iter()
            .any(|c| c.column_id == column_id && c.drag_over);
        let is_focused = focused.as_deref() == Some(column_id);
        let is_dragged = state.drag.dragged_column() == Some(column_id);
        render_column_frame(f, column_area, board, column, is_focused, drag_over, is_dragged);

        for container in surface.containers.iter().filter(|c| c.column_id == column_id) {
            if has_lanes && container.area.y > area.y + 1 {
                let label = match &container.swim_lane_id {
                    Some(id) => board.swim_lane(id).map_or(id.as_str(), |l| l.name.as_str()),
                    None => "(no lane)",
                };
                let label_area = Rect::new(container.area.x, container.area.y - 1, container.area.width, 1);
                f.render_widget(
                    Paragraph::new(truncate(label, label_area.width as usize)).style(Theme::dim_style()),
                    label_area,
                );
            }
            if column.collapsed {
                let hidden = board.partition(column_id, container.swim_lane_id.as_deref()).len();
                if hidden > 0 && container.area.height > 0 {
                    f.render_widget(
                        Paragraph::new(format!("{hidden} hidden")).style(Theme::dim_style()),
                        Rect::new(container.area.x, container.area.y, container.area.width, 1),
                    );
                }
                continue;
            }

            let bottom = container.area.bottom();
            for (node, rect) in container.children.iter().zip(container.child_rects()) {
                if rect.height == 0 || rect.bottom() > bottom {
                    continue;
                }
                match node {
                    Node::Card { card_id, visible: true, .. } => {
                        if let Some(card) = board.card(card_id) {
                            let is_selected = selected.as_deref() == Some(card_id.as_str());
                            render_card(f, rect, card, is_selected, board.settings.show_card_ids);
                        }
                    }
                    Node::Placeholder { .. } => render_placeholder(f, rect),
                    Node::DropZone { .. } if container.drag_over => {
                        f.render_widget(Paragraph::new("+ drop here").style(Theme::dim_style()), rect);
                    }
                    _ => {}
                }
            }
        }
    }
}

fn render_column_frame(
    f: &mut Frame,
    area: Rect,
    board: &Board,
    column: &Column,
    is_focused: bool,
    drag_over: bool,
    is_dragged: bool,
) {
    let count = board.column_card_count(&column.id);
    let wip = match column.wip_limit {
        Some(limit) => {
            let over = board.settings.wip_limits_enabled && count > limit as usize;
            let color = if over { Theme::WIP_OVER } else { Theme::WIP_OK };
            Span::styled(format!(" [{count}/{limit}]"), Style::default().fg(color))
        }
        None => Span::styled(format!(" ({count})"), Theme::dim_style()),
    };
    let mut title_style = Style::default()
        .fg(Theme::hex_color(&column.color))
        .add_modifier(Modifier::BOLD);
    if is_dragged {
        title_style = title_style.add_modifier(Modifier::REVERSED);
    }
    let name_width = (area.width as usize).saturating_sub(12);
    let header = Line::from(vec![
        Span::styled(format!(" {} ", truncate(&column.name, name_width)), title_style),
        wip,
    ]);

    let border_style = if drag_over {
        Style::default().fg(Theme::DROP_TARGET).add_modifier(Modifier::BOLD)
    } else if is_focused {
        Style::default().fg(Theme::FG).add_modifier(Modifier::BOLD)
    } else {
        Theme::dim_style()
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(if is_focused { BorderType::Thick } else { BorderType::Rounded })
        .border_style(border_style)
        .title(header);
    f.render_widget(block, area);
}

fn render_card(f: &mut Frame, area: Rect, card: &Card, is_selected: bool, show_id: bool) {
    if area.width < 4 || area.height < 3 {
        return;
    }
    let border_color = if card.blocked {
        Theme::BLOCKER
    } else if card.is_completed() {
        Theme::COMPLETED
    } else {
        Theme::CARD_BORDER
    };
    let selected_mod = if is_selected { Modifier::BOLD } else { Modifier::empty() };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(if is_selected { BorderType::Thick } else { BorderType::Rounded })
        .border_style(Style::default().fg(border_color).add_modifier(selected_mod));
    let inner = block.inner(area);
    f.render_widget(block, area);
    if inner.height == 0 {
        return;
    }

    let mut title_style = Style::default().add_modifier(selected_mod);
    if card.is_completed() {
        title_style = title_style.fg(Theme::COMPLETED).add_modifier(Modifier::CROSSED_OUT);
    }
    f.render_widget(
        Paragraph::new(Span::styled(truncate(&card.title, inner.width as usize), title_style)),
        Rect::new(inner.x, inner.y, inner.width, 1),
    );
    if inner.height < 2 {
        return;
    }

    let mut spans = Vec::new();
    if show_id {
        spans.push(Span::styled(format!("{} ", card.id), Theme::dim_style()));
    }
    if let Some(glyph) = Theme::priority_glyph(card.priority) {
        spans.push(Span::styled(
            format!("{glyph} "),
            Style::default().fg(Theme::priority_color(card.priority)),
        ));
    }
    if card.blocked {
        spans.push(Span::styled("blocked ", Style::default().fg(Theme::BLOCKER)));
    }
    if !card.checklist.is_empty() {
        let done = card.checklist.iter().filter(|i| i.completed).count();
        spans.push(Span::styled(format!("[{done}/{}] ", card.checklist.len()), Theme::dim_style()));
    }
    if let Some(due) = card.due_date {
        spans.push(Span::styled(format!("{} ", due.format("%b %d")), Theme::dim_style()));
    }
    for tag in &card.tags {
        spans.push(Span::styled(format!("#{tag} "), Style::default().fg(Theme::tag_color(tag))));
    }
    f.render_widget(
        Paragraph::new(Line::from(spans)),
        Rect::new(inner.x, inner.y + 1, inner.width, 1),
    );
}

fn render_placeholder(f: &mut Frame, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Double)
        .border_style(Style::default().fg(Theme::PLACEHOLDER));
    f.render_widget(block, area);
}

/// The dragged card, floating under the pointer.
fn draw_ghost(f: &mut Frame, area: Rect, board: &Board, surface: &Surface, state: &AppState) {
    let (Some(card_id), Some(pointer)) = (state.drag.dragged_card(), state.drag.pointer()) else {
        return;
    };
    let Some(card) = board.card(card_id) else {
        return;
    };
    let width = surface.containers.first().map_or(20, |c| c.area.width).min(area.width);
    let height = state.card_height.min(area.height);
    let x = pointer.x.min(area.right().saturating_sub(width));
    let y = pointer.y.min(area.bottom().saturating_sub(height));
    let ghost = Rect::new(x, y, width, height);
    f.render_widget(Clear, ghost);
    render_card(f, ghost, card, true, board.settings.show_card_ids);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::engine::{BoardEngine, NewCard};
    use crate::config::AppConfig;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    fn buffer_text(terminal: &Terminal<TestBackend>) -> String {
        terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|c| c.symbol())
            .collect()
    }

    #[test]
    fn truncate_keeps_short_text() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("exact", 5), "exact");
    }

    #[test]
    fn truncate_cuts_on_graphemes() {
        assert_eq!(truncate("hello world", 6), "hello…");
        assert_eq!(truncate("日本語テキスト", 5), "日本…");
        assert_eq!(truncate("anything", 0), "");
    }

    #[test]
    fn preview_reorders_columns_only() {
        let board = Board::new("Test");
        let mut order: Vec<String> = board.sorted_columns().iter().map(|c| c.id.clone()).collect();
        order.rotate_left(1);
        let preview = preview_column_order(&board, &order);
        let ids: Vec<&str> = preview.sorted_columns().iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, order.iter().map(String::as_str).collect::<Vec<_>>());
        assert_eq!(preview.cards, board.cards);
    }

    #[test]
    fn render_draws_columns_and_cards() {
        let mut engine = BoardEngine::new(Board::new("Test"));
        let todo = engine.columns()[0].id.clone();
        engine.add_card(&todo, NewCard::titled("Ship it")).unwrap();
        let state = AppState::new(&AppConfig::default());

        let mut terminal = Terminal::new(TestBackend::new(90, 20)).unwrap();
        let mut surface = None;
        terminal
            .draw(|f| {
                let area = f.area();
                surface = Some(render_board(f, area, engine.board(), &state));
            })
            .unwrap();

        let text = buffer_text(&terminal);
        assert!(text.contains("To Do"));
        assert!(text.contains("Ship it"));
        assert_eq!(surface.unwrap().column_order().len(), 3);
    }
}
