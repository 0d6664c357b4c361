use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;
use unicode_width::UnicodeWidthStr;

use super::theme::Theme;
use crate::app::{AppState, Mode, NotificationLevel};
use crate::board::Board;
use crate::drag::DragState;

pub fn render_status_bar(f: &mut Frame, area: Rect, state: &AppState, board: &Board) {
    // Input, Filter and Confirm take over the whole bar.
    if let Some(line) = full_line_mode(state) {
        f.render_widget(Paragraph::new(line).style(Theme::status_style()), area);
        return;
    }

    let left = build_left_zone(state, board);
    let right = build_right_zone(state, board);
    let left_width: usize = left.iter().map(|s| s.content.width()).sum();
    let right_width: usize = right.iter().map(|s| s.content.width()).sum();
    let center_avail = (area.width as usize).saturating_sub(left_width + right_width);

    let mut spans = left;
    spans.extend(build_center_zone(state, center_avail));
    spans.extend(right);
    f.render_widget(Paragraph::new(Line::from(spans)).style(Theme::status_style()), area);
}

pub(crate) fn mode_label(state: &AppState) -> &'static str {
    match state.drag.state() {
        DragState::DraggingCard { .. } => return "DRAG",
        DragState::DraggingColumn { .. } => return "DRAG COLUMN",
        DragState::Idle | DragState::PendingColumn { .. } => {}
    }
    match &state.mode {
        Mode::Normal => "NORMAL",
        Mode::Space => "SPACE",
        Mode::Column => "COLUMN",
        Mode::Picker { .. } => "PICKER",
        Mode::Help => "HELP",
        Mode::Input { .. } | Mode::Confirm { .. } | Mode::Filter { .. } => "",
    }
}

/// Mode badge, board name and active filters.
fn build_left_zone<'a>(state: &AppState, board: &'a Board) -> Vec<Span<'a>> {
    let mut spans = vec![
        Span::styled(format!(" {} ", mode_label(state)), Theme::badge_style()),
        Span::raw(" "),
        Span::styled(format!("{} ", board.name), Theme::dim_style()),
    ];
    let filters = &board.filters;
    if !filters.search.is_empty() {
        spans.push(Span::raw(format!("/{} ", filters.search)));
    }
    for tag in &filters.tags {
        spans.push(Span::styled(format!("#{tag} "), Style::default().fg(Theme::tag_color(tag))));
    }
    spans
}

/// Focused column position and how far undo can go.
fn build_right_zone<'a>(state: &AppState, board: &'a Board) -> Vec<Span<'a>> {
    let mut spans = Vec::new();
    let columns = board.sorted_columns();
    if let Some(col) = columns.get(state.focused_column) {
        let visible = state.visible_cards(board).len();
        let pos = if visible > 0 {
            format!(" {}/{}", state.selected_card + 1, visible)
        } else {
            " 0".to_string()
        };
        spans.push(Span::styled(col.name.clone(), Theme::dim_style()));
        spans.push(Span::raw(pos));
    }
    spans.push(Span::raw(" "));
    spans
}

fn build_center_zone(state: &AppState, avail_width: usize) -> Vec<Span<'_>> {
    let Some(notif) = &state.notification else {
        return vec![Span::raw(" ".repeat(avail_width))];
    };
    let color = match state.notification_level {
        NotificationLevel::Info => Theme::FG,
        NotificationLevel::Error => Theme::STATUS_ERROR,
    };
    let width = notif.width();
    if width >= avail_width {
        let truncated: String = notif.chars().take(avail_width).collect();
        return vec![Span::styled(truncated, Style::default().fg(color))];
    }
    let pad_left = (avail_width - width) / 2;
    let pad_right = avail_width - width - pad_left;
    vec![
        Span::raw(" ".repeat(pad_left)),
        Span::styled(notif.as_str(), Style::default().fg(color)),
        Span::raw(" ".repeat(pad_right)),
    ]
}

fn full_line_mode(state: &AppState) -> Option<Line<'_>> {
    match &state.mode {
        Mode::Filter { buf } => Some(Line::from(vec![
            Span::styled(" / ", Theme::badge_style()),
            Span::raw(format!(" {}_", buf.input)),
        ])),
        Mode::Input { prompt, buf, .. } => Some(Line::from(vec![
            Span::styled(format!(" {prompt} "), Theme::badge_style()),
            Span::raw(format!(" {}_", buf.input)),
        ])),
        Mode::Confirm { prompt, .. } => Some(Line::from(Span::styled(
            format!(" {prompt} (y/n) "),
            Theme::badge_style(),
        ))),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    #[test]
    fn mode_label_follows_mode() {
        let mut state = AppState::new(&AppConfig::default());
        assert_eq!(mode_label(&state), "NORMAL");
        state.mode = Mode::Column;
        assert_eq!(mode_label(&state), "COLUMN");
    }

    #[test]
    fn center_zone_pads_notification() {
        let mut state = AppState::new(&AppConfig::default());
        state.notify("hi");
        let spans = build_center_zone(&state, 10);
        let total: usize = spans.iter().map(|s| s.content.width()).sum();
        assert_eq!(total, 10);
    }

    #[test]
    fn input_mode_takes_full_line() {
        let mut state = AppState::new(&AppConfig::default());
        assert!(full_line_mode(&state).is_none());
        state.mode = Mode::Filter { buf: crate::app::TextBuffer::new("abc".into()) };
        assert!(full_line_mode(&state).is_some());
    }
}
