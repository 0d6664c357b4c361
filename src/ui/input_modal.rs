use ratatui::layout::Rect;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, BorderType, Borders, Clear, Paragraph};
use ratatui::Frame;

use super::centered_rect;
use super::theme::Theme;
use crate::app::Mode;
use crate::input::keymap::{self, Binding, HELP_GROUPS};

fn popup_block(title: &str) -> Block<'_> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(Theme::FG))
        .title(Span::styled(
            format!(" {title} "),
            Style::default().fg(Theme::FG).add_modifier(Modifier::BOLD),
        ))
}

fn binding_line(binding: &Binding, key_width: usize) -> Line<'static> {
    Line::from(vec![
        Span::raw(" "),
        Span::styled(
            format!("{:>key_width$}", binding.key),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
        Span::raw(binding.description),
    ])
}

/// Hint popup in the bottom-right corner for one-key minor modes.
pub fn render_hint_popup(f: &mut Frame, area: Rect, mode: &Mode) {
    let bindings = keymap::mode_bindings(mode);
    if bindings.is_empty() {
        return;
    }
    let key_width = bindings.iter().map(|b| b.key.len()).max().unwrap_or(0);
    let desc_width = bindings.iter().map(|b| b.description.len()).max().unwrap_or(0);
    let width = ((key_width + desc_width + 5) as u16).min(area.width);
    let height = (bindings.len() as u16 + 2).min(area.height);
    let popup = Rect::new(
        area.x + area.width.saturating_sub(width),
        area.y + area.height.saturating_sub(height),
        width,
        height,
    );

    let title = match mode {
        Mode::Space => "commands",
        Mode::Column => "column",
        _ => "",
    };
    let lines: Vec<Line> = bindings.iter().map(|b| binding_line(b, key_width)).collect();
    f.render_widget(Clear, popup);
    f.render_widget(Paragraph::new(lines).block(popup_block(title)), popup);
}

/// A selectable list; checked items carry a mark.
pub fn render_picker(f: &mut Frame, area: Rect, title: &str, items: &[(String, bool)], selected: usize) {
    let width = items
        .iter()
        .map(|(name, _)| name.len())
        .max()
        .unwrap_or(0)
        .max(title.len())
        + 8;
    let height = items.len() as u16 + 2;
    let popup = centered_rect(area, 30, 40, width as u16, height);

    let lines: Vec<Line> = items
        .iter()
        .enumerate()
        .map(|(i, (name, checked))| {
            let mark = if *checked { "● " } else { "  " };
            let style = if i == selected {
                Style::default().add_modifier(Modifier::BOLD | Modifier::REVERSED)
            } else {
                Style::default()
            };
            Line::from(vec![Span::raw(" "), Span::raw(mark), Span::styled(name.clone(), style)])
        })
        .collect();
    f.render_widget(Clear, popup);
    f.render_widget(Paragraph::new(lines).block(popup_block(title)), popup);
}

pub fn render_help(f: &mut Frame, area: Rect) {
    let key_width = HELP_GROUPS
        .iter()
        .flat_map(|g| g.bindings.iter())
        .map(|b| b.key.len())
        .max()
        .unwrap_or(0);
    let mut lines = Vec::new();
    for group in HELP_GROUPS {
        if !lines.is_empty() {
            lines.push(Line::raw(""));
        }
        lines.push(Line::from(Span::styled(
            group.name,
            Style::default().add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
        )));
        lines.extend(group.bindings.iter().map(|b| binding_line(b, key_width)));
    }
    let popup = centered_rect(area, 60, 80, 44, 20);
    f.render_widget(Clear, popup);
    f.render_widget(Paragraph::new(lines).block(popup_block("help")), popup);
}
