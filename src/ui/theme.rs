use ratatui::style::{Color, Modifier, Style};

use crate::board::Priority;

/// Colors for the board view.
///
/// Chrome uses the terminal's own foreground. Color is reserved for signals:
/// priority, blocked cards, WIP overflow, drag feedback and column accents.
pub struct Theme;

impl Theme {
    pub const FG: Color = Color::Reset;
    pub const DIM: Color = Color::DarkGray;

    pub const CARD_BORDER: Color = Color::Reset;
    pub const BLOCKER: Color = Color::Red;
    pub const COMPLETED: Color = Color::DarkGray;

    pub const PRIORITY_LOW: Color = Color::Green;
    pub const PRIORITY_MEDIUM: Color = Color::Cyan;
    pub const PRIORITY_HIGH: Color = Color::Yellow;
    pub const PRIORITY_URGENT: Color = Color::Red;

    pub const WIP_OK: Color = Color::Green;
    pub const WIP_OVER: Color = Color::Red;

    // Drag feedback
    pub const DROP_TARGET: Color = Color::Cyan;
    pub const PLACEHOLDER: Color = Color::Cyan;

    pub const STATUS_ERROR: Color = Color::Red;

    pub fn dim_style() -> Style {
        Style::default().fg(Self::DIM)
    }

    pub fn status_style() -> Style {
        Style::default().fg(Self::FG)
    }

    pub fn badge_style() -> Style {
        Style::default()
            .fg(Self::FG)
            .add_modifier(Modifier::BOLD | Modifier::REVERSED)
    }

    pub fn priority_color(priority: Priority) -> Color {
        match priority {
            Priority::None => Self::FG,
            Priority::Low => Self::PRIORITY_LOW,
            Priority::Medium => Self::PRIORITY_MEDIUM,
            Priority::High => Self::PRIORITY_HIGH,
            Priority::Urgent => Self::PRIORITY_URGENT,
        }
    }

    /// Short glyph for a priority, `None` for cards without one.
    pub fn priority_glyph(priority: Priority) -> Option<&'static str> {
        match priority {
            Priority::None => None,
            Priority::Low => Some("↓"),
            Priority::Medium => Some("-"),
            Priority::High => Some("!"),
            Priority::Urgent => Some("!!"),
        }
    }

    /// Parse a `#rrggbb` color, falling back to the default foreground.
    pub fn hex_color(hex: &str) -> Color {
        let digits = hex.trim_start_matches('#');
        if digits.len() != 6 {
            return Self::FG;
        }
        match u32::from_str_radix(digits, 16) {
            Ok(rgb) => Color::Rgb((rgb >> 16) as u8, (rgb >> 8) as u8, rgb as u8),
            Err(_) => Self::FG,
        }
    }

    /// Assign a consistent color to a tag based on its name.
    pub fn tag_color(tag: &str) -> Color {
        let hash = tag
            .bytes()
            .fold(0u32, |acc, b| acc.wrapping_mul(31).wrapping_add(b as u32));
        const PALETTE: [Color; 8] = [
            Color::Cyan,
            Color::Green,
            Color::Magenta,
            Color::Blue,
            Color::Yellow,
            Color::LightCyan,
            Color::LightMagenta,
            Color::LightBlue,
        ];
        PALETTE[(hash % PALETTE.len() as u32) as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_colors_parse() {
        assert_eq!(Theme::hex_color("#6366f1"), Color::Rgb(0x63, 0x66, 0xf1));
        assert_eq!(Theme::hex_color("nope"), Theme::FG);
        assert_eq!(Theme::hex_color("#zzzzzz"), Theme::FG);
    }

    #[test]
    fn tag_color_is_stable() {
        assert_eq!(Theme::tag_color("backend"), Theme::tag_color("backend"));
    }

    #[test]
    fn only_unset_priority_has_no_glyph() {
        for p in Priority::ALL {
            assert_eq!(Theme::priority_glyph(p).is_none(), p == Priority::None);
        }
    }
}
