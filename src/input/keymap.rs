use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use super::action::Action;
use crate::app::Mode;

/// Map a key event to a semantic action based on current mode.
pub fn map_key(key: KeyEvent, mode: &Mode) -> Action {
    match mode {
        Mode::Normal => map_normal(key),
        Mode::Space => map_space(key),
        Mode::Column => map_column(key),
        Mode::Input { .. } | Mode::Filter { .. } => map_input(key),
        Mode::Confirm { .. } => map_confirm(key),
        Mode::Picker { .. } => map_picker(key),
        Mode::Help => match key.code {
            KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('?') => Action::Quit,
            _ => Action::None,
        },
    }
}

fn map_normal(key: KeyEvent) -> Action {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Char('c') if ctrl => Action::Quit,
        KeyCode::Char('r') if ctrl => Action::Redo,
        KeyCode::Char('h') | KeyCode::Left => Action::FocusPrevColumn,
        KeyCode::Char('l') | KeyCode::Right => Action::FocusNextColumn,
        KeyCode::Char('j') | KeyCode::Down => Action::SelectNextCard,
        KeyCode::Char('k') | KeyCode::Up => Action::SelectPrevCard,
        KeyCode::Char('H') => Action::MoveCardPrevColumn,
        KeyCode::Char('L') => Action::MoveCardNextColumn,
        KeyCode::Char('J') => Action::MoveCardDown,
        KeyCode::Char('K') => Action::MoveCardUp,
        KeyCode::Char('n') => Action::NewCard,
        KeyCode::Char('d') => Action::DeleteCard,
        KeyCode::Char('D') => Action::DuplicateCard,
        KeyCode::Char('x') => Action::ToggleCompleted,
        KeyCode::Char('b') => Action::ToggleBlocked,
        KeyCode::Char('a') => Action::AddColumn,
        KeyCode::Char('u') => Action::Undo,
        KeyCode::Char('U') => Action::Redo,
        KeyCode::Char('/') => Action::StartFilter,
        KeyCode::Char(' ') => Action::EnterSpaceMode,
        KeyCode::Char('c') => Action::EnterColumnMode,
        KeyCode::Char('?') => Action::ShowHelp,
        KeyCode::Char('q') => Action::Quit,
        KeyCode::Esc => Action::ClearFilters,
        _ => Action::None,
    }
}

fn map_space(key: KeyEvent) -> Action {
    match key.code {
        KeyCode::Char('n') => Action::NewCard,
        KeyCode::Char('d') => Action::DeleteCard,
        KeyCode::Char('D') => Action::DuplicateCard,
        KeyCode::Char('e') => Action::EditTitle,
        KeyCode::Char('t') => Action::EditTags,
        KeyCode::Char('p') => Action::PickPriority,
        KeyCode::Char('m') => Action::MoveToColumn,
        KeyCode::Char('x') => Action::ToggleCompleted,
        KeyCode::Char('b') => Action::ToggleBlocked,
        KeyCode::Char('T') => Action::StartTagFilter,
        KeyCode::Char('l') => Action::AddSwimLane,
        KeyCode::Char('s') => Action::SaveTemplate,
        KeyCode::Char('a') => Action::ApplyTemplate,
        KeyCode::Char('/') => Action::StartFilter,
        KeyCode::Char('?') => Action::ShowHelp,
        _ => Action::None,
    }
}

/// Keys for column mode, entered by pressing `c` in Normal mode.
fn map_column(key: KeyEvent) -> Action {
    match key.code {
        KeyCode::Char('a') => Action::AddColumn,
        KeyCode::Char('r') => Action::RenameColumn,
        KeyCode::Char('d') => Action::DeleteColumn,
        KeyCode::Char('z') => Action::ToggleColumnCollapsed,
        KeyCode::Char('w') => Action::SetWipLimit,
        KeyCode::Char('h') | KeyCode::Left => Action::MoveColumnLeft,
        KeyCode::Char('l') | KeyCode::Right => Action::MoveColumnRight,
        _ => Action::None,
    }
}

fn map_input(key: KeyEvent) -> Action {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Enter => Action::InputConfirm,
        KeyCode::Esc => Action::InputCancel,
        KeyCode::Char('a') if ctrl => Action::InputHome,
        KeyCode::Char('e') if ctrl => Action::InputEnd,
        KeyCode::Char('w') if ctrl => Action::InputDeleteWord,
        KeyCode::Char(c) => Action::InputChar(c),
        KeyCode::Backspace => Action::InputBackspace,
        KeyCode::Left => Action::InputLeft,
        KeyCode::Right => Action::InputRight,
        KeyCode::Home => Action::InputHome,
        KeyCode::End => Action::InputEnd,
        _ => Action::None,
    }
}

fn map_confirm(key: KeyEvent) -> Action {
    match key.code {
        KeyCode::Char('y') | KeyCode::Enter => Action::Confirm,
        KeyCode::Char('n') | KeyCode::Esc => Action::Deny,
        _ => Action::None,
    }
}

fn map_picker(key: KeyEvent) -> Action {
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => Action::SelectNextCard,
        KeyCode::Char('k') | KeyCode::Up => Action::SelectPrevCard,
        KeyCode::Enter | KeyCode::Char(' ') => Action::InputConfirm,
        KeyCode::Esc => Action::InputCancel,
        _ => Action::None,
    }
}

// ---------------------------------------------------------------------------
// Binding registry, shared by the help overlay and the minor-mode popup.
// ---------------------------------------------------------------------------

pub struct Binding {
    pub key: &'static str,
    pub description: &'static str,
}

pub struct BindingGroup {
    pub name: &'static str,
    pub bindings: &'static [Binding],
}

pub const NORMAL_BINDINGS: &[Binding] = &[
    Binding { key: "h / l", description: "Switch columns" },
    Binding { key: "j / k", description: "Move between cards" },
    Binding { key: "H / L", description: "Move card left/right" },
    Binding { key: "J / K", description: "Move card down/up" },
    Binding { key: "n", description: "New card" },
    Binding { key: "d / D", description: "Delete / duplicate card" },
    Binding { key: "x / b", description: "Toggle complete / blocked" },
    Binding { key: "u", description: "Undo" },
    Binding { key: "U, C-r", description: "Redo" },
    Binding { key: "/", description: "Search cards" },
    Binding { key: "mouse", description: "Drag cards and column headers" },
    Binding { key: "Esc", description: "Clear filters / cancel drag" },
    Binding { key: "q", description: "Quit" },
];

pub const SPACE_BINDINGS: &[Binding] = &[
    Binding { key: "n", description: "New card" },
    Binding { key: "e", description: "Edit title" },
    Binding { key: "t", description: "Edit tags" },
    Binding { key: "p", description: "Set priority" },
    Binding { key: "m", description: "Move to column" },
    Binding { key: "T", description: "Filter by tag" },
    Binding { key: "l", description: "Add swim lane" },
    Binding { key: "s", description: "Save as template" },
    Binding { key: "a", description: "Apply template" },
];

pub const COLUMN_BINDINGS: &[Binding] = &[
    Binding { key: "a", description: "Add column" },
    Binding { key: "r", description: "Rename focused column" },
    Binding { key: "w", description: "Set WIP limit" },
    Binding { key: "z", description: "Collapse / expand" },
    Binding { key: "h / l", description: "Move column left/right" },
    Binding { key: "d", description: "Delete focused column" },
];

pub const HELP_GROUPS: &[BindingGroup] = &[
    BindingGroup { name: "Normal", bindings: NORMAL_BINDINGS },
    BindingGroup { name: "Commands (Space)", bindings: SPACE_BINDINGS },
    BindingGroup { name: "Column (c)", bindings: COLUMN_BINDINGS },
];

/// Bindings for a minor mode, for the hint popup.
pub fn mode_bindings(mode: &Mode) -> &'static [Binding] {
    match mode {
        Mode::Space => SPACE_BINDINGS,
        Mode::Column => COLUMN_BINDINGS,
        _ => &[],
    }
}
