use std::io::stdout;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, MouseButton,
    MouseEvent, MouseEventKind,
};
use crossterm::execute;
use ratatui::layout::Position;
use ratatui::DefaultTerminal;
use tracing::{debug, info};

use crate::board::engine::{BoardEngine, CardUpdate, ColumnUpdate, NewCard};
use crate::board::filter::card_matches;
use crate::board::storage::{find_board_dir, load_board, load_config, save_board};
use crate::board::template::builtin_templates;
use crate::board::{Board, Card, Priority};
use crate::config::AppConfig;
use crate::drag::{DragEngine, DropOutcome};
use crate::input::action::Action;
use crate::input::keymap::map_key;

/// Reusable text editing buffer with cursor.
///
/// `cursor` is a **char index** (not byte index), always in `0..=char_count`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextBuffer {
    pub input: String,
    pub cursor: usize,
}

impl TextBuffer {
    pub fn new(input: String) -> Self {
        let cursor = input.chars().count();
        Self { input, cursor }
    }

    pub fn empty() -> Self {
        Self { input: String::new(), cursor: 0 }
    }

    fn byte_offset(&self, char_idx: usize) -> usize {
        self.input
            .char_indices()
            .nth(char_idx)
            .map(|(i, _)| i)
            .unwrap_or(self.input.len())
    }

    pub fn insert(&mut self, c: char) {
        let byte_idx = self.byte_offset(self.cursor);
        self.input.insert(byte_idx, c);
        self.cursor += 1;
    }

    pub fn backspace(&mut self) {
        if self.cursor > 0 {
            let byte_idx = self.byte_offset(self.cursor - 1);
            self.input.remove(byte_idx);
            self.cursor -= 1;
        }
    }

    pub fn delete_word(&mut self) {
        let byte_pos = self.byte_offset(self.cursor);
        let trimmed = self.input[..byte_pos].trim_end();
        let start_byte = trimmed
            .char_indices()
            .rev()
            .find(|(_, c)| c.is_whitespace())
            .map(|(i, c)| i + c.len_utf8())
            .unwrap_or(0);
        let start_char = self.input[..start_byte].chars().count();
        self.input.drain(start_byte..byte_pos);
        self.cursor = start_char;
    }

    pub fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        if self.cursor < self.input.chars().count() {
            self.cursor += 1;
        }
    }

    pub fn home(&mut self) {
        self.cursor = 0;
    }

    pub fn end(&mut self) {
        self.cursor = self.input.chars().count();
    }
}

/// Current interaction mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    Normal,
    Space,
    Column,
    Input {
        prompt: &'static str,
        buf: TextBuffer,
        on_confirm: InputTarget,
    },
    Confirm {
        prompt: &'static str,
        on_confirm: ConfirmTarget,
    },
    Filter {
        buf: TextBuffer,
    },
    Picker {
        title: &'static str,
        items: Vec<(String, bool)>,
        selected: usize,
        target: PickerTarget,
    },
    Help,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputTarget {
    NewCardTitle,
    EditTitle(String),
    EditTags(String),
    NewColumn,
    RenameColumn(String),
    WipLimit(String),
    NewSwimLane,
    TemplateName,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmTarget {
    DeleteCard(String),
    DeleteColumn(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PickerTarget {
    Priority(String),
    MoveToColumn(String),
    TagFilter,
    Template,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Error,
}

/// Where the board lives on disk and how it behaves.
pub struct Session {
    pub board_dir: PathBuf,
    pub config: AppConfig,
}

/// Global application state.
pub struct AppState {
    pub mode: Mode,
    /// Index into the sorted columns.
    pub focused_column: usize,
    /// Index into the focused column's visible cards.
    pub selected_card: usize,
    pub notification: Option<String>,
    pub notification_level: NotificationLevel,
    pub notification_expires: Option<Instant>,
    pub should_quit: bool,
    pub drag: DragEngine,
    pub card_height: u16,
}

impl AppState {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            mode: Mode::Normal,
            focused_column: 0,
            selected_card: 0,
            notification: None,
            notification_level: NotificationLevel::Info,
            notification_expires: None,
            should_quit: false,
            drag: DragEngine::new(config.column_drag_threshold),
            card_height: config.card_height.max(3),
        }
    }

    pub fn focused_column_id(&self, board: &Board) -> Option<String> {
        board
            .sorted_columns()
            .get(self.focused_column)
            .map(|c| c.id.clone())
    }

    /// Cards of the focused column that pass the board's filters.
    pub fn visible_cards<'a>(&self, board: &'a Board) -> Vec<&'a Card> {
        match self.focused_column_id(board) {
            Some(id) => board
                .column_cards(&id)
                .into_iter()
                .filter(|c| card_matches(c, &board.filters))
                .collect(),
            None => Vec::new(),
        }
    }

    pub fn selected_card_ref<'a>(&self, board: &'a Board) -> Option<&'a Card> {
        self.visible_cards(board).get(self.selected_card).copied()
    }

    pub fn selected_card_id(&self, board: &Board) -> Option<String> {
        self.selected_card_ref(board).map(|c| c.id.clone())
    }

    /// Focus the column holding `card_id` and select the card.
    pub fn focus_card(&mut self, board: &Board, card_id: &str) {
        let Some(card) = board.card(card_id) else {
            return;
        };
        if let Some(ci) = board.sorted_columns().iter().position(|c| c.id == card.column_id) {
            self.focused_column = ci;
        }
        if let Some(idx) = self.visible_cards(board).iter().position(|c| c.id == card_id) {
            self.selected_card = idx;
        }
    }

    pub fn notify(&mut self, msg: impl Into<String>) {
        self.notification = Some(msg.into());
        self.notification_level = NotificationLevel::Info;
        self.notification_expires = Some(Instant::now() + Duration::from_secs(3));
    }

    /// Show a transient error notification (rendered in red).
    pub fn notify_error(&mut self, msg: impl Into<String>) {
        self.notification = Some(msg.into());
        self.notification_level = NotificationLevel::Error;
        self.notification_expires = Some(Instant::now() + Duration::from_secs(3));
    }

    pub fn tick_notification(&mut self) {
        if let Some(expires) = self.notification_expires {
            if Instant::now() >= expires {
                self.notification = None;
                self.notification_level = NotificationLevel::Info;
                self.notification_expires = None;
            }
        }
    }

    /// Keep the focus and selection inside the board after a change.
    pub fn clamp_selection(&mut self, board: &Board) {
        let columns = board.columns.len();
        if columns == 0 {
            self.focused_column = 0;
        } else if self.focused_column >= columns {
            self.focused_column = columns - 1;
        }
        let cards = self.visible_cards(board).len();
        if cards == 0 {
            self.selected_card = 0;
        } else if self.selected_card >= cards {
            self.selected_card = cards - 1;
        }
    }
}

pub fn run(terminal: &mut DefaultTerminal, start_dir: &Path) -> color_eyre::Result<()> {
    let board_dir = find_board_dir(start_dir)?;
    let config = load_config(&board_dir)?;
    let board = load_board(&board_dir)?;
    let mut engine = BoardEngine::with_capacity(board, config.history_capacity);
    let mut state = AppState::new(&config);
    state.clamp_selection(engine.board());
    let session = Session { board_dir, config };
    info!(board = %engine.board().name, "opened board");

    execute!(stdout(), EnableMouseCapture)?;
    let result = event_loop(terminal, &mut engine, &mut state, &session);
    execute!(stdout(), DisableMouseCapture)?;
    state.drag.cleanup();
    result?;

    if !session.config.autosave {
        save_board(&session.board_dir, engine.board())?;
    }
    Ok(())
}

fn event_loop(
    terminal: &mut DefaultTerminal,
    engine: &mut BoardEngine,
    state: &mut AppState,
    session: &Session,
) -> color_eyre::Result<()> {
    let frame_interval = Duration::from_millis(session.config.frame_interval_ms.max(1));

    loop {
        state.tick_notification();

        // One drag frame per render: only the latest pointer position counts.
        state.drag.frame();

        let mut fresh = None;
        terminal.draw(|f| fresh = Some(crate::ui::render(f, engine.board(), state)))?;
        if state.drag.is_idle() {
            if let Some(surface) = fresh {
                if state.drag.surface() != Some(&surface) {
                    state.drag.attach(surface);
                }
            }
        }

        if event::poll(frame_interval)? {
            loop {
                handle_event(event::read()?, engine, state, session)?;
                if state.should_quit || !event::poll(Duration::ZERO)? {
                    break;
                }
            }
        }
        if state.should_quit {
            break;
        }
    }
    Ok(())
}

fn handle_event(
    event: Event,
    engine: &mut BoardEngine,
    state: &mut AppState,
    session: &Session,
) -> color_eyre::Result<()> {
    match event {
        Event::Key(key) if key.kind == KeyEventKind::Press => {
            if !state.drag.is_idle() {
                // Keys never mutate the board under a live drag.
                if key.code == KeyCode::Esc {
                    state.drag.cancel();
                    state.notify("Drag cancelled");
                }
                return Ok(());
            }
            let action = map_key(key, &state.mode);
            process_action(engine, state, action, session)
        }
        Event::Mouse(mouse) => handle_mouse(engine, state, mouse, session),
        Event::Resize(..) | Event::FocusLost => {
            state.drag.cancel();
            Ok(())
        }
        _ => Ok(()),
    }
}

/// Route pointer events into the drag engine.
pub fn handle_mouse(
    engine: &mut BoardEngine,
    state: &mut AppState,
    mouse: MouseEvent,
    session: &Session,
) -> color_eyre::Result<()> {
    let pos = Position::new(mouse.column, mouse.row);
    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => {
            if state.mode != Mode::Normal {
                return Ok(());
            }
            let clicked = state
                .drag
                .surface()
                .and_then(|s| s.card_at(pos))
                .map(|(_, _, id)| id.to_string());
            if let Some(card_id) = clicked {
                state.focus_card(engine.board(), &card_id);
            }
            state.drag.pointer_down(pos);
        }
        MouseEventKind::Drag(MouseButton::Left) | MouseEventKind::Moved => {
            state.drag.pointer_move(pos);
        }
        MouseEventKind::Up(MouseButton::Left) => {
            let stamp = engine.board().updated_at;
            let outcome = state.drag.pointer_up(pos, engine);
            match &outcome {
                DropOutcome::CardMoved { card_id, .. } => {
                    state.focus_card(engine.board(), card_id);
                }
                DropOutcome::ColumnMoved { index, .. } => {
                    state.focused_column = *index;
                    state.clamp_selection(engine.board());
                }
                DropOutcome::Cancelled | DropOutcome::Ignored => {}
            }
            if engine.board().updated_at != stamp {
                persist(engine, session)?;
            }
        }
        _ => {}
    }
    Ok(())
}

fn persist(engine: &BoardEngine, session: &Session) -> color_eyre::Result<()> {
    if session.config.autosave {
        save_board(&session.board_dir, engine.board())?;
    }
    Ok(())
}

pub fn process_action(
    engine: &mut BoardEngine,
    state: &mut AppState,
    action: Action,
    session: &Session,
) -> color_eyre::Result<()> {
    // Minor modes last for exactly one key.
    if matches!(state.mode, Mode::Space | Mode::Column) {
        state.mode = Mode::Normal;
    }
    let stamp = engine.board().updated_at;

    match action {
        Action::None => {}

        Action::FocusPrevColumn | Action::FocusNextColumn | Action::SelectPrevCard | Action::SelectNextCard => {
            handle_navigation(engine.board(), state, action);
        }

        Action::MoveCardPrevColumn
        | Action::MoveCardNextColumn
        | Action::MoveCardUp
        | Action::MoveCardDown
        | Action::MoveToColumn
        | Action::NewCard
        | Action::DeleteCard
        | Action::DuplicateCard
        | Action::EditTitle
        | Action::EditTags
        | Action::PickPriority
        | Action::ToggleCompleted
        | Action::ToggleBlocked => handle_card_action(engine, state, action),

        Action::AddColumn
        | Action::RenameColumn
        | Action::DeleteColumn
        | Action::ToggleColumnCollapsed
        | Action::SetWipLimit
        | Action::MoveColumnLeft
        | Action::MoveColumnRight => handle_column_action(engine, state, action),

        Action::AddSwimLane => {
            state.mode = Mode::Input { prompt: "New swim lane", buf: TextBuffer::empty(), on_confirm: InputTarget::NewSwimLane };
        }
        Action::SaveTemplate => {
            state.mode = Mode::Input { prompt: "Template name", buf: TextBuffer::empty(), on_confirm: InputTarget::TemplateName };
        }
        Action::ApplyTemplate => {
            let items = template_choices(engine.board())
                .into_iter()
                .map(|(name, _)| (name, false))
                .collect();
            state.mode = Mode::Picker { title: "Apply template", items, selected: 0, target: PickerTarget::Template };
        }

        Action::Undo => {
            if engine.undo() {
                state.notify("Undone");
            } else {
                state.notify("Nothing to undo");
            }
            state.clamp_selection(engine.board());
        }
        Action::Redo => {
            if engine.redo() {
                state.notify("Redone");
            } else {
                state.notify("Nothing to redo");
            }
            state.clamp_selection(engine.board());
        }

        Action::StartFilter => {
            let current = engine.board().filters.search.clone();
            state.mode = Mode::Filter { buf: TextBuffer::new(current) };
        }
        Action::StartTagFilter => {
            let board = engine.board();
            let items: Vec<(String, bool)> = board
                .all_tags()
                .into_iter()
                .map(|(tag, _)| {
                    let active = board.filters.tags.contains(&tag);
                    (tag, active)
                })
                .collect();
            if items.is_empty() {
                state.notify("No tags on the board");
            } else {
                state.mode = Mode::Picker { title: "Filter by tag", items, selected: 0, target: PickerTarget::TagFilter };
            }
        }
        Action::ClearFilters => {
            if !engine.board().filters.is_empty() {
                engine.clear_filters();
                state.clamp_selection(engine.board());
                state.notify("Filters cleared");
            }
        }

        Action::InputChar(_)
        | Action::InputBackspace
        | Action::InputLeft
        | Action::InputRight
        | Action::InputHome
        | Action::InputEnd
        | Action::InputDeleteWord
        | Action::InputConfirm
        | Action::InputCancel => handle_input(engine, state, action),

        Action::Confirm | Action::Deny => handle_confirm(engine, state, action),

        Action::EnterSpaceMode => state.mode = Mode::Space,
        Action::EnterColumnMode => state.mode = Mode::Column,
        Action::ShowHelp => state.mode = Mode::Help,
        Action::Quit => match state.mode {
            Mode::Normal => state.should_quit = true,
            _ => state.mode = Mode::Normal,
        },
    }

    if engine.board().updated_at != stamp {
        debug!(history = engine.history_len(), "board changed");
        persist(engine, session)?;
    }
    Ok(())
}

fn handle_navigation(board: &Board, state: &mut AppState, action: Action) {
    if let Mode::Picker { items, selected, .. } = &mut state.mode {
        match action {
            Action::SelectNextCard if *selected + 1 < items.len() => *selected += 1,
            Action::SelectPrevCard => *selected = selected.saturating_sub(1),
            _ => {}
        }
        return;
    }
    match action {
        Action::FocusPrevColumn => {
            state.focused_column = state.focused_column.saturating_sub(1);
            state.selected_card = 0;
        }
        Action::FocusNextColumn => {
            if state.focused_column + 1 < board.columns.len() {
                state.focused_column += 1;
                state.selected_card = 0;
            }
        }
        Action::SelectNextCard => state.selected_card += 1,
        Action::SelectPrevCard => state.selected_card = state.selected_card.saturating_sub(1),
        _ => {}
    }
    state.clamp_selection(board);
}

fn handle_card_action(engine: &mut BoardEngine, state: &mut AppState, action: Action) {
    if action == Action::NewCard {
        if state.focused_column_id(engine.board()).is_some() {
            state.mode = Mode::Input { prompt: "New card", buf: TextBuffer::empty(), on_confirm: InputTarget::NewCardTitle };
        }
        return;
    }
    let Some(card) = state.selected_card_ref(engine.board()).cloned() else {
        state.notify("No card selected");
        return;
    };
    let board = engine.board();
    let columns: Vec<String> = board.sorted_columns().iter().map(|c| c.id.clone()).collect();
    let col_idx = columns.iter().position(|c| *c == card.column_id).unwrap_or(0);

    match action {
        Action::MoveCardPrevColumn | Action::MoveCardNextColumn => {
            let target = if action == Action::MoveCardPrevColumn {
                col_idx.checked_sub(1)
            } else {
                Some(col_idx + 1).filter(|&i| i < columns.len())
            };
            if let Some(target) = target {
                engine.move_card(&card.id, &columns[target], usize::MAX, card.swim_lane_id.as_deref());
                state.focus_card(engine.board(), &card.id);
            }
        }
        Action::MoveCardUp | Action::MoveCardDown => {
            let index = board
                .partition(&card.column_id, card.swim_lane_id.as_deref())
                .iter()
                .position(|c| c.id == card.id)
                .unwrap_or(0);
            let target = if action == Action::MoveCardUp { index.checked_sub(1) } else { Some(index + 1) };
            if let Some(target) = target {
                engine.move_card(&card.id, &card.column_id, target, card.swim_lane_id.as_deref());
                state.focus_card(engine.board(), &card.id);
            }
        }
        Action::MoveToColumn => {
            let items = board
                .sorted_columns()
                .iter()
                .map(|c| (c.name.clone(), c.id == card.column_id))
                .collect();
            state.mode = Mode::Picker { title: "Move to column", items, selected: col_idx, target: PickerTarget::MoveToColumn(card.id) };
        }
        Action::DeleteCard => {
            state.mode = Mode::Confirm { prompt: "Delete card?", on_confirm: ConfirmTarget::DeleteCard(card.id) };
        }
        Action::DuplicateCard => {
            if let Some(copy) = engine.duplicate_card(&card.id) {
                state.focus_card(engine.board(), &copy.id);
                state.notify(format!("Duplicated as {}", copy.id));
            }
        }
        Action::EditTitle => {
            state.mode = Mode::Input {
                prompt: "Title",
                buf: TextBuffer::new(card.title.clone()),
                on_confirm: InputTarget::EditTitle(card.id),
            };
        }
        Action::EditTags => {
            state.mode = Mode::Input {
                prompt: "Tags",
                buf: TextBuffer::new(card.tags.join(", ")),
                on_confirm: InputTarget::EditTags(card.id),
            };
        }
        Action::PickPriority => {
            let items = Priority::ALL.iter().map(|p| (p.to_string(), *p == card.priority)).collect();
            let selected = Priority::ALL.iter().position(|p| *p == card.priority).unwrap_or(0);
            state.mode = Mode::Picker { title: "Priority", items, selected, target: PickerTarget::Priority(card.id) };
        }
        Action::ToggleCompleted => {
            engine.toggle_card_completed(&card.id);
            let done = engine.card(&card.id).is_some_and(Card::is_completed);
            state.notify(if done { "Marked complete" } else { "Marked incomplete" });
            state.clamp_selection(engine.board());
        }
        Action::ToggleBlocked => {
            engine.toggle_card_blocked(&card.id);
            state.clamp_selection(engine.board());
        }
        _ => {}
    }
}

fn handle_column_action(engine: &mut BoardEngine, state: &mut AppState, action: Action) {
    if action == Action::AddColumn {
        state.mode = Mode::Input { prompt: "New column", buf: TextBuffer::empty(), on_confirm: InputTarget::NewColumn };
        return;
    }
    let Some(column) = engine.columns().get(state.focused_column).map(|c| (*c).clone()) else {
        return;
    };
    match action {
        Action::RenameColumn => {
            state.mode = Mode::Input {
                prompt: "Rename column",
                buf: TextBuffer::new(column.name.clone()),
                on_confirm: InputTarget::RenameColumn(column.id),
            };
        }
        Action::DeleteColumn => {
            state.mode = Mode::Confirm { prompt: "Delete column and its cards?", on_confirm: ConfirmTarget::DeleteColumn(column.id) };
        }
        Action::ToggleColumnCollapsed => engine.toggle_column_collapsed(&column.id),
        Action::SetWipLimit => {
            let current = column.wip_limit.map(|l| l.to_string()).unwrap_or_default();
            state.mode = Mode::Input {
                prompt: "WIP limit (0 clears)",
                buf: TextBuffer::new(current),
                on_confirm: InputTarget::WipLimit(column.id),
            };
        }
        Action::MoveColumnLeft => {
            if let Some(target) = state.focused_column.checked_sub(1) {
                engine.move_column(&column.id, target);
                state.focused_column = target;
            }
        }
        Action::MoveColumnRight => {
            let target = state.focused_column + 1;
            if target < engine.columns().len() {
                engine.move_column(&column.id, target);
                state.focused_column = target;
            }
        }
        _ => {}
    }
}

fn handle_input(engine: &mut BoardEngine, state: &mut AppState, action: Action) {
    if let Mode::Input { buf, .. } | Mode::Filter { buf } = &mut state.mode {
        match action {
            Action::InputChar(c) => buf.insert(c),
            Action::InputBackspace => buf.backspace(),
            Action::InputLeft => buf.move_left(),
            Action::InputRight => buf.move_right(),
            Action::InputHome => buf.home(),
            Action::InputEnd => buf.end(),
            Action::InputDeleteWord => buf.delete_word(),
            _ => {}
        }
    }
    match action {
        Action::InputConfirm => handle_input_confirm(engine, state),
        Action::InputCancel => state.mode = Mode::Normal,
        _ => {}
    }
}

/// Built-in templates followed by the board's saved ones, as (name, id).
fn template_choices(board: &Board) -> Vec<(String, Option<String>)> {
    let mut choices: Vec<(String, Option<String>)> =
        builtin_templates().into_iter().map(|t| (t.name, None)).collect();
    choices.extend(board.templates.iter().map(|t| (t.name.clone(), Some(t.id.clone()))));
    choices
}

fn handle_input_confirm(engine: &mut BoardEngine, state: &mut AppState) {
    let old_mode = std::mem::replace(&mut state.mode, Mode::Normal);

    match old_mode {
        Mode::Input { buf, on_confirm, .. } => {
            let text = buf.input.trim().to_string();
            match on_confirm {
                InputTarget::NewCardTitle => {
                    if text.is_empty() {
                        return;
                    }
                    let Some(column_id) = state.focused_column_id(engine.board()) else {
                        return;
                    };
                    let swim_lane_id = state
                        .selected_card_ref(engine.board())
                        .and_then(|c| c.swim_lane_id.clone());
                    match engine.add_card(&column_id, NewCard { swim_lane_id, ..NewCard::titled(text) }) {
                        Ok(card) => {
                            state.focus_card(engine.board(), &card.id);
                            state.notify("Card created");
                        }
                        Err(e) => state.notify_error(e.to_string()),
                    }
                }
                InputTarget::EditTitle(card_id) => {
                    if !text.is_empty() {
                        engine.update_card(&card_id, CardUpdate { title: Some(text), ..Default::default() });
                    }
                }
                InputTarget::EditTags(card_id) => {
                    let tags = text.split(',').map(|t| t.trim().to_lowercase()).collect();
                    engine.update_card(&card_id, CardUpdate { tags: Some(tags), ..Default::default() });
                    state.clamp_selection(engine.board());
                    state.notify("Tags updated");
                }
                InputTarget::NewColumn => {
                    if !text.is_empty() {
                        let column = engine.add_column(&text);
                        state.focused_column = column.order as usize;
                        state.selected_card = 0;
                    }
                }
                InputTarget::RenameColumn(column_id) => {
                    if !text.is_empty() {
                        engine.update_column(&column_id, ColumnUpdate { name: Some(text), ..Default::default() });
                    }
                }
                InputTarget::WipLimit(column_id) => match text.parse::<u32>() {
                    Ok(limit) => {
                        let wip_limit = (limit > 0).then_some(limit);
                        engine.update_column(&column_id, ColumnUpdate { wip_limit: Some(wip_limit), ..Default::default() });
                    }
                    Err(_) if text.is_empty() => {
                        engine.update_column(&column_id, ColumnUpdate { wip_limit: Some(None), ..Default::default() });
                    }
                    Err(_) => state.notify_error(format!("Not a number: {text}")),
                },
                InputTarget::NewSwimLane => {
                    if !text.is_empty() {
                        engine.add_swim_lane(&text);
                    }
                }
                InputTarget::TemplateName => {
                    if !text.is_empty() {
                        let template = engine.save_as_template(&text, "");
                        state.notify(format!("Saved template {}", template.name));
                    }
                }
            }
        }
        Mode::Filter { buf } => {
            let mut filters = engine.board().filters.clone();
            filters.search = buf.input.trim().to_string();
            engine.set_filters(filters);
            state.clamp_selection(engine.board());
        }
        Mode::Picker { title, mut items, selected, target } => match target {
            PickerTarget::TagFilter => {
                // Toggle and stay open so several tags can be picked.
                if let Some((tag, active)) = items.get_mut(selected) {
                    *active = !*active;
                    let mut filters = engine.board().filters.clone();
                    if *active {
                        filters.tags.push(tag.clone());
                    } else {
                        filters.tags.retain(|t| t != &*tag);
                    }
                    engine.set_filters(filters);
                }
                state.clamp_selection(engine.board());
                state.mode = Mode::Picker { title, items, selected, target: PickerTarget::TagFilter };
            }
            PickerTarget::Priority(card_id) => {
                if let Some(priority) = Priority::ALL.get(selected) {
                    engine.update_card(&card_id, CardUpdate { priority: Some(*priority), ..Default::default() });
                    state.notify(format!("Priority: {priority}"));
                }
            }
            PickerTarget::MoveToColumn(card_id) => {
                let target = engine.columns().get(selected).map(|c| c.id.clone());
                let lane = engine.card(&card_id).and_then(|c| c.swim_lane_id.clone());
                if let Some(column_id) = target {
                    engine.move_card(&card_id, &column_id, usize::MAX, lane.as_deref());
                    state.focus_card(engine.board(), &card_id);
                }
            }
            PickerTarget::Template => {
                let choice = template_choices(engine.board()).into_iter().nth(selected);
                let applied = match choice {
                    Some((_, Some(id))) => engine.apply_saved_template(&id),
                    Some((name, None)) => builtin_templates()
                        .into_iter()
                        .find(|t| t.name == name)
                        .is_some_and(|t| engine.apply_template(&t)),
                    None => false,
                };
                if applied {
                    state.focused_column = 0;
                    state.clamp_selection(engine.board());
                    state.notify("Template applied");
                }
            }
        },
        other => state.mode = other,
    }
}

fn handle_confirm(engine: &mut BoardEngine, state: &mut AppState, action: Action) {
    let old_mode = std::mem::replace(&mut state.mode, Mode::Normal);
    let Mode::Confirm { on_confirm, .. } = old_mode else {
        state.mode = old_mode;
        return;
    };
    if action != Action::Confirm {
        return;
    }
    match on_confirm {
        ConfirmTarget::DeleteCard(card_id) => {
            engine.delete_card(&card_id);
            state.notify("Card deleted (u to undo)");
        }
        ConfirmTarget::DeleteColumn(column_id) => {
            engine.delete_column(&column_id);
            state.notify("Column deleted (u to undo)");
        }
    }
    state.clamp_selection(engine.board());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::storage::init_board;
    use crate::drag::Surface;
    use crossterm::event::KeyModifiers;
    use ratatui::layout::Rect;

    fn setup() -> (tempfile::TempDir, Session, BoardEngine, AppState) {
        let dir = tempfile::tempdir().unwrap();
        let board = Board::new("Test");
        let board_dir = init_board(dir.path(), &board).unwrap();
        let config = AppConfig::default();
        let state = AppState::new(&config);
        let session = Session { board_dir, config };
        (dir, session, BoardEngine::new(board), state)
    }

    fn act(engine: &mut BoardEngine, state: &mut AppState, session: &Session, action: Action) {
        process_action(engine, state, action, session).unwrap();
    }

    fn type_text(engine: &mut BoardEngine, state: &mut AppState, session: &Session, text: &str) {
        for c in text.chars() {
            act(engine, state, session, Action::InputChar(c));
        }
        act(engine, state, session, Action::InputConfirm);
    }

    fn add_cards(engine: &mut BoardEngine, titles: &[&str]) {
        let todo = engine.columns()[0].id.clone();
        for t in titles {
            engine.add_card(&todo, NewCard::titled(*t)).unwrap();
        }
    }

    #[test]
    fn text_buffer_edits_by_char() {
        let mut buf = TextBuffer::new("héllo wörld".into());
        buf.delete_word();
        assert_eq!(buf.input, "héllo ");
        buf.move_left();
        buf.backspace();
        assert_eq!(buf.input, "héll ");
        buf.home();
        buf.insert('>');
        assert_eq!(buf.input, ">héll ");
    }

    #[test]
    fn new_card_is_created_saved_and_selected() {
        let (_dir, session, mut engine, mut state) = setup();
        act(&mut engine, &mut state, &session, Action::NewCard);
        assert!(matches!(state.mode, Mode::Input { on_confirm: InputTarget::NewCardTitle, .. }));
        type_text(&mut engine, &mut state, &session, "Write docs");

        assert_eq!(state.mode, Mode::Normal);
        assert_eq!(state.selected_card_ref(engine.board()).unwrap().title, "Write docs");
        let saved = load_board(&session.board_dir).unwrap();
        assert_eq!(saved.cards.len(), 1);
    }

    #[test]
    fn empty_title_creates_nothing() {
        let (_dir, session, mut engine, mut state) = setup();
        act(&mut engine, &mut state, &session, Action::NewCard);
        type_text(&mut engine, &mut state, &session, "   ");
        assert!(engine.board().cards.is_empty());
    }

    #[test]
    fn undo_and_redo_actions() {
        let (_dir, session, mut engine, mut state) = setup();
        add_cards(&mut engine, &["a"]);
        act(&mut engine, &mut state, &session, Action::DeleteCard);
        act(&mut engine, &mut state, &session, Action::Confirm);
        assert!(engine.board().cards.is_empty());

        act(&mut engine, &mut state, &session, Action::Undo);
        assert_eq!(engine.board().cards.len(), 1);
        assert_eq!(load_board(&session.board_dir).unwrap().cards.len(), 1);
        act(&mut engine, &mut state, &session, Action::Redo);
        assert!(engine.board().cards.is_empty());
    }

    #[test]
    fn deny_keeps_card() {
        let (_dir, session, mut engine, mut state) = setup();
        add_cards(&mut engine, &["a"]);
        act(&mut engine, &mut state, &session, Action::DeleteCard);
        act(&mut engine, &mut state, &session, Action::Deny);
        assert_eq!(state.mode, Mode::Normal);
        assert_eq!(engine.board().cards.len(), 1);
    }

    #[test]
    fn keyboard_moves_reorder_and_change_column() {
        let (_dir, session, mut engine, mut state) = setup();
        add_cards(&mut engine, &["a", "b", "c"]);
        act(&mut engine, &mut state, &session, Action::MoveCardDown);
        let todo = engine.columns()[0].id.clone();
        let titles: Vec<&str> = engine.cards_in_column(&todo).iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, vec!["b", "a", "c"]);
        assert_eq!(state.selected_card, 1);

        act(&mut engine, &mut state, &session, Action::MoveCardNextColumn);
        assert_eq!(state.focused_column, 1);
        assert_eq!(state.selected_card_ref(engine.board()).unwrap().title, "a");
    }

    #[test]
    fn navigation_clamps() {
        let (_dir, session, mut engine, mut state) = setup();
        add_cards(&mut engine, &["a", "b"]);
        for _ in 0..5 {
            act(&mut engine, &mut state, &session, Action::SelectNextCard);
        }
        assert_eq!(state.selected_card, 1);
        for _ in 0..5 {
            act(&mut engine, &mut state, &session, Action::FocusNextColumn);
        }
        assert_eq!(state.focused_column, 2);
        assert_eq!(state.selected_card, 0);
    }

    #[test]
    fn space_mode_lasts_one_key() {
        let (_dir, session, mut engine, mut state) = setup();
        act(&mut engine, &mut state, &session, Action::EnterSpaceMode);
        assert_eq!(state.mode, Mode::Space);
        act(&mut engine, &mut state, &session, Action::None);
        assert_eq!(state.mode, Mode::Normal);
    }

    #[test]
    fn wip_limit_input_parses_and_clears() {
        let (_dir, session, mut engine, mut state) = setup();
        act(&mut engine, &mut state, &session, Action::SetWipLimit);
        type_text(&mut engine, &mut state, &session, "3");
        assert_eq!(engine.columns()[0].wip_limit, Some(3));

        act(&mut engine, &mut state, &session, Action::SetWipLimit);
        act(&mut engine, &mut state, &session, Action::InputBackspace);
        type_text(&mut engine, &mut state, &session, "0");
        assert_eq!(engine.columns()[0].wip_limit, None);

        act(&mut engine, &mut state, &session, Action::SetWipLimit);
        type_text(&mut engine, &mut state, &session, "lots");
        assert_eq!(state.notification_level, NotificationLevel::Error);
    }

    #[test]
    fn filter_confirm_sets_search() {
        let (_dir, session, mut engine, mut state) = setup();
        add_cards(&mut engine, &["alpha", "beta"]);
        act(&mut engine, &mut state, &session, Action::StartFilter);
        type_text(&mut engine, &mut state, &session, "bet");
        assert_eq!(engine.board().filters.search, "bet");
        assert_eq!(state.visible_cards(engine.board()).len(), 1);

        act(&mut engine, &mut state, &session, Action::ClearFilters);
        assert!(engine.board().filters.is_empty());
    }

    #[test]
    fn column_mode_moves_focused_column() {
        let (_dir, session, mut engine, mut state) = setup();
        let first = engine.columns()[0].id.clone();
        act(&mut engine, &mut state, &session, Action::EnterColumnMode);
        act(&mut engine, &mut state, &session, Action::MoveColumnRight);
        assert_eq!(engine.columns()[1].id, first);
        assert_eq!(state.focused_column, 1);
    }

    #[test]
    fn template_picker_applies_builtin() {
        let (_dir, session, mut engine, mut state) = setup();
        act(&mut engine, &mut state, &session, Action::ApplyTemplate);
        let Mode::Picker { items, .. } = &state.mode else {
            panic!("expected picker");
        };
        let scrum = items.iter().position(|(n, _)| n == "scrum").unwrap();
        for _ in 0..scrum {
            act(&mut engine, &mut state, &session, Action::SelectNextCard);
        }
        act(&mut engine, &mut state, &session, Action::InputConfirm);
        assert_eq!(engine.columns().len(), 5);
        assert_eq!(engine.columns()[0].name, "Backlog");
    }

    #[test]
    fn mouse_drag_moves_card_and_saves() {
        let (_dir, session, mut engine, mut state) = setup();
        add_cards(&mut engine, &["a", "b"]);
        let area = Rect::new(0, 0, 60, 30);
        state.drag.attach(Surface::from_board(engine.board(), area, 3));
        let mouse = |kind, column, row| MouseEvent { kind, column, row, modifiers: KeyModifiers::NONE };

        handle_mouse(&mut engine, &mut state, mouse(MouseEventKind::Down(MouseButton::Left), 5, 2), &session).unwrap();
        assert_eq!(state.drag.dragged_card(), engine.board().cards.first().map(|c| c.id.as_str()));
        handle_mouse(&mut engine, &mut state, mouse(MouseEventKind::Drag(MouseButton::Left), 45, 2), &session).unwrap();
        state.drag.frame();
        handle_mouse(&mut engine, &mut state, mouse(MouseEventKind::Up(MouseButton::Left), 45, 2), &session).unwrap();

        let done = engine.columns()[2].id.clone();
        assert_eq!(engine.cards_in_column(&done).len(), 1);
        assert_eq!(state.focused_column, 2);
        let saved = load_board(&session.board_dir).unwrap();
        assert_eq!(saved.column_cards(&done).len(), 1);
    }

    #[test]
    fn mouse_ignored_outside_normal_mode() {
        let (_dir, session, mut engine, mut state) = setup();
        add_cards(&mut engine, &["a"]);
        state.drag.attach(Surface::from_board(engine.board(), Rect::new(0, 0, 60, 30), 3));
        state.mode = Mode::Help;
        let down = MouseEvent { kind: MouseEventKind::Down(MouseButton::Left), column: 5, row: 2, modifiers: KeyModifiers::NONE };
        handle_mouse(&mut engine, &mut state, down, &session).unwrap();
        assert!(state.drag.is_idle());
    }
}
