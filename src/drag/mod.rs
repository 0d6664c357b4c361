//! Pointer-driven reordering of cards and columns.
//!
//! The engine is a small state machine over a [`Surface`]:
//!
//! ```text
//! Idle ──down on card──────────────▶ DraggingCard ──up──▶ move_card ──▶ Idle
//! Idle ──down on header──▶ PendingColumn ──moved past threshold──▶ DraggingColumn
//!                               │                                      │
//!                               └──up (no drag)──▶ Idle     up──▶ move_column ──▶ Idle
//! ```
//!
//! Card moves are throttled: [`DragEngine::pointer_move`] only records the
//! latest position and [`DragEngine::frame`] processes it once per rendered
//! frame. Column header moves apply immediately. Board state is only touched
//! on release, through [`BoardEngine`].

pub mod surface;

use ratatui::layout::Position;
use tracing::{debug, trace};

use crate::board::engine::BoardEngine;
pub use surface::{Container, Node, Surface};

/// Cells a header must travel before a column drag starts.
pub const DEFAULT_COLUMN_THRESHOLD: u16 = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DragState {
    Idle,
    /// Pointer went down on a header but has not moved far enough yet.
    PendingColumn { column_id: String, origin: Position },
    DraggingCard { card_id: String },
    DraggingColumn { column_id: String, original_order: Vec<String> },
}

/// What a release did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropOutcome {
    /// No gesture was in progress.
    Ignored,
    /// The gesture ended without changing the board.
    Cancelled,
    CardMoved {
        card_id: String,
        column_id: String,
        swim_lane_id: Option<String>,
        index: usize,
    },
    ColumnMoved { column_id: String, index: usize },
}

/// Where the placeholder currently sits, as a card index in a partition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaceholderPosition {
    pub column_id: String,
    pub swim_lane_id: Option<String>,
    pub index: usize,
}

#[derive(Debug)]
pub struct DragEngine {
    surface: Option<Surface>,
    state: DragState,
    /// Latest unprocessed pointer position of a card drag.
    pending: Option<Position>,
    pointer: Option<Position>,
    column_threshold: u16,
}

impl Default for DragEngine {
    fn default() -> Self {
        Self::new(DEFAULT_COLUMN_THRESHOLD)
    }
}

impl DragEngine {
    pub fn new(column_threshold: u16) -> Self {
        Self {
            surface: None,
            state: DragState::Idle,
            pending: None,
            pointer: None,
            column_threshold,
        }
    }

    /// Bind to a freshly rendered surface. Any previous binding and any
    /// in-flight gesture are torn down first, so attaching twice is the same
    /// as attaching once.
    pub fn attach(&mut self, surface: Surface) {
        self.cleanup();
        self.surface = Some(surface);
    }

    /// Cancel any gesture and drop the surface.
    pub fn cleanup(&mut self) {
        self.cancel();
        self.surface = None;
    }

    /// Abort the current gesture without touching the board. The surface is
    /// restored to how it was before the gesture began.
    pub fn cancel(&mut self) {
        let state = std::mem::replace(&mut self.state, DragState::Idle);
        if state != DragState::Idle {
            debug!(?state, "drag cancelled");
        }
        self.teardown(&state, true);
    }

    pub fn state(&self) -> &DragState {
        &self.state
    }

    pub fn is_idle(&self) -> bool {
        self.state == DragState::Idle
    }

    pub fn surface(&self) -> Option<&Surface> {
        self.surface.as_ref()
    }

    /// Last pointer position seen during a gesture.
    pub fn pointer(&self) -> Option<Position> {
        self.pointer
    }

    pub fn dragged_card(&self) -> Option<&str> {
        match &self.state {
            DragState::DraggingCard { card_id } => Some(card_id),
            _ => None,
        }
    }

    pub fn dragged_column(&self) -> Option<&str> {
        match &self.state {
            DragState::DraggingColumn { column_id, .. } => Some(column_id),
            _ => None,
        }
    }

    /// Header order as currently shown, while a column drag is live.
    pub fn column_order(&self) -> Option<&[String]> {
        match self.state {
            DragState::DraggingColumn { .. } => self.surface.as_ref().map(Surface::column_order),
            _ => None,
        }
    }

    pub fn placeholder_position(&self) -> Option<PlaceholderPosition> {
        let card_id = self.dragged_card()?;
        let surface = self.surface.as_ref()?;
        let (ci, idx) = surface.placeholder()?;
        let container = &surface.containers[ci];
        Some(PlaceholderPosition {
            column_id: container.column_id.clone(),
            swim_lane_id: container.swim_lane_id.clone(),
            index: container.cards_before(idx, card_id),
        })
    }

    /// Start a gesture. Returns true when the pointer landed on a card or a
    /// column header.
    pub fn pointer_down(&mut self, pos: Position) -> bool {
        if !self.is_idle() {
            return false;
        }
        let Some(surface) = self.surface.as_mut() else {
            return false;
        };

        if let Some((_, _, card_id)) = surface.card_at(pos) {
            let card_id = card_id.to_string();
            let Some((ci, idx, height)) = surface.hide_card(&card_id) else {
                return false;
            };
            // Directly after the hidden card, so it reads as the card's own slot.
            surface.insert_placeholder(ci, idx + 1, height);
            surface.set_drag_over(Some(ci));
            debug!(card = %card_id, "card drag started");
            self.state = DragState::DraggingCard { card_id };
            self.pointer = Some(pos);
            return true;
        }

        if let Some(hi) = surface.header_at(pos) {
            let column_id = surface.column_order()[hi].clone();
            self.state = DragState::PendingColumn { column_id, origin: pos };
            self.pointer = Some(pos);
            return true;
        }
        false
    }

    pub fn pointer_move(&mut self, pos: Position) {
        match &self.state {
            DragState::Idle => {}
            DragState::DraggingCard { .. } => {
                // Coalesced: only the latest position survives until the next frame.
                self.pending = Some(pos);
                self.pointer = Some(pos);
            }
            DragState::PendingColumn { column_id, origin } => {
                self.pointer = Some(pos);
                if !exceeds_threshold(*origin, pos, self.column_threshold) {
                    return;
                }
                let column_id = column_id.clone();
                let original_order = self
                    .surface
                    .as_ref()
                    .map(|s| s.column_order().to_vec())
                    .unwrap_or_default();
                debug!(column = %column_id, "column drag started");
                self.state = DragState::DraggingColumn { column_id, original_order };
                self.relocate_column(pos);
            }
            DragState::DraggingColumn { .. } => {
                self.pointer = Some(pos);
                self.relocate_column(pos);
            }
        }
    }

    /// Process the pending card position, if any. Returns true when the
    /// placeholder moved.
    pub fn frame(&mut self) -> bool {
        match self.pending.take() {
            Some(pos) => self.process_card_move(pos),
            None => false,
        }
    }

    /// Finish the gesture at `pos`, committing through `board`.
    pub fn pointer_up(&mut self, pos: Position, board: &mut BoardEngine) -> DropOutcome {
        self.pointer = Some(pos);
        let outcome = match &self.state {
            DragState::Idle => return DropOutcome::Ignored,
            DragState::PendingColumn { .. } => DropOutcome::Cancelled,
            DragState::DraggingColumn { column_id, .. } => {
                let column_id = column_id.clone();
                self.relocate_column(pos);
                let index = self
                    .surface
                    .as_ref()
                    .and_then(|s| s.column_order().iter().position(|id| *id == column_id));
                match index {
                    Some(index) => {
                        board.move_column(&column_id, index);
                        DropOutcome::ColumnMoved { column_id, index }
                    }
                    None => DropOutcome::Cancelled,
                }
            }
            DragState::DraggingCard { card_id } => {
                let card_id = card_id.clone();
                // Flush so the drop sees the release position, not a stale frame.
                self.pending = None;
                self.process_card_move(pos);
                match self.card_drop_target(pos, &card_id) {
                    Some((column_id, swim_lane_id, index)) => {
                        board.move_card(&card_id, &column_id, index, swim_lane_id.as_deref());
                        DropOutcome::CardMoved { card_id, column_id, swim_lane_id, index }
                    }
                    None => DropOutcome::Cancelled,
                }
            }
        };
        debug!(?outcome, "drop");

        let state = std::mem::replace(&mut self.state, DragState::Idle);
        let restore = matches!(outcome, DropOutcome::Cancelled);
        self.teardown(&state, restore);
        outcome
    }

    /// Partition and index a card released at `pos` lands at. `None` when the
    /// pointer is outside every container.
    fn card_drop_target(&self, pos: Position, card_id: &str) -> Option<(String, Option<String>, usize)> {
        let surface = self.surface.as_ref()?;
        let ci = surface.container_at(pos)?;
        let container = &surface.containers[ci];
        let index = match container.placeholder_index() {
            Some(idx) => container.cards_before(idx, card_id),
            None => container.index_by_midpoint(pos.y, card_id),
        };
        Some((container.column_id.clone(), container.swim_lane_id.clone(), index))
    }

    fn process_card_move(&mut self, pos: Position) -> bool {
        let Some(surface) = self.surface.as_mut() else {
            return false;
        };
        // Outside every container the placeholder stays where it was.
        let Some(ci) = surface.container_at(pos) else {
            return false;
        };
        surface.set_drag_over(Some(ci));
        let target = surface.containers[ci].insertion_index(pos.y);
        let moved = surface.move_placeholder(ci, target);
        if moved {
            trace!(container = ci, index = target, "placeholder moved");
        }
        moved
    }

    fn relocate_column(&mut self, pos: Position) {
        let DragState::DraggingColumn { column_id, .. } = &self.state else {
            return;
        };
        let Some(surface) = self.surface.as_mut() else {
            return;
        };
        let Some(from) = surface.column_order().iter().position(|id| id == column_id) else {
            return;
        };
        let to = surface.header_insertion_index(from, pos.x);
        if to != from {
            surface.move_header(from, to);
        }
    }

    /// Remove every transient marker left by `state`. With `restore`, header
    /// order goes back to how it was before the gesture.
    fn teardown(&mut self, state: &DragState, restore: bool) {
        self.pending = None;
        self.pointer = None;
        let Some(surface) = self.surface.as_mut() else {
            return;
        };
        surface.remove_placeholder();
        surface.set_drag_over(None);
        match state {
            DragState::DraggingCard { card_id } => surface.show_card(card_id),
            DragState::DraggingColumn { original_order, .. } if restore => {
                surface.set_column_order(original_order.clone());
            }
            _ => {}
        }
    }
}

fn exceeds_threshold(origin: Position, pos: Position, threshold: u16) -> bool {
    let dx = i32::from(pos.x) - i32::from(origin.x);
    let dy = i32::from(pos.y) - i32::from(origin.y);
    let t = i32::from(threshold);
    dx * dx + dy * dy > t * t
}
