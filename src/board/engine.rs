use std::collections::HashMap;

use chrono::{NaiveDate, Utc};
use tracing::{debug, warn};

use super::filter::filter_cards;
use super::history::{History, DEFAULT_CAPACITY};
use super::template::{apply_to, template_from_board};
use super::{
    Board, BoardTemplate, Card, CardType, ChecklistItem, Column, Filters, Milestone, Priority,
    StatusCategory, StatusGroup, SwimLane, COLUMN_PALETTE, LANE_PALETTE,
};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BoardError {
    #[error("column not found: {0}")]
    ColumnNotFound(String),
}

/// Fields for a new card. Anything left `None` gets the card default.
#[derive(Debug, Clone, Default)]
pub struct NewCard {
    pub title: String,
    pub description: String,
    pub priority: Option<Priority>,
    pub card_type: Option<CardType>,
    pub tags: Vec<String>,
    pub assignees: Vec<String>,
    pub swim_lane_id: Option<String>,
    pub color: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub due_date: Option<NaiveDate>,
}

impl NewCard {
    pub fn titled(title: impl Into<String>) -> Self {
        Self { title: title.into(), ..Default::default() }
    }
}

/// Whitelisted card fields for [`BoardEngine::update_card`].
///
/// `Some(..)` replaces the field. Nullable fields use `Option<Option<T>>`, so
/// `Some(None)` clears them. List fields are replaced wholesale.
#[derive(Debug, Clone, Default)]
pub struct CardUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<Priority>,
    pub card_type: Option<CardType>,
    pub tags: Option<Vec<String>>,
    pub assignees: Option<Vec<String>>,
    pub checklist: Option<Vec<ChecklistItem>>,
    pub color: Option<Option<String>>,
    pub start_date: Option<Option<NaiveDate>>,
    pub due_date: Option<Option<NaiveDate>>,
    pub blocked: Option<bool>,
    pub blocked_reason: Option<Option<String>>,
    pub completed: Option<bool>,
}

#[derive(Debug, Clone, Default)]
pub struct ColumnUpdate {
    pub name: Option<String>,
    pub color: Option<String>,
    pub wip_limit: Option<Option<u32>>,
    pub collapsed: Option<bool>,
}

#[derive(Debug, Clone, Default)]
pub struct ChecklistItemUpdate {
    pub text: Option<String>,
    pub completed: Option<bool>,
}

#[derive(Debug, Clone, Default)]
pub struct SwimLaneUpdate {
    pub name: Option<String>,
    pub color: Option<String>,
    pub collapsed: Option<bool>,
}

#[derive(Debug, Clone, Default)]
pub struct MilestoneUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub due_date: Option<Option<NaiveDate>>,
    pub color: Option<Option<String>>,
    pub completed: Option<bool>,
}

#[derive(Debug, Clone, Default)]
pub struct SettingsUpdate {
    pub wip_limits_enabled: Option<bool>,
    pub show_card_ids: Option<bool>,
    pub default_card_type: Option<CardType>,
}

/// Entities kept in a dense `order` sequence of their own.
trait Ordered {
    fn id(&self) -> &str;
    fn order(&self) -> u32;
    fn set_order(&mut self, order: u32);
}

impl Ordered for Column {
    fn id(&self) -> &str {
        &self.id
    }
    fn order(&self) -> u32 {
        self.order
    }
    fn set_order(&mut self, order: u32) {
        self.order = order;
    }
}

impl Ordered for SwimLane {
    fn id(&self) -> &str {
        &self.id
    }
    fn order(&self) -> u32 {
        self.order
    }
    fn set_order(&mut self, order: u32) {
        self.order = order;
    }
}

/// Move one item to `new_order` (clamped), shifting every item between the old
/// and new slot by one toward the gap. Returns false when nothing changed.
fn move_ordered<T: Ordered>(items: &mut [T], id: &str, new_order: usize) -> bool {
    let Some(pos) = items.iter().position(|i| i.id() == id) else {
        return false;
    };
    let new_order = new_order.min(items.len() - 1) as u32;
    let old_order = items[pos].order();
    if old_order == new_order {
        return false;
    }
    for (i, item) in items.iter_mut().enumerate() {
        if i == pos {
            continue;
        }
        let o = item.order();
        if old_order < new_order && o > old_order && o <= new_order {
            item.set_order(o - 1);
        } else if new_order < old_order && o >= new_order && o < old_order {
            item.set_order(o + 1);
        }
    }
    items[pos].set_order(new_order);
    true
}

/// Reassign orders `0..n` keeping the current relative sequence.
fn normalize_ordered<T: Ordered>(items: &mut [T]) {
    let mut idx: Vec<usize> = (0..items.len()).collect();
    idx.sort_by_key(|&i| items[i].order());
    for (order, i) in idx.into_iter().enumerate() {
        items[i].set_order(order as u32);
    }
}

/// Indices into `cards` for one partition, sorted by order.
fn partition_indices(cards: &[Card], column_id: &str, swim_lane_id: Option<&str>) -> Vec<usize> {
    let mut idx: Vec<usize> = cards
        .iter()
        .enumerate()
        .filter(|(_, c)| c.in_partition(column_id, swim_lane_id))
        .map(|(i, _)| i)
        .collect();
    idx.sort_by_key(|&i| cards[i].order);
    idx
}

fn renumber_partition(cards: &mut [Card], column_id: &str, swim_lane_id: Option<&str>) {
    for (order, i) in partition_indices(cards, column_id, swim_lane_id).into_iter().enumerate() {
        cards[i].order = order as u32;
    }
}

fn clean_list(values: Vec<String>) -> Vec<String> {
    values
        .into_iter()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .collect()
}

/// Owner of the live board and its undo history.
///
/// Every mutation runs to completion, refreshes `updated_at`, and pushes a
/// snapshot. Readers should go through [`BoardEngine::board`] after each
/// mutation instead of holding on to earlier borrows.
#[derive(Debug)]
pub struct BoardEngine {
    board: Board,
    history: History,
}

impl BoardEngine {
    pub fn new(board: Board) -> Self {
        Self::with_capacity(board, DEFAULT_CAPACITY)
    }

    pub fn with_capacity(mut board: Board, capacity: usize) -> Self {
        board.reseed_next_id();
        let history = History::new(board.clone(), capacity);
        Self { board, history }
    }

    /// Replace the live board wholesale and restart history from it.
    pub fn load(&mut self, mut board: Board) {
        board.reseed_next_id();
        debug!(board = %board.id, "load board");
        self.history.reset(board.clone());
        self.board = board;
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    fn commit(&mut self, op: &str) {
        self.board.updated_at = Utc::now();
        self.history.push(self.board.clone());
        debug!(op, history = self.history.len(), cursor = self.history.cursor(), "commit");
    }

    // ── History ──

    pub fn undo(&mut self) -> bool {
        match self.history.undo() {
            Some(snapshot) => {
                self.board = snapshot;
                debug!(cursor = self.history.cursor(), "undo");
                true
            }
            None => false,
        }
    }

    pub fn redo(&mut self) -> bool {
        match self.history.redo() {
            Some(snapshot) => {
                self.board = snapshot;
                debug!(cursor = self.history.cursor(), "redo");
                true
            }
            None => false,
        }
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn history_capacity(&self) -> usize {
        self.history.capacity()
    }

    // ── Columns ──

    pub fn add_column(&mut self, name: &str) -> Column {
        let count = self.board.columns.len();
        let column = Column {
            id: self.board.mint_id("col"),
            name: name.to_string(),
            order: count as u32,
            color: COLUMN_PALETTE[count % COLUMN_PALETTE.len()].to_string(),
            wip_limit: None,
            collapsed: false,
        };
        self.board.columns.push(column.clone());
        self.commit("add column");
        column
    }

    pub fn update_column(&mut self, column_id: &str, update: ColumnUpdate) {
        let Some(column) = self.board.columns.iter_mut().find(|c| c.id == column_id) else {
            return;
        };
        if let Some(name) = update.name {
            column.name = name;
        }
        if let Some(color) = update.color {
            column.color = color;
        }
        if let Some(wip_limit) = update.wip_limit {
            column.wip_limit = wip_limit;
        }
        if let Some(collapsed) = update.collapsed {
            column.collapsed = collapsed;
        }
        self.commit("update column");
    }

    pub fn toggle_column_collapsed(&mut self, column_id: &str) {
        if let Some(collapsed) = self.board.column(column_id).map(|c| c.collapsed) {
            self.update_column(column_id, ColumnUpdate { collapsed: Some(!collapsed), ..Default::default() });
        }
    }

    /// Move a column to `new_order`; out-of-range orders are clamped.
    pub fn move_column(&mut self, column_id: &str, new_order: usize) {
        if move_ordered(&mut self.board.columns, column_id, new_order) {
            self.commit("move column");
        }
    }

    /// Delete a column and every card in it.
    pub fn delete_column(&mut self, column_id: &str) {
        let before = self.board.columns.len();
        self.board.columns.retain(|c| c.id != column_id);
        if self.board.columns.len() == before {
            return;
        }
        self.board.cards.retain(|c| c.column_id != column_id);
        for group in &mut self.board.status_groups {
            group.column_ids.retain(|id| id != column_id);
        }
        normalize_ordered(&mut self.board.columns);
        self.commit("delete column");
    }

    // ── Cards ──

    /// Append a card to the end of its (column, lane) partition.
    pub fn add_card(&mut self, column_id: &str, new: NewCard) -> Result<Card, BoardError> {
        if self.board.column(column_id).is_none() {
            return Err(BoardError::ColumnNotFound(column_id.to_string()));
        }
        let swim_lane_id = match new.swim_lane_id {
            Some(lane) if self.board.swim_lane(&lane).is_some() => Some(lane),
            Some(lane) => {
                warn!(lane = %lane, "unknown swim lane on new card, using no lane");
                None
            }
            None => None,
        };
        let order = partition_indices(&self.board.cards, column_id, swim_lane_id.as_deref()).len();
        let now = Utc::now();
        let card = Card {
            id: self.board.mint_id("card"),
            column_id: column_id.to_string(),
            swim_lane_id,
            order: order as u32,
            title: new.title,
            description: new.description,
            priority: new.priority.unwrap_or_default(),
            card_type: new.card_type.unwrap_or(self.board.settings.default_card_type),
            tags: clean_list(new.tags),
            assignees: clean_list(new.assignees),
            checklist: Vec::new(),
            color: new.color,
            start_date: new.start_date,
            due_date: new.due_date,
            blocked: false,
            blocked_reason: None,
            completed_at: None,
            created_at: now,
            updated_at: now,
        };
        self.board.cards.push(card.clone());
        self.commit("add card");
        Ok(card)
    }

    pub fn update_card(&mut self, card_id: &str, update: CardUpdate) {
        let Some(card) = self.board.cards.iter_mut().find(|c| c.id == card_id) else {
            return;
        };
        if let Some(title) = update.title {
            card.title = title;
        }
        if let Some(description) = update.description {
            card.description = description;
        }
        if let Some(priority) = update.priority {
            card.priority = priority;
        }
        if let Some(card_type) = update.card_type {
            card.card_type = card_type;
        }
        if let Some(tags) = update.tags {
            card.tags = clean_list(tags);
        }
        if let Some(assignees) = update.assignees {
            card.assignees = clean_list(assignees);
        }
        if let Some(checklist) = update.checklist {
            card.checklist = checklist
                .into_iter()
                .filter(|item| !item.text.trim().is_empty())
                .collect();
        }
        if let Some(color) = update.color {
            card.color = color;
        }
        if let Some(start_date) = update.start_date {
            card.start_date = start_date;
        }
        if let Some(due_date) = update.due_date {
            card.due_date = due_date;
        }
        if let Some(blocked) = update.blocked {
            card.blocked = blocked;
        }
        if let Some(reason) = update.blocked_reason {
            card.blocked_reason = reason;
        }
        match update.completed {
            Some(true) if card.completed_at.is_none() => card.completed_at = Some(Utc::now()),
            Some(false) => card.completed_at = None,
            _ => {}
        }
        card.touch();
        self.commit("update card");
    }

    pub fn toggle_card_completed(&mut self, card_id: &str) {
        if let Some(done) = self.board.card(card_id).map(Card::is_completed) {
            self.update_card(card_id, CardUpdate { completed: Some(!done), ..Default::default() });
        }
    }

    pub fn toggle_card_blocked(&mut self, card_id: &str) {
        if let Some(blocked) = self.board.card(card_id).map(|c| c.blocked) {
            self.update_card(card_id, CardUpdate { blocked: Some(!blocked), ..Default::default() });
        }
    }

    pub fn delete_card(&mut self, card_id: &str) {
        let Some(idx) = self.board.cards.iter().position(|c| c.id == card_id) else {
            return;
        };
        let card = self.board.cards.remove(idx);
        renumber_partition(&mut self.board.cards, &card.column_id, card.swim_lane_id.as_deref());
        self.commit("delete card");
    }

    /// Move a card into `to_column_id`/`to_swim_lane_id` at `new_order`.
    ///
    /// `new_order` is the index among the destination's other cards and is
    /// clamped to the partition length. Both the source and destination
    /// partitions are left dense. Moving to the current position, or naming an
    /// unknown card, column or lane, changes nothing.
    pub fn move_card(
        &mut self,
        card_id: &str,
        to_column_id: &str,
        new_order: usize,
        to_swim_lane_id: Option<&str>,
    ) {
        let Some(idx) = self.board.cards.iter().position(|c| c.id == card_id) else {
            return;
        };
        if self.board.column(to_column_id).is_none() {
            return;
        }
        if let Some(lane) = to_swim_lane_id {
            if self.board.swim_lane(lane).is_none() {
                return;
            }
        }

        let from_column = self.board.cards[idx].column_id.clone();
        let from_lane = self.board.cards[idx].swim_lane_id.clone();
        let same_partition = from_column == to_column_id && from_lane.as_deref() == to_swim_lane_id;

        let mut dest: Vec<usize> = partition_indices(&self.board.cards, to_column_id, to_swim_lane_id)
            .into_iter()
            .filter(|&i| i != idx)
            .collect();
        let insert_at = new_order.min(dest.len());

        if same_partition {
            let current = partition_indices(&self.board.cards, to_column_id, to_swim_lane_id)
                .iter()
                .position(|&i| i == idx);
            if current == Some(insert_at) {
                return;
            }
        }

        dest.insert(insert_at, idx);
        {
            let card = &mut self.board.cards[idx];
            card.column_id = to_column_id.to_string();
            card.swim_lane_id = to_swim_lane_id.map(str::to_string);
            card.touch();
        }
        for (order, &i) in dest.iter().enumerate() {
            self.board.cards[i].order = order as u32;
        }
        if !same_partition {
            renumber_partition(&mut self.board.cards, &from_column, from_lane.as_deref());
        }
        debug!(card = card_id, column = to_column_id, order = insert_at, "move card");
        self.commit("move card");
    }

    /// Copy a card to the end of its partition with a fresh identity.
    pub fn duplicate_card(&mut self, card_id: &str) -> Option<Card> {
        let source = self.board.card(card_id)?.clone();
        let order = partition_indices(&self.board.cards, &source.column_id, source.swim_lane_id.as_deref()).len();
        let now = Utc::now();
        let mut copy = source;
        copy.id = self.board.mint_id("card");
        copy.title = format!("{} (copy)", copy.title);
        copy.order = order as u32;
        copy.created_at = now;
        copy.updated_at = now;
        for item in &mut copy.checklist {
            item.id = self.board.mint_id("item");
        }
        self.board.cards.push(copy.clone());
        self.commit("duplicate card");
        Some(copy)
    }

    // ── Checklist ──

    pub fn add_checklist_item(&mut self, card_id: &str, text: &str) -> Option<ChecklistItem> {
        self.board.card(card_id)?;
        let item = ChecklistItem {
            id: self.board.mint_id("item"),
            text: text.to_string(),
            completed: false,
        };
        let card = self.board.cards.iter_mut().find(|c| c.id == card_id)?;
        card.checklist.push(item.clone());
        card.touch();
        self.commit("add checklist item");
        Some(item)
    }

    pub fn update_checklist_item(&mut self, card_id: &str, item_id: &str, update: ChecklistItemUpdate) {
        let Some(card) = self.board.cards.iter_mut().find(|c| c.id == card_id) else {
            return;
        };
        let Some(item) = card.checklist.iter_mut().find(|i| i.id == item_id) else {
            return;
        };
        if let Some(text) = update.text {
            item.text = text;
        }
        if let Some(completed) = update.completed {
            item.completed = completed;
        }
        card.touch();
        self.commit("update checklist item");
    }

    pub fn toggle_checklist_item(&mut self, card_id: &str, item_id: &str) {
        let completed = self
            .board
            .card(card_id)
            .and_then(|c| c.checklist.iter().find(|i| i.id == item_id))
            .map(|i| i.completed);
        if let Some(completed) = completed {
            self.update_checklist_item(
                card_id,
                item_id,
                ChecklistItemUpdate { completed: Some(!completed), ..Default::default() },
            );
        }
    }

    pub fn delete_checklist_item(&mut self, card_id: &str, item_id: &str) {
        let Some(card) = self.board.cards.iter_mut().find(|c| c.id == card_id) else {
            return;
        };
        let before = card.checklist.len();
        card.checklist.retain(|i| i.id != item_id);
        if card.checklist.len() == before {
            return;
        }
        card.touch();
        self.commit("delete checklist item");
    }

    // ── Swim lanes ──

    pub fn add_swim_lane(&mut self, name: &str) -> SwimLane {
        let count = self.board.swim_lanes.len();
        let lane = SwimLane {
            id: self.board.mint_id("lane"),
            name: name.to_string(),
            order: count as u32,
            color: LANE_PALETTE[count % LANE_PALETTE.len()].to_string(),
            collapsed: false,
        };
        self.board.swim_lanes.push(lane.clone());
        self.commit("add swim lane");
        lane
    }

    pub fn update_swim_lane(&mut self, lane_id: &str, update: SwimLaneUpdate) {
        let Some(lane) = self.board.swim_lanes.iter_mut().find(|l| l.id == lane_id) else {
            return;
        };
        if let Some(name) = update.name {
            lane.name = name;
        }
        if let Some(color) = update.color {
            lane.color = color;
        }
        if let Some(collapsed) = update.collapsed {
            lane.collapsed = collapsed;
        }
        self.commit("update swim lane");
    }

    pub fn move_swim_lane(&mut self, lane_id: &str, new_order: usize) {
        if move_ordered(&mut self.board.swim_lanes, lane_id, new_order) {
            self.commit("move swim lane");
        }
    }

    /// Delete a lane. Its cards drop into the "no lane" partition of their
    /// column, after the cards already there, keeping their relative order.
    pub fn delete_swim_lane(&mut self, lane_id: &str) {
        let before = self.board.swim_lanes.len();
        self.board.swim_lanes.retain(|l| l.id != lane_id);
        if self.board.swim_lanes.len() == before {
            return;
        }

        let cards = &mut self.board.cards;
        let mut next_order: HashMap<String, u32> = HashMap::new();
        for card in cards.iter().filter(|c| c.swim_lane_id.is_none()) {
            *next_order.entry(card.column_id.clone()).or_insert(0) += 1;
        }
        let mut orphans: Vec<usize> = cards
            .iter()
            .enumerate()
            .filter(|(_, c)| c.swim_lane_id.as_deref() == Some(lane_id))
            .map(|(i, _)| i)
            .collect();
        orphans.sort_by(|&a, &b| {
            cards[a]
                .column_id
                .cmp(&cards[b].column_id)
                .then(cards[a].order.cmp(&cards[b].order))
        });
        for i in orphans {
            let slot = next_order.entry(cards[i].column_id.clone()).or_insert(0);
            cards[i].swim_lane_id = None;
            cards[i].order = *slot;
            *slot += 1;
        }

        normalize_ordered(&mut self.board.swim_lanes);
        self.commit("delete swim lane");
    }

    // ── Milestones ──

    pub fn add_milestone(&mut self, name: &str, due_date: Option<NaiveDate>) -> Milestone {
        let milestone = Milestone {
            id: self.board.mint_id("milestone"),
            name: name.to_string(),
            description: String::new(),
            due_date,
            color: None,
            card_ids: Vec::new(),
            completed: false,
        };
        self.board.milestones.push(milestone.clone());
        self.commit("add milestone");
        milestone
    }

    pub fn update_milestone(&mut self, milestone_id: &str, update: MilestoneUpdate) {
        let Some(m) = self.board.milestones.iter_mut().find(|m| m.id == milestone_id) else {
            return;
        };
        if let Some(name) = update.name {
            m.name = name;
        }
        if let Some(description) = update.description {
            m.description = description;
        }
        if let Some(due_date) = update.due_date {
            m.due_date = due_date;
        }
        if let Some(color) = update.color {
            m.color = color;
        }
        if let Some(completed) = update.completed {
            m.completed = completed;
        }
        self.commit("update milestone");
    }

    pub fn delete_milestone(&mut self, milestone_id: &str) {
        let before = self.board.milestones.len();
        self.board.milestones.retain(|m| m.id != milestone_id);
        if self.board.milestones.len() != before {
            self.commit("delete milestone");
        }
    }

    pub fn link_card_to_milestone(&mut self, milestone_id: &str, card_id: &str) {
        if self.board.card(card_id).is_none() {
            return;
        }
        let Some(m) = self.board.milestones.iter_mut().find(|m| m.id == milestone_id) else {
            return;
        };
        if m.card_ids.iter().any(|id| id == card_id) {
            return;
        }
        m.card_ids.push(card_id.to_string());
        self.commit("link card to milestone");
    }

    pub fn unlink_card_from_milestone(&mut self, milestone_id: &str, card_id: &str) {
        let Some(m) = self.board.milestones.iter_mut().find(|m| m.id == milestone_id) else {
            return;
        };
        let before = m.card_ids.len();
        m.card_ids.retain(|id| id != card_id);
        if m.card_ids.len() != before {
            self.commit("unlink card from milestone");
        }
    }

    /// Cards referenced by a milestone, skipping ids that no longer exist.
    pub fn milestone_cards(&self, milestone_id: &str) -> Vec<&Card> {
        self.board
            .milestone(milestone_id)
            .map(|m| m.card_ids.iter().filter_map(|id| self.board.card(id)).collect())
            .unwrap_or_default()
    }

    /// `(completed, total)` over the milestone's live cards.
    pub fn milestone_progress(&self, milestone_id: &str) -> Option<(usize, usize)> {
        self.board.milestone(milestone_id)?;
        let cards = self.milestone_cards(milestone_id);
        let done = cards.iter().filter(|c| c.is_completed()).count();
        Some((done, cards.len()))
    }

    // ── Status groups ──

    /// Create or replace the group for `category`. Listed columns are taken
    /// away from any other group; unknown column ids are dropped.
    pub fn set_status_group(&mut self, category: StatusCategory, name: &str, column_ids: &[String]) {
        let mut ids: Vec<String> = Vec::new();
        for id in column_ids {
            if self.board.column(id).is_some() && !ids.contains(id) {
                ids.push(id.clone());
            }
        }
        for group in self.board.status_groups.iter_mut().filter(|g| g.category != category) {
            group.column_ids.retain(|id| !ids.contains(id));
        }
        if let Some(group) = self.board.status_groups.iter_mut().find(|g| g.category == category) {
            group.name = name.to_string();
            group.column_ids = ids;
        } else {
            let group = StatusGroup {
                id: self.board.mint_id("status"),
                category,
                name: name.to_string(),
                column_ids: ids,
            };
            self.board.status_groups.push(group);
        }
        self.commit("set status group");
    }

    pub fn remove_status_group(&mut self, category: StatusCategory) {
        let before = self.board.status_groups.len();
        self.board.status_groups.retain(|g| g.category != category);
        if self.board.status_groups.len() != before {
            self.commit("remove status group");
        }
    }

    pub fn status_category(&self, column_id: &str) -> Option<StatusCategory> {
        self.board
            .status_groups
            .iter()
            .find(|g| g.column_ids.iter().any(|id| id == column_id))
            .map(|g| g.category)
    }

    // ── Templates ──

    /// Save the current layout as a template stored on the board.
    pub fn save_as_template(&mut self, name: &str, description: &str) -> BoardTemplate {
        let id = self.board.mint_id("tpl");
        let template = template_from_board(&self.board, id, name, description);
        self.board.templates.push(template.clone());
        self.commit("save template");
        template
    }

    pub fn delete_template(&mut self, template_id: &str) {
        let before = self.board.templates.len();
        self.board.templates.retain(|t| t.id != template_id);
        if self.board.templates.len() != before {
            self.commit("delete template");
        }
    }

    /// Reset the column layout from a template. See [`super::template`].
    pub fn apply_template(&mut self, template: &BoardTemplate) -> bool {
        if !apply_to(&mut self.board, template) {
            return false;
        }
        self.commit("apply template");
        true
    }

    /// Apply one of the templates saved on this board.
    pub fn apply_saved_template(&mut self, template_id: &str) -> bool {
        let Some(template) = self.board.templates.iter().find(|t| t.id == template_id).cloned() else {
            return false;
        };
        self.apply_template(&template)
    }

    // ── Board-level ──

    pub fn rename_board(&mut self, name: &str, description: Option<&str>) {
        self.board.name = name.to_string();
        if let Some(description) = description {
            self.board.description = description.to_string();
        }
        self.commit("rename board");
    }

    pub fn update_settings(&mut self, update: SettingsUpdate) {
        let settings = &mut self.board.settings;
        if let Some(enabled) = update.wip_limits_enabled {
            settings.wip_limits_enabled = enabled;
        }
        if let Some(show) = update.show_card_ids {
            settings.show_card_ids = show;
        }
        if let Some(card_type) = update.default_card_type {
            settings.default_card_type = card_type;
        }
        self.commit("update settings");
    }

    pub fn set_filters(&mut self, filters: Filters) {
        self.board.filters = filters;
        self.commit("set filters");
    }

    pub fn clear_filters(&mut self) {
        if self.board.filters == Filters::default() {
            return;
        }
        self.set_filters(Filters::default());
    }

    // ── Derived views ──

    pub fn columns(&self) -> Vec<&Column> {
        self.board.sorted_columns()
    }

    pub fn swim_lanes(&self) -> Vec<&SwimLane> {
        self.board.sorted_swim_lanes()
    }

    pub fn card(&self, card_id: &str) -> Option<&Card> {
        self.board.card(card_id)
    }

    pub fn cards_in_partition(&self, column_id: &str, swim_lane_id: Option<&str>) -> Vec<&Card> {
        self.board.partition(column_id, swim_lane_id)
    }

    pub fn cards_in_column(&self, column_id: &str) -> Vec<&Card> {
        self.board.column_cards(column_id)
    }

    /// Cards passing the board's filters, in column then card order.
    pub fn filtered_cards(&self) -> Vec<&Card> {
        let ordered = self
            .columns()
            .into_iter()
            .flat_map(|col| self.cards_in_column(&col.id));
        filter_cards(ordered, &self.board.filters)
    }

    /// True when WIP limits are enabled and the column holds more cards than
    /// its limit.
    pub fn is_wip_limit_exceeded(&self, column_id: &str) -> bool {
        if !self.board.settings.wip_limits_enabled {
            return false;
        }
        match self.board.column(column_id).and_then(|c| c.wip_limit) {
            Some(limit) => self.board.column_card_count(column_id) > limit as usize,
            None => false,
        }
    }
}
