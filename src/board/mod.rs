pub mod engine;
pub mod filter;
pub mod history;
pub mod storage;
pub mod template;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Default column colors, picked by the current column count.
pub const COLUMN_PALETTE: [&str; 8] = [
    "#6366f1", "#f59e0b", "#10b981", "#ef4444", "#8b5cf6", "#06b6d4", "#ec4899", "#84cc16",
];

/// Default swim lane colors, picked by the current lane count.
pub const LANE_PALETTE: [&str; 4] = ["#64748b", "#0ea5e9", "#a855f7", "#f97316"];

/// The top-level board: the unit of persistence and of undo/redo snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Board {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Counter behind every id minted for entities on this board.
    #[serde(default = "default_next_id")]
    pub next_id: u64,
    #[serde(default)]
    pub columns: Vec<Column>,
    #[serde(default)]
    pub cards: Vec<Card>,
    #[serde(default)]
    pub swim_lanes: Vec<SwimLane>,
    #[serde(default)]
    pub milestones: Vec<Milestone>,
    #[serde(default)]
    pub status_groups: Vec<StatusGroup>,
    #[serde(default)]
    pub templates: Vec<BoardTemplate>,
    #[serde(default)]
    pub filters: Filters,
    #[serde(default)]
    pub settings: Settings,
}

fn default_next_id() -> u64 {
    1
}

/// A named, ordered bucket of cards (a board "stage").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    pub id: String,
    pub name: String,
    pub order: u32,
    pub color: String,
    pub wip_limit: Option<u32>,
    #[serde(default)]
    pub collapsed: bool,
}

/// Card priority, lowest to highest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Priority {
    #[default]
    None,
    Low,
    Medium,
    High,
    Urgent,
}

impl Priority {
    pub const ALL: [Priority; 5] = [Self::None, Self::Low, Self::Medium, Self::High, Self::Urgent];

    pub fn next(self) -> Self {
        match self {
            Self::None => Self::Low,
            Self::Low => Self::Medium,
            Self::Medium => Self::High,
            Self::High => Self::Urgent,
            Self::Urgent => Self::None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Urgent => "urgent",
        }
    }
}

impl std::str::FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "none" => Ok(Self::None),
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "urgent" => Ok(Self::Urgent),
            other => Err(format!(
                "unknown priority '{other}': use none, low, medium, high, urgent"
            )),
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What kind of work a card tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum CardType {
    #[default]
    Task,
    Bug,
    Feature,
    Story,
    Epic,
}

impl CardType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Task => "task",
            Self::Bug => "bug",
            Self::Feature => "feature",
            Self::Story => "story",
            Self::Epic => "epic",
        }
    }
}

/// A single checklist entry, owned by one card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChecklistItem {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub completed: bool,
}

/// A single card. `order` is its position within the (column, lane) partition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub id: String,
    pub column_id: String,
    pub swim_lane_id: Option<String>,
    pub order: u32,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub card_type: CardType,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub assignees: Vec<String>,
    #[serde(default)]
    pub checklist: Vec<ChecklistItem>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub blocked: bool,
    #[serde(default)]
    pub blocked_reason: Option<String>,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Card {
    pub fn is_completed(&self) -> bool {
        self.completed_at.is_some()
    }

    /// Whether this card lives in the given (column, lane) partition.
    pub fn in_partition(&self, column_id: &str, swim_lane_id: Option<&str>) -> bool {
        self.column_id == column_id && self.swim_lane_id.as_deref() == swim_lane_id
    }

    /// Touch the card, updating its `updated_at` timestamp.
    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// An orthogonal horizontal partition of cards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwimLane {
    pub id: String,
    pub name: String,
    pub order: u32,
    pub color: String,
    #[serde(default)]
    pub collapsed: bool,
}

/// A dated goal referencing cards by id. References are weak: deleting a card
/// leaves its id here, and readers filter dangling ids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Milestone {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub due_date: Option<NaiveDate>,
    pub color: Option<String>,
    #[serde(default)]
    pub card_ids: Vec<String>,
    #[serde(default)]
    pub completed: bool,
}

/// Fixed status categories a column can belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StatusCategory {
    NotStarted,
    Active,
    Closed,
}

impl StatusCategory {
    pub const ALL: [StatusCategory; 3] = [Self::NotStarted, Self::Active, Self::Closed];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotStarted => "not-started",
            Self::Active => "active",
            Self::Closed => "closed",
        }
    }
}

/// Maps a status category to the columns that represent it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusGroup {
    pub id: String,
    pub category: StatusCategory,
    pub name: String,
    #[serde(default)]
    pub column_ids: Vec<String>,
}

/// Column definition inside a template (no identity, no order).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateColumn {
    pub name: String,
    pub color: String,
    pub wip_limit: Option<u32>,
}

/// Status group definition inside a template, referencing columns by index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateStatusGroup {
    pub category: StatusCategory,
    pub name: String,
    pub column_indexes: Vec<usize>,
}

/// A serializable snapshot of a column layout used to seed or re-skin boards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardTemplate {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub columns: Vec<TemplateColumn>,
    #[serde(default)]
    pub status_groups: Option<Vec<TemplateStatusGroup>>,
    #[serde(default)]
    pub settings: Option<Settings>,
}

/// The board's active card filters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Filters {
    #[serde(default)]
    pub search: String,
    #[serde(default)]
    pub assignees: Vec<String>,
    #[serde(default)]
    pub priorities: Vec<Priority>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default = "default_true")]
    pub show_completed: bool,
    #[serde(default = "default_true")]
    pub show_blocked: bool,
}

fn default_true() -> bool {
    true
}

impl Default for Filters {
    fn default() -> Self {
        Self {
            search: String::new(),
            assignees: Vec::new(),
            priorities: Vec::new(),
            tags: Vec::new(),
            show_completed: true,
            show_blocked: true,
        }
    }
}

/// Board-level feature flags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default = "default_true")]
    pub wip_limits_enabled: bool,
    #[serde(default)]
    pub show_card_ids: bool,
    #[serde(default)]
    pub default_card_type: CardType,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            wip_limits_enabled: true,
            show_card_ids: false,
            default_card_type: CardType::Task,
        }
    }
}

impl Board {
    /// A fresh board with the default "To Do / In Progress / Done" layout.
    pub fn new(name: impl Into<String>) -> Self {
        let now = Utc::now();
        let mut board = Self {
            id: String::new(),
            name: name.into(),
            description: String::new(),
            created_at: now,
            updated_at: now,
            next_id: 1,
            columns: Vec::new(),
            cards: Vec::new(),
            swim_lanes: Vec::new(),
            milestones: Vec::new(),
            status_groups: Vec::new(),
            templates: Vec::new(),
            filters: Filters::default(),
            settings: Settings::default(),
        };
        board.id = board.mint_id("board");
        for (i, name) in ["To Do", "In Progress", "Done"].into_iter().enumerate() {
            let id = board.mint_id("col");
            board.columns.push(Column {
                id,
                name: name.to_string(),
                order: i as u32,
                color: COLUMN_PALETTE[i % COLUMN_PALETTE.len()].to_string(),
                wip_limit: None,
                collapsed: false,
            });
        }
        board
    }

    /// Mint a new id unique within this board.
    pub fn mint_id(&mut self, prefix: &str) -> String {
        let n = self.next_id;
        self.next_id += 1;
        format!("{prefix}-{n}")
    }

    /// Raise `next_id` past every numeric id suffix already on the board, so a
    /// file written without (or with a stale) `nextId` never re-mints an id.
    pub fn reseed_next_id(&mut self) {
        let ids = std::iter::once(&self.id)
            .chain(self.columns.iter().map(|c| &c.id))
            .chain(self.cards.iter().map(|c| &c.id))
            .chain(self.cards.iter().flat_map(|c| c.checklist.iter().map(|i| &i.id)))
            .chain(self.swim_lanes.iter().map(|l| &l.id))
            .chain(self.milestones.iter().map(|m| &m.id))
            .chain(self.status_groups.iter().map(|g| &g.id))
            .chain(self.templates.iter().map(|t| &t.id));
        let highest = ids
            .filter_map(|id| id.rsplit_once('-'))
            .filter_map(|(_, n)| n.parse::<u64>().ok())
            .max()
            .unwrap_or(0);
        self.next_id = self.next_id.max(highest + 1);
    }

    pub fn column(&self, column_id: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.id == column_id)
    }

    pub fn card(&self, card_id: &str) -> Option<&Card> {
        self.cards.iter().find(|c| c.id == card_id)
    }

    pub fn swim_lane(&self, lane_id: &str) -> Option<&SwimLane> {
        self.swim_lanes.iter().find(|l| l.id == lane_id)
    }

    pub fn milestone(&self, milestone_id: &str) -> Option<&Milestone> {
        self.milestones.iter().find(|m| m.id == milestone_id)
    }

    /// Find a column by id or by case-insensitive name.
    pub fn find_column(&self, key: &str) -> Option<&Column> {
        self.column(key).or_else(|| {
            self.columns
                .iter()
                .find(|c| c.name.eq_ignore_ascii_case(key))
        })
    }

    /// Resolve a user-typed card reference: a full id, or its numeric suffix.
    pub fn find_card(&self, key: &str) -> Option<&Card> {
        self.card(key)
            .or_else(|| self.card(&format!("card-{key}")))
    }

    /// Columns sorted by display order.
    pub fn sorted_columns(&self) -> Vec<&Column> {
        let mut columns: Vec<&Column> = self.columns.iter().collect();
        columns.sort_by_key(|c| c.order);
        columns
    }

    /// Swim lanes sorted by display order.
    pub fn sorted_swim_lanes(&self) -> Vec<&SwimLane> {
        let mut lanes: Vec<&SwimLane> = self.swim_lanes.iter().collect();
        lanes.sort_by_key(|l| l.order);
        lanes
    }

    /// Cards of one (column, lane) partition, sorted by order.
    pub fn partition(&self, column_id: &str, swim_lane_id: Option<&str>) -> Vec<&Card> {
        let mut cards: Vec<&Card> = self
            .cards
            .iter()
            .filter(|c| c.in_partition(column_id, swim_lane_id))
            .collect();
        cards.sort_by_key(|c| c.order);
        cards
    }

    /// Every card of a column: the "no lane" partition first, then each lane
    /// in lane order.
    pub fn column_cards(&self, column_id: &str) -> Vec<&Card> {
        let mut cards = self.partition(column_id, None);
        for lane in self.sorted_swim_lanes() {
            cards.extend(self.partition(column_id, Some(&lane.id)));
        }
        cards
    }

    /// Number of cards in a column, across all lanes.
    pub fn column_card_count(&self, column_id: &str) -> usize {
        self.cards.iter().filter(|c| c.column_id == column_id).count()
    }

    /// Collect all unique tags across the board with counts.
    pub fn all_tags(&self) -> Vec<(String, usize)> {
        let mut counts: std::collections::HashMap<&str, usize> = std::collections::HashMap::new();
        for card in &self.cards {
            for tag in &card.tags {
                *counts.entry(tag.as_str()).or_insert(0) += 1;
            }
        }
        let mut tags: Vec<_> = counts
            .into_iter()
            .map(|(tag, count)| (tag.to_string(), count))
            .collect();
        tags.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        tags
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_board_has_dense_default_columns() {
        let board = Board::new("Test");
        let orders: Vec<u32> = board.sorted_columns().iter().map(|c| c.order).collect();
        assert_eq!(orders, vec![0, 1, 2]);
        assert_eq!(board.columns[0].name, "To Do");
        assert_eq!(board.columns[2].name, "Done");
    }

    #[test]
    fn mint_id_is_monotonic() {
        let mut board = Board::new("Test");
        let a = board.mint_id("card");
        let b = board.mint_id("card");
        assert_ne!(a, b);
        assert!(a.starts_with("card-"));
    }

    #[test]
    fn find_column_by_id_or_name() {
        let board = Board::new("Test");
        let id = board.columns[1].id.clone();
        assert_eq!(board.find_column(&id).map(|c| c.name.as_str()), Some("In Progress"));
        assert_eq!(board.find_column("in progress").map(|c| c.id.as_str()), Some(id.as_str()));
        assert!(board.find_column("nope").is_none());
    }

    #[test]
    fn priority_parse_and_cycle() {
        assert_eq!("HIGH".parse::<Priority>(), Ok(Priority::High));
        assert!("bogus".parse::<Priority>().is_err());
        assert_eq!(Priority::Urgent.next(), Priority::None);
    }

    #[test]
    fn serialized_board_uses_explicit_nulls() {
        let board = Board::new("Test");
        let json = serde_json::to_value(&board).unwrap();
        let col = &json["columns"][0];
        assert!(col.get("wipLimit").is_some());
        assert!(col["wipLimit"].is_null());
    }

    #[test]
    fn reseed_moves_past_existing_ids() {
        let mut board = Board::new("Test");
        board.next_id = 1;
        board.reseed_next_id();
        assert_eq!(board.next_id, 5);
        let id = board.mint_id("col");
        assert!(board.column(&id).is_none());

        // A counter already ahead is left alone.
        board.next_id = 40;
        board.reseed_next_id();
        assert_eq!(board.next_id, 40);
    }
}
