use chrono::Utc;

use super::{
    Board, BoardTemplate, Column, StatusCategory, StatusGroup, TemplateColumn,
    TemplateStatusGroup, COLUMN_PALETTE,
};

fn column(name: &str, idx: usize, wip_limit: Option<u32>) -> TemplateColumn {
    TemplateColumn {
        name: name.to_string(),
        color: COLUMN_PALETTE[idx % COLUMN_PALETTE.len()].to_string(),
        wip_limit,
    }
}

fn group(category: StatusCategory, name: &str, column_indexes: &[usize]) -> TemplateStatusGroup {
    TemplateStatusGroup {
        category,
        name: name.to_string(),
        column_indexes: column_indexes.to_vec(),
    }
}

/// Templates shipped with the application.
pub fn builtin_templates() -> Vec<BoardTemplate> {
    vec![
        BoardTemplate {
            id: "builtin-basic".into(),
            name: "basic".into(),
            description: "To Do, In Progress, Done".into(),
            columns: vec![
                column("To Do", 0, None),
                column("In Progress", 1, Some(3)),
                column("Done", 2, None),
            ],
            status_groups: Some(vec![
                group(StatusCategory::NotStarted, "Not started", &[0]),
                group(StatusCategory::Active, "Active", &[1]),
                group(StatusCategory::Closed, "Closed", &[2]),
            ]),
            settings: None,
        },
        BoardTemplate {
            id: "builtin-scrum".into(),
            name: "scrum".into(),
            description: "Backlog through review for sprint work".into(),
            columns: vec![
                column("Backlog", 0, None),
                column("Sprint", 1, None),
                column("In Progress", 2, Some(4)),
                column("Review", 3, Some(2)),
                column("Done", 4, None),
            ],
            status_groups: Some(vec![
                group(StatusCategory::NotStarted, "Not started", &[0, 1]),
                group(StatusCategory::Active, "Active", &[2, 3]),
                group(StatusCategory::Closed, "Closed", &[4]),
            ]),
            settings: None,
        },
        BoardTemplate {
            id: "builtin-bugs".into(),
            name: "bugs".into(),
            description: "Bug triage pipeline".into(),
            columns: vec![
                column("Reported", 0, None),
                column("Triaged", 1, None),
                column("Fixing", 2, Some(3)),
                column("Verifying", 3, None),
                column("Closed", 4, None),
            ],
            status_groups: Some(vec![
                group(StatusCategory::NotStarted, "Not started", &[0, 1]),
                group(StatusCategory::Active, "Active", &[2, 3]),
                group(StatusCategory::Closed, "Closed", &[4]),
            ]),
            settings: Some(super::Settings {
                default_card_type: super::CardType::Bug,
                ..Default::default()
            }),
        },
    ]
}

/// Look up a built-in template by name.
pub fn builtin_template(name: &str) -> Option<BoardTemplate> {
    builtin_templates()
        .into_iter()
        .find(|t| t.name.eq_ignore_ascii_case(name))
}

/// Snapshot the board's column layout and status groups as a template.
pub fn template_from_board(board: &Board, id: String, name: &str, description: &str) -> BoardTemplate {
    let columns = board.sorted_columns();
    let status_groups = board
        .status_groups
        .iter()
        .map(|g| TemplateStatusGroup {
            category: g.category,
            name: g.name.clone(),
            column_indexes: g
                .column_ids
                .iter()
                .filter_map(|cid| columns.iter().position(|c| &c.id == cid))
                .collect(),
        })
        .collect();

    BoardTemplate {
        id,
        name: name.to_string(),
        description: description.to_string(),
        columns: columns
            .iter()
            .map(|c| TemplateColumn {
                name: c.name.clone(),
                color: c.color.clone(),
                wip_limit: c.wip_limit,
            })
            .collect(),
        status_groups: Some(status_groups),
        settings: Some(board.settings.clone()),
    }
}

/// Replace the board's columns with the template's layout.
///
/// This is a reset, not a merge: every column gets a fresh id and sequential
/// order, every card moves to the new first column keeping its lane, and
/// status groups are rebuilt from the template. Returns false (board untouched)
/// when the template has no columns.
pub(crate) fn apply_to(board: &mut Board, template: &BoardTemplate) -> bool {
    if template.columns.is_empty() {
        return false;
    }

    let mut columns = Vec::with_capacity(template.columns.len());
    for (i, tc) in template.columns.iter().enumerate() {
        columns.push(Column {
            id: board.mint_id("col"),
            name: tc.name.clone(),
            order: i as u32,
            color: tc.color.clone(),
            wip_limit: tc.wip_limit,
            collapsed: false,
        });
    }

    let first = columns[0].id.clone();
    // Keep each card's previous relative position: old column order, then card order.
    let old_rank: std::collections::HashMap<String, u32> = board
        .columns
        .iter()
        .map(|c| (c.id.clone(), c.order))
        .collect();
    board.cards.sort_by_key(|c| (old_rank.get(&c.column_id).copied().unwrap_or(u32::MAX), c.order));
    let mut next_order: std::collections::HashMap<Option<String>, u32> = std::collections::HashMap::new();
    for card in &mut board.cards {
        card.column_id = first.clone();
        let slot = next_order.entry(card.swim_lane_id.clone()).or_insert(0);
        card.order = *slot;
        *slot += 1;
    }

    board.status_groups = match &template.status_groups {
        Some(groups) => {
            let mut built = Vec::with_capacity(groups.len());
            for g in groups {
                let column_ids = g
                    .column_indexes
                    .iter()
                    .filter_map(|&i| columns.get(i).map(|c| c.id.clone()))
                    .collect();
                built.push(StatusGroup {
                    id: board.mint_id("status"),
                    category: g.category,
                    name: g.name.clone(),
                    column_ids,
                });
            }
            built
        }
        None => Vec::new(),
    };

    if let Some(settings) = &template.settings {
        board.settings = settings.clone();
    }
    board.columns = columns;
    true
}

impl Board {
    /// A fresh board seeded from a template's layout.
    pub fn from_template(name: impl Into<String>, template: &BoardTemplate) -> Self {
        let mut board = Board::new(name);
        if !apply_to(&mut board, template) {
            return board;
        }
        let now = Utc::now();
        board.created_at = now;
        board.updated_at = now;
        board
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtins_are_well_formed() {
        for t in builtin_templates() {
            assert!(!t.columns.is_empty(), "{} has no columns", t.name);
            for g in t.status_groups.iter().flatten() {
                for &i in &g.column_indexes {
                    assert!(i < t.columns.len(), "{} references column {i}", t.name);
                }
            }
        }
    }

    #[test]
    fn builtin_lookup_is_case_insensitive() {
        assert!(builtin_template("Scrum").is_some());
        assert!(builtin_template("kanban-deluxe").is_none());
    }

    #[test]
    fn from_template_builds_sequential_columns_and_groups() {
        let template = builtin_template("scrum").unwrap();
        let board = Board::from_template("Sprint board", &template);
        let names: Vec<&str> = board.sorted_columns().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Backlog", "Sprint", "In Progress", "Review", "Done"]);
        let orders: Vec<u32> = board.sorted_columns().iter().map(|c| c.order).collect();
        assert_eq!(orders, vec![0, 1, 2, 3, 4]);
        assert_eq!(board.status_groups.len(), 3);
        let active = board
            .status_groups
            .iter()
            .find(|g| g.category == StatusCategory::Active)
            .unwrap();
        assert_eq!(active.column_ids.len(), 2);
    }

    #[test]
    fn template_round_trips_through_board() {
        let source = Board::from_template("A", &builtin_template("bugs").unwrap());
        let snapshot = template_from_board(&source, "tpl-1".into(), "mine", "");
        let copy = Board::from_template("B", &snapshot);
        let a: Vec<&str> = source.sorted_columns().iter().map(|c| c.name.as_str()).collect();
        let b: Vec<&str> = copy.sorted_columns().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(a, b);
        assert_eq!(copy.settings.default_card_type, super::super::CardType::Bug);
        assert_eq!(copy.status_groups.len(), source.status_groups.len());
    }

    #[test]
    fn empty_template_leaves_board_alone() {
        let mut board = Board::new("Test");
        let before = board.columns.clone();
        let empty = BoardTemplate {
            id: "t".into(),
            name: "empty".into(),
            description: String::new(),
            columns: Vec::new(),
            status_groups: None,
            settings: None,
        };
        assert!(!apply_to(&mut board, &empty));
        assert_eq!(board.columns, before);
    }
}
