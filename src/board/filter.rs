use super::{Card, Filters};

impl Filters {
    /// True when no criterion narrows the card set.
    pub fn is_empty(&self) -> bool {
        self.search.trim().is_empty()
            && self.assignees.is_empty()
            && self.priorities.is_empty()
            && self.tags.is_empty()
            && self.show_completed
            && self.show_blocked
    }
}

/// Whether a card passes every active filter criterion.
///
/// Search is a case-insensitive substring match over title, description and
/// tags. Assignee, priority and tag sets match when the card shares at least
/// one value with the set. Empty sets match everything.
pub fn card_matches(card: &Card, filters: &Filters) -> bool {
    if !filters.show_completed && card.is_completed() {
        return false;
    }
    if !filters.show_blocked && card.blocked {
        return false;
    }

    let query = filters.search.trim();
    if !query.is_empty() {
        let query = query.to_lowercase();
        let hit = card.title.to_lowercase().contains(&query)
            || card.description.to_lowercase().contains(&query)
            || card.tags.iter().any(|t| t.to_lowercase().contains(&query));
        if !hit {
            return false;
        }
    }

    if !filters.assignees.is_empty()
        && !card
            .assignees
            .iter()
            .any(|a| filters.assignees.iter().any(|f| f.eq_ignore_ascii_case(a)))
    {
        return false;
    }

    if !filters.priorities.is_empty() && !filters.priorities.contains(&card.priority) {
        return false;
    }

    if !filters.tags.is_empty()
        && !card
            .tags
            .iter()
            .any(|t| filters.tags.iter().any(|f| f.eq_ignore_ascii_case(t)))
    {
        return false;
    }

    true
}

/// Apply `filters` to `cards`, preserving input order.
pub fn filter_cards<'a>(cards: impl IntoIterator<Item = &'a Card>, filters: &Filters) -> Vec<&'a Card> {
    cards
        .into_iter()
        .filter(|card| card_matches(card, filters))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Board, Priority};
    use chrono::Utc;

    fn card(title: &str) -> Card {
        let now = Utc::now();
        Card {
            id: format!("card-{title}"),
            column_id: "col-1".into(),
            swim_lane_id: None,
            order: 0,
            title: title.into(),
            description: String::new(),
            priority: Priority::None,
            card_type: Default::default(),
            tags: Vec::new(),
            assignees: Vec::new(),
            checklist: Vec::new(),
            color: None,
            start_date: None,
            due_date: None,
            blocked: false,
            blocked_reason: None,
            completed_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn default_filters_match_everything() {
        let filters = Filters::default();
        assert!(filters.is_empty());
        assert!(card_matches(&card("anything"), &filters));
    }

    #[test]
    fn search_covers_title_description_and_tags() {
        let filters = Filters { search: "LOGIN".into(), ..Default::default() };

        assert!(card_matches(&card("Fix login page"), &filters));

        let mut described = card("Other");
        described.description = "the login flow breaks".into();
        assert!(card_matches(&described, &filters));

        let mut tagged = card("Other");
        tagged.tags = vec!["login".into()];
        assert!(card_matches(&tagged, &filters));

        assert!(!card_matches(&card("Unrelated"), &filters));
    }

    #[test]
    fn assignee_priority_and_tag_sets() {
        let mut c = card("Task");
        c.assignees = vec!["alice".into()];
        c.priority = Priority::High;
        c.tags = vec!["ui".into()];

        let by_assignee = Filters { assignees: vec!["Alice".into()], ..Default::default() };
        assert!(card_matches(&c, &by_assignee));
        let other_assignee = Filters { assignees: vec!["bob".into()], ..Default::default() };
        assert!(!card_matches(&c, &other_assignee));

        let by_priority = Filters { priorities: vec![Priority::Low, Priority::High], ..Default::default() };
        assert!(card_matches(&c, &by_priority));
        let other_priority = Filters { priorities: vec![Priority::Urgent], ..Default::default() };
        assert!(!card_matches(&c, &other_priority));

        let by_tag = Filters { tags: vec!["UI".into()], ..Default::default() };
        assert!(card_matches(&c, &by_tag));
        let other_tag = Filters { tags: vec!["backend".into()], ..Default::default() };
        assert!(!card_matches(&c, &other_tag));
    }

    #[test]
    fn completed_and_blocked_visibility() {
        let mut done = card("Done");
        done.completed_at = Some(Utc::now());
        let mut stuck = card("Stuck");
        stuck.blocked = true;

        let hide_done = Filters { show_completed: false, ..Default::default() };
        assert!(!card_matches(&done, &hide_done));
        assert!(card_matches(&stuck, &hide_done));

        let hide_blocked = Filters { show_blocked: false, ..Default::default() };
        assert!(card_matches(&done, &hide_blocked));
        assert!(!card_matches(&stuck, &hide_blocked));
    }

    #[test]
    fn filter_cards_preserves_order() {
        let board = Board::new("Test");
        let cards = vec![card("alpha one"), card("beta"), card("alpha two")];
        let filters = Filters { search: "alpha".into(), ..board.filters.clone() };
        let titles: Vec<&str> = filter_cards(&cards, &filters)
            .into_iter()
            .map(|c| c.title.as_str())
            .collect();
        assert_eq!(titles, vec!["alpha one", "alpha two"]);
    }
}
