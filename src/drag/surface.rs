//! The view tree the drag engine works against.
//!
//! A [`Surface`] is a snapshot of the board's on-screen geometry in terminal
//! cells: one header slot per visible column and one [`Container`] per
//! (column, lane) cell. Containers lay their children out top-down, so moving
//! a placeholder or hiding a card re-flows everything below it, and headers
//! occupy fixed slots, so reordering headers re-flows the header row.

use ratatui::layout::{Position, Rect};

use crate::board::filter::card_matches;
use crate::board::Board;

/// Rows taken by the trailing drop zone of each container.
const DROP_ZONE_HEIGHT: u16 = 1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// A card element. Invisible cards (filtered out, or being dragged) take
    /// no space and are skipped by hit tests, but still count as real cards.
    Card { card_id: String, height: u16, visible: bool },
    /// Marker showing where the dragged card would land.
    Placeholder { height: u16 },
    /// Trailing "drop here" area at the end of a container.
    DropZone { height: u16 },
}

impl Node {
    fn height(&self) -> u16 {
        match self {
            Node::Card { height, visible: true, .. } => *height,
            Node::Card { visible: false, .. } => 0,
            Node::Placeholder { height } | Node::DropZone { height } => *height,
        }
    }

    fn is_visible_card(&self) -> bool {
        matches!(self, Node::Card { visible: true, .. })
    }
}

/// Vertical midpoint of `r` lies strictly below `y`.
fn midpoint_below(r: Rect, y: u16) -> bool {
    2 * u32::from(r.y) + u32::from(r.height) > 2 * u32::from(y)
}

/// Horizontal midpoint of `r` lies strictly right of `x`.
fn midpoint_right_of(r: Rect, x: u16) -> bool {
    2 * u32::from(r.x) + u32::from(r.width) > 2 * u32::from(x)
}

/// The card area of one (column, lane) cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Container {
    pub column_id: String,
    pub swim_lane_id: Option<String>,
    pub area: Rect,
    pub children: Vec<Node>,
    /// Set while a dragged card hovers over this container.
    pub drag_over: bool,
}

impl Container {
    pub fn new(column_id: impl Into<String>, swim_lane_id: Option<String>, area: Rect) -> Self {
        Self {
            column_id: column_id.into(),
            swim_lane_id,
            area,
            children: Vec::new(),
            drag_over: false,
        }
    }

    pub fn push_card(&mut self, card_id: impl Into<String>, height: u16, visible: bool) {
        self.children.push(Node::Card { card_id: card_id.into(), height, visible });
    }

    pub fn push_drop_zone(&mut self, height: u16) {
        self.children.push(Node::DropZone { height });
    }

    /// On-screen rect of every child, stacked from the container's top edge.
    ///
    /// When the stack overflows the container, the trailing drop zone is
    /// pinned to the bottom rows and whatever would reach past its top is
    /// clipped (down to zero height), so the end of a long column stays a
    /// drop target.
    pub fn child_rects(&self) -> Vec<Rect> {
        let mut y = self.area.y;
        let mut rects: Vec<Rect> = self
            .children
            .iter()
            .map(|node| {
                let h = node.height();
                let rect = Rect::new(self.area.x, y, self.area.width, h);
                y = y.saturating_add(h);
                rect
            })
            .collect();

        let bottom = self.area.bottom();
        if y <= bottom {
            return rects;
        }
        let Some(zone) = self.children.iter().rposition(|n| matches!(n, Node::DropZone { .. })) else {
            return rects;
        };
        let zone_height = rects[zone].height.min(self.area.height);
        let zone_top = bottom - zone_height;
        rects[zone] = Rect::new(self.area.x, zone_top, self.area.width, zone_height);
        for rect in &mut rects[..zone] {
            if rect.bottom() > zone_top {
                let top = rect.y.min(zone_top);
                *rect = Rect::new(rect.x, top, rect.width, zone_top - top);
            }
        }
        for rect in &mut rects[zone + 1..] {
            *rect = Rect::new(rect.x, bottom, rect.width, 0);
        }
        rects
    }

    pub fn placeholder_index(&self) -> Option<usize> {
        self.children.iter().position(|n| matches!(n, Node::Placeholder { .. }))
    }

    pub fn card_index(&self, card_id: &str) -> Option<usize> {
        self.children
            .iter()
            .position(|n| matches!(n, Node::Card { card_id: id, .. } if id == card_id))
    }

    /// Real cards before child `idx`, not counting `skip_card`.
    pub fn cards_before(&self, idx: usize, skip_card: &str) -> usize {
        self.children[..idx.min(self.children.len())]
            .iter()
            .filter(|n| matches!(n, Node::Card { card_id, .. } if card_id != skip_card))
            .count()
    }

    /// Where a card dropped at `y` would go: before the first visible card
    /// whose midpoint is below `y`, else before the trailing drop zone, else
    /// at the end. A linear scan in document order.
    pub fn insertion_index(&self, y: u16) -> usize {
        let rects = self.child_rects();
        for (i, node) in self.children.iter().enumerate() {
            if node.is_visible_card() && midpoint_below(rects[i], y) {
                return i;
            }
        }
        self.children
            .iter()
            .rposition(|n| matches!(n, Node::DropZone { .. }))
            .unwrap_or(self.children.len())
    }

    /// Number of real cards, except `skip_card`, whose midpoint is at or
    /// above `y`. Used when the placeholder is not in this container.
    pub fn index_by_midpoint(&self, y: u16, skip_card: &str) -> usize {
        let rects = self.child_rects();
        let mut index = 0;
        for (i, node) in self.children.iter().enumerate() {
            let Node::Card { card_id, visible, .. } = node else {
                continue;
            };
            if card_id == skip_card {
                continue;
            }
            if *visible && midpoint_below(rects[i], y) {
                break;
            }
            index += 1;
        }
        index
    }

    /// First child after `idx` that is not an invisible card.
    fn next_visible_sibling(&self, idx: usize) -> usize {
        (idx + 1..self.children.len())
            .find(|&i| !matches!(self.children[i], Node::Card { visible: false, .. }))
            .unwrap_or(self.children.len())
    }

    fn set_card_visible(&mut self, card_id: &str, visible: bool) -> Option<u16> {
        let idx = self.card_index(card_id)?;
        if let Node::Card { visible: v, height, .. } = &mut self.children[idx] {
            *v = visible;
            return Some(*height);
        }
        None
    }
}

/// Geometry of the whole board as drawn.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Surface {
    pub containers: Vec<Container>,
    header_slots: Vec<Rect>,
    headers: Vec<String>,
}

impl Surface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lay the board out inside `area`: columns side by side, one row per
    /// lane (the "no lane" row first), cards stacked `card_height` rows tall.
    pub fn from_board(board: &Board, area: Rect, card_height: u16) -> Self {
        let mut surface = Surface::new();
        let columns = board.sorted_columns();
        if columns.is_empty() || area.width == 0 || area.height < 3 {
            return surface;
        }

        let mut lanes: Vec<Option<&str>> = vec![None];
        lanes.extend(board.sorted_swim_lanes().into_iter().map(|l| Some(l.id.as_str())));
        let has_lanes = lanes.len() > 1;

        let col_width = area.width / columns.len() as u16;
        let body_top = area.y + 1;
        let body_height = area.height.saturating_sub(2);
        let row_height = body_height / lanes.len() as u16;

        for (ci, column) in columns.iter().enumerate() {
            let x = area.x + ci as u16 * col_width;
            let width = if ci + 1 == columns.len() {
                area.width - ci as u16 * col_width
            } else {
                col_width
            };
            surface.push_header(&column.id, Rect::new(x, area.y, width, 1));

            for (li, &lane_id) in lanes.iter().enumerate() {
                let label = u16::from(has_lanes);
                let y = body_top + li as u16 * row_height + label;
                let height = row_height.saturating_sub(label);
                let inner = Rect::new(x + 1, y, width.saturating_sub(2), height);
                let mut container = Container::new(&column.id, lane_id.map(str::to_string), inner);
                if !column.collapsed {
                    for card in board.partition(&column.id, lane_id) {
                        let visible = card_matches(card, &board.filters);
                        container.push_card(&card.id, card_height, visible);
                    }
                }
                container.push_drop_zone(DROP_ZONE_HEIGHT);
                surface.containers.push(container);
            }
        }
        surface
    }

    pub fn add_container(&mut self, container: Container) {
        self.containers.push(container);
    }

    pub fn push_header(&mut self, column_id: impl Into<String>, slot: Rect) {
        self.headers.push(column_id.into());
        self.header_slots.push(slot);
    }

    /// Column ids in their current on-screen order.
    pub fn column_order(&self) -> &[String] {
        &self.headers
    }

    /// Each header's column id with the slot it currently occupies.
    pub fn header_rects(&self) -> Vec<(&str, Rect)> {
        self.headers
            .iter()
            .map(String::as_str)
            .zip(self.header_slots.iter().copied())
            .collect()
    }

    pub fn header_at(&self, pos: Position) -> Option<usize> {
        self.header_slots.iter().position(|r| r.contains(pos))
    }

    pub fn container_at(&self, pos: Position) -> Option<usize> {
        self.containers.iter().position(|c| c.area.contains(pos))
    }

    /// The visible card under `pos`: `(container, child, card id)`.
    pub fn card_at(&self, pos: Position) -> Option<(usize, usize, &str)> {
        let ci = self.container_at(pos)?;
        let container = &self.containers[ci];
        let rects = container.child_rects();
        container.children.iter().enumerate().find_map(|(i, node)| match node {
            Node::Card { card_id, visible: true, .. } if rects[i].contains(pos) => {
                Some((ci, i, card_id.as_str()))
            }
            _ => None,
        })
    }

    /// `(container, child)` of the placeholder, if one is on the surface.
    pub fn placeholder(&self) -> Option<(usize, usize)> {
        self.containers
            .iter()
            .enumerate()
            .find_map(|(ci, c)| c.placeholder_index().map(|i| (ci, i)))
    }

    pub fn insert_placeholder(&mut self, container: usize, index: usize, height: u16) {
        if let Some(c) = self.containers.get_mut(container) {
            let index = index.min(c.children.len());
            c.children.insert(index, Node::Placeholder { height });
        }
    }

    pub fn remove_placeholder(&mut self) {
        for c in &mut self.containers {
            c.children.retain(|n| !matches!(n, Node::Placeholder { .. }));
        }
    }

    /// Move the placeholder so it sits before child `index` of `container`
    /// (an index into the children as they are now). Returns false when it is
    /// already there.
    pub fn move_placeholder(&mut self, container: usize, index: usize) -> bool {
        let Some((pc, pi)) = self.placeholder() else {
            return false;
        };
        let target_next = index;
        if pc == container && self.containers[pc].next_visible_sibling(pi) == target_next {
            return false;
        }
        let Node::Placeholder { height } = self.containers[pc].children.remove(pi) else {
            return false;
        };
        let index = if pc == container && pi < index { index - 1 } else { index };
        self.insert_placeholder(container, index, height);
        true
    }

    /// Hide a card (it is being dragged). Returns its height and position.
    pub fn hide_card(&mut self, card_id: &str) -> Option<(usize, usize, u16)> {
        for (ci, c) in self.containers.iter_mut().enumerate() {
            if let Some(idx) = c.card_index(card_id) {
                let height = c.set_card_visible(card_id, false)?;
                return Some((ci, idx, height));
            }
        }
        None
    }

    pub fn show_card(&mut self, card_id: &str) {
        for c in &mut self.containers {
            if c.set_card_visible(card_id, true).is_some() {
                return;
            }
        }
    }

    pub fn set_drag_over(&mut self, container: Option<usize>) {
        for (ci, c) in self.containers.iter_mut().enumerate() {
            c.drag_over = Some(ci) == container;
        }
    }

    /// Relocate header `from` so it sits at position `to` among the headers.
    pub fn move_header(&mut self, from: usize, to: usize) {
        if from >= self.headers.len() {
            return;
        }
        let id = self.headers.remove(from);
        let to = to.min(self.headers.len());
        self.headers.insert(to, id);
    }

    pub fn set_column_order(&mut self, order: Vec<String>) {
        if order.len() == self.header_slots.len() {
            self.headers = order;
        }
    }

    /// Index among the other headers before which a header dragged to `x`
    /// belongs: the first sibling whose midpoint is right of `x`.
    pub fn header_insertion_index(&self, dragged: usize, x: u16) -> usize {
        let siblings: Vec<Rect> = self
            .header_slots
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != dragged)
            .map(|(_, r)| *r)
            .collect();
        siblings
            .iter()
            .position(|r| midpoint_right_of(*r, x))
            .unwrap_or(siblings.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn container() -> Container {
        let mut c = Container::new("col-1", None, Rect::new(0, 0, 10, 20));
        c.push_card("a", 3, true);
        c.push_card("b", 3, true);
        c.push_card("c", 3, true);
        c.push_drop_zone(1);
        c
    }

    #[test]
    fn children_stack_top_down() {
        let c = container();
        let ys: Vec<u16> = c.child_rects().iter().map(|r| r.y).collect();
        assert_eq!(ys, vec![0, 3, 6, 9]);
    }

    #[test]
    fn invisible_cards_take_no_space() {
        let mut c = container();
        c.set_card_visible("a", false);
        let ys: Vec<u16> = c.child_rects().iter().map(|r| r.y).collect();
        assert_eq!(ys, vec![0, 0, 3, 6]);
    }

    #[test]
    fn overflow_pins_drop_zone_to_bottom_row() {
        let mut c = container();
        c.area = Rect::new(0, 0, 10, 8);
        let rects = c.child_rects();
        assert_eq!(rects[3], Rect::new(0, 7, 10, 1));
        // c is cut to the row left above the drop zone
        assert_eq!(rects[2], Rect::new(0, 6, 10, 1));
        assert!(rects.iter().all(|r| r.bottom() <= 8));
        assert_eq!(c.insertion_index(7), 3);
    }

    #[test]
    fn insertion_index_uses_midpoints() {
        let c = container();
        // a spans rows 0..3 (midpoint 1.5)
        assert_eq!(c.insertion_index(0), 0);
        assert_eq!(c.insertion_index(1), 0);
        assert_eq!(c.insertion_index(2), 1);
        assert_eq!(c.insertion_index(5), 2);
        // below every card: before the drop zone
        assert_eq!(c.insertion_index(8), 3);
        assert_eq!(c.insertion_index(19), 3);
    }

    #[test]
    fn insertion_index_without_drop_zone_is_end() {
        let mut c = container();
        c.children.pop();
        assert_eq!(c.insertion_index(19), 3);
    }

    #[test]
    fn cards_before_skips_dragged_and_placeholder() {
        let mut c = container();
        c.children.insert(2, Node::Placeholder { height: 3 });
        assert_eq!(c.cards_before(2, "a"), 1);
        assert_eq!(c.cards_before(2, "zzz"), 2);
    }

    #[test]
    fn index_by_midpoint_counts_hidden_real_cards() {
        let mut c = container();
        c.set_card_visible("b", false);
        // a (0..3), b hidden, c (3..6)
        assert_eq!(c.index_by_midpoint(0, "x"), 0);
        assert_eq!(c.index_by_midpoint(2, "x"), 2);
        assert_eq!(c.index_by_midpoint(10, "x"), 3);
        assert_eq!(c.index_by_midpoint(10, "a"), 2);
    }

    #[test]
    fn move_placeholder_only_when_target_changes() {
        let mut s = Surface::new();
        s.add_container(container());
        s.insert_placeholder(0, 1, 3); // before b
        assert!(!s.move_placeholder(0, 2)); // next sibling is b (child 2)
        assert!(s.move_placeholder(0, 3)); // before c
        assert_eq!(s.placeholder(), Some((0, 2)));
    }

    #[test]
    fn header_slots_are_fixed_and_order_moves() {
        let mut s = Surface::new();
        s.push_header("x", Rect::new(0, 0, 10, 1));
        s.push_header("y", Rect::new(10, 0, 10, 1));
        s.push_header("z", Rect::new(20, 0, 10, 1));
        assert_eq!(s.header_insertion_index(0, 26), 2);
        assert_eq!(s.header_insertion_index(0, 14), 0);
        s.move_header(0, 2);
        assert_eq!(s.column_order(), ["y", "z", "x"]);
        assert_eq!(s.header_rects()[2], ("x", Rect::new(20, 0, 10, 1)));
    }

    #[test]
    fn from_board_builds_one_container_per_cell() {
        let mut board = Board::new("Test");
        board.swim_lanes.push(crate::board::SwimLane {
            id: "lane-1".into(),
            name: "Team".into(),
            order: 0,
            color: "#000".into(),
            collapsed: false,
        });
        let s = Surface::from_board(&board, Rect::new(0, 0, 90, 30), 4);
        assert_eq!(s.column_order().len(), 3);
        assert_eq!(s.containers.len(), 6);
        assert!(s.containers.iter().all(|c| matches!(c.children.last(), Some(Node::DropZone { .. }))));
        assert_eq!(s.containers[1].swim_lane_id.as_deref(), Some("lane-1"));
    }
}
