//! Deterministic 2D placement of the mirrored tree.
//!
//! Pure function of the store: a breadth-first walk from the root groups
//! nodes into levels, each level horizontally centered in the viewport.
//! Positions are terminal cells; x may go negative on narrow terminals and
//! the renderer clips.

use std::collections::{HashMap, HashSet, VecDeque};

use crate::tree::model::PageId;
use crate::tree::store::TreeStore;

pub const NODE_W: i32 = 14;
pub const NODE_H: i32 = 5;
pub const H_GAP: i32 = 3;
pub const LEVEL_H: i32 = 7;
pub const TOP_MARGIN: i32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pos {
    pub x: i32,
    pub y: i32,
}

/// Output of one recomputation. Keeps the placement order so hit testing
/// can honor last-drawn-wins.
#[derive(Debug, Default)]
pub struct Layout {
    positions: HashMap<PageId, Pos>,
    order: Vec<PageId>,
}

impl Layout {
    pub fn pos(&self, page: PageId) -> Option<Pos> {
        self.positions.get(&page).copied()
    }

    /// Placed pages in draw order (BFS discovery order).
    pub fn placed(&self) -> impl Iterator<Item = (PageId, Pos)> + '_ {
        self.order.iter().map(|id| (*id, self.positions[id]))
    }

    #[allow(dead_code)] // used in tests
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// The page whose box contains `(x, y)`, if any. Scans in reverse draw
    /// order so the last-drawn box wins on overlap.
    pub fn hit_test(&self, x: i32, y: i32) -> Option<PageId> {
        self.order.iter().rev().copied().find(|id| {
            let p = self.positions[id];
            x >= p.x && x < p.x + NODE_W && y >= p.y && y < p.y + NODE_H
        })
    }
}

/// Recompute every position from scratch. O(nodes + cells); tree sizes in
/// this domain are small enough that incremental diffing buys nothing.
pub fn recompute(store: &TreeStore, width: i32) -> Layout {
    let mut layout = Layout::default();
    let Some(root) = store.root() else {
        return layout;
    };

    // BFS, first-discovered-first-placed. A node reachable from several
    // parents is placed at its first discovery; dangling children are
    // skipped; a collapsed node contributes no children.
    let mut levels: Vec<Vec<PageId>> = Vec::new();
    let mut visited: HashSet<PageId> = HashSet::new();
    let mut queue: VecDeque<(PageId, usize)> = VecDeque::new();
    visited.insert(root.page_id);
    queue.push_back((root.page_id, 0));

    while let Some((page, depth)) = queue.pop_front() {
        if levels.len() <= depth {
            levels.push(Vec::new());
        }
        levels[depth].push(page);

        let Some(node) = store.node(page) else {
            continue;
        };
        if !node.expanded {
            continue;
        }
        for &child in &node.children {
            if !store.contains(child) || !visited.insert(child) {
                continue;
            }
            queue.push_back((child, depth + 1));
        }
    }

    for (depth, level) in levels.iter().enumerate() {
        let extent = level.len() as i32 * (NODE_W + H_GAP);
        let start_x = (width - extent) / 2;
        let y = depth as i32 * LEVEL_H + TOP_MARGIN;
        for (i, &page) in level.iter().enumerate() {
            let pos = Pos {
                x: start_x + i as i32 * (NODE_W + H_GAP),
                y,
            };
            layout.positions.insert(page, pos);
            layout.order.push(page);
        }
    }
    layout
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
