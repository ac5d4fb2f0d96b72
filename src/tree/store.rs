//! The authoritative in-memory mirror of the engine's pages.
//!
//! Every structural mutation record lands here. The store tolerates records
//! that address pages or cells it does not know: the engine is the source
//! of truth and is trusted to converge, so the worst case is a warning and
//! a skipped update, never a failure.

use std::collections::BTreeMap;

use tracing::warn;

use crate::events::record::MutationRecord;
use crate::tree::model::{Cell, Node, PageId, PageKind};

/// Owns every live [`Node`]. Lookup is by id; nothing outside the store
/// holds a node beyond the current render pass.
#[derive(Debug, Default)]
pub struct TreeStore {
    nodes: BTreeMap<PageId, Node>,
    dirty: bool,
}

impl TreeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node(&self, page: PageId) -> Option<&Node> {
        self.nodes.get(&page)
    }

    pub fn root(&self) -> Option<&Node> {
        self.nodes.get(&PageId::ROOT)
    }

    pub fn contains(&self, page: PageId) -> bool {
        self.nodes.contains_key(&page)
    }

    /// All live nodes in ascending page-id order.
    pub fn all_nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[allow(dead_code)] // used in tests
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Flip the UI-local collapse toggle. Not a tree mutation, but it does
    /// change which nodes layout traverses, so it marks the store dirty.
    pub fn toggle_expanded(&mut self, page: PageId) {
        if let Some(node) = self.nodes.get_mut(&page) {
            node.expanded = !node.expanded;
            self.dirty = true;
        }
    }

    /// True once since the last call if anything changed that layout
    /// should see.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    /// Drop everything. The next paint observes an empty tree; no partial
    /// reset is ever visible.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.dirty = true;
    }

    /// Apply one mutation record. Informational records are no-ops here.
    pub fn apply(&mut self, record: &MutationRecord) {
        match *record {
            MutationRecord::Open { .. } => {
                // A fresh engine session: restart the mirror with its root.
                self.nodes.clear();
                self.insert_node(Node::new(PageId::ROOT, PageKind::Leaf));
                self.dirty = true;
            }
            MutationRecord::Allocate { page, kind } => {
                // Replacing an existing id is a re-allocation of a reused
                // page number, not an error.
                self.insert_node(Node::new(page, kind));
                self.dirty = true;
            }
            MutationRecord::Free { page } => {
                if self.nodes.remove(&page).is_none() {
                    warn!(%page, "free for unknown page");
                }
                // Children lists elsewhere keep the id; it is now dangling.
                self.dirty = true;
            }
            MutationRecord::Insert { page, cell, key_len } => self.insert_cell(page, cell, key_len),
            MutationRecord::Delete { page, cell } => self.delete_cell(page, cell),
            MutationRecord::Split { from, to, at } => self.split(from, to, at),
            MutationRecord::Close
            | MutationRecord::Balance { .. }
            | MutationRecord::ParseStart { .. }
            | MutationRecord::ParseToken { .. }
            | MutationRecord::ParseComplete { .. }
            | MutationRecord::VdbeStart { .. }
            | MutationRecord::VdbeOpcode { .. }
            | MutationRecord::VdbeComplete { .. } => {}
        }
    }

    fn insert_node(&mut self, node: Node) {
        self.nodes.insert(node.page_id, node);
    }

    fn insert_cell(&mut self, page: PageId, cell: usize, key_len: u32) {
        let Some(node) = self.nodes.get_mut(&page) else {
            warn!(%page, cell, "insert into unknown page");
            return;
        };
        if cell > node.cells.len() {
            warn!(%page, cell, len = node.cells.len(), "insert index beyond end, appending");
        }
        let index = cell.min(node.cells.len());
        node.cells.insert(index, Cell::new(key_len));
        self.dirty = true;
    }

    fn delete_cell(&mut self, page: PageId, cell: usize) {
        let Some(node) = self.nodes.get_mut(&page) else {
            warn!(%page, cell, "delete from unknown page");
            return;
        };
        if cell >= node.cells.len() {
            warn!(%page, cell, len = node.cells.len(), "delete index out of range");
            return;
        }
        node.cells.remove(cell);
        self.dirty = true;
    }

    fn split(&mut self, from: PageId, to: PageId, at: usize) {
        let Some(source) = self.nodes.get_mut(&from) else {
            warn!(%from, %to, "split of unknown page");
            return;
        };
        let kind = source.kind;
        let at = at.min(source.cells.len());
        let moved: Vec<Cell> = source.cells.split_off(at);
        if !source.children.contains(&to) {
            // The engine links pages through its own later events; until
            // then the split-off page hangs under its source so the view
            // stays connected.
            source.children.push(to);
        }

        let target = self
            .nodes
            .entry(to)
            .or_insert_with(|| Node::new(to, kind));
        target.cells = moved;
        self.dirty = true;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn alloc(store: &mut TreeStore, page: u32, kind: PageKind) {
        store.apply(&MutationRecord::Allocate {
            page: PageId(page),
            kind,
        });
    }

    fn insert(store: &mut TreeStore, page: u32, cell: usize, key_len: u32) {
        store.apply(&MutationRecord::Insert {
            page: PageId(page),
            cell,
            key_len,
        });
    }

    #[test]
    fn allocate_then_query() {
        let mut store = TreeStore::new();
        alloc(&mut store, 1, PageKind::Leaf);
        assert_eq!(store.len(), 1);
        assert_eq!(store.root().unwrap().kind, PageKind::Leaf);
        assert!(store.root().unwrap().cells.is_empty());
    }

    #[test]
    fn reallocation_replaces_existing_node() {
        let mut store = TreeStore::new();
        alloc(&mut store, 2, PageKind::Leaf);
        insert(&mut store, 2, 0, 8);
        alloc(&mut store, 2, PageKind::Interior);
        let node = store.node(PageId(2)).unwrap();
        assert_eq!(node.kind, PageKind::Interior);
        assert!(node.cells.is_empty());
    }

    #[test]
    fn insert_shifts_tail_up() {
        let mut store = TreeStore::new();
        alloc(&mut store, 1, PageKind::Leaf);
        insert(&mut store, 1, 0, 10);
        insert(&mut store, 1, 1, 20);
        insert(&mut store, 1, 0, 30);
        let lens: Vec<u32> = store
            .root()
            .unwrap()
            .cells
            .iter()
            .map(|c| c.key_len)
            .collect();
        assert_eq!(lens, vec![30, 10, 20]);
    }

    #[test]
    fn insert_into_unknown_page_is_a_noop() {
        let mut store = TreeStore::new();
        insert(&mut store, 9, 0, 8);
        assert!(store.is_empty());
    }

    #[test]
    fn delete_preserves_contiguity() {
        let mut store = TreeStore::new();
        alloc(&mut store, 1, PageKind::Leaf);
        for i in 0..5 {
            insert(&mut store, 1, i, i as u32 * 10);
        }
        store.apply(&MutationRecord::Delete {
            page: PageId(1),
            cell: 2,
        });
        let lens: Vec<u32> = store
            .root()
            .unwrap()
            .cells
            .iter()
            .map(|c| c.key_len)
            .collect();
        assert_eq!(lens, vec![0, 10, 30, 40]);
    }

    #[test]
    fn delete_out_of_range_is_a_noop() {
        let mut store = TreeStore::new();
        alloc(&mut store, 1, PageKind::Leaf);
        insert(&mut store, 1, 0, 8);
        store.apply(&MutationRecord::Delete {
            page: PageId(1),
            cell: 5,
        });
        assert_eq!(store.root().unwrap().cells.len(), 1);
    }

    #[test]
    fn free_removes_node_and_leaves_children_dangling() {
        let mut store = TreeStore::new();
        alloc(&mut store, 1, PageKind::Interior);
        alloc(&mut store, 2, PageKind::Leaf);
        store
            .nodes
            .get_mut(&PageId(1))
            .unwrap()
            .children
            .push(PageId(2));
        store.apply(&MutationRecord::Free { page: PageId(2) });
        assert!(store.all_nodes().all(|n| n.page_id != PageId(2)));
        // The reference survives as a dangling entry.
        assert_eq!(store.root().unwrap().children, vec![PageId(2)]);
        assert!(store.node(PageId(2)).is_none());
    }

    #[test]
    fn split_moves_tail_cells_and_reindexes() {
        let mut store = TreeStore::new();
        alloc(&mut store, 1, PageKind::Leaf);
        for i in 0..5 {
            insert(&mut store, 1, i, 100 + i as u32);
        }
        store.apply(&MutationRecord::Split {
            from: PageId(1),
            to: PageId(2),
            at: 2,
        });
        let p = store.node(PageId(1)).unwrap();
        let q = store.node(PageId(2)).unwrap();
        let p_lens: Vec<u32> = p.cells.iter().map(|c| c.key_len).collect();
        let q_lens: Vec<u32> = q.cells.iter().map(|c| c.key_len).collect();
        assert_eq!(p_lens, vec![100, 101]);
        assert_eq!(q_lens, vec![102, 103, 104]);
        assert_eq!(q.kind, PageKind::Leaf);
        assert_eq!(p.children, vec![PageId(2)]);
    }

    #[test]
    fn split_allocates_missing_target_with_source_kind() {
        let mut store = TreeStore::new();
        alloc(&mut store, 1, PageKind::Interior);
        insert(&mut store, 1, 0, 1);
        store.apply(&MutationRecord::Split {
            from: PageId(1),
            to: PageId(7),
            at: 0,
        });
        assert_eq!(store.node(PageId(7)).unwrap().kind, PageKind::Interior);
        assert_eq!(store.node(PageId(7)).unwrap().cells.len(), 1);
        assert!(store.root().unwrap().cells.is_empty());
    }

    #[test]
    fn split_of_unknown_page_is_a_noop() {
        let mut store = TreeStore::new();
        store.apply(&MutationRecord::Split {
            from: PageId(4),
            to: PageId(5),
            at: 0,
        });
        assert!(store.is_empty());
    }

    #[test]
    fn open_resets_and_seeds_root() {
        let mut store = TreeStore::new();
        alloc(&mut store, 3, PageKind::Interior);
        store.apply(&MutationRecord::Open {
            page_size: 4096,
            page_count: 1,
        });
        assert_eq!(store.len(), 1);
        assert_eq!(store.root().unwrap().page_id, PageId::ROOT);
    }

    #[test]
    fn replay_is_deterministic() {
        let sequence = vec![
            MutationRecord::Allocate {
                page: PageId(1),
                kind: PageKind::Leaf,
            },
            MutationRecord::Insert {
                page: PageId(1),
                cell: 0,
                key_len: 16,
            },
            MutationRecord::Insert {
                page: PageId(1),
                cell: 1,
                key_len: 24,
            },
            MutationRecord::Split {
                from: PageId(1),
                to: PageId(2),
                at: 1,
            },
            MutationRecord::Delete {
                page: PageId(2),
                cell: 0,
            },
        ];
        let mut a = TreeStore::new();
        let mut b = TreeStore::new();
        for rec in &sequence {
            a.apply(rec);
        }
        for rec in &sequence {
            b.apply(rec);
        }
        let a_nodes: Vec<&Node> = a.all_nodes().collect();
        let b_nodes: Vec<&Node> = b.all_nodes().collect();
        assert_eq!(a_nodes, b_nodes);
    }

    #[test]
    fn end_to_end_insert_insert_delete() {
        let mut store = TreeStore::new();
        alloc(&mut store, 1, PageKind::Leaf);
        insert(&mut store, 1, 0, 16);
        insert(&mut store, 1, 1, 16);
        store.apply(&MutationRecord::Delete {
            page: PageId(1),
            cell: 0,
        });
        let cells = &store.root().unwrap().cells;
        assert_eq!(cells.len(), 1);
        assert_eq!(cells[0].key_len, 16);
    }

    #[test]
    fn dirty_flag_is_taken_once() {
        let mut store = TreeStore::new();
        alloc(&mut store, 1, PageKind::Leaf);
        assert!(store.take_dirty());
        assert!(!store.take_dirty());
        store.apply(&MutationRecord::Balance {
            page: PageId(1),
            cell_count: 0,
        });
        assert!(!store.take_dirty());
    }
}
