use std::fmt;

/// Identifier of one engine page. Stable for the life of the mirrored node;
/// engines may reuse numbers after a free, which the store treats as a
/// re-allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PageId(pub u32);

impl PageId {
    /// The engine always reports page 1 as the tree root.
    pub const ROOT: PageId = PageId(1);
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Whether a page holds rows (`Leaf`) or routes to children (`Interior`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageKind {
    Leaf,
    Interior,
}

impl PageKind {
    /// Decode the page-flag byte the engine sends with an allocation.
    ///
    /// The leaf bit is 0x08. Allocators emit 0 when the kind is not yet
    /// known; fresh pages begin life as leaves, so 0 maps to `Leaf`.
    pub fn from_flags(flags: u8) -> Self {
        if flags == 0 || flags & 0x08 != 0 {
            PageKind::Leaf
        } else {
            PageKind::Interior
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            PageKind::Leaf => "leaf",
            PageKind::Interior => "interior",
        }
    }
}

/// One cell of a page. The cell's index is its position in `Node::cells`,
/// which stays contiguous from 0 across every mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    pub key_len: u32,
    /// Derived label for display. The engine never forwards real key bytes.
    pub display_key: String,
}

impl Cell {
    pub fn new(key_len: u32) -> Self {
        Self {
            key_len,
            display_key: format!("{key_len}B"),
        }
    }
}

/// The mirror of one engine page.
///
/// `children` entries are weak references by id: a freed child leaves its
/// id behind as a dangling entry, which is drawn but never traversed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub page_id: PageId,
    pub kind: PageKind,
    pub cells: Vec<Cell>,
    pub children: Vec<PageId>,
    /// UI-local collapse toggle. Irrelevant to tree correctness.
    pub expanded: bool,
}

impl Node {
    pub fn new(page_id: PageId, kind: PageKind) -> Self {
        Self {
            page_id,
            kind,
            cells: Vec::new(),
            children: Vec::new(),
            expanded: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_flags_is_leaf() {
        assert_eq!(PageKind::from_flags(0), PageKind::Leaf);
    }

    #[test]
    fn leaf_bit_is_leaf() {
        // Table-leaf flag byte as the engine emits it.
        assert_eq!(PageKind::from_flags(0x0d), PageKind::Leaf);
    }

    #[test]
    fn nonzero_without_leaf_bit_is_interior() {
        assert_eq!(PageKind::from_flags(0x05), PageKind::Interior);
    }

    #[test]
    fn cell_label_derives_from_key_len() {
        assert_eq!(Cell::new(16).display_key, "16B");
    }
}
