//! The visualizer facade: one struct binding normalizer, store, layout and
//! highlight scheduler behind the operation surface the host UI drives.

use std::collections::VecDeque;

use crate::events::normalize::Normalizer;
use crate::events::record::MutationRecord;
use crate::highlight::{FLASH_EDIT_MS, FLASH_SPLIT_MS, HighlightScheduler};
use crate::layout::{self, Layout};
use crate::tree::model::{PageId, PageKind};
use crate::tree::store::TreeStore;

const LOG_CAPACITY: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewMode {
    /// The mirrored tree, drawn spatially.
    Tree,
    /// A scrolling feed of every accepted record.
    Log,
}

impl ViewMode {
    pub fn next(self) -> Self {
        match self {
            Self::Tree => Self::Log,
            Self::Log => Self::Tree,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Tree => "tree",
            Self::Log => "log",
        }
    }
}

#[derive(Debug)]
pub struct Visualizer {
    normalizer: Normalizer,
    store: TreeStore,
    layout: Layout,
    highlights: HighlightScheduler,
    view_mode: ViewMode,
    log: VecDeque<String>,
    last_seq: u64,
    width: i32,
}

impl Visualizer {
    pub fn new() -> Self {
        Self {
            normalizer: Normalizer::new(),
            store: TreeStore::new(),
            layout: Layout::default(),
            highlights: HighlightScheduler::new(),
            view_mode: ViewMode::Tree,
            log: VecDeque::new(),
            last_seq: 0,
            width: 0,
        }
    }

    #[cfg(test)]
    pub fn with_clock(clock: Box<dyn crate::highlight::Clock>) -> Self {
        let mut viz = Self::new();
        viz.highlights = HighlightScheduler::with_clock(clock);
        viz
    }

    /// Entry point for raw engine notifications. Malformed payloads and
    /// unknown codes fall out here without touching any state.
    pub fn on_event(&mut self, code: i32, payload: &str) {
        let Some(stamped) = self.normalizer.normalize(code, payload) else {
            return;
        };
        self.last_seq = stamped.seq;
        self.push_log(format!("#{:<5} {}", stamped.seq, stamped.record.summary()));
        if stamped.record.is_structural() {
            self.apply(&stamped.record);
        }
    }

    fn apply(&mut self, record: &MutationRecord) {
        self.store.apply(record);
        match *record {
            MutationRecord::Insert { page, .. } | MutationRecord::Delete { page, .. } => {
                self.highlights.flash(page, FLASH_EDIT_MS);
            }
            MutationRecord::Split { from, to, .. } => {
                self.highlights.flash(from, FLASH_SPLIT_MS);
                self.highlights.flash(to, FLASH_SPLIT_MS);
            }
            _ => {}
        }
    }

    // -- public operation surface -------------------------------------------

    pub fn add_page(&mut self, page: PageId, kind: PageKind) {
        self.apply(&MutationRecord::Allocate { page, kind });
    }

    pub fn add_cell(&mut self, page: PageId, cell: usize, key_len: u32) {
        self.apply(&MutationRecord::Insert { page, cell, key_len });
    }

    pub fn delete_cell(&mut self, page: PageId, cell: usize) {
        self.apply(&MutationRecord::Delete { page, cell });
    }

    pub fn split_page(&mut self, from: PageId, to: PageId, at: usize) {
        self.apply(&MutationRecord::Split { from, to, at });
    }

    /// Discard store, layout and highlights in one step. The next paint
    /// observes an empty visualization, never a partial reset.
    pub fn clear(&mut self) {
        self.store.clear();
        self.layout = Layout::default();
        self.highlights.clear();
        self.log.clear();
    }

    pub fn set_view_mode(&mut self, mode: ViewMode) {
        self.view_mode = mode;
    }

    pub fn view_mode(&self) -> ViewMode {
        self.view_mode
    }

    pub fn set_animation_speed(&mut self, multiplier: f64) {
        self.highlights.set_speed(multiplier);
    }

    pub fn animation_speed(&self) -> f64 {
        self.highlights.speed()
    }

    pub fn set_show_transitions(&mut self, on: bool) {
        self.highlights.set_enabled(on);
    }

    pub fn show_transitions(&self) -> bool {
        self.highlights.enabled()
    }

    pub fn node_at(&self, x: i32, y: i32) -> Option<PageId> {
        self.layout.hit_test(x, y)
    }

    /// Live node counter, surfaced in the status bar.
    pub fn node_count(&self) -> usize {
        self.store.len()
    }

    pub fn events_seen(&self) -> u64 {
        self.last_seq
    }

    pub fn toggle_expanded(&mut self, page: PageId) {
        self.store.toggle_expanded(page);
    }

    // -- render-loop plumbing ----------------------------------------------

    /// Recompute positions when the store changed or the viewport resized.
    /// Called once per frame, before drawing.
    pub fn relayout_if_needed(&mut self, width: i32) {
        let resized = width != self.width;
        if self.store.take_dirty() || resized {
            self.width = width;
            self.layout = layout::recompute(&self.store, width);
        }
    }

    /// Advance highlight expiry. Returns true when a repaint is due purely
    /// because emphasis ended.
    pub fn tick_highlights(&mut self) -> bool {
        self.highlights.tick()
    }

    pub fn store(&self) -> &TreeStore {
        &self.store
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn is_highlighted(&self, page: PageId) -> bool {
        self.highlights.is_active(page)
    }

    pub fn log_lines(&self) -> impl Iterator<Item = &str> {
        self.log.iter().map(String::as_str)
    }

    fn push_log(&mut self, line: String) {
        if self.log.len() == LOG_CAPACITY {
            self.log.pop_front();
        }
        self.log.push_back(line);
    }
}

impl Default for Visualizer {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::highlight::Clock;
    use std::cell::Cell;
    use std::rc::Rc;

    #[derive(Clone, Default)]
    struct ManualClock(Rc<Cell<u64>>);

    impl Clock for ManualClock {
        fn now_ms(&self) -> u64 {
            self.0.get()
        }
    }

    #[test]
    fn unknown_code_leaves_everything_unchanged() {
        let mut viz = Visualizer::new();
        viz.on_event(6, r#"{"page":1,"type":0}"#);
        let before = viz.node_count();
        viz.on_event(99, "{}");
        assert_eq!(viz.node_count(), before);
        assert_eq!(viz.events_seen(), 1);
    }

    #[test]
    fn end_to_end_event_stream() {
        let mut viz = Visualizer::new();
        viz.on_event(6, r#"{"page":1,"type":0}"#);
        viz.on_event(2, r#"{"page":1,"cell":0,"keyLen":16}"#);
        viz.on_event(2, r#"{"page":1,"cell":1,"keyLen":16}"#);
        viz.on_event(3, r#"{"page":1,"cell":0}"#);
        let root = viz.store().root().unwrap();
        assert_eq!(root.cells.len(), 1);
        assert_eq!(root.cells[0].key_len, 16);
    }

    #[test]
    fn structural_events_flash_their_pages() {
        let clock = ManualClock::default();
        let mut viz = Visualizer::with_clock(Box::new(clock.clone()));
        viz.on_event(6, r#"{"page":1,"type":0}"#);
        assert!(!viz.is_highlighted(PageId(1)));
        viz.on_event(2, r#"{"page":1,"cell":0,"keyLen":8}"#);
        assert!(viz.is_highlighted(PageId(1)));
        viz.on_event(4, r#"{"originalPage":1,"newPage":2,"splitCell":0}"#);
        assert!(viz.is_highlighted(PageId(2)));
        clock.0.set(2000);
        assert!(viz.tick_highlights());
        assert!(!viz.is_highlighted(PageId(1)));
        assert!(!viz.is_highlighted(PageId(2)));
    }

    #[test]
    fn transitions_off_keeps_state_correct_without_highlights() {
        let mut viz = Visualizer::new();
        viz.set_show_transitions(false);
        viz.on_event(6, r#"{"page":1,"type":0}"#);
        viz.on_event(2, r#"{"page":1,"cell":0,"keyLen":8}"#);
        assert!(!viz.is_highlighted(PageId(1)));
        assert_eq!(viz.store().root().unwrap().cells.len(), 1);
    }

    #[test]
    fn informational_records_only_feed_the_log() {
        let mut viz = Visualizer::new();
        viz.on_event(8, r#"{"sql":"SELECT 1"}"#);
        viz.on_event(12, r#"{"pc":0,"opcode":"Init","p1":0,"p2":1,"p3":0}"#);
        assert_eq!(viz.node_count(), 0);
        assert_eq!(viz.log_lines().count(), 2);
    }

    #[test]
    fn facade_ops_mirror_event_stream_semantics() {
        let mut viz = Visualizer::new();
        viz.add_page(PageId(1), PageKind::Leaf);
        for i in 0..5 {
            viz.add_cell(PageId(1), i, i as u32);
        }
        viz.split_page(PageId(1), PageId(2), 2);
        assert_eq!(viz.store().node(PageId(1)).unwrap().cells.len(), 2);
        assert_eq!(viz.store().node(PageId(2)).unwrap().cells.len(), 3);
        viz.delete_cell(PageId(2), 0);
        assert_eq!(viz.store().node(PageId(2)).unwrap().cells.len(), 2);
        assert_eq!(viz.node_count(), 2);
    }

    #[test]
    fn node_at_reflects_current_layout() {
        let mut viz = Visualizer::new();
        viz.add_page(PageId(1), PageKind::Leaf);
        viz.relayout_if_needed(80);
        let pos = viz.layout().pos(PageId(1)).unwrap();
        assert_eq!(viz.node_at(pos.x + 1, pos.y + 1), Some(PageId(1)));
        assert_eq!(viz.node_at(-5, -5), None);
    }

    #[test]
    fn clear_is_atomic() {
        let mut viz = Visualizer::new();
        viz.add_page(PageId(1), PageKind::Leaf);
        viz.add_cell(PageId(1), 0, 4);
        viz.relayout_if_needed(80);
        viz.clear();
        assert_eq!(viz.node_count(), 0);
        assert!(!viz.is_highlighted(PageId(1)));
        viz.relayout_if_needed(80);
        assert!(viz.layout().is_empty());
        assert_eq!(viz.log_lines().count(), 0);
    }

    #[test]
    fn relayout_only_when_dirty_or_resized() {
        let mut viz = Visualizer::new();
        viz.add_page(PageId(1), PageKind::Leaf);
        viz.relayout_if_needed(80);
        let x80 = viz.layout().pos(PageId(1)).unwrap().x;
        viz.relayout_if_needed(120);
        let x120 = viz.layout().pos(PageId(1)).unwrap().x;
        assert_ne!(x80, x120);
    }
}
