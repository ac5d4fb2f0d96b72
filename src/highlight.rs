//! Time-boxed visual emphasis for mutated pages.
//!
//! One window per page: `flash` opens it, the per-frame `tick` closes it
//! once its scaled duration elapses. Expiry bookkeeping is a min-heap of
//! deadlines polled once per tick, so applying mutations never blocks on
//! animation and expiry is testable against a manual clock.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use std::time::Instant;

use crate::tree::model::PageId;

/// Base duration for insert/delete emphasis.
pub const FLASH_EDIT_MS: u64 = 500;
/// Base duration for split emphasis (both pages involved).
pub const FLASH_SPLIT_MS: u64 = 1000;

const MIN_SPEED: f64 = 0.01;

/// Monotonic millisecond clock, injectable so tests can drive time by hand.
pub trait Clock {
    fn now_ms(&self) -> u64;
}

/// Wall clock measured from construction.
#[derive(Debug)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        self.origin.elapsed().as_millis() as u64
    }
}

#[derive(Debug, Clone, Copy)]
struct Window {
    end_ms: u64,
}

pub struct HighlightScheduler {
    clock: Box<dyn Clock>,
    active: HashMap<PageId, Window>,
    deadlines: BinaryHeap<Reverse<(u64, PageId)>>,
    speed: f64,
    enabled: bool,
}

impl HighlightScheduler {
    pub fn new() -> Self {
        Self::with_clock(Box::new(SystemClock::new()))
    }

    pub fn with_clock(clock: Box<dyn Clock>) -> Self {
        Self {
            clock,
            active: HashMap::new(),
            deadlines: BinaryHeap::new(),
            speed: 1.0,
            enabled: true,
        }
    }

    /// Open (or restart) a highlight window on `page`. The visible length
    /// is `duration_ms / speed`, so slower speeds hold the emphasis longer.
    pub fn flash(&mut self, page: PageId, duration_ms: u64) {
        if !self.enabled {
            return;
        }
        let end_ms = self.clock.now_ms() + (duration_ms as f64 / self.speed) as u64;
        self.active.insert(page, Window { end_ms });
        self.deadlines.push(Reverse((end_ms, page)));
    }

    /// Whether `page` should draw emphasized right now.
    pub fn is_active(&self, page: PageId) -> bool {
        self.active
            .get(&page)
            .is_some_and(|w| self.clock.now_ms() < w.end_ms)
    }

    #[allow(dead_code)] // used in tests
    pub fn any_active(&self) -> bool {
        let now = self.clock.now_ms();
        self.active.values().any(|w| now < w.end_ms)
    }

    /// Drop expired windows. Returns true when something expired, meaning a
    /// repaint is due even without new mutations. Heap entries belonging to
    /// a window that has since been restarted are stale and skipped.
    pub fn tick(&mut self) -> bool {
        let now = self.clock.now_ms();
        let mut expired = false;
        while let Some(&Reverse((end_ms, page))) = self.deadlines.peek() {
            if end_ms > now {
                break;
            }
            self.deadlines.pop();
            if self.active.get(&page).is_some_and(|w| w.end_ms == end_ms) {
                self.active.remove(&page);
                expired = true;
            }
        }
        expired
    }

    /// Speed multiplier, clamped positive. Applies to windows opened after
    /// the change; in-flight windows keep their length.
    pub fn set_speed(&mut self, multiplier: f64) {
        self.speed = multiplier.max(MIN_SPEED);
    }

    pub fn speed(&self) -> f64 {
        self.speed
    }

    /// When off, `flash` becomes a no-op. State correctness is unaffected.
    pub fn set_enabled(&mut self, on: bool) {
        self.enabled = on;
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Cancel every pending highlight.
    pub fn clear(&mut self) {
        self.active.clear();
        self.deadlines.clear();
    }
}

impl std::fmt::Debug for HighlightScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HighlightScheduler")
            .field("active", &self.active.len())
            .field("speed", &self.speed)
            .field("enabled", &self.enabled)
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
