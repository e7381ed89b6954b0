//! Featured carousel
//!
//! The carousel shows the most viewed movies and rotates on a fixed period.
//! Rotation is a deadline schedule polled by the event loop, so a slow frame
//! that misses several periods still applies every tick it owes.

use std::time::{Duration, Instant};

use crate::models::Movie;

/// Number of movies in the featured set
pub const FEATURED_COUNT: usize = 5;

/// Auto-advance period
pub const AUTO_ADVANCE_INTERVAL: Duration = Duration::from_millis(5000);

/// Pick the featured set: highest view count first, ties keep catalog order
pub fn select_featured(movies: &[Movie]) -> Vec<Movie> {
    let mut ranked = movies.to_vec();
    // sort_by is stable
    ranked.sort_by(|a, b| b.view_count.cmp(&a.view_count));
    ranked.truncate(FEATURED_COUNT);
    ranked
}

// =============================================================================
// Carousel
// =============================================================================

/// Featured movies plus the index of the one on screen
#[derive(Debug, Clone, Default)]
pub struct Carousel {
    items: Vec<Movie>,
    current: usize,
}

impl Carousel {
    pub fn new(items: Vec<Movie>) -> Self {
        Self { items, current: 0 }
    }

    /// Build from a freshly loaded catalog page
    pub fn from_catalog(movies: &[Movie]) -> Self {
        Self::new(select_featured(movies))
    }

    pub fn items(&self) -> &[Movie] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    /// Movie on screen, `None` for an empty carousel
    pub fn current(&self) -> Option<&Movie> {
        self.items.get(self.current)
    }

    /// Apply one auto-advance tick
    pub fn tick(&mut self) {
        self.advance(1);
    }

    /// Apply `ticks` auto-advance ticks at once
    pub fn advance(&mut self, ticks: u32) {
        let n = self.items.len();
        if n == 0 {
            return;
        }
        self.current = (self.current + ticks as usize % n) % n;
    }

    pub fn next(&mut self) {
        self.advance(1);
    }

    pub fn prev(&mut self) {
        let n = self.items.len();
        if n == 0 {
            return;
        }
        self.current = (self.current + n - 1) % n;
    }

    /// Jump to a dot. Out-of-range indices are ignored; returns whether it moved.
    pub fn jump(&mut self, index: usize) -> bool {
        if index < self.items.len() {
            self.current = index;
            true
        } else {
            false
        }
    }
}

// =============================================================================
// Auto-advance schedule
// =============================================================================

/// Fixed-period deadline schedule.
///
/// Manual navigation does not touch the schedule.
#[derive(Debug, Clone)]
pub struct AutoAdvance {
    interval: Duration,
    next_due: Instant,
}

impl AutoAdvance {
    pub fn new(interval: Duration, now: Instant) -> Self {
        let interval = interval.max(Duration::from_millis(1));
        Self {
            interval,
            next_due: now + interval,
        }
    }

    /// Schedule for a carousel; an empty carousel gets no timer
    pub fn for_carousel(carousel: &Carousel, now: Instant) -> Option<Self> {
        if carousel.is_empty() {
            None
        } else {
            Some(Self::new(AUTO_ADVANCE_INTERVAL, now))
        }
    }

    /// Number of periods that elapsed since the last poll
    pub fn due_ticks(&mut self, now: Instant) -> u32 {
        if now < self.next_due {
            return 0;
        }
        let overdue = now.duration_since(self.next_due).as_nanos();
        let extra = overdue / self.interval.as_nanos();
        let ticks = u32::try_from(extra + 1).unwrap_or(u32::MAX);
        self.next_due += self.interval * ticks;
        ticks
    }

    /// Time left before the next advance is due
    pub fn time_until_next(&self, now: Instant) -> Duration {
        self.next_due.saturating_duration_since(now)
    }
}
