//! Victim selection.
//!
//! The victim scanner walks the arena circularly from a rotating cursor.
//! Unused, orphaned, and zero-reuse blocks stop the scan immediately;
//! otherwise each candidate's reuse counter is aged to zero and counted as
//! one attempt, and after the attempt budget is spent the smallest-reuse
//! candidate seen is returned. Locked blocks are skipped without counting.

use crate::cache::block::Block;

/// Rotating-cursor victim selector over the block arena.
pub struct VictimSelector {
    cursor: u32,
}

impl VictimSelector {
    /// Creates a selector with the cursor at block 0; the starting point
    /// does not affect correctness, but a fixed one keeps runs
    /// reproducible.
    pub fn new() -> Self {
        Self { cursor: 0 }
    }

    /// Returns the cursor where the next scan will start.
    pub fn cursor(&self) -> u32 {
        self.cursor
    }

    /// Selects a victim block.
    ///
    /// Walks up to `max_attempts` non-locked candidates from the cursor.
    /// A candidate that is unused, orphaned, or has a zero reuse counter
    /// ends the scan immediately; every other candidate has its reuse
    /// counter aged to zero and is remembered if its prior counter is the
    /// smallest seen so far. If the attempt budget runs out, the
    /// remembered candidate is the victim. The cursor always ends up one
    /// past the last candidate examined and is never rewound.
    ///
    /// # Panics
    ///
    /// Panics if the scan keeps meeting locked blocks for more than two
    /// full passes over the arena; an arena that is entirely locked cannot
    /// make progress.
    pub fn select(&mut self, blocks: &mut [Block], max_attempts: u32) -> u32 {
        let capacity = blocks.len() as u32;
        let mut attempts = 0;
        let mut locked_skips: u64 = 0;
        let mut best: Option<(u32, u8)> = None;

        loop {
            let v = self.cursor;
            self.cursor = (self.cursor + 1) % capacity;
            let block = &mut blocks[v as usize];

            if block.meta.locked {
                locked_skips += 1;
                assert!(
                    locked_skips <= 2 * u64::from(capacity),
                    "victim scan cannot make progress: all {} blocks are locked",
                    capacity
                );
                continue;
            }

            let meta = block.meta;
            if !meta.valid || !meta.parent_valid || meta.reuse == 0 {
                return v;
            }

            // Age the counter; remember the index and its prior counter
            // together so the fallback victim matches its recorded value.
            if best.map_or(true, |(_, r)| meta.reuse < r) {
                best = Some((v, meta.reuse));
            }
            block.meta.reuse = 0;

            attempts += 1;
            if attempts >= max_attempts {
                let (idx, _) = best.expect("at least one candidate was aged");
                return idx;
            }
        }
    }
}

impl Default for VictimSelector {
    fn default() -> Self {
        Self::new()
    }
}
