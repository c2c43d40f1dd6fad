use std::collections::BTreeSet;

use crate::timer::Millis;

pub const REVEAL_STAGGER_MS: Millis = 800;

/// Lines of the current screen whose staggered reveal has completed.
#[derive(Debug, Default, Clone)]
pub struct LineRevealer {
    line_count: usize,
    visible: BTreeSet<usize>,
}

impl LineRevealer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forgets the previous screen and returns the reveal plan for the new
    /// one as `(line, delay_ms)` pairs.
    pub fn restart(&mut self, line_count: usize) -> impl Iterator<Item = (usize, Millis)> {
        self.line_count = line_count;
        self.visible.clear();
        (0..line_count).map(|line| (line, line as Millis * REVEAL_STAGGER_MS))
    }

    pub fn clear(&mut self) {
        self.line_count = 0;
        self.visible.clear();
    }

    /// Returns false for lines outside the current screen or already shown.
    pub fn reveal(&mut self, line: usize) -> bool {
        line < self.line_count && self.visible.insert(line)
    }

    pub fn visible_lines(&self) -> Vec<usize> {
        self.visible.iter().copied().collect()
    }

    pub fn visible_count(&self) -> usize {
        self.visible.len()
    }
}
