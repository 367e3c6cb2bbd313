use std::cell::Cell;

/// Monotonic id generator for in-process identifiers.
///
/// Used to default notification tags when the page supplies none; ids
/// are unique within a process lifetime, which is all a deduplication
/// key needs.
#[derive(Debug)]
pub struct IdGenerator {
    next: Cell<u64>,
}

impl IdGenerator {
    /// Creates a new generator starting at the provided value.
    pub fn new(start: u64) -> Self {
        Self {
            next: Cell::new(start),
        }
    }

    /// Returns the next id in sequence.
    pub fn next(&self) -> u64 {
        let id = self.next.get();
        self.next.set(id + 1);
        id
    }

    /// Returns the next id rendered with a string prefix, e.g. `wren-7`.
    pub fn next_tagged(&self, prefix: &str) -> String {
        format!("{prefix}-{}", self.next())
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new(1)
    }
}
