/// Nodes admitted per animation-frame tick.
pub const REVEAL_BATCH: usize = 100;

/// Admits nodes into the visible set in fixed batches, in the snapshot's
/// original order, so a large dataset never blocks a single frame. Ticks are
/// version-guarded: a tick carrying a stale version is a no-op, which is how
/// an in-flight admission loop is cancelled by a snapshot replacement.
#[derive(Clone, Copy, Debug)]
pub struct RevealScheduler {
    version: u64,
    admitted: usize,
    total: usize,
}

impl RevealScheduler {
    pub fn new() -> Self {
        Self {
            version: 0,
            admitted: 0,
            total: 0,
        }
    }

    /// A new snapshot always restarts from an empty visible set.
    pub fn reset(&mut self, version: u64, total: usize) {
        self.version = version;
        self.admitted = 0;
        self.total = total;
    }

    /// Returns true when more nodes were admitted.
    pub fn tick(&mut self, version: u64) -> bool {
        if version != self.version || self.admitted >= self.total {
            return false;
        }
        self.admitted = (self.admitted + REVEAL_BATCH).min(self.total);
        true
    }

    pub fn admitted(&self) -> usize {
        self.admitted
    }

    pub fn complete(&self) -> bool {
        self.admitted >= self.total
    }
}
