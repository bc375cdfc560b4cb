/// Default number of bills revealed per batch.
pub const DEFAULT_BATCH_SIZE: usize = 15;

/// Incremental "reveal more" pagination over an already ordered list.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Pager {
    batch: usize,
    visible: usize,
}

impl Default for Pager {
    fn default() -> Self {
        Self::new(DEFAULT_BATCH_SIZE)
    }
}

impl Pager {
    /// A zero batch is bumped to one so the pager always makes progress.
    pub fn new(batch: usize) -> Self {
        let batch = batch.max(1);
        Self {
            batch,
            visible: batch,
        }
    }

    pub fn batch_size(&self) -> usize {
        self.batch
    }

    /// Current reveal limit; may exceed the list length.
    pub fn limit(&self) -> usize {
        self.visible
    }

    /// Number of items actually shown out of `total`.
    pub fn visible_count(&self, total: usize) -> usize {
        self.visible.min(total)
    }

    pub fn has_more(&self, total: usize) -> bool {
        self.visible < total
    }

    /// Grows the limit by one batch while items remain hidden. Returns
    /// whether anything new was revealed.
    pub fn reveal_more(&mut self, total: usize) -> bool {
        if !self.has_more(total) {
            return false;
        }
        self.visible = self.visible.saturating_add(self.batch);
        true
    }

    /// Back to the first batch.
    pub fn reset(&mut self) {
        self.visible = self.batch;
    }

    pub fn page<'s, T>(&self, items: &'s [T]) -> &'s [T] {
        &items[..self.visible_count(items.len())]
    }
}
