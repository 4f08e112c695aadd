//! Small ring of the most recent raw samples, kept ahead of any event.

use super::sample::SampleRecord;

/// Fixed-capacity precursor ring.
///
/// Every tick's sample lands here unconditionally, overwriting the oldest
/// slot; there is no notion of committed history and no failure mode.
/// When an event opens, the recorder drains the buffer in chronological
/// order into the main log so the capture starts before the trigger.
#[derive(Debug, Clone)]
pub struct PrecursorBuffer<const M: usize> {
    data: [SampleRecord; M],
    /// Write cursor; the slot at `j` holds the newest sample.
    j: usize,
}

impl<const M: usize> PrecursorBuffer<M> {
    pub const fn new() -> Self {
        Self {
            data: [SampleRecord::nominal(); M],
            j: 0,
        }
    }

    pub const fn capacity(&self) -> usize {
        M
    }

    /// Advance the cursor and overwrite the oldest slot. Old data is
    /// silently lost once the buffer is full; capacity is chosen to cover
    /// the longest anticipated pre-event lead time.
    pub fn push(&mut self, record: SampleRecord) {
        self.j = (self.j + 1) % M;
        self.data[self.j] = record;
    }

    /// Valid records oldest first, starting just after the cursor.
    ///
    /// This is the drain order for an opening event. The buffer itself is
    /// not cleared; later pushes keep overwriting it.
    pub fn iter_chronological(&self) -> impl Iterator<Item = &SampleRecord> {
        (1..=M)
            .map(move |k| &self.data[(self.j + k) % M])
            .filter(|r| r.is_valid())
    }

    /// Rewind the cursor and nominalize every slot.
    pub fn reset(&mut self) {
        self.j = 0;
        for slot in self.data.iter_mut() {
            *slot = SampleRecord::nominal();
        }
    }
}

impl<const M: usize> Default for PrecursorBuffer<M> {
    fn default() -> Self {
        Self::new()
    }
}
