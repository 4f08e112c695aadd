//! The main fixed-capacity ring of committed records.

use super::sample::SampleRecord;

/// Circular log; the system of record for everything retrievable.
///
/// The write cursor advances on every committed sample and the slot at the
/// cursor always holds the newest record. Every other slot is eligible for
/// overwrite at any time; protecting captured event data from overwrite is
/// the recorder's job, not the log's.
#[derive(Debug, Clone)]
pub struct CircularLog<const N: usize> {
    data: [SampleRecord; N],
    /// Write cursor; the slot at `r` holds the most recently written
    /// record.
    r: usize,
}

impl<const N: usize> CircularLog<N> {
    pub const fn new() -> Self {
        Self {
            data: [SampleRecord::nominal(); N],
            r: 0,
        }
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    /// Current write cursor.
    pub const fn cursor(&self) -> usize {
        self.r
    }

    /// Advance the cursor and store `record` there. Returns the slot
    /// written.
    pub fn put(&mut self, record: SampleRecord) -> usize {
        self.r = (self.r + 1) % N;
        self.data[self.r] = record;
        self.r
    }

    /// Record at an absolute slot index.
    ///
    /// `index >= N` is a caller error, not a runtime failure the log
    /// signals; it panics like any out-of-bounds slice access.
    pub fn read(&self, index: usize) -> &SampleRecord {
        &self.data[index]
    }

    /// All slots in storage order, including never-written ones.
    pub fn iter_slots(&self) -> impl Iterator<Item = &SampleRecord> {
        self.data.iter()
    }

    /// Rewind the cursor and nominalize every slot.
    pub fn reset(&mut self) {
        self.r = 0;
        for slot in self.data.iter_mut() {
            *slot = SampleRecord::nominal();
        }
    }
}

impl<const N: usize> Default for CircularLog<N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(t_ms: u64) -> SampleRecord {
        SampleRecord {
            t_ms,
            ..SampleRecord::nominal()
        }
    }

    #[test]
    fn keeps_exactly_the_last_n_records() {
        let mut log = CircularLog::<8>::new();
        for t in 1..=10 {
            log.put(record(t));
        }
        let mut stamps: [u64; 8] = [0; 8];
        for (slot, rec) in stamps.iter_mut().zip(log.iter_slots()) {
            *slot = rec.t_ms;
        }
        stamps.sort_unstable();
        assert_eq!(stamps, [3, 4, 5, 6, 7, 8, 9, 10]);
        // Cursor sits on the newest record.
        assert_eq!(log.read(log.cursor()).t_ms, 10);
    }

    #[test]
    fn cursor_advances_before_storing() {
        let mut log = CircularLog::<4>::new();
        let slot = log.put(record(5));
        assert_eq!(slot, 1);
        assert_eq!(log.read(1).t_ms, 5);
        // Slot 0 is only reached on wraparound.
        assert!(!log.read(0).is_valid());
    }

    #[test]
    fn reset_is_idempotent() {
        let mut log = CircularLog::<4>::new();
        for t in 2..=9 {
            log.put(record(t));
        }
        log.reset();
        let first: CircularLog<4> = log.clone();
        log.reset();
        assert_eq!(log.cursor(), 0);
        for (a, b) in first.iter_slots().zip(log.iter_slots()) {
            assert_eq!(a, b);
        }
        assert!(log.iter_slots().all(|r| !r.is_valid()));
    }
}
