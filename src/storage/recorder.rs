//! Composition root of the capture engine: precursor ring, circular log,
//! and the event-window pool with its overwrite-protection sweep.

use heapless::Vec;
use log::{debug, info, warn};

use super::log::CircularLog;
use super::precursor::PrecursorBuffer;
use super::sample::SampleRecord;
use super::window::{EventWindow, WindowState};

/// Owns all capture state; no external component mutates the rings or the
/// pool except through these operations.
///
/// `N` is the main log capacity, `M` the precursor capacity, `K` the
/// window-descriptor pool size. Single-producer, cooperative: within one
/// tick a `put` and its sweep complete before anything can read.
#[derive(Debug)]
pub struct Recorder<const N: usize, const M: usize, const K: usize> {
    precursor: PrecursorBuffer<M>,
    log: CircularLog<N>,
    windows: [EventWindow; K],
    /// Pool cursor; advances circularly, reusing the oldest descriptor.
    g: usize,
    /// Monotonic count of records ever committed to the log. A window's
    /// first record carries sequence `start_seq`; ring writes reclaim a
    /// window's slots oldest-first, so its data is intact exactly while
    /// `puts <= start_seq + N`.
    puts: u64,
    /// Pool slot of the currently open window, if any.
    open: Option<usize>,
}

impl<const N: usize, const M: usize, const K: usize> Recorder<N, M, K> {
    pub const fn new() -> Self {
        Self {
            precursor: PrecursorBuffer::new(),
            log: CircularLog::new(),
            windows: [EventWindow::empty(); K],
            g: 0,
            puts: 0,
            open: None,
        }
    }

    pub fn log(&self) -> &CircularLog<N> {
        &self.log
    }

    pub fn windows(&self) -> &[EventWindow; K] {
        &self.windows
    }

    pub fn open_slot(&self) -> Option<usize> {
        self.open
    }

    /// Record every tick's raw sample here, event or no event.
    pub fn push_precursor(&mut self, record: SampleRecord) {
        self.precursor.push(record);
    }

    /// Commit a record to the log and run the overwrite-protection sweep.
    ///
    /// Closed descriptors other than the open one are invalidated the
    /// moment the put sequence shows their oldest record has been
    /// rewritten; a reader can never dereference silently overwritten
    /// slots.
    pub fn put(&mut self, record: SampleRecord) {
        Self::commit(
            &mut self.log,
            &mut self.windows,
            self.open,
            &mut self.puts,
            record,
        );
    }

    fn commit(
        log: &mut CircularLog<N>,
        windows: &mut [EventWindow; K],
        open: Option<usize>,
        puts: &mut u64,
        record: SampleRecord,
    ) {
        log.put(record);
        *puts += 1;
        for (slot, window) in windows.iter_mut().enumerate() {
            // Zero-length windows claim no log slots, so no put can
            // overwrite their data.
            if Some(slot) == open || window.len == 0 || window.state() != WindowState::Closed {
                continue;
            }
            if *puts > window.start_seq + N as u64 {
                debug!(
                    "window {} overwritten at put {}, invalidating",
                    slot, *puts
                );
                window.invalidate();
            }
        }
    }

    /// Open an event: drain the precursor into the log through the normal
    /// put path, then lock the next pool descriptor at the current cursor.
    ///
    /// The drain happens exactly once per event and before the lock, so
    /// the event timestamp is the freshest pre-event sample. `now_ms`
    /// stands in when the log holds nothing yet. Opening while an event is
    /// already open is a caller error.
    pub fn open_event(&mut self, now_ms: u64) -> usize {
        assert!(self.open.is_none(), "event already open");

        let Self {
            precursor,
            log,
            windows,
            puts,
            ..
        } = self;
        for record in precursor.iter_chronological() {
            Self::commit(log, windows, None, puts, *record);
        }

        self.g = (self.g + 1) % K;
        if self.windows[self.g].state() == WindowState::Closed {
            warn!("window pool full, evicting descriptor {}", self.g);
        }
        let at_cursor = self.log.read(self.log.cursor());
        let t_ms = if at_cursor.is_valid() {
            at_cursor.t_ms
        } else {
            now_ms
        };
        self.windows[self.g] = EventWindow {
            start: self.log.cursor(),
            len: 0,
            t_ms,
            locked: true,
            wrapped: false,
            start_seq: self.puts,
        };
        self.open = Some(self.g);
        info!("event open: window {} start {}", self.g, self.log.cursor());
        self.g
    }

    /// Close the open event, fixing the window length.
    ///
    /// If the log wrapped past the window start during capture, the window
    /// is flagged wrapped and every other descriptor whose start now lies
    /// inside the freshly written range is invalidated. Closing with no
    /// open event is a caller error.
    pub fn close_event(&mut self) -> usize {
        let slot = self.open.take().expect("no open event to close");
        let r = self.log.cursor();
        let start = self.windows[slot].start;
        let grown = (self.puts - self.windows[slot].start_seq) as usize;
        let len = (r + N - start) % N;
        let wrapped = grown > 0 && start + grown >= N;

        if wrapped {
            for (other, window) in self.windows.iter_mut().enumerate() {
                if other == slot || window.state() != WindowState::Closed {
                    continue;
                }
                if EventWindow::index_in_range(window.start, start, r) {
                    debug!("window {} overlapped by wrapped capture, invalidating", other);
                    window.invalidate();
                }
            }
        }

        let window = &mut self.windows[slot];
        window.len = len;
        window.wrapped = wrapped;
        window.locked = false;
        info!(
            "event closed: window {} start {} len {}{}",
            slot,
            start,
            len,
            if wrapped { " wrapped" } else { "" }
        );
        slot
    }

    /// Ordered records of a closed window, oldest first.
    ///
    /// `None` rejects Empty, invalidated, and still-open descriptors; a
    /// window whose data was overwritten never yields stale records.
    pub fn read_window(&self, slot: usize) -> Option<impl Iterator<Item = &SampleRecord>> {
        let window = self.windows.get(slot)?;
        if window.state() != WindowState::Closed {
            return None;
        }
        let start = window.start;
        Some((1..=window.len).map(move |k| self.log.read((start + k) % N)))
    }

    /// Pool slots currently holding a readable (closed, valid) window.
    pub fn valid_windows(&self) -> Vec<usize, K> {
        let mut out = Vec::new();
        for (slot, window) in self.windows.iter().enumerate() {
            if window.state() == WindowState::Closed {
                let _ = out.push(slot);
            }
        }
        out
    }

    /// Reinitialize both rings and every descriptor to Empty. Idempotent.
    pub fn reset(&mut self) {
        self.precursor.reset();
        self.log.reset();
        for window in self.windows.iter_mut() {
            window.invalidate();
        }
        self.g = 0;
        self.puts = 0;
        self.open = None;
    }
}

impl<const N: usize, const M: usize, const K: usize> Default for Recorder<N, M, K> {
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

    fn put_n<const N: usize, const M: usize, const K: usize>(
        rec: &mut Recorder<N, M, K>,
        from: u64,
        count: u64,
    ) -> u64 {
        for t in from..from + count {
            rec.put(record(t));
        }
        from + count
    }

    #[test]
    fn round_trip_without_wraparound() {
        let mut rec = Recorder::<8, 4, 4>::new();
        let slot = rec.open_event(100);
        put_n(&mut rec, 200, 3);
        assert_eq!(rec.close_event(), slot);

        let window = rec.windows()[slot];
        assert_eq!(window.len, 3);
        assert!(!window.wrapped);
        assert_eq!(window.state(), WindowState::Closed);

        let stamps: Vec<u64, 8> = rec.read_window(slot).unwrap().map(|r| r.t_ms).collect();
        assert_eq!(stamps.as_slice(), &[200, 201, 202]);
    }

    #[test]
    fn wrapped_capture_invalidates_overlapped_windows() {
        let mut rec = Recorder::<8, 4, 4>::new();
        // First event: start 7, one record at slot 0.
        put_n(&mut rec, 10, 7); // cursor 7
        let w1 = rec.open_event(17);
        put_n(&mut rec, 20, 1); // cursor 0
        rec.close_event();
        assert_eq!(rec.windows()[w1].start, 7);

        // Bring the cursor to 6, then capture four records across the seam.
        put_n(&mut rec, 30, 6); // cursor 6
        assert_eq!(rec.valid_windows().as_slice(), &[w1]);
        let w2 = rec.open_event(37);
        put_n(&mut rec, 40, 4); // cursor wraps to 2
        rec.close_event();

        let window = rec.windows()[w2];
        assert_eq!(window.start, 6);
        assert_eq!(window.len, 4);
        assert!(window.wrapped);

        // The first window started inside {6, 7, 0, 1}; it must be gone.
        assert_eq!(rec.windows()[w1].state(), WindowState::Empty);
        assert!(rec.read_window(w1).is_none());

        let stamps: Vec<u64, 8> = rec.read_window(w2).unwrap().map(|r| r.t_ms).collect();
        assert_eq!(stamps.as_slice(), &[40, 41, 42, 43]);
    }

    #[test]
    fn closed_window_is_invalidated_exactly_when_overwritten() {
        let mut rec = Recorder::<8, 4, 4>::new();
        let slot = rec.open_event(100);
        put_n(&mut rec, 200, 3); // records at slots 1..=3
        rec.close_event();

        // Five more puts fill the remaining free slots (4..=7 and 0); the
        // window's own records are still intact.
        put_n(&mut rec, 300, 5);
        assert_eq!(rec.windows()[slot].state(), WindowState::Closed);
        assert!(rec.read_window(slot).is_some());

        // The next put rewrites slot 1, the window's oldest record.
        put_n(&mut rec, 400, 1);
        assert_eq!(rec.windows()[slot].state(), WindowState::Empty);
        assert!(rec.read_window(slot).is_none());
    }

    #[test]
    fn open_window_is_never_swept() {
        let mut rec = Recorder::<4, 2, 2>::new();
        let slot = rec.open_event(100);
        // Capture more records than the log holds; the open window must
        // survive its own growth.
        put_n(&mut rec, 200, 11);
        assert_eq!(rec.windows()[slot].state(), WindowState::Open);
        rec.close_event();
        // Length collapses modulo the capacity, flagged wrapped.
        let window = rec.windows()[slot];
        assert!(window.wrapped);
        assert_eq!(window.len, 11 % 4);
    }

    #[test]
    fn zero_length_window_survives_any_number_of_puts() {
        let mut rec = Recorder::<4, 2, 2>::new();
        put_n(&mut rec, 10, 2);
        let slot = rec.open_event(12);
        rec.close_event();
        assert_eq!(rec.windows()[slot].len, 0);

        // The window claims no slots, so the sweep leaves it alone no
        // matter how far the log advances.
        put_n(&mut rec, 100, 9);
        assert_eq!(rec.windows()[slot].state(), WindowState::Closed);
        assert_eq!(rec.read_window(slot).unwrap().count(), 0);
    }

    #[test]
    fn pool_reuses_the_oldest_descriptor() {
        let mut rec = Recorder::<16, 2, 2>::new();
        let mut slots = [0usize; 3];
        for (event, slot) in slots.iter_mut().enumerate() {
            *slot = rec.open_event(100 + event as u64);
            put_n(&mut rec, 200 + 10 * event as u64, 2);
            rec.close_event();
        }
        // Two descriptors, three events: the first was evicted.
        assert_eq!(slots[0], slots[2]);
        assert_eq!(rec.valid_windows().len(), 2);
        let survivor = rec.windows()[slots[1]];
        assert_eq!(survivor.state(), WindowState::Closed);
    }

    #[test]
    fn precursor_drain_leads_the_capture() {
        let mut rec = Recorder::<16, 4, 2>::new();
        for t in 100..104 {
            rec.push_precursor(record(t));
        }
        let slot = rec.open_event(110);
        put_n(&mut rec, 200, 2);
        rec.close_event();

        // Event timestamp is the freshest pre-event sample.
        assert_eq!(rec.windows()[slot].t_ms, 103);
        // Drained samples sit in the log just before the window start.
        let start = rec.windows()[slot].start;
        assert_eq!(rec.log().read(start).t_ms, 103);
        assert_eq!(rec.log().read((start + 16 - 3) % 16).t_ms, 100);
        let stamps: Vec<u64, 4> = rec.read_window(slot).unwrap().map(|r| r.t_ms).collect();
        assert_eq!(stamps.as_slice(), &[200, 201]);
    }

    #[test]
    fn reset_twice_equals_reset_once() {
        let mut rec = Recorder::<8, 4, 4>::new();
        rec.open_event(100);
        put_n(&mut rec, 200, 5);
        rec.close_event();

        rec.reset();
        assert!(rec.valid_windows().is_empty());
        assert_eq!(rec.log().cursor(), 0);
        assert!(rec.log().iter_slots().all(|r| !r.is_valid()));

        rec.reset();
        assert!(rec.valid_windows().is_empty());
        assert_eq!(rec.log().cursor(), 0);
        assert!(rec.log().iter_slots().all(|r| !r.is_valid()));
    }

    #[test]
    #[should_panic(expected = "no open event")]
    fn closing_without_an_open_event_panics() {
        let mut rec = Recorder::<8, 4, 4>::new();
        rec.close_event();
    }
}
