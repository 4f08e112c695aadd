//! Event window descriptors: which slice of the log belongs to a capture.

use super::sample::SENTINEL_MS;

/// Lifecycle of a descriptor. Empty → Open → Closed, and Closed → Empty
/// when invalidated; no other transitions are legal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowState {
    Empty,
    Open,
    Closed,
}

/// Descriptor of one captured event: a contiguous, possibly wrapped slice
/// of the circular log.
///
/// While `locked`, the window is open and its length grows implicitly as
/// the log cursor advances. Once unlocked the length is fixed, and the
/// overwrite-protection sweep may invalidate the descriptor as soon as new
/// samples reclaim its slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventWindow {
    /// Log cursor at lock time; the window's records sit at
    /// `(start+1) ..= (start+len)` mod capacity.
    pub start: usize,
    /// Record count, fixed at unlock.
    pub len: usize,
    /// Event timestamp (record at the cursor when locked). The sentinel
    /// marks an unallocated descriptor, ignored by all queries.
    pub t_ms: u64,
    pub locked: bool,
    /// Set at unlock when the log wrapped past `start` during capture.
    pub wrapped: bool,
    /// Monotonic put sequence of the first record after `start`; drives
    /// the revolution-aware overwrite sweep.
    pub(super) start_seq: u64,
}

impl EventWindow {
    pub const fn empty() -> Self {
        Self {
            start: 0,
            len: 0,
            t_ms: SENTINEL_MS,
            locked: false,
            wrapped: false,
            start_seq: 0,
        }
    }

    pub fn state(&self) -> WindowState {
        if self.t_ms <= SENTINEL_MS {
            WindowState::Empty
        } else if self.locked {
            WindowState::Open
        } else {
            WindowState::Closed
        }
    }

    /// Reset to Empty. Invalidation and pool eviction both land here.
    pub fn invalidate(&mut self) {
        *self = Self::empty();
    }

    /// Whether `index` lies in the half-open circular range `[from, to)`
    /// of ring slots.
    pub fn index_in_range(index: usize, from: usize, to: usize) -> bool {
        if from == to {
            return false;
        }
        if from < to {
            (from..to).contains(&index)
        } else {
            index >= from || index < to
        }
    }
}

impl Default for EventWindow {
    fn default() -> Self {
        Self::empty()
    }
}
