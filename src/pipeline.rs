//! The per-tick capture loop tying conditioning, quiet detection, and the
//! recorder together.

use embassy_time::Duration;
use log::info;

use crate::config::Config;
use crate::sensors::{ImuSource, QuietStateDetector, SignalConditioner};
use crate::storage::{Recorder, SampleRecord};

/// Composition of the whole capture engine.
///
/// One instance is stepped from the firmware's fixed real-time loop.
/// Each tick runs, in strict order: sample → filter → quiet update →
/// open/close policy → precursor push → (while an event is open) log put.
/// Nothing here blocks and nothing runs concurrently, so a put and its
/// overwrite sweep are atomic with respect to any reader.
///
/// Policy: an event opens on the transition to moving-sure after a
/// still-sure period and closes when the signal returns to still-sure.
#[derive(Debug)]
pub struct CapturePipeline<const N: usize, const M: usize, const K: usize> {
    conditioner: SignalConditioner,
    detector: QuietStateDetector,
    recorder: Recorder<N, M, K>,
    /// Latched once a still-sure period has been observed; arms the
    /// open-on-motion transition.
    armed: bool,
    last_tick_ms: u64,
}

impl<const N: usize, const M: usize, const K: usize> CapturePipeline<N, M, K> {
    pub fn new(config: Config) -> Self {
        Self {
            conditioner: SignalConditioner::new(config),
            detector: QuietStateDetector::new(config),
            recorder: Recorder::new(),
            armed: false,
            last_tick_ms: 0,
        }
    }

    pub fn recorder(&self) -> &Recorder<N, M, K> {
        &self.recorder
    }

    pub fn conditioner(&self) -> &SignalConditioner {
        &self.conditioner
    }

    pub fn detector(&self) -> &QuietStateDetector {
        &self.detector
    }

    /// Whether an event is currently being captured.
    pub fn event_open(&self) -> bool {
        self.recorder.open_slot().is_some()
    }

    /// Advance one tick. `reset` reinitializes both rings and every
    /// descriptor and rebases the filters on the current inputs.
    pub fn step<S: ImuSource>(&mut self, source: &mut S, now_ms: u64, reset: bool) {
        let dt = Duration::from_millis(now_ms.saturating_sub(self.last_tick_ms));
        self.last_tick_ms = now_ms;

        if reset {
            self.recorder.reset();
            self.armed = false;
        }

        self.conditioner.sample(source, reset, now_ms);
        self.conditioner.filter(reset);
        self.detector.update(
            self.conditioner.o_quiet(),
            self.conditioner.g_quiet(),
            reset,
            dt,
        );

        if self.event_open() {
            if self.detector.still_sure() {
                self.recorder.close_event();
                info!("motion settled, event closed");
            }
        } else if self.detector.still_sure() {
            self.armed = true;
        } else if self.armed && self.detector.moving_sure() {
            self.armed = false;
            self.recorder.open_event(now_ms);
            info!("motion detected, event open");
        }

        if reset {
            return;
        }

        let record = SampleRecord::from_channels(now_ms, &self.conditioner.channels());
        self.recorder.push_precursor(record);
        if self.event_open() {
            self.recorder.put(record);
        }
    }
}
