//! Debounced quiet / not-quiet classification of the conditioned signal.

use embassy_time::Duration;
use libm::fabsf;

use crate::config::Config;
use crate::filters::Debounce;

/// Per-group quiet classification with asymmetric persistence.
///
/// A group is raw-quiet when its quiet channel sits at or below the
/// configured threshold (and reset is not asserted — quiet initializes
/// false). Raw quiet must hold for the `set` duration to become
/// quiet-sure and fail for the `reset` duration to clear it, so
/// single-sample noise never toggles event boundaries. The open/close
/// policy itself lives in the pipeline, not here.
#[derive(Debug)]
pub struct QuietStateDetector {
    config: Config,
    o_is_quiet: bool,
    g_is_quiet: bool,
    o_sure: Debounce,
    g_sure: Debounce,
}

impl QuietStateDetector {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            o_is_quiet: false,
            g_is_quiet: false,
            o_sure: Debounce::new(false),
            g_sure: Debounce::new(false),
        }
    }

    /// Classify this tick's quiet channels. `dt` is the tick period.
    pub fn update(&mut self, o_quiet: f32, g_quiet: f32, reset: bool, dt: Duration) {
        let set = self.config.quiet_set();
        let clear = self.config.quiet_reset();

        self.o_is_quiet = fabsf(o_quiet) <= self.config.o_quiet_thr && !reset;
        self.g_is_quiet = fabsf(g_quiet) <= self.config.g_quiet_thr && !reset;
        if reset {
            self.o_sure.reset_to(false);
            self.g_sure.reset_to(false);
        } else {
            self.o_sure.calculate(self.o_is_quiet, set, clear, dt);
            self.g_sure.calculate(self.g_is_quiet, set, clear, dt);
        }
    }

    /// Raw (undebounced) rotation-group quiet.
    pub fn o_is_quiet(&self) -> bool {
        self.o_is_quiet
    }

    /// Raw (undebounced) acceleration-group quiet.
    pub fn g_is_quiet(&self) -> bool {
        self.g_is_quiet
    }

    pub fn o_is_quiet_sure(&self) -> bool {
        self.o_sure.state()
    }

    pub fn g_is_quiet_sure(&self) -> bool {
        self.g_sure.state()
    }

    /// True silence: both groups quiet-sure.
    pub fn still_sure(&self) -> bool {
        self.o_sure.state() && self.g_sure.state()
    }

    /// True motion: both groups not quiet-sure.
    pub fn moving_sure(&self) -> bool {
        !self.o_sure.state() && !self.g_sure.state()
    }
}
