//! Tuning constants and the runtime-adjustable configuration block.
//!
//! Anything numeric an installer might retune lives in [`Config`]; fixed
//! structural choices (ring capacities, fixed-point scales) are constants.

use embassy_time::Duration;
use serde::{Deserialize, Serialize};

/// Nominal tick period, seconds. Placeholder floor for measured elapsed
/// time so a stalled channel never produces a zero filter dt.
pub const NOM_DT: f32 = 0.01;

/// Saturation limit for filtered acceleration channels, g's.
pub const G_MAX: f32 = 100.0;

/// Saturation limit for filtered rotation channels, rad/s.
pub const W_MAX: f32 = 100.0;

/// Fixed-point scale for stored rotation channels (centi-rad/s per count).
pub const GYRO_SCALE: f32 = 100.0;

/// Fixed-point scale for stored acceleration channels (centi-g per count).
pub const ACCEL_SCALE: f32 = 100.0;

/// Default capacity of the main circular log, records.
pub const LOG_CAPACITY: usize = 256;

/// Default capacity of the precursor ring, records. Sized to cover the
/// longest anticipated pre-event lead time at the nominal tick rate.
pub const PRECURSOR_CAPACITY: usize = 32;

/// Default number of event window descriptors in the pool.
pub const WINDOW_POOL: usize = 8;

/// Runtime tuning block.
///
/// Serialized with postcard into the nonvolatile store so retuned values
/// survive a power cycle (see `storage::eeram`). Durations are kept as
/// integer milliseconds for a stable wire layout and exposed as
/// [`embassy_time::Duration`] where the code consumes them.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct Config {
    /// Sensor read period, ms.
    pub read_delay_ms: u32,
    /// Noise filter time constant, sec.
    pub tau_filt: f32,
    /// Upper bound on the quiet-channel filter dt, sec. Quiet detection
    /// stays responsive even when a channel group skips ticks.
    pub max_t_quiet: f32,
    /// Quiet-rate time constant for the quiet channels, sec.
    pub tau_quiet: f32,
    /// Rotation quiet threshold, rad/s^2 on the filtered quiet rate.
    pub o_quiet_thr: f32,
    /// Acceleration quiet threshold, g/s on the filtered quiet rate.
    pub g_quiet_thr: f32,
    /// Continuous quiet time required to assert quiet-sure, ms.
    pub quiet_set_ms: u32,
    /// Continuous not-quiet time required to clear quiet-sure, ms.
    pub quiet_reset_ms: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            read_delay_ms: 10,
            tau_filt: 0.05,
            max_t_quiet: 0.02,
            tau_quiet: 0.1,
            o_quiet_thr: 0.4,
            g_quiet_thr: 0.1,
            quiet_set_ms: 400,
            quiet_reset_ms: 100,
        }
    }
}

impl Config {
    /// Debounce set duration for quiet-sure.
    pub fn quiet_set(&self) -> Duration {
        Duration::from_millis(self.quiet_set_ms as u64)
    }

    /// Debounce reset duration for quiet-sure.
    pub fn quiet_reset(&self) -> Duration {
        Duration::from_millis(self.quiet_reset_ms as u64)
    }

    /// Serialize into `buf`, returning the used prefix.
    pub fn to_bytes<'a>(&self, buf: &'a mut [u8]) -> Result<&'a [u8], postcard::Error> {
        postcard::to_slice(self, buf).map(|used| &*used)
    }

    /// Deserialize a configuration previously written by [`Config::to_bytes`].
    pub fn from_bytes(buf: &[u8]) -> Result<Self, postcard::Error> {
        postcard::from_bytes(buf)
    }
}
