//! The atomic stored unit: one timestamped tuple of filtered channels.

use core::fmt::Display;

use crate::config::{ACCEL_SCALE, G_MAX, GYRO_SCALE, W_MAX};
use crate::report::TimestampStr;

/// Reserved timestamp meaning "slot never written".
///
/// The minimum representable positive stamp; a record is valid iff its
/// timestamp is strictly greater.
pub const SENTINEL_MS: u64 = 1;

/// Filtered channel values in engineering units, as produced by the
/// signal conditioner each tick.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ChannelSet {
    /// Gyroscope axes, rad/s.
    pub a: f32,
    pub b: f32,
    pub c: f32,
    /// Gyroscope vector magnitude, rad/s.
    pub o: f32,
    /// Accelerometer axes, g's.
    pub x: f32,
    pub y: f32,
    pub z: f32,
    /// Accelerometer vector magnitude, g's.
    pub g: f32,
}

/// One recorded point: timestamp plus eight fixed-point channels.
///
/// Rotation channels are stored in centi-rad/s, acceleration channels in
/// centi-g (see `config::GYRO_SCALE` / `config::ACCEL_SCALE`). Records are
/// value types; copying one record into another is the only transfer
/// operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleRecord {
    /// Milliseconds since epoch (or boot). `SENTINEL_MS` marks an empty
    /// slot.
    pub t_ms: u64,
    pub a_filt: i16,
    pub b_filt: i16,
    pub c_filt: i16,
    pub o_filt: i16,
    pub x_filt: i16,
    pub y_filt: i16,
    pub z_filt: i16,
    pub g_filt: i16,
}

fn to_counts(value: f32, scale: f32, limit: f32) -> i16 {
    libm::roundf(value.clamp(-limit, limit) * scale) as i16
}

impl SampleRecord {
    /// The empty (never-written) record.
    pub const fn nominal() -> Self {
        Self {
            t_ms: SENTINEL_MS,
            a_filt: 0,
            b_filt: 0,
            c_filt: 0,
            o_filt: 0,
            x_filt: 0,
            y_filt: 0,
            z_filt: 0,
            g_filt: 0,
        }
    }

    /// Build a record from engineering-unit channels, clamping to the
    /// configured channel limits before scaling.
    pub fn from_channels(t_ms: u64, ch: &ChannelSet) -> Self {
        Self {
            t_ms,
            a_filt: to_counts(ch.a, GYRO_SCALE, W_MAX),
            b_filt: to_counts(ch.b, GYRO_SCALE, W_MAX),
            c_filt: to_counts(ch.c, GYRO_SCALE, W_MAX),
            o_filt: to_counts(ch.o, GYRO_SCALE, W_MAX),
            x_filt: to_counts(ch.x, ACCEL_SCALE, G_MAX),
            y_filt: to_counts(ch.y, ACCEL_SCALE, G_MAX),
            z_filt: to_counts(ch.z, ACCEL_SCALE, G_MAX),
            g_filt: to_counts(ch.g, ACCEL_SCALE, G_MAX),
        }
    }

    /// A record is valid once it carries a real timestamp.
    pub fn is_valid(&self) -> bool {
        self.t_ms > SENTINEL_MS
    }

    /// Channels back in engineering units.
    pub fn channels(&self) -> ChannelSet {
        ChannelSet {
            a: self.a_filt as f32 / GYRO_SCALE,
            b: self.b_filt as f32 / GYRO_SCALE,
            c: self.c_filt as f32 / GYRO_SCALE,
            o: self.o_filt as f32 / GYRO_SCALE,
            x: self.x_filt as f32 / ACCEL_SCALE,
            y: self.y_filt as f32 / ACCEL_SCALE,
            z: self.z_filt as f32 / ACCEL_SCALE,
            g: self.g_filt as f32 / ACCEL_SCALE,
        }
    }
}

impl Default for SampleRecord {
    fn default() -> Self {
        Self::nominal()
    }
}

impl Display for SampleRecord {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let ch = self.channels();
        write!(
            f,
            "{} a: {:.2} b: {:.2} c: {:.2} o: {:.2} rad/s, x: {:.2} y: {:.2} z: {:.2} g: {:.2} g's",
            TimestampStr::from_millis(self.t_ms),
            ch.a,
            ch.b,
            ch.c,
            ch.o,
            ch.x,
            ch.y,
            ch.z,
            ch.g,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nominal_record_is_not_valid() {
        let rec = SampleRecord::nominal();
        assert!(!rec.is_valid());
        assert_eq!(rec.t_ms, SENTINEL_MS);
    }

    #[test]
    fn channels_round_trip_through_fixed_point() {
        let ch = ChannelSet {
            a: 1.25,
            b: -0.50,
            c: 0.0,
            o: 1.35,
            x: 0.10,
            y: -0.99,
            z: 1.02,
            g: 1.43,
        };
        let rec = SampleRecord::from_channels(1000, &ch);
        assert!(rec.is_valid());
        let back = rec.channels();
        assert_eq!(back, ch);
    }

    #[test]
    fn out_of_range_channels_saturate_at_limits() {
        let ch = ChannelSet {
            a: 500.0,
            g: -500.0,
            ..ChannelSet::default()
        };
        let rec = SampleRecord::from_channels(1000, &ch);
        assert_eq!(rec.a_filt, (W_MAX * GYRO_SCALE) as i16);
        assert_eq!(rec.g_filt, (-G_MAX * ACCEL_SCALE) as i16);
    }
}
