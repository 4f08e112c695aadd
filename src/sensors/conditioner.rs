//! Per-channel signal conditioning for the raw IMU stream.

use libm::sqrtf;

use crate::config::{Config, G_MAX, NOM_DT, W_MAX};
use crate::filters::{LagExp, RateLag, TwoPoleLag};
use crate::storage::ChannelSet;

/// Sensor source collaborator: per-tick raw axis readings.
///
/// `None` means the channel group produced nothing this tick; the
/// conditioner holds its last filtered values and lets the elapsed time
/// grow until the group reports again.
pub trait ImuSource {
    /// Accelerometer axes in g's, if a fresh reading is available.
    fn read_accel(&mut self) -> Option<[f32; 3]>;
    /// Gyroscope axes in rad/s, if a fresh reading is available.
    fn read_gyro(&mut self) -> Option<[f32; 3]>;
}

/// Low-pass conditioning of the raw axes, their vector magnitudes, and
/// the quiet channels derived from the magnitudes.
///
/// Each channel is filtered independently with the measured elapsed time
/// as the filter dt. The quiet channels run the magnitude through a
/// washout rate estimator and a two-pole lag, so they respond to *change*
/// in motion rather than steady bias; their dt is capped so a starved
/// channel group cannot dull quiet detection.
#[derive(Debug)]
pub struct SignalConditioner {
    config: Config,

    // Raw inputs, held between updates.
    a_raw: f32,
    b_raw: f32,
    c_raw: f32,
    o_raw: f32,
    x_raw: f32,
    y_raw: f32,
    z_raw: f32,
    g_raw: f32,

    a_filt: LagExp,
    b_filt: LagExp,
    c_filt: LagExp,
    o_filt: LagExp,
    x_filt: LagExp,
    y_filt: LagExp,
    z_filt: LagExp,
    g_filt: LagExp,

    o_quiet_rate: RateLag,
    o_quiet_filt: TwoPoleLag,
    g_quiet_rate: RateLag,
    g_quiet_filt: TwoPoleLag,

    time_rot_last: u64,
    time_acc_last: u64,
    t_rot: f32,
    t_acc: f32,
    rot_available: bool,
    acc_available: bool,
}

impl SignalConditioner {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            a_raw: 0.0,
            b_raw: 0.0,
            c_raw: 0.0,
            o_raw: 0.0,
            x_raw: 0.0,
            y_raw: 0.0,
            z_raw: 0.0,
            g_raw: 0.0,
            a_filt: LagExp::new(-W_MAX, W_MAX),
            b_filt: LagExp::new(-W_MAX, W_MAX),
            c_filt: LagExp::new(-W_MAX, W_MAX),
            o_filt: LagExp::new(-W_MAX, W_MAX),
            x_filt: LagExp::new(-G_MAX, G_MAX),
            y_filt: LagExp::new(-G_MAX, G_MAX),
            z_filt: LagExp::new(-G_MAX, G_MAX),
            g_filt: LagExp::new(-G_MAX, G_MAX),
            o_quiet_rate: RateLag::new(),
            o_quiet_filt: TwoPoleLag::new(-W_MAX, W_MAX),
            g_quiet_rate: RateLag::new(),
            g_quiet_filt: TwoPoleLag::new(-G_MAX, G_MAX),
            time_rot_last: 0,
            time_acc_last: 0,
            t_rot: NOM_DT,
            t_acc: NOM_DT,
            rot_available: false,
            acc_available: false,
        }
    }

    /// Pull raw readings for this tick and update elapsed times.
    ///
    /// Magnitudes are the Euclidean norm of the three raw axes, computed
    /// before any filtering. On reset nothing is read; elapsed-time
    /// tracking rebases to `now_ms`.
    pub fn sample<S: ImuSource>(&mut self, source: &mut S, reset: bool, now_ms: u64) {
        if reset {
            self.time_rot_last = now_ms;
            self.time_acc_last = now_ms;
        }

        self.acc_available = false;
        if !reset && let Some([x, y, z]) = source.read_accel() {
            self.x_raw = x;
            self.y_raw = y;
            self.z_raw = z;
            self.g_raw = sqrtf(x * x + y * y + z * z);
            self.time_acc_last = now_ms;
            self.acc_available = true;
        }
        self.t_acc = elapsed_sec(now_ms, self.time_acc_last).max(NOM_DT);

        self.rot_available = false;
        if !reset && let Some([a, b, c]) = source.read_gyro() {
            self.a_raw = a;
            self.b_raw = b;
            self.c_raw = c;
            self.o_raw = sqrtf(a * a + b * b + c * c);
            self.time_rot_last = now_ms;
            self.rot_available = true;
        }
        self.t_rot = elapsed_sec(now_ms, self.time_rot_last).max(NOM_DT);
    }

    /// Run every filter for the channel groups that have fresh data (or
    /// unconditionally on reset, snapping state to the raw inputs).
    pub fn filter(&mut self, reset: bool) {
        let tau = self.config.tau_filt;
        let tau_q = self.config.tau_quiet;
        let max_t_q = self.config.max_t_quiet;

        if reset || self.acc_available {
            let dt = self.t_acc;
            self.x_filt.calculate(self.x_raw, reset, tau, dt);
            self.y_filt.calculate(self.y_raw, reset, tau, dt);
            self.z_filt.calculate(self.z_raw, reset, tau, dt);
            self.g_filt.calculate(self.g_raw, reset, tau, dt);
            let dt_q = dt.min(max_t_q);
            let rate = self.g_quiet_rate.calculate(self.g_raw, reset, tau_q, dt_q);
            self.g_quiet_filt.calculate(rate, reset, tau_q, dt_q);
        }

        if reset || self.rot_available {
            let dt = self.t_rot;
            self.a_filt.calculate(self.a_raw, reset, tau, dt);
            self.b_filt.calculate(self.b_raw, reset, tau, dt);
            self.c_filt.calculate(self.c_raw, reset, tau, dt);
            self.o_filt.calculate(self.o_raw, reset, tau, dt);
            let dt_q = dt.min(max_t_q);
            let rate = self.o_quiet_rate.calculate(self.o_raw, reset, tau_q, dt_q);
            self.o_quiet_filt.calculate(rate, reset, tau_q, dt_q);
        }
    }

    /// Filtered channels in engineering units.
    pub fn channels(&self) -> ChannelSet {
        ChannelSet {
            a: self.a_filt.state(),
            b: self.b_filt.state(),
            c: self.c_filt.state(),
            o: self.o_filt.state(),
            x: self.x_filt.state(),
            y: self.y_filt.state(),
            z: self.z_filt.state(),
            g: self.g_filt.state(),
        }
    }

    /// Filtered rate-of-change of the rotation magnitude.
    pub fn o_quiet(&self) -> f32 {
        self.o_quiet_filt.state()
    }

    /// Filtered rate-of-change of the acceleration magnitude.
    pub fn g_quiet(&self) -> f32 {
        self.g_quiet_filt.state()
    }

    /// Elapsed time used for the rotation group this tick, sec.
    pub fn t_rot(&self) -> f32 {
        self.t_rot
    }

    /// Elapsed time used for the acceleration group this tick, sec.
    pub fn t_acc(&self) -> f32 {
        self.t_acc
    }
}

fn elapsed_sec(now_ms: u64, last_ms: u64) -> f32 {
    now_ms.saturating_sub(last_ms) as f32 / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use libm::fabsf;

    struct FakeImu {
        accel: Option<[f32; 3]>,
        gyro: Option<[f32; 3]>,
    }

    impl ImuSource for FakeImu {
        fn read_accel(&mut self) -> Option<[f32; 3]> {
            self.accel
        }
        fn read_gyro(&mut self) -> Option<[f32; 3]> {
            self.gyro
        }
    }

    #[test]
    fn magnitudes_are_the_euclidean_norm_of_raw_axes() {
        let mut imu = FakeImu {
            accel: Some([3.0, 4.0, 0.0]),
            gyro: Some([0.0, 0.0, 2.0]),
        };
        let mut cond = SignalConditioner::new(Config::default());
        cond.sample(&mut imu, true, 0);
        cond.filter(true);
        cond.sample(&mut imu, false, 10);
        cond.filter(false);
        // Reset snapped the magnitude filters to zero input, so after one
        // fresh sample the filtered magnitude is partway toward the norm.
        assert!(cond.channels().g > 0.0 && cond.channels().g <= 5.0);
        assert!(cond.channels().o > 0.0 && cond.channels().o <= 2.0);

        // Converged values equal the norms.
        for k in 2..100 {
            cond.sample(&mut imu, false, 10 * k);
            cond.filter(false);
        }
        assert!(fabsf(cond.channels().g - 5.0) < 1e-2);
        assert!(fabsf(cond.channels().o - 2.0) < 1e-2);
    }

    #[test]
    fn unavailable_channels_hold_the_last_filtered_value() {
        let mut imu = FakeImu {
            accel: Some([0.0, 0.0, 1.0]),
            gyro: Some([0.1, 0.0, 0.0]),
        };
        let mut cond = SignalConditioner::new(Config::default());
        cond.sample(&mut imu, true, 0);
        cond.filter(true);
        let before = cond.channels();

        // Sensor goes dark; filtered outputs must not move.
        imu.accel = None;
        imu.gyro = None;
        for k in 1..10 {
            cond.sample(&mut imu, false, 10 * k);
            cond.filter(false);
        }
        assert_eq!(cond.channels(), before);
        // Elapsed time keeps growing while the group is dark.
        assert!(cond.t_acc() >= 0.09);
    }

    #[test]
    fn reset_rebases_with_no_transient() {
        let mut imu = FakeImu {
            accel: Some([0.0, 0.0, 1.0]),
            gyro: Some([0.0, 0.0, 0.0]),
        };
        let mut cond = SignalConditioner::new(Config::default());
        for k in 0..50 {
            cond.sample(&mut imu, false, 10 * k);
            cond.filter(false);
        }
        cond.sample(&mut imu, true, 600);
        cond.filter(true);
        // Snapped straight onto the held raw values.
        assert_eq!(cond.channels().z, 1.0);
        assert_eq!(cond.channels().g, 1.0);
        // Quiet channels rebase to zero rate.
        assert_eq!(cond.g_quiet(), 0.0);
        assert_eq!(cond.o_quiet(), 0.0);
    }
}
