//! Signal-conditioning primitives: exponential lags, a washout rate
//! estimator, and an asymmetric persistence (debounce) filter.
//!
//! All filters take the measured elapsed time as an input every call
//! instead of assuming a fixed tick, so a channel that skips samples keeps
//! a correct time constant. `reset` snaps internal state to the current
//! input with no transient.

use embassy_time::Duration;
use libm::expf;

/// First-order exponential lag with output saturation.
///
/// Discretized as `y += (1 - exp(-dt/tau)) * (u - y)`, which stays stable
/// for any positive dt, including dt much larger than tau.
#[derive(Debug, Clone, Copy)]
pub struct LagExp {
    state: f32,
    min: f32,
    max: f32,
}

impl LagExp {
    pub const fn new(min: f32, max: f32) -> Self {
        Self {
            state: 0.0,
            min,
            max,
        }
    }

    /// Advance the filter by `dt` seconds and return the new output.
    pub fn calculate(&mut self, input: f32, reset: bool, tau: f32, dt: f32) -> f32 {
        let input = input.clamp(self.min, self.max);
        if reset {
            self.state = input;
        } else {
            let a = expf(-dt / tau);
            self.state = a * self.state + (1.0 - a) * input;
            self.state = self.state.clamp(self.min, self.max);
        }
        self.state
    }

    pub fn state(&self) -> f32 {
        self.state
    }
}

/// Two cascaded [`LagExp`] stages sharing one time constant.
///
/// Sound-industry practice for quiet detection: two poles see through
/// sensor noise without smearing real motion.
#[derive(Debug, Clone, Copy)]
pub struct TwoPoleLag {
    first: LagExp,
    second: LagExp,
}

impl TwoPoleLag {
    pub const fn new(min: f32, max: f32) -> Self {
        Self {
            first: LagExp::new(min, max),
            second: LagExp::new(min, max),
        }
    }

    pub fn calculate(&mut self, input: f32, reset: bool, tau: f32, dt: f32) -> f32 {
        let mid = self.first.calculate(input, reset, tau, dt);
        self.second.calculate(mid, reset, tau, dt)
    }

    pub fn state(&self) -> f32 {
        self.second.state()
    }
}

/// Washout rate estimator: band-limited derivative of the input.
///
/// The quiet channels classify the *rate of change* of a magnitude, so a
/// steady bias (gravity on the accelerometer norm) reads as quiet.
#[derive(Debug, Clone, Copy)]
pub struct RateLag {
    state: f32,
    rate: f32,
}

impl RateLag {
    pub const fn new() -> Self {
        Self {
            state: 0.0,
            rate: 0.0,
        }
    }

    /// Advance by `dt` seconds and return the estimated input rate.
    pub fn calculate(&mut self, input: f32, reset: bool, tau: f32, dt: f32) -> f32 {
        if reset {
            self.state = input;
            self.rate = 0.0;
        } else {
            self.rate = (input - self.state) / tau;
            self.state += self.rate * dt;
        }
        self.rate
    }

    pub fn rate(&self) -> f32 {
        self.rate
    }
}

impl Default for RateLag {
    fn default() -> Self {
        Self::new()
    }
}

/// Asymmetric persistence filter.
///
/// The output follows the input only after the input has held its new
/// value continuously for the `set` duration (false→true) or the `reset`
/// duration (true→false). Any flicker restarts the timer, so noise faster
/// than the persistence window never propagates.
#[derive(Debug, Clone, Copy)]
pub struct Debounce {
    state: bool,
    timer: Duration,
}

impl Debounce {
    pub const fn new(init: bool) -> Self {
        Self {
            state: init,
            timer: Duration::from_ticks(0),
        }
    }

    /// Advance by `dt` with the current raw input and return the debounced
    /// state.
    pub fn calculate(&mut self, input: bool, set: Duration, reset: Duration, dt: Duration) -> bool {
        if input == self.state {
            self.timer = Duration::from_ticks(0);
        } else {
            self.timer += dt;
            let hold = if input { set } else { reset };
            if self.timer >= hold {
                self.state = input;
                self.timer = Duration::from_ticks(0);
            }
        }
        self.state
    }

    /// Force the output, clearing any pending transition.
    pub fn reset_to(&mut self, state: bool) {
        self.state = state;
        self.timer = Duration::from_ticks(0);
    }

    pub fn state(&self) -> bool {
        self.state
    }
}
