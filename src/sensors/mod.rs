//! Sensor-facing side of the pipeline: raw-sample conditioning and the
//! debounced quiet-state classifier.

mod conditioner;
mod quiet;

pub use conditioner::{ImuSource, SignalConditioner};
pub use quiet::QuietStateDetector;
