#![no_std]

//! Core capture engine for an onboard inertial motion-event recorder.
//!
//! Raw IMU samples flow through a low-pass conditioning stage into a
//! debounced quiet/not-quiet classifier. A quiet-to-motion transition opens
//! an event: the most recent pre-event samples are drained from a small
//! precursor ring into the main circular log, and live samples follow until
//! motion settles. Each captured event is described by a window descriptor
//! pointing into the log; descriptors are invalidated as soon as the ring
//! overwrites the data they reference.
//!
//! Everything is fixed-capacity and allocated once. There is no heap, no
//! background task, and no blocking I/O inside this crate: hardware access
//! (the IMU and the nonvolatile store) is modeled by traits supplied by the
//! firmware.

pub mod config;
pub mod filters;
pub mod pipeline;
pub mod report;
pub mod sensors;
pub mod storage;

pub use config::Config;
pub use pipeline::CapturePipeline;
pub use sensors::{ImuSource, QuietStateDetector, SignalConditioner};
pub use storage::{CircularLog, EventWindow, PrecursorBuffer, Recorder, SampleRecord};
