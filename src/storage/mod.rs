//! Fixed-capacity capture storage: records, rings, window descriptors,
//! and the nonvolatile byte-address mapping.

pub mod eeram;
pub mod log;
pub mod precursor;
pub mod recorder;
pub mod sample;
pub mod window;

pub use eeram::{RecordAddrs, SerialRam, StorageError};
pub use log::CircularLog;
pub use precursor::PrecursorBuffer;
pub use recorder::Recorder;
pub use sample::{ChannelSet, SENTINEL_MS, SampleRecord};
pub use window::{EventWindow, WindowState};
