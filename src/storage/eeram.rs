//! Byte-address mapping onto a serial-RAM style nonvolatile store.
//!
//! The store is modeled as an addressable get/put byte interface; each
//! scalar field of a record gets a fixed 16-bit address computed once at
//! startup by summing field sizes in declaration order. The mapping is
//! append-only: reordering fields invalidates previously stored data.

use thiserror_no_std::Error;

use super::sample::SampleRecord;
use crate::config::Config;

/// Nonvolatile store collaborator.
///
/// A failure here is fatal at the core level: it is propagated to the
/// caller and never retried.
pub trait SerialRam {
    /// Read `buf.len()` bytes starting at `addr`.
    fn get(&mut self, addr: u16, buf: &mut [u8]) -> Result<(), StorageError>;
    /// Write `data` starting at `addr`.
    fn put(&mut self, addr: u16, data: &[u8]) -> Result<(), StorageError>;
}

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    #[error("address {addr:#06x}..+{len} outside device range")]
    OutOfRange { addr: u16, len: usize },
    #[error("device did not acknowledge")]
    Nak,
    #[error("stored configuration is corrupt")]
    CorruptConfig,
}

/// Field addresses for one persisted [`SampleRecord`] slot.
///
/// Little-endian scalars, laid out in record declaration order.
#[derive(Debug, Clone, Copy)]
pub struct RecordAddrs {
    t_ms: u16,
    a_filt: u16,
    b_filt: u16,
    c_filt: u16,
    o_filt: u16,
    x_filt: u16,
    y_filt: u16,
    z_filt: u16,
    g_filt: u16,
}

fn claim(next: &mut u16, size: usize) -> u16 {
    let addr = *next;
    *next += size as u16;
    addr
}

impl RecordAddrs {
    /// Total bytes one record slot occupies: one u64 timestamp plus eight
    /// i16 channels, matching what [`RecordAddrs::instantiate`] claims.
    pub const SLOT_SIZE: u16 = (size_of::<u64>() + 8 * size_of::<i16>()) as u16;

    /// Claim the next `SLOT_SIZE` bytes after `*next`, advancing it.
    pub fn instantiate(next: &mut u16) -> Self {
        Self {
            t_ms: claim(next, size_of::<u64>()),
            a_filt: claim(next, size_of::<i16>()),
            b_filt: claim(next, size_of::<i16>()),
            c_filt: claim(next, size_of::<i16>()),
            o_filt: claim(next, size_of::<i16>()),
            x_filt: claim(next, size_of::<i16>()),
            y_filt: claim(next, size_of::<i16>()),
            z_filt: claim(next, size_of::<i16>()),
            g_filt: claim(next, size_of::<i16>()),
        }
    }

    /// Persist every field of `record` at its mapped address.
    pub fn store<R: SerialRam>(&self, ram: &mut R, record: &SampleRecord) -> Result<(), StorageError> {
        ram.put(self.t_ms, &record.t_ms.to_le_bytes())?;
        ram.put(self.a_filt, &record.a_filt.to_le_bytes())?;
        ram.put(self.b_filt, &record.b_filt.to_le_bytes())?;
        ram.put(self.c_filt, &record.c_filt.to_le_bytes())?;
        ram.put(self.o_filt, &record.o_filt.to_le_bytes())?;
        ram.put(self.x_filt, &record.x_filt.to_le_bytes())?;
        ram.put(self.y_filt, &record.y_filt.to_le_bytes())?;
        ram.put(self.z_filt, &record.z_filt.to_le_bytes())?;
        ram.put(self.g_filt, &record.g_filt.to_le_bytes())?;
        Ok(())
    }

    /// Load a record previously written by [`RecordAddrs::store`].
    pub fn load<R: SerialRam>(&self, ram: &mut R) -> Result<SampleRecord, StorageError> {
        let mut b8 = [0u8; 8];
        let mut b2 = [0u8; 2];

        ram.get(self.t_ms, &mut b8)?;
        let t_ms = u64::from_le_bytes(b8);

        let mut field = |addr: u16, b2: &mut [u8; 2]| -> Result<i16, StorageError> {
            ram.get(addr, b2)?;
            Ok(i16::from_le_bytes(*b2))
        };
        Ok(SampleRecord {
            t_ms,
            a_filt: field(self.a_filt, &mut b2)?,
            b_filt: field(self.b_filt, &mut b2)?,
            c_filt: field(self.c_filt, &mut b2)?,
            o_filt: field(self.o_filt, &mut b2)?,
            x_filt: field(self.x_filt, &mut b2)?,
            y_filt: field(self.y_filt, &mut b2)?,
            z_filt: field(self.z_filt, &mut b2)?,
            g_filt: field(self.g_filt, &mut b2)?,
        })
    }
}

/// Fixed region for the postcard-serialized [`Config`] blob: a one-byte
/// length prefix followed by the payload.
#[derive(Debug, Clone, Copy)]
pub struct ConfigRegion {
    addr: u16,
}

impl ConfigRegion {
    /// Upper bound on the serialized config, including the length prefix.
    pub const SIZE: u16 = 64;

    pub fn instantiate(next: &mut u16) -> Self {
        Self {
            addr: claim(next, Self::SIZE as usize),
        }
    }

    pub fn store<R: SerialRam>(&self, ram: &mut R, config: &Config) -> Result<(), StorageError> {
        let mut buf = [0u8; Self::SIZE as usize - 1];
        let used = config
            .to_bytes(&mut buf)
            .map_err(|_| StorageError::CorruptConfig)?;
        let len = used.len() as u8;
        ram.put(self.addr, &[len])?;
        ram.put(self.addr + 1, used)?;
        Ok(())
    }

    pub fn load<R: SerialRam>(&self, ram: &mut R) -> Result<Config, StorageError> {
        let mut len = [0u8; 1];
        ram.get(self.addr, &mut len)?;
        let len = len[0] as usize;
        let mut buf = [0u8; Self::SIZE as usize - 1];
        if len > buf.len() {
            return Err(StorageError::CorruptConfig);
        }
        ram.get(self.addr + 1, &mut buf[..len])?;
        Config::from_bytes(&buf[..len]).map_err(|_| StorageError::CorruptConfig)
    }
}
