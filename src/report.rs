//! Text summaries for the report sink.
//!
//! The sink is an external collaborator: anything implementing
//! [`core::fmt::Write`] (a serial console wrapper, an RTT channel, a test
//! string). Timestamps render as `YYYY-MM-DDTHH:MM:SS.mmm`.

use core::fmt::{self, Display, Write};

use heapless::String;

use crate::storage::{EventWindow, SampleRecord};

/// Lazily-rendered civil timestamp for a millisecond epoch stamp.
#[derive(Debug, Clone, Copy)]
pub struct TimestampStr {
    t_ms: u64,
}

impl TimestampStr {
    pub const fn from_millis(t_ms: u64) -> Self {
        Self { t_ms }
    }
}

/// Gregorian date from a day count since 1970-01-01 (civil-from-days).
fn civil_from_days(days: i64) -> (i64, u32, u32) {
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z.rem_euclid(146_097);
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = doy - (153 * mp + 2) / 5 + 1;
    let month = if mp < 10 { mp + 3 } else { mp - 9 };
    let year = yoe + era * 400 + if month <= 2 { 1 } else { 0 };
    (year, month as u32, day as u32)
}

impl Display for TimestampStr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let secs = self.t_ms / 1000;
        let millis = self.t_ms % 1000;
        let (year, month, day) = civil_from_days((secs / 86_400) as i64);
        let tod = secs % 86_400;
        write!(
            f,
            "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}.{:03}",
            year,
            month,
            day,
            tod / 3600,
            (tod % 3600) / 60,
            tod % 60,
            millis,
        )
    }
}

/// Render a timestamp into a fixed-capacity string.
pub fn timestamp_string(t_ms: u64) -> String<32> {
    let mut out = String::new();
    // 23 characters always fit in 32.
    let _ = write!(out, "{}", TimestampStr::from_millis(t_ms));
    out
}

/// One line for the most recent record.
pub fn write_record<W: Write>(sink: &mut W, record: &SampleRecord) -> fmt::Result {
    writeln!(sink, "{record}")
}

/// Header line plus one line per record of a captured window.
pub fn write_window<'a, W, I>(sink: &mut W, window: &EventWindow, records: I) -> fmt::Result
where
    W: Write,
    I: Iterator<Item = &'a SampleRecord>,
{
    writeln!(
        sink,
        "event {} start {} len {}{}",
        TimestampStr::from_millis(window.t_ms),
        window.start,
        window.len,
        if window.wrapped { " wrapped" } else { "" },
    )?;
    for record in records {
        write_record(sink, record)?;
    }
    Ok(())
}

/// Every valid record of the log, oldest slot first.
pub fn write_log<'a, W, I>(sink: &mut W, records: I) -> fmt::Result
where
    W: Write,
    I: Iterator<Item = &'a SampleRecord>,
{
    for record in records.filter(|r| r.is_valid()) {
        write_record(sink, record)?;
    }
    Ok(())
}
