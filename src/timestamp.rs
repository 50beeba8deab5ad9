//! DOS date/time handling.
//!
//! This module provides the [`DosDateTime`] type for working with the packed
//! FAT-style timestamps stored in every ZIP local header and central directory
//! record.
//!
//! # Layout
//!
//! A DOS timestamp is two little-endian 16-bit words, time first:
//!
//! | Word | Bits 15..11 | Bits 10..5 | Bits 4..0 |
//! |------|-------------|------------|-----------|
//! | time | hour | minute | second / 2 |
//!
//! | Word | Bits 15..9 | Bits 8..5 | Bits 4..0 |
//! |------|------------|-----------|-----------|
//! | date | year − 1980 | month | day |
//!
//! # Precision
//!
//! Seconds are stored halved, so odd seconds are lost: a round trip through
//! DOS time rounds a timestamp down to the nearest even second. The
//! representable range is 1980-01-01 00:00:00 to 2107-12-31 23:59:58. All
//! conversions are in UTC.
//!
//! # Example
//!
//! ```rust
//! use pkarchive::DosDateTime;
//!
//! // 2024-06-15 12:30:45 UTC
//! let dos = DosDateTime::from_unix_secs(1_718_454_645);
//! assert_eq!(dos.to_unix_secs(), 1_718_454_644);
//! assert_eq!(dos.date_parts(), (2024, 6, 15));
//! assert_eq!(dos.time_parts(), (12, 30, 44));
//! ```

use std::time::{SystemTime, UNIX_EPOCH};

/// Unix timestamp of 1980-01-01 00:00:00 UTC, the DOS epoch.
const DOS_EPOCH_UNIX: i64 = 315_532_800;

/// Unix timestamp of 2107-12-31 23:59:59 UTC, the last representable second.
const DOS_MAX_UNIX: i64 = 4_354_819_199;

const SECONDS_PER_DAY: i64 = 86_400;

/// A packed DOS date/time pair.
///
/// The all-zero value is used as a placeholder for timestamps the format
/// cannot represent and decodes to the DOS epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct DosDateTime {
    time: u16,
    date: u16,
}

impl DosDateTime {
    /// Creates a value from raw DOS time and date words.
    #[inline]
    pub const fn from_parts(time: u16, date: u16) -> Self {
        Self { time, date }
    }

    /// Encodes a Unix timestamp.
    ///
    /// Timestamps outside 1980-01-01..=2107-12-31 are logged and encoded as
    /// the all-zero placeholder instead of failing.
    pub fn from_unix_secs(secs: i64) -> Self {
        if !(DOS_EPOCH_UNIX..=DOS_MAX_UNIX).contains(&secs) {
            log::warn!(
                "timestamp {} is outside the DOS date range (1980-2107), storing zero",
                secs
            );
            return Self::default();
        }

        let days = secs.div_euclid(SECONDS_PER_DAY);
        let time_of_day = secs.rem_euclid(SECONDS_PER_DAY);
        let (year, month, day) = civil_from_days(days);

        let hour = (time_of_day / 3600) as u16;
        let minute = ((time_of_day % 3600) / 60) as u16;
        let second = (time_of_day % 60) as u16;

        let time = (hour << 11) | (minute << 5) | (second / 2);
        let date = (((year - 1980) as u16) << 9) | ((month as u16) << 5) | day as u16;

        Self { time, date }
    }

    /// Encodes a `SystemTime`, truncating sub-second precision.
    pub fn from_system_time(time: SystemTime) -> Self {
        let secs = match time.duration_since(UNIX_EPOCH) {
            Ok(d) => d.as_secs() as i64,
            Err(e) => -(e.duration().as_secs() as i64),
        };
        Self::from_unix_secs(secs)
    }

    /// Encodes the current time.
    pub fn now() -> Self {
        Self::from_system_time(SystemTime::now())
    }

    /// Decodes to a Unix timestamp.
    ///
    /// Out-of-range fields (month 0, day 0) are clamped to 1 so that the
    /// zero placeholder maps to the DOS epoch.
    pub fn to_unix_secs(&self) -> i64 {
        let (year, month, day) = self.date_parts();
        let (hour, minute, second) = self.time_parts();
        let days = days_from_civil(year as i64, month.max(1) as u32, day.max(1) as u32);
        days * SECONDS_PER_DAY + hour as i64 * 3600 + minute as i64 * 60 + second as i64
    }

    /// Returns the raw DOS time word.
    #[inline]
    pub const fn time(&self) -> u16 {
        self.time
    }

    /// Returns the raw DOS date word.
    #[inline]
    pub const fn date(&self) -> u16 {
        self.date
    }

    /// Returns `(year, month, day)`.
    pub fn date_parts(&self) -> (u16, u8, u8) {
        let day = (self.date & 0x1F) as u8;
        let month = ((self.date >> 5) & 0x0F) as u8;
        let year = ((self.date >> 9) & 0x7F) + 1980;
        (year, month, day)
    }

    /// Returns `(hour, minute, second)`; seconds are always even.
    pub fn time_parts(&self) -> (u8, u8, u8) {
        let second = ((self.time & 0x1F) * 2) as u8;
        let minute = ((self.time >> 5) & 0x3F) as u8;
        let hour = ((self.time >> 11) & 0x1F) as u8;
        (hour, minute, second)
    }

    /// Encodes to the 4-byte on-disk form (time word, then date word).
    pub fn to_bytes(&self) -> [u8; 4] {
        let t = self.time.to_le_bytes();
        let d = self.date.to_le_bytes();
        [t[0], t[1], d[0], d[1]]
    }

    /// Decodes the 4-byte on-disk form.
    pub fn from_bytes(bytes: [u8; 4]) -> Self {
        Self {
            time: u16::from_le_bytes([bytes[0], bytes[1]]),
            date: u16::from_le_bytes([bytes[2], bytes[3]]),
        }
    }
}

fn is_leap_year(year: i64) -> bool {
    (year % 4 == 0 && year % 100 != 0) || (year % 400 == 0)
}

fn days_in_months(leap: bool) -> [u32; 12] {
    if leap {
        [31, 29, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31]
    } else {
        [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31]
    }
}

/// Converts days since 1970-01-01 to `(year, month, day)`.
///
/// Only called for days inside the DOS range, so a forward walk is enough.
fn civil_from_days(days: i64) -> (i64, u32, u32) {
    let mut year = 1970;
    let mut remaining = days;

    loop {
        let days_in_year = if is_leap_year(year) { 366 } else { 365 };
        if remaining < days_in_year {
            break;
        }
        remaining -= days_in_year;
        year += 1;
    }

    let mut remaining = remaining as u32;
    for (i, &days) in days_in_months(is_leap_year(year)).iter().enumerate() {
        if remaining < days {
            return (year, i as u32 + 1, remaining + 1);
        }
        remaining -= days;
    }

    (year, 12, 31)
}

/// Converts `(year, month, day)` to days since 1970-01-01.
fn days_from_civil(year: i64, month: u32, day: u32) -> i64 {
    let mut days = 0i64;
    for y in 1970..year {
        days += if is_leap_year(y) { 366 } else { 365 };
    }
    let months = days_in_months(is_leap_year(year));
    for m in months.iter().take((month.min(12) - 1) as usize) {
        days += *m as i64;
    }
    days + (day - 1) as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dos_epoch() {
        let dos = DosDateTime::from_unix_secs(DOS_EPOCH_UNIX);
        assert_eq!(dos.date_parts(), (1980, 1, 1));
        assert_eq!(dos.time_parts(), (0, 0, 0));
        assert_eq!(dos.to_unix_secs(), DOS_EPOCH_UNIX);
    }

    #[test]
    fn test_odd_seconds_round_down() {
        // 2024-06-15 12:30:45 UTC
        let dos = DosDateTime::from_unix_secs(1_718_454_645);
        assert_eq!(dos.date_parts(), (2024, 6, 15));
        assert_eq!(dos.time_parts(), (12, 30, 44));
        assert_eq!(dos.to_unix_secs(), 1_718_454_644);
    }

    #[test]
    fn test_leap_day() {
        // 2000-02-29 23:59:58 UTC
        let secs = 951_868_798;
        let dos = DosDateTime::from_unix_secs(secs);
        assert_eq!(dos.date_parts(), (2000, 2, 29));
        assert_eq!(dos.time_parts(), (23, 59, 58));
        assert_eq!(dos.to_unix_secs(), secs);
    }

    #[test]
    fn test_last_representable_second() {
        let dos = DosDateTime::from_unix_secs(DOS_MAX_UNIX);
        assert_eq!(dos.date_parts(), (2107, 12, 31));
        assert_eq!(dos.to_unix_secs(), DOS_MAX_UNIX - 1);
    }

    #[test]
    fn test_out_of_range_is_zero() {
        assert_eq!(DosDateTime::from_unix_secs(DOS_MAX_UNIX + 1), DosDateTime::default());
        assert_eq!(DosDateTime::from_unix_secs(0), DosDateTime::default());
        assert_eq!(DosDateTime::from_unix_secs(-5), DosDateTime::default());
    }

    #[test]
    fn test_zero_decodes_to_epoch() {
        assert_eq!(DosDateTime::default().to_unix_secs(), DOS_EPOCH_UNIX);
    }

    #[test]
    fn test_byte_layout() {
        let dos = DosDateTime::from_parts(0x6BD6, 0x58CF);
        assert_eq!(dos.to_bytes(), [0xD6, 0x6B, 0xCF, 0x58]);
        assert_eq!(DosDateTime::from_bytes(dos.to_bytes()), dos);
    }

    #[test]
    fn test_from_system_time() {
        let t = UNIX_EPOCH + std::time::Duration::from_secs(1_577_836_800); // 2020-01-01
        let dos = DosDateTime::from_system_time(t);
        assert_eq!(dos.date_parts(), (2020, 1, 1));
    }
}
