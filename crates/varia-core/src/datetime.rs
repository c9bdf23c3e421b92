//! Calendar date-time payload with one fixed text format.
//!
//! The text form is always `YYYY-MM-DDTHH:MM:SS` (proleptic Gregorian,
//! second resolution, no zone designator); parsing accepts exactly that
//! shape. Locale-aware formats are an external collaborator's concern.

use std::fmt;

use crate::{Reader, StreamCodec, StreamError, Writer};

/// Seconds-since-epoch timestamp with a fixed ISO-8601 text form.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DateTime {
    secs: i64,
}

impl DateTime {
    /// Construct from seconds since 1970-01-01T00:00:00.
    pub const fn from_epoch_secs(secs: i64) -> Self {
        Self { secs }
    }

    /// Seconds since 1970-01-01T00:00:00.
    pub const fn epoch_secs(self) -> i64 {
        self.secs
    }

    /// Construct from calendar fields. Returns `None` for out-of-range
    /// fields (month 1-12, day valid for the month, time within 23:59:59).
    pub fn from_parts(year: i32, month: u32, day: u32, hour: u32, min: u32, sec: u32) -> Option<Self> {
        if !(1..=12).contains(&month) || day < 1 || day > days_in_month(year, month) {
            return None;
        }
        if hour > 23 || min > 59 || sec > 59 {
            return None;
        }
        let days = days_from_civil(year, month, day);
        Some(Self {
            secs: days * 86_400 + i64::from(hour) * 3600 + i64::from(min) * 60 + i64::from(sec),
        })
    }

    /// Parse the fixed `YYYY-MM-DDTHH:MM:SS` form.
    pub fn parse(text: &str) -> Option<Self> {
        let bytes = text.as_bytes();
        if bytes.len() != 19 || bytes[4] != b'-' || bytes[7] != b'-' || bytes[10] != b'T'
            || bytes[13] != b':' || bytes[16] != b':'
        {
            return None;
        }
        let field = |range: std::ops::Range<usize>| -> Option<u32> {
            text.get(range)?.parse().ok()
        };
        let year: i32 = text.get(0..4)?.parse().ok()?;
        Self::from_parts(
            year,
            field(5..7)?,
            field(8..10)?,
            field(11..13)?,
            field(14..16)?,
            field(17..19)?,
        )
    }

    /// Calendar fields `(year, month, day, hour, minute, second)`.
    pub fn parts(self) -> (i32, u32, u32, u32, u32, u32) {
        let days = self.secs.div_euclid(86_400);
        let rem = self.secs.rem_euclid(86_400);
        let (y, m, d) = civil_from_days(days);
        (
            y,
            m,
            d,
            (rem / 3600) as u32,
            (rem / 60 % 60) as u32,
            (rem % 60) as u32,
        )
    }
}

impl fmt::Display for DateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (y, mo, d, h, mi, s) = self.parts();
        write!(f, "{y:04}-{mo:02}-{d:02}T{h:02}:{mi:02}:{s:02}")
    }
}

impl StreamCodec for DateTime {
    fn save(&self, w: &mut Writer) {
        w.write_i64(self.secs);
    }

    fn load(r: &mut Reader<'_>) -> Result<Self, StreamError> {
        Ok(Self::from_epoch_secs(r.read_i64()?))
    }
}

fn is_leap(year: i32) -> bool {
    year % 4 == 0 && (year % 100 != 0 || year % 400 == 0)
}

fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 if is_leap(year) => 29,
        2 => 28,
        _ => 0,
    }
}

/// Days since 1970-01-01 for a proleptic Gregorian date.
fn days_from_civil(year: i32, month: u32, day: u32) -> i64 {
    let y = i64::from(year) - i64::from(month <= 2);
    let era = if y >= 0 { y } else { y - 399 } / 400;
    let yoe = y - era * 400;
    let m = i64::from(month);
    let doy = (153 * (if m > 2 { m - 3 } else { m + 9 }) + 2) / 5 + i64::from(day) - 1;
    let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy;
    era * 146_097 + doe - 719_468
}

/// Proleptic Gregorian date for a days-since-1970-01-01 count.
fn civil_from_days(days: i64) -> (i32, u32, u32) {
    let z = days + 719_468;
    let era = if z >= 0 { z } else { z - 146_096 } / 146_097;
    let doe = z - era * 146_097;
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let y = yoe + era * 400;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let d = doy - (153 * mp + 2) / 5 + 1;
    let m = if mp < 10 { mp + 3 } else { mp - 9 };
    ((y + i64::from(m <= 2)) as i32, m as u32, d as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn epoch_is_1970() {
        let dt = DateTime::from_epoch_secs(0);
        assert_eq!(dt.to_string(), "1970-01-01T00:00:00");
    }

    #[test]
    fn format_parse_round_trip() {
        for text in [
            "1970-01-01T00:00:00",
            "1999-12-31T23:59:59",
            "2000-02-29T12:00:00",
            "2038-01-19T03:14:07",
            "1903-07-04T08:30:15",
        ] {
            let dt = DateTime::parse(text).expect(text);
            assert_eq!(dt.to_string(), text);
        }
    }

    #[test]
    fn rejects_malformed_text() {
        assert!(DateTime::parse("").is_none());
        assert!(DateTime::parse("2020-01-01").is_none());
        assert!(DateTime::parse("2020-13-01T00:00:00").is_none());
        assert!(DateTime::parse("2019-02-29T00:00:00").is_none());
        assert!(DateTime::parse("2020-01-01T24:00:00").is_none());
        assert!(DateTime::parse("2020-01-01 10:00:00").is_none());
    }

    #[test]
    fn negative_timestamps() {
        let dt = DateTime::parse("1969-12-31T23:59:59").unwrap();
        assert_eq!(dt.epoch_secs(), -1);
    }

    #[test]
    fn known_timestamp() {
        let dt = DateTime::from_parts(2009, 2, 13, 23, 31, 30).unwrap();
        assert_eq!(dt.epoch_secs(), 1_234_567_890);
    }
}
