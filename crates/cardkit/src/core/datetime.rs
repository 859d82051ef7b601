//! Date, time, and UTC-offset value types.

use chrono::{NaiveDate, NaiveTime};

/// A UTC offset (e.g. `-0500`, `+02:00`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UtcOffset {
    /// Signed hour component (-12..=14).
    pub hours: i8,
    /// Minute component (0..=59).
    pub minutes: u8,
}

impl UtcOffset {
    /// Creates an offset from components.
    #[must_use]
    pub const fn new(hours: i8, minutes: u8) -> Self {
        Self { hours, minutes }
    }

    /// Parses `±HH`, `±HHMM`, or `±HH:MM`.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        let (sign, rest) = match s.as_bytes().first()? {
            b'+' => (1i8, &s[1..]),
            b'-' => (-1i8, &s[1..]),
            _ => (1i8, s),
        };
        let rest = rest.replace(':', "");
        let (hours, minutes) = match rest.len() {
            2 => (rest.parse::<i8>().ok()?, 0u8),
            4 => (
                rest[..2].parse::<i8>().ok()?,
                rest[2..].parse::<u8>().ok()?,
            ),
            _ => return None,
        };
        if hours > 14 || minutes > 59 {
            return None;
        }
        Some(Self {
            hours: sign * hours,
            minutes,
        })
    }

    /// Formats as `±HHMM` (the 4.0 basic form).
    #[must_use]
    pub fn to_basic(self) -> String {
        let sign = if self.hours < 0 { '-' } else { '+' };
        format!("{}{:02}{:02}", sign, self.hours.abs(), self.minutes)
    }

    /// Formats as `±HH:MM` (the 3.0 extended form).
    #[must_use]
    pub fn to_extended(self) -> String {
        let sign = if self.hours < 0 { '-' } else { '+' };
        format!("{}{:02}:{:02}", sign, self.hours.abs(), self.minutes)
    }
}

/// A date, a time, a combination, or free text (4.0 `VALUE=text`).
///
/// This is the payload shape of BDAY and ANNIVERSARY, where RFC 6350
/// allows any of the `date-and-or-time` productions.
#[derive(Debug, Clone, PartialEq)]
pub enum DateAndOrTime {
    /// A calendar date.
    Date(NaiveDate),
    /// A date with a time of day and optional UTC offset.
    DateTime {
        /// The date component.
        date: NaiveDate,
        /// The time component.
        time: NaiveTime,
        /// UTC offset, if the value carried one (`Z` maps to +0000).
        offset: Option<UtcOffset>,
    },
    /// A standalone time of day (4.0 only, `T`-prefixed).
    Time(NaiveTime),
    /// Free-form text (4.0 `VALUE=text`, e.g. "circa 1800").
    Text(String),
}

impl DateAndOrTime {
    /// Parses a date or date-time in basic or extended form.
    ///
    /// Accepts `YYYYMMDD`, `YYYY-MM-DD`, and either followed by
    /// `THHMMSS` / `THH:MM:SS` with an optional `Z` or UTC offset.
    /// Standalone times are accepted with a leading `T`.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        if let Some(time_part) = s.strip_prefix('T') {
            let (time, _) = parse_time(time_part)?;
            return Some(Self::Time(time));
        }

        match s.split_once('T') {
            Some((date_part, time_part)) => {
                let date = parse_date(date_part)?;
                let (time, offset) = parse_time(time_part)?;
                Some(Self::DateTime { date, time, offset })
            }
            None => parse_date(s).map(Self::Date),
        }
    }

    /// Formats in 4.0 basic form (`YYYYMMDD`, `YYYYMMDDTHHMMSS...`).
    #[must_use]
    pub fn to_basic(&self) -> String {
        match self {
            Self::Date(date) => date.format("%Y%m%d").to_string(),
            Self::DateTime { date, time, offset } => {
                let mut out = format!("{}T{}", date.format("%Y%m%d"), time.format("%H%M%S"));
                if let Some(offset) = offset {
                    if offset.hours == 0 && offset.minutes == 0 {
                        out.push('Z');
                    } else {
                        out.push_str(&offset.to_basic());
                    }
                }
                out
            }
            Self::Time(time) => format!("T{}", time.format("%H%M%S")),
            Self::Text(text) => text.clone(),
        }
    }

    /// Formats in 3.0 extended form (`YYYY-MM-DD`, ISO 8601 extended).
    #[must_use]
    pub fn to_extended(&self) -> String {
        match self {
            Self::Date(date) => date.format("%Y-%m-%d").to_string(),
            Self::DateTime { date, time, offset } => {
                let mut out = format!("{}T{}", date.format("%Y-%m-%d"), time.format("%H:%M:%S"));
                if let Some(offset) = offset {
                    if offset.hours == 0 && offset.minutes == 0 {
                        out.push('Z');
                    } else {
                        out.push_str(&offset.to_extended());
                    }
                }
                out
            }
            Self::Time(time) => format!("T{}", time.format("%H:%M:%S")),
            Self::Text(text) => text.clone(),
        }
    }
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(s, "%Y%m%d"))
        .ok()
}

fn parse_time(s: &str) -> Option<(NaiveTime, Option<UtcOffset>)> {
    // Split a trailing Z or UTC offset off the time digits.
    let (time_str, offset) = if let Some(stripped) = s.strip_suffix('Z') {
        (stripped, Some(UtcOffset::new(0, 0)))
    } else if let Some(pos) = s.rfind(['+', '-']) {
        (&s[..pos], UtcOffset::parse(&s[pos..]))
    } else {
        (s, None)
    };

    let compact = time_str.replace(':', "");
    let time = match compact.len() {
        2 => NaiveTime::parse_from_str(&format!("{compact}0000"), "%H%M%S"),
        4 => NaiveTime::parse_from_str(&format!("{compact}00"), "%H%M%S"),
        6 => NaiveTime::parse_from_str(&compact, "%H%M%S"),
        _ => return None,
    }
    .ok()?;

    Some((time, offset))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_basic_date() {
        let parsed = DateAndOrTime::parse("19800416").unwrap();
        assert_eq!(
            parsed,
            DateAndOrTime::Date(NaiveDate::from_ymd_opt(1980, 4, 16).unwrap())
        );
    }

    #[test]
    fn parse_extended_date() {
        let parsed = DateAndOrTime::parse("1980-04-16").unwrap();
        assert_eq!(parsed.to_basic(), "19800416");
    }

    #[test]
    fn parse_date_time_utc() {
        let parsed = DateAndOrTime::parse("19961022T140000Z").unwrap();
        assert_eq!(parsed.to_basic(), "19961022T140000Z");
        assert_eq!(parsed.to_extended(), "1996-10-22T14:00:00Z");
    }

    #[test]
    fn parse_date_time_with_offset() {
        let parsed = DateAndOrTime::parse("19961022T140000-0500").unwrap();
        match parsed {
            DateAndOrTime::DateTime { offset, .. } => {
                assert_eq!(offset, Some(UtcOffset::new(-5, 0)));
            }
            other => panic!("unexpected value: {other:?}"),
        }
    }

    #[test]
    fn parse_standalone_time() {
        let parsed = DateAndOrTime::parse("T102200").unwrap();
        assert_eq!(parsed.to_basic(), "T102200");
    }

    #[test]
    fn parse_garbage_fails() {
        assert!(DateAndOrTime::parse("circa 1800").is_none());
    }

    #[test]
    fn utc_offset_forms() {
        let offset = UtcOffset::parse("-05:00").unwrap();
        assert_eq!(offset.to_basic(), "-0500");
        assert_eq!(offset.to_extended(), "-05:00");
        assert_eq!(UtcOffset::parse("+2"), None);
        assert_eq!(UtcOffset::parse("+02"), Some(UtcOffset::new(2, 0)));
    }
}
