//! crates/focuspoint_core/src/time.rs
//!
//! Wall-clock time of day in the `HH:mm` form used throughout schedules and plans.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

const MINUTES_PER_DAY: u16 = 24 * 60;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("'{0}' is not a valid HH:mm time")]
pub struct ClockTimeError(pub String);

/// A time of day with minute precision, stored as minutes since midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClockTime(u16);

impl ClockTime {
    pub fn new(hour: u8, minute: u8) -> Option<Self> {
        if hour < 24 && minute < 60 {
            Some(Self(hour as u16 * 60 + minute as u16))
        } else {
            None
        }
    }

    /// Const constructor for literals; panics on an out-of-range value.
    pub const fn hm(hour: u8, minute: u8) -> Self {
        assert!(hour < 24 && minute < 60, "time out of range");
        Self(hour as u16 * 60 + minute as u16)
    }

    pub fn hour(self) -> u8 {
        (self.0 / 60) as u8
    }

    pub fn minute(self) -> u8 {
        (self.0 % 60) as u8
    }

    pub fn minutes_since_midnight(self) -> u16 {
        self.0
    }

    /// Adds minutes, wrapping past midnight.
    pub fn add_minutes(self, minutes: u32) -> Self {
        let total = (self.0 as u32 + minutes) % MINUTES_PER_DAY as u32;
        Self(total as u16)
    }
}

impl FromStr for ClockTime {
    type Err = ClockTimeError;

    /// Accepts `H:mm` and `HH:mm`; models occasionally drop the leading zero.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ClockTimeError(s.to_string());
        let (h, m) = s.trim().split_once(':').ok_or_else(err)?;
        if h.is_empty() || h.len() > 2 || m.len() != 2 {
            return Err(err());
        }
        let hour: u8 = h.parse().map_err(|_| err())?;
        let minute: u8 = m.parse().map_err(|_| err())?;
        ClockTime::new(hour, minute).ok_or_else(err)
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

impl Serialize for ClockTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ClockTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_formats_with_leading_zero() {
        let t: ClockTime = "7:05".parse().unwrap();
        assert_eq!(t.to_string(), "07:05");
        assert_eq!(t.minutes_since_midnight(), 425);
    }

    #[test]
    fn rejects_out_of_range_and_garbage() {
        assert!("24:00".parse::<ClockTime>().is_err());
        assert!("12:60".parse::<ClockTime>().is_err());
        assert!("noon".parse::<ClockTime>().is_err());
        assert!("12:5".parse::<ClockTime>().is_err());
    }

    #[test]
    fn add_minutes_wraps_past_midnight() {
        let t = ClockTime::new(23, 30).unwrap();
        assert_eq!(t.add_minutes(45).to_string(), "00:15");
    }

    #[test]
    fn serde_uses_hh_mm_strings() {
        let t = ClockTime::new(9, 0).unwrap();
        assert_eq!(serde_json::to_string(&t).unwrap(), "\"09:00\"");
        let back: ClockTime = serde_json::from_str("\"21:45\"").unwrap();
        assert_eq!(back, ClockTime::new(21, 45).unwrap());
    }
}
