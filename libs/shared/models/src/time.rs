use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

static HHMM_PATTERN: OnceLock<Regex> = OnceLock::new();

fn hhmm_pattern() -> &'static Regex {
    HHMM_PATTERN.get_or_init(|| Regex::new(r"^\d{2}:\d{2}$").unwrap())
}

/// Wall-clock time of day, stored as minutes since midnight.
///
/// Parsed from strict `"HH:mm"` text at the boundary. `"24:00"` is accepted
/// so an availability window can end at midnight; everything else requires
/// hours 00-23 and minutes 00-59.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeOfDay(u16);

impl TimeOfDay {
    pub fn parse(text: &str) -> Option<Self> {
        if !hhmm_pattern().is_match(text) {
            return None;
        }
        let hours: u16 = text[0..2].parse().ok()?;
        let minutes: u16 = text[3..5].parse().ok()?;
        if minutes >= 60 {
            return None;
        }
        match hours {
            0..=23 => Some(TimeOfDay(hours * 60 + minutes)),
            24 if minutes == 0 => Some(TimeOfDay(24 * 60)),
            _ => None,
        }
    }

    pub fn minutes_since_midnight(&self) -> u16 {
        self.0
    }

    /// Minutes added, saturating at 24:00. Used to derive display ranges
    /// from a slot start and duration.
    pub fn advanced_by(&self, minutes: u16) -> TimeOfDay {
        TimeOfDay((self.0 + minutes).min(24 * 60))
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.0 / 60, self.0 % 60)
    }
}

impl FromStr for TimeOfDay {
    type Err = InvalidTimeOfDay;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TimeOfDay::parse(s).ok_or_else(|| InvalidTimeOfDay(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid time of day: '{0}' (expected HH:mm)")]
pub struct InvalidTimeOfDay(pub String);

impl Serialize for TimeOfDay {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TimeOfDay {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        TimeOfDay::parse(&text)
            .ok_or_else(|| de::Error::custom(format!("invalid time of day: '{}'", text)))
    }
}

/// Text-level window match: true iff `window_start <= time_slot < window_end`
/// with all three parsed as "HH:mm" (start inclusive, end exclusive).
///
/// Any parse failure yields a definite `false` rather than an error, so
/// malformed availability data silently drops out of matching instead of
/// failing a booking flow.
pub fn is_time_within(time_slot: &str, window_start: &str, window_end: &str) -> bool {
    match (
        TimeOfDay::parse(time_slot),
        TimeOfDay::parse(window_start),
        TimeOfDay::parse(window_end),
    ) {
        (Some(t), Some(s), Some(e)) => s <= t && t < e,
        _ => false,
    }
}
