//! Recording length limit

use std::fmt;
use std::str::FromStr;

use crate::domain::error::DurationParseError;

/// Default safety limit for one recording (5 minutes)
pub const DEFAULT_MAX_DURATION_SECS: u64 = 300;

/// A whole number of seconds, written as `1h15m`, `2m30s`, `90s`...
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Duration {
    secs: u64,
}

impl Duration {
    pub const fn from_secs(secs: u64) -> Self {
        Self { secs }
    }

    /// Default safety limit for one recording
    pub const fn default_max_duration() -> Self {
        Self::from_secs(DEFAULT_MAX_DURATION_SECS)
    }

    pub const fn as_secs(&self) -> u64 {
        self.secs
    }
}

impl FromStr for Duration {
    type Err = DurationParseError;

    /// Units must appear in descending order, each at most once. Zero is
    /// rejected: a recording limit of nothing is never what the user meant.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || DurationParseError { input: s.to_string() };

        let mut total: u64 = 0;
        let mut last_unit = u64::MAX;
        let mut digits = String::new();

        for ch in s.trim().chars().map(|c| c.to_ascii_lowercase()) {
            if ch.is_ascii_digit() {
                digits.push(ch);
                continue;
            }
            let unit = match ch {
                'h' => 3600,
                'm' => 60,
                's' => 1,
                _ => return Err(invalid()),
            };
            if digits.is_empty() || unit >= last_unit {
                return Err(invalid());
            }
            let value: u64 = digits.parse().map_err(|_| invalid())?;
            total = value
                .checked_mul(unit)
                .and_then(|v| total.checked_add(v))
                .ok_or_else(invalid)?;
            last_unit = unit;
            digits.clear();
        }

        if !digits.is_empty() || total == 0 {
            return Err(invalid());
        }
        Ok(Self::from_secs(total))
    }
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (h, m, s) = (self.secs / 3600, self.secs % 3600 / 60, self.secs % 60);
        if h > 0 {
            write!(f, "{}h", h)?;
        }
        if m > 0 {
            write!(f, "{}m", m)?;
        }
        if s > 0 || self.secs == 0 {
            write!(f, "{}s", s)?;
        }
        Ok(())
    }
}

impl Default for Duration {
    fn default() -> Self {
        Self::default_max_duration()
    }
}

/// Format whole elapsed seconds as a `m:ss` clock, as shown while recording
pub fn format_elapsed(secs: u64) -> String {
    format!("{}:{:02}", secs / 60, secs % 60)
}
