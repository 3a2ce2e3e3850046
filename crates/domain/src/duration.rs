//! ISO 8601 duration parsing and formatting.
//!
//! The KSR/SKR XML schema expresses every policy window (`PublishSafety`,
//! `MaxSignatureValidity`, ...) as an ISO 8601 duration such as `P10D` or
//! `PT1H`. No crate in the reference corpus covers this narrow a format, so
//! it is hand-rolled here rather than pulling in a dependency for a few
//! dozen lines of logic, the same way the small wire-format parsers
//! elsewhere in this crate (DNS names, RSA key encodings) are hand-rolled.

use std::fmt;

use crate::errors::CoreError;

/// A parsed ISO 8601 duration, stored as whole seconds.
///
/// Years and months are calendar-inexact by design (365 and 30 days
/// respectively) since KSR/SKR ceremonies only ever use week/day/hour
/// granularity in practice; the fields are accepted for completeness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IsoDuration {
    seconds: i64,
}

const SECONDS_PER_MINUTE: i64 = 60;
const SECONDS_PER_HOUR: i64 = 60 * SECONDS_PER_MINUTE;
const SECONDS_PER_DAY: i64 = 24 * SECONDS_PER_HOUR;
const SECONDS_PER_WEEK: i64 = 7 * SECONDS_PER_DAY;
const SECONDS_PER_MONTH: i64 = 30 * SECONDS_PER_DAY;
const SECONDS_PER_YEAR: i64 = 365 * SECONDS_PER_DAY;

impl IsoDuration {
    pub const fn from_seconds(seconds: i64) -> Self {
        Self { seconds }
    }

    pub const fn from_days(days: i64) -> Self {
        Self {
            seconds: days * SECONDS_PER_DAY,
        }
    }

    pub const fn as_seconds(self) -> i64 {
        self.seconds
    }

    /// Parses a duration of the form `P[n Y][n M][n W][n D][T[n H][n M][n S]]`.
    pub fn parse(text: &str) -> Result<Self, CoreError> {
        let bytes = text.as_bytes();
        if bytes.first() != Some(&b'P') {
            return Err(CoreError::ConfigurationError(format!(
                "invalid ISO 8601 duration {text:?}: must start with 'P'"
            )));
        }

        let mut seconds: i64 = 0;
        let mut in_time_part = false;
        let mut chars = text[1..].chars().peekable();
        let mut number = String::new();

        while let Some(ch) = chars.next() {
            match ch {
                'T' => {
                    in_time_part = true;
                }
                '0'..='9' => number.push(ch),
                unit @ ('Y' | 'M' | 'W' | 'D' | 'H' | 'S') => {
                    let value: i64 = number.parse().map_err(|_| {
                        CoreError::ConfigurationError(format!(
                            "invalid ISO 8601 duration {text:?}: missing number before '{unit}'"
                        ))
                    })?;
                    number.clear();

                    let unit_seconds = match (unit, in_time_part) {
                        ('Y', false) => SECONDS_PER_YEAR,
                        ('M', false) => SECONDS_PER_MONTH,
                        ('W', false) => SECONDS_PER_WEEK,
                        ('D', false) => SECONDS_PER_DAY,
                        ('H', true) => SECONDS_PER_HOUR,
                        ('M', true) => SECONDS_PER_MINUTE,
                        ('S', true) => 1,
                        _ => {
                            return Err(CoreError::ConfigurationError(format!(
                                "invalid ISO 8601 duration {text:?}: '{unit}' not valid in this position"
                            )))
                        }
                    };
                    seconds += value * unit_seconds;
                }
                other => {
                    return Err(CoreError::ConfigurationError(format!(
                        "invalid ISO 8601 duration {text:?}: unexpected character '{other}'"
                    )))
                }
            }
        }

        if !number.is_empty() {
            return Err(CoreError::ConfigurationError(format!(
                "invalid ISO 8601 duration {text:?}: trailing number with no unit"
            )));
        }

        Ok(Self { seconds })
    }
}

impl fmt::Display for IsoDuration {
    /// Emits the coarsest exact representation: whole days when the value
    /// divides evenly, otherwise whole seconds under `PT`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.seconds == 0 {
            return write!(f, "PT0S");
        }
        if self.seconds % SECONDS_PER_DAY == 0 {
            return write!(f, "P{}D", self.seconds / SECONDS_PER_DAY);
        }
        write!(f, "PT{}S", self.seconds)
    }
}

impl<'de> serde::Deserialize<'de> for IsoDuration {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        IsoDuration::parse(&text).map_err(serde::de::Error::custom)
    }
}

impl serde::Serialize for IsoDuration {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}
