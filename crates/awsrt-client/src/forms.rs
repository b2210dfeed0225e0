//! Input normalisation done before a request leaves the client.

use std::fmt;
use std::str::FromStr;

/// `v` when it lies in `[0, max)`, otherwise the grid centre `max / 2`.
pub fn clamp_or_center(v: i64, max: u32) -> u32 {
    if v >= 0 && v < i64::from(max) {
        v as u32
    } else {
        max / 2
    }
}

/// Unit of a step duration entered by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeUnit {
    Sec,
    Min,
    #[default]
    Hour,
    Day,
}

impl TimeUnit {
    pub fn seconds_per_unit(&self) -> u64 {
        match self {
            TimeUnit::Sec => 1,
            TimeUnit::Min => 60,
            TimeUnit::Hour => 3600,
            TimeUnit::Day => 86_400,
        }
    }

    pub fn to_seconds(&self, amount: u64) -> u64 {
        amount.saturating_mul(self.seconds_per_unit())
    }
}

impl FromStr for TimeUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "s" | "sec" | "secs" | "second" | "seconds" => Ok(TimeUnit::Sec),
            "m" | "min" | "mins" | "minute" | "minutes" => Ok(TimeUnit::Min),
            "h" | "hour" | "hours" => Ok(TimeUnit::Hour),
            "d" | "day" | "days" => Ok(TimeUnit::Day),
            other => Err(format!(
                "unknown time unit '{}', expected sec, min, hour or day",
                other
            )),
        }
    }
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TimeUnit::Sec => "sec",
            TimeUnit::Min => "min",
            TimeUnit::Hour => "hour",
            TimeUnit::Day => "day",
        };
        f.write_str(name)
    }
}
