use std::fmt::{Display, Formatter};
use time::OffsetDateTime;

const MINUTE: u64 = 60;
const HOUR: u64 = 60 * MINUTE;
const DAY: u64 = 24 * HOUR;
// Average Gregorian month and year.
const MONTH: u64 = 2_629_800;
const YEAR: u64 = 31_557_600;

/// Human-readable distance between a timestamp and a reference "now",
/// e.g. `3 hours ago` or `in a few seconds`.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Hash)]
pub struct TimeAgo {
    then: OffsetDateTime,
    now: OffsetDateTime,
}

impl TimeAgo {
    #[must_use]
    pub fn new(then: OffsetDateTime, now: OffsetDateTime) -> Self {
        Self { then, now }
    }
}

fn round_div(value: u64, unit: u64) -> u64 {
    (value + unit / 2) / unit
}

fn write_distance(f: &mut Formatter<'_>, seconds: u64) -> std::fmt::Result {
    if seconds <= 44 {
        return f.write_str("a few seconds");
    }
    if seconds <= 89 {
        return f.write_str("a minute");
    }

    let minutes = round_div(seconds, MINUTE);
    if minutes <= 44 {
        return write!(f, "{minutes} minutes");
    }
    if minutes <= 89 {
        return f.write_str("an hour");
    }

    let hours = round_div(seconds, HOUR);
    if hours <= 21 {
        return write!(f, "{hours} hours");
    }
    if hours <= 35 {
        return f.write_str("a day");
    }

    let days = round_div(seconds, DAY);
    if days <= 25 {
        return write!(f, "{days} days");
    }
    if days <= 45 {
        return f.write_str("a month");
    }

    let months = round_div(seconds, MONTH);
    if months <= 10 {
        return write!(f, "{months} months");
    }

    let years = round_div(seconds, YEAR);
    if years <= 1 {
        return f.write_str("a year");
    }
    write!(f, "{years} years")
}

impl Display for TimeAgo {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let elapsed = self.now - self.then;
        let seconds = elapsed.whole_seconds().unsigned_abs();

        if elapsed.is_negative() {
            f.write_str("in ")?;
            write_distance(f, seconds)
        } else {
            write_distance(f, seconds)?;
            f.write_str(" ago")
        }
    }
}
