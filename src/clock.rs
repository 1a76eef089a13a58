// Wall-clock access and the date/time string shapes the upstream service speaks

use chrono::{Duration, Local, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

// Source of "now" for drop times, itinerary windows and tracker rollover
pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> NaiveDateTime;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

// Clock pinned to a settable instant, used by tests and replays
#[derive(Debug)]
pub struct FixedClock {
    now: parking_lot::Mutex<NaiveDateTime>,
}

impl FixedClock {
    pub fn new(now: NaiveDateTime) -> Self {
        Self {
            now: parking_lot::Mutex::new(now),
        }
    }

    pub fn at(date: &str, time: &str) -> Option<Self> {
        let date = NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()?;
        let time = parse_time(time)?;
        Some(Self::new(date.and_time(time)))
    }

    pub fn set(&self, now: NaiveDateTime) {
        *self.now.lock() = now;
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock();
        *now += by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        *self.now.lock()
    }
}

// Zero-padded date ("YYYY-MM-DD") and 24-hour time ("HH:MM:SS") pair
#[derive(Debug, Default, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DateTimeStrings {
    pub date: String,
    pub time: String,
}

impl DateTimeStrings {
    pub fn from_naive(dt: NaiveDateTime) -> Self {
        Self {
            date: dt.format("%Y-%m-%d").to_string(),
            time: dt.format("%H:%M:%S").to_string(),
        }
    }

    pub fn to_naive(&self) -> Option<NaiveDateTime> {
        let date = NaiveDate::parse_from_str(&self.date, "%Y-%m-%d").ok()?;
        Some(date.and_time(parse_time(&self.time)?))
    }
}

// Date and time that may each be absent (lane bookings without a fixed window)
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartialDateTime {
    pub date: Option<String>,
    pub time: Option<String>,
}

impl From<DateTimeStrings> for PartialDateTime {
    fn from(dt: DateTimeStrings) -> Self {
        Self {
            date: Some(dt.date),
            time: Some(dt.time),
        }
    }
}

pub fn today(clock: &dyn Clock) -> String {
    clock.now().format("%Y-%m-%d").to_string()
}

pub fn tomorrow(clock: &dyn Clock) -> String {
    (clock.now() + Duration::days(1))
        .format("%Y-%m-%d")
        .to_string()
}

// "HH:MM" of the current wall-clock time
pub fn time_of_day(clock: &dyn Clock) -> String {
    clock.now().format("%H:%M").to_string()
}

/// Splits an upstream timestamp such as `2026-10-19T14:35:00-04:00` into the
/// park-local date and time strings, ignoring any offset suffix.
pub fn split_date_time(value: &str) -> Option<DateTimeStrings> {
    let (date, rest) = value.split_once('T')?;
    NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()?;
    let end = rest
        .find(|c: char| c == '+' || c == '-' || c == 'Z' || c == '.')
        .unwrap_or(rest.len());
    let time = parse_time(&rest[..end])?;
    Some(DateTimeStrings {
        date: date.to_string(),
        time: time.format("%H:%M:%S").to_string(),
    })
}

fn parse_time(value: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(value, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M"))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("2026-10-19T14:35:00-04:00", Some(("2026-10-19", "14:35:00")); "offset suffix")]
    #[test_case("2026-10-19T08:05:00Z", Some(("2026-10-19", "08:05:00")); "utc suffix")]
    #[test_case("2026-10-19T08:05", Some(("2026-10-19", "08:05:00")); "no seconds")]
    #[test_case("2026-10-19T08:05:00.000-07:00", Some(("2026-10-19", "08:05:00")); "fractional seconds")]
    #[test_case("2026-10-19", None; "date only")]
    #[test_case("garbage", None; "not a timestamp")]
    fn test_split_date_time(input: &str, expected: Option<(&str, &str)>) {
        let expected = expected.map(|(date, time)| DateTimeStrings {
            date: date.to_string(),
            time: time.to_string(),
        });
        assert_eq!(split_date_time(input), expected);
    }

    #[test]
    fn test_fixed_clock_day_helpers() {
        let clock = FixedClock::at("2026-12-31", "23:59:30").unwrap();
        assert_eq!(today(&clock), "2026-12-31");
        assert_eq!(tomorrow(&clock), "2027-01-01");
        assert_eq!(time_of_day(&clock), "23:59");

        clock.advance(Duration::minutes(1));
        assert_eq!(today(&clock), "2027-01-01");
    }

    #[test]
    fn test_date_time_strings_round_trip_to_naive() {
        let clock = FixedClock::at("2026-10-19", "09:15").unwrap();
        let strings = DateTimeStrings::from_naive(clock.now());
        assert_eq!(strings.time, "09:15:00");
        assert_eq!(strings.to_naive(), Some(clock.now()));
    }
}
