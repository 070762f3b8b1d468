use chrono::{NaiveDate, NaiveTime, Timelike};
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use crate::weekday::WeekdaySet;

static TIME_OF_DAY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([01]\d|2[0-3]):([0-5]\d)$").expect("regex compiles"));

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ScheduleError {
    #[error("{field} must be HH:MM in 24-hour time, got {value:?}")]
    MalformedTime { field: &'static str, value: String },
    #[error("endTime {} must be later than startTime {}", .end.format("%H:%M"), .start.format("%H:%M"))]
    InvertedTimeRange { start: NaiveTime, end: NaiveTime },
    #[error("Unrecognized weekday {0:?}")]
    UnknownWeekday(String),
    #[error("Window start {start} is after window end {end}")]
    InvalidWindow { start: NaiveDate, end: NaiveDate },
}

/// Parses a strict `HH:MM` wall-clock time. `field` names the offending
/// input in the error.
pub fn parse_time(field: &'static str, value: &str) -> Result<NaiveTime, ScheduleError> {
    let malformed = || ScheduleError::MalformedTime {
        field,
        value: value.to_string(),
    };
    let caps = TIME_OF_DAY.captures(value).ok_or_else(malformed)?;
    let hour = caps[1].parse::<u32>().map_err(|_| malformed())?;
    let minute = caps[2].parse::<u32>().map_err(|_| malformed())?;
    NaiveTime::from_hms_opt(hour, minute, 0).ok_or_else(malformed)
}

/// A validated weekly schedule: which weekdays, and the time range on each.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schedule {
    pub weekdays: WeekdaySet,
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl Schedule {
    pub fn parse<S: AsRef<str>>(
        weekdays: &[S],
        start_time: &str,
        end_time: &str,
    ) -> Result<Self, ScheduleError> {
        let start = parse_time("startTime", start_time)?;
        let end = parse_time("endTime", end_time)?;
        if end <= start {
            return Err(ScheduleError::InvertedTimeRange { start, end });
        }
        let weekdays = WeekdaySet::from_tokens(weekdays)?;
        Ok(Self {
            weekdays,
            start,
            end,
        })
    }

    pub fn occurs_on(&self, date: NaiveDate) -> bool {
        self.weekdays.matches(date)
    }

    pub fn duration_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }

    pub fn time_range_label(&self) -> String {
        format_time_range(self.start, self.end)
    }
}

/// `17:45` -> `5:45 PM`, `00:30` -> `12:30 AM`.
pub fn to_12_hour(time: NaiveTime) -> String {
    let (pm, hour) = time.hour12();
    let period = if pm { "PM" } else { "AM" };
    format!("{hour}:{:02} {period}", time.minute())
}

pub fn format_time_range(start: NaiveTime, end: NaiveTime) -> String {
    format!("{} - {}", to_12_hour(start), to_12_hour(end))
}
