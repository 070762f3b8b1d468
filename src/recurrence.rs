//! Expansion of recurring classes into dated occurrences.
//!
//! Everything here is pure: no I/O, no clock reads, no logging. Callers pick
//! the window and decide what "today" is.

use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use crate::models::{ClassDefinition, Occurrence};
use crate::schedule::{Schedule, ScheduleError};

/// Inclusive range of calendar dates to expand over. `start <= end` holds for
/// every value, including deserialized ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(try_from = "WindowBounds")]
pub struct ExpansionWindow {
    #[schema(value_type = String, format = "date", example = "2024-06-03")]
    start: NaiveDate,
    #[schema(value_type = String, format = "date", example = "2024-06-09")]
    pub(crate) end: NaiveDate,
}

#[derive(Deserialize)]
struct WindowBounds {
    start: NaiveDate,
    end: NaiveDate,
}

impl TryFrom<WindowBounds> for ExpansionWindow {
    type Error = ScheduleError;

    fn try_from(bounds: WindowBounds) -> Result<Self, Self::Error> {
        Self::new(bounds.start, bounds.end)
    }
}

impl ExpansionWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, ScheduleError> {
        if start > end {
            return Err(ScheduleError::InvalidWindow { start, end });
        }
        Ok(Self { start, end })
    }

    /// `today` through the same day next month. Days past the end of the next
    /// month clamp to its last day (Jan 31 -> Feb 29 in a leap year).
    pub fn following_month(today: NaiveDate) -> Self {
        let end = today
            .checked_add_months(Months::new(1))
            .unwrap_or(NaiveDate::MAX);
        Self { start: today, end }
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// Number of dates in the window, counting both ends.
    pub fn num_days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    /// Every date in the window, ascending.
    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> {
        let end = self.end;
        self.start.iter_days().take_while(move |date| *date <= end)
    }
}

/// A class whose stored schedule failed validation during a bulk expansion.
#[derive(Debug, Error)]
#[error("Class {class_id} has an invalid schedule: {source}")]
pub struct ClassScheduleError {
    pub class_id: String,
    #[source]
    pub source: ScheduleError,
}

/// Expands one class over `[window_start, window_end]`, ascending by start.
pub fn expand(
    class: &ClassDefinition,
    window_start: NaiveDate,
    window_end: NaiveDate,
) -> Result<Vec<Occurrence>, ScheduleError> {
    let window = ExpansionWindow::new(window_start, window_end)?;
    let schedule = class.schedule()?;
    Ok(expand_schedule(class, &schedule, window))
}

/// Expands an already validated schedule.
pub fn expand_schedule(
    class: &ClassDefinition,
    schedule: &Schedule,
    window: ExpansionWindow,
) -> Vec<Occurrence> {
    if schedule.weekdays.is_empty() {
        return Vec::new();
    }
    window
        .dates()
        .filter(|date| schedule.occurs_on(*date))
        .map(|date| Occurrence::on_date(class, date, schedule.start, schedule.end))
        .collect()
}

/// Expands every class and merges the results chronologically. Ties keep a
/// fixed order by title and then class id. Stops at the first class with an
/// invalid schedule.
pub fn expand_all(
    classes: &[ClassDefinition],
    window: ExpansionWindow,
) -> Result<Vec<Occurrence>, ClassScheduleError> {
    let mut occurrences = Vec::new();
    for class in classes {
        let schedule = class.schedule().map_err(|source| ClassScheduleError {
            class_id: class.id.clone(),
            source,
        })?;
        occurrences.extend(expand_schedule(class, &schedule, window));
    }
    occurrences.sort_by(|a, b| {
        a.start
            .cmp(&b.start)
            .then_with(|| a.title.cmp(&b.title))
            .then_with(|| a.source_class.id.cmp(&b.source_class.id))
    });
    Ok(occurrences)
}
