use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::schedule::{Schedule, ScheduleError};

/// Display group every occurrence is rendered in.
pub const PRIMARY_CALENDAR: &str = "primary";

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
pub enum ClassType {
    #[default]
    Regular,
    Workshop,
    Private,
    Competition,
}

/// A recurring class as stored for a studio.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClassDefinition {
    #[schema(example = "c1")]
    pub id: String,
    #[schema(example = "Ballet I")]
    pub name: String,
    #[serde(default)]
    pub class_type: ClassType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Weekday tokens as entered, e.g. `monday`, `Wed`, `thurs`.
    pub weekdays: Vec<String>,
    #[schema(example = "17:45")]
    pub start_time: String,
    #[schema(example = "18:45")]
    pub end_time: String,
    pub season_id: Option<String>,
    pub room_id: Option<String>,
    pub instructor_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_style_id: Option<String>,
    #[schema(example = 12)]
    pub max_size: u32,
    #[serde(default)]
    pub enrolled_student_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_age: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_age: Option<u32>,
    #[serde(default)]
    pub enforce_age_limit: bool,
}

impl ClassDefinition {
    /// Validates the weekday tokens and time range.
    pub fn schedule(&self) -> Result<Schedule, ScheduleError> {
        Schedule::parse(&self.weekdays, &self.start_time, &self.end_time)
    }

    pub fn enrolled_count(&self) -> usize {
        self.enrolled_student_ids.len()
    }

    pub fn spots_remaining(&self) -> usize {
        (self.max_size as usize).saturating_sub(self.enrolled_count())
    }

    pub fn is_full(&self) -> bool {
        self.spots_remaining() == 0
    }

    pub fn capacity_label(&self) -> String {
        format!("{}/{}", self.enrolled_count(), self.max_size)
    }

    /// `Some("5 - 8 years")` when the class enforces an age limit.
    pub fn age_range_label(&self) -> Option<String> {
        if !self.enforce_age_limit {
            return None;
        }
        match (self.min_age, self.max_age) {
            (Some(min), Some(max)) => Some(format!("{min} - {max} years")),
            (Some(min), None) => Some(format!("{min}+ years")),
            (None, Some(max)) => Some(format!("up to {max} years")),
            (None, None) => None,
        }
    }
}

/// One dated instance of a recurring class.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Occurrence {
    #[schema(example = "c1-20240603T1745")]
    pub occurrence_id: String,
    pub title: String,
    #[schema(value_type = String, format = "date-time", example = "2024-06-03T17:45:00")]
    pub start: NaiveDateTime,
    #[schema(value_type = String, format = "date-time", example = "2024-06-03T18:45:00")]
    pub end: NaiveDateTime,
    #[schema(example = "primary")]
    pub calendar: String,
    pub source_class: ClassDefinition,
}

impl Occurrence {
    pub fn on_date(class: &ClassDefinition, date: NaiveDate, start: NaiveTime, end: NaiveTime) -> Self {
        let start = date.and_time(start);
        Self {
            occurrence_id: occurrence_id(&class.id, start),
            title: class.name.clone(),
            start,
            end: date.and_time(end),
            calendar: PRIMARY_CALENDAR.to_string(),
            source_class: class.clone(),
        }
    }
}

/// Stable identity of an occurrence. The timestamp suffix has a fixed width,
/// so distinct `(class_id, start)` pairs never produce the same id.
pub fn occurrence_id(class_id: &str, start: NaiveDateTime) -> String {
    format!("{class_id}-{}", start.format("%Y%m%dT%H%M"))
}
