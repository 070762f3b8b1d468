use chrono::NaiveDateTime;
use chrono_tz::Tz;
use icalendar::{Calendar, CalendarDateTime, Component, Event, EventLike};

use crate::models::Occurrence;
use crate::schedule::format_time_range;
use crate::weekday::format_days;

#[derive(Clone)]
pub struct ICalExporter {
    calendar_name: String,
    timezone: Tz,
}

impl ICalExporter {
    /// Occurrence times are studio wall-clock times in `timezone`.
    pub fn new(calendar_name: impl Into<String>, timezone: Tz) -> Self {
        Self {
            calendar_name: calendar_name.into(),
            timezone,
        }
    }

    fn studio_time(&self, date_time: NaiveDateTime) -> CalendarDateTime {
        CalendarDateTime::WithTimezone {
            date_time,
            tzid: self.timezone.name().to_string(),
        }
    }

    /// Renders occurrences as an iCalendar document. An empty slice still
    /// yields a valid calendar with no events.
    pub fn generate(&self, occurrences: &[Occurrence]) -> Vec<u8> {
        let mut calendar = Calendar::new();
        calendar.name(&self.calendar_name);

        for occurrence in occurrences {
            let class = &occurrence.source_class;

            let mut event = Event::new();
            event.summary(&occurrence.title);
            event.starts(self.studio_time(occurrence.start));
            event.ends(self.studio_time(occurrence.end));
            event.uid(&occurrence.occurrence_id);
            if let Some(room) = &class.room_id {
                event.location(room);
            }

            let capacity = if class.is_full() {
                format!("Capacity: {} (full)", class.capacity_label())
            } else {
                format!("Capacity: {}", class.capacity_label())
            };
            let mut description = vec![
                format!("Type: {:?}", class.class_type),
                format!(
                    "Time: {}",
                    format_time_range(occurrence.start.time(), occurrence.end.time())
                ),
                capacity,
            ];
            if let Ok(days) = format_days(&class.weekdays) {
                description.push(format!("Days: {days}"));
            }
            if let Some(instructor) = &class.instructor_id {
                description.push(format!("Instructor: {instructor}"));
            }
            if let Some(ages) = class.age_range_label() {
                description.push(format!("Ages: {ages}"));
            }
            event.description(&description.join("\n"));
            calendar.push(event);
        }

        calendar.to_string().into_bytes()
    }
}

impl Default for ICalExporter {
    fn default() -> Self {
        Self::new("Studio Schedule", Tz::UTC)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures::{class, date};
    use crate::recurrence::expand;

    #[test]
    fn test_generate_occurrences() {
        let mut def = class("c1", &["mon", "wed"], "17:45", "18:45");
        def.name = "Ballet I".to_string();
        def.room_id = Some("Studio A".to_string());
        def.instructor_id = Some("inst-7".to_string());
        let occurrences = expand(&def, date(2024, 6, 3), date(2024, 6, 9)).unwrap();

        let exporter = ICalExporter::new("Main Street Dance", Tz::America__New_York);
        let body = String::from_utf8(exporter.generate(&occurrences)).unwrap();
        assert!(body.contains("BEGIN:VCALENDAR"));
        assert_eq!(body.matches("BEGIN:VEVENT").count(), 2);
        assert!(body.contains("Ballet I"));
        assert!(body.contains("Main Street Dance"));
        assert!(body.contains("c1-20240603T1745"));
        assert!(body.contains("c1-20240605T1745"));
        assert!(body.contains("Studio A"));
    }

    #[test]
    fn test_generate_pins_times_to_studio_zone() {
        let def = class("c1", &["mon"], "17:45", "18:45");
        let occurrences = expand(&def, date(2024, 6, 3), date(2024, 6, 3)).unwrap();

        let exporter = ICalExporter::new("Main Street Dance", Tz::America__New_York);
        let body = String::from_utf8(exporter.generate(&occurrences)).unwrap();
        assert!(body.contains("DTSTART;TZID=America/New_York:20240603T174500"));
        assert!(body.contains("DTEND;TZID=America/New_York:20240603T184500"));
        assert!(!body.contains("DTSTART:20240603T174500"));
    }

    #[test]
    fn test_generate_empty() {
        let exporter = ICalExporter::default();
        let body = String::from_utf8(exporter.generate(&[])).unwrap();
        assert!(body.contains("BEGIN:VCALENDAR"));
        assert!(!body.contains("BEGIN:VEVENT"));
    }
}
