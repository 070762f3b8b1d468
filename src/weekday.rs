use chrono::{Datelike, NaiveDate, Weekday};

use crate::schedule::ScheduleError;

/// Parses a single weekday token. Accepts full English names, three letter
/// abbreviations and the `tues`/`thur`/`thurs` forms, in any casing.
pub fn parse_weekday(token: &str) -> Result<Weekday, ScheduleError> {
    let trimmed = token.trim();
    let day = match trimmed.to_lowercase().as_str() {
        "monday" | "mon" => Weekday::Mon,
        "tuesday" | "tue" | "tues" => Weekday::Tue,
        "wednesday" | "wed" => Weekday::Wed,
        "thursday" | "thu" | "thur" | "thurs" => Weekday::Thu,
        "friday" | "fri" => Weekday::Fri,
        "saturday" | "sat" => Weekday::Sat,
        "sunday" | "sun" => Weekday::Sun,
        _ => return Err(ScheduleError::UnknownWeekday(trimmed.to_string())),
    };
    Ok(day)
}

/// Parses a list of tokens in input order, dropping duplicates. A token may
/// itself hold a comma separated list (`"mon, wed"`); empty fragments are
/// skipped.
pub fn parse_weekday_list<S: AsRef<str>>(tokens: &[S]) -> Result<Vec<Weekday>, ScheduleError> {
    let mut days = Vec::new();
    for fragment in tokens
        .iter()
        .flat_map(|token| token.as_ref().split(','))
        .filter(|fragment| !fragment.trim().is_empty())
    {
        let day = parse_weekday(fragment)?;
        if !days.contains(&day) {
            days.push(day);
        }
    }
    Ok(days)
}

pub fn full_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// Formats weekday tokens for display, e.g. `["mon", "wed,fri"]` becomes
/// `"Monday, Wednesday, Friday"`.
pub fn format_days<S: AsRef<str>>(tokens: &[S]) -> Result<String, ScheduleError> {
    let names: Vec<&str> = parse_weekday_list(tokens)?
        .into_iter()
        .map(full_name)
        .collect();
    Ok(names.join(", "))
}

/// Set of weekdays stored as a bitmask, Monday in the lowest bit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct WeekdaySet(u8);

impl WeekdaySet {
    pub const EMPTY: WeekdaySet = WeekdaySet(0);

    pub fn from_tokens<S: AsRef<str>>(tokens: &[S]) -> Result<Self, ScheduleError> {
        Ok(parse_weekday_list(tokens)?.into_iter().collect())
    }

    pub fn insert(&mut self, day: Weekday) {
        self.0 |= Self::bit(day);
    }

    pub fn contains(&self, day: Weekday) -> bool {
        self.0 & Self::bit(day) != 0
    }

    pub fn matches(&self, date: NaiveDate) -> bool {
        self.contains(date.weekday())
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    fn bit(day: Weekday) -> u8 {
        1 << day.num_days_from_monday()
    }
}

impl FromIterator<Weekday> for WeekdaySet {
    fn from_iter<I: IntoIterator<Item = Weekday>>(iter: I) -> Self {
        let mut set = WeekdaySet::EMPTY;
        for day in iter {
            set.insert(day);
        }
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_weekday_variants() {
        assert_eq!(parse_weekday("monday").unwrap(), Weekday::Mon);
        assert_eq!(parse_weekday("Mon").unwrap(), Weekday::Mon);
        assert_eq!(parse_weekday("  WEDNESDAY ").unwrap(), Weekday::Wed);
        assert_eq!(parse_weekday("tues").unwrap(), Weekday::Tue);
        assert_eq!(parse_weekday("Thurs").unwrap(), Weekday::Thu);
        assert_eq!(parse_weekday("thur").unwrap(), Weekday::Thu);
        assert_eq!(parse_weekday("sun").unwrap(), Weekday::Sun);
    }

    #[test]
    fn test_parse_weekday_rejects_unknown() {
        let err = parse_weekday("funday").unwrap_err();
        assert_eq!(err, ScheduleError::UnknownWeekday("funday".to_string()));
        assert!(parse_weekday("m").is_err());
        assert!(parse_weekday("").is_err());
    }

    #[test]
    fn test_parse_weekday_list_splits_and_dedups() {
        let days = parse_weekday_list(&["fri", "Mon, wed", "monday", ""]).unwrap();
        assert_eq!(days, vec![Weekday::Fri, Weekday::Mon, Weekday::Wed]);
    }

    #[test]
    fn test_format_days() {
        assert_eq!(
            format_days(&["mon", "wed,fri"]).unwrap(),
            "Monday, Wednesday, Friday"
        );
        assert_eq!(format_days::<&str>(&[]).unwrap(), "");
        assert!(format_days(&["mon", "noday"]).is_err());
    }

    #[test]
    fn test_weekday_set() {
        let set = WeekdaySet::from_tokens(&["sunday", "Mon", "mon"]).unwrap();
        assert!(set.contains(Weekday::Mon));
        assert!(set.contains(Weekday::Sun));
        assert!(!set.contains(Weekday::Tue));
        assert_eq!(set, [Weekday::Sun, Weekday::Mon].into_iter().collect());

        // 2024-06-03 is a Monday
        assert!(set.matches(NaiveDate::from_ymd_opt(2024, 6, 3).unwrap()));
        assert!(!set.matches(NaiveDate::from_ymd_opt(2024, 6, 4).unwrap()));
        assert!(WeekdaySet::EMPTY.is_empty());
    }
}
