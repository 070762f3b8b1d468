use chrono::NaiveDate;

use crate::error::ApiError;
use crate::models::ClassDefinition;
use crate::recurrence::ExpansionWindow;

/// Longest window a single request may expand.
pub const MAX_WINDOW_DAYS: i64 = 366;

/// Splits a comma separated id list such as `s1,s2`. Blank entries are
/// dropped, so an absent or empty parameter means "no filter".
pub fn parse_id_list(raw: Option<&str>) -> Vec<String> {
    raw.map(|value| {
        value
            .split(',')
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}

pub fn parse_date(field: &str, raw: &str) -> Result<NaiveDate, ApiError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| ApiError::BadRequest(format!("{field} must be a YYYY-MM-DD date")))
}

/// Builds the expansion window from optional `start`/`end` parameters.
/// `start` defaults to `today`.
pub fn resolve_window(
    start: Option<&str>,
    end: Option<&str>,
    today: NaiveDate,
) -> Result<ExpansionWindow, ApiError> {
    let start = start.map(|s| parse_date("start", s)).transpose()?.unwrap_or(today);
    let end = end.map(|e| parse_date("end", e)).transpose()?;
    bounded_window(start, end)
}

/// A missing `end` extends one month past `start`. Rejects inverted and
/// overlong windows.
pub fn bounded_window(start: NaiveDate, end: Option<NaiveDate>) -> Result<ExpansionWindow, ApiError> {
    let window = match end {
        Some(end) => ExpansionWindow::new(start, end)?,
        None => ExpansionWindow::following_month(start),
    };
    if window.num_days() > MAX_WINDOW_DAYS {
        return Err(ApiError::BadRequest(format!(
            "window must span at most {MAX_WINDOW_DAYS} days"
        )));
    }
    Ok(window)
}

/// Checks the parts of a submitted class the schedule parser does not.
pub fn validate_class(class: &ClassDefinition) -> Result<(), ApiError> {
    if class.id.trim().is_empty() {
        return Err(ApiError::BadRequest("id must not be empty".into()));
    }
    if class.max_size == 0 {
        return Err(ApiError::BadRequest("maxSize must be at least 1".into()));
    }
    if let (Some(min), Some(max)) = (class.min_age, class.max_age)
        && min > max
    {
        return Err(ApiError::BadRequest("minAge must not exceed maxAge".into()));
    }
    Ok(())
}
