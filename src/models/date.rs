//! Calendar dates stored as `YYYY-MM-DD` strings

use once_cell::sync::Lazy;
use regex::Regex;

static DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}$").expect("valid date pattern"));

/// Strip any time-of-day suffix (everything from the first `T`) and check the
/// remaining `YYYY-MM-DD` shape. Only the shape is checked, not the calendar.
pub fn normalize_date(raw: &str) -> Option<String> {
    let date = raw.split('T').next().unwrap_or_default();
    DATE_RE.is_match(date).then(|| date.to_string())
}
