//! Page arithmetic for list endpoints

use serde::Serialize;
use utoipa::ToSchema;

pub const DEFAULT_PAGE: i64 = 1;
pub const DEFAULT_LIMIT: i64 = 10;
pub const MAX_LIMIT: i64 = 50;

/// Resolved page and page size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: i64,
    pub limit: i64,
}

impl PageRequest {
    /// Coerce raw query values. Anything that is not an integer >= 1 falls
    /// back to the default; the `limit` ceiling is enforced by validation.
    pub fn from_raw(page: Option<&str>, limit: Option<&str>) -> Self {
        Self {
            page: parse_positive(page).unwrap_or(DEFAULT_PAGE),
            limit: parse_positive(limit).unwrap_or(DEFAULT_LIMIT),
        }
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }

    pub fn pagination(&self, total: i64) -> Pagination {
        Pagination {
            total,
            page: self.page,
            limit: self.limit,
            total_pages: total_pages(total, self.limit),
        }
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

/// Parse a leading integer the way lenient query coercion does: surrounding
/// whitespace is ignored and trailing garbage after the digits is dropped.
/// A digit run too long for `i64` saturates, so it still counts as too large.
pub fn parse_positive(raw: Option<&str>) -> Option<i64> {
    let s = raw?.trim();
    let (sign, digits) = match s.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, s.strip_prefix('+').unwrap_or(s)),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    let digits = &digits[..end];
    if digits.is_empty() {
        return None;
    }
    let value = digits.parse::<i64>().unwrap_or(i64::MAX) * sign;
    (value >= 1).then_some(value)
}

pub fn total_pages(total: i64, limit: i64) -> i64 {
    if total <= 0 || limit <= 0 {
        0
    } else {
        (total + limit - 1) / limit
    }
}

/// Pagination block of a list response
#[derive(Debug, Clone, Serialize, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub total: i64,
    pub page: i64,
    pub limit: i64,
    pub total_pages: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        assert_eq!(PageRequest::from_raw(None, None), PageRequest::default());
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let req = PageRequest::from_raw(Some("0"), Some("5"));
        assert_eq!(req, PageRequest { page: 1, limit: 5 });

        let req = PageRequest::from_raw(Some("abc"), Some("-3"));
        assert_eq!(req, PageRequest { page: 1, limit: 10 });

        let req = PageRequest::from_raw(Some(""), Some(""));
        assert_eq!(req, PageRequest::default());
    }

    #[test]
    fn test_leading_integer() {
        assert_eq!(parse_positive(Some("3")), Some(3));
        assert_eq!(parse_positive(Some(" 7 ")), Some(7));
        assert_eq!(parse_positive(Some("4.9")), Some(4));
        assert_eq!(parse_positive(Some("12abc")), Some(12));
        assert_eq!(parse_positive(Some("+2")), Some(2));
        assert_eq!(parse_positive(Some("-2")), None);
        assert_eq!(parse_positive(Some("x1")), None);
    }

    #[test]
    fn test_overflowing_digits_saturate() {
        assert_eq!(parse_positive(Some("99999999999999999999")), Some(i64::MAX));
        assert_eq!(parse_positive(Some("-99999999999999999999")), None);
        assert_eq!(parse_positive(Some("00000000000000000000007")), Some(7));
    }

    #[test]
    fn test_huge_page_is_past_the_end() {
        let req = PageRequest::from_raw(Some("99999999999999999999"), Some("10"));
        assert_eq!(req.page, i64::MAX);
        assert_eq!(req.offset(), i64::MAX);
    }

    #[test]
    fn test_offset() {
        assert_eq!(PageRequest { page: 1, limit: 10 }.offset(), 0);
        assert_eq!(PageRequest { page: 3, limit: 5 }.offset(), 10);
    }

    #[test]
    fn test_total_pages() {
        assert_eq!(total_pages(0, 10), 0);
        assert_eq!(total_pages(1, 10), 1);
        assert_eq!(total_pages(10, 10), 1);
        assert_eq!(total_pages(11, 10), 2);
        assert_eq!(total_pages(7, 3), 3);
    }

    #[test]
    fn test_page_beyond_last_keeps_total() {
        let pagination = PageRequest { page: 9, limit: 5 }.pagination(12);
        assert_eq!(
            pagination,
            Pagination {
                total: 12,
                page: 9,
                limit: 5,
                total_pages: 3
            }
        );
    }

    #[test]
    fn test_serialized_names() {
        let value = serde_json::to_value(PageRequest::default().pagination(0)).unwrap();
        assert_eq!(value["totalPages"], 0);
        assert_eq!(value["page"], 1);
        assert_eq!(value["limit"], 10);
    }
}
