use chrono::{Local, NaiveDate};

/// Format every written task date uses
pub const CANONICAL_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognized date: {0:?} (expected YYYY-MM-DD)")]
pub struct DateError(pub String);

/// Today's date on the local clock
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Parse a user- or legacy-supplied date.
///
/// Accepts `YYYY-MM-DD`, unpadded `YYYY-M-D`, the `Wed May 01 2024`
/// long form, and the keyword `today`.
pub fn parse_date(input: &str, today: NaiveDate) -> Result<NaiveDate, DateError> {
    let s = input.trim();
    if s.eq_ignore_ascii_case("today") {
        return Ok(today);
    }
    if let Some(date) = parse_numeric(s) {
        return Ok(date);
    }
    NaiveDate::parse_from_str(s, "%a %b %d %Y").map_err(|_| DateError(input.to_string()))
}

/// Parse and re-emit as `YYYY-MM-DD`
pub fn canonical_date(input: &str, today: NaiveDate) -> Result<String, DateError> {
    parse_date(input, today).map(|d| d.format(CANONICAL_FORMAT).to_string())
}

fn parse_numeric(s: &str) -> Option<NaiveDate> {
    let mut parts = s.split('-');
    let (y, m, d) = (parts.next()?, parts.next()?, parts.next()?);
    if parts.next().is_some() || y.len() != 4 || m.is_empty() || m.len() > 2 || d.is_empty() || d.len() > 2 {
        return None;
    }
    // `parse` would also take a sign
    if ![y, m, d].iter().all(|p| p.bytes().all(|b| b.is_ascii_digit())) {
        return None;
    }
    NaiveDate::from_ymd_opt(y.parse().ok()?, m.parse().ok()?, d.parse().ok()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn canonical_passes_through() {
        assert_eq!(canonical_date("2024-05-01", day(2000, 1, 1)).unwrap(), "2024-05-01");
    }

    #[test]
    fn unpadded_is_normalized() {
        assert_eq!(canonical_date("2024-5-1", day(2000, 1, 1)).unwrap(), "2024-05-01");
    }

    #[test]
    fn long_form_is_normalized() {
        assert_eq!(
            canonical_date("Wed May 01 2024", day(2000, 1, 1)).unwrap(),
            "2024-05-01"
        );
    }

    #[test]
    fn today_keyword() {
        assert_eq!(canonical_date(" Today ", day(2025, 2, 15)).unwrap(), "2025-02-15");
    }

    #[test]
    fn rejects_garbage() {
        for bad in ["", "tomorrow", "2024-13-01", "2024-02-30", "24-5-1", "2024-05-01-02"] {
            assert!(canonical_date(bad, day(2000, 1, 1)).is_err(), "{bad:?} accepted");
        }
    }

    #[test]
    fn rejects_signed_parts() {
        for bad in ["+202-5-1", "2024-+5-1", "2024-5-+1"] {
            assert!(parse_date(bad, day(2000, 1, 1)).is_err(), "{bad:?} accepted");
        }
    }
}
