use chrono::{DateTime, NaiveDate, NaiveDateTime};

/// Outcome of normalizing a raw date string from the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParsedDate {
    /// Empty or absent input.
    Missing,
    /// Input was present but could not be turned into a calendar date.
    Invalid,
    Valid(NaiveDate),
}

impl ParsedDate {
    /// The date, if parsing succeeded.
    pub fn valid(self) -> Option<NaiveDate> {
        match self {
            ParsedDate::Valid(d) => Some(d),
            _ => None,
        }
    }
}

/// Textual formats tried when no separator branch applies.
const FALLBACK_FORMATS: &[&str] = &["%B %d, %Y", "%d %B %Y", "%b %d, %Y", "%d %b %Y"];

/// Parse one of the date shapes the server emits.
///
/// The separator decides the branch: `-` (ISO), then `/`, then `.`
/// (`DD/MM/YYYY`, `DD.MM.YYYY`). The first separator found wins, so
/// `"10.12/2024"` goes down the slash branch. Out-of-range days or months
/// are rejected rather than rolled over.
pub fn parse(raw: Option<&str>) -> ParsedDate {
    let s = match raw.map(str::trim) {
        Some(s) if !s.is_empty() => s,
        _ => return ParsedDate::Missing,
    };

    if s.contains('-') {
        return parse_iso(s).map_or(ParsedDate::Invalid, ParsedDate::Valid);
    }

    for sep in ['/', '.'] {
        if s.contains(sep) {
            let parts: Vec<&str> = s.split(sep).collect();
            if parts.len() == 3 {
                return parse_day_first(&parts).map_or(ParsedDate::Invalid, ParsedDate::Valid);
            }
            break;
        }
    }

    parse_fallback(s).map_or(ParsedDate::Invalid, ParsedDate::Valid)
}

/// Shorthand for `parse(Some(raw))`.
pub fn parse_str(raw: &str) -> ParsedDate {
    parse(Some(raw))
}

/// Format a date the way the server expects it: `DD.MM.YYYY`.
pub fn format(date: NaiveDate) -> String {
    date.format("%d.%m.%Y").to_string()
}

fn parse_iso(s: &str) -> Option<NaiveDate> {
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(d);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }
    None
}

fn parse_day_first(parts: &[&str]) -> Option<NaiveDate> {
    let day: u32 = parts[0].trim().parse().ok()?;
    let month: u32 = parts[1].trim().parse().ok()?;
    let year: i32 = parts[2].trim().parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Only the textual month formats are accepted here. Browser clients fell back
/// to the lenient `Date` constructor, which also guesses at mixed separators
/// such as `10.12/2024`; this client rejects those instead.
fn parse_fallback(s: &str) -> Option<NaiveDate> {
    FALLBACK_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn empty_input_is_missing() {
        assert_eq!(parse(None), ParsedDate::Missing);
        assert_eq!(parse_str(""), ParsedDate::Missing);
        assert_eq!(parse_str("   "), ParsedDate::Missing);
    }

    #[test]
    fn parses_all_three_shapes() {
        assert_eq!(parse_str("2024-03-05").valid(), Some(ymd(2024, 3, 5)));
        assert_eq!(parse_str("05/03/2024").valid(), Some(ymd(2024, 3, 5)));
        assert_eq!(parse_str("05.03.2024").valid(), Some(ymd(2024, 3, 5)));
    }

    #[test]
    fn iso_datetime_keeps_the_date_part() {
        assert_eq!(parse_str("2024-03-05T23:10:00").valid(), Some(ymd(2024, 3, 5)));
        assert_eq!(parse_str("2024-03-05T23:10:00+03:00").valid(), Some(ymd(2024, 3, 5)));
    }

    #[test]
    fn slash_wins_over_dot() {
        // Split on '/' gives two parts, so the day-first branch does not apply
        // and no fallback format matches either.
        assert_eq!(parse_str("10.12/2024"), ParsedDate::Invalid);
        assert_eq!(parse_str("10/12/2024").valid(), Some(ymd(2024, 12, 10)));
        assert_eq!(parse_str("10.12.2024").valid(), Some(ymd(2024, 12, 10)));
    }

    #[test]
    fn dash_wins_even_when_malformed() {
        assert_eq!(parse_str("10.12.2024-x"), ParsedDate::Invalid);
    }

    #[test]
    fn out_of_range_components_are_rejected() {
        assert_eq!(parse_str("31.02.2024"), ParsedDate::Invalid);
        assert_eq!(parse_str("01.13.2024"), ParsedDate::Invalid);
        assert_eq!(parse_str("29.02.2023"), ParsedDate::Invalid);
        assert_eq!(parse_str("29.02.2024").valid(), Some(ymd(2024, 2, 29)));
    }

    #[test]
    fn non_numeric_parts_are_invalid() {
        assert_eq!(parse_str("aa.bb.cccc"), ParsedDate::Invalid);
        assert_eq!(parse_str("garbage"), ParsedDate::Invalid);
    }

    #[test]
    fn textual_month_names_fall_back() {
        assert_eq!(parse_str("March 5, 2024").valid(), Some(ymd(2024, 3, 5)));
        assert_eq!(parse_str("5 March 2024").valid(), Some(ymd(2024, 3, 5)));
        assert_eq!(parse_str("12/2024"), ParsedDate::Invalid);
    }

    #[test]
    fn dotted_timestamp_is_not_a_calendar_date() {
        // Three dot-separated parts, the last one is not a plain year.
        assert_eq!(parse_str("05.03.2024 14:22:01"), ParsedDate::Invalid);
    }

    #[test]
    fn format_is_zero_padded_day_first() {
        assert_eq!(format(ymd(2024, 1, 2)), "02.01.2024");
        assert_eq!(parse_str(&format(ymd(1999, 12, 31))).valid(), Some(ymd(1999, 12, 31)));
    }
}
