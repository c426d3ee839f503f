use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use tracing::{debug, warn};

use crate::table::Table;

/// Canonical output shape.
pub const OUTPUT_FORMAT: &str = "%d/%m/%Y";

/// Day-first where ambiguous. Four-digit year formats come before two-digit ones.
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d", "%d/%m/%Y", "%Y%m%d", "%Y/%m/%d", "%d-%m-%Y", "%d.%m.%Y",
];
const SHORT_YEAR_FORMATS: &[&str] = &["%d/%m/%y", "%d-%m-%y", "%d.%m.%y"];
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
    "%Y/%m/%d %H:%M:%S",
];

/// Text pandas-era exports use for missing values.
const NULL_LITERALS: &[&str] = &["nan", "NaN", "NaT", "None", "<NA>", "null"];

fn plausible(date: NaiveDate) -> Option<NaiveDate> {
    (1000..=9999).contains(&date.year()).then_some(date)
}

fn parse_exact(s: &str) -> Option<NaiveDate> {
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok().and_then(plausible))
        .or_else(|| {
            DATETIME_FORMATS.iter().find_map(|fmt| {
                NaiveDateTime::parse_from_str(s, fmt)
                    .ok()
                    .and_then(|dt| plausible(dt.date()))
            })
        })
        .or_else(|| {
            DateTime::parse_from_rfc3339(s)
                .ok()
                .and_then(|dt| plausible(dt.date_naive()))
        })
        .or_else(|| {
            SHORT_YEAR_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        })
}

/// Parse a date written in any of the supported shapes.
/// Falls back to the first whitespace- or `T`-separated token that parses.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let s = raw.trim().trim_matches('"');
    if s.is_empty() || NULL_LITERALS.contains(&s) {
        return None;
    }
    parse_exact(s).or_else(|| {
        s.split(|c: char| c.is_whitespace() || c == 'T')
            .filter(|tok| !tok.is_empty())
            .find_map(parse_exact)
    })
}

/// `raw` as `DD/MM/YYYY`, or `None` if it is not a recognizable date.
pub fn normalize_date(raw: &str) -> Option<String> {
    parse_date(raw).map(|d| d.format(OUTPUT_FORMAT).to_string())
}

/// Normalize every cell of `column` in place.
/// Returns how many non-null cells became null. A missing column is left alone.
pub fn normalize_date_column(table: &mut Table, column: &str) -> usize {
    let mut coerced = 0usize;
    let found = table.map_column(column, |cell| {
        let raw = cell?;
        let out = normalize_date(raw);
        if out.is_none() {
            debug!(value = raw, "unparseable date set to null");
            coerced += 1;
        }
        out
    });

    if !found {
        warn!(column, "date column not present, left as is");
    } else if coerced > 0 {
        warn!(column, coerced, "unparseable dates set to null");
    }
    coerced
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn iso_and_day_first_agree() {
        assert_eq!(normalize_date("2021-05-01").as_deref(), Some("01/05/2021"));
        assert_eq!(normalize_date("01/05/2021").as_deref(), Some("01/05/2021"));
        assert_eq!(normalize_date("20040213").as_deref(), Some("13/02/2004"));
        assert_eq!(normalize_date("2021/05/01").as_deref(), Some("01/05/2021"));
        assert_eq!(normalize_date("01-05-2021").as_deref(), Some("01/05/2021"));
        assert_eq!(normalize_date("01.05.2021").as_deref(), Some("01/05/2021"));
    }

    #[test]
    fn two_digit_years_and_timestamps() {
        assert_eq!(normalize_date("13/02/04").as_deref(), Some("13/02/2004"));
        assert_eq!(
            normalize_date("2019-11-29 20:45:00").as_deref(),
            Some("29/11/2019")
        );
        assert_eq!(
            normalize_date("2019-11-29T20:45:00+01:00").as_deref(),
            Some("29/11/2019")
        );
    }

    #[test]
    fn embedded_token_is_found() {
        assert_eq!(
            normalize_date("tirage du 13/02/2004").as_deref(),
            Some("13/02/2004")
        );
    }

    #[test]
    fn garbage_becomes_none() {
        for raw in ["", "  ", "nan", "NaT", "hello", "32/01/2020", "2021-02-30", "7"] {
            assert_eq!(normalize_date(raw), None, "{raw:?}");
        }
    }

    #[test]
    fn column_normalization_counts_failures() {
        let mut t = Table::from_rows(
            &["date_de_tirage", "n1"],
            &[&["2021-05-01", "7"], &["not a date", "8"], &["", "9"]],
        );
        assert_eq!(normalize_date_column(&mut t, "date_de_tirage"), 1);
        assert_eq!(t.get(0, "date_de_tirage"), Some("01/05/2021"));
        assert_eq!(t.get(1, "date_de_tirage"), None);
        assert_eq!(t.get(2, "date_de_tirage"), None);
        assert_eq!(t.get(1, "n1"), Some("8"));
    }

    #[test]
    fn missing_column_is_not_an_error() {
        let mut t = Table::from_rows(&["n1"], &[&["7"]]);
        assert_eq!(normalize_date_column(&mut t, "date_de_tirage"), 0);
        assert_eq!(t.get(0, "n1"), Some("7"));
    }
}
