//! Shared utility functions for WMB crates.

/// Date utility functions
pub mod dates {
    use chrono::NaiveDate;

    /// ISO date format used for all written tables: "YYYY-MM-DD"
    pub const ISO_FORMAT: &str = "%Y-%m-%d";

    /// Formats accepted when reading observation tables, tried in order.
    pub const ACCEPTED_FORMATS: [&str; 4] = [ISO_FORMAT, "%Y%m%d", "%d/%m/%Y", "%Y/%m/%d"];

    /// Format a NaiveDate as "YYYY-MM-DD"
    pub fn format_date(date: &NaiveDate) -> String {
        date.format(ISO_FORMAT).to_string()
    }

    /// Parse a date string in any of the [`ACCEPTED_FORMATS`].
    ///
    /// A trailing time component ("2021-03-01 00:00:00") is ignored, which is
    /// how spreadsheet exports usually write the date index.
    pub fn parse_date_flexible(s: &str) -> anyhow::Result<NaiveDate> {
        let trimmed = s.trim();
        let date_part = trimmed.split_whitespace().next().unwrap_or(trimmed);
        for format in ACCEPTED_FORMATS {
            if let Ok(date) = NaiveDate::parse_from_str(date_part, format) {
                return Ok(date);
            }
        }
        anyhow::bail!("unrecognised date '{}'", s)
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use chrono::NaiveDate;

        #[test]
        fn test_format_and_parse() {
            let date = NaiveDate::from_ymd_opt(2023, 6, 15).unwrap();
            let formatted = format_date(&date);
            assert_eq!(formatted, "2023-06-15");
            let parsed = parse_date_flexible(&formatted).unwrap();
            assert_eq!(parsed, date);
        }

        #[test]
        fn test_parse_date_flexible() {
            let expected = NaiveDate::from_ymd_opt(2021, 3, 1).unwrap();
            assert_eq!(parse_date_flexible("2021-03-01").unwrap(), expected);
            assert_eq!(parse_date_flexible("20210301").unwrap(), expected);
            assert_eq!(parse_date_flexible("01/03/2021").unwrap(), expected);
            assert_eq!(parse_date_flexible(" 2021-03-01 00:00:00 ").unwrap(), expected);
            assert!(parse_date_flexible("March 1st").is_err());
        }
    }
}
