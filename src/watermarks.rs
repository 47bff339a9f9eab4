//! Partition watermarks.
//!
//! Partition names look like `ds=20200908`. The values are parsed with the
//! configured date formats in order; the first format that parses at least
//! one value wins and later formats are not consulted. The result is either
//! empty or a (low, high) pair rendered as `%Y-%m-%d %H:%M:%S`.

use chrono::format::{parse, Parsed, StrftimeItems};
use chrono::{NaiveDateTime, NaiveTime};
use metadata_types::{Watermark, WatermarkType};
use tracing::warn;

pub const CANONICAL_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Parse `value` with a strftime-style `format`.
///
/// Fields the format does not carry default to January, the first of the
/// month and midnight. Trailing unparsed input is a failure.
pub fn parse_partition_value(value: &str, format: &str) -> Option<NaiveDateTime> {
    let mut parsed = Parsed::new();
    parse(&mut parsed, value, StrftimeItems::new(format)).ok()?;
    // Only fills fields the format left unset.
    let _ = parsed.set_month(1);
    let _ = parsed.set_day(1);
    let date = parsed.to_naive_date().ok()?;
    let time = parsed.to_naive_time().unwrap_or(NaiveTime::MIN);
    Some(date.and_time(time))
}

fn split_partition(name: &str) -> Option<(&str, &str)> {
    name.split_once('=')
}

/// Low/high watermarks for the given partition names.
pub fn table_watermarks(partition_names: &[String], formats: &[String]) -> Vec<Watermark> {
    let Some((partition_key, _)) = partition_names.iter().find_map(|n| split_partition(n)) else {
        return Vec::new();
    };

    let values: Vec<&str> = partition_names
        .iter()
        .filter_map(|name| split_partition(name).map(|(_, value)| value))
        .collect();

    for format in formats {
        let parsed: Vec<NaiveDateTime> = values
            .iter()
            .filter_map(|value| parse_partition_value(value, format))
            .collect();
        if parsed.len() < values.len() && !parsed.is_empty() {
            warn!(
                format = %format,
                skipped = values.len() - parsed.len(),
                "some partition values did not parse"
            );
        }
        let (Some(low), Some(high)) = (parsed.iter().min(), parsed.iter().max()) else {
            continue;
        };
        return vec![
            watermark(WatermarkType::LowWatermark, partition_key, low),
            watermark(WatermarkType::HighWatermark, partition_key, high),
        ];
    }
    Vec::new()
}

fn watermark(watermark_type: WatermarkType, partition_key: &str, at: &NaiveDateTime) -> Watermark {
    Watermark {
        watermark_type,
        partition_key: partition_key.to_string(),
        partition_value: at.format(CANONICAL_FORMAT).to_string(),
        create_time: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn names(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| format!("ds={v}")).collect()
    }

    fn formats(f: &[&str]) -> Vec<String> {
        f.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn compact_date_format() {
        let marks = table_watermarks(&names(&["20200908", "20200911"]), &formats(&["%Y%m%d"]));
        assert_eq!(marks.len(), 2);
        assert_eq!(marks[0].watermark_type, WatermarkType::LowWatermark);
        assert_eq!(marks[0].partition_key, "ds");
        assert_eq!(marks[0].partition_value, "2020-09-08 00:00:00");
        assert_eq!(marks[1].partition_value, "2020-09-11 00:00:00");
        assert!(marks[0].create_time.is_none());
    }

    #[test]
    fn missing_day_defaults_to_first() {
        let marks = table_watermarks(&names(&["2020,08"]), &formats(&["%Y,%m"]));
        assert_eq!(marks[0].partition_value, "2020-08-01 00:00:00");
        assert_eq!(marks[1].partition_value, "2020-08-01 00:00:00");
    }

    #[test]
    fn unmatched_formats_yield_nothing() {
        assert!(table_watermarks(&names(&["20200908"]), &formats(&["%Y-%m-%d"])).is_empty());
        assert!(table_watermarks(&names(&["20200908"]), &[]).is_empty());
        assert!(table_watermarks(&[], &formats(&["%Y%m%d"])).is_empty());
    }

    #[test]
    fn first_parsing_format_wins() {
        let marks = table_watermarks(
            &names(&["20200908"]),
            &formats(&["%Y-%m-%d", "%Y%m%d", "%Y%d%m"]),
        );
        assert_eq!(marks[0].partition_value, "2020-09-08 00:00:00");
    }

    #[test]
    fn key_taken_from_first_splittable_name() {
        let partition_names = formats(&["garbage", "ds=20200908", "ds=20200911"]);
        let marks = table_watermarks(&partition_names, &formats(&["%Y%m%d"]));
        assert_eq!(marks.len(), 2);
        assert_eq!(marks[0].partition_key, "ds");
        assert_eq!(marks[0].partition_value, "2020-09-08 00:00:00");
        assert_eq!(marks[1].partition_value, "2020-09-11 00:00:00");
    }

    #[test]
    fn time_fields_are_kept() {
        let parsed = parse_partition_value("2020-09-08 13:45", "%Y-%m-%d %H:%M").unwrap();
        assert_eq!(parsed.format(CANONICAL_FORMAT).to_string(), "2020-09-08 13:45:00");
    }

    #[test]
    fn trailing_input_fails() {
        assert!(parse_partition_value("20200908extra", "%Y%m%d").is_none());
    }

    proptest! {
        #[test]
        fn result_is_empty_or_a_pair(values in prop::collection::vec("[0-9]{6,8}", 0..6)) {
            let partition_names: Vec<String> = values.iter().map(|v| format!("ds={v}")).collect();
            let marks = table_watermarks(&partition_names, &formats(&["%Y%m%d", "%Y%m"]));
            prop_assert!(marks.is_empty() || marks.len() == 2);
            if marks.len() == 2 {
                prop_assert!(marks[0].partition_value <= marks[1].partition_value);
            }
        }
    }
}
