//! Time-bucketed aggregation
//!
//! Pure functions mapping a grouping granularity and date range to an
//! ordered label sequence and, given a set of record timestamps, a count per
//! label plus a growth indicator. All calendar math is UTC.
//!
//! The label vocabularies are fixed and independent of the actual window:
//! days are always `"1"`..`"31"` (a 30-day month simply never populates
//! `"31"`), months are the twelve short names in calendar order, and years
//! are the 20 years ending at the current year, most recent first.

use crate::types::{DateRange, Granularity, OverviewQuery};
use chrono::{DateTime, Datelike, Duration, TimeZone, Utc};
use std::collections::HashMap;

/// Canonical three-letter month names, calendar order
pub const MONTH_LABELS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Number of year labels in the year vocabulary
pub const YEAR_LABEL_SPAN: i32 = 20;

/// First instant of a month, UTC
fn first_instant(year: i32, month: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, 1, 0, 0, 0)
        .single()
        .expect("first day of a month is a valid UTC datetime")
}

/// Last instant (23:59:59) of the last day of a month, UTC
fn last_instant(year: i32, month: u32) -> DateTime<Utc> {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    first_instant(next_year, next_month) - Duration::seconds(1)
}

/// Resolve the query window, filling absent bounds with per-granularity
/// UTC defaults
///
/// | granularity | default start                  | default end               |
/// |-------------|--------------------------------|---------------------------|
/// | days        | first instant of current month | last instant of the month |
/// | months      | Jan 1 of current year          | Dec 31 23:59:59           |
/// | years       | Jan 1, four years back         | Dec 31 23:59:59           |
///
/// Explicit bounds are taken verbatim.
pub fn resolve_window(query: &OverviewQuery, now: DateTime<Utc>) -> DateRange {
    let start = query.start_date.unwrap_or_else(|| match query.group_by {
        Granularity::Day => first_instant(now.year(), now.month()),
        Granularity::Month => first_instant(now.year(), 1),
        Granularity::Year => first_instant(now.year() - 4, 1),
    });

    let end = query.end_date.unwrap_or_else(|| match query.group_by {
        Granularity::Day => last_instant(now.year(), now.month()),
        Granularity::Month | Granularity::Year => last_instant(now.year(), 12),
    });

    DateRange::new(start, end)
}

/// The fixed, ordered label vocabulary for a granularity
///
/// `now` only matters for years, which run from the current year backwards.
pub fn labels(granularity: Granularity, now: DateTime<Utc>) -> Vec<String> {
    match granularity {
        Granularity::Day => (1..=31).map(|day| day.to_string()).collect(),
        Granularity::Month => MONTH_LABELS.iter().map(|name| name.to_string()).collect(),
        Granularity::Year => (0..YEAR_LABEL_SPAN)
            .map(|offset| (now.year() - offset).to_string())
            .collect(),
    }
}

/// Derive the bucket label of a timestamp under a granularity
fn bucket_label(granularity: Granularity, ts: DateTime<Utc>) -> String {
    match granularity {
        Granularity::Day => ts.day().to_string(),
        Granularity::Month => MONTH_LABELS[ts.month0() as usize].to_string(),
        Granularity::Year => ts.year().to_string(),
    }
}

/// Count records per label
///
/// Each timestamp increments the bucket its derived label matches; a derived
/// label outside the vocabulary is silently skipped (only possible for years
/// older than the 20-label span).
pub fn bucket_counts(
    labels: &[String],
    granularity: Granularity,
    timestamps: &[DateTime<Utc>],
) -> Vec<u64> {
    let index: HashMap<&str, usize> = labels
        .iter()
        .enumerate()
        .map(|(position, label)| (label.as_str(), position))
        .collect();

    let mut counts = vec![0u64; labels.len()];
    for ts in timestamps {
        if let Some(&position) = index.get(bucket_label(granularity, *ts).as_str()) {
            counts[position] += 1;
        }
    }
    counts
}

/// Growth of the second half of the window over the first half, in percent
///
/// Records are partitioned at the window midpoint (first half inclusive of
/// the midpoint). Returns `None` when one or zero records matched, or when
/// the first half is empty; a ratio against zero carries no signal.
pub fn growth_percentage(timestamps: &[DateTime<Utc>], range: &DateRange) -> Option<f64> {
    if timestamps.len() <= 1 {
        return None;
    }

    let midpoint = range.midpoint();
    let first_half = timestamps.iter().filter(|ts| **ts <= midpoint).count();
    if first_half == 0 {
        return None;
    }

    let second_half = timestamps.len() - first_half;
    Some((second_half as f64 - first_half as f64) / first_half as f64 * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn utc(year: i32, month: u32, day: u32, hour: u32, minute: u32, second: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(year, month, day, hour, minute, second)
            .single()
            .unwrap()
    }

    fn query(granularity: Granularity) -> OverviewQuery {
        OverviewQuery {
            start_date: None,
            end_date: None,
            group_by: granularity,
        }
    }

    #[rstest]
    #[case::days_span_current_month(
        Granularity::Day,
        utc(2024, 6, 15, 12, 0, 0),
        utc(2024, 6, 1, 0, 0, 0),
        utc(2024, 6, 30, 23, 59, 59)
    )]
    #[case::days_in_december(
        Granularity::Day,
        utc(2024, 12, 3, 8, 30, 0),
        utc(2024, 12, 1, 0, 0, 0),
        utc(2024, 12, 31, 23, 59, 59)
    )]
    #[case::days_in_leap_february(
        Granularity::Day,
        utc(2024, 2, 10, 0, 0, 0),
        utc(2024, 2, 1, 0, 0, 0),
        utc(2024, 2, 29, 23, 59, 59)
    )]
    #[case::months_span_current_year(
        Granularity::Month,
        utc(2024, 6, 15, 12, 0, 0),
        utc(2024, 1, 1, 0, 0, 0),
        utc(2024, 12, 31, 23, 59, 59)
    )]
    #[case::years_span_five_years(
        Granularity::Year,
        utc(2024, 6, 15, 12, 0, 0),
        utc(2020, 1, 1, 0, 0, 0),
        utc(2024, 12, 31, 23, 59, 59)
    )]
    fn test_default_windows(
        #[case] granularity: Granularity,
        #[case] now: DateTime<Utc>,
        #[case] expected_start: DateTime<Utc>,
        #[case] expected_end: DateTime<Utc>,
    ) {
        let range = resolve_window(&query(granularity), now);
        assert_eq!(range.start, expected_start);
        assert_eq!(range.end, expected_end);
    }

    #[test]
    fn test_explicit_bounds_taken_verbatim() {
        let explicit = OverviewQuery {
            start_date: Some(utc(2023, 3, 5, 6, 0, 0)),
            end_date: Some(utc(2023, 9, 1, 0, 0, 0)),
            group_by: Granularity::Day,
        };
        let range = resolve_window(&explicit, utc(2024, 6, 15, 0, 0, 0));
        assert_eq!(range.start, utc(2023, 3, 5, 6, 0, 0));
        assert_eq!(range.end, utc(2023, 9, 1, 0, 0, 0));
    }

    #[test]
    fn test_day_labels_always_thirty_one() {
        let labels = labels(Granularity::Day, utc(2024, 2, 10, 0, 0, 0));
        assert_eq!(labels.len(), 31);
        assert_eq!(labels.first().map(String::as_str), Some("1"));
        assert_eq!(labels.last().map(String::as_str), Some("31"));
    }

    #[test]
    fn test_month_labels_calendar_order() {
        let labels = labels(Granularity::Month, utc(2024, 6, 15, 0, 0, 0));
        assert_eq!(labels, MONTH_LABELS.map(String::from).to_vec());
    }

    #[test]
    fn test_year_labels_most_recent_first() {
        let labels = labels(Granularity::Year, utc(2024, 6, 15, 0, 0, 0));
        assert_eq!(labels.len(), 20);
        assert_eq!(labels.first().map(String::as_str), Some("2024"));
        assert_eq!(labels.get(1).map(String::as_str), Some("2023"));
        assert_eq!(labels.last().map(String::as_str), Some("2005"));
    }

    #[test]
    fn test_day_buckets_count_by_day_of_month() {
        // two signups on the 3rd, one on the 17th
        let now = utc(2024, 6, 15, 0, 0, 0);
        let signups = vec![
            utc(2024, 6, 3, 9, 0, 0),
            utc(2024, 6, 3, 21, 0, 0),
            utc(2024, 6, 17, 5, 0, 0),
        ];

        let labels = labels(Granularity::Day, now);
        let counts = bucket_counts(&labels, Granularity::Day, &signups);

        assert_eq!(counts[2], 2);
        assert_eq!(counts[16], 1);
        assert_eq!(counts.iter().sum::<u64>(), 3);
    }

    #[test]
    fn test_month_buckets_count_by_short_name() {
        let now = utc(2024, 6, 15, 0, 0, 0);
        let signups = vec![
            utc(2024, 2, 1, 0, 0, 0),
            utc(2024, 2, 28, 0, 0, 0),
            utc(2024, 11, 30, 0, 0, 0),
        ];

        let labels = labels(Granularity::Month, now);
        let counts = bucket_counts(&labels, Granularity::Month, &signups);

        assert_eq!(counts[1], 2); // Feb
        assert_eq!(counts[10], 1); // Nov
        assert_eq!(counts.iter().sum::<u64>(), 3);
    }

    #[test]
    fn test_year_out_of_vocabulary_skipped() {
        let now = utc(2024, 6, 15, 0, 0, 0);
        let signups = vec![utc(2024, 1, 1, 0, 0, 0), utc(1999, 1, 1, 0, 0, 0)];

        let labels = labels(Granularity::Year, now);
        let counts = bucket_counts(&labels, Granularity::Year, &signups);

        // 1999 predates the 20-label span and is dropped
        assert_eq!(counts[0], 1);
        assert_eq!(counts.iter().sum::<u64>(), 1);
    }

    #[test]
    fn test_growth_none_for_single_record() {
        let range = DateRange::new(utc(2024, 6, 1, 0, 0, 0), utc(2024, 6, 30, 23, 59, 59));
        let single = vec![utc(2024, 6, 3, 0, 0, 0)];
        assert_eq!(growth_percentage(&single, &range), None);
        assert_eq!(growth_percentage(&[], &range), None);
    }

    #[test]
    fn test_growth_none_for_empty_first_half() {
        let range = DateRange::new(utc(2024, 6, 1, 0, 0, 0), utc(2024, 6, 30, 23, 59, 59));
        let late = vec![utc(2024, 6, 25, 0, 0, 0), utc(2024, 6, 28, 0, 0, 0)];
        assert_eq!(growth_percentage(&late, &range), None);
    }

    #[rstest]
    #[case::triple_growth(
        // 1 in the first half, 3 in the second: (3 - 1) / 1 * 100
        vec![(3, 1), (20, 3)],
        200.0
    )]
    #[case::balanced(vec![(3, 2), (20, 2)], 0.0)]
    #[case::decline(
        // 3 then 1: (1 - 3) / 3 * 100
        vec![(3, 3), (20, 1)],
        -200.0 / 3.0
    )]
    fn test_growth_percentage(#[case] spread: Vec<(u32, u64)>, #[case] expected: f64) {
        let range = DateRange::new(utc(2024, 6, 1, 0, 0, 0), utc(2024, 6, 30, 23, 59, 59));
        let timestamps: Vec<DateTime<Utc>> = spread
            .into_iter()
            .flat_map(|(day, count)| {
                (0..count).map(move |_| utc(2024, 6, day, 12, 0, 0))
            })
            .collect();

        let growth = growth_percentage(&timestamps, &range).unwrap();
        assert!((growth - expected).abs() < 1e-9);
    }

    #[test]
    fn test_midpoint_record_counts_toward_first_half() {
        let range = DateRange::new(utc(2024, 6, 1, 0, 0, 0), utc(2024, 6, 3, 0, 0, 0));
        let timestamps = vec![range.midpoint(), utc(2024, 6, 2, 23, 0, 0)];
        // midpoint record is first-half, so growth is (1 - 1) / 1 * 100
        assert_eq!(growth_percentage(&timestamps, &range), Some(0.0));
    }
}
