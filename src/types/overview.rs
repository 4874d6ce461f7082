//! Dashboard overview types
//!
//! Query and result types for the time-bucketed growth metrics. The result
//! shape mirrors the external JSON contract: parallel `labels`/`counts`
//! sequences, an ISO-8601 range, and a numeric `total_income`.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Bucketing unit for the overview aggregation
///
/// Determines the label vocabulary and the default date window when the
/// query omits explicit bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Granularity {
    /// Day-of-month buckets, labels `"1"`..`"31"`
    #[default]
    #[serde(rename = "days")]
    Day,

    /// Calendar-month buckets, labels `Jan`..`Dec`
    #[serde(rename = "months")]
    Month,

    /// Calendar-year buckets, the 20 years ending at the current year,
    /// most-recent-first
    #[serde(rename = "years")]
    Year,
}

/// Immutable overview query
///
/// Absent bounds are resolved to per-granularity UTC defaults, see
/// [`crate::core::aggregator::resolve_window`].
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct OverviewQuery {
    /// Inclusive lower bound of the window
    pub start_date: Option<DateTime<Utc>>,

    /// Inclusive upper bound of the window
    pub end_date: Option<DateTime<Utc>>,

    /// Bucketing granularity, defaults to days
    #[serde(default)]
    pub group_by: Granularity,
}

/// Inclusive UTC date range
///
/// Serialized as `{"start_date": ..., "end_date": ...}` in RFC 3339 form.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DateRange {
    /// Inclusive lower bound
    #[serde(rename = "start_date")]
    pub start: DateTime<Utc>,

    /// Inclusive upper bound
    #[serde(rename = "end_date")]
    pub end: DateTime<Utc>,
}

impl DateRange {
    /// Create a new range from inclusive bounds
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        DateRange { start, end }
    }

    /// Whether the timestamp falls within the range (bounds inclusive)
    pub fn contains(&self, ts: DateTime<Utc>) -> bool {
        self.start <= ts && ts <= self.end
    }

    /// The temporal midpoint of the range
    ///
    /// Used to split matching records into first and second halves for the
    /// growth indicator.
    pub fn midpoint(&self) -> DateTime<Utc> {
        self.start + (self.end - self.start) / 2
    }
}

/// Full dashboard overview payload
///
/// `labels` and `counts` are parallel ordered sequences; the order of the
/// labels is semantically meaningful (days ascending, months in calendar
/// order, years most-recent-first). The three `total_*` figures are
/// independent of the queried window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverviewResult {
    /// The resolved query window
    pub range: DateRange,

    /// Granularity the buckets were computed with
    pub group_by: Granularity,

    /// Ordered bucket labels, fixed per granularity
    pub labels: Vec<String>,

    /// Record count per label, parallel to `labels`
    pub counts: Vec<u64>,

    /// Second-half versus first-half growth across the window midpoint
    ///
    /// `None` when one or zero records matched, or when the first half is
    /// empty.
    pub growth_percentage: Option<f64>,

    /// Number of records that matched the queried window
    pub total_matching_users: u64,

    /// All-time user count, unaffected by the window
    pub total_users: u64,

    /// Users created in the trailing calendar month ending now
    pub total_new_users: u64,

    /// All-time sum of transaction amounts, zero when there are none
    pub total_income: Decimal,
}
