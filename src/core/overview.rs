//! Dashboard overview orchestration
//!
//! [`OverviewMetricsService`] drives the pure aggregator against the record
//! store and assembles the full dashboard payload. It is read-only and
//! idempotent: safe to call concurrently and repeatedly, with no mutation.

use crate::core::aggregator;
use crate::core::traits::RecordStore;
use crate::types::{EngineError, OverviewQuery, OverviewResult};
use chrono::{DateTime, Months, Utc};
use std::sync::Arc;

/// Computes the dashboard growth metrics
///
/// Holds the record store it queries; store failures propagate as-is, there
/// are no silent defaults.
pub struct OverviewMetricsService {
    store: Arc<dyn RecordStore>,
}

impl OverviewMetricsService {
    /// Create a new service over the given record store
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        OverviewMetricsService { store }
    }

    /// Compute the full overview payload for a query
    ///
    /// Resolves the window (defaults per granularity), buckets the matching
    /// signup timestamps into the fixed label vocabulary, derives the
    /// midpoint growth indicator, and adds the three window-independent
    /// figures: all-time user count, users created in the trailing calendar
    /// month ending `now`, and the all-time transaction-amount sum.
    ///
    /// # Arguments
    ///
    /// * `query` - The overview query, possibly with absent bounds
    /// * `now` - The reference instant for default windows and trailing
    ///   metrics; injected so results are reproducible
    pub async fn compute_overview(
        &self,
        query: &OverviewQuery,
        now: DateTime<Utc>,
    ) -> Result<OverviewResult, EngineError> {
        let range = aggregator::resolve_window(query, now);
        let signups = self.store.user_signup_dates(&range).await?;

        let labels = aggregator::labels(query.group_by, now);
        let counts = aggregator::bucket_counts(&labels, query.group_by, &signups);
        let growth_percentage = aggregator::growth_percentage(&signups, &range);
        let total_matching_users = signups.len() as u64;

        let total_users = self.store.count_users().await?;

        // trailing window: one calendar month back, clamped at month ends
        let trailing_start = now.checked_sub_months(Months::new(1)).unwrap_or(now);
        let total_new_users = self.store.count_users_since(trailing_start).await?;

        let total_income = self.store.total_transaction_amount().await?;

        tracing::debug!(
            group_by = ?query.group_by,
            matching = total_matching_users,
            growth = ?growth_percentage,
            "computed overview"
        );

        Ok(OverviewResult {
            range,
            group_by: query.group_by,
            labels,
            counts,
            growth_percentage,
            total_matching_users,
            total_users,
            total_new_users,
            total_income,
        })
    }
}
