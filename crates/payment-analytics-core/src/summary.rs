//! Summary cards shown above every chart.

use serde::{Deserialize, Serialize};

use crate::aggregation::bucket::{BucketSums, Tally};
use crate::model::{PaymentStatus, Transaction};
use crate::types::{count_percent, percent_of, Money, Percent};

/// Headline figure for one status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusSummary {
    pub status: PaymentStatus,
    pub count: u64,
    pub amount: Money,
    /// Share of all transactions by count.
    pub percent: Percent,
    /// Share of total volume.
    pub volume_percent: Percent,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardSummary {
    pub transaction_count: u64,
    pub total_volume: Money,
    pub statuses: Vec<StatusSummary>,
    /// Status `refund` as a share of all transactions by count.
    pub refund_percent: Percent,
    /// Flagged `is_refunded` after the fact, whatever the status.
    pub refunded_overlay: Tally,
    pub policy_count: u64,
}

impl DashboardSummary {
    pub fn status(&self, status: PaymentStatus) -> Option<&StatusSummary> {
        self.statuses.iter().find(|s| s.status == status)
    }
}

/// Summarize an already filtered collection.
pub fn summarize(transactions: &[Transaction]) -> DashboardSummary {
    let mut sums = BucketSums::default();
    for tx in transactions {
        sums.record(tx);
    }

    let statuses = PaymentStatus::ALL
        .iter()
        .map(|&status| {
            let tally = sums.status(status);
            StatusSummary {
                status,
                count: tally.count,
                amount: tally.amount,
                percent: count_percent(tally.count, sums.count()),
                volume_percent: percent_of(tally.amount, sums.total_amount()),
            }
        })
        .collect();

    DashboardSummary {
        transaction_count: sums.count(),
        total_volume: sums.total_amount(),
        statuses,
        refund_percent: count_percent(sums.status(PaymentStatus::Refund).count, sums.count()),
        refunded_overlay: sums.refunded_overlay(),
        policy_count: sums.policy_count(),
    }
}
