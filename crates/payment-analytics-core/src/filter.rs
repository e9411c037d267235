//! Transaction filter.
//!
//! A conjunction of per-field predicates. Every field is a [`Selection`]: an
//! empty selection is unconstrained and matches everything.
//!
//! The EMI rules are the only cross-field logic and live in their own named
//! predicates:
//! 1. **Shopse exclusivity** -- selecting `shopse` restricts the result to the
//!    shopse lane, where method and card-type filters no longer apply.
//! 2. **EMI auto-widening** -- selecting an EMI plan without selecting a
//!    compatible method implies all EMI-eligible methods.

use chrono::{Duration, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use tracing::debug;

use crate::error::AnalyticsError;
use crate::model::{PaymentMethod, PaymentStatus, Transaction, SHOPSE};
use crate::types::Money;
use crate::AnalyticsResult;

// ---------------------------------------------------------------------------
// Selection
// ---------------------------------------------------------------------------

/// A set of accepted values. Deserializes from `null`, a single value or a list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Selection<T>(Vec<T>);

impl<T> Default for Selection<T> {
    fn default() -> Self {
        Selection(Vec::new())
    }
}

impl<T: PartialEq> Selection<T> {
    pub fn any() -> Self {
        Selection(Vec::new())
    }

    pub fn of(values: impl IntoIterator<Item = T>) -> Self {
        Selection(values.into_iter().collect())
    }

    pub fn is_unconstrained(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, value: &T) -> bool {
        self.0.contains(value)
    }

    pub fn values(&self) -> &[T] {
        &self.0
    }
}

impl Selection<String> {
    /// Membership for an optional field. A missing value only matches when
    /// the selection is unconstrained.
    pub fn matches(&self, value: Option<&str>) -> bool {
        self.is_unconstrained() || value.is_some_and(|v| self.0.iter().any(|s| s == v))
    }

    pub fn contains_str(&self, value: &str) -> bool {
        self.0.iter().any(|s| s == value)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Selection<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw: Option<OneOrMany<T>> = Option::deserialize(deserializer)?;
        Ok(match raw {
            None => Selection(Vec::new()),
            Some(OneOrMany::One(v)) => Selection(vec![v]),
            Some(OneOrMany::Many(v)) => Selection(v),
        })
    }
}

// ---------------------------------------------------------------------------
// Criteria
// ---------------------------------------------------------------------------

/// Inclusive calendar-day window. Either bound may be open.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    #[serde(default)]
    pub from: Option<NaiveDate>,
    #[serde(default)]
    pub to: Option<NaiveDate>,
}

impl DateRange {
    pub fn between(from: NaiveDate, to: NaiveDate) -> Self {
        Self {
            from: Some(from),
            to: Some(to),
        }
    }

    /// The `days`-day window ending on `anchor` (the 7d / 30d / 90d pickers).
    pub fn last_n_days(anchor: NaiveDate, days: u32) -> Self {
        let span = i64::from(days.max(1)) - 1;
        Self::between(anchor - Duration::days(span), anchor)
    }

    pub fn contains(&self, day: NaiveDate) -> bool {
        self.from.map_or(true, |f| day >= f) && self.to.map_or(true, |t| day <= t)
    }
}

/// Filter configuration. Empty fields are unconstrained.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterCriteria {
    #[serde(alias = "dateRange")]
    pub date_range: DateRange,
    #[serde(alias = "businessTypes")]
    pub business_types: Selection<String>,
    #[serde(alias = "lineOfBusiness", alias = "lobs")]
    pub lines_of_business: Selection<String>,
    pub insurers: Selection<String>,
    pub gateways: Selection<String>,
    pub methods: Selection<String>,
    #[serde(alias = "emiTypes")]
    pub emi_types: Selection<String>,
    #[serde(alias = "cardTypes")]
    pub card_types: Selection<String>,
    pub statuses: Selection<PaymentStatus>,
}

// ---------------------------------------------------------------------------
// Filtering
// ---------------------------------------------------------------------------

/// Validate the collection and keep the transactions matching `criteria`.
///
/// Structurally invalid records (negative amount, empty id) and an inverted
/// date range are rejected before any matching happens. A kept set whose
/// amounts cannot be summed without overflowing `Decimal` is rejected after.
pub fn filter_transactions(
    transactions: &[Transaction],
    criteria: &FilterCriteria,
) -> AnalyticsResult<Vec<Transaction>> {
    validate_criteria(criteria)?;
    for tx in transactions {
        validate_transaction(tx)?;
    }

    let kept: Vec<Transaction> = transactions
        .iter()
        .filter(|tx| matches_criteria(tx, criteria))
        .cloned()
        .collect();
    checked_total(&kept)?;

    debug!(
        input = transactions.len(),
        kept = kept.len(),
        shopse_exclusive = is_shopse_exclusive(criteria),
        "filtered transactions"
    );
    Ok(kept)
}

/// Full predicate for a single (already validated) transaction.
pub fn matches_criteria(tx: &Transaction, criteria: &FilterCriteria) -> bool {
    if !matches_common(tx, criteria) {
        return false;
    }
    if is_shopse_exclusive(criteria) {
        // Shopse lane: only the common filters above apply.
        return tx.is_shopse();
    }
    matches_emi_selection(tx, criteria) && criteria.card_types.matches(tx.effective_card_type())
}

/// Filters that apply in every lane: date, business, LOB, insurer, gateway, status.
fn matches_common(tx: &Transaction, c: &FilterCriteria) -> bool {
    c.date_range.contains(tx.day())
        && c.business_types.matches(tx.business_type.as_deref())
        && c.lines_of_business.matches(tx.line_of_business.as_deref())
        && c.insurers.matches(tx.insurer.as_deref())
        && c.gateways.matches(tx.gateway.as_deref())
        && matches_status(tx, &c.statuses)
}

/// Plain membership on `status`. The `is_refunded` overlay plays no part.
pub fn matches_status(tx: &Transaction, statuses: &Selection<PaymentStatus>) -> bool {
    statuses.is_unconstrained() || statuses.contains(&tx.status)
}

/// Whether the method can carry a standard / no-cost EMI plan.
pub fn is_emi_eligible(method: Option<&str>) -> bool {
    method
        .and_then(|m| m.parse::<PaymentMethod>().ok())
        .is_some_and(|m| m.is_emi_eligible())
}

/// Shopse is selected, which makes the EMI filter exclusive to that lane.
pub fn is_shopse_exclusive(criteria: &FilterCriteria) -> bool {
    criteria.emi_types.contains_str(SHOPSE)
}

/// Methods an EMI-plan filter accepts: the EMI-eligible methods the user
/// selected, or every EMI-eligible method when none was selected.
pub fn emi_auto_widened_methods(methods: &Selection<String>) -> Vec<PaymentMethod> {
    let selected: Vec<PaymentMethod> = PaymentMethod::EMI_ELIGIBLE
        .iter()
        .copied()
        .filter(|m| methods.contains_str(m.as_str()))
        .collect();
    if selected.is_empty() {
        PaymentMethod::EMI_ELIGIBLE.to_vec()
    } else {
        selected
    }
}

/// Method and EMI-type rules outside the shopse lane.
pub fn matches_emi_selection(tx: &Transaction, criteria: &FilterCriteria) -> bool {
    if criteria.emi_types.is_unconstrained() {
        return criteria.methods.matches(tx.method.as_deref());
    }
    let Some(method) = tx.payment_method() else {
        return false;
    };
    if !method.is_emi_eligible() || !emi_auto_widened_methods(&criteria.methods).contains(&method) {
        return false;
    }
    criteria.emi_types.matches(tx.effective_emi_type())
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

pub fn validate_criteria(criteria: &FilterCriteria) -> AnalyticsResult<()> {
    if let (Some(from), Some(to)) = (criteria.date_range.from, criteria.date_range.to) {
        if from > to {
            return Err(AnalyticsError::InvalidInput {
                field: "date_range".into(),
                reason: format!("from ({from}) must not be after to ({to})"),
            });
        }
    }
    Ok(())
}

pub fn validate_transaction(tx: &Transaction) -> AnalyticsResult<()> {
    if tx.id.trim().is_empty() {
        return Err(AnalyticsError::InvalidTransaction {
            id: "<empty>".into(),
            reason: "Transaction id must not be empty".into(),
        });
    }
    if tx.amount < Decimal::ZERO {
        return Err(AnalyticsError::InvalidTransaction {
            id: tx.id.clone(),
            reason: format!("Amount cannot be negative, got {}", tx.amount),
        });
    }
    Ok(())
}

/// Sum of all amounts. Every bucket, status tally and sub-breakdown total is a
/// sum over a subset of these non-negative amounts, so none of them can
/// overflow once this succeeds.
pub fn checked_total(transactions: &[Transaction]) -> AnalyticsResult<Money> {
    transactions.iter().try_fold(Decimal::ZERO, |acc, tx| {
        acc.checked_add(tx.amount).ok_or_else(|| AnalyticsError::InvalidInput {
            field: "amount".into(),
            reason: format!(
                "Total volume exceeds the representable range at transaction {}",
                tx.id
            ),
        })
    })
}
