//! Transaction record and the categorical vocabulary it is built from.
//!
//! Categorical fields stay as strings on the record: values outside the known
//! vocabulary are legal and end up in their own (or the `"Unknown"`) bucket
//! rather than failing deserialization. The enums here describe the values the
//! engine applies business rules to.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::types::Money;

/// EMI type that is not tied to a card or installment method.
pub const SHOPSE: &str = "shopse";

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Processing outcome of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Success,
    #[serde(alias = "failed")]
    Failure,
    Pending,
    #[serde(alias = "refunded")]
    Refund,
}

impl PaymentStatus {
    pub const ALL: [PaymentStatus; 4] = [
        PaymentStatus::Success,
        PaymentStatus::Failure,
        PaymentStatus::Pending,
        PaymentStatus::Refund,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Success => "success",
            PaymentStatus::Failure => "failure",
            PaymentStatus::Pending => "pending",
            PaymentStatus::Refund => "refund",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Payment method
// ---------------------------------------------------------------------------

/// Payment methods the dashboard knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PaymentMethod {
    CreditCard,
    DebitCard,
    NetBanking,
    Upi,
    Wallet,
    Emi,
}

impl PaymentMethod {
    /// Methods that can carry a standard / no-cost EMI plan.
    pub const EMI_ELIGIBLE: [PaymentMethod; 3] = [
        PaymentMethod::CreditCard,
        PaymentMethod::DebitCard,
        PaymentMethod::Emi,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::CreditCard => "creditCard",
            PaymentMethod::DebitCard => "debitCard",
            PaymentMethod::NetBanking => "netBanking",
            PaymentMethod::Upi => "upi",
            PaymentMethod::Wallet => "wallet",
            PaymentMethod::Emi => "emi",
        }
    }

    pub fn is_emi_eligible(&self) -> bool {
        Self::EMI_ELIGIBLE.contains(self)
    }

    /// Card type implied by the method itself.
    pub fn implied_card_type(&self) -> Option<&'static str> {
        match self {
            PaymentMethod::CreditCard => Some("credit"),
            PaymentMethod::DebitCard => Some("debit"),
            _ => None,
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "creditCard" => Ok(PaymentMethod::CreditCard),
            "debitCard" => Ok(PaymentMethod::DebitCard),
            "netBanking" => Ok(PaymentMethod::NetBanking),
            "upi" => Ok(PaymentMethod::Upi),
            "wallet" => Ok(PaymentMethod::Wallet),
            "emi" => Ok(PaymentMethod::Emi),
            other => Err(format!("Unknown payment method: {other}")),
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Transaction
// ---------------------------------------------------------------------------

/// A single payment transaction as delivered by the data source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: String,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub date: NaiveDateTime,
    pub amount: Money,
    #[serde(default, alias = "paymentGateway")]
    pub gateway: Option<String>,
    #[serde(default, alias = "paymentMethod")]
    pub method: Option<String>,
    #[serde(default, alias = "emiType")]
    pub emi_type: Option<String>,
    #[serde(default, alias = "cardType")]
    pub card_type: Option<String>,
    pub status: PaymentStatus,
    #[serde(default, alias = "isRefunded")]
    pub is_refunded: bool,
    #[serde(default, alias = "failureReason")]
    pub failure_reason: Option<String>,
    #[serde(default, alias = "businessType")]
    pub business_type: Option<String>,
    #[serde(default, alias = "lob", alias = "lineOfBusiness")]
    pub line_of_business: Option<String>,
    #[serde(default)]
    pub insurer: Option<String>,
    #[serde(default, alias = "hasPolicy")]
    pub has_policy: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub utr: Option<String>,
    #[serde(default, alias = "leadId", skip_serializing_if = "Option::is_none")]
    pub lead_id: Option<String>,
}

impl Transaction {
    /// Minimal record; everything optional left empty.
    pub fn new(id: impl Into<String>, date: NaiveDateTime, amount: Money, status: PaymentStatus) -> Self {
        Self {
            id: id.into(),
            date,
            amount,
            gateway: None,
            method: None,
            emi_type: None,
            card_type: None,
            status,
            is_refunded: false,
            failure_reason: None,
            business_type: None,
            line_of_business: None,
            insurer: None,
            has_policy: false,
            utr: None,
            lead_id: None,
        }
    }

    pub fn day(&self) -> NaiveDate {
        self.date.date()
    }

    pub fn payment_method(&self) -> Option<PaymentMethod> {
        self.method.as_deref().and_then(|m| m.parse().ok())
    }

    pub fn has_emi_eligible_method(&self) -> bool {
        self.payment_method()
            .map(|m| m.is_emi_eligible())
            .unwrap_or(false)
    }

    pub fn is_shopse(&self) -> bool {
        self.emi_type.as_deref() == Some(SHOPSE)
    }

    /// EMI type as the engine sees it: shopse on any method, other plans only
    /// on EMI-eligible methods.
    pub fn effective_emi_type(&self) -> Option<&str> {
        match self.emi_type.as_deref() {
            Some(SHOPSE) => Some(SHOPSE),
            Some(t) if self.has_emi_eligible_method() => Some(t),
            _ => None,
        }
    }

    /// True when an EMI type is present but not meaningful for the method.
    pub fn has_ignored_emi_type(&self) -> bool {
        self.emi_type.is_some() && self.effective_emi_type().is_none()
    }

    /// Explicit card type, else the one implied by a card method.
    pub fn effective_card_type(&self) -> Option<&str> {
        match self.card_type.as_deref() {
            Some(ct) => Some(ct),
            None => self.payment_method().and_then(|m| m.implied_card_type()),
        }
    }

    /// Failure reason, only for failed transactions.
    pub fn effective_failure_reason(&self) -> Option<&str> {
        if self.status == PaymentStatus::Failure {
            self.failure_reason.as_deref()
        } else {
            None
        }
    }

    pub fn has_ignored_failure_reason(&self) -> bool {
        self.failure_reason.is_some() && self.status != PaymentStatus::Failure
    }
}

// ---------------------------------------------------------------------------
// Timestamp parsing
// ---------------------------------------------------------------------------

/// Parse `YYYY-MM-DD`, `YYYY-MM-DDTHH:MM:SS[.fff]` (space separator allowed)
/// or RFC 3339. Offset timestamps are normalised to UTC.
pub fn parse_timestamp(raw: &str) -> Result<NaiveDateTime, String> {
    let s = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.naive_utc());
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(dt);
        }
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(d.and_time(NaiveTime::MIN));
    }
    Err(format!(
        "invalid transaction date '{raw}': expected YYYY-MM-DD, YYYY-MM-DDTHH:MM:SS or RFC 3339"
    ))
}

fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw).map_err(serde::de::Error::custom)
}
