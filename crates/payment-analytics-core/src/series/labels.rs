//! Display metadata shared by every series.
//!
//! One table maps each known category key to its label and color. Keys not in
//! the table display as themselves and take a color from [`PALETTE`] by
//! position.

use serde::{Deserialize, Serialize};

use crate::aggregation::grouping::{Dimension, KEY_SEPARATOR};
use crate::aggregation::{OTHERS_KEY, UNKNOWN_KEY};

/// Separator used when rendering composite keys.
pub const COMPOSITE_LABEL_SEPARATOR: &str = " · ";

/// Fallback colors for categories outside the table, assigned by position.
pub const PALETTE: [&str; 6] = ["#FF6384", "#36A2EB", "#FFCE56", "#4BC0C0", "#9966FF", "#FF9F40"];

/// Color of single-series charts.
pub const PRIMARY_COLOR: &str = "#3B82F6";

/// Every category the dashboard has a fixed label and color for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    // methods
    CreditCard,
    DebitCard,
    NetBanking,
    Upi,
    Wallet,
    Emi,
    // emi types
    StandardEmi,
    NoCostEmi,
    ShopseEmi,
    // card types
    Credit,
    Debit,
    // statuses
    Success,
    Failure,
    Pending,
    Refund,
    // synthetic buckets
    Others,
    Unknown,
}

impl Category {
    pub const ALL: [Category; 17] = [
        Category::CreditCard,
        Category::DebitCard,
        Category::NetBanking,
        Category::Upi,
        Category::Wallet,
        Category::Emi,
        Category::StandardEmi,
        Category::NoCostEmi,
        Category::ShopseEmi,
        Category::Credit,
        Category::Debit,
        Category::Success,
        Category::Failure,
        Category::Pending,
        Category::Refund,
        Category::Others,
        Category::Unknown,
    ];

    /// Key as it appears on transactions and in bucket keys.
    pub fn key(&self) -> &'static str {
        match self {
            Category::CreditCard => "creditCard",
            Category::DebitCard => "debitCard",
            Category::NetBanking => "netBanking",
            Category::Upi => "upi",
            Category::Wallet => "wallet",
            Category::Emi => "emi",
            Category::StandardEmi => "standard",
            Category::NoCostEmi => "noCost",
            Category::ShopseEmi => "shopse",
            Category::Credit => "credit",
            Category::Debit => "debit",
            Category::Success => "success",
            Category::Failure => "failure",
            Category::Pending => "pending",
            Category::Refund => "refund",
            Category::Others => OTHERS_KEY,
            Category::Unknown => UNKNOWN_KEY,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Category::CreditCard => "Credit Card",
            Category::DebitCard => "Debit Card",
            Category::NetBanking => "Net Banking",
            Category::Upi => "UPI",
            Category::Wallet => "Wallet",
            Category::Emi => "EMI",
            Category::StandardEmi => "Standard EMI",
            Category::NoCostEmi => "No Cost EMI",
            Category::ShopseEmi => "Shopse",
            Category::Credit => "Credit",
            Category::Debit => "Debit",
            Category::Success => "Success",
            Category::Failure => "Failure",
            Category::Pending => "Pending",
            Category::Refund => "Refund",
            Category::Others => "Others",
            Category::Unknown => "Unknown",
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            Category::CreditCard | Category::Credit => "#8B5CF6",
            Category::DebitCard | Category::Debit => "#EC4899",
            Category::NetBanking => "#06B6D4",
            Category::Upi => "#6366F1",
            Category::Wallet => "#14B8A6",
            Category::Emi => "#F97316",
            Category::StandardEmi => "#3B82F6",
            Category::NoCostEmi => "#10B981",
            Category::ShopseEmi => "#F59E0B",
            Category::Success => "#10B981",
            Category::Failure => "#EF4444",
            Category::Pending => "#F59E0B",
            Category::Refund => "#8B5CF6",
            Category::Others => "#FF9F40",
            Category::Unknown => "#94A3B8",
        }
    }

    pub fn from_key(key: &str) -> Option<Category> {
        Category::ALL.iter().copied().find(|c| c.key() == key)
    }
}

/// Human-readable label of a single category key. The key is taken whole,
/// separators included.
pub fn display_name(key: &str) -> String {
    Category::from_key(key).map_or_else(|| key.to_string(), |c| c.label().to_string())
}

/// Label of a bucket key produced by `dimension`.
///
/// Keys of composite dimensions (`creditCard/noCost`) render each part through
/// the table. The split happens at the first separator only, so a second value
/// containing one stays intact.
pub fn bucket_label(key: &str, dimension: Dimension) -> String {
    if dimension.is_composite() {
        if let Some((first, second)) = key.split_once(KEY_SEPARATOR) {
            return format!("{}{}{}", display_name(first), COMPOSITE_LABEL_SEPARATOR, display_name(second));
        }
    }
    display_name(key)
}

/// Table color of `key`, or the palette entry for `position`.
pub fn color_for(key: &str, position: usize) -> &'static str {
    match Category::from_key(key) {
        Some(c) => c.color(),
        None => PALETTE[position % PALETTE.len()],
    }
}
