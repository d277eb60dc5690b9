//! Data types shared across the pipeline

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One transaction extracted from a provider email.
///
/// Parsers only emit a record when both `shop` and `amount` were found;
/// `date` stays unset when the source text carried none, and the caller
/// defaults it (typically to the message's receipt date). Category fields
/// are populated later by the resolver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    /// Merchant/payee name, trimmed, never empty
    pub shop: String,
    /// Whole yen, thousands separators removed, non-negative
    pub amount: i64,
    /// Transaction date when the email stated one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<NaiveDate>,
    /// Record as seen but do not submit to the ledger (internal transfers)
    #[serde(default)]
    pub skip: bool,
    /// Set by category resolution
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<i64>,
    /// Set by category resolution
    #[serde(skip_serializing_if = "Option::is_none")]
    pub genre_id: Option<i64>,
}

impl TransactionRecord {
    /// Create a record with just the required fields
    pub fn new(shop: impl Into<String>, amount: i64) -> Self {
        Self {
            shop: shop.into(),
            amount,
            date: None,
            skip: false,
            category_id: None,
            genre_id: None,
        }
    }

    /// Attach a parsed transaction date
    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    /// Apply a resolved category pair
    pub fn with_category(mut self, resolved: ResolvedCategory) -> Self {
        self.category_id = Some(resolved.category_id);
        self.genre_id = Some(resolved.genre_id);
        self
    }
}

/// A (category, genre) pair that is guaranteed to exist in the taxonomy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedCategory {
    pub category_id: i64,
    pub genre_id: i64,
}

/// A fully resolved record shaped for ledger submission
///
/// This is the view the ledger collaborator consumes: date is always set
/// (defaulted by the caller when the email had none) and the comment carries
/// the import marker so entries can be found and cleaned up later.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub date: NaiveDate,
    pub shop: String,
    pub amount: i64,
    pub category_id: i64,
    pub genre_id: i64,
    pub comment: String,
}

impl LedgerEntry {
    /// Build a ledger entry from a resolved record
    ///
    /// Returns None when the record has not been through category resolution;
    /// `default_date` fills in for records whose email carried no date.
    pub fn from_record(
        record: &TransactionRecord,
        default_date: NaiveDate,
        comment: &str,
    ) -> Option<Self> {
        Some(Self {
            date: record.date.unwrap_or(default_date),
            shop: record.shop.clone(),
            amount: record.amount,
            category_id: record.category_id?,
            genre_id: record.genre_id?,
            comment: comment.to_string(),
        })
    }
}
