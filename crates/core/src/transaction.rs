use chrono::NaiveDate;
use md5::{Digest, Md5};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Semi-structured record as delivered by a banking collaborator.
///
/// The core never creates these; text fields arrive noisy and the amount
/// arrives as the bank's decimal text, parsed only during normalization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawTransaction {
    pub date: NaiveDate,
    #[serde(default)]
    pub entry_date: Option<NaiveDate>,
    pub amount: String,
    #[serde(default)]
    pub applicant_name: Option<String>,
    #[serde(default)]
    pub purpose: Option<String>,
}

impl RawTransaction {
    /// Banks report the booking date under `entry_date` once an entry is
    /// settled; provisional records only carry `date`.
    pub fn effective_date(&self) -> NaiveDate {
        self.entry_date.unwrap_or(self.date)
    }
}

/// The cleaned, deduplicated, ready-to-submit transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanonicalTransaction {
    /// Budgeting-app account this transaction belongs to.
    pub destination_id: Uuid,
    pub date: NaiveDate,
    /// Signed integer thousandths of the major currency unit.
    pub amount: i64,
    pub applicant_name: String,
    pub purpose: String,
    pub import_id: String,
    pub cleared: bool,
    pub approved: bool,
}

/// Stable 128-bit fingerprint of a transaction, rendered as 32 hex chars.
///
/// Fingerprinted from the RAW applicant/purpose values, never the cleaned
/// presentation, so editing cleaning rules cannot change the identity of a
/// transaction that was already imported.
pub fn import_id(date: NaiveDate, applicant_name: &str, purpose: &str, amount: i64) -> String {
    let mut hasher = Md5::new();
    hasher.update(date.format("%Y-%m-%d").to_string());
    hasher.update(applicant_name);
    hasher.update(purpose);
    hasher.update(amount.to_string());
    hex::encode(hasher.finalize())
}
