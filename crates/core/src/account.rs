use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    #[default]
    Checking,
    Card,
    Holding,
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccountType::Checking => write!(f, "Checking"),
            AccountType::Card => write!(f, "Card"),
            AccountType::Holding => write!(f, "Holding"),
        }
    }
}

impl std::str::FromStr for AccountType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "checking" => Ok(AccountType::Checking),
            "card" => Ok(AccountType::Card),
            "holding" => Ok(AccountType::Holding),
            other => Err(format!("Unknown account type: '{other}'")),
        }
    }
}

/// One bank account and its destination in the budgeting app.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountConfig {
    /// Bank-side identifier, also the dedup scope for fetched records.
    pub iban: String,
    /// Budgeting-app account the canonical transactions are tagged with.
    pub budget_account_id: Uuid,
    #[serde(default)]
    pub account_type: AccountType,
    #[serde(default)]
    pub default_cleared: bool,
    #[serde(default)]
    pub default_approved: bool,
    #[serde(default)]
    pub friendly_name: String,
}

impl fmt::Display for AccountConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tail = if self.iban.len() >= 4 {
            &self.iban[self.iban.len() - 4..]
        } else {
            self.iban.as_str()
        };
        if self.friendly_name.is_empty() {
            write!(f, "{} account (\u{2026}{tail})", self.account_type)
        } else {
            write!(
                f,
                "{} account '{}' (\u{2026}{tail})",
                self.account_type, self.friendly_name
            )
        }
    }
}
