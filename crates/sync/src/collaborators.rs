use std::collections::HashSet;

use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;

use rinse_core::{AccountConfig, CanonicalTransaction, DateRange, RawTransaction};

/// Failure talking to a bank or budgeting-app collaborator. Account-scoped;
/// the orchestrator contains these so one account cannot sink a whole run.
#[derive(Debug, Error)]
pub enum CollaboratorError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed payload: {0}")]
    Payload(String),
    #[error("transport error: {0}")]
    Transport(String),
}

/// Where raw transactions come from, one fetch per account and window.
#[async_trait]
pub trait TransactionSource: Send + Sync {
    async fn fetch(
        &self,
        account: &AccountConfig,
        range: DateRange,
    ) -> Result<Vec<RawTransaction>, CollaboratorError>;
}

/// Import ids the budgeting app already holds for an account. Fetched once
/// per account at the start of a run and used as the dedup baseline.
#[async_trait]
pub trait ExistingImports: Send + Sync {
    async fn list_existing_import_ids(
        &self,
        account: &AccountConfig,
        since: NaiveDate,
    ) -> Result<HashSet<String>, CollaboratorError>;
}

/// What the destination reports back for a submitted batch: the import ids
/// it created and the ones it rejected as already imported despite our own
/// dedup, e.g. from a previous partially-observed run.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SubmitOutcome {
    pub created: Vec<String>,
    pub duplicates: Vec<String>,
}

/// Final hop into the budgeting app. Only ever called with a non-empty,
/// already-deduplicated batch.
#[async_trait]
pub trait Submitter: Send + Sync {
    async fn submit(
        &self,
        account: &AccountConfig,
        transactions: &[CanonicalTransaction],
    ) -> Result<SubmitOutcome, CollaboratorError>;
}
