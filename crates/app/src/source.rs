use std::collections::HashSet;
use std::path::PathBuf;

use async_trait::async_trait;
use chrono::NaiveDate;

use rinse_core::{AccountConfig, DateRange, RawTransaction};
use rinse_sync::{CollaboratorError, ExistingImports, TransactionSource};

/// File-backed stand-in for the banking connection: one JSON array of raw
/// records per account at `<dir>/<iban>.json`. Records outside the requested
/// window are filtered here, as the bank would.
pub struct JsonFileSource {
    dir: PathBuf,
}

impl JsonFileSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        JsonFileSource { dir: dir.into() }
    }
}

#[async_trait]
impl TransactionSource for JsonFileSource {
    async fn fetch(
        &self,
        account: &AccountConfig,
        range: DateRange,
    ) -> Result<Vec<RawTransaction>, CollaboratorError> {
        let path = self.dir.join(format!("{}.json", account.iban));
        let text = tokio::fs::read_to_string(&path).await?;
        let records: Vec<RawTransaction> = serde_json::from_str(&text)
            .map_err(|err| CollaboratorError::Payload(format!("{}: {err}", path.display())))?;
        Ok(records
            .into_iter()
            .filter(|record| range.contains(record.effective_date()))
            .collect())
    }
}

/// Destination with no memory; every fetched transaction counts as new.
pub struct NoPriorImports;

#[async_trait]
impl ExistingImports for NoPriorImports {
    async fn list_existing_import_ids(
        &self,
        _account: &AccountConfig,
        _since: NaiveDate,
    ) -> Result<HashSet<String>, CollaboratorError> {
        Ok(HashSet::new())
    }
}
