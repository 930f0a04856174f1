use std::sync::Arc;

use chrono::NaiveDate;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use rinse_clean::FieldCleaner;
use rinse_core::{AccountConfig, DateRange};

use crate::collaborators::{
    CollaboratorError, ExistingImports, Submitter, TransactionSource,
};
use crate::normalize::normalize;

/// Runs a sync across all configured accounts: fetch, normalize, dedup,
/// submit, with per-account fan-out bounded by `concurrency`.
pub struct SyncEngine {
    source: Arc<dyn TransactionSource>,
    imports: Arc<dyn ExistingImports>,
    submitter: Arc<dyn Submitter>,
    cleaner: Arc<FieldCleaner>,
    concurrency: usize,
}

/// What happened to one account during a run.
#[derive(Debug, Clone, Default)]
pub struct AccountReport {
    pub account: String,
    pub fetched: usize,
    pub skipped_existing: usize,
    pub skipped_future: usize,
    pub skipped_invalid: usize,
    pub submitted: usize,
    pub duplicates: usize,
    pub failed: bool,
}

/// Per-account reports in configuration order.
#[derive(Debug, Clone, Default)]
pub struct SyncReport {
    pub accounts: Vec<AccountReport>,
}

impl SyncReport {
    pub fn total_submitted(&self) -> usize {
        self.accounts.iter().map(|a| a.submitted).sum()
    }

    pub fn failures(&self) -> usize {
        self.accounts.iter().filter(|a| a.failed).count()
    }
}

impl SyncEngine {
    pub fn new(
        source: Arc<dyn TransactionSource>,
        imports: Arc<dyn ExistingImports>,
        submitter: Arc<dyn Submitter>,
        cleaner: Arc<FieldCleaner>,
        concurrency: usize,
    ) -> Self {
        SyncEngine {
            source,
            imports,
            submitter,
            cleaner,
            concurrency,
        }
    }

    /// Sync every account over `range`. Accounts run concurrently up to the
    /// configured limit; a failing account is reported as failed and never
    /// aborts the others. Reports come back in configuration order.
    pub async fn run(
        &self,
        accounts: &[AccountConfig],
        range: DateRange,
        today: NaiveDate,
    ) -> SyncReport {
        let semaphore = Arc::new(Semaphore::new(self.concurrency.max(1)));
        let mut handles = Vec::with_capacity(accounts.len());

        for account in accounts {
            let source = Arc::clone(&self.source);
            let imports = Arc::clone(&self.imports);
            let submitter = Arc::clone(&self.submitter);
            let cleaner = Arc::clone(&self.cleaner);
            let semaphore = Arc::clone(&semaphore);
            let account = account.clone();
            let label = account.to_string();
            let handle = tokio::spawn(async move {
                // The gate outlives every task, so acquisition cannot fail.
                let _permit = semaphore.acquire_owned().await.ok();
                process_account(source, imports, submitter, cleaner, account, range, today).await
            });
            handles.push((label, handle));
        }

        let mut report = SyncReport::default();
        for (label, handle) in handles {
            match handle.await {
                Ok(account_report) => report.accounts.push(account_report),
                Err(err) => {
                    warn!("{label}: sync task aborted: {err}");
                    report.accounts.push(AccountReport {
                        account: label,
                        failed: true,
                        ..Default::default()
                    });
                }
            }
        }
        report
    }
}

async fn process_account(
    source: Arc<dyn TransactionSource>,
    imports: Arc<dyn ExistingImports>,
    submitter: Arc<dyn Submitter>,
    cleaner: Arc<FieldCleaner>,
    account: AccountConfig,
    range: DateRange,
    today: NaiveDate,
) -> AccountReport {
    let label = account.to_string();
    match sync_account(source, imports, submitter, cleaner, &account, range, today).await {
        Ok(report) => report,
        Err(err) => {
            warn!("{label}: sync failed: {err}");
            AccountReport {
                account: label,
                failed: true,
                ..Default::default()
            }
        }
    }
}

async fn sync_account(
    source: Arc<dyn TransactionSource>,
    imports: Arc<dyn ExistingImports>,
    submitter: Arc<dyn Submitter>,
    cleaner: Arc<FieldCleaner>,
    account: &AccountConfig,
    range: DateRange,
    today: NaiveDate,
) -> Result<AccountReport, CollaboratorError> {
    let mut report = AccountReport {
        account: account.to_string(),
        ..Default::default()
    };

    // Seeded with the app's known ids, then grown per accepted record so a
    // duplicate inside one fetch is caught the same way.
    let mut seen = imports.list_existing_import_ids(account, range.start).await?;
    let records = source.fetch(account, range).await?;
    report.fetched = records.len();
    info!("{}: fetched {} records for {range}", report.account, report.fetched);

    let mut batch = Vec::new();
    for record in &records {
        match normalize(record, account, &cleaner, today) {
            Ok(Some(txn)) => {
                if seen.insert(txn.import_id.clone()) {
                    batch.push(txn);
                } else {
                    report.skipped_existing += 1;
                }
            }
            Ok(None) => report.skipped_future += 1,
            Err(err) => {
                debug!(
                    "{}: skipping record dated {}: {err}",
                    report.account,
                    record.effective_date()
                );
                report.skipped_invalid += 1;
            }
        }
    }

    if batch.is_empty() {
        info!("{}: nothing new to submit", report.account);
        return Ok(report);
    }

    let outcome = submitter.submit(account, &batch).await?;
    report.submitted = outcome.created.len();
    report.duplicates = outcome.duplicates.len();
    info!(
        "{}: submitted {} transactions ({} duplicates)",
        report.account, report.submitted, report.duplicates
    );
    Ok(report)
}
