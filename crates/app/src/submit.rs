use async_trait::async_trait;
use tracing::info;

use rinse_core::{AccountConfig, CanonicalTransaction};
use rinse_sync::{CollaboratorError, SubmitOutcome, Submitter};

/// Budgeting apps cap the payee name; longer values are cut at the
/// submission boundary, counted in characters.
const MAX_PAYEE_LEN: usize = 50;

/// Logging submitter, also the dry-run backend. Prints one line per
/// transaction in the batch; with `dry_run` set, nothing counts as created.
pub struct LogSubmitter {
    dry_run: bool,
}

impl LogSubmitter {
    pub fn new(dry_run: bool) -> Self {
        LogSubmitter { dry_run }
    }
}

#[async_trait]
impl Submitter for LogSubmitter {
    async fn submit(
        &self,
        account: &AccountConfig,
        transactions: &[CanonicalTransaction],
    ) -> Result<SubmitOutcome, CollaboratorError> {
        let prefix = if self.dry_run { "would submit" } else { "submitting" };
        for txn in transactions {
            info!(
                "{prefix} [{}] {} {:>12} {:?} {:?} ({})",
                account.iban,
                txn.date,
                format_amount(txn.amount),
                clamp_payee(&txn.applicant_name),
                txn.purpose,
                txn.import_id,
            );
        }
        if self.dry_run {
            return Ok(SubmitOutcome::default());
        }
        let created: Vec<String> = transactions
            .iter()
            .map(|txn| txn.import_id.clone())
            .collect();
        info!("[{}] created: {}", account.iban, created.join(", "));
        Ok(SubmitOutcome {
            created,
            duplicates: Vec::new(),
        })
    }
}

/// Truncate a payee name to the destination's limit, by characters.
fn clamp_payee(name: &str) -> String {
    name.chars().take(MAX_PAYEE_LEN).collect()
}

/// Render integer minor units (thousandths) as a signed decimal string.
fn format_amount(minor: i64) -> String {
    let sign = if minor < 0 { "-" } else { "" };
    let magnitude = minor.unsigned_abs();
    format!("{sign}{}.{:03}", magnitude / 1000, magnitude % 1000)
}
