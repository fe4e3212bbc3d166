//! Append-only JSON ledgers for completed payments and form submissions.
//!
//! Each file holds a JSON array. A completed checkout adds one entry to each
//! file under a single writer: both new arrays are staged to sibling temp
//! files, then renamed into place. If the second rename fails the first file
//! is restored, so the two ledgers never disagree.

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::Mutex;

use crate::{
    config::AppConfig,
    error::AppResult,
    models::{PaymentRecord, SubmissionRecord},
};

#[derive(Debug, Clone)]
pub struct Ledger {
    payments_path: PathBuf,
    submissions_path: PathBuf,
    writer: Arc<Mutex<()>>,
}

/// A new file version written next to its target, not yet renamed.
struct Staged<'a> {
    path: &'a Path,
    tmp: PathBuf,
    previous: Option<Vec<u8>>,
}

impl Ledger {
    pub fn new(payments_path: impl Into<PathBuf>, submissions_path: impl Into<PathBuf>) -> Self {
        Self {
            payments_path: payments_path.into(),
            submissions_path: submissions_path.into(),
            writer: Arc::new(Mutex::new(())),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.payments_path(), config.submissions_path())
    }

    /// Appends one payment and its submission. A ledger that already holds
    /// the intent id is left alone, so a retried confirmation adds nothing.
    /// Returns `false` when both entries were already present.
    pub async fn record_completed(
        &self,
        payment: &PaymentRecord,
        submission: &SubmissionRecord,
    ) -> AppResult<bool> {
        let _guard = self.writer.lock().await;
        let intent_id = payment.payment_intent_id.as_str();

        let targets = [
            (self.payments_path.as_path(), serde_json::to_value(payment)?),
            (self.submissions_path.as_path(), serde_json::to_value(submission)?),
        ];

        let mut pending = Vec::new();
        for (path, record) in targets {
            let previous = read_raw(path).await?;
            let mut entries = parse_array(previous.as_deref())?;
            if contains_intent(&entries, intent_id) {
                tracing::debug!(path = %path.display(), payment_intent = %intent_id, "already recorded");
                continue;
            }
            entries.push(record);
            pending.push((path, previous, entries));
        }
        if pending.is_empty() {
            return Ok(false);
        }

        let mut staged = Vec::with_capacity(pending.len());
        for (path, previous, entries) in pending {
            match stage(path, &entries).await {
                Ok(tmp) => staged.push(Staged {
                    path,
                    tmp,
                    previous,
                }),
                Err(err) => {
                    discard_staged(&staged).await;
                    return Err(err);
                }
            }
        }

        for (done, file) in staged.iter().enumerate() {
            if let Err(err) = tokio::fs::rename(&file.tmp, file.path).await {
                tracing::error!(path = %file.path.display(), error = %err, "ledger commit failed, rolling back");
                restore(&staged[..done]).await;
                discard_staged(&staged[done..]).await;
                return Err(err.into());
            }
        }

        tracing::debug!(payment_intent = %intent_id, files = staged.len(), "ledger appended");
        Ok(true)
    }

    pub async fn payments(&self) -> AppResult<Vec<PaymentRecord>> {
        read_typed(&self.payments_path).await
    }

    pub async fn submissions(&self) -> AppResult<Vec<SubmissionRecord>> {
        read_typed(&self.submissions_path).await
    }
}

async fn read_raw(path: &Path) -> AppResult<Option<Vec<u8>>> {
    match tokio::fs::read(path).await {
        Ok(raw) => Ok(Some(raw)),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(err.into()),
    }
}

fn parse_array(raw: Option<&[u8]>) -> AppResult<Vec<Value>> {
    match raw {
        Some(raw) if !raw.trim_ascii().is_empty() => Ok(serde_json::from_slice(raw)?),
        _ => Ok(Vec::new()),
    }
}

fn contains_intent(entries: &[Value], intent_id: &str) -> bool {
    entries
        .iter()
        .any(|entry| entry.get("paymentIntentId").and_then(Value::as_str) == Some(intent_id))
}

async fn read_typed<T: DeserializeOwned>(path: &Path) -> AppResult<Vec<T>> {
    parse_array(read_raw(path).await?.as_deref())?
        .into_iter()
        .map(|value| serde_json::from_value(value).map_err(Into::into))
        .collect()
}

fn temp_path(path: &Path) -> PathBuf {
    path.with_extension("json.tmp")
}

async fn stage(path: &Path, entries: &[Value]) -> AppResult<PathBuf> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    let tmp = temp_path(path);
    if let Err(err) = tokio::fs::write(&tmp, serde_json::to_vec_pretty(entries)?).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(err.into());
    }
    Ok(tmp)
}

async fn discard_staged(staged: &[Staged<'_>]) {
    for file in staged {
        if let Err(err) = tokio::fs::remove_file(&file.tmp).await {
            tracing::warn!(path = %file.tmp.display(), error = %err, "could not remove staged ledger");
        }
    }
}

/// Puts committed files back to their content before this append.
async fn restore(committed: &[Staged<'_>]) {
    for file in committed {
        let result = match &file.previous {
            Some(raw) => tokio::fs::write(file.path, raw).await,
            None => tokio::fs::remove_file(file.path).await,
        };
        if let Err(err) = result {
            tracing::error!(path = %file.path.display(), error = %err, "ledger rollback failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use chrono::Utc;
    use rust_decimal::Decimal;

    use super::*;
    use crate::models::{CustomerInfo, OrderDetails, SubmittedForm};

    fn payment(id: &str) -> PaymentRecord {
        PaymentRecord {
            payment_intent_id: id.to_string(),
            amount: Decimal::new(5460, 2),
            currency: "eur".into(),
            status: "completed".into(),
            customer_info: CustomerInfo::default(),
            order_details: OrderDetails {
                deposit_code: Some("DV001".into()),
                doctor_name: Some("Dr. Martin".into()),
                products: Vec::new(),
                order_date: "2026-10-16".into(),
                order_time: "10:00:00".into(),
                total_amount: Decimal::new(5460, 2),
                has_uploaded_file: false,
                uploaded_file_name: None,
            },
            payment_method: None,
            processor_metadata: HashMap::new(),
            created_at: Utc::now(),
            paid_at: None,
        }
    }

    fn submission(id: &str) -> SubmissionRecord {
        SubmissionRecord {
            payment_intent_id: id.to_string(),
            form: SubmittedForm {
                deposit_code: Some("DV001".into()),
                doctor_name: None,
                full_name: "Jane".into(),
                email: "jane@example.com".into(),
                address: String::new(),
                products: Vec::new(),
            },
            document_file: None,
            payment_amount: Decimal::new(5460, 2),
            submitted_at: Utc::now(),
            status: "completed".into(),
        }
    }

    fn ledger_in(dir: &Path) -> Ledger {
        Ledger::new(dir.join("payments.json"), dir.join("submissions.json"))
    }

    #[tokio::test]
    async fn empty_or_missing_files_read_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = ledger_in(dir.path());
        assert!(ledger.payments().await.unwrap().is_empty());

        tokio::fs::write(dir.path().join("payments.json"), "  \n").await.unwrap();
        assert!(ledger.payments().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn appends_keep_previous_entries() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = ledger_in(dir.path());

        ledger.record_completed(&payment("pi_1"), &submission("pi_1")).await.unwrap();
        ledger.record_completed(&payment("pi_2"), &submission("pi_2")).await.unwrap();

        let ids: Vec<String> = ledger
            .payments()
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.payment_intent_id)
            .collect();
        assert_eq!(ids, vec!["pi_1", "pi_2"]);
        assert_eq!(ledger.submissions().await.unwrap().len(), 2);
        assert!(!dir.path().join("payments.json.tmp").exists());
    }

    #[tokio::test]
    async fn concurrent_appends_are_not_lost() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = ledger_in(dir.path());

        let mut handles = Vec::new();
        for i in 0..16 {
            let ledger = ledger.clone();
            handles.push(tokio::spawn(async move {
                let id = format!("pi_{i}");
                ledger.record_completed(&payment(&id), &submission(&id)).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(ledger.payments().await.unwrap().len(), 16);
        assert_eq!(ledger.submissions().await.unwrap().len(), 16);
    }

    #[tokio::test]
    async fn unreadable_submissions_leave_payments_untouched() {
        let dir = tempfile::tempdir().unwrap();
        tokio::fs::create_dir(dir.path().join("submissions.json")).await.unwrap();
        let ledger = ledger_in(dir.path());

        for _ in 0..2 {
            ledger
                .record_completed(&payment("pi_1"), &submission("pi_1"))
                .await
                .unwrap_err();
        }
        assert!(!dir.path().join("payments.json").exists());
        assert!(!dir.path().join("payments.json.tmp").exists());
    }

    #[tokio::test]
    async fn failed_staging_discards_the_other_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = ledger_in(dir.path());
        ledger.record_completed(&payment("pi_1"), &submission("pi_1")).await.unwrap();
        tokio::fs::create_dir(dir.path().join("submissions.json.tmp")).await.unwrap();

        ledger
            .record_completed(&payment("pi_2"), &submission("pi_2"))
            .await
            .unwrap_err();

        assert_eq!(ledger.payments().await.unwrap().len(), 1);
        assert_eq!(ledger.submissions().await.unwrap().len(), 1);
        assert!(!dir.path().join("payments.json.tmp").exists());
    }

    #[tokio::test]
    async fn retried_completion_is_recorded_once() {
        let dir = tempfile::tempdir().unwrap();
        let ledger = ledger_in(dir.path());

        assert!(ledger.record_completed(&payment("pi_1"), &submission("pi_1")).await.unwrap());
        assert!(!ledger.record_completed(&payment("pi_1"), &submission("pi_1")).await.unwrap());

        assert_eq!(ledger.payments().await.unwrap().len(), 1);
        assert_eq!(ledger.submissions().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn missing_half_is_completed_on_retry() {
        let dir = tempfile::tempdir().unwrap();
        let existing = serde_json::to_vec(&vec![payment("pi_1")]).unwrap();
        tokio::fs::write(dir.path().join("payments.json"), existing).await.unwrap();
        let ledger = ledger_in(dir.path());

        assert!(ledger.record_completed(&payment("pi_1"), &submission("pi_1")).await.unwrap());

        assert_eq!(ledger.payments().await.unwrap().len(), 1);
        let submissions = ledger.submissions().await.unwrap();
        assert_eq!(submissions.len(), 1);
        assert_eq!(submissions[0].payment_intent_id, "pi_1");
    }

    #[tokio::test]
    async fn corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        tokio::fs::write(dir.path().join("payments.json"), "{not json").await.unwrap();
        let ledger = ledger_in(dir.path());

        let err = ledger
            .record_completed(&payment("pi_1"), &submission("pi_1"))
            .await
            .unwrap_err();
        assert!(matches!(err, crate::error::AppError::Json(_)));
    }
}
