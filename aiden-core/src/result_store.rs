//! Encrypt-on-write / decrypt-on-read access to scan findings and emails.

use std::{fmt, sync::Arc};

use aiden_model::{Finding, PhishingEmail, ScanEmail, ScanId};
use serde::{Serialize, de::DeserializeOwned};
use tracing::warn;

use crate::crypto::PayloadCipher;
use crate::database::ports::{
    NewFinding, ScanEmailRecord, ScanEmailsRepository, ScansRepository,
};
use crate::error::{AidenError, Result};
use crate::ranking::RankedFinding;

/// Serialize `value` to JSON and encrypt it.
pub fn seal_json<T: Serialize + ?Sized>(
    cipher: &PayloadCipher,
    value: &T,
) -> Result<String> {
    let json = serde_json::to_string(value)?;
    Ok(cipher.encrypt(&json)?)
}

/// Decrypt and parse a payload produced by [`seal_json`].
pub fn open_json<T: DeserializeOwned>(
    cipher: &PayloadCipher,
    sealed: &str,
) -> Result<T> {
    let json = cipher.decrypt(sealed)?;
    serde_json::from_str(&json).map_err(|e| {
        AidenError::Decryption(format!("decrypted payload is not valid: {e}"))
    })
}

#[derive(Clone)]
pub struct ResultStore {
    scans: Arc<dyn ScansRepository>,
    scan_emails: Arc<dyn ScanEmailsRepository>,
    cipher: Arc<PayloadCipher>,
}

impl fmt::Debug for ResultStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResultStore")
            .field("scans_repo", &Arc::strong_count(&self.scans))
            .field("cipher", &self.cipher)
            .finish()
    }
}

impl ResultStore {
    pub fn new(
        scans: Arc<dyn ScansRepository>,
        scan_emails: Arc<dyn ScanEmailsRepository>,
        cipher: Arc<PayloadCipher>,
    ) -> Self {
        Self {
            scans,
            scan_emails,
            cipher,
        }
    }

    pub fn cipher(&self) -> &Arc<PayloadCipher> {
        &self.cipher
    }

    /// Encrypt every finding and commit them together with the `finished`
    /// transition. Nothing is written if any payload fails to encrypt.
    pub async fn save_findings(
        &self,
        scan_id: ScanId,
        findings: &[RankedFinding],
    ) -> Result<usize> {
        let rows = findings
            .iter()
            .map(|ranked| -> Result<NewFinding> {
                Ok(NewFinding {
                    module: ranked.finding.module.clone(),
                    kind: ranked.finding.kind.clone(),
                    data: self.cipher.encrypt(&ranked.finding.data)?,
                    date_found: ranked.finding.date_found,
                    corroboration: ranked.finding.corroboration,
                    score: ranked.score,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        self.scans.complete_with_findings(scan_id, &rows).await
    }

    /// Findings with plaintext `data`, best first. A row that fails to
    /// decrypt aborts the read; stored rows are left untouched.
    pub async fn read_findings(
        &self,
        scan_id: ScanId,
        limit: Option<usize>,
    ) -> Result<Vec<Finding>> {
        let rows = self.scans.list_findings(scan_id, limit).await?;
        rows.into_iter()
            .map(|mut finding| -> Result<Finding> {
                finding.data =
                    self.cipher.decrypt(&finding.data).map_err(|err| {
                        warn!(
                            target: "aiden::scan",
                            scan_id = %scan_id,
                            finding_id = %finding.id,
                            error = %err,
                            "stored finding could not be decrypted"
                        );
                        AidenError::Decryption(format!(
                            "finding {}: {err}",
                            finding.id
                        ))
                    })?;
                Ok(finding)
            })
            .collect()
    }

    pub async fn save_scan_email(
        &self,
        scan_id: ScanId,
        email: &PhishingEmail,
    ) -> Result<ScanEmail> {
        let sealed = seal_json(&self.cipher, email)?;
        let record = self.scan_emails.insert_scan_email(scan_id, &sealed).await?;
        Ok(ScanEmail {
            id: record.id,
            scan_id: record.scan_id,
            email: email.clone(),
            created_at: record.created_at,
        })
    }

    pub async fn latest_scan_email(
        &self,
        scan_id: ScanId,
    ) -> Result<Option<ScanEmail>> {
        let Some(ScanEmailRecord {
            id,
            scan_id,
            content,
            created_at,
        }) = self.scan_emails.latest_for_scan(scan_id).await?
        else {
            return Ok(None);
        };
        Ok(Some(ScanEmail {
            id,
            scan_id,
            email: open_json(&self.cipher, &content)?,
            created_at,
        }))
    }
}
