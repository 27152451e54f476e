//! `scanward verify` command handler

use std::io::Write;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use scanward_core::config::ScanwardConfig;
use scanward_core::store::MemoryStore;
use scanward_core::types::{AccountId, VerificationMethod, VerificationRecord, VerificationStatus};
use scanward_verifier::VerifierConfig;

use crate::cli::VerifyArgs;
use crate::commands::build_verifier;
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `verify` command.
///
/// The record lives in an in-process store, so a successful proof only
/// holds for the duration of this invocation.
pub async fn execute(
    args: VerifyArgs,
    config: &ScanwardConfig,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let store = Arc::new(MemoryStore::new());
    let verifier = build_verifier(config, store)?;
    let proof = args.proof;
    let method = VerificationMethod::from(proof.method);

    info!(domain = %proof.domain, account_id = proof.account, method = %method, "verifying domain");

    let record = verifier
        .request_or_verify(AccountId(proof.account), &proof.domain, method, &proof.token)
        .await?;

    writer.render(&VerificationReport::new(&record, verifier.config()))?;
    Ok(())
}

/// Outcome of a successful ownership proof.
#[derive(Serialize)]
pub struct VerificationReport {
    pub domain: String,
    pub account_id: u64,
    pub method: VerificationMethod,
    pub status: VerificationStatus,
    /// Where the proof was read from.
    pub challenge: Option<String>,
    pub verified_at: Option<DateTime<Utc>>,
}

impl VerificationReport {
    pub fn new(record: &VerificationRecord, config: &VerifierConfig) -> Self {
        let challenge = match record.method {
            VerificationMethod::Dns => Some(config.challenge_record_name(&record.domain)),
            VerificationMethod::File => Some(config.challenge_url(&record.domain)),
            VerificationMethod::Token => None,
        };
        Self {
            domain: record.domain.to_string(),
            account_id: record.account_id.0,
            method: record.method,
            status: record.status,
            challenge,
            verified_at: record.verified_at,
        }
    }
}

impl Render for VerificationReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        writeln!(w, "Domain: {}", self.domain.bold())?;
        let status = self.status.to_string().to_uppercase();
        let status = match self.status {
            VerificationStatus::Verified => status.green().bold(),
            VerificationStatus::Failed | VerificationStatus::Blocked => status.red().bold(),
        };
        writeln!(w, "  Status: {status}")?;
        writeln!(w, "  Account: {}", self.account_id)?;
        writeln!(w, "  Method: {}", self.method)?;
        if let Some(challenge) = &self.challenge {
            writeln!(w, "  Challenge: {challenge}")?;
        }
        if let Some(at) = self.verified_at {
            writeln!(w, "  Verified at: {}", at.to_rfc3339())?;
        }
        Ok(())
    }
}
