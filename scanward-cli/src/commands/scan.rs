//! `scanward scan` command handler
//!
//! Runs one job end to end in-process: register the account, prove
//! ownership, admit the job, start the queue, wait for the terminal
//! state, then stop the queue.

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{debug, info};

use scanward_core::config::ScanwardConfig;
use scanward_core::event::{JobEvent, JobEventKind};
use scanward_core::pipeline::Pipeline;
use scanward_core::store::{AccountDirectory, MemoryStore, ScanJobStore};
use scanward_core::types::{
    Account, AccountId, JobId, JobStatus, NormalizedFinding, ScanJob, Severity, VerificationMethod,
};
use scanward_scan_executor::{ScanExecutor, ScanExecutorConfig, TieredExecutor};
use scanward_scan_queue::{ScanQueueBuilder, ScanQueueConfig, ScanService};
use scanward_verifier::VerificationGate;

use crate::cli::ScanArgs;
use crate::commands::build_verifier;
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Store re-check interval while waiting, in case a job event was dropped.
const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Execute the `scan` command.
pub async fn execute(
    args: ScanArgs,
    config: &ScanwardConfig,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let store = Arc::new(MemoryStore::new());
    let account_id = AccountId(args.proof.account);
    store
        .insert_account(Account {
            id: account_id,
            tos_accepted_at: args.accept_tos.then(Utc::now),
        })
        .await;

    let verifier = Arc::new(build_verifier(config, Arc::clone(&store))?);
    let method = VerificationMethod::from(args.proof.method);
    verifier
        .request_or_verify(account_id, &args.proof.domain, method, &args.proof.token)
        .await?;

    let executor = TieredExecutor::from_config(&ScanExecutorConfig::from_core(&config.executor))?;
    let report = run_single_job(
        store,
        verifier,
        executor,
        ScanQueueConfig::from_core(&config.queue),
        account_id,
        &args.proof.domain,
        args.tier,
    )
    .await?;

    writer.render(&report)?;
    report.outcome()
}

/// Admits and runs one job on a fresh queue, returning its final report.
///
/// The queue is stopped on every path, including admission rejection.
pub async fn run_single_job<G, E>(
    store: Arc<MemoryStore>,
    gate: Arc<G>,
    executor: E,
    queue_config: ScanQueueConfig,
    account_id: AccountId,
    domain: &str,
    tier: u32,
) -> Result<ScanReport, CliError>
where
    G: VerificationGate,
    E: ScanExecutor,
{
    let (mut queue, events) = ScanQueueBuilder::new(store, gate, executor)
        .config(queue_config)
        .build()?;
    let mut events =
        events.ok_or_else(|| CliError::Command("scan queue built without event channel".to_owned()))?;

    queue.start().await?;
    let service = queue.service();
    let outcome: Result<(ScanJob, Vec<JobEventKind>), CliError> = async {
        let job = service.start_scan(account_id, domain, tier).await?;
        info!(job_id = %job.id, domain = %job.domain, tier, "scan admitted");
        wait_for_terminal(&service, &mut events, job.id).await
    }
    .await;
    queue.stop().await?;

    let (job, timeline) = outcome?;
    Ok(ScanReport::new(job, timeline))
}

/// Follows job events until the job reaches a terminal state.
async fn wait_for_terminal<S, G>(
    service: &ScanService<S, G>,
    events: &mut mpsc::Receiver<JobEvent>,
    job_id: JobId,
) -> Result<(ScanJob, Vec<JobEventKind>), CliError>
where
    S: ScanJobStore + AccountDirectory,
    G: VerificationGate,
{
    let mut timeline = Vec::new();
    let mut channel_open = true;
    loop {
        if channel_open {
            tokio::select! {
                event = events.recv() => match event {
                    Some(event) if event.job_id == job_id => {
                        info!(job_id = %job_id, event = %event.kind, "job event");
                        timeline.push(event.kind);
                    }
                    Some(_) => {}
                    None => channel_open = false,
                },
                _ = tokio::time::sleep(POLL_INTERVAL) => {}
            }
        } else {
            tokio::time::sleep(POLL_INTERVAL).await;
        }

        let job = service
            .job(job_id)
            .await?
            .ok_or_else(|| CliError::Command(format!("job {job_id} disappeared from store")))?;
        if job.status.is_terminal() {
            debug!(job_id = %job_id, status = %job.status, "job reached terminal state");
            return Ok((job, timeline));
        }
    }
}

/// Per-severity finding counts.
#[derive(Debug, Default, Serialize, PartialEq, Eq)]
pub struct SeveritySummary {
    pub critical: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
    pub total: usize,
}

impl SeveritySummary {
    fn from_findings(findings: &[NormalizedFinding]) -> Self {
        let mut summary = Self::default();
        for finding in findings {
            match finding.severity {
                Severity::Critical => summary.critical += 1,
                Severity::High => summary.high += 1,
                Severity::Medium => summary.medium += 1,
                Severity::Low => summary.low += 1,
            }
        }
        summary.total = findings.len();
        summary
    }
}

/// Final state of a scan job.
#[derive(Debug, Serialize)]
pub struct ScanReport {
    pub job: ScanJob,
    pub summary: SeveritySummary,
    /// Event kinds observed for the job, in order.
    pub events: Vec<JobEventKind>,
}

impl ScanReport {
    pub fn new(job: ScanJob, events: Vec<JobEventKind>) -> Self {
        Self {
            summary: SeveritySummary::from_findings(&job.findings),
            job,
            events,
        }
    }

    /// Maps the report to the command result: failures and findings are errors (exit code 4).
    pub fn outcome(&self) -> Result<(), CliError> {
        match self.job.status {
            JobStatus::Failed => Err(CliError::Scan(format!(
                "scan failed: {}",
                self.job.failure_reason.as_deref().unwrap_or("unknown reason")
            ))),
            _ if self.summary.total > 0 => Err(CliError::Scan(format!(
                "found {} findings",
                self.summary.total
            ))),
            _ => Ok(()),
        }
    }
}

impl Render for ScanReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        let job = &self.job;
        writeln!(w, "Scan: {} (job {})", job.domain.to_string().bold(), job.id)?;
        let status = job.status.to_string().to_uppercase();
        let status = match job.status {
            JobStatus::Completed => status.green().bold(),
            JobStatus::Failed => status.red().bold(),
            JobStatus::Queued | JobStatus::Running => status.yellow(),
        };
        writeln!(w, "  Status: {status}")?;
        writeln!(w, "  Plan tier: {}", job.plan_tier)?;
        writeln!(w, "  Attempts: {}", job.attempts)?;
        if let Some(reason) = &job.failure_reason {
            writeln!(w, "  Failure: {}", reason.red())?;
        }

        if job.status == JobStatus::Completed {
            writeln!(
                w,
                "  Findings: {} (critical: {}, high: {}, medium: {}, low: {})",
                self.summary.total.to_string().bold(),
                self.summary.critical,
                self.summary.high,
                self.summary.medium,
                self.summary.low,
            )?;
            for finding in &job.findings {
                let severity = match finding.severity {
                    Severity::Critical | Severity::High => finding.severity.as_str().red(),
                    Severity::Medium => finding.severity.as_str().yellow(),
                    Severity::Low => finding.severity.as_str().normal(),
                };
                writeln!(
                    w,
                    "    [{severity}] {} {} ({})",
                    finding.id, finding.vulnerability_name, finding.affected_url
                )?;
                if let Some(remediation) = &finding.remediation {
                    writeln!(w, "      see: {remediation}")?;
                }
            }
        }
        Ok(())
    }
}
