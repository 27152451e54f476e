//! CLI argument parsing using clap derive API
//!
//! Purely declarative: no side effects or I/O.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use scanward_core::types::VerificationMethod;

/// Scanward -- domain ownership verification and tiered vulnerability scans.
///
/// Use `scanward <COMMAND> --help` for subcommand details.
#[derive(Parser, Debug)]
#[command(name = "scanward", version, about, long_about = None)]
pub struct Cli {
    /// Path to the scanward.toml configuration file.
    #[arg(short, long, global = true, default_value = "scanward.toml")]
    pub config: PathBuf,

    /// Override log level (trace, debug, info, warn, error).
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Output format.
    #[arg(long, global = true, default_value = "text")]
    pub output: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Supported output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    Text,
    /// Machine-readable JSON.
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Prove ownership of a domain.
    Verify(VerifyArgs),

    /// Verify a domain, then run one scan to completion.
    Scan(ScanArgs),

    /// Show the plan tier to capability table.
    Tiers,

    /// Manage configuration.
    Config(ConfigArgs),
}

/// Ownership proof method accepted on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MethodArg {
    /// TXT record at `<prefix>.<domain>`.
    Dns,
    /// File served at `https://<domain><well_known_path>`.
    File,
    /// Manual token (trusted operator path).
    Token,
}

impl From<MethodArg> for VerificationMethod {
    fn from(method: MethodArg) -> Self {
        match method {
            MethodArg::Dns => Self::Dns,
            MethodArg::File => Self::File,
            MethodArg::Token => Self::Token,
        }
    }
}

/// Ownership proof inputs shared by `verify` and `scan`.
#[derive(Args, Debug)]
pub struct ProofArgs {
    /// Requesting account id.
    #[arg(long)]
    pub account: u64,

    /// Domain to prove (e.g. shop.example.com).
    #[arg(long)]
    pub domain: String,

    /// Proof method.
    #[arg(long, value_enum, default_value = "dns")]
    pub method: MethodArg,

    /// Challenge token published by the domain owner.
    #[arg(long)]
    pub token: String,
}

// ---- verify ----

#[derive(Args, Debug)]
pub struct VerifyArgs {
    #[command(flatten)]
    pub proof: ProofArgs,
}

// ---- scan ----

#[derive(Args, Debug)]
pub struct ScanArgs {
    #[command(flatten)]
    pub proof: ProofArgs,

    /// Plan tier selecting the scan capability sets.
    #[arg(long, default_value_t = 10)]
    pub tier: u32,

    /// Record terms-of-service acceptance for the account.
    #[arg(long)]
    pub accept_tos: bool,
}

// ---- config ----

#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Validate the configuration file and report errors.
    Validate,
    /// Show the effective configuration (file + env overrides + defaults).
    Show {
        /// Show only one section (general, verification, queue, executor).
        #[arg(long)]
        section: Option<String>,
    },
}
