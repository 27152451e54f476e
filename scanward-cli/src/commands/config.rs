//! `scanward config` command handler

use std::io::Write;
use std::path::Path;

use serde::Serialize;
use tracing::info;

use scanward_core::config::ScanwardConfig;

use crate::cli::{ConfigAction, ConfigArgs};
use crate::commands::load_config;
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

const SECTIONS: [&str; 4] = ["general", "verification", "queue", "executor"];

/// Execute the `config` command.
pub async fn execute(
    args: ConfigArgs,
    config_path: &Path,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    match args.action {
        ConfigAction::Validate => execute_validate(config_path, writer).await,
        ConfigAction::Show { section } => execute_show(config_path, section, writer).await,
    }
}

/// Loads and validates the file itself; a missing file is an error here.
///
/// # Errors
///
/// Returns `CliError::Config` if the file is missing, malformed, or holds invalid values.
async fn execute_validate(config_path: &Path, writer: &OutputWriter) -> Result<(), CliError> {
    info!(path = %config_path.display(), "validating configuration");

    let report = match ScanwardConfig::load(config_path).await {
        Ok(_) => ConfigValidationReport {
            source: config_path.display().to_string(),
            valid: true,
            errors: Vec::new(),
        },
        Err(e) => ConfigValidationReport {
            source: config_path.display().to_string(),
            valid: false,
            errors: vec![e.to_string()],
        },
    };

    writer.render(&report)?;

    if !report.valid {
        return Err(CliError::Config("configuration is invalid".to_owned()));
    }
    Ok(())
}

/// Displays the effective configuration (file + env overrides + defaults).
async fn execute_show(
    config_path: &Path,
    section: Option<String>,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let config = load_config(config_path).await?;
    let report = ConfigReport::new(config_path, &config, section.as_deref())?;
    writer.render(&report)
}

/// Effective configuration, whole or one section.
#[derive(Serialize)]
pub struct ConfigReport {
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
    pub config: serde_json::Value,
    /// TOML rendering for text output.
    #[serde(skip)]
    pub config_toml: String,
}

impl ConfigReport {
    /// # Errors
    ///
    /// Returns `CliError::Command` for an unknown section name.
    pub fn new(
        source: &Path,
        config: &ScanwardConfig,
        section: Option<&str>,
    ) -> Result<Self, CliError> {
        let (config_json, config_toml) = match section {
            None => (serde_json::to_value(config)?, to_toml(config)),
            Some("general") => (serde_json::to_value(&config.general)?, to_toml(&config.general)),
            Some("verification") => (
                serde_json::to_value(&config.verification)?,
                to_toml(&config.verification),
            ),
            Some("queue") => (serde_json::to_value(&config.queue)?, to_toml(&config.queue)),
            Some("executor") => (
                serde_json::to_value(&config.executor)?,
                to_toml(&config.executor),
            ),
            Some(other) => {
                return Err(CliError::Command(format!(
                    "unknown section: {other} (expected: {})",
                    SECTIONS.join(", ")
                )));
            }
        };
        Ok(Self {
            source: source.display().to_string(),
            section: section.map(str::to_owned),
            config: config_json,
            config_toml,
        })
    }
}

fn to_toml<T: Serialize>(value: &T) -> String {
    toml::to_string_pretty(value).unwrap_or_else(|e| format!("(serialization error: {e})\n"))
}

impl Render for ConfigReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        match &self.section {
            Some(section) => writeln!(
                w,
                "Configuration {} (source: {})",
                format!("[{section}]").bold(),
                self.source
            )?,
            None => writeln!(w, "Configuration (source: {})", self.source.bold())?,
        }
        writeln!(w)?;
        write!(w, "{}", self.config_toml)
    }
}

/// Configuration validation result.
#[derive(Serialize)]
pub struct ConfigValidationReport {
    pub source: String,
    pub valid: bool,
    /// Empty when valid.
    pub errors: Vec<String>,
}

impl Render for ConfigValidationReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        writeln!(w, "Config Validation: {}", self.source.bold())?;
        if self.valid {
            writeln!(w, "  Result: {}", "VALID".green().bold())?;
        } else {
            writeln!(w, "  Result: {}", "INVALID".red().bold())?;
            for err in &self.errors {
                writeln!(w, "  Error: {}", err.red())?;
            }
        }
        Ok(())
    }
}
