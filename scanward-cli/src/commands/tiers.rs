//! `scanward tiers` command handler

use std::io::Write;

use serde::Serialize;

use scanward_core::config::ScanwardConfig;
use scanward_scan_executor::tier_table;

use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `tiers` command.
pub fn execute(config: &ScanwardConfig, writer: &OutputWriter) -> Result<(), CliError> {
    writer.render(&TiersReport::new(&config.queue.plan_tiers))
}

#[derive(Debug, Serialize)]
pub struct TierEntry {
    /// Lowest plan tier in this band.
    pub tier: u32,
    pub capabilities: Vec<String>,
    /// Whether the queue admits this exact tier.
    pub admitted: bool,
}

#[derive(Debug, Serialize)]
pub struct TiersReport {
    pub tiers: Vec<TierEntry>,
}

impl TiersReport {
    pub fn new(admitted_tiers: &[u32]) -> Self {
        let tiers = tier_table()
            .into_iter()
            .map(|(tier, caps)| TierEntry {
                tier,
                capabilities: caps.iter().map(|c| c.as_str().to_owned()).collect(),
                admitted: admitted_tiers.contains(&tier),
            })
            .collect();
        Self { tiers }
    }
}

impl Render for TiersReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        writeln!(w, "{:<8} {:<10} {}", "TIER", "ADMITTED", "CAPABILITIES")?;
        for entry in &self.tiers {
            let admitted = if entry.admitted {
                "yes".green()
            } else {
                "no".red()
            };
            writeln!(
                w,
                "{:<8} {:<10} {}",
                entry.tier,
                admitted,
                entry.capabilities.join(", ")
            )?;
        }
        Ok(())
    }
}
