//! Scan subcommand implementation.
//!
//! Handles the `sunscan scan <target>` command: resolve the target, run
//! the discovery flow, persist and render the result.

use crate::cli::OutputFormat;
use crate::config::AppSettings;
use crate::error::{CliError, CliResult};
use crate::output;
use crate::scanner::{run_scan, ScanOptions};
use crate::storage::ScanStore;
use crate::transport::TransportMode;
use crate::types::{TargetSpec, UnitId};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Scan a device for its SunSpec register map.
#[derive(Parser, Debug)]
pub struct ScanCommand {
    /// Device to scan (IP, hostname, or HOST:PORT)
    ///
    /// Examples:
    ///   192.168.1.50         Single IP address, default port
    ///   inverter.local:1502  Hostname with explicit port
    #[arg(value_name = "TARGET")]
    pub target: String,

    /// Device TCP port, used when TARGET does not include one
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Unit (slave) id to address
    #[arg(short, long)]
    pub unit: Option<UnitId>,

    /// Transport mode
    #[arg(short, long, value_enum, default_value = "tcp")]
    pub mode: TransportMode,

    /// Response timeout in milliseconds
    #[arg(short = 't', long)]
    pub timeout: Option<u64>,

    /// Maximum models to walk before giving up (0 = unbounded)
    #[arg(long, value_name = "COUNT")]
    pub max_models: Option<usize>,

    /// Output format for results
    #[arg(short, long, value_enum)]
    pub output: Option<OutputFormat>,

    /// Don't save scan results
    #[arg(long)]
    pub no_save: bool,
}

impl ScanCommand {
    /// Execute the scan command.
    pub async fn execute(&self, verbose: bool, quiet: bool) -> CliResult<()> {
        let settings = AppSettings::load()?;

        let unit = match self.unit {
            Some(unit) => unit,
            None => UnitId::new(settings.default_unit).ok_or_else(|| {
                CliError::Other("default unit id in settings is the broadcast id".to_string())
            })?,
        };
        let timeout = Duration::from_millis(self.timeout.unwrap_or(settings.default_timeout_ms));
        let max_models = match self.max_models.unwrap_or(settings.default_max_models) {
            0 => None,
            limit => Some(limit),
        };
        let format = self
            .output
            .or_else(|| settings.default_output_format.parse().ok())
            .unwrap_or_default();

        let spec = TargetSpec::parse(&self.target)?;
        let default_port = self.port.unwrap_or(settings.default_port);
        let target = spec.resolve(default_port).await?;

        if !quiet && format == OutputFormat::Plain {
            output::print_scan_header(&target.to_string(), &self.mode.to_string(), unit.as_u8());
        }

        let options = ScanOptions {
            mode: self.mode,
            target,
            unit,
            timeout,
            max_models,
        };

        // In verbose plain mode a spinner tracks the walk; model details
        // already stream through the log.
        let spinner = if verbose && format == OutputFormat::Plain {
            let pb = ProgressBar::new_spinner();
            pb.set_style(
                ProgressStyle::default_spinner()
                    .template("{spinner:.green} {msg}")
                    .expect("static spinner template"),
            );
            pb.set_message("probing...");
            Some(pb)
        } else {
            None
        };

        let record = run_scan(&options, |model| {
            if let Some(ref pb) = spinner {
                pb.inc(1);
                pb.set_message(format!("model {} at {}", model.model, model.address));
            }
        })
        .await;

        if let Some(pb) = spinner {
            pb.finish_and_clear();
        }

        if !self.no_save && settings.auto_save_scans {
            let store = ScanStore::new()?;
            store.save(&record)?;

            if !quiet && format == OutputFormat::Plain {
                output::print_info(&format!("Scan saved as {}", record.id.short()));
            }
        }

        output::print_results(&record, format)?;

        Ok(())
    }
}
