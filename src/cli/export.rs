//! Export subcommand implementation.
//!
//! Handles the `sunscan export <scan-id>` command for exporting stored
//! scan results.

use crate::cli::OutputFormat;
use crate::error::{CliError, CliResult};
use crate::output;
use crate::scanner::DeviceScan;
use crate::storage::ScanStore;
use crate::types::ScanId;
use clap::Parser;
use std::fs;
use std::path::PathBuf;

/// Export stored scan results.
#[derive(Parser, Debug)]
pub struct ExportCommand {
    /// Scan ID or prefix to export
    ///
    /// Can be a full UUID or the first few characters (short ID).
    #[arg(value_name = "SCAN_ID")]
    pub scan_id: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    pub format: OutputFormat,

    /// Output file path (prints to stdout if not specified)
    #[arg(short = 'o', long = "output")]
    pub output_file: Option<PathBuf>,
}

impl ExportCommand {
    /// Execute the export command.
    pub fn execute(&self, quiet: bool) -> CliResult<()> {
        let store = ScanStore::new()?;

        let record = if self.scan_id.len() < 36 {
            store.find_by_prefix(&self.scan_id)?
        } else {
            let id: ScanId = self.scan_id.parse()?;
            store.load(&id)?
        };

        let content = match self.format {
            OutputFormat::Json => serde_json::to_string_pretty(&record)
                .map_err(|e| CliError::Other(e.to_string()))?,
            OutputFormat::Csv => generate_csv(&record)?,
            OutputFormat::Plain => generate_plain(&record),
        };

        if let Some(ref path) = self.output_file {
            fs::write(path, &content)
                .map_err(|e| CliError::Other(format!("failed to write file: {}", e)))?;

            if !quiet {
                output::print_success(&format!(
                    "Exported scan {} to {}",
                    record.id.short(),
                    path.display()
                ));
            }
        } else {
            println!("{}", content);
        }

        Ok(())
    }
}

/// Generate CSV output.
fn generate_csv(record: &DeviceScan) -> CliResult<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record(["address", "model", "length"])
        .map_err(|e| CliError::Other(e.to_string()))?;

    for model in &record.models {
        wtr.write_record([
            model.address.to_string(),
            model.model.to_string(),
            model.length.to_string(),
        ])
        .map_err(|e| CliError::Other(e.to_string()))?;
    }

    String::from_utf8(
        wtr.into_inner()
            .map_err(|e| CliError::Other(e.to_string()))?,
    )
    .map_err(|e| CliError::Other(e.to_string()))
}

/// Generate plain text output.
fn generate_plain(record: &DeviceScan) -> String {
    let mut out = String::new();

    out.push_str(&format!("Scan Report: {}\n", record.id));
    out.push_str(&format!("{}\n\n", "=".repeat(60)));

    out.push_str(&format!("Target:       {}\n", record.target));
    out.push_str(&format!(
        "Device:       {}:{} (unit {})\n",
        record.ip_address, record.port, record.unit
    ));
    out.push_str(&format!("Mode:         {}\n", record.mode));
    out.push_str(&format!("Started:      {}\n", record.started_at));
    out.push_str(&format!("Completed:    {}\n", record.completed_at));
    out.push_str(&format!("Duration:     {} ms\n", record.duration_ms));
    out.push_str(&format!("Status:       {}\n\n", record.status));

    match record.marker_address {
        Some(address) => out.push_str(&format!("Marker found at {}\n", address)),
        None => out.push_str("Marker not found\n"),
    }
    out.push_str(&format!(
        "{} data models discovered\n\n",
        record.data_model_count()
    ));

    if !record.models.is_empty() {
        out.push_str("Models:\n");
        out.push_str(&format!("{}\n", "-".repeat(60)));
        out.push_str(&format!("{:>8}  {:>8}  {:>8}\n", "ADDRESS", "MODEL", "LENGTH"));
        out.push_str(&format!("{}\n", "-".repeat(60)));

        for model in &record.models {
            out.push_str(&format!(
                "{:>8}  {:>8}  {:>8}\n",
                model.address, model.model, model.length
            ));
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::{DiscoveredModel, ScanStatus};
    use crate::types::RegisterAddress;
    use chrono::Utc;

    fn sample_record() -> DeviceScan {
        DeviceScan {
            id: ScanId::new(),
            started_at: Utc::now(),
            completed_at: Utc::now(),
            target: "inverter.local".to_string(),
            ip_address: "192.168.1.50".to_string(),
            port: 502,
            unit: 1,
            mode: "tcp".to_string(),
            marker_address: Some(40000),
            models: vec![
                DiscoveredModel {
                    address: RegisterAddress::new(40002),
                    model: 1,
                    length: 66,
                },
                DiscoveredModel {
                    address: RegisterAddress::new(40070),
                    model: 0xFFFF,
                    length: 0,
                },
            ],
            duration_ms: 310,
            status: ScanStatus::Complete,
        }
    }

    #[test]
    fn test_generate_csv() {
        let csv = generate_csv(&sample_record()).unwrap();
        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some("address,model,length"));
        assert_eq!(lines.next(), Some("40002,1,66"));
        assert_eq!(lines.next(), Some("40070,65535,0"));
    }

    #[test]
    fn test_generate_plain_mentions_marker_and_models() {
        let text = generate_plain(&sample_record());
        assert!(text.contains("Marker found at 40000"));
        assert!(text.contains("1 data models discovered"));
        assert!(text.contains("40002"));
    }
}
