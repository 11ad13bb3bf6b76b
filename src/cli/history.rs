//! History subcommand implementation.
//!
//! Lists, prunes, and clears stored scans.

use crate::error::CliResult;
use crate::output;
use crate::storage::ScanStore;
use clap::Parser;
use console::style;

/// View and manage scan history.
#[derive(Parser, Debug)]
pub struct HistoryCommand {
    /// Number of recent scans to show
    #[arg(short = 'n', long, default_value = "10")]
    pub count: usize,

    /// Show detailed information for each scan
    #[arg(short, long)]
    pub detailed: bool,

    /// Clear all scan history
    #[arg(long)]
    pub clear: bool,

    /// Delete scans older than N days
    #[arg(long, value_name = "DAYS")]
    pub prune: Option<u32>,
}

impl HistoryCommand {
    /// Execute the history command.
    pub fn execute(&self, quiet: bool) -> CliResult<()> {
        let store = ScanStore::new()?;

        if self.clear {
            let removed = store.clear()?;
            if !quiet {
                output::print_success(&format!("Removed {} stored scans", removed));
            }
            return Ok(());
        }

        if let Some(days) = self.prune {
            let removed = store.cleanup(chrono::Duration::days(i64::from(days)))?;
            if !quiet {
                output::print_success(&format!(
                    "Removed {} scans older than {} days",
                    removed, days
                ));
            }
            return Ok(());
        }

        let records = store.list_recent(self.count)?;

        if records.is_empty() {
            println!("No stored scans.");
            return Ok(());
        }

        for record in records {
            println!(
                "{}  {}  {}",
                style(record.id.short()).cyan(),
                record.started_at.format("%Y-%m-%d %H:%M:%S"),
                record.summary()
            );

            if self.detailed {
                match record.marker_address {
                    Some(address) => println!("          marker at {}", address),
                    None => println!("          marker not found"),
                }
                for model in &record.models {
                    println!(
                        "          {:>8}  model {:>5}  len {:>5}",
                        model.address, model.model, model.length
                    );
                }
            }
        }

        Ok(())
    }
}
