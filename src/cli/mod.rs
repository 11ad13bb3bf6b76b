//! CLI subcommand definitions and handlers.
//!
//! Implements a git-like subcommand architecture:
//! - `sunscan scan <target>` - Discover a device's register map
//! - `sunscan history` - View stored scans
//! - `sunscan export <scan-id>` - Export a stored scan

mod export;
mod history;
mod scan;

pub use export::ExportCommand;
pub use history::HistoryCommand;
pub use scan::ScanCommand;

use clap::{Parser, Subcommand};

/// sunscan - A SunSpec register map discovery scanner.
///
/// Probes a Modbus TCP device for the SunSpec "SunS" marker at the
/// well-known base addresses, then walks the self-describing model chain
/// and reports every model id and length until the end-of-chain sentinel.
#[derive(Parser, Debug)]
#[command(name = "sunscan")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Discover the SunSpec register map of a Modbus device", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Scan a device for its register map
    #[command(alias = "s")]
    Scan(ScanCommand),

    /// View scan history
    #[command(alias = "h")]
    History(HistoryCommand),

    /// Export stored scan results
    #[command(alias = "e")]
    Export(ExportCommand),
}

/// Output format for results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable plain text
    Plain,
    /// JSON structured output
    Json,
    /// CSV format for data analysis
    Csv,
}

impl Default for OutputFormat {
    fn default() -> Self {
        Self::Plain
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Plain => write!(f, "plain"),
            Self::Json => write!(f, "json"),
            Self::Csv => write!(f, "csv"),
        }
    }
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "plain" | "text" => Ok(Self::Plain),
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            _ => Err(format!("unknown output format: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_format_from_str() {
        assert_eq!("plain".parse::<OutputFormat>().unwrap(), OutputFormat::Plain);
        assert_eq!("json".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!("CSV".parse::<OutputFormat>().unwrap(), OutputFormat::Csv);
        assert!("xml".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_cli_parses_scan_invocation() {
        use clap::Parser;
        let cli = Cli::parse_from(["sunscan", "scan", "192.168.1.50", "-u", "3", "-m", "tcp"]);
        match cli.command {
            Commands::Scan(cmd) => {
                assert_eq!(cmd.target, "192.168.1.50");
                assert_eq!(cmd.unit.map(|u| u.as_u8()), Some(3));
            }
            _ => panic!("expected scan subcommand"),
        }
    }

    #[test]
    fn test_cli_rejects_missing_target() {
        use clap::Parser;
        assert!(Cli::try_parse_from(["sunscan", "scan"]).is_err());
    }
}
