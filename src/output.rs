//! Output formatting module.
//!
//! Provides formatters for plain text, JSON, and CSV output of scan
//! results.

use crate::cli::OutputFormat;
use crate::scanner::DeviceScan;
use console::style;
use std::io::{self, Write};

/// Format and print a scan according to the specified format.
pub fn print_results(scan: &DeviceScan, format: OutputFormat) -> io::Result<()> {
    match format {
        OutputFormat::Plain => print_plain(scan),
        OutputFormat::Json => print_json(scan),
        OutputFormat::Csv => print_csv(scan),
    }
}

/// Print a scan in human-readable plain text format.
fn print_plain(scan: &DeviceScan) -> io::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();

    writeln!(out)?;
    writeln!(
        out,
        "{}",
        style("═══════════════════════════════════════════════════════════════").cyan()
    )?;
    writeln!(
        out,
        "                 {} Register Map",
        style("SunSpec").cyan().bold()
    )?;
    writeln!(
        out,
        "{}",
        style("═══════════════════════════════════════════════════════════════").cyan()
    )?;
    writeln!(out)?;

    writeln!(out, "  {} {}", style("Target:").bold(), scan.target)?;
    writeln!(
        out,
        "  {} {}:{} (unit {})",
        style("Device:").bold(),
        scan.ip_address,
        scan.port,
        scan.unit
    )?;
    match scan.marker_address {
        Some(address) => writeln!(out, "  {} {}", style("Marker:").bold(), address)?,
        None => writeln!(out, "  {} {}", style("Marker:").bold(), style("not found").red())?,
    }

    let status = if scan.status.is_success() {
        style(scan.status.to_string()).green().bold()
    } else {
        style(scan.status.to_string()).red().bold()
    };
    writeln!(out, "  {} {}", style("Status:").bold(), status)?;
    writeln!(
        out,
        "  {} {} models in {:.2}s",
        style("Found:").bold(),
        scan.data_model_count(),
        scan.duration_ms as f64 / 1000.0
    )?;
    writeln!(out)?;

    if scan.models.is_empty() {
        writeln!(out, "  {}", style("No models to display.").dim())?;
    } else {
        writeln!(
            out,
            "  {}",
            style("───────────────────────────────────────────────").dim()
        )?;
        writeln!(
            out,
            "  {:>8}  {:>8}  {:>8}",
            style("ADDRESS").bold(),
            style("MODEL").bold(),
            style("LENGTH").bold()
        )?;
        writeln!(
            out,
            "  {}",
            style("───────────────────────────────────────────────").dim()
        )?;

        for model in &scan.models {
            if model.is_end_of_chain() {
                writeln!(
                    out,
                    "  {:>8}  {:>8}  {:>8}",
                    model.address,
                    style("end").dim(),
                    model.length
                )?;
            } else {
                writeln!(
                    out,
                    "  {:>8}  {:>8}  {:>8}",
                    model.address,
                    style(model.model).green(),
                    model.length
                )?;
            }
        }

        writeln!(
            out,
            "  {}",
            style("───────────────────────────────────────────────").dim()
        )?;
    }

    writeln!(out)?;

    Ok(())
}

/// Print a scan in JSON format.
fn print_json(scan: &DeviceScan) -> io::Result<()> {
    let json =
        serde_json::to_string_pretty(scan).map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
    println!("{}", json);
    Ok(())
}

/// Print a scan in CSV format.
fn print_csv(scan: &DeviceScan) -> io::Result<()> {
    let stdout = io::stdout();
    let mut wtr = csv::Writer::from_writer(stdout.lock());

    wtr.write_record(["address", "model", "length"])?;

    for model in &scan.models {
        wtr.write_record([
            model.address.to_string(),
            model.model.to_string(),
            model.length.to_string(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

/// Print a scan header before scanning begins.
pub fn print_scan_header(target: &str, mode: &str, unit: u8) {
    println!();
    println!(
        "{} {} v{}",
        style("Starting").cyan(),
        style("sunscan").cyan().bold(),
        env!("CARGO_PKG_VERSION")
    );
    println!("{} Mode: {}", style("•").dim(), style(mode).yellow());
    println!(
        "{} Target: {} (unit {})",
        style("•").dim(),
        style(target).white().bold(),
        unit
    );
    println!();
}

/// Print an error message.
pub fn print_error(msg: &str) {
    eprintln!("{} {}", style("Error:").red().bold(), msg);
}

/// Print a warning message.
pub fn print_warning(msg: &str) {
    eprintln!("{} {}", style("Warning:").yellow().bold(), msg);
}

/// Print an informational message.
pub fn print_info(msg: &str) {
    eprintln!("{} {}", style("Info:").cyan().bold(), msg);
}

/// Print a success message.
pub fn print_success(msg: &str) {
    eprintln!("{} {}", style("Done:").green().bold(), msg);
}
