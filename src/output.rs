use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::types::ScanReport;

/// Human-readable summary: host, elapsed time and the open ports with their service guess.
pub fn write_text<W: Write>(mut w: W, report: &ScanReport) -> Result<()> {
    writeln!(
        w,
        "\nScan results for {} (elapsed {:.2}s):",
        report.host,
        report.elapsed.as_secs_f64()
    )?;
    if report.open_count() == 0 {
        writeln!(w, "  No open ports found (in scanned range).")?;
        return Ok(());
    }
    writeln!(w, "  Open ports:")?;
    for (port, rec) in report.open_ports() {
        if rec.service_guess.is_empty() {
            writeln!(w, "   - {port}")?;
        } else {
            writeln!(w, "   - {port} ({})", rec.service_guess)?;
        }
    }
    Ok(())
}

pub fn write_json<W: Write>(w: W, report: &ScanReport) -> Result<()> {
    serde_json::to_writer_pretty(w, report)?;
    Ok(())
}

/// Two-section CSV: a `host` / `elapsed_seconds` preamble, a blank line, then one row per port.
///
/// Lines end in `\r\n`; booleans are written `True`/`False`.
pub fn write_csv<W: Write>(mut w: W, report: &ScanReport) -> Result<()> {
    {
        let mut head = crlf_writer(&mut w);
        head.write_record(["host", report.host.as_str()])?;
        head.write_record([
            "elapsed_seconds",
            format!("{:.4}", report.elapsed.as_secs_f64()).as_str(),
        ])?;
        head.flush()?;
    }
    w.write_all(b"\r\n")?;

    let mut rows = crlf_writer(&mut w);
    rows.write_record(["port", "open", "service_guess"])?;
    for (port, rec) in &report.ports {
        rows.write_record([
            port.to_string().as_str(),
            if rec.open { "True" } else { "False" },
            rec.service_guess.as_str(),
        ])?;
    }
    rows.flush()?;
    Ok(())
}

fn crlf_writer<W: Write>(w: W) -> csv::Writer<W> {
    csv::WriterBuilder::new()
        .terminator(csv::Terminator::CRLF)
        .from_writer(w)
}

pub fn save_json(path: &Path, report: &ScanReport) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("failed to create JSON output: {}", path.display()))?;
    let mut w = BufWriter::new(file);
    write_json(&mut w, report)?;
    w.flush()
        .with_context(|| format!("failed to write JSON output: {}", path.display()))?;
    Ok(())
}

pub fn save_csv(path: &Path, report: &ScanReport) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("failed to create CSV output: {}", path.display()))?;
    let mut w = BufWriter::new(file);
    write_csv(&mut w, report)?;
    w.flush()
        .with_context(|| format!("failed to write CSV output: {}", path.display()))?;
    Ok(())
}
