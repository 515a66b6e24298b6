use anyhow::Result;
use std::io::Write;

use super::summary::render_report;
use crate::config::OutputFormat;
use crate::records::Report;

/// Writes a report in the requested format.
///
/// JSON mirrors the records exactly, absent entities included as `null`.
/// The summary is a terminal rendering of the same data.
pub fn export_report(
    report: &Report,
    format: OutputFormat,
    pretty: bool,
    output: &mut dyn Write,
) -> Result<()> {
    match format {
        OutputFormat::Json => export_json(report, pretty, output),
        OutputFormat::Summary => {
            write!(output, "{}", render_report(report))?;
            Ok(())
        }
    }
}

fn export_json(report: &Report, pretty: bool, output: &mut dyn Write) -> Result<()> {
    let json = if pretty {
        serde_json::to_string_pretty(report)?
    } else {
        serde_json::to_string(report)?
    };
    writeln!(output, "{json}")?;
    Ok(())
}
