use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Color as TableColor, ContentArrangement, Table};

use crate::graph::NodeStatus;
use crate::history::RunResult;

/// Table and cell creation helpers
pub fn create_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

pub fn header(labels: &[&str]) -> Vec<Cell> {
    labels
        .iter()
        .map(|label| Cell::new(*label).fg(TableColor::Cyan))
        .collect()
}

pub fn status_label(status: NodeStatus) -> &'static str {
    match status {
        NodeStatus::Success => "SUCCESS",
        NodeStatus::NotExecuted => "NOT_EXECUTED",
        NodeStatus::Unstable => "UNSTABLE",
        NodeStatus::Aborted => "ABORTED",
        NodeStatus::Failure => "FAILURE",
        NodeStatus::InProgress => "IN_PROGRESS",
    }
}

pub fn status_cell(status: NodeStatus) -> Cell {
    let color = match status {
        NodeStatus::Success => TableColor::Green,
        NodeStatus::Unstable | NodeStatus::InProgress => TableColor::Yellow,
        NodeStatus::Failure | NodeStatus::Aborted => TableColor::Red,
        NodeStatus::NotExecuted => TableColor::DarkGrey,
    };
    Cell::new(status_label(status)).fg(color)
}

pub fn result_cell(result: Option<RunResult>) -> Cell {
    match result {
        None => Cell::new("BUILDING").fg(TableColor::Yellow),
        Some(RunResult::Success) => Cell::new("SUCCESS").fg(TableColor::Green),
        Some(RunResult::Unstable) => Cell::new("UNSTABLE").fg(TableColor::Yellow),
        Some(RunResult::Failure) => Cell::new("FAILURE").fg(TableColor::Red),
        Some(RunResult::Aborted) => Cell::new("ABORTED").fg(TableColor::Red),
        Some(RunResult::NotBuilt) => Cell::new("NOT_BUILT").fg(TableColor::DarkGrey),
    }
}

pub fn duration_cell(millis: Option<u64>) -> Cell {
    match millis {
        None => Cell::new("-").fg(TableColor::DarkGrey),
        Some(millis) => Cell::new(format_millis(millis)),
    }
}

#[allow(clippy::cast_precision_loss)]
pub fn format_millis(millis: u64) -> String {
    format_duration(millis as f64 / 1000.0)
}

pub fn format_duration(seconds: f64) -> String {
    if seconds < 60.0 {
        format!("{seconds:.1}s")
    } else {
        format!("{:.1}min", seconds / 60.0)
    }
}

pub fn color_coded_success_cell(rate: f64) -> Cell {
    let text = format!("{rate:.1}%");
    if rate > 80.0 {
        Cell::new(text).fg(TableColor::Green)
    } else if rate >= 50.0 {
        Cell::new(text).fg(TableColor::Yellow)
    } else {
        Cell::new(text).fg(TableColor::Red)
    }
}
