use std::fmt::Write;

use comfy_table::{Cell, Color as TableColor};

use super::styling::{bright, bright_yellow, build_result, cyan, dim};
use super::tables::{
    color_coded_success_cell, create_table, duration_cell, format_duration, format_millis, header,
    result_cell, status_cell,
};
use crate::graph::{NodeId, NodeKind};
use crate::records::{BuildRecord, JobMetricsRecord, JobRecord, NodeRecord, Report, StageRecord};

/// Renders a report as human-readable terminal text.
///
/// Builds get an overview followed by a table of their stages, node lists
/// and metrics are rendered as tables, logs are printed as-is.
pub fn render_report(report: &Report) -> String {
    match report {
        Report::Job(Some(job)) => render_job(job),
        Report::Build(Some(build)) => render_build(build),
        Report::Nodes(Some(nodes)) => render_nodes(nodes),
        Report::Log(Some(lines)) => render_log(lines),
        Report::Metrics(Some(metrics)) => render_metrics(metrics),
        Report::Job(None)
        | Report::Build(None)
        | Report::Nodes(None)
        | Report::Log(None)
        | Report::Metrics(None) => format!("{}\n", bright_yellow("Not found.")),
    }
}

fn add_section_header(output: &mut String, emoji: &str, title: &str) {
    let _ = writeln!(output, "{} {}", bright(emoji), bright(title).underlined());
}

fn join_ids(ids: &[NodeId]) -> String {
    ids.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

fn kind_label(kind: NodeKind) -> &'static str {
    match kind {
        NodeKind::Step => "step",
        NodeKind::StageStart => "stage start",
        NodeKind::StageEnd => "stage end",
        NodeKind::Branch => "branch",
    }
}

fn render_job(job: &JobRecord) -> String {
    let mut output = String::new();

    add_section_header(&mut output, "📦", "Job");
    let _ = writeln!(output, "  {} {}", dim("Name:"), cyan(&job.name));
    let _ = writeln!(output, "  {} {}", dim("URL:"), job.url);
    if let Some(description) = &job.description {
        let _ = writeln!(output, "  {} {}", dim("Description:"), description);
    }
    let _ = writeln!(output, "  {} {}\n", dim("Builds:"), bright_yellow(job.builds.len()));

    if job.builds.is_empty() {
        let _ = writeln!(output, "{}", bright_yellow("No builds to show."));
        return output;
    }

    let mut table = create_table();
    table.set_header(header(&["Build", "Result", "Started", "Duration", "Stages"]));
    for build in &job.builds {
        let result = if build.building {
            result_cell(None)
        } else {
            result_cell(build.result)
        };
        table.add_row(vec![
            Cell::new(format!("#{}", build.number)),
            result,
            Cell::new(build.start_time.format("%Y-%m-%d %H:%M")),
            duration_cell(build.duration_millis),
            Cell::new(build.stages.len()),
        ]);
    }
    let _ = writeln!(output, "{table}\n");

    for build in job.builds.iter().filter(|build| !build.stages.is_empty()) {
        output.push_str(&render_build(build));
    }
    output
}

fn render_build(build: &BuildRecord) -> String {
    let mut output = String::new();

    add_section_header(&mut output, "🏗️", &format!("{} #{}", build.job_name, build.number));

    let _ = writeln!(
        output,
        "  {} {}",
        dim("Result:"),
        build_result(build.result, build.building)
    );
    let _ = writeln!(
        output,
        "  {} {}",
        dim("Started:"),
        dim(build.start_time.format("%Y-%m-%d %H:%M:%S UTC"))
    );
    if let Some(millis) = build.duration_millis {
        let _ = writeln!(output, "  {} {}", dim("Duration:"), format_millis(millis));
    }
    let _ = writeln!(output, "  {} {}\n", dim("URL:"), build.url);

    if build.stages.is_empty() {
        let _ = writeln!(output, "  {}\n", dim("No stages recorded."));
        return output;
    }

    let _ = writeln!(output, "{}\n", stages_table(&build.stages));
    output
}

fn stages_table(stages: &[StageRecord]) -> comfy_table::Table {
    let mut table = create_table();
    table.set_header(header(&["Id", "Stage", "Status", "Duration", "Steps"]));

    for stage in stages {
        let steps = if stage.children.is_empty() {
            "-".to_string()
        } else {
            stage
                .children
                .iter()
                .map(|child| child.name.as_str())
                .collect::<Vec<_>>()
                .join("\n")
        };

        table.add_row(vec![
            Cell::new(stage.id),
            Cell::new(&stage.name),
            status_cell(stage.status),
            duration_cell(stage.duration_millis),
            Cell::new(steps),
        ]);
    }
    table
}

fn render_nodes(nodes: &[NodeRecord]) -> String {
    let mut output = String::new();

    add_section_header(&mut output, "🧩", "Nodes");
    if nodes.is_empty() {
        let _ = writeln!(output, "{}", bright_yellow("No nodes recorded."));
        return output;
    }

    let mut table = create_table();
    table.set_header(header(&["Id", "Name", "Kind", "Status", "Duration", "Parents"]));
    for node in nodes {
        table.add_row(vec![
            Cell::new(node.id),
            Cell::new(&node.name),
            Cell::new(kind_label(node.kind)).fg(TableColor::DarkGrey),
            status_cell(node.status),
            duration_cell(node.duration_millis),
            Cell::new(join_ids(&node.parents)),
        ]);
    }
    let _ = writeln!(output, "{table}");
    output
}

fn render_log(lines: &[String]) -> String {
    let mut output = String::new();
    for line in lines {
        let _ = writeln!(output, "{line}");
    }
    output
}

fn render_metrics(metrics: &JobMetricsRecord) -> String {
    let mut output = String::new();

    add_section_header(&mut output, "📊", "Overview");
    let last = |number: Option<u32>| number.map_or_else(|| "-".to_string(), |n| format!("#{n}"));
    let _ = writeln!(output, "  {} {}", dim("Job:"), cyan(&metrics.job_name));
    let _ = writeln!(output, "  {} {}", dim("Builds:"), bright_yellow(metrics.total_builds));
    let _ = writeln!(output, "  {} {}", dim("Last build:"), last(metrics.last_build));
    let _ = writeln!(
        output,
        "  {} {}",
        dim("Last successful build:"),
        last(metrics.last_successful_build)
    );
    let _ = writeln!(
        output,
        "  {} {}\n",
        dim("Last failed build:"),
        last(metrics.last_failed_build)
    );

    add_section_header(&mut output, "📋", "Results");
    let mut table = create_table();
    table.set_header(header(&[
        "Success", "Unstable", "Failed", "Aborted", "Building", "Rate", "P50", "P95", "P99",
    ]));
    table.add_row(vec![
        Cell::new(metrics.successful_builds),
        Cell::new(metrics.unstable_builds),
        Cell::new(metrics.failed_builds),
        Cell::new(metrics.aborted_builds),
        Cell::new(metrics.building),
        color_coded_success_cell(metrics.success_rate),
        Cell::new(format_duration(metrics.duration_p50)),
        Cell::new(format_duration(metrics.duration_p95)),
        Cell::new(format_duration(metrics.duration_p99)),
    ]);
    let _ = writeln!(output, "{table}");
    output
}
