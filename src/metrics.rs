use std::cmp::Ordering;

use crate::history::{filter_runs, Chronology, Job, Run, RunFilter, RunResult};
use crate::records::JobMetricsRecord;

fn cmp_f64(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}

/// Calculate P50, P95, P99 percentiles from a list of values
/// Returns (p50, p95, p99). If insufficient data, returns same value for all.
fn calculate_percentiles(values: &[f64]) -> (f64, f64, f64) {
    if values.is_empty() {
        return (0.0, 0.0, 0.0);
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| cmp_f64(*a, *b));

    let len = sorted.len();

    if len == 1 {
        let val = sorted[0];
        return (val, val, val);
    }

    let p50_idx = (len / 2).min(len - 1);
    let p95_idx = (len * 95 / 100).min(len - 1);
    let p99_idx = (len * 99 / 100).min(len - 1);

    (sorted[p50_idx], sorted[p95_idx], sorted[p99_idx])
}

#[allow(clippy::cast_precision_loss)]
fn calculate_success_rate(successful: usize, total: usize) -> f64 {
    (successful as f64 / total.max(1) as f64) * 100.0
}

fn count_result(runs: &[&Run], result: RunResult) -> usize {
    runs.iter().filter(|run| run.result == Some(result)).count()
}

fn last_with_result(runs: &[&Run], result: RunResult) -> Option<u32> {
    runs.iter()
        .find(|run| run.result == Some(result))
        .map(|run| run.number)
}

/// Derives build statistics for a job from its full chronology.
///
/// Durations and the success rate only consider completed runs.
pub fn job_metrics<S: Chronology + ?Sized>(store: &S, job: &Job) -> JobMetricsRecord {
    let runs = filter_runs(store, job, |run| RunFilter::All.matches(run));
    let (building, completed): (Vec<&Run>, Vec<&Run>) =
        runs.iter().copied().partition(|run| run.building);

    let successful_builds = count_result(&completed, RunResult::Success);

    #[allow(clippy::cast_precision_loss)]
    let durations: Vec<f64> = completed
        .iter()
        .filter_map(|run| run.duration_millis)
        .map(|millis| millis as f64 / 1000.0)
        .collect();
    let (duration_p50, duration_p95, duration_p99) = calculate_percentiles(&durations);

    JobMetricsRecord {
        job_name: job.name.clone(),
        total_builds: runs.len(),
        successful_builds,
        unstable_builds: count_result(&completed, RunResult::Unstable),
        failed_builds: count_result(&completed, RunResult::Failure),
        aborted_builds: count_result(&completed, RunResult::Aborted),
        building: building.len(),
        success_rate: calculate_success_rate(successful_builds, completed.len()),
        duration_p50,
        duration_p95,
        duration_p99,
        last_build: runs.first().map(|run| run.number),
        last_successful_build: last_with_result(&completed, RunResult::Success),
        last_failed_build: last_with_result(&completed, RunResult::Failure),
    }
}
