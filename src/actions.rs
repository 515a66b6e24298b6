use log::{debug, info};

use crate::graph::{reconstruct_stages, sorted_nodes, FlowNode};
use crate::history::{filter_runs, HistoryStore, Job, Run, RunFilter};
use crate::links::Links;
use crate::metrics::job_metrics;
use crate::records::{BuildRecord, JobMetricsRecord, JobRecord, NodeRecord};

/// Upper bound on console lines returned for one run.
pub const MAX_LOG_LINES: usize = 5000;

fn build_record(job: &Job, run: &Run, links: &Links) -> BuildRecord {
    BuildRecord {
        job_name: job.name.clone(),
        number: run.number,
        url: links.run_url(&job.name, run.number),
        building: run.building,
        result: run.result,
        start_time: run.start_time,
        duration_millis: run.duration_millis,
        stages: Vec::new(),
    }
}

fn build_record_with_stages<S: HistoryStore + ?Sized>(
    store: &S,
    job: &Job,
    run: &Run,
    links: &Links,
) -> BuildRecord {
    let mut record = build_record(job, run, links);
    record.stages = reconstruct_stages(store.execution_graph(run), run.building);
    record
}

/// Job-level operations.
pub struct JobActions<'a, S: ?Sized> {
    store: &'a S,
    job: &'a Job,
    links: &'a Links,
}

impl<'a, S: HistoryStore + ?Sized> JobActions<'a, S> {
    /// Returns `None` when the store has no job by that name.
    pub fn for_job(store: &'a S, links: &'a Links, name: &str) -> Option<Self> {
        let job = store.job(name)?;
        Some(Self { store, job, links })
    }

    fn job_record(&self) -> JobRecord {
        JobRecord {
            name: self.job.name.clone(),
            description: self.job.description.clone(),
            url: self.links.job_url(&self.job.name),
            builds: Vec::new(),
        }
    }

    /// Job metadata without builds.
    pub fn index(&self) -> JobRecord {
        self.job_record()
    }

    /// Every run of the job with its stages, most recent first.
    pub fn stages(&self) -> JobRecord {
        info!("Reconstructing stages for all runs of {}", self.job.name);
        let runs = filter_runs(self.store, self.job, |run| RunFilter::All.matches(run));
        self.filter_stages(&runs)
    }

    /// Runs still in progress with their stages.
    ///
    /// When nothing is running, the most recent run is reported instead so
    /// there is always something to show for a job that has been built.
    pub fn pending_stages(&self) -> JobRecord {
        info!("Reconstructing stages for pending runs of {}", self.job.name);
        let mut runs = filter_runs(self.store, self.job, |run| RunFilter::InProgress.matches(run));

        if runs.is_empty() {
            if let Some(latest) = self.store.most_recent_run(self.job) {
                debug!(
                    "No pending runs for {}, falling back to #{}",
                    self.job.name, latest.number
                );
                runs = vec![latest];
            }
        }

        self.filter_stages(&runs)
    }

    pub fn metrics(&self) -> JobMetricsRecord {
        job_metrics(self.store, self.job)
    }

    fn filter_stages(&self, runs: &[&Run]) -> JobRecord {
        let mut record = self.job_record();
        for run in runs {
            record.add_build(build_record_with_stages(self.store, self.job, run, self.links));
        }
        record
    }
}

/// Operations on a single run.
pub struct RunActions<'a, S: ?Sized> {
    store: &'a S,
    job: &'a Job,
    run: &'a Run,
    links: &'a Links,
}

impl<'a, S: HistoryStore + ?Sized> RunActions<'a, S> {
    /// Returns `None` when the job or the run does not exist.
    pub fn for_run(store: &'a S, links: &'a Links, job_name: &str, number: u32) -> Option<Self> {
        let job = store.job(job_name)?;
        let run = store.run(job, number)?;
        Some(Self {
            store,
            job,
            run,
            links,
        })
    }

    /// Run metadata without stages.
    pub fn index(&self) -> BuildRecord {
        build_record(self.job, self.run, self.links)
    }

    pub fn stages(&self) -> BuildRecord {
        info!(
            "Reconstructing stages for {} #{}",
            self.job.name, self.run.number
        );
        build_record_with_stages(self.store, self.job, self.run, self.links)
    }

    /// Every presentable vertex in execution order, without stage grouping.
    pub fn nodes(&self) -> Vec<NodeRecord> {
        sorted_nodes(self.store.execution_graph(self.run))
            .into_iter()
            .filter_map(FlowNode::from_vertex)
            .map(NodeRecord::from)
            .collect()
    }

    /// Console output, oldest line first, capped at [`MAX_LOG_LINES`].
    ///
    /// `max_lines` can lower the cap but never raise it.
    pub fn log(&self, max_lines: Option<usize>) -> Vec<String> {
        let limit = max_lines.map_or(MAX_LOG_LINES, |requested| requested.min(MAX_LOG_LINES));
        debug!(
            "Reading up to {limit} log lines for {} #{}",
            self.job.name, self.run.number
        );
        self.store.log_lines(self.run, limit)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::graph::fixtures::{
        flow_start, graph, running, sample_pipeline, stage_end, stage_start, step,
    };
    use crate::graph::{NodeId, NodeKind, NodeStatus};
    use crate::history::{RunResult, Snapshot};

    fn run(number: u32) -> Run {
        let start = Utc.with_ymd_and_hms(2024, 3, number, 9, 0, 0).unwrap();
        Run::new(number, start).finished(RunResult::Success, 60_000)
    }

    fn store(runs: Vec<Run>) -> Snapshot {
        Snapshot::from_jobs(vec![Job {
            name: "app".to_string(),
            description: Some("Main application".to_string()),
            runs,
        }])
    }

    fn build_numbers(record: &JobRecord) -> Vec<u32> {
        record.builds.iter().map(|build| build.number).collect()
    }

    #[test]
    fn test_job_index_has_no_builds() {
        let store = store(vec![run(1).with_execution(sample_pipeline())]);
        let links = Links::new("/ci");

        let record = JobActions::for_job(&store, &links, "app").unwrap().index();

        assert_eq!(record.name, "app");
        assert_eq!(record.url, "/ci/job/app/");
        assert_eq!(record.description.as_deref(), Some("Main application"));
        assert!(record.builds.is_empty());
    }

    #[test]
    fn test_unknown_job_or_run_is_absent() {
        let store = store(vec![run(1)]);
        let links = Links::default();

        assert!(JobActions::for_job(&store, &links, "missing").is_none());
        assert!(RunActions::for_run(&store, &links, "missing", 1).is_none());
        assert!(RunActions::for_run(&store, &links, "app", 2).is_none());
    }

    #[test]
    fn test_job_stages_cover_full_history_most_recent_first() {
        let store = store(vec![
            run(1).with_execution(sample_pipeline()),
            run(2),
            run(3).with_execution(sample_pipeline()),
        ]);
        let links = Links::default();

        let record = JobActions::for_job(&store, &links, "app").unwrap().stages();

        assert_eq!(build_numbers(&record), vec![3, 2, 1]);
        let stage_ids: Vec<NodeId> = record.builds[0].stages.iter().map(|s| s.id).collect();
        assert_eq!(stage_ids, vec![NodeId(3), NodeId(6), NodeId(16)]);
        // A run without an execution graph is still listed, with no stages
        assert!(record.builds[1].stages.is_empty());
        assert_eq!(record.builds[2].url, "/job/app/1/");
    }

    #[test]
    fn test_pending_stages_only_running_builds() {
        let store = store(vec![
            run(1),
            run(2).in_progress(),
            run(3),
            run(4).in_progress().with_execution(sample_pipeline()),
        ]);
        let links = Links::default();

        let record = JobActions::for_job(&store, &links, "app")
            .unwrap()
            .pending_stages();

        assert_eq!(build_numbers(&record), vec![4, 2]);
        assert!(record.builds.iter().all(|build| build.building));
        assert_eq!(record.builds[0].stages.len(), 3);
    }

    #[test]
    fn test_pending_stages_falls_back_to_latest_run() {
        let store = store(vec![run(1), run(2)]);
        let links = Links::default();

        let record = JobActions::for_job(&store, &links, "app")
            .unwrap()
            .pending_stages();

        assert_eq!(build_numbers(&record), vec![2]);
    }

    #[test]
    fn test_pending_stages_for_job_without_runs() {
        let store = store(vec![]);
        let links = Links::default();

        let record = JobActions::for_job(&store, &links, "app")
            .unwrap()
            .pending_stages();

        assert!(record.builds.is_empty());
    }

    #[test]
    fn test_run_index_and_stages() {
        let store = store(vec![run(7).with_execution(sample_pipeline())]);
        let links = Links::default();
        let actions = RunActions::for_run(&store, &links, "app", 7).unwrap();

        let index = actions.index();
        assert_eq!(index.number, 7);
        assert_eq!(index.result, Some(RunResult::Success));
        assert!(index.stages.is_empty());

        let stages = actions.stages().stages;
        let names: Vec<&str> = stages.iter().map(|stage| stage.name.as_str()).collect();
        assert_eq!(names, vec!["Build", "Test", "Deploy"]);
    }

    #[test]
    fn test_open_stage_status_follows_run_state() {
        let interrupted = || {
            graph(
                &[4],
                vec![
                    stage_start(3, "Deploy", &[]),
                    running(step(4, "rollout", &[3])),
                ],
            )
        };
        let start = Utc.with_ymd_and_hms(2024, 3, 2, 9, 0, 0).unwrap();
        let store = store(vec![
            run(1).with_execution(interrupted()),
            Run::new(2, start).in_progress().with_execution(interrupted()),
        ]);
        let links = Links::default();
        let stage_status = |number| {
            RunActions::for_run(&store, &links, "app", number)
                .unwrap()
                .stages()
                .stages[0]
                .status
        };

        assert_eq!(stage_status(1), NodeStatus::Aborted);
        assert_eq!(stage_status(2), NodeStatus::InProgress);
    }

    #[test]
    fn test_run_nodes_skip_synthetic_vertices() {
        let store = store(vec![run(1).with_execution(sample_pipeline())]);
        let links = Links::default();

        let nodes = RunActions::for_run(&store, &links, "app", 1).unwrap().nodes();

        let ids: Vec<u64> = nodes.iter().map(|node| node.id.0).collect();
        assert_eq!(ids, vec![3, 4, 5, 6, 8, 9, 10, 11, 15, 16, 17, 18]);
        assert_eq!(nodes[0].kind, NodeKind::StageStart);
        assert_eq!(nodes[1].status, NodeStatus::Success);
    }

    #[test]
    fn test_unattributed_step_is_only_in_node_list() {
        let execution = graph(
            &[5],
            vec![
                flow_start(1),
                step(2, "checkout", &[1]),
                stage_start(3, "Build", &[2]),
                step(4, "make", &[3]),
                stage_end(5, 3, &[4]),
            ],
        );
        let store = store(vec![run(1).with_execution(execution)]);
        let links = Links::default();
        let actions = RunActions::for_run(&store, &links, "app", 1).unwrap();

        let stages = actions.stages().stages;
        assert!(stages
            .iter()
            .all(|stage| stage.children.iter().all(|child| child.id != NodeId(2))));
        assert!(actions.nodes().iter().any(|node| node.id == NodeId(2)));
    }

    #[test]
    fn test_step_without_any_stage() {
        let execution = graph(&[2], vec![flow_start(1), step(2, "echo", &[1])]);
        let store = store(vec![run(1).with_execution(execution)]);
        let links = Links::default();
        let actions = RunActions::for_run(&store, &links, "app", 1).unwrap();

        assert!(actions.stages().stages.is_empty());
        assert_eq!(actions.nodes().len(), 1);
    }

    #[test]
    fn test_run_without_execution_graph() {
        let store = store(vec![run(1)]);
        let links = Links::default();
        let actions = RunActions::for_run(&store, &links, "app", 1).unwrap();

        assert!(actions.stages().stages.is_empty());
        assert!(actions.nodes().is_empty());
        assert!(actions.log(None).is_empty());
    }

    #[test]
    fn test_log_is_capped_at_policy_maximum() {
        let text: String = (1..=6000).map(|i| format!("line {i}\n")).collect();
        let store = store(vec![run(1).with_log(text)]);
        let links = Links::default();
        let actions = RunActions::for_run(&store, &links, "app", 1).unwrap();

        let lines = actions.log(None);

        assert_eq!(lines.len(), MAX_LOG_LINES);
        assert_eq!(lines.first().map(String::as_str), Some("line 1"));
        assert_eq!(lines.last().map(String::as_str), Some("line 5000"));
    }

    #[test]
    fn test_log_hint_can_only_lower_the_cap() {
        let text: String = (1..=6000).map(|i| format!("line {i}\n")).collect();
        let store = store(vec![run(1).with_log(text)]);
        let links = Links::default();
        let actions = RunActions::for_run(&store, &links, "app", 1).unwrap();

        assert_eq!(actions.log(Some(10)).len(), 10);
        assert_eq!(actions.log(Some(10_000)).len(), MAX_LOG_LINES);
    }

    #[test]
    fn test_job_metrics_are_forwarded() {
        let store = store(vec![run(1), run(2)]);
        let links = Links::default();

        let metrics = JobActions::for_job(&store, &links, "app").unwrap().metrics();

        assert_eq!(metrics.total_builds, 2);
        assert_eq!(metrics.last_build, Some(2));
    }
}
