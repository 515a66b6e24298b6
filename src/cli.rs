use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::info;
use std::path::PathBuf;
use std::time::Duration;

use crate::actions::{JobActions, RunActions};
use crate::auth::Token;
use crate::config::{Config, OutputFormat};
use crate::history::{HistorySource, HistoryStore, RemoteOptions};
use crate::links::Links;
use crate::output::{export_report, LoadProgress};
use crate::records::Report;

#[derive(Parser)]
#[command(name = "stagelens")]
#[command(author, version, about = "Pipeline stage views for build history", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// History export to read: a file path or an http(s) URL
    #[arg(short, long, global = true, env = "STAGELENS_SOURCE")]
    source: Option<String>,

    /// Bearer token for remote history exports
    #[arg(short, long, global = true, env = "STAGELENS_TOKEN")]
    token: Option<String>,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Prefix used when building record URLs
    #[arg(long, global = true)]
    base_path: Option<String>,

    /// Output format
    #[arg(short, long, global = true, value_enum)]
    format: Option<OutputFormat>,

    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    #[arg(short, long, global = true, default_value_t = false)]
    pretty: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Views over one job and its builds
    Job {
        name: String,

        #[command(subcommand)]
        action: JobCommand,
    },
    /// Views over one build of a job
    Run {
        job: String,

        number: u32,

        #[command(subcommand)]
        action: RunCommand,
    },
}

#[derive(Subcommand, Clone, Copy)]
enum JobCommand {
    /// Job metadata without builds
    Index,
    /// Every build with its stages
    Stages,
    /// Builds still in progress with their stages
    PendingStages,
    /// Build statistics derived from the job history
    Metrics,
}

#[derive(Subcommand, Clone, Copy)]
enum RunCommand {
    /// The build without stages
    Index,
    /// The build with its stages
    Stages,
    /// Every presentable execution node, ordered by id
    Nodes,
    /// The first lines of the build log
    Log {
        #[arg(short = 'n', long)]
        max_lines: Option<usize>,
    },
}

impl Commands {
    fn report<S: HistoryStore + ?Sized>(&self, store: &S, links: &Links) -> Report {
        match self {
            Self::Job { name, action } => {
                let actions = JobActions::for_job(store, links, name);
                match action {
                    JobCommand::Index => Report::Job(actions.map(|job| job.index())),
                    JobCommand::Stages => Report::Job(actions.map(|job| job.stages())),
                    JobCommand::PendingStages => {
                        Report::Job(actions.map(|job| job.pending_stages()))
                    }
                    JobCommand::Metrics => Report::Metrics(actions.map(|job| job.metrics())),
                }
            }
            Self::Run {
                job,
                number,
                action,
            } => {
                let actions = RunActions::for_run(store, links, job, *number);
                match action {
                    RunCommand::Index => Report::Build(actions.map(|run| run.index())),
                    RunCommand::Stages => Report::Build(actions.map(|run| run.stages())),
                    RunCommand::Nodes => Report::Nodes(actions.map(|run| run.nodes())),
                    RunCommand::Log { max_lines } => {
                        Report::Log(actions.map(|run| run.log(*max_lines)))
                    }
                }
            }
        }
    }
}

impl Cli {
    fn history_source(&self, config: &Config) -> Result<HistorySource> {
        let location = self
            .source
            .as_deref()
            .or(config.source.location.as_deref())
            .context("No history source given; use --source or set source.location in the config file")?;
        Ok(HistorySource::parse(location)?)
    }

    fn remote_options(&self, config: &Config) -> RemoteOptions {
        let token = self
            .token
            .as_deref()
            .or(config.source.token.as_deref())
            .map(Token::from);

        RemoteOptions {
            token,
            max_retries: config.source.max_retries,
            retry_delay: Duration::from_secs(config.source.retry_delay_seconds),
        }
    }

    pub async fn execute(&self) -> Result<()> {
        let config = Config::load(self.config.as_deref())?;
        let source = self.history_source(&config)?;
        let links = Links::new(self.base_path.as_deref().unwrap_or(&config.api.base_path));

        let progress = LoadProgress::start(&source.to_string());
        let snapshot = match source.load(&self.remote_options(&config)).await {
            Ok(snapshot) => {
                progress.finish(snapshot.job_count());
                snapshot
            }
            Err(e) => {
                progress.fail();
                return Err(anyhow::Error::from(e)
                    .context(format!("Failed to load history from {source}")));
            }
        };

        let report = self.command.report(&snapshot, &links);

        let format = self.format.unwrap_or(config.output.format);
        let pretty = self.pretty || config.output.pretty;

        if let Some(output_path) = &self.output {
            let mut file = std::fs::File::create(output_path)
                .with_context(|| format!("Failed to create {}", output_path.display()))?;
            export_report(&report, format, pretty, &mut file)?;
            info!("Report written to: {}", output_path.display());
        } else {
            export_report(&report, format, pretty, &mut std::io::stdout().lock())?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::fixtures::sample_pipeline;
    use crate::history::{Job, Run, RunResult, Snapshot};
    use chrono::{TimeZone, Utc};

    fn snapshot() -> Snapshot {
        let start = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        Snapshot::from_jobs(vec![Job {
            name: "app".to_string(),
            description: None,
            runs: vec![
                Run::new(1, start).finished(RunResult::Success, 60_000),
                Run::new(2, start)
                    .in_progress()
                    .with_execution(sample_pipeline())
                    .with_log("one\ntwo\nthree"),
            ],
        }])
    }

    fn report_json(args: &[&str]) -> String {
        let cli = Cli::try_parse_from(args).unwrap();
        let report = cli.command.report(&snapshot(), &Links::new("/ci"));
        serde_json::to_string(&report).unwrap()
    }

    #[test]
    fn test_parse_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "stagelens", "run", "app", "2", "log", "-n", "2", "--source", "history.json",
            "--format", "summary", "--pretty",
        ])
        .unwrap();

        assert_eq!(cli.source.as_deref(), Some("history.json"));
        assert_eq!(cli.format, Some(OutputFormat::Summary));
        assert!(cli.pretty);
        assert!(matches!(
            cli.command,
            Commands::Run {
                number: 2,
                action: RunCommand::Log { max_lines: Some(2) },
                ..
            }
        ));
    }

    #[test]
    fn test_job_subcommand_descriptions() {
        use clap::CommandFactory;

        let command = Cli::command();
        let job = command.find_subcommand("job").unwrap();
        let about = |name: &str| {
            job.find_subcommand(name)
                .and_then(|subcommand| subcommand.get_about())
                .map(ToString::to_string)
        };

        assert_eq!(about("index").as_deref(), Some("Job metadata without builds"));
        assert_eq!(about("stages").as_deref(), Some("Every build with its stages"));
    }

    #[test]
    fn test_rejects_non_numeric_run_number() {
        assert!(Cli::try_parse_from(["stagelens", "run", "app", "latest", "index"]).is_err());
    }

    #[test]
    fn test_unknown_job_reports_null() {
        assert_eq!(report_json(&["stagelens", "job", "missing", "index"]), "null");
        assert_eq!(report_json(&["stagelens", "run", "app", "9", "nodes"]), "null");
    }

    #[test]
    fn test_pending_stages_report() {
        let json = report_json(&["stagelens", "job", "app", "pending-stages"]);
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["url"], "/ci/job/app/");
        assert_eq!(value["builds"].as_array().unwrap().len(), 1);
        assert_eq!(value["builds"][0]["number"], 2);
        assert_eq!(value["builds"][0]["stages"].as_array().unwrap().len(), 3);
    }

    #[test]
    fn test_log_report_honors_max_lines() {
        assert_eq!(
            report_json(&["stagelens", "run", "app", "2", "log", "--max-lines", "2"]),
            r#"["one","two"]"#
        );
    }

    #[test]
    fn test_history_source_prefers_flag_over_config() {
        let cli = Cli::try_parse_from(["stagelens", "--source", "a.json", "job", "app", "index"])
            .unwrap();
        let mut config = Config::default();
        config.source.location = Some("b.json".to_string());

        assert_eq!(
            cli.history_source(&config).unwrap(),
            HistorySource::File(PathBuf::from("a.json"))
        );
    }
}
