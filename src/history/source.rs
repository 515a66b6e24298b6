use std::path::PathBuf;
use std::time::Duration;

use log::info;
use url::Url;

use super::remote::RemoteClient;
use super::snapshot::{Snapshot, SnapshotFormat};
use crate::auth::Token;
use crate::error::{Result, StageLensError};

/// Settings used when the history lives behind HTTP.
#[derive(Debug, Clone)]
pub struct RemoteOptions {
    pub token: Option<Token>,
    pub max_retries: u32,
    pub retry_delay: Duration,
}

/// Where a history export is read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistorySource {
    File(PathBuf),
    Remote(Url),
}

impl HistorySource {
    /// Treats `http://` and `https://` locations as remote, anything else as a path.
    pub fn parse(location: &str) -> Result<Self> {
        let location = location.trim();
        if location.is_empty() {
            return Err(StageLensError::Config(
                "History source location is empty".to_string(),
            ));
        }

        if location.starts_with("http://") || location.starts_with("https://") {
            let url = Url::parse(location)
                .map_err(|e| StageLensError::Config(format!("Invalid history URL: {e}")))?;
            Ok(Self::Remote(url))
        } else {
            Ok(Self::File(PathBuf::from(location)))
        }
    }

    pub async fn load(&self, options: &RemoteOptions) -> Result<Snapshot> {
        match self {
            Self::File(path) => Snapshot::load(path),
            Self::Remote(url) => {
                let client = RemoteClient::new(
                    options.token.clone(),
                    options.max_retries,
                    options.retry_delay,
                )?;
                let body = client.fetch_text(url).await?;
                let snapshot = Snapshot::parse(&body, SnapshotFormat::from_path(url.path()))?;
                info!("Loaded history from: {url}");
                Ok(snapshot)
            }
        }
    }
}

impl std::fmt::Display for HistorySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Remote(url) => write!(f, "{url}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::Chronology;

    fn options() -> RemoteOptions {
        RemoteOptions {
            token: None,
            max_retries: 0,
            retry_delay: Duration::from_millis(1),
        }
    }

    #[test]
    fn test_parse_file_and_remote_locations() {
        assert_eq!(
            HistorySource::parse("exports/history.json").unwrap(),
            HistorySource::File(PathBuf::from("exports/history.json"))
        );
        assert!(matches!(
            HistorySource::parse("https://ci.example.com/history.yaml").unwrap(),
            HistorySource::Remote(_)
        ));
        assert!(HistorySource::parse("  ").is_err());
        assert!(HistorySource::parse("http://").is_err());
    }

    #[tokio::test]
    async fn test_load_remote_yaml_export() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/exports/history.yaml")
            .with_status(200)
            .with_body("jobs:\n  - name: app\n")
            .create_async()
            .await;

        let source = HistorySource::parse(&format!("{}/exports/history.yaml", server.url())).unwrap();
        let snapshot = source.load(&options()).await.unwrap();

        assert!(snapshot.job("app").is_some());
    }

    #[tokio::test]
    async fn test_load_local_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");
        std::fs::write(&path, r#"{"jobs": [{"name": "app"}]}"#).unwrap();

        let source = HistorySource::File(path);
        let snapshot = source.load(&options()).await.unwrap();

        assert_eq!(snapshot.job_count(), 1);
    }
}
