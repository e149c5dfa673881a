use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context};
use serde::de::DeserializeOwned;
use tracing::debug;

/// Where a JSON document comes from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Source {
    Http(String),
    File(PathBuf),
}

impl Source {
    /// `base` joined with `endpoint`. `http(s)://` is fetched, `file://` and
    /// scheme-less locations are read from disk.
    pub fn parse(base: &str, endpoint: &str) -> anyhow::Result<Self> {
        let location = format!("{}{}", base.trim_end_matches('/'), endpoint);
        if location.starts_with("http://") || location.starts_with("https://") {
            return Ok(Source::Http(location));
        }
        if let Some(path) = location.strip_prefix("file://") {
            return Ok(Source::File(PathBuf::from(path)));
        }
        if let Some((scheme, _)) = location.split_once("://") {
            bail!("unknown scheme [{scheme}] in [{location}]");
        }
        Ok(Source::File(PathBuf::from(location)))
    }
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Source::Http(url) => f.write_str(url),
            Source::File(path) => write!(f, "file://{}", path.display()),
        }
    }
}

/// Reads JSON documents over HTTP or from disk.
pub struct DataClient {
    client: reqwest::Client,
}

impl DataClient {
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("building http client")?;
        Ok(Self { client })
    }

    pub async fn fetch<T: DeserializeOwned>(&self, source: &Source) -> anyhow::Result<T> {
        let bytes = match source {
            Source::Http(url) => {
                let resp = self
                    .client
                    .get(url)
                    .send()
                    .await
                    .with_context(|| format!("requesting {url}"))?;
                if !resp.status().is_success() {
                    bail!("{url} answered {}", resp.status());
                }
                resp.bytes().await.with_context(|| format!("reading {url}"))?.to_vec()
            }
            Source::File(path) => {
                tokio::fs::read(path).await.with_context(|| format!("reading {}", path.display()))?
            }
        };
        debug!(%source, bytes = bytes.len(), "document fetched");
        serde_json::from_slice(&bytes).with_context(|| format!("parsing {source}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_locations() {
        assert_eq!(
            Source::parse("http://127.0.0.1:8000/", "/api/v0/fund").unwrap(),
            Source::Http("http://127.0.0.1:8000/api/v0/fund".into())
        );
        assert_eq!(
            Source::parse("file:///tmp/dump", "/plans.json").unwrap(),
            Source::File(PathBuf::from("/tmp/dump/plans.json"))
        );
        assert_eq!(
            Source::parse("", "plans.json").unwrap(),
            Source::File(PathBuf::from("plans.json"))
        );
        assert!(Source::parse("ftp://host", "/x").is_err());
    }

    #[tokio::test]
    async fn fetches_from_disk_and_http() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fund.json");
        std::fs::write(&path, r#"{"id": 3}"#).unwrap();

        let client = DataClient::new(Duration::from_secs(5)).unwrap();
        let doc: serde_json::Value = client.fetch(&Source::File(path)).await.unwrap();
        assert_eq!(doc["id"], 3);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = axum::Router::new()
            .route("/ok", axum::routing::get(|| async { r#"{"id": 4}"# }))
            .route(
                "/gone",
                axum::routing::get(|| async { (axum::http::StatusCode::NOT_FOUND, "{}") }),
            );
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        let doc: serde_json::Value = client
            .fetch(&Source::Http(format!("http://{addr}/ok")))
            .await
            .unwrap();
        assert_eq!(doc["id"], 4);
        assert!(client
            .fetch::<serde_json::Value>(&Source::Http(format!("http://{addr}/gone")))
            .await
            .is_err());
    }
}
