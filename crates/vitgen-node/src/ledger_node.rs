//! Configuration and lifecycle of the ledger node the gateway proxies to.

use std::fs::{self, File};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use serde::{Deserialize, Serialize};
use tokio::process::{Child, Command};
use tracing::{info, warn};

use vitgen_core::error::VitgenError;
use vitgen_genesis::BLOCK0_BIN;
use vitgen_toolchain::find_executable;

use crate::leaders::Leader;

pub const NODE_BINARY: &str = "jormungandr";
pub const NODE_CONFIG_FILE: &str = "node-config.yaml";
pub const STDOUT_LOG: &str = "stdout.log";
pub const STDERR_LOG: &str = "stderr.log";

/// Node options chosen on the command line.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeSettings {
    pub rest_listen: SocketAddr,
    /// Public P2P address; the node also listens on it.
    pub p2p_address: SocketAddr,
    pub cors_allowed_origins: Vec<String>,
    pub log_level: String,
    pub explorer: bool,
    pub skip_bootstrap: bool,
}

impl Default for NodeSettings {
    fn default() -> Self {
        Self {
            rest_listen: SocketAddr::from(([0, 0, 0, 0], 8001)),
            p2p_address: SocketAddr::from(([127, 0, 0, 1], 9001)),
            cors_allowed_origins: Vec::new(),
            log_level: "warn".into(),
            explorer: false,
            skip_bootstrap: true,
        }
    }
}

// ── node-config.yaml ─────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NodeConfig {
    pub storage: PathBuf,
    pub log: LogConfig,
    pub rest: RestConfig,
    pub p2p: P2pConfig,
    pub explorer: ExplorerConfig,
    pub skip_bootstrap: bool,
    pub bootstrap_from_trusted_peers: bool,
    pub secret_files: Vec<PathBuf>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LogConfig {
    pub level: String,
    pub format: String,
    pub output: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RestConfig {
    pub listen: SocketAddr,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cors: Option<CorsConfig>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
    pub max_age_secs: u64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct P2pConfig {
    pub public_address: String,
    pub listen_address: String,
    pub allow_private_addresses: bool,
    pub max_bootstrap_attempts: u32,
    #[serde(default)]
    pub trusted_peers: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExplorerConfig {
    pub enabled: bool,
}

/// Secret config handed to the node for each leader it runs.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BftSecret {
    pub bft: BftSigningKey,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BftSigningKey {
    pub signing_key: String,
}

fn multiaddr(addr: SocketAddr) -> String {
    match addr {
        SocketAddr::V4(a) => format!("/ip4/{}/tcp/{}", a.ip(), a.port()),
        SocketAddr::V6(a) => format!("/ip6/{}/tcp/{}", a.ip(), a.port()),
    }
}

impl NodeConfig {
    pub fn new(settings: &NodeSettings, working_dir: &Path, secret_files: Vec<PathBuf>) -> Self {
        let cors = (!settings.cors_allowed_origins.is_empty()).then(|| CorsConfig {
            allowed_origins: settings.cors_allowed_origins.clone(),
            max_age_secs: 0,
        });
        let p2p = multiaddr(settings.p2p_address);
        Self {
            storage: working_dir.join("storage"),
            log: LogConfig {
                level: settings.log_level.clone(),
                format: "plain".into(),
                output: "stderr".into(),
            },
            rest: RestConfig {
                listen: settings.rest_listen,
                cors,
            },
            p2p: P2pConfig {
                public_address: p2p.clone(),
                listen_address: p2p,
                allow_private_addresses: true,
                max_bootstrap_attempts: 5,
                trusted_peers: Vec::new(),
            },
            explorer: ExplorerConfig {
                enabled: settings.explorer,
            },
            skip_bootstrap: settings.skip_bootstrap,
            bootstrap_from_trusted_peers: true,
            secret_files,
        }
    }

    pub fn write(&self, dir: &Path) -> Result<PathBuf, VitgenError> {
        let path = dir.join(NODE_CONFIG_FILE);
        fs::write(&path, to_yaml(self)?)?;
        Ok(path)
    }
}

/// Write `{n}_bft_secret.key.yaml` for every leader whose secret key is held
/// locally. Returns the written paths in leader order.
pub fn write_secret_configs(dir: &Path, leaders: &[Leader]) -> Result<Vec<PathBuf>, VitgenError> {
    let mut written = Vec::new();
    for (n, leader) in leaders.iter().enumerate() {
        let Some(secret) = &leader.secret else { continue };
        let path = dir.join(format!("{n}_bft_secret.key.yaml"));
        let config = BftSecret {
            bft: BftSigningKey {
                signing_key: secret.key.clone(),
            },
        };
        fs::write(&path, to_yaml(&config)?)?;
        written.push(path);
    }
    Ok(written)
}

fn to_yaml<T: Serialize>(value: &T) -> Result<String, VitgenError> {
    serde_yaml::to_string(value).map_err(|e| VitgenError::Serialization(e.to_string()))
}

// ── Process ──────────────────────────────────────────────────────────────────

/// Running ledger node. Output goes to `stdout.log` and `stderr.log` in the
/// working directory.
pub struct NodeProcess {
    child: Child,
}

impl NodeProcess {
    /// Locate the node binary (tool directory first, then `PATH`) and start it.
    pub fn spawn(tool_dir: Option<&Path>, working_dir: &Path, config: &Path) -> Result<Self, VitgenError> {
        let bin = find_executable(NODE_BINARY, tool_dir)?;
        Self::spawn_binary(&bin, working_dir, config)
    }

    pub fn spawn_binary(bin: &Path, working_dir: &Path, config: &Path) -> Result<Self, VitgenError> {
        let stdout = File::create(working_dir.join(STDOUT_LOG))?;
        let stderr = File::create(working_dir.join(STDERR_LOG))?;

        let child = Command::new(bin)
            .arg("--genesis-block")
            .arg(working_dir.join(BLOCK0_BIN))
            .arg("--config")
            .arg(config)
            .current_dir(working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::from(stdout))
            .stderr(Stdio::from(stderr))
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| VitgenError::external_tool(bin.display().to_string(), e.to_string()))?;

        info!(bin = %bin.display(), pid = child.id().unwrap_or_default(), "ledger node started");
        Ok(Self { child })
    }

    /// Wait until the node exits or the process receives Ctrl-C or SIGTERM,
    /// in which case the node is killed first.
    pub async fn wait(mut self) -> Result<(), VitgenError> {
        tokio::select! {
            status = self.child.wait() => {
                let status = status?;
                if status.success() {
                    info!("ledger node exited");
                } else {
                    warn!(%status, "ledger node exited with failure");
                }
            }
            _ = shutdown_signal() => {
                info!("shutdown signal received, stopping ledger node");
                self.child.kill().await?;
            }
        }
        Ok(())
    }
}

/// Resolves on Ctrl-C, or SIGTERM on unix. A handler that cannot be
/// installed never fires.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "cannot listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                term.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "cannot listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leaders::LeaderSecret;

    fn leader(pk: &str, secret: Option<&str>) -> Leader {
        Leader {
            public_key: pk.into(),
            secret: secret.map(|s| LeaderSecret {
                key: s.into(),
                file: PathBuf::from(format!("{s}.key")),
            }),
        }
    }

    #[test]
    fn node_config_layout() {
        let settings = NodeSettings {
            cors_allowed_origins: vec!["https://a.example".into(), "https://b.example".into()],
            ..Default::default()
        };
        let cfg = NodeConfig::new(&settings, Path::new("/work"), vec![PathBuf::from("/work/0_bft_secret.key.yaml")]);
        let yaml: serde_yaml::Value = serde_yaml::from_str(&to_yaml(&cfg).unwrap()).unwrap();

        assert_eq!(yaml["storage"].as_str(), Some("/work/storage"));
        assert_eq!(yaml["rest"]["listen"].as_str(), Some("0.0.0.0:8001"));
        assert_eq!(yaml["rest"]["cors"]["max_age_secs"].as_u64(), Some(0));
        assert_eq!(yaml["p2p"]["public_address"].as_str(), Some("/ip4/127.0.0.1/tcp/9001"));
        assert_eq!(yaml["p2p"]["max_bootstrap_attempts"].as_u64(), Some(5));
        assert_eq!(yaml["log"]["level"].as_str(), Some("warn"));
        assert_eq!(yaml["skip_bootstrap"].as_bool(), Some(true));
        assert_eq!(yaml["secret_files"][0].as_str(), Some("/work/0_bft_secret.key.yaml"));
    }

    #[test]
    fn cors_section_is_omitted_without_origins() {
        let cfg = NodeConfig::new(&NodeSettings::default(), Path::new("w"), Vec::new());
        assert!(cfg.rest.cors.is_none());
        assert!(!to_yaml(&cfg).unwrap().contains("cors"));
    }

    #[test]
    fn secret_configs_only_for_local_keys() {
        let dir = tempfile::tempdir().unwrap();
        let leaders = [leader("pk0", Some("sk0")), leader("pk1", None), leader("pk2", Some("sk2"))];
        let written = write_secret_configs(dir.path(), &leaders).unwrap();
        assert_eq!(
            written,
            vec![
                dir.path().join("0_bft_secret.key.yaml"),
                dir.path().join("2_bft_secret.key.yaml")
            ]
        );
        let secret: BftSecret = serde_yaml::from_str(&fs::read_to_string(&written[1]).unwrap()).unwrap();
        assert_eq!(secret.bft.signing_key, "sk2");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn node_output_is_captured() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let bin = dir.path().join("fake-node");
        fs::write(&bin, "#!/bin/sh\necho \"started $*\"\necho oops >&2\n").unwrap();
        fs::set_permissions(&bin, fs::Permissions::from_mode(0o755)).unwrap();

        let node = NodeProcess::spawn_binary(&bin, dir.path(), &dir.path().join(NODE_CONFIG_FILE)).unwrap();
        node.wait().await.unwrap();

        let out = fs::read_to_string(dir.path().join(STDOUT_LOG)).unwrap();
        assert!(out.starts_with("started --genesis-block"));
        assert!(out.contains("--config"));
        assert_eq!(fs::read_to_string(dir.path().join(STDERR_LOG)).unwrap(), "oops\n");
    }
}
