//! BFT leader resolution.
//!
//! Leaders are collected in a fixed order: secret key files, then bare
//! public keys, then freshly generated keys until the configured minimum is
//! reached. A key seen twice is skipped and does not count towards the
//! minimum.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use vitgen_core::error::VitgenError;
use vitgen_toolchain::KeyTool;

use crate::config::LeaderConfig;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Leader {
    pub public_key: String,
    /// Present when this process holds the secret key.
    pub secret: Option<LeaderSecret>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LeaderSecret {
    pub key: String,
    pub file: PathBuf,
}

/// Resolve the leader set. Generated secrets are written to
/// `{n}_bft_secret.key` inside `dir`, `n` being the leader's position.
pub fn resolve_leaders<T: KeyTool + ?Sized>(
    tool: &T,
    config: &LeaderConfig,
    dir: &Path,
) -> Result<Vec<Leader>, VitgenError> {
    let mut seen = HashSet::new();
    let mut leaders = Vec::new();

    for file in &config.secret_key_files {
        let key = fs::read_to_string(file)
            .map_err(|e| VitgenError::Config(format!("reading leader secret {}: {e}", file.display())))?
            .trim()
            .to_string();
        let public_key = tool.public_key(&key)?;
        if !seen.insert(public_key.clone()) {
            warn!(file = %file.display(), public_key = %public_key, "duplicate leader secret key skipped");
            continue;
        }
        leaders.push(Leader {
            public_key,
            secret: Some(LeaderSecret {
                key,
                file: file.clone(),
            }),
        });
    }

    for public_key in &config.public_keys {
        if !seen.insert(public_key.clone()) {
            warn!(public_key = %public_key, "duplicate leader public key skipped");
            continue;
        }
        leaders.push(Leader {
            public_key: public_key.clone(),
            secret: None,
        });
    }

    let provided = leaders.len();
    while leaders.len() < config.min_count {
        let key = tool.generate_secret_key()?;
        let public_key = tool.public_key(&key)?;
        if !seen.insert(public_key.clone()) {
            return Err(VitgenError::external_tool(
                "key generate",
                format!("generated key {public_key} collides with an existing leader"),
            ));
        }
        let file = dir.join(format!("{}_bft_secret.key", leaders.len()));
        fs::write(&file, &key)?;
        leaders.push(Leader {
            public_key,
            secret: Some(LeaderSecret { key, file }),
        });
    }

    info!(
        leaders = leaders.len(),
        provided,
        generated = leaders.len() - provided,
        "BFT leaders resolved"
    );
    Ok(leaders)
}

/// Key file of the first leader whose secret is held locally.
pub fn signer(leaders: &[Leader]) -> Option<&Path> {
    leaders
        .iter()
        .find_map(|l| l.secret.as_ref().map(|s| s.file.as_path()))
}
