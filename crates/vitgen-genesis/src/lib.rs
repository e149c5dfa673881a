//! vitgen-genesis
//!
//! Accumulates the block0 configuration of a voting ledger and hands it to
//! the genesis encoder.
//!
//! Contents, in insertion order:
//!
//! 1. Blockchain parameters (date, consensus, discrimination, slots, fees)
//! 2. BFT leader ids, plus one funded account per leader
//! 3. Committee member ids, plus one funded account per member
//! 4. Signed vote plan certificates, when plans are embedded in block0
//!
//! A key can only be registered once, and a leader key is never also
//! registered as a committee member.

pub mod block0;
pub mod params;

pub use block0::{Block0Config, BlockchainConfiguration, Initial, InitialFund};
pub use params::{FeesGoTo, GenesisParams, LinearFees, PerCertificateFees, PerVoteCertificateFees};

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use vitgen_core::error::VitgenError;
use vitgen_core::types::Discrimination;
use vitgen_toolchain::{GenesisTool, KeyTool};

/// File name of the encoded genesis block inside the working directory.
pub const BLOCK0_BIN: &str = "block0.bin";
/// File name of the decoded genesis text.
pub const BLOCK0_YAML: &str = "block0.yaml";

pub struct GenesisBuilder {
    config: Block0Config,
    leader_fund: u64,
    committee_fund: u64,
    leaders: HashSet<String>,
    committee: HashSet<String>,
}

impl GenesisBuilder {
    pub fn new(params: &GenesisParams) -> Self {
        Self {
            config: Block0Config {
                blockchain_configuration: BlockchainConfiguration {
                    block0_date: params.block0_date,
                    discrimination: params.discrimination,
                    block0_consensus: "bft".to_string(),
                    slots_per_epoch: params.slots_per_epoch,
                    slot_duration: params.slot_duration,
                    consensus_leader_ids: Vec::new(),
                    committees: Vec::new(),
                    linear_fees: params.linear_fees.clone(),
                    fees_go_to: params.fees_go_to,
                },
                initial: Vec::new(),
            },
            leader_fund: params.leader_fund,
            committee_fund: params.committee_fund,
            leaders: HashSet::new(),
            committee: HashSet::new(),
        }
    }

    fn discrimination(&self) -> Discrimination {
        self.config.blockchain_configuration.discrimination
    }

    /// Register a BFT leader. Returns `false` when the key was already present.
    pub fn add_leader<T: KeyTool + ?Sized>(&mut self, tool: &T, public_key: &str) -> Result<bool, VitgenError> {
        if !self.leaders.insert(public_key.to_string()) {
            warn!(public_key, "duplicate BFT leader skipped");
            return Ok(false);
        }
        self.config
            .blockchain_configuration
            .consensus_leader_ids
            .push(public_key.to_string());

        if self.leader_fund > 0 {
            let account = tool.account_address(public_key, self.discrimination())?;
            self.config.initial.push(Initial::fund(account, self.leader_fund));
        }
        Ok(true)
    }

    /// Register a committee member. Leader keys and repeated keys are skipped.
    pub fn add_committee_member<T: KeyTool + ?Sized>(
        &mut self,
        tool: &T,
        public_key: &str,
    ) -> Result<bool, VitgenError> {
        if self.leaders.contains(public_key) {
            warn!(public_key, "committee member is already a BFT leader, skipped");
            return Ok(false);
        }
        if !self.committee.insert(public_key.to_string()) {
            warn!(public_key, "duplicate committee member skipped");
            return Ok(false);
        }

        let id = tool.public_key_bytes(public_key)?;
        self.config.blockchain_configuration.committees.push(id);

        if self.committee_fund > 0 {
            let account = tool.account_address(public_key, self.discrimination())?;
            self.config.initial.push(Initial::fund(account, self.committee_fund));
        }
        Ok(true)
    }

    pub fn add_certificate(&mut self, cert: impl Into<String>) {
        self.config.initial.push(Initial::cert(cert));
    }

    pub fn config(&self) -> &Block0Config {
        &self.config
    }

    pub fn build(self) -> Block0Config {
        let bc = &self.config.blockchain_configuration;
        info!(
            leaders = bc.consensus_leader_ids.len(),
            committee = bc.committees.len(),
            initial = self.config.initial.len(),
            "block0 configuration built"
        );
        self.config
    }
}

impl Block0Config {
    pub fn to_yaml(&self) -> Result<String, VitgenError> {
        serde_yaml::to_string(self).map_err(|e| VitgenError::Serialization(e.to_string()))
    }
}

// ── Encoding ─────────────────────────────────────────────────────────────────

/// Encoded genesis block plus the forms kept next to it.
#[derive(Clone, Debug)]
pub struct Block0Artifact {
    pub bin: Vec<u8>,
    pub hash: String,
    /// YAML handed to the encoder, extra data included.
    pub source: String,
    /// Text form decoded back from `bin`.
    pub decoded: String,
}

impl Block0Artifact {
    /// Write `block0.bin` and `block0.yaml` into `dir`.
    pub fn write(&self, dir: &Path) -> Result<(PathBuf, PathBuf), VitgenError> {
        let bin = dir.join(BLOCK0_BIN);
        let yaml = dir.join(BLOCK0_YAML);
        fs::write(&bin, &self.bin)?;
        fs::write(&yaml, &self.decoded)?;
        Ok((bin, yaml))
    }
}

/// Serialize `config`, append `extra` verbatim and encode the result.
pub fn encode<T: GenesisTool + ?Sized>(
    tool: &T,
    config: &Block0Config,
    extra: Option<&[u8]>,
) -> Result<Block0Artifact, VitgenError> {
    let mut source = config.to_yaml()?.into_bytes();
    if let Some(extra) = extra.filter(|e| !e.is_empty()) {
        // extra data holds `initial` entries; open the list if nothing else did
        if config.initial.is_empty() {
            source.extend_from_slice(b"initial:\n");
        }
        source.extend_from_slice(extra);
    }

    let bin = tool.encode(&source)?;
    let hash = tool.hash(&bin)?;
    let decoded = tool.decode(&bin)?;

    info!(hash = %hash, bytes = bin.len(), "block0 encoded");
    Ok(Block0Artifact {
        bin,
        hash,
        source: String::from_utf8_lossy(&source).into_owned(),
        decoded,
    })
}
