use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use vitgen_clock::{ChainClock, TimeFormat, VoteWindow, WindowConfig};
use vitgen_core::constants::{DEFAULT_COMMITTEE_FUND, DEFAULT_LEADER_FUND, DEFAULT_PLAN_SIZE};
use vitgen_core::error::VitgenError;
use vitgen_core::types::{Discrimination, Lovelace, Timestamp};
use vitgen_genesis::{FeesGoTo, GenesisParams, LinearFees};
use vitgen_voteplan::validate_plan_size;

use crate::ledger_node::NodeSettings;

/// File name of the configuration copy kept in the working directory.
pub const CONFIG_FILE: &str = "vitgen-config.yaml";

/// Where BFT leader keys come from.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderConfig {
    /// Secret key files; the first one signs vote plan certificates.
    pub secret_key_files: Vec<PathBuf>,
    pub public_keys: Vec<String>,
    /// Keys are generated until at least this many leaders exist.
    pub min_count: usize,
}

impl Default for LeaderConfig {
    fn default() -> Self {
        Self {
            secret_key_files: Vec::new(),
            public_keys: Vec::new(),
            min_count: 1,
        }
    }
}

/// Everything one compilation run needs.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompilerConfig {
    pub genesis_time: Timestamp,
    pub slot_duration: Duration,
    pub epoch_duration: Duration,
    pub window: WindowConfig,
    pub max_plan_size: usize,
    /// Sign the plan certificates and put them into block0.
    pub embed_plans_in_block0: bool,
    pub leaders: LeaderConfig,
    /// Committee members registered in block0.
    pub committee_auth_keys: Vec<String>,
    /// Privacy keys the election key of private plans is derived from.
    pub committee_privacy_keys: Vec<String>,
    pub discrimination: Discrimination,
    pub leader_fund: Lovelace,
    pub committee_fund: Lovelace,
    pub linear_fees: LinearFees,
    pub fees_go_to: FeesGoTo,
    /// strftime pattern for the human readable plan windows.
    pub time_format: String,
    pub proposals_csv: PathBuf,
    pub fund_csv: PathBuf,
    /// Raw YAML appended to the generated block0 configuration.
    pub extra_genesis_data: Option<PathBuf>,
    pub working_dir: PathBuf,
    pub node: NodeSettings,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            genesis_time: 0,
            slot_duration: Duration::from_secs(20),
            epoch_duration: Duration::from_secs(24 * 3_600),
            window: WindowConfig::default(),
            max_plan_size: DEFAULT_PLAN_SIZE,
            embed_plans_in_block0: false,
            leaders: LeaderConfig::default(),
            committee_auth_keys: Vec::new(),
            committee_privacy_keys: Vec::new(),
            discrimination: Discrimination::Production,
            leader_fund: DEFAULT_LEADER_FUND,
            committee_fund: DEFAULT_COMMITTEE_FUND,
            linear_fees: LinearFees::default(),
            fees_go_to: FeesGoTo::Rewards,
            time_format: String::new(),
            proposals_csv: PathBuf::from("assets/proposals.csv"),
            fund_csv: PathBuf::from("assets/fund.csv"),
            extra_genesis_data: None,
            working_dir: PathBuf::from("."),
            node: NodeSettings::default(),
        }
    }
}

/// Time grid and window checked against each other.
#[derive(Clone, Debug)]
pub struct ResolvedTime {
    pub clock: ChainClock,
    pub window: VoteWindow,
    pub format: TimeFormat,
}

impl CompilerConfig {
    /// Check every limit and boundary. Nothing is loaded or partitioned yet.
    pub fn validate(&self) -> Result<ResolvedTime, VitgenError> {
        validate_plan_size(self.max_plan_size)?;
        if self.leaders.min_count == 0 {
            return Err(VitgenError::Config("at least one BFT leader is required".into()));
        }
        if let Some(path) = self.extra_genesis_data.as_deref().filter(|p| !p.is_file()) {
            return Err(VitgenError::Config(format!(
                "extra genesis data {} not found",
                path.display()
            )));
        }

        let clock = ChainClock::new(self.genesis_time, self.slot_duration, self.epoch_duration)?;
        let window = VoteWindow::resolve(&clock, &self.window)?;
        let format = TimeFormat::new(self.time_format.clone())?;

        debug!(
            genesis = clock.genesis(),
            slot_duration = clock.slot_duration(),
            slots_per_epoch = clock.slots_per_epoch(),
            max_plan_size = self.max_plan_size,
            "configuration validated"
        );
        Ok(ResolvedTime { clock, window, format })
    }

    pub fn genesis_params(&self, clock: &ChainClock) -> GenesisParams {
        GenesisParams {
            block0_date: clock.genesis(),
            discrimination: self.discrimination,
            slot_duration: clock.slot_duration(),
            slots_per_epoch: clock.slots_per_epoch(),
            linear_fees: self.linear_fees.clone(),
            fees_go_to: self.fees_go_to,
            leader_fund: self.leader_fund,
            committee_fund: self.committee_fund,
        }
    }

    /// Keep a copy of the configuration next to the artifacts it produced.
    pub fn write(&self, dir: &Path) -> Result<PathBuf, VitgenError> {
        let path = dir.join(CONFIG_FILE);
        let yaml = serde_yaml::to_string(self).map_err(|e| VitgenError::Serialization(e.to_string()))?;
        fs::write(&path, yaml)?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vitgen_core::ErrorCategory;

    const GENESIS: Timestamp = 1_609_459_200;

    fn config() -> CompilerConfig {
        CompilerConfig {
            genesis_time: GENESIS,
            ..Default::default()
        }
    }

    #[test]
    fn defaults_validate() {
        let t = config().validate().unwrap();
        assert_eq!(t.clock.slots_per_epoch(), 4_320);
        assert_eq!(t.window.vote_start, GENESIS);
        assert_eq!(t.format.pattern(), "%Y-%m-%dT%H:%M:%SZ");
    }

    #[test]
    fn plan_size_out_of_range_is_a_config_error() {
        for size in [0, 257] {
            let cfg = CompilerConfig {
                max_plan_size: size,
                ..config()
            };
            assert_eq!(cfg.validate().unwrap_err().category(), ErrorCategory::Config);
        }
    }

    #[test]
    fn misaligned_vote_end_is_rejected() {
        let mut cfg = config();
        cfg.window.vote_end = Some(GENESIS + 3_601);
        assert!(matches!(
            cfg.validate(),
            Err(VitgenError::MisalignedBoundary { boundary: "vote end", .. })
        ));
    }

    #[test]
    fn needs_a_leader() {
        let mut cfg = config();
        cfg.leaders.min_count = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn configured_extra_genesis_data_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = CompilerConfig {
            extra_genesis_data: Some(dir.path().join("extra_genesis_data.yaml")),
            ..config()
        };
        let err = cfg.validate().unwrap_err();
        assert_eq!(err.category(), ErrorCategory::Config);
        assert!(err.to_string().contains("extra_genesis_data.yaml"));

        std::fs::write(dir.path().join("extra_genesis_data.yaml"), "").unwrap();
        assert!(cfg.validate().is_ok());
        cfg.extra_genesis_data = None;
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn written_copy_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = CompilerConfig {
            committee_privacy_keys: vec!["p256k1_memberpk1a".into()],
            ..config()
        };
        let path = cfg.write(dir.path()).unwrap();
        let back: CompilerConfig = serde_yaml::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(back, cfg);
    }
}
