use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use vitgen_core::constants::{DEFAULT_COMMITTEE_FUND, DEFAULT_LEADER_FUND};
use vitgen_core::error::VitgenError;
use vitgen_core::types::{Discrimination, Lovelace, Timestamp};

/// Ledger parameters fixed at genesis.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisParams {
    pub block0_date: Timestamp,
    pub discrimination: Discrimination,
    pub slot_duration: u8,
    pub slots_per_epoch: u32,
    pub linear_fees: LinearFees,
    pub fees_go_to: FeesGoTo,
    /// Initial balance of each leader account. Zero skips the account.
    pub leader_fund: Lovelace,
    /// Initial balance of each committee account. Zero skips the account.
    pub committee_fund: Lovelace,
}

impl Default for GenesisParams {
    fn default() -> Self {
        Self {
            block0_date: 0,
            discrimination: Discrimination::Production,
            slot_duration: 20,
            slots_per_epoch: 4_320,
            linear_fees: LinearFees::default(),
            fees_go_to: FeesGoTo::Rewards,
            leader_fund: DEFAULT_LEADER_FUND,
            committee_fund: DEFAULT_COMMITTEE_FUND,
        }
    }
}

/// Fee schedule. All amounts in Lovelace.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinearFees {
    pub constant: u64,
    pub coefficient: u64,
    pub certificate: u64,
    pub per_certificate_fees: PerCertificateFees,
    pub per_vote_certificate_fees: PerVoteCertificateFees,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerCertificateFees {
    pub certificate_pool_registration: u64,
    pub certificate_stake_delegation: u64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerVoteCertificateFees {
    pub certificate_vote_plan: u64,
    pub certificate_vote_cast: u64,
}

/// Where collected fees end up.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeesGoTo {
    #[default]
    Rewards,
    Treasury,
}

impl fmt::Display for FeesGoTo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeesGoTo::Rewards => f.write_str("rewards"),
            FeesGoTo::Treasury => f.write_str("treasury"),
        }
    }
}

impl FromStr for FeesGoTo {
    type Err = VitgenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "rewards" => Ok(FeesGoTo::Rewards),
            "treasury" => Ok(FeesGoTo::Treasury),
            other => Err(VitgenError::Config(format!(
                "fees go to - expected one of (rewards, treasury) - but [{other}] provided"
            ))),
        }
    }
}
