//! Serialized block0 configuration, in the layout the genesis encoder reads.

use serde::{Deserialize, Serialize};

use vitgen_core::types::{Discrimination, Lovelace, Timestamp};

use crate::params::{FeesGoTo, LinearFees};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Block0Config {
    pub blockchain_configuration: BlockchainConfiguration,
    /// Kept last so appended extra data extends this list.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub initial: Vec<Initial>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BlockchainConfiguration {
    pub block0_date: Timestamp,
    pub discrimination: Discrimination,
    pub block0_consensus: String,
    pub slots_per_epoch: u32,
    pub slot_duration: u8,
    pub consensus_leader_ids: Vec<String>,
    #[serde(default)]
    pub committees: Vec<String>,
    pub linear_fees: LinearFees,
    pub fees_go_to: FeesGoTo,
}

/// One `initial` entry: either a batch of funded accounts or a certificate.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Initial {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fund: Option<Vec<InitialFund>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cert: Option<String>,
}

impl Initial {
    pub fn fund(address: impl Into<String>, value: Lovelace) -> Self {
        Self {
            fund: Some(vec![InitialFund {
                address: address.into(),
                value,
            }]),
            cert: None,
        }
    }

    pub fn cert(cert: impl Into<String>) -> Self {
        Self {
            fund: None,
            cert: Some(cert.into()),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitialFund {
    pub address: String,
    pub value: Lovelace,
}
