use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::VitgenError;

/// Unix timestamp (seconds, UTC).
pub type Timestamp = i64;

/// Amount in Lovelace (1 ADA = 1_000_000 Lovelace).
pub type Lovelace = u64;

// ── ChainTime ────────────────────────────────────────────────────────────────

/// Ledger time coordinate. Ordered by `(epoch, slot_id)`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ChainTime {
    pub epoch: u32,
    pub slot_id: u32,
}

impl ChainTime {
    pub fn new(epoch: u32, slot_id: u32) -> Self {
        Self { epoch, slot_id }
    }
}

impl fmt::Display for ChainTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.epoch, self.slot_id)
    }
}

// ── PayloadType ──────────────────────────────────────────────────────────────

/// Whether ballots of a vote plan are cast in the clear or encrypted.
///
/// The declaration order is the order in which payload groups are partitioned.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PayloadType {
    #[default]
    Public,
    Private,
}

impl PayloadType {
    pub const ALL: [PayloadType; 2] = [PayloadType::Public, PayloadType::Private];

    pub fn as_str(&self) -> &'static str {
        match self {
            PayloadType::Public => "public",
            PayloadType::Private => "private",
        }
    }
}

impl fmt::Display for PayloadType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PayloadType {
    type Err = VitgenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" | "public" => Ok(PayloadType::Public),
            "private" => Ok(PayloadType::Private),
            other => Err(VitgenError::DataIntegrity(format!(
                "chain_vote_type - expected one of (public, private) - but [{other}] provided"
            ))),
        }
    }
}

// ── VoteAction ───────────────────────────────────────────────────────────────

/// What the ledger does once a proposal's tally is final.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoteAction {
    #[default]
    OffChain,
}

impl VoteAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            VoteAction::OffChain => "off_chain",
        }
    }
}

impl fmt::Display for VoteAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VoteAction {
    type Err = VitgenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" | "off_chain" => Ok(VoteAction::OffChain),
            other => Err(VitgenError::DataIntegrity(format!(
                "chain_vote_action - expected one of (off_chain) - but [{other}] provided"
            ))),
        }
    }
}

// ── Discrimination ───────────────────────────────────────────────────────────

/// Address discrimination of the target ledger.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Discrimination {
    #[default]
    Production,
    Test,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chain_time_orders_by_epoch_then_slot() {
        assert!(ChainTime::new(0, 4319) < ChainTime::new(1, 0));
        assert!(ChainTime::new(2, 1) < ChainTime::new(2, 2));
        assert_eq!(ChainTime::new(3, 7).to_string(), "3.7");
    }

    #[test]
    fn payload_defaults_to_public_and_rejects_unknown() {
        assert_eq!("".parse::<PayloadType>().unwrap(), PayloadType::Public);
        assert_eq!("private".parse::<PayloadType>().unwrap(), PayloadType::Private);
        assert!("secret".parse::<PayloadType>().is_err());
    }

    #[test]
    fn vote_action_only_accepts_off_chain() {
        assert_eq!("".parse::<VoteAction>().unwrap(), VoteAction::OffChain);
        assert!("treasury".parse::<VoteAction>().is_err());
        assert_eq!(
            serde_json::to_string(&VoteAction::OffChain).unwrap(),
            "\"off_chain\""
        );
    }
}
