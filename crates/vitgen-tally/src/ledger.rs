//! Vote plan state as reported by the node's `/api/v0/vote/active/plans`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use vitgen_core::types::ChainTime;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NodeVotePlan {
    pub id: String,
    pub payload: String,
    pub vote_start: ChainTime,
    pub vote_end: ChainTime,
    pub committee_end: ChainTime,
    #[serde(default)]
    pub committee_member_keys: Vec<String>,
    pub proposals: Vec<NodeVoteProposal>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NodeVoteProposal {
    pub index: u8,
    /// External id of the proposal.
    pub proposal_id: String,
    pub options: OptionRange,
    /// Keyed by payload kind (`Public` or `Private`); absent until tallied.
    #[serde(default)]
    pub tally: Option<BTreeMap<String, TallyState>>,
    #[serde(default)]
    pub votes_cast: u64,
}

/// Half-open range of option indices.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionRange {
    pub start: u8,
    pub end: u8,
}

/// Public tallies carry `result` directly; private ones only once decrypted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TallyState {
    #[serde(default)]
    pub result: Option<TallyResult>,
    #[serde(default)]
    pub state: Option<PrivateTallyState>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PrivateTallyState {
    #[serde(rename = "Decrypted", default)]
    pub decrypted: Option<DecryptedTally>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DecryptedTally {
    pub result: TallyResult,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TallyResult {
    pub options: OptionRange,
    pub results: Vec<u64>,
}

impl NodeVoteProposal {
    /// Final per-option counts. `None` unless exactly one payload was tallied
    /// and its result is readable.
    pub fn results(&self) -> Option<&[u64]> {
        let tally = self.tally.as_ref()?;
        if tally.len() != 1 {
            return None;
        }
        let state = tally.values().next()?;
        let result = state
            .result
            .as_ref()
            .or_else(|| state.state.as_ref()?.decrypted.as_ref().map(|d| &d.result))?;
        Some(&result.results)
    }
}
