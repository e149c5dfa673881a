use serde::{Deserialize, Serialize};

use crate::types::{Lovelace, PayloadType};

/// Fund metadata plus the vote plans compiled for it.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Fund {
    #[serde(rename = "id")]
    pub fund_id: u64,
    pub fund_name: String,
    pub voting_power_threshold: Lovelace,
    pub fund_goal: String,
    pub voting_power_info: String,
    pub rewards_info: String,
    pub fund_start_time: String,
    pub fund_end_time: String,
    pub next_fund_start_time: String,
    #[serde(default)]
    pub chain_vote_plans: Vec<VotePlanSummary>,
}

impl Fund {
    pub fn plan(&self, plan_id: &str) -> Option<&VotePlanSummary> {
        self.chain_vote_plans
            .iter()
            .find(|vp| vp.chain_voteplan_id == plan_id)
    }
}

/// One compiled vote plan as exposed to wallets and the servicing station.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct VotePlanSummary {
    /// 1-based row number in the vote plan export.
    #[serde(skip)]
    pub row_id: u32,
    pub chain_voteplan_id: String,
    #[serde(flatten)]
    pub window: PlanWindow,
}

/// Display fields shared by a vote plan and every proposal it contains.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PlanWindow {
    pub chain_vote_start_time: String,
    pub chain_vote_end_time: String,
    pub chain_committee_end_time: String,
    pub chain_voteplan_payload: PayloadType,
    /// Empty for public plans.
    #[serde(default)]
    pub chain_vote_encryption_key: String,
    pub fund_id: u64,
}
