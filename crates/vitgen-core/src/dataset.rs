use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::fund::{Fund, PlanWindow, VotePlanSummary};
use crate::proposal::Proposal;

/// The compiled election: proposals, funds and the encoded genesis block.
///
/// Built and mutated by the compiler only. Once compilation finishes it is
/// wrapped in an `Arc` and handed to the gateway, which never mutates it.
#[derive(Clone, Debug, Default)]
pub struct CompiledDataset {
    proposals: Vec<Proposal>,
    funds: Vec<Fund>,
    block0: Vec<u8>,
    block0_hash: String,
}

impl CompiledDataset {
    pub fn new(proposals: Vec<Proposal>, funds: Vec<Fund>) -> Self {
        Self {
            proposals,
            funds,
            block0: Vec::new(),
            block0_hash: String::new(),
        }
    }

    pub fn set_block0(&mut self, bin: Vec<u8>, hash: String) {
        self.block0 = bin;
        self.block0_hash = hash;
    }

    pub fn proposals(&self) -> &[Proposal] {
        &self.proposals
    }

    pub fn funds(&self) -> &[Fund] {
        &self.funds
    }

    /// The fund this run compiles for: the first fund row.
    pub fn current_fund(&self) -> Option<&Fund> {
        self.funds.first()
    }

    /// Mutable access to proposals and the current fund at the same time.
    pub fn parts_mut(&mut self) -> (&mut [Proposal], Option<&mut Fund>) {
        (&mut self.proposals, self.funds.first_mut())
    }

    pub fn proposals_mut(&mut self) -> &mut [Proposal] {
        &mut self.proposals
    }

    /// Look a proposal up by its internal id as it appears in a URL path.
    pub fn proposal(&self, internal_id: &str) -> Option<&Proposal> {
        let id: u64 = internal_id.parse().ok()?;
        self.proposals.iter().find(|p| p.internal_id == id)
    }

    /// Plan id → summary table for the current fund.
    pub fn plan_lookup(&self) -> HashMap<&str, &VotePlanSummary> {
        self.current_fund()
            .map(|f| {
                f.chain_vote_plans
                    .iter()
                    .map(|vp| (vp.chain_voteplan_id.as_str(), vp))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Proposal joined with its vote plan window.
    pub fn record(&self, proposal: &Proposal) -> ProposalRecord {
        let plans = self.plan_lookup();
        ProposalRecord::join(proposal, &plans)
    }

    pub fn records(&self) -> Vec<ProposalRecord> {
        let plans = self.plan_lookup();
        self.proposals
            .iter()
            .map(|p| ProposalRecord::join(p, &plans))
            .collect()
    }

    pub fn block0(&self) -> &[u8] {
        &self.block0
    }

    pub fn block0_hash(&self) -> &str {
        &self.block0_hash
    }
}

/// Denormalized proposal view served by the gateway and exported to the
/// servicing station.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ProposalRecord {
    #[serde(flatten)]
    pub proposal: Proposal,
    #[serde(rename = "chain_voteplan_id", default)]
    pub plan_id: Option<String>,
    #[serde(flatten)]
    pub plan: Option<PlanWindow>,
}

impl ProposalRecord {
    fn join(proposal: &Proposal, plans: &HashMap<&str, &VotePlanSummary>) -> Self {
        let plan_id = proposal.chain.plan_id.clone();
        let plan = plan_id
            .as_deref()
            .and_then(|id| plans.get(id))
            .map(|vp| vp.window.clone());
        Self {
            proposal: proposal.clone(),
            plan_id,
            plan,
        }
    }

    /// Back to the normalized form: the plan id becomes the foreign key again.
    pub fn into_proposal(self) -> Proposal {
        let mut proposal = self.proposal;
        proposal.chain.plan_id = self.plan_id;
        proposal
    }
}
