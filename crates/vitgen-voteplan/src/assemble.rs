use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use vitgen_clock::ChainWindow;
use vitgen_core::error::VitgenError;
use vitgen_core::proposal::Proposal;
use vitgen_core::types::{ChainTime, PayloadType, VoteAction};
use vitgen_toolchain::{CertificateTool, KeyTool};

use crate::partition::PlanBatch;

/// Vote plan certificate request, in the JSON shape the tool-chain reads.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanDescriptor {
    pub payload_type: PayloadType,
    pub vote_start: ChainTime,
    pub vote_end: ChainTime,
    pub committee_end: ChainTime,
    pub proposals: Vec<DescriptorProposal>,
    /// Committee privacy keys. Always empty for public plans.
    pub committee_member_public_keys: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DescriptorProposal {
    pub external_id: String,
    /// Number of vote options.
    pub options: u8,
    pub action: VoteAction,
}

/// A vote plan after certificate generation.
#[derive(Clone, Debug)]
pub struct VotePlan {
    pub index: usize,
    pub payload: PayloadType,
    pub window: ChainWindow,
    /// Positions in the proposal slice; list position is the in-plan index.
    pub members: Vec<usize>,
    pub committee_keys: Vec<String>,
    /// Election key of private plans.
    pub encryption_key: Option<String>,
    /// Pretty JSON of the descriptor as submitted.
    pub descriptor: String,
    pub unsigned_cert: String,
    pub signed_cert: Option<String>,
    pub plan_id: String,
}

#[derive(Clone, Debug, Default)]
pub struct AssemblyConfig {
    /// Committee privacy keys for private plans.
    pub committee_keys: Vec<String>,
    /// Sign every certificate so it can be embedded in block0.
    pub embed_in_block0: bool,
    /// Secret key file of the signing leader.
    pub signer: Option<PathBuf>,
}

/// Committee privacy keys only make sense when private proposals exist.
pub fn check_committee_keys(proposals: &[Proposal], committee_keys: &[String]) -> Result<(), VitgenError> {
    let has_private = proposals.iter().any(|p| p.payload() == PayloadType::Private);
    if !has_private && !committee_keys.is_empty() {
        return Err(VitgenError::Config(
            "committee privacy keys provided, but no private proposals found".into(),
        ));
    }
    Ok(())
}

/// Generate certificates for every batch, in ascending plan index order.
///
/// Nothing is submitted to the tool-chain unless the signer and committee
/// preconditions hold for every batch.
pub fn assemble_plans<T>(
    tool: &T,
    proposals: &[Proposal],
    batches: &[PlanBatch],
    window: ChainWindow,
    config: &AssemblyConfig,
) -> Result<Vec<VotePlan>, VitgenError>
where
    T: CertificateTool + KeyTool + ?Sized,
{
    check_committee_keys(proposals, &config.committee_keys)?;

    let signer: Vec<PathBuf> = match (&config.signer, config.embed_in_block0) {
        (Some(key), true) => vec![key.clone()],
        (None, true) => return Err(VitgenError::MissingSigner),
        (_, false) => Vec::new(),
    };

    let first_private = batches.iter().find(|b| b.payload == PayloadType::Private);
    let encryption_key = match first_private {
        Some(b) if config.committee_keys.is_empty() => {
            return Err(VitgenError::MissingCommitteeKeys { plan_index: b.index });
        }
        Some(_) => Some(tool.vote_encryption_key(&config.committee_keys)?),
        None => None,
    };

    let mut ordered: Vec<&PlanBatch> = batches.iter().collect();
    ordered.sort_by_key(|b| b.index);

    let mut plans = Vec::with_capacity(ordered.len());
    for batch in ordered {
        let private = batch.payload == PayloadType::Private;
        let committee_keys = if private {
            config.committee_keys.clone()
        } else {
            Vec::new()
        };

        let descriptor = PlanDescriptor {
            payload_type: batch.payload,
            vote_start: window.vote_start,
            vote_end: window.vote_end,
            committee_end: window.committee_end,
            proposals: batch
                .members
                .iter()
                .map(|&m| describe(&proposals[m]))
                .collect::<Result<_, _>>()?,
            committee_member_public_keys: committee_keys.clone(),
        };
        let descriptor = serde_json::to_string_pretty(&descriptor)?;

        let unsigned_cert = tool.new_vote_plan_certificate(descriptor.as_bytes())?;
        let plan_id = tool.vote_plan_id(&unsigned_cert)?;
        let signed_cert = if signer.is_empty() {
            None
        } else {
            Some(tool.sign_certificate(&unsigned_cert, &signer)?)
        };

        debug!(
            index = batch.index,
            payload = %batch.payload,
            members = batch.members.len(),
            plan_id = %plan_id,
            signed = signed_cert.is_some(),
            "vote plan certificate generated"
        );

        plans.push(VotePlan {
            index: batch.index,
            payload: batch.payload,
            window,
            members: batch.members.clone(),
            committee_keys,
            encryption_key: if private { encryption_key.clone() } else { None },
            descriptor,
            unsigned_cert,
            signed_cert,
            plan_id,
        });
    }

    info!(plans = plans.len(), "vote plans assembled");
    Ok(plans)
}

fn describe(p: &Proposal) -> Result<DescriptorProposal, VitgenError> {
    let external_id = p.external_id().ok_or_else(|| {
        VitgenError::DataIntegrity(format!("proposal {} has no external id", p.internal_id))
    })?;
    let options = u8::try_from(p.chain.vote_options.len()).map_err(|_| {
        VitgenError::DataIntegrity(format!(
            "proposal {} has {} vote options, at most 255 are supported",
            p.internal_id,
            p.chain.vote_options.len()
        ))
    })?;
    Ok(DescriptorProposal {
        external_id: external_id.to_string(),
        options,
        action: p.chain.vote_action,
    })
}
