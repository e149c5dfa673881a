use std::collections::HashMap;
use std::io::Write;

use anyhow::Context;
use tracing::{info, warn};

use vitgen_core::constants::LEGACY_TALLY_OPTION_COLUMNS;
use vitgen_core::dataset::ProposalRecord;

use crate::ledger::{NodeVotePlan, NodeVoteProposal};

/// A proposal with the node's final counts, when it has any.
#[derive(Clone, Debug, PartialEq)]
pub struct TallyRow {
    pub record: ProposalRecord,
    pub votes_cast: Option<u64>,
    /// Per-option counts, indexed like the proposal's vote options.
    pub results: Vec<u64>,
}

/// Attach node tallies to the proposal records.
pub fn reconcile(records: Vec<ProposalRecord>, plans: &[NodeVotePlan]) -> Vec<TallyRow> {
    let by_slot: HashMap<(&str, u8), &NodeVoteProposal> = plans
        .iter()
        .flat_map(|plan| plan.proposals.iter().map(move |p| ((plan.id.as_str(), p.index), p)))
        .collect();

    let mut matched = 0usize;
    let rows: Vec<TallyRow> = records
        .into_iter()
        .map(|record| {
            let found = match (record.plan_id.as_deref(), record.proposal.chain.index) {
                (Some(plan_id), Some(index)) => by_slot
                    .get(&(plan_id, index))
                    .filter(|p| record.proposal.external_id() == Some(p.proposal_id.as_str()))
                    .copied(),
                _ => None,
            };
            let (votes_cast, results) = match found {
                Some(p) => {
                    matched += 1;
                    (Some(p.votes_cast), p.results().map(<[u64]>::to_vec).unwrap_or_default())
                }
                None => (None, Vec::new()),
            };
            TallyRow {
                record,
                votes_cast,
                results,
            }
        })
        .collect();

    info!(proposals = rows.len(), matched, "tallies reconciled");
    rows
}

const FIXED_COLUMNS: [&str; 12] = [
    "internal_id",
    "proposal_id",
    "proposal_title",
    "category_name",
    "proposal_funds",
    "proposal_impact_score",
    "chain_proposal_id",
    "chain_voteplan_id",
    "chain_proposal_index",
    "chain_vote_type",
    "chain_vote_options",
    "votes_cast",
];

/// Write the rows as CSV with one `tally_{n}` column per option of the
/// widest proposal. Returns the number of tally columns.
pub fn write_csv<W: Write>(writer: W, rows: &[TallyRow]) -> anyhow::Result<usize> {
    let width = rows
        .iter()
        .map(|r| r.results.len().max(r.record.proposal.chain.vote_options.len()))
        .max()
        .unwrap_or(0);
    if width > LEGACY_TALLY_OPTION_COLUMNS {
        warn!(
            columns = width,
            legacy = LEGACY_TALLY_OPTION_COLUMNS,
            "proposals have more vote options than the legacy result layout"
        );
    }

    let mut out = csv::Writer::from_writer(writer);
    let mut header: Vec<String> = FIXED_COLUMNS.iter().map(|c| c.to_string()).collect();
    header.extend((0..width).map(|n| format!("tally_{n}")));
    out.write_record(&header).context("writing tally header")?;

    for row in rows {
        let p = &row.record.proposal;
        let mut record = vec![
            p.internal_id.to_string(),
            p.details.proposal_id.clone(),
            p.details.proposal_title.clone(),
            p.category.category_name.clone(),
            p.details.proposal_funds.to_string(),
            p.details.proposal_impact_score.to_string(),
            p.external_id().unwrap_or_default().to_string(),
            row.record.plan_id.clone().unwrap_or_default(),
            p.chain.index.map(|i| i.to_string()).unwrap_or_default(),
            p.chain.payload.to_string(),
            p.chain.vote_options.to_list(),
            row.votes_cast.map(|v| v.to_string()).unwrap_or_default(),
        ];
        record.extend((0..width).map(|n| row.results.get(n).map(|v| v.to_string()).unwrap_or_default()));
        out.write_record(&record)
            .with_context(|| format!("writing tally row for proposal {}", p.internal_id))?;
    }
    out.flush().context("flushing tally csv")?;
    Ok(width)
}
