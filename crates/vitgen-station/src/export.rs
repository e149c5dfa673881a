//! `sql_*.csv` exports consumed by the servicing station import.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::info;

use vitgen_core::dataset::{CompiledDataset, ProposalRecord};
use vitgen_core::error::VitgenError;
use vitgen_core::fund::{Fund, VotePlanSummary};
use vitgen_core::types::{Lovelace, PayloadType, VoteAction};

use crate::csv_error;

pub const FUNDS_CSV: &str = "sql_funds.csv";
pub const VOTEPLANS_CSV: &str = "sql_voteplans.csv";
pub const PROPOSALS_CSV: &str = "sql_proposals.csv";

/// A serializable export line and its column names, in field order.
trait ExportRow: Serialize {
    const COLUMNS: &'static [&'static str];
}

#[derive(Serialize)]
struct FundRow<'a> {
    id: u64,
    fund_name: &'a str,
    voting_power_threshold: Lovelace,
    fund_goal: &'a str,
    voting_power_info: &'a str,
    rewards_info: &'a str,
    fund_start_time: &'a str,
    fund_end_time: &'a str,
    next_fund_start_time: &'a str,
}

impl ExportRow for FundRow<'_> {
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "fund_name",
        "voting_power_threshold",
        "fund_goal",
        "voting_power_info",
        "rewards_info",
        "fund_start_time",
        "fund_end_time",
        "next_fund_start_time",
    ];
}

impl<'a> From<&'a Fund> for FundRow<'a> {
    fn from(f: &'a Fund) -> Self {
        Self {
            id: f.fund_id,
            fund_name: &f.fund_name,
            voting_power_threshold: f.voting_power_threshold,
            fund_goal: &f.fund_goal,
            voting_power_info: &f.voting_power_info,
            rewards_info: &f.rewards_info,
            fund_start_time: &f.fund_start_time,
            fund_end_time: &f.fund_end_time,
            next_fund_start_time: &f.next_fund_start_time,
        }
    }
}

#[derive(Serialize)]
struct VotePlanRow<'a> {
    id: u32,
    chain_voteplan_id: &'a str,
    chain_vote_start_time: &'a str,
    chain_vote_end_time: &'a str,
    chain_committee_end_time: &'a str,
    chain_voteplan_payload: PayloadType,
    chain_vote_encryption_key: &'a str,
    fund_id: u64,
}

impl ExportRow for VotePlanRow<'_> {
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "chain_voteplan_id",
        "chain_vote_start_time",
        "chain_vote_end_time",
        "chain_committee_end_time",
        "chain_voteplan_payload",
        "chain_vote_encryption_key",
        "fund_id",
    ];
}

impl<'a> From<&'a VotePlanSummary> for VotePlanRow<'a> {
    fn from(vp: &'a VotePlanSummary) -> Self {
        Self {
            id: vp.row_id,
            chain_voteplan_id: &vp.chain_voteplan_id,
            chain_vote_start_time: &vp.window.chain_vote_start_time,
            chain_vote_end_time: &vp.window.chain_vote_end_time,
            chain_committee_end_time: &vp.window.chain_committee_end_time,
            chain_voteplan_payload: vp.window.chain_voteplan_payload,
            chain_vote_encryption_key: &vp.window.chain_vote_encryption_key,
            fund_id: vp.window.fund_id,
        }
    }
}

/// One denormalized proposal line. Plan columns stay empty for unlinked rows.
#[derive(Serialize)]
struct ProposalRow {
    internal_id: u64,
    category_name: String,
    proposal_id: String,
    proposal_title: String,
    proposal_summary: String,
    proposal_problem: String,
    proposal_solution: String,
    proposal_url: String,
    proposal_files_url: String,
    proposal_public_key: String,
    proposal_funds: Lovelace,
    proposal_impact_score: i64,
    proposer_name: String,
    proposer_email: String,
    proposer_url: String,
    proposer_relevant_experience: String,
    chain_proposal_id: String,
    chain_proposal_index: Option<u8>,
    chain_vote_options: String,
    chain_vote_type: PayloadType,
    chain_vote_action: VoteAction,
    chain_voteplan_id: String,
    chain_vote_start_time: String,
    chain_vote_end_time: String,
    chain_committee_end_time: String,
    chain_voteplan_payload: Option<PayloadType>,
    chain_vote_encryption_key: String,
    fund_id: Option<u64>,
}

impl ExportRow for ProposalRow {
    const COLUMNS: &'static [&'static str] = &[
        "internal_id",
        "category_name",
        "proposal_id",
        "proposal_title",
        "proposal_summary",
        "proposal_problem",
        "proposal_solution",
        "proposal_url",
        "proposal_files_url",
        "proposal_public_key",
        "proposal_funds",
        "proposal_impact_score",
        "proposer_name",
        "proposer_email",
        "proposer_url",
        "proposer_relevant_experience",
        "chain_proposal_id",
        "chain_proposal_index",
        "chain_vote_options",
        "chain_vote_type",
        "chain_vote_action",
        "chain_voteplan_id",
        "chain_vote_start_time",
        "chain_vote_end_time",
        "chain_committee_end_time",
        "chain_voteplan_payload",
        "chain_vote_encryption_key",
        "fund_id",
    ];
}

impl From<ProposalRecord> for ProposalRow {
    fn from(r: ProposalRecord) -> Self {
        let p = r.proposal;
        let plan = r.plan.unwrap_or_default();
        let linked = r.plan_id.is_some();
        Self {
            internal_id: p.internal_id,
            category_name: p.category.category_name,
            proposal_id: p.details.proposal_id,
            proposal_title: p.details.proposal_title,
            proposal_summary: p.details.proposal_summary,
            proposal_problem: p.details.proposal_problem,
            proposal_solution: p.details.proposal_solution,
            proposal_url: p.details.proposal_url,
            proposal_files_url: p.details.proposal_files_url,
            proposal_public_key: p.details.proposal_public_key,
            proposal_funds: p.details.proposal_funds,
            proposal_impact_score: p.details.proposal_impact_score,
            proposer_name: p.proposer.proposer_name,
            proposer_email: p.proposer.proposer_email,
            proposer_url: p.proposer.proposer_url,
            proposer_relevant_experience: p.proposer.proposer_relevant_experience,
            chain_proposal_id: p.chain.external_id.unwrap_or_default(),
            chain_proposal_index: p.chain.index,
            chain_vote_options: p.chain.vote_options.to_list(),
            chain_vote_type: p.chain.payload,
            chain_vote_action: p.chain.vote_action,
            chain_voteplan_id: r.plan_id.unwrap_or_default(),
            chain_vote_start_time: plan.chain_vote_start_time,
            chain_vote_end_time: plan.chain_vote_end_time,
            chain_committee_end_time: plan.chain_committee_end_time,
            chain_voteplan_payload: linked.then_some(plan.chain_voteplan_payload),
            chain_vote_encryption_key: plan.chain_vote_encryption_key,
            fund_id: linked.then_some(plan.fund_id),
        }
    }
}

/// Write the three exports into `dir` and return their paths.
pub fn write_exports(dir: &Path, dataset: &CompiledDataset) -> Result<Vec<PathBuf>, VitgenError> {
    std::fs::create_dir_all(dir)?;

    let funds = dir.join(FUNDS_CSV);
    write_rows(&funds, dataset.current_fund().map(FundRow::from))?;

    let plans = dir.join(VOTEPLANS_CSV);
    let summaries = dataset
        .current_fund()
        .map(|f| f.chain_vote_plans.as_slice())
        .unwrap_or_default();
    write_rows(&plans, summaries.iter().map(VotePlanRow::from))?;

    let proposals = dir.join(PROPOSALS_CSV);
    write_rows(&proposals, dataset.records().into_iter().map(ProposalRow::from))?;

    info!(
        dir = %dir.display(),
        plans = summaries.len(),
        proposals = dataset.proposals().len(),
        "station exports written"
    );
    Ok(vec![funds, plans, proposals])
}

/// The header is written up front so an export without rows still names its columns.
fn write_rows<T, I>(path: &Path, rows: I) -> Result<(), VitgenError>
where
    T: ExportRow,
    I: IntoIterator<Item = T>,
{
    let source = path.display().to_string();
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .map_err(|e| csv_error(&source, e))?;
    wtr.write_record(T::COLUMNS).map_err(|e| csv_error(&source, e))?;
    for row in rows {
        wtr.serialize(row).map_err(|e| csv_error(&source, e))?;
    }
    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use vitgen_core::fund::PlanWindow;
    use vitgen_core::proposal::{ChainProposal, Proposal, VoteOptions};

    fn dataset() -> CompiledDataset {
        let proposal = |id: u64, plan: Option<&str>| Proposal {
            internal_id: id,
            category: Default::default(),
            details: Default::default(),
            proposer: Default::default(),
            chain: ChainProposal {
                external_id: Some(format!("ext{id}")),
                index: plan.map(|_| 0),
                vote_options: VoteOptions::parse_list("blank,yes,no"),
                plan_id: plan.map(str::to_string),
                ..Default::default()
            },
        };
        let fund = Fund {
            fund_id: 4,
            fund_name: "Fund4".into(),
            chain_vote_plans: vec![VotePlanSummary {
                row_id: 1,
                chain_voteplan_id: "vp-a".into(),
                window: PlanWindow {
                    chain_vote_start_time: "2021-01-01T00:00:00Z".into(),
                    fund_id: 4,
                    ..Default::default()
                },
            }],
            ..Default::default()
        };
        CompiledDataset::new(vec![proposal(1, Some("vp-a")), proposal(2, None)], vec![fund])
    }

    #[test]
    fn writes_three_files_with_headers() {
        let dir = tempfile::tempdir().unwrap();
        let written = write_exports(dir.path(), &dataset()).unwrap();
        assert_eq!(written.len(), 3);

        let funds = std::fs::read_to_string(dir.path().join(FUNDS_CSV)).unwrap();
        assert!(funds.starts_with("id,fund_name,voting_power_threshold,"));
        assert!(funds.contains("4,Fund4,0,"));

        let plans = std::fs::read_to_string(dir.path().join(VOTEPLANS_CSV)).unwrap();
        let mut lines = plans.lines();
        assert!(lines.next().unwrap().starts_with("id,chain_voteplan_id,"));
        assert!(lines.next().unwrap().starts_with("1,vp-a,2021-01-01T00:00:00Z,"));

        let proposals = std::fs::read_to_string(dir.path().join(PROPOSALS_CSV)).unwrap();
        let rows: Vec<&str> = proposals.lines().collect();
        assert_eq!(rows.len(), 3);
        assert!(rows[1].contains("\"blank,yes,no\",public,off_chain,vp-a,2021-01-01T00:00:00Z"));
        assert!(rows[2].ends_with(",,,,,,,"));
    }

    /// Header line csv derives from the struct fields.
    fn derived_header<T: Serialize>(row: T) -> String {
        let mut wtr = csv::Writer::from_writer(Vec::new());
        wtr.serialize(row).unwrap();
        let bytes = wtr.into_inner().unwrap();
        String::from_utf8(bytes).unwrap().lines().next().unwrap().to_string()
    }

    #[test]
    fn column_lists_follow_the_row_fields() {
        let ds = dataset();
        let fund = ds.current_fund().unwrap();
        assert_eq!(derived_header(FundRow::from(fund)), FundRow::COLUMNS.join(","));
        assert_eq!(
            derived_header(VotePlanRow::from(&fund.chain_vote_plans[0])),
            VotePlanRow::COLUMNS.join(",")
        );
        assert_eq!(
            derived_header(ProposalRow::from(ds.records().remove(0))),
            ProposalRow::COLUMNS.join(",")
        );
    }

    #[test]
    fn empty_dataset_still_writes_headers() {
        let dir = tempfile::tempdir().unwrap();
        write_exports(dir.path(), &CompiledDataset::default()).unwrap();
        for (name, columns) in [
            (FUNDS_CSV, FundRow::COLUMNS),
            (VOTEPLANS_CSV, VotePlanRow::COLUMNS),
            (PROPOSALS_CSV, ProposalRow::COLUMNS),
        ] {
            let text = std::fs::read_to_string(dir.path().join(name)).unwrap();
            assert_eq!(text, format!("{}\n", columns.join(",")), "{name}");
        }
    }
}
