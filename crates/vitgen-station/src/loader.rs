//! Proposal and fund rows.
//!
//! Money columns hold whole ADA and are stored in Lovelace. Impact scores are
//! decimals stored ×100.

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::Deserialize;
use tracing::info;

use vitgen_core::constants::LOVELACE_PER_ADA;
use vitgen_core::error::VitgenError;
use vitgen_core::fund::Fund;
use vitgen_core::proposal::{ChainProposal, Proposal, ProposalCategory, ProposalDetails, Proposer, VoteOptions};
use vitgen_core::types::Lovelace;

use crate::csv_error;

#[derive(Debug, Deserialize)]
struct ProposalRow {
    internal_id: u64,
    category_name: String,
    proposal_id: String,
    proposal_title: String,
    #[serde(default)]
    proposal_summary: String,
    #[serde(default)]
    proposal_problem: String,
    #[serde(default)]
    proposal_solution: String,
    #[serde(default)]
    proposal_url: String,
    #[serde(default)]
    proposal_files_url: String,
    #[serde(default)]
    proposal_public_key: String,
    proposal_funds: String,
    proposal_impact_score: String,
    #[serde(default)]
    proposer_name: String,
    #[serde(default)]
    proposer_email: String,
    #[serde(default)]
    proposer_url: String,
    #[serde(default)]
    proposer_relevant_experience: String,
    chain_vote_options: String,
    #[serde(default)]
    chain_vote_type: String,
    #[serde(default)]
    chain_vote_action: String,
}

#[derive(Debug, Deserialize)]
struct FundRow {
    id: u64,
    fund_name: String,
    voting_power_threshold: String,
    #[serde(default)]
    fund_goal: String,
    #[serde(default)]
    voting_power_info: String,
    #[serde(default)]
    rewards_info: String,
    #[serde(default)]
    fund_start_time: String,
    #[serde(default)]
    fund_end_time: String,
    #[serde(default)]
    next_fund_start_time: String,
}

pub fn load_proposals(path: &Path) -> Result<Vec<Proposal>, VitgenError> {
    let file = File::open(path)?;
    let proposals = read_proposals(file, &path.display().to_string())?;
    info!(path = %path.display(), count = proposals.len(), "proposals loaded");
    Ok(proposals)
}

pub fn load_funds(path: &Path) -> Result<Vec<Fund>, VitgenError> {
    let file = File::open(path)?;
    let funds = read_funds(file, &path.display().to_string())?;
    info!(path = %path.display(), count = funds.len(), "funds loaded");
    Ok(funds)
}

/// Parse proposal rows from `reader`. `source` names the input in errors.
pub fn read_proposals<R: Read>(reader: R, source: &str) -> Result<Vec<Proposal>, VitgenError> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut seen: HashMap<u64, usize> = HashMap::new();
    let mut out = Vec::new();

    for (n, row) in rdr.deserialize::<ProposalRow>().enumerate() {
        let row = row.map_err(|e| csv_error(source, e))?;
        let line = n + 2;
        if let Some(first) = seen.insert(row.internal_id, line) {
            return Err(VitgenError::DataIntegrity(format!(
                "{source}: internal_id {} on line {line} already used on line {first}",
                row.internal_id
            )));
        }
        out.push(proposal_from_row(row).map_err(|e| at_line(source, line, e))?);
    }
    Ok(out)
}

/// Parse fund rows from `reader`. The first row is the current fund.
pub fn read_funds<R: Read>(reader: R, source: &str) -> Result<Vec<Fund>, VitgenError> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut out = Vec::new();

    for (n, row) in rdr.deserialize::<FundRow>().enumerate() {
        let row = row.map_err(|e| csv_error(source, e))?;
        let threshold = ada(&row.voting_power_threshold, "voting_power_threshold")
            .map_err(|e| at_line(source, n + 2, e))?;
        out.push(Fund {
            fund_id: row.id,
            fund_name: row.fund_name,
            voting_power_threshold: threshold,
            fund_goal: row.fund_goal,
            voting_power_info: row.voting_power_info,
            rewards_info: row.rewards_info,
            fund_start_time: row.fund_start_time,
            fund_end_time: row.fund_end_time,
            next_fund_start_time: row.next_fund_start_time,
            chain_vote_plans: Vec::new(),
        });
    }
    Ok(out)
}

fn proposal_from_row(row: ProposalRow) -> Result<Proposal, VitgenError> {
    let vote_options = VoteOptions::parse_list(&row.chain_vote_options);
    if vote_options.is_empty() {
        return Err(VitgenError::DataIntegrity("chain_vote_options is empty".into()));
    }

    Ok(Proposal {
        internal_id: row.internal_id,
        category: ProposalCategory {
            category_id: String::new(),
            category_name: row.category_name,
            category_desc: String::new(),
        },
        details: ProposalDetails {
            proposal_id: row.proposal_id,
            proposal_title: row.proposal_title,
            proposal_summary: row.proposal_summary,
            proposal_problem: row.proposal_problem,
            proposal_solution: row.proposal_solution,
            proposal_url: row.proposal_url,
            proposal_files_url: row.proposal_files_url,
            proposal_public_key: row.proposal_public_key,
            proposal_funds: ada(&row.proposal_funds, "proposal_funds")?,
            proposal_impact_score: score(&row.proposal_impact_score)?,
        },
        proposer: Proposer {
            proposer_name: row.proposer_name,
            proposer_email: row.proposer_email,
            proposer_url: row.proposer_url,
            proposer_relevant_experience: row.proposer_relevant_experience,
        },
        chain: ChainProposal {
            external_id: None,
            index: None,
            vote_options,
            payload: row.chain_vote_type.parse()?,
            vote_action: row.chain_vote_action.parse()?,
            plan_id: None,
        },
    })
}

fn ada(value: &str, column: &str) -> Result<Lovelace, VitgenError> {
    value
        .parse::<u64>()
        .ok()
        .and_then(|a| a.checked_mul(LOVELACE_PER_ADA))
        .ok_or_else(|| VitgenError::DataIntegrity(format!("{column} - expected whole ADA, got [{value}]")))
}

fn score(value: &str) -> Result<i64, VitgenError> {
    let f: f64 = value.parse().map_err(|_| {
        VitgenError::DataIntegrity(format!("proposal_impact_score - expected a number, got [{value}]"))
    })?;
    Ok((f * 100.0).round() as i64)
}

fn at_line(source: &str, line: usize, e: VitgenError) -> VitgenError {
    match e {
        VitgenError::DataIntegrity(msg) => VitgenError::DataIntegrity(format!("{source}:{line}: {msg}")),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vitgen_core::types::{PayloadType, VoteAction};

    const HEADER: &str = "internal_id,category_name,proposal_id,proposal_title,proposal_summary,proposal_problem,proposal_solution,proposal_url,proposal_files_url,proposal_public_key,proposal_funds,proposal_impact_score,proposer_name,proposer_email,proposer_url,proposer_relevant_experience,chain_vote_options,chain_vote_type,chain_vote_action";

    fn csv_of(rows: &[&str]) -> String {
        let mut s = HEADER.to_string();
        for r in rows {
            s.push('\n');
            s.push_str(r);
        }
        s
    }

    #[test]
    fn rows_are_scaled_and_defaulted() {
        let data = csv_of(&[
            r#"1,DeFi,p-1,Title,Sum,Prob,Sol,https://x,https://f,pk1,12000,4.25,Ann,a@x,https://a,Lots,"blank,yes,no",,"#,
            r#"2,DeFi,p-2,Other,,,,,,,5,3,Bo,,,,"yes,no",private,off_chain"#,
        ]);
        let ps = read_proposals(data.as_bytes(), "proposals.csv").unwrap();

        assert_eq!(ps.len(), 2);
        assert_eq!(ps[0].details.proposal_funds, 12_000_000_000);
        assert_eq!(ps[0].details.proposal_impact_score, 425);
        assert_eq!(ps[0].payload(), PayloadType::Public);
        assert_eq!(ps[0].chain.vote_action, VoteAction::OffChain);
        assert_eq!(ps[0].chain.vote_options.index_of("no"), Some(2));
        assert_eq!(ps[1].payload(), PayloadType::Private);
        assert!(ps[1].external_id().is_none());
    }

    #[test]
    fn unknown_vote_action_is_rejected() {
        let data = csv_of(&[r#"1,DeFi,p-1,T,,,,,,,1,1,,,,,"yes,no",public,treasury"#]);
        let err = read_proposals(data.as_bytes(), "proposals.csv").unwrap_err();
        assert!(err.to_string().contains("chain_vote_action"));
        assert!(err.to_string().contains("proposals.csv:2"));
    }

    #[test]
    fn duplicate_internal_ids_are_rejected() {
        let data = csv_of(&[
            r#"1,DeFi,p-1,T,,,,,,,1,1,,,,,"yes,no",,"#,
            r#"1,DeFi,p-2,T,,,,,,,1,1,,,,,"yes,no",,"#,
        ]);
        let err = read_proposals(data.as_bytes(), "proposals.csv").unwrap_err();
        assert_eq!(err.category(), vitgen_core::ErrorCategory::DataIntegrity);
    }

    #[test]
    fn fractional_ada_is_rejected() {
        let data = csv_of(&[r#"1,DeFi,p-1,T,,,,,,,1.5,1,,,,,"yes,no",,"#]);
        assert!(read_proposals(data.as_bytes(), "proposals.csv").is_err());
    }

    #[test]
    fn fund_rows() {
        let data = "id,fund_name,voting_power_threshold,fund_goal,voting_power_info,rewards_info,fund_start_time,fund_end_time,next_fund_start_time\n\
                    4,Fund4,450,Grow,,,,,\n";
        let funds = read_funds(data.as_bytes(), "fund.csv").unwrap();
        assert_eq!(funds[0].fund_id, 4);
        assert_eq!(funds[0].voting_power_threshold, 450_000_000);
        assert!(funds[0].fund_start_time.is_empty());
        assert!(funds[0].chain_vote_plans.is_empty());
    }

    #[test]
    fn loads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("proposals.csv");
        std::fs::write(&path, csv_of(&[r#"9,DeFi,p-9,T,,,,,,,1,1,,,,,"yes,no",,"#])).unwrap();
        assert_eq!(load_proposals(&path).unwrap()[0].internal_id, 9);
        assert!(load_proposals(&dir.path().join("missing.csv")).is_err());
    }
}
