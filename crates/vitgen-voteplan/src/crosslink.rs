//! Write vote plan results back into the dataset.

use tracing::info;

use vitgen_clock::{ChainClock, FundSchedule, TimeFormat};
use vitgen_core::error::VitgenError;
use vitgen_core::fund::{Fund, PlanWindow, VotePlanSummary};
use vitgen_core::proposal::Proposal;

use crate::assemble::VotePlan;

/// Link proposals to their plans and rebuild the fund's plan list.
///
/// Every member gets its list position as in-plan index and the plan id as
/// foreign key. The fund's summaries are replaced wholesale, so running this
/// twice over the same plans leaves identical records.
pub fn cross_link(
    proposals: &mut [Proposal],
    fund: &mut Fund,
    plans: &[VotePlan],
    clock: &ChainClock,
    format: &TimeFormat,
) -> Result<(), VitgenError> {
    let mut summaries = Vec::with_capacity(plans.len());

    for (i, plan) in plans.iter().enumerate() {
        for (pos, &member) in plan.members.iter().enumerate() {
            let index = u8::try_from(pos).map_err(|_| {
                VitgenError::DataIntegrity(format!("vote plan {} has more than 256 members", plan.plan_id))
            })?;
            let proposal = proposals.get_mut(member).ok_or_else(|| {
                VitgenError::DataIntegrity(format!("vote plan {} references unknown proposal #{member}", plan.plan_id))
            })?;
            proposal.chain.index = Some(index);
            proposal.chain.plan_id = Some(plan.plan_id.clone());
        }

        summaries.push(VotePlanSummary {
            row_id: i as u32 + 1,
            chain_voteplan_id: plan.plan_id.clone(),
            window: PlanWindow {
                chain_vote_start_time: format.format(clock.to_instant(plan.window.vote_start)),
                chain_vote_end_time: format.format(clock.to_instant(plan.window.vote_end)),
                chain_committee_end_time: format.format(clock.to_instant(plan.window.committee_end)),
                chain_voteplan_payload: plan.payload,
                chain_vote_encryption_key: plan.encryption_key.clone().unwrap_or_default(),
                fund_id: fund.fund_id,
            },
        });
    }

    fund.chain_vote_plans = summaries;
    info!(
        fund = fund.fund_id,
        plans = plans.len(),
        proposals = plans.iter().map(|p| p.members.len()).sum::<usize>(),
        "proposals and fund cross-linked"
    );
    Ok(())
}

/// Fill the fund's informational timestamps that the input left empty.
pub fn apply_fund_defaults(fund: &mut Fund, schedule: &FundSchedule, format: &TimeFormat) {
    fill(&mut fund.fund_start_time, format.format(schedule.fund_start));
    fill(&mut fund.fund_end_time, format.format(schedule.fund_end));
    // voting power info follows the fund start, even when that came from the input
    let start = fund.fund_start_time.clone();
    fill(&mut fund.voting_power_info, start);
    fill(&mut fund.rewards_info, format.format(schedule.rewards_info));
    fill(&mut fund.next_fund_start_time, format.format(schedule.next_fund_start));
}

fn fill(field: &mut String, value: String) {
    if field.is_empty() {
        *field = value;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use vitgen_clock::{VoteWindow, WindowConfig};
    use vitgen_core::proposal::ChainProposal;
    use vitgen_core::types::PayloadType;

    const GENESIS: i64 = 1_609_459_200;

    fn clock() -> ChainClock {
        ChainClock::new(GENESIS, Duration::from_secs(20), Duration::from_secs(86_400)).unwrap()
    }

    fn proposals(n: usize) -> Vec<Proposal> {
        (0..n)
            .map(|i| Proposal {
                internal_id: i as u64 + 1,
                category: Default::default(),
                details: Default::default(),
                proposer: Default::default(),
                chain: ChainProposal {
                    payload: if i < 3 { PayloadType::Public } else { PayloadType::Private },
                    ..Default::default()
                },
            })
            .collect()
    }

    fn plans() -> Vec<VotePlan> {
        let window = VoteWindow::resolve(&clock(), &WindowConfig::default())
            .unwrap()
            .to_chain(&clock())
            .unwrap();
        let plan = |index: usize, payload, members: Vec<usize>, id: &str, key: Option<&str>| VotePlan {
            index,
            payload,
            window,
            members,
            committee_keys: vec![],
            encryption_key: key.map(str::to_string),
            descriptor: String::new(),
            unsigned_cert: String::new(),
            signed_cert: None,
            plan_id: id.into(),
        };
        vec![
            plan(0, PayloadType::Public, vec![0, 1], "vp-0", None),
            plan(1, PayloadType::Public, vec![2], "vp-1", None),
            plan(2, PayloadType::Private, vec![3, 4], "vp-2", Some("votepk")),
        ]
    }

    #[test]
    fn indices_and_foreign_keys_follow_plan_order() {
        let mut ps = proposals(5);
        let mut fund = Fund {
            fund_id: 9,
            ..Default::default()
        };
        cross_link(&mut ps, &mut fund, &plans(), &clock(), &TimeFormat::default()).unwrap();

        assert_eq!(ps[1].chain.index, Some(1));
        assert_eq!(ps[2].chain.index, Some(0));
        assert_eq!(ps[2].chain.plan_id.as_deref(), Some("vp-1"));
        assert_eq!(ps[4].chain.plan_id.as_deref(), Some("vp-2"));

        assert_eq!(fund.chain_vote_plans.len(), 3);
        let last = &fund.chain_vote_plans[2];
        assert_eq!(last.row_id, 3);
        assert_eq!(last.window.fund_id, 9);
        assert_eq!(last.window.chain_vote_encryption_key, "votepk");
        assert_eq!(last.window.chain_vote_start_time, "2021-01-01T00:00:00Z");
        assert_eq!(last.window.chain_committee_end_time, "2021-01-08T00:00:00Z");
        assert!(fund.chain_vote_plans[0].window.chain_vote_encryption_key.is_empty());
    }

    #[test]
    fn cross_linking_twice_is_idempotent() {
        let mut ps = proposals(5);
        let mut fund = Fund::default();
        cross_link(&mut ps, &mut fund, &plans(), &clock(), &TimeFormat::default()).unwrap();
        let (ps_once, fund_once) = (ps.clone(), fund.clone());
        cross_link(&mut ps, &mut fund, &plans(), &clock(), &TimeFormat::default()).unwrap();
        assert_eq!(ps, ps_once);
        assert_eq!(fund, fund_once);
    }

    #[test]
    fn fund_defaults_only_fill_gaps() {
        let window = VoteWindow::resolve(&clock(), &WindowConfig::default()).unwrap();
        let schedule = window.fund_schedule(&clock());
        let mut fund = Fund {
            fund_end_time: "whenever".into(),
            ..Default::default()
        };
        apply_fund_defaults(&mut fund, &schedule, &TimeFormat::default());

        assert_eq!(fund.fund_start_time, "2021-01-01T00:00:00Z");
        assert_eq!(fund.fund_end_time, "whenever");
        assert_eq!(fund.voting_power_info, fund.fund_start_time);
        assert_eq!(fund.rewards_info, "2021-01-15T00:00:00Z");
        assert_eq!(fund.next_fund_start_time, "2021-01-23T00:00:00Z");
    }
}
