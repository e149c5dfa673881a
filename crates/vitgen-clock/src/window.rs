//! Vote and committee windows.
//!
//! Boundaries are resolved in order: vote start (defaults to genesis), vote
//! end (defaults to start + vote duration), committee end (defaults to vote
//! end + committee duration). Each must not precede the previous one and must
//! sit on the slot grid.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use vitgen_core::constants::{NEXT_FUND_EPOCHS, REWARDS_INFO_EPOCHS};
use vitgen_core::error::VitgenError;
use vitgen_core::types::{ChainTime, Timestamp};

use crate::clock::ChainClock;

/// Requested window boundaries. Unset boundaries fall back to durations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowConfig {
    pub vote_start: Option<Timestamp>,
    pub vote_end: Option<Timestamp>,
    pub committee_end: Option<Timestamp>,
    pub vote_duration: Duration,
    pub committee_duration: Duration,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            vote_start: None,
            vote_end: None,
            committee_end: None,
            vote_duration: Duration::from_secs(144 * 3_600),
            committee_duration: Duration::from_secs(24 * 3_600),
        }
    }
}

/// Resolved, validated window boundaries in wall-clock time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteWindow {
    pub vote_start: Timestamp,
    pub vote_end: Timestamp,
    pub committee_end: Timestamp,
}

/// The same boundaries in ledger time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainWindow {
    pub vote_start: ChainTime,
    pub vote_end: ChainTime,
    pub committee_end: ChainTime,
}

/// Informational fund timestamps derived from the window.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FundSchedule {
    pub fund_start: Timestamp,
    pub fund_end: Timestamp,
    pub voting_power_info: Timestamp,
    pub rewards_info: Timestamp,
    pub next_fund_start: Timestamp,
}

impl VoteWindow {
    pub fn resolve(clock: &ChainClock, config: &WindowConfig) -> Result<Self, VitgenError> {
        let slot_secs = clock.slot_duration() as u64;
        check_duration("vote", config.vote_duration, slot_secs)?;
        check_duration("committee", config.committee_duration, slot_secs)?;

        let genesis = clock.genesis();

        let vote_start = config.vote_start.unwrap_or(genesis);
        check_order("vote start", vote_start, "genesis", genesis)?;
        clock.require_aligned("vote start", vote_start)?;

        let vote_end = config
            .vote_end
            .unwrap_or(vote_start + config.vote_duration.as_secs() as i64);
        check_order("vote end", vote_end, "vote start", vote_start)?;
        clock.require_aligned("vote end", vote_end)?;

        let committee_end = config
            .committee_end
            .unwrap_or(vote_end + config.committee_duration.as_secs() as i64);
        check_order("committee end", committee_end, "vote end", vote_end)?;
        clock.require_aligned("committee end", committee_end)?;

        debug!(vote_start, vote_end, committee_end, "vote window resolved");
        Ok(Self {
            vote_start,
            vote_end,
            committee_end,
        })
    }

    pub fn to_chain(&self, clock: &ChainClock) -> Result<ChainWindow, VitgenError> {
        Ok(ChainWindow {
            vote_start: clock.to_chain_time(self.vote_start)?,
            vote_end: clock.to_chain_time(self.vote_end)?,
            committee_end: clock.to_chain_time(self.committee_end)?,
        })
    }

    pub fn fund_schedule(&self, clock: &ChainClock) -> FundSchedule {
        let epoch = clock.epoch_duration_secs() as i64;
        FundSchedule {
            fund_start: self.vote_start,
            fund_end: self.vote_end,
            voting_power_info: self.vote_start,
            rewards_info: self.committee_end + REWARDS_INFO_EPOCHS as i64 * epoch,
            next_fund_start: self.committee_end + NEXT_FUND_EPOCHS as i64 * epoch,
        }
    }
}

fn check_duration(name: &'static str, d: Duration, slot_secs: u64) -> Result<(), VitgenError> {
    let secs = d.as_secs();
    if d.subsec_nanos() != 0 || secs == 0 || secs % slot_secs != 0 {
        return Err(VitgenError::InvalidWindowDuration {
            name,
            secs,
            slot_secs,
        });
    }
    Ok(())
}

fn check_order(
    boundary: &'static str,
    instant: Timestamp,
    earlier: &'static str,
    earlier_instant: Timestamp,
) -> Result<(), VitgenError> {
    if instant < earlier_instant {
        return Err(VitgenError::BoundaryOrder {
            boundary,
            instant,
            earlier,
            earlier_instant,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const GENESIS: Timestamp = 1_609_459_200;

    fn clock() -> ChainClock {
        ChainClock::new(GENESIS, Duration::from_secs(20), Duration::from_secs(86_400)).unwrap()
    }

    #[test]
    fn defaults_chain_from_genesis() {
        let w = VoteWindow::resolve(&clock(), &WindowConfig::default()).unwrap();
        assert_eq!(w.vote_start, GENESIS);
        assert_eq!(w.vote_end, GENESIS + 144 * 3_600);
        assert_eq!(w.committee_end, GENESIS + 168 * 3_600);

        let chain = w.to_chain(&clock()).unwrap();
        assert_eq!(chain.vote_start, ChainTime::new(0, 0));
        assert_eq!(chain.vote_end, ChainTime::new(6, 0));
        assert_eq!(chain.committee_end, ChainTime::new(7, 0));
    }

    #[test]
    fn vote_start_at_genesis_is_accepted() {
        let cfg = WindowConfig {
            vote_start: Some(GENESIS),
            ..Default::default()
        };
        assert!(VoteWindow::resolve(&clock(), &cfg).is_ok());
    }

    #[test]
    fn vote_start_before_genesis_is_rejected() {
        let cfg = WindowConfig {
            vote_start: Some(GENESIS - 20),
            ..Default::default()
        };
        let err = VoteWindow::resolve(&clock(), &cfg).unwrap_err();
        assert!(matches!(err, VitgenError::BoundaryOrder { boundary: "vote start", .. }));
    }

    #[test]
    fn vote_end_before_vote_start_is_rejected() {
        let cfg = WindowConfig {
            vote_start: Some(GENESIS + 3_600),
            vote_end: Some(GENESIS + 1_800),
            ..Default::default()
        };
        let err = VoteWindow::resolve(&clock(), &cfg).unwrap_err();
        assert!(matches!(err, VitgenError::BoundaryOrder { boundary: "vote end", .. }));
    }

    #[test]
    fn misaligned_committee_end_is_rejected() {
        let cfg = WindowConfig {
            committee_end: Some(GENESIS + 168 * 3_600 + 10),
            ..Default::default()
        };
        let err = VoteWindow::resolve(&clock(), &cfg).unwrap_err();
        assert!(matches!(
            err,
            VitgenError::MisalignedBoundary {
                boundary: "committee end",
                step_secs: 20,
                ..
            }
        ));
    }

    #[test]
    fn durations_must_fit_the_slot_grid() {
        let cfg = WindowConfig {
            vote_duration: Duration::from_secs(3_610),
            ..Default::default()
        };
        assert!(matches!(
            VoteWindow::resolve(&clock(), &cfg),
            Err(VitgenError::InvalidWindowDuration { name: "vote", .. })
        ));
    }

    #[test]
    fn fund_schedule_counts_epochs_after_committee_end() {
        let w = VoteWindow::resolve(&clock(), &WindowConfig::default()).unwrap();
        let s = w.fund_schedule(&clock());
        assert_eq!(s.fund_start, w.vote_start);
        assert_eq!(s.fund_end, w.vote_end);
        assert_eq!(s.rewards_info, w.committee_end + 7 * 86_400);
        assert_eq!(s.next_fund_start, w.committee_end + 15 * 86_400);
    }
}
