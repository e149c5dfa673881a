//! vitgen-tally
//!
//! Joins the node's vote plan tallies back onto the compiled proposals and
//! writes one CSV row per proposal.
//!
//! A proposal matches a node proposal when the vote plan id, the in-plan
//! index and the external id all agree.

pub mod ledger;
pub mod reconcile;
pub mod source;

pub use ledger::{NodeVotePlan, NodeVoteProposal, OptionRange, TallyResult};
pub use reconcile::{reconcile, write_csv, TallyRow};
pub use source::{DataClient, Source};
