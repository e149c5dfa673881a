//! vitgen-voteplan
//!
//! Turns an ordered proposal list into vote plans and links the result back.
//!
//! 1. `partition` splits proposals per payload type into batches of at most
//!    `max_plan_size` members.
//! 2. `assemble` asks the tool-chain for one certificate per batch and,
//!    when the plans go into block0, signs it with a leader key.
//! 3. `artifacts` persists descriptors and certificates.
//! 4. `crosslink` writes plan ids, in-plan indices and display windows back
//!    into the proposals and the current fund.

pub mod artifacts;
pub mod assemble;
pub mod crosslink;
pub mod partition;

pub use artifacts::write_artifacts;
pub use assemble::{assemble_plans, check_committee_keys, AssemblyConfig, PlanDescriptor, VotePlan};
pub use crosslink::{apply_fund_defaults, cross_link};
pub use partition::{partition, plans_needed, validate_plan_size, PlanBatch};
