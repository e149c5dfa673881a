pub mod constants;
pub mod dataset;
pub mod error;
pub mod fund;
pub mod proposal;
pub mod types;

pub use constants::*;
pub use dataset::{CompiledDataset, ProposalRecord};
pub use error::{ErrorCategory, VitgenError};
pub use fund::{Fund, VotePlanSummary};
pub use proposal::*;
pub use types::*;
