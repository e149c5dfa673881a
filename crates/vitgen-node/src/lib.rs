//! vitgen-node
//!
//! Drives a whole election compilation and hands the result to the gateway.
//!
//! Run order:
//!   1. Validate the time grid, vote window and limits
//!   2. Load proposals and funds, assign external ids, partition into plans
//!   3. Resolve BFT leaders, generate (and optionally sign) plan certificates
//!   4. Cross-link plans into proposals and the current fund
//!   5. Build and encode block0, write the station exports
//!   6. Write the node configuration and leader secret configs

pub mod compiler;
pub mod config;
pub mod leaders;
pub mod ledger_node;

pub use compiler::{Compilation, ElectionCompiler, STATION_DIR, VOTE_PLANS_DIR};
pub use config::{CompilerConfig, LeaderConfig, ResolvedTime, CONFIG_FILE};
pub use leaders::{resolve_leaders, signer, Leader, LeaderSecret};
pub use ledger_node::{shutdown_signal, NodeConfig, NodeProcess, NodeSettings};
