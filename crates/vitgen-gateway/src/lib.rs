//! vitgen-gateway
//!
//! HTTP front end over a compiled election.
//!
//! Local routes (GET only):
//!   /api/v0/proposals                 every proposal joined with its vote plan
//!   /api/v0/proposals/{internal_id}   one proposal
//!   /api/v0/fund                      the current fund and its vote plans
//!   /api/v0/block0                    the encoded genesis block
//!
//! Everything under /api/v0/{account,block,fragment,message,settings} is
//! forwarded to the node's REST interface.

pub mod api;
pub mod error;
pub mod proxy;
pub mod server;

pub use api::{build_router, GatewayState};
pub use error::ApiError;
pub use proxy::Upstream;
pub use server::{GatewayHandle, GatewayServer};
