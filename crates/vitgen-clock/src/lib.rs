//! vitgen-clock
//!
//! Chain-time arithmetic for the election compiler.
//!
//! The ledger counts time in `(epoch, slot)` pairs relative to the genesis
//! instant. Every vote plan boundary has to sit exactly on the slot grid,
//! otherwise it would be silently rounded when converted.

pub mod clock;
pub mod window;

pub use clock::{ChainClock, TimeFormat};
pub use window::{ChainWindow, FundSchedule, VoteWindow, WindowConfig};
