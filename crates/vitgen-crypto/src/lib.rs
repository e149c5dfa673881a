pub mod hash;
pub mod identity;

pub use hash::{blake3_hash, blake3_hex};
pub use identity::{assign_external_ids, external_id};
