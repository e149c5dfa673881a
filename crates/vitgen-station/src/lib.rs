//! vitgen-station
//!
//! Tabular I/O for the servicing station: the proposal and fund CSV inputs,
//! and the `sql_*.csv` exports produced after compilation.

pub mod export;
pub mod loader;

pub use export::{write_exports, FUNDS_CSV, PROPOSALS_CSV, VOTEPLANS_CSV};
pub use loader::{load_funds, load_proposals, read_funds, read_proposals};

use vitgen_core::error::VitgenError;

pub(crate) fn csv_error(source: &str, e: csv::Error) -> VitgenError {
    if e.is_io_error() {
        return VitgenError::Io(std::io::Error::other(format!("{source}: {e}")));
    }
    VitgenError::DataIntegrity(format!("{source}: {e}"))
}
