//! vitgen-toolchain
//!
//! Seams to the external ledger tool-chain. The compiler only talks to the
//! traits below; `Jcli` drives the real command line tool and `FakeToolchain`
//! produces deterministic stand-ins for dry runs and tests.

pub mod fake;
pub mod jcli;
pub mod locate;

use std::path::PathBuf;

use vitgen_core::error::VitgenError;
use vitgen_core::types::Discrimination;

pub use fake::FakeToolchain;
pub use jcli::Jcli;
pub use locate::find_executable;

/// Vote plan certificates.
pub trait CertificateTool {
    /// Turn a JSON vote plan descriptor into an unsigned certificate.
    fn new_vote_plan_certificate(&self, descriptor: &[u8]) -> Result<String, VitgenError>;

    /// Content identifier of a vote plan certificate.
    fn vote_plan_id(&self, certificate: &str) -> Result<String, VitgenError>;

    /// Sign `certificate` with the secret keys stored in `key_files`.
    fn sign_certificate(&self, certificate: &str, key_files: &[PathBuf]) -> Result<String, VitgenError>;
}

/// Key material and addresses.
pub trait KeyTool {
    fn generate_secret_key(&self) -> Result<String, VitgenError>;
    fn public_key(&self, secret_key: &str) -> Result<String, VitgenError>;
    fn account_address(&self, public_key: &str, discrimination: Discrimination) -> Result<String, VitgenError>;
    /// Hex form of a bech32 public key, as expected by the committee list.
    fn public_key_bytes(&self, public_key: &str) -> Result<String, VitgenError>;
    /// Election key shared by every private plan, derived from the committee
    /// members' privacy keys.
    fn vote_encryption_key(&self, member_keys: &[String]) -> Result<String, VitgenError>;
}

/// Genesis block encoding.
pub trait GenesisTool {
    fn encode(&self, yaml: &[u8]) -> Result<Vec<u8>, VitgenError>;
    fn hash(&self, block0: &[u8]) -> Result<String, VitgenError>;
    fn decode(&self, block0: &[u8]) -> Result<String, VitgenError>;
}

/// Everything the compiler needs from the tool-chain.
pub trait Toolchain: CertificateTool + KeyTool + GenesisTool {
    /// Human readable version of the backing tool.
    fn version(&self) -> Result<String, VitgenError>;
}
