//! Deterministic in-memory tool-chain.
//!
//! Outputs are derived from BLAKE3 of the inputs, so two runs over the same
//! dataset produce identical plan ids and genesis hashes.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use vitgen_core::error::VitgenError;
use vitgen_core::types::Discrimination;
use vitgen_crypto::hash::blake3_hex;

use crate::{CertificateTool, GenesisTool, KeyTool, Toolchain};

const BLOCK0_MAGIC: &[u8] = b"VITGEN-BLOCK0\n";

#[derive(Debug, Default)]
pub struct FakeToolchain {
    key_counter: AtomicU64,
    calls: Mutex<HashMap<&'static str, usize>>,
    fail_on: Option<&'static str>,
}

impl FakeToolchain {
    pub fn new() -> Self {
        Self::default()
    }

    /// A tool-chain whose `op` always fails with a tool error.
    pub fn failing_on(op: &'static str) -> Self {
        Self {
            fail_on: Some(op),
            ..Self::default()
        }
    }

    /// How many times `op` was invoked.
    pub fn calls(&self, op: &str) -> usize {
        self.calls
            .lock()
            .map(|c| c.get(op).copied().unwrap_or(0))
            .unwrap_or(0)
    }

    fn enter(&self, op: &'static str) -> Result<(), VitgenError> {
        if let Ok(mut calls) = self.calls.lock() {
            *calls.entry(op).or_default() += 1;
        }
        if self.fail_on == Some(op) {
            return Err(VitgenError::external_tool(op, "injected failure"));
        }
        Ok(())
    }
}

impl CertificateTool for FakeToolchain {
    fn new_vote_plan_certificate(&self, descriptor: &[u8]) -> Result<String, VitgenError> {
        self.enter("certificate new vote-plan")?;
        Ok(format!("cert1{}", blake3_hex(&[descriptor])))
    }

    fn vote_plan_id(&self, certificate: &str) -> Result<String, VitgenError> {
        self.enter("certificate get-vote-plan-id")?;
        Ok(blake3_hex(&[certificate.as_bytes()]))
    }

    fn sign_certificate(&self, certificate: &str, key_files: &[PathBuf]) -> Result<String, VitgenError> {
        self.enter("certificate sign")?;
        let mut signer = Vec::new();
        for file in key_files {
            signer.extend_from_slice(&std::fs::read(file)?);
        }
        Ok(format!(
            "signedcert1{}",
            blake3_hex(&[certificate.as_bytes(), &signer])
        ))
    }
}

impl KeyTool for FakeToolchain {
    fn generate_secret_key(&self) -> Result<String, VitgenError> {
        self.enter("key generate")?;
        let n = self.key_counter.fetch_add(1, Ordering::Relaxed);
        Ok(format!("ed25519_sk1{}", blake3_hex(&[b"secret", &n.to_le_bytes()])))
    }

    fn public_key(&self, secret_key: &str) -> Result<String, VitgenError> {
        self.enter("key to-public")?;
        Ok(format!("ed25519_pk1{}", blake3_hex(&[secret_key.trim().as_bytes()])))
    }

    fn account_address(&self, public_key: &str, discrimination: Discrimination) -> Result<String, VitgenError> {
        self.enter("address account")?;
        let prefix = match discrimination {
            Discrimination::Production => "ca1",
            Discrimination::Test => "ta1",
        };
        Ok(format!("{prefix}{}", blake3_hex(&[public_key.as_bytes()])))
    }

    fn public_key_bytes(&self, public_key: &str) -> Result<String, VitgenError> {
        self.enter("key to-bytes")?;
        Ok(blake3_hex(&[b"bytes", public_key.as_bytes()]))
    }

    fn vote_encryption_key(&self, member_keys: &[String]) -> Result<String, VitgenError> {
        self.enter("votes encrypting-vote-key")?;
        let parts: Vec<&[u8]> = member_keys.iter().map(|k| k.as_bytes()).collect();
        Ok(format!("p256k1_votepk1{}", blake3_hex(&parts)))
    }
}

impl GenesisTool for FakeToolchain {
    fn encode(&self, yaml: &[u8]) -> Result<Vec<u8>, VitgenError> {
        self.enter("genesis encode")?;
        Ok([BLOCK0_MAGIC, yaml].concat())
    }

    fn hash(&self, block0: &[u8]) -> Result<String, VitgenError> {
        self.enter("genesis hash")?;
        Ok(blake3_hex(&[block0]))
    }

    fn decode(&self, block0: &[u8]) -> Result<String, VitgenError> {
        self.enter("genesis decode")?;
        let body = block0
            .strip_prefix(BLOCK0_MAGIC)
            .ok_or_else(|| VitgenError::external_tool("genesis decode", "not a block0 produced by encode"))?;
        Ok(String::from_utf8_lossy(body).into_owned())
    }
}

impl Toolchain for FakeToolchain {
    fn version(&self) -> Result<String, VitgenError> {
        Ok(format!("fake-toolchain {}", env!("CARGO_PKG_VERSION")))
    }
}
