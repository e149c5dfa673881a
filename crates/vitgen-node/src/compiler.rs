//! The compilation pipeline.
//!
//! Stages run strictly in order and the first error aborts the run. block0
//! is written last, after every other output is on disk.

use std::fs;
use std::path::PathBuf;

use tracing::info;

use vitgen_core::dataset::CompiledDataset;
use vitgen_core::error::VitgenError;
use vitgen_core::fund::Fund;
use vitgen_core::proposal::Proposal;
use vitgen_crypto::assign_external_ids;
use vitgen_genesis::{encode, Block0Artifact, GenesisBuilder};
use vitgen_station::{load_funds, load_proposals, write_exports};
use vitgen_toolchain::Toolchain;
use vitgen_voteplan::{
    apply_fund_defaults, assemble_plans, check_committee_keys, cross_link, partition, write_artifacts,
    AssemblyConfig, VotePlan,
};

use crate::config::{CompilerConfig, ResolvedTime};
use crate::leaders::{resolve_leaders, signer, Leader};
use crate::ledger_node::{write_secret_configs, NodeConfig};

/// Sub-directory holding vote plan descriptors and certificates.
pub const VOTE_PLANS_DIR: &str = "vote_plans";
/// Sub-directory holding the servicing station exports.
pub const STATION_DIR: &str = "vit_station";

/// Everything a successful run produced.
#[derive(Debug)]
pub struct Compilation {
    pub dataset: CompiledDataset,
    pub plans: Vec<VotePlan>,
    pub leaders: Vec<Leader>,
    pub block0: Block0Artifact,
    pub node_config: PathBuf,
    pub written: Vec<PathBuf>,
}

pub struct ElectionCompiler<'a, T: Toolchain + ?Sized> {
    tool: &'a T,
    config: &'a CompilerConfig,
}

impl<'a, T: Toolchain + ?Sized> ElectionCompiler<'a, T> {
    pub fn new(tool: &'a T, config: &'a CompilerConfig) -> Self {
        Self { tool, config }
    }

    /// Load the configured CSV inputs and compile them.
    pub fn compile(&self) -> Result<Compilation, VitgenError> {
        let time = self.config.validate()?;
        let proposals = load_proposals(&self.config.proposals_csv)?;
        let funds = load_funds(&self.config.fund_csv)?;
        self.run(time, proposals, funds)
    }

    /// Compile records that are already in memory.
    pub fn compile_records(&self, proposals: Vec<Proposal>, funds: Vec<Fund>) -> Result<Compilation, VitgenError> {
        let time = self.config.validate()?;
        self.run(time, proposals, funds)
    }

    fn run(&self, time: ResolvedTime, mut proposals: Vec<Proposal>, mut funds: Vec<Fund>) -> Result<Compilation, VitgenError> {
        let cfg = self.config;
        let ResolvedTime { clock, window, format } = time;

        if funds.is_empty() {
            return Err(VitgenError::DataIntegrity("no fund row found".into()));
        }
        check_committee_keys(&proposals, &cfg.committee_privacy_keys)?;

        let workdir = &cfg.working_dir;
        fs::create_dir_all(workdir)?;
        let mut written = Vec::new();

        // ── Identity + partition ─────────────────────────────────────────────
        assign_external_ids(&mut proposals)?;
        let batches = partition(&proposals, cfg.max_plan_size)?;

        // ── Leaders + plans ──────────────────────────────────────────────────
        let leaders = resolve_leaders(self.tool, &cfg.leaders, workdir)?;
        let assembly = AssemblyConfig {
            committee_keys: cfg.committee_privacy_keys.clone(),
            embed_in_block0: cfg.embed_plans_in_block0,
            signer: signer(&leaders).map(|p| p.to_path_buf()),
        };
        let plans = assemble_plans(self.tool, &proposals, &batches, window.to_chain(&clock)?, &assembly)?;
        written.extend(write_artifacts(&workdir.join(VOTE_PLANS_DIR), &plans)?);

        // ── Cross-link ───────────────────────────────────────────────────────
        let fund = funds
            .first_mut()
            .ok_or_else(|| VitgenError::DataIntegrity("no fund row found".into()))?;
        cross_link(&mut proposals, fund, &plans, &clock, &format)?;
        apply_fund_defaults(fund, &window.fund_schedule(&clock), &format);

        // ── Genesis ──────────────────────────────────────────────────────────
        let mut builder = GenesisBuilder::new(&cfg.genesis_params(&clock));
        for leader in &leaders {
            builder.add_leader(self.tool, &leader.public_key)?;
        }
        for member in &cfg.committee_auth_keys {
            builder.add_committee_member(self.tool, member)?;
        }
        if cfg.embed_plans_in_block0 {
            for plan in &plans {
                let cert = plan.signed_cert.as_ref().ok_or(VitgenError::MissingSigner)?;
                builder.add_certificate(cert.clone());
            }
        }
        let extra = self.extra_genesis_data()?;
        let block0 = encode(self.tool, &builder.build(), extra.as_deref())?;

        // ── Dataset + exports ────────────────────────────────────────────────
        let mut dataset = CompiledDataset::new(proposals, funds);
        dataset.set_block0(block0.bin.clone(), block0.hash.clone());
        written.extend(write_exports(&workdir.join(STATION_DIR), &dataset)?);

        // ── Node ─────────────────────────────────────────────────────────────
        let secrets = write_secret_configs(workdir, &leaders)?;
        written.extend(secrets.iter().cloned());
        let node_config = NodeConfig::new(&cfg.node, workdir, secrets).write(workdir)?;
        written.push(node_config.clone());
        written.push(cfg.write(workdir)?);

        // block0 goes last so a failed run never leaves one behind
        let (bin, yaml) = block0.write(workdir)?;
        written.extend([bin, yaml]);

        info!(
            proposals = dataset.proposals().len(),
            plans = plans.len(),
            leaders = leaders.len(),
            block0_hash = %block0.hash,
            files = written.len(),
            "election compiled"
        );
        Ok(Compilation {
            dataset,
            plans,
            leaders,
            block0,
            node_config,
            written,
        })
    }

    fn extra_genesis_data(&self) -> Result<Option<Vec<u8>>, VitgenError> {
        let Some(path) = &self.config.extra_genesis_data else {
            return Ok(None);
        };
        let data = fs::read(path).map_err(|e| {
            VitgenError::Config(format!("extra genesis data {}: {e}", path.display()))
        })?;
        Ok(Some(data))
    }
}
