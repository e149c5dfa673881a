//! vitgen: compile an election into block0 and serve it.
//!
//! Startup sequence:
//!   1. Build and validate the compiler configuration from the flags
//!   2. Compile proposals and funds into vote plans, block0 and exports
//!   3. Start the gateway over the compiled dataset
//!   4. Optionally start the ledger node, then wait for it or for Ctrl-C

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use vitgen_clock::WindowConfig;
use vitgen_core::constants::{DEFAULT_COMMITTEE_FUND, DEFAULT_LEADER_FUND, DEFAULT_PLAN_SIZE};
use vitgen_core::types::{Discrimination, Timestamp};
use vitgen_gateway::{GatewayServer, Upstream};
use vitgen_genesis::{FeesGoTo, LinearFees, PerCertificateFees, PerVoteCertificateFees};
use vitgen_node::{
    shutdown_signal, Compilation, CompilerConfig, ElectionCompiler, LeaderConfig, NodeProcess, NodeSettings,
};
use vitgen_toolchain::{FakeToolchain, Jcli, Toolchain};

#[derive(Parser, Debug)]
#[command(
    name = "vitgen",
    version,
    about = "vitgen: election block0 compiler and gateway"
)]
struct Args {
    // ── Time grid ────────────────────────────────────────────────────────────
    /// Genesis instant (RFC 3339). Defaults to now.
    #[arg(long, value_parser = parse_time)]
    genesis_time: Option<Timestamp>,

    #[arg(long, default_value = "20s", value_parser = humantime::parse_duration)]
    slot_duration: Duration,

    #[arg(long, default_value = "24h", value_parser = humantime::parse_duration)]
    epoch_duration: Duration,

    /// Vote start (RFC 3339). Defaults to genesis.
    #[arg(long, value_parser = parse_time)]
    vote_start: Option<Timestamp>,

    /// Vote end (RFC 3339). Defaults to vote start + vote duration.
    #[arg(long, value_parser = parse_time)]
    vote_end: Option<Timestamp>,

    /// Committee end (RFC 3339). Defaults to vote end + committee duration.
    #[arg(long, value_parser = parse_time)]
    committee_end: Option<Timestamp>,

    #[arg(long, default_value = "144h", value_parser = humantime::parse_duration)]
    vote_duration: Duration,

    #[arg(long, default_value = "24h", value_parser = humantime::parse_duration)]
    committee_duration: Duration,

    /// strftime pattern for the plan windows shown to wallets.
    #[arg(long, default_value = "")]
    time_format: String,

    // ── Plans ────────────────────────────────────────────────────────────────
    /// Maximum proposals per vote plan (1-256).
    #[arg(long, default_value_t = DEFAULT_PLAN_SIZE)]
    voteplan_proposals_max: usize,

    /// Sign the vote plan certificates and embed them in block0.
    #[arg(long)]
    voteplans_in_block0: bool,

    // ── Keys ─────────────────────────────────────────────────────────────────
    /// BFT leader secret key files (comma separated).
    #[arg(long, value_delimiter = ',')]
    bft_leader_sk_file: Vec<PathBuf>,

    /// BFT leader public keys (comma separated).
    #[arg(long, value_delimiter = ',')]
    bft_leader_pk: Vec<String>,

    /// Generate leader keys until at least this many leaders exist.
    #[arg(long, default_value_t = 1)]
    bft_leader_min: usize,

    /// Committee member public keys registered in block0 (comma separated).
    #[arg(long, value_delimiter = ',')]
    committee_auth_pk: Vec<String>,

    /// Committee privacy keys for private plans (comma separated).
    #[arg(long, value_delimiter = ',')]
    committee_privacy_pk: Vec<String>,

    // ── Genesis ──────────────────────────────────────────────────────────────
    /// Use test address discrimination.
    #[arg(long)]
    testing: bool,

    /// Initial funds of each leader account, in lovelace.
    #[arg(long, default_value_t = DEFAULT_LEADER_FUND)]
    leader_funds: u64,

    /// Initial funds of each committee account, in lovelace.
    #[arg(long, default_value_t = DEFAULT_COMMITTEE_FUND)]
    committee_funds: u64,

    #[arg(long, default_value_t = 0)]
    fees_constant: u64,
    #[arg(long, default_value_t = 0)]
    fees_coefficient: u64,
    #[arg(long, default_value_t = 0)]
    fees_certificate: u64,
    #[arg(long, default_value_t = 0)]
    fees_certificate_pool_registration: u64,
    #[arg(long, default_value_t = 0)]
    fees_certificate_stake_delegation: u64,
    #[arg(long, default_value_t = 0)]
    fees_certificate_vote_plan: u64,
    #[arg(long, default_value_t = 0)]
    fees_certificate_vote_cast: u64,

    /// Where fees go: rewards or treasury.
    #[arg(long, default_value = "rewards")]
    fees_go_to: FeesGoTo,

    /// YAML appended to the generated block0 configuration.
    #[arg(long)]
    extra_genesis_data: Option<PathBuf>,

    // ── Files ────────────────────────────────────────────────────────────────
    #[arg(long, default_value = "./assets/proposals.csv")]
    proposals: PathBuf,

    #[arg(long, default_value = "./assets/fund.csv")]
    fund: PathBuf,

    /// Directory every artifact is written to.
    #[arg(long, default_value = ".")]
    working_dir: PathBuf,

    /// Directory searched for jcli and jormungandr before PATH.
    #[arg(long, default_value = "jor_bins")]
    tool_dir: PathBuf,

    /// Use the built-in deterministic tool-chain instead of jcli.
    #[arg(long)]
    dry_run: bool,

    // ── Serving ──────────────────────────────────────────────────────────────
    /// Gateway listen address.
    #[arg(long, default_value = "0.0.0.0:8000")]
    proxy: SocketAddr,

    /// Node REST listen address.
    #[arg(long, default_value = "0.0.0.0:8001")]
    rest: SocketAddr,

    /// Node P2P address.
    #[arg(long, default_value = "127.0.0.1:9001")]
    node: SocketAddr,

    /// Allowed CORS origins of the node REST interface (comma separated).
    #[arg(long, value_delimiter = ',')]
    rest_cors: Vec<String>,

    #[arg(long, default_value = "warn")]
    node_log_level: String,

    /// Enable the node's explorer.
    #[arg(long)]
    explorer: bool,

    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    skip_bootstrap: bool,

    /// Timeout of requests proxied to the node.
    #[arg(long, default_value = "30s", value_parser = humantime::parse_duration)]
    proxy_timeout: Duration,

    /// Start the ledger node once compilation finishes.
    #[arg(long)]
    start_node: bool,

    /// Compile and exit without serving.
    #[arg(long)]
    compile_only: bool,
}

impl Args {
    fn compiler_config(&self) -> CompilerConfig {
        CompilerConfig {
            genesis_time: self.genesis_time.unwrap_or_else(|| chrono::Utc::now().timestamp()),
            slot_duration: self.slot_duration,
            epoch_duration: self.epoch_duration,
            window: WindowConfig {
                vote_start: self.vote_start,
                vote_end: self.vote_end,
                committee_end: self.committee_end,
                vote_duration: self.vote_duration,
                committee_duration: self.committee_duration,
            },
            max_plan_size: self.voteplan_proposals_max,
            embed_plans_in_block0: self.voteplans_in_block0,
            leaders: LeaderConfig {
                secret_key_files: self.bft_leader_sk_file.clone(),
                public_keys: self.bft_leader_pk.clone(),
                min_count: self.bft_leader_min,
            },
            committee_auth_keys: self.committee_auth_pk.clone(),
            committee_privacy_keys: self.committee_privacy_pk.clone(),
            discrimination: if self.testing {
                Discrimination::Test
            } else {
                Discrimination::Production
            },
            leader_fund: self.leader_funds,
            committee_fund: self.committee_funds,
            linear_fees: LinearFees {
                constant: self.fees_constant,
                coefficient: self.fees_coefficient,
                certificate: self.fees_certificate,
                per_certificate_fees: PerCertificateFees {
                    certificate_pool_registration: self.fees_certificate_pool_registration,
                    certificate_stake_delegation: self.fees_certificate_stake_delegation,
                },
                per_vote_certificate_fees: PerVoteCertificateFees {
                    certificate_vote_plan: self.fees_certificate_vote_plan,
                    certificate_vote_cast: self.fees_certificate_vote_cast,
                },
            },
            fees_go_to: self.fees_go_to,
            time_format: self.time_format.clone(),
            proposals_csv: self.proposals.clone(),
            fund_csv: self.fund.clone(),
            extra_genesis_data: self.extra_genesis_data.clone(),
            working_dir: self.working_dir.clone(),
            node: NodeSettings {
                rest_listen: self.rest,
                p2p_address: self.node,
                cors_allowed_origins: self.rest_cors.clone(),
                log_level: self.node_log_level.clone(),
                explorer: self.explorer,
                skip_bootstrap: self.skip_bootstrap,
            },
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,vitgen=debug")),
        )
        .init();

    let args = Args::parse();
    info!("vitgen starting");

    let config = args.compiler_config();
    std::fs::create_dir_all(&config.working_dir)
        .with_context(|| format!("creating working dir {}", config.working_dir.display()))?;

    // ── Compile ───────────────────────────────────────────────────────────────
    let compilation = if args.dry_run {
        compile(&FakeToolchain::new(), &config)?
    } else {
        let jcli = Jcli::locate(Some(&args.tool_dir)).context("locating jcli")?;
        compile(&jcli, &config)?
    };

    if args.compile_only {
        info!("compile only, not serving");
        return Ok(());
    }

    // ── Gateway ───────────────────────────────────────────────────────────────
    let upstream = Upstream::new(&node_rest_url(args.rest), args.proxy_timeout).context("configuring upstream")?;
    let gateway = GatewayServer::new(Arc::new(compilation.dataset), upstream)
        .start(args.proxy)
        .await
        .context("starting gateway")?;

    // ── Node ──────────────────────────────────────────────────────────────────
    if args.start_node {
        let node = NodeProcess::spawn(Some(&args.tool_dir), &config.working_dir, &compilation.node_config)
            .context("starting ledger node")?;
        node.wait().await.context("waiting for ledger node")?;
    } else {
        info!("serving until interrupted");
        shutdown_signal().await;
    }

    gateway.stop().await;
    Ok(())
}

fn compile<T: Toolchain>(tool: &T, config: &CompilerConfig) -> anyhow::Result<Compilation> {
    let version = tool.version().context("querying tool-chain version")?;
    info!(toolchain = %version, "compiling election");
    ElectionCompiler::new(tool, config)
        .compile()
        .with_context(|| format!("compiling election into {}", config.working_dir.display()))
}

fn parse_time(s: &str) -> Result<Timestamp, String> {
    chrono::DateTime::parse_from_rfc3339(s)
        .map(|t| t.timestamp())
        .map_err(|e| format!("expected an RFC 3339 time such as 2021-01-01T00:00:00Z: {e}"))
}

/// The node listens on a wildcard address by default; connect over loopback.
fn node_rest_url(rest: SocketAddr) -> String {
    let ip = match rest.ip() {
        IpAddr::V4(ip) if ip.is_unspecified() => IpAddr::V4(Ipv4Addr::LOCALHOST),
        ip => ip,
    };
    format!("http://{}", SocketAddr::new(ip, rest.port()))
}
