//! vitgen-tally
//!
//! Fetch tallies from a node and proposals from a vitgen gateway, join them
//! and write the result as CSV.
//!
//! Usage:
//!   vitgen-tally [--node-addr <url>] [--service-addr <url>] [--result-file <path>]
//!
//! Either address may be `file://<dir>` (or a plain path) to read dumps from disk.

use std::fs::File;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use vitgen_core::dataset::ProposalRecord;
use vitgen_core::fund::Fund;
use vitgen_tally::{reconcile, write_csv, DataClient, NodeVotePlan, Source};

#[derive(Parser, Debug)]
#[command(
    name = "vitgen-tally",
    version,
    about = "vitgen-tally: join on-chain tally results with proposals"
)]
struct Args {
    /// Node REST base address, or file://.
    #[arg(long, default_value = "http://127.0.0.1:8001")]
    node_addr: String,

    /// Gateway base address, or file://.
    #[arg(long, default_value = "http://127.0.0.1:8000")]
    service_addr: String,

    /// Vote plans endpoint, appended to the node address.
    #[arg(long, default_value = "/api/v0/vote/active/plans")]
    vote_plans: String,

    /// Proposals endpoint, appended to the service address.
    #[arg(long, default_value = "/api/v0/proposals")]
    proposals: String,

    /// Fund endpoint, appended to the service address.
    #[arg(long, default_value = "/api/v0/fund")]
    funds: String,

    #[arg(long, default_value = "10s", value_parser = humantime::parse_duration)]
    http_timeout: Duration,

    /// Output file.
    #[arg(long, default_value = "TallyResult.csv")]
    result_file: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter("warn,vitgen_tally=info")
        .init();

    let args = Args::parse();
    let client = DataClient::new(args.http_timeout)?;

    let plans_src = Source::parse(&args.node_addr, &args.vote_plans)?;
    let proposals_src = Source::parse(&args.service_addr, &args.proposals)?;
    let fund_src = Source::parse(&args.service_addr, &args.funds)?;

    let plans: Vec<NodeVotePlan> = client.fetch(&plans_src).await.context("fetching vote plans")?;
    let records: Vec<ProposalRecord> = client.fetch(&proposals_src).await.context("fetching proposals")?;
    let fund: Fund = client.fetch(&fund_src).await.context("fetching fund")?;
    info!(
        fund = fund.fund_id,
        plans = plans.len(),
        proposals = records.len(),
        "election data fetched"
    );

    let rows = reconcile(records, &plans);
    let file = File::create(&args.result_file)
        .with_context(|| format!("creating {}", args.result_file.display()))?;
    let columns = write_csv(file, &rows)?;

    info!(columns, path = %args.result_file.display(), "tally result written");
    println!("Result ready at: {}", args.result_file.display());
    Ok(())
}
