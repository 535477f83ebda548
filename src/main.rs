use anyhow::Result;
use clap::Parser;
use std::{fs, path::PathBuf};
use tokio::time::Instant;
use tracing::info;
use tracing_subscriber::fmt;
use tsescraper::{
    config::{build_client, env_filter, DEFAULT_ELECTION_ID},
    etl::{etl_eleicoes, EtlOptions},
    load::{
        candidates::DEFAULT_CARGO, votes_2018::TseBulkProvider, votes_2022::TseResultsApi,
    },
};

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Unified 2018 + 2022 TSE election results as one CSV"
)]
struct Args {
    /// Directory holding the extracted `consulta_cand_{year}/` registries
    #[arg(long, default_value = ".")]
    input: PathBuf,
    #[arg(long, default_value = "eleicoes.csv")]
    output: PathBuf,
    /// Office to keep, as spelled in DS_CARGO
    #[arg(long, default_value = DEFAULT_CARGO)]
    cargo: String,
    /// Results API election id (544 = 2022 first round)
    #[arg(long, default_value_t = DEFAULT_ELECTION_ID)]
    election_id: u32,
    /// Where the 2018 bulk ZIP is downloaded
    #[arg(long, default_value = "downloads")]
    work_dir: PathBuf,
    /// Optional JSON file for the per-region 2022 summaries
    #[arg(long)]
    summaries: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    fmt::Subscriber::builder()
        .with_env_filter(env_filter("info"))
        .with_span_events(fmt::format::FmtSpan::CLOSE)
        .init();
    info!("startup");

    let args = Args::parse();

    // ─── 2) configure dirs + sources ─────────────────────────────────
    fs::create_dir_all(&args.work_dir)?;
    if let Some(parent) = args.output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let client = build_client()?;
    let provider = TseBulkProvider::new(client.clone(), args.work_dir.clone());
    let source = TseResultsApi::new(client).with_election_id(args.election_id);
    let options = EtlOptions {
        cargo: args.cargo,
        summaries_path: args.summaries,
    };

    // ─── 3) run ──────────────────────────────────────────────────────
    let start = Instant::now();
    let eleicoes = etl_eleicoes(&args.input, &args.output, &provider, &source, &options).await?;

    info!(
        rows = eleicoes.rows.len(),
        regions = eleicoes.summaries.len(),
        elapsed = ?start.elapsed(),
        output = %args.output.display(),
        "all done"
    );
    Ok(())
}
