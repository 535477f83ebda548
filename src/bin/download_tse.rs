use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use tsescraper::{
    config::{build_client, env_filter, DEFAULT_REGISTRY_YEARS},
    fetch::download_registries,
};

#[derive(Parser)]
#[command(author, version, about = "Download and unpack TSE candidate registries")]
struct Args {
    /// Registry years; defaults to 2022 and 2018
    #[arg(long = "year")]
    years: Vec<u16>,
    #[arg(long, default_value = ".")]
    output: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().with_env_filter(env_filter("info")).init();

    let args = Args::parse();
    let years = if args.years.is_empty() {
        DEFAULT_REGISTRY_YEARS.to_vec()
    } else {
        args.years
    };

    let client = build_client()?;
    let dirs = download_registries(&client, &years, &args.output).await?;
    for d in dirs {
        info!("registry ready in {}", d.display());
    }
    Ok(())
}
