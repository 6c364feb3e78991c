use anyhow::Result;
use clap::Parser;

use deepresearch_rs::cli::Args;
use deepresearch_rs::engine::launch;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let query = args.query.clone();
    let config = args.into_config()?;

    launch(&config, &query).await
}
