//! dts-bundle: bundles TypeScript declarations into one file.

mod cli;

use clap::Parser;
use cli::Args;
use miette::Result;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    println!("Starting");
    dts_bundle::generate(args.into_options()).await?;
    println!("Done!");
    Ok(())
}
