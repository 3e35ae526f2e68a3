use anyhow::Result;
use clap::Parser;
use maf_realign::Args;
use mimalloc::MiMalloc;
use tracing_subscriber::EnvFilter;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

fn main() -> Result<()> {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| {
            if args.quiet {
                EnvFilter::new("warn")
            } else {
                EnvFilter::new("info")
            }
        });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let stats = maf_realign::run(&args)?;
    tracing::info!(
        blocks = stats.blocks,
        sequences = stats.sequences,
        scored_blocks = stats.scored_blocks,
        mean_score = ?stats.mean_score(),
        "maf-realign: processing complete"
    );
    Ok(())
}
