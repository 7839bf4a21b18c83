use anyhow::Context;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_env("BUILDER_LEDGER_LOG")
        .unwrap_or_else(|_| EnvFilter::new("builder_ledger=warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    builder_ledger::run().context("builder-ledger failed")?;
    Ok(())
}
