use anyhow::Result;
use tracing::info;

fn main() -> Result<()> {
    // Protocol output goes to stdout; keep log lines on stderr so GUIs
    // never mistake them for UCI responses.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();
    info!("brio starting");
    brio_uci::UciEngine::new().run()?;
    Ok(())
}
