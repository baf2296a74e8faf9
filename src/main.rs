use std::sync::Arc;

use ferryvisor::{Clock, Config, LogWriter, Supervisor};

#[tokio::main(flavor = "multi_thread")]
async fn main() -> anyhow::Result<()> {
    let clock = Clock::start();
    let sup = Supervisor::builder(Config::default())
        .with_clock(clock)
        .with_subscriber(Arc::new(LogWriter::new(clock)))
        .build()?;

    let voyage = sup.run().await?;
    if voyage.interrupted {
        eprintln!(
            "[ferryvisor] interrupted after {} crossing(s)",
            voyage.crossings
        );
    }
    Ok(())
}
