//! Run command - scan periodically until Ctrl-C.

use std::collections::BTreeSet;
use std::sync::Arc;

use anyhow::Result;
use chrono::Local;
use portwatch_core::ScanScheduler;
use tracing::info;

use super::Paths;

fn print_alert(ports: &BTreeSet<u16>) {
    let list: Vec<String> = ports.iter().map(|p| p.to_string()).collect();
    println!(
        "[{}] Inactive ports: {}",
        Local::now().format("%Y-%m-%d %H:%M:%S"),
        list.join(", ")
    );
}

pub async fn run(paths: &Paths) -> Result<()> {
    let (config, engine) = paths.engine(print_alert).await?;
    info!(
        period = config.period,
        threshold = config.inactive_threshold,
        whitelist = ?config.whitelist,
        "Starting port watch"
    );

    let (scheduler, stop) = ScanScheduler::new(Arc::new(engine));
    let task = scheduler.spawn();

    tokio::signal::ctrl_c().await?;
    info!("Interrupt received, finishing current cycle");
    stop.stop();

    let cycles = task.await?;
    println!("Stopped after {} scan cycles.", cycles);
    Ok(())
}
