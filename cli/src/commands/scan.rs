//! Scan command - run one cycle and print the snapshot.

use std::collections::BTreeSet;

use anyhow::Result;
use chrono::Local;

use super::Paths;

pub async fn run(paths: &Paths, json: bool) -> Result<()> {
    // Inactive ports are reported in the output below instead of through the sink.
    let (_, engine) = paths.engine(|_: &BTreeSet<u16>| {}).await?;
    let report = engine.scan_cycle().await?;
    let snapshot = report.snapshot;
    let inactive = report.diff.alertable;

    if json {
        let output = serde_json::json!({
            "snapshot": snapshot,
            "inactive": inactive,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    if snapshot.is_empty() {
        println!("No listening ports found.");
        return Ok(());
    }

    println!(
        "Snapshot at {}",
        snapshot
            .timestamp()
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M:%S")
    );
    println!("{:<6} STATE", "PORT");
    println!("{}", "-".repeat(24));
    for (port, state) in snapshot.ports() {
        println!("{:<6} {}", port, state.display_name());
    }

    println!("\nTotal: {} ports", snapshot.len());
    if !inactive.is_empty() {
        let list: Vec<String> = inactive.iter().map(|p| p.to_string()).collect();
        println!("Inactive (not whitelisted): {}", list.join(", "));
    }
    Ok(())
}
