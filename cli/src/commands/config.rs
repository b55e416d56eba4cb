//! Config command - show and edit `config.json`.

use anyhow::{bail, Result};
use portwatch_core::Config;

use super::Paths;

pub async fn show(paths: &Paths, json: bool) -> Result<()> {
    let store = paths.config_store()?;
    let config = store.load().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    println!("Config file: {}", store.path().display());
    print_config(&config);
    Ok(())
}

pub async fn set(
    paths: &Paths,
    period: Option<u64>,
    threshold: Option<u32>,
    alerts: Option<bool>,
    json: bool,
) -> Result<()> {
    if period.is_none() && threshold.is_none() && alerts.is_none() {
        bail!("nothing to set: pass --period, --threshold or --alerts");
    }

    let config = paths
        .config_store()?
        .update(|c| {
            if let Some(period) = period {
                c.period = period;
            }
            if let Some(threshold) = threshold {
                c.inactive_threshold = threshold;
            }
            if let Some(enabled) = alerts {
                c.alert_enabled = enabled;
            }
        })
        .await?;

    report(&config, json)
}

pub async fn whitelist_add(paths: &Paths, port: u16, json: bool) -> Result<()> {
    let config = paths.config_store()?.add_to_whitelist(port).await?;
    report(&config, json)
}

pub async fn whitelist_remove(paths: &Paths, port: u16, json: bool) -> Result<()> {
    let config = paths.config_store()?.remove_from_whitelist(port).await?;
    report(&config, json)
}

fn report(config: &Config, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(config)?);
    } else {
        println!("Configuration updated.");
        print_config(config);
    }
    Ok(())
}

fn print_config(config: &Config) {
    let whitelist: Vec<String> = config.whitelist.iter().map(|p| p.to_string()).collect();
    println!("  period:             {}s", config.period);
    println!("  inactive threshold: {} scans", config.inactive_threshold);
    println!(
        "  alerts:             {}",
        if config.alert_enabled { "on" } else { "off" }
    );
    println!("  whitelist:          {}", whitelist.join(", "));
}
