//! Close command - terminate the process bound to a port.

use std::collections::BTreeSet;

use anyhow::{bail, Result};
use portwatch_core::CloseOutcome;

use super::Paths;

pub async fn run(paths: &Paths, port: u16) -> Result<()> {
    let (_, engine) = paths.engine(|_: &BTreeSet<u16>| {}).await?;

    let outcome = engine.close_port(port).await?;
    if outcome == CloseOutcome::Whitelisted {
        println!("Port {} is whitelisted; not closing it.", port);
    } else {
        println!("Port {}: {}", port, outcome);
    }

    if !outcome.is_closed() {
        bail!("port {} was left open", port);
    }
    Ok(())
}
