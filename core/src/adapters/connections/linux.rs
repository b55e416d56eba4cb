//! Linux connection table implementation using ss.

use std::process::Stdio;

use regex::Regex;
use tokio::process::Command;
use tracing::debug;

use crate::domain::{ConnectionRecord, ConnectionStatus, Protocol};
use crate::error::{Error, Result};

use super::endpoint::Endpoint;
use super::Enumerator;

/// Linux-specific connection enumerator.
pub struct LinuxConnections;

impl LinuxConnections {
    /// Create a new Linux enumerator.
    pub fn new() -> Self {
        Self
    }

    /// Parse ss output into connection records.
    ///
    /// Expected ss output format:
    /// ```text
    /// Netid State  Recv-Q Send-Q  Local Address:Port   Peer Address:Port  Process
    /// tcp   LISTEN 0      4096    127.0.0.53%lo:53          0.0.0.0:*      users:(("systemd-resolve",pid=620,fd=14))
    /// udp   UNCONN 0      0             0.0.0.0:68          0.0.0.0:*
    /// ```
    ///
    /// The process column is missing for sockets the caller may not inspect.
    fn parse_ss_output(&self, output: &str) -> Vec<ConnectionRecord> {
        let regex = Regex::new(r#"users:\(\("(.*?)",pid=(\d+)"#).expect("valid ss process regex");
        let mut records = Vec::new();

        for line in output.lines() {
            // Parse columns: [Netid] [State] [Recv-Q] [Send-Q] [Local] [Peer] [Process]
            let components: Vec<&str> = line.split_whitespace().collect();
            if components.len() < 6 {
                continue;
            }

            let Some(protocol) = Protocol::parse(components[0]) else {
                continue;
            };

            let Some(local) = Endpoint::parse(components[4]) else {
                debug!(line = line, "Skipping ss line with unparseable local address");
                continue;
            };
            let Some(local_port) = local.port_number() else {
                debug!(line = line, "Skipping ss line without a bound local port");
                continue;
            };

            let process = components[6..].join(" ");
            let (pid, process_name) = match regex.captures(&process) {
                Some(caps) => (caps[2].parse().ok(), Some(caps[1].to_string())),
                None => (None, None),
            };

            records.push(ConnectionRecord {
                protocol,
                local_address: local.host.to_string(),
                local_port,
                status: ConnectionStatus::parse(components[1]),
                pid,
                process_name,
            });
        }

        records
    }
}

impl Default for LinuxConnections {
    fn default() -> Self {
        Self::new()
    }
}

impl Enumerator for LinuxConnections {
    /// List TCP and UDP sockets in every state.
    ///
    /// Executes: `ss -Htuanp`
    ///
    /// Flags explained:
    /// -H, --no-header     Suppress header line
    /// -t, --tcp           display TCP sockets
    /// -u, --udp           display UDP sockets
    /// -a, --all           display listening and non-listening sockets
    /// -n, --numeric       don't resolve service names
    /// -p, --processes     show process using socket
    async fn list(&self) -> Result<Vec<ConnectionRecord>> {
        let output = Command::new("ss")
            .args(["-Htuanp"])
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .output()
            .await
            .map_err(|e| Error::CommandFailed(format!("Failed to run ss: {}", e)))?;

        if !output.status.success() {
            return Err(Error::CommandFailed(format!(
                "ss exited with {}",
                output.status
            )));
        }

        let stdout = String::from_utf8(output.stdout)
            .map_err(|e| Error::ParseError(format!("Invalid UTF-8 in ss output: {}", e)))?;

        Ok(self.parse_ss_output(&stdout))
    }
}
