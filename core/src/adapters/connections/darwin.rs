//! macOS connection table implementation using lsof.

use std::process::Stdio;

use tokio::process::Command;

use crate::domain::{ConnectionRecord, ConnectionStatus, Protocol};
use crate::error::{Error, Result};

use super::endpoint::Endpoint;
use super::Enumerator;

/// macOS-specific connection enumerator using lsof.
pub struct DarwinConnections;

impl DarwinConnections {
    /// Create a new macOS enumerator.
    pub fn new() -> Self {
        Self
    }

    /// Parse lsof output into connection records.
    ///
    /// Expected lsof output format:
    /// ```text
    /// COMMAND    PID  USER   FD   TYPE             DEVICE SIZE/OFF NODE NAME
    /// node     34805  code   19u  IPv6 0x3d8015e195af1f3f      0t0  TCP [::1]:3000 (LISTEN)
    /// node     34805  code   21u  IPv6 0x3d8015e195af2a1f      0t0  TCP [::1]:3000->[::1]:51234 (ESTABLISHED)
    /// mDNSResp   512  root    8u  IPv4 0x3d8015e195a0c11f      0t0  UDP *:5353
    /// ```
    fn parse_lsof_output(&self, output: &str) -> Vec<ConnectionRecord> {
        let mut records = Vec::new();

        // Skip header line
        for line in output.lines().skip(1) {
            // Parse lsof columns: COMMAND PID USER FD TYPE DEVICE SIZE/OFF NODE NAME [STATE]
            let components: Vec<&str> = line.split_whitespace().collect();
            if components.len() < 9 {
                continue;
            }

            // Extract and unescape process name
            let process_name = components[0]
                .replace("\\x20", " ") // Space
                .replace("\\x2f", "/"); // Slash

            let pid: u32 = match components[1].parse() {
                Ok(p) => p,
                Err(_) => continue,
            };

            let Some(protocol) = Protocol::parse(components[7]) else {
                continue;
            };

            // NAME is "local" or "local->peer"
            let column = components[8].split("->").next().unwrap_or_default();
            let Some(local) = Endpoint::parse(column) else {
                continue;
            };
            let Some(local_port) = local.port_number() else {
                continue;
            };

            let status = components
                .get(9)
                .map(|s| ConnectionStatus::parse(s.trim_matches(|c| c == '(' || c == ')')))
                .unwrap_or_default();

            records.push(ConnectionRecord {
                protocol,
                local_address: local.host.to_string(),
                local_port,
                status,
                pid: Some(pid),
                process_name: Some(process_name),
            });
        }

        records
    }
}

impl Default for DarwinConnections {
    fn default() -> Self {
        Self::new()
    }
}

impl Enumerator for DarwinConnections {
    /// List internet sockets using lsof.
    ///
    /// Executes: `lsof -i -P -n +c 0`
    ///
    /// Flags explained:
    /// - -i: Show all internet sockets (TCP and UDP)
    /// - -P: Show port numbers (don't resolve to service names)
    /// - -n: Show IP addresses (don't resolve to hostnames)
    /// - +c 0: Show full command name (unlimited length)
    async fn list(&self) -> Result<Vec<ConnectionRecord>> {
        let output = Command::new("/usr/sbin/lsof")
            .args(["-i", "-P", "-n", "+c", "0"])
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .output()
            .await
            .map_err(|e| Error::CommandFailed(format!("Failed to run lsof: {}", e)))?;

        // lsof exits with 1 when nothing matched, which is an empty table, not a failure.
        let stdout = String::from_utf8(output.stdout)
            .map_err(|e| Error::ParseError(format!("Invalid UTF-8 in lsof output: {}", e)))?;

        Ok(self.parse_lsof_output(&stdout))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_lsof_output() {
        let enumerator = DarwinConnections::new();

        let output = r#"COMMAND    PID  USER   FD   TYPE             DEVICE SIZE/OFF NODE NAME
node     34805  code   19u  IPv6 0x3d8015e195af1f3f      0t0  TCP [::1]:3000 (LISTEN)
node     34805  code   21u  IPv6 0x3d8015e195af2a1f      0t0  TCP [::1]:3000->[::1]:51234 (ESTABLISHED)
mDNSResp   512  root    8u  IPv4 0x3d8015e195a0c11f      0t0  UDP *:5353"#;

        let records = enumerator.parse_lsof_output(output);
        assert_eq!(records.len(), 3);

        assert!(records[0].is_listening());
        assert_eq!(records[0].local_port, 3000);
        assert_eq!(records[0].pid, Some(34805));

        assert_eq!(records[1].local_port, 3000);
        assert_eq!(records[1].status, ConnectionStatus::Established);

        assert_eq!(records[2].protocol, Protocol::Udp);
        assert_eq!(records[2].status, ConnectionStatus::None);
    }
}
