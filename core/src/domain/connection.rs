//! Connection records as reported by the OS network stack.

use serde::{Deserialize, Serialize};

// ============================================================================
// Protocol
// ============================================================================

/// Transport protocol of a socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Tcp,
    Udp,
}

impl Protocol {
    /// Parse a protocol token (`tcp`, `udp`, `TCP`, `tcp6`, ...).
    pub fn parse(token: &str) -> Option<Self> {
        let token = token.to_ascii_lowercase();
        if token.starts_with("tcp") {
            Some(Protocol::Tcp)
        } else if token.starts_with("udp") {
            Some(Protocol::Udp)
        } else {
            None
        }
    }
}

impl std::fmt::Display for Protocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Protocol::Tcp => write!(f, "tcp"),
            Protocol::Udp => write!(f, "udp"),
        }
    }
}

// ============================================================================
// ConnectionStatus
// ============================================================================

/// Socket state. `None` covers sockets without a TCP state (e.g. UDP).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionStatus {
    Listen,
    Established,
    SynSent,
    SynRecv,
    FinWait1,
    FinWait2,
    TimeWait,
    Close,
    CloseWait,
    LastAck,
    Closing,
    #[default]
    None,
}

impl ConnectionStatus {
    /// Parse a state token as printed by `ss` or `lsof`.
    ///
    /// Unknown tokens map to [`ConnectionStatus::None`].
    pub fn parse(token: &str) -> Self {
        match token.to_ascii_uppercase().replace('_', "-").as_str() {
            "LISTEN" => ConnectionStatus::Listen,
            "ESTAB" | "ESTABLISHED" => ConnectionStatus::Established,
            "SYN-SENT" => ConnectionStatus::SynSent,
            "SYN-RECV" | "SYN-RECEIVED" => ConnectionStatus::SynRecv,
            "FIN-WAIT-1" => ConnectionStatus::FinWait1,
            "FIN-WAIT-2" => ConnectionStatus::FinWait2,
            "TIME-WAIT" => ConnectionStatus::TimeWait,
            "CLOSE" | "CLOSED" => ConnectionStatus::Close,
            "CLOSE-WAIT" => ConnectionStatus::CloseWait,
            "LAST-ACK" => ConnectionStatus::LastAck,
            "CLOSING" => ConnectionStatus::Closing,
            _ => ConnectionStatus::None,
        }
    }
}

// ============================================================================
// ConnectionRecord
// ============================================================================

/// One row of the OS connection table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectionRecord {
    /// Transport protocol.
    pub protocol: Protocol,
    /// Local address the socket is bound to (`*`, `127.0.0.1`, `[::1]`, ...).
    pub local_address: String,
    /// Local port number.
    pub local_port: u16,
    /// Socket state.
    pub status: ConnectionStatus,
    /// Owning process, when the OS lets us resolve it.
    pub pid: Option<u32>,
    /// Owning process name, when known.
    pub process_name: Option<String>,
}

impl ConnectionRecord {
    /// Create a TCP socket in the listening state.
    pub fn listening(port: u16, pid: Option<u32>) -> Self {
        Self::new(Protocol::Tcp, port, ConnectionStatus::Listen, pid)
    }

    /// Create a record bound to `*` with no process name.
    pub fn new(protocol: Protocol, port: u16, status: ConnectionStatus, pid: Option<u32>) -> Self {
        Self {
            protocol,
            local_address: "*".to_string(),
            local_port: port,
            status,
            pid,
            process_name: None,
        }
    }

    /// Whether the socket is accepting connections.
    pub fn is_listening(&self) -> bool {
        self.status == ConnectionStatus::Listen
    }
}

impl std::fmt::Display for ConnectionRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}:{}", self.protocol, self.local_address, self.local_port)?;
        match (self.pid, &self.process_name) {
            (Some(pid), Some(name)) => write!(f, " (PID: {}, Process: {})", pid, name),
            (Some(pid), None) => write!(f, " (PID: {})", pid),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parse() {
        assert_eq!(ConnectionStatus::parse("LISTEN"), ConnectionStatus::Listen);
        assert_eq!(ConnectionStatus::parse("ESTAB"), ConnectionStatus::Established);
        assert_eq!(ConnectionStatus::parse("TIME-WAIT"), ConnectionStatus::TimeWait);
        assert_eq!(ConnectionStatus::parse("FIN_WAIT_2"), ConnectionStatus::FinWait2);
        assert_eq!(ConnectionStatus::parse("UNCONN"), ConnectionStatus::None);
    }

    #[test]
    fn test_protocol_parse() {
        assert_eq!(Protocol::parse("tcp"), Some(Protocol::Tcp));
        assert_eq!(Protocol::parse("UDP"), Some(Protocol::Udp));
        assert_eq!(Protocol::parse("tcp6"), Some(Protocol::Tcp));
        assert_eq!(Protocol::parse("u_str"), None);
    }

    #[test]
    fn test_is_listening() {
        assert!(ConnectionRecord::listening(8080, Some(1)).is_listening());
        let udp = ConnectionRecord::new(Protocol::Udp, 53, ConnectionStatus::None, None);
        assert!(!udp.is_listening());
    }
}
