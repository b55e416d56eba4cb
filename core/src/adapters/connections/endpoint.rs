//! Socket endpoint column parsing shared by the `ss` and `lsof` adapters.

/// Port half of an endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointPort {
    /// `*`: nothing bound yet, as printed for the peer of a listening socket.
    Wildcard,
    Number(u16),
}

/// One `host:port` column, e.g. `0.0.0.0:22`, `[::1]:3000` or `127.0.0.53%lo:53`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint<'a> {
    pub host: &'a str,
    pub port: EndpointPort,
}

impl<'a> Endpoint<'a> {
    /// Split a column on its last colon. Returns `None` if the column is malformed.
    ///
    /// IPv6 hosts are bracketed by both tools and may carry an interface
    /// scope after the bracket (`[fe80::1]%eth0:546`), so the port never
    /// contains a colon.
    pub fn parse(column: &'a str) -> Option<Self> {
        let (host, port) = column.rsplit_once(':')?;
        if host.is_empty() {
            return None;
        }
        if host.starts_with('[') && !host.contains(']') {
            return None;
        }

        let port = match port {
            "*" => EndpointPort::Wildcard,
            digits => EndpointPort::Number(digits.parse().ok()?),
        };

        Some(Self { host, port })
    }

    /// The bound port, if there is one.
    pub fn port_number(&self) -> Option<u16> {
        match self.port {
            EndpointPort::Number(port) => Some(port),
            EndpointPort::Wildcard => None,
        }
    }
}
