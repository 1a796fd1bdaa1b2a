//! Core data types shared by the enumerator, registry, and result sink.

use crate::error::{Error, Result};
use ipnetwork::Ipv4Network;
use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;

/// A single token from the target spec: a literal host, a dashed range, a CIDR block, or a file
/// of such tokens. Resolution into a concrete address stream happens in
/// `prtip_scanner::enumerator`; this type only carries the parsed intent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanTarget {
    /// A single IPv4 host.
    Host(Ipv4Addr),
    /// An inclusive dashed range, `start..=end`.
    Range(Ipv4Addr, Ipv4Addr),
    /// A CIDR block.
    Cidr(Ipv4Network),
}

impl ScanTarget {
    /// Parse one positional/file-line target token. Accepts a dotted-quad, a dashed range
    /// (`A.B.C.D-E.F.G.H`), or CIDR (`A.B.C.D/N`, `8 <= N <= 32`).
    pub fn parse(token: &str) -> Result<Self> {
        let token = token.trim();
        if token.starts_with('-') {
            return Err(Error::Config(format!(
                "target '{token}' looks like an option, not an address"
            )));
        }

        if let Some((lhs, rhs)) = token.split_once('/') {
            let prefix: u8 = rhs
                .parse()
                .map_err(|_| Error::Config(format!("invalid CIDR prefix in '{token}'")))?;
            if !(8..=32).contains(&prefix) {
                return Err(Error::Config(format!(
                    "CIDR prefix /{prefix} out of bounds (8..=32) in '{token}'"
                )));
            }
            let base: Ipv4Addr = lhs
                .parse()
                .map_err(|_| Error::Config(format!("invalid CIDR address in '{token}'")))?;
            let net = Ipv4Network::new(base, prefix)?;
            return Ok(ScanTarget::Cidr(net));
        }

        if let Some((lhs, rhs)) = token.split_once('-') {
            let start: Ipv4Addr = lhs
                .parse()
                .map_err(|_| Error::Config(format!("invalid range start in '{token}'")))?;
            let end: Ipv4Addr = rhs
                .parse()
                .map_err(|_| Error::Config(format!("invalid range end in '{token}'")))?;
            return Ok(ScanTarget::Range(start, end));
        }

        let host: Ipv4Addr = token
            .parse()
            .map_err(|_| Error::Config(format!("invalid target '{token}'")))?;
        Ok(ScanTarget::Host(host))
    }

    /// `true` for a single host; `false` for a range or CIDR block.
    pub fn is_single_host(&self) -> bool {
        match self {
            ScanTarget::Host(_) => true,
            ScanTarget::Range(a, b) => a == b,
            ScanTarget::Cidr(net) => net.prefix() == 32,
        }
    }
}

/// A parsed, deduplicated, ordered set of ports.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortRange {
    ports: Vec<u16>,
}

impl PortRange {
    /// Parse a port spec: a single port, a `A-B` range, a comma-separated list of either, or the
    /// literal `all` (shorthand for `1-65535`). Duplicates are removed, keeping first occurrence.
    pub fn parse(spec: &str) -> Result<Self> {
        let spec = spec.trim();
        if spec.eq_ignore_ascii_case("all") {
            return Ok(PortRange {
                ports: (1..=65535u32).map(|p| p as u16).collect(),
            });
        }

        let mut seen = std::collections::HashSet::new();
        let mut ports = Vec::new();
        for part in spec.split(',') {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }
            if let Some((lhs, rhs)) = part.split_once('-') {
                let start: u16 = lhs
                    .parse()
                    .map_err(|_| Error::Config(format!("invalid port range '{part}'")))?;
                let end: u16 = rhs
                    .parse()
                    .map_err(|_| Error::Config(format!("invalid port range '{part}'")))?;
                if start == 0 || end == 0 {
                    return Err(Error::Config(format!("port 0 is not valid in '{part}'")));
                }
                for p in start..=end {
                    if seen.insert(p) {
                        ports.push(p);
                    }
                }
            } else {
                let p: u16 = part
                    .parse()
                    .map_err(|_| Error::Config(format!("invalid port '{part}'")))?;
                if p == 0 {
                    return Err(Error::Config("port 0 is not valid".into()));
                }
                if seen.insert(p) {
                    ports.push(p);
                }
            }
        }

        if ports.is_empty() {
            return Err(Error::Config("empty port specification".into()));
        }

        Ok(PortRange { ports })
    }

    /// Number of distinct ports.
    pub fn count(&self) -> usize {
        self.ports.len()
    }

    /// Ports in the order they were parsed (before any popularity reordering).
    pub fn as_slice(&self) -> &[u16] {
        &self.ports
    }

    /// Consume into the owned port vector.
    pub fn into_vec(self) -> Vec<u16> {
        self.ports
    }
}

/// Observed state of a single `(ip, port)` probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PortState {
    /// A SYN/ACK-equivalent readiness event was observed (successful connect).
    Open,
    /// An RST-equivalent readiness event was observed.
    Closed,
    /// `max_probes` attempts elapsed with no reply; conservatively reported as filtered,
    /// never surfaced to the result sink (probes that time out are simply unreported).
    Filtered,
}

/// One classified outcome, as handed to the result sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanResult {
    /// Target address.
    pub ip: Ipv4Addr,
    /// Target port.
    pub port: u16,
    /// Classified state.
    pub state: PortState,
}

impl ScanResult {
    /// Construct a new result record.
    pub fn new(ip: Ipv4Addr, port: u16, state: PortState) -> Self {
        ScanResult { ip, port, state }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_single_host() {
        let t = ScanTarget::parse("192.168.1.1").unwrap();
        assert!(matches!(t, ScanTarget::Host(_)));
        assert!(t.is_single_host());
    }

    #[test]
    fn parse_cidr() {
        let t = ScanTarget::parse("10.0.0.0/24").unwrap();
        match t {
            ScanTarget::Cidr(net) => assert_eq!(net.prefix(), 24),
            _ => panic!("expected CIDR"),
        }
    }

    #[test]
    fn parse_cidr_rejects_out_of_bounds_prefix() {
        assert!(ScanTarget::parse("10.0.0.0/7").is_err());
        assert!(ScanTarget::parse("10.0.0.0/33").is_err());
    }

    #[test]
    fn parse_range() {
        let t = ScanTarget::parse("10.0.0.1-10.0.0.5").unwrap();
        assert!(matches!(t, ScanTarget::Range(_, _)));
    }

    #[test]
    fn parse_rejects_option_like_token() {
        assert!(ScanTarget::parse("-p").is_err());
    }

    #[test]
    fn port_range_all() {
        let r = PortRange::parse("all").unwrap();
        assert_eq!(r.count(), 65535);
    }

    #[test]
    fn port_range_dedup_preserves_first_order() {
        let r = PortRange::parse("80,443,8080-8082,80").unwrap();
        assert_eq!(r.as_slice(), &[80, 443, 8080, 8081, 8082]);
    }

    #[test]
    fn port_range_rejects_port_zero() {
        assert!(PortRange::parse("0").is_err());
    }

    #[test]
    fn port_range_rejects_empty() {
        assert!(PortRange::parse(",,").is_err());
    }
}
