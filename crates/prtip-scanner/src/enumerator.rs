//! Target Enumerator (SPEC §4.A): lazy `(ip, port, probe_index)` generation.
//!
//! Grounded on the Python original's `TargetGenerator.get_probe_state_generator`, which walks
//! probe (port) index in the outer loop and the full host set in the inner loop — "column-major"
//! order, so the first port is swept across every host before the second port starts. Each pass
//! rebuilds its host iterator from the parsed target list rather than materializing addresses,
//! since a single CIDR block or range can name far more hosts than fit in memory.

use prtip_core::{Error, Result, ScanTarget};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::net::Ipv4Addr;
use std::path::Path;

/// Lazily produces `(ip, port, probe_index)` triples in column-major order.
pub struct TargetEnumerator {
    targets: Vec<ScanTarget>,
    ports: Vec<u16>,
    port_idx: usize,
    host_iter: Box<dyn Iterator<Item = Ipv4Addr>>,
}

impl TargetEnumerator {
    /// Build from literal target tokens (positional CLI arguments).
    pub fn from_tokens(tokens: &[String], ports: Vec<u16>) -> Result<Self> {
        let targets = tokens
            .iter()
            .map(|t| ScanTarget::parse(t))
            .collect::<Result<Vec<_>>>()?;
        Self::from_targets(targets, ports)
    }

    /// Build by reading target tokens from a file, one per line, ignoring blank lines and `#`
    /// comments.
    pub fn from_file(path: &Path, ports: Vec<u16>) -> Result<Self> {
        let file = File::open(path).map_err(Error::Io)?;
        let reader = BufReader::new(file);
        let mut targets = Vec::new();
        for line in reader.lines() {
            let line = line.map_err(Error::Io)?;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            targets.push(ScanTarget::parse(line)?);
        }
        Self::from_targets(targets, ports)
    }

    fn from_targets(targets: Vec<ScanTarget>, ports: Vec<u16>) -> Result<Self> {
        let host_iter = build_host_iter(&targets);
        Ok(TargetEnumerator {
            targets,
            ports,
            port_idx: 0,
            host_iter,
        })
    }

    pub fn port_count(&self) -> usize {
        self.ports.len()
    }
}

fn build_host_iter(targets: &[ScanTarget]) -> Box<dyn Iterator<Item = Ipv4Addr>> {
    let targets = targets.to_vec();
    Box::new(targets.into_iter().flat_map(|target| -> Box<dyn Iterator<Item = Ipv4Addr>> {
        match target {
            ScanTarget::Host(ip) => Box::new(std::iter::once(ip)),
            ScanTarget::Range(start, end) => {
                let start = u32::from(start);
                let end = u32::from(end);
                if end < start {
                    Box::new(std::iter::empty())
                } else {
                    Box::new((start..=end).map(Ipv4Addr::from))
                }
            }
            ScanTarget::Cidr(net) => Box::new(net.iter()),
        }
    }))
}

impl Iterator for TargetEnumerator {
    type Item = (Ipv4Addr, u16, usize);

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(ip) = self.host_iter.next() {
                return Some((ip, self.ports[self.port_idx], self.port_idx));
            }
            self.port_idx += 1;
            if self.port_idx >= self.ports.len() {
                return None;
            }
            self.host_iter = build_host_iter(&self.targets);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enumerates_cidr_slash_30_in_column_major_order() {
        let mut e = TargetEnumerator::from_tokens(&["10.0.0.0/30".to_string()], vec![80, 443]).unwrap();
        let collected: Vec<_> = e.by_ref().collect();
        assert_eq!(collected.len(), 8, "4 hosts x 2 ports");
        // first 4 entries are all port 80 (probe_index 0), across all 4 hosts
        assert!(collected[..4].iter().all(|(_, port, idx)| *port == 80 && *idx == 0));
        assert!(collected[4..].iter().all(|(_, port, idx)| *port == 443 && *idx == 1));
    }

    #[test]
    fn reversed_range_yields_no_hosts() {
        let mut e = TargetEnumerator::from_tokens(&["10.0.0.5-10.0.0.1".to_string()], vec![80]).unwrap();
        assert_eq!(e.next(), None);
    }

    #[test]
    fn single_host_times_two_ports() {
        let mut e = TargetEnumerator::from_tokens(&["127.0.0.1".to_string()], vec![22, 80]).unwrap();
        let collected: Vec<_> = e.by_ref().collect();
        assert_eq!(
            collected,
            vec![
                (Ipv4Addr::new(127, 0, 0, 1), 22, 0),
                (Ipv4Addr::new(127, 0, 0, 1), 80, 1),
            ]
        );
    }

    #[test]
    fn rejects_option_like_token() {
        let err = TargetEnumerator::from_tokens(&["-x".to_string()], vec![80]);
        assert!(err.is_err());
    }
}
