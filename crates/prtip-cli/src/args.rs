//! CLI argument parsing (SPEC_FULL §6): the flag table mapped onto a `clap` derive struct, plus
//! the glue that merges an optional TOML config file with CLI overrides into a validated
//! `prtip_core::Config`.

use clap::{Parser, ValueEnum};
use prtip_core::{get_top_ports, ports_to_spec, Config, Error, PollerKind, Result};
use std::net::Ipv4Addr;
use std::path::PathBuf;

/// Readiness-poller backend selection, mirrored from `PollerKind` so `clap` can derive a
/// human-facing `ValueEnum` independent of the core crate's serde representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PollerArg {
    Auto,
    Epoll,
    Poll,
    Select,
}

impl From<PollerArg> for PollerKind {
    fn from(value: PollerArg) -> Self {
        match value {
            PollerArg::Auto => PollerKind::Auto,
            PollerArg::Epoll => PollerKind::Epoll,
            PollerArg::Poll => PollerKind::Poll,
            PollerArg::Select => PollerKind::Select,
        }
    }
}

/// A high-throughput TCP connect-scan engine: controlled-rate probing of large address/port
/// spaces with bandwidth, packet-rate, and per-host pacing limits.
#[derive(Parser, Debug)]
#[command(
    name = "prtip",
    version,
    about = "Controlled-rate TCP connect-scan engine",
    after_help = "EXAMPLES:\n\
    # Scan two ports on one host\n\
    prtip -p 22,443 192.168.1.1\n\n\
    # Sweep a /24 for the 100 most popular ports at 1 Mbit/s\n\
    prtip --top-ports 100 -b 1m 10.0.0.0/24\n\n\
    # Read targets from a file, report closed ports too\n\
    prtip -f targets.txt -c\n\n\
    # Force the select(2) backend and a fixed socket ceiling\n\
    prtip -t select -m 500 192.168.1.0/28"
)]
pub struct Args {
    /// Targets: dotted-quad, dashed range (A.B.C.D-E.F.G.H), or CIDR (A.B.C.D/N). Mutually
    /// exclusive with --file.
    #[arg(value_name = "TARGET", help_heading = "TARGET SPECIFICATION")]
    pub targets: Vec<String>,

    /// File of targets, one per line; blank lines and lines starting with '#' are ignored.
    #[arg(
        short = 'f',
        long = "file",
        value_name = "PATH",
        help_heading = "TARGET SPECIFICATION"
    )]
    pub file: Option<PathBuf>,

    /// Ports: a single port, an A-B range, a comma-separated list of either, or `all`.
    #[arg(
        short = 'p',
        long = "ports",
        value_name = "PORTSPEC",
        help_heading = "PORT SPECIFICATION",
        conflicts_with = "top_ports"
    )]
    pub ports: Option<String>,

    /// Scan only the N most popular ports (by the built-in popularity table).
    #[arg(
        long = "top-ports",
        value_name = "N",
        help_heading = "PORT SPECIFICATION"
    )]
    pub top_ports: Option<usize>,

    /// Target bandwidth; accepts a `k`/`m`/`g` suffix (bits/second).
    #[arg(
        short = 'b',
        long = "bandwidth",
        value_name = "RATE",
        help_heading = "RATE CONTROL"
    )]
    pub bandwidth: Option<String>,

    /// Maximum packets/second globally; 0 = unlimited.
    #[arg(
        short = 'P',
        long = "rate",
        value_name = "PPS",
        help_heading = "RATE CONTROL"
    )]
    pub rate: Option<u32>,

    /// RTT / minimum per-host probe spacing, in seconds.
    #[arg(
        short = 'R',
        long = "rtt",
        value_name = "SECONDS",
        help_heading = "RATE CONTROL"
    )]
    pub rtt: Option<f64>,

    /// Maximum concurrent sockets, or `auto` to derive it from bandwidth and RTT.
    #[arg(
        short = 'm',
        long = "max-sockets",
        value_name = "N|auto",
        help_heading = "RATE CONTROL"
    )]
    pub max_sockets: Option<String>,

    /// Retries; total attempts per target is retries + 1.
    #[arg(
        short = 'r',
        long = "retries",
        value_name = "N",
        help_heading = "RATE CONTROL"
    )]
    pub retries: Option<u32>,

    /// Readiness-poller backend.
    #[arg(
        short = 't',
        long = "poller",
        value_enum,
        value_name = "BACKEND",
        help_heading = "RATE CONTROL"
    )]
    pub poller: Option<PollerArg>,

    /// Report closed ports (RST observed) in addition to open ones.
    #[arg(short = 'c', long = "show-closed", help_heading = "OUTPUT")]
    pub show_closed: bool,

    /// Comma-separated IPs to exclude from scanning (exact match).
    #[arg(
        short = 'B',
        long = "block-list",
        value_name = "CSV",
        help_heading = "OUTPUT"
    )]
    pub block_list: Option<String>,

    /// Append every observed reply to debug_reply_log.txt as CSV.
    #[arg(short = 'd', long = "debug-log", help_heading = "OUTPUT")]
    pub debug_log: bool,

    /// TOML config file; CLI flags override values loaded from it.
    #[arg(short = 'C', long = "config", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Raise log verbosity; repeatable (-v, -vv).
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Parse a bandwidth string with an optional `k`/`m`/`g` (case-insensitive) suffix into bits/sec.
fn parse_bandwidth(spec: &str) -> Result<u64> {
    let spec = spec.trim();
    if spec.is_empty() {
        return Err(Error::Config("bandwidth spec is empty".to_string()));
    }
    let (digits, multiplier) = match spec.chars().last().unwrap().to_ascii_lowercase() {
        'k' => (&spec[..spec.len() - 1], 1_000u64),
        'm' => (&spec[..spec.len() - 1], 1_000_000u64),
        'g' => (&spec[..spec.len() - 1], 1_000_000_000u64),
        _ => (spec, 1u64),
    };
    let value: f64 = digits
        .parse()
        .map_err(|_| Error::Config(format!("invalid bandwidth '{spec}'")))?;
    if value < 0.0 {
        return Err(Error::Config(format!("bandwidth '{spec}' must not be negative")));
    }
    Ok((value * multiplier as f64).round() as u64)
}

/// Parse `-m`'s argument: the literal `auto`, or a positive integer socket ceiling.
fn parse_max_sockets(spec: &str) -> Result<Option<u32>> {
    if spec.eq_ignore_ascii_case("auto") {
        return Ok(None);
    }
    let n: u32 = spec
        .parse()
        .map_err(|_| Error::Config(format!("invalid --max-sockets value '{spec}'")))?;
    Ok(Some(n))
}

/// Parse `-B`'s comma-separated IPv4 exact-match block list.
fn parse_block_list(spec: &str) -> Result<Vec<Ipv4Addr>> {
    spec.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<Ipv4Addr>()
                .map_err(|_| Error::Config(format!("invalid block-list entry '{s}'")))
        })
        .collect()
}

impl Args {
    /// Merge an optional TOML config file with CLI overrides into a validated `Config`, and
    /// return the resolved `(config, positional_targets, target_file)` triple that
    /// `prtip_scanner::ScanDriver::new` expects.
    pub fn resolve(&self) -> Result<(Config, Vec<String>, Option<PathBuf>)> {
        let mut config = match &self.config {
            Some(path) => Config::load_from_file(path)?,
            None => Config::default(),
        };

        if let Some(n) = self.top_ports {
            config.scan.ports = ports_to_spec(&get_top_ports(n));
        } else if let Some(ports) = &self.ports {
            config.scan.ports = ports.clone();
        }

        if let Some(bandwidth) = &self.bandwidth {
            config.network.bandwidth_bps = parse_bandwidth(bandwidth)?;
        }
        if let Some(rate) = self.rate {
            config.network.packet_rate = rate;
        }
        if let Some(rtt) = self.rtt {
            config.scan.rtt_seconds = rtt;
        }
        if let Some(max_sockets) = &self.max_sockets {
            config.network.max_sockets = parse_max_sockets(max_sockets)?;
        }
        if let Some(retries) = self.retries {
            config.scan.retries = retries;
        }
        if let Some(poller) = self.poller {
            config.network.poller = poller.into();
        }
        if let Some(block_list) = &self.block_list {
            config.network.block_list = parse_block_list(block_list)?;
        }
        config.scan.show_closed = config.scan.show_closed || self.show_closed;
        config.output.debug_log = config.output.debug_log || self.debug_log;

        if self.file.is_some() && !self.targets.is_empty() {
            return Err(Error::Config(
                "specify either --file or positional targets, not both".to_string(),
            ));
        }

        config.validate()?;
        Ok((config, self.targets.clone(), self.file.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bandwidth_accepts_k_suffix() {
        assert_eq!(parse_bandwidth("250k").unwrap(), 250_000);
    }

    #[test]
    fn bandwidth_accepts_m_and_g_suffix() {
        assert_eq!(parse_bandwidth("1m").unwrap(), 1_000_000);
        assert_eq!(parse_bandwidth("2g").unwrap(), 2_000_000_000);
    }

    #[test]
    fn bandwidth_plain_number_has_no_multiplier() {
        assert_eq!(parse_bandwidth("1000").unwrap(), 1000);
    }

    #[test]
    fn bandwidth_rejects_garbage() {
        assert!(parse_bandwidth("nope").is_err());
    }

    #[test]
    fn max_sockets_auto_is_none() {
        assert_eq!(parse_max_sockets("auto").unwrap(), None);
        assert_eq!(parse_max_sockets("AUTO").unwrap(), None);
    }

    #[test]
    fn max_sockets_numeric_is_some() {
        assert_eq!(parse_max_sockets("500").unwrap(), Some(500));
    }

    #[test]
    fn block_list_parses_csv() {
        let parsed = parse_block_list("10.0.0.1, 10.0.0.2").unwrap();
        assert_eq!(parsed, vec![Ipv4Addr::new(10, 0, 0, 1), Ipv4Addr::new(10, 0, 0, 2)]);
    }

    #[test]
    fn block_list_rejects_invalid_entry() {
        assert!(parse_block_list("10.0.0.1,not-an-ip").is_err());
    }

    #[test]
    fn resolve_rejects_both_file_and_positional_targets() {
        let args = Args {
            targets: vec!["127.0.0.1".to_string()],
            file: Some(PathBuf::from("/tmp/targets.txt")),
            ports: None,
            top_ports: None,
            bandwidth: None,
            rate: None,
            rtt: None,
            max_sockets: None,
            retries: None,
            poller: None,
            show_closed: false,
            block_list: None,
            debug_log: false,
            config: None,
            verbose: 0,
        };
        assert!(args.resolve().is_err());
    }

    #[test]
    fn resolve_applies_top_ports_override() {
        let args = Args {
            targets: vec!["127.0.0.1".to_string()],
            file: None,
            ports: None,
            top_ports: Some(5),
            bandwidth: None,
            rate: None,
            rtt: None,
            max_sockets: None,
            retries: None,
            poller: None,
            show_closed: false,
            block_list: None,
            debug_log: false,
            config: None,
            verbose: 0,
        };
        let (config, _, _) = args.resolve().unwrap();
        assert_eq!(prtip_core::PortRange::parse(&config.scan.ports).unwrap().count(), 5);
    }
}
