//! Scan configuration: TOML-loadable mirror of the CLI surface, plus validation.

use crate::error::{Error, Result};
use crate::types::PortRange;
use serde::{Deserialize, Serialize};
use std::net::Ipv4Addr;
use std::path::Path;

/// Readiness poller backend selection (`-t`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PollerKind {
    /// Windows -> select-style; otherwise -> level-poll.
    Auto,
    /// Edge-triggered epoll (Linux only).
    Epoll,
    /// Level-triggered `poll(2)`.
    Poll,
    /// `select(2)` fallback; implies a hard socket-count ceiling.
    Select,
}

impl Default for PollerKind {
    fn default() -> Self {
        PollerKind::Auto
    }
}

/// Scan-specific settings: port spec, retry budget, pacing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Port specification string, e.g. `"1-1000"`, `"80,443"`, or `"all"`.
    pub ports: String,
    /// Total attempts per target is `retries + 1`.
    pub retries: u32,
    /// Minimum spacing between consecutive probes to the same host, in seconds.
    pub rtt_seconds: f64,
    /// Report closed ports (RST observed) in addition to open ones.
    pub show_closed: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        ScanConfig {
            ports: "1-65535".to_string(),
            retries: 1,
            rtt_seconds: 0.5,
            show_closed: false,
        }
    }
}

/// Network-level pacing and concurrency settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Target bandwidth in bits/second (`-b`); accepts `k`/`m`/`g` suffixes at the CLI layer,
    /// stored here already resolved to a plain integer.
    pub bandwidth_bps: u64,
    /// Global packet rate cap in packets/second; `0` means unlimited (`-P`).
    pub packet_rate: u32,
    /// Maximum concurrent sockets; `None` means auto-size per SPEC_FULL §4.F (`-m auto`).
    pub max_sockets: Option<u32>,
    /// Readiness poller backend (`-t`).
    pub poller: PollerKind,
    /// IPs excluded from scanning (`-B`), exact match.
    pub block_list: Vec<Ipv4Addr>,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        NetworkConfig {
            bandwidth_bps: 250_000,
            packet_rate: 0,
            max_sockets: None,
            poller: PollerKind::default(),
            block_list: Vec::new(),
        }
    }
}

/// Output/debug settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Write `(probe_name, ip, port, payload_hex)` rows to `debug_reply_log.txt` (`-d`).
    pub debug_log: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        OutputConfig { debug_log: false }
    }
}

/// Tuning knobs with safe defaults that are rarely overridden from the CLI.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceConfig {
    /// Maximum interval between drain passes while pacing, in seconds (SPEC_FULL §4.E/§5).
    pub recv_interval_seconds: f64,
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        PerformanceConfig {
            recv_interval_seconds: 0.1,
        }
    }
}

/// Top-level configuration, loadable from TOML and overridable by CLI flags.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Scan-specific configuration
    pub scan: ScanConfig,
    /// Network configuration
    pub network: NetworkConfig,
    /// Output configuration
    pub output: OutputConfig,
    /// Performance configuration
    pub performance: PerformanceConfig,
}

impl Config {
    /// Load configuration from a TOML file, validating it before returning.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read config file {path:?}: {e}")))?;
        Self::load_from_str(&contents)
    }

    /// Load configuration from a TOML string.
    pub fn load_from_str(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize and write configuration to a TOML file.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents)
            .map_err(|e| Error::Config(format!("failed to write config file {path:?}: {e}")))?;
        Ok(())
    }

    /// Validate the configuration, mirroring the constraints in SPEC_FULL §4.A/§4.F.
    pub fn validate(&self) -> Result<()> {
        PortRange::parse(&self.scan.ports)?;

        if self.scan.rtt_seconds <= 0.0 {
            return Err(Error::Config("rtt must be positive".into()));
        }
        if self.performance.recv_interval_seconds <= 0.0 {
            return Err(Error::Config("recv_interval must be positive".into()));
        }
        if let Some(max) = self.network.max_sockets {
            if max == 0 {
                return Err(Error::Config("max_sockets must be at least 1".into()));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn invalid_port_spec_fails_validation() {
        let mut cfg = Config::default();
        cfg.scan.ports = "not-a-port".to_string();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn zero_rtt_fails_validation() {
        let mut cfg = Config::default();
        cfg.scan.rtt_seconds = 0.0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn roundtrip_through_toml() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed = Config::load_from_str(&toml_str).unwrap();
        assert_eq!(parsed.scan.ports, cfg.scan.ports);
        assert_eq!(parsed.network.bandwidth_bps, cfg.network.bandwidth_bps);
    }

    #[test]
    fn zero_max_sockets_fails_validation() {
        let mut cfg = Config::default();
        cfg.network.max_sockets = Some(0);
        assert!(cfg.validate().is_err());
    }
}
