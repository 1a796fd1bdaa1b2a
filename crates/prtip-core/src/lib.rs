//! Core types, error handling, and configuration for the connect-scan engine.
//!
//! # Examples
//!
//! ```
//! use prtip_core::{PortRange, ScanTarget, Config};
//!
//! let ports = PortRange::parse("80,443,8080-8090").unwrap();
//! assert_eq!(ports.count(), 13);
//!
//! let target = ScanTarget::parse("192.168.1.0/24").unwrap();
//! assert!(!target.is_single_host());
//!
//! let config = Config::default();
//! assert!(config.validate().is_ok());
//! ```

pub mod config;
pub mod error;
pub mod errors;
pub mod resource_limits;
pub mod top_ports;
pub mod types;

pub use config::{Config, NetworkConfig, OutputConfig, PerformanceConfig, PollerKind, ScanConfig};
pub use error::{Error, Result};
pub use errors::{ScanErrorKind, categorize_io_error};
pub use top_ports::{get_top_ports, popularity_rank, ports_to_spec};
pub use types::{PortRange, PortState, ScanResult, ScanTarget};
