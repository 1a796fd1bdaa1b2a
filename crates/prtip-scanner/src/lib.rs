//! The send/poll scheduler: a non-blocking TCP connect-scan engine.
//!
//! A single-threaded, cooperative event loop drives a bounded pool of in-flight connection
//! attempts across a lazily-enumerated target set, pacing sends against three independent rate
//! constraints and classifying readiness events into open/closed/filtered verdicts.
//!
//! # Architecture
//!
//! - [`enumerator`]: lazy `(ip, port)` generation from literal hosts, CIDR blocks, dashed ranges,
//!   and target files.
//! - [`ports`]: port-spec parsing ordered by popularity rank.
//! - [`registry`]: the bounded probe-record deque with tombstone-then-reap deletion.
//! - [`poller`]: the readiness-poller abstraction over epoll/poll/select.
//! - [`governor`]: the bandwidth/rate/per-host-interval quota calculator.
//! - [`driver`]: the FILLING/PACING/SENDING/DRAINING/FINALIZING state machine tying it together.
//! - [`sink`]: the pluggable result sink.
//!
//! # Example
//!
//! ```no_run
//! use prtip_core::Config;
//! use prtip_scanner::driver::{ScanDriver, DriverOutcome};
//! use prtip_scanner::sink::StdoutSink;
//!
//! # fn example() -> prtip_core::Result<()> {
//! let config = Config::default();
//! let mut sink = StdoutSink::new(config.scan.show_closed);
//! let mut driver = ScanDriver::new(config, vec!["127.0.0.1".to_string()], None)?;
//! let DriverOutcome { stats, .. } = driver.run(&mut sink)?;
//! println!("{} probes sent", stats.probes_sent);
//! # Ok(())
//! # }
//! ```

pub mod driver;
pub mod enumerator;
pub mod governor;
pub mod poller;
pub mod ports;
pub mod registry;
pub mod sink;

pub use driver::{DriverOutcome, ScanDriver, ScanStats};
pub use enumerator::TargetEnumerator;
pub use governor::RateGovernor;
pub use ports::sorted_port_list;
pub use registry::ProbeRegistry;
pub use sink::{ResultSink, StdoutSink};
