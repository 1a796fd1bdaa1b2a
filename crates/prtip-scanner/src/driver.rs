//! Scan Driver (SPEC §4.F): the FILLING / PACING / SENDING / DRAINING / FINALIZING cooperative
//! state machine tying the enumerator, registry, poller, and rate governor together.
//!
//! Grounded on the Python original's `ScannerTCP.start_scan`/`receive_packets`, restructured out
//! of its `while True` single method into one driver method per phase so each phase's invariants
//! are checkable in isolation. Single-threaded: the whole engine runs on the calling thread, no
//! worker pool, no async runtime.

use crate::enumerator::TargetEnumerator;
use crate::governor::RateGovernor;
use crate::poller::{Classification, Poller};
use crate::ports::sorted_port_list;
use crate::registry::ProbeRegistry;
use crate::sink::ResultSink;
use prtip_core::{categorize_io_error, Config, Error, PortRange, Result, ScanErrorKind};
use std::collections::HashSet;
use std::net::{Ipv4Addr, SocketAddrV4, TcpStream};
use std::os::unix::io::{AsRawFd, FromRawFd, RawFd};
use std::path::PathBuf;
use std::time::{Duration, Instant};

/// Packet overhead assumed for bandwidth accounting: a bare TCP SYN over Ethernet/IPv4.
const PACKET_OVERHEAD_BYTES: u32 = 74;

/// Totals reported at the end of a scan (SPEC §7).
#[derive(Debug, Clone, Default)]
pub struct ScanStats {
    pub hosts: u64,
    pub probes_sent: u64,
    pub bytes_sent: u64,
    pub replies: u64,
    pub duration: Duration,
    pub sleep_bandwidth: u64,
    pub sleep_rate: u64,
    pub sleep_per_host: u64,
}

impl ScanStats {
    pub fn bits_per_second(&self) -> f64 {
        let secs = self.duration.as_secs_f64();
        if secs <= 0.0 {
            0.0
        } else {
            (self.bytes_sent as f64 * 8.0) / secs
        }
    }

    pub fn packets_per_second(&self) -> f64 {
        let secs = self.duration.as_secs_f64();
        if secs <= 0.0 {
            0.0
        } else {
            self.probes_sent as f64 / secs
        }
    }
}

/// Returned by [`ScanDriver::run`].
#[derive(Debug, Clone, Default)]
pub struct DriverOutcome {
    pub stats: ScanStats,
}

pub struct ScanDriver {
    enumerator: TargetEnumerator,
    registry: ProbeRegistry,
    poller: Poller,
    governor: RateGovernor,
    block_list: Vec<Ipv4Addr>,
    per_host_interval: Duration,
    recv_interval: Duration,
    max_probes: u32,
    high_water: usize,
    low_water: usize,
    show_closed: bool,
    enumerator_exhausted: bool,
    warned_blocked: HashSet<Ipv4Addr>,
    warned_unreachable: HashSet<Ipv4Addr>,
    warned_unexpected: HashSet<u32>,
    start: Instant,
    host_count: u64,
    replies: u64,
}

impl ScanDriver {
    /// Build a driver from a validated [`Config`] and either a literal target list or a target
    /// file (mutually exclusive; specifying neither scans nothing, specifying both is a config
    /// error per SPEC §6).
    pub fn new(config: Config, targets: Vec<String>, target_file: Option<PathBuf>) -> Result<Self> {
        config.validate()?;

        if target_file.is_some() && !targets.is_empty() {
            return Err(Error::Config(
                "specify either a target file or positional targets, not both".to_string(),
            ));
        }

        let ports = PortRange::parse(&config.scan.ports)?;
        let sorted_ports = sorted_port_list(ports.as_slice());

        let enumerator = match &target_file {
            Some(path) => TargetEnumerator::from_file(path, sorted_ports)?,
            None => TargetEnumerator::from_tokens(&targets, sorted_ports)?,
        };

        let per_host_interval = Duration::from_secs_f64(config.scan.rtt_seconds);
        let recv_interval = Duration::from_secs_f64(config.performance.recv_interval_seconds);
        let governor = RateGovernor::new(
            config.network.bandwidth_bps,
            config.network.packet_rate,
            PACKET_OVERHEAD_BYTES,
        );

        let suggested_high_water = {
            let inter = governor.inter_packet_interval().as_secs_f64();
            if inter <= 0.0 {
                1024
            } else {
                ((1.5 * config.scan.rtt_seconds) / inter).round().max(1.0) as u32
            }
        };

        let mut high_water = config.network.max_sockets.unwrap_or(suggested_high_water);
        if let Some(requested) = config.network.max_sockets {
            let lo = (0.7 * suggested_high_water as f64) as u32;
            let hi = (1.1 * suggested_high_water as f64) as u32;
            if requested < lo || requested > hi {
                tracing::warn!(
                    requested,
                    suggested = suggested_high_water,
                    "max-sockets is far from the value the rate/timing settings imply"
                );
            }
        }

        let poller = Poller::new(config.network.poller, high_water as usize)?;
        if let Some(cap) = poller.hard_cap() {
            if high_water > cap {
                tracing::warn!(high_water, cap, "clamping max-sockets to the poller's hard cap");
                high_water = cap;
            }
        }

        if let Ok(limits) = prtip_core::resource_limits::get_file_descriptor_limit() {
            let (clamped, reduced) = prtip_core::resource_limits::clamp_high_water_to_fd_limit(high_water, limits.soft);
            if reduced {
                tracing::warn!(
                    high_water,
                    clamped,
                    soft_limit = limits.soft,
                    "clamping max-sockets to the process file descriptor limit"
                );
            }
            high_water = clamped;
        }

        let low_water = ((high_water as f64) * 0.9) as usize;

        Ok(ScanDriver {
            enumerator,
            registry: ProbeRegistry::new(),
            poller,
            governor,
            block_list: config.network.block_list.clone(),
            per_host_interval,
            recv_interval,
            max_probes: config.scan.retries + 1,
            high_water: high_water as usize,
            low_water,
            show_closed: config.scan.show_closed,
            enumerator_exhausted: false,
            warned_blocked: HashSet::new(),
            warned_unreachable: HashSet::new(),
            warned_unexpected: HashSet::new(),
            start: Instant::now(),
            host_count: 0,
            replies: 0,
        })
    }

    /// Run the scan to completion, reporting every verdict to `sink`.
    pub fn run(&mut self, sink: &mut dyn ResultSink) -> Result<DriverOutcome> {
        self.start = Instant::now();

        loop {
            if !self.enumerator_exhausted && self.registry.size() < self.low_water {
                self.fill(sink);
                self.registry.sort(self.per_host_interval, Instant::now());
            }

            if self.registry.size() == 0 && self.enumerator_exhausted {
                break;
            }

            self.pace(sink)?;

            let quota = self.governor.available_quota(Instant::now());
            self.send_batch(quota, sink)?;

            self.drain(sink)?;
        }

        // FINALIZING: keep draining until every outstanding socket has been reaped or timed out.
        let deadline = Instant::now() + self.per_host_interval + Duration::from_millis(50);
        while self.registry.size() > 0 && Instant::now() < deadline {
            self.drain(sink)?;
        }

        let stats = ScanStats {
            hosts: self.host_count,
            probes_sent: self.governor.packets_sent(),
            bytes_sent: self.governor.bytes_sent(),
            replies: self.replies,
            duration: self.start.elapsed(),
            sleep_bandwidth: self.governor.sleep_reasons.bandwidth,
            sleep_rate: self.governor.sleep_reasons.packet_rate,
            sleep_per_host: self.governor.sleep_reasons.per_host,
        };

        Ok(DriverOutcome { stats })
    }

    /// FILLING: top the registry up from the enumerator, skipping block-listed hosts.
    fn fill(&mut self, sink: &mut dyn ResultSink) {
        while self.registry.size() < self.high_water {
            match self.enumerator.next() {
                Some((ip, port, probe_index)) => {
                    if self.block_list.contains(&ip) {
                        if self.warned_blocked.insert(ip) {
                            sink.on_warning(&format!("skipping blocked host {ip}"));
                        }
                        continue;
                    }
                    if probe_index == 0 {
                        self.host_count += 1;
                    }
                    self.registry.add(ip, port, probe_index);
                }
                None => {
                    self.enumerator_exhausted = true;
                    return;
                }
            }
        }
    }

    /// PACING: block (draining the poller along the way) until one of the three quotas clears.
    fn pace(&mut self, sink: &mut dyn ResultSink) -> Result<()> {
        loop {
            let now = Instant::now();
            let bandwidth_quota = self.governor.bandwidth_quota_packets(now);
            let rate_quota = self.governor.rate_quota_packets(now);
            let host_wait = self.registry.peek_left_wait(now, self.per_host_interval);

            if bandwidth_quota > 0 && rate_quota > 0 && host_wait.is_none() {
                return Ok(());
            }

            if bandwidth_quota <= 0 {
                self.governor.note_bandwidth_wait();
            } else if rate_quota <= 0 {
                self.governor.note_rate_wait();
            } else {
                self.governor.note_per_host_wait();
            }

            let wait = host_wait.unwrap_or(Duration::ZERO).max(self.governor.inter_packet_interval());
            if wait > self.recv_interval {
                self.drain(sink)?;
                std::thread::sleep(self.recv_interval);
            } else if wait > Duration::ZERO {
                std::thread::sleep(wait);
            } else {
                return Ok(());
            }
        }
    }

    /// SENDING: issue up to `quota` new probes, reaping/tombstoning stale records along the way.
    fn send_batch(&mut self, quota: u32, sink: &mut dyn ResultSink) -> Result<()> {
        let n = quota.min(self.registry.size() as u32);
        for _ in 0..n {
            let Some(id) = self.registry.peek_left() else {
                break;
            };

            if self.registry.record(id).deleted {
                self.reap_front();
                continue;
            }

            let now = Instant::now();
            let probes_sent = self.registry.record(id).probes_sent;
            let sent_time = self.registry.record(id).probe_sent_time;

            if probes_sent >= self.max_probes {
                let overdue = sent_time.map(|t| now > t + self.per_host_interval).unwrap_or(false);
                if overdue {
                    self.tombstone(id);
                    continue;
                }
                break;
            }

            if let Some(t) = sent_time {
                if t + self.per_host_interval > now {
                    break;
                }
            }

            self.issue_probe(id, sink)?;
        }
        Ok(())
    }

    fn issue_probe(&mut self, id: crate::registry::ProbeId, sink: &mut dyn ResultSink) -> Result<()> {
        let (ip, port) = {
            let rec = self.registry.record(id);
            (rec.target_ip, rec.target_port)
        };

        match connect_nonblocking(ip, port) {
            Ok(stream) => {
                let fd = stream.as_raw_fd();
                self.poller.register(fd)?;
                self.registry.attach_socket(id, stream);
            }
            Err(err) => {
                let kind = categorize_io_error(&err);
                match kind {
                    ScanErrorKind::NetworkUnreachable | ScanErrorKind::HostUnreachable => {
                        if self.warned_unreachable.insert(ip) {
                            sink.on_warning(&format!("{ip} is unreachable"));
                        }
                    }
                    ScanErrorKind::TooManyOpenFiles => {
                        return Err(Error::FdExhaustion(err.to_string()));
                    }
                    _ => return Err(Error::Io(err)),
                }
            }
        }

        let rec = self.registry.record_mut(id);
        rec.probes_sent += 1;
        rec.probe_sent_time = Some(Instant::now());
        self.governor.record_probe_sent();
        self.registry.rotate_left_to_right();
        Ok(())
    }

    /// DRAINING: poll with a zero timeout and classify every ready descriptor.
    fn drain(&mut self, sink: &mut dyn ResultSink) -> Result<()> {
        let events = self.poller.poll(Duration::ZERO)?;
        for (fd, classification) in events {
            let Some(id) = self.registry.lookup_by_fd(fd) else {
                continue;
            };
            if self.registry.record(id).deleted {
                continue;
            }
            let (ip, port) = {
                let rec = self.registry.record(id);
                (rec.target_ip, rec.target_port)
            };
            match classification {
                Classification::Open => {
                    sink.on_open(ip, port);
                    self.replies += 1;
                    self.tombstone(id);
                }
                Classification::Closed => {
                    if self.show_closed {
                        sink.on_closed(ip, port);
                    }
                    self.replies += 1;
                    self.tombstone(id);
                }
                Classification::Unexpected(mask) => {
                    if self.warned_unexpected.insert(mask) {
                        sink.on_warning(&format!("unexpected socket readiness bits: {mask:#06b}"));
                    }
                }
            }
        }
        Ok(())
    }

    fn tombstone(&mut self, id: crate::registry::ProbeId) {
        if let Some(socket) = self.registry.schedule_delete(id) {
            let fd = socket.as_raw_fd();
            let _ = self.poller.unregister(fd);
            drop(socket);
        }
    }

    fn reap_front(&mut self) {
        self.registry.pop_left();
    }
}

/// Open a non-blocking TCP connect attempt, treating `EINPROGRESS` as the expected pending state
/// rather than an error.
fn connect_nonblocking(ip: Ipv4Addr, port: u16) -> std::io::Result<TcpStream> {
    unsafe {
        let fd = libc::socket(libc::AF_INET, libc::SOCK_STREAM, 0);
        if fd < 0 {
            return Err(std::io::Error::last_os_error());
        }

        let flags = libc::fcntl(fd, libc::F_GETFL, 0);
        if flags < 0 || libc::fcntl(fd, libc::F_SETFL, flags | libc::O_NONBLOCK) < 0 {
            let err = std::io::Error::last_os_error();
            libc::close(fd);
            return Err(err);
        }

        let addr = SocketAddrV4::new(ip, port);
        let mut sockaddr: libc::sockaddr_in = std::mem::zeroed();
        sockaddr.sin_family = libc::AF_INET as libc::sa_family_t;
        sockaddr.sin_port = addr.port().to_be();
        sockaddr.sin_addr.s_addr = u32::from_ne_bytes(addr.ip().octets());

        let ret = libc::connect(
            fd,
            &sockaddr as *const libc::sockaddr_in as *const libc::sockaddr,
            std::mem::size_of::<libc::sockaddr_in>() as u32,
        );
        if ret < 0 {
            let err = std::io::Error::last_os_error();
            if err.raw_os_error() != Some(libc::EINPROGRESS) {
                libc::close(fd);
                return Err(err);
            }
        }

        Ok(TcpStream::from_raw_fd(fd as RawFd))
    }
}
