//! Classification of raw OS errors into the scheduler's error taxonomy.
//!
//! A non-blocking `connect()` can fail for many OS-specific reasons; the driver only needs to
//! know which of a handful of *scheduling* responses applies (retry later, warn once, or abort).
//! This module is the single place that maps a raw [`std::io::Error`] onto that decision.

use std::io;

/// Scheduling-relevant classification of a connect/socket-creation failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanErrorKind {
    /// `connect()` reported the connection was actively refused (RST received synchronously;
    /// rare for non-blocking connects but possible on loopback).
    ConnectionRefused,
    /// No reply within the scheduler's own timeout bookkeeping; not an OS error per se.
    Timeout,
    /// ENETUNREACH — no route to the network. Accounted as sent, warned once per host.
    NetworkUnreachable,
    /// EHOSTUNREACH — no route to the host. Accounted as sent, warned once per host.
    HostUnreachable,
    /// EACCES/EPERM on socket creation or connect.
    PermissionDenied,
    /// EMFILE/ENFILE — the process or system is out of file descriptors. Fatal.
    TooManyOpenFiles,
    /// Anything else; propagated rather than silently absorbed.
    Other,
}

impl ScanErrorKind {
    /// Whether the scheduler should treat this as recoverable (warn-and-continue) per SPEC §7, or
    /// let it propagate and abort the scan.
    pub fn is_recoverable(self) -> bool {
        matches!(
            self,
            ScanErrorKind::NetworkUnreachable | ScanErrorKind::HostUnreachable
        )
    }

    /// Whether this error should abort the whole scan (fatal, exit 1).
    pub fn is_fatal(self) -> bool {
        matches!(self, ScanErrorKind::TooManyOpenFiles)
    }
}

/// Classify a raw I/O error from `connect()` or socket creation.
pub fn categorize_io_error(err: &io::Error) -> ScanErrorKind {
    #[cfg(unix)]
    if let Some(code) = err.raw_os_error() {
        match code {
            libc::ENETUNREACH => return ScanErrorKind::NetworkUnreachable,
            libc::EHOSTUNREACH => return ScanErrorKind::HostUnreachable,
            libc::EMFILE | libc::ENFILE => return ScanErrorKind::TooManyOpenFiles,
            _ => {}
        }
    }

    match err.kind() {
        io::ErrorKind::ConnectionRefused => ScanErrorKind::ConnectionRefused,
        io::ErrorKind::TimedOut => ScanErrorKind::Timeout,
        io::ErrorKind::PermissionDenied => ScanErrorKind::PermissionDenied,
        _ => ScanErrorKind::Other,
    }
}
