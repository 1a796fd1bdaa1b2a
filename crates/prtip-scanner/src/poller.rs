//! Readiness Poller (SPEC §4.C): backend-specific wait-for-writable/hangup abstraction.
//!
//! Three backends, one per `PollerKind`, each with its own classification rule for turning raw
//! readiness bits into an open/closed/unexpected verdict (SPEC §4.F). Grounded in idiom on the
//! raw-`libc` epoll wrapper in `danclive-queen-io`'s `sys::epoll` — simplified here to the bare
//! `(fd, event-mask)` contract this scheduler needs, with no separate token/interest-list layer.

use prtip_core::{Error, PollerKind, Result};
use std::os::unix::io::RawFd;
use std::time::Duration;

/// Normalized readiness bits, independent of backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReadinessEvent {
    pub readable: bool,
    pub writable: bool,
    pub hangup: bool,
    pub error: bool,
}

impl ReadinessEvent {
    /// Packs the four flags into a small bitmask, used only to de-duplicate "unexpected event"
    /// warnings by distinct shape.
    pub fn as_bits(self) -> u32 {
        (self.readable as u32) | ((self.writable as u32) << 1) | ((self.hangup as u32) << 2) | ((self.error as u32) << 3)
    }
}

/// Outcome of classifying a readiness event against a connect-in-progress socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Classification {
    Open,
    Closed,
    Unexpected(u32),
}

/// A readiness-poller backend. All three variants register interest in "writable" (the connect
/// completion signal) plus whatever hangup/error bits the backend exposes.
pub enum Poller {
    #[cfg(target_os = "linux")]
    Epoll(EpollPoller),
    Poll(PollPoller),
    Select(SelectPoller),
}

impl Poller {
    pub fn new(kind: PollerKind, expected_sockets: usize) -> Result<Self> {
        match kind {
            PollerKind::Epoll => {
                #[cfg(target_os = "linux")]
                {
                    Ok(Poller::Epoll(EpollPoller::new(expected_sockets)?))
                }
                #[cfg(not(target_os = "linux"))]
                {
                    Err(Error::PollerFailure("epoll is only available on linux".to_string()))
                }
            }
            PollerKind::Select => Ok(Poller::Select(SelectPoller::new())),
            PollerKind::Poll => Ok(Poller::Poll(PollPoller::new())),
            PollerKind::Auto => {
                if cfg!(windows) {
                    Ok(Poller::Select(SelectPoller::new()))
                } else {
                    Ok(Poller::Poll(PollPoller::new()))
                }
            }
        }
    }

    pub fn register(&mut self, fd: RawFd) -> Result<()> {
        match self {
            #[cfg(target_os = "linux")]
            Poller::Epoll(p) => p.register(fd),
            Poller::Poll(p) => p.register(fd),
            Poller::Select(p) => p.register(fd),
        }
    }

    pub fn unregister(&mut self, fd: RawFd) -> Result<()> {
        match self {
            #[cfg(target_os = "linux")]
            Poller::Epoll(p) => p.unregister(fd),
            Poller::Poll(p) => p.unregister(fd),
            Poller::Select(p) => p.unregister(fd),
        }
    }

    /// Poll once and classify every event, returning `(fd, Classification)` pairs.
    pub fn poll(&mut self, timeout: Duration) -> Result<Vec<(RawFd, Classification)>> {
        match self {
            #[cfg(target_os = "linux")]
            Poller::Epoll(p) => p.poll_classified(timeout),
            Poller::Poll(p) => p.poll_classified(timeout),
            Poller::Select(p) => p.poll_classified(timeout),
        }
    }

    /// Hard ceiling this backend imposes on the number of concurrently-registered descriptors, if
    /// any (SPEC §4.C: `select` is capped near `FD_SETSIZE`).
    pub fn hard_cap(&self) -> Option<u32> {
        match self {
            #[cfg(target_os = "linux")]
            Poller::Epoll(_) => None,
            Poller::Poll(_) => None,
            Poller::Select(_) => Some(1021),
        }
    }
}

fn classify_hangup_only(ev: ReadinessEvent) -> Classification {
    if ev.hangup {
        Classification::Closed
    } else {
        Classification::Open
    }
}

fn classify_hangup_and_error(ev: ReadinessEvent) -> Classification {
    if ev.hangup && ev.error {
        Classification::Closed
    } else if ev.writable && !ev.hangup && !ev.error {
        Classification::Open
    } else {
        Classification::Unexpected(ev.as_bits())
    }
}

fn classify_select_style(ev: ReadinessEvent) -> Classification {
    if ev.readable && ev.writable {
        Classification::Closed
    } else if ev.writable {
        Classification::Open
    } else {
        Classification::Unexpected(ev.as_bits())
    }
}

#[cfg(target_os = "linux")]
pub struct EpollPoller {
    epfd: RawFd,
}

#[cfg(target_os = "linux")]
impl EpollPoller {
    fn new(expected_sockets: usize) -> Result<Self> {
        let epfd = unsafe { libc::epoll_create1(0) };
        if epfd < 0 {
            return Err(Error::PollerFailure(std::io::Error::last_os_error().to_string()));
        }
        let _ = expected_sockets;
        Ok(EpollPoller { epfd })
    }

    fn register(&mut self, fd: RawFd) -> Result<()> {
        let mut ev = libc::epoll_event {
            events: (libc::EPOLLOUT | libc::EPOLLRDHUP | libc::EPOLLET) as u32,
            u64: fd as u64,
        };
        let ret = unsafe { libc::epoll_ctl(self.epfd, libc::EPOLL_CTL_ADD, fd, &mut ev) };
        if ret < 0 {
            return Err(Error::PollerFailure(std::io::Error::last_os_error().to_string()));
        }
        Ok(())
    }

    fn unregister(&mut self, fd: RawFd) -> Result<()> {
        let ret = unsafe { libc::epoll_ctl(self.epfd, libc::EPOLL_CTL_DEL, fd, std::ptr::null_mut()) };
        if ret < 0 {
            let err = std::io::Error::last_os_error();
            if err.raw_os_error() != Some(libc::ENOENT) && err.raw_os_error() != Some(libc::EBADF) {
                return Err(Error::PollerFailure(err.to_string()));
            }
        }
        Ok(())
    }

    fn poll_classified(&mut self, timeout: Duration) -> Result<Vec<(RawFd, Classification)>> {
        let mut events = vec![libc::epoll_event { events: 0, u64: 0 }; 256];
        let timeout_ms = timeout.as_millis().min(i32::MAX as u128) as i32;
        let n = unsafe { libc::epoll_wait(self.epfd, events.as_mut_ptr(), events.len() as i32, timeout_ms) };
        if n < 0 {
            let err = std::io::Error::last_os_error();
            if err.kind() == std::io::ErrorKind::Interrupted {
                return Ok(Vec::new());
            }
            return Err(Error::PollerFailure(err.to_string()));
        }
        let mut out = Vec::with_capacity(n as usize);
        for ev in &events[..n as usize] {
            let bits = ev.events;
            let readiness = ReadinessEvent {
                readable: bits & (libc::EPOLLIN as u32) != 0,
                writable: bits & (libc::EPOLLOUT as u32) != 0,
                hangup: bits & (libc::EPOLLRDHUP as u32 | libc::EPOLLHUP as u32) != 0,
                error: bits & (libc::EPOLLERR as u32) != 0,
            };
            out.push((ev.u64 as RawFd, classify_hangup_only(readiness)));
        }
        Ok(out)
    }
}

#[cfg(target_os = "linux")]
impl Drop for EpollPoller {
    fn drop(&mut self) {
        unsafe {
            libc::close(self.epfd);
        }
    }
}

/// Level-triggered `poll(2)` backend — the default on non-Windows targets.
pub struct PollPoller {
    fds: Vec<libc::pollfd>,
}

impl PollPoller {
    fn new() -> Self {
        PollPoller { fds: Vec::new() }
    }

    fn register(&mut self, fd: RawFd) -> Result<()> {
        self.fds.push(libc::pollfd {
            fd,
            events: libc::POLLOUT,
            revents: 0,
        });
        Ok(())
    }

    fn unregister(&mut self, fd: RawFd) -> Result<()> {
        self.fds.retain(|p| p.fd != fd);
        Ok(())
    }

    fn poll_classified(&mut self, timeout: Duration) -> Result<Vec<(RawFd, Classification)>> {
        if self.fds.is_empty() {
            if !timeout.is_zero() {
                std::thread::sleep(timeout);
            }
            return Ok(Vec::new());
        }
        let timeout_ms = timeout.as_millis().min(i32::MAX as u128) as i32;
        let ret = unsafe { libc::poll(self.fds.as_mut_ptr(), self.fds.len() as libc::nfds_t, timeout_ms) };
        if ret < 0 {
            let err = std::io::Error::last_os_error();
            if err.kind() == std::io::ErrorKind::Interrupted {
                return Ok(Vec::new());
            }
            return Err(Error::PollerFailure(err.to_string()));
        }
        let mut out = Vec::new();
        for pfd in &mut self.fds {
            if pfd.revents == 0 {
                continue;
            }
            let readiness = ReadinessEvent {
                readable: pfd.revents & libc::POLLIN != 0,
                writable: pfd.revents & libc::POLLOUT != 0,
                hangup: pfd.revents & libc::POLLHUP != 0,
                error: pfd.revents & libc::POLLERR != 0,
            };
            out.push((pfd.fd, classify_hangup_and_error(readiness)));
            pfd.revents = 0;
        }
        Ok(out)
    }
}

/// `select(2)` backend — the only option on platforms without `poll`, and the one with a hard
/// descriptor-count ceiling (`FD_SETSIZE`, conventionally 1024; we leave headroom at 1021).
pub struct SelectPoller {
    fds: Vec<RawFd>,
}

impl SelectPoller {
    fn new() -> Self {
        SelectPoller { fds: Vec::new() }
    }

    fn register(&mut self, fd: RawFd) -> Result<()> {
        self.fds.push(fd);
        Ok(())
    }

    fn unregister(&mut self, fd: RawFd) -> Result<()> {
        self.fds.retain(|&f| f != fd);
        Ok(())
    }

    fn poll_classified(&mut self, timeout: Duration) -> Result<Vec<(RawFd, Classification)>> {
        if self.fds.is_empty() {
            if !timeout.is_zero() {
                std::thread::sleep(timeout);
            }
            return Ok(Vec::new());
        }
        let mut readfds: libc::fd_set = unsafe { std::mem::zeroed() };
        let mut writefds: libc::fd_set = unsafe { std::mem::zeroed() };
        let mut errorfds: libc::fd_set = unsafe { std::mem::zeroed() };
        unsafe {
            libc::FD_ZERO(&mut readfds);
            libc::FD_ZERO(&mut writefds);
            libc::FD_ZERO(&mut errorfds);
        }
        let mut maxfd = 0;
        for &fd in &self.fds {
            unsafe {
                libc::FD_SET(fd, &mut writefds);
                libc::FD_SET(fd, &mut errorfds);
            }
            maxfd = maxfd.max(fd);
        }
        let mut tv = libc::timeval {
            tv_sec: timeout.as_secs() as libc::time_t,
            tv_usec: timeout.subsec_micros() as libc::suseconds_t,
        };
        let ret = unsafe {
            libc::select(
                maxfd + 1,
                &mut readfds,
                &mut writefds,
                &mut errorfds,
                &mut tv,
            )
        };
        if ret < 0 {
            let err = std::io::Error::last_os_error();
            if err.kind() == std::io::ErrorKind::Interrupted {
                return Ok(Vec::new());
            }
            return Err(Error::PollerFailure(err.to_string()));
        }
        let mut out = Vec::new();
        for &fd in &self.fds {
            let writable = unsafe { libc::FD_ISSET(fd, &writefds) };
            let readable = unsafe { libc::FD_ISSET(fd, &readfds) };
            let error = unsafe { libc::FD_ISSET(fd, &errorfds) };
            if !writable && !readable && !error {
                continue;
            }
            let readiness = ReadinessEvent {
                readable,
                writable,
                hangup: false,
                error,
            };
            out.push((fd, classify_select_style(readiness)));
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hangup_only_classification() {
        let open = ReadinessEvent { readable: false, writable: true, hangup: false, error: false };
        assert_eq!(classify_hangup_only(open), Classification::Open);
        let closed = ReadinessEvent { readable: false, writable: false, hangup: true, error: false };
        assert_eq!(classify_hangup_only(closed), Classification::Closed);
    }

    #[test]
    fn hangup_and_error_classification() {
        let open = ReadinessEvent { readable: false, writable: true, hangup: false, error: false };
        assert_eq!(classify_hangup_and_error(open), Classification::Open);
        let closed = ReadinessEvent { readable: false, writable: false, hangup: true, error: true };
        assert_eq!(classify_hangup_and_error(closed), Classification::Closed);
        let unexpected = ReadinessEvent { readable: true, writable: false, hangup: false, error: false };
        assert!(matches!(classify_hangup_and_error(unexpected), Classification::Unexpected(_)));
    }

    #[test]
    fn select_style_classification() {
        let open = ReadinessEvent { readable: false, writable: true, hangup: false, error: false };
        assert_eq!(classify_select_style(open), Classification::Open);
        let closed = ReadinessEvent { readable: true, writable: true, hangup: false, error: false };
        assert_eq!(classify_select_style(closed), Classification::Closed);
    }

    #[test]
    fn select_backend_reports_hard_cap() {
        let poller = Poller::Select(SelectPoller::new());
        assert_eq!(poller.hard_cap(), Some(1021));
    }

    #[test]
    fn poll_backend_has_no_hard_cap() {
        let poller = Poller::Poll(PollPoller::new());
        assert_eq!(poller.hard_cap(), None);
    }
}
