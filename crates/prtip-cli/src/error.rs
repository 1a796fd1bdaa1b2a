//! CLI-facing error reporting (SPEC_FULL §7): maps the crate-wide `Error` onto the process exit
//! code and stdout/stderr wording the spec prescribes.

use colored::Colorize;
use prtip_core::Error;

/// Process exit codes (SPEC_FULL §6/§7).
pub mod exit_codes {
    /// Normal completion, including "no hosts found" and user-error (`ConfigError`) cases.
    pub const SUCCESS: i32 = 0;
    /// Fatal: file-descriptor exhaustion or poller failure.
    pub const FATAL: i32 = 1;
}

/// Print `err` the way SPEC_FULL §7 prescribes and return the process exit code for it.
///
/// `ConfigError`/`Parse` are user errors: printed with an `[E]` prefix, exit 0. `FdExhaustion` and
/// `PollerFailure` are fatal: printed with guidance, exit 1. Any other I/O error is treated as
/// fatal too, since it did not originate from a classified, recoverable path (SPEC_FULL §7's
/// propagation policy funnels everything else through the scan-aborting branch).
pub fn report(err: &Error) -> i32 {
    match err {
        Error::Config(msg) | Error::Parse(msg) => {
            eprintln!("{} {msg}", "[E]".yellow().bold());
            exit_codes::SUCCESS
        }
        Error::FdExhaustion(msg) => {
            eprintln!("{} {msg}", "[fatal]".red().bold());
            exit_codes::FATAL
        }
        Error::PollerFailure(msg) => {
            eprintln!("{} poller failure: {msg}", "[fatal]".red().bold());
            exit_codes::FATAL
        }
        Error::Io(io_err) => {
            eprintln!("{} I/O error: {io_err}", "[fatal]".red().bold());
            exit_codes::FATAL
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_exits_zero() {
        assert_eq!(report(&Error::Config("bad target".to_string())), exit_codes::SUCCESS);
    }

    #[test]
    fn parse_error_exits_zero() {
        assert_eq!(report(&Error::Parse("bad ip".to_string())), exit_codes::SUCCESS);
    }

    #[test]
    fn fd_exhaustion_exits_one() {
        assert_eq!(report(&Error::FdExhaustion("EMFILE".to_string())), exit_codes::FATAL);
    }

    #[test]
    fn poller_failure_exits_one() {
        assert_eq!(report(&Error::PollerFailure("epoll_wait".to_string())), exit_codes::FATAL);
    }
}
