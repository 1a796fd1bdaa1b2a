//! Final scan summary (SPEC_FULL §6: "final summary line with bytes, probes, duration, hosts,
//! and rates").

use colored::Colorize;
use prtip_scanner::ScanStats;

/// Print the end-of-scan summary line(s).
pub fn print_summary(stats: &ScanStats) {
    println!();
    println!(
        "{} {} probes, {} bytes, {} replies, {} hosts in {:.2}s ({:.0} bit/s, {:.1} pps)",
        "done:".bright_white().bold(),
        stats.probes_sent.to_string().cyan(),
        stats.bytes_sent.to_string().cyan(),
        stats.replies.to_string().cyan(),
        stats.hosts.to_string().cyan(),
        stats.duration.as_secs_f64(),
        stats.bits_per_second(),
        stats.packets_per_second(),
    );
    tracing::debug!(
        sleep_bandwidth = stats.sleep_bandwidth,
        sleep_rate = stats.sleep_rate,
        sleep_per_host = stats.sleep_per_host,
        "pacing sleep reasons"
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn print_summary_does_not_panic_on_zero_duration() {
        let stats = ScanStats {
            hosts: 0,
            probes_sent: 0,
            bytes_sent: 0,
            replies: 0,
            duration: Duration::ZERO,
            sleep_bandwidth: 0,
            sleep_rate: 0,
            sleep_per_host: 0,
        };
        print_summary(&stats);
    }
}
