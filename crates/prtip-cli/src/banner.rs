//! Startup banner and boxed configuration dump (SPEC_FULL §6 stdout format).

use chrono::Local;
use colored::Colorize;
use prtip_core::Config;

/// Print the version/timestamp banner line.
pub fn print_banner(version: &str) {
    println!(
        "{} {} {} {}",
        "prtip".bright_cyan().bold(),
        version.bright_green(),
        "-".bright_black(),
        Local::now().format("%Y-%m-%d %H:%M:%S %Z").to_string().bright_white()
    );
}

/// Print a boxed dump of the effective configuration before the scan starts.
pub fn print_config_box(config: &Config, target_count_hint: &str) {
    let rows = [
        ("targets".to_string(), target_count_hint.to_string()),
        ("ports".to_string(), config.scan.ports.clone()),
        ("retries".to_string(), config.scan.retries.to_string()),
        ("rtt".to_string(), format!("{:.3}s", config.scan.rtt_seconds)),
        (
            "bandwidth".to_string(),
            format!("{} bit/s", config.network.bandwidth_bps),
        ),
        (
            "packet rate".to_string(),
            if config.network.packet_rate == 0 {
                "unlimited".to_string()
            } else {
                format!("{}/s", config.network.packet_rate)
            },
        ),
        (
            "max sockets".to_string(),
            config
                .network
                .max_sockets
                .map(|n| n.to_string())
                .unwrap_or_else(|| "auto".to_string()),
        ),
        ("poller".to_string(), format!("{:?}", config.network.poller).to_lowercase()),
        ("show closed".to_string(), config.scan.show_closed.to_string()),
        (
            "block list".to_string(),
            if config.network.block_list.is_empty() {
                "none".to_string()
            } else {
                config
                    .network
                    .block_list
                    .iter()
                    .map(|ip| ip.to_string())
                    .collect::<Vec<_>>()
                    .join(",")
            },
        ),
        ("debug log".to_string(), config.output.debug_log.to_string()),
    ];

    let label_width = rows.iter().map(|(k, _)| k.len()).max().unwrap_or(0);
    let value_width = rows.iter().map(|(_, v)| v.len()).max().unwrap_or(0);
    let inner_width = label_width + value_width + 3;

    let top = format!("┌{}┐", "─".repeat(inner_width));
    let bottom = format!("└{}┘", "─".repeat(inner_width));

    println!("{}", top.bright_black());
    for (key, value) in &rows {
        println!(
            "{} {:<label_width$} {} {:<value_width$} {}",
            "│".bright_black(),
            key.bright_white().bold(),
            ":".bright_black(),
            value.bright_green(),
            "│".bright_black(),
            label_width = label_width,
            value_width = value_width,
        );
    }
    println!("{}", bottom.bright_black());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_box_does_not_panic_on_default_config() {
        let config = Config::default();
        print_config_box(&config, "1 host");
    }

    #[test]
    fn config_box_handles_empty_block_list_and_auto_sockets() {
        let config = Config::default();
        assert!(config.network.block_list.is_empty());
        assert!(config.network.max_sockets.is_none());
        print_config_box(&config, "0 hosts");
    }
}
