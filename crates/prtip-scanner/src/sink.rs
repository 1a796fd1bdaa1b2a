//! Result Sink (SPEC §4.G): where verdicts and warnings go.
//!
//! The driver never prints directly — it only calls [`ResultSink`] methods, so the CLI layer can
//! swap in a quieter or differently-formatted sink without touching the scheduler. Grounded on the
//! Python original's `print` calls in `receive_packets`/`dump`, and on the teacher's `colored`-based
//! terminal coloring convention for port state.

use colored::Colorize;
use std::fs::File;
use std::io;
use std::net::Ipv4Addr;
use std::path::Path;

/// Receives scan verdicts and out-of-band warnings as the driver produces them.
pub trait ResultSink {
    fn on_open(&mut self, ip: Ipv4Addr, port: u16);
    fn on_closed(&mut self, ip: Ipv4Addr, port: u16);
    fn on_warning(&mut self, text: &str);
}

/// Prints one line per result to stdout, colored by state, with warnings on stderr. Optionally
/// mirrors every open verdict to an append-only CSV debug log (SPEC §4.G, §6 `-d`).
pub struct StdoutSink {
    show_closed: bool,
    debug_log: Option<csv::Writer<File>>,
}

impl StdoutSink {
    pub fn new(show_closed: bool) -> Self {
        StdoutSink { show_closed, debug_log: None }
    }

    /// Same as [`StdoutSink::new`], but also appends every open verdict as a
    /// `(probe_name, ip, port, payload_hex)` row to `path`.
    pub fn with_debug_log(show_closed: bool, path: &Path) -> io::Result<Self> {
        let needs_header = !path.exists();
        let file = std::fs::OpenOptions::new().create(true).append(true).open(path)?;
        let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(file);
        if needs_header {
            writer.write_record(["probe_name", "ip", "port", "payload_hex"])?;
            writer.flush()?;
        }
        Ok(StdoutSink { show_closed, debug_log: Some(writer) })
    }
}

impl ResultSink for StdoutSink {
    fn on_open(&mut self, ip: Ipv4Addr, port: u16) {
        println!("{} {ip}:{port}", "Received SYN/ACK for".green().bold());
        if let Some(writer) = &mut self.debug_log {
            let _ = writer.write_record(["TCP Scan", &ip.to_string(), &port.to_string(), ""]);
            let _ = writer.flush();
        }
    }

    fn on_closed(&mut self, ip: Ipv4Addr, port: u16) {
        if self.show_closed {
            println!("{} {ip}:{port}", "Received RST for".red());
        }
    }

    fn on_warning(&mut self, text: &str) {
        eprintln!("{} {text}", "warning:".yellow().bold());
    }
}
