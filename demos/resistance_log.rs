//! Resistance Log Example
//!
//! This example runs a full acquisition session against a SCPI multimeter:
//! - Switch to local, then remote control
//! - Take one warm-up reading
//! - Record a timed series of four-wire resistance readings
//! - Print the readings and accumulated times, then the run as JSON
//!
//! Usage:
//!   cargo run --example resistance_log                    # Default port
//!   cargo run --example resistance_log -- COM3            # Specify port
//!   cargo run --example resistance_log -- /dev/ttyUSB0
//!   cargo run --example resistance_log -- --dry-run       # No instrument needed
//!
//! Set RUST_LOG environment variable to control logging:
//!   RUST_LOG=debug cargo run --example resistance_log

use log::{error, info};
use scpi_dmm::{
    Multimeter, Result, SamplingConfig, ScriptedChannel, SerialChannel,
    constants::DEFAULT_PORT,
};
use std::time::Duration;

/// Channel that answers like a 100 ohm reference resistor with a couple of hiccups
fn dry_run_channel(port_name: &str, count: usize) -> ScriptedChannel {
    let mut channel = ScriptedChannel::new(port_name);
    channel.push_reply("+1.00012E+02");
    for i in 0..count {
        match i {
            3 => channel.push_reply(""),
            6 => channel.push_reply("OVLD"),
            _ => channel.push_reply(format!("{:+.5E}", 100.0 + i as f64 * 0.001)),
        };
    }
    channel
}

fn main() -> Result<()> {
    // Initialize logger with default info level if RUST_LOG is not set
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut dry_run = false;
    let mut port_name = DEFAULT_PORT.to_string();
    for arg in std::env::args().skip(1) {
        if arg == "--dry-run" {
            dry_run = true;
        } else {
            port_name = arg;
        }
    }

    let config = SamplingConfig::new(port_name.as_str());

    let channel: Box<dyn SerialChannel> = if dry_run {
        info!("Dry run, no instrument attached");
        Box::new(dry_run_channel(&port_name, config.sample_count))
    } else {
        info!("Connecting to multimeter on {}...", port_name);
        match scpi_dmm::PortChannel::open_with(&port_name, &config.serial) {
            Ok(channel) => Box::new(channel),
            Err(e) => {
                error!("{}", e);
                error!("Check that:");
                error!("1. The multimeter is powered and connected");
                error!("2. Correct serial port is specified");
                error!("3. The instrument is set to 9600 baud, 8 data bits, no parity");
                return Err(e);
            }
        }
    };

    let config = if dry_run {
        config.with_delays(Duration::from_millis(10), Duration::from_millis(5), Duration::from_millis(10))
    } else {
        config
    };

    let mut dmm = Multimeter::with_channel(channel, config);
    let run = dmm.acquire();
    dmm.close();

    run.print();

    for diagnostic in &run.diagnostics {
        info!("Diagnostic: {}", diagnostic);
    }

    if let Ok(json) = serde_json::to_string_pretty(&run) {
        info!("JSON Export:");
        info!("{}", json);
    }

    Ok(())
}
