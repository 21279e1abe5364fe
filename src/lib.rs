//! # SCPI DMM Library
//!
//! A Rust library for logging four-wire resistance readings from a bench
//! multimeter that speaks SCPI over a serial link.
//!
//! ## Features
//!
//! - Line-oriented serial channel (9600 baud, 8-N-1, bounded read/write timeouts)
//! - Local/remote mode switching
//! - Timed sampling series with per-sample round trip time and accumulated time
//! - Failed readings degrade to a 0.0 sentinel and are reported as diagnostics
//! - Scripted in-memory channel for running without an instrument
//!
//! ## Example
//!
//! ```no_run
//! use scpi_dmm::{Multimeter, SamplingConfig};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut dmm = Multimeter::open(SamplingConfig::new("/dev/ttyUSB1"))?;
//!     let run = dmm.acquire();
//!     println!("First reading: {} ohm", run.data_r[0]);
//!     dmm.close();
//!     Ok(())
//! }
//! ```

pub mod channel;
pub mod constants;
pub mod error;
pub mod protocol;
pub mod sim;
pub mod types;

pub use channel::{PortChannel, SerialChannel};
pub use error::{DmmError, Result};
pub use protocol::{parse_reading, Multimeter};
pub use sim::{ScriptedChannel, WriteFault};
pub use types::*;
