//! Protocol constants for SCPI multimeter communication.
//!
//! This module defines the SCPI command strings, serial framing and timeout
//! parameters, and the settle delays used by the sampling loop.

/// Put the instrument under front-panel control
pub const CMD_LOCAL: &str = "SYSTem:LOCal";

/// Put the instrument under remote (bus) control
pub const CMD_REMOTE: &str = "SYSTem:REMote";

/// Query a four-wire resistance measurement, reply is ohms
pub const CMD_MEASURE_FRES: &str = "MEAS:FRESistance?";

/// Line terminator appended to every command
pub const LINE_TERMINATOR: &str = "\n";

/// Baud rate (9600 bps)
pub const BAUD_RATE: u32 = 9600;

/// Data bits configuration
pub const DATA_BITS: serialport::DataBits = serialport::DataBits::Eight;

/// Parity configuration
pub const PARITY: serialport::Parity = serialport::Parity::None;

/// Stop bits configuration
pub const STOP_BITS: serialport::StopBits = serialport::StopBits::One;

/// Flow control configuration
pub const FLOW_CONTROL: serialport::FlowControl = serialport::FlowControl::None;

/// Constant part of the read timeout window in milliseconds
pub const READ_TIMEOUT_CONSTANT_MS: u64 = 50;

/// Per-byte part of the read timeout window in milliseconds
pub const READ_TIMEOUT_PER_BYTE_MS: u64 = 10;

/// Maximum gap between two received bytes once a reply has started
pub const READ_INTERVAL_MS: u64 = 50;

/// Constant part of the write timeout window in milliseconds
pub const WRITE_TIMEOUT_CONSTANT_MS: u64 = 50;

/// Per-byte part of the write timeout window in milliseconds
pub const WRITE_TIMEOUT_PER_BYTE_MS: u64 = 10;

/// Largest reply read in one `read_line` call
pub const MAX_LINE_LEN: usize = 255;

/// Delay after a local/remote mode switch
pub const MODE_SETTLE_MS: u64 = 1000;

/// Delay after every resistance query
pub const READ_SETTLE_MS: u64 = 50;

/// Pause between two samples of a series
pub const SAMPLE_PAUSE_MS: u64 = 10;

/// Number of samples in a series
pub const SAMPLE_COUNT: usize = 10;

/// Default serial port
#[cfg(unix)]
pub const DEFAULT_PORT: &str = "/dev/ttyUSB1";
/// Default serial port
#[cfg(windows)]
pub const DEFAULT_PORT: &str = "COM3";
/// Default serial port
#[cfg(not(any(unix, windows)))]
pub const DEFAULT_PORT: &str = "";
