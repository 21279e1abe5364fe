//! Error types for multimeter communication.

use thiserror::Error;

/// Result type alias for multimeter operations.
pub type Result<T> = std::result::Result<T, DmmError>;

/// Error types for serial multimeter communication.
#[derive(Error, Debug)]
pub enum DmmError {
    /// Device could not be acquired or configured. Fatal for a run.
    #[error("Failed to open serial port {port}: {source}")]
    OpenFailed {
        /// Port identifier passed to open
        port: String,
        /// Underlying serial port error
        #[source]
        source: serialport::Error,
    },

    /// Command was not fully transmitted
    #[error("Write failed: sent {written} of {expected} bytes")]
    WriteFailed {
        /// Bytes accepted by the transport
        written: usize,
        /// Bytes requested
        expected: usize,
        /// Transport error, if the write call itself failed
        #[source]
        source: Option<std::io::Error>,
    },

    /// Underlying transport I/O error while reading
    #[error("Read failed: {0}")]
    ReadFailed(#[source] std::io::Error),

    /// Instrument sent nothing within the read timeout window
    #[error("Empty response")]
    EmptyResponse,

    /// Reply was not a decimal number
    #[error("Conversion failed: {text:?} is not a number")]
    ConversionFailed {
        /// Raw reply text
        text: String,
    },

    /// Operation attempted on a closed or never opened channel
    #[error("Channel closed")]
    ChannelClosed,

    /// Serial port error
    #[error("Serial port error: {0}")]
    SerialPort(#[from] serialport::Error),

    /// General I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DmmError {
    /// Build a `WriteFailed` for a write call that returned an error.
    pub(crate) fn write_error(expected: usize, source: std::io::Error) -> Self {
        DmmError::WriteFailed {
            written: 0,
            expected,
            source: Some(source),
        }
    }
}
