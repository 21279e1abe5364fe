//! Line-oriented serial transport.
//!
//! [`SerialChannel`] is the contract the sampling loop talks to: write one
//! command line, read one reply line, close. [`PortChannel`] implements it on
//! top of the `serialport` crate, which covers both POSIX ttys and Windows COM
//! ports, so the loop never sees platform handles.

use crate::constants::*;
use crate::error::{DmmError, Result};
use crate::types::SerialSettings;
use log::debug;
use serialport::SerialPort;
use std::io::{ErrorKind, Read, Write};
use std::time::{Duration, Instant};

/// Line-oriented serial channel
pub trait SerialChannel {
    /// Identifier the channel was opened with
    fn port_name(&self) -> &str;

    fn is_open(&self) -> bool;

    /// Send `text` as is; the caller includes the line terminator.
    fn write_line(&mut self, text: &str) -> Result<usize>;

    /// Read one reply line without its terminator.
    ///
    /// Returns an empty string when nothing arrives within the read timeout
    /// window. Only transport errors are reported as `ReadFailed`.
    fn read_line(&mut self) -> Result<String>;

    /// Release the device. Calling it again is a no-op.
    fn close(&mut self);
}

impl<C: SerialChannel + ?Sized> SerialChannel for Box<C> {
    fn port_name(&self) -> &str {
        (**self).port_name()
    }

    fn is_open(&self) -> bool {
        (**self).is_open()
    }

    fn write_line(&mut self, text: &str) -> Result<usize> {
        (**self).write_line(text)
    }

    fn read_line(&mut self) -> Result<String> {
        (**self).read_line()
    }

    fn close(&mut self) {
        (**self).close()
    }
}

/// Accumulates received bytes and splits them into lines
#[derive(Debug, Default)]
pub(crate) struct LineBuffer {
    buf: Vec<u8>,
}

impl LineBuffer {
    pub(crate) fn push(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub(crate) fn len(&self) -> usize {
        self.buf.len()
    }

    /// Remove and return the first complete line, if any
    pub(crate) fn take_line(&mut self) -> Option<String> {
        let end = self.buf.iter().position(|&b| b == b'\n')?;
        let rest = self.buf.split_off(end + 1);
        let line = std::mem::replace(&mut self.buf, rest);
        Some(Self::decode(&line))
    }

    /// Remove and return everything buffered, complete line or not
    pub(crate) fn take_all(&mut self) -> String {
        let line = std::mem::take(&mut self.buf);
        Self::decode(&line)
    }

    fn decode(bytes: &[u8]) -> String {
        let text = String::from_utf8_lossy(bytes);
        text.trim_end_matches(['\r', '\n']).to_string()
    }
}

/// Serial channel backed by a real port
pub struct PortChannel {
    port_name: String,
    port: Option<Box<dyn SerialPort>>,
    settings: SerialSettings,
    pending: LineBuffer,
}

impl PortChannel {
    /// Open `port_name` at `baud_rate` with 8-N-1 framing and default timeouts
    pub fn open(port_name: &str, baud_rate: u32) -> Result<Self> {
        Self::open_with(port_name, &SerialSettings::default().with_baud_rate(baud_rate))
    }

    /// Open `port_name` with explicit settings
    pub fn open_with(port_name: &str, settings: &SerialSettings) -> Result<Self> {
        let open_failed = |source| DmmError::OpenFailed {
            port: port_name.to_string(),
            source,
        };

        let port = serialport::new(port_name, settings.baud_rate)
            .data_bits(DATA_BITS)
            .parity(PARITY)
            .stop_bits(STOP_BITS)
            .flow_control(FLOW_CONTROL)
            .timeout(settings.read_window())
            .open()
            .map_err(open_failed)?;

        debug!(
            "Opened {} at {} baud, read window {:?}",
            port_name,
            settings.baud_rate,
            settings.read_window()
        );

        Ok(Self::from_port(port_name, port, settings.clone()))
    }

    /// Wrap a port that has already been opened and configured
    pub fn from_port(port_name: &str, port: Box<dyn SerialPort>, settings: SerialSettings) -> Self {
        PortChannel {
            port_name: port_name.to_string(),
            port: Some(port),
            settings,
            pending: LineBuffer::default(),
        }
    }

    pub fn settings(&self) -> &SerialSettings {
        &self.settings
    }

    fn port_mut(&mut self) -> Result<&mut Box<dyn SerialPort>> {
        self.port.as_mut().ok_or(DmmError::ChannelClosed)
    }
}

impl SerialChannel for PortChannel {
    fn port_name(&self) -> &str {
        &self.port_name
    }

    fn is_open(&self) -> bool {
        self.port.is_some()
    }

    fn write_line(&mut self, text: &str) -> Result<usize> {
        let window = self.settings.write_timeout.window(text.len());
        let port = self.port_mut()?;
        let expected = text.len();

        debug!("Sending:  {:?}", text);

        port.set_timeout(window)
            .map_err(|e| DmmError::write_error(expected, e.into()))?;
        let written = match port.write(text.as_bytes()) {
            Ok(n) => n,
            Err(e) => return Err(DmmError::write_error(expected, e)),
        };
        port.flush().map_err(|e| DmmError::write_error(expected, e))?;

        if written != expected {
            return Err(DmmError::WriteFailed {
                written,
                expected,
                source: None,
            });
        }
        Ok(written)
    }

    fn read_line(&mut self) -> Result<String> {
        if self.port.is_none() {
            return Err(DmmError::ChannelClosed);
        }
        if let Some(line) = self.pending.take_line() {
            debug!("Received: {:?}", line);
            return Ok(line);
        }

        let max_len = self.settings.max_line_len;
        let interval = self.settings.read_interval;
        let deadline = Instant::now() + self.settings.read_window();
        let mut chunk = [0u8; 64];

        let line = loop {
            if let Some(line) = self.pending.take_line() {
                break line;
            }
            if self.pending.len() >= max_len {
                break self.pending.take_all();
            }
            let now = Instant::now();
            if now >= deadline {
                break self.pending.take_all();
            }

            let mut wait = deadline - now;
            if !self.pending.is_empty() {
                wait = wait.min(interval);
            }
            let room = chunk.len().min(max_len - self.pending.len());

            let port = self.port_mut()?;
            port.set_timeout(wait.max(Duration::from_millis(1)))
                .map_err(|e| DmmError::ReadFailed(e.into()))?;

            match port.read(&mut chunk[..room]) {
                Ok(0) => break self.pending.take_all(),
                Ok(n) => self.pending.push(&chunk[..n]),
                Err(e) if e.kind() == ErrorKind::TimedOut => {
                    if !self.pending.is_empty() {
                        break self.pending.take_all();
                    }
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => return Err(DmmError::ReadFailed(e)),
            }
        };

        debug!("Received: {:?}", line);
        Ok(line)
    }

    fn close(&mut self) {
        if let Some(port) = self.port.take() {
            debug!("Closing {}", self.port_name);
            drop(port);
        }
        self.pending = LineBuffer::default();
    }
}
