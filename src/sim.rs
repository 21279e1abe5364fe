//! In-memory serial channel that replays scripted replies.
//!
//! Used to exercise the sampling loop without an instrument attached.

use crate::channel::SerialChannel;
use crate::error::{DmmError, Result};
use std::collections::VecDeque;
use std::io;

#[derive(Debug, Clone, PartialEq)]
enum ScriptedReply {
    Line(String),
    Error(io::ErrorKind),
}

/// Fault injected into the next `write_line`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteFault {
    /// Transport call errors
    Error(io::ErrorKind),
    /// Only this many bytes are accepted
    Short(usize),
}

/// Scripted channel. Replies are consumed in order by `read_line`; once the
/// script runs dry every read returns an empty line, like a silent device.
#[derive(Debug)]
pub struct ScriptedChannel {
    port_name: String,
    open: bool,
    replies: VecDeque<ScriptedReply>,
    write_faults: VecDeque<WriteFault>,
    written: Vec<String>,
    releases: usize,
}

impl ScriptedChannel {
    pub fn new(port_name: &str) -> Self {
        ScriptedChannel {
            port_name: port_name.to_string(),
            open: true,
            replies: VecDeque::new(),
            write_faults: VecDeque::new(),
            written: Vec::new(),
            releases: 0,
        }
    }

    /// Channel that answers with each of `replies` in turn
    pub fn with_replies<I, S>(port_name: &str, replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut channel = Self::new(port_name);
        for reply in replies {
            channel.push_reply(reply);
        }
        channel
    }

    pub fn push_reply(&mut self, reply: impl Into<String>) -> &mut Self {
        self.replies.push_back(ScriptedReply::Line(reply.into()));
        self
    }

    /// Make a future read fail with a transport error
    pub fn push_read_error(&mut self, kind: io::ErrorKind) -> &mut Self {
        self.replies.push_back(ScriptedReply::Error(kind));
        self
    }

    /// Queue a fault; each write consumes at most one
    pub fn push_write_fault(&mut self, fault: WriteFault) -> &mut Self {
        self.write_faults.push_back(fault);
        self
    }

    /// Every line written so far, terminators included
    pub fn written(&self) -> &[String] {
        &self.written
    }

    pub fn remaining_replies(&self) -> usize {
        self.replies.len()
    }

    /// How many times the channel actually released its device
    pub fn releases(&self) -> usize {
        self.releases
    }
}

impl SerialChannel for ScriptedChannel {
    fn port_name(&self) -> &str {
        &self.port_name
    }

    fn is_open(&self) -> bool {
        self.open
    }

    fn write_line(&mut self, text: &str) -> Result<usize> {
        if !self.open {
            return Err(DmmError::ChannelClosed);
        }
        let expected = text.len();

        match self.write_faults.pop_front() {
            Some(WriteFault::Error(kind)) => Err(DmmError::write_error(
                expected,
                io::Error::new(kind, "scripted write error"),
            )),
            Some(WriteFault::Short(written)) => {
                let written = written.min(expected);
                self.written
                    .push(String::from_utf8_lossy(&text.as_bytes()[..written]).into_owned());
                Err(DmmError::WriteFailed {
                    written,
                    expected,
                    source: None,
                })
            }
            None => {
                self.written.push(text.to_string());
                Ok(expected)
            }
        }
    }

    fn read_line(&mut self) -> Result<String> {
        if !self.open {
            return Err(DmmError::ChannelClosed);
        }
        match self.replies.pop_front() {
            Some(ScriptedReply::Line(line)) => Ok(line),
            Some(ScriptedReply::Error(kind)) => Err(DmmError::ReadFailed(io::Error::new(
                kind,
                "scripted read error",
            ))),
            None => Ok(String::new()),
        }
    }

    fn close(&mut self) {
        if self.open {
            self.open = false;
            self.releases += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replays_script_then_goes_silent() {
        let mut channel = ScriptedChannel::with_replies("sim", ["1.0", "2.0"]);
        assert_eq!(channel.read_line().unwrap(), "1.0");
        assert_eq!(channel.read_line().unwrap(), "2.0");
        assert_eq!(channel.read_line().unwrap(), "");
        assert_eq!(channel.remaining_replies(), 0);
    }

    #[test]
    fn records_writes() {
        let mut channel = ScriptedChannel::new("sim");
        assert_eq!(channel.write_line("SYSTem:REMote\n").unwrap(), 14);
        assert_eq!(channel.written(), ["SYSTem:REMote\n"]);
    }

    #[test]
    fn short_write_is_write_failed() {
        let mut channel = ScriptedChannel::new("sim");
        channel.push_write_fault(WriteFault::Short(4));
        let err = channel.write_line("SYSTem:LOCal\n").unwrap_err();
        assert!(matches!(err, DmmError::WriteFailed { written: 4, expected: 13, source: None }));
        assert_eq!(channel.written(), ["SYST"]);
        assert!(channel.write_line("SYSTem:LOCal\n").is_ok());
    }

    #[test]
    fn read_error_is_read_failed() {
        let mut channel = ScriptedChannel::new("sim");
        channel.push_read_error(io::ErrorKind::BrokenPipe).push_reply("5");
        assert!(matches!(channel.read_line(), Err(DmmError::ReadFailed(_))));
        assert_eq!(channel.read_line().unwrap(), "5");
    }

    #[test]
    fn close_is_idempotent_and_blocks_io() {
        let mut channel = ScriptedChannel::with_replies("sim", ["1.0"]);
        channel.close();
        channel.close();
        assert_eq!(channel.releases(), 1);
        assert!(!channel.is_open());
        assert!(matches!(channel.read_line(), Err(DmmError::ChannelClosed)));
        assert!(matches!(channel.write_line("x\n"), Err(DmmError::ChannelClosed)));
    }
}
