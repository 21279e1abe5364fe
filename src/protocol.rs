use crate::channel::{PortChannel, SerialChannel};
use crate::error::{DmmError, Result};
use crate::types::*;
use chrono::Utc;
use log::{debug, info, warn};
use std::thread;
use std::time::Instant;

/// Main multimeter interface
pub struct Multimeter<C: SerialChannel> {
    channel: C,
    config: SamplingConfig,
    diagnostics: Vec<Diagnostic>,
    current_sample: Option<usize>,
    last_reply: Option<String>,
}

impl Multimeter<PortChannel> {
    /// Open the port named in `config`
    pub fn open(config: SamplingConfig) -> Result<Self> {
        let channel = PortChannel::open_with(&config.port_name, &config.serial)?;
        Ok(Self::with_channel(channel, config))
    }
}

impl<C: SerialChannel> Multimeter<C> {
    /// Drive an instrument through an already open channel
    pub fn with_channel(channel: C, config: SamplingConfig) -> Self {
        Multimeter {
            channel,
            config,
            diagnostics: Vec::new(),
            current_sample: None,
            last_reply: None,
        }
    }

    pub fn config(&self) -> &SamplingConfig {
        &self.config
    }

    pub fn channel(&self) -> &C {
        &self.channel
    }

    pub fn channel_mut(&mut self) -> &mut C {
        &mut self.channel
    }

    /// Give the channel back, e.g. to inspect a test double
    pub fn into_channel(self) -> C {
        self.channel
    }

    /// Trimmed text of the most recent reply, `None` if the last read failed
    pub fn last_reply(&self) -> Option<&str> {
        self.last_reply.as_deref()
    }

    /// Diagnostics reported outside a sampling series
    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }

    fn report(&mut self, kind: DiagnosticKind, detail: String) {
        let diagnostic = Diagnostic {
            sample: self.current_sample,
            kind,
            detail,
        };
        warn!("{}", diagnostic);
        self.diagnostics.push(diagnostic);
    }

    /// Send one command with the configured terminator. Failures are reported, not returned.
    fn send_command(&mut self, command: &str) -> bool {
        let line = format!("{}{}", command, self.config.commands.terminator);
        match self.channel.write_line(&line) {
            Ok(_) => true,
            Err(e) => {
                self.report(DiagnosticKind::WriteFailed, format!("{}: {}", command, e));
                false
            }
        }
    }

    /// Switch between remote (bus) and local (front panel) control, then wait for the
    /// instrument to apply it
    pub fn set_remote_mode(&mut self, remote: bool) {
        let command = if remote {
            self.config.commands.remote.clone()
        } else {
            self.config.commands.local.clone()
        };
        self.send_command(&command);
        thread::sleep(self.config.mode_settle);
    }

    /// Send the resistance query and classify the reply
    pub fn query_resistance(&mut self) -> Reading {
        let command = self.config.commands.measure.clone();
        self.send_command(&command);

        let reading = match self.channel.read_line() {
            Ok(reply) => {
                let raw = reply.trim();
                info!("Multimeter data: {}", raw);
                self.last_reply = Some(raw.to_string());
                match parse_reading(raw) {
                    Reading::Empty => {
                        self.report(DiagnosticKind::EmptyResponse, "No data received".to_string());
                        Reading::Empty
                    }
                    Reading::Unparsable(text) => {
                        let detail = DmmError::ConversionFailed { text: text.clone() }.to_string();
                        self.report(DiagnosticKind::ConversionFailed, detail);
                        Reading::Unparsable(text)
                    }
                    reading => reading,
                }
            }
            Err(e) => {
                self.last_reply = None;
                self.report(DiagnosticKind::ReadFailed, e.to_string());
                Reading::ReadFailed
            }
        };

        thread::sleep(self.config.read_settle);
        reading
    }

    /// Read one four-wire resistance value in ohms, 0.0 when it could not be obtained
    pub fn read_resistance(&mut self) -> f64 {
        self.query_resistance().value()
    }

    /// Take `count` timed readings back to back
    pub fn run_sampling_series(&mut self, count: usize) -> SamplingRun {
        let started_at = Utc::now();
        let earlier = std::mem::take(&mut self.diagnostics);
        let mut samples = Vec::with_capacity(count);

        for i in 0..count {
            self.current_sample = Some(i);
            let start = Instant::now();

            let resistance = self.read_resistance();
            thread::sleep(self.config.sample_pause);

            let elapsed = start.elapsed().as_secs_f64();
            debug!("Sample {}: {} ohm in {:.4} s", i + 1, resistance, elapsed);
            samples.push(Sample { resistance, elapsed });
        }
        self.current_sample = None;

        let diagnostics = std::mem::replace(&mut self.diagnostics, earlier);
        let run = SamplingRun::from_samples(started_at, &samples, diagnostics);
        info!(
            "Total time (tFor): {} seconds, {} diagnostics",
            run.total,
            run.diagnostics.len()
        );
        run
    }

    /// Full session: local, remote, warm-up reading, the configured series, back to local
    pub fn acquire(&mut self) -> SamplingRun {
        info!("Acquiring {} samples on {}", self.config.sample_count, self.channel.port_name());

        self.set_remote_mode(false);
        self.set_remote_mode(true);

        if self.config.warm_up {
            let warm_up = self.read_resistance();
            info!("Warm-up reading: {} ohm", warm_up);
        }

        let mut run = self.run_sampling_series(self.config.sample_count);

        let local = self.config.commands.local.clone();
        self.send_command(&local);

        let mut outside = self.take_diagnostics();
        outside.append(&mut run.diagnostics);
        run.diagnostics = outside;
        run
    }

    /// Release the serial port. Safe to call more than once.
    pub fn close(&mut self) {
        self.channel.close();
    }
}

/// Classify a raw reply. Surrounding whitespace is ignored and only finite
/// decimal numbers count as values.
pub fn parse_reading(reply: &str) -> Reading {
    let text = reply.trim();
    if text.is_empty() {
        return Reading::Empty;
    }
    match text.parse::<f64>() {
        Ok(v) if v.is_finite() => Reading::Value(v),
        _ => Reading::Unparsable(text.to_string()),
    }
}
