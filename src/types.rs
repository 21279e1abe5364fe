use crate::constants::*;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Timeout window made of a fixed part plus a per-byte part
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeoutPolicy {
    pub constant: Duration,
    pub per_byte: Duration,
}

impl TimeoutPolicy {
    pub const fn from_millis(constant_ms: u64, per_byte_ms: u64) -> Self {
        TimeoutPolicy {
            constant: Duration::from_millis(constant_ms),
            per_byte: Duration::from_millis(per_byte_ms),
        }
    }

    /// Total time allowed for a transfer of `bytes` bytes
    pub fn window(&self, bytes: usize) -> Duration {
        let bytes = u32::try_from(bytes).unwrap_or(u32::MAX);
        self.constant.saturating_add(self.per_byte.saturating_mul(bytes))
    }
}

/// Serial line settings. Framing is always 8-N-1 without flow control.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerialSettings {
    pub baud_rate: u32,
    pub read_timeout: TimeoutPolicy,
    pub write_timeout: TimeoutPolicy,
    /// Gap after which a reply that has already started is considered complete
    pub read_interval: Duration,
    pub max_line_len: usize,
}

impl Default for SerialSettings {
    fn default() -> Self {
        SerialSettings {
            baud_rate: BAUD_RATE,
            read_timeout: TimeoutPolicy::from_millis(READ_TIMEOUT_CONSTANT_MS, READ_TIMEOUT_PER_BYTE_MS),
            write_timeout: TimeoutPolicy::from_millis(WRITE_TIMEOUT_CONSTANT_MS, WRITE_TIMEOUT_PER_BYTE_MS),
            read_interval: Duration::from_millis(READ_INTERVAL_MS),
            max_line_len: MAX_LINE_LEN,
        }
    }
}

impl SerialSettings {
    pub fn with_baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = baud_rate;
        self
    }

    /// Longest time a single `read_line` may block
    pub fn read_window(&self) -> Duration {
        self.read_timeout.window(self.max_line_len)
    }
}

/// SCPI command strings sent to the instrument
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commands {
    pub local: String,
    pub remote: String,
    pub measure: String,
    pub terminator: String,
}

impl Default for Commands {
    fn default() -> Self {
        Commands {
            local: CMD_LOCAL.to_string(),
            remote: CMD_REMOTE.to_string(),
            measure: CMD_MEASURE_FRES.to_string(),
            terminator: LINE_TERMINATOR.to_string(),
        }
    }
}

/// Everything a sampling run needs to know up front
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SamplingConfig {
    pub port_name: String,
    pub serial: SerialSettings,
    pub sample_count: usize,
    pub mode_settle: Duration,
    pub read_settle: Duration,
    pub sample_pause: Duration,
    /// Take one unrecorded reading after switching to remote
    pub warm_up: bool,
    pub commands: Commands,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        SamplingConfig {
            port_name: DEFAULT_PORT.to_string(),
            serial: SerialSettings::default(),
            sample_count: SAMPLE_COUNT,
            mode_settle: Duration::from_millis(MODE_SETTLE_MS),
            read_settle: Duration::from_millis(READ_SETTLE_MS),
            sample_pause: Duration::from_millis(SAMPLE_PAUSE_MS),
            warm_up: true,
            commands: Commands::default(),
        }
    }
}

impl SamplingConfig {
    pub fn new(port_name: impl Into<String>) -> Self {
        SamplingConfig {
            port_name: port_name.into(),
            ..Default::default()
        }
    }

    pub fn with_sample_count(mut self, count: usize) -> Self {
        self.sample_count = count;
        self
    }

    pub fn with_serial(mut self, serial: SerialSettings) -> Self {
        self.serial = serial;
        self
    }

    /// Override the mode settle delay, read settle delay and inter-sample pause
    pub fn with_delays(mut self, mode_settle: Duration, read_settle: Duration, sample_pause: Duration) -> Self {
        self.mode_settle = mode_settle;
        self.read_settle = read_settle;
        self.sample_pause = sample_pause;
        self
    }

    pub fn with_warm_up(mut self, warm_up: bool) -> Self {
        self.warm_up = warm_up;
        self
    }
}

/// Classified outcome of one resistance query
#[derive(Debug, Clone, PartialEq)]
pub enum Reading {
    Value(f64),
    Empty,
    Unparsable(String),
    ReadFailed,
}

impl Reading {
    /// Measured ohms, or the 0.0 sentinel when nothing usable came back
    pub fn value(&self) -> f64 {
        match self {
            Reading::Value(v) => *v,
            _ => 0.0,
        }
    }

    pub fn is_value(&self) -> bool {
        matches!(self, Reading::Value(_))
    }
}

/// Kinds of recoverable trouble reported while talking to the instrument
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiagnosticKind {
    WriteFailed,
    ReadFailed,
    EmptyResponse,
    ConversionFailed,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DiagnosticKind::WriteFailed => "write failed",
            DiagnosticKind::ReadFailed => "read failed",
            DiagnosticKind::EmptyResponse => "no data received",
            DiagnosticKind::ConversionFailed => "conversion failed",
        };
        f.write_str(s)
    }
}

/// One reported failure condition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Index of the sample being taken, `None` outside a series
    pub sample: Option<usize>,
    pub kind: DiagnosticKind,
    pub detail: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.sample {
            Some(i) => write!(f, "sample {}: {}: {}", i + 1, self.kind, self.detail),
            None => write!(f, "{}: {}", self.kind, self.detail),
        }
    }
}

/// A single resistance reading with the time its round trip took
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Ohms, 0.0 when the reading failed
    pub resistance: f64,
    /// Seconds
    pub elapsed: f64,
}

/// Result of a sampling series
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SamplingRun {
    pub started_at: DateTime<Utc>,
    /// Resistance per sample in ohms
    pub data_r: Vec<f64>,
    /// Round trip time per sample in seconds
    pub elapsed: Vec<f64>,
    /// Running sum of `elapsed`
    pub cumulative: Vec<f64>,
    /// Sum of all per-sample durations in seconds
    pub total: f64,
    pub diagnostics: Vec<Diagnostic>,
}

impl SamplingRun {
    pub fn from_samples(started_at: DateTime<Utc>, samples: &[Sample], diagnostics: Vec<Diagnostic>) -> Self {
        let data_r: Vec<f64> = samples.iter().map(|s| s.resistance).collect();
        let elapsed: Vec<f64> = samples.iter().map(|s| s.elapsed).collect();
        let cumulative = cumulative_times(&elapsed);
        let total = elapsed.iter().sum();

        SamplingRun {
            started_at,
            data_r,
            elapsed,
            cumulative,
            total,
            diagnostics,
        }
    }

    pub fn len(&self) -> usize {
        self.data_r.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data_r.is_empty()
    }

    pub fn samples(&self) -> impl Iterator<Item = Sample> + '_ {
        self.data_r
            .iter()
            .zip(&self.elapsed)
            .map(|(&resistance, &elapsed)| Sample { resistance, elapsed })
    }

    /// Human-readable report: total time, every reading, every accumulated time
    pub fn report_lines(&self) -> Vec<String> {
        let mut lines = Vec::with_capacity(1 + 2 * self.len());
        lines.push(format!("Total time (tFor): {} seconds", self.total));
        for (i, r) in self.data_r.iter().enumerate() {
            lines.push(format!("Resistance reading {}: {} ohm", i + 1, r));
        }
        for (i, t) in self.cumulative.iter().enumerate() {
            lines.push(format!("Accumulated time at index {}: {} s", i + 1, t));
        }
        lines
    }

    /// Print the report to stdout
    pub fn print(&self) {
        for line in self.report_lines() {
            println!("{}", line);
        }
    }

    /// Number of diagnostics of the given kind
    pub fn count(&self, kind: DiagnosticKind) -> usize {
        self.diagnostics.iter().filter(|d| d.kind == kind).count()
    }
}

/// Accumulated time: `out[0] = elapsed[0]`, `out[i] = elapsed[i] + out[i - 1]`
pub fn cumulative_times(elapsed: &[f64]) -> Vec<f64> {
    elapsed
        .iter()
        .scan(0.0, |acc, &t| {
            *acc += t;
            Some(*acc)
        })
        .collect()
}
