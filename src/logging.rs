use serde::Serialize;
use std::collections::VecDeque;
use std::fmt;
use thiserror::Error;

/// Severity levels honoured by the decision log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Returns the canonical uppercase representation.
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Trace => "TRACE",
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Size-based rotation policy (default 8 MiB segments, 8 retained).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogRotationPolicy {
    pub max_bytes: usize,
    pub max_segments: usize,
}

impl Default for LogRotationPolicy {
    fn default() -> Self {
        Self {
            max_bytes: 8 << 20,
            max_segments: 8,
        }
    }
}

/// Accumulated log lines for one rotated segment.
#[derive(Debug, Default, Clone)]
pub struct LogSegment {
    lines: Vec<String>,
    bytes_written: usize,
}

impl LogSegment {
    /// Lines contained within the segment.
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Total bytes recorded before rotation.
    pub fn bytes_written(&self) -> usize {
        self.bytes_written
    }
}

/// JSON-line decision logger with deterministic rotation semantics.
///
/// Records capture which rule decided what about an event, so an operator can
/// reconstruct why an action did or did not run without replaying the event
/// stream.
#[derive(Debug, Clone)]
pub struct DecisionLogger {
    policy: LogRotationPolicy,
    current_level: LogLevel,
    segments: VecDeque<LogSegment>,
    active: LogSegment,
}

impl Default for DecisionLogger {
    fn default() -> Self {
        Self::new(LogRotationPolicy::default())
    }
}

impl DecisionLogger {
    /// Creates a logger anchored to the provided rotation policy.
    pub fn new(policy: LogRotationPolicy) -> Self {
        Self {
            policy,
            current_level: LogLevel::Info,
            segments: VecDeque::new(),
            active: LogSegment::default(),
        }
    }

    /// Returns the current log level.
    pub fn level(&self) -> LogLevel {
        self.current_level
    }

    /// Applies a dynamic log-level override.
    pub fn set_level(&mut self, level: LogLevel) {
        self.current_level = level;
    }

    /// Emits a JSON-line record for a rule-scoped occurrence.
    pub fn log(
        &mut self,
        ts_ms: u64,
        level: LogLevel,
        component: &str,
        rule: &str,
        message: &str,
    ) -> Result<(), LoggingError> {
        if level < self.current_level {
            return Ok(());
        }
        let record = DecisionRecord {
            ts_ms,
            level: level.as_str(),
            component,
            rule,
            message,
        };
        let line = serde_json::to_string(&record).map_err(LoggingError::Serialize)?;
        self.rotate_if_needed(line.len());
        self.active.bytes_written = self.active.bytes_written.saturating_add(line.len());
        self.active.lines.push(line);
        Ok(())
    }

    /// Returns rotated history followed by the active segment.
    pub fn segments(&self) -> impl Iterator<Item = &LogSegment> {
        self.segments.iter().chain(std::iter::once(&self.active))
    }

    /// Flattens every retained line in emission order.
    pub fn lines(&self) -> Vec<String> {
        self.segments()
            .flat_map(|segment| segment.lines().iter().cloned())
            .collect()
    }

    fn rotate_if_needed(&mut self, next_line_len: usize) {
        if self.active.bytes_written + next_line_len <= self.policy.max_bytes {
            return;
        }
        if !self.active.lines.is_empty() {
            self.segments.push_back(std::mem::take(&mut self.active));
            while self.segments.len() > self.policy.max_segments {
                self.segments.pop_front();
            }
        }
        self.active = LogSegment::default();
    }
}

/// Errors surfaced while serializing decision records.
#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("failed to serialize decision record: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Debug, Serialize)]
struct DecisionRecord<'a> {
    ts_ms: u64,
    level: &'a str,
    component: &'a str,
    rule: &'a str,
    message: &'a str,
}
