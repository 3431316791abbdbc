//! Operation narration and fractional progress reporting.
//!
//! Every long-running operation accepts an [`EventSink`]: `log` receives a
//! human-readable line per step (the primary diagnostic surface — there is no
//! separate audit log), `progress` receives fractional completion. Sinks are
//! invoked synchronously from within the operation and must not block.

/// Receives step narration and coarse progress from a running operation.
pub trait EventSink {
    /// One human-readable line per step (scan, backup, replace, upload...).
    fn log(&mut self, line: &str);

    /// Fractional completion in `[0, 1]`, non-decreasing over one operation.
    fn progress(&mut self, fraction: f64) {
        let _ = fraction;
    }
}

/// Sink that discards narration and progress.
pub struct NullSink;

impl EventSink for NullSink {
    fn log(&mut self, _line: &str) {}
}

/// Clamps progress to `[0, 1]` and guarantees it never regresses, so sinks
/// can trust monotonicity no matter how callers interleave stages.
pub struct ProgressGate {
    last: f64,
}

impl ProgressGate {
    pub fn new() -> Self {
        Self { last: 0.0 }
    }

    pub fn report(&mut self, sink: &mut dyn EventSink, fraction: f64) {
        let clamped = fraction.clamp(0.0, 1.0);
        if clamped > self.last {
            self.last = clamped;
        }
        sink.progress(self.last);
    }
}

impl Default for ProgressGate {
    fn default() -> Self {
        Self::new()
    }
}

/// Format bytes as human-readable string
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= 1024.0 && unit_index < UNITS.len() - 1 {
        size /= 1024.0;
        unit_index += 1;
    }

    format!("{:.2} {}", size, UNITS[unit_index])
}

/// Test sink collecting every log line and progress value.
#[cfg(test)]
pub struct RecordingSink {
    pub lines: Vec<String>,
    pub fractions: Vec<f64>,
}

#[cfg(test)]
impl RecordingSink {
    pub fn new() -> Self {
        Self {
            lines: Vec::new(),
            fractions: Vec::new(),
        }
    }
}

#[cfg(test)]
impl EventSink for RecordingSink {
    fn log(&mut self, line: &str) {
        self.lines.push(line.to_string());
    }

    fn progress(&mut self, fraction: f64) {
        self.fractions.push(fraction);
    }
}
