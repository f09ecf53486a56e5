//! Daemon log sink port.
//!
//! Destination for the daemon's stdout/stderr lines when the host wants
//! them captured (e.g. shown in a UI) instead of only logged.

/// Port for appending daemon output lines to a sink.
///
/// Implementations should be thread-safe and non-blocking where possible.
pub trait DaemonLogSink: Send + Sync {
    /// Append one line of daemon output.
    ///
    /// * `stream_type` - Either "stdout" or "stderr"
    /// * `line` - The line content (without trailing newline)
    fn append(&self, stream_type: &str, line: String);
}

/// Sink that drops every line.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopLogSink;

impl DaemonLogSink for NoopLogSink {
    fn append(&self, _stream_type: &str, _line: String) {}
}
