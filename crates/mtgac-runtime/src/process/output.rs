//! Daemon stdout/stderr routing.
//!
//! The daemon can emit non-UTF8 bytes. `BufReader::lines()` would end the
//! reader task on the first invalid sequence, so lines are read as bytes and
//! decoded lossily.

use std::process::Stdio;
use std::sync::Arc;

use mtgac_core::config::DaemonOutput;
use mtgac_core::ports::DaemonLogSink;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::{Child, Command};
use tracing::debug;

/// Configure stdio of `cmd` for the requested output routing.
pub(super) fn configure_stdio(cmd: &mut Command, output: &DaemonOutput) {
    cmd.stdin(Stdio::null());
    match output {
        DaemonOutput::Discard => {
            cmd.stdout(Stdio::null()).stderr(Stdio::null());
        }
        DaemonOutput::Inherit => {
            cmd.stdout(Stdio::inherit()).stderr(Stdio::inherit());
        }
        DaemonOutput::Tracing | DaemonOutput::Sink(_) => {
            cmd.stdout(Stdio::piped()).stderr(Stdio::piped());
        }
    }
}

/// Start reader tasks for any piped streams of a freshly spawned child.
pub(super) fn attach_readers(child: &mut Child, pid: u32, output: &DaemonOutput) {
    let sink = match output {
        DaemonOutput::Sink(sink) => Some(Arc::clone(sink)),
        _ => None,
    };
    if let Some(stdout) = child.stdout.take() {
        spawn_stream_reader(stdout, pid, "stdout", sink.clone());
    }
    if let Some(stderr) = child.stderr.take() {
        spawn_stream_reader(stderr, pid, "stderr", sink);
    }
}

fn spawn_stream_reader(
    stream: impl AsyncRead + Unpin + Send + 'static,
    pid: u32,
    stream_type: &'static str,
    sink: Option<Arc<dyn DaemonLogSink>>,
) {
    tokio::spawn(async move {
        let mut reader = BufReader::new(stream);
        let mut buf: Vec<u8> = Vec::with_capacity(1024);

        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf).await {
                Ok(0) => break, // EOF
                Ok(_) => {
                    let line = decode_line(&buf);
                    debug!(target: "mtgac::daemon", pid = %pid, %stream_type, "{line}");
                    if let Some(ref s) = sink {
                        s.append(stream_type, line);
                    }
                }
                Err(e) => {
                    debug!(pid = %pid, %stream_type, error = %e, "daemon output reader exiting due to read error");
                    break;
                }
            }
        }
    });
}

/// Strip the line terminator and decode lossily.
fn decode_line(buf: &[u8]) -> String {
    let mut end = buf.len();
    if end > 0 && buf[end - 1] == b'\n' {
        end -= 1;
        if end > 0 && buf[end - 1] == b'\r' {
            end -= 1;
        }
    }
    String::from_utf8_lossy(&buf[..end]).into_owned()
}
