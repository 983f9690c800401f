//! Output sinks for rendered frames.
//!
//! Frames go out once per tick and once per burst. Failures are reported to
//! the caller, which logs them; rendering never depends on sink health.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

use tracing::debug;

use crate::errors::{Result, VibeError};
use crate::types::Vibe;

/// Receives rendered VIBE frames.
///
/// Called with the engine's blender lock held, so implementations must not
/// call back into the engine.
pub trait VibeSink: Send + Sync {
    fn send(&self, vibe: &Vibe) -> Result<()>;
}

/// Device line protocol: `VIBE V A D Cx Co`, one decimal each
pub fn format_frame(vibe: &Vibe) -> String {
    let [v, a, d, cx, co] = vibe.values();
    format!("VIBE {v:.1} {a:.1} {d:.1} {cx:.1} {co:.1}")
}

/// Logs frames instead of sending them
#[derive(Debug, Clone, Copy, Default)]
pub struct DryRunSink;

impl VibeSink for DryRunSink {
    fn send(&self, vibe: &Vibe) -> Result<()> {
        debug!("DRY-RUN: {}", format_frame(vibe));
        Ok(())
    }
}

/// Writes frames as lines to a device, file or any writer
pub struct WriterSink {
    writer: Mutex<Box<dyn Write + Send>>,
}

impl WriterSink {
    pub fn new(writer: Box<dyn Write + Send>) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    /// Opens `path` for appending; character devices work as-is.
    pub fn open(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| VibeError::Sink(format!("Failed to open {}: {e}", path.display())))?;
        Ok(Self::new(Box::new(file)))
    }
}

impl VibeSink for WriterSink {
    fn send(&self, vibe: &Vibe) -> Result<()> {
        let message = format_frame(vibe);
        let mut writer = self.writer.lock()?;
        writeln!(writer, "{message}")
            .and_then(|()| writer.flush())
            .map_err(|e| VibeError::Sink(format!("Failed to send VIBE: {e}")))?;
        debug!("Sent: {}", message);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io;

    struct BrokenWriter;

    impl Write for BrokenWriter {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "unplugged"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_frame_format() {
        let v = Vibe::clamped([0.94, 0.05, 0.5, 0.333, 1.0]);
        assert_eq!(format_frame(&v), "VIBE 0.9 0.1 0.5 0.3 1.0");
    }

    #[test]
    fn test_writer_sink_appends_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("eyes.log");
        let sink = WriterSink::open(&path).unwrap();

        sink.send(&Vibe::NEUTRAL).unwrap();
        sink.send(&Vibe::RESTING).unwrap();

        let written = fs::read_to_string(&path).unwrap();
        assert_eq!(written, "VIBE 0.5 0.5 0.5 0.5 0.5\nVIBE 0.5 0.5 0.5 0.5 0.8\n");
    }

    #[test]
    fn test_writer_failure_is_sink_error() {
        let sink = WriterSink::new(Box::new(BrokenWriter));
        assert!(matches!(sink.send(&Vibe::NEUTRAL), Err(VibeError::Sink(_))));
    }

    #[test]
    fn test_dry_run_never_fails() {
        assert!(DryRunSink.send(&Vibe::NEUTRAL).is_ok());
    }
}
