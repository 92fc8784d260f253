// src/sink/file.rs

//! File-backed log sink.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::warn;

use super::{LogSink, stamp};
use crate::errors::Result;

/// Appends lines to a log file, flushing after every write.
///
/// Flushing per line costs throughput but means a timed-out or killed child
/// still leaves a complete log on disk up to its last emitted line.
pub struct FileSink {
    description: String,
    path: PathBuf,
    timestamps: bool,
    writer: Mutex<BufWriter<File>>,
}

impl FileSink {
    /// Create (truncating) the log file at `path`.
    pub fn create(description: impl Into<String>, path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&path)?;
        Ok(Self {
            description: description.into(),
            path,
            timestamps: false,
            writer: Mutex::new(BufWriter::new(file)),
        })
    }

    /// Prefix each line with a local-time timestamp.
    pub fn with_timestamps(mut self, enabled: bool) -> Self {
        self.timestamps = enabled;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LogSink for FileSink {
    fn write_line(&self, line: &str) {
        let line = stamp(self.timestamps, line);
        let mut writer = self.writer.lock().expect("sink lock poisoned");
        if let Err(e) = writeln!(writer, "{line}").and_then(|_| writer.flush()) {
            warn!(
                sink = %self.description,
                path = %self.path.display(),
                error = %e,
                "failed to write log line"
            );
        }
    }

    fn flush(&self) {
        let mut writer = self.writer.lock().expect("sink lock poisoned");
        if let Err(e) = writer.flush() {
            warn!(
                sink = %self.description,
                path = %self.path.display(),
                error = %e,
                "failed to flush log file"
            );
        }
    }

    fn description(&self) -> &str {
        &self.description
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lines_reach_disk_without_explicit_flush() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run.log");

        let sink = FileSink::create("stdout", &path).unwrap();
        assert_eq!(sink.path(), path);
        sink.write_line("first");
        sink.write_line("second");

        // write_line flushes eagerly, so the file is already complete.
        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "first\nsecond\n");
    }
}
