#![warn(missing_docs)]
//! Test surfaces for the layout engine: event recording, JSONL sinks and
//! golden snapshots of resolved trees.

mod event_log;
mod snapshot;

use anyhow::{Context, Result};
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

pub use event_log::*;
pub use snapshot::*;

/// One notification captured from a layout node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventRecord {
    /// Position in the capture order, starting at 0.
    pub seq: u64,
    /// Event name (e.g. `local_size_changed`).
    pub kind: String,
    /// Display name of the node that emitted it.
    pub node: String,
    /// Human-readable payload.
    pub payload: String,
}

/// A sink that writes newline-delimited JSON to disk.
pub struct JsonlSink {
    writer: BufWriter<File>,
}

impl JsonlSink {
    /// Create a new sink at `path`, creating parent directories if needed.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
        }
        let file = File::create(path)
            .with_context(|| format!("Failed to create event log {}", path.display()))?;
        Ok(Self {
            writer: BufWriter::new(file),
        })
    }

    /// Append one record.
    pub fn write<T: Serialize>(&mut self, record: &T) -> Result<()> {
        serde_json::to_writer(&mut self.writer, record)?;
        self.writer.write_all(b"\n")?;
        Ok(())
    }

    /// Append every record in order and flush.
    pub fn write_all<'a, I>(&mut self, records: I) -> Result<()>
    where
        I: IntoIterator<Item = &'a EventRecord>,
    {
        for record in records {
            self.write(record)?;
        }
        self.flush()
    }

    /// Flush buffered lines to disk.
    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    #[test]
    fn jsonl_sink_writes_one_line_per_record() {
        let path = std::env::temp_dir().join(format!(
            "anchorkit-events-{}.jsonl",
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        ));
        let records = vec![
            EventRecord {
                seq: 0,
                kind: "local_size_changed".into(),
                node: "root".into(),
                payload: "[0,0,0] -> [1,1,1]".into(),
            },
            EventRecord {
                seq: 1,
                kind: "disposed".into(),
                node: "root".into(),
                payload: String::new(),
            },
        ];
        let mut sink = JsonlSink::create(&path).expect("sink create");
        sink.write_all(&records).expect("write succeeds");
        let contents = fs::read_to_string(&path).expect("file readable");
        assert_eq!(contents.lines().count(), 2);
        assert!(contents.contains("local_size_changed"));
        let _ = fs::remove_file(&path);
    }
}
