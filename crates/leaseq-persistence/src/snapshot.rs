use crate::{PersistenceError, Result};
use leaseq_core::TaskRecord;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Snapshot file name inside the checkpoint directory
pub const SNAPSHOT_FILENAME: &str = "snapshot.jsonl";

/// One queue per snapshot line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueRecord {
    pub name: String,
    pub tasks_list: Vec<TaskRecord>,
    pub size_list: usize,
}

/// Line-oriented JSON snapshot of the full registry.
///
/// Each line is a self-contained `QueueRecord`. Writes go through a temp
/// file and an atomic rename so a crash mid-write never clobbers the
/// previous snapshot.
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    pub fn new(checkpoint_dir: &Path) -> Self {
        SnapshotStore {
            path: checkpoint_dir.join(SNAPSHOT_FILENAME),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write all queue records durably, replacing any previous snapshot.
    pub fn write(&self, records: &[QueueRecord]) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)?;
        }

        let tmp_path = self.path.with_extension("jsonl.tmp");
        let file = File::create(&tmp_path)?;
        let mut writer = BufWriter::new(file);

        for record in records {
            serde_json::to_writer(&mut writer, record)?;
            writer.write_all(b"\n")?;
        }

        writer.flush()?;
        writer.into_inner().map_err(|e| e.into_error())?.sync_all()?;
        fs::rename(&tmp_path, &self.path)?;

        info!(path = %self.path.display(), queues = records.len(), "wrote snapshot");
        Ok(())
    }

    /// Read all queue records, or `None` when no snapshot exists yet.
    pub fn read(&self) -> Result<Option<Vec<QueueRecord>>> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no snapshot file");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        let reader = BufReader::new(file);
        let mut records = Vec::new();

        for (idx, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let record = serde_json::from_str(&line)
                .map_err(|source| PersistenceError::CorruptLine {
                    line: idx + 1,
                    source,
                })?;
            records.push(record);
        }

        info!(path = %self.path.display(), queues = records.len(), "read snapshot");
        Ok(Some(records))
    }
}
