use super::{IntakeRecord, RecordSink};
use anyhow::{Context, Result};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// One JSON object per line, appended.
pub struct JsonlRecordSink {
    path: PathBuf,
}

impl JsonlRecordSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load_all(&self) -> Result<Vec<IntakeRecord>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let data = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read records {:?}", self.path))?;
        data.lines()
            .filter(|l| !l.trim().is_empty())
            .map(|line| serde_json::from_str::<IntakeRecord>(line).map_err(anyhow::Error::from))
            .collect()
    }
}

impl RecordSink for JsonlRecordSink {
    fn append(&self, record: &IntakeRecord) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("Failed to open records {:?}", self.path))?;
        file.write_all(serde_json::to_string(record)?.as_bytes())?;
        file.write_all(b"\n")?;
        Ok(())
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}
