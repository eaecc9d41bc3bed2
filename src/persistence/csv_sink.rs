use super::{IntakeRecord, RecordSink};
use crate::intake::QuestionId;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Questions exported as canonical/raw column pairs. Name and dates have dedicated columns.
const ANSWER_COLUMNS: [QuestionId; 6] = [
    QuestionId::Consent,
    QuestionId::Symptoms,
    QuestionId::SymptomOnset,
    QuestionId::LocalSigns,
    QuestionId::FollowUpVisit,
    QuestionId::CareDoubts,
];

/// One row per interview; the header is written when the file is new or empty.
pub struct CsvRecordSink {
    path: PathBuf,
}

impl CsvRecordSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn header() -> Vec<String> {
        let mut columns: Vec<String> = [
            "recorded_at",
            "session_id",
            "user_id",
            "started_at",
            "full_name",
            "birth_date",
            "delivery_date",
        ]
        .iter()
        .map(|c| c.to_string())
        .collect();
        for id in ANSWER_COLUMNS {
            columns.push(id.as_str().to_string());
            columns.push(format!("{}_raw", id.as_str()));
        }
        columns.extend(
            ["risk_level", "findings", "recommendation", "synonyms_version", "normalizer"]
                .iter()
                .map(|c| c.to_string()),
        );
        columns
    }

    fn row(record: &IntakeRecord) -> Vec<String> {
        let date = |d: Option<chrono::NaiveDate>| {
            d.map(|d| d.format("%Y-%m-%d").to_string()).unwrap_or_default()
        };
        let mut row = vec![
            record.recorded_at.to_rfc3339(),
            record.session_id.to_string(),
            record.user_id.clone(),
            record.started_at.to_rfc3339(),
            record.full_name.clone().unwrap_or_default(),
            date(record.birth_date),
            date(record.delivery_date),
        ];
        for id in ANSWER_COLUMNS {
            row.push(record.answers.get(&id).map(|a| a.render()).unwrap_or_default());
            row.push(record.raw_answers.get(&id).cloned().unwrap_or_default());
        }
        row.push(record.risk_level.as_str().to_string());
        row.push(record.findings.to_string());
        row.push(record.recommendation.clone());
        row.push(record.synonyms_version.clone());
        row.push(record.normalizer.clone());
        row
    }
}

impl RecordSink for CsvRecordSink {
    fn append(&self, record: &IntakeRecord) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let needs_header = fs::metadata(&self.path).map(|m| m.len() == 0).unwrap_or(true);
        let file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("Failed to open records {:?}", self.path))?;
        let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(file);
        if needs_header {
            writer.write_record(Self::header())?;
        }
        writer.write_record(Self::row(record))?;
        writer.flush()?;
        Ok(())
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}
