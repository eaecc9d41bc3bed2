//! Hand-off of completed interviews to append-only record files.
//!
//! Persistence is best-effort: a failed append is reported to the caller, who
//! logs it and still delivers the triage reply.

mod csv_sink;
mod jsonl;

pub use csv_sink::CsvRecordSink;
pub use jsonl::JsonlRecordSink;

use crate::config::{PersistenceSettings, RecordFormat};
use crate::intake::{CanonicalAnswer, IntakeState, QuestionId, Session};
use crate::triage::RiskLevel;
use anyhow::{bail, Result};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use uuid::Uuid;

/// Flattened, self-describing copy of one completed interview.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntakeRecord {
    pub recorded_at: DateTime<Utc>,
    pub session_id: Uuid,
    pub user_id: String,
    pub started_at: DateTime<Utc>,
    pub full_name: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub delivery_date: Option<NaiveDate>,
    pub answers: BTreeMap<QuestionId, CanonicalAnswer>,
    pub raw_answers: BTreeMap<QuestionId, String>,
    pub recommendation: String,
    pub risk_level: RiskLevel,
    pub findings: usize,
    /// Synonym table version the answers were normalized with.
    pub synonyms_version: String,
    /// Normalizer strategy in effect.
    pub normalizer: String,
}

impl IntakeRecord {
    pub fn from_session(
        session: &Session,
        recorded_at: DateTime<Utc>,
        synonyms_version: &str,
        normalizer: &str,
    ) -> Result<Self> {
        if session.state() != IntakeState::Complete {
            bail!("Session {} is not complete", session.session_id());
        }
        let Some(triage) = session.triage() else {
            bail!("Session {} has no triage result", session.session_id());
        };
        Ok(Self {
            recorded_at,
            session_id: session.session_id(),
            user_id: session.user_id().to_string(),
            started_at: session.started_at(),
            full_name: session
                .answer(QuestionId::FullName)
                .and_then(CanonicalAnswer::as_text)
                .map(str::to_string),
            birth_date: session
                .answer(QuestionId::BirthDate)
                .and_then(CanonicalAnswer::as_date),
            delivery_date: session
                .answer(QuestionId::DeliveryDate)
                .and_then(CanonicalAnswer::as_date),
            answers: session.answers().clone(),
            raw_answers: session.raw_answers().clone(),
            recommendation: triage.recommendation.clone(),
            risk_level: triage.risk_level,
            findings: triage.findings,
            synonyms_version: synonyms_version.to_string(),
            normalizer: normalizer.to_string(),
        })
    }
}

/// Destination for completed intake records.
pub trait RecordSink: Send + Sync {
    fn append(&self, record: &IntakeRecord) -> Result<()>;

    /// Human-readable location, for logs.
    fn location(&self) -> String;
}

pub fn build_sink(settings: &PersistenceSettings, workspace_root: &Path) -> Box<dyn RecordSink> {
    let path = settings.records_path(workspace_root);
    match settings.format {
        RecordFormat::Jsonl => Box::new(JsonlRecordSink::new(path)),
        RecordFormat::Csv => Box::new(CsvRecordSink::new(path)),
    }
}
