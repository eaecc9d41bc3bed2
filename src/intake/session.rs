//! Per-user interview state and the keyed store that owns it.

use super::questions::QuestionId;
use crate::normalize::{CodeSet, NO_FINDINGS_CODE};
use crate::triage::TriageResult;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use uuid::Uuid;

/// Normalized answer to one question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum CanonicalAnswer {
    Codes(CodeSet),
    /// Validated free-form field such as the patient's name.
    Text(String),
    Date(NaiveDate),
    /// Kept verbatim when normalization gave up.
    Raw(String),
}

impl CanonicalAnswer {
    pub fn has_code(&self, code: &str) -> bool {
        matches!(self, CanonicalAnswer::Codes(codes) if codes.contains(code))
    }

    pub fn is_no_findings(&self) -> bool {
        matches!(self, CanonicalAnswer::Codes(codes) if codes.len() == 1 && codes.contains(NO_FINDINGS_CODE))
    }

    pub fn is_empty(&self) -> bool {
        match self {
            CanonicalAnswer::Codes(codes) => codes.is_empty(),
            CanonicalAnswer::Text(value) | CanonicalAnswer::Raw(value) => value.trim().is_empty(),
            CanonicalAnswer::Date(_) => false,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            CanonicalAnswer::Date(date) => Some(*date),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            CanonicalAnswer::Text(value) => Some(value),
            _ => None,
        }
    }

    /// Findings this answer contributes to triage. A raw fallback counts as one.
    pub fn positive_findings(&self) -> usize {
        match self {
            CanonicalAnswer::Codes(codes) => codes.positive_count(),
            CanonicalAnswer::Raw(_) => 1,
            CanonicalAnswer::Text(_) | CanonicalAnswer::Date(_) => 0,
        }
    }

    /// Flat rendering for tabular exports: `fever;chills`, `1990-01-01`, `raw:...`.
    pub fn render(&self) -> String {
        match self {
            CanonicalAnswer::Codes(codes) => codes.iter().collect::<Vec<_>>().join(";"),
            CanonicalAnswer::Text(value) => value.clone(),
            CanonicalAnswer::Date(date) => date.format("%Y-%m-%d").to_string(),
            CanonicalAnswer::Raw(value) => format!("raw:{value}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum IntakeState {
    Asking {
        question: QuestionId,
        /// Consecutive answers to `question` the normalizer could not classify.
        failed_attempts: u8,
    },
    Complete,
    Declined,
    Cancelled,
}

impl IntakeState {
    pub fn asking(question: QuestionId) -> Self {
        IntakeState::Asking {
            question,
            failed_attempts: 0,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, IntakeState::Asking { .. })
    }
}

#[derive(Debug, Clone)]
pub struct Session {
    session_id: Uuid,
    user_id: String,
    started_at: DateTime<Utc>,
    last_activity: DateTime<Utc>,
    state: IntakeState,
    answers: BTreeMap<QuestionId, CanonicalAnswer>,
    raw_answers: BTreeMap<QuestionId, String>,
    triage: Option<TriageResult>,
}

impl Session {
    pub fn new(user_id: impl Into<String>, first: QuestionId, now: DateTime<Utc>) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            user_id: user_id.into(),
            started_at: now,
            last_activity: now,
            state: IntakeState::asking(first),
            answers: BTreeMap::new(),
            raw_answers: BTreeMap::new(),
            triage: None,
        }
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn last_activity(&self) -> DateTime<Utc> {
        self.last_activity
    }

    pub fn state(&self) -> IntakeState {
        self.state
    }

    pub fn current_question(&self) -> Option<QuestionId> {
        match self.state {
            IntakeState::Asking { question, .. } => Some(question),
            _ => None,
        }
    }

    pub fn failed_attempts(&self) -> u8 {
        match self.state {
            IntakeState::Asking {
                failed_attempts, ..
            } => failed_attempts,
            _ => 0,
        }
    }

    pub fn answers(&self) -> &BTreeMap<QuestionId, CanonicalAnswer> {
        &self.answers
    }

    pub fn answer(&self, id: QuestionId) -> Option<&CanonicalAnswer> {
        self.answers.get(&id)
    }

    pub fn raw_answers(&self) -> &BTreeMap<QuestionId, String> {
        &self.raw_answers
    }

    pub fn triage(&self) -> Option<&TriageResult> {
        self.triage.as_ref()
    }

    pub(crate) fn touch(&mut self, now: DateTime<Utc>) {
        self.last_activity = now;
    }

    /// Stores an accepted answer. Empty answers are refused and leave the session unchanged.
    pub(crate) fn record_answer(&mut self, id: QuestionId, answer: CanonicalAnswer, raw: String) -> bool {
        if answer.is_empty() {
            return false;
        }
        self.answers.insert(id, answer);
        self.raw_answers.insert(id, raw);
        true
    }

    pub(crate) fn record_failure(&mut self) {
        if let IntakeState::Asking {
            failed_attempts, ..
        } = &mut self.state
        {
            *failed_attempts = failed_attempts.saturating_add(1);
        }
    }

    pub(crate) fn ask(&mut self, question: QuestionId) {
        self.state = IntakeState::asking(question);
    }

    /// Moves to COMPLETE with its one and only triage result.
    pub(crate) fn complete(&mut self, result: TriageResult) {
        if self.triage.is_none() {
            self.triage = Some(result);
        }
        self.state = IntakeState::Complete;
    }

    pub(crate) fn close(&mut self, state: IntakeState) {
        self.state = state;
    }
}

/// Sessions keyed by transport user id. At most one live session per user.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: HashMap<String, Session>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, user_id: &str) -> Option<&Session> {
        self.sessions.get(user_id)
    }

    pub(crate) fn get_mut(&mut self, user_id: &str) -> Option<&mut Session> {
        self.sessions.get_mut(user_id)
    }

    pub fn contains(&self, user_id: &str) -> bool {
        self.sessions.contains_key(user_id)
    }

    pub(crate) fn insert(&mut self, session: Session) {
        self.sessions.insert(session.user_id.clone(), session);
    }

    pub(crate) fn remove(&mut self, user_id: &str) -> Option<Session> {
        self.sessions.remove(user_id)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Drops sessions idle for longer than `max_idle`, returning them.
    pub fn expire_idle(&mut self, now: DateTime<Utc>, max_idle: Duration) -> Vec<Session> {
        let stale: Vec<String> = self
            .sessions
            .values()
            .filter(|session| now - session.last_activity > max_idle)
            .map(|session| session.user_id.clone())
            .collect();
        stale
            .into_iter()
            .filter_map(|user_id| self.sessions.remove(&user_id))
            .collect()
    }
}
