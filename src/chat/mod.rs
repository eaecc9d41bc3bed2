//! Transport-facing facade: one inbound message in, one reply out.
//!
//! `ChatService` owns the session store and wires the intake machine to the
//! record sink. A completed session is persisted before it is dropped; a sink
//! failure only adds a notice to the final reply.

use crate::config::{self, AppConfig};
use crate::intake::{
    InboundMessage, IntakeMachine, IntakeRules, OutboundPrompt, QuestionCatalog, SessionStore,
    Step,
};
use crate::logging::user_ref;
use crate::normalize::{build_normalizer, load_synonyms};
use crate::persistence::{build_sink, IntakeRecord, RecordSink};
use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use std::path::Path;
use tracing::{info, warn};

pub const PERSISTENCE_DISCLAIMER: &str = "Obs.: não foi possível registrar suas respostas neste \
     momento, mas a orientação acima continua válida.";

/// Source of "now" for session timestamps and date validation.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

pub struct ChatService {
    machine: IntakeMachine,
    store: SessionStore,
    sink: Box<dyn RecordSink>,
    clock: Box<dyn Clock>,
    idle_timeout: Option<Duration>,
}

impl ChatService {
    pub fn new(machine: IntakeMachine, sink: Box<dyn RecordSink>) -> Self {
        Self {
            machine,
            store: SessionStore::new(),
            sink,
            clock: Box::new(SystemClock),
            idle_timeout: None,
        }
    }

    pub fn with_clock(mut self, clock: Box<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_idle_timeout(mut self, idle_timeout: Option<Duration>) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }

    /// Builds the service from the workspace configuration.
    pub fn from_config(cfg: &AppConfig, workspace_root: &Path) -> Result<Self> {
        let synonyms = load_synonyms(&cfg.normalizer, workspace_root)?;
        let catalog = QuestionCatalog::new(synonyms).context("Synonym table does not cover the question set")?;
        let normalizer = build_normalizer(&cfg.normalizer, workspace_root)?;
        let rules = IntakeRules {
            min_name_tokens: cfg.intake.min_name_tokens,
            clarification_attempts: cfg.intake.clarification_attempts,
        };
        let sink = build_sink(&cfg.persistence, workspace_root);
        info!(records = %sink.location(), "Intake records sink ready");
        let idle_timeout = cfg
            .intake
            .session_idle_minutes
            .map(|minutes| Duration::minutes(i64::from(minutes)));
        Ok(Self::new(IntakeMachine::new(catalog, normalizer, rules), sink)
            .with_idle_timeout(idle_timeout))
    }

    /// Loads the configuration from the default workspace and builds the service.
    pub fn from_workspace() -> Result<Self> {
        let root = config::workspace_root()?;
        let cfg = config::load_or_default()?;
        Self::from_config(&cfg, &root)
    }

    pub fn machine(&self) -> &IntakeMachine {
        &self.machine
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn active_sessions(&self) -> usize {
        self.store.len()
    }

    pub fn handle(&mut self, message: &InboundMessage) -> OutboundPrompt {
        self.handle_step(message).0
    }

    /// Like [`handle`](Self::handle), also reporting whether the record was persisted.
    pub fn handle_step(&mut self, message: &InboundMessage) -> (OutboundPrompt, Option<bool>) {
        let now = self.clock.now();
        self.expire_idle(now);
        let step: Step = self.machine.handle(&mut self.store, message, now);
        let (mut reply, completed) = step.into_completed();
        let Some(session) = completed else {
            return (reply, None);
        };

        let persisted = IntakeRecord::from_session(
            &session,
            now,
            self.machine.catalog().synonyms().version(),
            self.machine.normalizer().strategy(),
        )
        .and_then(|record| self.sink.append(&record));
        match persisted {
            Ok(()) => {
                info!(
                    user = %user_ref(session.user_id()),
                    session_id = %session.session_id(),
                    "Intake record persisted"
                );
                (reply, Some(true))
            }
            Err(err) => {
                warn!(
                    user = %user_ref(session.user_id()),
                    session_id = %session.session_id(),
                    sink = %self.sink.location(),
                    error = %err,
                    "Failed to persist intake record"
                );
                reply.append(PERSISTENCE_DISCLAIMER);
                (reply, Some(false))
            }
        }
    }

    fn expire_idle(&mut self, now: DateTime<Utc>) {
        let Some(max_idle) = self.idle_timeout else {
            return;
        };
        for session in self.store.expire_idle(now, max_idle) {
            info!(
                user = %user_ref(session.user_id()),
                session_id = %session.session_id(),
                at = session.current_question().map(|q| q.as_str()),
                "Idle intake session expired"
            );
        }
    }
}
