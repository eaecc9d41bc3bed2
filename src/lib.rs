pub mod chat;
pub mod config;
pub mod intake;
pub mod logging;
pub mod normalize;
pub mod persistence;
pub mod triage;

// Re-export commonly used types for convenience.
pub use chat::{ChatService, Clock, SystemClock};
pub use config::AppConfig;
pub use intake::{InboundMessage, IntakeMachine, OutboundPrompt, QuestionId, Session, SessionStore};
pub use normalize::{Normalizer, SynonymTable};
pub use persistence::{IntakeRecord, RecordSink};
pub use triage::{RiskLevel, TriageResult};
