//! Conversational intake: question catalog, session state and the transition
//! function that drives one interview per user.

pub mod machine;
pub mod questions;
mod replies;
pub mod session;
pub mod validate;

pub use machine::{IntakeMachine, IntakeRules, RetryReason, Step, StepOutcome};
pub use questions::{AnswerDomain, Next, Question, QuestionCatalog, QuestionId};
pub use session::{CanonicalAnswer, IntakeState, Session, SessionStore};
pub use validate::{NameRules, ValidationError, DATE_FORMAT};

use serde::{Deserialize, Serialize};

pub const START_COMMAND: &str = "/start";
pub const CANCEL_COMMAND: &str = "/cancel";
pub const CANCEL_PAYLOAD: &str = "cancel";

/// One message as received from the chat transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundMessage {
    pub user_id: String,
    pub text: String,
    /// Structured button payload, when the transport supports one.
    #[serde(default)]
    pub payload: Option<String>,
}

impl InboundMessage {
    pub fn text(user_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            text: text.into(),
            payload: None,
        }
    }

    /// A button press: `label` is what the transport displays, `payload` what it sends.
    pub fn button(
        user_id: impl Into<String>,
        label: impl Into<String>,
        payload: impl Into<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            text: label.into(),
            payload: Some(payload.into()),
        }
    }

    fn command(&self) -> Option<&str> {
        let first = self.text.split_whitespace().next()?;
        first.starts_with('/').then_some(first)
    }

    pub fn is_cancel(&self) -> bool {
        self.payload.as_deref() == Some(CANCEL_PAYLOAD)
            || self
                .command()
                .is_some_and(|cmd| cmd.eq_ignore_ascii_case(CANCEL_COMMAND))
    }

    pub fn is_start(&self) -> bool {
        self.command()
            .is_some_and(|cmd| cmd.eq_ignore_ascii_case(START_COMMAND))
    }
}

/// Reply text plus quick-reply buttons. `suggestions` is empty when free text is expected.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundPrompt {
    pub text: String,
    #[serde(default)]
    pub suggestions: Vec<String>,
}

impl OutboundPrompt {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            suggestions: Vec::new(),
        }
    }

    pub fn with_suggestions(mut self, suggestions: Vec<String>) -> Self {
        self.suggestions = suggestions;
        self
    }

    /// Appends a paragraph to the reply text.
    pub fn append(&mut self, paragraph: &str) {
        if !self.text.is_empty() {
            self.text.push_str("\n\n");
        }
        self.text.push_str(paragraph);
    }
}
