//! The transition function: one inbound message against one session.
//!
//! The machine owns only read-only data (question catalog, normalizer, rules)
//! and takes the session store explicitly, so a single `IntakeMachine` serves
//! every user of the process. Terminal transitions remove the session from the
//! store; a completed session is handed back to the caller by value.

use super::questions::{AnswerDomain, Next, QuestionCatalog, QuestionId};
use super::replies;
use super::session::{CanonicalAnswer, IntakeState, Session, SessionStore};
use super::validate::{self, NameRules, ValidationError};
use super::{InboundMessage, OutboundPrompt};
use crate::logging::user_ref;
use crate::normalize::{NormalizeOutcome, Normalizer};
use crate::triage;
use chrono::{DateTime, Local, NaiveDate, Utc};
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntakeRules {
    pub min_name_tokens: usize,
    /// Clarifying re-prompts before an unrecognized choice answer is kept as raw text.
    pub clarification_attempts: u8,
}

impl Default for IntakeRules {
    fn default() -> Self {
        Self {
            min_name_tokens: 2,
            clarification_attempts: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryReason {
    NotYesNo,
    Invalid(ValidationError),
    Unrecognized,
    Ambiguous,
    Empty,
}

#[derive(Debug)]
pub enum StepOutcome {
    Started {
        question: QuestionId,
    },
    /// `/start` while an interview was already running.
    Resumed {
        question: QuestionId,
    },
    Advanced {
        answered: QuestionId,
        next: QuestionId,
        /// The answer was stored as raw text after clarification failed.
        degraded: bool,
    },
    Retry {
        question: QuestionId,
        reason: RetryReason,
    },
    Declined,
    Cancelled,
    NothingToCancel,
    Completed(Box<Session>),
}

#[derive(Debug)]
pub struct Step {
    pub reply: OutboundPrompt,
    pub outcome: StepOutcome,
}

impl Step {
    fn new(reply: OutboundPrompt, outcome: StepOutcome) -> Self {
        Self { reply, outcome }
    }

    /// Takes the completed session out of the step, if there is one.
    pub fn into_completed(self) -> (OutboundPrompt, Option<Session>) {
        match self.outcome {
            StepOutcome::Completed(session) => (self.reply, Some(*session)),
            _ => (self.reply, None),
        }
    }
}

enum Interpretation {
    Accepted {
        answer: CanonicalAnswer,
        degraded: bool,
    },
    Rejected(RetryReason),
}

enum Transition {
    Ask(Step),
    Finish(Next),
}

pub struct IntakeMachine {
    catalog: QuestionCatalog,
    normalizer: Box<dyn Normalizer>,
    rules: IntakeRules,
}

impl IntakeMachine {
    pub fn new(catalog: QuestionCatalog, normalizer: Box<dyn Normalizer>, rules: IntakeRules) -> Self {
        Self {
            catalog,
            normalizer,
            rules,
        }
    }

    pub fn catalog(&self) -> &QuestionCatalog {
        &self.catalog
    }

    pub fn normalizer(&self) -> &dyn Normalizer {
        self.normalizer.as_ref()
    }

    /// Prompt for the question the session is waiting on.
    pub fn current_prompt(&self, session: &Session) -> Option<OutboundPrompt> {
        session
            .current_question()
            .map(|question| self.catalog.prompt(question))
    }

    /// Opens a session for `user_id`, or re-issues the pending prompt if one is open.
    pub fn start(&self, store: &mut SessionStore, user_id: &str, now: DateTime<Utc>) -> Step {
        if let Some(session) = store.get_mut(user_id) {
            if let (Some(question), Some(prompt)) =
                (session.current_question(), self.current_prompt(session))
            {
                session.touch(now);
                let mut reply = OutboundPrompt::new(replies::RESUMED);
                reply.append(&prompt.text);
                reply.suggestions = prompt.suggestions;
                debug!(user = %user_ref(user_id), question = question.as_str(), "Session resumed");
                return Step::new(reply, StepOutcome::Resumed { question });
            }
        }

        let first = self.catalog.first();
        let session = Session::new(user_id, first, now);
        info!(
            user = %user_ref(user_id),
            session_id = %session.session_id(),
            "Intake session started"
        );
        store.insert(session);
        Step::new(self.catalog.prompt(first), StepOutcome::Started { question: first })
    }

    pub fn cancel(&self, store: &mut SessionStore, user_id: &str) -> Step {
        match store.remove(user_id) {
            Some(mut session) => {
                let at = session.current_question().map(QuestionId::as_str);
                session.close(IntakeState::Cancelled);
                info!(
                    user = %user_ref(user_id),
                    session_id = %session.session_id(),
                    at,
                    "Intake session cancelled"
                );
                Step::new(OutboundPrompt::new(replies::CANCELLED), StepOutcome::Cancelled)
            }
            None => Step::new(
                OutboundPrompt::new(replies::NOTHING_TO_CANCEL),
                StepOutcome::NothingToCancel,
            ),
        }
    }

    /// Applies one inbound message. Cancellation is checked before anything else.
    pub fn handle(&self, store: &mut SessionStore, message: &InboundMessage, now: DateTime<Utc>) -> Step {
        let user_id = message.user_id.as_str();
        if message.is_cancel() {
            return self.cancel(store, user_id);
        }
        if message.is_start() || !store.contains(user_id) {
            return self.start(store, user_id, now);
        }

        let today = now.with_timezone(&Local).date_naive();
        let transition = match store.get_mut(user_id) {
            Some(session) => self.answer(session, message, now, today),
            None => return self.start(store, user_id, now),
        };

        let next = match transition {
            Transition::Ask(step) => return step,
            Transition::Finish(next) => next,
        };
        let Some(mut session) = store.remove(user_id) else {
            return self.start(store, user_id, now);
        };
        match next {
            Next::Decline => {
                session.close(IntakeState::Declined);
                info!(
                    user = %user_ref(user_id),
                    session_id = %session.session_id(),
                    "Consent declined; session closed"
                );
                Step::new(OutboundPrompt::new(replies::DECLINED), StepOutcome::Declined)
            }
            Next::Complete | Next::Ask(_) => {
                let result = triage::evaluate(session.answers());
                info!(
                    user = %user_ref(user_id),
                    session_id = %session.session_id(),
                    risk = result.risk_level.as_str(),
                    findings = result.findings,
                    "Intake complete"
                );
                let reply = OutboundPrompt::new(replies::completed(&result.recommendation));
                session.complete(result);
                Step::new(reply, StepOutcome::Completed(Box::new(session)))
            }
        }
    }

    fn answer(
        &self,
        session: &mut Session,
        message: &InboundMessage,
        now: DateTime<Utc>,
        today: NaiveDate,
    ) -> Transition {
        session.touch(now);
        let Some(question_id) = session.current_question() else {
            return Transition::Finish(Next::Complete);
        };
        let question = self.catalog.question(question_id);

        let (answer, degraded) = match self.interpret(session, message, today) {
            Interpretation::Accepted { answer, degraded } => (answer, degraded),
            Interpretation::Rejected(reason) => {
                if matches!(reason, RetryReason::Unrecognized | RetryReason::Ambiguous) {
                    session.record_failure();
                }
                debug!(
                    user = %user_ref(session.user_id()),
                    question = question_id.as_str(),
                    attempts = session.failed_attempts(),
                    reason = ?reason,
                    "Answer rejected; re-prompting"
                );
                let reply = self.retry_prompt(question_id, &reason);
                return Transition::Ask(Step::new(
                    reply,
                    StepOutcome::Retry {
                        question: question_id,
                        reason,
                    },
                ));
            }
        };

        if degraded {
            info!(
                user = %user_ref(session.user_id()),
                question = question_id.as_str(),
                "Answer not recognized after clarification; stored as raw text"
            );
        }

        let next = question.successor.next(&answer);
        if !session.record_answer(question_id, answer, raw_text(message)) {
            let reason = RetryReason::Empty;
            return Transition::Ask(Step::new(
                self.retry_prompt(question_id, &reason),
                StepOutcome::Retry {
                    question: question_id,
                    reason,
                },
            ));
        }
        match next {
            Next::Ask(next_id) => {
                session.ask(next_id);
                debug!(
                    user = %user_ref(session.user_id()),
                    answered = question_id.as_str(),
                    next = next_id.as_str(),
                    "Answer accepted"
                );
                Transition::Ask(Step::new(
                    self.catalog.prompt(next_id),
                    StepOutcome::Advanced {
                        answered: question_id,
                        next: next_id,
                        degraded,
                    },
                ))
            }
            terminal => Transition::Finish(terminal),
        }
    }

    fn interpret(&self, session: &Session, message: &InboundMessage, today: NaiveDate) -> Interpretation {
        let question_id = match session.current_question() {
            Some(id) => id,
            None => return Interpretation::Rejected(RetryReason::Empty),
        };
        let text = message.text.trim();
        let payload = message.payload.as_deref();
        let accepted = |answer| Interpretation::Accepted {
            answer,
            degraded: false,
        };

        match self.catalog.question(question_id).domain {
            AnswerDomain::Consent { .. } => {
                let Some(vocabulary) = self.catalog.vocabulary_for(question_id) else {
                    return Interpretation::Rejected(RetryReason::NotYesNo);
                };
                if text.is_empty() && payload.is_none() {
                    return Interpretation::Rejected(RetryReason::Empty);
                }
                match self.normalizer.normalize(vocabulary, text, payload) {
                    NormalizeOutcome::Matched(codes)
                        if codes.len() == 1 && (codes.contains("yes") || codes.contains("no")) =>
                    {
                        accepted(CanonicalAnswer::Codes(codes))
                    }
                    _ => Interpretation::Rejected(RetryReason::NotYesNo),
                }
            }
            AnswerDomain::Choice { .. } => {
                let Some(vocabulary) = self.catalog.vocabulary_for(question_id) else {
                    return Interpretation::Rejected(RetryReason::Unrecognized);
                };
                if text.is_empty() && payload.is_none() {
                    return Interpretation::Rejected(RetryReason::Empty);
                }
                let reason = match self.normalizer.normalize(vocabulary, text, payload) {
                    NormalizeOutcome::Matched(codes) => return accepted(CanonicalAnswer::Codes(codes)),
                    NormalizeOutcome::Ambiguous(_) => RetryReason::Ambiguous,
                    NormalizeOutcome::NoMatch => RetryReason::Unrecognized,
                };
                if session.failed_attempts() >= self.rules.clarification_attempts && !text.is_empty() {
                    Interpretation::Accepted {
                        answer: CanonicalAnswer::Raw(text.to_string()),
                        degraded: true,
                    }
                } else {
                    Interpretation::Rejected(reason)
                }
            }
            AnswerDomain::Name => {
                let rules = NameRules {
                    min_tokens: self.rules.min_name_tokens,
                };
                match validate::validate_name(text, rules) {
                    Ok(name) => accepted(CanonicalAnswer::Text(name)),
                    Err(err) => Interpretation::Rejected(RetryReason::Invalid(err)),
                }
            }
            AnswerDomain::Date { not_before } => {
                let earliest = not_before
                    .and_then(|id| session.answer(id))
                    .and_then(CanonicalAnswer::as_date);
                match validate::validate_date_after(text, today, earliest) {
                    Ok(date) => accepted(CanonicalAnswer::Date(date)),
                    Err(err) => Interpretation::Rejected(RetryReason::Invalid(err)),
                }
            }
        }
    }

    fn retry_prompt(&self, question_id: QuestionId, reason: &RetryReason) -> OutboundPrompt {
        let question = self.catalog.question(question_id);
        let prompt = self.catalog.prompt(question_id);
        let lead = match reason {
            RetryReason::NotYesNo => replies::NOT_YES_NO.to_string(),
            RetryReason::Invalid(err) => err.hint(),
            RetryReason::Empty => replies::EMPTY_ANSWER.to_string(),
            RetryReason::Unrecognized | RetryReason::Ambiguous => {
                match self.catalog.vocabulary_for(question_id) {
                    Some(vocabulary) => {
                        let clarified =
                            replies::clarify(vocabulary, matches!(reason, RetryReason::Ambiguous));
                        let mut reply = OutboundPrompt::new(clarified);
                        reply.append(question.prompt);
                        return reply.with_suggestions(prompt.suggestions);
                    }
                    None => replies::EMPTY_ANSWER.to_string(),
                }
            }
        };
        let mut reply = OutboundPrompt::new(lead);
        reply.append(&prompt.text);
        reply.with_suggestions(prompt.suggestions)
    }
}

/// Audit copy of what the patient sent: the text, or the payload for a bare button press.
fn raw_text(message: &InboundMessage) -> String {
    let text = message.text.trim();
    match (text.is_empty(), message.payload.as_deref()) {
        (true, Some(payload)) => payload.to_string(),
        _ => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::{KeywordNormalizer, SynonymTable};
    use crate::triage::RiskLevel;

    fn machine() -> IntakeMachine {
        let catalog = QuestionCatalog::new(SynonymTable::embedded().unwrap()).unwrap();
        IntakeMachine::new(catalog, Box::new(KeywordNormalizer::new()), IntakeRules::default())
    }

    fn now() -> DateTime<Utc> {
        Utc::now()
    }

    fn send(machine: &IntakeMachine, store: &mut SessionStore, text: &str) -> Step {
        machine.handle(store, &InboundMessage::text("u1", text), now())
    }

    fn through_dates(machine: &IntakeMachine, store: &mut SessionStore) {
        send(machine, store, "/start");
        send(machine, store, "sim");
        send(machine, store, "Maria Silva");
        send(machine, store, "01/01/1990");
        send(machine, store, "01/01/2024");
    }

    #[test]
    fn first_message_starts_without_being_an_answer() {
        let machine = machine();
        let mut store = SessionStore::new();
        let step = send(&machine, &mut store, "sim");
        assert!(matches!(
            step.outcome,
            StepOutcome::Started {
                question: QuestionId::Consent
            }
        ));
        assert_eq!(step.reply.suggestions, vec!["SIM".to_string(), "NÃO".to_string()]);
        let session = store.get("u1").unwrap();
        assert!(session.answers().is_empty());
    }

    #[test]
    fn start_during_interview_keeps_progress() {
        let machine = machine();
        let mut store = SessionStore::new();
        send(&machine, &mut store, "/start");
        send(&machine, &mut store, "sim");
        let step = send(&machine, &mut store, "/start");
        assert!(matches!(
            step.outcome,
            StepOutcome::Resumed {
                question: QuestionId::FullName
            }
        ));
        assert!(store.get("u1").unwrap().answer(QuestionId::Consent).is_some());
    }

    #[test]
    fn consent_accepts_only_yes_or_no() {
        let machine = machine();
        let mut store = SessionStore::new();
        send(&machine, &mut store, "/start");
        for attempt in ["talvez", "sim e nao", ""] {
            let step = send(&machine, &mut store, attempt);
            assert!(matches!(step.outcome, StepOutcome::Retry { question: QuestionId::Consent, .. }));
        }
        assert!(store.get("u1").unwrap().answers().is_empty());
        let step = send(&machine, &mut store, "Sim, aceito");
        assert!(matches!(step.outcome, StepOutcome::Advanced { next: QuestionId::FullName, .. }));
    }

    #[test]
    fn consent_no_declines_and_destroys_session() {
        let machine = machine();
        let mut store = SessionStore::new();
        send(&machine, &mut store, "/start");
        let step = send(&machine, &mut store, "não");
        assert!(matches!(step.outcome, StepOutcome::Declined));
        assert_eq!(step.reply.text, replies::DECLINED);
        assert!(store.is_empty());
    }

    #[test]
    fn invalid_dates_never_advance() {
        let machine = machine();
        let mut store = SessionStore::new();
        send(&machine, &mut store, "/start");
        send(&machine, &mut store, "sim");
        send(&machine, &mut store, "Maria Silva");
        for bad in ["31/13/2024", "1990-01-01", "01/01/2999"] {
            let step = send(&machine, &mut store, bad);
            assert!(matches!(
                step.outcome,
                StepOutcome::Retry {
                    question: QuestionId::BirthDate,
                    reason: RetryReason::Invalid(_)
                }
            ));
        }
        assert_eq!(store.get("u1").unwrap().current_question(), Some(QuestionId::BirthDate));
        assert!(store.get("u1").unwrap().answer(QuestionId::BirthDate).is_none());
    }

    #[test]
    fn delivery_before_birth_is_rejected() {
        let machine = machine();
        let mut store = SessionStore::new();
        send(&machine, &mut store, "/start");
        send(&machine, &mut store, "sim");
        send(&machine, &mut store, "Maria Silva");
        send(&machine, &mut store, "01/01/1990");
        let step = send(&machine, &mut store, "01/01/1985");
        assert!(matches!(
            step.outcome,
            StepOutcome::Retry {
                reason: RetryReason::Invalid(ValidationError::DeliveryBeforeBirth { .. }),
                ..
            }
        ));
    }

    #[test]
    fn short_name_is_reprompted_with_hint() {
        let machine = machine();
        let mut store = SessionStore::new();
        send(&machine, &mut store, "/start");
        send(&machine, &mut store, "sim");
        let step = send(&machine, &mut store, "Maria");
        assert!(step.reply.text.starts_with("Por favor, informe seu nome completo"));
        assert_eq!(store.get("u1").unwrap().current_question(), Some(QuestionId::FullName));
    }

    #[test]
    fn unrecognized_choice_is_clarified_once_then_stored_raw() {
        let machine = machine();
        let mut store = SessionStore::new();
        through_dates(&machine, &mut store);

        let step = send(&machine, &mut store, "uma coceira estranha");
        assert!(matches!(
            step.outcome,
            StepOutcome::Retry {
                question: QuestionId::Symptoms,
                reason: RetryReason::Unrecognized
            }
        ));
        assert!(step.reply.text.contains("1 - Febre"));

        let step = send(&machine, &mut store, "coceira forte");
        assert!(matches!(
            step.outcome,
            StepOutcome::Advanced {
                answered: QuestionId::Symptoms,
                next: QuestionId::SymptomOnset,
                degraded: true
            }
        ));
        let session = store.get("u1").unwrap();
        assert_eq!(
            session.answer(QuestionId::Symptoms),
            Some(&CanonicalAnswer::Raw("coceira forte".into()))
        );
    }

    #[test]
    fn empty_choice_answer_is_never_stored() {
        let machine = machine();
        let mut store = SessionStore::new();
        through_dates(&machine, &mut store);
        for _ in 0..3 {
            let step = send(&machine, &mut store, "   ");
            assert!(matches!(step.outcome, StepOutcome::Retry { reason: RetryReason::Empty, .. }));
        }
        assert!(store.get("u1").unwrap().answer(QuestionId::Symptoms).is_none());
    }

    #[test]
    fn empty_message_does_not_use_clarification_budget() {
        let machine = machine();
        let mut store = SessionStore::new();
        through_dates(&machine, &mut store);
        send(&machine, &mut store, "   ");
        let step = send(&machine, &mut store, "coceira");
        assert!(matches!(
            step.outcome,
            StepOutcome::Retry {
                question: QuestionId::Symptoms,
                reason: RetryReason::Unrecognized
            }
        ));
        assert!(step.reply.text.contains("1 - Febre"));
    }

    #[test]
    fn negated_consent_declines() {
        for refusal in ["não quero", "não aceito", "nao pode ser agora", "Não, obrigada"] {
            let machine = machine();
            let mut store = SessionStore::new();
            send(&machine, &mut store, "/start");
            let step = send(&machine, &mut store, refusal);
            assert!(matches!(step.outcome, StepOutcome::Declined), "{refusal}");
            assert!(store.is_empty());
        }
    }

    #[test]
    fn no_symptoms_skips_onset_question() {
        let machine = machine();
        let mut store = SessionStore::new();
        through_dates(&machine, &mut store);
        let step = send(&machine, &mut store, "Nenhum");
        assert!(matches!(
            step.outcome,
            StepOutcome::Advanced {
                next: QuestionId::LocalSigns,
                ..
            }
        ));
    }

    #[test]
    fn button_payload_is_recorded_as_raw_when_text_is_empty() {
        let machine = machine();
        let mut store = SessionStore::new();
        through_dates(&machine, &mut store);
        let message = InboundMessage::button("u1", "", "fever,chills");
        machine.handle(&mut store, &message, now());
        let session = store.get("u1").unwrap();
        assert_eq!(session.raw_answers().get(&QuestionId::Symptoms).map(String::as_str), Some("fever,chills"));
        assert!(session.answer(QuestionId::Symptoms).unwrap().has_code("chills"));
    }

    #[test]
    fn completion_moves_session_out_of_store() {
        let machine = machine();
        let mut store = SessionStore::new();
        through_dates(&machine, &mut store);
        send(&machine, &mut store, "1 e 2");
        send(&machine, &mut store, "ontem");
        send(&machine, &mut store, "nada");
        send(&machine, &mut store, "não");
        let step = send(&machine, &mut store, "não");
        assert!(store.is_empty());
        assert!(step.reply.text.starts_with("Pronto! Terminamos."));
        let (_, session) = step.into_completed();
        let session = session.unwrap();
        assert_eq!(session.state(), IntakeState::Complete);
        assert_eq!(session.triage().unwrap().risk_level, RiskLevel::High);
        assert_eq!(
            session.answer(QuestionId::SymptomOnset),
            Some(&CanonicalAnswer::Codes(crate::normalize::CodeSet::single("one_to_three_days")))
        );
    }

    #[test]
    fn cancel_wins_from_any_state() {
        let machine = machine();
        let mut store = SessionStore::new();
        through_dates(&machine, &mut store);
        let step = send(&machine, &mut store, "/cancel");
        assert!(matches!(step.outcome, StepOutcome::Cancelled));
        assert!(store.is_empty());
        let step = send(&machine, &mut store, "/cancel");
        assert!(matches!(step.outcome, StepOutcome::NothingToCancel));
        assert!(store.is_empty());
    }
}
