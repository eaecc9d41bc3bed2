use super::support::scripts::PREAMBLE;
use super::{converse, IntegrationHarness, STRATEGIES};
use maternity_intake::{InboundMessage, QuestionId};

#[test]
fn cancel_command_destroys_session_mid_interview() {
    for strategy in STRATEGIES {
        let harness = IntegrationHarness::new();
        let mut service = harness.service(strategy);
        converse(&mut service, "u1", PREAMBLE);
        assert_eq!(service.active_sessions(), 1);

        let replies = converse(&mut service, "u1", &["/cancel"]);
        assert!(replies[0].text.starts_with("Conversa interrompida."));
        assert_eq!(service.active_sessions(), 0);

        // A new interview starts from consent with nothing carried over.
        let replies = converse(&mut service, "u1", &["/start"]);
        assert!(replies[0].text.starts_with("Olá!"));
        let session = service.store().get("u1").unwrap();
        assert!(session.answers().is_empty());
    }
}

#[test]
fn cancel_button_payload_is_honored() {
    let harness = IntegrationHarness::new();
    let mut service = harness.service(STRATEGIES[0]);
    converse(&mut service, "u1", &["/start", "SIM"]);
    service.handle(&InboundMessage::button("u1", "Cancelar", "cancel"));
    assert!(service.store().get("u1").is_none());
}

#[test]
fn restart_mid_interview_resumes_current_question() {
    let harness = IntegrationHarness::new();
    let mut service = harness.service(STRATEGIES[0]);
    converse(&mut service, "u1", &["/start", "SIM", "Maria Silva"]);
    let replies = converse(&mut service, "u1", &["/start"]);
    assert!(replies[0].text.contains("Informe sua data de nascimento"));
    let session = service.store().get("u1").unwrap();
    assert_eq!(session.current_question(), Some(QuestionId::BirthDate));
    assert!(session.answer(QuestionId::FullName).is_some());
}

#[test]
fn interleaved_users_keep_separate_sessions() {
    let harness = IntegrationHarness::new();
    let mut service = harness.service(STRATEGIES[1]);
    converse(&mut service, "a", &["/start", "SIM"]);
    converse(&mut service, "b", &["/start"]);
    converse(&mut service, "a", &["Ana Souza"]);
    converse(&mut service, "b", &["NÃO"]);

    assert_eq!(service.active_sessions(), 1);
    let a = service.store().get("a").unwrap();
    assert_eq!(a.current_question(), Some(QuestionId::BirthDate));
    assert!(service.store().get("b").is_none());
}
