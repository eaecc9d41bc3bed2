use super::support::scripts::{DECLINES, FEVER_AND_CHILLS, NOTHING_TO_REPORT, PREAMBLE};
use super::{converse, IntegrationHarness, STRATEGIES};
use maternity_intake::intake::CanonicalAnswer;
use maternity_intake::normalize::CodeSet;
use maternity_intake::persistence::JsonlRecordSink;
use maternity_intake::triage::{ROUTINE_RECOMMENDATION, URGENT_RECOMMENDATION};
use maternity_intake::{QuestionId, RiskLevel};

fn records(harness: &IntegrationHarness) -> Vec<maternity_intake::IntakeRecord> {
    JsonlRecordSink::new(harness.workspace_path().join("records/intakes.jsonl"))
        .load_all()
        .expect("records readable")
}

#[test]
fn fever_and_chills_is_urgent() {
    for strategy in STRATEGIES {
        let harness = IntegrationHarness::new();
        let mut service = harness.service(strategy);
        let replies = converse(&mut service, "patient-1", FEVER_AND_CHILLS);

        let last = replies.last().unwrap();
        assert!(last.text.contains(URGENT_RECOMMENDATION), "{strategy:?}");
        assert_eq!(service.active_sessions(), 0);

        let saved = records(&harness);
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].risk_level, RiskLevel::High);
        assert_eq!(saved[0].findings, 2);
        let fever_chills: CodeSet = ["fever", "chills"].into_iter().map(String::from).collect();
        assert_eq!(
            saved[0].answers.get(&QuestionId::Symptoms),
            Some(&CanonicalAnswer::Codes(fever_chills))
        );
    }
}

#[test]
fn numeric_none_answers_are_routine() {
    for strategy in STRATEGIES {
        let harness = IntegrationHarness::new();
        let mut service = harness.service(strategy);
        let replies = converse(&mut service, "patient-2", NOTHING_TO_REPORT);

        assert!(replies.last().unwrap().text.contains(ROUTINE_RECOMMENDATION));
        let saved = records(&harness);
        assert_eq!(saved[0].risk_level, RiskLevel::Low);
        assert_eq!(saved[0].findings, 0);
        assert!(!saved[0].answers.contains_key(&QuestionId::SymptomOnset));
    }
}

#[test]
fn declining_consent_ends_immediately() {
    for strategy in STRATEGIES {
        let harness = IntegrationHarness::new();
        let mut service = harness.service(strategy);
        let replies = converse(&mut service, "patient-3", DECLINES);

        assert!(replies[1].text.starts_with("Entendo."));
        assert!(replies[1].suggestions.is_empty());
        assert!(service.store().get("patient-3").is_none());
        assert!(records(&harness).is_empty());
    }
}

#[test]
fn none_phrase_short_circuits_symptoms() {
    for strategy in STRATEGIES {
        let harness = IntegrationHarness::new();
        let mut service = harness.service(strategy);
        converse(&mut service, "patient-4", PREAMBLE);
        let reply = converse(&mut service, "patient-4", &["não sinto nada de anormal"]);

        let session = service.store().get("patient-4").unwrap();
        assert_eq!(
            session.answer(QuestionId::Symptoms),
            Some(&CanonicalAnswer::Codes(CodeSet::single("none")))
        );
        assert_eq!(session.current_question(), Some(QuestionId::LocalSigns));
        assert!(reply[0].text.starts_with("3. Você percebeu"));
    }
}

#[test]
fn invalid_and_future_dates_keep_the_question() {
    for strategy in STRATEGIES {
        let harness = IntegrationHarness::new();
        let mut service = harness.service(strategy);
        converse(&mut service, "patient-5", &["/start", "SIM", "Maria Silva"]);
        let replies = converse(&mut service, "patient-5", &["31/13/2024", "01/01/2999"]);

        assert!(replies[0].text.starts_with("Data inválida."));
        assert!(replies[1].text.starts_with("A data informada está no futuro."));
        let session = service.store().get("patient-5").unwrap();
        assert_eq!(session.current_question(), Some(QuestionId::BirthDate));
        assert!(session.answer(QuestionId::BirthDate).is_none());
    }
}

#[test]
fn unrecognized_signs_fall_back_to_raw_text() {
    for strategy in STRATEGIES {
        let harness = IntegrationHarness::new();
        let mut service = harness.service(strategy);
        converse(&mut service, "patient-6", PREAMBLE);
        converse(&mut service, "patient-6", &["nenhum"]);
        let replies = converse(&mut service, "patient-6", &["coceira", "coceira forte"]);

        assert!(replies[0].text.contains("1 - Vermelhidão"));
        assert!(replies[1].text.starts_with("4. Você foi para a consulta"));
        let session = service.store().get("patient-6").unwrap();
        assert_eq!(
            session.answer(QuestionId::LocalSigns),
            Some(&CanonicalAnswer::Raw("coceira forte".into()))
        );
    }
}

#[test]
fn denied_symptoms_are_routine() {
    for strategy in STRATEGIES {
        let harness = IntegrationHarness::new();
        let mut service = harness.service(strategy);
        converse(&mut service, "patient-8", PREAMBLE);
        converse(&mut service, "patient-8", &["sem febre e sem dor", "nenhum", "sim", "não"]);

        let saved = records(&harness);
        assert_eq!(saved[0].risk_level, RiskLevel::Low, "{strategy:?}");
        assert_eq!(
            saved[0].answers.get(&QuestionId::Symptoms),
            Some(&CanonicalAnswer::Codes(CodeSet::single("none")))
        );
    }
}

#[test]
fn denial_stays_inside_its_clause() {
    for strategy in STRATEGIES {
        let harness = IntegrationHarness::new();
        let mut service = harness.service(strategy);
        converse(&mut service, "patient-9", PREAMBLE);
        converse(&mut service, "patient-9", &["febre não, mas tenho calafrio"]);

        let session = service.store().get("patient-9").unwrap();
        assert_eq!(
            session.answer(QuestionId::Symptoms),
            Some(&CanonicalAnswer::Codes(CodeSet::single("chills"))),
            "{strategy:?}"
        );
        assert_eq!(session.current_question(), Some(QuestionId::SymptomOnset));
    }
}

#[test]
fn negated_consent_declines_under_both_strategies() {
    for strategy in STRATEGIES {
        let harness = IntegrationHarness::new();
        let mut service = harness.service(strategy);
        let replies = converse(&mut service, "patient-10", &["/start", "não quero"]);

        assert!(replies[1].text.starts_with("Entendo."), "{strategy:?}");
        assert!(service.store().get("patient-10").is_none());
    }
}
