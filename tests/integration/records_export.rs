use super::support::scripts::FEVER_AND_CHILLS;
use super::{converse, IntegrationHarness};
use maternity_intake::chat::PERSISTENCE_DISCLAIMER;
use maternity_intake::config::{NormalizerStrategy, RecordFormat};
use maternity_intake::persistence::{CsvRecordSink, JsonlRecordSink};
use std::fs;

#[test]
fn jsonl_records_accumulate_one_per_interview() {
    let harness = IntegrationHarness::new();
    let mut service = harness.service(NormalizerStrategy::Keyword);
    converse(&mut service, "first", FEVER_AND_CHILLS);
    converse(&mut service, "second", FEVER_AND_CHILLS);

    let sink = JsonlRecordSink::new(harness.workspace_path().join("records/intakes.jsonl"));
    let saved = sink.load_all().unwrap();
    assert_eq!(saved.len(), 2);
    assert_eq!(saved[0].user_id, "first");
    assert_eq!(saved[1].user_id, "second");
    assert_ne!(saved[0].session_id, saved[1].session_id);
    assert_eq!(saved[0].normalizer, "keyword");
    assert_eq!(saved[0].synonyms_version, "2024.2");
}

#[test]
fn csv_export_has_single_header() {
    let harness = IntegrationHarness::new();
    let cfg = harness.config(NormalizerStrategy::Lemma, RecordFormat::Csv);
    let mut service = harness.service_with(&cfg);
    converse(&mut service, "first", FEVER_AND_CHILLS);
    converse(&mut service, "second", FEVER_AND_CHILLS);

    let path = harness.workspace_path().join("records/intakes.csv");
    let mut reader = csv::Reader::from_path(&path).unwrap();
    let headers = reader.headers().unwrap().clone();
    assert_eq!(headers.len(), CsvRecordSink::header().len());
    let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
    assert_eq!(rows.len(), 2);
    let symptoms = headers.iter().position(|h| h == "symptoms").unwrap();
    assert_eq!(&rows[1][symptoms], "fever;chills");
    let normalizer = headers.iter().position(|h| h == "normalizer").unwrap();
    assert_eq!(&rows[0][normalizer], "lemma");
}

#[test]
fn unwritable_records_path_adds_disclaimer() {
    let harness = IntegrationHarness::new();
    let mut cfg = harness.config(NormalizerStrategy::Keyword, RecordFormat::Jsonl);
    // A directory where the records file should be makes every append fail.
    let blocked = harness.workspace_path().join("blocked");
    fs::create_dir_all(&blocked).unwrap();
    cfg.persistence.records_file = Some(blocked);
    let mut service = harness.service_with(&cfg);

    let replies = converse(&mut service, "u1", FEVER_AND_CHILLS);
    let last = replies.last().unwrap();
    assert!(last.text.starts_with("Pronto! Terminamos."));
    assert!(last.text.ends_with(PERSISTENCE_DISCLAIMER));
    assert_eq!(service.active_sessions(), 0);
}
