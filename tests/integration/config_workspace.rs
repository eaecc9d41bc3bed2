use super::{converse, IntegrationHarness};
use maternity_intake::config::{
    config_file_path, load_or_default, save, workspace_root, NormalizerStrategy, RecordFormat,
};
use maternity_intake::ChatService;

#[test]
fn workspace_root_follows_home_variable() {
    let harness = IntegrationHarness::new();
    assert_eq!(workspace_root().unwrap(), harness.workspace_path());
    assert!(config_file_path()
        .unwrap()
        .starts_with(harness.workspace_path().join("config")));
}

#[test]
fn saved_config_drives_the_service() {
    let harness = IntegrationHarness::new();
    let mut cfg = load_or_default().unwrap();
    assert_eq!(cfg.normalizer.strategy, NormalizerStrategy::Auto);
    cfg.normalizer.strategy = NormalizerStrategy::Keyword;
    cfg.persistence.format = RecordFormat::Csv;
    cfg.intake.min_name_tokens = 1;
    save(&cfg).unwrap();

    let reloaded = load_or_default().unwrap();
    assert_eq!(reloaded.persistence.format, RecordFormat::Csv);

    let mut service = ChatService::from_workspace().unwrap();
    assert_eq!(service.machine().normalizer().strategy(), "keyword");
    let replies = converse(&mut service, "u1", &["/start", "SIM", "Maria"]);
    assert!(replies[2].text.starts_with("Informe sua data de nascimento"));
}

#[test]
fn auto_strategy_uses_installed_lemma_table() {
    let harness = IntegrationHarness::new();
    let cfg = harness.config(NormalizerStrategy::Auto, RecordFormat::Jsonl);
    assert_eq!(harness.service_with(&cfg).machine().normalizer().strategy(), "keyword");
    harness.install_lemma_table();
    assert_eq!(harness.service_with(&cfg).machine().normalizer().strategy(), "lemma");
}
