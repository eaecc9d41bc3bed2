use maternity_intake::config::{AppConfig, NormalizerStrategy, RecordFormat, HOME_ENV_VAR};
use maternity_intake::{ChatService, InboundMessage, OutboundPrompt};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tempfile::TempDir;

/// Tests share one process environment; the harness holds this while it sets the home variable.
static ENV_LOCK: Mutex<()> = Mutex::new(());

const LEMMA_TABLE: &str = include_str!("../../resources/lemmas.toml");

pub struct IntegrationHarness {
    workspace: TempDir,
    _env: MutexGuard<'static, ()>,
}

impl IntegrationHarness {
    pub fn new() -> Self {
        let guard = ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let workspace = TempDir::new().expect("failed to create temp workspace");
        env::set_var(HOME_ENV_VAR, workspace.path());
        Self {
            workspace,
            _env: guard,
        }
    }

    pub fn workspace_path(&self) -> &Path {
        self.workspace.path()
    }

    /// Installs the bundled lemma table where the auto strategy looks for it.
    pub fn install_lemma_table(&self) -> PathBuf {
        let dir = self.workspace_path().join("resources");
        fs::create_dir_all(&dir).expect("failed to create resources dir");
        let path = dir.join("lemmas.toml");
        fs::write(&path, LEMMA_TABLE).expect("failed to write lemma table");
        path
    }

    pub fn config(&self, strategy: NormalizerStrategy, format: RecordFormat) -> AppConfig {
        if strategy == NormalizerStrategy::Lemma {
            self.install_lemma_table();
        }
        let mut cfg = AppConfig::default();
        cfg.normalizer.strategy = strategy;
        cfg.persistence.format = format;
        cfg
    }

    pub fn service(&self, strategy: NormalizerStrategy) -> ChatService {
        self.service_with(&self.config(strategy, RecordFormat::Jsonl))
    }

    pub fn service_with(&self, cfg: &AppConfig) -> ChatService {
        ChatService::from_config(cfg, self.workspace_path()).expect("failed to build chat service")
    }
}

/// Both normalizer strategies; every conversational test runs under each.
pub const STRATEGIES: [NormalizerStrategy; 2] = [NormalizerStrategy::Keyword, NormalizerStrategy::Lemma];

/// Sends each line as `user_id` and returns the replies in order.
pub fn converse(service: &mut ChatService, user_id: &str, lines: &[&str]) -> Vec<OutboundPrompt> {
    lines
        .iter()
        .map(|line| service.handle(&InboundMessage::text(user_id, *line)))
        .collect()
}

mod config_workspace;
mod intake_cancellation;
mod intake_scenarios;
mod records_export;
pub mod support;
