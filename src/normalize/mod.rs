//! Answer normalization: patient utterance to canonical codes.
//!
//! Two interchangeable strategies implement [`Normalizer`]. Both share the
//! button/number fast path and the phrase matcher; they differ only in how a
//! token is reduced to its base form. The strategy is chosen once, at startup,
//! by [`build_normalizer`].

pub mod keyword;
pub mod lemma;
mod matcher;
pub mod text;
pub mod vocabulary;

pub use keyword::KeywordNormalizer;
pub use lemma::{LemmaNormalizer, LemmaTable};
pub use vocabulary::{CatalogError, CodeEntry, MatchMode, SynonymTable, Vocabulary, NO_FINDINGS_CODE};

use crate::config::{NormalizerSettings, NormalizerStrategy};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::path::Path;
use tracing::{info, warn};

/// Ordered, duplicate-free list of canonical codes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CodeSet(Vec<String>);

impl CodeSet {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn single(code: impl Into<String>) -> Self {
        Self(vec![code.into()])
    }

    /// Appends `code` unless already present; first occurrence keeps its position.
    pub fn insert(&mut self, code: impl Into<String>) -> bool {
        let code = code.into();
        if self.contains(&code) {
            return false;
        }
        self.0.push(code);
        true
    }

    pub fn contains(&self, code: &str) -> bool {
        self.0.iter().any(|existing| existing == code)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    /// Codes other than [`NO_FINDINGS_CODE`].
    pub fn positive_count(&self) -> usize {
        self.iter().filter(|code| *code != NO_FINDINGS_CODE).count()
    }
}

impl FromIterator<String> for CodeSet {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        let mut set = CodeSet::new();
        for code in iter {
            set.insert(code);
        }
        set
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NormalizeOutcome {
    Matched(CodeSet),
    /// Several codes matched a single-choice vocabulary.
    Ambiguous(CodeSet),
    NoMatch,
}

pub trait Normalizer: Send + Sync {
    /// Short strategy name, recorded with every completed intake.
    fn strategy(&self) -> &'static str;

    /// Reduces a folded, non-stop-word token to the form used for matching.
    fn reduce<'a>(&self, token: &'a str) -> Cow<'a, str>;

    /// Maps an utterance (and optional button payload) to canonical codes.
    fn normalize(
        &self,
        vocabulary: &Vocabulary,
        utterance: &str,
        payload: Option<&str>,
    ) -> NormalizeOutcome {
        if let Some(outcome) = matcher::fast_path(vocabulary, utterance, payload) {
            return outcome;
        }
        matcher::match_text(self, vocabulary, utterance)
    }
}

/// Selects the normalizer strategy for the process.
///
/// `Auto` uses the lemma strategy when a lemma table can be loaded and the
/// keyword strategy otherwise; `Lemma` fails if the table is unavailable.
pub fn build_normalizer(
    settings: &NormalizerSettings,
    workspace_root: &Path,
) -> Result<Box<dyn Normalizer>> {
    let lemma_path = settings.lemma_table_file(workspace_root);
    match settings.strategy {
        NormalizerStrategy::Keyword => {
            info!(strategy = "keyword", "Answer normalizer selected");
            Ok(Box::new(KeywordNormalizer::new()))
        }
        NormalizerStrategy::Lemma => {
            let table = LemmaTable::load(&lemma_path).context("Lemma strategy requested")?;
            info!(strategy = "lemma", version = table.version(), "Answer normalizer selected");
            Ok(Box::new(LemmaNormalizer::new(table)))
        }
        NormalizerStrategy::Auto => {
            if !lemma_path.exists() {
                info!(
                    strategy = "keyword",
                    "No lemma table at {:?}; using keyword matching", lemma_path
                );
                return Ok(Box::new(KeywordNormalizer::new()));
            }
            match LemmaTable::load(&lemma_path) {
                Ok(table) => {
                    info!(strategy = "lemma", version = table.version(), "Answer normalizer selected");
                    Ok(Box::new(LemmaNormalizer::new(table)))
                }
                Err(err) => {
                    warn!(error = %err, "Lemma table unusable; falling back to keyword matching");
                    Ok(Box::new(KeywordNormalizer::new()))
                }
            }
        }
    }
}

/// Loads the configured synonym table, or the embedded one.
pub fn load_synonyms(settings: &NormalizerSettings, workspace_root: &Path) -> Result<SynonymTable> {
    let table = match settings.synonyms_file(workspace_root) {
        Some(path) => SynonymTable::load(&path)?,
        None => SynonymTable::embedded()?,
    };
    info!(version = table.version(), "Synonym table loaded");
    Ok(table)
}
