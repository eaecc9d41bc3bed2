//! Lemma-based reduction backed by an optional dictionary resource.

use super::text::fold;
use super::Normalizer;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::borrow::Cow;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct LemmaTableDef {
    version: String,
    #[serde(default)]
    suffixes: Vec<SuffixRule>,
    #[serde(default)]
    lemmas: HashMap<String, String>,
}

/// Replaces `suffix` with `replacement` when at least `min_stem` characters remain.
#[derive(Debug, Clone, Deserialize)]
pub struct SuffixRule {
    pub suffix: String,
    #[serde(default)]
    pub replacement: String,
    #[serde(default = "default_min_stem")]
    pub min_stem: usize,
}

const fn default_min_stem() -> usize {
    3
}

impl SuffixRule {
    fn apply(&self, token: &str) -> Option<String> {
        let stem = token.strip_suffix(self.suffix.as_str())?;
        if stem.chars().count() < self.min_stem {
            return None;
        }
        Some(format!("{stem}{}", self.replacement))
    }
}

#[derive(Debug, Clone)]
pub struct LemmaTable {
    version: String,
    lemmas: HashMap<String, String>,
    suffixes: Vec<SuffixRule>,
}

impl LemmaTable {
    pub fn load(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("Failed to read lemma table {:?}", path))?;
        Self::from_toml_str(&data).with_context(|| format!("Failed to parse lemma table {:?}", path))
    }

    pub fn from_toml_str(data: &str) -> Result<Self> {
        let def: LemmaTableDef = toml::from_str(data)?;
        let lemmas = def
            .lemmas
            .into_iter()
            .map(|(form, lemma)| (fold(&form), fold(&lemma)))
            .collect();
        Ok(Self {
            version: def.version,
            lemmas,
            suffixes: def.suffixes,
        })
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn len(&self) -> usize {
        self.lemmas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lemmas.is_empty()
    }

    /// Dictionary lookup first, then the first applicable suffix rule.
    pub fn lemma<'a>(&self, token: &'a str) -> Cow<'a, str> {
        if let Some(lemma) = self.lemmas.get(token) {
            return Cow::Owned(lemma.clone());
        }
        for rule in &self.suffixes {
            if let Some(reduced) = rule.apply(token) {
                return Cow::Owned(reduced);
            }
        }
        Cow::Borrowed(token)
    }
}

pub struct LemmaNormalizer {
    table: LemmaTable,
}

impl LemmaNormalizer {
    pub fn new(table: LemmaTable) -> Self {
        Self { table }
    }
}

impl Normalizer for LemmaNormalizer {
    fn strategy(&self) -> &'static str {
        "lemma"
    }

    fn reduce<'a>(&self, token: &'a str) -> Cow<'a, str> {
        self.table.lemma(token)
    }
}
