//! Versioned synonym table: one vocabulary of canonical codes per question.
//!
//! The table ships embedded in the binary (`resources/synonyms.toml`) and may be
//! replaced by an operator-provided file. It is parsed and validated once at
//! startup and never mutated afterwards.

use super::{text, CodeSet, NormalizeOutcome};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Code every findings vocabulary uses for "nothing to report".
pub const NO_FINDINGS_CODE: &str = "none";

const EMBEDDED_SYNONYMS: &str = include_str!("../../resources/synonyms.toml");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    /// A message token must equal the synonym token.
    #[default]
    Exact,
    /// A message token must contain the synonym token ("febres" contains "febre").
    Substring,
}

impl MatchMode {
    pub fn token_matches(self, token: &str, synonym: &str) -> bool {
        match self {
            MatchMode::Exact => token == synonym,
            MatchMode::Substring => token.contains(synonym),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("vocabulary `{0}` has no codes")]
    EmptyVocabulary(String),
    #[error("vocabulary `{vocabulary}` declares code `{code}` twice")]
    DuplicateCode { vocabulary: String, code: String },
    #[error("vocabulary `{vocabulary}` assigns number {number} to more than one code")]
    DuplicateNumber { vocabulary: String, number: u32 },
    #[error("vocabulary `{vocabulary}` maps `{key}` to more than one code")]
    AmbiguousKey { vocabulary: String, key: String },
    #[error("vocabulary `{0}` is referenced by a question but missing from the synonym table")]
    MissingVocabulary(String),
}

#[derive(Debug, Deserialize)]
struct SynonymTableDef {
    version: String,
    vocabularies: BTreeMap<String, VocabularyDef>,
}

#[derive(Debug, Deserialize)]
struct VocabularyDef {
    #[serde(default)]
    match_mode: MatchMode,
    #[serde(default)]
    multiple: bool,
    codes: Vec<CodeEntryDef>,
}

#[derive(Debug, Deserialize)]
struct CodeEntryDef {
    code: String,
    number: u32,
    label: String,
    #[serde(default)]
    aliases: Vec<String>,
    #[serde(default)]
    synonyms: Vec<String>,
    #[serde(default)]
    exact: Vec<String>,
}

/// One canonical code with everything that can select it.
#[derive(Debug, Clone)]
pub struct CodeEntry {
    pub code: String,
    pub number: u32,
    pub label: String,
    pub synonyms: Vec<String>,
    /// Phrases matched exactly whatever the vocabulary's match mode ("dor" must not hit "adormeci").
    pub exact_synonyms: Vec<String>,
    /// Folded label, aliases and number, matched against the whole message.
    keys: Vec<String>,
}

impl CodeEntry {
    pub fn is_no_findings(&self) -> bool {
        self.code == NO_FINDINGS_CODE
    }

    pub fn matches_key(&self, key: &str) -> bool {
        self.keys.iter().any(|candidate| candidate == key)
    }
}

#[derive(Debug, Clone)]
pub struct Vocabulary {
    name: String,
    match_mode: MatchMode,
    multiple: bool,
    codes: Vec<CodeEntry>,
}

impl Vocabulary {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn match_mode(&self) -> MatchMode {
        self.match_mode
    }

    /// Whether several codes may be recorded for one answer.
    pub fn is_multiple(&self) -> bool {
        self.multiple
    }

    pub fn codes(&self) -> &[CodeEntry] {
        &self.codes
    }

    pub fn entry(&self, code: &str) -> Option<&CodeEntry> {
        self.codes.iter().find(|entry| entry.code == code)
    }

    pub fn by_number(&self, number: u32) -> Option<&CodeEntry> {
        self.codes.iter().find(|entry| entry.number == number)
    }

    pub fn by_key(&self, key: &str) -> Option<&CodeEntry> {
        self.codes.iter().find(|entry| entry.matches_key(key))
    }

    pub fn none_entry(&self) -> Option<&CodeEntry> {
        self.codes.iter().find(|entry| entry.is_no_findings())
    }

    /// Button labels in table order.
    pub fn labels(&self) -> Vec<String> {
        self.codes.iter().map(|entry| entry.label.clone()).collect()
    }

    /// Numbered option list rendered under choice prompts.
    pub fn option_lines(&self) -> String {
        self.codes
            .iter()
            .map(|entry| format!("{} - {}", entry.number, entry.label))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Applies the "none wins" priority and the single-choice constraint.
    pub fn resolve(&self, codes: CodeSet) -> NormalizeOutcome {
        if codes.is_empty() {
            return NormalizeOutcome::NoMatch;
        }
        if let Some(none) = self.none_entry() {
            if codes.contains(&none.code) {
                return NormalizeOutcome::Matched(CodeSet::single(none.code.clone()));
            }
        }
        if !self.multiple && codes.len() > 1 {
            return NormalizeOutcome::Ambiguous(codes);
        }
        NormalizeOutcome::Matched(codes)
    }

    fn from_def(name: &str, def: VocabularyDef) -> Result<Self, CatalogError> {
        if def.codes.is_empty() {
            return Err(CatalogError::EmptyVocabulary(name.to_string()));
        }
        let mut seen_codes = HashSet::new();
        let mut seen_numbers = HashSet::new();
        let mut seen_keys = HashSet::new();
        let mut codes = Vec::with_capacity(def.codes.len());
        for entry in def.codes {
            if !seen_codes.insert(entry.code.clone()) {
                return Err(CatalogError::DuplicateCode {
                    vocabulary: name.to_string(),
                    code: entry.code,
                });
            }
            if !seen_numbers.insert(entry.number) {
                return Err(CatalogError::DuplicateNumber {
                    vocabulary: name.to_string(),
                    number: entry.number,
                });
            }
            let mut keys = vec![text::fold_key(&entry.label), entry.number.to_string()];
            keys.extend(entry.aliases.iter().map(|alias| text::fold_key(alias)));
            keys.retain(|key| !key.is_empty());
            keys.dedup();
            for key in &keys {
                if !seen_keys.insert(key.clone()) {
                    return Err(CatalogError::AmbiguousKey {
                        vocabulary: name.to_string(),
                        key: key.clone(),
                    });
                }
            }
            codes.push(CodeEntry {
                code: entry.code,
                number: entry.number,
                label: entry.label,
                synonyms: entry.synonyms,
                exact_synonyms: entry.exact,
                keys,
            });
        }
        Ok(Self {
            name: name.to_string(),
            match_mode: def.match_mode,
            multiple: def.multiple,
            codes,
        })
    }
}

/// Process-wide, read-only synonym configuration.
#[derive(Debug, Clone)]
pub struct SynonymTable {
    version: String,
    vocabularies: BTreeMap<String, Vocabulary>,
}

impl SynonymTable {
    /// The table compiled into the binary.
    pub fn embedded() -> Result<Self> {
        Self::from_toml_str(EMBEDDED_SYNONYMS).context("Embedded synonym table is invalid")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("Failed to read synonym table {:?}", path))?;
        Self::from_toml_str(&data)
            .with_context(|| format!("Failed to parse synonym table {:?}", path))
    }

    pub fn from_toml_str(data: &str) -> Result<Self> {
        let def: SynonymTableDef = toml::from_str(data)?;
        let mut vocabularies = BTreeMap::new();
        for (name, vocabulary) in def.vocabularies {
            let parsed = Vocabulary::from_def(&name, vocabulary)?;
            vocabularies.insert(name, parsed);
        }
        Ok(Self {
            version: def.version,
            vocabularies,
        })
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn vocabulary(&self, name: &str) -> Option<&Vocabulary> {
        self.vocabularies.get(name)
    }

    pub fn require(&self, name: &str) -> Result<&Vocabulary, CatalogError> {
        self.vocabulary(name)
            .ok_or_else(|| CatalogError::MissingVocabulary(name.to_string()))
    }

    pub fn vocabulary_names(&self) -> impl Iterator<Item = &str> {
        self.vocabularies.keys().map(String::as_str)
    }
}
