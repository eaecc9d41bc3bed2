//! Rule-based triage over a finished answer set.
//!
//! The policy is a single threshold over the number of positive findings
//! reported for the systemic-symptom and local-sign questions. It is total:
//! every answer set yields exactly one of the two outcomes.

use crate::intake::{CanonicalAnswer, QuestionId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Findings at or above this count require an urgent return.
pub const URGENT_FINDINGS_THRESHOLD: usize = 2;

/// Questions whose answers are counted as findings.
pub const FINDING_QUESTIONS: [QuestionId; 2] = [QuestionId::Symptoms, QuestionId::LocalSigns];

pub const URGENT_RECOMMENDATION: &str = "Baseado em suas informações, recomendamos que retorne \
     com urgência à maternidade onde você pariu ou à mais próxima de sua residência.";

pub const ROUTINE_RECOMMENDATION: &str = "Baseado em suas informações, recomendamos que retorne \
     à unidade de saúde onde fez seu pré-natal para a consulta do puerpério (resguardo) com sua \
     médica ou enfermeiro, e que continue observando a ferida operatória.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskLevel {
    Low,
    High,
}

impl RiskLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            RiskLevel::Low => "LOW",
            RiskLevel::High => "HIGH",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriageResult {
    pub risk_level: RiskLevel,
    pub recommendation: String,
    /// Positive findings the decision was based on.
    pub findings: usize,
}

impl TriageResult {
    pub fn new(risk_level: RiskLevel, findings: usize) -> Self {
        let recommendation = match risk_level {
            RiskLevel::High => URGENT_RECOMMENDATION,
            RiskLevel::Low => ROUTINE_RECOMMENDATION,
        };
        Self {
            risk_level,
            recommendation: recommendation.to_string(),
            findings,
        }
    }
}

pub fn count_findings(answers: &BTreeMap<QuestionId, CanonicalAnswer>) -> usize {
    FINDING_QUESTIONS
        .iter()
        .filter_map(|id| answers.get(id))
        .map(CanonicalAnswer::positive_findings)
        .sum()
}

pub fn evaluate(answers: &BTreeMap<QuestionId, CanonicalAnswer>) -> TriageResult {
    let findings = count_findings(answers);
    let risk_level = if findings >= URGENT_FINDINGS_THRESHOLD {
        RiskLevel::High
    } else {
        RiskLevel::Low
    };
    TriageResult::new(risk_level, findings)
}
