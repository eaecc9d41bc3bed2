//! Fixed question set of the post-cesarean wound-care interview.

use super::session::CanonicalAnswer;
use super::OutboundPrompt;
use crate::normalize::{CatalogError, SynonymTable, Vocabulary};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionId {
    Consent,
    FullName,
    BirthDate,
    DeliveryDate,
    Symptoms,
    SymptomOnset,
    LocalSigns,
    FollowUpVisit,
    CareDoubts,
}

impl QuestionId {
    /// Interview order.
    pub const ALL: [QuestionId; 9] = [
        QuestionId::Consent,
        QuestionId::FullName,
        QuestionId::BirthDate,
        QuestionId::DeliveryDate,
        QuestionId::Symptoms,
        QuestionId::SymptomOnset,
        QuestionId::LocalSigns,
        QuestionId::FollowUpVisit,
        QuestionId::CareDoubts,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            QuestionId::Consent => "consent",
            QuestionId::FullName => "full_name",
            QuestionId::BirthDate => "birth_date",
            QuestionId::DeliveryDate => "delivery_date",
            QuestionId::Symptoms => "symptoms",
            QuestionId::SymptomOnset => "symptom_onset",
            QuestionId::LocalSigns => "local_signs",
            QuestionId::FollowUpVisit => "follow_up_visit",
            QuestionId::CareDoubts => "care_doubts",
        }
    }

    pub fn ordinal(self) -> usize {
        self as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerDomain {
    /// yes/no gate; anything else is re-asked, never stored as raw text.
    Consent { vocabulary: &'static str },
    /// Enumeration with free-text fallback.
    Choice { vocabulary: &'static str },
    Name,
    /// `dd/mm/yyyy`, not in the future and not before the date given for `not_before`.
    Date { not_before: Option<QuestionId> },
}

impl AnswerDomain {
    pub fn vocabulary(self) -> Option<&'static str> {
        match self {
            AnswerDomain::Consent { vocabulary } | AnswerDomain::Choice { vocabulary } => {
                Some(vocabulary)
            }
            AnswerDomain::Name | AnswerDomain::Date { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Next {
    Ask(QuestionId),
    Complete,
    Decline,
}

#[derive(Clone, Copy)]
pub enum Successor {
    Fixed(Next),
    Branch(fn(&CanonicalAnswer) -> Next),
}

impl Successor {
    pub fn next(&self, answer: &CanonicalAnswer) -> Next {
        match self {
            Successor::Fixed(next) => *next,
            Successor::Branch(rule) => rule(answer),
        }
    }
}

#[derive(Clone, Copy)]
pub struct Question {
    pub id: QuestionId,
    pub prompt: &'static str,
    pub domain: AnswerDomain,
    pub successor: Successor,
}

fn after_consent(answer: &CanonicalAnswer) -> Next {
    if answer.has_code("yes") {
        Next::Ask(QuestionId::FullName)
    } else {
        Next::Decline
    }
}

fn after_symptoms(answer: &CanonicalAnswer) -> Next {
    if answer.is_no_findings() {
        Next::Ask(QuestionId::LocalSigns)
    } else {
        Next::Ask(QuestionId::SymptomOnset)
    }
}

static QUESTIONS: [Question; 9] = [
    Question {
        id: QuestionId::Consent,
        prompt: "Olá! Sou enfermeira do controle de Infecção Hospitalar da Maternidade e gostaria \
                 de contribuir com seu cuidado pós-operatório, fazendo algumas perguntas. Você \
                 aceita seguir com a conversa nesse momento?",
        domain: AnswerDomain::Consent { vocabulary: "yes_no" },
        successor: Successor::Branch(after_consent),
    },
    Question {
        id: QuestionId::FullName,
        prompt: "Maravilha! Nessa conversa você responde escolhendo a alternativa com a qual mais \
                 se identifica. Antes, confirme seu nome completo:",
        domain: AnswerDomain::Name,
        successor: Successor::Fixed(Next::Ask(QuestionId::BirthDate)),
    },
    Question {
        id: QuestionId::BirthDate,
        prompt: "Informe sua data de nascimento (ex: 01/01/1990):",
        domain: AnswerDomain::Date { not_before: None },
        successor: Successor::Fixed(Next::Ask(QuestionId::DeliveryDate)),
    },
    Question {
        id: QuestionId::DeliveryDate,
        prompt: "Informe a data do parto (ex: 01/01/2024):",
        domain: AnswerDomain::Date {
            not_before: Some(QuestionId::BirthDate),
        },
        successor: Successor::Fixed(Next::Ask(QuestionId::Symptoms)),
    },
    Question {
        id: QuestionId::Symptoms,
        prompt: "Vamos às perguntas! Ah, uma dica: vamos chamar o local da cirurgia de ferida \
                 operatória 😉\n\n1. Depois que foi para casa, você apresentou algum destes \
                 sintomas? Pode escolher mais de um (ex: 1 e 2):",
        domain: AnswerDomain::Choice { vocabulary: "symptoms" },
        successor: Successor::Branch(after_symptoms),
    },
    Question {
        id: QuestionId::SymptomOnset,
        prompt: "2. Há quanto tempo os sintomas começaram?",
        domain: AnswerDomain::Choice {
            vocabulary: "symptom_onset",
        },
        successor: Successor::Fixed(Next::Ask(QuestionId::LocalSigns)),
    },
    Question {
        id: QuestionId::LocalSigns,
        prompt: "3. Você percebeu algum destes sinais na ferida operatória? Pode escolher mais de \
                 um:",
        domain: AnswerDomain::Choice {
            vocabulary: "local_signs",
        },
        successor: Successor::Fixed(Next::Ask(QuestionId::FollowUpVisit)),
    },
    Question {
        id: QuestionId::FollowUpVisit,
        prompt: "4. Você foi para a consulta de resguardo com a enfermeira ou o médico do \
                 pré-natal?",
        domain: AnswerDomain::Choice { vocabulary: "yes_no" },
        successor: Successor::Fixed(Next::Ask(QuestionId::CareDoubts)),
    },
    Question {
        id: QuestionId::CareDoubts,
        prompt: "5. Você saiu do hospital com dúvidas ou tem dúvidas quanto aos cuidados com a \
                 ferida operatória?",
        domain: AnswerDomain::Choice { vocabulary: "yes_no" },
        successor: Successor::Fixed(Next::Complete),
    },
];

/// Question definitions bound to the synonym table they draw codes from.
pub struct QuestionCatalog {
    questions: &'static [Question],
    synonyms: SynonymTable,
}

impl QuestionCatalog {
    /// Fails when a question references a vocabulary the table does not define.
    pub fn new(synonyms: SynonymTable) -> Result<Self, CatalogError> {
        for question in QUESTIONS.iter() {
            if let Some(name) = question.domain.vocabulary() {
                synonyms.require(name)?;
            }
        }
        Ok(Self {
            questions: &QUESTIONS,
            synonyms,
        })
    }

    pub fn first(&self) -> QuestionId {
        self.questions[0].id
    }

    pub fn question(&self, id: QuestionId) -> &Question {
        &self.questions[id.ordinal()]
    }

    pub fn synonyms(&self) -> &SynonymTable {
        &self.synonyms
    }

    pub fn vocabulary_for(&self, id: QuestionId) -> Option<&Vocabulary> {
        self.question(id)
            .domain
            .vocabulary()
            .and_then(|name| self.synonyms.vocabulary(name))
    }

    /// Question text plus the reply buttons the transport should offer.
    pub fn prompt(&self, id: QuestionId) -> OutboundPrompt {
        let question = self.question(id);
        match (question.domain, self.vocabulary_for(id)) {
            (AnswerDomain::Consent { .. }, Some(vocabulary)) => {
                OutboundPrompt::new(question.prompt).with_suggestions(vocabulary.labels())
            }
            (AnswerDomain::Choice { .. }, Some(vocabulary)) if vocabulary.codes().len() > 2 => {
                OutboundPrompt::new(format!("{}\n{}", question.prompt, vocabulary.option_lines()))
                    .with_suggestions(vocabulary.labels())
            }
            (AnswerDomain::Choice { .. }, Some(vocabulary)) => {
                OutboundPrompt::new(question.prompt).with_suggestions(vocabulary.labels())
            }
            _ => OutboundPrompt::new(question.prompt),
        }
    }
}
