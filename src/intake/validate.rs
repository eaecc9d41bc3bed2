//! Field validators for the structured interview answers.

use chrono::NaiveDate;
use thiserror::Error;

/// The only accepted calendar format.
pub const DATE_FORMAT: &str = "%d/%m/%Y";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("name is empty")]
    EmptyName,
    #[error("name contains unsupported character {0:?}")]
    InvalidNameCharacter(char),
    #[error("name has {found} part(s) but {required} are required")]
    TooFewNameParts { required: usize, found: usize },
    #[error("{0:?} is not a dd/mm/yyyy date")]
    UnparsableDate(String),
    #[error("date {0} is in the future")]
    FutureDate(NaiveDate),
    #[error("delivery date {delivery} precedes birth date {birth}")]
    DeliveryBeforeBirth { birth: NaiveDate, delivery: NaiveDate },
}

impl ValidationError {
    /// Message shown to the patient before the question is repeated.
    pub fn hint(&self) -> String {
        match self {
            ValidationError::EmptyName => "Não consegui ler seu nome.".to_string(),
            ValidationError::InvalidNameCharacter(_) => {
                "O nome deve conter apenas letras, espaços, hífens ou apóstrofos.".to_string()
            }
            ValidationError::TooFewNameParts { .. } => {
                "Por favor, informe seu nome completo (nome e sobrenome).".to_string()
            }
            ValidationError::UnparsableDate(_) => {
                "Data inválida. Use o formato dia/mês/ano, por exemplo 01/01/2024.".to_string()
            }
            ValidationError::FutureDate(_) => {
                "A data informada está no futuro. Confira e envie novamente.".to_string()
            }
            ValidationError::DeliveryBeforeBirth { .. } => {
                "A data do parto não pode ser anterior à sua data de nascimento.".to_string()
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NameRules {
    pub min_tokens: usize,
}

impl Default for NameRules {
    fn default() -> Self {
        Self { min_tokens: 2 }
    }
}

fn is_name_char(c: char) -> bool {
    c.is_alphabetic() || c.is_whitespace() || matches!(c, '-' | '\'' | '’')
}

/// Returns the name with runs of whitespace collapsed.
pub fn validate_name(input: &str, rules: NameRules) -> Result<String, ValidationError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyName);
    }
    if let Some(bad) = trimmed.chars().find(|c| !is_name_char(*c)) {
        return Err(ValidationError::InvalidNameCharacter(bad));
    }
    let parts: Vec<&str> = trimmed.split_whitespace().collect();
    if parts.len() < rules.min_tokens {
        return Err(ValidationError::TooFewNameParts {
            required: rules.min_tokens,
            found: parts.len(),
        });
    }
    Ok(parts.join(" "))
}

pub fn validate_date(input: &str, today: NaiveDate) -> Result<NaiveDate, ValidationError> {
    let trimmed = input.trim();
    let date = NaiveDate::parse_from_str(trimmed, DATE_FORMAT)
        .map_err(|_| ValidationError::UnparsableDate(trimmed.to_string()))?;
    if date > today {
        return Err(ValidationError::FutureDate(date));
    }
    Ok(date)
}

/// [`validate_date`] plus the ordering constraint against an earlier answer.
pub fn validate_date_after(
    input: &str,
    today: NaiveDate,
    not_before: Option<NaiveDate>,
) -> Result<NaiveDate, ValidationError> {
    let date = validate_date(input, today)?;
    match not_before {
        Some(birth) if date < birth => Err(ValidationError::DeliveryBeforeBirth {
            birth,
            delivery: date,
        }),
        _ => Ok(date),
    }
}
