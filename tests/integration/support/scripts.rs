//! Scripted patient turns. Each script begins with `/start`.

pub const PREAMBLE: &[&str] = &["/start", "SIM", "Maria Silva", "01/01/1990", "01/01/2024"];

/// Fever and chills, no local signs: two findings.
pub const FEVER_AND_CHILLS: &[&str] = &[
    "/start",
    "SIM",
    "Maria Silva",
    "01/01/1990",
    "01/01/2024",
    "estou com febre e calafrio",
    "ontem",
    "nenhum",
    "sim",
    "não",
];

/// Numeric shortcuts for "none" on both findings questions.
pub const NOTHING_TO_REPORT: &[&str] = &[
    "/start",
    "SIM",
    "Maria Silva",
    "01/01/1990",
    "01/01/2024",
    "4",
    "7",
    "sim",
    "não",
];

pub const DECLINES: &[&str] = &["/start", "NÃO"];
