//! Text folding and tokenization shared by every normalizer strategy.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Folded Portuguese function words dropped before matching.
///
/// Negations ("nao") and answer words ("sim") are deliberately absent: the
/// "none" phrase lists and the yes/no vocabulary depend on them.
const STOP_WORDS: &[&str] = &[
    "a", "o", "as", "os", "ao", "aos", "e", "de", "da", "do", "das", "dos", "em", "no", "na",
    "nos", "nas", "num", "numa", "com", "um", "uma", "uns", "umas", "para", "pra", "pro", "por",
    "pelo", "pela", "que", "eu", "me", "mim", "meu", "minha", "meus", "minhas", "estou", "esta",
    "esse", "essa", "isso", "isto", "se", "ja", "ha", "la", "ai", "so", "tambem", "mas", "ou",
    "acho", "assim", "entao", "tipo", "bom", "boa",
];

/// Lowercases and strips diacritics ("NÃO" becomes "nao", "Inchaço" becomes "inchaco").
pub fn fold(text: &str) -> String {
    text.nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Splits folded text on anything that is not a letter or digit.
pub fn tokenize(folded: &str) -> impl Iterator<Item = &str> {
    folded
        .split(|c: char| !c.is_alphanumeric())
        .filter(|token| !token.is_empty())
}

pub fn is_stop_word(token: &str) -> bool {
    STOP_WORDS.contains(&token)
}

/// Conjunctions that start a new clause. Phrases never match across them.
const CLAUSE_BREAKS: &[&str] = &["e", "mas", "ou", "porem", "contudo", "entretanto"];

/// Words that deny whatever finding the clause mentions ("sem febre", "febre nao").
const NEGATORS: &[&str] = &["nao", "sem", "nem", "nunca"];

pub fn is_negator(token: &str) -> bool {
    NEGATORS.contains(&token)
}

/// Splits folded text into clauses of raw tokens at punctuation and conjunctions.
pub fn clauses(folded: &str) -> Vec<Vec<&str>> {
    let mut result = Vec::new();
    for piece in folded.split(|c: char| matches!(c, ',' | '.' | ';' | ':' | '!' | '?' | '\n')) {
        let mut current = Vec::new();
        for token in tokenize(piece) {
            if CLAUSE_BREAKS.contains(&token) {
                if !current.is_empty() {
                    result.push(std::mem::take(&mut current));
                }
            } else {
                current.push(token);
            }
        }
        if !current.is_empty() {
            result.push(current);
        }
    }
    result
}

/// Canonical whole-message key used by the label/alias/number fast path.
///
/// Punctuation and spacing differences disappear, stop-words are kept so
/// "mais de 3 dias" stays distinct from "3 dias".
pub fn fold_key(text: &str) -> String {
    let folded = fold(text);
    tokenize(&folded).collect::<Vec<_>>().join(" ")
}

pub fn is_numeric(token: &str) -> bool {
    !token.is_empty() && token.chars().all(|c| c.is_ascii_digit())
}
