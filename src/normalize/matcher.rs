use super::text::{self, fold, is_negator, is_numeric, is_stop_word, tokenize};
use super::vocabulary::{MatchMode, Vocabulary};
use super::{CodeSet, NormalizeOutcome, Normalizer};

/// Button payloads, labels, aliases and numeric shortcuts. No text analysis.
pub(super) fn fast_path(
    vocabulary: &Vocabulary,
    utterance: &str,
    payload: Option<&str>,
) -> Option<NormalizeOutcome> {
    if let Some(codes) = payload.and_then(|payload| payload_codes(vocabulary, payload)) {
        return Some(vocabulary.resolve(codes));
    }

    let key = text::fold_key(utterance);
    if key.is_empty() {
        return None;
    }
    if let Some(entry) = vocabulary.by_key(&key) {
        return Some(NormalizeOutcome::Matched(CodeSet::single(entry.code.clone())));
    }

    // "1, 3" or "1 e 3": every remaining token must be a known shortcut.
    let folded = fold(utterance);
    let tokens: Vec<&str> = tokenize(&folded).filter(|t| !is_stop_word(t)).collect();
    if tokens.len() < 2 || !tokens.iter().all(|t| is_numeric(t)) {
        return None;
    }
    let mut codes = CodeSet::new();
    for token in tokens {
        let number: u32 = token.parse().ok()?;
        codes.insert(vocabulary.by_number(number)?.code.clone());
    }
    Some(vocabulary.resolve(codes))
}

/// Comma-separated code names; `None` unless every one belongs to the vocabulary.
fn payload_codes(vocabulary: &Vocabulary, payload: &str) -> Option<CodeSet> {
    let mut codes = CodeSet::new();
    for code in payload.split(',').map(str::trim).filter(|c| !c.is_empty()) {
        codes.insert(vocabulary.entry(code)?.code.clone());
    }
    (!codes.is_empty()).then_some(codes)
}

/// Folds, tokenizes, drops stop-words and reduces with the strategy.
pub(super) fn analyze<N: Normalizer + ?Sized>(normalizer: &N, phrase: &str) -> Vec<String> {
    let folded = fold(phrase);
    tokenize(&folded)
        .filter(|token| !is_stop_word(token))
        .map(|token| normalizer.reduce(token).into_owned())
        .collect()
}

/// One clause of the message, analyzed. `negated` is read before stop-words are dropped.
struct Clause {
    tokens: Vec<String>,
    negated: bool,
}

fn analyze_clauses<N: Normalizer + ?Sized>(normalizer: &N, utterance: &str) -> Vec<Clause> {
    let folded = fold(utterance);
    text::clauses(&folded)
        .into_iter()
        .map(|raw| Clause {
            negated: raw.iter().any(|token| is_negator(token)),
            tokens: raw
                .into_iter()
                .filter(|token| !is_stop_word(token))
                .map(|token| normalizer.reduce(token).into_owned())
                .collect(),
        })
        .filter(|clause| !clause.tokens.is_empty())
        .collect()
}

struct Phrase<'a> {
    code: &'a str,
    tokens: Vec<String>,
    mode: MatchMode,
}

fn code_phrases<'a, N: Normalizer + ?Sized>(
    normalizer: &N,
    vocabulary: &'a Vocabulary,
) -> Vec<Phrase<'a>> {
    let mut phrases = Vec::new();
    for entry in vocabulary.codes().iter().filter(|entry| !entry.is_no_findings()) {
        let loose = entry.synonyms.iter().map(|s| (s, vocabulary.match_mode()));
        let exact = entry.exact_synonyms.iter().map(|s| (s, MatchMode::Exact));
        for (synonym, mode) in loose.chain(exact) {
            let tokens = analyze(normalizer, synonym);
            if !tokens.is_empty() {
                phrases.push(Phrase {
                    code: entry.code.as_str(),
                    tokens,
                    mode,
                });
            }
        }
    }
    phrases
}

fn phrase_at(tokens: &[String], phrase: &[String], at: usize, mode: MatchMode) -> bool {
    if phrase.is_empty() || at + phrase.len() > tokens.len() {
        return false;
    }
    phrase
        .iter()
        .zip(&tokens[at..])
        .all(|(wanted, token)| mode.token_matches(token, wanted))
}

/// Leftmost-longest scan: the longest phrase matching at a position consumes its tokens.
fn scan(tokens: &[String], phrases: &[Phrase<'_>]) -> CodeSet {
    let mut found = CodeSet::new();
    let mut at = 0;
    while at < tokens.len() {
        let hits: Vec<&Phrase<'_>> = phrases
            .iter()
            .filter(|phrase| phrase_at(tokens, &phrase.tokens, at, phrase.mode))
            .collect();
        let Some(longest) = hits.iter().map(|phrase| phrase.tokens.len()).max() else {
            at += 1;
            continue;
        };
        for phrase in hits.iter().filter(|phrase| phrase.tokens.len() == longest) {
            found.insert(phrase.code);
        }
        at += longest;
    }
    found
}

pub(super) fn match_text<N: Normalizer + ?Sized>(
    normalizer: &N,
    vocabulary: &Vocabulary,
    utterance: &str,
) -> NormalizeOutcome {
    let clauses = analyze_clauses(normalizer, utterance);
    if clauses.is_empty() {
        return NormalizeOutcome::NoMatch;
    }
    let phrases = code_phrases(normalizer, vocabulary);

    let Some(none) = vocabulary.none_entry() else {
        let mut found = CodeSet::new();
        for clause in &clauses {
            for code in scan(&clause.tokens, &phrases).iter() {
                found.insert(code);
            }
        }
        return vocabulary.resolve(found);
    };

    // None phrases always match exactly and win inside their clause. A negated
    // clause naming a finding ("sem dor", "febre nao") also reports nothing.
    let none_phrases: Vec<Vec<String>> = none
        .synonyms
        .iter()
        .map(|synonym| analyze(normalizer, synonym))
        .collect();
    let mut positives = CodeSet::new();
    let mut nothing_reported = false;
    for clause in &clauses {
        let codes = scan(&clause.tokens, &phrases);
        let says_none = (0..clause.tokens.len()).any(|at| {
            none_phrases
                .iter()
                .any(|phrase| phrase_at(&clause.tokens, phrase, at, MatchMode::Exact))
        });
        if says_none || (clause.negated && !codes.is_empty()) {
            nothing_reported = true;
        } else {
            for code in codes.iter() {
                positives.insert(code);
            }
        }
    }
    if positives.is_empty() && nothing_reported {
        return NormalizeOutcome::Matched(CodeSet::single(none.code.clone()));
    }
    vocabulary.resolve(positives)
}
