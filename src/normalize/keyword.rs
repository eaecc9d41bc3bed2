use super::Normalizer;
use std::borrow::Cow;

/// Matches folded surface tokens directly against the synonym table.
///
/// Needs no linguistic resource, so it is always available.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordNormalizer;

impl KeywordNormalizer {
    pub fn new() -> Self {
        Self
    }
}

impl Normalizer for KeywordNormalizer {
    fn strategy(&self) -> &'static str {
        "keyword"
    }

    fn reduce<'a>(&self, token: &'a str) -> Cow<'a, str> {
        Cow::Borrowed(token)
    }
}
