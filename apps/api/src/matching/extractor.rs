//! Term extraction — finds which vocabulary terms appear in a document.
//!
//! Matching is plain substring presence on the lowercased text. There is no
//! word-boundary check, so short terms such as "api" also hit inside words
//! like "rapid". Callers relying on exact-word semantics need a different
//! vocabulary, not a different extractor.

use std::collections::BTreeSet;

use crate::matching::vocabulary::SkillVocabulary;

/// Returns the subset of `vocabulary` occurring anywhere in `text`, case-insensitively.
pub fn extract_terms(text: &str, vocabulary: &SkillVocabulary) -> BTreeSet<String> {
    let normalized = text.to_lowercase();
    vocabulary
        .iter()
        .filter(|term| normalized.contains(term))
        .map(String::from)
        .collect()
}
