//! Skill vocabulary — the fixed set of terms the extractor recognizes.

use std::collections::BTreeSet;

use thiserror::Error;

/// Terms recognized when no `SKILL_VOCABULARY` override is configured.
pub const DEFAULT_TERMS: &[&str] = &[
    "python",
    "java",
    "flask",
    "django",
    "kotlin",
    "rest",
    "api",
    "rest api",
    "android",
    "sql",
    "aws",
    "docker",
    "machine learning",
    "data science",
];

#[derive(Debug, Error, PartialEq)]
pub enum VocabularyError {
    #[error("vocabulary must contain at least one non-blank term")]
    Empty,
}

/// Immutable set of lowercase skill terms. Terms may span several words.
#[derive(Debug, Clone, PartialEq)]
pub struct SkillVocabulary {
    terms: BTreeSet<String>,
}

impl SkillVocabulary {
    /// Builds a vocabulary from raw terms: trimmed, lowercased, blanks dropped, duplicates collapsed.
    pub fn from_terms<I, S>(terms: I) -> Result<Self, VocabularyError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let terms: BTreeSet<String> = terms
            .into_iter()
            .map(|t| t.as_ref().trim().to_lowercase())
            .filter(|t| !t.is_empty())
            .collect();

        if terms.is_empty() {
            return Err(VocabularyError::Empty);
        }
        Ok(Self { terms })
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.terms.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }
}

impl Default for SkillVocabulary {
    fn default() -> Self {
        Self {
            terms: DEFAULT_TERMS.iter().map(|t| t.to_string()).collect(),
        }
    }
}
