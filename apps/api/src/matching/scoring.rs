//! Coverage scoring and threshold classification.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Fraction of job-side terms also present on the candidate side.
///
/// Asymmetric: extra candidate terms neither help nor hurt. An empty job side
/// scores 0.0, since a job with no recognizable requirements cannot be matched.
pub fn coverage_score(job_terms: &BTreeSet<String>, candidate_terms: &BTreeSet<String>) -> f64 {
    if job_terms.is_empty() {
        return 0.0;
    }
    let matched = job_terms.intersection(candidate_terms).count();
    matched as f64 / job_terms.len() as f64
}

/// Binary outcome of a match. Stored as its variant name in a TEXT column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
pub enum MatchStatus {
    Shortlisted,
    Rejected,
}

impl MatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchStatus::Shortlisted => "Shortlisted",
            MatchStatus::Rejected => "Rejected",
        }
    }

    /// Human-readable explanation returned alongside the status.
    pub fn message(&self) -> &'static str {
        match self {
            MatchStatus::Shortlisted => "Candidate qualified for interview",
            MatchStatus::Rejected => "Below threshold score",
        }
    }

    pub fn is_shortlisted(&self) -> bool {
        matches!(self, MatchStatus::Shortlisted)
    }
}

impl fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shortlisted iff `score >= threshold`; the boundary counts as a pass.
pub fn classify(score: f64, threshold: f64) -> MatchStatus {
    if score >= threshold {
        MatchStatus::Shortlisted
    } else {
        MatchStatus::Rejected
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(terms: &[&str]) -> BTreeSet<String> {
        terms.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn test_half_coverage() {
        let score = coverage_score(&set(&["python", "sql"]), &set(&["python"]));
        assert!((score - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_identical_sets_score_one() {
        let s = set(&["docker", "aws", "kotlin"]);
        assert_eq!(coverage_score(&s, &s), 1.0);
    }

    #[test]
    fn test_empty_job_side_scores_zero() {
        assert_eq!(coverage_score(&set(&[]), &set(&["python"])), 0.0);
        assert_eq!(coverage_score(&set(&[]), &set(&[])), 0.0);
    }

    #[test]
    fn test_extra_candidate_terms_do_not_change_score() {
        let job = set(&["python", "sql"]);
        let narrow = coverage_score(&job, &set(&["python"]));
        let wide = coverage_score(&job, &set(&["python", "java", "docker", "aws"]));
        assert_eq!(narrow, wide);
    }

    #[test]
    fn test_score_is_bounded() {
        let cases = [
            (set(&["a"]), set(&[])),
            (set(&["a", "b", "c"]), set(&["b"])),
            (set(&["a"]), set(&["a", "b", "c"])),
        ];
        for (job, candidate) in &cases {
            let score = coverage_score(job, candidate);
            assert!((0.0..=1.0).contains(&score), "Score was {score}");
        }
    }

    #[test]
    fn test_boundary_is_shortlisted() {
        assert_eq!(classify(0.7, 0.7), MatchStatus::Shortlisted);
    }

    #[test]
    fn test_just_below_boundary_is_rejected() {
        assert_eq!(classify(0.69999, 0.7), MatchStatus::Rejected);
    }

    #[test]
    fn test_classify_is_monotonic_in_score() {
        let threshold = 0.6;
        let mut seen_shortlisted = false;
        for step in 0..=100 {
            let status = classify(step as f64 / 100.0, threshold);
            if seen_shortlisted {
                assert_eq!(status, MatchStatus::Shortlisted);
            }
            seen_shortlisted |= status.is_shortlisted();
        }
        assert!(seen_shortlisted);
    }

    #[test]
    fn test_messages() {
        assert_eq!(
            MatchStatus::Shortlisted.message(),
            "Candidate qualified for interview"
        );
        assert_eq!(MatchStatus::Rejected.message(), "Below threshold score");
    }

    #[test]
    fn test_status_serializes_as_label() {
        let json = serde_json::to_string(&MatchStatus::Rejected).unwrap();
        assert_eq!(json, r#""Rejected""#);
        assert_eq!(MatchStatus::Shortlisted.to_string(), "Shortlisted");
    }
}
