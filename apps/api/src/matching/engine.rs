//! Match Engine — the end-to-end scoring operation.
//!
//! Pipeline: validate → extract (both sides) → score → classify → persist → notify.
//! Only validation and persistence can fail. Notification runs after the
//! record is durable and its outcome never reaches the caller.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::matching::extractor::extract_terms;
use crate::matching::scoring::{classify, coverage_score, MatchStatus};
use crate::matching::store::{MatchStore, NewMatchRecord, StoreError};
use crate::matching::vocabulary::SkillVocabulary;
use crate::notify::Notifier;

pub const NOTIFY_SUBJECT: &str = "Interview Invitation";

#[derive(Debug, Error)]
pub enum MatchError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("failed to persist match record: {0}")]
    Persistence(#[from] StoreError),
}

/// Result surface of a match, serialized as the HTTP response body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchOutcome {
    pub status: MatchStatus,
    pub score: f64,
    pub message: String,
    pub match_id: i64,
}

/// Where and how shortlist notifications are delivered.
#[derive(Clone)]
pub struct NotificationSettings {
    pub notifier: Arc<dyn Notifier>,
    pub recipient: String,
    pub timeout: Duration,
}

pub struct MatchEngine {
    vocabulary: SkillVocabulary,
    store: Arc<dyn MatchStore>,
    notifications: NotificationSettings,
}

impl MatchEngine {
    pub fn new(
        vocabulary: SkillVocabulary,
        store: Arc<dyn MatchStore>,
        notifications: NotificationSettings,
    ) -> Self {
        Self {
            vocabulary,
            store,
            notifications,
        }
    }

    pub fn store(&self) -> &Arc<dyn MatchStore> {
        &self.store
    }

    /// Scores `cv_text` against `jd_text`, persists the outcome and returns it.
    pub async fn perform_match(
        &self,
        jd_text: &str,
        cv_text: &str,
        threshold: f64,
    ) -> Result<MatchOutcome, MatchError> {
        validate_threshold(threshold)?;
        if jd_text.trim().is_empty() {
            return Err(MatchError::InvalidInput("jd_text cannot be empty".to_string()));
        }
        if cv_text.trim().is_empty() {
            return Err(MatchError::InvalidInput("cv_text cannot be empty".to_string()));
        }

        let jd_terms = extract_terms(jd_text, &self.vocabulary);
        let cv_terms = extract_terms(cv_text, &self.vocabulary);
        let score = coverage_score(&jd_terms, &cv_terms);
        let status = classify(score, threshold);

        let record = self
            .store
            .append(NewMatchRecord {
                jd_text: jd_text.to_string(),
                cv_text: cv_text.to_string(),
                score,
                status,
                threshold,
            })
            .await?;

        info!(
            "Match {} scored {:.2} against threshold {:.2}: {} ({}/{} job terms covered)",
            record.id,
            score,
            threshold,
            status,
            jd_terms.intersection(&cv_terms).count(),
            jd_terms.len()
        );

        if status.is_shortlisted() {
            self.dispatch_notification(record.id, score);
        }

        Ok(MatchOutcome {
            status,
            score,
            message: status.message().to_string(),
            match_id: record.id,
        })
    }

    /// Fire-and-forget: the spawned task owns its own handles and never holds the store.
    fn dispatch_notification(&self, match_id: i64, score: f64) {
        let NotificationSettings {
            notifier,
            recipient,
            timeout,
        } = self.notifications.clone();
        let body = format!("Your application scored {score:.2} and has been shortlisted!");

        tokio::spawn(async move {
            let result =
                tokio::time::timeout(timeout, notifier.notify(&recipient, NOTIFY_SUBJECT, &body))
                    .await;
            match result {
                Ok(Ok(())) => info!("Sent shortlist notification for match {match_id}"),
                Ok(Err(e)) => warn!("Notification for match {match_id} failed: {e}"),
                Err(_) => warn!(
                    "Notification for match {match_id} timed out after {}s",
                    timeout.as_secs()
                ),
            }
        });
    }
}

fn validate_threshold(threshold: f64) -> Result<(), MatchError> {
    if threshold.is_finite() && (0.0..=1.0).contains(&threshold) {
        Ok(())
    } else {
        Err(MatchError::InvalidInput(format!(
            "threshold must be between 0.0 and 1.0, got {threshold}"
        )))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use tokio::sync::mpsc;

    use super::*;
    use crate::db::memory_pool;
    use crate::matching::store::{InMemoryMatchStore, SqliteMatchStore};
    use crate::notify::{LogNotifier, NotifyError};

    /// Forwards every notification to a channel so tests can await delivery.
    struct RecordingNotifier(mpsc::UnboundedSender<(String, String, String)>);

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn notify(&self, recipient: &str, subject: &str, body: &str) -> Result<(), NotifyError> {
            let _ = self
                .0
                .send((recipient.to_string(), subject.to_string(), body.to_string()));
            Ok(())
        }
    }

    /// Always fails, after signalling that it was invoked.
    struct FailingNotifier(mpsc::UnboundedSender<()>);

    #[async_trait]
    impl Notifier for FailingNotifier {
        async fn notify(&self, _: &str, _: &str, _: &str) -> Result<(), NotifyError> {
            let _ = self.0.send(());
            Err(NotifyError::Rejected {
                status: 503,
                message: "mail relay down".to_string(),
            })
        }
    }

    fn settings(notifier: Arc<dyn Notifier>) -> NotificationSettings {
        NotificationSettings {
            notifier,
            recipient: "candidate@example.com".to_string(),
            timeout: Duration::from_secs(5),
        }
    }

    fn python_sql_vocab() -> SkillVocabulary {
        SkillVocabulary::from_terms(["python", "sql"]).unwrap()
    }

    fn engine_with(notifier: Arc<dyn Notifier>) -> MatchEngine {
        MatchEngine::new(
            python_sql_vocab(),
            Arc::new(InMemoryMatchStore::new()),
            settings(notifier),
        )
    }

    #[tokio::test]
    async fn test_half_coverage_is_rejected_above_half_threshold() {
        let engine = engine_with(Arc::new(LogNotifier));
        let outcome = engine
            .perform_match("Need Python and SQL skills", "I know Python", 0.7)
            .await
            .unwrap();

        assert!((outcome.score - 0.5).abs() < f64::EPSILON);
        assert_eq!(outcome.status, MatchStatus::Rejected);
        assert_eq!(outcome.message, "Below threshold score");
        assert_eq!(outcome.match_id, 1);
    }

    #[tokio::test]
    async fn test_half_coverage_meets_half_threshold() {
        let engine = engine_with(Arc::new(LogNotifier));
        let outcome = engine
            .perform_match("Need Python and SQL skills", "I know Python", 0.5)
            .await
            .unwrap();
        assert_eq!(outcome.status, MatchStatus::Shortlisted);
        assert_eq!(outcome.message, "Candidate qualified for interview");
    }

    #[tokio::test]
    async fn test_blank_jd_is_invalid_and_not_persisted() {
        let engine = engine_with(Arc::new(LogNotifier));
        let err = engine
            .perform_match("   \n\t", "I know Python", 0.5)
            .await
            .unwrap_err();

        assert!(matches!(err, MatchError::InvalidInput(ref m) if m.contains("jd_text")));
        assert_eq!(engine.store().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_blank_cv_is_invalid_and_not_persisted() {
        let engine = engine_with(Arc::new(LogNotifier));
        let err = engine.perform_match("Python", "", 0.5).await.unwrap_err();
        assert!(matches!(err, MatchError::InvalidInput(ref m) if m.contains("cv_text")));
        assert_eq!(engine.store().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_out_of_range_threshold_is_invalid() {
        let engine = engine_with(Arc::new(LogNotifier));
        for threshold in [-0.1, 1.5, f64::NAN] {
            let err = engine
                .perform_match("Python", "Python", threshold)
                .await
                .unwrap_err();
            assert!(matches!(err, MatchError::InvalidInput(_)));
        }
        assert_eq!(engine.store().count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_jd_without_known_terms_scores_zero() {
        let engine = engine_with(Arc::new(LogNotifier));
        let outcome = engine
            .perform_match("Looking for a friendly barista", "Python and SQL", 0.0)
            .await
            .unwrap();
        assert_eq!(outcome.score, 0.0);
        // Threshold 0.0 still shortlists a zero score: the boundary is inclusive.
        assert_eq!(outcome.status, MatchStatus::Shortlisted);
    }

    #[tokio::test]
    async fn test_persisted_record_matches_outcome() {
        let engine = MatchEngine::new(
            python_sql_vocab(),
            Arc::new(SqliteMatchStore::new(memory_pool().await)),
            settings(Arc::new(LogNotifier)),
        );
        let outcome = engine
            .perform_match("Python, SQL", "Python and SQL daily", 0.8)
            .await
            .unwrap();

        let record = engine
            .store()
            .get(outcome.match_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(record.jd_text, "Python, SQL");
        assert_eq!(record.cv_text, "Python and SQL daily");
        assert_eq!(record.status, MatchStatus::Shortlisted);
        assert_eq!(record.score, 1.0);
        assert!((record.threshold - 0.8).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_shortlisted_match_notifies_recipient() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let engine = engine_with(Arc::new(RecordingNotifier(tx)));

        engine
            .perform_match("Python and SQL", "Python, SQL", 0.5)
            .await
            .unwrap();

        let (to, subject, body) = rx.recv().await.unwrap();
        assert_eq!(to, "candidate@example.com");
        assert_eq!(subject, NOTIFY_SUBJECT);
        assert_eq!(body, "Your application scored 1.00 and has been shortlisted!");
    }

    #[tokio::test]
    async fn test_rejected_match_does_not_notify() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let engine = engine_with(Arc::new(RecordingNotifier(tx)));

        engine
            .perform_match("Python and SQL", "Cooking", 0.5)
            .await
            .unwrap();

        // Drop the engine so the sender's last clone goes away with it.
        drop(engine);
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_notifier_failure_does_not_fail_match() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let engine = engine_with(Arc::new(FailingNotifier(tx)));

        let outcome = engine
            .perform_match("Python and SQL", "Python, SQL", 0.5)
            .await
            .unwrap();

        rx.recv().await.unwrap();
        assert_eq!(outcome.status, MatchStatus::Shortlisted);
        assert_eq!(outcome.match_id, 1);
        assert_eq!(engine.store().count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_closed_store_surfaces_persistence_error() {
        let engine = engine_with(Arc::new(LogNotifier));
        engine.store().close().await;
        let err = engine
            .perform_match("Python", "Python", 0.5)
            .await
            .unwrap_err();
        assert!(matches!(err, MatchError::Persistence(StoreError::Closed)));
    }

    #[tokio::test]
    async fn test_sequential_matches_get_increasing_ids() {
        let engine = engine_with(Arc::new(LogNotifier));
        let mut ids = Vec::new();
        for _ in 0..3 {
            let outcome = engine.perform_match("Python", "SQL", 0.5).await.unwrap();
            ids.push(outcome.match_id);
        }
        assert_eq!(ids, vec![1, 2, 3]);
    }
}
