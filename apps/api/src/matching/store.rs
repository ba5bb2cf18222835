//! Match Record Store — append-only persistence for scoring outcomes.
//!
//! `AppState` carries an `Arc<dyn MatchStore>`; the backend is chosen in `main`.
//! Append is the only write. Identity assignment and the insert happen as one
//! atomic step in every backend, so concurrent callers never share an id and
//! readers never observe a half-written record.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

use crate::matching::scoring::MatchStatus;
use crate::models::match_record::MatchRecord;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("match store is closed")]
    Closed,
}

/// Everything needed to persist a record except the store-assigned fields.
#[derive(Debug, Clone)]
pub struct NewMatchRecord {
    pub jd_text: String,
    pub cv_text: String,
    pub score: f64,
    pub status: MatchStatus,
    pub threshold: f64,
}

// ────────────────────────────────────────────────────────────────────────────
// Trait definition
// ────────────────────────────────────────────────────────────────────────────

#[async_trait]
pub trait MatchStore: Send + Sync {
    /// Persists the record, assigning the next id and the creation timestamp.
    async fn append(&self, record: NewMatchRecord) -> Result<MatchRecord, StoreError>;

    async fn get(&self, id: i64) -> Result<Option<MatchRecord>, StoreError>;

    /// Records in ascending id order.
    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<MatchRecord>, StoreError>;

    async fn count(&self) -> Result<i64, StoreError>;

    /// Ends the store's lifecycle. Later calls fail with `StoreError::Closed`.
    async fn close(&self);
}

// ────────────────────────────────────────────────────────────────────────────
// SqliteMatchStore — default backend
// ────────────────────────────────────────────────────────────────────────────

pub struct SqliteMatchStore {
    pool: SqlitePool,
    /// Serializes appends across pooled connections.
    write_gate: Mutex<()>,
}

impl SqliteMatchStore {
    /// Wraps a pool whose schema has already been migrated (see `db::create_pool`).
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            write_gate: Mutex::new(()),
        }
    }

    fn ensure_open(&self) -> Result<(), StoreError> {
        if self.pool.is_closed() {
            return Err(StoreError::Closed);
        }
        Ok(())
    }
}

#[async_trait]
impl MatchStore for SqliteMatchStore {
    async fn append(&self, record: NewMatchRecord) -> Result<MatchRecord, StoreError> {
        self.ensure_open()?;
        let _guard = self.write_gate.lock().await;

        // The transaction commits before we return, so every pooled connection sees the row.
        // created_at is clamped to the latest stored stamp so it never goes backwards.
        let mut tx = self.pool.begin().await?;
        let stored = sqlx::query_as::<_, MatchRecord>(
            r#"
            INSERT INTO matches (jd_text, cv_text, score, status, threshold, created_at)
            VALUES (?, ?, ?, ?, ?, MAX(
                strftime('%Y-%m-%dT%H:%M:%fZ', 'now'),
                COALESCE((SELECT MAX(created_at) FROM matches), '')
            ))
            RETURNING id, jd_text, cv_text, score, status, threshold, created_at
            "#,
        )
        .bind(&record.jd_text)
        .bind(&record.cv_text)
        .bind(record.score)
        .bind(record.status)
        .bind(record.threshold)
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;

        debug!(
            "Appended match {} ({}, score {:.2})",
            stored.id, stored.status, stored.score
        );
        Ok(stored)
    }

    async fn get(&self, id: i64) -> Result<Option<MatchRecord>, StoreError> {
        self.ensure_open()?;
        let record = sqlx::query_as::<_, MatchRecord>("SELECT * FROM matches WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(record)
    }

    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<MatchRecord>, StoreError> {
        self.ensure_open()?;
        let records = sqlx::query_as::<_, MatchRecord>(
            "SELECT * FROM matches ORDER BY id ASC LIMIT ? OFFSET ?",
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;
        Ok(records)
    }

    async fn count(&self) -> Result<i64, StoreError> {
        self.ensure_open()?;
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM matches")
            .fetch_one(&self.pool)
            .await?;
        Ok(total)
    }

    async fn close(&self) {
        self.pool.close().await;
        info!("SQLite match store closed");
    }
}

// ────────────────────────────────────────────────────────────────────────────
// InMemoryMatchStore — volatile backend
// ────────────────────────────────────────────────────────────────────────────

#[derive(Default)]
struct MemoryState {
    last_id: i64,
    records: Vec<MatchRecord>,
    closed: bool,
}

/// Volatile store for `DATABASE_URL=memory`. Ids restart at 1 with each process.
#[derive(Default)]
pub struct InMemoryMatchStore {
    state: RwLock<MemoryState>,
}

impl InMemoryMatchStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MatchStore for InMemoryMatchStore {
    async fn append(&self, record: NewMatchRecord) -> Result<MatchRecord, StoreError> {
        let mut state = self.state.write().await;
        if state.closed {
            return Err(StoreError::Closed);
        }

        // Clamp against the previous record so a clock step backwards cannot reorder timestamps.
        let now = Utc::now();
        let created_at = match state.records.last() {
            Some(prev) if prev.created_at > now => prev.created_at,
            _ => now,
        };

        state.last_id += 1;
        let stored = MatchRecord {
            id: state.last_id,
            jd_text: record.jd_text,
            cv_text: record.cv_text,
            score: record.score,
            status: record.status,
            threshold: record.threshold,
            created_at,
        };
        state.records.push(stored.clone());
        Ok(stored)
    }

    async fn get(&self, id: i64) -> Result<Option<MatchRecord>, StoreError> {
        let state = self.state.read().await;
        if state.closed {
            return Err(StoreError::Closed);
        }
        // Ids are dense from 1 and never removed, so the id doubles as an index.
        let record = id
            .checked_sub(1)
            .and_then(|idx| usize::try_from(idx).ok())
            .and_then(|idx| state.records.get(idx))
            .cloned();
        Ok(record)
    }

    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<MatchRecord>, StoreError> {
        let state = self.state.read().await;
        if state.closed {
            return Err(StoreError::Closed);
        }
        let records = state
            .records
            .iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .cloned()
            .collect();
        Ok(records)
    }

    async fn count(&self) -> Result<i64, StoreError> {
        let state = self.state.read().await;
        if state.closed {
            return Err(StoreError::Closed);
        }
        Ok(state.records.len() as i64)
    }

    async fn close(&self) {
        self.state.write().await.closed = true;
        info!("In-memory match store closed");
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
