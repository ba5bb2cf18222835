use std::sync::Arc;

use crate::config::Config;
use crate::documents::DocumentTextProvider;
use crate::matching::engine::MatchEngine;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    /// Owns the vocabulary, the record store and the notifier.
    pub engine: Arc<MatchEngine>,
    /// Extractor for PDF uploads. Plain-text uploads bypass it.
    pub documents: Arc<dyn DocumentTextProvider>,
}
