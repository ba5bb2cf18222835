// Matching engine: vocabulary, term extraction, coverage scoring,
// classification, record persistence and the HTTP handlers on top.

pub mod engine;
pub mod extractor;
pub mod handlers;
pub mod scoring;
pub mod store;
pub mod vocabulary;
