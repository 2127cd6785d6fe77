// [apps/edge/src/services/mod.rs]
pub mod ingestion;
