// [apps/worker/src/services/mod.rs]
pub mod alert_engine;
pub mod intel_pipeline;
pub mod resolution_watcher;
pub mod triage_orchestrator;
pub mod verification_loop;
