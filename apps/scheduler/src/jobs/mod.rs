// [apps/scheduler/src/jobs/mod.rs]
pub mod geo_event_gc;
