// [apps/edge/src/handlers/mod.rs]
pub mod alerts;
pub mod livemap;
pub mod simulation;
pub mod sos;
pub mod websocket;
