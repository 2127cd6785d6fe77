// [libs/infra/store/src/repositories/mod.rs]
//! One repository per root entity (SPEC_FULL.md §3); every repository
//! wraps a cloned `StoreClient` handle rather than a raw connection so
//! callers never see libsql directly.

pub mod alert;
pub mod facility;
pub mod geo_event;
pub mod intel_channel;
pub mod intel_message;
pub mod patient;
pub mod sos;

pub use alert::AlertRepository;
pub use facility::FacilityRepository;
pub use geo_event::GeoEventRepository;
pub use intel_channel::IntelChannelRepository;
pub use intel_message::IntelMessageRepository;
pub use patient::PatientRepository;
pub use sos::SosRepository;
