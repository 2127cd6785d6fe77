// [libs/infra/store/src/lib.rs]
/*!
 * =================================================================
 * APARATO: GRID PERSISTENCE LAYER (V1.0)
 * CLASIFICACIÓN: INFRASTRUCTURE LAYER (ESTRATO L3)
 * RESPONSABILIDAD: ENLACE ÚNICO HACIA EL SUSTRATO LIBSQL
 *
 * Cada repositorio envuelve un `StoreClient` clonado — el propio cliente
 * mantiene el `Arc<Database>` compartido, así que clonarlo es barato y
 * cada repositorio obtiene su propia conexión por operación en lugar de
 * competir por un mutex.
 * =================================================================
 */

pub mod client;
pub mod errors;
pub mod mapping;
pub mod repositories;
mod schema;

pub use client::StoreClient;
pub use errors::StoreError;
pub use repositories::{
    AlertRepository, FacilityRepository, GeoEventRepository, IntelChannelRepository,
    IntelMessageRepository, PatientRepository, SosRepository,
};
