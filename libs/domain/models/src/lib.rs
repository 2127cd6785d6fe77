// [libs/domain/models/src/lib.rs]
/*!
 * =================================================================
 * APARATO: GRID DOMAIN MODELS (V1.0)
 * CLASIFICACIÓN: DOMAIN CORE (ESTRATO L2)
 * RESPONSABILIDAD: TIPOS DE DATOS RAÍZ Y SUS INVARIANTES PUROS
 *
 * Toda referencia entre entidades es por id (almacenamiento tipo
 * arena); ningún tipo aquí mantiene un puntero hacia atrás en
 * memoria. Los enums de cable son tipos suma cerrados: un valor
 * desconocido falla en el borde de deserialización, nunca se
 * propaga como texto libre.
 * =================================================================
 */

pub mod alert;
pub mod enums;
pub mod facility;
pub mod geo_event;
pub mod intel;
pub mod patient;
pub mod sos;

pub mod prelude {
    pub use crate::alert::Alert;
    pub use crate::enums::*;
    pub use crate::facility::{Facility, FacilityCapacity};
    pub use crate::geo_event::{GeoCluster, GeoEvent};
    pub use crate::intel::{IntelChannel, IntelMessage, VerificationNote};
    pub use crate::patient::{MedicalRecord, Patient};
    pub use crate::sos::SosRequest;
}
