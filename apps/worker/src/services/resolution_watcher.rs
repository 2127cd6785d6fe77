// [apps/worker/src/services/resolution_watcher.rs]
/*!
 * APARATO: RESOLUTION WATCHER (§4.7)
 * RESPONSABILIDAD: CIERRE AUTOMÁTICO DE SOS CUANDO EL PACIENTE LLEGA A
 *                   UNA INSTALACIÓN OPERACIONAL
 *
 * Conceptualmente disparado por cada actualización de ubicación del
 * paciente; en este despliegue de un único broker en proceso, un
 * barrido corto sobre todos los pacientes activos logra el mismo
 * efecto sin depender de que el productor del evento de ubicación
 * comparta el mismo proceso que este watcher.
 */

use crate::state::WorkerState;
use pulsegrid_domain_geo::{geodesic_distance_m, HOSPITAL_ORIGIN_RADIUS_M};
use pulsegrid_domain_models::prelude::*;
use pulsegrid_infra_bus::envelope::{rooms, BusEnvelope};
use pulsegrid_infra_bus::Broker;
use pulsegrid_infra_store::StoreError;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, instrument};

const SWEEP_INTERVAL_SECS: u64 = 30;
const TRUST_SCORE_FLOOR: f64 = 0.3;

pub struct ResolutionWatcher {
    state: Arc<WorkerState>,
}

impl ResolutionWatcher {
    pub fn new(state: Arc<WorkerState>) -> Self {
        Self { state }
    }

    pub fn spawn_daemon(self: Arc<Self>) {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(Duration::from_secs(SWEEP_INTERVAL_SECS));
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                if let Err(error) = self.sweep().await {
                    error!(%error, "⚠️ [RESOLUTION_WATCHER]: sweep failed");
                }
            }
        });
    }

    #[instrument(skip(self))]
    async fn sweep(&self) -> Result<(), StoreError> {
        let patients = self.state.patients.find_active_with_location().await?;
        for patient in patients {
            check_resolution_on_location_update(&self.state, patient.id).await?;
        }
        Ok(())
    }
}

#[instrument(skip(state))]
pub async fn check_resolution_on_location_update(state: &WorkerState, patient_id: uuid::Uuid) -> Result<(), StoreError> {
    let Some(patient) = state.patients.find_by_id(patient_id).await? else { return Ok(()) };
    let Some(location) = patient.location() else { return Ok(()) };

    if patient.trust_score < TRUST_SCORE_FLOOR {
        return Ok(());
    }

    let active_requests = state.sos_requests.find_active_for_patient(patient_id).await?;
    if active_requests.is_empty() {
        return Ok(());
    }

    let facilities = state.facilities.find_all().await?;

    for sos in active_requests {
        let candidate = facilities
            .iter()
            .filter(|facility| within_operational_radius(facility, location, sos.origin_facility_id))
            .min_by(|a, b| {
                geodesic_distance_m(a.location(), location)
                    .total_cmp(&geodesic_distance_m(b.location(), location))
            });

        let Some(facility) = candidate else { continue };

        let resolved_at = chrono::Utc::now();
        state.sos_requests.resolve(sos.id, resolved_at, true).await?;

        state.broker.publish(
            rooms::ALERTS,
            BusEnvelope::SosResolved {
                sos_id: sos.id,
                patient_id,
                latitude: patient.latitude,
                longitude: patient.longitude,
                hospital_id: facility.id,
                hospital_name: facility.name.clone(),
                origin_hospital_id: sos.origin_facility_id,
                resolved_at,
                auto_resolved: true,
            },
        );

        info!(sos_id = %sos.id, facility_id = %facility.id, "✅ [RESOLUTION_WATCHER]: sos auto-resolved");
    }

    Ok(())
}

/// A facility resolves the SOS if the patient is within its operational radius —
/// except when the facility itself is under attack (`origin_facility_id` match),
/// in which case arriving there does not count as resolution.
fn within_operational_radius(facility: &Facility, location: (f64, f64), origin_facility_id: Option<uuid::Uuid>) -> bool {
    if !facility.is_operational() {
        return false;
    }
    if origin_facility_id == Some(facility.id) {
        return false;
    }
    geodesic_distance_m(facility.location(), location) <= HOSPITAL_ORIGIN_RADIUS_M
}

#[cfg(test)]
mod tests {
    use super::*;
    use pulsegrid_domain_models::enums::FacilityStatus;
    use uuid::Uuid;

    fn facility(status: FacilityStatus, latitude: f64, longitude: f64) -> Facility {
        Facility {
            id: Uuid::new_v4(),
            name: "Test Facility".to_string(),
            phone: None,
            latitude,
            longitude,
            coverage_radius_m: 500,
            department: Department::Hospital,
            status,
            capacity: None,
        }
    }

    #[test]
    fn rejects_non_operational_facilities() {
        let nearby = facility(FacilityStatus::Destroyed, 31.5, 34.46);
        assert!(!within_operational_radius(&nearby, (31.5, 34.46), None));
    }

    #[test]
    fn rejects_facilities_outside_the_radius() {
        let far = facility(FacilityStatus::Operational, 32.5, 35.46);
        assert!(!within_operational_radius(&far, (31.5, 34.46), None));
    }

    #[test]
    fn accepts_an_operational_facility_within_radius() {
        let near = facility(FacilityStatus::Operational, 31.5, 34.46);
        assert!(within_operational_radius(&near, (31.5, 34.46), None));
    }

    #[test]
    fn excludes_the_origin_facility_even_when_operational_and_nearby() {
        let origin = facility(FacilityStatus::Operational, 31.5, 34.46);
        assert!(!within_operational_radius(&origin, (31.5, 34.46), Some(origin.id)));
    }
}
