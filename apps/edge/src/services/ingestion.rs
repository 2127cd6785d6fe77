// [apps/edge/src/services/ingestion.rs]
/*!
 * APARATO: INGESTION ROUTER — SHARED POST-CREATION PIPELINE
 * RESPONSABILIDAD: PASOS COMUNES A LAS CINCO FUENTES DE SOS (§4.1)
 *
 * Cada fuente (api/sms/mesh/sync) construye su propio `SosRequest` y
 * llama a `run_common_post_creation`; cada paso se registra por separado
 * y un fallo en un paso nunca aborta los siguientes.
 */

use crate::state::AppState;
use pulsegrid_domain_geo::{geodesic_distance_m, HOSPITAL_ORIGIN_RADIUS_M};
use pulsegrid_infra_bus::envelope::{rooms, BusEnvelope};
use pulsegrid_infra_bus::Broker;
use pulsegrid_domain_models::prelude::*;
use tracing::{instrument, warn};
use uuid::Uuid;

/// Runs the four common post-creation steps from §4.1, in order, logging
/// but never propagating a failure from one step to block the next.
#[instrument(skip(state, sos))]
pub async fn run_common_post_creation(state: &AppState, sos: &SosRequest) {
    let origin_facility_id = match resolve_origin_facility(state, sos).await {
        Ok(id) => id,
        Err(e) => {
            warn!("⚠️ [INGEST_STEP_1]: origin facility lookup failed: {}", e);
            None
        }
    };

    if let Some(facility_id) = origin_facility_id {
        if let Err(e) = state.sos_requests.set_origin_facility(sos.id, facility_id).await {
            warn!("⚠️ [INGEST_STEP_1]: could not persist origin_facility_id: {}", e);
        }
    }

    if let Err(e) = increment_patient_sos_count(state, sos.patient_id).await {
        warn!("⚠️ [INGEST_STEP_2]: patient SOS counter increment failed: {}", e);
    }

    publish_new_sos(state, sos);
}

async fn resolve_origin_facility(state: &AppState, sos: &SosRequest) -> anyhow::Result<Option<Uuid>> {
    let Some(location) = sos.location() else {
        return Ok(None);
    };
    let facilities = state.facilities.find_all().await?;
    let nearest = facilities
        .into_iter()
        .map(|f| (f.id, geodesic_distance_m(location, f.location())))
        .filter(|(_, distance)| *distance <= HOSPITAL_ORIGIN_RADIUS_M)
        .min_by(|a, b| a.1.total_cmp(&b.1));
    Ok(nearest.map(|(id, _)| id))
}

async fn increment_patient_sos_count(state: &AppState, patient_id: Uuid) -> anyhow::Result<()> {
    let Some(mut patient) = state.patients.find_by_id(patient_id).await? else {
        return Ok(());
    };
    patient.total_sos_count += 1;
    patient.recompute_trust_score();
    state.patients.upsert(&patient).await?;
    Ok(())
}

/// Publishes the SOS envelope to `alerts` and a co-emitted `map_event` to
/// `livemap` (layer=sos), per §4.1 step 3 and §4.5's co-emission rule.
#[instrument(skip(state, sos))]
pub fn publish_new_sos(state: &AppState, sos: &SosRequest) {
    state.broker.publish(
        rooms::ALERTS,
        BusEnvelope::NewSos {
            id: sos.id,
            patient_id: sos.patient_id,
            latitude: sos.latitude,
            longitude: sos.longitude,
            status: sos.status,
            patient_status: sos.patient_status,
            severity: sos.severity,
            source: sos.source,
            details: sos.details.clone(),
            created_at: sos.created_at,
            patient_info: None,
        },
    );

    if let Some((lat, lon)) = sos.location() {
        let now = sos.created_at;
        state.broker.publish(
            rooms::LIVEMAP,
            BusEnvelope::MapEvent {
                id: sos.id,
                event_type: "sos".to_string(),
                latitude: lat,
                longitude: lon,
                source: GeoEventSource::Sos,
                severity: sos.severity.clamp(1, 5),
                title: format!("SOS — {:?}", sos.patient_status),
                details: sos.details.clone(),
                layer: Layer::Sos,
                metadata: serde_json::json!({ "sos_id": sos.id }),
                created_at: now,
                expires_at: now + chrono::Duration::hours(24),
            },
        );
    }
}
