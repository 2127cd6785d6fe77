// [apps/edge/src/handlers/simulation.rs]
/*!
 * APARATO: SIMULATION FAN-OUT (§4.1, fifth source)
 * RESPONSABILIDAD: EMISIÓN MASIVA SIN PERSISTENCIA
 *
 * A diferencia de las otras cuatro fuentes, simulation nunca toca
 * `sos_requests` — es un disparo directo al bus para ejercitar
 * dashboards y entrenamientos sin ensuciar el almacén.
 */

use crate::state::AppState;
use axum::extract::State;
use axum::Json;
use chrono::Utc;
use pulsegrid_domain_models::prelude::*;
use pulsegrid_infra_bus::envelope::{rooms, BusEnvelope};
use pulsegrid_infra_bus::Broker;
use pulsegrid_shared_errors::CoreError;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, instrument, warn};
use uuid::Uuid;

const MAX_SIMULATED_EVENTS: usize = 200;

#[derive(Debug, Deserialize)]
pub struct SimulatedSosEvent {
    pub latitude: f64,
    pub longitude: f64,
    pub patient_status: PatientStatus,
    pub severity: u8,
    pub details: Option<String>,
}

#[instrument(skip(state, events))]
pub async fn emit_simulated_events(
    State(state): State<AppState>,
    Json(events): Json<Vec<SimulatedSosEvent>>,
) -> Result<Json<Value>, CoreError> {
    if events.len() > MAX_SIMULATED_EVENTS {
        return Err(CoreError::InvalidPayload(format!("batch of {} exceeds max {}", events.len(), MAX_SIMULATED_EVENTS)));
    }

    let mut emitted = 0usize;
    for event in events {
        if !(1..=5).contains(&event.severity) {
            warn!(severity = event.severity, "⚠️ [SIMULATION]: skipping event with out-of-range severity");
            continue;
        }

        let id = Uuid::new_v4();
        let now = Utc::now();

        state.broker.publish(
            rooms::ALERTS,
            BusEnvelope::NewSos {
                id,
                patient_id: Uuid::nil(),
                latitude: Some(event.latitude),
                longitude: Some(event.longitude),
                status: SosStatus::Pending,
                patient_status: event.patient_status,
                severity: event.severity,
                source: SosSource::Api,
                details: event.details.clone(),
                created_at: now,
                patient_info: Some(json!({ "simulated": true })),
            },
        );

        state.broker.publish(
            rooms::LIVEMAP,
            BusEnvelope::MapEvent {
                id,
                event_type: "simulated_sos".to_string(),
                latitude: event.latitude,
                longitude: event.longitude,
                source: GeoEventSource::System,
                severity: event.severity,
                title: format!("Simulation — {:?}", event.patient_status),
                details: event.details,
                layer: Layer::Sos,
                metadata: json!({ "simulated": true }),
                created_at: now,
                expires_at: now + chrono::Duration::hours(1),
            },
        );

        emitted += 1;
    }

    info!(emitted, "🎭 [SIMULATION]: bulk fan-out complete");
    Ok(Json(json!({ "emitted": emitted })))
}
