// [apps/worker/src/services/alert_engine.rs]
/*!
 * APARATO: ALERT ENGINE (§4.3)
 * RESPONSABILIDAD: PERSISTENCIA, CÓMPUTO DE PACIENTES AFECTADOS Y EMISIÓN
 *
 * Punto de entrada compartido por el Triage Orchestrator y el Intel
 * Pipeline — ambos producen un `Alert` completo y se lo pasan a
 * `create_and_emit_alert`, que es la única vía de escritura a la
 * tabla `alerts`.
 */

use crate::state::WorkerState;
use chrono::Utc;
use pulsegrid_domain_geo::geodesic_distance_m;
use pulsegrid_domain_models::prelude::*;
use pulsegrid_infra_bus::envelope::{rooms, BusEnvelope};
use pulsegrid_infra_bus::Broker;
use pulsegrid_infra_store::StoreError;
use serde_json::Value;
use tracing::{info, instrument};
use uuid::Uuid;

pub struct NewAlertSpec {
    pub event_type: EventType,
    pub severity: Severity,
    pub latitude: f64,
    pub longitude: f64,
    pub radius_m: Option<u32>,
    pub source: String,
    pub confidence: f64,
    pub metadata: Value,
    pub routed_department: Option<Department>,
    pub target_facility_id: Option<Uuid>,
}

/// An [`Alert`] plus the two patient lists its creation computed: every affected
/// patient within `radius_m`, and the vulnerable subset of that same list
/// (mobility-impaired or living alone) — both ascending by distance.
pub struct AlertCreation {
    pub alert: Alert,
    pub affected_patients: Vec<Patient>,
    pub vulnerable_patients: Vec<Patient>,
}

#[instrument(skip(state, spec))]
pub async fn create_and_emit_alert(state: &WorkerState, spec: NewAlertSpec) -> Result<AlertCreation, StoreError> {
    let radius_m = spec.radius_m.unwrap_or(Alert::DEFAULT_RADIUS_M);
    let center = (spec.latitude, spec.longitude);

    let affected = find_affected_patients(state, center, radius_m as f64).await?;
    let vulnerable: Vec<Patient> = affected.iter().filter(|patient| patient.is_vulnerable()).cloned().collect();

    let alert = Alert {
        id: Uuid::new_v4(),
        event_type: spec.event_type,
        severity: spec.severity,
        latitude: spec.latitude,
        longitude: spec.longitude,
        radius_m,
        source: spec.source,
        confidence: spec.confidence,
        metadata: spec.metadata,
        routed_department: spec.routed_department,
        target_facility_id: spec.target_facility_id,
        acknowledged_by: None,
        reported_false: false,
        affected_patients_count: affected.len() as u32,
        created_at: Utc::now(),
        expires_at: Utc::now() + chrono::Duration::hours(Alert::DEFAULT_TTL_HOURS),
    };

    state.alerts.insert(&alert).await?;

    let geo_event = GeoEvent {
        id: Uuid::new_v4(),
        event_type: format!("{:?}", alert.event_type),
        source: match alert.source.as_str() {
            "telegram" => GeoEventSource::Telegram,
            "sos" => GeoEventSource::Sos,
            _ => GeoEventSource::System,
        },
        severity: alert.severity.as_int_scale(),
        layer: Layer::Crisis,
        latitude: alert.latitude,
        longitude: alert.longitude,
        title: format!("{:?} — {:?}", alert.event_type, alert.severity),
        details: None,
        metadata: alert.metadata.clone(),
        created_at: alert.created_at,
        expires_at: alert.expires_at,
    };
    state.geo_events.insert(&geo_event).await?;

    emit_alert(state, &alert, &geo_event, &affected);

    info!(alert_id = %alert.id, affected = affected.len(), vulnerable = vulnerable.len(), "🚨 [ALERT_ENGINE]: alert created");
    Ok(AlertCreation { alert, affected_patients: affected, vulnerable_patients: vulnerable })
}

/// All active, located patients within `radius_m` of `center`, ascending by distance.
async fn find_affected_patients(state: &WorkerState, center: (f64, f64), radius_m: f64) -> Result<Vec<Patient>, StoreError> {
    let candidates = state.patients.find_active_with_location().await?;
    let mut matched: Vec<(f64, Patient)> = candidates
        .into_iter()
        .filter_map(|patient| {
            let location = patient.location()?;
            let distance = geodesic_distance_m(location, center);
            (distance <= radius_m).then_some((distance, patient))
        })
        .collect();
    matched.sort_by(|a, b| a.0.total_cmp(&b.0));
    Ok(matched.into_iter().map(|(_, patient)| patient).collect())
}

fn emit_alert(state: &WorkerState, alert: &Alert, geo_event: &GeoEvent, affected: &[Patient]) {
    state.broker.publish(rooms::ALERTS, BusEnvelope::NewAlert { alert: alert.clone() });

    if let Some(facility_id) = alert.target_facility_id {
        state.broker.publish(&rooms::hospital(facility_id), BusEnvelope::NewAlert { alert: alert.clone() });
    }
    if let Some(department) = alert.routed_department {
        state.broker.publish(&rooms::department(&department), BusEnvelope::NewAlert { alert: alert.clone() });
    }
    for patient in affected {
        state.broker.publish(&rooms::patient(patient.id), BusEnvelope::NewAlert { alert: alert.clone() });
    }

    state.broker.publish(rooms::LIVEMAP, BusEnvelope::from(geo_event));
}
