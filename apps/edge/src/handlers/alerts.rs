// [apps/edge/src/handlers/alerts.rs]
/*!
 * APARATO: ALERT ACKNOWLEDGEMENT AND DISPOSITION HANDLERS (§4.3)
 * RESPONSABILIDAD: PROPIEDAD DE RECONOCIMIENTO Y REPORTE DE FALSA ALARMA
 */

use crate::state::AppState;
use axum::extract::{Path, State};
use axum::Json;
use pulsegrid_domain_geo::within_radius_m;
use pulsegrid_domain_models::facility::Facility;
use pulsegrid_shared_errors::CoreError;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, instrument};
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct AcknowledgeAlertRequest {
    pub operator_id: Uuid,
    pub facility_id: Uuid,
}

/// The facility owns the alert when it is the addressed `target_facility_id`,
/// or — when no facility was addressed — when it covers the alert's location
/// for the department it was routed to.
fn facility_owns_alert(facility: &Facility, alert: &pulsegrid_domain_models::alert::Alert) -> bool {
    match alert.target_facility_id {
        Some(target) => target == facility.id,
        None => {
            let department_matches = alert.routed_department.map(|d| d == facility.department).unwrap_or(true);
            department_matches && within_radius_m(facility.location(), alert.center(), facility.coverage_radius_m as f64)
        }
    }
}

#[instrument(skip(state, payload))]
pub async fn acknowledge_alert(
    State(state): State<AppState>,
    Path(alert_id): Path<Uuid>,
    Json(payload): Json<AcknowledgeAlertRequest>,
) -> Result<Json<Value>, CoreError> {
    let alert = state
        .alerts
        .find_by_id(alert_id)
        .await
        .map_err(|e| CoreError::DependencyUnavailable(e.to_string()))?
        .ok_or_else(|| CoreError::NotFound(format!("alert {alert_id}")))?;

    let facility = state
        .facilities
        .find_by_id(payload.facility_id)
        .await
        .map_err(|e| CoreError::DependencyUnavailable(e.to_string()))?
        .ok_or_else(|| CoreError::NotFound(format!("facility {}", payload.facility_id)))?;

    if !facility_owns_alert(&facility, &alert) {
        return Err(CoreError::Forbidden(format!(
            "facility {} does not own alert {alert_id}",
            facility.id
        )));
    }

    state
        .alerts
        .acknowledge(alert_id, payload.operator_id)
        .await
        .map_err(|e| match e {
            pulsegrid_infra_store::StoreError::NotFound(_) => CoreError::NotFound(format!("alert {alert_id}")),
            other => CoreError::DependencyUnavailable(other.to_string()),
        })?;

    info!(alert_id = %alert_id, operator_id = %payload.operator_id, facility_id = %facility.id, "✅ [ALERT_ACK]: alert acknowledged");
    Ok(Json(json!({ "alert_id": alert_id, "acknowledged": true })))
}

#[instrument(skip(state))]
pub async fn report_false_alarm(State(state): State<AppState>, Path(alert_id): Path<Uuid>) -> Result<Json<Value>, CoreError> {
    let alert = state
        .alerts
        .find_by_id(alert_id)
        .await
        .map_err(|e| CoreError::DependencyUnavailable(e.to_string()))?
        .ok_or_else(|| CoreError::NotFound(format!("alert {alert_id}")))?;

    state
        .alerts
        .report_false(alert_id)
        .await
        .map_err(|e| CoreError::DependencyUnavailable(e.to_string()))?;

    if alert.source == "sos" {
        if let Some(patient_id) = alert.metadata.get("patient_id").and_then(Value::as_str).and_then(|s| Uuid::parse_str(s).ok()) {
            if let Some(mut patient) = state.patients.find_by_id(patient_id).await.map_err(|e| CoreError::DependencyUnavailable(e.to_string()))? {
                patient.false_alarm_count += 1;
                patient.recompute_trust_score();
                state.patients.upsert(&patient).await.map_err(|e| CoreError::DependencyUnavailable(e.to_string()))?;
            }
        }
    }

    info!(alert_id = %alert_id, "🚩 [ALERT_FALSE_ALARM]: alert reported false");
    Ok(Json(json!({ "alert_id": alert_id, "reported_false": true })))
}

#[instrument(skip(state))]
pub async fn list_active_alerts(State(state): State<AppState>) -> Result<Json<Vec<pulsegrid_domain_models::alert::Alert>>, CoreError> {
    let alerts = state.alerts.find_active().await.map_err(|e| CoreError::DependencyUnavailable(e.to_string()))?;
    Ok(Json(alerts))
}
