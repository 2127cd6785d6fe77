// [apps/edge/src/handlers/sos.rs]
/*!
 * APARATO: SOS INGESTION HANDLERS (§4.1)
 * RESPONSABILIDAD: LAS CUATRO FUENTES PERSISTENTES — API, SMS, MESH, SYNC
 *
 * La quinta fuente ("simulation") no persiste nada — vive en
 * `handlers::simulation` como un disparo de fan-out puro.
 */

use crate::services::ingestion::run_common_post_creation;
use crate::state::AppState;
use axum::extract::State;
use axum::Json;
use chrono::Utc;
use pulsegrid_domain_crypto::{decrypt_sms_envelope, SMS_ENVELOPE_PREFIX};
use pulsegrid_domain_models::prelude::*;
use pulsegrid_shared_errors::CoreError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, instrument, warn};
use uuid::Uuid;

fn validate_severity(severity: u8) -> Result<u8, CoreError> {
    if (1..=5).contains(&severity) {
        Ok(severity)
    } else {
        Err(CoreError::InvalidPayload(format!("severity {severity} out of range [1,5]")))
    }
}

#[derive(Debug, Serialize)]
pub struct SosAcceptedResponse {
    pub sos_id: Uuid,
    pub is_duplicate: bool,
}

// ── API (authenticated patient) ──────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ApiSosRequest {
    pub patient_id: Uuid,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub patient_status: PatientStatus,
    pub severity: u8,
    pub details: Option<String>,
    pub event_id: Option<String>,
}

#[instrument(skip(state, payload))]
pub async fn ingest_api(State(state): State<AppState>, Json(payload): Json<ApiSosRequest>) -> Result<Json<SosAcceptedResponse>, CoreError> {
    let severity = validate_severity(payload.severity)?;

    let (latitude, longitude) = match (payload.latitude, payload.longitude) {
        (Some(lat), Some(lon)) => (Some(lat), Some(lon)),
        _ => {
            let patient = state.patients.find_by_id(payload.patient_id).await
                .map_err(|e| CoreError::DependencyUnavailable(e.to_string()))?
                .ok_or_else(|| CoreError::NotFound(format!("patient {}", payload.patient_id)))?;
            (patient.latitude, patient.longitude)
        }
    };

    let idempotency_key = payload.event_id.unwrap_or_else(|| Uuid::new_v4().to_string());

    let sos = SosRequest {
        id: Uuid::new_v4(),
        patient_id: payload.patient_id,
        latitude,
        longitude,
        patient_status: payload.patient_status,
        severity,
        details: payload.details.clone(),
        source: SosSource::Api,
        idempotency_key,
        mesh_message_id: None,
        relay_device_id: None,
        hop_count: None,
        routed_department: None,
        facility_notified_id: None,
        origin_facility_id: None,
        status: SosStatus::Pending,
        resolved_at: None,
        auto_resolved: false,
        created_at: Utc::now(),
    };

    state.sos_requests.insert(&sos).await.map_err(|e| CoreError::DependencyUnavailable(e.to_string()))?;
    run_common_post_creation(&state, &sos).await;

    info!(sos_id = %sos.id, "🆘 [INGEST_API]: SOS accepted");
    Ok(Json(SosAcceptedResponse { sos_id: sos.id, is_duplicate: false }))
}

// ── SMS inbound ───────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct SmsSosRequest {
    pub phone: String,
    pub raw_body: String,
}

#[derive(Debug, Deserialize, Default)]
struct SmsDecodedPayload {
    latitude: Option<f64>,
    longitude: Option<f64>,
    patient_status: Option<PatientStatus>,
    severity: Option<u8>,
    details: Option<String>,
}

#[instrument(skip(state, payload), fields(phone = %payload.phone))]
pub async fn ingest_sms(State(state): State<AppState>, Json(payload): Json<SmsSosRequest>) -> Result<Json<Value>, CoreError> {
    let patient = state
        .patients
        .find_by_phone(&payload.phone)
        .await
        .map_err(|e| CoreError::DependencyUnavailable(e.to_string()))?;

    let Some(patient) = patient else {
        warn!("📵 [INGEST_SMS]: unknown sender {}", payload.phone);
        return Ok(Json(serde_json::json!({ "status": "unknown_sender" })));
    };

    let decoded = if let Some(body) = payload.raw_body.strip_prefix(SMS_ENVELOPE_PREFIX) {
        match decrypt_sms_envelope(&state.sms_master_key, patient.id, body) {
            Ok(plaintext) => serde_json::from_str::<SmsDecodedPayload>(&plaintext)
                .unwrap_or(SmsDecodedPayload { details: Some(plaintext), ..Default::default() }),
            Err(e) => {
                warn!("🔓 [INGEST_SMS]: decrypt failed: {}", e);
                return Err(CoreError::CryptoError(e.to_string()));
            }
        }
    } else {
        SmsDecodedPayload { details: Some(payload.raw_body.clone()), ..Default::default() }
    };

    let patient_status = decoded.patient_status.unwrap_or(PatientStatus::Injured);
    let severity = validate_severity(decoded.severity.unwrap_or(3))?;
    let (latitude, longitude) = (decoded.latitude.or(patient.latitude), decoded.longitude.or(patient.longitude));

    let sos = SosRequest {
        id: Uuid::new_v4(),
        patient_id: patient.id,
        latitude,
        longitude,
        patient_status,
        severity,
        details: decoded.details.clone(),
        source: SosSource::Sms,
        idempotency_key: Uuid::new_v4().to_string(),
        mesh_message_id: None,
        relay_device_id: None,
        hop_count: None,
        routed_department: None,
        facility_notified_id: None,
        origin_facility_id: None,
        status: SosStatus::Pending,
        resolved_at: None,
        auto_resolved: false,
        created_at: Utc::now(),
    };

    state.sos_requests.insert(&sos).await.map_err(|e| CoreError::DependencyUnavailable(e.to_string()))?;
    run_common_post_creation(&state, &sos).await;

    info!(sos_id = %sos.id, "🆘 [INGEST_SMS]: SOS accepted");
    Ok(Json(serde_json::json!({ "sos_id": sos.id, "is_duplicate": false })))
}

// ── Mesh relay ────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct MeshSosRequest {
    pub mesh_message_id: String,
    pub patient_id: Uuid,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub patient_status: PatientStatus,
    pub severity: u8,
    pub details: Option<String>,
    pub hop_count: u32,
    pub relay_device_id: String,
}

#[instrument(skip(state, payload))]
pub async fn ingest_mesh(State(state): State<AppState>, Json(payload): Json<MeshSosRequest>) -> Result<Json<SosAcceptedResponse>, CoreError> {
    let severity = validate_severity(payload.severity)?;

    if let Some(existing) = state
        .sos_requests
        .find_by_mesh_message_id(&payload.mesh_message_id)
        .await
        .map_err(|e| CoreError::DependencyUnavailable(e.to_string()))?
    {
        return Ok(Json(SosAcceptedResponse { sos_id: existing.id, is_duplicate: true }));
    }

    if state.patients.find_by_id(payload.patient_id).await.map_err(|e| CoreError::DependencyUnavailable(e.to_string()))?.is_none() {
        warn!(patient_id = %payload.patient_id, "👤 [INGEST_MESH]: unknown patient_id, creating SOS anyway (emergency-first policy)");
    }

    let sos = SosRequest {
        id: Uuid::new_v4(),
        patient_id: payload.patient_id,
        latitude: payload.latitude,
        longitude: payload.longitude,
        patient_status: payload.patient_status,
        severity,
        details: payload.details.clone(),
        source: SosSource::Mesh,
        idempotency_key: payload.mesh_message_id.clone(),
        mesh_message_id: Some(payload.mesh_message_id),
        relay_device_id: Some(payload.relay_device_id),
        hop_count: Some(payload.hop_count),
        routed_department: None,
        facility_notified_id: None,
        origin_facility_id: None,
        status: SosStatus::Pending,
        resolved_at: None,
        auto_resolved: false,
        created_at: Utc::now(),
    };

    state.sos_requests.insert(&sos).await.map_err(|e| CoreError::DependencyUnavailable(e.to_string()))?;
    run_common_post_creation(&state, &sos).await;

    info!(sos_id = %sos.id, "🕸️ [INGEST_MESH]: SOS accepted");
    Ok(Json(SosAcceptedResponse { sos_id: sos.id, is_duplicate: false }))
}

// ── Batch sync ────────────────────────────────────────────────────────────

const MAX_SYNC_BATCH_SIZE: usize = 100;

#[derive(Debug, Deserialize)]
pub struct SyncBatchItem {
    pub event_id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: Value,
    pub device_time: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SyncItemResult {
    pub event_id: String,
    pub ok: bool,
    pub sos_id: Option<Uuid>,
    pub is_duplicate: bool,
    pub error: Option<String>,
}

#[instrument(skip(state, items))]
pub async fn ingest_sync_batch(State(state): State<AppState>, Json(items): Json<Vec<SyncBatchItem>>) -> Result<Json<Vec<SyncItemResult>>, CoreError> {
    if items.len() > MAX_SYNC_BATCH_SIZE {
        return Err(CoreError::InvalidPayload(format!("batch of {} exceeds max {}", items.len(), MAX_SYNC_BATCH_SIZE)));
    }

    let mut results = Vec::with_capacity(items.len());
    for item in items {
        results.push(process_sync_item(&state, item).await);
    }
    Ok(Json(results))
}

async fn process_sync_item(state: &AppState, item: SyncBatchItem) -> SyncItemResult {
    match item.event_type.as_str() {
        "sos_create" => match process_sync_sos_create(state, &item.event_id, item.data, item.device_time).await {
            Ok((sos_id, is_duplicate)) => SyncItemResult { event_id: item.event_id, ok: true, sos_id: Some(sos_id), is_duplicate, error: None },
            Err(e) => SyncItemResult { event_id: item.event_id, ok: false, sos_id: None, is_duplicate: false, error: Some(e.to_string()) },
        },
        "sos_update" => match process_sync_sos_update(state, item.data).await {
            Ok(()) => SyncItemResult { event_id: item.event_id, ok: true, sos_id: None, is_duplicate: false, error: None },
            Err(e) => SyncItemResult { event_id: item.event_id, ok: false, sos_id: None, is_duplicate: false, error: Some(e.to_string()) },
        },
        "patient_update" => match process_sync_patient_update(state, item.data).await {
            Ok(()) => SyncItemResult { event_id: item.event_id, ok: true, sos_id: None, is_duplicate: false, error: None },
            Err(e) => SyncItemResult { event_id: item.event_id, ok: false, sos_id: None, is_duplicate: false, error: Some(e.to_string()) },
        },
        other => SyncItemResult {
            event_id: item.event_id,
            ok: false,
            sos_id: None,
            is_duplicate: false,
            error: Some(format!("unknown event_type {other:?}")),
        },
    }
}

async fn process_sync_sos_create(state: &AppState, event_id: &str, data: Value, device_time: Option<String>) -> Result<(Uuid, bool), CoreError> {
    if let Some(existing) = state
        .sos_requests
        .find_by_mesh_message_id(event_id)
        .await
        .map_err(|e| CoreError::DependencyUnavailable(e.to_string()))?
    {
        return Ok((existing.id, true));
    }

    let patient_id: Uuid = serde_json::from_value(data.get("patient_id").cloned().ok_or_else(|| CoreError::InvalidPayload("missing patient_id".into()))?)
        .map_err(|e| CoreError::InvalidPayload(e.to_string()))?;

    let patient_status = match data.get("patient_status").and_then(Value::as_str) {
        Some(code) if code.len() <= 2 => PatientStatus::from_short_code(code).or_else(|| serde_json::from_value(Value::String(code.to_string())).ok())
            .ok_or_else(|| CoreError::InvalidPayload(format!("bad patient_status {code:?}")))?,
        Some(other) => serde_json::from_value(Value::String(other.to_string())).map_err(|e| CoreError::InvalidPayload(e.to_string()))?,
        None => return Err(CoreError::InvalidPayload("missing patient_status".into())),
    };

    let severity = validate_severity(data.get("severity").and_then(Value::as_u64).unwrap_or(3) as u8)?;
    let details = data.get("details").and_then(Value::as_str).map(str::to_string);
    let latitude = data.get("latitude").and_then(Value::as_f64);
    let longitude = data.get("longitude").and_then(Value::as_f64);

    let _ = device_time;

    let sos = SosRequest {
        id: Uuid::new_v4(),
        patient_id,
        latitude,
        longitude,
        patient_status,
        severity,
        details: details.clone(),
        source: SosSource::Sync,
        idempotency_key: event_id.to_string(),
        mesh_message_id: Some(event_id.to_string()),
        relay_device_id: None,
        hop_count: None,
        routed_department: None,
        facility_notified_id: None,
        origin_facility_id: None,
        status: SosStatus::Pending,
        resolved_at: None,
        auto_resolved: false,
        created_at: Utc::now(),
    };

    state.sos_requests.insert(&sos).await.map_err(|e| CoreError::DependencyUnavailable(e.to_string()))?;
    run_common_post_creation(state, &sos).await;
    Ok((sos.id, false))
}

async fn process_sync_sos_update(state: &AppState, data: Value) -> Result<(), CoreError> {
    let sos_id: Uuid = serde_json::from_value(data.get("sos_id").cloned().ok_or_else(|| CoreError::InvalidPayload("missing sos_id".into()))?)
        .map_err(|e| CoreError::InvalidPayload(e.to_string()))?;
    let status: SosStatus = serde_json::from_value(data.get("status").cloned().ok_or_else(|| CoreError::InvalidPayload("missing status".into()))?)
        .map_err(|e| CoreError::InvalidPayload(e.to_string()))?;

    let sos = state.sos_requests.find_by_id(sos_id).await.map_err(|e| CoreError::DependencyUnavailable(e.to_string()))?
        .ok_or_else(|| CoreError::NotFound(format!("sos_request {sos_id}")))?;

    state.sos_requests.update_routing(sos_id, sos.routed_department.unwrap_or(Department::Hospital), sos.facility_notified_id, status)
        .await.map_err(|e| CoreError::DependencyUnavailable(e.to_string()))?;
    Ok(())
}

async fn process_sync_patient_update(state: &AppState, data: Value) -> Result<(), CoreError> {
    let patient_id: Uuid = serde_json::from_value(data.get("patient_id").cloned().ok_or_else(|| CoreError::InvalidPayload("missing patient_id".into()))?)
        .map_err(|e| CoreError::InvalidPayload(e.to_string()))?;

    let mut patient = state.patients.find_by_id(patient_id).await.map_err(|e| CoreError::DependencyUnavailable(e.to_string()))?
        .ok_or_else(|| CoreError::NotFound(format!("patient {patient_id}")))?;

    if let Some(lat) = data.get("latitude").and_then(Value::as_f64) {
        patient.latitude = Some(lat);
    }
    if let Some(lon) = data.get("longitude").and_then(Value::as_f64) {
        patient.longitude = Some(lon);
    }

    state.patients.upsert(&patient).await.map_err(|e| CoreError::DependencyUnavailable(e.to_string()))?;
    Ok(())
}
