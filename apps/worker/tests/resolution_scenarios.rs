// [apps/worker/tests/resolution_scenarios.rs]
use chrono::Utc;
use pulsegrid_domain_models::prelude::*;
use pulsegrid_infra_bus::InProcessBroker;
use pulsegrid_infra_llm::{EmbeddingClient, LlmClient, VectorIndexClient};
use pulsegrid_infra_store::StoreClient;
use pulsegrid_worker::services::alert_engine::{create_and_emit_alert, NewAlertSpec};
use pulsegrid_worker::services::resolution_watcher::check_resolution_on_location_update;
use pulsegrid_worker::state::WorkerState;
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

async fn test_state() -> WorkerState {
    let store = StoreClient::connect("file::memory:", None).await.unwrap();
    let broker = Arc::new(InProcessBroker::new());
    let llm = LlmClient::new(None, String::new(), String::new());
    let embeddings = EmbeddingClient::new(None, String::new());
    let vector_index = VectorIndexClient::new(String::new(), String::new());
    WorkerState::new(store, broker, llm, embeddings, vector_index)
}

fn facility_at(latitude: f64, longitude: f64) -> Facility {
    Facility {
        id: Uuid::new_v4(),
        name: "Shifa Field Hospital".to_string(),
        phone: None,
        latitude,
        longitude,
        coverage_radius_m: 500,
        department: Department::Hospital,
        status: FacilityStatus::Operational,
        capacity: None,
    }
}

fn patient_at(latitude: f64, longitude: f64) -> Patient {
    Patient {
        id: Uuid::new_v4(),
        phone: "+970000000".to_string(),
        name: None,
        latitude: Some(latitude),
        longitude: Some(longitude),
        last_known_address: None,
        mobility: None,
        living_situation: None,
        date_of_birth: None,
        chronic_conditions: Vec::new(),
        allergies: Vec::new(),
        medications: Vec::new(),
        special_equipment: Vec::new(),
        blood_type: None,
        total_sos_count: 1,
        false_alarm_count: 0,
        trust_score: 1.0,
        risk_score: None,
        risk_level: None,
        is_active: true,
        created_at: Utc::now(),
    }
}

#[tokio::test]
async fn facility_under_attack_is_not_resolved_by_arriving_patient() {
    let state = test_state().await;

    let hospital = facility_at(31.5, 34.4);
    state.facilities.upsert(&hospital).await.unwrap();

    // Patient starts ~100m from the hospital.
    let mut patient = patient_at(31.5009, 34.4);
    state.patients.upsert(&patient).await.unwrap();

    let sos = SosRequest {
        id: Uuid::new_v4(),
        patient_id: patient.id,
        latitude: patient.latitude,
        longitude: patient.longitude,
        patient_status: PatientStatus::Trapped,
        severity: 4,
        details: Some("under attack near the hospital".to_string()),
        source: SosSource::Api,
        idempotency_key: "scenario-3".to_string(),
        mesh_message_id: None,
        relay_device_id: None,
        hop_count: None,
        routed_department: Some(Department::Hospital),
        facility_notified_id: None,
        origin_facility_id: Some(hospital.id),
        status: SosStatus::Acknowledged,
        resolved_at: None,
        auto_resolved: false,
        created_at: Utc::now(),
    };
    state.sos_requests.insert(&sos).await.unwrap();

    // Patient reports a new location ~50m from the (origin) hospital — within the
    // 500m resolution radius, but the origin facility must never self-resolve.
    patient.latitude = Some(31.50045);
    patient.longitude = Some(34.4);
    state.patients.upsert(&patient).await.unwrap();

    check_resolution_on_location_update(&state, patient.id).await.unwrap();

    let reloaded = state.sos_requests.find_by_id(sos.id).await.unwrap().unwrap();
    assert_eq!(reloaded.status, SosStatus::Acknowledged);
    assert!(!reloaded.auto_resolved);
    assert!(reloaded.resolved_at.is_none());
}

#[tokio::test]
async fn arriving_at_a_different_operational_facility_resolves_the_sos() {
    let state = test_state().await;

    let origin = facility_at(31.5, 34.4);
    let rescue = facility_at(31.52, 34.42);
    state.facilities.upsert(&origin).await.unwrap();
    state.facilities.upsert(&rescue).await.unwrap();

    let mut patient = patient_at(31.5, 34.4);
    state.patients.upsert(&patient).await.unwrap();

    let sos = SosRequest {
        id: Uuid::new_v4(),
        patient_id: patient.id,
        latitude: patient.latitude,
        longitude: patient.longitude,
        patient_status: PatientStatus::Injured,
        severity: 3,
        details: None,
        source: SosSource::Api,
        idempotency_key: "scenario-3b".to_string(),
        mesh_message_id: None,
        relay_device_id: None,
        hop_count: None,
        routed_department: Some(Department::Hospital),
        facility_notified_id: None,
        origin_facility_id: Some(origin.id),
        status: SosStatus::Acknowledged,
        resolved_at: None,
        auto_resolved: false,
        created_at: Utc::now(),
    };
    state.sos_requests.insert(&sos).await.unwrap();

    patient.latitude = Some(rescue.latitude);
    patient.longitude = Some(rescue.longitude);
    state.patients.upsert(&patient).await.unwrap();

    check_resolution_on_location_update(&state, patient.id).await.unwrap();

    let reloaded = state.sos_requests.find_by_id(sos.id).await.unwrap().unwrap();
    assert_eq!(reloaded.status, SosStatus::Resolved);
    assert!(reloaded.auto_resolved);
}

#[tokio::test]
async fn alert_engine_counts_only_patients_within_radius_and_persists_a_geo_event() {
    let state = test_state().await;

    let bedridden = {
        let mut p = patient_at(31.5, 34.4);
        p.mobility = Some(Mobility::Bedridden);
        p
    };
    let can_walk = {
        let mut p = patient_at(31.5001, 34.4001);
        p.mobility = Some(Mobility::CanWalk);
        p
    };
    let far = patient_at(31.6, 34.5);
    state.patients.upsert(&bedridden).await.unwrap();
    state.patients.upsert(&can_walk).await.unwrap();
    state.patients.upsert(&far).await.unwrap();

    let creation = create_and_emit_alert(&state, NewAlertSpec {
        event_type: EventType::Fire,
        severity: Severity::Critical,
        latitude: 31.5,
        longitude: 34.4,
        radius_m: Some(1000),
        source: "system".to_string(),
        confidence: 0.9,
        metadata: json!({}),
        routed_department: None,
        target_facility_id: None,
    })
    .await
    .unwrap();

    assert_eq!(creation.alert.affected_patients_count, 2);
    assert_eq!(creation.vulnerable_patients.len(), 1);
    assert_eq!(creation.vulnerable_patients[0].id, bedridden.id);

    let geo_events = state.geo_events.find_all().await.unwrap();
    assert_eq!(geo_events.len(), 1);
    assert_eq!(geo_events[0].latitude, 31.5);
}
