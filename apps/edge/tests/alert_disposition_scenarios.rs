// [apps/edge/tests/alert_disposition_scenarios.rs]
use axum::extract::{Path, State};
use axum::Json;
use chrono::Utc;
use pulsegrid_domain_models::prelude::*;
use pulsegrid_edge::handlers::alerts::{acknowledge_alert, report_false_alarm, AcknowledgeAlertRequest};
use pulsegrid_edge::state::AppState;
use pulsegrid_infra_bus::InProcessBroker;
use pulsegrid_infra_llm::{EmbeddingClient, LlmClient, VectorIndexClient};
use pulsegrid_infra_store::StoreClient;
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

async fn test_state() -> AppState {
    let store = StoreClient::connect("file::memory:", None).await.unwrap();
    let broker = Arc::new(InProcessBroker::new());
    let llm = LlmClient::new(None, String::new(), String::new());
    let embeddings = EmbeddingClient::new(None, String::new());
    let vector_index = VectorIndexClient::new(String::new(), String::new());
    AppState::new(store, broker, llm, embeddings, vector_index, [0u8; 32])
}

fn facility_at(latitude: f64, longitude: f64, department: Department, coverage_radius_m: u32) -> Facility {
    Facility {
        id: Uuid::new_v4(),
        name: "Shifa Field Hospital".to_string(),
        phone: None,
        latitude,
        longitude,
        coverage_radius_m,
        department,
        status: FacilityStatus::Operational,
        capacity: None,
    }
}

fn alert_at(latitude: f64, longitude: f64, routed_department: Option<Department>, target_facility_id: Option<Uuid>, source: &str, metadata: serde_json::Value) -> Alert {
    Alert {
        id: Uuid::new_v4(),
        event_type: EventType::Fire,
        severity: Severity::High,
        latitude,
        longitude,
        radius_m: Alert::DEFAULT_RADIUS_M,
        source: source.to_string(),
        confidence: 0.8,
        metadata,
        routed_department,
        target_facility_id,
        acknowledged_by: None,
        affected_patients_count: 0,
        reported_false: false,
        created_at: Utc::now(),
        expires_at: Utc::now() + chrono::Duration::hours(Alert::DEFAULT_TTL_HOURS),
    }
}

#[tokio::test]
async fn acknowledge_is_rejected_from_a_facility_outside_coverage() {
    let state = test_state().await;

    let alert = alert_at(31.5, 34.4, Some(Department::Hospital), None, "telegram", json!({}));
    state.alerts.insert(&alert).await.unwrap();

    let distant = facility_at(32.5, 35.4, Department::Hospital, 500);
    state.facilities.upsert(&distant).await.unwrap();

    let result = acknowledge_alert(
        State(state.clone()),
        Path(alert.id),
        Json(AcknowledgeAlertRequest { operator_id: Uuid::new_v4(), facility_id: distant.id }),
    )
    .await;
    assert!(result.is_err());

    let reloaded = state.alerts.find_by_id(alert.id).await.unwrap().unwrap();
    assert!(reloaded.acknowledged_by.is_none());
}

#[tokio::test]
async fn acknowledge_succeeds_for_the_covering_facility_of_the_routed_department() {
    let state = test_state().await;

    let alert = alert_at(31.5, 34.4, Some(Department::Hospital), None, "telegram", json!({}));
    state.alerts.insert(&alert).await.unwrap();

    let covering = facility_at(31.5005, 34.4005, Department::Hospital, 1000);
    state.facilities.upsert(&covering).await.unwrap();

    let operator_id = Uuid::new_v4();
    let response = acknowledge_alert(
        State(state.clone()),
        Path(alert.id),
        Json(AcknowledgeAlertRequest { operator_id, facility_id: covering.id }),
    )
    .await
    .unwrap();
    assert_eq!(response.0["acknowledged"], true);

    let reloaded = state.alerts.find_by_id(alert.id).await.unwrap().unwrap();
    assert_eq!(reloaded.acknowledged_by, Some(operator_id));
}

#[tokio::test]
async fn acknowledge_is_rejected_when_caller_is_not_the_targeted_facility() {
    let state = test_state().await;

    let targeted = facility_at(31.5, 34.4, Department::Hospital, 1000);
    let other = facility_at(31.5, 34.4, Department::Hospital, 1000);
    state.facilities.upsert(&targeted).await.unwrap();
    state.facilities.upsert(&other).await.unwrap();

    let alert = alert_at(31.5, 34.4, Some(Department::Hospital), Some(targeted.id), "sos", json!({}));
    state.alerts.insert(&alert).await.unwrap();

    let result = acknowledge_alert(
        State(state.clone()),
        Path(alert.id),
        Json(AcknowledgeAlertRequest { operator_id: Uuid::new_v4(), facility_id: other.id }),
    )
    .await;
    assert!(result.is_err());
}

#[tokio::test]
async fn reporting_a_false_sos_alarm_lowers_the_patient_trust_score() {
    let state = test_state().await;

    let patient = Patient {
        id: Uuid::new_v4(),
        phone: "+970000001".to_string(),
        name: None,
        latitude: Some(31.5),
        longitude: Some(34.4),
        last_known_address: None,
        mobility: None,
        living_situation: None,
        date_of_birth: None,
        chronic_conditions: Vec::new(),
        allergies: Vec::new(),
        medications: Vec::new(),
        special_equipment: Vec::new(),
        blood_type: None,
        total_sos_count: 4,
        false_alarm_count: 0,
        trust_score: 1.0,
        risk_score: None,
        risk_level: None,
        is_active: true,
        created_at: Utc::now(),
    };
    state.patients.upsert(&patient).await.unwrap();

    let alert = alert_at(31.5, 34.4, Some(Department::Hospital), None, "sos", json!({ "patient_id": patient.id }));
    state.alerts.insert(&alert).await.unwrap();

    let response = report_false_alarm(State(state.clone()), Path(alert.id)).await.unwrap();
    assert_eq!(response.0["reported_false"], true);

    let reloaded_alert = state.alerts.find_by_id(alert.id).await.unwrap().unwrap();
    assert!(reloaded_alert.reported_false);

    let reloaded_patient = state.patients.find_by_id(patient.id).await.unwrap().unwrap();
    assert_eq!(reloaded_patient.false_alarm_count, 1);
    assert!((reloaded_patient.trust_score - 0.75).abs() < 1e-9);
}

#[tokio::test]
async fn reporting_a_false_telegram_alarm_never_touches_a_patient() {
    let state = test_state().await;

    let alert = alert_at(31.5, 34.4, Some(Department::Hospital), None, "telegram", json!({}));
    state.alerts.insert(&alert).await.unwrap();

    report_false_alarm(State(state.clone()), Path(alert.id)).await.unwrap();

    let reloaded = state.alerts.find_by_id(alert.id).await.unwrap().unwrap();
    assert!(reloaded.reported_false);
}
