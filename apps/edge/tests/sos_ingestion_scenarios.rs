// [apps/edge/tests/sos_ingestion_scenarios.rs]
use axum::extract::State;
use axum::Json;
use pulsegrid_domain_models::prelude::*;
use pulsegrid_edge::handlers::sos::{ingest_mesh, ingest_sync_batch, MeshSosRequest, SyncBatchItem};
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

#[tokio::test]
async fn mesh_submission_is_deduplicated_by_message_id() {
    let state = test_state().await;
    let patient_id = Uuid::new_v4();

    let request = || MeshSosRequest {
        mesh_message_id: "m1".to_string(),
        patient_id,
        latitude: Some(31.5),
        longitude: Some(34.4),
        patient_status: PatientStatus::Injured,
        severity: 4,
        details: None,
        hop_count: 2,
        relay_device_id: "d1".to_string(),
    };

    let first = ingest_mesh(State(state.clone()), Json(request())).await.unwrap();
    assert!(!first.is_duplicate);

    let second = ingest_mesh(State(state.clone()), Json(request())).await.unwrap();
    assert!(second.is_duplicate);
    assert_eq!(first.sos_id, second.sos_id);

    let stored = state.sos_requests.find_by_mesh_message_id("m1").await.unwrap().unwrap();
    assert_eq!(stored.hop_count, Some(2));
}

#[tokio::test]
async fn mesh_report_is_accepted_with_department_left_unrouted_for_triage() {
    let state = test_state().await;

    let request = MeshSosRequest {
        mesh_message_id: "m2".to_string(),
        patient_id: Uuid::new_v4(),
        latitude: Some(31.5),
        longitude: Some(34.4),
        patient_status: PatientStatus::Injured,
        severity: 3,
        details: Some("Active shooting in the street! People shot.".to_string()),
        hop_count: 1,
        relay_device_id: "d2".to_string(),
    };

    let accepted = ingest_mesh(State(state.clone()), Json(request)).await.unwrap();
    let stored = state.sos_requests.find_by_id(accepted.sos_id).await.unwrap().unwrap();
    assert_eq!(stored.status, SosStatus::Pending);
    assert_eq!(stored.routed_department, None);
}

#[tokio::test]
async fn offline_sync_batch_creates_a_trapped_sos_pending_triage() {
    let state = test_state().await;
    let patient_id = Uuid::new_v4();

    let item = SyncBatchItem {
        event_id: "e1".to_string(),
        event_type: "sos_create".to_string(),
        data: json!({
            "patient_id": patient_id,
            "latitude": 31.5,
            "longitude": 34.4,
            "severity": 5,
            "patient_status": "trapped",
        }),
        device_time: Some("2025-01-01T00:00:00Z".to_string()),
    };

    let response = ingest_sync_batch(State(state.clone()), Json(vec![item])).await.unwrap().0;
    assert_eq!(response.len(), 1);
    assert!(response[0].ok);
    assert!(!response[0].is_duplicate);

    let sos_id = response[0].sos_id.unwrap();
    let stored = state.sos_requests.find_by_id(sos_id).await.unwrap().unwrap();
    assert_eq!(stored.patient_status, PatientStatus::Trapped);
    assert_eq!(stored.routed_department, None);
    assert_eq!(stored.source, SosSource::Sync);
}

#[tokio::test]
async fn batch_sync_over_the_size_limit_is_rejected() {
    let state = test_state().await;
    let items: Vec<SyncBatchItem> = (0..101)
        .map(|i| SyncBatchItem {
            event_id: format!("e{i}"),
            event_type: "sos_create".to_string(),
            data: json!({ "patient_id": Uuid::new_v4(), "patient_status": "safe" }),
            device_time: None,
        })
        .collect();

    let result = ingest_sync_batch(State(state), Json(items)).await;
    assert!(result.is_err());
}
