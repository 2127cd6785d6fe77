// [apps/worker/src/services/triage_orchestrator.rs]
/*!
 * APARATO: TRIAGE ORCHESTRATOR (§4.2)
 * RESPONSABILIDAD: CLASIFICACIÓN DE RIESGO + DEPARTAMENTO POR CADA SOS PENDIENTE
 *
 * Dos etapas por ítem: Etapa A (puntuación de riesgo) y Etapa B
 * (departamento). Cada una intenta el LLM primero, con hasta dos
 * reintentos dentro de un presupuesto de 270s; cualquier excepción,
 * tiempo agotado, o violación de esquema activa el fallback
 * determinista de `pulsegrid_domain_triage`.
 */

use crate::services::alert_engine::{create_and_emit_alert, NewAlertSpec};
use crate::state::WorkerState;
use pulsegrid_domain_geo::geodesic_distance_m;
use pulsegrid_domain_models::prelude::*;
use pulsegrid_domain_triage::{
    classify_department_from_message, compute_priority_score, run_fallback_triage,
    FallbackTriageInput, RiskContext,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, instrument, warn};

const POLL_INTERVAL_SECS: u64 = 15;
const TRIAGE_DEADLINE: Duration = Duration::from_secs(300);
const TRIAGE_SOFT_BUDGET: Duration = Duration::from_secs(270);
const MAX_LLM_RETRIES: u32 = 2;

pub struct TriageOrchestrator {
    state: Arc<WorkerState>,
}

impl TriageOrchestrator {
    pub fn new(state: Arc<WorkerState>) -> Self {
        Self { state }
    }

    pub fn spawn_daemon(self: Arc<Self>) {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(Duration::from_secs(POLL_INTERVAL_SECS));
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                if let Err(error) = self.sweep().await {
                    error!(%error, "⚠️ [TRIAGE_ORCHESTRATOR]: sweep failed");
                }
            }
        });
    }

    #[instrument(skip(self))]
    async fn sweep(&self) -> Result<(), pulsegrid_infra_store::StoreError> {
        let pending = self.state.sos_requests.find_pending().await?;
        for sos in pending {
            match tokio::time::timeout(TRIAGE_DEADLINE, self.triage_one(&sos)).await {
                Ok(Ok(())) => {}
                Ok(Err(error)) => error!(sos_id = %sos.id, %error, "triage failed for item"),
                Err(_) => warn!(sos_id = %sos.id, "triage deadline exceeded, item left pending"),
            }
        }
        Ok(())
    }

    async fn triage_one(&self, sos: &SosRequest) -> Result<(), pulsegrid_infra_store::StoreError> {
        let patient = self.state.patients.find_by_id(sos.patient_id).await?;
        let risk_context = self.gather_risk_context(sos, patient.as_ref()).await?;

        let message = sos.details.clone().unwrap_or_default();
        let (event_type, severity, routed_department, priority_score) = self
            .run_two_stage_triage(sos, &message, &risk_context)
            .await;

        if let Some(mut patient) = patient {
            patient.risk_score = Some(priority_score);
            patient.risk_level = Some(priority_score_to_risk_level(priority_score));
            self.state.patients.upsert(&patient).await?;
        }

        let facility = self.nearest_operational_facility(sos, routed_department).await?;

        let spec = NewAlertSpec {
            event_type,
            severity,
            latitude: sos.latitude.unwrap_or_default(),
            longitude: sos.longitude.unwrap_or_default(),
            radius_m: None,
            source: "sos".to_string(),
            confidence: risk_context.patient_trust_score,
            metadata: json!({ "sos_id": sos.id, "patient_id": sos.patient_id, "priority_score": priority_score }),
            routed_department: Some(routed_department),
            target_facility_id: facility.as_ref().map(|f| f.id),
        };
        create_and_emit_alert(&self.state, spec).await?;

        self.state
            .sos_requests
            .update_routing(sos.id, routed_department, facility.as_ref().map(|f| f.id), SosStatus::Acknowledged)
            .await?;

        info!(sos_id = %sos.id, department = ?routed_department, priority_score, "📋 [TRIAGE_ORCHESTRATOR]: item routed");
        Ok(())
    }

    async fn gather_risk_context(
        &self,
        sos: &SosRequest,
        patient: Option<&Patient>,
    ) -> Result<RiskContext, pulsegrid_infra_store::StoreError> {
        let trust_score = patient.map(|p| p.trust_score).unwrap_or(1.0);
        let mobility = patient.and_then(|p| p.mobility);
        let living_situation = patient.and_then(|p| p.living_situation);

        let corroborating_alert_count = match sos.location() {
            Some(location) => {
                let active = self.state.alerts.find_active().await?;
                active
                    .iter()
                    .filter(|alert| geodesic_distance_m(alert.center(), location) <= pulsegrid_domain_geo::CORROBORATION_RADIUS_M)
                    .count() as u32
            }
            None => 0,
        };

        let telegram_corroborated = match sos.location() {
            Some(location) => {
                let events = self.state.geo_events.find_by_source(GeoEventSource::Telegram).await?;
                events.iter().any(|event| geodesic_distance_m(event.location(), location) <= pulsegrid_domain_geo::CORROBORATION_RADIUS_M)
            }
            None => false,
        };

        Ok(RiskContext {
            patient_mobility: mobility,
            patient_living_situation: living_situation,
            patient_trust_score: trust_score,
            corroborating_alert_count,
            telegram_corroborated,
        })
    }

    async fn run_two_stage_triage(
        &self,
        sos: &SosRequest,
        message: &str,
        risk_context: &RiskContext,
    ) -> (EventType, Severity, Department, u8) {
        let stage_a = tokio::time::timeout(TRIAGE_SOFT_BUDGET, self.risk_score_via_llm(sos, message)).await;
        let priority_score = match stage_a {
            Ok(Some(score)) => score,
            _ => compute_priority_score(risk_context),
        };

        let stage_b = tokio::time::timeout(TRIAGE_SOFT_BUDGET, self.department_via_llm(message)).await;
        let routed_department = match stage_b {
            Ok(Some(department)) => department,
            _ => classify_department_from_message(message, sos.patient_status),
        };

        let fallback = run_fallback_triage(&FallbackTriageInput {
            patient_status: sos.patient_status,
            sos_severity: sos.severity,
            message,
            risk_context: risk_context.clone(),
        });

        (fallback.event_type, fallback.severity, routed_department, priority_score)
    }

    async fn risk_score_via_llm(&self, sos: &SosRequest, message: &str) -> Option<u8> {
        if !self.state.llm.has_credential() {
            return None;
        }
        let system = "You score SOS priority from 0 to 100. Respond with only the integer.";
        let user = format!("patient_status={:?} severity={} message={message}", sos.patient_status, sos.severity);

        for _ in 0..=MAX_LLM_RETRIES {
            match self.state.llm.call_llm(system, &user, 16).await {
                Ok(text) => {
                    if let Ok(score) = text.trim().parse::<u8>() {
                        return Some(score.min(100));
                    }
                    return None;
                }
                Err(error) => warn!(%error, "stage A LLM call failed, retrying"),
            }
        }
        None
    }

    async fn department_via_llm(&self, message: &str) -> Option<Department> {
        if !self.state.llm.has_credential() {
            return None;
        }
        let system = "Classify the emergency department: hospital, police, or civil_defense. Respond with only the lowercase word.";

        for _ in 0..=MAX_LLM_RETRIES {
            match self.state.llm.call_llm(system, message, 8).await {
                Ok(text) => {
                    return match text.trim().to_lowercase().as_str() {
                        "hospital" => Some(Department::Hospital),
                        "police" => Some(Department::Police),
                        "civil_defense" => Some(Department::CivilDefense),
                        _ => None,
                    };
                }
                Err(error) => warn!(%error, "stage B LLM call failed, retrying"),
            }
        }
        None
    }

    async fn nearest_operational_facility(
        &self,
        sos: &SosRequest,
        department: Department,
    ) -> Result<Option<Facility>, pulsegrid_infra_store::StoreError> {
        let Some(location) = sos.location() else { return Ok(None) };
        let candidates = self.state.facilities.find_by_department(department).await?;
        Ok(candidates
            .into_iter()
            .filter(|facility| facility.is_operational())
            .min_by(|a, b| {
                geodesic_distance_m(a.location(), location)
                    .total_cmp(&geodesic_distance_m(b.location(), location))
            }))
    }
}

fn priority_score_to_risk_level(score: u8) -> RiskLevel {
    match score {
        0..=39 => RiskLevel::Low,
        40..=59 => RiskLevel::Moderate,
        60..=79 => RiskLevel::High,
        _ => RiskLevel::Critical,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pulsegrid_infra_bus::InProcessBroker;
    use pulsegrid_infra_llm::{EmbeddingClient, LlmClient, VectorIndexClient};
    use pulsegrid_infra_store::StoreClient;

    #[test]
    fn risk_level_boundaries_are_inclusive_on_the_low_end() {
        assert_eq!(priority_score_to_risk_level(0), RiskLevel::Low);
        assert_eq!(priority_score_to_risk_level(39), RiskLevel::Low);
        assert_eq!(priority_score_to_risk_level(40), RiskLevel::Moderate);
        assert_eq!(priority_score_to_risk_level(59), RiskLevel::Moderate);
        assert_eq!(priority_score_to_risk_level(60), RiskLevel::High);
        assert_eq!(priority_score_to_risk_level(79), RiskLevel::High);
        assert_eq!(priority_score_to_risk_level(80), RiskLevel::Critical);
        assert_eq!(priority_score_to_risk_level(255), RiskLevel::Critical);
    }

    async fn test_state() -> WorkerState {
        let store = StoreClient::connect("file::memory:", None).await.unwrap();
        let broker = Arc::new(InProcessBroker::new());
        let llm = LlmClient::new(None, String::new(), String::new());
        let embeddings = EmbeddingClient::new(None, String::new());
        let vector_index = VectorIndexClient::new(String::new(), String::new());
        WorkerState::new(store, broker, llm, embeddings, vector_index)
    }

    #[tokio::test]
    async fn sweep_routes_a_pending_sos_via_keyword_fallback_since_no_llm_is_configured() {
        let state = test_state().await;

        let sos = SosRequest {
            id: uuid::Uuid::new_v4(),
            patient_id: uuid::Uuid::new_v4(),
            latitude: Some(31.5),
            longitude: Some(34.4),
            patient_status: PatientStatus::Injured,
            severity: 3,
            details: Some("Active shooting in the street! People shot.".to_string()),
            source: SosSource::Api,
            idempotency_key: "triage-sweep-1".to_string(),
            mesh_message_id: None,
            relay_device_id: None,
            hop_count: None,
            routed_department: None,
            facility_notified_id: None,
            origin_facility_id: None,
            status: SosStatus::Pending,
            resolved_at: None,
            auto_resolved: false,
            created_at: chrono::Utc::now(),
        };
        state.sos_requests.insert(&sos).await.unwrap();

        let orchestrator = TriageOrchestrator::new(Arc::new(state.clone()));
        orchestrator.sweep().await.unwrap();

        let reloaded = state.sos_requests.find_by_id(sos.id).await.unwrap().unwrap();
        assert_eq!(reloaded.routed_department, Some(Department::Police));
        assert_eq!(reloaded.status, SosStatus::Acknowledged);
    }
}
