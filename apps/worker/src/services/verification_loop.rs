// [apps/worker/src/services/verification_loop.rs]
/*!
 * APARATO: VERIFICATION LOOP (§4.6)
 * RESPONSABILIDAD: CORROBORACIÓN DE EVENTOS GEOGRÁFICOS NO VERIFICADOS
 *                   Y ACTUALIZACIÓN DE CONFIANZA DE CANALES
 *
 * Barrido de 10 minutos sobre hasta 20 eventos sin veredicto. Cada
 * evento se corrobora contra otros eventos cercanos en espacio/tiempo
 * y contra SOS relacionados; el LLM emite un veredicto cuando hay
 * credencial, y el cálculo determinista lo reemplaza en su ausencia.
 */

use crate::state::WorkerState;
use chrono::{Duration as ChronoDuration, Utc};
use pulsegrid_domain_geo::{geodesic_distance_m, CORROBORATION_RADIUS_M, RELATED_SOS_RADIUS_M};
use pulsegrid_domain_models::prelude::*;
use pulsegrid_infra_store::StoreError;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, instrument};

const SWEEP_INTERVAL_SECS: u64 = 600;
const MAX_EVENTS_PER_SWEEP: usize = 20;
const CORROBORATION_WINDOW_HOURS: i64 = 6;
const RELATED_SOS_WINDOW_HOURS: i64 = 2;

pub struct VerificationLoop {
    state: Arc<WorkerState>,
}

impl VerificationLoop {
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
                    error!(%error, "⚠️ [VERIFICATION_LOOP]: sweep failed");
                }
            }
        });
    }

    #[instrument(skip(self))]
    async fn sweep(&self) -> Result<(), StoreError> {
        let all_events = self.state.geo_events.find_all().await?;
        let telegram_events = self.state.geo_events.find_by_source(GeoEventSource::Telegram).await?;
        let recency_cutoff = Utc::now() - ChronoDuration::hours(CORROBORATION_WINDOW_HOURS);

        let unverified: Vec<&GeoEvent> = telegram_events
            .iter()
            .filter(|event| event.is_unverified() && event.created_at >= recency_cutoff)
            .take(MAX_EVENTS_PER_SWEEP)
            .collect();

        for event in unverified {
            self.verify_event(event, &all_events).await?;
        }
        Ok(())
    }

    async fn verify_event(&self, event: &GeoEvent, all_events: &[GeoEvent]) -> Result<(), StoreError> {
        let corroboration_window = event.created_at - ChronoDuration::hours(CORROBORATION_WINDOW_HOURS);
        let corroborating_count = all_events
            .iter()
            .filter(|other| other.id != event.id)
            .filter(|other| other.created_at >= corroboration_window)
            .filter(|other| geodesic_distance_m(other.location(), event.location()) <= CORROBORATION_RADIUS_M)
            .count();

        let related_sos_window = event.created_at - ChronoDuration::hours(RELATED_SOS_WINDOW_HOURS);
        let related_sos = self.state.sos_requests.find_created_since(related_sos_window).await?;
        let related_sos_count = related_sos
            .iter()
            .filter_map(|sos| sos.location())
            .filter(|location| geodesic_distance_m(*location, event.location()) <= RELATED_SOS_RADIUS_M)
            .count();

        let (verified, confidence) = self.run_verdict(event, corroborating_count, related_sos_count).await;
        let trust_delta = if verified { 0.05 } else { -0.15 };

        let mut metadata = event.metadata.clone();
        if let Some(object) = metadata.as_object_mut() {
            object.insert("verified".to_string(), json!(verified));
            object.insert("confidence".to_string(), json!(confidence));
            object.insert("corroborating_count".to_string(), json!(corroborating_count));
            object.insert("related_sos_count".to_string(), json!(related_sos_count));
        }
        self.state.geo_events.update_metadata(event.id, &metadata).await?;

        if let Some(channel_id) = event.metadata.get("channel_id").and_then(|v| v.as_str()) {
            self.update_channel_trust(channel_id, event.id, verified, confidence, trust_delta).await?;
        }

        info!(event_id = %event.id, verified, confidence, "🔎 [VERIFICATION_LOOP]: event verdict recorded");
        Ok(())
    }

    async fn run_verdict(&self, event: &GeoEvent, corroborating_count: usize, related_sos_count: usize) -> (bool, f64) {
        if self.state.llm.has_credential() {
            let prompt = format!(
                "Event '{}' at ({}, {}) has {} corroborating reports and {} related SOS nearby. Respond with VERIFIED or UNVERIFIED.",
                event.title, event.latitude, event.longitude, corroborating_count, related_sos_count
            );
            if let Ok(text) = self.state.llm.call_llm("You verify crisis reports.", &prompt, 8).await {
                let verified = text.to_uppercase().contains("VERIFIED") && !text.to_uppercase().contains("UN");
                let confidence = deterministic_confidence(corroborating_count, related_sos_count);
                return (verified, confidence);
            }
        }
        let verified = corroborating_count >= 1 || related_sos_count >= 1;
        (verified, deterministic_confidence(corroborating_count, related_sos_count))
    }

    async fn update_channel_trust(
        &self,
        channel_id: &str,
        geo_event_id: uuid::Uuid,
        verified: bool,
        confidence: f64,
        trust_delta: f64,
    ) -> Result<(), StoreError> {
        let Some(mut channel) = self.state.intel_channels.find_by_id(channel_id).await? else { return Ok(()) };

        channel.total_reports += 1;
        if verified {
            channel.verified_reports += 1;
        } else {
            channel.false_reports += 1;
        }
        channel.trust_score = (channel.trust_score + trust_delta).clamp(0.0, 1.0);
        channel.push_note(VerificationNote {
            geo_event_id,
            verified,
            confidence,
            trust_delta,
            noted_at: Utc::now(),
        });
        channel.apply_blacklist_policy();

        self.state.intel_channels.update_trust(&channel).await
    }
}

/// `0.4 + 0.15 × corroboration (capped 0.3) + 0.1 × related SOS (capped 0.2)`, clamped to `[0, 1]`.
fn deterministic_confidence(corroborating_count: usize, related_sos_count: usize) -> f64 {
    let corroboration_term = (corroborating_count as f64 * 0.15).min(0.3);
    let related_sos_term = (related_sos_count as f64 * 0.1).min(0.2);
    (0.4 + corroboration_term + related_sos_term).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn baseline_confidence_with_no_corroboration() {
        assert!((deterministic_confidence(0, 0) - 0.4).abs() < f64::EPSILON);
    }

    #[test]
    fn corroboration_term_saturates_at_its_cap() {
        let saturated = deterministic_confidence(10, 0);
        assert!((saturated - 0.7).abs() < 1e-9);
    }

    #[test]
    fn related_sos_term_saturates_at_its_cap() {
        let saturated = deterministic_confidence(0, 10);
        assert!((saturated - 0.6).abs() < 1e-9);
    }

    #[test]
    fn combined_terms_never_exceed_one() {
        assert!((deterministic_confidence(10, 10) - 1.0).abs() < 1e-9);
    }
}
