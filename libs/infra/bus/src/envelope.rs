// [libs/infra/bus/src/envelope.rs]
//! Discriminated-union wire envelopes, keyed by `kind`, per SPEC_FULL.md §4.5/§6.

use chrono::{DateTime, Utc};
use pulsegrid_domain_models::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BusEnvelope {
    NewSos {
        id: Uuid,
        patient_id: Uuid,
        latitude: Option<f64>,
        longitude: Option<f64>,
        status: SosStatus,
        patient_status: PatientStatus,
        severity: u8,
        source: SosSource,
        details: Option<String>,
        created_at: DateTime<Utc>,
        patient_info: Option<Value>,
    },
    NewAlert {
        alert: Alert,
    },
    MapEvent {
        id: Uuid,
        event_type: String,
        latitude: f64,
        longitude: f64,
        source: GeoEventSource,
        severity: u8,
        title: String,
        details: Option<String>,
        layer: Layer,
        metadata: Value,
        created_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    },
    SosResolved {
        sos_id: Uuid,
        patient_id: Uuid,
        latitude: Option<f64>,
        longitude: Option<f64>,
        hospital_id: Uuid,
        hospital_name: String,
        origin_hospital_id: Option<Uuid>,
        resolved_at: DateTime<Utc>,
        auto_resolved: bool,
    },
    TelegramMessage {
        message_id: Uuid,
        channel_id: String,
        chat_id: String,
        text: String,
        sent_at: DateTime<Utc>,
    },
    TelegramProcessing {
        message_id: Uuid,
        status: String,
    },
    TelegramAnalysis {
        message_id: Uuid,
        is_crisis: bool,
        confidence: f64,
        category: String,
        geo_event_id: Option<Uuid>,
        alert_id: Option<Uuid>,
    },
}

impl From<&GeoEvent> for BusEnvelope {
    fn from(event: &GeoEvent) -> Self {
        BusEnvelope::MapEvent {
            id: event.id,
            event_type: event.event_type.clone(),
            latitude: event.latitude,
            longitude: event.longitude,
            source: event.source,
            severity: event.severity,
            title: event.title.clone(),
            details: event.details.clone(),
            layer: event.layer,
            metadata: event.metadata.clone(),
            created_at: event.created_at,
            expires_at: event.expires_at,
        }
    }
}

/// The well-known room names enumerated in SPEC_FULL.md §4.5.
pub mod rooms {
    pub const ALERTS: &str = "alerts";
    pub const LIVEMAP: &str = "livemap";
    pub const TELEGRAM: &str = "telegram";

    pub fn hospital(facility_id: uuid::Uuid) -> String {
        format!("hospital_{facility_id}")
    }

    pub fn department(department: &pulsegrid_domain_models::enums::Department) -> String {
        department.room_name()
    }

    pub fn patient(patient_id: uuid::Uuid) -> String {
        format!("patient_{patient_id}")
    }
}
