// [libs/domain/models/src/geo_event.rs]
use crate::enums::{GeoEventSource, Layer};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeoEvent {
    pub id: Uuid,
    pub event_type: String,
    pub source: GeoEventSource,
    pub severity: u8,
    pub layer: Layer,
    pub latitude: f64,
    pub longitude: f64,
    pub title: String,
    pub details: Option<String>,
    pub metadata: Value,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl GeoEvent {
    pub fn location(&self) -> (f64, f64) {
        (self.latitude, self.longitude)
    }

    pub fn is_verified(&self) -> bool {
        self.metadata
            .get("verified")
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    pub fn is_unverified(&self) -> bool {
        self.metadata.get("verified").is_none()
    }
}

/// A deterministic grid-bucket cluster of geo events, per §4.4.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeoCluster {
    pub centroid_lat: f64,
    pub centroid_lon: f64,
    pub count: usize,
    pub max_severity: u8,
    pub avg_severity: f64,
    pub event_ids: Vec<Uuid>,
    pub layers: Vec<Layer>,
    pub bounding_box: (f64, f64, f64, f64), // (min_lat, min_lon, max_lat, max_lon)
}
