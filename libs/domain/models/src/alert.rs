// [libs/domain/models/src/alert.rs]
use crate::enums::{Department, EventType, Severity};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    pub id: Uuid,
    pub event_type: EventType,
    pub severity: Severity,
    pub latitude: f64,
    pub longitude: f64,
    pub radius_m: u32,
    pub source: String,
    pub confidence: f64,
    pub metadata: Value,
    pub routed_department: Option<Department>,
    pub target_facility_id: Option<Uuid>,
    pub acknowledged_by: Option<Uuid>,
    pub affected_patients_count: u32,
    pub reported_false: bool,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Alert {
    pub const DEFAULT_RADIUS_M: u32 = 1000;
    pub const DEFAULT_TTL_HOURS: i64 = 24;

    pub fn center(&self) -> (f64, f64) {
        (self.latitude, self.longitude)
    }
}
