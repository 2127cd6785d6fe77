// [libs/domain/models/src/sos.rs]
use crate::enums::{Department, PatientStatus, SosSource, SosStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SosRequest {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub patient_status: PatientStatus,
    pub severity: u8,
    pub details: Option<String>,
    pub source: SosSource,
    pub idempotency_key: String,
    pub mesh_message_id: Option<String>,
    pub relay_device_id: Option<String>,
    pub hop_count: Option<u32>,
    pub routed_department: Option<Department>,
    pub facility_notified_id: Option<Uuid>,
    pub origin_facility_id: Option<Uuid>,
    pub status: SosStatus,
    pub resolved_at: Option<DateTime<Utc>>,
    pub auto_resolved: bool,
    pub created_at: DateTime<Utc>,
}

impl SosRequest {
    pub fn location(&self) -> Option<(f64, f64)> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => Some((lat, lon)),
            _ => None,
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(
            self.status,
            SosStatus::Pending | SosStatus::Acknowledged | SosStatus::Dispatched
        )
    }
}
