// [libs/domain/models/src/patient.rs]
use crate::enums::{LivingSituation, Mobility};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Patient {
    pub id: Uuid,
    pub phone: String,
    pub name: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub last_known_address: Option<String>,
    pub mobility: Option<Mobility>,
    pub living_situation: Option<LivingSituation>,
    pub date_of_birth: Option<chrono::NaiveDate>,
    pub chronic_conditions: Vec<String>,
    pub allergies: Vec<String>,
    pub medications: Vec<String>,
    pub special_equipment: Vec<String>,
    pub blood_type: Option<String>,
    pub total_sos_count: u32,
    pub false_alarm_count: u32,
    pub trust_score: f64,
    pub risk_score: Option<u8>,
    pub risk_level: Option<crate::enums::RiskLevel>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl Patient {
    /// `trust_score = clamp(0.1, 1.0, 1 − false_alarm_count / max(total_sos_count, 1))`.
    pub fn recompute_trust_score(&mut self) {
        let denominator = self.total_sos_count.max(1) as f64;
        let raw = 1.0 - (self.false_alarm_count as f64 / denominator);
        self.trust_score = raw.clamp(0.1, 1.0);
    }

    pub fn is_vulnerable(&self) -> bool {
        matches!(
            self.mobility,
            Some(Mobility::Wheelchair) | Some(Mobility::Bedridden) | Some(Mobility::Other)
        ) || matches!(self.living_situation, Some(LivingSituation::Alone))
    }

    pub fn location(&self) -> Option<(f64, f64)> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => Some((lat, lon)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MedicalRecord {
    pub id: Uuid,
    pub patient_id: Uuid,
    pub conditions: Vec<String>,
    pub medications: Vec<String>,
    pub allergies: Vec<String>,
    pub special_equipment: Vec<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}
