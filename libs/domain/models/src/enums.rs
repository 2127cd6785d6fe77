// [libs/domain/models/src/enums.rs]
//! Closed sum types for every wire enum named in the data model.
//! Unknown strings are rejected at the serde boundary rather than
//! propagating as free text.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mobility {
    CanWalk,
    Wheelchair,
    Bedridden,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LivingSituation {
    Alone,
    WithFamily,
    CareFacility,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Department {
    Hospital,
    Police,
    CivilDefense,
}

impl Department {
    pub fn room_name(&self) -> String {
        format!("dept_{}", self.as_str())
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Department::Hospital => "hospital",
            Department::Police => "police",
            Department::CivilDefense => "civil_defense",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FacilityStatus {
    Operational,
    Limited,
    Full,
    Destroyed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SosSource {
    Api,
    Sms,
    Mesh,
    Sync,
}

impl SosSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            SosSource::Api => "api",
            SosSource::Sms => "sms",
            SosSource::Mesh => "mesh",
            SosSource::Sync => "sync",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatientStatus {
    Safe,
    Injured,
    Trapped,
    Evacuate,
}

impl PatientStatus {
    /// Short-code substitution accepted by batch sync payloads (`S|I|T|E`).
    pub fn from_short_code(code: &str) -> Option<Self> {
        match code {
            "S" => Some(PatientStatus::Safe),
            "I" => Some(PatientStatus::Injured),
            "T" => Some(PatientStatus::Trapped),
            "E" => Some(PatientStatus::Evacuate),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SosStatus {
    Pending,
    Acknowledged,
    Dispatched,
    Resolved,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Maps to the 1..=5 integer scale used by `GeoEvent.severity`.
    pub fn as_int_scale(&self) -> u8 {
        match self {
            Severity::Low => 1,
            Severity::Medium => 2,
            Severity::High => 3,
            Severity::Critical => 5,
        }
    }

    pub fn promote(&self) -> Severity {
        match self {
            Severity::Low => Severity::Medium,
            Severity::Medium => Severity::High,
            Severity::High => Severity::Critical,
            Severity::Critical => Severity::Critical,
        }
    }

    pub fn at_least(&self, floor: Severity) -> Severity {
        if *self < floor {
            floor
        } else {
            *self
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    Flood,
    Bombing,
    Earthquake,
    Fire,
    BuildingCollapse,
    Shooting,
    Chemical,
    MedicalEmergency,
    Infrastructure,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Layer {
    Sos,
    Crisis,
    Hospital,
    SmsActivity,
    PatientDensity,
    TelegramIntel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeoEventSource {
    Sos,
    Telegram,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MonitoringStatus {
    Active,
    Paused,
    Blacklisted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Moderate,
    High,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseUrgency {
    Immediate,
    Within1h,
    Within4h,
    WhenAvailable,
}
