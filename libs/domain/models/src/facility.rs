// [libs/domain/models/src/facility.rs]
use crate::enums::{Department, FacilityStatus};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FacilityCapacity {
    pub bed_capacity: u32,
    pub icu_beds: u32,
    pub available_beds: u32,
    pub supply_levels: HashMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Facility {
    pub id: Uuid,
    pub name: String,
    pub phone: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub coverage_radius_m: u32,
    pub department: Department,
    pub status: FacilityStatus,
    pub capacity: Option<FacilityCapacity>,
}

impl Facility {
    pub fn is_operational(&self) -> bool {
        matches!(self.status, FacilityStatus::Operational)
    }

    pub fn location(&self) -> (f64, f64) {
        (self.latitude, self.longitude)
    }
}
