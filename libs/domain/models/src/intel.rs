// [libs/domain/models/src/intel.rs]
use crate::enums::MonitoringStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationNote {
    pub geo_event_id: Uuid,
    pub verified: bool,
    pub confidence: f64,
    pub trust_delta: f64,
    pub noted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntelChannel {
    pub channel_id: String,
    pub display_name: String,
    pub trust_score: f64,
    pub total_reports: u32,
    pub verified_reports: u32,
    pub false_reports: u32,
    pub unverified_reports: u32,
    pub monitoring_status: MonitoringStatus,
    pub recent_notes: VecDeque<VerificationNote>,
}

impl IntelChannel {
    pub const NOTE_BUFFER_SIZE: usize = 50;
    pub const BLACKLIST_TRUST_FLOOR: f64 = 0.15;
    pub const BLACKLIST_MIN_REPORTS: u32 = 5;

    pub fn new(channel_id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            channel_id: channel_id.into(),
            display_name: display_name.into(),
            trust_score: 0.5,
            total_reports: 0,
            verified_reports: 0,
            false_reports: 0,
            unverified_reports: 0,
            monitoring_status: MonitoringStatus::Active,
            recent_notes: VecDeque::with_capacity(Self::NOTE_BUFFER_SIZE),
        }
    }

    pub fn push_note(&mut self, note: VerificationNote) {
        if self.recent_notes.len() >= Self::NOTE_BUFFER_SIZE {
            self.recent_notes.pop_front();
        }
        self.recent_notes.push_back(note);
    }

    pub fn apply_blacklist_policy(&mut self) {
        if self.trust_score < Self::BLACKLIST_TRUST_FLOOR
            && self.total_reports >= Self::BLACKLIST_MIN_REPORTS
        {
            self.monitoring_status = MonitoringStatus::Blacklisted;
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntelMessage {
    pub id: Uuid,
    pub channel_id: String,
    pub chat_id: String,
    pub text: String,
    pub sent_at: DateTime<Utc>,
    pub fetched_at: DateTime<Utc>,
    pub is_crisis: Option<bool>,
    pub confidence: Option<f64>,
    pub category: Option<String>,
    pub extracted_event_id: Option<Uuid>,
}
