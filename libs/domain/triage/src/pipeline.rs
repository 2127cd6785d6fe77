// [libs/domain/triage/src/pipeline.rs]
/*!
 * APARATO: KEYWORD FALLBACK PIPELINE
 * RESPONSABILIDAD: COMPOSICIÓN DE ETAPA A + ETAPA B CUANDO EL LLM FALLA
 *
 * Activated on any LLM exception, timeout, schema violation, or missing
 * credential (§4.2's LLM failure policy). Never calls out — every input
 * is already in hand by the time the orchestrator reaches here.
 */

use crate::department_classifier::classify_department_from_message;
use crate::risk_scorer::{compute_priority_score, RiskContext};
use pulsegrid_domain_models::enums::{Department, EventType, PatientStatus, Severity};

#[derive(Debug, Clone)]
pub struct FallbackTriageInput<'a> {
    pub patient_status: PatientStatus,
    pub sos_severity: u8,
    pub message: &'a str,
    pub risk_context: RiskContext,
}

#[derive(Debug, Clone)]
pub struct FallbackTriageOutcome {
    pub event_type: EventType,
    pub severity: Severity,
    pub routed_department: Department,
    pub priority_score: u8,
}

fn status_event_type(status: PatientStatus) -> EventType {
    match status {
        PatientStatus::Injured => EventType::MedicalEmergency,
        PatientStatus::Trapped => EventType::BuildingCollapse,
        PatientStatus::Evacuate | PatientStatus::Safe => EventType::Other,
    }
}

fn base_severity(sos_severity: u8) -> Severity {
    match sos_severity {
        1 => Severity::Low,
        2 | 3 => Severity::Medium,
        4 => Severity::High,
        _ => Severity::Critical,
    }
}

pub fn run_fallback_triage(input: &FallbackTriageInput) -> FallbackTriageOutcome {
    let event_type = status_event_type(input.patient_status);
    let mut severity = base_severity(input.sos_severity);

    if input.patient_status == PatientStatus::Trapped {
        severity = severity.at_least(Severity::High);
    }
    if input.sos_severity >= 5 {
        severity = Severity::Critical;
    }

    let priority_score = compute_priority_score(&input.risk_context);
    if priority_score >= 80 {
        severity = Severity::Critical;
    } else if priority_score >= 60 {
        severity = severity.at_least(Severity::High);
    }

    let routed_department = classify_department_from_message(input.message, input.patient_status);

    FallbackTriageOutcome {
        event_type,
        severity,
        routed_department,
        priority_score,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn baseline_risk() -> RiskContext {
        RiskContext {
            patient_mobility: None,
            patient_living_situation: None,
            patient_trust_score: 1.0,
            corroborating_alert_count: 0,
            telegram_corroborated: false,
        }
    }

    #[test]
    fn trapped_status_floors_severity_to_high() {
        let input = FallbackTriageInput {
            patient_status: PatientStatus::Trapped,
            sos_severity: 1,
            message: "",
            risk_context: baseline_risk(),
        };
        let outcome = run_fallback_triage(&input);
        assert_eq!(outcome.severity, Severity::High);
        assert_eq!(outcome.event_type, EventType::BuildingCollapse);
    }

    #[test]
    fn sos_severity_five_forces_critical() {
        let input = FallbackTriageInput {
            patient_status: PatientStatus::Injured,
            sos_severity: 5,
            message: "",
            risk_context: baseline_risk(),
        };
        assert_eq!(run_fallback_triage(&input).severity, Severity::Critical);
    }

    #[test]
    fn high_priority_score_promotes_severity_even_without_status_floor() {
        let risk = RiskContext { corroborating_alert_count: 10, telegram_corroborated: true, ..baseline_risk() };
        let input = FallbackTriageInput {
            patient_status: PatientStatus::Injured,
            sos_severity: 2,
            message: "",
            risk_context: risk,
        };
        let outcome = run_fallback_triage(&input);
        assert_eq!(outcome.priority_score, 80);
        assert_eq!(outcome.severity, Severity::Critical);
    }

    #[test]
    fn message_keywords_drive_department_routing() {
        let input = FallbackTriageInput {
            patient_status: PatientStatus::Injured,
            sos_severity: 3,
            message: "gunman with a weapon is shooting",
            risk_context: baseline_risk(),
        };
        assert_eq!(run_fallback_triage(&input).routed_department, Department::Police);
    }
}
