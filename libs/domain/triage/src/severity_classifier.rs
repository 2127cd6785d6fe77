// [libs/domain/triage/src/severity_classifier.rs]
/*!
 * APARATO: ALERT BASELINE SEVERITY CLASSIFIER
 * RESPONSABILIDAD: SEVERIDAD POR DEFECTO CUANDO LA ALERTA NO TRAE UN
 *                   OVERRIDE EXPLÍCITO (§4.3)
 */

use pulsegrid_domain_models::enums::{EventType, Severity};

pub fn baseline_severity(event_type: EventType, confidence: f64) -> Severity {
    let baseline = match event_type {
        EventType::Bombing | EventType::Shooting | EventType::Chemical => Severity::Critical,
        EventType::BuildingCollapse | EventType::Earthquake | EventType::Fire => Severity::High,
        EventType::Flood | EventType::Infrastructure | EventType::MedicalEmergency => Severity::Medium,
        EventType::Other => Severity::Low,
    };

    if confidence >= 0.8 && baseline != Severity::Critical {
        baseline.promote()
    } else {
        baseline
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn high_confidence_promotes_one_level() {
        assert_eq!(baseline_severity(EventType::Fire, 0.9), Severity::Critical);
    }

    #[test]
    fn low_confidence_keeps_baseline() {
        assert_eq!(baseline_severity(EventType::Fire, 0.5), Severity::High);
    }

    #[test]
    fn critical_baseline_never_promotes_past_itself() {
        assert_eq!(baseline_severity(EventType::Bombing, 0.95), Severity::Critical);
    }
}
