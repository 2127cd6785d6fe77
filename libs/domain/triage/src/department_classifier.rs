// [libs/domain/triage/src/department_classifier.rs]
/*!
 * APARATO: DEPARTMENT CLASSIFIER (STAGE B FALLBACK)
 * RESPONSABILIDAD: ENRUTAMIENTO DETERMINISTA POR PALABRAS CLAVE CUANDO
 *                   EL CLASIFICADOR LLM NO ESTÁ DISPONIBLE
 *
 * Priority order: phrase overrides, then keyword score (police vs.
 * civil defense, tie breaks to police), then patient-status fallback,
 * then hospital by default.
 */

use crate::keyword_lexicon::{keyword_score, CIVIL_DEFENSE_KEYWORDS, POLICE_KEYWORDS};
use pulsegrid_domain_models::enums::{Department, PatientStatus};

const PHRASE_OVERRIDES_TO_POLICE: &[&str] = &["bomb threat", "suspicious package"];

pub fn classify_department_from_message(message: &str, patient_status: PatientStatus) -> Department {
    if message.trim().is_empty() {
        return status_fallback(patient_status);
    }

    let lowercase = message.to_lowercase();

    if PHRASE_OVERRIDES_TO_POLICE.iter().any(|phrase| lowercase.contains(phrase)) {
        return Department::Police;
    }

    let police_score = keyword_score(&lowercase, POLICE_KEYWORDS);
    let civil_score = keyword_score(&lowercase, CIVIL_DEFENSE_KEYWORDS);

    match police_score.cmp(&civil_score) {
        std::cmp::Ordering::Greater => Department::Police,
        std::cmp::Ordering::Less => Department::CivilDefense,
        std::cmp::Ordering::Equal if police_score > 0 => Department::Police,
        std::cmp::Ordering::Equal => status_fallback(patient_status),
    }
}

fn status_fallback(patient_status: PatientStatus) -> Department {
    match patient_status {
        PatientStatus::Trapped | PatientStatus::Evacuate => Department::CivilDefense,
        _ => Department::Hospital,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bomb_threat_phrase_overrides_to_police() {
        let dept = classify_department_from_message("possible bomb threat at the station", PatientStatus::Injured);
        assert_eq!(dept, Department::Police);
    }

    #[test]
    fn civil_defense_keywords_win_over_empty_police_score() {
        let dept = classify_department_from_message("building collapsed, people trapped under rubble", PatientStatus::Injured);
        assert_eq!(dept, Department::CivilDefense);
    }

    #[test]
    fn tied_nonzero_scores_break_to_police() {
        let dept = classify_department_from_message("armed man near the fire", PatientStatus::Injured);
        assert_eq!(dept, Department::Police);
    }

    #[test]
    fn empty_message_falls_back_on_status() {
        assert_eq!(classify_department_from_message("", PatientStatus::Trapped), Department::CivilDefense);
        assert_eq!(classify_department_from_message("", PatientStatus::Safe), Department::Hospital);
    }
}
