// [libs/domain/triage/src/risk_scorer.rs]
/*!
 * APARATO: RISK SCORER (STAGE A FALLBACK)
 * RESPONSABILIDAD: PUNTUACIÓN DE PRIORIDAD CUANDO EL LLM NO RESPONDE
 *
 * Pure function over a gathered context snapshot — no I/O here. The
 * triage pipeline assembles `RiskContext` from the store and geo crates
 * before calling in; this module never touches a connection.
 */

use pulsegrid_domain_models::enums::{LivingSituation, Mobility};

#[derive(Debug, Clone, Copy)]
pub struct RiskContext {
    pub patient_mobility: Option<Mobility>,
    pub patient_living_situation: Option<LivingSituation>,
    pub patient_trust_score: f64,
    pub corroborating_alert_count: u32,
    pub telegram_corroborated: bool,
}

impl RiskContext {
    fn is_vulnerable(&self) -> bool {
        matches!(self.patient_mobility, Some(Mobility::Bedridden) | Some(Mobility::Wheelchair))
            || matches!(self.patient_living_situation, Some(LivingSituation::Alone))
    }
}

const BASE_PRIORITY_SCORE: f64 = 50.0;
const VULNERABILITY_BONUS: f64 = 15.0;
const CORROBORATION_BONUS_PER_ALERT: f64 = 5.0;
const CORROBORATION_BONUS_CAP: f64 = 20.0;
const TELEGRAM_CORROBORATION_BONUS: f64 = 10.0;
const TRUST_PENALTY_FLOOR: f64 = 0.5;
const TRUST_PENALTY_MAX: f64 = 20.0;
const TRUST_PENALTY_MIN: f64 = 10.0;

/// `priority_score = 50 + vulnerability + corroboration(capped) + telegram − trust_penalty`,
/// clamped to `[0, 100]` per the rule-based fallback pipeline (§4.2).
pub fn compute_priority_score(context: &RiskContext) -> u8 {
    let mut score = BASE_PRIORITY_SCORE;

    if context.is_vulnerable() {
        score += VULNERABILITY_BONUS;
    }

    let corroboration_bonus = (context.corroborating_alert_count as f64 * CORROBORATION_BONUS_PER_ALERT)
        .min(CORROBORATION_BONUS_CAP);
    score += corroboration_bonus;

    if context.telegram_corroborated {
        score += TELEGRAM_CORROBORATION_BONUS;
    }

    score -= trust_penalty(context.patient_trust_score);

    score.clamp(0.0, 100.0).round() as u8
}

/// Linear penalty across `trust_score ∈ [0, 0.5)`: a trust score of 0 draws the
/// maximum 20-point penalty, a trust score at the 0.5 floor draws none.
fn trust_penalty(trust_score: f64) -> f64 {
    if trust_score >= TRUST_PENALTY_FLOOR {
        return 0.0;
    }
    let fraction_below_floor = (TRUST_PENALTY_FLOOR - trust_score.max(0.0)) / TRUST_PENALTY_FLOOR;
    TRUST_PENALTY_MIN + fraction_below_floor * (TRUST_PENALTY_MAX - TRUST_PENALTY_MIN)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn baseline() -> RiskContext {
        RiskContext {
            patient_mobility: None,
            patient_living_situation: None,
            patient_trust_score: 1.0,
            corroborating_alert_count: 0,
            telegram_corroborated: false,
        }
    }

    #[test]
    fn baseline_context_scores_fifty() {
        assert_eq!(compute_priority_score(&baseline()), 50);
    }

    #[test]
    fn vulnerable_patient_gets_bonus() {
        let ctx = RiskContext { patient_mobility: Some(Mobility::Wheelchair), ..baseline() };
        assert_eq!(compute_priority_score(&ctx), 65);
    }

    #[test]
    fn corroboration_bonus_caps_at_twenty() {
        let ctx = RiskContext { corroborating_alert_count: 10, ..baseline() };
        assert_eq!(compute_priority_score(&ctx), 70);
    }

    #[test]
    fn zero_trust_draws_maximum_penalty() {
        let ctx = RiskContext { patient_trust_score: 0.0, ..baseline() };
        assert_eq!(compute_priority_score(&ctx), 30);
    }

    #[test]
    fn trust_at_floor_draws_no_penalty() {
        let ctx = RiskContext { patient_trust_score: 0.5, ..baseline() };
        assert_eq!(compute_priority_score(&ctx), 50);
    }
}
