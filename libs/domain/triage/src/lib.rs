// [libs/domain/triage/src/lib.rs]
/*!
 * =================================================================
 * APARATO: TRIAGE DECISION ENGINE (V1.0)
 * CLASIFICACIÓN: DOMAIN CORE (ESTRATO L2)
 * RESPONSABILIDAD: CLASIFICACIÓN DE DEPARTAMENTO, SEVERIDAD Y PRIORIDAD
 *                   SIN TOCAR RED NI ALMACENAMIENTO
 *
 * Todo lo expuesto aquí es una función pura sobre datos ya reunidos.
 * La orquestación de E/S (reunir contexto, llamar al LLM, persistir el
 * resultado) vive en el proceso worker, nunca en este crate.
 * =================================================================
 */

pub mod department_classifier;
pub mod keyword_lexicon;
pub mod pipeline;
pub mod risk_scorer;
pub mod severity_classifier;

pub use department_classifier::classify_department_from_message;
pub use pipeline::{run_fallback_triage, FallbackTriageInput, FallbackTriageOutcome};
pub use risk_scorer::{compute_priority_score, RiskContext};
pub use severity_classifier::baseline_severity;
