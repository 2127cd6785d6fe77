// [libs/shared/errors/src/lib.rs]
/*!
 * =================================================================
 * APARATO: GRID ERROR CATALOG (V1.0 - SOBERANO)
 * CLASIFICACIÓN: SHARED CORE (ESTRATO L2)
 * RESPONSABILIDAD: CATALOGACIÓN SEMÁNTICA DE FALLOS DE DOMINIO
 *
 * VISION HIPER-HOLÍSTICA:
 * Unifica los ocho tipos de fallo que cruzan cualquier frontera de
 * componente (ingestión, triage, bus, intel) en un único catálogo
 * para que el borde HTTP tenga una única tabla de mapeo a estados.
 * =================================================================
 */

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

/// Catálogo soberano de fallos de dominio, compartido por todas las crates.
///
/// Cada subsistema (ingestión, triage, bus, intel, ...) define su propio
/// enum de error local y lo convierte a `CoreError` en la frontera de su
/// API pública; el borde HTTP solo conoce este catálogo.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Coordenadas malformadas, enum desconocido, entero fuera de rango.
    #[error("[CORE_INVALID_PAYLOAD]: {0}")]
    InvalidPayload(String),

    /// Colisión de clave de idempotencia; nunca se propaga como fallo HTTP.
    #[error("[CORE_DUPLICATE]: prior_id={0}")]
    Duplicate(uuid::Uuid),

    /// Entidad referenciada ausente.
    #[error("[CORE_NOT_FOUND]: {0}")]
    NotFound(String),

    /// Fallo de autenticación.
    #[error("[CORE_UNAUTHORIZED]: {0}")]
    Unauthorized(String),

    /// Fallo de autorización por rol/propiedad.
    #[error("[CORE_FORBIDDEN]: {0}")]
    Forbidden(String),

    /// Fallo de descifrado del sobre SMS.
    #[error("[CORE_CRYPTO_FAULT]: {0}")]
    CryptoError(String),

    /// LLM, índice vectorial o broker lentos o ausentes.
    #[error("[CORE_DEPENDENCY_TIMEOUT]: {0}")]
    DependencyTimeout(String),

    /// Fallo de persistencia; el llamador reintenta.
    #[error("[CORE_DEPENDENCY_UNAVAILABLE]: {0}")]
    DependencyUnavailable(String),

    /// Límite de tasa excedido.
    #[error("[CORE_RATE_LIMIT]: retry_after={0}s")]
    RateLimitExceeded(u64),
}

impl IntoResponse for CoreError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            CoreError::InvalidPayload(_) => (StatusCode::BAD_REQUEST, "invalid_payload"),
            CoreError::Duplicate(_) => (StatusCode::OK, "duplicate"),
            CoreError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            CoreError::Unauthorized(_) => (StatusCode::UNAUTHORIZED, "unauthorized"),
            CoreError::Forbidden(_) => (StatusCode::FORBIDDEN, "forbidden"),
            CoreError::CryptoError(_) => (StatusCode::BAD_REQUEST, "crypto_error"),
            CoreError::DependencyTimeout(_) => (StatusCode::OK, "degraded"),
            CoreError::DependencyUnavailable(_) => {
                (StatusCode::SERVICE_UNAVAILABLE, "dependency_unavailable")
            }
            CoreError::RateLimitExceeded(_) => (StatusCode::TOO_MANY_REQUESTS, "rate_limited"),
        };

        tracing::warn!(error = %self, code, "⚠️ [API_FAULT]: request rejected");

        let mut body = json!({ "error": code, "detail": self.to_string() });
        if let CoreError::Duplicate(id) = &self {
            body["prior_id"] = json!(id);
            body["is_duplicate"] = json!(true);
        }
        if let CoreError::RateLimitExceeded(secs) = &self {
            body["retry_after"] = json!(secs);
        }

        (status, Json(body)).into_response()
    }
}
