// [apps/edge/src/middleware.rs]
/*!
 * APARATO: MINIMAL BEARER PASSTHROUGH GUARD (§10, carried as ambient plumbing)
 * RESPONSABILIDAD: PRESENCIA DE TOKEN, NO MODELO DE ROLES/CLAIMS
 *
 * La especificación excluye explícitamente un modelo de autorización
 * completo; este guardia solo verifica que exista un portador y lo
 * expone como identidad opaca — nunca decodifica ni valida firma.
 */

use axum::extract::Request;
use axum::http::{header, StatusCode};
use axum::middleware::Next;
use axum::response::Response;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct CallerIdentity {
    pub token: String,
}

pub async fn bearer_passthrough_guard(mut req: Request, next: Next) -> Result<Response, StatusCode> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::to_string);

    let Some(token) = token else {
        return Err(StatusCode::UNAUTHORIZED);
    };

    debug!("🔑 [AUTH_PASSTHROUGH]: bearer token present, no claim validation performed");
    req.extensions_mut().insert(CallerIdentity { token });
    Ok(next.run(req).await)
}
