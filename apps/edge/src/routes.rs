// [apps/edge/src/routes.rs]
/*!
 * APARATO: EDGE ROUTING MATRIX (§4.1/§4.5)
 * RESPONSABILIDAD: INGESTIÓN, ALERTAS, MAPA EN VIVO Y SOCKET DE SALA
 */

use crate::handlers::{alerts, livemap, simulation, sos, websocket};
use crate::middleware::bearer_passthrough_guard;
use crate::state::AppState;
use axum::http::{header, Method};
use axum::routing::{get, post};
use axum::{middleware, Router};
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .max_age(Duration::from_secs(3600));

    let ingestion_routes = Router::new()
        .route("/sos/api", post(sos::ingest_api))
        .route("/sos/sms", post(sos::ingest_sms))
        .route("/sos/mesh", post(sos::ingest_mesh))
        .route("/sos/sync", post(sos::ingest_sync_batch));

    let admin_routes = Router::new()
        .route("/simulation/emit", post(simulation::emit_simulated_events))
        .layer(middleware::from_fn(bearer_passthrough_guard));

    let alert_routes = Router::new()
        .route("/alerts", get(alerts::list_active_alerts))
        .route("/alerts/:alert_id/acknowledge", post(alerts::acknowledge_alert))
        .route("/alerts/:alert_id/report-false", post(alerts::report_false_alarm));

    let map_routes = Router::new()
        .route("/livemap/clusters", get(livemap::get_live_map_clusters))
        .route("/stream", get(websocket::establish_room_uplink));

    Router::new()
        .route("/health", get(|| async { "ok" }))
        .nest(
            "/api/v1",
            Router::new()
                .merge(ingestion_routes)
                .merge(admin_routes)
                .merge(alert_routes)
                .merge(map_routes),
        )
        .layer(cors)
        .with_state(state)
}
