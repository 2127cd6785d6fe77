// [apps/edge/src/handlers/livemap.rs]
/*!
 * APARATO: LIVE MAP QUERY SURFACE (§4.4)
 * RESPONSABILIDAD: AGRUPAMIENTO DE CUADRÍCULA BAJO DEMANDA
 */

use crate::state::AppState;
use axum::extract::{Query, State};
use axum::Json;
use pulsegrid_domain_geo::{cluster_geo_events, DEFAULT_CLUSTER_PRECISION_DEG};
use pulsegrid_domain_models::geo_event::GeoCluster;
use pulsegrid_shared_errors::CoreError;
use serde::Deserialize;
use tracing::instrument;

#[derive(Debug, Deserialize)]
pub struct LiveMapQuery {
    pub precision_deg: Option<f64>,
}

#[instrument(skip(state))]
pub async fn get_live_map_clusters(
    State(state): State<AppState>,
    Query(query): Query<LiveMapQuery>,
) -> Result<Json<Vec<GeoCluster>>, CoreError> {
    let events = state.geo_events.find_all().await.map_err(|e| CoreError::DependencyUnavailable(e.to_string()))?;
    let precision = query.precision_deg.unwrap_or(DEFAULT_CLUSTER_PRECISION_DEG);
    Ok(Json(cluster_geo_events(&events, precision)))
}
