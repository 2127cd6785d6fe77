// [apps/scheduler/src/state.rs]
/*!
 * APARATO: SCHEDULER SHARED STATE
 * RESPONSABILIDAD: SOLO LOS REPOSITORIOS QUE LOS TRABAJOS DE LIMPIEZA NECESITAN,
 * SIN BUS NI CLIENTES LLM
 */

use pulsegrid_infra_store::{AlertRepository, GeoEventRepository, StoreClient};
use std::sync::Arc;

#[derive(Clone)]
pub struct SchedulerState {
    pub store: StoreClient,
    pub alerts: Arc<AlertRepository>,
    pub geo_events: Arc<GeoEventRepository>,
}

impl SchedulerState {
    pub fn new(store: StoreClient) -> Self {
        Self {
            alerts: Arc::new(AlertRepository::new(store.clone())),
            geo_events: Arc::new(GeoEventRepository::new(store.clone())),
            store,
        }
    }
}
