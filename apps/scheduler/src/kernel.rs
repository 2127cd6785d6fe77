// [apps/scheduler/src/kernel.rs]
/*!
 * APARATO: SCHEDULER KERNEL
 * RESPONSABILIDAD: RAÍZ DE COMPOSICIÓN PARA LOS TRABAJOS PERIÓDICOS DE LIMPIEZA
 */

use crate::jobs::geo_event_gc::GeoEventGcJob;
use crate::state::SchedulerState;
use pulsegrid_infra_store::StoreClient;
use std::sync::Arc;

pub struct SchedulerKernel {
    state: SchedulerState,
}

impl SchedulerKernel {
    pub async fn ignite(database_url: &str, database_auth_token: Option<String>) -> Self {
        let store = StoreClient::connect(database_url, database_auth_token)
            .await
            .expect("CRITICAL: scheduler could not connect to the store");
        let state = SchedulerState::new(store);
        Self { state }
    }

    pub fn launch_jobs(self) {
        Arc::new(GeoEventGcJob::new(self.state.geo_events.clone(), self.state.alerts.clone())).spawn_daemon();
    }
}
