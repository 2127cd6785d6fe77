// [apps/scheduler/src/jobs/geo_event_gc.rs]
/*!
 * APARATO: GEO EVENT & ALERT GARBAGE COLLECTOR (§4.4)
 * RESPONSABILIDAD: PURGA DE FILAS EXPIRADAS DE LA SALA DEL MAPA VIVO
 *
 * El visor en vivo lee `geo_events`/`alerts` completos en cada
 * petición (§4.4); sin una purga periódica, filas con `expires_at`
 * vencido seguirían inflando ese barrido indefinidamente.
 */

use pulsegrid_infra_store::{AlertRepository, GeoEventRepository, StoreError};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, instrument};

const SWEEP_INTERVAL_SECS: u64 = 300;

pub struct GeoEventGcJob {
    geo_events: Arc<GeoEventRepository>,
    alerts: Arc<AlertRepository>,
}

impl GeoEventGcJob {
    pub fn new(geo_events: Arc<GeoEventRepository>, alerts: Arc<AlertRepository>) -> Self {
        Self { geo_events, alerts }
    }

    pub fn spawn_daemon(self: Arc<Self>) {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(Duration::from_secs(SWEEP_INTERVAL_SECS));
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                if let Err(error) = self.sweep().await {
                    error!(%error, "⚠️ [GEO_EVENT_GC]: sweep failed");
                }
            }
        });
    }

    #[instrument(skip(self))]
    async fn sweep(&self) -> Result<(), StoreError> {
        let now = chrono::Utc::now();
        let expired_events = self.geo_events.delete_expired(now).await?;
        let expired_alerts = self.alerts.delete_expired(now).await?;
        info!(expired_events, expired_alerts, "🧹 [GEO_EVENT_GC]: reaped expired rows");
        Ok(())
    }
}
