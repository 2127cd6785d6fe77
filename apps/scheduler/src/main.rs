// [apps/scheduler/src/main.rs]
/*!
 * APARATO: SCHEDULER MAIN ENTRY POINT
 * RESPONSABILIDAD: ARRANQUE DEL TRABAJO DE LIMPIEZA PERIÓDICA
 */

use dotenvy::dotenv;
use pulsegrid_scheduler::prelude::*;
use pulsegrid_shared_telemetry::init_tracing;
use tracing::info;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    init_tracing("pulsegrid_scheduler");

    let runtime = tokio::runtime::Builder::new_multi_thread().enable_all().build()?;

    runtime.block_on(async {
        info!("🧹 [SCHEDULER_BOOT]: ignition sequence starting...");

        let database_url = std::env::var("DATABASE_URL").unwrap_or_else(|_| "file:pulsegrid.db".to_string());
        let database_auth_token = std::env::var("TURSO_AUTH_TOKEN").ok();

        let kernel = SchedulerKernel::ignite(&database_url, database_auth_token).await;
        kernel.launch_jobs();

        info!("🧹 [SCHEDULER_BOOT]: jobs running, parking main task");
        std::future::pending::<()>().await;

        Ok(())
    })
}
