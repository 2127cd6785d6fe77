// [apps/edge/src/main.rs]
/*!
 * APARATO: EDGE MAIN ENTRY POINT
 * RESPONSABILIDAD: CARGA DE ENTORNO E IGNICIÓN DEL KERNEL
 */

use dotenvy::dotenv;
use pulsegrid_edge::prelude::*;
use pulsegrid_shared_telemetry::init_tracing;
use tracing::info;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    init_tracing("pulsegrid_edge");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_stack_size(4 * 1024 * 1024)
        .build()?;

    runtime.block_on(async {
        info!("🛰️  [EDGE_BOOT]: ignition sequence starting...");

        let database_url = std::env::var("DATABASE_URL").unwrap_or_else(|_| "file:pulsegrid.db".to_string());
        let database_auth_token = std::env::var("TURSO_AUTH_TOKEN").ok();
        let master_key_secret = std::env::var("ENCRYPTION_MASTER_KEY")
            .expect("CRITICAL: ENCRYPTION_MASTER_KEY not defined in runtime environment.");

        let llm_api_key = std::env::var("LLM_API_KEY").ok();
        let llm_base_url = std::env::var("LLM_BASE_URL").unwrap_or_else(|_| "https://api.openai.com/v1".to_string());
        let llm_model = std::env::var("LLM_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string());

        let embedding_api_key = std::env::var("EMBEDDING_API_KEY").ok();
        let embedding_base_url = std::env::var("EMBEDDING_BASE_URL").unwrap_or_else(|_| "https://api.openai.com/v1".to_string());

        let vector_index_base_url = std::env::var("VECTOR_INDEX_URL").unwrap_or_default();
        let vector_index_collection = std::env::var("VECTOR_INDEX_COLLECTION").unwrap_or_else(|_| "pulsegrid_intel".to_string());

        let port: u16 = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string()).parse().unwrap_or(3000);

        let kernel = EdgeKernel::ignite(
            &database_url,
            database_auth_token,
            &master_key_secret,
            llm_api_key,
            llm_base_url,
            llm_model,
            embedding_api_key,
            embedding_base_url,
            vector_index_base_url,
            vector_index_collection,
            port,
        )
        .await;

        kernel.serve().await;

        Ok(())
    })
}
