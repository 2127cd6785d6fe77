// [apps/worker/src/kernel.rs]
/*!
 * APARATO: WORKER KERNEL
 * RESPONSABILIDAD: RAÍZ DE COMPOSICIÓN Y ARRANQUE DE LOS CUATRO DEMONIOS
 */

use crate::services::{
    intel_pipeline::IntelPipeline, resolution_watcher::ResolutionWatcher,
    triage_orchestrator::TriageOrchestrator, verification_loop::VerificationLoop,
};
use crate::state::WorkerState;
use pulsegrid_infra_bus::InProcessBroker;
use pulsegrid_infra_llm::{EmbeddingClient, LlmClient, VectorIndexClient};
use pulsegrid_infra_store::StoreClient;
use std::sync::Arc;
use tracing::info;

pub struct WorkerKernel {
    state: Arc<WorkerState>,
}

impl WorkerKernel {
    #[allow(clippy::too_many_arguments)]
    pub async fn ignite(
        database_url: &str,
        database_auth_token: Option<String>,
        llm_api_key: Option<String>,
        llm_base_url: String,
        llm_model: String,
        embedding_api_key: Option<String>,
        embedding_base_url: String,
        vector_index_base_url: String,
        vector_index_collection: String,
    ) -> Self {
        info!("🧠 [WORKER_BOOT]: connecting to shared store...");
        let store = StoreClient::connect(database_url, database_auth_token)
            .await
            .expect("CRITICAL: worker could not connect to the store");

        let broker = Arc::new(InProcessBroker::new());
        let llm = LlmClient::new(llm_api_key, llm_base_url, llm_model);
        let embeddings = EmbeddingClient::new(embedding_api_key, embedding_base_url);
        let vector_index = VectorIndexClient::new(vector_index_base_url, vector_index_collection);

        let state = Arc::new(WorkerState::new(store, broker, llm, embeddings, vector_index));

        Self { state }
    }

    pub fn launch_daemons(self) {
        info!("🚀 [WORKER_BOOT]: launching background daemons...");
        Arc::new(TriageOrchestrator::new(self.state.clone())).spawn_daemon();
        Arc::new(VerificationLoop::new(self.state.clone())).spawn_daemon();
        Arc::new(ResolutionWatcher::new(self.state.clone())).spawn_daemon();
        Arc::new(IntelPipeline::new(self.state.clone())).spawn_daemon();
    }
}
