// [apps/edge/src/kernel.rs]
/*!
 * APARATO: EDGE COMPOSITION ROOT
 * RESPONSABILIDAD: ENSAMBLADO DE INFRAESTRUCTURA E IGNICIÓN DEL SERVIDOR
 */

use crate::routes::create_router;
use crate::state::AppState;
use pulsegrid_domain_crypto::derive_master_key_material;
use pulsegrid_infra_bus::InProcessBroker;
use pulsegrid_infra_llm::{EmbeddingClient, LlmClient, VectorIndexClient};
use pulsegrid_infra_store::StoreClient;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use tracing::{error, info, instrument};

pub struct EdgeKernel {
    port: u16,
    state: AppState,
}

impl EdgeKernel {
    #[instrument(skip(database_auth_token, master_key_secret))]
    pub async fn ignite(
        database_url: &str,
        database_auth_token: Option<String>,
        master_key_secret: &str,
        llm_api_key: Option<String>,
        llm_base_url: String,
        llm_model: String,
        embedding_api_key: Option<String>,
        embedding_base_url: String,
        vector_index_base_url: String,
        vector_index_collection: String,
        port: u16,
    ) -> Self {
        let store = StoreClient::connect(database_url, database_auth_token)
            .await
            .expect("FATAL: store connection collapse — ignition aborted");

        let broker = Arc::new(InProcessBroker::new());
        let llm = LlmClient::new(llm_api_key, llm_base_url, llm_model);
        let embeddings = EmbeddingClient::new(embedding_api_key, embedding_base_url);
        let vector_index = VectorIndexClient::new(vector_index_base_url, vector_index_collection);
        let master_key = derive_master_key_material(master_key_secret);

        let state = AppState::new(store, broker, llm, embeddings, vector_index, master_key);

        Self { port, state }
    }

    pub async fn serve(self) {
        let router = create_router(self.state);
        let bind_address = SocketAddr::new("0.0.0.0".parse::<IpAddr>().unwrap(), self.port);

        let listener = tokio::net::TcpListener::bind(bind_address)
            .await
            .expect("FATAL: failed to bind network port");

        info!(port = self.port, "🚀 [EDGE_ONLINE]: ingestion edge listening");

        if let Err(e) = axum::serve(listener, router).await {
            error!("💀 [EDGE_COLLAPSE]: server runtime failure: {}", e);
            std::process::exit(1);
        }
    }
}
