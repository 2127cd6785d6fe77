// [apps/worker/src/state.rs]
/*!
 * APARATO: WORKER SHARED STATE
 * RESPONSABILIDAD: MISMO CONJUNTO DE REPOSITORIOS Y CLIENTES NARROW QUE EL BORDE,
 * SIN EL ESTRATO HTTP
 */

use pulsegrid_infra_bus::InProcessBroker;
use pulsegrid_infra_llm::{EmbeddingClient, LlmClient, VectorIndexClient};
use pulsegrid_infra_store::{
    AlertRepository, FacilityRepository, GeoEventRepository, IntelChannelRepository,
    IntelMessageRepository, PatientRepository, SosRepository, StoreClient,
};
use std::sync::Arc;

#[derive(Clone)]
pub struct WorkerState {
    pub store: StoreClient,
    pub broker: Arc<InProcessBroker>,
    pub llm: Arc<LlmClient>,
    pub embeddings: Arc<EmbeddingClient>,
    pub vector_index: Arc<VectorIndexClient>,

    pub patients: Arc<PatientRepository>,
    pub facilities: Arc<FacilityRepository>,
    pub sos_requests: Arc<SosRepository>,
    pub alerts: Arc<AlertRepository>,
    pub geo_events: Arc<GeoEventRepository>,
    pub intel_channels: Arc<IntelChannelRepository>,
    pub intel_messages: Arc<IntelMessageRepository>,
}

impl WorkerState {
    pub fn new(
        store: StoreClient,
        broker: Arc<InProcessBroker>,
        llm: LlmClient,
        embeddings: EmbeddingClient,
        vector_index: VectorIndexClient,
    ) -> Self {
        Self {
            patients: Arc::new(PatientRepository::new(store.clone())),
            facilities: Arc::new(FacilityRepository::new(store.clone())),
            sos_requests: Arc::new(SosRepository::new(store.clone())),
            alerts: Arc::new(AlertRepository::new(store.clone())),
            geo_events: Arc::new(GeoEventRepository::new(store.clone())),
            intel_channels: Arc::new(IntelChannelRepository::new(store.clone())),
            intel_messages: Arc::new(IntelMessageRepository::new(store.clone())),
            store,
            broker,
            llm: Arc::new(llm),
            embeddings: Arc::new(embeddings),
            vector_index: Arc::new(vector_index),
        }
    }
}
