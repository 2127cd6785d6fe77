// [apps/edge/src/state/mod.rs]
/*!
 * =================================================================
 * APARATO: EDGE SHARED STATE (V1.0)
 * CLASIFICACIÓN: APPLICATION STATE (ESTRATO L1-APP)
 * RESPONSABILIDAD: COMPOSICIÓN DE REPOSITORIOS, BUS Y CLIENTES NARROW
 *
 * Un solo `StoreClient` (que ya envuelve un `Arc<Database>`) respalda
 * cada repositorio; clonar `AppState` es barato porque todo su interior
 * es un handle compartido, nunca un dato copiado.
 * =================================================================
 */

use pulsegrid_infra_bus::InProcessBroker;
use pulsegrid_infra_llm::{EmbeddingClient, LlmClient, VectorIndexClient};
use pulsegrid_infra_store::{
    AlertRepository, FacilityRepository, GeoEventRepository, IntelChannelRepository,
    IntelMessageRepository, PatientRepository, SosRepository, StoreClient,
};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
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

    pub sms_master_key: Arc<[u8; 32]>,
}

impl AppState {
    pub fn new(
        store: StoreClient,
        broker: Arc<InProcessBroker>,
        llm: LlmClient,
        embeddings: EmbeddingClient,
        vector_index: VectorIndexClient,
        sms_master_key: [u8; 32],
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
            sms_master_key: Arc::new(sms_master_key),
        }
    }
}
