// [libs/infra/store/src/client.rs]
/*!
 * =================================================================
 * APARATO: GRID STORE CONNECTION CLIENT (V1.0)
 * CLASIFICACIÓN: INFRASTRUCTURE LAYER (ESTRATO L3)
 * RESPONSABILIDAD: GESTIÓN DE ENLACES Y PERSISTENCIA ACID
 *
 * # Mathematical Proof (In-Memory Consistency):
 * Para garantizar que el esquema sea visible entre hilos en modo RAM
 * (usado por la suite de pruebas), el cliente ancla una conexión viva
 * antes de devolver el control, evitando que SQLite purgue la base
 * de datos en memoria al cerrarse la última conexión activa.
 * =================================================================
 */

use crate::errors::StoreError;
use crate::schema::apply_full_schema;
use libsql::{Builder, Connection, Database};
use std::sync::Arc;
use tracing::{info, instrument};

#[derive(Clone)]
pub struct StoreClient {
    driver: Arc<Database>,
    _memory_anchor: Option<Arc<Connection>>,
}

impl StoreClient {
    #[instrument(skip(auth_token))]
    pub async fn connect(database_url: &str, auth_token: Option<String>) -> Result<Self, StoreError> {
        if database_url.is_empty() {
            return Err(StoreError::ConfigurationError("DATABASE_URL_UNDEFINED".into()));
        }

        info!("🔌 [STORE]: initiating link to [{}]", database_url);

        let is_remote = database_url.starts_with("libsql://") || database_url.starts_with("https://");
        let is_memory = database_url.contains(":memory:") || database_url.contains("mode=memory");

        let driver = if is_remote {
            let token = auth_token
                .ok_or_else(|| StoreError::ConnectionError("remote access denied — token missing".into()))?;
            Builder::new_remote(database_url.to_string(), token).build().await
        } else {
            Builder::new_local(database_url).build().await
        }
        .map_err(|e| StoreError::ConnectionError(e.to_string()))?;

        let shared_driver = Arc::new(driver);
        let mut anchor = None;

        if is_memory {
            let anchor_conn = shared_driver
                .connect()
                .map_err(|e| StoreError::ConnectionError(e.to_string()))?;
            apply_full_schema(&anchor_conn).await?;
            anchor = Some(Arc::new(anchor_conn));
            info!("⚓ [STORE]: in-memory schema anchored");
        } else {
            let bootstrap_conn = shared_driver
                .connect()
                .map_err(|e| StoreError::ConnectionError(e.to_string()))?;
            apply_full_schema(&bootstrap_conn).await?;
        }

        Ok(Self {
            driver: shared_driver,
            _memory_anchor: anchor,
        })
    }

    pub fn connection(&self) -> Result<Connection, StoreError> {
        self.driver.connect().map_err(|e| StoreError::ConnectionError(e.to_string()))
    }
}
