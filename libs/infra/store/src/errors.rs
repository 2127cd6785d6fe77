// [libs/infra/store/src/errors.rs]
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("[STORE_NET_FAULT]: DATABASE_UPLINK_SEVERED -> {0}")]
    ConnectionError(String),

    #[error("[STORE_CONFIG_FAULT]: {0}")]
    ConfigurationError(String),

    #[error("[STORE_QUERY_FAULT]: {0}")]
    QueryError(#[from] libsql::Error),

    #[error("[STORE_MAPPING_FAULT]: {0}")]
    MappingError(String),

    #[error("[STORE_NOT_FOUND]: {0}")]
    NotFound(String),
}
