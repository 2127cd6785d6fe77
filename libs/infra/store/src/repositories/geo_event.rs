// [libs/infra/store/src/repositories/geo_event.rs]
use crate::errors::StoreError;
use crate::mapping;
use crate::StoreClient;
use libsql::{params, Row};
use pulsegrid_domain_models::geo_event::GeoEvent;
use tracing::instrument;
use uuid::Uuid;

pub struct GeoEventRepository {
    client: StoreClient,
}

impl GeoEventRepository {
    pub fn new(client: StoreClient) -> Self {
        Self { client }
    }

    const SELECT_COLUMNS: &'static str = "id, event_type, source, severity, layer, latitude,
        longitude, title, details, metadata, created_at, expires_at";

    fn from_row(row: &Row) -> Result<GeoEvent, StoreError> {
        Ok(GeoEvent {
            id: Uuid::parse_str(&row.get::<String>(0)?).map_err(|e| StoreError::MappingError(e.to_string()))?,
            event_type: row.get(1)?,
            source: mapping::parse_enum(&row.get::<String>(2)?)?,
            severity: row.get::<i64>(3)? as u8,
            layer: mapping::parse_enum(&row.get::<String>(4)?)?,
            latitude: row.get(5)?,
            longitude: row.get(6)?,
            title: row.get(7)?,
            details: row.get(8)?,
            metadata: serde_json::from_str(&row.get::<String>(9)?).map_err(|e| StoreError::MappingError(e.to_string()))?,
            created_at: mapping::parse_rfc3339(&row.get::<String>(10)?)?,
            expires_at: mapping::parse_rfc3339(&row.get::<String>(11)?)?,
        })
    }

    #[instrument(skip(self, event))]
    pub async fn insert(&self, event: &GeoEvent) -> Result<(), StoreError> {
        let connection = self.client.connection()?;
        connection
            .execute(
                r#"
                INSERT INTO geo_events (
                    id, event_type, source, severity, layer, latitude, longitude, title,
                    details, metadata, created_at, expires_at
                ) VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11,?12)
                "#,
                params![
                    event.id.to_string(),
                    event.event_type.clone(),
                    mapping::enum_str(&event.source)?,
                    event.severity as i64,
                    mapping::enum_str(&event.layer)?,
                    event.latitude,
                    event.longitude,
                    event.title.clone(),
                    event.details.clone(),
                    event.metadata.to_string(),
                    mapping::to_rfc3339(&event.created_at),
                    mapping::to_rfc3339(&event.expires_at),
                ],
            )
            .await?;
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn update_metadata(&self, id: Uuid, metadata: &serde_json::Value) -> Result<(), StoreError> {
        let connection = self.client.connection()?;
        let affected = connection
            .execute(
                "UPDATE geo_events SET metadata = ?1 WHERE id = ?2",
                params![metadata.to_string(), id.to_string()],
            )
            .await?;
        if affected == 0 {
            return Err(StoreError::NotFound(format!("geo_event {id}")));
        }
        Ok(())
    }

    /// Every row not yet expired, for in-process grid clustering (§4.4) — the GC sweep
    /// reaps expired rows on its own schedule, so read paths never filter on `expires_at`
    /// themselves.
    #[instrument(skip(self))]
    pub async fn find_all(&self) -> Result<Vec<GeoEvent>, StoreError> {
        let connection = self.client.connection()?;
        let sql = format!("SELECT {} FROM geo_events ORDER BY created_at DESC", Self::SELECT_COLUMNS);
        let mut rows = connection.query(&sql, ()).await?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().await? {
            out.push(Self::from_row(&row)?);
        }
        Ok(out)
    }

    #[instrument(skip(self))]
    pub async fn find_by_source(&self, source: pulsegrid_domain_models::enums::GeoEventSource) -> Result<Vec<GeoEvent>, StoreError> {
        let connection = self.client.connection()?;
        let sql = format!("SELECT {} FROM geo_events WHERE source = ?1 ORDER BY created_at DESC", Self::SELECT_COLUMNS);
        let mut rows = connection.query(&sql, params![mapping::enum_str(&source)?]).await?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().await? {
            out.push(Self::from_row(&row)?);
        }
        Ok(out)
    }

    /// Garbage-collects events whose TTL has elapsed as of `now`; returns the count reaped.
    #[instrument(skip(self))]
    pub async fn delete_expired(&self, now: chrono::DateTime<chrono::Utc>) -> Result<u64, StoreError> {
        let connection = self.client.connection()?;
        let affected = connection
            .execute("DELETE FROM geo_events WHERE expires_at < ?1", params![mapping::to_rfc3339(&now)])
            .await?;
        Ok(affected)
    }
}
