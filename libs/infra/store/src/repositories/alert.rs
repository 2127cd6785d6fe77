// [libs/infra/store/src/repositories/alert.rs]
use crate::errors::StoreError;
use crate::mapping;
use crate::StoreClient;
use libsql::{params, Row};
use pulsegrid_domain_models::alert::Alert;
use tracing::instrument;
use uuid::Uuid;

pub struct AlertRepository {
    client: StoreClient,
}

impl AlertRepository {
    pub fn new(client: StoreClient) -> Self {
        Self { client }
    }

    const SELECT_COLUMNS: &'static str = "id, event_type, severity, latitude, longitude, radius_m,
        source, confidence, metadata, routed_department, target_facility_id, acknowledged_by,
        affected_patients_count, reported_false, created_at, expires_at";

    fn from_row(row: &Row) -> Result<Alert, StoreError> {
        Ok(Alert {
            id: Uuid::parse_str(&row.get::<String>(0)?).map_err(|e| StoreError::MappingError(e.to_string()))?,
            event_type: mapping::parse_enum(&row.get::<String>(1)?)?,
            severity: mapping::parse_enum(&row.get::<String>(2)?)?,
            latitude: row.get(3)?,
            longitude: row.get(4)?,
            radius_m: row.get::<i64>(5)? as u32,
            source: row.get(6)?,
            confidence: row.get(7)?,
            metadata: serde_json::from_str(&row.get::<String>(8)?).map_err(|e| StoreError::MappingError(e.to_string()))?,
            routed_department: mapping::parse_enum_opt(row.get(9)?)?,
            target_facility_id: row
                .get::<Option<String>>(10)?
                .map(|s| Uuid::parse_str(&s))
                .transpose()
                .map_err(|e| StoreError::MappingError(e.to_string()))?,
            acknowledged_by: row
                .get::<Option<String>>(11)?
                .map(|s| Uuid::parse_str(&s))
                .transpose()
                .map_err(|e| StoreError::MappingError(e.to_string()))?,
            affected_patients_count: row.get::<i64>(12)? as u32,
            reported_false: row.get::<i64>(13)? != 0,
            created_at: mapping::parse_rfc3339(&row.get::<String>(14)?)?,
            expires_at: mapping::parse_rfc3339(&row.get::<String>(15)?)?,
        })
    }

    #[instrument(skip(self, alert))]
    pub async fn insert(&self, alert: &Alert) -> Result<(), StoreError> {
        let connection = self.client.connection()?;
        connection
            .execute(
                r#"
                INSERT INTO alerts (
                    id, event_type, severity, latitude, longitude, radius_m, source, confidence,
                    metadata, routed_department, target_facility_id, acknowledged_by,
                    affected_patients_count, reported_false, created_at, expires_at
                ) VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11,?12,?13,?14,?15,?16)
                "#,
                params![
                    alert.id.to_string(),
                    mapping::enum_str(&alert.event_type)?,
                    mapping::enum_str(&alert.severity)?,
                    alert.latitude,
                    alert.longitude,
                    alert.radius_m as i64,
                    alert.source.clone(),
                    alert.confidence,
                    alert.metadata.to_string(),
                    alert.routed_department.map(|d| mapping::enum_str(&d)).transpose()?,
                    alert.target_facility_id.map(|id| id.to_string()),
                    alert.acknowledged_by.map(|id| id.to_string()),
                    alert.affected_patients_count as i64,
                    alert.reported_false as i64,
                    mapping::to_rfc3339(&alert.created_at),
                    mapping::to_rfc3339(&alert.expires_at),
                ],
            )
            .await?;
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Alert>, StoreError> {
        let connection = self.client.connection()?;
        let sql = format!("SELECT {} FROM alerts WHERE id = ?1", Self::SELECT_COLUMNS);
        let mut rows = connection.query(&sql, params![id.to_string()]).await?;
        match rows.next().await? {
            Some(row) => Ok(Some(Self::from_row(&row)?)),
            None => Ok(None),
        }
    }

    /// All non-expired alerts, as of the caller's clock — used for the corroboration
    /// window (§4.2) and the live-map feed (§4.1). Expiry filtering happens in Rust
    /// since `expires_at` comparisons against a caller-supplied `now` keep the query
    /// free of embedded-engine date functions.
    #[instrument(skip(self))]
    pub async fn find_active(&self) -> Result<Vec<Alert>, StoreError> {
        let connection = self.client.connection()?;
        let sql = format!("SELECT {} FROM alerts ORDER BY created_at DESC", Self::SELECT_COLUMNS);
        let mut rows = connection.query(&sql, ()).await?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().await? {
            out.push(Self::from_row(&row)?);
        }
        Ok(out)
    }

    #[instrument(skip(self))]
    pub async fn acknowledge(&self, id: Uuid, operator_id: Uuid) -> Result<(), StoreError> {
        let connection = self.client.connection()?;
        let affected = connection
            .execute(
                "UPDATE alerts SET acknowledged_by = ?1 WHERE id = ?2",
                params![operator_id.to_string(), id.to_string()],
            )
            .await?;
        if affected == 0 {
            return Err(StoreError::NotFound(format!("alert {id}")));
        }
        Ok(())
    }

    /// Marks the alert as a false alarm. Whether the originating patient's trust
    /// score is adjusted is the caller's concern (§4.3) — this only flips the flag.
    #[instrument(skip(self))]
    pub async fn report_false(&self, id: Uuid) -> Result<(), StoreError> {
        let connection = self.client.connection()?;
        let affected = connection
            .execute("UPDATE alerts SET reported_false = 1 WHERE id = ?1", params![id.to_string()])
            .await?;
        if affected == 0 {
            return Err(StoreError::NotFound(format!("alert {id}")));
        }
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        let connection = self.client.connection()?;
        connection.execute("DELETE FROM alerts WHERE id = ?1", params![id.to_string()]).await?;
        Ok(())
    }

    /// Garbage-collects alerts whose TTL has elapsed as of `now`; returns the count reaped.
    #[instrument(skip(self))]
    pub async fn delete_expired(&self, now: chrono::DateTime<chrono::Utc>) -> Result<u64, StoreError> {
        let connection = self.client.connection()?;
        let affected = connection
            .execute("DELETE FROM alerts WHERE expires_at < ?1", params![mapping::to_rfc3339(&now)])
            .await?;
        Ok(affected)
    }
}
