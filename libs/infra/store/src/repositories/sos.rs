// [libs/infra/store/src/repositories/sos.rs]
use crate::errors::StoreError;
use crate::mapping;
use crate::StoreClient;
use libsql::{params, Row};
use pulsegrid_domain_models::sos::SosRequest;
use tracing::instrument;
use uuid::Uuid;

pub struct SosRepository {
    client: StoreClient,
}

impl SosRepository {
    pub fn new(client: StoreClient) -> Self {
        Self { client }
    }

    fn from_row(row: &Row) -> Result<SosRequest, StoreError> {
        Ok(SosRequest {
            id: Uuid::parse_str(&row.get::<String>(0)?).map_err(|e| StoreError::MappingError(e.to_string()))?,
            patient_id: Uuid::parse_str(&row.get::<String>(1)?).map_err(|e| StoreError::MappingError(e.to_string()))?,
            latitude: row.get(2)?,
            longitude: row.get(3)?,
            patient_status: mapping::parse_enum(&row.get::<String>(4)?)?,
            severity: row.get::<i64>(5)? as u8,
            details: row.get(6)?,
            source: mapping::parse_enum(&row.get::<String>(7)?)?,
            idempotency_key: row.get(8)?,
            mesh_message_id: row.get(9)?,
            relay_device_id: row.get(10)?,
            hop_count: row.get::<Option<i64>>(11)?.map(|v| v as u32),
            routed_department: mapping::parse_enum_opt(row.get(12)?)?,
            facility_notified_id: row
                .get::<Option<String>>(13)?
                .map(|s| Uuid::parse_str(&s))
                .transpose()
                .map_err(|e| StoreError::MappingError(e.to_string()))?,
            origin_facility_id: row
                .get::<Option<String>>(14)?
                .map(|s| Uuid::parse_str(&s))
                .transpose()
                .map_err(|e| StoreError::MappingError(e.to_string()))?,
            status: mapping::parse_enum(&row.get::<String>(15)?)?,
            resolved_at: mapping::parse_rfc3339_opt(row.get(16)?)?,
            auto_resolved: row.get::<i64>(17)? != 0,
            created_at: mapping::parse_rfc3339(&row.get::<String>(18)?)?,
        })
    }

    const SELECT_COLUMNS: &'static str = "id, patient_id, latitude, longitude, patient_status, severity,
        details, source, idempotency_key, mesh_message_id, relay_device_id, hop_count,
        routed_department, facility_notified_id, origin_facility_id, status, resolved_at,
        auto_resolved, created_at";

    #[instrument(skip(self, request))]
    pub async fn insert(&self, request: &SosRequest) -> Result<(), StoreError> {
        let connection = self.client.connection()?;
        connection
            .execute(
                r#"
                INSERT INTO sos_requests (
                    id, patient_id, latitude, longitude, patient_status, severity, details,
                    source, idempotency_key, mesh_message_id, relay_device_id, hop_count,
                    routed_department, facility_notified_id, origin_facility_id, status,
                    resolved_at, auto_resolved, created_at
                ) VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11,?12,?13,?14,?15,?16,?17,?18,?19)
                "#,
                params![
                    request.id.to_string(),
                    request.patient_id.to_string(),
                    request.latitude,
                    request.longitude,
                    mapping::enum_str(&request.patient_status)?,
                    request.severity as i64,
                    request.details.clone(),
                    mapping::enum_str(&request.source)?,
                    request.idempotency_key.clone(),
                    request.mesh_message_id.clone(),
                    request.relay_device_id.clone(),
                    request.hop_count.map(|v| v as i64),
                    request.routed_department.map(|d| mapping::enum_str(&d)).transpose()?,
                    request.facility_notified_id.map(|id| id.to_string()),
                    request.origin_facility_id.map(|id| id.to_string()),
                    mapping::enum_str(&request.status)?,
                    request.resolved_at.as_ref().map(mapping::to_rfc3339),
                    request.auto_resolved as i64,
                    mapping::to_rfc3339(&request.created_at),
                ],
            )
            .await?;
        Ok(())
    }

    /// Idempotence check for the dedup law (§8): same `idempotency_key` from the same
    /// `source` within the replay window returns the original, never a duplicate row.
    #[instrument(skip(self))]
    pub async fn find_by_idempotency_key(&self, source: pulsegrid_domain_models::enums::SosSource, key: &str) -> Result<Option<SosRequest>, StoreError> {
        let connection = self.client.connection()?;
        let sql = format!("SELECT {} FROM sos_requests WHERE source = ?1 AND idempotency_key = ?2", Self::SELECT_COLUMNS);
        let mut rows = connection.query(&sql, params![mapping::enum_str(&source)?, key]).await?;
        match rows.next().await? {
            Some(row) => Ok(Some(Self::from_row(&row)?)),
            None => Ok(None),
        }
    }

    #[instrument(skip(self))]
    pub async fn find_by_mesh_message_id(&self, mesh_message_id: &str) -> Result<Option<SosRequest>, StoreError> {
        let connection = self.client.connection()?;
        let sql = format!("SELECT {} FROM sos_requests WHERE mesh_message_id = ?1", Self::SELECT_COLUMNS);
        let mut rows = connection.query(&sql, params![mesh_message_id]).await?;
        match rows.next().await? {
            Some(row) => Ok(Some(Self::from_row(&row)?)),
            None => Ok(None),
        }
    }

    /// Every request created since `since`, for the verification loop's related-SOS
    /// window (§4.6) — filtered in Rust against the caller's geodesic radius.
    #[instrument(skip(self))]
    pub async fn find_created_since(&self, since: chrono::DateTime<chrono::Utc>) -> Result<Vec<SosRequest>, StoreError> {
        let connection = self.client.connection()?;
        let sql = format!(
            "SELECT {} FROM sos_requests WHERE created_at >= ?1 ORDER BY created_at DESC",
            Self::SELECT_COLUMNS
        );
        let mut rows = connection.query(&sql, params![mapping::to_rfc3339(&since)]).await?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().await? {
            out.push(Self::from_row(&row)?);
        }
        Ok(out)
    }

    #[instrument(skip(self))]
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<SosRequest>, StoreError> {
        let connection = self.client.connection()?;
        let sql = format!("SELECT {} FROM sos_requests WHERE id = ?1", Self::SELECT_COLUMNS);
        let mut rows = connection.query(&sql, params![id.to_string()]).await?;
        match rows.next().await? {
            Some(row) => Ok(Some(Self::from_row(&row)?)),
            None => Ok(None),
        }
    }

    /// Work queue for the triage orchestrator's polling loop (§4.2).
    #[instrument(skip(self))]
    pub async fn find_pending(&self) -> Result<Vec<SosRequest>, StoreError> {
        let connection = self.client.connection()?;
        let sql = format!(
            "SELECT {} FROM sos_requests WHERE status = 'pending' ORDER BY created_at ASC",
            Self::SELECT_COLUMNS
        );
        let mut rows = connection.query(&sql, ()).await?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().await? {
            out.push(Self::from_row(&row)?);
        }
        Ok(out)
    }

    #[instrument(skip(self))]
    pub async fn find_active_for_patient(&self, patient_id: Uuid) -> Result<Vec<SosRequest>, StoreError> {
        let connection = self.client.connection()?;
        let sql = format!(
            "SELECT {} FROM sos_requests WHERE patient_id = ?1 AND status IN ('pending', 'acknowledged', 'dispatched') ORDER BY created_at DESC",
            Self::SELECT_COLUMNS
        );
        let mut rows = connection.query(&sql, params![patient_id.to_string()]).await?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().await? {
            out.push(Self::from_row(&row)?);
        }
        Ok(out)
    }

    #[instrument(skip(self))]
    pub async fn update_routing(
        &self,
        id: Uuid,
        routed_department: pulsegrid_domain_models::enums::Department,
        facility_notified_id: Option<Uuid>,
        status: pulsegrid_domain_models::enums::SosStatus,
    ) -> Result<(), StoreError> {
        let connection = self.client.connection()?;
        let affected = connection
            .execute(
                "UPDATE sos_requests SET routed_department = ?1, facility_notified_id = ?2, status = ?3 WHERE id = ?4",
                params![
                    mapping::enum_str(&routed_department)?,
                    facility_notified_id.map(|v| v.to_string()),
                    mapping::enum_str(&status)?,
                    id.to_string(),
                ],
            )
            .await?;
        if affected == 0 {
            return Err(StoreError::NotFound(format!("sos_request {id}")));
        }
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn set_origin_facility(&self, id: Uuid, facility_id: Uuid) -> Result<(), StoreError> {
        let connection = self.client.connection()?;
        let affected = connection
            .execute(
                "UPDATE sos_requests SET origin_facility_id = ?1 WHERE id = ?2",
                params![facility_id.to_string(), id.to_string()],
            )
            .await?;
        if affected == 0 {
            return Err(StoreError::NotFound(format!("sos_request {id}")));
        }
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn resolve(&self, id: Uuid, resolved_at: chrono::DateTime<chrono::Utc>, auto_resolved: bool) -> Result<(), StoreError> {
        let connection = self.client.connection()?;
        let affected = connection
            .execute(
                "UPDATE sos_requests SET status = 'resolved', resolved_at = ?1, auto_resolved = ?2 WHERE id = ?3",
                params![mapping::to_rfc3339(&resolved_at), auto_resolved as i64, id.to_string()],
            )
            .await?;
        if affected == 0 {
            return Err(StoreError::NotFound(format!("sos_request {id}")));
        }
        Ok(())
    }
}
