// [libs/infra/store/src/repositories/intel_channel.rs]
use crate::errors::StoreError;
use crate::mapping;
use crate::StoreClient;
use libsql::{params, Row};
use pulsegrid_domain_models::intel::{IntelChannel, VerificationNote};
use std::collections::VecDeque;
use tracing::instrument;

pub struct IntelChannelRepository {
    client: StoreClient,
}

impl IntelChannelRepository {
    pub fn new(client: StoreClient) -> Self {
        Self { client }
    }

    fn from_row(row: &Row) -> Result<IntelChannel, StoreError> {
        let notes: Vec<VerificationNote> = mapping::from_json(row.get(8)?)?;
        Ok(IntelChannel {
            channel_id: row.get(0)?,
            display_name: row.get(1)?,
            trust_score: row.get(2)?,
            total_reports: row.get::<i64>(3)? as u32,
            verified_reports: row.get::<i64>(4)? as u32,
            false_reports: row.get::<i64>(5)? as u32,
            unverified_reports: row.get::<i64>(6)? as u32,
            monitoring_status: mapping::parse_enum(&row.get::<String>(7)?)?,
            recent_notes: VecDeque::from(notes),
        })
    }

    #[instrument(skip(self, channel))]
    pub async fn upsert(&self, channel: &IntelChannel) -> Result<(), StoreError> {
        let connection = self.client.connection()?;
        connection
            .execute(
                r#"
                INSERT INTO intel_channels (
                    channel_id, display_name, trust_score, total_reports, verified_reports,
                    false_reports, unverified_reports, monitoring_status, recent_notes
                ) VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9)
                ON CONFLICT(channel_id) DO UPDATE SET
                    display_name = excluded.display_name, trust_score = excluded.trust_score,
                    total_reports = excluded.total_reports, verified_reports = excluded.verified_reports,
                    false_reports = excluded.false_reports, unverified_reports = excluded.unverified_reports,
                    monitoring_status = excluded.monitoring_status, recent_notes = excluded.recent_notes
                "#,
                params![
                    channel.channel_id.clone(),
                    channel.display_name.clone(),
                    channel.trust_score,
                    channel.total_reports as i64,
                    channel.verified_reports as i64,
                    channel.false_reports as i64,
                    channel.unverified_reports as i64,
                    mapping::enum_str(&channel.monitoring_status)?,
                    mapping::to_json(&Vec::from(channel.recent_notes.clone()))?,
                ],
            )
            .await?;
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn find_by_id(&self, channel_id: &str) -> Result<Option<IntelChannel>, StoreError> {
        let connection = self.client.connection()?;
        let mut rows = connection
            .query(
                "SELECT channel_id, display_name, trust_score, total_reports, verified_reports,
                 false_reports, unverified_reports, monitoring_status, recent_notes
                 FROM intel_channels WHERE channel_id = ?1",
                params![channel_id],
            )
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(Self::from_row(&row)?)),
            None => Ok(None),
        }
    }

    /// Persists the report counters, trust score and note ring-buffer after a
    /// verification pass updates them in-process (§4.6).
    #[instrument(skip(self, channel))]
    pub async fn update_trust(&self, channel: &IntelChannel) -> Result<(), StoreError> {
        let connection = self.client.connection()?;
        let affected = connection
            .execute(
                "UPDATE intel_channels SET trust_score = ?1, total_reports = ?2, verified_reports = ?3,
                 false_reports = ?4, unverified_reports = ?5, monitoring_status = ?6, recent_notes = ?7
                 WHERE channel_id = ?8",
                params![
                    channel.trust_score,
                    channel.total_reports as i64,
                    channel.verified_reports as i64,
                    channel.false_reports as i64,
                    channel.unverified_reports as i64,
                    mapping::enum_str(&channel.monitoring_status)?,
                    mapping::to_json(&Vec::from(channel.recent_notes.clone()))?,
                    channel.channel_id.clone(),
                ],
            )
            .await?;
        if affected == 0 {
            return Err(StoreError::NotFound(format!("intel_channel {}", channel.channel_id)));
        }
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn find_active(&self) -> Result<Vec<IntelChannel>, StoreError> {
        let connection = self.client.connection()?;
        let mut rows = connection
            .query(
                "SELECT channel_id, display_name, trust_score, total_reports, verified_reports,
                 false_reports, unverified_reports, monitoring_status, recent_notes
                 FROM intel_channels WHERE monitoring_status = 'active'",
                (),
            )
            .await?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().await? {
            out.push(Self::from_row(&row)?);
        }
        Ok(out)
    }
}
