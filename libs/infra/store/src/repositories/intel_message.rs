// [libs/infra/store/src/repositories/intel_message.rs]
use crate::errors::StoreError;
use crate::mapping;
use crate::StoreClient;
use libsql::{params, Row};
use pulsegrid_domain_models::intel::IntelMessage;
use tracing::instrument;
use uuid::Uuid;

pub struct IntelMessageRepository {
    client: StoreClient,
}

impl IntelMessageRepository {
    pub fn new(client: StoreClient) -> Self {
        Self { client }
    }

    const SELECT_COLUMNS: &'static str = "id, channel_id, chat_id, text, sent_at, fetched_at,
        is_crisis, confidence, category, extracted_event_id";

    fn from_row(row: &Row) -> Result<IntelMessage, StoreError> {
        Ok(IntelMessage {
            id: Uuid::parse_str(&row.get::<String>(0)?).map_err(|e| StoreError::MappingError(e.to_string()))?,
            channel_id: row.get(1)?,
            chat_id: row.get(2)?,
            text: row.get(3)?,
            sent_at: mapping::parse_rfc3339(&row.get::<String>(4)?)?,
            fetched_at: mapping::parse_rfc3339(&row.get::<String>(5)?)?,
            is_crisis: row.get::<Option<i64>>(6)?.map(|v| v != 0),
            confidence: row.get(7)?,
            category: row.get(8)?,
            extracted_event_id: row
                .get::<Option<String>>(9)?
                .map(|s| Uuid::parse_str(&s))
                .transpose()
                .map_err(|e| StoreError::MappingError(e.to_string()))?,
        })
    }

    #[instrument(skip(self, message))]
    pub async fn insert(&self, message: &IntelMessage) -> Result<(), StoreError> {
        let connection = self.client.connection()?;
        connection
            .execute(
                r#"
                INSERT INTO intel_messages (
                    id, channel_id, chat_id, text, sent_at, fetched_at, is_crisis, confidence,
                    category, extracted_event_id
                ) VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10)
                "#,
                params![
                    message.id.to_string(),
                    message.channel_id.clone(),
                    message.chat_id.clone(),
                    message.text.clone(),
                    mapping::to_rfc3339(&message.sent_at),
                    mapping::to_rfc3339(&message.fetched_at),
                    message.is_crisis.map(|v| v as i64),
                    message.confidence,
                    message.category.clone(),
                    message.extracted_event_id.map(|id| id.to_string()),
                ],
            )
            .await?;
        Ok(())
    }

    /// Dedup guard for the intel pull loop: has this (channel, chat) message already
    /// been fetched in a prior poll cycle?
    #[instrument(skip(self))]
    pub async fn exists(&self, channel_id: &str, chat_id: &str) -> Result<bool, StoreError> {
        let connection = self.client.connection()?;
        let mut rows = connection
            .query(
                "SELECT 1 FROM intel_messages WHERE channel_id = ?1 AND chat_id = ?2 LIMIT 1",
                params![channel_id, chat_id],
            )
            .await?;
        Ok(rows.next().await?.is_some())
    }

    #[instrument(skip(self))]
    pub async fn mark_classified(
        &self,
        id: Uuid,
        is_crisis: bool,
        confidence: f64,
        category: Option<String>,
        extracted_event_id: Option<Uuid>,
    ) -> Result<(), StoreError> {
        let connection = self.client.connection()?;
        let affected = connection
            .execute(
                "UPDATE intel_messages SET is_crisis = ?1, confidence = ?2, category = ?3, extracted_event_id = ?4 WHERE id = ?5",
                params![
                    is_crisis as i64,
                    confidence,
                    category,
                    extracted_event_id.map(|v| v.to_string()),
                    id.to_string(),
                ],
            )
            .await?;
        if affected == 0 {
            return Err(StoreError::NotFound(format!("intel_message {id}")));
        }
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn find_unclassified(&self, limit: i64) -> Result<Vec<IntelMessage>, StoreError> {
        let connection = self.client.connection()?;
        let sql = format!(
            "SELECT {} FROM intel_messages WHERE is_crisis IS NULL ORDER BY sent_at ASC LIMIT ?1",
            Self::SELECT_COLUMNS
        );
        let mut rows = connection.query(&sql, params![limit]).await?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().await? {
            out.push(Self::from_row(&row)?);
        }
        Ok(out)
    }
}
