// [libs/infra/store/src/repositories/patient.rs]
use crate::errors::StoreError;
use crate::mapping::{self};
use crate::StoreClient;
use libsql::{params, Row};
use pulsegrid_domain_models::patient::{MedicalRecord, Patient};
use tracing::instrument;
use uuid::Uuid;

pub struct PatientRepository {
    client: StoreClient,
}

impl PatientRepository {
    pub fn new(client: StoreClient) -> Self {
        Self { client }
    }

    fn from_row(row: &Row) -> Result<Patient, StoreError> {
        Ok(Patient {
            id: Uuid::parse_str(&row.get::<String>(0)?).map_err(|e| StoreError::MappingError(e.to_string()))?,
            phone: row.get(1)?,
            name: row.get(2)?,
            latitude: row.get(3)?,
            longitude: row.get(4)?,
            last_known_address: row.get(5)?,
            mobility: mapping::parse_enum_opt(row.get(6)?)?,
            living_situation: mapping::parse_enum_opt(row.get(7)?)?,
            date_of_birth: mapping::parse_date_opt(row.get(8)?)?,
            chronic_conditions: mapping::from_json(row.get(9)?)?,
            allergies: mapping::from_json(row.get(10)?)?,
            medications: mapping::from_json(row.get(11)?)?,
            special_equipment: mapping::from_json(row.get(12)?)?,
            blood_type: row.get(13)?,
            total_sos_count: row.get::<i64>(14)? as u32,
            false_alarm_count: row.get::<i64>(15)? as u32,
            trust_score: row.get(16)?,
            risk_score: row.get::<Option<i64>>(17)?.map(|v| v as u8),
            risk_level: mapping::parse_enum_opt(row.get(18)?)?,
            is_active: row.get::<i64>(19)? != 0,
            created_at: mapping::parse_rfc3339(&row.get::<String>(20)?)?,
        })
    }

    #[instrument(skip(self, patient))]
    pub async fn upsert(&self, patient: &Patient) -> Result<(), StoreError> {
        let connection = self.client.connection()?;
        connection
            .execute(
                r#"
                INSERT INTO patients (
                    id, phone, name, latitude, longitude, last_known_address,
                    mobility, living_situation, date_of_birth, chronic_conditions,
                    allergies, medications, special_equipment, blood_type,
                    total_sos_count, false_alarm_count, trust_score, risk_score,
                    risk_level, is_active, created_at
                ) VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11,?12,?13,?14,?15,?16,?17,?18,?19,?20,?21)
                ON CONFLICT(id) DO UPDATE SET
                    phone = excluded.phone, name = excluded.name,
                    latitude = excluded.latitude, longitude = excluded.longitude,
                    last_known_address = excluded.last_known_address,
                    mobility = excluded.mobility, living_situation = excluded.living_situation,
                    date_of_birth = excluded.date_of_birth,
                    chronic_conditions = excluded.chronic_conditions, allergies = excluded.allergies,
                    medications = excluded.medications, special_equipment = excluded.special_equipment,
                    blood_type = excluded.blood_type, total_sos_count = excluded.total_sos_count,
                    false_alarm_count = excluded.false_alarm_count, trust_score = excluded.trust_score,
                    risk_score = excluded.risk_score, risk_level = excluded.risk_level,
                    is_active = excluded.is_active
                "#,
                params![
                    patient.id.to_string(),
                    patient.phone.clone(),
                    patient.name.clone(),
                    patient.latitude,
                    patient.longitude,
                    patient.last_known_address.clone(),
                    patient.mobility.map(|m| mapping::enum_str(&m)).transpose()?,
                    patient.living_situation.map(|l| mapping::enum_str(&l)).transpose()?,
                    patient.date_of_birth.map(|d| mapping::to_date(&d)),
                    mapping::to_json(&patient.chronic_conditions)?,
                    mapping::to_json(&patient.allergies)?,
                    mapping::to_json(&patient.medications)?,
                    mapping::to_json(&patient.special_equipment)?,
                    patient.blood_type.clone(),
                    patient.total_sos_count as i64,
                    patient.false_alarm_count as i64,
                    patient.trust_score,
                    patient.risk_score.map(|v| v as i64),
                    patient.risk_level.map(|r| mapping::enum_str(&r)).transpose()?,
                    patient.is_active as i64,
                    mapping::to_rfc3339(&patient.created_at),
                ],
            )
            .await?;
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn find_by_id(&self, patient_id: Uuid) -> Result<Option<Patient>, StoreError> {
        let connection = self.client.connection()?;
        let mut rows = connection
            .query(
                "SELECT id, phone, name, latitude, longitude, last_known_address, mobility,
                 living_situation, date_of_birth, chronic_conditions, allergies, medications,
                 special_equipment, blood_type, total_sos_count, false_alarm_count, trust_score,
                 risk_score, risk_level, is_active, created_at FROM patients WHERE id = ?1",
                params![patient_id.to_string()],
            )
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(Self::from_row(&row)?)),
            None => Ok(None),
        }
    }

    #[instrument(skip(self))]
    pub async fn find_by_phone(&self, phone: &str) -> Result<Option<Patient>, StoreError> {
        let connection = self.client.connection()?;
        let mut rows = connection
            .query(
                "SELECT id, phone, name, latitude, longitude, last_known_address, mobility,
                 living_situation, date_of_birth, chronic_conditions, allergies, medications,
                 special_equipment, blood_type, total_sos_count, false_alarm_count, trust_score,
                 risk_score, risk_level, is_active, created_at FROM patients WHERE phone = ?1",
                params![phone],
            )
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(Self::from_row(&row)?)),
            None => Ok(None),
        }
    }

    /// Candidates for in-process haversine filtering (§4.4's "fetch then filter" approach —
    /// the embedded engine has no geodesic function, so radius matching happens in Rust).
    #[instrument(skip(self))]
    pub async fn find_active_with_location(&self) -> Result<Vec<Patient>, StoreError> {
        let connection = self.client.connection()?;
        let mut rows = connection
            .query(
                "SELECT id, phone, name, latitude, longitude, last_known_address, mobility,
                 living_situation, date_of_birth, chronic_conditions, allergies, medications,
                 special_equipment, blood_type, total_sos_count, false_alarm_count, trust_score,
                 risk_score, risk_level, is_active, created_at FROM patients
                 WHERE is_active = 1 AND latitude IS NOT NULL AND longitude IS NOT NULL",
                (),
            )
            .await?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().await? {
            out.push(Self::from_row(&row)?);
        }
        Ok(out)
    }

    #[instrument(skip(self, record))]
    pub async fn insert_medical_record(&self, record: &MedicalRecord) -> Result<(), StoreError> {
        let connection = self.client.connection()?;
        connection
            .execute(
                "INSERT INTO medical_records (id, patient_id, conditions, medications, allergies,
                 special_equipment, notes, created_at) VALUES (?1,?2,?3,?4,?5,?6,?7,?8)",
                params![
                    record.id.to_string(),
                    record.patient_id.to_string(),
                    mapping::to_json(&record.conditions)?,
                    mapping::to_json(&record.medications)?,
                    mapping::to_json(&record.allergies)?,
                    mapping::to_json(&record.special_equipment)?,
                    record.notes.clone(),
                    mapping::to_rfc3339(&record.created_at),
                ],
            )
            .await?;
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn find_medical_records(&self, patient_id: Uuid) -> Result<Vec<MedicalRecord>, StoreError> {
        let connection = self.client.connection()?;
        let mut rows = connection
            .query(
                "SELECT id, patient_id, conditions, medications, allergies, special_equipment,
                 notes, created_at FROM medical_records WHERE patient_id = ?1 ORDER BY created_at DESC",
                params![patient_id.to_string()],
            )
            .await?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().await? {
            out.push(MedicalRecord {
                id: Uuid::parse_str(&row.get::<String>(0)?).map_err(|e| StoreError::MappingError(e.to_string()))?,
                patient_id: Uuid::parse_str(&row.get::<String>(1)?).map_err(|e| StoreError::MappingError(e.to_string()))?,
                conditions: mapping::from_json(row.get(2)?)?,
                medications: mapping::from_json(row.get(3)?)?,
                allergies: mapping::from_json(row.get(4)?)?,
                special_equipment: mapping::from_json(row.get(5)?)?,
                notes: row.get(6)?,
                created_at: mapping::parse_rfc3339(&row.get::<String>(7)?)?,
            });
        }
        Ok(out)
    }
}
