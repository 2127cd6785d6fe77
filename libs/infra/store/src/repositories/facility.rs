// [libs/infra/store/src/repositories/facility.rs]
use crate::errors::StoreError;
use crate::mapping;
use crate::StoreClient;
use libsql::{params, Row};
use pulsegrid_domain_models::facility::{Facility, FacilityCapacity};
use std::collections::HashMap;
use tracing::instrument;
use uuid::Uuid;

pub struct FacilityRepository {
    client: StoreClient,
}

impl FacilityRepository {
    pub fn new(client: StoreClient) -> Self {
        Self { client }
    }

    fn from_row(row: &Row) -> Result<Facility, StoreError> {
        let bed_capacity: Option<i64> = row.get(7)?;
        let icu_beds: Option<i64> = row.get(8)?;
        let available_beds: Option<i64> = row.get(9)?;
        let supply_levels: HashMap<String, String> = mapping::from_json(row.get(10)?)?;

        let capacity = bed_capacity.map(|bed_capacity| FacilityCapacity {
            bed_capacity: bed_capacity as u32,
            icu_beds: icu_beds.unwrap_or(0) as u32,
            available_beds: available_beds.unwrap_or(0) as u32,
            supply_levels,
        });

        Ok(Facility {
            id: Uuid::parse_str(&row.get::<String>(0)?).map_err(|e| StoreError::MappingError(e.to_string()))?,
            name: row.get(1)?,
            phone: row.get(2)?,
            latitude: row.get(3)?,
            longitude: row.get(4)?,
            coverage_radius_m: row.get::<i64>(5)? as u32,
            department: mapping::parse_enum(&row.get::<String>(6)?)?,
            status: mapping::parse_enum(&row.get::<String>(11)?)?,
            capacity,
        })
    }

    #[instrument(skip(self, facility))]
    pub async fn upsert(&self, facility: &Facility) -> Result<(), StoreError> {
        let connection = self.client.connection()?;
        let (bed_capacity, icu_beds, available_beds, supply_levels) = match &facility.capacity {
            Some(cap) => (
                Some(cap.bed_capacity as i64),
                Some(cap.icu_beds as i64),
                Some(cap.available_beds as i64),
                mapping::to_json(&cap.supply_levels)?,
            ),
            None => (None, None, None, "{}".to_string()),
        };

        connection
            .execute(
                r#"
                INSERT INTO facilities (
                    id, name, phone, latitude, longitude, coverage_radius_m, department,
                    bed_capacity, icu_beds, available_beds, supply_levels, status
                ) VALUES (?1,?2,?3,?4,?5,?6,?7,?8,?9,?10,?11,?12)
                ON CONFLICT(id) DO UPDATE SET
                    name = excluded.name, phone = excluded.phone,
                    latitude = excluded.latitude, longitude = excluded.longitude,
                    coverage_radius_m = excluded.coverage_radius_m, department = excluded.department,
                    bed_capacity = excluded.bed_capacity, icu_beds = excluded.icu_beds,
                    available_beds = excluded.available_beds, supply_levels = excluded.supply_levels,
                    status = excluded.status
                "#,
                params![
                    facility.id.to_string(),
                    facility.name.clone(),
                    facility.phone.clone(),
                    facility.latitude,
                    facility.longitude,
                    facility.coverage_radius_m as i64,
                    mapping::enum_str(&facility.department)?,
                    bed_capacity,
                    icu_beds,
                    available_beds,
                    supply_levels,
                    mapping::enum_str(&facility.status)?,
                ],
            )
            .await?;
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn find_by_id(&self, facility_id: Uuid) -> Result<Option<Facility>, StoreError> {
        let connection = self.client.connection()?;
        let mut rows = connection
            .query(
                "SELECT id, name, phone, latitude, longitude, coverage_radius_m, department,
                 bed_capacity, icu_beds, available_beds, supply_levels, status
                 FROM facilities WHERE id = ?1",
                params![facility_id.to_string()],
            )
            .await?;
        match rows.next().await? {
            Some(row) => Ok(Some(Self::from_row(&row)?)),
            None => Ok(None),
        }
    }

    /// All facilities for a department, for in-process nearest-facility routing (§4.3).
    #[instrument(skip(self))]
    pub async fn find_by_department(&self, department: pulsegrid_domain_models::enums::Department) -> Result<Vec<Facility>, StoreError> {
        let connection = self.client.connection()?;
        let mut rows = connection
            .query(
                "SELECT id, name, phone, latitude, longitude, coverage_radius_m, department,
                 bed_capacity, icu_beds, available_beds, supply_levels, status
                 FROM facilities WHERE department = ?1",
                params![mapping::enum_str(&department)?],
            )
            .await?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().await? {
            out.push(Self::from_row(&row)?);
        }
        Ok(out)
    }

    #[instrument(skip(self))]
    pub async fn find_all(&self) -> Result<Vec<Facility>, StoreError> {
        let connection = self.client.connection()?;
        let mut rows = connection
            .query(
                "SELECT id, name, phone, latitude, longitude, coverage_radius_m, department,
                 bed_capacity, icu_beds, available_beds, supply_levels, status FROM facilities",
                (),
            )
            .await?;
        let mut out = Vec::new();
        while let Some(row) = rows.next().await? {
            out.push(Self::from_row(&row)?);
        }
        Ok(out)
    }

    #[instrument(skip(self))]
    pub async fn update_status(&self, facility_id: Uuid, status: pulsegrid_domain_models::enums::FacilityStatus) -> Result<(), StoreError> {
        let connection = self.client.connection()?;
        let affected = connection
            .execute(
                "UPDATE facilities SET status = ?1 WHERE id = ?2",
                params![mapping::enum_str(&status)?, facility_id.to_string()],
            )
            .await?;
        if affected == 0 {
            return Err(StoreError::NotFound(format!("facility {facility_id}")));
        }
        Ok(())
    }
}
