// [libs/infra/store/src/schema.rs]
/*!
 * =================================================================
 * APARATO: GRID PERSISTENCE SCHEMA (V1.0)
 * CLASIFICACIÓN: INFRASTRUCTURE LAYER (ESTRATO L3)
 * RESPONSABILIDAD: GOBERNANZA ESTRUCTURAL E IDEMPOTENCIA TOTAL
 *
 * Tres fases: tablas base, columnas evolutivas (ALTER TABLE tolerante
 * a re-aplicación), índices de aceleración. Admin/CRUD-only tables
 * (case_transfers, aid_requests, audit_logs) named in the original
 * distillation are intentionally absent — see DESIGN.md.
 * =================================================================
 */

use crate::errors::StoreError;
use libsql::Connection;
use tracing::{debug, info, instrument, warn};

const BASE_TABLES: &[(&str, &str)] = &[
    ("TABLE_PATIENTS", r#"
        CREATE TABLE IF NOT EXISTS patients (
            id TEXT PRIMARY KEY,
            phone TEXT UNIQUE NOT NULL,
            name TEXT,
            latitude REAL,
            longitude REAL,
            last_known_address TEXT,
            mobility TEXT,
            living_situation TEXT,
            date_of_birth TEXT,
            chronic_conditions TEXT DEFAULT '[]',
            allergies TEXT DEFAULT '[]',
            medications TEXT DEFAULT '[]',
            special_equipment TEXT DEFAULT '[]',
            blood_type TEXT,
            total_sos_count INTEGER DEFAULT 0,
            false_alarm_count INTEGER DEFAULT 0,
            trust_score REAL DEFAULT 1.0,
            risk_score INTEGER,
            risk_level TEXT,
            is_active INTEGER DEFAULT 1,
            created_at TEXT DEFAULT CURRENT_TIMESTAMP
        );
    "#),
    ("TABLE_MEDICAL_RECORDS", r#"
        CREATE TABLE IF NOT EXISTS medical_records (
            id TEXT PRIMARY KEY,
            patient_id TEXT NOT NULL,
            conditions TEXT DEFAULT '[]',
            medications TEXT DEFAULT '[]',
            allergies TEXT DEFAULT '[]',
            special_equipment TEXT DEFAULT '[]',
            notes TEXT,
            created_at TEXT DEFAULT CURRENT_TIMESTAMP
        );
    "#),
    ("TABLE_FACILITIES", r#"
        CREATE TABLE IF NOT EXISTS facilities (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            phone TEXT,
            latitude REAL NOT NULL,
            longitude REAL NOT NULL,
            coverage_radius_m INTEGER DEFAULT 1000,
            department TEXT NOT NULL,
            status TEXT DEFAULT 'operational',
            bed_capacity INTEGER,
            icu_beds INTEGER,
            available_beds INTEGER,
            supply_levels TEXT DEFAULT '{}'
        );
    "#),
    ("TABLE_SOS_REQUESTS", r#"
        CREATE TABLE IF NOT EXISTS sos_requests (
            id TEXT PRIMARY KEY,
            patient_id TEXT NOT NULL,
            latitude REAL,
            longitude REAL,
            patient_status TEXT NOT NULL,
            severity INTEGER NOT NULL,
            details TEXT,
            source TEXT NOT NULL,
            idempotency_key TEXT NOT NULL,
            mesh_message_id TEXT,
            relay_device_id TEXT,
            hop_count INTEGER,
            routed_department TEXT,
            facility_notified_id TEXT,
            origin_facility_id TEXT,
            status TEXT DEFAULT 'pending',
            resolved_at TEXT,
            auto_resolved INTEGER DEFAULT 0,
            created_at TEXT DEFAULT CURRENT_TIMESTAMP,
            UNIQUE(mesh_message_id)
        );
    "#),
    ("TABLE_ALERTS", r#"
        CREATE TABLE IF NOT EXISTS alerts (
            id TEXT PRIMARY KEY,
            event_type TEXT NOT NULL,
            severity TEXT NOT NULL,
            latitude REAL NOT NULL,
            longitude REAL NOT NULL,
            radius_m INTEGER DEFAULT 1000,
            source TEXT NOT NULL,
            confidence REAL DEFAULT 0.5,
            metadata TEXT DEFAULT '{}',
            routed_department TEXT,
            target_facility_id TEXT,
            acknowledged_by TEXT,
            affected_patients_count INTEGER DEFAULT 0,
            created_at TEXT DEFAULT CURRENT_TIMESTAMP,
            expires_at TEXT NOT NULL
        );
    "#),
    ("TABLE_GEO_EVENTS", r#"
        CREATE TABLE IF NOT EXISTS geo_events (
            id TEXT PRIMARY KEY,
            event_type TEXT NOT NULL,
            source TEXT NOT NULL,
            severity INTEGER NOT NULL,
            layer TEXT NOT NULL,
            latitude REAL NOT NULL,
            longitude REAL NOT NULL,
            title TEXT NOT NULL,
            details TEXT,
            metadata TEXT DEFAULT '{}',
            created_at TEXT DEFAULT CURRENT_TIMESTAMP,
            expires_at TEXT NOT NULL
        );
    "#),
    ("TABLE_INTEL_CHANNELS", r#"
        CREATE TABLE IF NOT EXISTS intel_channels (
            channel_id TEXT PRIMARY KEY,
            display_name TEXT NOT NULL,
            trust_score REAL DEFAULT 0.5,
            total_reports INTEGER DEFAULT 0,
            verified_reports INTEGER DEFAULT 0,
            false_reports INTEGER DEFAULT 0,
            unverified_reports INTEGER DEFAULT 0,
            monitoring_status TEXT DEFAULT 'active',
            recent_notes TEXT DEFAULT '[]'
        );
    "#),
    ("TABLE_INTEL_MESSAGES", r#"
        CREATE TABLE IF NOT EXISTS intel_messages (
            id TEXT PRIMARY KEY,
            channel_id TEXT NOT NULL,
            chat_id TEXT NOT NULL,
            text TEXT NOT NULL,
            sent_at TEXT NOT NULL,
            fetched_at TEXT DEFAULT CURRENT_TIMESTAMP,
            is_crisis INTEGER,
            confidence REAL,
            category TEXT,
            extracted_event_id TEXT
        );
    "#),
];

const EVOLUTIONARY_COLUMNS: &[(&str, &str)] = &[
    ("SOS_DEVICE_TIME", "ALTER TABLE sos_requests ADD COLUMN device_time TEXT"),
    ("PATIENT_BLOOD_TYPE", "ALTER TABLE patients ADD COLUMN blood_type TEXT"),
    ("ALERT_REPORTED_FALSE", "ALTER TABLE alerts ADD COLUMN reported_false INTEGER DEFAULT 0"),
];

const ACCELERATION_INDEXES: &[(&str, &str)] = &[
    ("IDX_SOS_PATIENT", "CREATE INDEX IF NOT EXISTS idx_sos_patient ON sos_requests(patient_id);"),
    ("IDX_SOS_STATUS", "CREATE INDEX IF NOT EXISTS idx_sos_status ON sos_requests(status);"),
    ("IDX_SOS_MESH", "CREATE INDEX IF NOT EXISTS idx_sos_mesh ON sos_requests(mesh_message_id);"),
    ("IDX_ALERTS_CREATED", "CREATE INDEX IF NOT EXISTS idx_alerts_created ON alerts(created_at DESC);"),
    ("IDX_GEO_CREATED", "CREATE INDEX IF NOT EXISTS idx_geo_created ON geo_events(created_at DESC);"),
    ("IDX_GEO_SOURCE", "CREATE INDEX IF NOT EXISTS idx_geo_source ON geo_events(source);"),
    ("IDX_MEDICAL_PATIENT", "CREATE INDEX IF NOT EXISTS idx_medical_patient ON medical_records(patient_id);"),
    ("IDX_INTEL_MSG_CHANNEL", "CREATE INDEX IF NOT EXISTS idx_intel_msg_channel ON intel_messages(channel_id);"),
];

#[instrument(skip(connection))]
pub async fn apply_full_schema(connection: &Connection) -> Result<(), StoreError> {
    info!("🏗️ [SCHEMA]: synchronizing structural layout...");

    for (identifier, sql) in BASE_TABLES {
        debug!("  ↳ solidifying: {}", identifier);
        connection
            .execute(sql, ())
            .await
            .map_err(|e| StoreError::ConnectionError(format!("{identifier}: {e}")))?;
    }

    for (identifier, sql) in EVOLUTIONARY_COLUMNS {
        match connection.execute(sql, ()).await {
            Ok(_) => info!("  🟢 [REPAIR_OK]: applied {}", identifier),
            Err(e) if e.to_string().contains("duplicate column name") => {
                debug!("  ⚪ [REPAIR_SKIP]: {} already level", identifier);
            }
            Err(e) => warn!("  ⚠️ [REPAIR_BYPASS]: {} incomplete: {}", identifier, e),
        }
    }

    for (identifier, sql) in ACCELERATION_INDEXES {
        debug!("  ↳ hardening: {}", identifier);
        connection
            .execute(sql, ())
            .await
            .map_err(|e| StoreError::ConnectionError(format!("{identifier}: {e}")))?;
    }

    info!("✅ [SCHEMA]: structural layout synchronized.");
    Ok(())
}
