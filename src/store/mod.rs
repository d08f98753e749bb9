//! SQLite-backed store for integrations, credentials, events, versioned
//! data snapshots and audit logs.
//!
//! # Schema
//! ```sql
//! credentials_entities(uid PK, name, handle UNIQUE, credentials_type_id,
//!                      public_data JSON, private_data ENCRYPTED,
//!                      private_data_nonce, is_active, health fields)
//! integrations(uid PK, name, handle UNIQUE, provider_backend_id,
//!              provider_config JSON, credentials_uid FK, is_active,
//!              enable_logging)
//! events(uid PK, integration_uid, event_type, event_date, location, city,
//!        category, extra_fields JSON, created_at)
//! contextual_data(uid PK, event_uid FK, integration_uid FK, version,
//!                 fetched_at, extra_fields JSON,
//!                 UNIQUE(event_uid, integration_uid, version))
//! integration_logs(uid PK, integration_uid, success, error, message,
//!                  method, records_imported, request_data JSON,
//!                  response_data JSON, timestamp)
//! ```
//!
//! # Concurrency
//! The connection sits behind a `Mutex`; SQLite runs in its default
//! serialized mode, and the version-assignment critical section uses an
//! immediate transaction so concurrent writers (including other processes)
//! never compute the same next version.
//!
//! Credential private configuration is encrypted with AES-256-GCM before
//! it touches the database; see [`crate::crypto`].

mod reconcile;

pub use reconcile::{DataFilter, EventDraft, EventFilter};

use crate::crypto;
use crate::model::{CredentialsEntity, Event, Integration, IntegrationLog, LogMethod};
use anyhow::{anyhow, bail, Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, Row};
use serde_json::{Map, Value};
use std::path::Path;
use std::sync::Mutex;
use uuid::Uuid;

/// Store over a single SQLite database.
pub struct ContextStore {
    pub(crate) conn: Mutex<Connection>,
    encryption_key: Vec<u8>,
}

impl ContextStore {
    /// Creates or opens the store and runs schema setup.
    ///
    /// `encryption_key` is the base64-encoded 32-byte master key used for
    /// credential private configuration.
    pub fn new<P: AsRef<Path>>(db_path: P, encryption_key: &str) -> Result<Self> {
        let key_bytes =
            crypto::validate_key(encryption_key).context("Invalid encryption key")?;

        let conn = Connection::open(db_path).context("Failed to open database")?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS credentials_entities (
                uid TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                handle TEXT NOT NULL UNIQUE,
                credentials_type_id TEXT NOT NULL,
                public_data TEXT NOT NULL,
                private_data TEXT NOT NULL,
                private_data_nonce TEXT NOT NULL,
                is_active INTEGER NOT NULL DEFAULT 0,
                last_checked_at TEXT,
                last_success_at TEXT,
                last_error_at TEXT,
                last_error TEXT
            );

            CREATE TABLE IF NOT EXISTS integrations (
                uid TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                handle TEXT NOT NULL UNIQUE,
                provider_backend_id TEXT NOT NULL,
                provider_config TEXT NOT NULL,
                credentials_uid TEXT REFERENCES credentials_entities(uid),
                is_active INTEGER NOT NULL DEFAULT 0,
                enable_logging INTEGER NOT NULL DEFAULT 1
            );

            CREATE TABLE IF NOT EXISTS events (
                uid TEXT PRIMARY KEY,
                integration_uid TEXT,
                event_type TEXT NOT NULL,
                event_date TEXT,
                location TEXT,
                city TEXT,
                category TEXT,
                extra_fields TEXT NOT NULL,
                created_at TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_events_identity
                ON events(event_type, event_date, location, city);

            CREATE TABLE IF NOT EXISTS contextual_data (
                uid TEXT PRIMARY KEY,
                event_uid TEXT NOT NULL REFERENCES events(uid),
                integration_uid TEXT NOT NULL REFERENCES integrations(uid),
                version INTEGER NOT NULL,
                fetched_at TEXT NOT NULL,
                extra_fields TEXT NOT NULL,
                UNIQUE(event_uid, integration_uid, version)
            );
            CREATE INDEX IF NOT EXISTS idx_data_pair
                ON contextual_data(event_uid, integration_uid);

            CREATE TABLE IF NOT EXISTS integration_logs (
                uid TEXT PRIMARY KEY,
                integration_uid TEXT NOT NULL,
                success INTEGER NOT NULL,
                error INTEGER NOT NULL,
                message TEXT NOT NULL,
                method TEXT NOT NULL,
                records_imported INTEGER NOT NULL,
                request_data TEXT NOT NULL,
                response_data TEXT NOT NULL,
                timestamp TEXT NOT NULL
            );
            "#,
        )
        .context("Failed to create schema")?;

        Ok(Self {
            conn: Mutex::new(conn),
            encryption_key: key_bytes,
        })
    }

    // ---- credentials entities ----

    /// Inserts or updates a credentials entity (upsert by uid).
    ///
    /// Private configuration is encrypted before the write; health fields
    /// are preserved on update.
    pub fn save_credentials(&self, entity: &CredentialsEntity) -> Result<()> {
        let (private_data, nonce) =
            crypto::encrypt_config(&entity.private_data, &self.encryption_key)
                .context("Failed to encrypt private config")?;
        let public_data = serde_json::to_string(&entity.public_data)?;

        self.conn
            .lock()
            .unwrap()
            .execute(
                r#"
                INSERT INTO credentials_entities (
                    uid, name, handle, credentials_type_id,
                    public_data, private_data, private_data_nonce, is_active
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                ON CONFLICT(uid) DO UPDATE SET
                    name = excluded.name,
                    handle = excluded.handle,
                    credentials_type_id = excluded.credentials_type_id,
                    public_data = excluded.public_data,
                    private_data = excluded.private_data,
                    private_data_nonce = excluded.private_data_nonce,
                    is_active = excluded.is_active
                "#,
                params![
                    entity.uid.to_string(),
                    entity.name,
                    entity.handle,
                    entity.credentials_type_id,
                    public_data,
                    private_data,
                    nonce,
                    entity.is_active,
                ],
            )
            .context("Failed to save credentials entity")?;
        Ok(())
    }

    /// Retrieves a credentials entity, decrypting its private config.
    pub fn get_credentials(&self, uid: &Uuid) -> Result<Option<CredentialsEntity>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn
            .prepare(
                r#"
                SELECT uid, name, handle, credentials_type_id,
                       public_data, private_data, private_data_nonce, is_active,
                       last_checked_at, last_success_at, last_error_at, last_error
                FROM credentials_entities
                WHERE uid = ?1
                "#,
            )
            .context("Failed to prepare query")?;

        let mut rows = stmt
            .query(params![uid.to_string()])
            .context("Failed to execute query")?;
        match rows.next().context("Failed to read row")? {
            Some(row) => Ok(Some(self.row_to_credentials(row)?)),
            None => Ok(None),
        }
    }

    /// Lists all credentials entities, ordered by handle.
    pub fn list_credentials(&self) -> Result<Vec<CredentialsEntity>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn
            .prepare(
                r#"
                SELECT uid, name, handle, credentials_type_id,
                       public_data, private_data, private_data_nonce, is_active,
                       last_checked_at, last_success_at, last_error_at, last_error
                FROM credentials_entities
                ORDER BY handle
                "#,
            )
            .context("Failed to prepare query")?;

        let mut rows = stmt.query([]).context("Failed to execute query")?;
        let mut entities = Vec::new();
        while let Some(row) = rows.next().context("Failed to read row")? {
            entities.push(self.row_to_credentials(row)?);
        }
        Ok(entities)
    }

    /// Deletes a credentials entity.
    ///
    /// Blocked while any integration still references it (protected
    /// delete, never a cascade).
    pub fn delete_credentials(&self, uid: &Uuid) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let referencing: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM integrations WHERE credentials_uid = ?1",
                params![uid.to_string()],
                |row| row.get(0),
            )
            .context("Failed to count referencing integrations")?;
        if referencing > 0 {
            bail!(
                "Cannot delete credentials {}: referenced by {} integration(s)",
                uid,
                referencing
            );
        }

        let deleted = conn
            .execute(
                "DELETE FROM credentials_entities WHERE uid = ?1",
                params![uid.to_string()],
            )
            .context("Failed to delete credentials entity")?;
        Ok(deleted > 0)
    }

    /// Records the outcome of a credential health check.
    ///
    /// Always bumps `last_checked_at`; `error = None` marks a success,
    /// otherwise the message is kept in `last_error`.
    pub fn mark_credentials_checked(&self, uid: &Uuid, error: Option<&str>) -> Result<()> {
        let now = Utc::now().to_rfc3339();
        let conn = self.conn.lock().unwrap();
        let updated = match error {
            None => conn.execute(
                r#"
                UPDATE credentials_entities
                SET last_checked_at = ?1, last_success_at = ?1
                WHERE uid = ?2
                "#,
                params![now, uid.to_string()],
            ),
            Some(message) => conn.execute(
                r#"
                UPDATE credentials_entities
                SET last_checked_at = ?1, last_error_at = ?1, last_error = ?2
                WHERE uid = ?3
                "#,
                params![now, message, uid.to_string()],
            ),
        }
        .context("Failed to update credential health")?;

        if updated == 0 {
            bail!("No credentials entity with uid {}", uid);
        }
        Ok(())
    }

    fn row_to_credentials(&self, row: &Row<'_>) -> Result<CredentialsEntity> {
        let public_data: String = row.get(4)?;
        let private_data: String = row.get(5)?;
        let nonce: String = row.get(6)?;
        Ok(CredentialsEntity {
            uid: parse_uuid(&row.get::<_, String>(0)?)?,
            name: row.get(1)?,
            handle: row.get(2)?,
            credentials_type_id: row.get(3)?,
            public_data: parse_json_map(&public_data)?,
            private_data: crypto::decrypt_config(&private_data, &nonce, &self.encryption_key)
                .context("Failed to decrypt private config")?,
            is_active: row.get(7)?,
            last_checked_at: parse_opt_datetime(row.get::<_, Option<String>>(8)?)?,
            last_success_at: parse_opt_datetime(row.get::<_, Option<String>>(9)?)?,
            last_error_at: parse_opt_datetime(row.get::<_, Option<String>>(10)?)?,
            last_error: row.get(11)?,
        })
    }

    // ---- integrations ----

    /// Inserts or updates an integration (upsert by uid).
    pub fn save_integration(&self, integration: &Integration) -> Result<()> {
        let provider_config = serde_json::to_string(&integration.provider_config)?;
        self.conn
            .lock()
            .unwrap()
            .execute(
                r#"
                INSERT INTO integrations (
                    uid, name, handle, provider_backend_id, provider_config,
                    credentials_uid, is_active, enable_logging
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                ON CONFLICT(uid) DO UPDATE SET
                    name = excluded.name,
                    handle = excluded.handle,
                    provider_backend_id = excluded.provider_backend_id,
                    provider_config = excluded.provider_config,
                    credentials_uid = excluded.credentials_uid,
                    is_active = excluded.is_active,
                    enable_logging = excluded.enable_logging
                "#,
                params![
                    integration.uid.to_string(),
                    integration.name,
                    integration.handle,
                    integration.provider_backend_id,
                    provider_config,
                    integration.credentials_uid.map(|u| u.to_string()),
                    integration.is_active,
                    integration.enable_logging,
                ],
            )
            .context("Failed to save integration")?;
        Ok(())
    }

    pub fn get_integration(&self, uid: &Uuid) -> Result<Option<Integration>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn
            .prepare(
                r#"
                SELECT uid, name, handle, provider_backend_id, provider_config,
                       credentials_uid, is_active, enable_logging
                FROM integrations
                WHERE uid = ?1
                "#,
            )
            .context("Failed to prepare query")?;
        let mut rows = stmt
            .query(params![uid.to_string()])
            .context("Failed to execute query")?;
        match rows.next().context("Failed to read row")? {
            Some(row) => Ok(Some(row_to_integration(row)?)),
            None => Ok(None),
        }
    }

    /// Lists integrations with `is_active = true`, ordered by handle.
    pub fn list_active_integrations(&self) -> Result<Vec<Integration>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn
            .prepare(
                r#"
                SELECT uid, name, handle, provider_backend_id, provider_config,
                       credentials_uid, is_active, enable_logging
                FROM integrations
                WHERE is_active = 1
                ORDER BY handle
                "#,
            )
            .context("Failed to prepare query")?;
        let mut rows = stmt.query([]).context("Failed to execute query")?;
        let mut integrations = Vec::new();
        while let Some(row) = rows.next().context("Failed to read row")? {
            integrations.push(row_to_integration(row)?);
        }
        Ok(integrations)
    }

    /// Deletes an integration.
    ///
    /// Blocked while events, data snapshots or log entries still reference
    /// it; deactivate instead of deleting in that case.
    pub fn delete_integration(&self, uid: &Uuid) -> Result<bool> {
        let conn = self.conn.lock().unwrap();
        let uid_text = uid.to_string();
        let referencing: i64 = conn
            .query_row(
                r#"
                SELECT (SELECT COUNT(*) FROM events WHERE integration_uid = ?1)
                     + (SELECT COUNT(*) FROM contextual_data WHERE integration_uid = ?1)
                     + (SELECT COUNT(*) FROM integration_logs WHERE integration_uid = ?1)
                "#,
                params![uid_text],
                |row| row.get(0),
            )
            .context("Failed to count references")?;
        if referencing > 0 {
            bail!(
                "Cannot delete integration {}: {} dependent row(s) exist; deactivate it instead",
                uid,
                referencing
            );
        }

        let deleted = conn
            .execute("DELETE FROM integrations WHERE uid = ?1", params![uid_text])
            .context("Failed to delete integration")?;
        Ok(deleted > 0)
    }

    // ---- audit log ----

    /// Appends an audit log entry. Entries are write-once; there is no
    /// update or delete path.
    pub fn insert_log(&self, log: &IntegrationLog) -> Result<()> {
        self.conn
            .lock()
            .unwrap()
            .execute(
                r#"
                INSERT INTO integration_logs (
                    uid, integration_uid, success, error, message, method,
                    records_imported, request_data, response_data, timestamp
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                "#,
                params![
                    log.uid.to_string(),
                    log.integration_uid.to_string(),
                    log.success,
                    log.error,
                    log.message,
                    log.method.as_str(),
                    log.records_imported,
                    serde_json::to_string(&log.request_data)?,
                    serde_json::to_string(&log.response_data)?,
                    log.timestamp.to_rfc3339(),
                ],
            )
            .context("Failed to insert log entry")?;
        Ok(())
    }

    /// Lists audit log entries for an integration, newest first.
    pub fn list_logs(&self, integration_uid: &Uuid) -> Result<Vec<IntegrationLog>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn
            .prepare(
                r#"
                SELECT uid, integration_uid, success, error, message, method,
                       records_imported, request_data, response_data, timestamp
                FROM integration_logs
                WHERE integration_uid = ?1
                ORDER BY timestamp DESC
                "#,
            )
            .context("Failed to prepare query")?;
        let mut rows = stmt
            .query(params![integration_uid.to_string()])
            .context("Failed to execute query")?;
        let mut logs = Vec::new();
        while let Some(row) = rows.next().context("Failed to read row")? {
            logs.push(row_to_log(row)?);
        }
        Ok(logs)
    }
}

// ---- row/value helpers shared with the reconciler ----

pub(crate) fn parse_uuid(s: &str) -> Result<Uuid> {
    Uuid::parse_str(s).map_err(|e| anyhow!("Invalid uuid '{}': {}", s, e))
}

pub(crate) fn parse_json_map(s: &str) -> Result<Map<String, Value>> {
    serde_json::from_str(s).context("Stored JSON is not an object")
}

pub(crate) fn parse_opt_datetime(s: Option<String>) -> Result<Option<DateTime<Utc>>> {
    s.map(|s| {
        DateTime::parse_from_rfc3339(&s)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| anyhow!("Invalid timestamp '{}': {}", s, e))
    })
    .transpose()
}

pub(crate) fn parse_datetime(s: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(s)
        .map_err(|e| anyhow!("Invalid timestamp '{}': {}", s, e))?
        .with_timezone(&Utc))
}

pub(crate) fn parse_opt_date(s: Option<String>) -> Result<Option<NaiveDate>> {
    s.map(|s| {
        NaiveDate::parse_from_str(&s, "%Y-%m-%d")
            .map_err(|e| anyhow!("Invalid date '{}': {}", s, e))
    })
    .transpose()
}

pub(crate) fn row_to_integration(row: &Row<'_>) -> Result<Integration> {
    let provider_config: String = row.get(4)?;
    let credentials_uid: Option<String> = row.get(5)?;
    Ok(Integration {
        uid: parse_uuid(&row.get::<_, String>(0)?)?,
        name: row.get(1)?,
        handle: row.get(2)?,
        provider_backend_id: row.get(3)?,
        provider_config: parse_json_map(&provider_config)?,
        credentials_uid: credentials_uid.as_deref().map(parse_uuid).transpose()?,
        is_active: row.get(6)?,
        enable_logging: row.get(7)?,
    })
}

pub(crate) fn row_to_event(row: &Row<'_>) -> Result<Event> {
    let integration_uid: Option<String> = row.get(1)?;
    let extra_fields: String = row.get(7)?;
    Ok(Event {
        uid: parse_uuid(&row.get::<_, String>(0)?)?,
        integration_uid: integration_uid.as_deref().map(parse_uuid).transpose()?,
        event_type: row.get(2)?,
        event_date: parse_opt_date(row.get::<_, Option<String>>(3)?)?,
        location: row.get(4)?,
        city: row.get(5)?,
        category: row.get(6)?,
        extra_fields: parse_json_map(&extra_fields)?,
        created_at: parse_datetime(&row.get::<_, String>(8)?)?,
    })
}

fn row_to_log(row: &Row<'_>) -> Result<IntegrationLog> {
    let method: String = row.get(5)?;
    Ok(IntegrationLog {
        uid: parse_uuid(&row.get::<_, String>(0)?)?,
        integration_uid: parse_uuid(&row.get::<_, String>(1)?)?,
        success: row.get(2)?,
        error: row.get(3)?,
        message: row.get(4)?,
        method: LogMethod::parse(&method)
            .ok_or_else(|| anyhow!("Unknown log method '{}'", method))?,
        records_imported: row.get(6)?,
        request_data: serde_json::from_str(&row.get::<_, String>(7)?)?,
        response_data: serde_json::from_str(&row.get::<_, String>(8)?)?,
        timestamp: parse_datetime(&row.get::<_, String>(9)?)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CredentialsEntity, Integration};
    use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
    use serde_json::json;

    pub(crate) fn test_key() -> String {
        BASE64.encode([0u8; 32])
    }

    pub(crate) fn create_test_store() -> ContextStore {
        ContextStore::new(":memory:", &test_key()).expect("Failed to create test store")
    }

    fn sample_credentials() -> CredentialsEntity {
        let mut public = Map::new();
        public.insert(
            "base_url".to_string(),
            json!("https://api.openweathermap.org/data/2.5"),
        );
        let mut private = Map::new();
        private.insert("api_key".to_string(), json!("0123456789abcdef"));
        CredentialsEntity::new("OpenWeather key", "ow-main", "open_weather", public, private)
    }

    fn sample_integration() -> Integration {
        let mut config = Map::new();
        config.insert("language".to_string(), json!("pt_br"));
        config.insert("city".to_string(), json!("São Paulo"));
        let mut integration = Integration::new("Weather SP", "weather-sp", "open_weather", config);
        integration.is_active = true;
        integration
    }

    #[test]
    fn test_credentials_round_trip() {
        let store = create_test_store();
        let entity = sample_credentials();
        store.save_credentials(&entity).unwrap();

        let loaded = store.get_credentials(&entity.uid).unwrap().unwrap();
        assert_eq!(loaded.handle, "ow-main");
        assert_eq!(loaded.credentials_type_id, "open_weather");
        assert_eq!(loaded.private_data["api_key"], json!("0123456789abcdef"));
        assert!(loaded.last_checked_at.is_none());
    }

    #[test]
    fn test_private_config_is_encrypted_at_rest() {
        let store = create_test_store();
        let entity = sample_credentials();
        store.save_credentials(&entity).unwrap();

        let stored: String = store
            .conn
            .lock()
            .unwrap()
            .query_row(
                "SELECT private_data FROM credentials_entities WHERE uid = ?1",
                params![entity.uid.to_string()],
                |row| row.get(0),
            )
            .unwrap();
        assert!(!stored.contains("0123456789abcdef"));
    }

    #[test]
    fn test_credentials_health_updates() {
        let store = create_test_store();
        let entity = sample_credentials();
        store.save_credentials(&entity).unwrap();

        store.mark_credentials_checked(&entity.uid, None).unwrap();
        let loaded = store.get_credentials(&entity.uid).unwrap().unwrap();
        assert!(loaded.last_checked_at.is_some());
        assert!(loaded.last_success_at.is_some());
        assert!(loaded.last_error_at.is_none());

        store
            .mark_credentials_checked(&entity.uid, Some("api key rejected"))
            .unwrap();
        let loaded = store.get_credentials(&entity.uid).unwrap().unwrap();
        assert!(loaded.last_error_at.is_some());
        assert_eq!(loaded.last_error.as_deref(), Some("api key rejected"));
    }

    #[test]
    fn test_credentials_delete_protected_while_referenced() {
        let store = create_test_store();
        let entity = sample_credentials();
        store.save_credentials(&entity).unwrap();

        let mut integration = sample_integration();
        integration.credentials_uid = Some(entity.uid);
        store.save_integration(&integration).unwrap();

        assert!(store.delete_credentials(&entity.uid).is_err());

        integration.credentials_uid = None;
        store.save_integration(&integration).unwrap();
        assert!(store.delete_credentials(&entity.uid).unwrap());
    }

    #[test]
    fn test_integration_round_trip_and_active_listing() {
        let store = create_test_store();
        let mut integration = sample_integration();
        store.save_integration(&integration).unwrap();

        let loaded = store.get_integration(&integration.uid).unwrap().unwrap();
        assert_eq!(loaded.provider_backend_id, "open_weather");
        assert_eq!(loaded.provider_config["city"], json!("São Paulo"));
        assert!(loaded.enable_logging);

        assert_eq!(store.list_active_integrations().unwrap().len(), 1);
        integration.is_active = false;
        store.save_integration(&integration).unwrap();
        assert!(store.list_active_integrations().unwrap().is_empty());
    }

    #[test]
    fn test_integration_delete_protected_by_logs() {
        let store = create_test_store();
        let integration = sample_integration();
        store.save_integration(&integration).unwrap();

        let log = IntegrationLog::new(
            integration.uid,
            true,
            "fetched",
            LogMethod::Fetch,
            1,
            json!({}),
            json!({}),
        );
        store.insert_log(&log).unwrap();

        assert!(store.delete_integration(&integration.uid).is_err());
    }

    #[test]
    fn test_data_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("contexta.db");

        let entity = sample_credentials();
        {
            let store = ContextStore::new(&db_path, &test_key()).unwrap();
            store.save_credentials(&entity).unwrap();
        }

        let store = ContextStore::new(&db_path, &test_key()).unwrap();
        let loaded = store.get_credentials(&entity.uid).unwrap().unwrap();
        assert_eq!(loaded.handle, "ow-main");
        assert_eq!(loaded.private_data["api_key"], json!("0123456789abcdef"));
    }

    #[test]
    fn test_log_round_trip() {
        let store = create_test_store();
        let integration = sample_integration();
        store.save_integration(&integration).unwrap();

        let log = IntegrationLog::new(
            integration.uid,
            false,
            "connection refused",
            LogMethod::Fetch,
            0,
            json!({"q": "São Paulo"}),
            json!({}),
        );
        store.insert_log(&log).unwrap();

        let logs = store.list_logs(&integration.uid).unwrap();
        assert_eq!(logs.len(), 1);
        assert!(logs[0].error);
        assert_eq!(logs[0].method, LogMethod::Fetch);
        assert_eq!(logs[0].request_data["q"], json!("São Paulo"));
    }
}
