//! Event reconciliation and data versioning.
//!
//! `upsert_event` deduplicates on the (event_type, event_date, location,
//! city) tuple with null-aware matching; `append_data` assigns the next
//! version for an (event, integration) pair inside an immediate
//! transaction, so the sequence stays gap-free under concurrent fetches.

use super::{parse_json_map, parse_uuid, row_to_event, ContextStore};
use crate::model::{DataRecord, Event};
use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use rusqlite::types::ToSql;
use rusqlite::{params, params_from_iter, OptionalExtension, Row, TransactionBehavior};
use serde_json::{Map, Value};
use uuid::Uuid;

/// Input for [`ContextStore::upsert_event`].
#[derive(Clone, Debug)]
pub struct EventDraft {
    /// Integration that produced this data point; recorded as the event's
    /// owner only when the event is first created.
    pub integration_uid: Option<Uuid>,
    pub event_type: String,
    pub event_date: Option<NaiveDate>,
    pub location: Option<String>,
    pub city: Option<String>,
    pub category: Option<String>,
    pub extra_fields: Map<String, Value>,
}

/// Filter dimensions for event queries.
#[derive(Clone, Debug, Default)]
pub struct EventFilter {
    pub event_type: Option<String>,
    pub event_date: Option<NaiveDate>,
    pub location: Option<String>,
    pub city: Option<String>,
    pub category: Option<String>,
    pub integration_uid: Option<Uuid>,
}

/// Filter dimensions for data snapshot queries.
#[derive(Clone, Debug, Default)]
pub struct DataFilter {
    pub event_uid: Option<Uuid>,
    pub integration_uid: Option<Uuid>,
    pub version: Option<u32>,
}

const EVENT_COLUMNS: &str = "uid, integration_uid, event_type, event_date, location, city, \
                             category, extra_fields, created_at";

impl ContextStore {
    /// Finds or creates the canonical event for a data point.
    ///
    /// Matching is exact and null-aware on (event_type, event_date,
    /// location, city). On a match, `category` and `extra_fields` are
    /// overwritten in place (last write wins) and no new row is created.
    ///
    /// Returns the event plus `true` when it was newly created.
    pub fn upsert_event(&self, draft: &EventDraft) -> Result<(Event, bool)> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .context("Failed to begin transaction")?;

        let event_date = draft.event_date.map(|d| d.to_string());
        let extra_fields = serde_json::to_string(&draft.extra_fields)?;

        // IS gives null-safe equality in SQLite.
        let existing: Option<String> = tx
            .query_row(
                r#"
                SELECT uid FROM events
                WHERE event_type = ?1
                  AND event_date IS ?2
                  AND location IS ?3
                  AND city IS ?4
                "#,
                params![draft.event_type, event_date, draft.location, draft.city],
                |row| row.get(0),
            )
            .optional()
            .context("Failed to look up event")?;

        let (uid_text, created) = match existing {
            Some(uid_text) => {
                tx.execute(
                    "UPDATE events SET category = ?1, extra_fields = ?2 WHERE uid = ?3",
                    params![draft.category, extra_fields, uid_text],
                )
                .context("Failed to update event")?;
                (uid_text, false)
            }
            None => {
                let uid_text = Uuid::new_v4().to_string();
                tx.execute(
                    r#"
                    INSERT INTO events (
                        uid, integration_uid, event_type, event_date,
                        location, city, category, extra_fields, created_at
                    )
                    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                    "#,
                    params![
                        uid_text,
                        draft.integration_uid.map(|u| u.to_string()),
                        draft.event_type,
                        event_date,
                        draft.location,
                        draft.city,
                        draft.category,
                        extra_fields,
                        Utc::now().to_rfc3339(),
                    ],
                )
                .context("Failed to insert event")?;
                (uid_text, true)
            }
        };

        let event = {
            let mut stmt = tx.prepare(&format!(
                "SELECT {} FROM events WHERE uid = ?1",
                EVENT_COLUMNS
            ))?;
            let mut rows = stmt.query(params![uid_text])?;
            let row = rows
                .next()
                .context("Failed to read event row")?
                .context("Upserted event disappeared")?;
            row_to_event(row)?
        };

        tx.commit().context("Failed to commit event upsert")?;
        Ok((event, created))
    }

    /// Appends a new immutable data snapshot for (event, integration).
    ///
    /// The version is `max(existing) + 1` (1 when none exist), read and
    /// inserted inside one immediate transaction. The caller-supplied
    /// `data_hash` is stored alongside the payload under `data_hash`; an
    /// unchanged hash still produces a new version — consumers detect
    /// no-op refetches themselves.
    pub fn append_data(
        &self,
        event_uid: &Uuid,
        integration_uid: &Uuid,
        payload: &Map<String, Value>,
        data_hash: &str,
    ) -> Result<DataRecord> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .context("Failed to begin transaction")?;

        let next_version: u32 = tx
            .query_row(
                r#"
                SELECT COALESCE(MAX(version), 0) + 1
                FROM contextual_data
                WHERE event_uid = ?1 AND integration_uid = ?2
                "#,
                params![event_uid.to_string(), integration_uid.to_string()],
                |row| row.get(0),
            )
            .context("Failed to read current version")?;

        let mut extra_fields = payload.clone();
        extra_fields.insert("data_hash".to_string(), Value::String(data_hash.to_string()));

        let record = DataRecord {
            uid: Uuid::new_v4(),
            event_uid: *event_uid,
            integration_uid: *integration_uid,
            version: next_version,
            fetched_at: Utc::now(),
            extra_fields,
        };

        tx.execute(
            r#"
            INSERT INTO contextual_data (
                uid, event_uid, integration_uid, version, fetched_at, extra_fields
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                record.uid.to_string(),
                record.event_uid.to_string(),
                record.integration_uid.to_string(),
                record.version,
                record.fetched_at.to_rfc3339(),
                serde_json::to_string(&record.extra_fields)?,
            ],
        )
        .context("Failed to insert data snapshot")?;

        tx.commit().context("Failed to commit data snapshot")?;
        Ok(record)
    }

    /// Lists events matching the filter, newest first.
    pub fn list_events(&self, filter: &EventFilter) -> Result<Vec<Event>> {
        let mut clauses: Vec<String> = Vec::new();
        let mut bound: Vec<Box<dyn ToSql>> = Vec::new();

        let mut add = |column: &str, value: Box<dyn ToSql>, clauses: &mut Vec<String>, bound: &mut Vec<Box<dyn ToSql>>| {
            clauses.push(format!("{} = ?{}", column, bound.len() + 1));
            bound.push(value);
        };

        if let Some(v) = &filter.event_type {
            add("event_type", Box::new(v.clone()), &mut clauses, &mut bound);
        }
        if let Some(v) = &filter.event_date {
            add("event_date", Box::new(v.to_string()), &mut clauses, &mut bound);
        }
        if let Some(v) = &filter.location {
            add("location", Box::new(v.clone()), &mut clauses, &mut bound);
        }
        if let Some(v) = &filter.city {
            add("city", Box::new(v.clone()), &mut clauses, &mut bound);
        }
        if let Some(v) = &filter.category {
            add("category", Box::new(v.clone()), &mut clauses, &mut bound);
        }
        if let Some(v) = &filter.integration_uid {
            add(
                "integration_uid",
                Box::new(v.to_string()),
                &mut clauses,
                &mut bound,
            );
        }

        let mut sql = format!("SELECT {} FROM events", EVENT_COLUMNS);
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        sql.push_str(" ORDER BY created_at DESC");

        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&sql).context("Failed to prepare query")?;
        let mut rows = stmt
            .query(params_from_iter(bound.iter().map(|p| p.as_ref())))
            .context("Failed to execute query")?;
        let mut events = Vec::new();
        while let Some(row) = rows.next().context("Failed to read row")? {
            events.push(row_to_event(row)?);
        }
        Ok(events)
    }

    /// Lists data snapshots matching the filter, newest first.
    pub fn list_data(&self, filter: &DataFilter) -> Result<Vec<DataRecord>> {
        let mut clauses: Vec<String> = Vec::new();
        let mut bound: Vec<Box<dyn ToSql>> = Vec::new();

        if let Some(v) = &filter.event_uid {
            clauses.push(format!("event_uid = ?{}", bound.len() + 1));
            bound.push(Box::new(v.to_string()));
        }
        if let Some(v) = &filter.integration_uid {
            clauses.push(format!("integration_uid = ?{}", bound.len() + 1));
            bound.push(Box::new(v.to_string()));
        }
        if let Some(v) = filter.version {
            clauses.push(format!("version = ?{}", bound.len() + 1));
            bound.push(Box::new(v as i64));
        }

        let mut sql = String::from(
            "SELECT uid, event_uid, integration_uid, version, fetched_at, extra_fields \
             FROM contextual_data",
        );
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        sql.push_str(" ORDER BY fetched_at DESC, version DESC");

        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(&sql).context("Failed to prepare query")?;
        let mut rows = stmt
            .query(params_from_iter(bound.iter().map(|p| p.as_ref())))
            .context("Failed to execute query")?;
        let mut records = Vec::new();
        while let Some(row) = rows.next().context("Failed to read row")? {
            records.push(row_to_data(row)?);
        }
        Ok(records)
    }
}

fn row_to_data(row: &Row<'_>) -> Result<DataRecord> {
    let extra_fields: String = row.get(5)?;
    Ok(DataRecord {
        uid: parse_uuid(&row.get::<_, String>(0)?)?,
        event_uid: parse_uuid(&row.get::<_, String>(1)?)?,
        integration_uid: parse_uuid(&row.get::<_, String>(2)?)?,
        version: row.get(3)?,
        fetched_at: super::parse_datetime(&row.get::<_, String>(4)?)?,
        extra_fields: parse_json_map(&extra_fields)?,
    })
}
