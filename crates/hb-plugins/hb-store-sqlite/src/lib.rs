//! # hb-store-sqlite Implementation
//!
//! This module implements the data mapping between the SQLite relational
//! model and the `hb-core` domain models. Each operation is one independent
//! statement; concurrent mutations are safe under the driver's own locking,
//! so no cross-operation serialization is needed here.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use std::collections::HashSet;
use std::str::FromStr;

use hb_core::error::{AppError, Result};
use hb_core::models::{AttachmentRef, ContactRequest, ContactStats, ContactStatus, NewContact};
use hb_core::traits::ContactStore;

/// Mirrors the document layout of the JSON backend: same columns, `images`
/// as a JSON-typed text column, status constrained to the three-value enum.
/// `source_id` records the originating flat-file id for migrated rows so a
/// re-run of the migration can skip them.
const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS contacts (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        timestamp TEXT NOT NULL,
        name TEXT NOT NULL,
        phone TEXT NOT NULL,
        email TEXT,
        zip TEXT NOT NULL,
        preferred_date TEXT NOT NULL,
        preferred_time TEXT NOT NULL DEFAULT 'Any time',
        items TEXT NOT NULL,
        location TEXT,
        images TEXT NOT NULL DEFAULT '[]',
        status TEXT NOT NULL DEFAULT 'new' CHECK (status IN ('new', 'contacted', 'completed')),
        source_id TEXT,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )",
    "CREATE INDEX IF NOT EXISTS idx_contacts_status ON contacts(status)",
    "CREATE INDEX IF NOT EXISTS idx_contacts_timestamp ON contacts(timestamp DESC)",
    "CREATE UNIQUE INDEX IF NOT EXISTS idx_contacts_source_id
        ON contacts(source_id) WHERE source_id IS NOT NULL",
];

pub struct SqliteContactStore {
    pool: SqlitePool,
}

fn db_err(e: sqlx::Error) -> AppError {
    AppError::Internal(format!("database error: {e}"))
}

fn row_to_contact(row: &SqliteRow) -> Result<ContactRequest> {
    let images: String = row.try_get("images").map_err(db_err)?;
    let images: Vec<AttachmentRef> = serde_json::from_str(&images)
        .map_err(|e| AppError::Internal(format!("corrupt images column: {e}")))?;

    let status: String = row.try_get("status").map_err(db_err)?;
    let status = ContactStatus::from_str(&status)
        .map_err(|_| AppError::Internal(format!("unknown status in row: {status}")))?;

    Ok(ContactRequest {
        id: row.try_get::<i64, _>("id").map_err(db_err)?.to_string(),
        timestamp: row.try_get::<DateTime<Utc>, _>("timestamp").map_err(db_err)?,
        name: row.try_get("name").map_err(db_err)?,
        phone: row.try_get("phone").map_err(db_err)?,
        email: row.try_get("email").map_err(db_err)?,
        zip: row.try_get("zip").map_err(db_err)?,
        preferred_date: row.try_get("preferred_date").map_err(db_err)?,
        preferred_time: row.try_get("preferred_time").map_err(db_err)?,
        items: row.try_get("items").map_err(db_err)?,
        location: row.try_get("location").map_err(db_err)?,
        images,
        status,
        created_at: row.try_get::<DateTime<Utc>, _>("created_at").map_err(db_err)?,
        updated_at: row.try_get::<DateTime<Utc>, _>("updated_at").map_err(db_err)?,
    })
}

impl SqliteContactStore {
    /// Connects and initializes the schema. `sqlite::memory:` works for
    /// tests; file URLs get the database created on first use.
    pub async fn connect(url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(db_err)?
            .create_if_missing(true);

        // A shared in-memory database only exists per connection; keep the
        // pool at one connection so tests see a single store.
        let max_connections = if url.contains(":memory:") { 1 } else { 5 };
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await
            .map_err(db_err)?;

        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    async fn init_schema(&self) -> Result<()> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(db_err)?;
        }
        log::debug!("contacts schema initialized");
        Ok(())
    }

    /// Connectivity check used by the migration utility before it writes
    /// anything.
    pub async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(())
    }

    /// File-backend ids of every row that was produced by a migration run.
    pub async fn migrated_source_ids(&self) -> Result<HashSet<String>> {
        let rows = sqlx::query("SELECT source_id FROM contacts WHERE source_id IS NOT NULL")
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;
        rows.iter()
            .map(|row| row.try_get::<String, _>("source_id").map_err(db_err))
            .collect()
    }

    /// Inserts a record copied from the flat-file backend. Status and
    /// `source_id` land in the same statement as the row itself, so a
    /// migrated row can never exist without its marker; the unique index
    /// rejects a second copy of the same source outright.
    pub async fn create_migrated(
        &self,
        fields: NewContact,
        status: ContactStatus,
        source_id: &str,
    ) -> Result<ContactRequest> {
        let now = Utc::now();
        let images = serde_json::to_string(&fields.images)
            .map_err(|e| AppError::Internal(format!("failed to serialize images: {e}")))?;

        let row = sqlx::query(
            "INSERT INTO contacts (
                timestamp, name, phone, email, zip, preferred_date,
                preferred_time, items, location, images, status,
                source_id, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING *",
        )
        .bind(now)
        .bind(&fields.name)
        .bind(&fields.phone)
        .bind(&fields.email)
        .bind(&fields.zip)
        .bind(&fields.preferred_date)
        .bind(&fields.preferred_time)
        .bind(&fields.items)
        .bind(&fields.location)
        .bind(&images)
        .bind(status.as_str())
        .bind(source_id)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)?;

        row_to_contact(&row)
    }
}

#[async_trait]
impl ContactStore for SqliteContactStore {
    async fn create(&self, fields: NewContact) -> Result<ContactRequest> {
        let now = Utc::now();
        let images = serde_json::to_string(&fields.images)
            .map_err(|e| AppError::Internal(format!("failed to serialize images: {e}")))?;

        let row = sqlx::query(
            "INSERT INTO contacts (
                timestamp, name, phone, email, zip, preferred_date,
                preferred_time, items, location, images, status,
                created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 'new', ?, ?)
            RETURNING *",
        )
        .bind(now)
        .bind(&fields.name)
        .bind(&fields.phone)
        .bind(&fields.email)
        .bind(&fields.zip)
        .bind(&fields.preferred_date)
        .bind(&fields.preferred_time)
        .bind(&fields.items)
        .bind(&fields.location)
        .bind(&images)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)?;

        row_to_contact(&row)
    }

    async fn list_all(&self) -> Result<Vec<ContactRequest>> {
        let rows = sqlx::query("SELECT * FROM contacts ORDER BY timestamp DESC")
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;
        rows.iter().map(row_to_contact).collect()
    }

    async fn update_status(&self, id: &str, status: ContactStatus) -> Result<ContactRequest> {
        let row_id: i64 = id.parse().map_err(|_| AppError::contact_not_found(id))?;
        let row = sqlx::query(
            "UPDATE contacts SET status = ?, updated_at = ? WHERE id = ? RETURNING *",
        )
        .bind(status.as_str())
        .bind(Utc::now())
        .bind(row_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        match row {
            Some(row) => row_to_contact(&row),
            None => Err(AppError::contact_not_found(id)),
        }
    }

    async fn delete(&self, id: &str) -> Result<ContactRequest> {
        let row_id: i64 = id.parse().map_err(|_| AppError::contact_not_found(id))?;
        let row = sqlx::query("DELETE FROM contacts WHERE id = ? RETURNING *")
            .bind(row_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;

        match row {
            Some(row) => row_to_contact(&row),
            None => Err(AppError::contact_not_found(id)),
        }
    }

    async fn stats(&self) -> Result<ContactStats> {
        let row = sqlx::query(
            "SELECT
                COUNT(*) AS total,
                COUNT(*) FILTER (WHERE status = 'new') AS new_count,
                COUNT(*) FILTER (WHERE status = 'contacted') AS contacted_count,
                COUNT(*) FILTER (WHERE status = 'completed') AS completed_count
            FROM contacts",
        )
        .fetch_one(&self.pool)
        .await
        .map_err(db_err)?;

        Ok(ContactStats {
            total: row.try_get::<i64, _>("total").map_err(db_err)? as u64,
            new: row.try_get::<i64, _>("new_count").map_err(db_err)? as u64,
            contacted: row.try_get::<i64, _>("contacted_count").map_err(db_err)? as u64,
            completed: row.try_get::<i64, _>("completed_count").map_err(db_err)? as u64,
        })
    }
}
