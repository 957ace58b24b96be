//! # hb-store-json
//! haulboard/crates/hb-plugins/hb-store-json/src/lib.rs
//!
//! Flat-file implementation of `ContactStore`: the whole collection lives in
//! one JSON array document. Every mutation is a read-modify-write of that
//! document, serialized through a per-store async mutex so two concurrent
//! mutations can never interleave and silently drop each other's change.
//! Writes go to a temp sibling and are renamed into place, so readers never
//! observe a half-written document.

use async_trait::async_trait;
use chrono::Utc;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::Mutex;

use hb_core::error::{AppError, Result};
use hb_core::models::{ContactRequest, ContactStats, ContactStatus, NewContact};
use hb_core::traits::ContactStore;

pub struct JsonContactStore {
    path: PathBuf,
    /// Held for the full read-modify-write span of every mutation.
    write_lock: Mutex<()>,
}

impl JsonContactStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the whole document. A missing file is an empty store.
    async fn load(&self) -> Result<Vec<ContactRequest>> {
        match fs::read(&self.path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)
                .map_err(|e| AppError::Internal(format!("contacts document is corrupt: {e}"))),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                log::debug!("no contacts document at {} yet", self.path.display());
                Ok(Vec::new())
            }
            Err(e) => Err(AppError::Internal(format!(
                "failed to read {}: {e}",
                self.path.display()
            ))),
        }
    }

    /// Rewrites the whole document atomically (temp file + rename).
    async fn persist(&self, contacts: &[ContactRequest]) -> Result<()> {
        let json = serde_json::to_vec_pretty(contacts)
            .map_err(|e| AppError::Internal(format!("failed to serialize contacts: {e}")))?;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| AppError::Internal(format!("failed to create data dir: {e}")))?;
        }

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, &json)
            .await
            .map_err(|e| AppError::Internal(format!("failed to write {}: {e}", tmp.display())))?;
        fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| AppError::Internal(format!("failed to replace {}: {e}", self.path.display())))
    }
}

#[async_trait]
impl ContactStore for JsonContactStore {
    async fn create(&self, fields: NewContact) -> Result<ContactRequest> {
        let _guard = self.write_lock.lock().await;
        let mut contacts = self.load().await?;

        let now = Utc::now();
        // Epoch millis as the id, bumped on collision so two submissions in
        // the same millisecond still get distinct ids.
        let mut millis = now.timestamp_millis();
        while contacts.iter().any(|c| c.id == millis.to_string()) {
            millis += 1;
        }

        let contact = ContactRequest {
            id: millis.to_string(),
            timestamp: now,
            name: fields.name,
            phone: fields.phone,
            email: fields.email,
            zip: fields.zip,
            preferred_date: fields.preferred_date,
            preferred_time: fields.preferred_time,
            items: fields.items,
            location: fields.location,
            images: fields.images,
            status: ContactStatus::New,
            created_at: now,
            updated_at: now,
        };

        // Newest first, matching list order.
        contacts.insert(0, contact.clone());
        self.persist(&contacts).await?;
        Ok(contact)
    }

    async fn list_all(&self) -> Result<Vec<ContactRequest>> {
        let mut contacts = self.load().await?;
        contacts.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(contacts)
    }

    async fn update_status(&self, id: &str, status: ContactStatus) -> Result<ContactRequest> {
        let _guard = self.write_lock.lock().await;
        let mut contacts = self.load().await?;

        let contact = contacts
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| AppError::contact_not_found(id))?;
        contact.status = status;
        contact.updated_at = Utc::now();
        let updated = contact.clone();

        self.persist(&contacts).await?;
        Ok(updated)
    }

    async fn delete(&self, id: &str) -> Result<ContactRequest> {
        let _guard = self.write_lock.lock().await;
        let mut contacts = self.load().await?;

        let index = contacts
            .iter()
            .position(|c| c.id == id)
            .ok_or_else(|| AppError::contact_not_found(id))?;
        let removed = contacts.remove(index);

        self.persist(&contacts).await?;
        Ok(removed)
    }

    async fn stats(&self) -> Result<ContactStats> {
        let contacts = self.load().await?;
        let mut stats = ContactStats {
            total: contacts.len() as u64,
            ..ContactStats::default()
        };
        for contact in &contacts {
            match contact.status {
                ContactStatus::New => stats.new += 1,
                ContactStatus::Contacted => stats.contacted += 1,
                ContactStatus::Completed => stats.completed += 1,
            }
        }
        Ok(stats)
    }
}
