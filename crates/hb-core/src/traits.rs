//! # Core Traits (Ports)
//!
//! Any storage or auth plugin must implement these traits to be used by the
//! binary. Both store backends are exercised by the same contract, so the
//! rest of the system never knows which one is live.

use async_trait::async_trait;
use crate::error::Result;
use crate::models::{ContactRequest, ContactStats, ContactStatus, NewContact};

/// Data persistence contract for contact requests.
///
/// Implementations assign the id, creation timestamp and the initial `new`
/// status themselves; callers only supply validated fields.
#[async_trait]
pub trait ContactStore: Send + Sync {
    /// Persists a new request and returns the stored record.
    async fn create(&self, fields: NewContact) -> Result<ContactRequest>;

    /// All requests, newest first (timestamp descending).
    async fn list_all(&self) -> Result<Vec<ContactRequest>>;

    /// Sets the status and refreshes `updated_at`. Fails with `NotFound`
    /// when the id is absent.
    async fn update_status(&self, id: &str, status: ContactStatus) -> Result<ContactRequest>;

    /// Removes and returns the record. Fails with `NotFound` when absent.
    async fn delete(&self, id: &str) -> Result<ContactRequest>;

    /// Fresh per-status counts; never cached.
    async fn stats(&self) -> Result<ContactStats>;
}

/// Admin credential verification contract.
#[async_trait]
pub trait AdminAuth: Send + Sync {
    /// Returns true only when both the configured username and password
    /// match. Implementations must take the same time for an unknown
    /// username as for a wrong password.
    async fn verify_login(&self, username: &str, password: &str) -> bool;
}
