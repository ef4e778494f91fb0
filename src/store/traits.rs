//! `LeadStore` trait: the async persistence interface for lead records.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::error::DatabaseError;

/// A lead about to be written. Demo fields are `None` when the user skipped
/// scheduling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLead {
    /// Transport identity the intake arrived from.
    pub sender: String,
    pub name: String,
    pub email: String,
    pub business_name: String,
    pub demo_date: Option<String>,
    pub demo_time: Option<String>,
}

/// A persisted lead.
#[derive(Debug, Clone, Serialize)]
pub struct LeadRecord {
    pub id: Uuid,
    pub sender: String,
    pub name: String,
    pub email: String,
    pub business_name: String,
    pub demo_date: Option<String>,
    pub demo_time: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Backend-agnostic lead persistence.
#[async_trait]
pub trait LeadStore: Send + Sync {
    /// Run all pending schema migrations.
    async fn run_migrations(&self) -> Result<(), DatabaseError>;

    /// Insert a lead. `id` and `created_at` are assigned by the store.
    async fn save_lead(&self, lead: &NewLead) -> Result<LeadRecord, DatabaseError>;

    /// Get a lead by ID.
    async fn get_lead(&self, id: Uuid) -> Result<Option<LeadRecord>, DatabaseError>;

    /// Most recent leads first, up to `limit`.
    async fn list_leads(&self, limit: usize) -> Result<Vec<LeadRecord>, DatabaseError>;
}
