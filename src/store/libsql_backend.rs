//! libSQL backend: async `LeadStore` implementation.
//!
//! Supports local file and in-memory databases.

use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use libsql::{Connection, params};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::DatabaseError;
use crate::store::migrations;
use crate::store::traits::{LeadRecord, LeadStore, NewLead};

/// libSQL database backend.
///
/// Stores a single connection that is reused for all operations.
/// `libsql::Connection` is `Send + Sync` and safe for concurrent async use.
pub struct LibSqlBackend {
    _db: libsql::Database,
    conn: Connection,
}

impl LibSqlBackend {
    /// Open (or create) a local database file and run migrations.
    pub async fn new_local(path: &Path) -> Result<Self, DatabaseError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                DatabaseError::Pool(format!("Failed to create database directory: {e}"))
            })?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| DatabaseError::Pool(format!("Failed to open libSQL database: {e}")))?;

        let backend = Self::from_database(db)?;
        backend.run_migrations().await?;
        info!(path = %path.display(), "Database opened");
        Ok(backend)
    }

    /// Create an in-memory database (for tests).
    pub async fn new_memory() -> Result<Self, DatabaseError> {
        let db = libsql::Builder::new_local(":memory:")
            .build()
            .await
            .map_err(|e| {
                DatabaseError::Pool(format!("Failed to create in-memory database: {e}"))
            })?;

        let backend = Self::from_database(db)?;
        backend.run_migrations().await?;
        Ok(backend)
    }

    fn from_database(db: libsql::Database) -> Result<Self, DatabaseError> {
        let conn = db
            .connect()
            .map_err(|e| DatabaseError::Pool(format!("Failed to create connection: {e}")))?;
        Ok(Self { _db: db, conn })
    }
}

// ── Helper functions ────────────────────────────────────────────────

/// Parse an RFC 3339 or SQLite datetime string into DateTime<Utc>.
fn parse_datetime(s: &str) -> DateTime<Utc> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return dt.with_timezone(&Utc);
    }
    if let Ok(ndt) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f") {
        return ndt.and_utc();
    }
    if let Ok(ndt) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return ndt.and_utc();
    }
    DateTime::<Utc>::MIN_UTC
}

/// Convert `Option<&str>` to libsql Value.
fn opt_text(s: Option<&str>) -> libsql::Value {
    match s {
        Some(s) => libsql::Value::Text(s.to_string()),
        None => libsql::Value::Null,
    }
}

const LEAD_COLUMNS: &str =
    "id, sender, name, email, business_name, demo_date, demo_time, created_at";

fn row_to_lead(row: &libsql::Row) -> Result<LeadRecord, DatabaseError> {
    let id_str: String = row
        .get(0)
        .map_err(|e| DatabaseError::Serialization(format!("lead id: {e}")))?;
    let id = Uuid::parse_str(&id_str)
        .map_err(|e| DatabaseError::Serialization(format!("lead id '{id_str}': {e}")))?;
    let text = |idx: i32| -> Result<String, DatabaseError> {
        row.get(idx)
            .map_err(|e| DatabaseError::Serialization(format!("lead column {idx}: {e}")))
    };
    let created_str = text(7)?;

    Ok(LeadRecord {
        id,
        sender: text(1)?,
        name: text(2)?,
        email: text(3)?,
        business_name: text(4)?,
        demo_date: row.get(5).ok(),
        demo_time: row.get(6).ok(),
        created_at: parse_datetime(&created_str),
    })
}

// ── Trait implementation ────────────────────────────────────────────

#[async_trait]
impl LeadStore for LibSqlBackend {
    async fn run_migrations(&self) -> Result<(), DatabaseError> {
        migrations::run_migrations(&self.conn).await
    }

    async fn save_lead(&self, lead: &NewLead) -> Result<LeadRecord, DatabaseError> {
        let id = Uuid::new_v4();
        let now = Utc::now();
        self.conn
            .execute(
                "INSERT INTO leads (id, sender, name, email, business_name, demo_date, demo_time, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    id.to_string(),
                    lead.sender.as_str(),
                    lead.name.as_str(),
                    lead.email.as_str(),
                    lead.business_name.as_str(),
                    opt_text(lead.demo_date.as_deref()),
                    opt_text(lead.demo_time.as_deref()),
                    now.to_rfc3339(),
                ],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("save_lead: {e}")))?;

        debug!(id = %id, with_demo = lead.demo_date.is_some(), "Lead inserted into DB");
        Ok(LeadRecord {
            id,
            sender: lead.sender.clone(),
            name: lead.name.clone(),
            email: lead.email.clone(),
            business_name: lead.business_name.clone(),
            demo_date: lead.demo_date.clone(),
            demo_time: lead.demo_time.clone(),
            created_at: now,
        })
    }

    async fn get_lead(&self, id: Uuid) -> Result<Option<LeadRecord>, DatabaseError> {
        let mut rows = self
            .conn
            .query(
                &format!("SELECT {LEAD_COLUMNS} FROM leads WHERE id = ?1"),
                params![id.to_string()],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("get_lead: {e}")))?;

        match rows.next().await {
            Ok(Some(row)) => Ok(Some(row_to_lead(&row)?)),
            Ok(None) => Ok(None),
            Err(e) => Err(DatabaseError::Query(format!("get_lead: {e}"))),
        }
    }

    async fn list_leads(&self, limit: usize) -> Result<Vec<LeadRecord>, DatabaseError> {
        let mut rows = self
            .conn
            .query(
                &format!(
                    "SELECT {LEAD_COLUMNS} FROM leads ORDER BY created_at DESC, rowid DESC LIMIT ?1"
                ),
                params![limit as i64],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("list_leads: {e}")))?;

        let mut leads = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| DatabaseError::Query(format!("list_leads: {e}")))?
        {
            leads.push(row_to_lead(&row)?);
        }
        Ok(leads)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_db() -> LibSqlBackend {
        LibSqlBackend::new_memory().await.unwrap()
    }

    fn lead(name: &str, demo: Option<(&str, &str)>) -> NewLead {
        NewLead {
            sender: "whatsapp:+15550001".to_string(),
            name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase()),
            business_name: "Acme".to_string(),
            demo_date: demo.map(|(d, _)| d.to_string()),
            demo_time: demo.map(|(_, t)| t.to_string()),
        }
    }

    #[tokio::test]
    async fn save_and_get_partial_lead() {
        let db = test_db().await;
        let saved = db.save_lead(&lead("Alice", None)).await.unwrap();

        let fetched = db.get_lead(saved.id).await.unwrap().unwrap();
        assert_eq!(fetched.name, "Alice");
        assert_eq!(fetched.email, "alice@example.com");
        assert_eq!(fetched.business_name, "Acme");
        assert!(fetched.demo_date.is_none());
        assert!(fetched.demo_time.is_none());
        assert_eq!(fetched.created_at.timestamp(), saved.created_at.timestamp());
    }

    #[tokio::test]
    async fn save_full_lead_keeps_raw_demo_text() {
        let db = test_db().await;
        let saved = db
            .save_lead(&lead("Bob", Some(("15th March", "2:30 pm"))))
            .await
            .unwrap();

        let fetched = db.get_lead(saved.id).await.unwrap().unwrap();
        assert_eq!(fetched.demo_date.as_deref(), Some("15th March"));
        assert_eq!(fetched.demo_time.as_deref(), Some("2:30 pm"));
    }

    #[tokio::test]
    async fn get_lead_not_found() {
        let db = test_db().await;
        assert!(db.get_lead(Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn list_leads_most_recent_first() {
        let db = test_db().await;
        db.save_lead(&lead("First", None)).await.unwrap();
        db.save_lead(&lead("Second", None)).await.unwrap();
        db.save_lead(&lead("Third", None)).await.unwrap();

        let leads = db.list_leads(2).await.unwrap();
        assert_eq!(leads.len(), 2);
        assert_eq!(leads[0].name, "Third");
        assert_eq!(leads[1].name, "Second");
    }

    #[tokio::test]
    async fn local_file_database_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("intake.db");

        let id = {
            let db = LibSqlBackend::new_local(&path).await.unwrap();
            db.save_lead(&lead("Carol", None)).await.unwrap().id
        };

        let reopened = LibSqlBackend::new_local(&path).await.unwrap();
        let fetched = reopened.get_lead(id).await.unwrap().unwrap();
        assert_eq!(fetched.name, "Carol");
    }

    #[test]
    fn parse_datetime_accepts_sqlite_format() {
        let dt = parse_datetime("2026-03-15 14:30:00");
        assert_eq!(dt.to_rfc3339(), "2026-03-15T14:30:00+00:00");
    }
}
