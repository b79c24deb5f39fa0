//! SQLite 歸檔
//!
//! Every triaged message lands here, recruiter or not, so reruns can
//! skip nothing silently and the report binary has history to show.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::domain::model::{JobPosting, StoredEmail};
use crate::domain::ports::EmailStore;
use crate::utils::error::Result;

/// Path-based store that opens a connection per operation. Runs are
/// short-lived, so pooling would buy nothing.
#[derive(Clone)]
pub struct SqliteEmailStore {
    db_path: PathBuf,
}

impl SqliteEmailStore {
    pub fn new<P: Into<PathBuf>>(db_path: P) -> Self {
        Self {
            db_path: db_path.into(),
        }
    }

    fn connection(&self) -> Result<Connection> {
        Ok(Connection::open(&self.db_path)?)
    }
}

const SELECT_COLUMNS: &str = "message_id, sender, subject, body, received_date, analyzed_data, \
                              is_recruiter, is_followup, mentions_topics, draft_reply";

fn row_to_email(row: &Row<'_>) -> rusqlite::Result<StoredEmail> {
    let received: String = row.get(4)?;
    let received_date = DateTime::parse_from_rfc3339(&received)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(4, Type::Text, Box::new(e)))?;

    let analyzed: Option<String> = row.get(5)?;
    let posting = match analyzed {
        Some(json) => Some(serde_json::from_str::<JobPosting>(&json).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(5, Type::Text, Box::new(e))
        })?),
        None => None,
    };

    Ok(StoredEmail {
        message_id: row.get(0)?,
        sender: row.get(1)?,
        subject: row.get(2)?,
        body: row.get(3)?,
        received_date,
        posting,
        is_recruiter: row.get(6)?,
        is_followup: row.get(7)?,
        mentions_topics: row.get(8)?,
        draft_reply: row.get(9)?,
    })
}

impl EmailStore for SqliteEmailStore {
    fn init_schema(&self) -> Result<()> {
        let conn = self.connection()?;
        conn.execute(
            "CREATE TABLE IF NOT EXISTS job_emails (
                message_id     TEXT PRIMARY KEY,
                sender         TEXT NOT NULL,
                subject        TEXT NOT NULL,
                body           TEXT NOT NULL,
                received_date  TEXT NOT NULL,
                analyzed_data  TEXT,
                is_recruiter   INTEGER NOT NULL DEFAULT 0,
                is_followup    INTEGER NOT NULL DEFAULT 0,
                mentions_topics INTEGER NOT NULL DEFAULT 0,
                created_at     TEXT NOT NULL DEFAULT (datetime('now'))
            )",
            [],
        )?;

        // 舊資料庫沒有 draft_reply 欄位,在這裡補上
        let mut has_draft_reply = false;
        {
            let mut stmt = conn.prepare("PRAGMA table_info(job_emails)")?;
            let mut rows = stmt.query([])?;
            while let Some(row) = rows.next()? {
                let name: String = row.get(1)?;
                if name == "draft_reply" {
                    has_draft_reply = true;
                }
            }
        }
        if !has_draft_reply {
            conn.execute("ALTER TABLE job_emails ADD COLUMN draft_reply TEXT", [])?;
            tracing::info!("🔧 Added draft_reply column to job_emails");
        }

        Ok(())
    }

    fn store_email(&self, record: &StoredEmail) -> Result<()> {
        let conn = self.connection()?;
        let analyzed = match &record.posting {
            Some(posting) => Some(serde_json::to_string(posting)?),
            None => None,
        };
        conn.execute(
            "INSERT OR REPLACE INTO job_emails
                 (message_id, sender, subject, body, received_date, analyzed_data,
                  is_recruiter, is_followup, mentions_topics, draft_reply)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                record.message_id,
                record.sender,
                record.subject,
                record.body,
                record.received_date.to_rfc3339(),
                analyzed,
                record.is_recruiter,
                record.is_followup,
                record.mentions_topics,
                record.draft_reply,
            ],
        )?;
        tracing::debug!("💾 Archived {}", record.message_id);
        Ok(())
    }

    fn get_email(&self, message_id: &str) -> Result<Option<StoredEmail>> {
        let conn = self.connection()?;
        let query = format!(
            "SELECT {} FROM job_emails WHERE message_id = ?1",
            SELECT_COLUMNS
        );
        let record = conn
            .query_row(&query, params![message_id], row_to_email)
            .optional()?;
        Ok(record)
    }

    fn recruiter_emails(&self) -> Result<Vec<StoredEmail>> {
        let conn = self.connection()?;
        let query = format!(
            "SELECT {} FROM job_emails WHERE is_recruiter = 1 ORDER BY received_date DESC",
            SELECT_COLUMNS
        );
        let mut stmt = conn.prepare(&query)?;
        let rows = stmt.query_map([], row_to_email)?;
        let mut records = Vec::new();
        for row in rows {
            records.push(row?);
        }
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::NamedTempFile;

    fn sample(message_id: &str, hour: u32, is_recruiter: bool) -> StoredEmail {
        StoredEmail {
            message_id: message_id.to_string(),
            sender: "recruiter@techcorp.com".to_string(),
            subject: "Backend role".to_string(),
            body: "We are hiring.".to_string(),
            received_date: Utc.with_ymd_and_hms(2024, 3, 14, hour, 0, 0).unwrap(),
            posting: is_recruiter.then(|| JobPosting {
                company_name: Some("TechCorp".to_string()),
                role_title: Some("Backend Engineer".to_string()),
                ..JobPosting::default()
            }),
            is_recruiter,
            is_followup: false,
            mentions_topics: false,
            draft_reply: is_recruiter.then(|| "Thanks, but no.".to_string()),
        }
    }

    #[test]
    fn test_store_and_get_roundtrip() {
        let file = NamedTempFile::new().unwrap();
        let store = SqliteEmailStore::new(file.path());
        store.init_schema().unwrap();

        let record = sample("<m1@example.com>", 10, true);
        store.store_email(&record).unwrap();

        let loaded = store.get_email("<m1@example.com>").unwrap().unwrap();
        assert_eq!(loaded.message_id, record.message_id);
        assert_eq!(loaded.received_date, record.received_date);
        assert_eq!(
            loaded.posting.as_ref().unwrap().company_name.as_deref(),
            Some("TechCorp")
        );
        assert_eq!(loaded.draft_reply.as_deref(), Some("Thanks, but no."));
        assert!(loaded.is_recruiter);
        assert!(!loaded.is_followup);
    }

    #[test]
    fn test_get_unknown_id_returns_none() {
        let file = NamedTempFile::new().unwrap();
        let store = SqliteEmailStore::new(file.path());
        store.init_schema().unwrap();

        assert!(store.get_email("<missing@example.com>").unwrap().is_none());
    }

    #[test]
    fn test_store_is_an_upsert() {
        let file = NamedTempFile::new().unwrap();
        let store = SqliteEmailStore::new(file.path());
        store.init_schema().unwrap();

        store.store_email(&sample("<m1@example.com>", 10, true)).unwrap();
        let mut updated = sample("<m1@example.com>", 10, true);
        updated.subject = "Updated role".to_string();
        store.store_email(&updated).unwrap();

        let loaded = store.get_email("<m1@example.com>").unwrap().unwrap();
        assert_eq!(loaded.subject, "Updated role");

        let conn = Connection::open(file.path()).unwrap();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM job_emails", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_recruiter_emails_newest_first() {
        let file = NamedTempFile::new().unwrap();
        let store = SqliteEmailStore::new(file.path());
        store.init_schema().unwrap();

        store.store_email(&sample("<m1@example.com>", 9, true)).unwrap();
        store.store_email(&sample("<m2@example.com>", 11, true)).unwrap();
        store.store_email(&sample("<m3@example.com>", 10, false)).unwrap();

        let recruiters = store.recruiter_emails().unwrap();
        assert_eq!(recruiters.len(), 2);
        assert_eq!(recruiters[0].message_id, "<m2@example.com>");
        assert_eq!(recruiters[1].message_id, "<m1@example.com>");
    }

    #[test]
    fn test_missing_posting_stays_none() {
        let file = NamedTempFile::new().unwrap();
        let store = SqliteEmailStore::new(file.path());
        store.init_schema().unwrap();

        store.store_email(&sample("<m1@example.com>", 10, false)).unwrap();

        let loaded = store.get_email("<m1@example.com>").unwrap().unwrap();
        assert!(loaded.posting.is_none());
        assert!(loaded.draft_reply.is_none());
    }

    #[test]
    fn test_init_schema_migrates_old_database() {
        let file = NamedTempFile::new().unwrap();
        {
            // A database from before decline drafts were archived.
            let conn = Connection::open(file.path()).unwrap();
            conn.execute(
                "CREATE TABLE job_emails (
                    message_id     TEXT PRIMARY KEY,
                    sender         TEXT NOT NULL,
                    subject        TEXT NOT NULL,
                    body           TEXT NOT NULL,
                    received_date  TEXT NOT NULL,
                    analyzed_data  TEXT,
                    is_recruiter   INTEGER NOT NULL DEFAULT 0,
                    is_followup    INTEGER NOT NULL DEFAULT 0,
                    mentions_topics INTEGER NOT NULL DEFAULT 0,
                    created_at     TEXT NOT NULL DEFAULT (datetime('now'))
                )",
                [],
            )
            .unwrap();
        }

        let store = SqliteEmailStore::new(file.path());
        store.init_schema().unwrap();
        store.store_email(&sample("<m1@example.com>", 10, true)).unwrap();

        let loaded = store.get_email("<m1@example.com>").unwrap().unwrap();
        assert_eq!(loaded.draft_reply.as_deref(), Some("Thanks, but no."));

        // Running it again is a no-op.
        store.init_schema().unwrap();
    }
}
