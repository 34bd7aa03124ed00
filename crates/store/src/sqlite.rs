//! SQLite storage for documents and alerts
//!
//! Each table keeps the denormalized lookup columns next to a JSON body holding
//! the full record.

use std::path::Path;
use std::sync::Mutex;

use chrono::{SecondsFormat, Utc};
use kycguard_core::{
    Alert, AlertId, DocumentId, DocumentRecord, FraudAnalysisResult, NewAlert, NewDocument,
};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};

use crate::error::{StoreError, StoreResult};
use crate::filter::{Clause, DocumentField, DocumentFilter};
use crate::traits::{AlertFilter, AlertStore, DocumentStore};

/// SQLite-backed store
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) the database at `path`
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        Self::with_connection(conn)
    }

    /// Create an in-memory store (for testing)
    pub fn in_memory() -> StoreResult<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> StoreResult<Self> {
        init_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

fn init_schema(conn: &Connection) -> StoreResult<()> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS documents (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            file_hash TEXT,
            aadhaar TEXT,
            pan TEXT,
            dl TEXT,
            device_hash TEXT,
            created_at TEXT NOT NULL,
            body TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_documents_user ON documents(user_id);
        CREATE INDEX IF NOT EXISTS idx_documents_file_hash ON documents(file_hash);
        CREATE INDEX IF NOT EXISTS idx_documents_aadhaar ON documents(aadhaar);
        CREATE INDEX IF NOT EXISTS idx_documents_pan ON documents(pan);
        CREATE INDEX IF NOT EXISTS idx_documents_device ON documents(device_hash);

        CREATE TABLE IF NOT EXISTS alerts (
            id TEXT PRIMARY KEY,
            document_id TEXT NOT NULL,
            seen INTEGER NOT NULL DEFAULT 0,
            timestamp TEXT NOT NULL,
            body TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_alerts_seen ON alerts(seen);",
    )?;
    Ok(())
}

/// Translate a clause into SQL, pushing its bound values onto `values`
fn clause_sql(clause: &Clause, values: &mut Vec<String>) -> String {
    match clause {
        Clause::Eq(field, value) => {
            values.push(value.clone());
            format!("{} = ?", field.column())
        }
        Clause::Ne(field, value) => {
            values.push(value.clone());
            format!("({col} IS NULL OR {col} != ?)", col = field.column())
        }
        Clause::Present(field) => format!("{} IS NOT NULL", field.column()),
        Clause::Matches(field, pattern) => {
            values.push(pattern.to_like());
            format!("{} LIKE ? ESCAPE '\\'", field.column())
        }
        Clause::AnyOf(clauses) if clauses.is_empty() => "0".to_string(),
        Clause::AnyOf(clauses) => {
            let parts: Vec<String> = clauses.iter().map(|c| clause_sql(c, values)).collect();
            format!("({})", parts.join(" OR "))
        }
    }
}

fn filter_sql(filter: &DocumentFilter) -> (String, Vec<String>) {
    let mut values = Vec::new();
    if filter.clauses().is_empty() {
        return ("1".to_string(), values);
    }
    let parts: Vec<String> = filter
        .clauses()
        .iter()
        .map(|c| clause_sql(c, &mut values))
        .collect();
    (parts.join(" AND "), values)
}

fn timestamp(dt: &chrono::DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn column_value(record: &DocumentRecord, field: DocumentField) -> Option<String> {
    field.value_of(record)
}

impl DocumentStore for SqliteStore {
    fn insert(&self, doc: NewDocument) -> StoreResult<DocumentId> {
        let id = DocumentId::new();
        let record = DocumentRecord::from_new(id, doc);
        let body = serde_json::to_string(&record)?;

        let conn = self.conn.lock()?;
        conn.execute(
            "INSERT INTO documents
             (id, user_id, file_hash, aadhaar, pan, dl, device_hash, created_at, body)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                id.to_string(),
                record.user_id,
                record.file_hash,
                column_value(&record, DocumentField::Aadhaar),
                column_value(&record, DocumentField::Pan),
                column_value(&record, DocumentField::DrivingLicence),
                column_value(&record, DocumentField::DeviceHash),
                timestamp(&record.created_at),
                body,
            ],
        )?;
        Ok(id)
    }

    fn get(&self, id: DocumentId) -> StoreResult<Option<DocumentRecord>> {
        let conn = self.conn.lock()?;
        let body: Option<String> = conn
            .query_row(
                "SELECT body FROM documents WHERE id = ?1",
                params![id.to_string()],
                |row| row.get(0),
            )
            .optional()?;
        body.map(|b| serde_json::from_str(&b).map_err(StoreError::from))
            .transpose()
    }

    fn find_many(&self, filter: &DocumentFilter, limit: usize) -> StoreResult<Vec<DocumentRecord>> {
        let (condition, values) = filter_sql(filter);
        let sql = format!(
            "SELECT body FROM documents WHERE {} ORDER BY rowid LIMIT {}",
            condition,
            i64::try_from(limit).unwrap_or(i64::MAX)
        );

        let conn = self.conn.lock()?;
        let mut stmt = conn.prepare(&sql)?;
        let bodies: Vec<String> = stmt
            .query_map(params_from_iter(values.iter()), |row| row.get(0))?
            .collect::<Result<Vec<_>, _>>()?;

        bodies
            .iter()
            .map(|b| serde_json::from_str(b).map_err(StoreError::from))
            .collect()
    }

    fn attach_fraud(
        &self,
        id: DocumentId,
        file_hash: &str,
        fraud: &FraudAnalysisResult,
    ) -> StoreResult<()> {
        let mut record = self
            .get(id)?
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        record.file_hash = Some(file_hash.to_string());
        record.fraud = Some(fraud.clone());
        let body = serde_json::to_string(&record)?;

        let conn = self.conn.lock()?;
        let rows = conn.execute(
            "UPDATE documents SET file_hash = ?1, body = ?2 WHERE id = ?3",
            params![file_hash, body, id.to_string()],
        )?;
        if rows == 0 {
            return Err(StoreError::NotFound(id.to_string()));
        }
        Ok(())
    }
}

impl SqliteStore {
    fn load_alert(conn: &Connection, id: AlertId) -> StoreResult<Option<Alert>> {
        let body: Option<String> = conn
            .query_row(
                "SELECT body FROM alerts WHERE id = ?1",
                params![id.to_string()],
                |row| row.get(0),
            )
            .optional()?;
        body.map(|b| serde_json::from_str(&b).map_err(StoreError::from))
            .transpose()
    }
}

impl AlertStore for SqliteStore {
    fn insert_alert(&self, alert: NewAlert) -> StoreResult<Alert> {
        let alert = Alert::from_new(AlertId::new(), alert, Utc::now());
        let body = serde_json::to_string(&alert)?;

        let conn = self.conn.lock()?;
        conn.execute(
            "INSERT INTO alerts (id, document_id, seen, timestamp, body)
             VALUES (?1, ?2, 0, ?3, ?4)",
            params![
                alert.id.to_string(),
                alert.document_id.to_string(),
                timestamp(&alert.timestamp),
                body,
            ],
        )?;
        Ok(alert)
    }

    fn get_alert(&self, id: AlertId) -> StoreResult<Option<Alert>> {
        let conn = self.conn.lock()?;
        Self::load_alert(&conn, id)
    }

    fn list_alerts(&self, filter: AlertFilter) -> StoreResult<Vec<Alert>> {
        let sql = match filter {
            AlertFilter::Unseen => {
                "SELECT body FROM alerts WHERE seen = 0 ORDER BY timestamp DESC, rowid DESC"
            }
            AlertFilter::All => "SELECT body FROM alerts ORDER BY timestamp DESC, rowid DESC",
        };

        let conn = self.conn.lock()?;
        let mut stmt = conn.prepare(sql)?;
        let bodies: Vec<String> = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<_>, _>>()?;

        bodies
            .iter()
            .map(|b| serde_json::from_str(b).map_err(StoreError::from))
            .collect()
    }

    fn mark_seen(&self, id: AlertId) -> StoreResult<bool> {
        let conn = self.conn.lock()?;
        let mut alert =
            Self::load_alert(&conn, id)?.ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        if !alert.dismiss() {
            return Ok(false);
        }

        let body = serde_json::to_string(&alert)?;
        conn.execute(
            "UPDATE alerts SET seen = 1, body = ?1 WHERE id = ?2",
            params![body, id.to_string()],
        )?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::WildcardPattern;
    use kycguard_core::{DeviceFingerprint, DocumentType, ParsedDocument, RiskBand, SignalDetails};
    use tempfile::tempdir;

    fn new_doc(user: &str, parsed: ParsedDocument) -> NewDocument {
        NewDocument {
            user_id: user.into(),
            user_email: format!("{}@example.in", user),
            filename: "doc.jpg".into(),
            document_type: parsed.effective_type(),
            parsed,
            raw_text: None,
            device: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_filter_sql() {
        let filter = DocumentFilter::new()
            .ne(DocumentField::UserId, "u1")
            .any_of(vec![
                Clause::Eq(DocumentField::Aadhaar, "499118665243".into()),
                Clause::Matches(DocumentField::Pan, WildcardPattern::new("ABCDE****F").unwrap()),
            ]);
        let (sql, values) = filter_sql(&filter);
        assert_eq!(
            sql,
            "(user_id IS NULL OR user_id != ?) AND (aadhaar = ? OR pan LIKE ? ESCAPE '\\')"
        );
        assert_eq!(values, vec!["u1", "499118665243", "ABCDE____F"]);

        assert_eq!(filter_sql(&DocumentFilter::new()).0, "1");
        assert_eq!(filter_sql(&DocumentFilter::new().any_of(vec![])).0, "0");
    }

    #[test]
    fn test_masked_pan_lookup_is_case_insensitive() {
        let store = SqliteStore::in_memory().unwrap();
        store
            .insert(new_doc("u1", ParsedDocument::default().with_pan("ABCDE1234F")))
            .unwrap();
        store
            .insert(new_doc("u2", ParsedDocument::default().with_pan("ZZZZZ1234F")))
            .unwrap();

        let filter = DocumentFilter::new()
            .matches(DocumentField::Pan, WildcardPattern::new("abcde****f").unwrap());
        let found = store.find_many(&filter, 10).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].user_id, "u1");
    }

    #[test]
    fn test_device_and_fraud_columns() {
        let store = SqliteStore::in_memory().unwrap();
        let mut doc = new_doc("u1", ParsedDocument::default().with_aadhaar("4991 1866 5243"));
        doc.device = Some(DeviceFingerprint::new("dev-1"));
        let id = store.insert(doc).unwrap();

        let on_device = store
            .find_many(&DocumentFilter::new().eq(DocumentField::DeviceHash, "dev-1"), 100)
            .unwrap();
        assert_eq!(on_device.len(), 1);

        assert!(store
            .find_one(&DocumentFilter::new().present(DocumentField::FileHash))
            .unwrap()
            .is_none());

        let fraud = FraudAnalysisResult::from_total(45, vec!["x".into()], SignalDetails::new(), "t");
        store.attach_fraud(id, "h1", &fraud).unwrap();

        let rec = store
            .find_one(&DocumentFilter::new().eq(DocumentField::FileHash, "h1"))
            .unwrap()
            .unwrap();
        assert_eq!(rec.id, id);
        assert_eq!(rec.aadhaar(), Some("499118665243"));
        assert_eq!(rec.fraud.unwrap().score(), 45);
    }

    #[test]
    fn test_alerts_persist_across_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("kyc.db");

        let alert_id = {
            let store = SqliteStore::open(&path).unwrap();
            let alert = store
                .insert_alert(NewAlert {
                    document_id: DocumentId::new(),
                    aadhaar: Some("499118665243".into()),
                    pan: None,
                    dl: None,
                    user_email: "u1@example.in".into(),
                    risk_level: RiskBand::Medium,
                    reason: "Aadhaar in AML blacklist: test".into(),
                })
                .unwrap();
            assert!(store.mark_seen(alert.id).unwrap());
            alert.id
        };

        let store = SqliteStore::open(&path).unwrap();
        assert!(store.list_alerts(AlertFilter::Unseen).unwrap().is_empty());
        let all = store.list_alerts(AlertFilter::All).unwrap();
        assert_eq!(all.len(), 1);
        assert!(all[0].seen);
        assert!(!store.mark_seen(alert_id).unwrap());
        assert!(matches!(
            store.mark_seen(AlertId::new()),
            Err(StoreError::NotFound(_))
        ));
    }
}
