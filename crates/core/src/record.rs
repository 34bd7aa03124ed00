//! Stored view of one upload

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::document::{DocumentType, ParsedDocument};
use crate::fraud::FraudAnalysisResult;
use crate::identity::DeviceFingerprint;

/// Store-generated document id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(Uuid);

impl DocumentId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for DocumentId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for DocumentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for DocumentId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Document record before the store assigns an id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDocument {
    pub user_id: String,
    pub user_email: String,
    pub filename: String,
    pub document_type: DocumentType,
    pub parsed: ParsedDocument,
    #[serde(default)]
    pub raw_text: Option<String>,
    #[serde(default)]
    pub device: Option<DeviceFingerprint>,
    pub created_at: DateTime<Utc>,
}

/// Stored document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentRecord {
    pub id: DocumentId,
    pub user_id: String,
    pub user_email: String,
    pub filename: String,
    pub document_type: DocumentType,
    pub parsed: ParsedDocument,
    #[serde(default)]
    pub raw_text: Option<String>,
    #[serde(default)]
    pub device: Option<DeviceFingerprint>,
    /// Set together with `fraud` once analysis has run
    #[serde(default)]
    pub file_hash: Option<String>,
    #[serde(default)]
    pub fraud: Option<FraudAnalysisResult>,
    pub created_at: DateTime<Utc>,
}

impl DocumentRecord {
    pub fn from_new(id: DocumentId, doc: NewDocument) -> Self {
        Self {
            id,
            user_id: doc.user_id,
            user_email: doc.user_email,
            filename: doc.filename,
            document_type: doc.document_type,
            parsed: doc.parsed,
            raw_text: doc.raw_text,
            device: doc.device,
            file_hash: None,
            fraud: None,
            created_at: doc.created_at,
        }
    }

    pub fn aadhaar(&self) -> Option<&str> {
        self.parsed.aadhaar_number.as_deref()
    }

    /// Normalized PAN
    pub fn pan(&self) -> Option<&str> {
        self.parsed.pan_normalized()
    }

    pub fn dl(&self) -> Option<&str> {
        self.parsed.dl_number.as_deref()
    }

    pub fn device_hash(&self) -> Option<&str> {
        self.device.as_ref().map(|d| d.hash.as_str())
    }

    pub fn name(&self) -> Option<&str> {
        self.parsed.name.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_id_roundtrip_string() {
        let id = DocumentId::new();
        let parsed: DocumentId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
        assert!("not-a-uuid".parse::<DocumentId>().is_err());
    }

    #[test]
    fn test_record_accessors() {
        let new = NewDocument {
            user_id: "u1".into(),
            user_email: "u1@example.in".into(),
            filename: "pan.jpg".into(),
            document_type: DocumentType::Pan,
            parsed: ParsedDocument::default().with_pan("abcde 1234 f").with_name("Y Teja"),
            raw_text: None,
            device: Some(DeviceFingerprint::new("dev-9")),
            created_at: Utc::now(),
        };
        let record = DocumentRecord::from_new(DocumentId::new(), new);

        assert_eq!(record.pan(), Some("ABCDE1234F"));
        assert_eq!(record.device_hash(), Some("dev-9"));
        assert_eq!(record.name(), Some("Y Teja"));
        assert!(record.aadhaar().is_none());
        assert!(record.fraud.is_none());
    }
}
