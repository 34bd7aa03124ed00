//! AML blacklist registry
//!
//! Registry file format:
//!
//! ```json
//! { "aadhaar": { "499118665243": "reason" }, "pan": {}, "dl": {} }
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::StoreResult;

/// Identifier kinds that can be blacklisted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdKind {
    Aadhaar,
    Pan,
    Dl,
}

impl IdKind {
    pub fn label(&self) -> &'static str {
        match self {
            IdKind::Aadhaar => "Aadhaar",
            IdKind::Pan => "PAN",
            IdKind::Dl => "DL",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlacklistHit {
    pub kind: IdKind,
    pub value: String,
    pub reason: Option<String>,
}

/// Blacklist collaborator: exact lookup by identifier
pub trait Blacklist: Send + Sync {
    fn lookup(&self, kind: IdKind, value: &str) -> StoreResult<Option<BlacklistHit>>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
struct RegistryData {
    #[serde(default)]
    aadhaar: BTreeMap<String, String>,
    #[serde(default)]
    pan: BTreeMap<String, String>,
    #[serde(default)]
    dl: BTreeMap<String, String>,
}

impl RegistryData {
    fn entries(&self, kind: IdKind) -> &BTreeMap<String, String> {
        match kind {
            IdKind::Aadhaar => &self.aadhaar,
            IdKind::Pan => &self.pan,
            IdKind::Dl => &self.dl,
        }
    }

    fn entries_mut(&mut self, kind: IdKind) -> &mut BTreeMap<String, String> {
        match kind {
            IdKind::Aadhaar => &mut self.aadhaar,
            IdKind::Pan => &mut self.pan,
            IdKind::Dl => &mut self.dl,
        }
    }
}

/// JSON-file-backed blacklist
pub struct BlacklistRegistry {
    path: Option<PathBuf>,
    data: RwLock<RegistryData>,
}

impl BlacklistRegistry {
    /// Empty registry that is never persisted
    pub fn in_memory() -> Self {
        Self {
            path: None,
            data: RwLock::new(RegistryData::default()),
        }
    }

    /// Load the registry file; a missing file yields an empty registry
    pub fn load(path: impl AsRef<Path>) -> StoreResult<Self> {
        let path = path.as_ref().to_path_buf();
        let data = if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            let data: RegistryData = serde_json::from_str(&content)?;
            debug!(
                path = %path.display(),
                aadhaar = data.aadhaar.len(),
                pan = data.pan.len(),
                dl = data.dl.len(),
                "Loaded blacklist registry"
            );
            data
        } else {
            warn!(path = %path.display(), "Blacklist registry not found, starting empty");
            RegistryData::default()
        };

        Ok(Self {
            path: Some(path),
            data: RwLock::new(data),
        })
    }

    /// Add (or replace) an entry and persist if file-backed
    pub fn add(&self, kind: IdKind, value: &str, reason: &str) -> StoreResult<()> {
        {
            let mut data = self.data.write()?;
            data.entries_mut(kind)
                .insert(normalize(kind, value), reason.to_string());
        }
        self.save()
    }

    /// Write the registry back to its file (no-op in memory)
    pub fn save(&self) -> StoreResult<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(&*self.data.read()?)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn len(&self) -> StoreResult<usize> {
        let data = self.data.read()?;
        Ok(data.aadhaar.len() + data.pan.len() + data.dl.len())
    }

    pub fn is_empty(&self) -> StoreResult<bool> {
        Ok(self.len()? == 0)
    }
}

/// Registry keys use the same normalization as parsed documents
fn normalize(kind: IdKind, value: &str) -> String {
    let cleaned = value
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .collect::<String>()
        .to_uppercase();
    match kind {
        IdKind::Pan => cleaned
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || *c == '*')
            .collect(),
        IdKind::Aadhaar | IdKind::Dl => cleaned,
    }
}

impl Blacklist for BlacklistRegistry {
    fn lookup(&self, kind: IdKind, value: &str) -> StoreResult<Option<BlacklistHit>> {
        let key = normalize(kind, value);
        let data = self.data.read()?;
        Ok(data.entries(kind).get(&key).map(|reason| BlacklistHit {
            kind,
            value: key.clone(),
            reason: (!reason.is_empty()).then(|| reason.clone()),
        }))
    }
}
