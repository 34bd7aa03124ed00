//! Application context - wires everything together

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use kycguard_compliance::{AuditLedger, ComplianceConfig, KycPipeline};
use kycguard_store::{BlacklistRegistry, SqliteStore};

/// Application context over one data directory
///
/// ```text
/// <data>/kyc.db          documents + alerts (SQLite)
/// <data>/audit.jsonl     audit ledger
/// <data>/blacklist.json  AML registry
/// ```
pub struct AppContext {
    pub pipeline: KycPipeline,
    pub registry: Arc<BlacklistRegistry>,
    pub store: Arc<SqliteStore>,
    data_path: PathBuf,
}

impl AppContext {
    /// Open (or create) the data directory
    pub fn new(data_path: impl AsRef<Path>, config_path: Option<&Path>) -> Result<Self, anyhow::Error> {
        let data_path = data_path.as_ref().to_path_buf();
        std::fs::create_dir_all(&data_path)?;

        let config = match config_path {
            Some(path) => ComplianceConfig::from_file(path)?,
            None => ComplianceConfig::default(),
        };

        let store = Arc::new(SqliteStore::open(config.database_path(&data_path))?);
        let registry = Arc::new(BlacklistRegistry::load(config.registry_path(&data_path))?);
        let ledger = Arc::new(AuditLedger::new(config.audit_path(&data_path))?);
        debug!(data = %data_path.display(), "Data directory opened");

        let pipeline = KycPipeline::builder()
            .with_config(config)
            .with_records(store.clone())
            .with_blacklist(registry.clone())
            .with_ledger(ledger)
            .build()?;

        Ok(Self {
            pipeline,
            registry,
            store,
            data_path,
        })
    }

    pub fn data_path(&self) -> &Path {
        &self.data_path
    }

    pub fn ledger(&self) -> &Arc<AuditLedger> {
        self.pipeline.ledger()
    }
}
