//! KycGuard Store - Record store and blacklist collaborators
//!
//! - [`DocumentStore`] / [`AlertStore`]: insert, find by predicate, update by id
//! - [`MemoryStore`]: vector-backed, for tests
//! - [`SqliteStore`]: `rusqlite` with denormalized lookup columns
//! - [`BlacklistRegistry`]: JSON registry file behind the [`Blacklist`] trait

pub mod blacklist;
pub mod error;
pub mod filter;
pub mod memory;
pub mod sqlite;
pub mod traits;

pub use blacklist::{Blacklist, BlacklistHit, BlacklistRegistry, IdKind};
pub use error::{StoreError, StoreResult};
pub use filter::{Clause, DocumentField, DocumentFilter, WildcardPattern};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use traits::{AlertFilter, AlertStore, DocumentStore};
