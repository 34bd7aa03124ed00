//! Document query predicates
//!
//! A [`DocumentFilter`] is a conjunction of [`Clause`]s. The in-memory store
//! evaluates it directly; the SQLite store translates it to a `WHERE` clause.

use regex::Regex;

use kycguard_core::DocumentRecord;

use crate::error::{StoreError, StoreResult};

/// Queryable document fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentField {
    Id,
    UserId,
    FileHash,
    Aadhaar,
    /// Normalized PAN
    Pan,
    DrivingLicence,
    DeviceHash,
}

impl DocumentField {
    /// Column of the denormalized lookup table
    pub fn column(&self) -> &'static str {
        match self {
            DocumentField::Id => "id",
            DocumentField::UserId => "user_id",
            DocumentField::FileHash => "file_hash",
            DocumentField::Aadhaar => "aadhaar",
            DocumentField::Pan => "pan",
            DocumentField::DrivingLicence => "dl",
            DocumentField::DeviceHash => "device_hash",
        }
    }

    pub fn value_of(&self, record: &DocumentRecord) -> Option<String> {
        match self {
            DocumentField::Id => Some(record.id.to_string()),
            DocumentField::UserId => Some(record.user_id.clone()),
            DocumentField::FileHash => record.file_hash.clone(),
            DocumentField::Aadhaar => record.aadhaar().map(str::to_string),
            DocumentField::Pan => record.pan().map(str::to_string),
            DocumentField::DrivingLicence => record.dl().map(str::to_string),
            DocumentField::DeviceHash => record.device_hash().map(str::to_string),
        }
    }
}

/// Masked identifier where `*` matches any single character
///
/// Matching is anchored and case-insensitive.
#[derive(Debug, Clone)]
pub struct WildcardPattern {
    masked: String,
    regex: Regex,
}

impl WildcardPattern {
    pub fn new(masked: &str) -> StoreResult<Self> {
        let body = regex::escape(masked).replace(r"\*", ".");
        let regex = Regex::new(&format!("(?i)^{}$", body))
            .map_err(|e| StoreError::InvalidPattern(e.to_string()))?;
        Ok(Self {
            masked: masked.to_string(),
            regex,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.masked
    }

    pub fn is_match(&self, value: &str) -> bool {
        self.regex.is_match(value)
    }

    /// Equivalent SQL `LIKE` pattern, using `\` as the escape character
    pub fn to_like(&self) -> String {
        let mut like = String::with_capacity(self.masked.len());
        for c in self.masked.chars() {
            match c {
                '*' => like.push('_'),
                '%' | '_' | '\\' => {
                    like.push('\\');
                    like.push(c);
                }
                _ => like.push(c),
            }
        }
        like
    }
}

impl PartialEq for WildcardPattern {
    fn eq(&self, other: &Self) -> bool {
        self.masked == other.masked
    }
}

/// One predicate over a document field
#[derive(Debug, Clone, PartialEq)]
pub enum Clause {
    Eq(DocumentField, String),
    /// Absent values count as "not equal"
    Ne(DocumentField, String),
    Present(DocumentField),
    Matches(DocumentField, WildcardPattern),
    /// Disjunction; an empty list matches nothing
    AnyOf(Vec<Clause>),
}

impl Clause {
    pub fn matches(&self, record: &DocumentRecord) -> bool {
        match self {
            Clause::Eq(field, value) => field.value_of(record).as_deref() == Some(value.as_str()),
            Clause::Ne(field, value) => field.value_of(record).as_deref() != Some(value.as_str()),
            Clause::Present(field) => field.value_of(record).is_some(),
            Clause::Matches(field, pattern) => field
                .value_of(record)
                .map_or(false, |v| pattern.is_match(&v)),
            Clause::AnyOf(clauses) => clauses.iter().any(|c| c.matches(record)),
        }
    }
}

/// Conjunction of clauses
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentFilter {
    clauses: Vec<Clause>,
}

impl DocumentFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, field: DocumentField, value: impl Into<String>) -> Self {
        self.clauses.push(Clause::Eq(field, value.into()));
        self
    }

    pub fn ne(mut self, field: DocumentField, value: impl Into<String>) -> Self {
        self.clauses.push(Clause::Ne(field, value.into()));
        self
    }

    pub fn present(mut self, field: DocumentField) -> Self {
        self.clauses.push(Clause::Present(field));
        self
    }

    pub fn matches(mut self, field: DocumentField, pattern: WildcardPattern) -> Self {
        self.clauses.push(Clause::Matches(field, pattern));
        self
    }

    pub fn any_of(mut self, clauses: Vec<Clause>) -> Self {
        self.clauses.push(Clause::AnyOf(clauses));
        self
    }

    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    /// True when every clause holds (an empty filter matches everything)
    pub fn matches_record(&self, record: &DocumentRecord) -> bool {
        self.clauses.iter().all(|c| c.matches(record))
    }
}
