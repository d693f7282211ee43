pub mod memory;
pub mod postgres;

pub use memory::MemoryProblemStore;
pub use postgres::PgProblemStore;

use async_trait::async_trait;
use problem_vault_libs::api::{NewProblem, ProblemListParameter, ProblemRecord, ProblemStats};
use std::sync::Arc;
use thiserror::Error;
use unicode_normalization::UnicodeNormalization;

/// Number of tags reported by [`ProblemStore::stats`].
pub const TOP_TAG_COUNT: usize = 10;

pub type Result<T> = std::result::Result<T, StoreError>;

pub type SharedStore = Arc<dyn ProblemStore>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("migration failed: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
}

/// One page of a listing plus the number of records matching the filters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Listing {
    pub problems: Vec<ProblemRecord>,
    pub total: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Upserted {
    Created(ProblemRecord),
    Updated(ProblemRecord),
}

impl Upserted {
    pub fn is_created(&self) -> bool {
        matches!(self, Upserted::Created(_))
    }

    pub fn into_record(self) -> ProblemRecord {
        match self {
            Upserted::Created(record) | Upserted::Updated(record) => record,
        }
    }
}

/// Persistent collection of problem records, one per normalized URL.
#[async_trait]
pub trait ProblemStore: Send + Sync {
    /// Records matching every given filter. Ordered by relevance when searching,
    /// otherwise by creation time; both fall back to newest first, then id.
    async fn list(&self, params: &ProblemListParameter) -> Result<Listing>;

    async fn get(&self, id: i64) -> Result<Option<ProblemRecord>>;

    /// Creates the record for `problem.url` or overwrites every field of the existing one.
    /// Both timestamps are reset.
    async fn upsert(&self, problem: NewProblem) -> Result<Upserted>;

    async fn count(&self) -> Result<u64>;

    async fn stats(&self) -> Result<ProblemStats>;
}

/// Splits a search string into lowercase NFKC-normalized words.
pub fn search_terms(search: &str) -> Vec<String> {
    let normalized = search.nfkc().collect::<String>().to_lowercase();
    let mut terms: Vec<String> = Vec::new();
    for term in normalized
        .split(|c: char| !c.is_alphanumeric())
        .filter(|term| !term.is_empty())
    {
        if !terms.iter().any(|seen| seen == term) {
            terms.push(term.to_string());
        }
    }
    terms
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn search_terms_are_words() {
        assert_eq!(search_terms("Two  Sum!"), vec!["two", "sum"]);
        assert_eq!(search_terms("two-sum two"), vec!["two", "sum"]);
        assert!(search_terms(" -- ").is_empty());
    }

    #[test]
    fn search_terms_fold_compatibility_forms() {
        assert_eq!(search_terms("ＴＷＯ　Ｓｕｍ"), vec!["two", "sum"]);
    }
}
