//! The capability contract the orchestrator runs against. Two live adapters
//! (MySQL, MongoDB) plus an in-memory fake implement the same narrow trait;
//! everything backend-specific stays inside the adapter.

use crate::dataset::{MemberRecord, NameUpdate};
use crate::error::Result;
use mongodb::bson::Document;

pub mod document;
pub mod memory;
pub mod relational;

pub use document::DocumentBackend;
pub use memory::MemoryBackend;
pub use relational::RelationalBackend;

/// Table / collection holding the registry members.
pub const MEMBER_TABLE: &str = "household_member";
/// Secondary index on the natural key, ensured at adapter construction.
pub const NATURAL_KEY_INDEX: &str = "idx_member_external_id";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OperationKind {
    Read,
    Insert,
    Update,
}

/// Backend-specific query payload. An adapter handed the wrong variant fails
/// with `UnsupportedOperation` rather than guessing.
#[derive(Clone, Debug)]
pub enum QueryPayload {
    /// SQL text for the relational adapter.
    Sql(String),
    /// Aggregation pipeline for the document adapter.
    Pipeline(Vec<Document>),
}

#[derive(Clone, Debug)]
pub struct Operation {
    pub kind: OperationKind,
    pub payload: QueryPayload,
}

impl Operation {
    pub fn read_sql(sql: impl Into<String>) -> Self {
        Self {
            kind: OperationKind::Read,
            payload: QueryPayload::Sql(sql.into()),
        }
    }

    pub fn read_pipeline(pipeline: Vec<Document>) -> Self {
        Self {
            kind: OperationKind::Read,
            payload: QueryPayload::Pipeline(pipeline),
        }
    }
}

/// Outcome of a timed read: the clock covers execution plus full result
/// materialization, never lazy iteration.
#[derive(Clone, Copy, Debug)]
pub struct ReadOutcome {
    pub rows: usize,
    pub elapsed_secs: f64,
}

/// Delegation so shared handles (e.g. `Arc<MemoryBackend>` in tests) can be
/// boxed into the harness while the caller keeps a handle for inspection.
impl<B: Backend + ?Sized> Backend for std::sync::Arc<B> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn execute_read(&self, operation: &Operation) -> Result<ReadOutcome> {
        (**self).execute_read(operation)
    }

    fn execute_insert_batch(&self, records: &[MemberRecord]) -> Result<()> {
        (**self).execute_insert_batch(records)
    }

    fn execute_update_batch(&self, updates: &[NameUpdate]) -> Result<()> {
        (**self).execute_update_batch(updates)
    }
}

pub trait Backend: Send + Sync {
    fn name(&self) -> &'static str;

    /// Execute a read operation and materialize the full result set before
    /// stopping the timer. Connection acquisition is excluded from timing.
    fn execute_read(&self, operation: &Operation) -> Result<ReadOutcome>;

    /// Insert all records under a freshly acquired connection owned by the
    /// calling worker, committing before returning.
    fn execute_insert_batch(&self, records: &[MemberRecord]) -> Result<()>;

    /// Apply one name update per entry, same connection-per-worker
    /// discipline, one commit for the whole batch.
    fn execute_update_batch(&self, updates: &[NameUpdate]) -> Result<()>;
}
