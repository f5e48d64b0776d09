//! MongoDB adapter (sync API). Reads run aggregation pipelines with the
//! cursor fully drained inside the timed window; each write batch gets its
//! own client so no session is shared across workers.

use crate::backend::{
    Backend, Operation, OperationKind, QueryPayload, ReadOutcome, NATURAL_KEY_INDEX,
};
use crate::config::DocumentConfig;
use crate::dataset::{MemberRecord, NameUpdate};
use crate::error::{BenchError, Result};
use mongodb::bson::{doc, Document};
use mongodb::options::IndexOptions;
use mongodb::sync::{Client, Collection};
use mongodb::IndexModel;
use std::time::Instant;

pub struct DocumentBackend {
    config: DocumentConfig,
}

impl DocumentBackend {
    /// Connects once to validate the URI (fatal on failure) and ensures the
    /// natural-key index. `create_index` is idempotent server-side; failures
    /// are logged, not fatal.
    pub fn connect(config: &DocumentConfig) -> Result<Self> {
        let backend = Self {
            config: config.clone(),
        };
        let collection = backend.acquire()?;
        if let Err(e) = ensure_index(&collection) {
            tracing::warn!(error = %e, "document index bootstrap failed; continuing");
        }
        Ok(backend)
    }

    fn acquire(&self) -> Result<Collection<Document>> {
        let client = Client::with_uri_str(&self.config.uri)?;
        Ok(client
            .database(&self.config.database)
            .collection(&self.config.collection))
    }
}

fn ensure_index(collection: &Collection<Document>) -> Result<()> {
    let options = IndexOptions::builder()
        .name(NATURAL_KEY_INDEX.to_string())
        .build();
    let model = IndexModel::builder()
        .keys(doc! { "external_id": 1 })
        .options(options)
        .build();
    collection.create_index(model).run()?;
    Ok(())
}

impl Backend for DocumentBackend {
    fn name(&self) -> &'static str {
        "document"
    }

    fn execute_read(&self, operation: &Operation) -> Result<ReadOutcome> {
        if operation.kind != OperationKind::Read {
            return Err(BenchError::UnsupportedOperation {
                backend: self.name(),
                detail: "execute_read requires a read operation".to_string(),
            });
        }
        let pipeline = match &operation.payload {
            QueryPayload::Pipeline(pipeline) => pipeline.clone(),
            QueryPayload::Sql(_) => {
                return Err(BenchError::UnsupportedOperation {
                    backend: self.name(),
                    detail: "SQL text needs the relational backend".to_string(),
                })
            }
        };

        let collection = self.acquire()?;
        let start = Instant::now();
        let cursor = collection.aggregate(pipeline).run()?;
        let mut rows = 0usize;
        for document in cursor {
            document?;
            rows += 1;
        }
        let elapsed_secs = start.elapsed().as_secs_f64();
        Ok(ReadOutcome { rows, elapsed_secs })
    }

    fn execute_insert_batch(&self, records: &[MemberRecord]) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }
        let collection = self.acquire()?;
        let docs: Vec<Document> = records
            .iter()
            .map(|r| {
                doc! {
                    "external_id": r.external_id.as_str(),
                    "full_name": r.full_name.as_str(),
                    "birth_date": r.birth_date.format("%Y-%m-%d").to_string(),
                    "gender": r.gender.as_str(),
                }
            })
            .collect();
        collection.insert_many(docs).run()?;
        Ok(())
    }

    fn execute_update_batch(&self, updates: &[NameUpdate]) -> Result<()> {
        let collection = self.acquire()?;
        for update in updates {
            collection
                .update_one(
                    doc! { "external_id": update.external_id.as_str() },
                    doc! { "$set": { "full_name": update.full_name.as_str() } },
                )
                .run()?;
        }
        Ok(())
    }
}
