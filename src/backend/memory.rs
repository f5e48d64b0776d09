//! In-memory fake backend for the test suite and `--dry-run` smoke runs.

use crate::backend::{Backend, Operation, OperationKind, ReadOutcome};
use crate::dataset::{MemberRecord, NameUpdate};
use crate::error::{BenchError, Result};
use std::collections::HashMap;
use std::io;
use std::sync::Mutex;
use std::time::Instant;

#[derive(Default)]
pub struct MemoryBackend {
    store: Mutex<HashMap<String, MemberRecord>>,
    fail_reads: bool,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Preloaded store, for read scenarios.
    pub fn with_records(records: Vec<MemberRecord>) -> Self {
        let store = records
            .into_iter()
            .map(|r| (r.external_id.clone(), r))
            .collect();
        Self {
            store: Mutex::new(store),
            fail_reads: false,
        }
    }

    /// Every read fails, for abort-path scenarios.
    pub fn failing_reads() -> Self {
        Self {
            fail_reads: true,
            ..Self::default()
        }
    }

    pub fn len(&self) -> usize {
        self.store.lock().expect("store lock").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, external_id: &str) -> bool {
        self.store
            .lock()
            .expect("store lock")
            .contains_key(external_id)
    }

    pub fn full_name_of(&self, external_id: &str) -> Option<String> {
        self.store
            .lock()
            .expect("store lock")
            .get(external_id)
            .map(|r| r.full_name.clone())
    }
}

impl Backend for MemoryBackend {
    fn name(&self) -> &'static str {
        "memory"
    }

    /// The payload is ignored; a read is a full scan of the store.
    fn execute_read(&self, operation: &Operation) -> Result<ReadOutcome> {
        if operation.kind != OperationKind::Read {
            return Err(BenchError::UnsupportedOperation {
                backend: self.name(),
                detail: "execute_read requires a read operation".to_string(),
            });
        }
        if self.fail_reads {
            return Err(BenchError::Io(io::Error::other("injected read failure")));
        }

        let start = Instant::now();
        let materialized: Vec<MemberRecord> = {
            let store = self.store.lock().expect("store lock");
            store.values().cloned().collect()
        };
        Ok(ReadOutcome {
            rows: materialized.len(),
            elapsed_secs: start.elapsed().as_secs_f64(),
        })
    }

    fn execute_insert_batch(&self, records: &[MemberRecord]) -> Result<()> {
        let mut store = self.store.lock().expect("store lock");
        for record in records {
            store.insert(record.external_id.clone(), record.clone());
        }
        Ok(())
    }

    fn execute_update_batch(&self, updates: &[NameUpdate]) -> Result<()> {
        let mut store = self.store.lock().expect("store lock");
        for update in updates {
            if let Some(record) = store.get_mut(&update.external_id) {
                record.full_name = update.full_name.clone();
            }
        }
        Ok(())
    }
}
