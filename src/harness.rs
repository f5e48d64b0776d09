//! Benchmark orchestrator: owns the registered workload pairs, drives
//! sequential query timing and concurrent insert/update timing across both
//! backends, and accumulates the comparable results.
//!
//! The two backends never run concurrently with each other: within a query
//! pair the reads run back to back, and in a concurrent phase the relational
//! pool drains completely before the document pool starts, so neither side's
//! timing is skewed by cross-backend contention.

use crate::backend::{Backend, Operation};
use crate::dataset::{BatchGenerator, MemberRecord, NameUpdate};
use crate::error::{BenchError, Result};
use crate::partition;
use crate::schema::MeasurementResult;
use rayon::prelude::*;
use std::time::Instant;

/// One logical operation with a definition translatable to both backends.
pub struct Workload {
    pub label: String,
    pub relational: Operation,
    pub document: Operation,
}

impl Workload {
    pub fn new(label: impl Into<String>, relational: Operation, document: Operation) -> Self {
        Self {
            label: label.into(),
            relational,
            document,
        }
    }
}

pub struct Harness {
    relational: Box<dyn Backend>,
    document: Box<dyn Backend>,
    workloads: Vec<Workload>,
    results: Vec<MeasurementResult>,
    // Keys known to exist per backend. The batches are generated
    // independently, so the two sets intentionally differ: updates against a
    // backend must only ever use keys inserted into that backend.
    relational_keys: Vec<String>,
    document_keys: Vec<String>,
    generator: BatchGenerator,
}

impl Harness {
    pub fn new(relational: Box<dyn Backend>, document: Box<dyn Backend>, seed: u64) -> Self {
        Self {
            relational,
            document,
            workloads: Vec::new(),
            results: Vec::new(),
            relational_keys: Vec::new(),
            document_keys: Vec::new(),
            generator: BatchGenerator::new(seed),
        }
    }

    /// Registration order is execution order.
    pub fn register(&mut self, workload: Workload) {
        self.workloads.push(workload);
    }

    pub fn results(&self) -> &[MeasurementResult] {
        &self.results
    }

    pub fn relational_keys(&self) -> &[String] {
        &self.relational_keys
    }

    pub fn document_keys(&self) -> &[String] {
        &self.document_keys
    }

    /// Resets the result list. Reference keys survive so later update rounds
    /// can still target inserted records; use [`clear_keys`](Self::clear_keys)
    /// to drop those too.
    pub fn clear(&mut self) {
        self.results.clear();
    }

    pub fn clear_keys(&mut self) {
        self.relational_keys.clear();
        self.document_keys.clear();
    }

    /// Execute every registered workload in order, relational read then
    /// document read, one result per workload. The first failure aborts the
    /// run and leaves no result for the failed workload.
    pub fn run_sequential(&mut self) -> Result<()> {
        for workload in &self.workloads {
            let relational = self
                .relational
                .execute_read(&workload.relational)
                .map_err(|e| {
                    BenchError::for_workload(&workload.label, self.relational.name(), e)
                })?;
            let document = self
                .document
                .execute_read(&workload.document)
                .map_err(|e| BenchError::for_workload(&workload.label, self.document.name(), e))?;

            tracing::info!(
                label = %workload.label,
                relational_rows = relational.rows,
                relational_secs = relational.elapsed_secs,
                document_rows = document.rows,
                document_secs = document.elapsed_secs,
                "query pair complete"
            );
            self.results.push(MeasurementResult::new(
                workload.label.clone(),
                Some(relational.elapsed_secs),
                Some(document.elapsed_secs),
            ));
        }
        Ok(())
    }

    /// Insert `total` freshly generated records per backend, split across
    /// `workers` pool tasks. Each backend gets an independently generated
    /// batch; its external ids land in that backend's reference key set.
    pub fn run_concurrent_insert(&mut self, total: usize, workers: usize) -> Result<()> {
        let label = format!("concurrent insert {total}");

        let batch = self.generator.member_batch(total);
        tracing::info!(label = %label, backend = self.relational.name(), total, workers, "insert phase start");
        let relational_secs = timed_phase(
            self.relational.as_ref(),
            &label,
            &batch,
            workers,
            |backend: &dyn Backend, chunk: &[MemberRecord]| backend.execute_insert_batch(chunk),
        )?;
        self.relational_keys
            .extend(batch.into_iter().map(|r| r.external_id));

        let batch = self.generator.member_batch(total);
        tracing::info!(label = %label, backend = self.document.name(), total, workers, "insert phase start");
        let document_secs = timed_phase(
            self.document.as_ref(),
            &label,
            &batch,
            workers,
            |backend: &dyn Backend, chunk: &[MemberRecord]| backend.execute_insert_batch(chunk),
        )?;
        self.document_keys
            .extend(batch.into_iter().map(|r| r.external_id));

        tracing::info!(label = %label, relational_secs, document_secs, "insert phase complete");
        self.results.push(MeasurementResult::new(
            label,
            Some(relational_secs),
            Some(document_secs),
        ));
        Ok(())
    }

    /// Update `total` records per backend, stretching or truncating each
    /// backend's reference key set to the requested size by cyclic
    /// repetition. Requires at least one earlier insert phase.
    pub fn run_concurrent_update(&mut self, total: usize, workers: usize) -> Result<()> {
        if self.relational_keys.is_empty() {
            return Err(BenchError::EmptyKeySet("relational"));
        }
        if self.document_keys.is_empty() {
            return Err(BenchError::EmptyKeySet("document"));
        }
        let label = format!("concurrent update {total}");

        let keys = partition::cycle_to_len(&self.relational_keys, total);
        let updates = self.generator.name_updates(keys);
        tracing::info!(label = %label, backend = self.relational.name(), total, workers, "update phase start");
        let relational_secs = timed_phase(
            self.relational.as_ref(),
            &label,
            &updates,
            workers,
            |backend: &dyn Backend, chunk: &[NameUpdate]| backend.execute_update_batch(chunk),
        )?;

        let keys = partition::cycle_to_len(&self.document_keys, total);
        let updates = self.generator.name_updates(keys);
        tracing::info!(label = %label, backend = self.document.name(), total, workers, "update phase start");
        let document_secs = timed_phase(
            self.document.as_ref(),
            &label,
            &updates,
            workers,
            |backend: &dyn Backend, chunk: &[NameUpdate]| backend.execute_update_batch(chunk),
        )?;

        tracing::info!(label = %label, relational_secs, document_secs, "update phase complete");
        self.results.push(MeasurementResult::new(
            label,
            Some(relational_secs),
            Some(document_secs),
        ));
        Ok(())
    }
}

/// One backend's concurrent phase: partition, build a pool of exactly
/// `workers` threads, and measure dispatch to all-complete. The pool lives
/// only for this phase and is joined on every exit path, including errors.
fn timed_phase<T, F>(
    backend: &dyn Backend,
    label: &str,
    items: &[T],
    workers: usize,
    op: F,
) -> Result<f64>
where
    T: Sync,
    F: Fn(&dyn Backend, &[T]) -> Result<()> + Sync,
{
    let chunks = partition::split_chunks(items, workers)?;
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .build()?;

    let start = Instant::now();
    pool.install(|| {
        chunks
            .into_par_iter()
            .try_for_each(|chunk| op(backend, chunk))
    })
    .map_err(|e| BenchError::for_workload(label, backend.name(), e))?;
    Ok(start.elapsed().as_secs_f64())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;
    use mongodb::bson::doc;
    use std::collections::HashSet;
    use std::sync::Arc;

    fn memory_harness() -> (Arc<MemoryBackend>, Arc<MemoryBackend>, Harness) {
        let relational = Arc::new(MemoryBackend::new());
        let document = Arc::new(MemoryBackend::new());
        let harness = Harness::new(
            Box::new(Arc::clone(&relational)),
            Box::new(Arc::clone(&document)),
            12345,
        );
        (relational, document, harness)
    }

    fn scan_workload(label: &str) -> Workload {
        Workload::new(
            label,
            Operation::read_sql("SELECT * FROM household_member"),
            Operation::read_pipeline(vec![doc! { "$match": {} }]),
        )
    }

    #[test]
    fn concurrent_insert_splits_across_workers() {
        let (relational, document, mut harness) = memory_harness();
        harness.run_concurrent_insert(1_000, 10).unwrap();

        assert_eq!(relational.len(), 1_000);
        assert_eq!(document.len(), 1_000);

        // Worker completion order is nondeterministic, so key sets are
        // checked as sets, not sequences.
        let keys: HashSet<&str> = harness
            .relational_keys()
            .iter()
            .map(String::as_str)
            .collect();
        assert_eq!(keys.len(), 1_000);
        for key in &keys {
            assert!(relational.contains(key));
        }

        assert_eq!(harness.results().len(), 1);
        let result = &harness.results()[0];
        assert_eq!(result.label, "concurrent insert 1000");
        assert!(result.relational_secs.unwrap() >= 0.0);
        assert!(result.document_secs.unwrap() >= 0.0);
    }

    #[test]
    fn independent_key_sets_per_backend() {
        let (_, _, mut harness) = memory_harness();
        harness.run_concurrent_insert(100, 4).unwrap();
        assert_eq!(harness.relational_keys().len(), 100);
        assert_eq!(harness.document_keys().len(), 100);
        assert_ne!(harness.relational_keys(), harness.document_keys());
    }

    #[test]
    fn sequential_read_pair_appends_one_result() {
        let mut generator = BatchGenerator::new(5);
        let relational = Arc::new(MemoryBackend::with_records(generator.member_batch(3)));
        let document = Arc::new(MemoryBackend::with_records(generator.member_batch(3)));
        let mut harness = Harness::new(
            Box::new(Arc::clone(&relational)),
            Box::new(Arc::clone(&document)),
            0,
        );

        harness.register(scan_workload("trivial scan"));
        harness.run_sequential().unwrap();

        assert_eq!(harness.results().len(), 1);
        let result = &harness.results()[0];
        assert_eq!(result.label, "trivial scan");
        assert!(result.relational_secs.unwrap() >= 0.0);
        assert!(result.document_secs.unwrap() >= 0.0);
    }

    #[test]
    fn failing_read_aborts_with_context_and_no_result() {
        let relational = Arc::new(MemoryBackend::failing_reads());
        let document = Arc::new(MemoryBackend::new());
        let mut harness = Harness::new(Box::new(relational), Box::new(document), 0);

        harness.register(scan_workload("doomed"));
        let err = harness.run_sequential().unwrap_err();
        match err {
            BenchError::Workload { label, backend, .. } => {
                assert_eq!(label, "doomed");
                assert_eq!(backend, "memory");
            }
            other => panic!("expected workload error, got {other}"),
        }
        assert!(harness.results().is_empty());
    }

    #[test]
    fn update_requires_prior_insert() {
        let (_, _, mut harness) = memory_harness();
        assert!(matches!(
            harness.run_concurrent_update(10, 2),
            Err(BenchError::EmptyKeySet("relational"))
        ));
    }

    #[test]
    fn update_round_larger_than_population() {
        let (relational, _, mut harness) = memory_harness();
        harness.run_concurrent_insert(100, 4).unwrap();

        // 250 updates over 100 keys cycle; every key gets hit at least twice.
        let key = harness.relational_keys()[0].clone();
        let before = relational.full_name_of(&key).unwrap();
        harness.run_concurrent_update(250, 4).unwrap();

        // Still the same 100 records: updates cycle over existing keys.
        assert_eq!(relational.len(), 100);
        // The stored name was rewritten; with repeated hits the last write
        // per key is what remains.
        assert_ne!(relational.full_name_of(&key).unwrap(), before);
        assert_eq!(harness.results().len(), 2);
        assert_eq!(harness.results()[1].label, "concurrent update 250");
    }

    #[test]
    fn clear_drops_results_but_keeps_keys() {
        let (_, _, mut harness) = memory_harness();
        harness.run_concurrent_insert(50, 5).unwrap();
        harness.clear();
        assert!(harness.results().is_empty());
        assert_eq!(harness.relational_keys().len(), 50);

        // Keys survived, so an update round still works.
        harness.run_concurrent_update(50, 5).unwrap();
        assert_eq!(harness.results().len(), 1);

        harness.clear_keys();
        assert!(harness.relational_keys().is_empty());
    }

    #[test]
    fn zero_workers_rejected() {
        let (_, _, mut harness) = memory_harness();
        assert!(matches!(
            harness.run_concurrent_insert(10, 0),
            Err(BenchError::InvalidArgument(_))
        ));
    }
}
