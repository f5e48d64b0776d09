//! MySQL adapter. Reads run arbitrary SELECT text; writes go through one
//! transaction per worker batch on a dedicated connection.

use crate::backend::{
    Backend, Operation, OperationKind, QueryPayload, ReadOutcome, MEMBER_TABLE, NATURAL_KEY_INDEX,
};
use crate::config::RelationalConfig;
use crate::dataset::{MemberRecord, NameUpdate};
use crate::error::{BenchError, Result};
use mysql::prelude::Queryable;
use mysql::{Conn, Opts, OptsBuilder, Row, TxOpts};
use std::time::Instant;

pub struct RelationalBackend {
    opts: Opts,
}

impl RelationalBackend {
    /// Opens a probe connection (fatal on bad config/credentials) and ensures
    /// the natural-key index exists. Index failures are logged, not fatal.
    pub fn connect(config: &RelationalConfig) -> Result<Self> {
        let opts: Opts = OptsBuilder::new()
            .ip_or_hostname(Some(config.host.clone()))
            .tcp_port(config.port)
            .user(Some(config.user.clone()))
            .pass(Some(config.password.clone()))
            .db_name(Some(config.database.clone()))
            .into();

        let mut conn = Conn::new(opts.clone())?;
        if let Err(e) = ensure_index(&mut conn) {
            tracing::warn!(error = %e, "relational index bootstrap failed; continuing");
        }

        Ok(Self { opts })
    }

    fn acquire(&self) -> Result<Conn> {
        Ok(Conn::new(self.opts.clone())?)
    }
}

/// Idempotent: probes `SHOW INDEX` first, creates the index only when absent.
fn ensure_index(conn: &mut Conn) -> Result<()> {
    let probe = format!(
        "SHOW INDEX FROM {MEMBER_TABLE} WHERE Key_name = '{NATURAL_KEY_INDEX}'"
    );
    let existing: Option<Row> = conn.query_first(probe)?;
    if existing.is_none() {
        conn.query_drop(format!(
            "CREATE INDEX {NATURAL_KEY_INDEX} ON {MEMBER_TABLE}(external_id)"
        ))?;
    }
    Ok(())
}

impl Backend for RelationalBackend {
    fn name(&self) -> &'static str {
        "relational"
    }

    fn execute_read(&self, operation: &Operation) -> Result<ReadOutcome> {
        if operation.kind != OperationKind::Read {
            return Err(BenchError::UnsupportedOperation {
                backend: self.name(),
                detail: "execute_read requires a read operation".to_string(),
            });
        }
        let sql = match &operation.payload {
            QueryPayload::Sql(sql) => sql,
            QueryPayload::Pipeline(_) => {
                return Err(BenchError::UnsupportedOperation {
                    backend: self.name(),
                    detail: "aggregation pipelines need the document backend".to_string(),
                })
            }
        };

        let mut conn = self.acquire()?;
        let start = Instant::now();
        let rows: Vec<Row> = conn.query(sql.as_str())?;
        let elapsed_secs = start.elapsed().as_secs_f64();
        Ok(ReadOutcome {
            rows: rows.len(),
            elapsed_secs,
        })
    }

    fn execute_insert_batch(&self, records: &[MemberRecord]) -> Result<()> {
        let mut conn = self.acquire()?;
        let mut tx = conn.start_transaction(TxOpts::default())?;
        tx.exec_batch(
            format!(
                "INSERT INTO {MEMBER_TABLE} (external_id, full_name, birth_date, gender) \
                 VALUES (?, ?, ?, ?)"
            ),
            records.iter().map(|r| {
                (
                    r.external_id.as_str(),
                    r.full_name.as_str(),
                    r.birth_date.format("%Y-%m-%d").to_string(),
                    r.gender.as_str(),
                )
            }),
        )?;
        tx.commit()?;
        Ok(())
    }

    fn execute_update_batch(&self, updates: &[NameUpdate]) -> Result<()> {
        let mut conn = self.acquire()?;
        let mut tx = conn.start_transaction(TxOpts::default())?;
        tx.exec_batch(
            format!("UPDATE {MEMBER_TABLE} SET full_name = ? WHERE external_id = ?"),
            updates
                .iter()
                .map(|u| (u.full_name.as_str(), u.external_id.as_str())),
        )?;
        tx.commit()?;
        Ok(())
    }
}
