use thiserror::Error;

pub type Result<T> = std::result::Result<T, BenchError>;

#[derive(Debug, Error)]
pub enum BenchError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Update benchmarks need keys from an earlier insert phase.
    #[error("no reference keys recorded for {0}; run an insert phase first")]
    EmptyKeySet(&'static str),

    #[error("{backend} backend cannot execute this operation: {detail}")]
    UnsupportedOperation {
        backend: &'static str,
        detail: String,
    },

    #[error("relational backend: {0}")]
    Relational(#[from] mysql::Error),

    #[error("document backend: {0}")]
    Document(#[from] mongodb::error::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("report serialization: {0}")]
    Json(#[from] serde_json::Error),

    #[error("worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),

    /// Timed-operation failure, annotated with enough context to identify
    /// which comparison failed.
    #[error("workload '{label}' failed on {backend} backend: {source}")]
    Workload {
        label: String,
        backend: &'static str,
        #[source]
        source: Box<BenchError>,
    },
}

impl BenchError {
    pub fn for_workload(label: &str, backend: &'static str, source: BenchError) -> Self {
        BenchError::Workload {
            label: label.to_string(),
            backend,
            source: Box::new(source),
        }
    }
}
