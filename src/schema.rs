use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunMeta {
    pub schema_version: u32,
    pub bench_version: String,
    pub seed: u64,
    pub workers: usize,
    pub timestamp_utc: String,
    pub git_sha: Option<String>,
}

/// One comparable unit of work, timed on both backends. `None` means the
/// duration was not measured (or the measurement was skipped).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeasurementResult {
    pub label: String,
    pub relational_secs: Option<f64>,
    pub document_secs: Option<f64>,
}

impl MeasurementResult {
    pub fn new(
        label: impl Into<String>,
        relational_secs: Option<f64>,
        document_secs: Option<f64>,
    ) -> Self {
        Self {
            label: label.into(),
            relational_secs,
            document_secs,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryBenchReport {
    pub run: RunMeta,
    pub results: Vec<MeasurementResult>,
}
