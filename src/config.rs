//! Run configuration. Connection parameters are never hardcoded: they come
//! from a JSON file (`--config`) or from `REGISTRY_BENCH_*` environment
//! variables, loaded once at process start.

use crate::error::{BenchError, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelationalConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentConfig {
    pub uri: String,
    pub database: String,
    pub collection: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub relational: RelationalConfig,
    pub document: DocumentConfig,
    /// Worker-pool size for the concurrent phases.
    #[serde(default = "default_workers")]
    pub workers: usize,
}

fn default_workers() -> usize {
    10
}

impl Settings {
    /// File config when a path is given, environment otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::from_file(p),
            None => Self::from_env(),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Environment variables with local-development defaults.
    pub fn from_env() -> Result<Self> {
        let port = match env::var("REGISTRY_BENCH_MYSQL_PORT") {
            Ok(v) => v.parse::<u16>().map_err(|_| {
                BenchError::InvalidArgument(format!("REGISTRY_BENCH_MYSQL_PORT: bad port '{v}'"))
            })?,
            Err(_) => 3306,
        };
        let workers = match env::var("REGISTRY_BENCH_WORKERS") {
            Ok(v) => v.parse::<usize>().map_err(|_| {
                BenchError::InvalidArgument(format!(
                    "REGISTRY_BENCH_WORKERS: bad worker count '{v}'"
                ))
            })?,
            Err(_) => default_workers(),
        };

        Ok(Self {
            relational: RelationalConfig {
                host: var_or("REGISTRY_BENCH_MYSQL_HOST", "127.0.0.1"),
                port,
                user: var_or("REGISTRY_BENCH_MYSQL_USER", "root"),
                password: var_or("REGISTRY_BENCH_MYSQL_PASSWORD", ""),
                database: var_or("REGISTRY_BENCH_MYSQL_DATABASE", "registry"),
            },
            document: DocumentConfig {
                uri: var_or("REGISTRY_BENCH_MONGO_URI", "mongodb://localhost:27017/"),
                database: var_or("REGISTRY_BENCH_MONGO_DATABASE", "registry"),
                collection: var_or("REGISTRY_BENCH_MONGO_COLLECTION", "members"),
            },
            workers,
        })
    }
}

fn var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_round_trip() {
        let settings = Settings {
            relational: RelationalConfig {
                host: "db.example".to_string(),
                port: 3307,
                user: "bench".to_string(),
                password: "secret".to_string(),
                database: "registry".to_string(),
            },
            document: DocumentConfig {
                uri: "mongodb://db.example:27017/".to_string(),
                database: "registry".to_string(),
                collection: "members".to_string(),
            },
            workers: 4,
        };

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bench.json");
        fs::write(&path, serde_json::to_string_pretty(&settings).unwrap()).unwrap();

        let loaded = Settings::from_file(&path).unwrap();
        assert_eq!(loaded.relational.host, "db.example");
        assert_eq!(loaded.relational.port, 3307);
        assert_eq!(loaded.document.collection, "members");
        assert_eq!(loaded.workers, 4);
    }

    #[test]
    fn workers_default_when_absent_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bench.json");
        fs::write(
            &path,
            r#"{
                "relational": {"host": "h", "port": 3306, "user": "u", "password": "p", "database": "d"},
                "document": {"uri": "mongodb://h/", "database": "d", "collection": "c"}
            }"#,
        )
        .unwrap();

        let loaded = Settings::from_file(&path).unwrap();
        assert_eq!(loaded.workers, 10);
    }
}
