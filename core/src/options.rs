use std::{fs, path::Path, time::Duration};

use serde::{Deserialize, Serialize};

fn default_batch_size() -> usize {
    1000
}

fn default_timeout_secs() -> u64 {
    120
}

fn default_true() -> bool {
    true
}

#[derive(thiserror::Error, Debug)]
pub enum BulkCopyOptionsError {
    #[error("Could not read bulk copy options file: {0}")]
    CouldNotReadFile(#[from] std::io::Error),

    #[error("Could not parse bulk copy options: {0}")]
    CouldNotParse(#[from] serde_yaml::Error),
}

/// Tuning for a bulk copy, all fields default when left out of the yaml.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulkCopyOptions {
    /// Rows sent per COPY. `0` sends every row in a single batch.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Upper bound for the whole write in seconds. `0` disables the bound.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Let triggers on the destination table run for copied rows.
    ///
    /// Turning this off sets `session_replication_role = replica` with `SET LOCAL` inside the
    /// write's transaction, which requires a superuser role on the destination. Without
    /// `use_internal_transaction` all batches then share that one transaction.
    #[serde(default = "default_true")]
    pub fire_triggers: bool,

    /// Wrap every batch in its own transaction so a failing batch leaves nothing behind.
    #[serde(default = "default_true")]
    pub use_internal_transaction: bool,
}

impl Default for BulkCopyOptions {
    fn default() -> Self {
        BulkCopyOptions {
            batch_size: default_batch_size(),
            timeout_secs: default_timeout_secs(),
            fire_triggers: true,
            use_internal_transaction: true,
        }
    }
}

impl BulkCopyOptions {
    pub fn from_yaml_str(yaml: &str) -> Result<Self, BulkCopyOptionsError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn from_yaml_file(path: &Path) -> Result<Self, BulkCopyOptionsError> {
        let contents = fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }

    pub fn timeout(&self) -> Option<Duration> {
        if self.timeout_secs == 0 {
            None
        } else {
            Some(Duration::from_secs(self.timeout_secs))
        }
    }

    /// Number of rows to put in each batch when copying `total_rows` rows.
    pub fn effective_batch_size(&self, total_rows: usize) -> usize {
        if self.batch_size == 0 {
            total_rows.max(1)
        } else {
            self.batch_size
        }
    }
}
