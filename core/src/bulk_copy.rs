use std::{marker::PhantomData, time::Instant};

use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::{
    connection::{BulkCopyConnection, BulkWriteRequest},
    mapping::{ColumnMapping, MappingError},
    options::BulkCopyOptions,
    record::Record,
    table::project,
};

#[derive(thiserror::Error, Debug)]
pub enum BulkCopyError<E: std::error::Error + 'static> {
    #[error("Column mapping for {table} is invalid: {source}")]
    Mapping { table: String, source: MappingError },

    #[error("Could not open connection to copy into {table}: {source}")]
    Open { table: String, source: E },

    #[error("Could not write rows to {table}: {source}")]
    Write { table: String, source: E },

    #[error("Writing rows to {table} timed out after {timeout_secs} seconds")]
    Timeout { table: String, timeout_secs: u64 },
}

/// Loads collections of `T` into one destination table using the connection's
/// native bulk load.
///
/// The column mapping is derived from the first non-empty transfer that resolves
/// and reused for every transfer after it. Transfers take `&mut self`, so an instance is
/// only ever used by one caller at a time.
pub struct BulkCopy<T, C> {
    connection: C,
    destination_table: String,
    options: BulkCopyOptions,
    column_mapping: Option<ColumnMapping>,
    _record: PhantomData<fn(&T)>,
}

impl<T, C> BulkCopy<T, C>
where
    T: Record,
    C: BulkCopyConnection,
{
    pub fn new(connection: C, destination_table: impl Into<String>) -> Self {
        BulkCopy {
            connection,
            destination_table: destination_table.into(),
            options: BulkCopyOptions::default(),
            column_mapping: None,
            _record: PhantomData,
        }
    }

    pub fn with_options(mut self, options: BulkCopyOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.options.batch_size = batch_size;
        self
    }

    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.options.timeout_secs = timeout_secs;
        self
    }

    /// Uses `column_mapping` instead of deriving one from the record type.
    pub fn with_column_mapping(mut self, column_mapping: ColumnMapping) -> Self {
        self.column_mapping = Some(column_mapping);
        self
    }

    pub fn destination_table(&self) -> &str {
        &self.destination_table
    }

    pub fn options(&self) -> &BulkCopyOptions {
        &self.options
    }

    pub fn column_mapping(&self) -> Option<&ColumnMapping> {
        self.column_mapping.as_ref()
    }

    pub fn is_mapped(&self) -> bool {
        self.column_mapping.is_some()
    }

    /// Forgets the cached mapping so the next transfer derives it again.
    pub fn reset_column_mapping(&mut self) {
        self.column_mapping = None;
    }

    pub fn connection(&self) -> &C {
        &self.connection
    }

    pub fn into_connection(self) -> C {
        self.connection
    }

    /// Closes the underlying connection, the next transfer opens it again.
    pub async fn close(&mut self) {
        debug!("Closing connection used for {}", self.destination_table);
        self.connection.close().await;
    }

    /// Copies `records` into the destination table and returns the rows committed.
    ///
    /// An empty slice returns `0` without touching the connection. A destination
    /// that cannot report a count also yields `0`.
    pub async fn transfer(&mut self, records: &[T]) -> Result<u64, BulkCopyError<C::Error>> {
        if records.is_empty() {
            debug!("Nothing to copy into {}, skipping", self.destination_table);
            return Ok(0);
        }

        let table = project(records);

        let (column_mapping, derived) = match self.column_mapping.take() {
            Some(column_mapping) => (column_mapping, false),
            None => {
                debug!(
                    "Mapping columns for {}: {}",
                    self.destination_table,
                    table
                        .columns()
                        .iter()
                        .map(|column| format!("{} {}", column.name, column.column_type.as_str()))
                        .collect::<Vec<_>>()
                        .join(", ")
                );
                (ColumnMapping::from_table(&table), true)
            }
        };

        // a derived mapping is only cached once it resolves
        let resolved = column_mapping.resolve(&table);
        if resolved.is_ok() || !derived {
            self.column_mapping = Some(column_mapping);
        }

        let columns = resolved.map_err(|source| BulkCopyError::Mapping {
            table: self.destination_table.clone(),
            source,
        })?;

        if !self.connection.is_open() {
            debug!("Opening connection to copy into {}", self.destination_table);
            self.connection.open().await.map_err(|source| BulkCopyError::Open {
                table: self.destination_table.clone(),
                source,
            })?;
        }

        let request = BulkWriteRequest {
            destination_table: &self.destination_table,
            table: &table,
            columns: &columns,
            batch_size: self.options.effective_batch_size(table.row_count()),
            fire_triggers: self.options.fire_triggers,
            use_internal_transaction: self.options.use_internal_transaction,
        };

        let start = Instant::now();
        let write = self.connection.write_to_server(&request);
        let result = match self.options.timeout() {
            Some(duration) => match timeout(duration, write).await {
                Ok(result) => result,
                Err(_) => {
                    return Err(BulkCopyError::Timeout {
                        table: self.destination_table.clone(),
                        timeout_secs: self.options.timeout_secs,
                    })
                }
            },
            None => write.await,
        };

        let rows_copied = match result {
            Ok(Some(rows_copied)) => rows_copied,
            Ok(None) => {
                warn!(
                    "Copied into {} but the destination did not report a row count",
                    self.destination_table
                );
                0
            }
            Err(source) => {
                return Err(BulkCopyError::Write {
                    table: self.destination_table.clone(),
                    source,
                })
            }
        };

        info!(
            "Copied {} rows into {} in {:?}",
            rows_copied,
            self.destination_table,
            start.elapsed()
        );

        Ok(rows_copied)
    }
}
