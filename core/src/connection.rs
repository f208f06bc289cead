use async_trait::async_trait;

use crate::{mapping::MappedColumn, table::Table};

/// Everything a destination needs to perform one bulk write.
#[derive(Debug)]
pub struct BulkWriteRequest<'a> {
    pub destination_table: &'a str,
    pub table: &'a Table,
    pub columns: &'a [MappedColumn],
    /// Rows per batch, already resolved so it is never `0`.
    pub batch_size: usize,
    pub fire_triggers: bool,
    pub use_internal_transaction: bool,
}

/// A destination that supports a native bulk load.
///
/// The connection is supplied by the caller and may or may not be open yet,
/// [`BulkCopy`](crate::BulkCopy) opens it before the first write.
#[async_trait]
pub trait BulkCopyConnection: Send {
    type Error: std::error::Error + Send + Sync + 'static;

    fn is_open(&self) -> bool;

    async fn open(&mut self) -> Result<(), Self::Error>;

    /// Writes every row of the request and returns the rows committed, or `None`
    /// when the destination cannot report it.
    async fn write_to_server(
        &mut self,
        request: &BulkWriteRequest<'_>,
    ) -> Result<Option<u64>, Self::Error>;

    async fn close(&mut self);
}
