use bytes::Bytes;
use futures::pin_mut;
use tokio_postgres::{
    binary_copy::BinaryCopyInWriter,
    types::{ToSql, Type as PgType},
    Client, CopyInSink, Error as PgError,
};
use tracing::debug;

use crate::{
    connection::BulkWriteRequest, database::postgres::generate::generate_copy_in_sql,
    mapping::MappedColumn, table::Row,
};

// Must only run inside a transaction, the setting ends with it.
const DISABLE_TRIGGERS_SQL: &str = "SET LOCAL session_replication_role = replica";

/// Copies every row of `request` with binary COPY, one COPY per batch, and
/// returns the row count postgres reported for all batches together.
///
/// With `use_internal_transaction` every batch commits on its own. Without it the
/// batches autocommit, unless triggers are turned off, in which case all batches share
/// one transaction that carries the trigger setting.
pub async fn copy_in_batches(
    client: &mut Client,
    request: &BulkWriteRequest<'_>,
) -> Result<u64, PgError> {
    let statement = generate_copy_in_sql(request.destination_table, request.columns);
    let column_types: Vec<PgType> =
        request.columns.iter().map(|column| column.column_type.to_pg_type()).collect();

    debug!("Bulk copy statement: {}", statement);

    let batches = request.table.rows().chunks(request.batch_size.max(1));
    let mut rows_copied = 0;

    if request.use_internal_transaction {
        for (batch_index, batch) in batches.enumerate() {
            let transaction = client.transaction().await?;
            if !request.fire_triggers {
                transaction.batch_execute(DISABLE_TRIGGERS_SQL).await?;
            }
            let sink = transaction.copy_in(statement.as_str()).await?;
            let copied = write_rows(sink, &column_types, request.columns, batch).await?;
            transaction.commit().await?;

            log_batch(request, batch_index, copied);
            rows_copied += copied;
        }
    } else if !request.fire_triggers {
        let transaction = client.transaction().await?;
        transaction.batch_execute(DISABLE_TRIGGERS_SQL).await?;
        for (batch_index, batch) in batches.enumerate() {
            let sink = transaction.copy_in(statement.as_str()).await?;
            let copied = write_rows(sink, &column_types, request.columns, batch).await?;

            log_batch(request, batch_index, copied);
            rows_copied += copied;
        }
        transaction.commit().await?;
    } else {
        for (batch_index, batch) in batches.enumerate() {
            let sink = client.copy_in(statement.as_str()).await?;
            let copied = write_rows(sink, &column_types, request.columns, batch).await?;

            log_batch(request, batch_index, copied);
            rows_copied += copied;
        }
    }

    Ok(rows_copied)
}

fn log_batch(request: &BulkWriteRequest<'_>, batch_index: usize, copied: u64) {
    debug!("Copied batch {} ({} rows) into {}", batch_index, copied, request.destination_table);
}

async fn write_rows(
    sink: CopyInSink<Bytes>,
    column_types: &[PgType],
    columns: &[MappedColumn],
    rows: &[Row],
) -> Result<u64, PgError> {
    let writer = BinaryCopyInWriter::new(sink, column_types);
    pin_mut!(writer);

    for row in rows {
        let values: Vec<&(dyn ToSql + Sync)> = columns
            .iter()
            .map(|column| &row.values()[column.source_index] as &(dyn ToSql + Sync))
            .collect();

        writer.as_mut().write(&values).await?;
    }

    writer.finish().await
}
