mod bulk_copy;
pub use bulk_copy::{BulkCopy, BulkCopyError};

mod connection;
pub use connection::{BulkCopyConnection, BulkWriteRequest};

mod database;
pub use database::{
    postgres::{
        client::{PostgresConnection, PostgresConnectionError, PostgresError},
        generate::{format_table_name, generate_copy_in_sql, quote_identifier},
        pool::PostgresPool,
    },
    sql_type_wrapper::{ColumnType, SqlTypeWrapper, ToSqlValue},
};

mod logger;
pub use logger::{setup_info_logger, setup_logger};

mod mapping;
pub use mapping::{ColumnMapping, ColumnMappingPair, MappedColumn, MappingError};

mod options;
pub use options::{BulkCopyOptions, BulkCopyOptionsError};

mod record;
pub use record::{FieldDescriptor, Record};

mod table;
pub use table::{project, Column, Row, Table};

// export 3rd party dependencies
pub use async_trait::async_trait;
pub use tokio_postgres::types::Type as PgType;
pub use tracing::level_filters::LevelFilter;
