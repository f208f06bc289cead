use async_trait::async_trait;
use bb8::Pool;
use bb8_postgres::PostgresConnectionManager;
use postgres_native_tls::MakeTlsConnector;
use tokio_postgres::Config;
use tracing::debug;

use crate::{
    connection::{BulkCopyConnection, BulkWriteRequest},
    database::postgres::{
        client::{make_tls_connector, parse_connection_str, PostgresConnectionError, PostgresError},
        copy::copy_in_batches,
    },
};

const DEFAULT_MAX_SIZE: u32 = 10;

/// A pool of postgres connections, built on first use.
///
/// Each write checks a connection out of the pool for its duration, which lets
/// several `BulkCopy` instances share one set of connections.
pub struct PostgresPool {
    config: Config,
    tls_connector: MakeTlsConnector,
    max_size: u32,
    pool: Option<Pool<PostgresConnectionManager<MakeTlsConnector>>>,
}

impl PostgresPool {
    pub fn new(config: Config) -> Result<Self, PostgresConnectionError> {
        Ok(PostgresPool {
            config,
            tls_connector: make_tls_connector()?,
            max_size: DEFAULT_MAX_SIZE,
            pool: None,
        })
    }

    pub fn from_connection_str(connection_str: &str) -> Result<Self, PostgresConnectionError> {
        Self::new(parse_connection_str(connection_str)?)
    }

    pub fn with_max_size(mut self, max_size: u32) -> Self {
        self.max_size = max_size;
        self
    }

    pub fn pool(&self) -> Option<&Pool<PostgresConnectionManager<MakeTlsConnector>>> {
        self.pool.as_ref()
    }
}

#[async_trait]
impl BulkCopyConnection for PostgresPool {
    type Error = PostgresError;

    fn is_open(&self) -> bool {
        self.pool.is_some()
    }

    async fn open(&mut self) -> Result<(), PostgresError> {
        debug!("Building postgres pool with max size {}", self.max_size);
        let manager = PostgresConnectionManager::new(self.config.clone(), self.tls_connector.clone());
        let pool = Pool::builder()
            .max_size(self.max_size)
            .build(manager)
            .await
            .map_err(PostgresConnectionError::ConnectionPoolError)?;

        self.pool = Some(pool);
        Ok(())
    }

    async fn write_to_server(
        &mut self,
        request: &BulkWriteRequest<'_>,
    ) -> Result<Option<u64>, PostgresError> {
        let pool = self.pool.as_ref().ok_or(PostgresError::NotOpen)?;
        let mut conn = pool.get().await?;
        let rows_copied = copy_in_batches(&mut conn, request).await?;
        Ok(Some(rows_copied))
    }

    async fn close(&mut self) {
        self.pool = None;
    }
}
