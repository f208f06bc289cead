use std::env;

use bulkcopy::{
    bulk_record, setup_info_logger, BulkCopy, BulkCopyConnection, BulkCopyError, BulkCopyOptions,
    PostgresConnection, PostgresPool,
};
use dotenv::dotenv;
use tokio_postgres::Client;

bulk_record! {
    #[derive(Debug, Clone)]
    pub struct Score {
        #[key]
        pub id: i64,
        pub name: String,
        pub score: Option<i32>,
        #[computed]
        pub created_at: i64,
    }
}

fn database_url() -> Option<String> {
    dotenv().ok();
    setup_info_logger();
    env::var("DATABASE_URL").ok()
}

fn scores() -> Vec<Score> {
    vec![
        Score { id: 1, name: "a".to_string(), score: Some(5), created_at: 99 },
        Score { id: 2, name: "b".to_string(), score: None, created_at: 100 },
    ]
}

fn create_table_sql(table: &str) -> String {
    format!(
        "DROP TABLE IF EXISTS {table};
         CREATE TABLE {table} (
            id BIGSERIAL PRIMARY KEY,
            name TEXT NOT NULL,
            score INTEGER CHECK (score IS NULL OR score >= 0),
            created_at BIGINT NOT NULL DEFAULT 7
         );"
    )
}

fn create_audit_trigger_sql(table: &str) -> String {
    format!(
        "DROP TABLE IF EXISTS {table}_audit;
         CREATE TABLE {table}_audit (name TEXT NOT NULL);
         CREATE OR REPLACE FUNCTION {table}_audit_fn() RETURNS trigger AS $$
         BEGIN
            INSERT INTO {table}_audit (name) VALUES (NEW.name);
            RETURN NEW;
         END;
         $$ LANGUAGE plpgsql;
         CREATE TRIGGER {table}_audit_trigger AFTER INSERT ON {table}
            FOR EACH ROW EXECUTE FUNCTION {table}_audit_fn();"
    )
}

fn drop_tables_sql(table: &str) -> String {
    format!(
        "DROP TABLE IF EXISTS {table}; DROP TABLE IF EXISTS {table}_audit;
         DROP FUNCTION IF EXISTS {table}_audit_fn();"
    )
}

async fn count(client: &Client, table: &str) -> i64 {
    client
        .query_one(format!("SELECT COUNT(*) FROM {table}").as_str(), &[])
        .await
        .unwrap()
        .get(0)
}

async fn replication_role(client: &Client) -> String {
    client.query_one("SHOW session_replication_role", &[]).await.unwrap().get(0)
}

async fn open_with_audited_table(url: &str, table: &str) -> PostgresConnection {
    let mut connection = PostgresConnection::from_connection_str(url).unwrap();
    connection.open().await.unwrap();
    let client = connection.client().unwrap();
    client.batch_execute(&create_table_sql(table)).await.unwrap();
    client.batch_execute(&create_audit_trigger_sql(table)).await.unwrap();
    connection
}

#[tokio::test]
async fn test_copies_rows_with_single_connection() {
    let Some(url) = database_url() else {
        eprintln!("DATABASE_URL is not set, skipping postgres test");
        return;
    };
    let table = format!("bulkcopy_single_{}", std::process::id());

    let mut connection = PostgresConnection::from_connection_str(&url).unwrap();
    connection.open().await.unwrap();
    connection.client().unwrap().batch_execute(&create_table_sql(&table)).await.unwrap();

    let mut bulk_copy = BulkCopy::<Score, _>::new(connection, table.as_str()).with_batch_size(1);

    assert_eq!(bulk_copy.transfer(&[]).await.unwrap(), 0);
    assert_eq!(bulk_copy.transfer(&scores()).await.unwrap(), 2);
    assert_eq!(bulk_copy.transfer(&scores()[..1]).await.unwrap(), 1);

    let client = bulk_copy.connection().client().unwrap();
    let rows = client
        .query(format!("SELECT name, score, created_at FROM {table} ORDER BY id").as_str(), &[])
        .await
        .unwrap();

    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0].get::<_, String>(0), "a");
    assert_eq!(rows[0].get::<_, Option<i32>>(1), Some(5));
    assert_eq!(rows[1].get::<_, Option<i32>>(1), None);
    // computed column comes from the table default, not the record
    assert_eq!(rows[1].get::<_, i64>(2), 7);

    client.batch_execute(&format!("DROP TABLE {table}")).await.unwrap();
}

#[tokio::test]
async fn test_failed_batch_keeps_earlier_batches() {
    let Some(url) = database_url() else {
        eprintln!("DATABASE_URL is not set, skipping postgres test");
        return;
    };
    let table = format!("bulkcopy_partial_{}", std::process::id());

    let mut connection = PostgresConnection::from_connection_str(&url).unwrap();
    connection.open().await.unwrap();
    connection.client().unwrap().batch_execute(&create_table_sql(&table)).await.unwrap();

    let mut records = scores();
    records[1].score = Some(-1);

    let mut bulk_copy = BulkCopy::<Score, _>::new(connection, table.as_str()).with_batch_size(1);
    let result = bulk_copy.transfer(&records).await;

    assert!(matches!(result, Err(BulkCopyError::Write { .. })));

    let client = bulk_copy.connection().client().unwrap();
    let row = client.query_one(format!("SELECT COUNT(*) FROM {table}").as_str(), &[]).await.unwrap();
    assert_eq!(row.get::<_, i64>(0), 1);

    client.batch_execute(&format!("DROP TABLE {table}")).await.unwrap();
}

#[tokio::test]
async fn test_copies_rows_with_pool_and_fires_triggers() {
    let Some(url) = database_url() else {
        eprintln!("DATABASE_URL is not set, skipping postgres test");
        return;
    };
    let table = format!("bulkcopy_pool_{}", std::process::id());
    let audit = format!("{table}_audit");

    let mut pool = PostgresPool::from_connection_str(&url).unwrap().with_max_size(2);
    pool.open().await.unwrap();
    {
        let conn = pool.pool().unwrap().get().await.unwrap();
        conn.batch_execute(&create_table_sql(&table)).await.unwrap();
        conn.batch_execute(&create_audit_trigger_sql(&table)).await.unwrap();
    }

    let mut bulk_copy = BulkCopy::<Score, _>::new(pool, table.as_str());
    assert_eq!(bulk_copy.transfer(&scores()).await.unwrap(), 2);

    let conn = bulk_copy.connection().pool().unwrap().get().await.unwrap();
    assert_eq!(count(&conn, &audit).await, 2);
    assert_eq!(replication_role(&conn).await, "origin");

    conn.batch_execute(&drop_tables_sql(&table)).await.unwrap();
}

#[tokio::test]
async fn test_triggers_off_with_internal_transactions() {
    let Some(url) = database_url() else {
        eprintln!("DATABASE_URL is not set, skipping postgres test");
        return;
    };
    let table = format!("bulkcopy_notrig_tx_{}", std::process::id());

    let connection = open_with_audited_table(&url, &table).await;
    let options = BulkCopyOptions { batch_size: 1, fire_triggers: false, ..Default::default() };
    let mut bulk_copy = BulkCopy::<Score, _>::new(connection, table.as_str()).with_options(options);

    assert_eq!(bulk_copy.transfer(&scores()).await.unwrap(), 2);

    let client = bulk_copy.connection().client().unwrap();
    assert_eq!(count(client, &table).await, 2);
    assert_eq!(count(client, &format!("{table}_audit")).await, 0);
    assert_eq!(replication_role(client).await, "origin");

    client.batch_execute(&drop_tables_sql(&table)).await.unwrap();
}

#[tokio::test]
async fn test_triggers_off_without_internal_transaction() {
    let Some(url) = database_url() else {
        eprintln!("DATABASE_URL is not set, skipping postgres test");
        return;
    };
    let table = format!("bulkcopy_notrig_notx_{}", std::process::id());

    let connection = open_with_audited_table(&url, &table).await;
    let options = BulkCopyOptions {
        batch_size: 1,
        fire_triggers: false,
        use_internal_transaction: false,
        ..Default::default()
    };
    let mut bulk_copy = BulkCopy::<Score, _>::new(connection, table.as_str()).with_options(options);

    assert_eq!(bulk_copy.transfer(&scores()).await.unwrap(), 2);

    let client = bulk_copy.connection().client().unwrap();
    assert_eq!(count(client, &table).await, 2);
    assert_eq!(count(client, &format!("{table}_audit")).await, 0);
    assert_eq!(replication_role(client).await, "origin");

    client.batch_execute(&drop_tables_sql(&table)).await.unwrap();
}

#[tokio::test]
async fn test_batches_autocommit_without_internal_transaction() {
    let Some(url) = database_url() else {
        eprintln!("DATABASE_URL is not set, skipping postgres test");
        return;
    };
    let table = format!("bulkcopy_autocommit_{}", std::process::id());

    let connection = open_with_audited_table(&url, &table).await;
    let options =
        BulkCopyOptions { batch_size: 1, use_internal_transaction: false, ..Default::default() };
    let mut bulk_copy = BulkCopy::<Score, _>::new(connection, table.as_str()).with_options(options);

    let mut records = scores();
    records[1].score = Some(-1);
    let result = bulk_copy.transfer(&records).await;

    assert!(matches!(result, Err(BulkCopyError::Write { .. })));

    let client = bulk_copy.connection().client().unwrap();
    assert_eq!(count(client, &table).await, 1);
    assert_eq!(count(client, &format!("{table}_audit")).await, 1);

    client.batch_execute(&drop_tables_sql(&table)).await.unwrap();
}

#[tokio::test]
async fn test_timed_out_write_leaves_triggers_on() {
    let Some(url) = database_url() else {
        eprintln!("DATABASE_URL is not set, skipping postgres test");
        return;
    };
    let table = format!("bulkcopy_locked_{}", std::process::id());
    let audit = format!("{table}_audit");

    let connection = open_with_audited_table(&url, &table).await;

    let mut locker = PostgresConnection::from_connection_str(&url).unwrap();
    locker.open().await.unwrap();
    locker
        .client()
        .unwrap()
        .batch_execute(&format!("BEGIN; LOCK TABLE {table} IN ACCESS EXCLUSIVE MODE;"))
        .await
        .unwrap();

    let options = BulkCopyOptions {
        timeout_secs: 1,
        fire_triggers: false,
        use_internal_transaction: false,
        ..Default::default()
    };
    let mut bulk_copy = BulkCopy::<Score, _>::new(connection, table.as_str()).with_options(options);

    let result = bulk_copy.transfer(&scores()).await;
    assert!(matches!(result, Err(BulkCopyError::Timeout { timeout_secs: 1, .. })));

    locker.client().unwrap().batch_execute("ROLLBACK").await.unwrap();

    let client = bulk_copy.connection().client().unwrap();
    assert_eq!(replication_role(client).await, "origin");
    assert_eq!(count(client, &table).await, 0);

    let mut bulk_copy = BulkCopy::<Score, _>::new(bulk_copy.into_connection(), table.as_str());
    assert_eq!(bulk_copy.transfer(&scores()).await.unwrap(), 2);

    let client = bulk_copy.connection().client().unwrap();
    assert_eq!(count(client, &audit).await, 2);

    client.batch_execute(&drop_tables_sql(&table)).await.unwrap();
    locker.close().await;
}
