use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::future::BoxFuture;
use sqlx::{any::AnyPoolOptions, AnyPool};
use tablewright::{
    AsyncFactory, Backend, BoxError, Database, DialectGenerator, DriverProvider, Entity, Error, MigrationReport,
    Migrator, ProviderBinder, SchemaBuilder, SchemaExecutor, SqlxProvider, TableModel, TypeTag,
};
use tokio_util::sync::CancellationToken;

#[derive(Entity)]
#[schema(table = "authors")]
struct Author {
    #[schema(key)]
    id: i64,
    #[schema(unique, max_length = 80)]
    name: String,
    bio: Option<String>,
    #[schema(row_version)]
    version: Vec<u8>,
}

#[derive(Entity)]
#[schema(table = "books")]
struct Book {
    #[schema(key)]
    id: i64,
    author_id: i64,
    title: String,
    published_at: Option<DateTime<Utc>>,
}

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn library() -> Vec<TableModel> {
    let mut schema = SchemaBuilder::new();

    let authors = schema.define_table::<Author>();
    schema
        .with_column(authors, author_fields::ID, |c| {
            c.auto_increment(1, 1);
        })
        .unwrap();
    schema
        .with_column(authors, author_fields::NAME, |c| {
            c.allow_null(false);
        })
        .unwrap();
    schema.with_column(authors, author_fields::BIO, |_| {}).unwrap();
    schema.with_column(authors, author_fields::VERSION, |_| {}).unwrap();

    let books = schema.define_table::<Book>();
    schema.with_entity_columns(books).unwrap();
    schema.build()
}

async fn in_memory() -> Result<Database, Error> {
    // One connection, so every statement sees the same in-memory database.
    let provider = SqlxProvider::builder().max_connections(1).build("sqlite::memory:");
    Database::bind(&ProviderBinder::bind(provider)).await
}

#[tokio::test]
async fn test_migrate_sqlite_in_memory() -> Result<(), Box<dyn std::error::Error>> {
    init_logger();
    let db = in_memory().await?;
    assert_eq!(db.generator().name(), "Sqlite");

    let report = db.migrator().register(library()).run().await?;
    assert_eq!(report, MigrationReport::new(2, 0));
    assert!(report.is_complete());

    assert!(db.table_exists("authors").await?);
    assert!(db.table_exists("books").await?);
    assert!(!db.table_exists("publishers").await?);

    assert_eq!(db.table_columns("authors").await?, ["id", "name", "bio", "version"]);
    assert_eq!(db.table_columns("books").await?, ["id", "author_id", "title", "published_at"]);

    // Every statement is create-if-missing, so a second run succeeds.
    let again = db.migrator().register(library()).run().await?;
    assert_eq!(again.executed, 2);

    sqlx::query("INSERT INTO authors (name) VALUES ('Ursula')").execute(db.pool()).await?;
    let duplicate = sqlx::query("INSERT INTO authors (name) VALUES ('Ursula')").execute(db.pool()).await;
    assert!(duplicate.is_err(), "unique constraint should reject the duplicate name");

    Ok(())
}

#[tokio::test]
async fn test_cancelled_migration_runs_nothing() -> Result<(), Box<dyn std::error::Error>> {
    init_logger();
    let db = in_memory().await?;

    let cancel = CancellationToken::new();
    cancel.cancel();

    let report = db.migrator().register(library()).run_until_cancelled(&cancel).await?;
    assert_eq!(report, MigrationReport::new(0, 2));
    assert!(!report.is_complete());
    assert!(!db.table_exists("authors").await?);

    Ok(())
}

/// Records statements instead of executing them.
#[derive(Default)]
struct Recorder {
    statements: Mutex<Vec<String>>,
}

#[async_trait]
impl SchemaExecutor for Recorder {
    async fn execute_ddl(
        &self,
        statements: &[String],
        cancel: &CancellationToken,
    ) -> tablewright::Result<MigrationReport> {
        let mut executed = 0;
        for statement in statements {
            if cancel.is_cancelled() {
                break;
            }
            self.statements.lock().unwrap().push(statement.clone());
            executed += 1;
        }
        Ok(MigrationReport::new(executed, statements.len() - executed))
    }
}

#[tokio::test]
async fn test_migrator_hands_statements_in_order() {
    init_logger();
    let recorder = Recorder::default();

    let migrator = Migrator::new(&recorder, Backend::SqlServer.generator()).register(library());
    let expected = migrator.statements().unwrap();
    let report = migrator.run().await.unwrap();

    assert_eq!(report.executed, 2);
    let recorded = recorder.statements.lock().unwrap().clone();
    assert_eq!(recorded, expected);
    assert!(recorded[0].starts_with("IF OBJECT_ID(N'[authors]', N'U') IS NULL CREATE TABLE [authors]"));
    assert!(recorded[0].contains("[version] ROWVERSION,"));
    assert!(recorded[1].contains("[books]"));
}

#[tokio::test]
async fn test_dialect_error_stops_before_execution() {
    init_logger();
    let recorder = Recorder::default();

    let mut tables = library();
    let mut ledger = TableModel::new("ledger");
    ledger.columns.push(tablewright::ColumnModel::new("amount", TypeTag::VarNumeric));
    tables.push(ledger);

    let err = Migrator::new(&recorder, Backend::MySql.generator()).register(tables).run().await.unwrap_err();
    assert!(matches!(err, Error::UnsupportedType { ref column, .. } if column == "amount"));
    assert!(recorder.statements.lock().unwrap().is_empty());
}

/// An `AnyPool` driver under a name no built-in backend claims.
struct EmbeddedDriver;

impl DriverProvider for EmbeddedDriver {
    type Connection = AnyPool;
    type Options = ();

    fn provider_name(&self) -> &str {
        "duckdb"
    }

    fn connection_factory_async(&self) -> Option<AsyncFactory<AnyPool>> {
        Some(Arc::new(|| -> BoxFuture<'static, Result<AnyPool, BoxError>> {
            Box::pin(async {
                sqlx::any::install_default_drivers();
                Ok(AnyPoolOptions::new().max_connections(1).connect("sqlite::memory:").await?)
            })
        }))
    }

    fn ddl_generator(&self) -> Option<Arc<dyn DialectGenerator>> {
        Some(Backend::Sqlite.generator())
    }
}

#[tokio::test]
async fn test_introspection_names_unrecognized_provider() -> Result<(), Box<dyn std::error::Error>> {
    init_logger();
    let db = Database::bind(&ProviderBinder::bind(EmbeddedDriver)).await?;
    assert_eq!(db.provider_name(), "duckdb");

    // DDL still runs through the provider's own generator.
    let report = db.migrator().register(library()).run().await?;
    assert!(report.is_complete());

    match db.table_exists("authors").await {
        Err(Error::ProviderUnrecognized { provider }) => assert_eq!(provider, "duckdb"),
        other => panic!("unexpected result: {other:?}"),
    }
    assert!(matches!(db.table_columns("authors").await, Err(Error::ProviderUnrecognized { .. })));

    Ok(())
}
