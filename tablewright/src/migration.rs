use async_trait::async_trait;
use log::info;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::{compiler::SchemaCompiler, dialect::DialectGenerator, error::Result, model::TableModel};

/// Outcome of running compiled DDL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MigrationReport {
    /// Statements executed and committed.
    pub executed: usize,
    /// Statements not run because execution was cancelled.
    pub pending: usize,
}

impl MigrationReport {
    pub fn new(executed: usize, pending: usize) -> Self {
        Self { executed, pending }
    }

    pub fn is_complete(&self) -> bool {
        self.pending == 0
    }
}

/// Runs DDL statements against a live connection.
///
/// Implementations execute `statements` in order, within one transaction
/// where the backend allows it, and stop between statements once `cancel`
/// fires. Statements already executed stay committed; every statement is
/// create-if-missing, so a cancelled run can be repeated in full.
#[async_trait]
pub trait SchemaExecutor: Send + Sync {
    async fn execute_ddl(&self, statements: &[String], cancel: &CancellationToken) -> Result<MigrationReport>;
}

/// Schema migration manager.
///
/// Compiles registered tables with one dialect and hands the statements,
/// in declaration order, to a [`SchemaExecutor`].
///
/// # Example
///
/// ```rust,ignore
/// let report = db.migrator()
///     .register(schema.build())
///     .run()
///     .await?;
/// ```
pub struct Migrator<'a> {
    executor: &'a dyn SchemaExecutor,
    compiler: SchemaCompiler,
    tables: Vec<TableModel>,
}

impl<'a> Migrator<'a> {
    pub fn new(executor: &'a dyn SchemaExecutor, generator: Arc<dyn DialectGenerator>) -> Self {
        Self { executor, compiler: SchemaCompiler::new(generator), tables: Vec::new() }
    }

    /// Queues tables for creation, after any already registered.
    pub fn register(mut self, tables: impl IntoIterator<Item = TableModel>) -> Self {
        self.tables.extend(tables);
        self
    }

    /// The statements `run` would execute.
    pub fn statements(&self) -> Result<Vec<String>> {
        self.compiler.compile(&self.tables)
    }

    /// Executes all registered tables.
    pub async fn run(self) -> Result<MigrationReport> {
        self.run_until_cancelled(&CancellationToken::new()).await
    }

    /// Executes registered tables, stopping between statements once `cancel` fires.
    ///
    /// Compilation happens up front, so a dialect error means nothing runs.
    pub async fn run_until_cancelled(self, cancel: &CancellationToken) -> Result<MigrationReport> {
        let statements = self.statements()?;
        info!(
            "[{}] migrating {} tables",
            self.compiler.generator().name(),
            statements.len()
        );
        self.executor.execute_ddl(&statements, cancel).await
    }
}
