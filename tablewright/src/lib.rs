//! # tablewright
//!
//! Describe tables once, emit `CREATE TABLE` for SQL Server, MySQL and SQLite.
//!
//! - [`SchemaBuilder`] declares tables from [`Entity`] types, seeding each
//!   column from `#[schema(...)]` markers and letting fluent calls override them.
//! - [`SqlServerDialect`], [`MySqlDialect`] and [`SqliteDialect`] turn a
//!   [`TableModel`] into one statement each; [`SchemaCompiler`] runs one over
//!   every declared table.
//! - [`ProviderBinder`] binds a driver supplied at runtime through the
//!   capabilities it chooses to expose, and memoizes what it produces.
//!
//! ## Example
//!
//! ```rust,ignore
//! use tablewright::{Backend, Entity, SchemaBuilder, SchemaCompiler};
//!
//! #[derive(Entity)]
//! struct User {
//!     #[schema(key)]
//!     id: i32,
//!     #[schema(max_length = 128)]
//!     email: String,
//! }
//!
//! let mut schema = SchemaBuilder::new();
//! let users = schema.define_table::<User>();
//! schema.with_column(users, user_fields::ID, |c| { c.auto_increment(1, 1); })?;
//! schema.with_column(users, user_fields::EMAIL, |c| { c.unique().allow_null(false); })?;
//!
//! let ddl = SchemaCompiler::new(Backend::Sqlite.generator()).compile(schema.tables())?;
//! ```

pub mod builder;
pub mod compiler;
pub mod database;
pub mod dialect;
pub mod error;
pub mod migration;
pub mod model;
pub mod provider;
pub mod types;

pub use builder::{ColumnBuilder, ColumnHandle, Field, Naming, SchemaBuilder, Selection, Selector, TableHandle};
pub use compiler::SchemaCompiler;
pub use database::{Database, SqlxProvider, SqlxProviderBuilder};
pub use dialect::{Backend, DialectGenerator, MySqlDialect, SqlServerDialect, SqliteDialect};
pub use error::{BoxError, DeclarationError, Error, Result};
pub use migration::{MigrationReport, Migrator, SchemaExecutor};
pub use model::{AutoIncrement, ColumnModel, Entity, FieldMeta, TableModel};
pub use provider::{
    AsyncFactory, Capability, CapabilityKind, CapabilityName, CapabilitySet, DriverProvider, ProviderBinder,
    SyncFactory,
};
pub use types::{ColumnType, TypeTag};

pub use tablewright_macro::Entity;
