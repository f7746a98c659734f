//! # Dialect Module
//!
//! `CREATE TABLE` generation for the supported backends (Strategy pattern).
//!
//! Every built-in generator runs the same algorithm, [`render_create_table`],
//! and only supplies the variation points through [`DialectRules`]: identifier
//! quoting, the type table, the create-if-missing idiom, and auto-increment
//! syntax.
//!
//! ## Available Generators
//!
//! - [`SqlServerDialect`]: bracket quoting, `IF OBJECT_ID(...) IS NULL` guard, `IDENTITY(seed,step)`
//! - [`MySqlDialect`]: backtick quoting, `IF NOT EXISTS`, `AUTO_INCREMENT`
//! - [`SqliteDialect`]: bracket quoting, `IF NOT EXISTS`, `AUTOINCREMENT`

mod mysql;
mod sqlite;
mod sqlserver;

pub use mysql::MySqlDialect;
pub use sqlite::SqliteDialect;
pub use sqlserver::SqlServerDialect;

use std::{fmt, sync::Arc};

use crate::{
    error::{Error, Result},
    model::{AutoIncrement, ColumnModel, TableModel},
    types::TypeTag,
};

// ============================================================================
// Public Generator Contract
// ============================================================================

/// Emits one `CREATE TABLE` statement per [`TableModel`].
///
/// Implementations must be pure: the same model always yields the same text.
/// Drivers may supply their own implementation through
/// [`DriverProvider::ddl_generator`](crate::provider::DriverProvider::ddl_generator).
pub trait DialectGenerator: Send + Sync {
    /// Backend name used in diagnostics.
    fn name(&self) -> &str;

    /// Appends the statement for `table` to `out`.
    fn generate_into(&self, out: &mut String, table: &TableModel) -> Result<()>;

    /// Returns the statement for `table`.
    fn generate(&self, table: &TableModel) -> Result<String> {
        let mut out = String::new();
        self.generate_into(&mut out, table)?;
        Ok(out)
    }
}

impl fmt::Debug for dyn DialectGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DialectGenerator").field("name", &self.name()).finish()
    }
}

// ============================================================================
// Backend Enum
// ============================================================================

/// Built-in backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Backend {
    /// SQL Server family
    SqlServer,
    /// MySQL / MariaDB family
    MySql,
    /// SQLite
    Sqlite,
}

impl Backend {
    pub const ALL: [Backend; 3] = [Backend::SqlServer, Backend::MySql, Backend::Sqlite];

    pub fn name(&self) -> &'static str {
        match self {
            Backend::SqlServer => SqlServerDialect::NAME,
            Backend::MySql => MySqlDialect::NAME,
            Backend::Sqlite => SqliteDialect::NAME,
        }
    }

    /// The built-in generator for this backend.
    pub fn generator(&self) -> Arc<dyn DialectGenerator> {
        match self {
            Backend::SqlServer => Arc::new(SqlServerDialect::new()),
            Backend::MySql => Arc::new(MySqlDialect::new()),
            Backend::Sqlite => Arc::new(SqliteDialect::new()),
        }
    }

    /// Matches a declared provider name, ignoring case.
    pub fn from_provider_name(name: &str) -> Option<Self> {
        let name = name.trim().to_ascii_lowercase();
        match name.as_str() {
            "sqlserver" | "sql server" | "mssql" | "tiberius" | "microsoft.data.sqlclient"
            | "system.data.sqlclient" => Some(Backend::SqlServer),
            "mysql" | "mariadb" | "mysqlconnector" | "mysql.data" => Some(Backend::MySql),
            "sqlite" | "sqlite3" | "microsoft.data.sqlite" | "system.data.sqlite" => Some(Backend::Sqlite),
            _ => None,
        }
    }

    /// Detects the backend from a connection URL scheme.
    pub fn from_url(url: &str) -> Option<Self> {
        let scheme = url.split_once(':').map(|(scheme, _)| scheme)?;
        Self::from_provider_name(scheme)
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ============================================================================
// Shared Algorithm
// ============================================================================

/// A dialect's spelling of one logical type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SqlType {
    /// Fixed spelling; `max_length` is ignored.
    Plain(&'static str),
    /// Spelling with an `@size` placeholder.
    Sized {
        template: &'static str,
        /// Used when no length was configured.
        unspecified: &'static str,
        /// Used when the length exceeds `max_inline`.
        unbounded: &'static str,
        max_inline: u32,
        /// Used for a key or unique column with no configured length.
        key_default: &'static str,
        /// Longest length the dialect can index.
        max_key: u32,
    },
}

impl SqlType {
    /// `None` when a `keyed` column is longer than the dialect can index.
    pub(crate) fn render(&self, max_length: Option<u32>, keyed: bool) -> Option<String> {
        let spelling = match *self {
            SqlType::Plain(spelling) => spelling.to_string(),
            SqlType::Sized { template, unspecified, unbounded, max_inline, key_default, max_key } => {
                match max_length {
                    None if keyed => key_default.to_string(),
                    None => unspecified.to_string(),
                    Some(length) if keyed && length > max_key => return None,
                    Some(length) if length > max_inline => unbounded.to_string(),
                    Some(length) => template.replace("@size", &length.to_string()),
                }
            }
        };
        Some(spelling)
    }
}

/// Variation points of [`render_create_table`].
pub(crate) trait DialectRules {
    const NAME: &'static str;

    fn quote_ident(&self, name: &str) -> String;

    /// `None` when the dialect has no analog for `tag`.
    fn sql_type(&self, tag: TypeTag) -> Option<SqlType>;

    /// Everything before the opening parenthesis.
    fn create_prefix(&self, quoted_table: &str) -> String;

    fn primary_key_clause(&self, _column: &ColumnModel) -> String {
        "PRIMARY KEY".to_string()
    }

    /// Column suffix for an auto-increment column. `inline_key` is set when the
    /// column carries the inline `PRIMARY KEY`.
    fn auto_increment_clause(
        &self,
        table: &TableModel,
        column: &ColumnModel,
        increment: AutoIncrement,
        inline_key: bool,
    ) -> Option<String>;

    /// Anything after the closing parenthesis.
    fn table_options(&self, _table: &TableModel) -> String {
        String::new()
    }
}

/// Quotes `name` with `open`/`close`, doubling any embedded `close`.
pub(crate) fn quote_with(name: &str, open: char, close: char) -> String {
    let mut quoted = String::with_capacity(name.len() + 2);
    quoted.push(open);
    for c in name.chars() {
        if c == close {
            quoted.push(close);
        }
        quoted.push(c);
    }
    quoted.push(close);
    quoted
}

fn resolve_type<D: DialectRules>(dialect: &D, table: &TableModel, column: &ColumnModel) -> Result<String> {
    let tag = column.logical_type;
    let ty = dialect
        .sql_type(tag)
        .ok_or_else(|| Error::unsupported_type(D::NAME, &table.name, &column.name, tag.as_str()))?;

    // Key and unique columns end up in an index, which unbounded types cannot join.
    let keyed = column.is_primary_key || column.is_unique;
    ty.render(column.max_length, keyed).ok_or_else(|| {
        let length = column.max_length.unwrap_or_default();
        Error::unsupported_type(D::NAME, &table.name, &column.name, format!("{}({}) as key", tag, length))
    })
}

/// The `CREATE TABLE` algorithm shared by the built-in dialects.
///
/// - A single key column is marked inline; a composite key becomes a
///   trailing `PRIMARY KEY(...)` constraint.
/// - Every non-key unique column is collected into ONE trailing
///   `UNIQUE(...)` constraint, so the tuple is unique rather than each column.
/// - Non-null columns get `DEFAULT` when a default is set, `NOT NULL`
///   otherwise. Row-version columns get neither.
pub(crate) fn render_create_table<D: DialectRules>(dialect: &D, out: &mut String, table: &TableModel) -> Result<()> {
    let columns = table.ordered_columns();
    let keys: Vec<&ColumnModel> = columns.iter().copied().filter(|c| c.is_primary_key).collect();
    let single_key = keys.len() == 1;

    let mut definitions = Vec::with_capacity(columns.len() + 2);
    let mut unique = Vec::new();

    for column in &columns {
        let quoted = dialect.quote_ident(&column.name);
        let mut def = format!("{} {}", quoted, resolve_type(dialect, table, column)?);
        let inline_key = single_key && column.is_primary_key;

        if inline_key {
            def.push(' ');
            def.push_str(&dialect.primary_key_clause(column));
        } else if column.is_unique && !column.is_primary_key {
            unique.push(quoted);
        }

        if !column.nullable && !column.is_row_version() {
            match &column.default_value {
                Some(value) => {
                    def.push_str(" DEFAULT ");
                    def.push_str(value);
                }
                None => def.push_str(" NOT NULL"),
            }
        }

        if let Some(increment) = column.auto_increment {
            if let Some(clause) = dialect.auto_increment_clause(table, column, increment, inline_key) {
                def.push(' ');
                def.push_str(&clause);
            }
        }

        definitions.push(def);
    }

    if keys.len() > 1 {
        let key_columns: Vec<String> = keys.iter().map(|c| dialect.quote_ident(&c.name)).collect();
        definitions.push(format!("PRIMARY KEY({})", key_columns.join(", ")));
    }

    if !unique.is_empty() {
        definitions.push(format!("UNIQUE({})", unique.join(", ")));
    }

    out.push_str(&dialect.create_prefix(&dialect.quote_ident(&table.name)));
    out.push_str(" (");
    out.push_str(&definitions.join(", "));
    out.push(')');
    out.push_str(&dialect.table_options(table));
    Ok(())
}
