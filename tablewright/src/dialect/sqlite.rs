//! SQLite dialect.

use super::{quote_with, render_create_table, DialectGenerator, DialectRules, SqlType};
use crate::{
    error::Result,
    model::{AutoIncrement, ColumnModel, TableModel},
    types::TypeTag,
};

/// SQLite caps strings and blobs at `SQLITE_MAX_LENGTH`.
const MAX_LENGTH: u32 = 1_000_000_000;

/// SQLite dialect implementation.
///
/// Row versions are emulated with a nullable `BLOB`, and `AUTOINCREMENT` is
/// only valid as part of an inline integer `PRIMARY KEY`.
#[derive(Debug, Clone, Default)]
pub struct SqliteDialect;

impl SqliteDialect {
    /// Create a new SQLite dialect instance.
    pub fn new() -> Self {
        Self
    }
}

impl DialectRules for SqliteDialect {
    const NAME: &'static str = "Sqlite";

    fn quote_ident(&self, name: &str) -> String {
        quote_with(name, '[', ']')
    }

    fn sql_type(&self, tag: TypeTag) -> Option<SqlType> {
        let ty = match tag {
            TypeTag::Int8
            | TypeTag::Int16
            | TypeTag::Int32
            | TypeTag::Int64
            | TypeTag::UInt8
            | TypeTag::UInt16
            | TypeTag::UInt32
            | TypeTag::UInt64
            | TypeTag::Bool => SqlType::Plain("INTEGER"),
            TypeTag::Float32 | TypeTag::Float64 => SqlType::Plain("REAL"),
            TypeTag::Decimal | TypeTag::VarNumeric => SqlType::Plain("NUMERIC"),
            TypeTag::String => SqlType::Sized {
                template: "NVARCHAR(@size)",
                unspecified: "TEXT",
                unbounded: "TEXT",
                max_inline: MAX_LENGTH,
                key_default: "TEXT",
                max_key: MAX_LENGTH,
            },
            TypeTag::FixedChar => SqlType::Sized {
                template: "NCHAR(@size)",
                unspecified: "TEXT",
                unbounded: "TEXT",
                max_inline: MAX_LENGTH,
                key_default: "TEXT",
                max_key: MAX_LENGTH,
            },
            TypeTag::Guid
            | TypeTag::Date
            | TypeTag::Time
            | TypeTag::DateTime
            | TypeTag::DateTimeWithOffset => SqlType::Plain("TEXT"),
            TypeTag::Binary | TypeTag::RowVersion => SqlType::Plain("BLOB"),
        };
        Some(ty)
    }

    fn create_prefix(&self, quoted_table: &str) -> String {
        format!("CREATE TABLE IF NOT EXISTS {}", quoted_table)
    }

    fn primary_key_clause(&self, column: &ColumnModel) -> String {
        match column.auto_increment {
            Some(_) => "PRIMARY KEY AUTOINCREMENT".to_string(),
            None => "PRIMARY KEY".to_string(),
        }
    }

    fn auto_increment_clause(
        &self,
        table: &TableModel,
        column: &ColumnModel,
        increment: AutoIncrement,
        inline_key: bool,
    ) -> Option<String> {
        if !inline_key {
            log::warn!(
                "Sqlite only auto-increments a single-column primary key; ignoring it on `{}`.`{}`",
                table.name,
                column.name
            );
        } else if increment != AutoIncrement::default() {
            log::warn!(
                "Sqlite has no identity seed or step; `{}`.`{}` starts at 1 and increments by 1",
                table.name,
                column.name
            );
        }
        None
    }
}

impl DialectGenerator for SqliteDialect {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn generate_into(&self, out: &mut String, table: &TableModel) -> Result<()> {
        render_create_table(self, out, table)
    }
}
