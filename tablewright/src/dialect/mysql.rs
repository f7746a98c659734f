//! MySQL dialect.
//!
//! Backtick quoting, native `IF NOT EXISTS`, and `AUTO_INCREMENT` with the
//! seed carried as a table option.

use super::{quote_with, render_create_table, DialectGenerator, DialectRules, SqlType};
use crate::{
    error::Result,
    model::{AutoIncrement, ColumnModel, TableModel},
    types::TypeTag,
};

/// MySQL / MariaDB dialect implementation.
#[derive(Debug, Clone, Default)]
pub struct MySqlDialect;

impl MySqlDialect {
    /// Create a new MySQL dialect instance.
    pub fn new() -> Self {
        Self
    }
}

impl DialectRules for MySqlDialect {
    const NAME: &'static str = "MySql";

    fn quote_ident(&self, name: &str) -> String {
        quote_with(name, '`', '`')
    }

    fn sql_type(&self, tag: TypeTag) -> Option<SqlType> {
        let ty = match tag {
            TypeTag::Int8 => SqlType::Plain("TINYINT"),
            TypeTag::Int16 => SqlType::Plain("SMALLINT"),
            TypeTag::Int32 => SqlType::Plain("INT"),
            TypeTag::Int64 => SqlType::Plain("BIGINT"),
            TypeTag::UInt8 => SqlType::Plain("TINYINT UNSIGNED"),
            TypeTag::UInt16 => SqlType::Plain("SMALLINT UNSIGNED"),
            TypeTag::UInt32 => SqlType::Plain("INT UNSIGNED"),
            TypeTag::UInt64 => SqlType::Plain("BIGINT UNSIGNED"),
            TypeTag::Float32 => SqlType::Plain("FLOAT"),
            TypeTag::Float64 => SqlType::Plain("DOUBLE"),
            TypeTag::Decimal => SqlType::Plain("DECIMAL(18, 2)"),
            TypeTag::VarNumeric => return None,
            TypeTag::Bool => SqlType::Plain("TINYINT(1)"),
            // 65535 byte row limit over 4 byte utf8mb4 characters.
            TypeTag::String => SqlType::Sized {
                template: "VARCHAR(@size)",
                unspecified: "LONGTEXT",
                unbounded: "LONGTEXT",
                max_inline: 16383,
                // 3072 byte index prefix at four bytes per utf8mb4 character.
                key_default: "VARCHAR(255)",
                max_key: 768,
            },
            TypeTag::FixedChar => SqlType::Sized {
                template: "CHAR(@size)",
                unspecified: "CHAR(1)",
                unbounded: "LONGTEXT",
                max_inline: 255,
                key_default: "CHAR(1)",
                max_key: 255,
            },
            TypeTag::Guid => SqlType::Plain("CHAR(36)"),
            TypeTag::Date => SqlType::Plain("DATE"),
            TypeTag::Time => SqlType::Plain("TIME(6)"),
            TypeTag::DateTime => SqlType::Plain("DATETIME(6)"),
            TypeTag::DateTimeWithOffset => SqlType::Plain("TIMESTAMP(6)"),
            TypeTag::Binary => SqlType::Sized {
                template: "VARBINARY(@size)",
                unspecified: "LONGBLOB",
                unbounded: "LONGBLOB",
                max_inline: 65535,
                key_default: "VARBINARY(255)",
                max_key: 3072,
            },
            TypeTag::RowVersion => {
                SqlType::Plain("TIMESTAMP(6) NULL DEFAULT CURRENT_TIMESTAMP(6) ON UPDATE CURRENT_TIMESTAMP(6)")
            }
        };
        Some(ty)
    }

    fn create_prefix(&self, quoted_table: &str) -> String {
        format!("CREATE TABLE IF NOT EXISTS {}", quoted_table)
    }

    fn auto_increment_clause(
        &self,
        table: &TableModel,
        column: &ColumnModel,
        increment: AutoIncrement,
        _inline_key: bool,
    ) -> Option<String> {
        if increment.step != 1 {
            log::warn!(
                "MySql has no per-column increment step; `{}`.`{}` uses the server's auto_increment_increment",
                table.name,
                column.name
            );
        }
        Some("AUTO_INCREMENT".to_string())
    }

    fn table_options(&self, table: &TableModel) -> String {
        table
            .ordered_columns()
            .into_iter()
            .find_map(|c| c.auto_increment)
            .filter(|increment| increment.seed != 1)
            .map(|increment| format!(" AUTO_INCREMENT={}", increment.seed))
            .unwrap_or_default()
    }
}

impl DialectGenerator for MySqlDialect {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn generate_into(&self, out: &mut String, table: &TableModel) -> Result<()> {
        render_create_table(self, out, table)
    }
}
