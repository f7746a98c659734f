//! SQL Server dialect.
//!
//! Bracket quoting, an `OBJECT_ID` existence guard in place of
//! `IF NOT EXISTS`, and `IDENTITY(seed,step)` columns.

use super::{quote_with, render_create_table, DialectGenerator, DialectRules, SqlType};
use crate::{
    error::Result,
    model::{AutoIncrement, ColumnModel, TableModel},
    types::TypeTag,
};

/// Microsoft SQL Server dialect implementation.
#[derive(Debug, Clone, Default)]
pub struct SqlServerDialect;

impl SqlServerDialect {
    /// Create a new SQL Server dialect instance.
    pub fn new() -> Self {
        Self
    }
}

impl DialectRules for SqlServerDialect {
    const NAME: &'static str = "SqlServer";

    fn quote_ident(&self, name: &str) -> String {
        quote_with(name, '[', ']')
    }

    fn sql_type(&self, tag: TypeTag) -> Option<SqlType> {
        let ty = match tag {
            // TINYINT is unsigned on SQL Server, so signed bytes widen.
            TypeTag::Int8 | TypeTag::Int16 => SqlType::Plain("SMALLINT"),
            TypeTag::UInt8 => SqlType::Plain("TINYINT"),
            TypeTag::UInt16 | TypeTag::Int32 => SqlType::Plain("INT"),
            TypeTag::UInt32 | TypeTag::Int64 => SqlType::Plain("BIGINT"),
            TypeTag::UInt64 => SqlType::Plain("DECIMAL(20, 0)"),
            TypeTag::Float32 => SqlType::Plain("REAL"),
            TypeTag::Float64 => SqlType::Plain("FLOAT"),
            TypeTag::Decimal => SqlType::Plain("DECIMAL(18, 2)"),
            TypeTag::VarNumeric => SqlType::Plain("NUMERIC(38, 18)"),
            TypeTag::Bool => SqlType::Plain("BIT"),
            TypeTag::String => SqlType::Sized {
                template: "NVARCHAR(@size)",
                unspecified: "NVARCHAR(MAX)",
                unbounded: "NVARCHAR(MAX)",
                max_inline: 4000,
                key_default: "NVARCHAR(450)",
                max_key: 4000,
            },
            TypeTag::FixedChar => SqlType::Sized {
                template: "NCHAR(@size)",
                unspecified: "NCHAR(1)",
                unbounded: "NVARCHAR(MAX)",
                max_inline: 4000,
                key_default: "NCHAR(1)",
                max_key: 4000,
            },
            TypeTag::Guid => SqlType::Plain("UNIQUEIDENTIFIER"),
            TypeTag::Date => SqlType::Plain("DATE"),
            TypeTag::Time => SqlType::Plain("TIME"),
            TypeTag::DateTime => SqlType::Plain("DATETIME2"),
            TypeTag::DateTimeWithOffset => SqlType::Plain("DATETIMEOFFSET"),
            TypeTag::Binary => SqlType::Sized {
                template: "VARBINARY(@size)",
                unspecified: "VARBINARY(MAX)",
                unbounded: "VARBINARY(MAX)",
                max_inline: 8000,
                key_default: "VARBINARY(900)",
                max_key: 8000,
            },
            TypeTag::RowVersion => SqlType::Plain("ROWVERSION"),
        };
        Some(ty)
    }

    fn create_prefix(&self, quoted_table: &str) -> String {
        format!(
            "IF OBJECT_ID(N'{}', N'U') IS NULL CREATE TABLE {}",
            quoted_table.replace('\'', "''"),
            quoted_table
        )
    }

    fn auto_increment_clause(
        &self,
        _table: &TableModel,
        _column: &ColumnModel,
        increment: AutoIncrement,
        _inline_key: bool,
    ) -> Option<String> {
        Some(format!("IDENTITY({},{})", increment.seed, increment.step))
    }
}

impl DialectGenerator for SqlServerDialect {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn generate_into(&self, out: &mut String, table: &TableModel) -> Result<()> {
        render_create_table(self, out, table)
    }
}
