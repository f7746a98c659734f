use serde::{Deserialize, Serialize};

use crate::types::TypeTag;

// ============================================================================
// Entity Metadata
// ============================================================================

/// Declarative metadata about one field of an entity.
///
/// Populated by `#[derive(Entity)]` from `#[schema(...)]` attributes and used
/// as the initial configuration of a column before fluent overrides run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldMeta {
    /// The struct member name.
    pub field: &'static str,
    /// The declared Rust type, as written in source.
    pub type_name: &'static str,
    /// Column name override (`#[schema(column = "...")]`).
    pub column_name: Option<&'static str>,
    /// `#[schema(key)]`.
    pub primary_key: bool,
    /// `#[schema(unique)]`.
    pub unique: bool,
    /// `#[schema(max_length = n)]`.
    pub max_length: Option<u32>,
    /// `#[schema(row_version)]`.
    pub row_version: bool,
}

impl FieldMeta {
    /// Metadata for a field carrying no markers.
    pub const fn plain(field: &'static str, type_name: &'static str) -> Self {
        Self {
            field,
            type_name,
            column_name: None,
            primary_key: false,
            unique: false,
            max_length: None,
            row_version: false,
        }
    }
}

/// A record type that can be declared as a table.
///
/// This trait is typically implemented via `#[derive(Entity)]`.
///
/// # Example
///
/// ```rust,ignore
/// use tablewright::Entity;
///
/// #[derive(Entity)]
/// #[schema(table = "Users")]
/// struct User {
///     #[schema(key)]
///     id: i32,
///     #[schema(max_length = 128)]
///     email: String,
/// }
/// ```
pub trait Entity {
    /// The Rust type name, used to derive the table name.
    fn type_name() -> &'static str;

    /// Table name override (`#[schema(table = "...")]`).
    fn table_name() -> Option<&'static str> {
        None
    }

    /// Field metadata, in declaration order.
    fn fields() -> Vec<FieldMeta>;

    /// Looks up the metadata of one member.
    fn field(member: &str) -> Option<FieldMeta> {
        Self::fields().into_iter().find(|f| f.field == member)
    }
}

// ============================================================================
// Column & Table Models
// ============================================================================

/// Identity seed and increment of an auto-increment column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoIncrement {
    pub seed: i64,
    pub step: i64,
}

impl Default for AutoIncrement {
    fn default() -> Self {
        Self { seed: 1, step: 1 }
    }
}

/// Dialect-neutral description of one column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnModel {
    pub name: String,
    pub logical_type: TypeTag,
    pub nullable: bool,
    pub is_primary_key: bool,
    /// Ignored by generators when `is_primary_key` is set.
    pub is_unique: bool,
    /// Pre-formatted SQL literal, emitted verbatim.
    pub default_value: Option<String>,
    pub max_length: Option<u32>,
    pub auto_increment: Option<AutoIncrement>,
    /// Explicit position; declaration order applies otherwise.
    pub ordinal: Option<usize>,
    #[serde(skip)]
    pub(crate) nullable_explicit: bool,
}

impl ColumnModel {
    /// A nullable column with no constraints.
    pub fn new(name: impl Into<String>, logical_type: TypeTag) -> Self {
        Self {
            name: name.into(),
            logical_type,
            nullable: true,
            is_primary_key: false,
            is_unique: false,
            default_value: None,
            max_length: None,
            auto_increment: None,
            ordinal: None,
            nullable_explicit: false,
        }
    }

    pub fn is_row_version(&self) -> bool {
        self.logical_type == TypeTag::RowVersion
    }
}

/// Dialect-neutral description of one table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableModel {
    pub name: String,
    /// Columns in declaration order.
    pub columns: Vec<ColumnModel>,
}

impl TableModel {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), columns: Vec::new() }
    }

    /// Columns sorted by explicit ordinal, falling back to declaration index.
    ///
    /// On a tie an explicit ordinal sorts first; otherwise declaration order holds.
    pub fn ordered_columns(&self) -> Vec<&ColumnModel> {
        let mut columns: Vec<(usize, &ColumnModel)> = self.columns.iter().enumerate().collect();
        columns.sort_by_key(|(index, col)| (col.ordinal.unwrap_or(*index), col.ordinal.is_none()));
        columns.into_iter().map(|(_, col)| col).collect()
    }

    /// The primary-key set, in ordinal order. More than one entry is a composite key.
    pub fn primary_key(&self) -> Vec<&ColumnModel> {
        self.ordered_columns().into_iter().filter(|c| c.is_primary_key).collect()
    }

    pub fn column(&self, name: &str) -> Option<&ColumnModel> {
        self.columns.iter().find(|c| c.name.eq_ignore_ascii_case(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> TableModel {
        let mut table = TableModel::new("Orders");
        table.columns.push(ColumnModel::new("Id", TypeTag::Int32));
        table.columns.push(ColumnModel::new("Total", TypeTag::Decimal));
        table.columns.push(ColumnModel::new("Note", TypeTag::String));
        table
    }

    #[test]
    fn test_declaration_order_is_default() {
        let table = table();
        let names: Vec<_> = table.ordered_columns().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["Id", "Total", "Note"]);
    }

    #[test]
    fn test_explicit_ordinal_moves_column() {
        let mut table = table();
        table.columns[2].ordinal = Some(0);
        let names: Vec<_> = table.ordered_columns().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["Note", "Id", "Total"]);
    }

    #[test]
    fn test_primary_key_set_and_lookup() {
        let mut table = table();
        table.columns[0].is_primary_key = true;
        table.columns[1].is_primary_key = true;
        assert_eq!(table.primary_key().len(), 2);
        assert!(table.column("NOTE").is_some());
        assert!(table.column("missing").is_none());
    }
}
