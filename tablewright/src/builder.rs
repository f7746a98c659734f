//! # Schema Builder
//!
//! Fluent construction of [`TableModel`]s from [`Entity`] types.
//!
//! Columns are declared through a selector: a typed [`Field`] constant (as
//! generated by `#[derive(Entity)]`), an explicit `(name, TypeTag)` pair, or a
//! string expression of the form `member` or `member as <type>`. Declarative
//! markers on the entity seed every column first; the `configure` closure runs
//! afterwards, so fluent calls always win.

// ============================================================================
// External Crate Imports
// ============================================================================

use heck::{ToLowerCamelCase, ToSnakeCase, ToUpperCamelCase};
use log::debug;
use std::marker::PhantomData;

// ============================================================================
// Internal Crate Imports
// ============================================================================

use crate::{
    error::DeclarationError,
    model::{AutoIncrement, ColumnModel, Entity, FieldMeta, TableModel},
    types::{ColumnType, TypeTag},
};

// ============================================================================
// Naming Convention
// ============================================================================

/// Convention applied to table and column names derived from Rust identifiers.
///
/// Explicit names (markers, `define_table_as`, `ColumnBuilder::name`) are
/// never rewritten.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Naming {
    #[default]
    AsDeclared,
    SnakeCase,
    PascalCase,
    CamelCase,
}

impl Naming {
    pub fn apply(&self, identifier: &str) -> String {
        let identifier = identifier.strip_prefix("r#").unwrap_or(identifier);
        match self {
            Naming::AsDeclared => identifier.to_string(),
            Naming::SnakeCase => identifier.to_snake_case(),
            Naming::PascalCase => identifier.to_upper_camel_case(),
            Naming::CamelCase => identifier.to_lower_camel_case(),
        }
    }
}

// ============================================================================
// Selectors
// ============================================================================

/// Typed accessor for one member of entity `E` whose value type is `T`.
///
/// `#[derive(Entity)]` emits one constant per field in a `<entity>_fields`
/// module.
pub struct Field<E, T> {
    member: &'static str,
    _marker: PhantomData<fn() -> (E, T)>,
}

impl<E, T> Field<E, T> {
    pub const fn new(member: &'static str) -> Self {
        Self { member, _marker: PhantomData }
    }

    pub const fn member(&self) -> &'static str {
        self.member
    }

    /// Reinterprets the member as `U`, overriding the captured column type.
    pub fn cast<U: ColumnType>(self) -> Field<E, U> {
        Field::new(self.member)
    }
}

impl<E, T> Clone for Field<E, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<E, T> Copy for Field<E, T> {}

impl<E, T> std::fmt::Debug for Field<E, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Field").field(&self.member).finish()
    }
}

/// The member and logical type a selector resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub member: String,
    pub logical_type: TypeTag,
}

/// Anything that identifies a member of `E` and its column type.
pub trait Selector<E: Entity> {
    fn select(&self, table: &str) -> Result<Selection, DeclarationError>;
}

impl<E: Entity, T: ColumnType> Selector<E> for Field<E, T> {
    fn select(&self, _table: &str) -> Result<Selection, DeclarationError> {
        Ok(Selection { member: self.member.to_string(), logical_type: T::TAG })
    }
}

impl<E: Entity> Selector<E> for (&str, TypeTag) {
    fn select(&self, _table: &str) -> Result<Selection, DeclarationError> {
        Ok(Selection { member: self.0.to_string(), logical_type: self.1 })
    }
}

impl<E: Entity> Selector<E> for &str {
    fn select(&self, table: &str) -> Result<Selection, DeclarationError> {
        let expression = self.trim();
        let (member, cast) = match expression.split_once(" as ") {
            Some((member, cast)) => (member.trim(), Some(cast.trim())),
            None => (expression, None),
        };

        if !is_member_access(member) || cast.is_some_and(str::is_empty) {
            return Err(DeclarationError::UnsupportedSelector {
                table: table.to_string(),
                selector: expression.to_string(),
            });
        }

        let meta = E::field(member).ok_or_else(|| DeclarationError::UnknownMember {
            entity: E::type_name().to_string(),
            member: member.to_string(),
        })?;

        let logical_type = match cast {
            Some(cast) => TypeTag::from_rust_type(cast).or_else(|_| cast.parse::<TypeTag>())?,
            None => TypeTag::from_rust_type(meta.type_name)?,
        };

        Ok(Selection { member: member.to_string(), logical_type })
    }
}

/// A plain identifier, optionally raw (`r#type`).
fn is_member_access(member: &str) -> bool {
    let ident = member.strip_prefix("r#").unwrap_or(member);
    let mut chars = ident.chars();
    matches!(chars.next(), Some(c) if c.is_alphabetic() || c == '_')
        && chars.all(|c| c.is_alphanumeric() || c == '_')
}

// ============================================================================
// Handles
// ============================================================================

/// A table declared for entity `E`.
pub struct TableHandle<E> {
    index: usize,
    _marker: PhantomData<fn() -> E>,
}

impl<E> Clone for TableHandle<E> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<E> Copy for TableHandle<E> {}

impl<E> std::fmt::Debug for TableHandle<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("TableHandle").field(&self.index).finish()
    }
}

/// A column declared through [`SchemaBuilder::with_column`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnHandle {
    table: usize,
    column: usize,
}

// ============================================================================
// Column Builder
// ============================================================================

/// Fluent configuration of one column. Every method returns the same builder.
pub struct ColumnBuilder<'a> {
    column: &'a mut ColumnModel,
}

impl<'a> ColumnBuilder<'a> {
    /// Adds the column to the primary-key set. Key columns are non-null
    /// unless `allow_null` says otherwise.
    pub fn primary_key(&mut self) -> &mut Self {
        self.column.is_primary_key = true;
        if !self.column.nullable_explicit {
            self.column.nullable = false;
        }
        self
    }

    pub fn unique(&mut self) -> &mut Self {
        self.column.is_unique = true;
        self
    }

    pub fn max_length(&mut self, length: u32) -> &mut Self {
        self.column.max_length = Some(length);
        self
    }

    /// Sets a pre-formatted SQL literal, emitted verbatim.
    pub fn default_value(&mut self, literal: impl Into<String>) -> &mut Self {
        self.column.default_value = Some(literal.into());
        self
    }

    pub fn auto_increment(&mut self, seed: i64, step: i64) -> &mut Self {
        self.column.auto_increment = Some(AutoIncrement { seed, step });
        self
    }

    pub fn row_version(&mut self) -> &mut Self {
        self.column.logical_type = TypeTag::RowVersion;
        self
    }

    pub fn allow_null(&mut self, nullable: bool) -> &mut Self {
        self.column.nullable = nullable;
        self.column.nullable_explicit = true;
        self
    }

    pub fn ordinal(&mut self, position: usize) -> &mut Self {
        self.column.ordinal = Some(position);
        self
    }

    /// Overrides the column name.
    pub fn name(&mut self, name: impl Into<String>) -> &mut Self {
        self.column.name = name.into();
        self
    }

    fn apply_markers(&mut self, meta: &FieldMeta) -> &mut Self {
        if let Some(name) = meta.column_name {
            self.name(name);
        }
        if meta.primary_key {
            self.primary_key();
        }
        if meta.unique {
            self.unique();
        }
        if let Some(length) = meta.max_length {
            self.max_length(length);
        }
        if meta.row_version {
            self.row_version();
        }
        self
    }
}

// ============================================================================
// Schema Builder
// ============================================================================

/// Collects table declarations for a single compilation pass.
///
/// # Example
///
/// ```rust,ignore
/// let mut schema = SchemaBuilder::new();
/// let users = schema.define_table::<User>();
/// schema.with_column(users, user_fields::ID, |c| {
///     c.primary_key().auto_increment(1, 1);
/// })?;
/// schema.with_column(users, user_fields::EMAIL, |c| {
///     c.unique().max_length(128).allow_null(false);
/// })?;
/// let tables = schema.build();
/// ```
#[derive(Debug, Default)]
pub struct SchemaBuilder {
    naming: Naming,
    tables: Vec<TableModel>,
}

impl SchemaBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the naming convention for derived names.
    pub fn naming(mut self, naming: Naming) -> Self {
        self.naming = naming;
        self
    }

    /// Declares a table for `E`, named by its marker or derived from the type name.
    ///
    /// Declaring the same entity twice yields two independent tables.
    pub fn define_table<E: Entity>(&mut self) -> TableHandle<E> {
        let name = match E::table_name() {
            Some(name) => name.to_string(),
            None => self.naming.apply(E::type_name()),
        };
        self.push_table(name)
    }

    /// Declares a table for `E` with an explicit name.
    pub fn define_table_as<E: Entity>(&mut self, name: impl Into<String>) -> TableHandle<E> {
        self.push_table(name.into())
    }

    fn push_table<E: Entity>(&mut self, name: String) -> TableHandle<E> {
        debug!("declaring table `{}` for `{}`", name, E::type_name());
        self.tables.push(TableModel::new(name));
        TableHandle { index: self.tables.len() - 1, _marker: PhantomData }
    }

    /// Appends a column selected from `E` and configures it.
    ///
    /// Declarative markers found on the member are applied before `configure`.
    pub fn with_column<E, S>(
        &mut self,
        table: TableHandle<E>,
        selector: S,
        configure: impl FnOnce(&mut ColumnBuilder<'_>),
    ) -> Result<ColumnHandle, DeclarationError>
    where
        E: Entity,
        S: Selector<E>,
    {
        let selection = selector.select(&self.tables[table.index].name)?;
        let meta = E::field(&selection.member);
        self.declare(table.index, selection, meta, configure)
    }

    /// Declares every member of `E` in declaration order, from markers alone.
    pub fn with_entity_columns<E: Entity>(
        &mut self,
        table: TableHandle<E>,
    ) -> Result<Vec<ColumnHandle>, DeclarationError> {
        E::fields()
            .into_iter()
            .map(|meta| {
                let selection = Selection {
                    member: meta.field.to_string(),
                    logical_type: TypeTag::from_rust_type(meta.type_name)?,
                };
                self.declare(table.index, selection, Some(meta), |_| {})
            })
            .collect()
    }

    /// Re-opens a declared column, e.g. to set its ordinal later.
    pub fn configure(
        &mut self,
        handle: ColumnHandle,
        configure: impl FnOnce(&mut ColumnBuilder<'_>),
    ) -> Result<(), DeclarationError> {
        let table = &mut self.tables[handle.table];
        let mut column = table.columns[handle.column].clone();
        configure(&mut ColumnBuilder { column: &mut column });

        ensure_unique_name(table, &column.name, Some(handle.column))?;
        table.columns[handle.column] = column;
        Ok(())
    }

    fn declare(
        &mut self,
        table_index: usize,
        selection: Selection,
        meta: Option<FieldMeta>,
        configure: impl FnOnce(&mut ColumnBuilder<'_>),
    ) -> Result<ColumnHandle, DeclarationError> {
        let mut column = ColumnModel::new(self.naming.apply(&selection.member), selection.logical_type);
        {
            let mut builder = ColumnBuilder { column: &mut column };
            if let Some(meta) = &meta {
                builder.apply_markers(meta);
            }
            configure(&mut builder);
        }

        let table = &mut self.tables[table_index];
        ensure_unique_name(table, &column.name, None)?;
        table.columns.push(column);
        Ok(ColumnHandle { table: table_index, column: table.columns.len() - 1 })
    }

    pub fn table<E>(&self, handle: TableHandle<E>) -> &TableModel {
        &self.tables[handle.index]
    }

    pub fn column(&self, handle: ColumnHandle) -> &ColumnModel {
        &self.tables[handle.table].columns[handle.column]
    }

    /// Declared tables, in declaration order.
    pub fn tables(&self) -> &[TableModel] {
        &self.tables
    }

    pub fn build(self) -> Vec<TableModel> {
        self.tables
    }
}

fn ensure_unique_name(table: &TableModel, name: &str, skip: Option<usize>) -> Result<(), DeclarationError> {
    let clash = table
        .columns
        .iter()
        .enumerate()
        .any(|(index, col)| Some(index) != skip && col.name.eq_ignore_ascii_case(name));

    if clash {
        return Err(DeclarationError::DuplicateColumn { table: table.name.clone(), column: name.to_string() });
    }
    Ok(())
}
