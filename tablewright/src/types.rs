//! # Logical Column Types
//!
//! This module defines [`TypeTag`], the dialect-neutral type of a column, and
//! the two ways a Rust type is mapped onto it: statically through the
//! [`ColumnType`] trait, and at runtime from a declared type name as emitted by
//! `#[derive(Entity)]`.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::error::DeclarationError;

// ============================================================================
// TypeTag
// ============================================================================

/// Abstract database type of a column, independent of any dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeTag {
    Int8,
    Int16,
    Int32,
    Int64,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Float32,
    Float64,
    /// Fixed precision decimal.
    Decimal,
    /// Arbitrary precision numeric.
    VarNumeric,
    Bool,
    /// Variable length character data; honours `max_length`.
    String,
    /// Fixed length character data; honours `max_length`.
    FixedChar,
    Guid,
    Date,
    Time,
    DateTime,
    DateTimeWithOffset,
    /// Variable length binary data; honours `max_length`.
    Binary,
    /// Optimistic-concurrency marker column.
    RowVersion,
}

impl TypeTag {
    /// Every tag, in declaration order.
    pub const ALL: [TypeTag; 22] = [
        TypeTag::Int8,
        TypeTag::Int16,
        TypeTag::Int32,
        TypeTag::Int64,
        TypeTag::UInt8,
        TypeTag::UInt16,
        TypeTag::UInt32,
        TypeTag::UInt64,
        TypeTag::Float32,
        TypeTag::Float64,
        TypeTag::Decimal,
        TypeTag::VarNumeric,
        TypeTag::Bool,
        TypeTag::String,
        TypeTag::FixedChar,
        TypeTag::Guid,
        TypeTag::Date,
        TypeTag::Time,
        TypeTag::DateTime,
        TypeTag::DateTimeWithOffset,
        TypeTag::Binary,
        TypeTag::RowVersion,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TypeTag::Int8 => "Int8",
            TypeTag::Int16 => "Int16",
            TypeTag::Int32 => "Int32",
            TypeTag::Int64 => "Int64",
            TypeTag::UInt8 => "UInt8",
            TypeTag::UInt16 => "UInt16",
            TypeTag::UInt32 => "UInt32",
            TypeTag::UInt64 => "UInt64",
            TypeTag::Float32 => "Float32",
            TypeTag::Float64 => "Float64",
            TypeTag::Decimal => "Decimal",
            TypeTag::VarNumeric => "VarNumeric",
            TypeTag::Bool => "Bool",
            TypeTag::String => "String",
            TypeTag::FixedChar => "FixedChar",
            TypeTag::Guid => "Guid",
            TypeTag::Date => "Date",
            TypeTag::Time => "Time",
            TypeTag::DateTime => "DateTime",
            TypeTag::DateTimeWithOffset => "DateTimeWithOffset",
            TypeTag::Binary => "Binary",
            TypeTag::RowVersion => "RowVersion",
        }
    }

    /// Whether `max_length` has any effect on this type.
    pub fn is_sized(&self) -> bool {
        matches!(self, TypeTag::String | TypeTag::FixedChar | TypeTag::Binary)
    }

    /// Maps a Rust type, written the way it appears in source, to a tag.
    ///
    /// Only the last path segment is inspected, so `chrono::DateTime<Utc>` and
    /// `DateTime<Utc>` resolve identically. `Option<T>` resolves to `T`.
    ///
    /// # Example
    ///
    /// ```rust
    /// use tablewright::TypeTag;
    ///
    /// assert_eq!(TypeTag::from_rust_type("Option<i64>").unwrap(), TypeTag::Int64);
    /// assert_eq!(TypeTag::from_rust_type("Vec < u8 >").unwrap(), TypeTag::Binary);
    /// assert!(TypeTag::from_rust_type("HashMap<String, i32>").is_err());
    /// ```
    pub fn from_rust_type(type_name: &str) -> Result<TypeTag, DeclarationError> {
        let unsupported = || DeclarationError::UnsupportedType { type_name: type_name.trim().to_string() };

        // References and their lifetimes carry no column information.
        let mut referent = type_name.trim();
        if let Some(rest) = referent.strip_prefix('&') {
            referent = rest.trim_start();
            if referent.starts_with('\'') {
                referent = referent.split_once(char::is_whitespace).map_or("", |(_, ty)| ty);
            }
        }

        let compact: String = referent.chars().filter(|c| !c.is_whitespace()).collect();
        let ty = compact.as_str();

        let (path, generic) = match ty.find('<') {
            Some(open) if ty.ends_with('>') => (&ty[..open], Some(&ty[open + 1..ty.len() - 1])),
            Some(_) => return Err(unsupported()),
            None => (ty, None),
        };
        let segment = path.rsplit("::").next().unwrap_or(path);

        let tag = match (segment, generic) {
            ("Option", Some(inner)) => return TypeTag::from_rust_type(inner).map_err(|_| unsupported()),
            ("Vec", Some("u8")) => TypeTag::Binary,
            ("DateTime", Some(_)) | ("DateTime", None) => TypeTag::DateTimeWithOffset,
            (_, Some(_)) => return Err(unsupported()),
            ("i8", None) => TypeTag::Int8,
            ("i16", None) => TypeTag::Int16,
            ("i32", None) => TypeTag::Int32,
            ("i64", None) | ("isize", None) => TypeTag::Int64,
            ("u8", None) => TypeTag::UInt8,
            ("u16", None) => TypeTag::UInt16,
            ("u32", None) => TypeTag::UInt32,
            ("u64", None) | ("usize", None) => TypeTag::UInt64,
            ("f32", None) => TypeTag::Float32,
            ("f64", None) => TypeTag::Float64,
            ("bool", None) => TypeTag::Bool,
            ("char", None) => TypeTag::FixedChar,
            ("String", None) | ("str", None) => TypeTag::String,
            ("Uuid", None) => TypeTag::Guid,
            ("Decimal", None) | ("BigDecimal", None) => TypeTag::Decimal,
            ("NaiveDate", None) => TypeTag::Date,
            ("NaiveTime", None) => TypeTag::Time,
            ("NaiveDateTime", None) => TypeTag::DateTime,
            _ => return Err(unsupported()),
        };
        Ok(tag)
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TypeTag {
    type Err = DeclarationError;

    /// Parses a tag name, ignoring ASCII case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TypeTag::ALL
            .into_iter()
            .find(|tag| tag.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| DeclarationError::UnsupportedType { type_name: s.trim().to_string() })
    }
}

// ============================================================================
// ColumnType
// ============================================================================

/// Rust value types that map statically onto a [`TypeTag`].
///
/// Typed selectors (`Field<E, T>`) require `T: ColumnType`, so an unmappable
/// field type is rejected at compile time on that path.
pub trait ColumnType {
    const TAG: TypeTag;
}

macro_rules! impl_column_type {
    ($($t:ty => $tag:ident),* $(,)?) => {
        $(
            impl ColumnType for $t {
                const TAG: TypeTag = TypeTag::$tag;
            }
        )*
    };
}

impl_column_type!(
    i8 => Int8,
    i16 => Int16,
    i32 => Int32,
    i64 => Int64,
    isize => Int64,
    u8 => UInt8,
    u16 => UInt16,
    u32 => UInt32,
    u64 => UInt64,
    usize => UInt64,
    f32 => Float32,
    f64 => Float64,
    bool => Bool,
    char => FixedChar,
    String => String,
    Vec<u8> => Binary,
    uuid::Uuid => Guid,
    chrono::NaiveDate => Date,
    chrono::NaiveTime => Time,
    chrono::NaiveDateTime => DateTime,
);

impl ColumnType for &str {
    const TAG: TypeTag = TypeTag::String;
}

impl<Tz: chrono::TimeZone> ColumnType for chrono::DateTime<Tz> {
    const TAG: TypeTag = TypeTag::DateTimeWithOffset;
}

impl<T: ColumnType> ColumnType for Option<T> {
    const TAG: TypeTag = T::TAG;
}
