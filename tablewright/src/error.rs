//! Error types for schema declaration, DDL generation and provider binding.

use thiserror::Error;

/// Boxed error returned by driver-supplied factories.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Raised while building the schema, before any dialect is involved.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeclarationError {
    /// Two columns of the same table resolve to the same name (case-insensitive).
    #[error("duplicate column `{column}` on table `{table}`")]
    DuplicateColumn { table: String, column: String },

    /// The selector is neither a direct member access nor a cast member access.
    #[error("unsupported selector `{selector}` on table `{table}`: expected `member` or `member as <type>`")]
    UnsupportedSelector { table: String, selector: String },

    /// The selector names a member the entity does not declare.
    #[error("entity `{entity}` has no member `{member}`")]
    UnknownMember { entity: String, member: String },

    /// The declared field type has no logical column type.
    #[error("unsupported field type `{type_name}`")]
    UnsupportedType { type_name: String },
}

/// Main error type for the crate.
#[derive(Error, Debug)]
pub enum Error {
    /// Schema declaration failed.
    #[error(transparent)]
    Declaration(#[from] DeclarationError),

    /// The table model is valid but the target dialect cannot express one of its types.
    #[error("type `{type_name}` is not supported by the {dialect} dialect (column `{column}` on table `{table}`)")]
    UnsupportedType {
        dialect: String,
        table: String,
        column: String,
        type_name: String,
    },

    /// A required capability has neither a sync nor an async form.
    #[error("provider `{provider}` exposes no `{capability}` capability")]
    CapabilityMissing { provider: String, capability: String },

    /// No DDL capability and the provider name matches no built-in backend.
    #[error("provider `{provider}` has no DDL generator and matches no known backend")]
    ProviderUnrecognized { provider: String },

    /// A capability was present but its factory failed.
    #[error("provider `{provider}` failed to produce `{capability}`: {source}")]
    Provider {
        provider: String,
        capability: String,
        #[source]
        source: BoxError,
    },

    /// Error surfaced by sqlx while executing DDL.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl Error {
    pub(crate) fn unsupported_type(
        dialect: impl Into<String>,
        table: impl Into<String>,
        column: impl Into<String>,
        type_name: impl Into<String>,
    ) -> Self {
        Error::UnsupportedType {
            dialect: dialect.into(),
            table: table.into(),
            column: column.into(),
            type_name: type_name.into(),
        }
    }

    pub(crate) fn capability_missing(provider: impl Into<String>, capability: impl Into<String>) -> Self {
        Error::CapabilityMissing { provider: provider.into(), capability: capability.into() }
    }

    pub(crate) fn provider(provider: impl Into<String>, capability: impl Into<String>, source: BoxError) -> Self {
        Error::Provider { provider: provider.into(), capability: capability.into(), source }
    }
}

/// Result type alias for crate operations.
pub type Result<T> = std::result::Result<T, Error>;
