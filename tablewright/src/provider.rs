//! # Provider Module
//!
//! Binds a driver supplied at runtime without requiring it to implement a
//! fixed interface. A driver implements [`DriverProvider`] and overrides only
//! the capability methods it supports; everything else reports absent.
//!
//! [`ProviderBinder`] inspects the driver once, normalizes each capability into a
//! [`Capability`] (sync preferred over async), and memoizes every result with
//! single-flight semantics: concurrent first callers all await one in-flight
//! computation.

// ============================================================================
// External Crate Imports
// ============================================================================

use futures::future::BoxFuture;
use log::debug;
use std::{fmt, sync::Arc};
use tokio::sync::OnceCell;

// ============================================================================
// Internal Crate Imports
// ============================================================================

use crate::{
    dialect::{Backend, DialectGenerator},
    error::{BoxError, Error, Result},
};

// ============================================================================
// Capability Types
// ============================================================================

/// A synchronous factory.
pub type SyncFactory<T> = Arc<dyn Fn() -> std::result::Result<T, BoxError> + Send + Sync>;

/// An asynchronous factory.
pub type AsyncFactory<T> = Arc<dyn Fn() -> BoxFuture<'static, std::result::Result<T, BoxError>> + Send + Sync>;

/// Names of the capabilities a provider may expose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CapabilityName {
    ConnectionFactory,
    OptionsFactory,
    DdlGenerator,
}

impl CapabilityName {
    pub fn as_str(&self) -> &'static str {
        match self {
            CapabilityName::ConnectionFactory => "connectionFactory",
            CapabilityName::OptionsFactory => "optionsFactory",
            CapabilityName::DdlGenerator => "ddlGenerator",
        }
    }
}

impl fmt::Display for CapabilityName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which form of a capability was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapabilityKind {
    Sync,
    Async,
    Absent,
}

/// One capability, resolved to the single form the binder will use.
pub enum Capability<T> {
    Sync(SyncFactory<T>),
    Async(AsyncFactory<T>),
    Absent,
}

impl<T> Capability<T> {
    /// Picks the sync form when both are present.
    pub fn detect(sync: Option<SyncFactory<T>>, asynchronous: Option<AsyncFactory<T>>) -> Self {
        match (sync, asynchronous) {
            (Some(factory), _) => Capability::Sync(factory),
            (None, Some(factory)) => Capability::Async(factory),
            (None, None) => Capability::Absent,
        }
    }

    pub fn kind(&self) -> CapabilityKind {
        match self {
            Capability::Sync(_) => CapabilityKind::Sync,
            Capability::Async(_) => CapabilityKind::Async,
            Capability::Absent => CapabilityKind::Absent,
        }
    }
}

impl<T> Clone for Capability<T> {
    fn clone(&self) -> Self {
        match self {
            Capability::Sync(factory) => Capability::Sync(Arc::clone(factory)),
            Capability::Async(factory) => Capability::Async(Arc::clone(factory)),
            Capability::Absent => Capability::Absent,
        }
    }
}

impl<T> fmt::Debug for Capability<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Capability::{:?}", self.kind())
    }
}

// ============================================================================
// Driver Provider Trait
// ============================================================================

/// A database driver supplied at runtime.
///
/// Every capability method defaults to absent. A driver overrides the sync
/// form, the async form, or both (the sync form wins).
///
/// # Example
///
/// ```rust,ignore
/// struct Pooled { url: String }
///
/// impl DriverProvider for Pooled {
///     type Connection = AnyPool;
///     type Options = String;
///
///     fn provider_name(&self) -> &str { "sqlite" }
///
///     fn options_factory(&self) -> Option<SyncFactory<String>> {
///         let url = self.url.clone();
///         Some(Arc::new(move || Ok(url.clone())))
///     }
/// }
/// ```
pub trait DriverProvider: Send + Sync + 'static {
    type Connection: Clone + Send + Sync + 'static;
    type Options: Clone + Send + Sync + 'static;

    /// Declared name, matched against known backends when no DDL capability exists.
    fn provider_name(&self) -> &str;

    fn connection_factory(&self) -> Option<SyncFactory<Self::Connection>> {
        None
    }

    fn connection_factory_async(&self) -> Option<AsyncFactory<Self::Connection>> {
        None
    }

    fn options_factory(&self) -> Option<SyncFactory<Self::Options>> {
        None
    }

    fn options_factory_async(&self) -> Option<AsyncFactory<Self::Options>> {
        None
    }

    /// A driver-specific DDL builder.
    fn ddl_generator(&self) -> Option<Arc<dyn DialectGenerator>> {
        None
    }
}

/// Snapshot of what a bound provider exposes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapabilitySet {
    pub provider_name: String,
    pub connection_factory: CapabilityKind,
    pub options_factory: CapabilityKind,
    pub ddl_generator: bool,
}

// ============================================================================
// Provider Binder
// ============================================================================

/// Normalized async facade over a [`DriverProvider`].
///
/// Each value is produced at most once per binder. Failures are not cached,
/// so a later call retries.
pub struct ProviderBinder<P: DriverProvider> {
    provider: Arc<P>,
    name: String,
    connection_factory: Capability<P::Connection>,
    options_factory: Capability<P::Options>,
    ddl_capability: Option<Arc<dyn DialectGenerator>>,
    connection: Arc<OnceCell<P::Connection>>,
    options: Arc<OnceCell<P::Options>>,
    generator: OnceCell<Arc<dyn DialectGenerator>>,
}

impl<P: DriverProvider> ProviderBinder<P> {
    pub fn bind(provider: P) -> Self {
        Self::bind_shared(Arc::new(provider))
    }

    /// Detects every capability of `provider` once.
    pub fn bind_shared(provider: Arc<P>) -> Self {
        let binder = Self {
            name: provider.provider_name().to_string(),
            connection_factory: Capability::detect(provider.connection_factory(), provider.connection_factory_async()),
            options_factory: Capability::detect(provider.options_factory(), provider.options_factory_async()),
            ddl_capability: provider.ddl_generator(),
            connection: Arc::new(OnceCell::new()),
            options: Arc::new(OnceCell::new()),
            generator: OnceCell::new(),
            provider,
        };
        debug!("bound provider {:?}", binder.capabilities());
        binder
    }

    pub fn provider(&self) -> &Arc<P> {
        &self.provider
    }

    pub fn provider_name(&self) -> &str {
        &self.name
    }

    pub fn capabilities(&self) -> CapabilitySet {
        CapabilitySet {
            provider_name: self.name.clone(),
            connection_factory: self.connection_factory.kind(),
            options_factory: self.options_factory.kind(),
            ddl_generator: self.ddl_capability.is_some(),
        }
    }

    /// The memoized connection.
    pub async fn connection(&self) -> Result<P::Connection> {
        self.resolve(&self.connection, &self.connection_factory, CapabilityName::ConnectionFactory).await
    }

    /// The memoized connection options.
    pub async fn options(&self) -> Result<P::Options> {
        self.resolve(&self.options, &self.options_factory, CapabilityName::OptionsFactory).await
    }

    /// The provider's own generator, or the built-in dialect matching its name.
    pub async fn ddl_generator(&self) -> Result<Arc<dyn DialectGenerator>> {
        let generator = self
            .generator
            .get_or_try_init(|| async {
                if let Some(generator) = &self.ddl_capability {
                    return Ok(Arc::clone(generator));
                }
                let backend = Backend::from_provider_name(&self.name)
                    .ok_or_else(|| Error::ProviderUnrecognized { provider: self.name.clone() })?;
                debug!("provider `{}` has no DDL generator, using built-in {}", self.name, backend);
                Ok::<_, Error>(backend.generator())
            })
            .await?;
        Ok(Arc::clone(generator))
    }

    /// Initializes `cell` on a detached task, so a caller that stops waiting
    /// never abandons an init in flight and the next caller joins it instead.
    async fn resolve<T>(&self, cell: &Arc<OnceCell<T>>, capability: &Capability<T>, name: CapabilityName) -> Result<T>
    where
        T: Clone + Send + Sync + 'static,
    {
        if let Some(value) = cell.get() {
            return Ok(value.clone());
        }

        let cell = Arc::clone(cell);
        let capability = capability.clone();
        let provider = self.name.clone();
        let task = tokio::spawn(async move {
            cell.get_or_try_init(|| invoke(&provider, &capability, name)).await.cloned()
        });

        match task.await {
            Ok(result) => result,
            Err(join) => Err(Error::provider(&self.name, name.as_str(), Box::new(join))),
        }
    }
}

async fn invoke<T>(provider: &str, capability: &Capability<T>, name: CapabilityName) -> Result<T> {
    match capability {
        Capability::Sync(factory) => factory().map_err(|e| Error::provider(provider, name.as_str(), e)),
        Capability::Async(factory) => factory().await.map_err(|e| Error::provider(provider, name.as_str(), e)),
        Capability::Absent => Err(Error::capability_missing(provider, name.as_str())),
    }
}

impl<P: DriverProvider> fmt::Debug for ProviderBinder<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderBinder")
            .field("capabilities", &self.capabilities())
            .field("connection_ready", &self.connection.initialized())
            .field("options_ready", &self.options.initialized())
            .finish()
    }
}
