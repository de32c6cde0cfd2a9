//! Provider contracts and the registry-aware base.
//!
//! Concrete providers embed a [`RegistryAware`] and expose it through
//! [`HasRegistry`]. That gives them [`RegistryEnabled`] for free, so a
//! [`ProviderRepository`](crate::ProviderRepository) can inject the shared
//! registry, and the provider can then read the request and write the
//! response.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use tessera_tool::{
//!     ContextRegistry, HasRegistry, Provider, ProviderError, Registry, RegistryAware,
//!     RegistryEnabled,
//! };
//!
//! #[derive(Default)]
//! struct Version {
//!     base: RegistryAware,
//! }
//!
//! impl HasRegistry for Version {
//!     fn registry_aware(&self) -> &RegistryAware {
//!         &self.base
//!     }
//!     fn registry_aware_mut(&mut self) -> &mut RegistryAware {
//!         &mut self.base
//!     }
//! }
//!
//! impl Provider for Version {
//!     fn name(&self) -> &str {
//!         "version"
//!     }
//!     fn actions(&self) -> &[&str] {
//!         &["show"]
//!     }
//!     fn execute(&self, _action: &str) -> Result<(), ProviderError> {
//!         self.base.response()?.append_content("1.0.0");
//!         Ok(())
//!     }
//! }
//!
//! let registry = Arc::new(ContextRegistry::new());
//! let mut provider = Version::default();
//! provider.set_registry(registry.clone());
//! provider.execute("show")?;
//! assert_eq!(registry.response().content(), "1.0.0");
//! # Ok::<(), ProviderError>(())
//! ```

use core::fmt;
use std::sync::Arc;

use crate::error::ProviderError;
use crate::registry::{Registry, Request, Response};

/// A named unit of tooling exposing actions.
pub trait Provider: Send + Sync + 'static {
    /// The name requests use to address this provider.
    fn name(&self) -> &str;

    /// The actions this provider accepts.
    fn actions(&self) -> &[&str];

    /// Runs `action`.
    ///
    /// # Errors
    ///
    /// Returns a [`ProviderError`] if the action fails.
    fn execute(&self, action: &str) -> Result<(), ProviderError>;

    /// Returns the provider as [`RegistryEnabled`], if it accepts a registry.
    ///
    /// Providers built on [`RegistryAware`] should return `Some(self)`.
    fn as_registry_enabled(&mut self) -> Option<&mut dyn RegistryEnabled> {
        None
    }
}

/// Accepts the shared registry.
pub trait RegistryEnabled {
    /// Stores `registry`, replacing any previous one.
    fn set_registry(&mut self, registry: Arc<dyn Registry>);
}

/// Gives access to an embedded [`RegistryAware`].
pub trait HasRegistry {
    /// The embedded base.
    fn registry_aware(&self) -> &RegistryAware;

    /// The embedded base, mutably.
    fn registry_aware_mut(&mut self) -> &mut RegistryAware;
}

impl<T: HasRegistry> RegistryEnabled for T {
    fn set_registry(&mut self, registry: Arc<dyn Registry>) {
        self.registry_aware_mut().set_registry(registry);
    }
}

/// Base state for providers that read from a shared registry.
///
/// Holds the injected registry; the last one set wins. The registry is
/// shared, not owned.
#[derive(Default, Clone)]
pub struct RegistryAware {
    registry: Option<Arc<dyn Registry>>,
}

impl RegistryAware {
    /// Creates a base with no registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `registry`, replacing any previous one.
    pub fn set_registry(&mut self, registry: Arc<dyn Registry>) -> &mut Self {
        self.registry = Some(registry);
        self
    }

    /// The stored registry, if set.
    #[must_use]
    pub fn registry(&self) -> Option<&Arc<dyn Registry>> {
        self.registry.as_ref()
    }

    /// The registry's current request.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::RegistryMissing`] if no registry was set.
    pub fn request(&self) -> Result<Arc<Request>, ProviderError> {
        Ok(self.require()?.request())
    }

    /// The registry's response.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::RegistryMissing`] if no registry was set.
    pub fn response(&self) -> Result<&Response, ProviderError> {
        Ok(self.require()?.response())
    }

    fn require(&self) -> Result<&Arc<dyn Registry>, ProviderError> {
        self.registry.as_ref().ok_or(ProviderError::RegistryMissing)
    }
}

impl fmt::Debug for RegistryAware {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryAware")
            .field("registry", &self.registry.is_some())
            .finish()
    }
}
