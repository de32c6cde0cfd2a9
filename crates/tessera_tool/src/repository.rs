//! Provider repository: registration, registry injection, and dispatch.
//!
//! # Usage
//!
//! ```ignore
//! let registry = Arc::new(ContextRegistry::with_request(
//!     Request::new().with_provider("project").with_action("create"),
//! ));
//!
//! let mut repository = ProviderRepository::new();
//! repository.add_provider(ProjectProvider::default())?;
//! repository.process(registry.clone());
//!
//! repository.dispatch_request()?;
//! println!("{}", registry.response());
//! ```

use core::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use crate::error::ProviderError;
use crate::provider::Provider;
use crate::registry::Registry;

/// Registered providers, addressable by name.
///
/// Providers are kept in registration order. Once [`process`](Self::process)
/// has run, providers added later receive the same registry on insertion.
#[derive(Default)]
pub struct ProviderRepository {
    providers: IndexMap<String, Box<dyn Provider>>,
    registry: Option<Arc<dyn Registry>>,
}

impl fmt::Debug for ProviderRepository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderRepository")
            .field("providers", &self.names())
            .field("processed", &self.registry.is_some())
            .finish()
    }
}

impl ProviderRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self {
            providers: IndexMap::new(),
            registry: None,
        }
    }

    /// Adds a provider.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::DuplicateProvider`] if the name is taken.
    pub fn add_provider(&mut self, provider: impl Provider) -> Result<&mut Self, ProviderError> {
        let name = provider.name().to_owned();
        if self.providers.contains_key(&name) {
            return Err(ProviderError::DuplicateProvider(name));
        }

        let mut provider: Box<dyn Provider> = Box::new(provider);
        if let Some(registry) = &self.registry {
            inject(provider.as_mut(), registry);
        }

        tracing::debug!(provider = %name, "provider added");
        self.providers.insert(name, provider);
        Ok(self)
    }

    /// Injects `registry` into every provider that accepts one.
    pub fn process(&mut self, registry: Arc<dyn Registry>) -> &mut Self {
        for provider in self.providers.values_mut() {
            inject(provider.as_mut(), &registry);
        }
        tracing::debug!(providers = self.providers.len(), "registry injected");
        self.registry = Some(registry);
        self
    }

    /// The registry injected by [`process`](Self::process), if any.
    #[must_use]
    pub fn registry(&self) -> Option<&Arc<dyn Registry>> {
        self.registry.as_ref()
    }

    /// Returns a provider by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&dyn Provider> {
        self.providers.get(name).map(AsRef::as_ref)
    }

    /// Returns whether a provider with the given name is registered.
    #[must_use]
    pub fn has(&self, name: &str) -> bool {
        self.providers.contains_key(name)
    }

    /// Returns provider names in registration order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.providers.keys().map(String::as_str).collect()
    }

    /// Number of registered providers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.providers.len()
    }

    /// Returns `true` if no providers are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }

    /// Runs `action` on the named provider.
    ///
    /// A failure is also recorded on the registry's response, when a registry
    /// has been injected.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider or action is unknown, or the action fails.
    pub fn dispatch(&self, provider: &str, action: &str) -> Result<(), ProviderError> {
        let target = self
            .providers
            .get(provider)
            .ok_or_else(|| ProviderError::UnknownProvider(provider.to_owned()))?;

        if !target.actions().contains(&action) {
            return Err(ProviderError::UnknownAction {
                provider: provider.to_owned(),
                action: action.to_owned(),
            });
        }

        tracing::debug!(provider, action, "dispatching");
        target.execute(action).inspect_err(|err| {
            tracing::warn!(provider, action, error = %err, "action failed");
            if let Some(registry) = &self.registry {
                registry.response().set_error(err.to_string());
            }
        })
    }

    /// Dispatches the provider and action named by the registry's request.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::RegistryMissing`] before [`process`](Self::process),
    /// [`ProviderError::IncompleteRequest`] if the request lacks a provider or
    /// action, and otherwise whatever [`dispatch`](Self::dispatch) returns.
    pub fn dispatch_request(&self) -> Result<(), ProviderError> {
        let registry = self.registry.as_ref().ok_or(ProviderError::RegistryMissing)?;
        let request = registry.request();

        let provider = request
            .provider_name()
            .ok_or(ProviderError::IncompleteRequest("provider"))?;
        let action = request
            .action_name()
            .ok_or(ProviderError::IncompleteRequest("action"))?;

        self.dispatch(provider, action)
    }
}

fn inject(provider: &mut (dyn Provider + 'static), registry: &Arc<dyn Registry>) {
    if let Some(enabled) = provider.as_registry_enabled() {
        enabled.set_registry(Arc::clone(registry));
    }
}
