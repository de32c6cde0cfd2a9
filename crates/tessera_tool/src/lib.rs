//! Tool providers wired to a shared registry.
//!
//! A provider is a named unit of tooling with a set of actions. Providers
//! that need request context embed a [`RegistryAware`] base; the
//! [`ProviderRepository`] injects the shared [`Registry`] into them, and
//! their actions then read the [`Request`] and write the [`Response`].
//!
//! # Architecture
//!
//! - [`Provider`] - trait for named providers with actions
//! - [`RegistryEnabled`] - contract for accepting a registry
//! - [`RegistryAware`] / [`HasRegistry`] - reusable base for registry-enabled providers
//! - [`Registry`] / [`ContextRegistry`] - shared request and response
//! - [`ProviderRepository`] - registration, injection, dispatch

pub mod error;
pub mod provider;
pub mod registry;
pub mod repository;

// Re-export core types at crate root.
pub use error::ProviderError;
pub use provider::{HasRegistry, Provider, RegistryAware, RegistryEnabled};
pub use registry::{ContextRegistry, GLOBAL_SPECIALTY, Registry, Request, Response};
pub use repository::ProviderRepository;
