//! The registry shared between providers, and the context it carries.
//!
//! A [`Registry`] hands providers the current [`Request`] and the
//! [`Response`] they write into. [`ContextRegistry`] is the stock
//! implementation.

use core::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::{Mutex, RwLock};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::ProviderError;

/// Specialty used when a request does not name one.
pub const GLOBAL_SPECIALTY: &str = "_Global";

// ─────────────────────────────────────────────────────────────────────────────
// Request
// ─────────────────────────────────────────────────────────────────────────────

/// What the client asked for: a provider, an action, and parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    provider_name: Option<String>,
    action_name: Option<String>,
    specialty_name: String,
    provider_parameters: IndexMap<String, Value>,
    action_parameters: IndexMap<String, Value>,
    pretend: bool,
    debug: bool,
}

impl Default for Request {
    fn default() -> Self {
        Self {
            provider_name: None,
            action_name: None,
            specialty_name: GLOBAL_SPECIALTY.to_owned(),
            provider_parameters: IndexMap::new(),
            action_parameters: IndexMap::new(),
            pretend: false,
            debug: false,
        }
    }
}

impl Request {
    /// Creates an empty request for the global specialty.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the provider name.
    #[must_use]
    pub fn with_provider(mut self, name: impl Into<String>) -> Self {
        self.provider_name = Some(name.into());
        self
    }

    /// Sets the action name.
    #[must_use]
    pub fn with_action(mut self, name: impl Into<String>) -> Self {
        self.action_name = Some(name.into());
        self
    }

    /// Sets the provider specialty.
    #[must_use]
    pub fn with_specialty(mut self, name: impl Into<String>) -> Self {
        self.specialty_name = name.into();
        self
    }

    /// Adds a provider parameter.
    #[must_use]
    pub fn with_provider_parameter(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.provider_parameters.insert(name.into(), value.into());
        self
    }

    /// Adds an action parameter.
    #[must_use]
    pub fn with_action_parameter(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.action_parameters.insert(name.into(), value.into());
        self
    }

    /// Marks the request as a dry run.
    #[must_use]
    pub fn with_pretend(mut self, pretend: bool) -> Self {
        self.pretend = pretend;
        self
    }

    /// Enables debug output.
    #[must_use]
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// The requested provider, if any.
    #[must_use]
    pub fn provider_name(&self) -> Option<&str> {
        self.provider_name.as_deref()
    }

    /// The requested action, if any.
    #[must_use]
    pub fn action_name(&self) -> Option<&str> {
        self.action_name.as_deref()
    }

    /// The requested specialty.
    #[must_use]
    pub fn specialty_name(&self) -> &str {
        &self.specialty_name
    }

    /// A single provider parameter.
    #[must_use]
    pub fn provider_parameter(&self, name: &str) -> Option<&Value> {
        self.provider_parameters.get(name)
    }

    /// All provider parameters, in insertion order.
    #[must_use]
    pub fn provider_parameters(&self) -> &IndexMap<String, Value> {
        &self.provider_parameters
    }

    /// A single action parameter.
    #[must_use]
    pub fn action_parameter(&self, name: &str) -> Option<&Value> {
        self.action_parameters.get(name)
    }

    /// All action parameters, in insertion order.
    #[must_use]
    pub fn action_parameters(&self) -> &IndexMap<String, Value> {
        &self.action_parameters
    }

    /// Decodes the provider parameters into `T`.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::InvalidParameters`] if they do not match `T`.
    pub fn parameters_as<T: DeserializeOwned>(&self) -> Result<T, ProviderError> {
        let object = self
            .provider_parameters
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect::<serde_json::Map<_, _>>();
        Ok(serde_json::from_value(Value::Object(object))?)
    }

    /// Whether this is a dry run.
    #[must_use]
    pub fn is_pretend(&self) -> bool {
        self.pretend
    }

    /// Whether debug output is requested.
    #[must_use]
    pub fn is_debug(&self) -> bool {
        self.debug
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Response
// ─────────────────────────────────────────────────────────────────────────────

/// Output collected while handling a request.
///
/// Written through `&self`, so providers holding a shared registry can
/// append to it.
#[derive(Default)]
pub struct Response {
    content: Mutex<Vec<String>>,
    error: Mutex<Option<String>>,
}

impl Response {
    /// Creates an empty response.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces all content with `content`.
    pub fn set_content(&self, content: impl Into<String>) -> &Self {
        let mut segments = self.content.lock();
        segments.clear();
        segments.push(content.into());
        self
    }

    /// Appends a content segment.
    pub fn append_content(&self, content: impl Into<String>) -> &Self {
        self.content.lock().push(content.into());
        self
    }

    /// All content, concatenated.
    #[must_use]
    pub fn content(&self) -> String {
        self.content.lock().concat()
    }

    /// Content segments in the order they were written.
    #[must_use]
    pub fn segments(&self) -> Vec<String> {
        self.content.lock().clone()
    }

    /// Records an error.
    pub fn set_error(&self, message: impl Into<String>) -> &Self {
        *self.error.lock() = Some(message.into());
        self
    }

    /// The recorded error, if any.
    #[must_use]
    pub fn error(&self) -> Option<String> {
        self.error.lock().clone()
    }

    /// Whether an error was recorded.
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.error.lock().is_some()
    }

    /// Clears content and error.
    pub fn clear(&self) {
        self.content.lock().clear();
        *self.error.lock() = None;
    }
}

impl fmt::Debug for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Response")
            .field("content", &*self.content.lock())
            .field("error", &*self.error.lock())
            .finish()
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.content())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Registry
// ─────────────────────────────────────────────────────────────────────────────

/// Shared context handed to providers.
pub trait Registry: Send + Sync + 'static {
    /// The request currently being handled.
    fn request(&self) -> Arc<Request>;

    /// The response providers write into.
    fn response(&self) -> &Response;
}

/// Default [`Registry`]: one current request and one response.
#[derive(Default)]
pub struct ContextRegistry {
    request: RwLock<Arc<Request>>,
    response: Response,
}

impl ContextRegistry {
    /// Creates a registry with an empty request.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry for `request`.
    #[must_use]
    pub fn with_request(request: Request) -> Self {
        Self {
            request: RwLock::new(Arc::new(request)),
            response: Response::new(),
        }
    }

    /// Replaces the current request.
    pub fn set_request(&self, request: Request) {
        *self.request.write() = Arc::new(request);
    }
}

impl Registry for ContextRegistry {
    fn request(&self) -> Arc<Request> {
        Arc::clone(&self.request.read())
    }

    fn response(&self) -> &Response {
        &self.response
    }
}

impl fmt::Debug for ContextRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextRegistry")
            .field("request", &*self.request.read())
            .field("response", &self.response)
            .finish()
    }
}
