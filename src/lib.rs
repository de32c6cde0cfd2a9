//! Signal handlers with lazily resolved callbacks, and registry-aware tool
//! providers.
//!
//! - [`signal`] - symbol table, callback references, signal handlers and emission
//! - [`tool`] - provider contracts, the registry-aware base, provider repository
//! - [`diagnostics`] - tracing subscriber setup
//!
//! # Signals
//!
//! A `save` signal routed to the static `Logger::write`. The pair is kept as
//! is, so `Logger` is never constructed.
//!
//! ```
//! use std::sync::Arc;
//! use serde_json::{Value, json};
//! use tessera::prelude::*;
//!
//! struct Logger;
//!
//! let symbols = Arc::new(SymbolTable::new());
//! symbols.register_class(
//!     Class::builder("Logger", || -> Logger { panic!("Logger must not be constructed") })
//!         .static_method("write", |args: &[Value]| json!(format!("wrote {}", args.len())))
//!         .build(),
//! )?;
//!
//! let signals = Signals::new(symbols);
//! let handler = signals.connect_method("save", "Logger", "write");
//! assert_eq!(handler.callback()?.as_static_pair(), Some(("Logger", "write")));
//!
//! let responses = signals.emit("save", &[json!("a"), json!("b")])?;
//! assert_eq!(responses.first(), Some(&json!("wrote 2")));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Providers
//!
//! A provider reading its action parameter from the shared registry.
//!
//! ```
//! use std::sync::Arc;
//! use serde_json::Value;
//! use tessera::prelude::*;
//!
//! #[derive(Default)]
//! struct Echo {
//!     base: RegistryAware,
//! }
//!
//! impl HasRegistry for Echo {
//!     fn registry_aware(&self) -> &RegistryAware {
//!         &self.base
//!     }
//!     fn registry_aware_mut(&mut self) -> &mut RegistryAware {
//!         &mut self.base
//!     }
//! }
//!
//! impl Provider for Echo {
//!     fn name(&self) -> &str {
//!         "echo"
//!     }
//!     fn actions(&self) -> &[&str] {
//!         &["say"]
//!     }
//!     fn execute(&self, _action: &str) -> Result<(), ProviderError> {
//!         let request = self.base.request()?;
//!         let word = request
//!             .action_parameter("word")
//!             .and_then(Value::as_str)
//!             .unwrap_or("nothing");
//!         self.base.response()?.append_content(word);
//!         Ok(())
//!     }
//!     fn as_registry_enabled(&mut self) -> Option<&mut dyn RegistryEnabled> {
//!         Some(self)
//!     }
//! }
//!
//! let registry = Arc::new(ContextRegistry::with_request(
//!     Request::new()
//!         .with_provider("echo")
//!         .with_action("say")
//!         .with_action_parameter("word", "hi"),
//! ));
//! let mut repository = ProviderRepository::new();
//! repository.add_provider(Echo::default())?;
//! repository.process(registry.clone());
//!
//! repository.dispatch_request()?;
//! assert_eq!(registry.response().content(), "hi");
//! # Ok::<(), ProviderError>(())
//! ```

/// Signal handlers and callback resolution.
pub use tessera_signal as signal;

/// Tool providers and their shared registry.
pub use tessera_tool as tool;

pub mod diagnostics;

/// Re-export all common types for easy access.
pub mod prelude {
    pub use crate::diagnostics::{TracingConfig, TracingFormat};
    pub use tessera_signal::{
        Callback, CallbackKind, CallbackRef, Class, InvalidCallback, Object, SignalHandler,
        Signals, SymbolTable, Target,
    };
    pub use tessera_tool::{
        ContextRegistry, HasRegistry, Provider, ProviderError, ProviderRepository, Registry,
        RegistryAware, RegistryEnabled, Request, Response,
    };
}
