//! Signal handlers with lazily resolved callbacks.
//!
//! A subscriber names what should run when a signal fires: a function, an
//! invokable class, a static method, or a method on a class or object. The
//! handler checks that reference the first time it is needed, caches the
//! invocable result, and calls it with an ordered argument list from then on.
//!
//! # Overview
//!
//! - [`SymbolTable`] - named functions and classes, queried in place of reflection
//! - [`CallbackRef`] - the unresolved reference a subscriber supplies
//! - [`Callback`] - the resolved, directly invocable form
//! - [`SignalHandler`] - one subscription; validates once, then memoizes
//! - [`Signals`] - subscriber lists per signal, with emission
//!
//! Arguments and results are [`serde_json::Value`]s.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use serde_json::{Value, json};
//! use tessera_signal::{Class, Signals, SymbolTable};
//!
//! struct Audit;
//!
//! let symbols = Arc::new(SymbolTable::new());
//! symbols.register_class(
//!     Class::builder("Audit", || Audit)
//!         .method("record", |_: &Audit, args: &[Value]| json!(format!("saved {}", args[0])))
//!         .build(),
//! )?;
//!
//! let signals = Signals::new(symbols);
//! let handler = signals.connect_method("save", "Audit", "record");
//!
//! let responses = signals.emit("save", &[json!("doc-1")])?;
//! assert_eq!(responses.first(), Some(&json!("saved \"doc-1\"")));
//! assert!(handler.is_validated());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod callback;
pub mod error;
pub mod handler;
pub mod signals;
pub mod symbol;

pub use callback::{Callback, CallbackKind, CallbackRef, Target};
pub use error::{InvalidCallback, RegistrationError};
pub use handler::SignalHandler;
pub use signals::{ResponseCollection, Signals};
pub use symbol::{Class, ClassBuilder, Function, MethodKind, NativeFn, Object, SymbolTable};
