//! Signal subscriptions and emission.
//!
//! [`Signals`] keeps, per signal name, the ordered list of
//! [`SignalHandler`]s connected to it. Emitting a signal calls each handler
//! in connection order and gathers the results in a [`ResponseCollection`].
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use serde_json::{Value, json};
//! use tessera_signal::{Signals, SymbolTable};
//!
//! let symbols = Arc::new(SymbolTable::new());
//! symbols.register_function("double", |args: &[Value]| json!(args[0].as_i64().unwrap_or(0) * 2))?;
//!
//! let signals = Signals::new(symbols);
//! signals.connect("compute", "double");
//!
//! let responses = signals.emit("compute", &[json!(21)])?;
//! assert_eq!(responses.last(), Some(&json!(42)));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use core::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;
use serde_json::Value;

use crate::callback::{CallbackRef, Target};
use crate::error::InvalidCallback;
use crate::handler::SignalHandler;
use crate::symbol::SymbolTable;

// ─────────────────────────────────────────────────────────────────────────────
// ResponseCollection
// ─────────────────────────────────────────────────────────────────────────────

/// Results of emitting a signal, in handler order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResponseCollection {
    responses: Vec<Value>,
    stopped: bool,
}

impl ResponseCollection {
    /// Returns `true` if emission was halted before every handler ran.
    #[must_use]
    pub fn stopped(&self) -> bool {
        self.stopped
    }

    /// The first handler's result.
    #[must_use]
    pub fn first(&self) -> Option<&Value> {
        self.responses.first()
    }

    /// The last handler's result.
    #[must_use]
    pub fn last(&self) -> Option<&Value> {
        self.responses.last()
    }

    /// Returns `true` if any handler returned `value`.
    #[must_use]
    pub fn contains(&self, value: &Value) -> bool {
        self.responses.contains(value)
    }

    /// Number of collected results.
    #[must_use]
    pub fn len(&self) -> usize {
        self.responses.len()
    }

    /// Returns `true` if no handler ran.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.responses.is_empty()
    }

    /// Iterates over the results.
    pub fn iter(&self) -> core::slice::Iter<'_, Value> {
        self.responses.iter()
    }

    /// Consumes the collection, returning the results.
    #[must_use]
    pub fn into_vec(self) -> Vec<Value> {
        self.responses
    }
}

impl IntoIterator for ResponseCollection {
    type Item = Value;
    type IntoIter = std::vec::IntoIter<Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.responses.into_iter()
    }
}

impl<'a> IntoIterator for &'a ResponseCollection {
    type Item = &'a Value;
    type IntoIter = core::slice::Iter<'a, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.responses.iter()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Signals
// ─────────────────────────────────────────────────────────────────────────────

/// Subscriber lists keyed by signal name.
///
/// Handlers for a signal run in connection order. Signals are listed in the
/// order they were first connected.
///
/// Emission works on a snapshot of the handler list, so a handler may
/// connect or detach handlers while the signal is being emitted; changes
/// apply from the next emission.
pub struct Signals {
    symbols: Arc<SymbolTable>,
    handlers: RwLock<IndexMap<String, Vec<Arc<SignalHandler>>>>,
}

impl Signals {
    /// Creates an empty set of subscriptions resolving names against `symbols`.
    #[must_use]
    pub fn new(symbols: Arc<SymbolTable>) -> Self {
        Self {
            symbols,
            handlers: RwLock::new(IndexMap::new()),
        }
    }

    /// The symbol table handlers resolve against.
    #[must_use]
    pub fn symbols(&self) -> &Arc<SymbolTable> {
        &self.symbols
    }

    /// Subscribes a callback to `signal`.
    ///
    /// The callback is not validated until the handler is first called.
    pub fn connect(
        &self,
        signal: impl Into<String>,
        callback: impl Into<CallbackRef>,
    ) -> Arc<SignalHandler> {
        let handler = Arc::new(SignalHandler::new(
            Arc::clone(&self.symbols),
            signal,
            callback,
        ));
        self.attach(Arc::clone(&handler));
        handler
    }

    /// Subscribes `method` on `target` to `signal`.
    pub fn connect_method(
        &self,
        signal: impl Into<String>,
        target: impl Into<Target>,
        method: impl Into<String>,
    ) -> Arc<SignalHandler> {
        self.connect(signal, CallbackRef::method(target, method))
    }

    fn attach(&self, handler: Arc<SignalHandler>) {
        tracing::debug!(signal = handler.signal(), "handler connected");
        self.handlers
            .write()
            .entry(handler.signal().to_owned())
            .or_default()
            .push(handler);
    }

    /// Removes a previously connected handler.
    ///
    /// Returns `false` if the handler was not connected here.
    pub fn detach(&self, handler: &Arc<SignalHandler>) -> bool {
        let mut handlers = self.handlers.write();
        let Some(list) = handlers.get_mut(handler.signal()) else {
            return false;
        };
        let Some(index) = list.iter().position(|h| Arc::ptr_eq(h, handler)) else {
            return false;
        };

        list.remove(index);
        if list.is_empty() {
            handlers.shift_remove(handler.signal());
        }
        tracing::debug!(signal = handler.signal(), "handler detached");
        true
    }

    /// Lists signals that have at least one handler.
    #[must_use]
    pub fn signals(&self) -> Vec<String> {
        self.handlers.read().keys().cloned().collect()
    }

    /// Returns the handlers connected to `signal`, in connection order.
    #[must_use]
    pub fn handlers(&self, signal: &str) -> Vec<Arc<SignalHandler>> {
        self.handlers
            .read()
            .get(signal)
            .cloned()
            .unwrap_or_default()
    }

    /// Removes every handler connected to `signal`.
    pub fn clear_handlers(&self, signal: &str) {
        self.handlers.write().shift_remove(signal);
    }

    /// Calls every handler of `signal` with `args`.
    ///
    /// # Errors
    ///
    /// Stops at the first handler whose callback fails validation and
    /// returns its [`InvalidCallback`].
    pub fn emit(&self, signal: &str, args: &[Value]) -> Result<ResponseCollection, InvalidCallback> {
        self.emit_until(signal, args, |_| false)
    }

    /// Calls handlers of `signal` until one returns a value satisfying `until`.
    ///
    /// The matching result is included in the collection, which is then
    /// marked as [`stopped`](ResponseCollection::stopped).
    ///
    /// # Errors
    ///
    /// Stops at the first handler whose callback fails validation and
    /// returns its [`InvalidCallback`].
    pub fn emit_until(
        &self,
        signal: &str,
        args: &[Value],
        until: impl Fn(&Value) -> bool,
    ) -> Result<ResponseCollection, InvalidCallback> {
        let handlers = self.handlers(signal);
        tracing::trace!(signal, handlers = handlers.len(), "emitting signal");

        let mut responses = ResponseCollection::default();
        for handler in handlers {
            let response = handler.call(args)?;
            let halt = until(&response);
            responses.responses.push(response);
            if halt {
                responses.stopped = true;
                break;
            }
        }
        Ok(responses)
    }
}

impl fmt::Debug for Signals {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signals")
            .field("signals", &self.signals())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn signals() -> Signals {
        Signals::new(Arc::new(SymbolTable::new()))
    }

    fn constant(value: Value) -> CallbackRef {
        CallbackRef::closure(move |_: &[Value]| value.clone())
    }

    #[test]
    fn emit_runs_handlers_in_connection_order() {
        let signals = signals();
        signals.connect("save", constant(json!("first")));
        signals.connect("save", constant(json!("second")));
        signals.connect("save", constant(json!("third")));

        let responses = signals.emit("save", &[]).unwrap();

        assert_eq!(
            responses.into_vec(),
            vec![json!("first"), json!("second"), json!("third")]
        );
    }

    #[test]
    fn emit_unknown_signal_is_empty() {
        let responses = signals().emit("nothing", &[]).unwrap();
        assert!(responses.is_empty());
        assert!(!responses.stopped());
    }

    #[test]
    fn emit_until_stops_after_match() {
        let signals = signals();
        signals.connect("find", constant(json!(1)));
        signals.connect("find", constant(json!(2)));
        signals.connect("find", constant(json!(3)));

        let responses = signals
            .emit_until("find", &[], |value| value == &json!(2))
            .unwrap();

        assert!(responses.stopped());
        assert_eq!(responses.len(), 2);
        assert_eq!(responses.last(), Some(&json!(2)));
        assert!(!responses.contains(&json!(3)));
    }

    #[test]
    fn emit_propagates_invalid_callback() {
        let signals = signals();
        signals.connect("save", constant(json!("ok")));
        signals.connect("save", "missing_function");

        let err = signals.emit("save", &[]).unwrap_err();
        assert_eq!(err, InvalidCallback::NotFunctionOrClass("missing_function".into()));
    }

    #[test]
    fn detach_removes_only_that_handler() {
        let signals = signals();
        let keep = signals.connect("save", constant(json!("keep")));
        let removed = signals.connect("save", constant(json!("drop")));

        assert!(signals.detach(&removed));
        assert!(!signals.detach(&removed));

        let handlers = signals.handlers("save");
        assert_eq!(handlers.len(), 1);
        assert!(Arc::ptr_eq(&handlers[0], &keep));
    }

    #[test]
    fn detaching_last_handler_forgets_signal() {
        let signals = signals();
        let handler = signals.connect("save", constant(json!(null)));
        signals.connect("load", constant(json!(null)));

        assert_eq!(signals.signals(), vec!["save".to_string(), "load".to_string()]);
        signals.detach(&handler);
        assert_eq!(signals.signals(), vec!["load".to_string()]);
    }

    #[test]
    fn clear_handlers_empties_signal() {
        let signals = signals();
        signals.connect("save", constant(json!(null)));
        signals.connect("save", constant(json!(null)));

        signals.clear_handlers("save");

        assert!(signals.handlers("save").is_empty());
        assert!(signals.signals().is_empty());
    }

    #[test]
    fn handler_may_connect_during_emit() {
        let signals = Arc::new(signals());
        let inner = Arc::clone(&signals);
        signals.connect(
            "grow",
            CallbackRef::closure(move |_: &[Value]| {
                inner.connect("grow", CallbackRef::closure(|_: &[Value]| json!("late")));
                json!("early")
            }),
        );

        let first = signals.emit("grow", &[]).unwrap();
        assert_eq!(first.len(), 1);
        assert_eq!(signals.handlers("grow").len(), 2);
    }
}
