//! A signal subscription wrapping a lazily validated callback.

use core::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;

use crate::callback::{Callback, CallbackRef, Target};
use crate::error::InvalidCallback;
use crate::symbol::SymbolTable;

/// Handler for a signal, event, or filter chain.
///
/// Holds the signal name and a [`CallbackRef`]. The reference is validated on
/// first use and the resolved [`Callback`] is memoized; later calls reuse it
/// without touching the [`SymbolTable`] again. When resolution instantiates a
/// class, the stored reference is replaced by the instance, so the class is
/// constructed once per handler.
///
/// A failed validation caches nothing and can be retried, for instance after
/// the missing symbol has been registered.
///
/// # Thread Safety
///
/// Validation runs under a lock. Concurrent first calls resolve once and all
/// observe the same callback. Invocation happens outside the lock.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use serde_json::{Value, json};
/// use tessera_signal::{Class, SignalHandler, SymbolTable};
///
/// let symbols = Arc::new(SymbolTable::new());
/// symbols.register_class(
///     Class::builder("Logger", || ())
///         .static_method("write", |args: &[Value]| json!(format!("logged {}", args[0])))
///         .build(),
/// )?;
///
/// let handler = SignalHandler::with_method(Arc::clone(&symbols), "save", "Logger", "write");
///
/// let callback = handler.callback()?;
/// assert_eq!(callback.as_static_pair(), Some(("Logger", "write")));
/// assert_eq!(handler.call(&[json!(1)])?, json!("logged 1"));
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct SignalHandler {
    signal: String,
    symbols: Arc<SymbolTable>,
    state: Mutex<HandlerState>,
}

struct HandlerState {
    callback: CallbackRef,
    resolved: Option<Callback>,
}

impl SignalHandler {
    /// Creates a handler from a single callback reference.
    pub fn new(
        symbols: Arc<SymbolTable>,
        signal: impl Into<String>,
        callback: impl Into<CallbackRef>,
    ) -> Self {
        Self {
            signal: signal.into(),
            symbols,
            state: Mutex::new(HandlerState {
                callback: callback.into(),
                resolved: None,
            }),
        }
    }

    /// Creates a handler calling `method` on `target`.
    pub fn with_method(
        symbols: Arc<SymbolTable>,
        signal: impl Into<String>,
        target: impl Into<Target>,
        method: impl Into<String>,
    ) -> Self {
        Self::new(symbols, signal, CallbackRef::method(target, method))
    }

    /// Returns the signal this handler is subscribed to.
    #[must_use]
    pub fn signal(&self) -> &str {
        &self.signal
    }

    /// Returns `true` once the callback has been validated.
    #[must_use]
    pub fn is_validated(&self) -> bool {
        self.state.lock().resolved.is_some()
    }

    /// Returns the currently stored reference.
    ///
    /// After validation this reflects any replacement made, e.g. a class name
    /// swapped for its instance.
    #[must_use]
    pub fn callback_ref(&self) -> CallbackRef {
        self.state.lock().callback.clone()
    }

    /// Returns the validated callback, resolving it on first use.
    ///
    /// The class constructor, if one runs, is called while the handler's lock
    /// is held and must not call back into this handler.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidCallback`] if the reference cannot be resolved.
    pub fn callback(&self) -> Result<Callback, InvalidCallback> {
        let mut state = self.state.lock();
        if let Some(resolved) = &state.resolved {
            return Ok(resolved.clone());
        }

        let resolved = state.callback.resolve(&self.symbols).inspect_err(|err| {
            tracing::debug!(signal = %self.signal, error = %err, "callback validation failed");
        })?;

        tracing::debug!(
            signal = %self.signal,
            kind = resolved.kind().label(),
            "callback validated"
        );

        state.callback = resolved.to_ref();
        state.resolved = Some(resolved.clone());
        Ok(resolved)
    }

    /// Invokes the callback with `args`, validating it first if needed.
    ///
    /// The callback's result is returned unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidCallback`] if the reference cannot be resolved.
    pub fn call(&self, args: &[Value]) -> Result<Value, InvalidCallback> {
        let callback = self.callback()?;
        tracing::trace!(signal = %self.signal, argc = args.len(), "invoking callback");
        Ok(callback.invoke(args))
    }
}

impl fmt::Debug for SignalHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.lock();
        f.debug_struct("SignalHandler")
            .field("signal", &self.signal)
            .field("callback", &state.callback)
            .field("validated", &state.resolved.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbol::Class;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn signal_is_preserved() {
        let handler = SignalHandler::new(Arc::new(SymbolTable::new()), "save", "anything");
        assert_eq!(handler.signal(), "save");
        assert!(!handler.is_validated());
    }

    #[test]
    fn failed_validation_can_be_retried() {
        let symbols = Arc::new(SymbolTable::new());
        let handler = SignalHandler::new(Arc::clone(&symbols), "save", "late");

        let err = handler.callback().unwrap_err();
        assert_eq!(err, InvalidCallback::NotFunctionOrClass("late".into()));
        assert!(!handler.is_validated());

        symbols
            .register_function("late", |_: &[Value]| json!("finally"))
            .unwrap();

        assert_eq!(handler.call(&[]).unwrap(), json!("finally"));
        assert!(handler.is_validated());
    }

    #[test]
    fn validation_replaces_class_name_with_instance() {
        let symbols = Arc::new(SymbolTable::new());
        symbols
            .register_class(
                Class::builder("Once", || ())
                    .invokable(|_: &(), _: &[Value]| json!("invoked"))
                    .build(),
            )
            .unwrap();
        let handler = SignalHandler::new(Arc::clone(&symbols), "tick", "Once");

        let first = handler.callback().unwrap();
        let second = handler.callback().unwrap();

        assert!(first.ptr_eq(&second));
        assert!(matches!(handler.callback_ref(), CallbackRef::Object(_)));
    }

    #[test]
    fn concurrent_validation_instantiates_once() {
        let constructed = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&constructed);
        let symbols = Arc::new(SymbolTable::new());
        symbols
            .register_class(
                Class::builder("Worker", move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                })
                .method("work", |_: &(), _: &[Value]| json!("done"))
                .build(),
            )
            .unwrap();

        let handler = Arc::new(SignalHandler::with_method(symbols, "job", "Worker", "work"));

        std::thread::scope(|scope| {
            for _ in 0..8 {
                let handler = Arc::clone(&handler);
                scope.spawn(move || {
                    assert_eq!(handler.call(&[]).unwrap(), json!("done"));
                });
            }
        });

        assert_eq!(constructed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn debug_shows_validation_state() {
        let handler = SignalHandler::new(
            Arc::new(SymbolTable::new()),
            "save",
            CallbackRef::closure(|_: &[Value]| Value::Null),
        );

        assert!(format!("{handler:?}").contains("validated: false"));
        handler.callback().unwrap();
        assert!(format!("{handler:?}").contains("validated: true"));
    }
}
