//! Callback references and their resolved, invocable form.
//!
//! A [`CallbackRef`] is what a subscriber hands over: a name, a closure, an
//! object, or a (target, method) pair. [`CallbackRef::resolve`] turns it into
//! a [`Callback`], which can always be invoked directly.
//!
//! # Resolution Rules
//!
//! | Reference | Outcome |
//! |-----------|---------|
//! | name of a registered function | that function |
//! | `"Class::method"` naming a static method or a static-hook class | the (class, method) pair; nothing instantiated |
//! | name of an invokable class | a fresh instance of the class |
//! | (class, static method) | the pair, unchanged; nothing instantiated |
//! | (class, instance method) | (fresh instance, method) |
//! | (class, undefined method) with a static hook | the pair, unchanged |
//! | (class, undefined method) with only an instance hook | (fresh instance, method) |
//! | (object, method) the object or its class responds to | the pair |
//! | closure, or invokable object | itself |
//!
//! Anything else fails with [`InvalidCallback`].

use core::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::error::InvalidCallback;
use crate::symbol::{Function, MethodKind, NativeFn, Object, SymbolTable};

// ─────────────────────────────────────────────────────────────────────────────
// CallbackRef
// ─────────────────────────────────────────────────────────────────────────────

/// The receiver half of a (target, method) pair.
#[derive(Clone)]
pub enum Target {
    /// A class, addressed by name.
    Class(String),
    /// An existing instance.
    Object(Object),
}

impl From<&str> for Target {
    fn from(name: &str) -> Self {
        Target::Class(name.to_owned())
    }
}

impl From<String> for Target {
    fn from(name: String) -> Self {
        Target::Class(name)
    }
}

impl From<Object> for Target {
    fn from(object: Object) -> Self {
        Target::Object(object)
    }
}

impl fmt::Debug for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Class(name) => f.debug_tuple("Class").field(name).finish(),
            Target::Object(object) => f.debug_tuple("Object").field(object).finish(),
        }
    }
}

/// An unresolved callback, as supplied by a subscriber.
#[derive(Clone)]
pub enum CallbackRef {
    /// A function name, class name, or `"Class::method"` static reference.
    Name(String),
    /// An anonymous callable.
    Closure(NativeFn),
    /// An object expected to have a call operator.
    Object(Object),
    /// A method on a class or on an object.
    Method {
        /// The receiver.
        target: Target,
        /// The method name.
        method: String,
    },
}

impl CallbackRef {
    /// Wraps a closure.
    pub fn closure(func: impl Fn(&[Value]) -> Value + Send + Sync + 'static) -> Self {
        CallbackRef::Closure(Arc::new(func))
    }

    /// Builds a (target, method) pair.
    pub fn method(target: impl Into<Target>, method: impl Into<String>) -> Self {
        CallbackRef::Method {
            target: target.into(),
            method: method.into(),
        }
    }

    /// Returns the (class, method) names if this is a pair on a class name.
    #[must_use]
    pub fn as_class_pair(&self) -> Option<(&str, &str)> {
        match self {
            CallbackRef::Method {
                target: Target::Class(class),
                method,
            } => Some((class.as_str(), method.as_str())),
            _ => None,
        }
    }

    /// Resolves the reference against `symbols`.
    ///
    /// May instantiate a class. Each call resolves from scratch; memoization
    /// is the job of [`SignalHandler`](crate::SignalHandler).
    ///
    /// # Errors
    ///
    /// Returns [`InvalidCallback`] if the reference cannot be made invocable.
    pub fn resolve(&self, symbols: &SymbolTable) -> Result<Callback, InvalidCallback> {
        match self {
            CallbackRef::Name(name) => resolve_name(symbols, name),
            CallbackRef::Closure(func) => Ok(Callback {
                kind: CallbackKind::Closure,
                func: Arc::clone(func),
            }),
            CallbackRef::Object(object) => Callback::invokable(object.clone())
                .ok_or_else(|| InvalidCallback::NotCallable(object.class_name().to_owned())),
            CallbackRef::Method {
                target: Target::Class(class),
                method,
            } => resolve_class_method(symbols, class, method),
            CallbackRef::Method {
                target: Target::Object(object),
                method,
            } => Callback::bound_method(object.clone(), method).ok_or_else(|| {
                InvalidCallback::MethodNotInObject {
                    class: object.class_name().to_owned(),
                    method: method.clone(),
                }
            }),
        }
    }
}

impl From<&str> for CallbackRef {
    fn from(name: &str) -> Self {
        CallbackRef::Name(name.to_owned())
    }
}

impl From<String> for CallbackRef {
    fn from(name: String) -> Self {
        CallbackRef::Name(name)
    }
}

impl From<Object> for CallbackRef {
    fn from(object: Object) -> Self {
        CallbackRef::Object(object)
    }
}

impl From<NativeFn> for CallbackRef {
    fn from(func: NativeFn) -> Self {
        CallbackRef::Closure(func)
    }
}

impl fmt::Debug for CallbackRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallbackRef::Name(name) => f.debug_tuple("Name").field(name).finish(),
            CallbackRef::Closure(_) => f.write_str("Closure"),
            CallbackRef::Object(object) => f.debug_tuple("Object").field(object).finish(),
            CallbackRef::Method { target, method } => f
                .debug_struct("Method")
                .field("target", target)
                .field("method", method)
                .finish(),
        }
    }
}

fn resolve_name(symbols: &SymbolTable, name: &str) -> Result<Callback, InvalidCallback> {
    if let Some(function) = symbols.function(name) {
        return Ok(Callback::function(function));
    }
    if let Some(callback) = resolve_static_name(symbols, name) {
        return Ok(callback);
    }

    let class = symbols
        .class(name)
        .ok_or_else(|| InvalidCallback::NotFunctionOrClass(name.to_owned()))?;

    Callback::invokable(class.instantiate())
        .ok_or_else(|| InvalidCallback::NotInvokable(name.to_owned()))
}

/// Resolves `"Class::method"` when the class can call `method` statically.
fn resolve_static_name(symbols: &SymbolTable, name: &str) -> Option<Callback> {
    let (class_name, method) = name.split_once("::")?;
    let func = symbols.class(class_name)?.bind_static(method)?;
    Some(Callback::static_method(class_name, method, func))
}

fn resolve_class_method(
    symbols: &SymbolTable,
    class_name: &str,
    method: &str,
) -> Result<Callback, InvalidCallback> {
    let class = symbols
        .class(class_name)
        .ok_or_else(|| InvalidCallback::ClassNotFound(class_name.to_owned()))?;

    let instantiate = match class.method_kind(method) {
        Some(MethodKind::Static) => false,
        Some(MethodKind::Instance) => true,
        // The static hook wins over the instance hook when both exist.
        None if class.has_static_hook() => false,
        None if class.has_instance_hook() => true,
        None => {
            return Err(InvalidCallback::MethodNotDefined {
                class: class_name.to_owned(),
                method: method.to_owned(),
            });
        }
    };

    let resolved = if instantiate {
        Callback::bound_method(class.instantiate(), method)
    } else {
        class
            .bind_static(method)
            .map(|func| Callback::static_method(class_name, method, func))
    };

    resolved.ok_or_else(|| InvalidCallback::MethodNotDefined {
        class: class_name.to_owned(),
        method: method.to_owned(),
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Callback
// ─────────────────────────────────────────────────────────────────────────────

/// The shape of a resolved callback.
#[derive(Clone)]
pub enum CallbackKind {
    /// A registered free function.
    Function(Function),
    /// An anonymous callable.
    Closure,
    /// An object with a call operator.
    Invokable(Object),
    /// A static method, still addressed by class name.
    StaticMethod {
        /// Class name.
        class: String,
        /// Method name.
        method: String,
    },
    /// A method bound to an instance.
    BoundMethod {
        /// The receiver.
        object: Object,
        /// Method name.
        method: String,
    },
}

impl CallbackKind {
    /// Short label for logging.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            CallbackKind::Function(_) => "function",
            CallbackKind::Closure => "closure",
            CallbackKind::Invokable(_) => "invokable",
            CallbackKind::StaticMethod { .. } => "static_method",
            CallbackKind::BoundMethod { .. } => "bound_method",
        }
    }
}

impl fmt::Debug for CallbackKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallbackKind::Function(function) => {
                f.debug_tuple("Function").field(&function.name()).finish()
            }
            CallbackKind::Closure => f.write_str("Closure"),
            CallbackKind::Invokable(object) => f.debug_tuple("Invokable").field(object).finish(),
            CallbackKind::StaticMethod { class, method } => f
                .debug_struct("StaticMethod")
                .field("class", class)
                .field("method", method)
                .finish(),
            CallbackKind::BoundMethod { object, method } => f
                .debug_struct("BoundMethod")
                .field("object", object)
                .field("method", method)
                .finish(),
        }
    }
}

/// A directly invocable callback.
///
/// Cloning is cheap and shares the underlying callable and receiver.
#[derive(Clone)]
pub struct Callback {
    kind: CallbackKind,
    func: NativeFn,
}

impl Callback {
    fn function(function: Function) -> Self {
        Self {
            func: function.as_native(),
            kind: CallbackKind::Function(function),
        }
    }

    fn invokable(object: Object) -> Option<Self> {
        Some(Self {
            func: object.invoker()?,
            kind: CallbackKind::Invokable(object),
        })
    }

    fn static_method(class: &str, method: &str, func: NativeFn) -> Self {
        Self {
            kind: CallbackKind::StaticMethod {
                class: class.to_owned(),
                method: method.to_owned(),
            },
            func,
        }
    }

    fn bound_method(object: Object, method: &str) -> Option<Self> {
        Some(Self {
            func: object.bind(method)?,
            kind: CallbackKind::BoundMethod {
                object,
                method: method.to_owned(),
            },
        })
    }

    /// Invokes the callback with an ordered argument list.
    pub fn invoke(&self, args: &[Value]) -> Value {
        (self.func)(args)
    }

    /// Returns the resolved shape.
    #[must_use]
    pub fn kind(&self) -> &CallbackKind {
        &self.kind
    }

    /// Returns the receiver object, for invokables and bound methods.
    #[must_use]
    pub fn object(&self) -> Option<&Object> {
        match &self.kind {
            CallbackKind::Invokable(object) | CallbackKind::BoundMethod { object, .. } => {
                Some(object)
            }
            _ => None,
        }
    }

    /// Returns the (class, method) names of a static method callback.
    #[must_use]
    pub fn as_static_pair(&self) -> Option<(&str, &str)> {
        match &self.kind {
            CallbackKind::StaticMethod { class, method } => Some((class.as_str(), method.as_str())),
            _ => None,
        }
    }

    /// Returns `true` if both callbacks share the same callable.
    #[must_use]
    pub fn ptr_eq(&self, other: &Callback) -> bool {
        Arc::ptr_eq(&self.func, &other.func)
    }

    /// Expresses the callback as a reference that resolves to it again
    /// without further instantiation.
    #[must_use]
    pub fn to_ref(&self) -> CallbackRef {
        match &self.kind {
            CallbackKind::Function(function) => CallbackRef::Name(function.name().to_owned()),
            CallbackKind::Closure => CallbackRef::Closure(Arc::clone(&self.func)),
            CallbackKind::Invokable(object) => CallbackRef::Object(object.clone()),
            CallbackKind::StaticMethod { class, method } => {
                CallbackRef::method(class.as_str(), method.as_str())
            }
            CallbackKind::BoundMethod { object, method } => {
                CallbackRef::method(object.clone(), method.as_str())
            }
        }
    }
}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Callback").field(&self.kind).finish()
    }
}
