//! Error types for callback resolution and symbol registration.

use thiserror::Error;

/// A callback reference could not be resolved to something invocable.
///
/// Every resolution failure is reported through this one type; the variant
/// (and its message) identifies the specific cause.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidCallback {
    /// A bare name matched neither a registered function nor a class.
    #[error("provided callback '{0}' is not a function or a class")]
    NotFunctionOrClass(String),

    /// A class name was given as the callback, but its instances have no call operator.
    #[error("class '{0}' provided as a callback does not implement a call operator")]
    NotInvokable(String),

    /// The class named in a (class, method) pair is not registered.
    #[error("class '{0}' provided in callback does not exist")]
    ClassNotFound(String),

    /// The class exists but defines neither the method nor a dispatch hook.
    #[error(
        "class '{class}' provided in callback does not define method '{method}' and has no dispatch hook"
    )]
    MethodNotDefined {
        /// The class that was searched.
        class: String,
        /// The requested method.
        method: String,
    },

    /// The object in an (object, method) pair cannot respond to the method.
    #[error("method '{method}' provided in callback does not exist in object of class '{class}'")]
    MethodNotInObject {
        /// Class of the target object.
        class: String,
        /// The requested method.
        method: String,
    },

    /// An object was given as a plain callback but is not invokable.
    #[error("invalid callback provided; object of class '{0}' is not callable")]
    NotCallable(String),
}

/// Errors that can occur while populating a [`SymbolTable`](crate::SymbolTable).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistrationError {
    /// A function with this name is already registered.
    #[error("function '{0}' is already registered")]
    DuplicateFunction(String),

    /// A class with this name is already registered.
    #[error("class '{0}' is already registered")]
    DuplicateClass(String),
}
