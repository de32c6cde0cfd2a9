//! Named functions and classes that callbacks can refer to.
//!
//! A [`SymbolTable`] is the lookup table callback resolution consults in place
//! of runtime reflection. Functions are registered by name. Classes are
//! described through a typed [`ClassBuilder`], which records the capabilities
//! resolution needs to query:
//!
//! - which methods exist, and whether each is static or instance-level
//! - whether instances have a call operator ([`ClassBuilder::invokable`])
//! - whether undefined method names are caught by a static
//!   ([`ClassBuilder::call_static_hook`]) or instance
//!   ([`ClassBuilder::call_hook`]) dispatch hook
//!
//! # Example
//!
//! ```
//! use serde_json::{Value, json};
//! use tessera_signal::{Class, SymbolTable};
//!
//! #[derive(Default)]
//! struct Greeter {
//!     greeting: String,
//! }
//!
//! let symbols = SymbolTable::new();
//! symbols
//!     .register_function("upper", |args: &[Value]| {
//!         json!(args[0].as_str().unwrap_or_default().to_uppercase())
//!     })?
//!     .register_class(
//!         Class::builder("Greeter", || Greeter { greeting: "hello".into() })
//!             .method("greet", |this: &Greeter, args: &[Value]| {
//!                 json!(format!("{} {}", this.greeting, args[0].as_str().unwrap_or("you")))
//!             })
//!             .build(),
//!     )?;
//!
//! let greeter = symbols.instantiate("Greeter").unwrap();
//! assert_eq!(greeter.call_method("greet", &[json!("world")]), Some(json!("hello world")));
//! # Ok::<(), tessera_signal::RegistrationError>(())
//! ```

use core::any::Any;
use core::fmt;
use core::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use hashbrown::HashMap;
use parking_lot::RwLock;
use serde_json::Value;

use crate::error::RegistrationError;

/// A callable over an ordered argument list.
pub type NativeFn = Arc<dyn Fn(&[Value]) -> Value + Send + Sync>;

type MethodFn<T> = Arc<dyn Fn(&T, &[Value]) -> Value + Send + Sync>;
type InstanceHookFn<T> = Arc<dyn Fn(&T, &str, &[Value]) -> Value + Send + Sync>;
type HookFn = Arc<dyn Fn(&str, &[Value]) -> Value + Send + Sync>;

static NEXT_OBJECT_ID: AtomicU64 = AtomicU64::new(1);

// ─────────────────────────────────────────────────────────────────────────────
// Function
// ─────────────────────────────────────────────────────────────────────────────

/// A free function registered under a name.
#[derive(Clone)]
pub struct Function {
    name: Arc<str>,
    func: NativeFn,
}

impl Function {
    /// Creates a named function.
    pub fn new(
        name: impl AsRef<str>,
        func: impl Fn(&[Value]) -> Value + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: Arc::from(name.as_ref()),
            func: Arc::new(func),
        }
    }

    /// Returns the registered name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Calls the function.
    pub fn call(&self, args: &[Value]) -> Value {
        (self.func)(args)
    }

    /// Returns the function as a shareable callable.
    #[must_use]
    pub fn as_native(&self) -> NativeFn {
        Arc::clone(&self.func)
    }

    /// Returns `true` if both handles refer to the same function body.
    #[must_use]
    pub fn ptr_eq(&self, other: &Function) -> bool {
        Arc::ptr_eq(&self.func, &other.func)
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Function").field(&self.name).finish()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Class
// ─────────────────────────────────────────────────────────────────────────────

/// How a method is declared on a class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodKind {
    /// Callable through the class name, without an instance.
    Static,
    /// Requires an instance.
    Instance,
}

/// A class description: its methods, hooks, and a no-argument constructor.
///
/// Built with [`Class::builder`].
pub struct Class {
    name: Arc<str>,
    methods: HashMap<String, MethodKind>,
    statics: Arc<StaticTable>,
    has_instance_hook: bool,
    invokable: bool,
    constructor: Box<dyn Fn() -> Object + Send + Sync>,
}

impl Class {
    /// Starts describing a class whose instances hold a `T` built by `constructor`.
    pub fn builder<T: Send + Sync + 'static>(
        name: impl Into<String>,
        constructor: impl Fn() -> T + Send + Sync + 'static,
    ) -> ClassBuilder<T> {
        ClassBuilder {
            name: name.into(),
            constructor: Arc::new(constructor),
            static_methods: HashMap::new(),
            methods: HashMap::new(),
            invoke: None,
            call_hook: None,
            static_hook: None,
        }
    }

    /// Returns the class name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns `true` if the class explicitly defines `method`.
    #[must_use]
    pub fn has_method(&self, method: &str) -> bool {
        self.methods.contains_key(method)
    }

    /// Returns how `method` is declared, or `None` if the class does not define it.
    #[must_use]
    pub fn method_kind(&self, method: &str) -> Option<MethodKind> {
        self.methods.get(method).copied()
    }

    /// Returns `true` if undefined static calls are caught by a dispatch hook.
    #[must_use]
    pub fn has_static_hook(&self) -> bool {
        self.statics.hook.is_some()
    }

    /// Returns `true` if undefined instance calls are caught by a dispatch hook.
    #[must_use]
    pub fn has_instance_hook(&self) -> bool {
        self.has_instance_hook
    }

    /// Returns `true` if instances of the class have a call operator.
    #[must_use]
    pub fn is_invokable(&self) -> bool {
        self.invokable
    }

    /// Constructs a new instance with no arguments.
    #[must_use]
    pub fn instantiate(&self) -> Object {
        (self.constructor)()
    }

    /// Returns a callable for `method` invoked through the class itself.
    ///
    /// Explicit static methods take priority; otherwise the static dispatch
    /// hook receives the method name. Returns `None` when neither applies.
    #[must_use]
    pub fn bind_static(&self, method: &str) -> Option<NativeFn> {
        if let Some(func) = self.statics.methods.get(method) {
            return Some(Arc::clone(func));
        }
        if self.has_method(method) {
            return None;
        }
        self.statics.bind_hook(method)
    }

    /// Calls `method` through the class without instantiating it.
    pub fn call_static(&self, method: &str, args: &[Value]) -> Option<Value> {
        self.bind_static(method).map(|func| func(args))
    }
}

impl fmt::Debug for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut methods: Vec<_> = self.methods.iter().collect();
        methods.sort_by(|a, b| a.0.cmp(b.0));
        f.debug_struct("Class")
            .field("name", &self.name)
            .field("methods", &methods)
            .field("static_hook", &self.has_static_hook())
            .field("instance_hook", &self.has_instance_hook)
            .field("invokable", &self.invokable)
            .finish()
    }
}

/// The static side of a class, shared with every instance.
struct StaticTable {
    methods: HashMap<String, NativeFn>,
    hook: Option<HookFn>,
}

impl StaticTable {
    fn bind_hook(&self, method: &str) -> Option<NativeFn> {
        let hook = Arc::clone(self.hook.as_ref()?);
        let method = method.to_owned();
        Some(Arc::new(move |args: &[Value]| hook(&method, args)))
    }
}

/// Typed builder for a [`Class`] whose instances hold a `T`.
pub struct ClassBuilder<T> {
    name: String,
    constructor: Arc<dyn Fn() -> T + Send + Sync>,
    static_methods: HashMap<String, NativeFn>,
    methods: HashMap<String, MethodFn<T>>,
    invoke: Option<MethodFn<T>>,
    call_hook: Option<InstanceHookFn<T>>,
    static_hook: Option<HookFn>,
}

impl<T: Send + Sync + 'static> ClassBuilder<T> {
    /// Defines a static method. Replaces any method of the same name.
    #[must_use]
    pub fn static_method(
        mut self,
        name: impl Into<String>,
        func: impl Fn(&[Value]) -> Value + Send + Sync + 'static,
    ) -> Self {
        let name = name.into();
        self.methods.remove(&name);
        self.static_methods.insert(name, Arc::new(func));
        self
    }

    /// Defines an instance method. Replaces any method of the same name.
    #[must_use]
    pub fn method(
        mut self,
        name: impl Into<String>,
        func: impl Fn(&T, &[Value]) -> Value + Send + Sync + 'static,
    ) -> Self {
        let name = name.into();
        self.static_methods.remove(&name);
        self.methods.insert(name, Arc::new(func));
        self
    }

    /// Gives instances a call operator.
    #[must_use]
    pub fn invokable(mut self, func: impl Fn(&T, &[Value]) -> Value + Send + Sync + 'static) -> Self {
        self.invoke = Some(Arc::new(func));
        self
    }

    /// Installs an instance-level hook receiving calls to undefined methods.
    #[must_use]
    pub fn call_hook(
        mut self,
        hook: impl Fn(&T, &str, &[Value]) -> Value + Send + Sync + 'static,
    ) -> Self {
        self.call_hook = Some(Arc::new(hook));
        self
    }

    /// Installs a class-level hook receiving static calls to undefined methods.
    #[must_use]
    pub fn call_static_hook(
        mut self,
        hook: impl Fn(&str, &[Value]) -> Value + Send + Sync + 'static,
    ) -> Self {
        self.static_hook = Some(Arc::new(hook));
        self
    }

    /// Finishes the class description.
    #[must_use]
    pub fn build(self) -> Class {
        let name: Arc<str> = Arc::from(self.name);

        let mut kinds: HashMap<String, MethodKind> = self
            .methods
            .keys()
            .map(|method| (method.clone(), MethodKind::Instance))
            .collect();
        kinds.extend(
            self.static_methods
                .keys()
                .map(|method| (method.clone(), MethodKind::Static)),
        );

        let has_instance_hook = self.call_hook.is_some();
        let invokable = self.invoke.is_some();

        let statics = Arc::new(StaticTable {
            methods: self.static_methods,
            hook: self.static_hook,
        });

        let class_name = Arc::clone(&name);
        let shared = Arc::clone(&statics);
        let constructor = self.constructor;
        let methods = self.methods;
        let invoke = self.invoke;
        let call_hook = self.call_hook;

        Class {
            name,
            methods: kinds,
            statics,
            has_instance_hook,
            invokable,
            constructor: Box::new(move || {
                let state = Arc::new(constructor());
                let bound: HashMap<String, NativeFn> = methods
                    .iter()
                    .map(|(method, func)| (method.clone(), bind(&state, func)))
                    .collect();
                let invoke = invoke.as_ref().map(|func| bind(&state, func));
                let hook = call_hook.as_ref().map(|hook| {
                    let state = Arc::clone(&state);
                    let hook = Arc::clone(hook);
                    Arc::new(move |method: &str, args: &[Value]| hook(&*state, method, args))
                        as HookFn
                });
                Object {
                    inner: Arc::new(ObjectInner {
                        id: NEXT_OBJECT_ID.fetch_add(1, Ordering::Relaxed),
                        class: Arc::clone(&class_name),
                        state,
                        methods: bound,
                        invoke,
                        hook,
                        statics: Arc::clone(&shared),
                    }),
                }
            }),
        }
    }
}

fn bind<T: Send + Sync + 'static>(state: &Arc<T>, func: &MethodFn<T>) -> NativeFn {
    let state = Arc::clone(state);
    let func = Arc::clone(func);
    Arc::new(move |args: &[Value]| func(&*state, args))
}

// ─────────────────────────────────────────────────────────────────────────────
// Object
// ─────────────────────────────────────────────────────────────────────────────

/// An instance of a [`Class`].
///
/// Cloning an `Object` yields another handle to the same instance.
#[derive(Clone)]
pub struct Object {
    inner: Arc<ObjectInner>,
}

struct ObjectInner {
    id: u64,
    class: Arc<str>,
    state: Arc<dyn Any + Send + Sync>,
    methods: HashMap<String, NativeFn>,
    invoke: Option<NativeFn>,
    hook: Option<HookFn>,
    statics: Arc<StaticTable>,
}

impl Object {
    /// Process-unique identifier of this instance.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.inner.id
    }

    /// Name of the class this object was instantiated from.
    #[must_use]
    pub fn class_name(&self) -> &str {
        &self.inner.class
    }

    /// Borrows the instance state as `T`, if that is its type.
    #[must_use]
    pub fn state<T: 'static>(&self) -> Option<&T> {
        self.inner.state.downcast_ref::<T>()
    }

    /// Returns `true` if both handles refer to the same instance.
    #[must_use]
    pub fn ptr_eq(&self, other: &Object) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Returns `true` if the object has a call operator.
    #[must_use]
    pub fn is_invokable(&self) -> bool {
        self.inner.invoke.is_some()
    }

    /// Returns `true` if the object's class explicitly defines `method`,
    /// static or instance-level.
    #[must_use]
    pub fn has_method(&self, method: &str) -> bool {
        self.inner.methods.contains_key(method) || self.inner.statics.methods.contains_key(method)
    }

    /// Returns `true` if calling `method` on the object would be dispatched,
    /// to an explicit method or to either dispatch hook.
    #[must_use]
    pub fn responds_to(&self, method: &str) -> bool {
        self.has_method(method) || self.inner.hook.is_some() || self.inner.statics.hook.is_some()
    }

    /// Returns the call operator as a shareable callable.
    #[must_use]
    pub fn invoker(&self) -> Option<NativeFn> {
        self.inner.invoke.clone()
    }

    /// Returns a callable for `method` reached through this instance.
    ///
    /// Lookup order: instance methods, the class's static methods, the
    /// instance hook, then the static hook.
    #[must_use]
    pub fn bind(&self, method: &str) -> Option<NativeFn> {
        let inner = &self.inner;
        if let Some(func) = inner.methods.get(method).or_else(|| inner.statics.methods.get(method)) {
            return Some(Arc::clone(func));
        }
        if let Some(hook) = &inner.hook {
            let hook = Arc::clone(hook);
            let method = method.to_owned();
            return Some(Arc::new(move |args: &[Value]| hook(&method, args)));
        }
        inner.statics.bind_hook(method)
    }

    /// Calls the object's call operator.
    pub fn invoke(&self, args: &[Value]) -> Option<Value> {
        self.inner.invoke.as_ref().map(|func| func(args))
    }

    /// Calls `method` on the object.
    pub fn call_method(&self, method: &str, args: &[Value]) -> Option<Value> {
        self.bind(method).map(|func| func(args))
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Object")
            .field("class", &self.inner.class)
            .field("id", &self.inner.id)
            .finish_non_exhaustive()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// SymbolTable
// ─────────────────────────────────────────────────────────────────────────────

/// Registry of functions and classes addressable by name.
///
/// Functions and classes live in separate namespaces. Registration goes
/// through `&self`, so a table can be shared behind an [`Arc`] and still
/// grow.
#[derive(Default)]
pub struct SymbolTable {
    functions: RwLock<HashMap<String, Function>>,
    classes: RwLock<HashMap<String, Arc<Class>>>,
}

impl SymbolTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a free function.
    ///
    /// # Errors
    ///
    /// Returns [`RegistrationError::DuplicateFunction`] if the name is taken.
    pub fn register_function(
        &self,
        name: impl Into<String>,
        func: impl Fn(&[Value]) -> Value + Send + Sync + 'static,
    ) -> Result<&Self, RegistrationError> {
        let name = name.into();
        let mut functions = self.functions.write();
        if functions.contains_key(&name) {
            return Err(RegistrationError::DuplicateFunction(name));
        }
        functions.insert(name.clone(), Function::new(&name, func));
        Ok(self)
    }

    /// Registers a class.
    ///
    /// # Errors
    ///
    /// Returns [`RegistrationError::DuplicateClass`] if the name is taken.
    pub fn register_class(&self, class: Class) -> Result<&Self, RegistrationError> {
        let mut classes = self.classes.write();
        if classes.contains_key(class.name()) {
            return Err(RegistrationError::DuplicateClass(class.name().to_owned()));
        }
        classes.insert(class.name().to_owned(), Arc::new(class));
        Ok(self)
    }

    /// Removes a function, returning it if it was registered.
    pub fn remove_function(&self, name: &str) -> Option<Function> {
        self.functions.write().remove(name)
    }

    /// Removes a class, returning it if it was registered.
    pub fn remove_class(&self, name: &str) -> Option<Arc<Class>> {
        self.classes.write().remove(name)
    }

    /// Looks up a function by name.
    #[must_use]
    pub fn function(&self, name: &str) -> Option<Function> {
        self.functions.read().get(name).cloned()
    }

    /// Looks up a class by name.
    #[must_use]
    pub fn class(&self, name: &str) -> Option<Arc<Class>> {
        self.classes.read().get(name).cloned()
    }

    /// Checks whether a function is registered.
    #[must_use]
    pub fn has_function(&self, name: &str) -> bool {
        self.functions.read().contains_key(name)
    }

    /// Checks whether a class is registered.
    #[must_use]
    pub fn has_class(&self, name: &str) -> bool {
        self.classes.read().contains_key(name)
    }

    /// Instantiates the named class, if registered.
    #[must_use]
    pub fn instantiate(&self, class: &str) -> Option<Object> {
        self.class(class).map(|class| class.instantiate())
    }

    /// Lists registered function names, sorted.
    #[must_use]
    pub fn function_names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.functions.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Lists registered class names, sorted.
    #[must_use]
    pub fn class_names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.classes.read().keys().cloned().collect();
        names.sort();
        names
    }
}

impl fmt::Debug for SymbolTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SymbolTable")
            .field("functions", &self.function_names())
            .field("classes", &self.class_names())
            .finish()
    }
}
