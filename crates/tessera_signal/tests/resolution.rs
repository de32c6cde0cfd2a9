//! Integration tests for callback resolution through `SignalHandler`.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use serde_json::{Value, json};
use tessera_signal::{
    CallbackKind, CallbackRef, Class, InvalidCallback, SignalHandler, SymbolTable, Target,
};

// ─────────────────────────────────────────────────────────────────────
// Fixtures
// ─────────────────────────────────────────────────────────────────────

/// Counts constructor calls per class.
#[derive(Default, Clone)]
struct Constructions {
    logger: Arc<AtomicUsize>,
    mailer: Arc<AtomicUsize>,
    proxy: Arc<AtomicUsize>,
    facade: Arc<AtomicUsize>,
    shout: Arc<AtomicUsize>,
}

struct Mailer {
    from: String,
}

fn symbols(counts: &Constructions) -> Arc<SymbolTable> {
    let symbols = Arc::new(SymbolTable::new());

    symbols
        .register_function("concat", |args: &[Value]| {
            json!(
                args.iter()
                    .map(|v| v.as_str().unwrap_or_default())
                    .collect::<String>()
            )
        })
        .unwrap();

    let logger = Arc::clone(&counts.logger);
    symbols
        .register_class(
            Class::builder("Logger", move || {
                logger.fetch_add(1, Ordering::SeqCst);
            })
            .static_method("write", |args: &[Value]| json!({ "written": args }))
            .build(),
        )
        .unwrap();

    let mailer = Arc::clone(&counts.mailer);
    symbols
        .register_class(
            Class::builder("Mailer", move || {
                mailer.fetch_add(1, Ordering::SeqCst);
                Mailer {
                    from: "noreply@example.com".into(),
                }
            })
            .method("send", |this: &Mailer, args: &[Value]| {
                json!({ "from": this.from, "to": args.first().cloned().unwrap_or(Value::Null) })
            })
            .build(),
        )
        .unwrap();

    let proxy = Arc::clone(&counts.proxy);
    symbols
        .register_class(
            Class::builder("Proxy", move || {
                proxy.fetch_add(1, Ordering::SeqCst);
            })
            .call_hook(|_: &(), method: &str, args: &[Value]| json!({ "proxied": method, "argc": args.len() }))
            .build(),
        )
        .unwrap();

    let facade = Arc::clone(&counts.facade);
    symbols
        .register_class(
            Class::builder("Facade", move || {
                facade.fetch_add(1, Ordering::SeqCst);
            })
            .call_static_hook(|method: &str, _: &[Value]| json!({ "static": method }))
            .build(),
        )
        .unwrap();

    let shout = Arc::clone(&counts.shout);
    symbols
        .register_class(
            Class::builder("Shout", move || {
                shout.fetch_add(1, Ordering::SeqCst);
            })
            .invokable(|_: &(), args: &[Value]| {
                json!(args[0].as_str().unwrap_or_default().to_uppercase())
            })
            .build(),
        )
        .unwrap();

    symbols
        .register_class(Class::builder("Inert", || ()).build())
        .unwrap();

    symbols
}

// ─────────────────────────────────────────────────────────────────────
// Free functions
// ─────────────────────────────────────────────────────────────────────

#[test]
fn free_function_resolves_to_registered_function() {
    let symbols = symbols(&Constructions::default());
    let handler = SignalHandler::new(Arc::clone(&symbols), "render", "concat");

    let callback = handler.callback().unwrap();
    let registered = symbols.function("concat").unwrap();

    match callback.kind() {
        CallbackKind::Function(function) => assert!(function.ptr_eq(&registered)),
        other => panic!("expected a function, got {other:?}"),
    }
    assert_eq!(handler.call(&[json!("a"), json!("b")]).unwrap(), json!("ab"));
}

#[test]
fn validated_callback_does_not_consult_symbols_again() {
    let symbols = symbols(&Constructions::default());
    let handler = SignalHandler::new(Arc::clone(&symbols), "render", "concat");

    let first = handler.callback().unwrap();
    symbols.remove_function("concat").unwrap();

    let second = handler.callback().unwrap();
    assert!(first.ptr_eq(&second));
    assert_eq!(handler.call(&[json!("a"), json!("b")]).unwrap(), json!("ab"));

    let fresh = SignalHandler::new(symbols, "render", "concat");
    assert_eq!(
        fresh.callback().unwrap_err(),
        InvalidCallback::NotFunctionOrClass("concat".into())
    );
}

#[test]
fn qualified_static_name_resolves_without_instantiating() {
    let counts = Constructions::default();
    let handler = SignalHandler::new(symbols(&counts), "save", "Logger::write");

    assert_eq!(
        handler.call(&[json!("entry")]).unwrap(),
        json!({ "written": ["entry"] })
    );
    assert_eq!(
        handler.callback().unwrap().as_static_pair(),
        Some(("Logger", "write"))
    );
    assert_eq!(counts.logger.load(Ordering::SeqCst), 0);
}

// ─────────────────────────────────────────────────────────────────────
// (class, method) pairs
// ─────────────────────────────────────────────────────────────────────

#[test]
fn static_method_pair_is_kept_and_never_instantiated() {
    let counts = Constructions::default();
    let handler = SignalHandler::with_method(symbols(&counts), "save", "Logger", "write");

    let callback = handler.callback().unwrap();
    assert_eq!(callback.as_static_pair(), Some(("Logger", "write")));
    assert_eq!(
        handler.callback_ref().as_class_pair(),
        Some(("Logger", "write"))
    );

    assert_eq!(
        handler.call(&[json!("entry")]).unwrap(),
        json!({ "written": ["entry"] })
    );
    assert_eq!(counts.logger.load(Ordering::SeqCst), 0);
}

#[test]
fn instance_method_pair_instantiates_exactly_once() {
    let counts = Constructions::default();
    let handler = SignalHandler::with_method(symbols(&counts), "notify", "Mailer", "send");

    assert_eq!(counts.mailer.load(Ordering::SeqCst), 0);

    let first = handler.callback().unwrap();
    let second = handler.callback().unwrap();
    handler.call(&[json!("a@example.com")]).unwrap();

    assert_eq!(counts.mailer.load(Ordering::SeqCst), 1);
    assert!(first.object().unwrap().ptr_eq(second.object().unwrap()));

    match handler.callback_ref() {
        CallbackRef::Method {
            target: Target::Object(object),
            method,
        } => {
            assert_eq!(object.class_name(), "Mailer");
            assert_eq!(method, "send");
            assert!(object.ptr_eq(first.object().unwrap()));
        }
        other => panic!("expected the pair to hold an instance, got {other:?}"),
    }
}

#[test]
fn instance_method_sees_constructed_state() {
    let handler =
        SignalHandler::with_method(symbols(&Constructions::default()), "notify", "Mailer", "send");

    assert_eq!(
        handler.call(&[json!("a@example.com")]).unwrap(),
        json!({ "from": "noreply@example.com", "to": "a@example.com" })
    );
}

#[test]
fn instance_hook_instantiates_and_dispatches() {
    let counts = Constructions::default();
    let handler = SignalHandler::with_method(symbols(&counts), "any", "Proxy", "lookup");

    let result = handler.call(&[json!(1), json!(2)]).unwrap();
    handler.call(&[]).unwrap();

    assert_eq!(result, json!({ "proxied": "lookup", "argc": 2 }));
    assert_eq!(counts.proxy.load(Ordering::SeqCst), 1);
}

#[test]
fn static_hook_keeps_pair_without_instantiating() {
    let counts = Constructions::default();
    let handler = SignalHandler::with_method(symbols(&counts), "any", "Facade", "find");

    let callback = handler.callback().unwrap();

    assert_eq!(callback.as_static_pair(), Some(("Facade", "find")));
    assert_eq!(callback.invoke(&[]), json!({ "static": "find" }));
    assert_eq!(counts.facade.load(Ordering::SeqCst), 0);
}

#[test]
fn missing_method_without_hooks_fails() {
    let handler =
        SignalHandler::with_method(symbols(&Constructions::default()), "save", "Logger", "flush");

    let err = handler.callback().unwrap_err();
    assert_eq!(
        err,
        InvalidCallback::MethodNotDefined {
            class: "Logger".into(),
            method: "flush".into(),
        }
    );
    assert!(!handler.is_validated());
}

#[test]
fn missing_class_in_pair_fails() {
    let handler =
        SignalHandler::with_method(symbols(&Constructions::default()), "save", "Nowhere", "run");

    let err = handler.call(&[]).unwrap_err();
    assert_eq!(err, InvalidCallback::ClassNotFound("Nowhere".into()));
}

#[test]
fn object_pair_reaches_static_method_of_its_class() {
    let counts = Constructions::default();
    let symbols = symbols(&counts);
    let logger = symbols.instantiate("Logger").unwrap();

    let handler = SignalHandler::new(
        Arc::clone(&symbols),
        "save",
        CallbackRef::method(logger.clone(), "write"),
    );

    assert_eq!(
        handler.call(&[json!("entry")]).unwrap(),
        json!({ "written": ["entry"] })
    );
    let callback = handler.callback().unwrap();
    assert!(callback.object().is_some_and(|object| object.ptr_eq(&logger)));
    assert_eq!(counts.logger.load(Ordering::SeqCst), 1);
}

#[test]
fn object_pair_reaches_static_hook_of_its_class() {
    let symbols = symbols(&Constructions::default());
    let facade = symbols.instantiate("Facade").unwrap();

    let handler = SignalHandler::with_method(symbols, "any", facade, "find");

    assert_eq!(handler.call(&[]).unwrap(), json!({ "static": "find" }));
}

#[test]
fn object_pair_without_matching_method_fails() {
    let symbols = symbols(&Constructions::default());
    let logger = symbols.instantiate("Logger").unwrap();

    let handler = SignalHandler::with_method(symbols, "save", logger, "flush");

    assert_eq!(
        handler.callback().unwrap_err(),
        InvalidCallback::MethodNotInObject {
            class: "Logger".into(),
            method: "flush".into(),
        }
    );
}

// ─────────────────────────────────────────────────────────────────────
// Bare class names
// ─────────────────────────────────────────────────────────────────────

#[test]
fn invokable_class_name_becomes_instance() {
    let counts = Constructions::default();
    let handler = SignalHandler::new(symbols(&counts), "shout", "Shout");

    let callback = handler.callback().unwrap();
    handler.callback().unwrap();

    assert!(matches!(callback.kind(), CallbackKind::Invokable(o) if o.class_name() == "Shout"));
    assert_eq!(handler.call(&[json!("hey")]).unwrap(), json!("HEY"));
    assert_eq!(counts.shout.load(Ordering::SeqCst), 1);
}

#[test]
fn non_invokable_class_name_fails() {
    let handler = SignalHandler::new(symbols(&Constructions::default()), "noop", "Inert");

    let err = handler.callback().unwrap_err();
    assert_eq!(err, InvalidCallback::NotInvokable("Inert".into()));
}

#[test]
fn unknown_name_fails() {
    let handler = SignalHandler::new(symbols(&Constructions::default()), "noop", "nothing");

    let err = handler.callback().unwrap_err();
    assert_eq!(err, InvalidCallback::NotFunctionOrClass("nothing".into()));
    assert!(err.to_string().contains("not a function or a class"));
}

// ─────────────────────────────────────────────────────────────────────
// Error messages
// ─────────────────────────────────────────────────────────────────────

#[test]
fn each_failure_cause_has_a_distinct_message() {
    let messages = [
        InvalidCallback::NotFunctionOrClass("x".into()).to_string(),
        InvalidCallback::NotInvokable("x".into()).to_string(),
        InvalidCallback::ClassNotFound("x".into()).to_string(),
        InvalidCallback::MethodNotDefined {
            class: "x".into(),
            method: "y".into(),
        }
        .to_string(),
        InvalidCallback::MethodNotInObject {
            class: "x".into(),
            method: "y".into(),
        }
        .to_string(),
        InvalidCallback::NotCallable("x".into()).to_string(),
    ];

    for (i, a) in messages.iter().enumerate() {
        for b in &messages[i + 1..] {
            assert_ne!(a, b);
        }
    }
}

// ─────────────────────────────────────────────────────────────────────
// Arity
// ─────────────────────────────────────────────────────────────────────

mod prop_tests {
    use super::*;
    use proptest::prelude::*;

    fn echo(args: &[Value]) -> Value {
        json!({ "argc": args.len(), "args": args })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        /// `call` passes any argument list through unchanged, whatever its length.
        #[test]
        fn call_matches_direct_invocation(values in prop::collection::vec(any::<i64>(), 0..=4)) {
            let args: Vec<Value> = values.into_iter().map(Value::from).collect();
            let handler = SignalHandler::new(
                Arc::new(SymbolTable::new()),
                "echo",
                CallbackRef::closure(echo),
            );

            prop_assert_eq!(handler.call(&args).unwrap(), echo(&args));
        }
    }
}
