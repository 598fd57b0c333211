use chimera_aop::prelude::*;
use std::any::Any;
use std::sync::{Arc, Mutex};

static WORK: MethodMetadata = MethodMetadata {
    declaring_type: "test.OrderService",
    name: "work",
    parameter_types: &["java.lang.String"],
    annotations: &[
        AnnotationMetadata::new("test.First"),
        AnnotationMetadata::new("test.Second"),
    ],
    returns_value: true,
};

static PING: MethodMetadata = MethodMetadata {
    declaring_type: "test.OrderService",
    name: "ping",
    parameter_types: &[],
    annotations: &[AnnotationMetadata::new("test.First")],
    returns_value: false,
};

#[derive(Debug, thiserror::Error, PartialEq)]
#[error("order {0} not found")]
struct OrderNotFound(String);

#[derive(Debug, thiserror::Error)]
#[error("unrelated failure")]
struct Unrelated;

type Journal = Arc<Mutex<Vec<String>>>;

/// 记录进入和退出顺序的拦截器
struct Recording {
    name: &'static str,
    journal: Journal,
}

impl MethodInterceptor for Recording {
    fn invoke(&self, invocation: MethodInvocation<'_>) -> Result<Option<Value>, Thrown> {
        self.journal.lock().unwrap().push(format!("enter {}", self.name));
        let result = invocation.proceed();
        self.journal.lock().unwrap().push(format!("exit {}", self.name));
        result
    }
}

/// 给字符串结果加前缀
struct Prefixing;

impl MethodInterceptor for Prefixing {
    fn invoke(&self, invocation: MethodInvocation<'_>) -> Result<Option<Value>, Thrown> {
        let value = invocation.proceed()?;
        Ok(value.map(|value| match value.downcast::<String>() {
            Ok(s) => Box::new(format!("Intercepted_{}", s)) as Value,
            Err(other) => other,
        }))
    }
}

/// 不调用 proceed，直接返回固定值
struct ShortCircuit;

impl MethodInterceptor for ShortCircuit {
    fn invoke(&self, _invocation: MethodInvocation<'_>) -> Result<Option<Value>, Thrown> {
        Ok(Some(Box::new(String::from("cached"))))
    }
}

struct Failing;

impl MethodInterceptor for Failing {
    fn invoke(&self, _invocation: MethodInvocation<'_>) -> Result<Option<Value>, Thrown> {
        Err(anyhow::anyhow!("interceptor bug").into())
    }
}

struct WrongProceed;

impl MethodInterceptor for WrongProceed {
    fn invoke(&self, invocation: MethodInvocation<'_>) -> Result<Option<Value>, Thrown> {
        invocation.no_return_proceed().map(|()| None)
    }
}

struct WrongType;

impl MethodInterceptor for WrongType {
    fn invoke(&self, invocation: MethodInvocation<'_>) -> Result<Option<Value>, Thrown> {
        invocation.proceed()?;
        Ok(Some(Box::new(42_i64)))
    }
}

struct Service;

fn recording_chain(journal: &Journal) -> InterceptorChain {
    InterceptorChain::new()
        .with(Arc::new(Recording {
            name: "first",
            journal: journal.clone(),
        }))
        .with(Arc::new(Recording {
            name: "second",
            journal: journal.clone(),
        }))
}

#[test]
fn test_first_interceptor_is_outermost() {
    let journal: Journal = Arc::default();
    let chain = recording_chain(&journal);
    let service = Service;
    let order = String::from("A-1");
    let args: [&dyn Any; 1] = [&order];

    let result = chain.call(&service, &WORK, &args, || {
        journal.lock().unwrap().push("body".to_string());
        Ok::<_, OrderNotFound>(String::from("done"))
    });

    assert_eq!(result.unwrap(), "done");
    assert_eq!(
        *journal.lock().unwrap(),
        vec!["enter first", "enter second", "body", "exit second", "exit first"]
    );
}

#[test]
fn test_body_runs_exactly_once() {
    let chain = InterceptorChain::new().with(Arc::new(Prefixing));
    let service = Service;
    let calls = Mutex::new(0);

    let result = chain.call(&service, &WORK, &[], || {
        *calls.lock().unwrap() += 1;
        Ok::<_, OrderNotFound>(String::from("doWork"))
    });

    assert_eq!(result.unwrap(), "Intercepted_doWork");
    assert_eq!(*calls.lock().unwrap(), 1);
}

#[test]
fn test_empty_chain_calls_body() {
    let chain = InterceptorChain::new();
    assert!(chain.is_empty());
    let service = Service;
    let result = chain.call(&service, &WORK, &[], || Ok::<_, OrderNotFound>(7_u8));
    assert_eq!(result.unwrap(), 7);
}

#[test]
fn test_interceptor_may_skip_body() {
    let chain = InterceptorChain::new().with(Arc::new(ShortCircuit));
    let service = Service;
    let mut reached = false;

    let result = chain.call(&service, &WORK, &[], || {
        reached = true;
        Ok::<_, OrderNotFound>(String::from("fresh"))
    });

    assert_eq!(result.unwrap(), "cached");
    assert!(!reached);
}

#[test]
fn test_declared_error_is_not_wrapped() {
    let journal: Journal = Arc::default();
    let chain = recording_chain(&journal);
    let service = Service;

    let result: Result<String, _> = chain.call(&service, &WORK, &[], || {
        Err(OrderNotFound("A-2".to_string()))
    });

    match result {
        Err(InterceptError::Declared(error)) => {
            assert_eq!(error, OrderNotFound("A-2".to_string()))
        }
        other => panic!("expected declared error, got {:?}", other),
    }
}

#[test]
fn test_interceptor_failure_is_wrapped() {
    let chain = InterceptorChain::new().with(Arc::new(Failing));
    let service = Service;

    let result = chain.call_void(&service, &PING, &[], || Ok::<_, OrderNotFound>(()));

    let error = result.unwrap_err();
    assert!(error.is_runtime());
    assert!(error.to_string().contains("interceptor bug"));
}

#[test]
fn test_undeclared_error_type_is_wrapped() {
    struct Raising;

    impl MethodInterceptor for Raising {
        fn invoke(&self, _invocation: MethodInvocation<'_>) -> Result<Option<Value>, Thrown> {
            Err(Thrown::declared(Unrelated))
        }
    }

    let chain = InterceptorChain::new().with(Arc::new(Raising));
    let service = Service;
    let result = chain.call_void(&service, &PING, &[], || Ok::<_, OrderNotFound>(()));

    assert!(result.unwrap_err().is_runtime());
}

#[test]
fn test_wrong_proceed_raises_unchecked_error() {
    let chain = InterceptorChain::new().with(Arc::new(WrongProceed));
    let service = Service;

    let result = chain.call(&service, &WORK, &[], || Ok::<_, OrderNotFound>(1_u32));

    let error = result.unwrap_err();
    assert!(error.is_runtime());
    assert!(error.to_string().contains("no_return_proceed"));
}

#[test]
fn test_incompatible_return_value() {
    let chain = InterceptorChain::new().with(Arc::new(WrongType));
    let service = Service;

    let result = chain.call(&service, &WORK, &[], || Ok::<_, OrderNotFound>(String::new()));

    assert!(result.unwrap_err().to_string().contains("test.OrderService#work"));
}

#[test]
fn test_void_chain_order() {
    let journal: Journal = Arc::default();
    let chain = recording_chain(&journal);
    let service = Service;

    chain
        .call_void(&service, &PING, &[], || {
            journal.lock().unwrap().push("body".to_string());
            Ok::<_, OrderNotFound>(())
        })
        .unwrap();

    assert_eq!(journal.lock().unwrap()[2], "body");
    assert_eq!(journal.lock().unwrap().len(), 5);
}
