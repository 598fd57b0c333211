//! 拦截器与拦截链
//!
//! 多个拦截器围绕同一个方法体时，按注解列表从后往前 fold：
//! 最后一个拦截器最靠近方法体，第一个拦截器在最外层、最先被调用。

use crate::{InterceptError, MethodInvocation, MethodMetadata, Thrown, Value};
use std::any::Any;
use std::error::Error;
use std::sync::Arc;

/// 方法拦截器
///
/// 负责实现拦截逻辑，并在需要时通过 [`MethodInvocation::proceed`] 调用下一层
pub trait MethodInterceptor: Send + Sync {
    /// 执行拦截
    ///
    /// 返回原始方法的返回值，或者一个自定义的返回值；无返回值的方法返回 `None`
    fn invoke(&self, invocation: MethodInvocation<'_>) -> Result<Option<Value>, Thrown>;
}

impl<F> MethodInterceptor for F
where
    F: Fn(MethodInvocation<'_>) -> Result<Option<Value>, Thrown> + Send + Sync,
{
    fn invoke(&self, invocation: MethodInvocation<'_>) -> Result<Option<Value>, Thrown> {
        self(invocation)
    }
}

type Proceed<'a, T> = Box<dyn FnOnce() -> Result<T, Thrown> + 'a>;

/// 拦截链
///
/// 拦截器按注解顺序保存，第一个在最外层
#[derive(Clone, Default)]
pub struct InterceptorChain {
    interceptors: Vec<Arc<dyn MethodInterceptor>>,
}

impl InterceptorChain {
    /// 创建空的拦截链
    pub fn new() -> Self {
        Self {
            interceptors: Vec::new(),
        }
    }

    /// 在最内层追加一个拦截器
    pub fn with(mut self, interceptor: Arc<dyn MethodInterceptor>) -> Self {
        self.interceptors.push(interceptor);
        self
    }

    /// 在最内层追加一个拦截器
    pub fn push(&mut self, interceptor: Arc<dyn MethodInterceptor>) {
        self.interceptors.push(interceptor);
    }

    pub fn len(&self) -> usize {
        self.interceptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.interceptors.is_empty()
    }

    /// 执行有返回值的方法
    ///
    /// `body` 是原始方法体；它返回的 `E` 原样传播，其余失败包装为
    /// [`InterceptError::Runtime`]
    pub fn call<'a, T, E, F>(
        &'a self,
        instance: &'a dyn Any,
        method: &'static MethodMetadata,
        arguments: &'a [&'a dyn Any],
        body: F,
    ) -> Result<T, InterceptError<E>>
    where
        T: Any + Send,
        E: Error + Send + Sync + 'static,
        F: FnOnce() -> Result<T, E> + 'a,
    {
        let innermost: Proceed<'a, Value> =
            Box::new(move || body().map(|value| Box::new(value) as Value).map_err(Thrown::declared));

        let chain = self.interceptors.iter().rev().fold(innermost, |next, interceptor| {
            Box::new(move || {
                let invocation = MethodInvocation::returning(instance, method, arguments, next);
                interceptor.invoke(invocation)?.ok_or(Thrown::ContractViolation(
                    "interceptor returned no value for a method with a return value",
                ))
            }) as Proceed<'a, Value>
        });

        match chain() {
            Ok(value) => value.downcast::<T>().map(|value| *value).map_err(|_| {
                InterceptError::Runtime(anyhow::anyhow!(
                    "Interceptor returned a value incompatible with the return type of {}",
                    method
                ))
            }),
            Err(thrown) => Err(unwrap_thrown(thrown)),
        }
    }

    /// 执行无返回值的方法
    pub fn call_void<'a, E, F>(
        &'a self,
        instance: &'a dyn Any,
        method: &'static MethodMetadata,
        arguments: &'a [&'a dyn Any],
        body: F,
    ) -> Result<(), InterceptError<E>>
    where
        E: Error + Send + Sync + 'static,
        F: FnOnce() -> Result<(), E> + 'a,
    {
        let innermost: Proceed<'a, ()> = Box::new(move || body().map_err(Thrown::declared));

        let chain = self.interceptors.iter().rev().fold(innermost, |next, interceptor| {
            Box::new(move || {
                let invocation = MethodInvocation::no_return(instance, method, arguments, next);
                interceptor.invoke(invocation).map(|_| ())
            }) as Proceed<'a, ()>
        });

        chain().map_err(unwrap_thrown)
    }
}

/// 声明过的错误原样返回，其余包装为运行时错误
fn unwrap_thrown<E>(thrown: Thrown) -> InterceptError<E>
where
    E: Error + Send + Sync + 'static,
{
    match thrown {
        Thrown::Declared(error) => match error.downcast::<E>() {
            Ok(error) => InterceptError::Declared(*error),
            Err(other) => InterceptError::Runtime(anyhow::anyhow!(other)),
        },
        Thrown::Other(error) => InterceptError::Runtime(error),
        violation @ Thrown::ContractViolation(_) => {
            InterceptError::Runtime(anyhow::Error::new(violation))
        }
    }
}
