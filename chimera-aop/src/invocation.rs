//! 调用对象（MethodInvocation）
//!
//! 每一层拦截器拿到的调用上下文：被拦截的实例、缓存的方法元数据、
//! 捕获的参数，以及继续执行下一层的 `proceed`。

use crate::{AnnotationMetadata, MethodMetadata, Thrown};
use std::any::Any;
use std::fmt;

/// 在拦截链中传递的返回值
pub type Value = Box<dyn Any + Send>;

/// 下一层的执行函数
pub(crate) enum Next<'a> {
    /// 有返回值的方法
    Returning(Box<dyn FnOnce() -> Result<Value, Thrown> + 'a>),

    /// 无返回值（void）的方法
    NoReturn(Box<dyn FnOnce() -> Result<(), Thrown> + 'a>),
}

/// 方法调用
///
/// 由生成的代码为每一个生效的拦截器构造一次，拦截器决定是否以及如何
/// 继续执行下一层。`proceed` 只能调用一次（按值消费 `self`）。
pub struct MethodInvocation<'a> {
    instance: &'a dyn Any,
    method: &'static MethodMetadata,
    arguments: &'a [&'a dyn Any],
    next: Next<'a>,
}

impl<'a> MethodInvocation<'a> {
    /// 创建有返回值方法的调用对象
    pub fn returning<F>(
        instance: &'a dyn Any,
        method: &'static MethodMetadata,
        arguments: &'a [&'a dyn Any],
        proceed: F,
    ) -> Self
    where
        F: FnOnce() -> Result<Value, Thrown> + 'a,
    {
        Self {
            instance,
            method,
            arguments,
            next: Next::Returning(Box::new(proceed)),
        }
    }

    /// 创建无返回值方法的调用对象
    pub fn no_return<F>(
        instance: &'a dyn Any,
        method: &'static MethodMetadata,
        arguments: &'a [&'a dyn Any],
        proceed: F,
    ) -> Self
    where
        F: FnOnce() -> Result<(), Thrown> + 'a,
    {
        Self {
            instance,
            method,
            arguments,
            next: Next::NoReturn(Box::new(proceed)),
        }
    }

    /// 被拦截的实例
    pub fn instance(&self) -> &'a dyn Any {
        self.instance
    }

    /// 尝试以具体类型获取被拦截的实例
    pub fn instance_as<T: Any>(&self) -> Option<&'a T> {
        self.instance.downcast_ref::<T>()
    }

    /// 被拦截的方法（原始类中的声明）
    pub fn method(&self) -> &'static MethodMetadata {
        self.method
    }

    /// 调用参数
    pub fn arguments(&self) -> &'a [&'a dyn Any] {
        self.arguments
    }

    /// 尝试获取指定位置的参数
    pub fn argument<T: Any>(&self, index: usize) -> Option<&'a T> {
        self.arguments.get(index)?.downcast_ref::<T>()
    }

    /// 方法上所有运行时注解
    pub fn annotations(&self) -> &'static [AnnotationMetadata] {
        self.method.annotations
    }

    /// 按类型名获取注解，拦截器不必自己遍历注解列表
    pub fn annotation(&self, type_name: &str) -> Option<&'static AnnotationMetadata> {
        self.method.annotation(type_name)
    }

    /// 方法是否有返回值
    pub fn returns_value(&self) -> bool {
        matches!(self.next, Next::Returning(_))
    }

    /// 继续执行下一层
    ///
    /// 对无返回值的方法同样适用，此时返回 `None`
    pub fn proceed(self) -> Result<Option<Value>, Thrown> {
        match self.next {
            Next::Returning(next) => next().map(Some),
            Next::NoReturn(next) => next().map(|()| None),
        }
    }

    /// 继续执行无返回值的下一层
    ///
    /// 对有返回值的方法调用它会丢失返回值，属于契约错误
    pub fn no_return_proceed(self) -> Result<(), Thrown> {
        match self.next {
            Next::NoReturn(next) => next(),
            Next::Returning(_) => {
                tracing::error!(
                    "no_return_proceed() called for value-returning method {}",
                    self.method
                );
                Err(Thrown::ContractViolation(
                    "no_return_proceed() called for a method with a return value",
                ))
            }
        }
    }
}

impl fmt::Debug for MethodInvocation<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodInvocation")
            .field("method", &self.method.signature())
            .field("arguments", &self.arguments.len())
            .field("returns_value", &self.returns_value())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static GREET: MethodMetadata = MethodMetadata {
        declaring_type: "test.Greeter",
        name: "greet",
        parameter_types: &["java.lang.String"],
        annotations: &[AnnotationMetadata::new("test.Logged")],
        returns_value: true,
    };

    struct Greeter;

    #[test]
    fn test_accessors() {
        let name = String::from("chimera");
        let args: [&dyn Any; 1] = [&name];
        let greeter = Greeter;
        let invocation = MethodInvocation::returning(&greeter, &GREET, &args, || {
            Ok(Box::new(1_i32) as Value)
        });

        assert!(invocation.instance_as::<Greeter>().is_some());
        assert_eq!(invocation.argument::<String>(0).map(String::as_str), Some("chimera"));
        assert!(invocation.argument::<i32>(0).is_none());
        assert!(invocation.argument::<String>(1).is_none());
        assert!(invocation.annotation("test.Logged").is_some());
        assert_eq!(invocation.annotations().len(), 1);
        assert!(invocation.returns_value());
    }

    #[test]
    fn test_proceed_on_void_returns_none() {
        let greeter = Greeter;
        let invocation = MethodInvocation::no_return(&greeter, &GREET, &[], || Ok(()));
        assert!(invocation.proceed().unwrap().is_none());
    }

    #[test]
    fn test_no_return_proceed_on_returning_method_is_violation() {
        let greeter = Greeter;
        let invocation =
            MethodInvocation::returning(&greeter, &GREET, &[], || Ok(Box::new(()) as Value));
        let err = invocation.no_return_proceed().unwrap_err();
        assert!(matches!(err, Thrown::ContractViolation(_)));
    }
}
