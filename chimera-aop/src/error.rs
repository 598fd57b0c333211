//! 拦截链中的错误
//!
//! [`Thrown`] 是在拦截链内部传递的"异常"，[`InterceptError`] 是被拦截方法
//! 最终返回给调用方的错误：方法自己声明的错误原样返回，其他一律包装。

use std::error::Error;
use std::fmt;

/// 拦截链内部传递的失败
#[derive(Debug, thiserror::Error)]
pub enum Thrown {
    /// 原始方法返回的、声明过的错误
    #[error("{0}")]
    Declared(Box<dyn Error + Send + Sync>),

    /// 调用对象被错误地使用
    #[error("Invalid method invocation: {0}")]
    ContractViolation(&'static str),

    /// 拦截器自身的失败
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Thrown {
    /// 用声明过的错误构造
    pub fn declared<E>(error: E) -> Self
    where
        E: Error + Send + Sync + 'static,
    {
        Thrown::Declared(Box::new(error))
    }

    /// 是否是原始方法声明的错误
    pub fn is_declared(&self) -> bool {
        matches!(self, Thrown::Declared(_))
    }
}

/// 被拦截方法返回的错误
///
/// `E` 是原始方法声明的错误类型，它会被原样传播；拦截器或契约问题导致的
/// 失败统一放在 `Runtime` 中，因此包装后的方法签名不需要额外的错误类型。
#[derive(Debug)]
pub enum InterceptError<E> {
    /// 原始方法声明的错误
    Declared(E),

    /// 其他所有失败
    Runtime(anyhow::Error),
}

impl<E> InterceptError<E> {
    /// 取出声明过的错误
    pub fn into_declared(self) -> Option<E> {
        match self {
            InterceptError::Declared(error) => Some(error),
            InterceptError::Runtime(_) => None,
        }
    }

    pub fn is_runtime(&self) -> bool {
        matches!(self, InterceptError::Runtime(_))
    }
}

impl<E: fmt::Display> fmt::Display for InterceptError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InterceptError::Declared(error) => write!(f, "{}", error),
            InterceptError::Runtime(error) => write!(f, "Intercepted call failed: {}", error),
        }
    }
}

impl<E> Error for InterceptError<E>
where
    E: Error + 'static,
{
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            InterceptError::Declared(error) => error.source(),
            InterceptError::Runtime(error) => Some(&**error),
        }
    }
}
