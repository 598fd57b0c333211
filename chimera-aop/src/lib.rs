//! Chimera AOP - 编译时拦截的运行时契约
//!
//! 编译器生成的子类在每次调用被拦截的方法时，按注解顺序把方法体
//! 包进一层层的调用对象，并交给对应的拦截器：
//! - 方法元数据在生成时就写成静态表（[`MethodMetadata`]），不在调用时查找
//! - 每个拦截器只看到一个 [`MethodInvocation`]，通过 `proceed` 继续下一层
//! - [`InterceptorChain`] 以 fold 的方式组合任意多个拦截器
//! - 方法自己声明的错误原样返回，其余失败统一包装为运行时错误

pub mod chain;
pub mod error;
pub mod invocation;
pub mod metadata;

// 重新导出核心类型
pub use chain::{InterceptorChain, MethodInterceptor};
pub use error::{InterceptError, Thrown};
pub use invocation::{MethodInvocation, Value};
pub use metadata::{AnnotationMetadata, MethodMetadata};

/// 预导入模块
pub mod prelude {
    pub use crate::chain::{InterceptorChain, MethodInterceptor};
    pub use crate::error::{InterceptError, Thrown};
    pub use crate::invocation::{MethodInvocation, Value};
    pub use crate::metadata::{AnnotationMetadata, MethodMetadata};
}
