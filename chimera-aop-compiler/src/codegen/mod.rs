//! 代码生成
//!
//! - [`InterceptorGenerator`]：为每个类构建拦截子类的结构描述
//! - [`ModuleEmitter`]：构建依赖注入模块
//! - [`JavaWriter`]：把描述渲染成 Java 源码
//! - [`runtime_sources`]：生成代码依赖的运行时类型

mod generator;
mod module;
mod runtime;
mod spec;
mod writer;

pub use generator::InterceptorGenerator;
pub use module::ModuleEmitter;
pub use runtime::{runtime_sources, RuntimeSource};
pub use spec::{
    ConstructorSpec, GeneratedModule, GeneratedType, InterceptedMethod, InterceptorField,
    MethodCache, ModuleBinding, ProceedChain,
};
pub use writer::JavaWriter;
