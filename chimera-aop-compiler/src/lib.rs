// chimera-aop-compiler: 编译时生成拦截子类
//
// 宿主编译器把一轮的元素模型交给处理器，处理器：
// - 校验带标记注解的方法和它们所在的类
// - 为每个类生成 `Interceptor_<Class>` 子类，按注解顺序嵌套拦截器
// - 生成依赖注入模块，把原始类绑定到生成的子类

pub mod binding;
pub mod codegen;
pub mod config;
pub mod constants;
pub mod diagnostic;
pub mod element;
pub mod error;
pub mod filer;
pub mod grouping;
pub mod handler;
pub mod logging;
pub mod options;
pub mod processor;
pub mod round;
pub mod validator;

// 重新导出常用类型
pub use binding::MethodBinding;
pub use codegen::{
    runtime_sources, GeneratedModule, GeneratedType, InterceptorGenerator, JavaWriter,
    ModuleEmitter, ProceedChain, RuntimeSource,
};
pub use config::{
    ConfigValue, Environment, EnvironmentPropertySource, MapPropertySource, PropertySource,
    TomlPropertySource,
};
pub use diagnostic::{CollectingMessager, Diagnostic, DiagnosticKind, Messager, TracingMessager};
pub use element::{
    AnnotationMirror, AnnotationValue, ClassName, Element, ElementKind, ElementRef,
    ExecutableElement, Modifier, NestingKind, PrimitiveType, TypeElement, TypeKind, TypeName,
    VariableElement, Visibility,
};
pub use error::{ProcessorError, Result};
pub use filer::{DirectoryFiler, Filer, MemoryFiler};
pub use grouping::{BindingCollector, ClassGrouping};
pub use handler::{
    AnnotationType, ElementType, HandlerPolicy, HandlerRegistration, HandlerRegistry,
    HandlerRegistryBuilder, InterceptorHandler, RetentionPolicy,
};
pub use logging::{LogFormat, LogLevel, LoggingConfig};
pub use options::ProcessorOptions;
pub use processor::{InterceptorProcessor, ProcessingEnvironment, ProcessingReport};
pub use round::RoundEnvironment;
pub use validator::{Rejection, ValidationPolicy, Validator};

// 导出 inventory，供 submit_handler! 使用
pub use inventory;

/// Prelude 模块，包含实现处理器和驱动处理流程常用的类型
pub mod prelude {
    pub use crate::diagnostic::{CollectingMessager, Messager};
    pub use crate::element::{
        AnnotationMirror, ClassName, ExecutableElement, Modifier, TypeElement, TypeName,
        VariableElement,
    };
    pub use crate::filer::{DirectoryFiler, Filer, MemoryFiler};
    pub use crate::handler::{AnnotationType, HandlerRegistry, InterceptorHandler};
    pub use crate::options::ProcessorOptions;
    pub use crate::processor::{InterceptorProcessor, ProcessingEnvironment, ProcessingReport};
    pub use crate::round::RoundEnvironment;
    pub use crate::submit_handler;
}
