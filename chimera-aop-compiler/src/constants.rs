//! 处理器使用的名称常量
//!
//! 生成代码引用的外部类型、生成类和字段的命名规则、处理器选项的键，
//! 集中定义在这里，生成器、校验器和测试使用同一份。

use crate::element::ClassName;

/// 处理器选项
pub const OPTION_DISABLE_MODULE_GENERATION: &str = "disable-module-generation";
pub const OPTION_DISABLE_RUNTIME_GENERATION: &str = "disable-runtime-generation";
pub const OPTION_MODULE_PACKAGE: &str = "module-package";
pub const OPTION_RUNTIME_PACKAGE: &str = "runtime-package";
pub const OPTION_VALIDATION_POLICY: &str = "validation-policy";
pub const OPTION_HANDLER_POLICY: &str = "handler-policy";
pub const OPTION_CONFIG_FILE: &str = "config-file";
pub const OPTION_LOG_LEVEL: &str = "log-level";
pub const OPTION_LOG_FORMAT: &str = "log-format";

/// 读取处理器选项的环境变量前缀
pub const OPTION_ENV_PREFIX: &str = "CHIMERA_AOP_";

/// 运行时库的默认包名
pub const DEFAULT_RUNTIME_PACKAGE: &str = "com.chimera.aop";

/// 写入 `@Generated(value = ...)` 的生成器标识
pub const GENERATOR_ID: &str = "chimera_aop_compiler::InterceptorProcessor";
pub const GENERATED_COMMENTS: &str = "https://github.com/hoowhoami/chimera";

/// 生成类名前缀
pub const INTERCEPTOR_CLASS_PREFIX: &str = "Interceptor_";

/// 拦截器字段名前缀
pub const INTERCEPTOR_FIELD_PREFIX: &str = "$interceptor";

/// 方法缓存字段后缀
pub const METHOD_CACHE_SUFFIX: &str = "Cache$";
pub const ANNOTATIONS_CACHE_SUFFIX: &str = "AnnotationsCache$";

/// 默认模块名
pub const MODULE_CLASS_NAME: &str = "InterceptorModule";

/// 模块绑定方法前缀
pub const MODULE_METHOD_PREFIX: &str = "provides";

/// 运行时库中的调用对象基类
pub const ABSTRACT_METHOD_INVOCATION: &str = "AbstractMethodInvocation";
pub const METHOD_INVOCATION: &str = "MethodInvocation";
pub const METHOD_INTERCEPTOR: &str = "MethodInterceptor";

/// 外部类型
pub const GENERATED_ANNOTATIONS: &[&str] = &[
    "javax.annotation.Generated",
    "javax.annotation.processing.Generated",
];
pub const INJECT_ANNOTATION: &str = "javax.inject.Inject";
pub const MODULE_ANNOTATION: &str = "dagger.Module";
pub const BINDS_ANNOTATION: &str = "dagger.Binds";
pub const OVERRIDE_ANNOTATION: &str = "java.lang.Override";
pub const RUNTIME_EXCEPTION: &str = "java.lang.RuntimeException";
pub const OBJECT: &str = "java.lang.Object";
pub const THROWABLE: &str = "java.lang.Throwable";
pub const METHOD: &str = "java.lang.reflect.Method";
pub const ANNOTATION: &str = "java.lang.annotation.Annotation";
pub const LIST: &str = "java.util.List";
pub const ARRAYS: &str = "java.util.Arrays";
pub const NO_SUCH_METHOD_EXCEPTION: &str = "java.lang.NoSuchMethodException";
pub const SECURITY_EXCEPTION: &str = "java.lang.SecurityException";

/// 顶层 Java 类型常量对应的类名
pub fn class_name(canonical: &str) -> ClassName {
    let (package, simple_name) = canonical.rsplit_once('.').unwrap_or(("", canonical));
    ClassName::new(package, simple_name)
}

/// 是否是"生成代码"标记注解
pub fn is_generated_annotation(type_name: &str) -> bool {
    GENERATED_ANNOTATIONS.contains(&type_name)
}
