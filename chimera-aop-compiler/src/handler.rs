//! 拦截器处理器（InterceptorHandler）与注册表
//!
//! 每个处理器把一个标记注解绑定到一个拦截器类型。注册表在处理器启动时
//! 构建一次，之后在所有处理轮次中复用。

use crate::element::{ClassName, ExecutableElement, TypeElement};
use crate::error::{ProcessorError, Result};
use crate::processor::ProcessingEnvironment;
use std::str::FromStr;

/// 注解的保留策略
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetentionPolicy {
    Source,
    Class,
    Runtime,
}

/// 注解可以作用的目标
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementType {
    Type,
    Field,
    Method,
    Parameter,
    Constructor,
    LocalVariable,
    AnnotationType,
    Package,
    TypeParameter,
    TypeUse,
}

/// 标记注解的运行时元数据
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnnotationType {
    pub name: ClassName,

    /// `@Retention`，缺省即 `CLASS`
    pub retention: Option<RetentionPolicy>,

    /// `@Target`，缺省表示可以用在大多数声明上
    pub targets: Option<Vec<ElementType>>,
}

impl AnnotationType {
    /// 没有 `@Retention` 和 `@Target` 的注解
    pub fn new(name: ClassName) -> Self {
        Self {
            name,
            retention: None,
            targets: None,
        }
    }

    /// `@Retention(RUNTIME) @Target(METHOD)` 的注解
    pub fn method_annotation(name: ClassName) -> Self {
        Self {
            name,
            retention: Some(RetentionPolicy::Runtime),
            targets: Some(vec![ElementType::Method]),
        }
    }

    pub fn with_retention(mut self, retention: RetentionPolicy) -> Self {
        self.retention = Some(retention);
        self
    }

    pub fn with_targets(mut self, targets: Vec<ElementType>) -> Self {
        self.targets = Some(targets);
        self
    }

    /// 检查是否可以作为标记注解，失败时返回缺少的要求
    pub fn check(&self) -> std::result::Result<(), &'static str> {
        if self.retention != Some(RetentionPolicy::Runtime) {
            return Err("Retention set to RUNTIME");
        }
        match self.targets.as_deref() {
            Some([ElementType::Method]) => Ok(()),
            _ => Err("Target set to METHOD"),
        }
    }
}

/// 拦截器处理器
///
/// 负责一个标记注解：声明它对应的拦截器类型，可以额外校验被拦截的方法，
/// 并在生成结束后收到处理过的类。
pub trait InterceptorHandler: Send + Sync {
    /// 处理的标记注解
    fn annotation(&self) -> AnnotationType;

    /// 拦截器类型，生成类中会注入一个该类型的字段
    fn interceptor_type(&self) -> ClassName;

    /// 处理器名称，出现在诊断信息中
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// 校验被拦截的方法，返回 `Some(message)` 表示拒绝
    fn validate_method(&self, _method: &ExecutableElement) -> Option<String> {
        None
    }

    /// 生成结束后调用，`classes` 是带有此注解的方法所在的类
    fn post_process(&self, _env: &mut ProcessingEnvironment<'_>, _classes: &[&TypeElement]) {}
}

/// 处理器配置错误时的策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HandlerPolicy {
    /// 任何配置错误都中止处理
    #[default]
    FailFast,

    /// 丢弃有问题的处理器并记录警告
    Lenient,
}

impl FromStr for HandlerPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "fail-fast" | "failfast" | "strict" => Ok(HandlerPolicy::FailFast),
            "lenient" => Ok(HandlerPolicy::Lenient),
            _ => Err(format!("Invalid handler policy: {}", s)),
        }
    }
}

/// 通过 inventory 收集的处理器
pub struct HandlerRegistration {
    pub create: fn() -> Box<dyn InterceptorHandler>,
}

inventory::collect!(HandlerRegistration);

/// 注册一个处理器，使其能被 [`HandlerRegistry::discover`] 找到
#[macro_export]
macro_rules! submit_handler {
    ($handler_type:ty) => {
        $crate::inventory::submit! {
            $crate::HandlerRegistration {
                create: || Box::new(<$handler_type>::default())
            }
        }
    };
}

/// 处理器注册表
pub struct HandlerRegistry {
    /// 按注册顺序
    handlers: Vec<Box<dyn InterceptorHandler>>,

    /// 宽松策略下被丢弃的处理器
    warnings: Vec<String>,
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("annotations", &self.annotations())
            .field("warnings", &self.warnings)
            .finish()
    }
}

impl HandlerRegistry {
    pub fn builder() -> HandlerRegistryBuilder {
        HandlerRegistryBuilder::default()
    }

    /// 从所有通过 `submit_handler!` 注册的处理器构建
    pub fn discover(policy: HandlerPolicy) -> Result<Self> {
        let mut builder = Self::builder().policy(policy);
        for registration in inventory::iter::<HandlerRegistration> {
            builder = builder.register_boxed((registration.create)());
        }
        builder.build()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// 所有处理器，按注册顺序
    pub fn handlers(&self) -> impl Iterator<Item = &dyn InterceptorHandler> {
        self.handlers.iter().map(|h| h.as_ref())
    }

    /// 按注解查找处理器
    pub fn get(&self, annotation: &ClassName) -> Option<&dyn InterceptorHandler> {
        self.handlers()
            .find(|h| &h.annotation().name == annotation)
    }

    /// 所有标记注解，按注册顺序
    pub fn annotations(&self) -> Vec<ClassName> {
        self.handlers.iter().map(|h| h.annotation().name).collect()
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }
}

/// 注册表构建器
#[derive(Default)]
pub struct HandlerRegistryBuilder {
    policy: HandlerPolicy,
    candidates: Vec<Box<dyn InterceptorHandler>>,
}

impl HandlerRegistryBuilder {
    pub fn policy(mut self, policy: HandlerPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn register<H>(self, handler: H) -> Self
    where
        H: InterceptorHandler + 'static,
    {
        self.register_boxed(Box::new(handler))
    }

    pub fn register_boxed(mut self, handler: Box<dyn InterceptorHandler>) -> Self {
        self.candidates.push(handler);
        self
    }

    /// 校验所有处理器并构建注册表
    ///
    /// 同一个注解先注册的处理器生效
    pub fn build(self) -> Result<HandlerRegistry> {
        let mut handlers: Vec<Box<dyn InterceptorHandler>> = Vec::new();
        let mut warnings = Vec::new();

        for handler in self.candidates {
            let annotation = handler.annotation();

            let existing = handlers
                .iter()
                .find(|h| h.annotation().name == annotation.name)
                .map(|h| h.name());

            let problem = match (annotation.check(), existing) {
                (Err(requirement), _) => ProcessorError::InvalidHandler {
                    handler: handler.name().to_string(),
                    annotation: annotation.name.clone(),
                    requirement,
                },
                (Ok(()), Some(existing)) => ProcessorError::DuplicateHandler {
                    annotation: annotation.name.clone(),
                    existing: existing.to_string(),
                    rejected: handler.name().to_string(),
                },
                (Ok(()), None) => {
                    tracing::debug!(
                        "Registering handler {} for @{}",
                        handler.name(),
                        annotation.name
                    );
                    handlers.push(handler);
                    continue;
                }
            };

            match self.policy {
                HandlerPolicy::FailFast => return Err(problem),
                HandlerPolicy::Lenient => {
                    tracing::warn!("Skipping handler: {}", problem);
                    warnings.push(problem.to_string());
                }
            }
        }

        tracing::info!("Registered {} interceptor handlers", handlers.len());
        Ok(HandlerRegistry { handlers, warnings })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Handler {
        annotation: AnnotationType,
    }

    impl InterceptorHandler for Handler {
        fn annotation(&self) -> AnnotationType {
            self.annotation.clone()
        }

        fn interceptor_type(&self) -> ClassName {
            ClassName::new("test", "Interceptor")
        }
    }

    fn handler(annotation: AnnotationType) -> Handler {
        Handler { annotation }
    }

    #[test]
    fn test_annotation_check() {
        let name = ClassName::new("test", "Logged");
        assert!(AnnotationType::method_annotation(name.clone()).check().is_ok());
        assert_eq!(
            AnnotationType::new(name.clone()).check(),
            Err("Retention set to RUNTIME")
        );
        assert_eq!(
            AnnotationType::new(name.clone())
                .with_retention(RetentionPolicy::Runtime)
                .check(),
            Err("Target set to METHOD")
        );
        assert_eq!(
            AnnotationType::new(name)
                .with_retention(RetentionPolicy::Runtime)
                .with_targets(vec![ElementType::Method, ElementType::Type])
                .check(),
            Err("Target set to METHOD")
        );
    }

    #[test]
    fn test_fail_fast_rejects_invalid_annotation() {
        let result = HandlerRegistry::builder()
            .register(handler(
                AnnotationType::new(ClassName::new("test", "Bad"))
                    .with_retention(RetentionPolicy::Source)
                    .with_targets(vec![ElementType::Method]),
            ))
            .build();

        let message = result.unwrap_err().to_string();
        assert!(message.contains("Annotation 'test.Bad' must have Retention set to RUNTIME."));
    }

    #[test]
    fn test_lenient_drops_invalid_and_duplicate() {
        let good = ClassName::new("test", "Good");
        let registry = HandlerRegistry::builder()
            .policy(HandlerPolicy::Lenient)
            .register(handler(AnnotationType::method_annotation(good.clone())))
            .register(handler(AnnotationType::new(ClassName::new("test", "Bad"))))
            .register(handler(AnnotationType::method_annotation(good.clone())))
            .build()
            .unwrap();

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.annotations(), vec![good.clone()]);
        assert_eq!(registry.warnings().len(), 2);
        assert!(registry.get(&good).is_some());
    }

    #[test]
    fn test_fail_fast_rejects_duplicate() {
        let good = ClassName::new("test", "Good");
        let result = HandlerRegistry::builder()
            .register(handler(AnnotationType::method_annotation(good.clone())))
            .register(handler(AnnotationType::method_annotation(good)))
            .build();
        assert!(matches!(result, Err(ProcessorError::DuplicateHandler { .. })));
    }

    #[test]
    fn test_policy_from_str() {
        assert_eq!("fail-fast".parse::<HandlerPolicy>().unwrap(), HandlerPolicy::FailFast);
        assert_eq!("Lenient".parse::<HandlerPolicy>().unwrap(), HandlerPolicy::Lenient);
        assert!("sometimes".parse::<HandlerPolicy>().is_err());
    }
}
