//! 方法校验
//!
//! 检查带标记注解的元素是否可以被拦截。结果是纯判断：接受并返回方法，
//! 或者返回一个 [`Rejection`]，其文本就是报告给宿主的诊断信息。

use crate::constants::is_generated_annotation;
use crate::diagnostic::DiagnosticKind;
use crate::element::{ElementKind, ElementRef, ExecutableElement, Modifier, NestingKind, TypeElement};
use crate::round::RoundEnvironment;
use std::str::FromStr;

/// 校验严格程度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValidationPolicy {
    /// 类中不能有抽象方法；处理生成代码是错误
    #[default]
    Strict,

    /// 允许类中有其他抽象方法；生成代码被跳过并给出警告
    Lenient,
}

impl FromStr for ValidationPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "strict" => Ok(ValidationPolicy::Strict),
            "lenient" => Ok(ValidationPolicy::Lenient),
            _ => Err(format!("Invalid validation policy: {}", s)),
        }
    }
}

/// 拒绝拦截的原因
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    #[error("Intercepted element must be a Method!")]
    NotAMethod,

    #[error("Intercepted methods cannot be Private!")]
    PrivateMethod,

    #[error("Intercepted methods cannot be Final!")]
    FinalMethod,

    #[error("Intercepted methods cannot be Abstract!")]
    AbstractMethod,

    #[error("Intercepted methods cannot be Static!")]
    StaticMethod,

    #[error("Intercepted methods must be declared in a Class!")]
    NotInClass,

    #[error("Generated code cannot be processed!")]
    GeneratedClass,

    #[error("Classes with intercepted methods cannot be Final!")]
    FinalClass,

    #[error("Classes with intercepted methods must be Abstract!")]
    NotAbstractClass,

    #[error("Classes with intercepted methods must be Static if it's an Inner Class!")]
    NonStaticInnerClass,

    #[error("Classes with intercepted methods must have only one constructor!")]
    MultipleConstructors,

    #[error("Classes with intercepted methods cannot have a Private constructor!")]
    PrivateConstructor,

    #[error("Classes with intercepted methods cannot have Abstract methods!")]
    AbstractMethodsInClass,

    /// 处理器自己的校验
    #[error("{0}")]
    Handler(String),
}

/// 方法校验器
#[derive(Debug, Clone, Copy, Default)]
pub struct Validator {
    policy: ValidationPolicy,
}

impl Validator {
    pub fn new(policy: ValidationPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> ValidationPolicy {
        self.policy
    }

    /// 校验一个带标记注解的元素
    pub fn validate<'r>(
        &self,
        round: &'r RoundEnvironment,
        element: ElementRef<'r>,
    ) -> Result<&'r ExecutableElement, Rejection> {
        let method = match element {
            ElementRef::Executable(method) if method.kind == ElementKind::Method => method,
            _ => return Err(Rejection::NotAMethod),
        };

        if method.has_modifier(Modifier::Private) {
            return Err(Rejection::PrivateMethod);
        }
        if method.has_modifier(Modifier::Final) {
            return Err(Rejection::FinalMethod);
        }
        if method.has_modifier(Modifier::Abstract) {
            return Err(Rejection::AbstractMethod);
        }
        if method.has_modifier(Modifier::Static) {
            return Err(Rejection::StaticMethod);
        }

        let class = round
            .enclosing_type(method)
            .ok_or(Rejection::NotInClass)?;
        self.validate_class(class)?;

        Ok(method)
    }

    /// 方法所在类的校验
    pub fn validate_class(&self, class: &TypeElement) -> Result<(), Rejection> {
        if class.kind != ElementKind::Class {
            return Err(Rejection::NotInClass);
        }
        if class
            .annotations
            .iter()
            .any(|a| is_generated_annotation(&a.annotation_type.canonical_name()))
        {
            return Err(Rejection::GeneratedClass);
        }
        if class.has_modifier(Modifier::Final) {
            return Err(Rejection::FinalClass);
        }
        // 防止直接实例化未被拦截的原始类
        if !class.has_modifier(Modifier::Abstract) {
            return Err(Rejection::NotAbstractClass);
        }
        if class.nesting == NestingKind::Member && !class.has_modifier(Modifier::Static) {
            return Err(Rejection::NonStaticInnerClass);
        }

        let constructors: Vec<&ExecutableElement> = class.constructors().collect();
        if constructors.len() > 1 {
            return Err(Rejection::MultipleConstructors);
        }
        if constructors
            .first()
            .is_some_and(|c| c.has_modifier(Modifier::Private))
        {
            return Err(Rejection::PrivateConstructor);
        }

        if self.policy == ValidationPolicy::Strict
            && class.methods().any(|m| m.has_modifier(Modifier::Abstract))
        {
            return Err(Rejection::AbstractMethodsInClass);
        }

        Ok(())
    }

    /// 拒绝原因对应的诊断级别
    pub fn severity(&self, rejection: &Rejection) -> DiagnosticKind {
        match (rejection, self.policy) {
            (Rejection::GeneratedClass, ValidationPolicy::Lenient) => DiagnosticKind::Warning,
            _ => DiagnosticKind::Error,
        }
    }
}
