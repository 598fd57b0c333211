//! 生成类型的结构化描述
//!
//! 生成器只产出这些描述，渲染成源码文本由 [`super::JavaWriter`] 完成。

use crate::element::{AnnotationMirror, ClassName, Modifier, TypeName, TypeParameter, VariableElement};
use std::collections::BTreeSet;

/// 生成的拦截子类
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedType {
    /// `Interceptor_<Outer_Inner>`，与原始类同包
    pub name: ClassName,
    pub superclass: ClassName,
    pub modifiers: BTreeSet<Modifier>,

    /// 运行时库中的调用对象基类
    pub invocation_type: ClassName,

    /// `@Generated` 在前，之后是原始类上的注解
    pub annotations: Vec<AnnotationMirror>,

    /// 父类的成员类型简单名，生成类里这些简单名指向继承来的成员类型
    pub member_types: BTreeSet<String>,

    /// 每个被拦截方法的反射缓存，顺序与 `methods` 一致
    pub caches: Vec<MethodCache>,

    /// 每个标记注解一个拦截器字段
    pub interceptor_fields: Vec<InterceptorField>,

    pub constructor: ConstructorSpec,
    pub methods: Vec<InterceptedMethod>,
}

impl GeneratedType {
    pub fn qualified_name(&self) -> String {
        self.name.canonical_name()
    }

    pub fn method(&self, name: &str) -> Option<&InterceptedMethod> {
        self.methods.iter().find(|m| m.name == name)
    }

    pub fn cache(&self, method_field: &str) -> Option<&MethodCache> {
        self.caches.iter().find(|c| c.method_field == method_field)
    }
}

/// 拦截器字段，同时也是构造函数参数
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterceptorField {
    pub annotation: ClassName,
    pub interceptor_type: ClassName,
    pub name: String,
}

/// 一个方法的反射缓存：`Method` 和它的运行时注解列表
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodCache {
    pub method_field: String,
    pub annotations_field: String,

    /// 在父类上查找的方法名
    pub method_name: String,

    /// 查找用的参数类型（已擦除）
    pub parameter_types: Vec<TypeName>,
}

/// 生成类的构造函数
#[derive(Debug, Clone, PartialEq)]
pub struct ConstructorSpec {
    pub annotations: Vec<AnnotationMirror>,
    pub modifiers: BTreeSet<Modifier>,
    pub type_parameters: Vec<TypeParameter>,

    /// 原始参数在前，拦截器参数在后
    pub parameters: Vec<VariableElement>,
    pub thrown_types: Vec<TypeName>,
    pub varargs: bool,

    /// 传给 `super(...)` 的参数名
    pub super_arguments: Vec<String>,

    /// 在构造函数中赋值的字段
    pub assigned_fields: Vec<String>,
}

/// 拦截链
///
/// 对注解列表从后往前 fold：最内层是父类方法调用，每个注解包一层，
/// 第一个注解在最外层。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProceedChain {
    /// 调用父类的原始实现
    Super {
        method: String,
        arguments: Vec<String>,
    },

    /// 一层拦截
    Intercept {
        interceptor: String,
        method_cache: String,
        annotations_cache: String,
        next: Box<ProceedChain>,
    },
}

impl ProceedChain {
    /// `interceptors` 从外到内
    pub fn build(
        method: &str,
        arguments: Vec<String>,
        interceptors: &[String],
        cache: &MethodCache,
    ) -> Self {
        let innermost = ProceedChain::Super {
            method: method.to_string(),
            arguments,
        };
        interceptors
            .iter()
            .rev()
            .fold(innermost, |next, interceptor| ProceedChain::Intercept {
                interceptor: interceptor.clone(),
                method_cache: cache.method_field.clone(),
                annotations_cache: cache.annotations_field.clone(),
                next: Box::new(next),
            })
    }

    /// 从外到内的拦截器字段名
    pub fn interceptors(&self) -> Vec<&str> {
        let mut out = Vec::new();
        let mut current = self;
        while let ProceedChain::Intercept {
            interceptor, next, ..
        } = current
        {
            out.push(interceptor.as_str());
            current = next.as_ref();
        }
        out
    }

    pub fn depth(&self) -> usize {
        self.interceptors().len()
    }
}

/// 生成的重写方法
#[derive(Debug, Clone, PartialEq)]
pub struct InterceptedMethod {
    pub name: String,
    pub modifiers: BTreeSet<Modifier>,
    pub type_parameters: Vec<TypeParameter>,
    pub parameters: Vec<VariableElement>,
    pub return_type: TypeName,
    pub thrown_types: Vec<TypeName>,
    pub varargs: bool,

    pub chain: ProceedChain,

    /// 在 `catch (Throwable)` 中按声明顺序判断并原样抛出的异常
    pub rethrown: Vec<TypeName>,

    /// 其余 Throwable 是否包装为 RuntimeException
    pub wraps_throwable: bool,

    /// 参数数组的局部变量名
    pub arguments_var: String,

    /// catch 子句的变量名
    pub exception_var: String,
}

impl InterceptedMethod {
    pub fn returns_value(&self) -> bool {
        !self.return_type.is_void()
    }
}

/// 依赖注入模块
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedModule {
    pub name: ClassName,
    pub javadoc: String,
    pub annotations: Vec<AnnotationMirror>,
    pub bindings: Vec<ModuleBinding>,
}

impl GeneratedModule {
    pub fn qualified_name(&self) -> String {
        self.name.canonical_name()
    }
}

/// 模块中的一个 `@Binds` 方法
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleBinding {
    pub method_name: String,
    pub original: ClassName,
    pub generated: ClassName,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache() -> MethodCache {
        MethodCache {
            method_field: "workCache$".to_string(),
            annotations_field: "workAnnotationsCache$".to_string(),
            method_name: "work".to_string(),
            parameter_types: vec![],
        }
    }

    #[test]
    fn test_first_interceptor_is_outermost() {
        let chain = ProceedChain::build(
            "work",
            vec![],
            &["$interceptorA".to_string(), "$interceptorB".to_string()],
            &cache(),
        );
        assert_eq!(chain.interceptors(), vec!["$interceptorA", "$interceptorB"]);
        assert_eq!(chain.depth(), 2);

        let ProceedChain::Intercept { next, .. } = &chain else {
            panic!("expected an interceptor layer");
        };
        let ProceedChain::Intercept { next: innermost, .. } = next.as_ref() else {
            panic!("expected a second layer");
        };
        assert!(matches!(innermost.as_ref(), ProceedChain::Super { method, .. } if method == "work"));
    }

    #[test]
    fn test_empty_chain_is_super_call() {
        let chain = ProceedChain::build("work", vec!["a".to_string()], &[], &cache());
        assert_eq!(chain.depth(), 0);
    }
}
