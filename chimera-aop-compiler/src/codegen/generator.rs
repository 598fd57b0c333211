//! 拦截子类生成
//!
//! 每个类一次：根据分组好的绑定构建 [`GeneratedType`]。生成器只做结构上的
//! 决定（命名、字段、构造函数、拦截链），文本由 [`super::JavaWriter`] 输出。

use super::spec::{
    ConstructorSpec, GeneratedType, InterceptedMethod, InterceptorField, MethodCache,
    ProceedChain,
};
use crate::constants::*;
use crate::element::{
    AnnotationMirror, AnnotationValue, ClassName, ExecutableElement, Modifier, TypeElement,
    TypeName, VariableElement,
};
use crate::error::{ProcessorError, Result};
use crate::grouping::ClassGrouping;
use crate::handler::HandlerRegistry;
use std::collections::{BTreeSet, HashMap, HashSet};

/// 拦截子类生成器
pub struct InterceptorGenerator<'a> {
    registry: &'a HandlerRegistry,
    runtime_package: String,
}

impl<'a> InterceptorGenerator<'a> {
    pub fn new(registry: &'a HandlerRegistry, runtime_package: impl Into<String>) -> Self {
        Self {
            registry,
            runtime_package: runtime_package.into(),
        }
    }

    /// 生成类名：`Interceptor_` 加上由外到内用 `_` 连接的简单名
    pub fn interceptor_name(original: &ClassName) -> ClassName {
        ClassName::new(
            original.package(),
            format!(
                "{}{}",
                INTERCEPTOR_CLASS_PREFIX,
                original.simple_names().join("_")
            ),
        )
    }

    /// 为一个类生成拦截子类
    pub fn generate(&self, grouping: &ClassGrouping<'_>) -> Result<GeneratedType> {
        let class = grouping.class();
        let name = Self::interceptor_name(&class.name);
        tracing::debug!(
            "Generating {} for {} intercepted methods",
            name,
            grouping.bindings().len()
        );

        let fields = self.interceptor_fields(grouping)?;
        let field_of: HashMap<&ClassName, &str> = fields
            .iter()
            .map(|f| (&f.annotation, f.name.as_str()))
            .collect();

        let mut caches = Vec::new();
        let mut methods = Vec::new();
        let mut overloads: HashMap<&str, usize> = HashMap::new();
        for binding in grouping.bindings() {
            let method = binding.method();

            let seen = overloads.entry(method.name.as_str()).or_insert(0);
            let base = match *seen {
                0 => method.name.clone(),
                n => format!("{}${}", method.name, n),
            };
            *seen += 1;

            let cache = MethodCache {
                method_field: format!("{}{}", base, METHOD_CACHE_SUFFIX),
                annotations_field: format!("{}{}", base, ANNOTATIONS_CACHE_SUFFIX),
                method_name: method.name.clone(),
                parameter_types: method.parameters.iter().map(|p| p.ty.erasure()).collect(),
            };

            let interceptors: Vec<String> = binding
                .annotations()
                .iter()
                .filter_map(|a| field_of.get(a).map(|f| f.to_string()))
                .collect();
            methods.push(Self::intercepted_method(method, &interceptors, &cache));
            caches.push(cache);
        }

        Ok(GeneratedType {
            name,
            superclass: class.name.clone(),
            modifiers: BTreeSet::from([Modifier::Public, Modifier::Final]),
            invocation_type: ClassName::new(
                self.runtime_package.as_str(),
                ABSTRACT_METHOD_INVOCATION,
            ),
            annotations: Self::type_annotations(class),
            member_types: class
                .nested_types()
                .map(|t| t.name.simple_name().to_string())
                .collect(),
            caches,
            constructor: Self::constructor(class, &fields),
            interceptor_fields: fields,
            methods,
        })
    }

    /// 类中每个标记注解一个字段，按第一次出现的顺序
    fn interceptor_fields(&self, grouping: &ClassGrouping<'_>) -> Result<Vec<InterceptorField>> {
        let mut used: HashSet<String> = HashSet::new();
        let mut fields = Vec::new();
        for annotation in grouping.annotations() {
            let handler = self
                .registry
                .get(annotation)
                .ok_or_else(|| ProcessorError::UnknownAnnotation(annotation.clone()))?;

            let base = format!("{}{}", INTERCEPTOR_FIELD_PREFIX, annotation.simple_name());
            let mut name = base.clone();
            let mut suffix = 2;
            while used.contains(&name) {
                name = format!("{}{}", base, suffix);
                suffix += 1;
            }
            used.insert(name.clone());

            fields.push(InterceptorField {
                annotation: annotation.clone(),
                interceptor_type: handler.interceptor_type(),
                name,
            });
        }
        Ok(fields)
    }

    /// `@Generated` 在前，然后是原始类自己的注解
    fn type_annotations(class: &TypeElement) -> Vec<AnnotationMirror> {
        let generated = AnnotationMirror::of(class_name(GENERATED_ANNOTATIONS[0]))
            .with_value("value", AnnotationValue::String(GENERATOR_ID.to_string()))
            .with_value(
                "comments",
                AnnotationValue::String(GENERATED_COMMENTS.to_string()),
            );

        let mut annotations = vec![generated];
        annotations.extend(class.annotations.iter().cloned());
        annotations
    }

    /// 克隆原始构造函数（没有则合成一个 public 无参构造），加上 `@Inject`
    /// 和拦截器参数
    fn constructor(class: &TypeElement, fields: &[InterceptorField]) -> ConstructorSpec {
        let inject = class_name(INJECT_ANNOTATION);

        let mut constructor = match class.constructors().next() {
            Some(original) => ConstructorSpec {
                annotations: original.annotations.clone(),
                modifiers: original.modifiers.clone(),
                type_parameters: original.type_parameters.clone(),
                parameters: original.parameters.clone(),
                thrown_types: original.thrown_types.clone(),
                // 拦截器参数追加在最后，可变参数按数组声明
                varargs: false,
                super_arguments: original.parameters.iter().map(|p| p.name.clone()).collect(),
                assigned_fields: Vec::new(),
            },
            None => ConstructorSpec {
                annotations: Vec::new(),
                modifiers: BTreeSet::from([Modifier::Public]),
                type_parameters: Vec::new(),
                parameters: Vec::new(),
                thrown_types: Vec::new(),
                varargs: false,
                super_arguments: Vec::new(),
                assigned_fields: Vec::new(),
            },
        };

        if !constructor.annotations.iter().any(|a| a.annotation_type == inject) {
            constructor.annotations.push(AnnotationMirror::of(inject));
        }

        for field in fields {
            constructor.parameters.push(
                VariableElement::parameter(
                    field.name.as_str(),
                    TypeName::class(field.interceptor_type.clone()),
                )
                .with_modifiers([Modifier::Final]),
            );
            constructor.assigned_fields.push(field.name.clone());
        }
        constructor
    }

    fn intercepted_method(
        method: &ExecutableElement,
        interceptors: &[String],
        cache: &MethodCache,
    ) -> InterceptedMethod {
        let parameter_names: Vec<String> =
            method.parameters.iter().map(|p| p.name.clone()).collect();

        let mut modifiers = method.modifiers.clone();
        for modifier in [Modifier::Abstract, Modifier::Default, Modifier::Native] {
            modifiers.remove(&modifier);
        }

        // 声明了 Throwable 时异常原样抛出，不再逐个判断
        let throwable = TypeName::class(class_name(THROWABLE));
        let wraps_throwable = !method.thrown_types.contains(&throwable);
        let rethrown = if wraps_throwable {
            method.thrown_types.clone()
        } else {
            Vec::new()
        };

        InterceptedMethod {
            name: method.name.clone(),
            modifiers,
            type_parameters: method.type_parameters.clone(),
            parameters: method.parameters.clone(),
            return_type: method.return_type.clone(),
            thrown_types: method.thrown_types.clone(),
            varargs: method.varargs,
            chain: ProceedChain::build(&method.name, parameter_names.clone(), interceptors, cache),
            rethrown,
            wraps_throwable,
            arguments_var: local_name("arguments", &parameter_names),
            exception_var: local_name("e", &parameter_names),
        }
    }

    /// 确认每个缓存查找都能在父类上找到声明的方法
    pub fn verify(generated: &GeneratedType, original: &TypeElement) -> Result<()> {
        for cache in &generated.caches {
            let found = original.methods().any(|m| {
                m.name == cache.method_name
                    && m.parameters.len() == cache.parameter_types.len()
                    && m.parameters
                        .iter()
                        .zip(&cache.parameter_types)
                        .all(|(p, ty)| &p.ty.erasure() == ty)
            });
            if !found {
                let types: Vec<String> =
                    cache.parameter_types.iter().map(|t| t.to_string()).collect();
                return Err(ProcessorError::CacheMismatch {
                    superclass: original.name.clone(),
                    lookup: format!("{}({})", cache.method_name, types.join(", ")),
                });
            }
        }
        Ok(())
    }
}

/// 不与参数重名的局部变量名
fn local_name(preferred: &str, taken: &[String]) -> String {
    let mut name = preferred.to_string();
    while taken.iter().any(|t| t == &name) {
        name.push('$');
    }
    name
}
