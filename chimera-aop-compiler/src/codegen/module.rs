//! 依赖注入模块生成
//!
//! 为每个生成的拦截子类输出一个 `@Binds` 方法，把原始抽象类绑定到它的子类。

use super::generator::InterceptorGenerator;
use super::spec::{GeneratedModule, ModuleBinding};
use crate::constants::*;
use crate::diagnostic::Messager;
use crate::element::{AnnotationMirror, AnnotationValue, ClassName, ElementRef};
use crate::round::RoundEnvironment;

const MODULE_JAVADOC: &str = "This class is the default Dagger module for Intercepted Methods.";

/// 模块生成器
pub struct ModuleEmitter {
    package: String,
}

impl ModuleEmitter {
    /// `package` 是模块所在的包
    pub fn new(package: impl Into<String>) -> Self {
        Self {
            package: package.into(),
        }
    }

    pub fn module_name(&self) -> ClassName {
        ClassName::new(self.package.as_str(), MODULE_CLASS_NAME)
    }

    /// 绑定方法名：`provides` 加上由外到内用 `_` 连接的简单名
    pub fn method_name(original: &ClassName) -> String {
        format!("{}{}", MODULE_METHOD_PREFIX, original.simple_names().join("_"))
    }

    /// 为 `originals` 中的类生成模块
    ///
    /// 从模块包不可见的类被跳过并给出警告；没有任何绑定时返回 `None`。
    pub fn emit(
        &self,
        round: &RoundEnvironment,
        originals: &[ClassName],
        messager: &mut dyn Messager,
    ) -> Option<GeneratedModule> {
        let mut originals: Vec<&ClassName> = originals.iter().collect();
        originals.sort();
        originals.dedup();

        let mut bindings = Vec::new();
        for original in originals {
            if !round.is_visible_from(original, &self.package) {
                tracing::warn!(
                    "{} is not visible from package '{}', skipping module binding",
                    original,
                    self.package
                );
                messager.warning(
                    "Could not create InterceptorModule bind, source class is not visible outside its package!",
                    round.type_element(original).map(ElementRef::Type),
                );
                continue;
            }
            bindings.push(ModuleBinding {
                method_name: Self::method_name(original),
                original: original.clone(),
                generated: InterceptorGenerator::interceptor_name(original),
            });
        }

        if bindings.is_empty() {
            tracing::debug!("No bindings for {}, module not generated", MODULE_CLASS_NAME);
            return None;
        }

        let generated = AnnotationMirror::of(class_name(GENERATED_ANNOTATIONS[0]))
            .with_value("value", AnnotationValue::String(GENERATOR_ID.to_string()))
            .with_value(
                "comments",
                AnnotationValue::String(GENERATED_COMMENTS.to_string()),
            );

        Some(GeneratedModule {
            name: self.module_name(),
            javadoc: MODULE_JAVADOC.to_string(),
            annotations: vec![generated, AnnotationMirror::of(class_name(MODULE_ANNOTATION))],
            bindings,
        })
    }
}
