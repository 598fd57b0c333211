//! 处理轮次
//!
//! 一轮处理中编译器交给处理器的所有根类型，以及按名称、按注解查找元素的能力。

use crate::element::{
    ClassName, Element, ElementRef, ExecutableElement, TypeElement, Visibility,
};
use crate::error::Result;
use serde::Deserialize;

/// 前端导出的一轮元素，JSON 形如 `{"types": [...]}`
#[derive(Debug, Deserialize)]
struct RoundModel {
    types: Vec<TypeElement>,
}

/// 一轮处理的元素环境
#[derive(Debug, Clone)]
pub struct RoundEnvironment {
    root_elements: Vec<TypeElement>,
}

impl RoundEnvironment {
    /// 由根类型创建，会为所有成员填上所属类型
    pub fn new(root_elements: Vec<TypeElement>) -> Self {
        let mut root_elements = root_elements;
        for root in &mut root_elements {
            root.attach_members();
        }
        Self { root_elements }
    }

    /// 从 JSON 元素模型创建
    pub fn from_json(json: &str) -> Result<Self> {
        let model: RoundModel = serde_json::from_str(json)?;
        tracing::debug!("Loaded {} root types from element model", model.types.len());
        Ok(Self::new(model.types))
    }

    pub fn root_elements(&self) -> &[TypeElement] {
        &self.root_elements
    }

    /// 按名称查找类型（包括内部类型）
    pub fn type_element(&self, name: &ClassName) -> Option<&TypeElement> {
        let top_level = name.top_level();
        let mut current = self.root_elements.iter().find(|t| t.name == top_level)?;
        for depth in 2..=name.simple_names().len() {
            let wanted = ClassName::get(
                name.package(),
                &name.simple_names()[..depth]
                    .iter()
                    .map(String::as_str)
                    .collect::<Vec<_>>(),
            );
            current = current.nested_types().find(|t| t.name == wanted)?;
        }
        Some(current)
    }

    /// 所有类型，按声明顺序深度优先
    pub fn types(&self) -> Vec<&TypeElement> {
        fn walk<'r>(t: &'r TypeElement, out: &mut Vec<&'r TypeElement>) {
            out.push(t);
            for nested in t.nested_types() {
                walk(nested, out);
            }
        }

        let mut out = Vec::new();
        for root in &self.root_elements {
            walk(root, &mut out);
        }
        out
    }

    /// 带有指定注解的所有元素，按声明顺序
    pub fn elements_annotated_with(&self, annotation: &ClassName) -> Vec<ElementRef<'_>> {
        fn walk<'r>(t: &'r TypeElement, annotation: &ClassName, out: &mut Vec<ElementRef<'r>>) {
            if t.has_annotation(annotation) {
                out.push(ElementRef::Type(t));
            }
            for element in &t.enclosed {
                match element {
                    Element::Type(nested) => walk(nested, annotation, out),
                    Element::Executable(executable) => {
                        if executable.has_annotation(annotation) {
                            out.push(ElementRef::Executable(executable));
                        }
                        for parameter in &executable.parameters {
                            if parameter
                                .annotations
                                .iter()
                                .any(|a| &a.annotation_type == annotation)
                            {
                                out.push(ElementRef::Variable(parameter));
                            }
                        }
                    }
                    Element::Variable(variable) => {
                        if variable
                            .annotations
                            .iter()
                            .any(|a| &a.annotation_type == annotation)
                        {
                            out.push(ElementRef::Variable(variable));
                        }
                    }
                }
            }
        }

        let mut out = Vec::new();
        for root in &self.root_elements {
            walk(root, annotation, &mut out);
        }
        out
    }

    /// 方法所在的类型
    pub fn enclosing_type(&self, method: &ExecutableElement) -> Option<&TypeElement> {
        self.type_element(method.enclosing_class()?)
    }

    /// 从类型自身开始，由内向外的外层类型链
    pub fn enclosing_chain(&self, name: &ClassName) -> Vec<&TypeElement> {
        let mut chain = Vec::new();
        let mut current = Some(name.clone());
        while let Some(name) = current {
            if let Some(t) = self.type_element(&name) {
                chain.push(t);
            }
            current = name.enclosing();
        }
        chain
    }

    pub fn package_of<'n>(&self, name: &'n ClassName) -> &'n str {
        name.package()
    }

    /// 有效可见性：外层链上最低的可见性
    pub fn effective_visibility(&self, name: &ClassName) -> Visibility {
        self.enclosing_chain(name)
            .iter()
            .map(|t| Visibility::of(&t.modifiers))
            .min()
            .unwrap_or(Visibility::Package)
    }

    /// 类型能否从指定包中访问
    pub fn is_visible_from(&self, name: &ClassName, package: &str) -> bool {
        match self.effective_visibility(name) {
            Visibility::Public => true,
            Visibility::Protected | Visibility::Package => name.package() == package,
            Visibility::Private => false,
        }
    }
}
