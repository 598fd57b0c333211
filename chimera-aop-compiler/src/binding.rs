//! 方法绑定（MethodBinding）
//!
//! 一个被拦截的方法，以及作用在它上面的标记注解（按遇到的顺序）。

use crate::element::{ClassName, ExecutableElement, TypeElement, TypeKind};
use crate::error::{ProcessorError, Result};
use crate::round::RoundEnvironment;
use once_cell::unsync::OnceCell;

/// 被拦截的方法
#[derive(Debug)]
pub struct MethodBinding<'r> {
    round: &'r RoundEnvironment,
    method: &'r ExecutableElement,
    annotations: Vec<ClassName>,

    /// 第一次遇到这个方法时的处理顺序
    order: usize,

    class: OnceCell<Option<&'r TypeElement>>,
}

impl<'r> MethodBinding<'r> {
    /// 创建绑定，`annotations` 不能为空
    pub fn new(
        round: &'r RoundEnvironment,
        method: &'r ExecutableElement,
        annotations: Vec<ClassName>,
        order: usize,
    ) -> Result<Self> {
        if annotations.is_empty() {
            return Err(ProcessorError::EmptyBinding(method.signature()));
        }
        Ok(Self {
            round,
            method,
            annotations,
            order,
            class: OnceCell::new(),
        })
    }

    pub fn method(&self) -> &'r ExecutableElement {
        self.method
    }

    /// 标记注解，第一个在拦截链最外层
    pub fn annotations(&self) -> &[ClassName] {
        &self.annotations
    }

    pub fn has_annotation(&self, annotation: &ClassName) -> bool {
        self.annotations.contains(annotation)
    }

    pub fn order(&self) -> usize {
        self.order
    }

    /// 方法所在的类，首次访问时查找
    pub fn class(&self) -> Option<&'r TypeElement> {
        *self
            .class
            .get_or_init(|| self.round.enclosing_type(self.method))
    }

    pub fn class_name(&self) -> Option<&'r ClassName> {
        self.method.enclosing_class()
    }

    /// 方法在类中的位置
    pub fn position(&self) -> usize {
        self.class()
            .and_then(|class| class.position_of(self.method))
            .unwrap_or(usize::MAX)
    }

    pub fn returns_value(&self) -> bool {
        self.method.return_type.kind() != TypeKind::Void
    }
}
