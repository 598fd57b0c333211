//! 分组与排序
//!
//! 把 (注解, 方法) 对合并成每个方法一个绑定，再按所在类分组。
//! 类按规范名排序，类中的方法按方法名、再按源码中的出现位置排序，
//! 相同输入总是得到相同的顺序。

use crate::binding::MethodBinding;
use crate::element::{ClassName, ExecutableElement, TypeElement};
use crate::error::Result;
use crate::round::RoundEnvironment;
use std::collections::{BTreeMap, HashMap};

/// 同一个类中的所有绑定
#[derive(Debug)]
pub struct ClassGrouping<'r> {
    class: &'r TypeElement,
    bindings: Vec<MethodBinding<'r>>,
}

impl<'r> ClassGrouping<'r> {
    pub fn class(&self) -> &'r TypeElement {
        self.class
    }

    pub fn class_name(&self) -> &'r ClassName {
        &self.class.name
    }

    /// 排好序的绑定
    pub fn bindings(&self) -> &[MethodBinding<'r>] {
        &self.bindings
    }

    /// 类中用到的所有标记注解，按第一次出现的顺序
    pub fn annotations(&self) -> Vec<&ClassName> {
        let mut seen: Vec<&ClassName> = Vec::new();
        for annotation in self.bindings.iter().flat_map(|b| b.annotations()) {
            if !seen.contains(&annotation) {
                seen.push(annotation);
            }
        }
        seen
    }

    pub fn uses_annotation(&self, annotation: &ClassName) -> bool {
        self.bindings.iter().any(|b| b.has_annotation(annotation))
    }
}

/// 收集通过校验的 (注解, 方法) 对
#[derive(Debug, Default)]
pub struct BindingCollector<'r> {
    methods: Vec<(&'r ExecutableElement, Vec<ClassName>)>,
    index: HashMap<String, usize>,
}

impl<'r> BindingCollector<'r> {
    pub fn new() -> Self {
        Self::default()
    }

    /// 记录方法上的一个标记注解
    pub fn add(&mut self, method: &'r ExecutableElement, annotation: ClassName) {
        let position = *self
            .index
            .entry(method.signature())
            .or_insert_with(|| {
                self.methods.push((method, Vec::new()));
                self.methods.len() - 1
            });

        let annotations = &mut self.methods[position].1;
        if !annotations.contains(&annotation) {
            annotations.push(annotation);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }

    /// 生成按类分组、排好序的绑定
    pub fn into_groupings(self, round: &'r RoundEnvironment) -> Result<Vec<ClassGrouping<'r>>> {
        let mut classes: BTreeMap<ClassName, ClassGrouping<'r>> = BTreeMap::new();

        for (order, (method, annotations)) in self.methods.into_iter().enumerate() {
            let binding = MethodBinding::new(round, method, annotations, order)?;
            let Some(class) = binding.class() else {
                tracing::warn!("No enclosing class found for {}", method.signature());
                continue;
            };
            classes
                .entry(class.name.clone())
                .or_insert_with(|| ClassGrouping {
                    class,
                    bindings: Vec::new(),
                })
                .bindings
                .push(binding);
        }

        let mut groupings: Vec<ClassGrouping<'r>> = classes.into_values().collect();
        for grouping in &mut groupings {
            grouping.bindings.sort_by(|a, b| {
                a.method()
                    .name
                    .cmp(&b.method().name)
                    .then_with(|| a.position().cmp(&b.position()))
                    .then_with(|| a.order().cmp(&b.order()))
            });
        }
        Ok(groupings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{Modifier, TypeName, VariableElement};

    fn first() -> ClassName {
        ClassName::new("test", "First")
    }

    fn second() -> ClassName {
        ClassName::new("test", "Second")
    }

    fn round() -> RoundEnvironment {
        let class = |name: &str| {
            TypeElement::class(ClassName::new("test", name))
                .with_modifiers([Modifier::Public, Modifier::Abstract])
                .with_method(ExecutableElement::method("zeta"))
                .with_method(
                    ExecutableElement::method("alpha")
                        .with_parameter(VariableElement::parameter("id", TypeName::string())),
                )
                .with_method(ExecutableElement::method("alpha"))
        };
        RoundEnvironment::new(vec![class("Beta"), class("Alpha")])
    }

    #[test]
    fn test_groups_and_orders_deterministically() {
        let round = round();
        let mut collector = BindingCollector::new();
        // 按注册表顺序：先 First 的所有元素，再 Second 的所有元素
        for class in round.root_elements() {
            for method in class.methods() {
                collector.add(method, first());
            }
        }
        let beta_zeta = round.root_elements()[0].methods().next().unwrap();
        collector.add(beta_zeta, second());

        let groupings = collector.into_groupings(&round).unwrap();
        let classes: Vec<String> = groupings.iter().map(|g| g.class_name().to_string()).collect();
        assert_eq!(classes, vec!["test.Alpha", "test.Beta"]);

        let beta = &groupings[1];
        let order: Vec<String> = beta.bindings().iter().map(|b| b.method().signature()).collect();
        assert_eq!(
            order,
            vec![
                "test.Beta#alpha(java.lang.String)",
                "test.Beta#alpha()",
                "test.Beta#zeta()"
            ]
        );
        assert_eq!(beta.bindings()[2].annotations(), &[first(), second()]);
        assert_eq!(beta.annotations(), vec![&first(), &second()]);
        assert!(!groupings[0].uses_annotation(&second()));
    }

    #[test]
    fn test_duplicate_annotation_is_merged() {
        let round = round();
        let zeta = round.root_elements()[0].methods().next().unwrap();
        let mut collector = BindingCollector::new();
        collector.add(zeta, first());
        collector.add(zeta, first());
        let groupings = collector.into_groupings(&round).unwrap();
        assert_eq!(groupings[0].bindings().len(), 1);
        assert_eq!(groupings[0].bindings()[0].annotations().len(), 1);
    }
}
