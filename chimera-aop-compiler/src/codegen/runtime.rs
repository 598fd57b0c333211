//! 运行时契约源码
//!
//! 生成的拦截子类编译时需要 `MethodInterceptor`、`MethodInvocation` 和
//! `AbstractMethodInvocation`。三个类型的源码随处理器一起发布，按
//! `runtime-package` 加上包声明后输出。

use crate::constants::*;
use crate::element::ClassName;

const SOURCES: &[(&str, &str)] = &[
    (
        METHOD_INTERCEPTOR,
        include_str!("../../runtime/MethodInterceptor.java"),
    ),
    (
        METHOD_INVOCATION,
        include_str!("../../runtime/MethodInvocation.java"),
    ),
    (
        ABSTRACT_METHOD_INVOCATION,
        include_str!("../../runtime/AbstractMethodInvocation.java"),
    ),
];

/// 一个运行时类型的源码
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeSource {
    pub name: ClassName,
    pub text: String,
}

impl RuntimeSource {
    pub fn qualified_name(&self) -> String {
        self.name.canonical_name()
    }
}

/// `package` 中的全部运行时类型
pub fn runtime_sources(package: &str) -> Vec<RuntimeSource> {
    SOURCES
        .iter()
        .map(|(simple_name, body)| RuntimeSource {
            name: ClassName::new(package, *simple_name),
            text: format!("package {};\n\n{}", package, body),
        })
        .collect()
}
