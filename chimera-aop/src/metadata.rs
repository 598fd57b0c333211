//! 方法元数据
//!
//! 生成器在编译期就知道被拦截方法的名称、参数类型和运行时注解，
//! 因此这些信息以 `static` 表的形式嵌入生成代码，每个方法只有一份。

use std::fmt;

/// 运行时可见的注解
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnnotationMetadata {
    /// 注解类型的全限定名
    pub type_name: &'static str,

    /// 注解成员，按声明顺序
    pub values: &'static [(&'static str, &'static str)],
}

impl AnnotationMetadata {
    pub const fn new(type_name: &'static str) -> Self {
        Self {
            type_name,
            values: &[],
        }
    }

    pub const fn with_values(
        type_name: &'static str,
        values: &'static [(&'static str, &'static str)],
    ) -> Self {
        Self { type_name, values }
    }

    /// 获取注解成员的值
    pub fn value(&self, name: &str) -> Option<&'static str> {
        self.values
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| *value)
    }

    /// 注解类型的简单名
    pub fn simple_name(&self) -> &'static str {
        self.type_name
            .rsplit('.')
            .next()
            .unwrap_or(self.type_name)
    }
}

/// 被拦截方法的元数据
///
/// 对应原始类中声明的方法，而不是生成的子类中的覆盖方法
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MethodMetadata {
    /// 声明该方法的类型名称
    pub declaring_type: &'static str,

    /// 方法名称
    pub name: &'static str,

    /// 参数类型（擦除后的名称），按声明顺序
    pub parameter_types: &'static [&'static str],

    /// 方法上所有运行时可见的注解
    pub annotations: &'static [AnnotationMetadata],

    /// 方法是否有返回值
    pub returns_value: bool,
}

impl MethodMetadata {
    /// 按类型名查找注解
    pub fn annotation(&self, type_name: &str) -> Option<&'static AnnotationMetadata> {
        self.annotations.iter().find(|a| a.type_name == type_name)
    }

    /// 是否带有指定注解
    pub fn has_annotation(&self, type_name: &str) -> bool {
        self.annotation(type_name).is_some()
    }

    /// 参数个数
    pub fn arity(&self) -> usize {
        self.parameter_types.len()
    }

    /// 完整的方法签名，例如 `test.Service#work(java.lang.String)`
    pub fn signature(&self) -> String {
        format!(
            "{}#{}({})",
            self.declaring_type,
            self.name,
            self.parameter_types.join(", ")
        )
    }
}

impl fmt::Display for MethodMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.signature())
    }
}
