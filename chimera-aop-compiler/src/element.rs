//! 元素模型
//!
//! 宿主编译器交给处理器的静态结构：类型、方法、构造函数、字段、参数，
//! 以及它们的修饰符、注解和类型引用。模型是纯数据，可以直接在 Rust 中
//! 构造，也可以从前端导出的 JSON 反序列化。

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

// ========== 名称与类型 ==========

/// 类名：包名 + 由外到内的简单名
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ClassName {
    package: String,
    simple_names: Vec<String>,
}

impl ClassName {
    /// 顶层类
    pub fn new(package: impl Into<String>, simple_name: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            simple_names: vec![simple_name.into()],
        }
    }

    /// 由包名和多级简单名构造，例如 `("test", &["Outer", "Inner"])`
    pub fn get(package: &str, simple_names: &[&str]) -> Self {
        Self {
            package: package.to_string(),
            simple_names: simple_names.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// 根据命名约定猜测类名：第一个大写开头的片段之后都是类名
    ///
    /// `test.WithConstructor.MyException` -> 包 `test`，类 `WithConstructor.MyException`
    pub fn best_guess(name: &str) -> Result<Self, String> {
        let parts: Vec<&str> = name.split('.').collect();
        if parts.iter().any(|p| !is_java_identifier(p)) {
            return Err(format!("'{}' is not a valid class name", name));
        }
        let first_class = parts
            .iter()
            .position(|p| p.starts_with(|c: char| c.is_uppercase()))
            .ok_or_else(|| format!("'{}' has no class name segment", name))?;

        Ok(Self {
            package: parts[..first_class].join("."),
            simple_names: parts[first_class..].iter().map(|s| s.to_string()).collect(),
        })
    }

    /// 内部类
    pub fn nested(&self, simple_name: impl Into<String>) -> Self {
        let mut simple_names = self.simple_names.clone();
        simple_names.push(simple_name.into());
        Self {
            package: self.package.clone(),
            simple_names,
        }
    }

    pub fn package(&self) -> &str {
        &self.package
    }

    pub fn simple_names(&self) -> &[String] {
        &self.simple_names
    }

    /// 最内层的简单名
    pub fn simple_name(&self) -> &str {
        self.simple_names.last().map(String::as_str).unwrap_or_default()
    }

    pub fn is_nested(&self) -> bool {
        self.simple_names.len() > 1
    }

    /// 外层类（顶层类返回 `None`）
    pub fn enclosing(&self) -> Option<ClassName> {
        if !self.is_nested() {
            return None;
        }
        Some(Self {
            package: self.package.clone(),
            simple_names: self.simple_names[..self.simple_names.len() - 1].to_vec(),
        })
    }

    /// 最外层的顶层类
    pub fn top_level(&self) -> ClassName {
        Self {
            package: self.package.clone(),
            simple_names: self.simple_names[..1.min(self.simple_names.len())].to_vec(),
        }
    }

    /// 源码中的写法，例如 `test.Outer.Inner`
    pub fn canonical_name(&self) -> String {
        let names = self.simple_names.join(".");
        if self.package.is_empty() {
            names
        } else {
            format!("{}.{}", self.package, names)
        }
    }

    /// 反射中的写法，例如 `test.Outer$Inner`
    pub fn reflection_name(&self) -> String {
        let names = self.simple_names.join("$");
        if self.package.is_empty() {
            names
        } else {
            format!("{}.{}", self.package, names)
        }
    }
}

impl fmt::Display for ClassName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.canonical_name())
    }
}

impl TryFrom<String> for ClassName {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        ClassName::best_guess(&value)
    }
}

impl From<ClassName> for String {
    fn from(value: ClassName) -> Self {
        value.canonical_name()
    }
}

/// Java 标识符（不含关键字检查）
pub fn is_java_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_alphabetic() || c == '_' || c == '$' => {
            chars.all(|c| c.is_alphanumeric() || c == '_' || c == '$')
        }
        _ => false,
    }
}

/// 基本类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrimitiveType {
    Boolean,
    Byte,
    Short,
    Int,
    Long,
    Char,
    Float,
    Double,
}

impl PrimitiveType {
    pub fn keyword(&self) -> &'static str {
        match self {
            PrimitiveType::Boolean => "boolean",
            PrimitiveType::Byte => "byte",
            PrimitiveType::Short => "short",
            PrimitiveType::Int => "int",
            PrimitiveType::Long => "long",
            PrimitiveType::Char => "char",
            PrimitiveType::Float => "float",
            PrimitiveType::Double => "double",
        }
    }

    /// 对应的包装类型
    pub fn boxed(&self) -> ClassName {
        let name = match self {
            PrimitiveType::Boolean => "Boolean",
            PrimitiveType::Byte => "Byte",
            PrimitiveType::Short => "Short",
            PrimitiveType::Int => "Integer",
            PrimitiveType::Long => "Long",
            PrimitiveType::Char => "Character",
            PrimitiveType::Float => "Float",
            PrimitiveType::Double => "Double",
        };
        ClassName::new("java.lang", name)
    }
}

/// 类型引用
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeName {
    #[default]
    Void,
    Primitive(PrimitiveType),
    Class(ClassName),
    Parameterized {
        raw: ClassName,
        arguments: Vec<TypeName>,
    },
    Array(Box<TypeName>),
    TypeVariable {
        name: String,
        #[serde(default)]
        bounds: Vec<TypeName>,
    },
    Wildcard {
        #[serde(default)]
        upper: Option<Box<TypeName>>,
        #[serde(default)]
        lower: Option<Box<TypeName>>,
    },
}

impl TypeName {
    pub fn class(name: ClassName) -> Self {
        TypeName::Class(name)
    }

    pub fn array_of(component: TypeName) -> Self {
        TypeName::Array(Box::new(component))
    }

    pub fn object() -> Self {
        TypeName::Class(ClassName::new("java.lang", "Object"))
    }

    pub fn string() -> Self {
        TypeName::Class(ClassName::new("java.lang", "String"))
    }

    pub fn is_void(&self) -> bool {
        matches!(self, TypeName::Void)
    }

    pub fn is_primitive(&self) -> bool {
        matches!(self, TypeName::Primitive(_))
    }

    /// 类型擦除，用于反射查找的 `.class` 字面量
    pub fn erasure(&self) -> TypeName {
        match self {
            TypeName::Parameterized { raw, .. } => TypeName::Class(raw.clone()),
            TypeName::Array(component) => TypeName::array_of(component.erasure()),
            TypeName::TypeVariable { bounds, .. } => bounds
                .first()
                .map(TypeName::erasure)
                .unwrap_or_else(TypeName::object),
            TypeName::Wildcard { upper, .. } => upper
                .as_deref()
                .map(TypeName::erasure)
                .unwrap_or_else(TypeName::object),
            other => other.clone(),
        }
    }

    /// 基本类型装箱，其他类型不变
    pub fn boxed(&self) -> TypeName {
        match self {
            TypeName::Primitive(p) => TypeName::Class(p.boxed()),
            other => other.clone(),
        }
    }

    pub fn kind(&self) -> TypeKind {
        match self {
            TypeName::Void => TypeKind::Void,
            TypeName::Primitive(p) => TypeKind::Primitive(*p),
            TypeName::Class(_) | TypeName::Parameterized { .. } => TypeKind::Declared,
            TypeName::Array(_) => TypeKind::Array,
            TypeName::TypeVariable { .. } => TypeKind::TypeVariable,
            TypeName::Wildcard { .. } => TypeKind::Wildcard,
        }
    }
}

/// 类型的种类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    Void,
    Primitive(PrimitiveType),
    Declared,
    Array,
    TypeVariable,
    Wildcard,
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeName::Void => write!(f, "void"),
            TypeName::Primitive(p) => write!(f, "{}", p.keyword()),
            TypeName::Class(name) => write!(f, "{}", name),
            TypeName::Parameterized { raw, arguments } => {
                write!(f, "{}<", raw)?;
                for (i, argument) in arguments.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", argument)?;
                }
                write!(f, ">")
            }
            TypeName::Array(component) => write!(f, "{}[]", component),
            TypeName::TypeVariable { name, .. } => write!(f, "{}", name),
            TypeName::Wildcard { upper, lower } => match (upper, lower) {
                (Some(upper), _) => write!(f, "? extends {}", upper),
                (None, Some(lower)) => write!(f, "? super {}", lower),
                (None, None) => write!(f, "?"),
            },
        }
    }
}

// ========== 修饰符与种类 ==========

/// 修饰符，变体顺序即源码中的书写顺序
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Modifier {
    Public,
    Protected,
    Private,
    Abstract,
    Default,
    Static,
    Sealed,
    NonSealed,
    Final,
    Transient,
    Volatile,
    Synchronized,
    Native,
    Strictfp,
}

impl Modifier {
    pub fn keyword(&self) -> &'static str {
        match self {
            Modifier::Public => "public",
            Modifier::Protected => "protected",
            Modifier::Private => "private",
            Modifier::Abstract => "abstract",
            Modifier::Default => "default",
            Modifier::Static => "static",
            Modifier::Sealed => "sealed",
            Modifier::NonSealed => "non-sealed",
            Modifier::Final => "final",
            Modifier::Transient => "transient",
            Modifier::Volatile => "volatile",
            Modifier::Synchronized => "synchronized",
            Modifier::Native => "native",
            Modifier::Strictfp => "strictfp",
        }
    }
}

/// 元素种类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementKind {
    Package,
    Class,
    Interface,
    Enum,
    Record,
    AnnotationType,
    Method,
    Constructor,
    Field,
    EnumConstant,
    Parameter,
}

impl ElementKind {
    pub fn is_type(&self) -> bool {
        matches!(
            self,
            ElementKind::Class
                | ElementKind::Interface
                | ElementKind::Enum
                | ElementKind::Record
                | ElementKind::AnnotationType
        )
    }
}

/// 类型的嵌套方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NestingKind {
    #[default]
    TopLevel,
    Member,
    Local,
    Anonymous,
}

/// 可见性，顺序从低到高
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Visibility {
    Private,
    Package,
    Protected,
    Public,
}

impl Visibility {
    pub fn of(modifiers: &BTreeSet<Modifier>) -> Self {
        if modifiers.contains(&Modifier::Public) {
            Visibility::Public
        } else if modifiers.contains(&Modifier::Protected) {
            Visibility::Protected
        } else if modifiers.contains(&Modifier::Private) {
            Visibility::Private
        } else {
            Visibility::Package
        }
    }
}

// ========== 注解 ==========

/// 注解成员的值
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnnotationValue {
    String(String),
    Char(char),
    Bool(bool),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Class(TypeName),
    Enum { r#type: ClassName, constant: String },
    Annotation(Box<AnnotationMirror>),
    Array(Vec<AnnotationValue>),
}

/// 元素上的注解
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationMirror {
    #[serde(rename = "type")]
    pub annotation_type: ClassName,

    /// 成员，按声明顺序
    #[serde(default)]
    pub values: Vec<(String, AnnotationValue)>,
}

impl AnnotationMirror {
    pub fn of(annotation_type: ClassName) -> Self {
        Self {
            annotation_type,
            values: Vec::new(),
        }
    }

    pub fn with_value(mut self, name: impl Into<String>, value: AnnotationValue) -> Self {
        self.values.push((name.into(), value));
        self
    }

    pub fn value(&self, name: &str) -> Option<&AnnotationValue> {
        self.values.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }
}

fn has_annotation(annotations: &[AnnotationMirror], annotation_type: &ClassName) -> bool {
    annotations
        .iter()
        .any(|a| &a.annotation_type == annotation_type)
}

// ========== 元素 ==========

fn default_field_kind() -> ElementKind {
    ElementKind::Field
}

fn default_method_kind() -> ElementKind {
    ElementKind::Method
}

fn default_class_kind() -> ElementKind {
    ElementKind::Class
}

/// 字段或参数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableElement {
    #[serde(default = "default_field_kind")]
    pub kind: ElementKind,
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeName,
    #[serde(default)]
    pub modifiers: BTreeSet<Modifier>,
    #[serde(default)]
    pub annotations: Vec<AnnotationMirror>,
    #[serde(skip)]
    pub(crate) enclosing: Option<ClassName>,
}

impl VariableElement {
    pub fn parameter(name: impl Into<String>, ty: TypeName) -> Self {
        Self {
            kind: ElementKind::Parameter,
            name: name.into(),
            ty,
            modifiers: BTreeSet::new(),
            annotations: Vec::new(),
            enclosing: None,
        }
    }

    pub fn field(name: impl Into<String>, ty: TypeName) -> Self {
        Self {
            kind: ElementKind::Field,
            ..Self::parameter(name, ty)
        }
    }

    pub fn with_modifiers(mut self, modifiers: impl IntoIterator<Item = Modifier>) -> Self {
        self.modifiers.extend(modifiers);
        self
    }

    pub fn with_annotation(mut self, annotation: AnnotationMirror) -> Self {
        self.annotations.push(annotation);
        self
    }

    pub fn enclosing_class(&self) -> Option<&ClassName> {
        self.enclosing.as_ref()
    }
}

/// 方法的类型参数
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeParameter {
    pub name: String,
    #[serde(default)]
    pub bounds: Vec<TypeName>,
}

/// 方法或构造函数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutableElement {
    #[serde(default = "default_method_kind")]
    pub kind: ElementKind,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub modifiers: BTreeSet<Modifier>,
    #[serde(default)]
    pub type_parameters: Vec<TypeParameter>,
    #[serde(default)]
    pub parameters: Vec<VariableElement>,
    #[serde(default)]
    pub return_type: TypeName,
    #[serde(default)]
    pub thrown_types: Vec<TypeName>,
    #[serde(default)]
    pub varargs: bool,
    #[serde(default)]
    pub annotations: Vec<AnnotationMirror>,
    #[serde(skip)]
    pub(crate) enclosing: Option<ClassName>,
}

impl ExecutableElement {
    pub fn method(name: impl Into<String>) -> Self {
        Self {
            kind: ElementKind::Method,
            name: name.into(),
            modifiers: BTreeSet::new(),
            type_parameters: Vec::new(),
            parameters: Vec::new(),
            return_type: TypeName::Void,
            thrown_types: Vec::new(),
            varargs: false,
            annotations: Vec::new(),
            enclosing: None,
        }
    }

    pub fn constructor() -> Self {
        Self {
            kind: ElementKind::Constructor,
            ..Self::method("<init>")
        }
    }

    pub fn with_modifiers(mut self, modifiers: impl IntoIterator<Item = Modifier>) -> Self {
        self.modifiers.extend(modifiers);
        self
    }

    pub fn with_parameter(mut self, parameter: VariableElement) -> Self {
        self.parameters.push(parameter);
        self
    }

    pub fn with_type_parameter(mut self, name: impl Into<String>, bounds: Vec<TypeName>) -> Self {
        self.type_parameters.push(TypeParameter {
            name: name.into(),
            bounds,
        });
        self
    }

    pub fn returns(mut self, return_type: TypeName) -> Self {
        self.return_type = return_type;
        self
    }

    pub fn throws(mut self, thrown: TypeName) -> Self {
        self.thrown_types.push(thrown);
        self
    }

    pub fn varargs(mut self) -> Self {
        self.varargs = true;
        self
    }

    pub fn with_annotation(mut self, annotation: AnnotationMirror) -> Self {
        self.annotations.push(annotation);
        self
    }

    pub fn enclosing_class(&self) -> Option<&ClassName> {
        self.enclosing.as_ref()
    }

    pub fn has_modifier(&self, modifier: Modifier) -> bool {
        self.modifiers.contains(&modifier)
    }

    pub fn has_annotation(&self, annotation_type: &ClassName) -> bool {
        has_annotation(&self.annotations, annotation_type)
    }

    /// 稳定的签名，例如 `test.Service#work(java.lang.String, int)`
    pub fn signature(&self) -> String {
        let owner = self
            .enclosing
            .as_ref()
            .map(ClassName::canonical_name)
            .unwrap_or_default();
        let parameters: Vec<String> = self.parameters.iter().map(|p| p.ty.to_string()).collect();
        format!("{}#{}({})", owner, self.name, parameters.join(", "))
    }
}

/// 类、接口、枚举等类型
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeElement {
    pub name: ClassName,
    #[serde(default = "default_class_kind")]
    pub kind: ElementKind,
    #[serde(default)]
    pub modifiers: BTreeSet<Modifier>,
    #[serde(default)]
    pub nesting: NestingKind,
    #[serde(default)]
    pub annotations: Vec<AnnotationMirror>,

    /// 成员，按声明顺序
    #[serde(default)]
    pub enclosed: Vec<Element>,
}

impl TypeElement {
    pub fn class(name: ClassName) -> Self {
        let nesting = if name.is_nested() {
            NestingKind::Member
        } else {
            NestingKind::TopLevel
        };
        Self {
            name,
            kind: ElementKind::Class,
            modifiers: BTreeSet::new(),
            nesting,
            annotations: Vec::new(),
            enclosed: Vec::new(),
        }
    }

    pub fn with_kind(mut self, kind: ElementKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_modifiers(mut self, modifiers: impl IntoIterator<Item = Modifier>) -> Self {
        self.modifiers.extend(modifiers);
        self
    }

    pub fn with_annotation(mut self, annotation: AnnotationMirror) -> Self {
        self.annotations.push(annotation);
        self
    }

    pub fn with_method(mut self, method: ExecutableElement) -> Self {
        self.enclosed.push(Element::Executable(method));
        self
    }

    pub fn with_field(mut self, field: VariableElement) -> Self {
        self.enclosed.push(Element::Variable(field));
        self
    }

    pub fn with_type(mut self, nested: TypeElement) -> Self {
        self.enclosed.push(Element::Type(nested));
        self
    }

    pub fn has_modifier(&self, modifier: Modifier) -> bool {
        self.modifiers.contains(&modifier)
    }

    pub fn has_annotation(&self, annotation_type: &ClassName) -> bool {
        has_annotation(&self.annotations, annotation_type)
    }

    /// 声明的所有构造函数
    pub fn constructors(&self) -> impl Iterator<Item = &ExecutableElement> {
        self.executables()
            .filter(|e| e.kind == ElementKind::Constructor)
    }

    /// 声明的所有方法
    pub fn methods(&self) -> impl Iterator<Item = &ExecutableElement> {
        self.executables().filter(|e| e.kind == ElementKind::Method)
    }

    /// 直接声明的内部类型
    pub fn nested_types(&self) -> impl Iterator<Item = &TypeElement> {
        self.enclosed.iter().filter_map(|e| match e {
            Element::Type(t) => Some(t),
            _ => None,
        })
    }

    fn executables(&self) -> impl Iterator<Item = &ExecutableElement> {
        self.enclosed.iter().filter_map(|e| match e {
            Element::Executable(x) => Some(x),
            _ => None,
        })
    }

    /// 方法在成员列表中的位置，即源码中的出现顺序
    pub fn position_of(&self, method: &ExecutableElement) -> Option<usize> {
        self.enclosed.iter().position(|e| match e {
            Element::Executable(x) => std::ptr::eq(x, method),
            _ => false,
        })
    }

    /// 为成员填上所属类型，内部类型的嵌套方式由名称推断
    pub(crate) fn attach_members(&mut self) {
        if self.name.is_nested() && self.nesting == NestingKind::TopLevel {
            self.nesting = NestingKind::Member;
        }
        for element in &mut self.enclosed {
            match element {
                Element::Executable(executable) => {
                    executable.enclosing = Some(self.name.clone());
                    for parameter in &mut executable.parameters {
                        parameter.kind = ElementKind::Parameter;
                        parameter.enclosing = Some(self.name.clone());
                    }
                }
                Element::Variable(variable) => variable.enclosing = Some(self.name.clone()),
                Element::Type(nested) => nested.attach_members(),
            }
        }
    }
}

/// 类型中的成员
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Element {
    Type(TypeElement),
    Executable(ExecutableElement),
    Variable(VariableElement),
}

/// 对元素的借用，处理过程中的"元素句柄"
#[derive(Debug, Clone, Copy)]
pub enum ElementRef<'r> {
    Type(&'r TypeElement),
    Executable(&'r ExecutableElement),
    Variable(&'r VariableElement),
}

impl<'r> ElementRef<'r> {
    pub fn kind(&self) -> ElementKind {
        match self {
            ElementRef::Type(t) => t.kind,
            ElementRef::Executable(e) => e.kind,
            ElementRef::Variable(v) => v.kind,
        }
    }

    pub fn modifiers(&self) -> &'r BTreeSet<Modifier> {
        match self {
            ElementRef::Type(t) => &t.modifiers,
            ElementRef::Executable(e) => &e.modifiers,
            ElementRef::Variable(v) => &v.modifiers,
        }
    }

    pub fn annotations(&self) -> &'r [AnnotationMirror] {
        match self {
            ElementRef::Type(t) => &t.annotations,
            ElementRef::Executable(e) => &e.annotations,
            ElementRef::Variable(v) => &v.annotations,
        }
    }

    pub fn as_executable(&self) -> Option<&'r ExecutableElement> {
        match self {
            ElementRef::Executable(e) => Some(e),
            _ => None,
        }
    }

    /// 诊断信息中使用的位置描述
    pub fn location(&self) -> String {
        match self {
            ElementRef::Type(t) => t.name.canonical_name(),
            ElementRef::Executable(e) => e.signature(),
            ElementRef::Variable(v) => format!(
                "{}#{}",
                v.enclosing
                    .as_ref()
                    .map(ClassName::canonical_name)
                    .unwrap_or_default(),
                v.name
            ),
        }
    }
}

impl<'r> From<&'r Element> for ElementRef<'r> {
    fn from(element: &'r Element) -> Self {
        match element {
            Element::Type(t) => ElementRef::Type(t),
            Element::Executable(e) => ElementRef::Executable(e),
            Element::Variable(v) => ElementRef::Variable(v),
        }
    }
}
