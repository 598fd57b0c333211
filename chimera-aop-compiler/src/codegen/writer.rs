//! Java 源码渲染
//!
//! 渲染分两遍：第一遍只收集引用到的类型，据此决定哪些类型可以用简单名
//! （导入、`java.lang`、同包），第二遍输出文本。同一个简单名对应多个类型时，
//! 这些类型全部使用全限定名；和父类成员类型同名的类型也一样，因为在子类里
//! 简单名会先解析到继承来的成员类型。

use super::spec::{GeneratedModule, GeneratedType, InterceptedMethod, ProceedChain};
use crate::constants::*;
use crate::element::{
    AnnotationMirror, AnnotationValue, ClassName, Modifier, TypeName, TypeParameter,
    VariableElement,
};
use std::collections::{BTreeMap, BTreeSet, HashSet};

const INDENT: &str = "  ";

/// 类型名的解析方式
enum Names {
    /// 第一遍：记录引用到的类型
    Collect(BTreeSet<ClassName>),

    /// 第二遍：按导入表输出
    Resolve(ImportTable),
}

/// 导入表
struct ImportTable {
    /// 可以用简单名引用的顶层类型
    short: HashSet<ClassName>,
    imports: BTreeSet<String>,
}

impl ImportTable {
    fn build(
        package: &str,
        own: &ClassName,
        referenced: BTreeSet<ClassName>,
        member_types: &BTreeSet<String>,
    ) -> Self {
        let own = own.top_level();
        let mut by_simple_name: BTreeMap<String, BTreeSet<ClassName>> = BTreeMap::new();
        for class in referenced {
            let top = class.top_level();
            by_simple_name
                .entry(top.simple_name().to_string())
                .or_default()
                .insert(top);
        }
        by_simple_name
            .entry(own.simple_name().to_string())
            .or_default()
            .insert(own);

        let mut short = HashSet::new();
        let mut imports = BTreeSet::new();
        for (simple_name, tops) in by_simple_name {
            if tops.len() != 1 || member_types.contains(&simple_name) {
                continue;
            }
            for top in tops {
                if top.package() != "java.lang" && top.package() != package {
                    imports.insert(top.canonical_name());
                }
                short.insert(top);
            }
        }
        Self { short, imports }
    }

    fn name(&self, class: &ClassName) -> String {
        if self.short.contains(&class.top_level()) {
            class.simple_names().join(".")
        } else {
            class.canonical_name()
        }
    }
}

/// Java 源码写入器
pub struct JavaWriter {
    names: Names,
    out: String,
    indent: usize,
    first_member: bool,
}

impl JavaWriter {
    fn new(names: Names) -> Self {
        Self {
            names,
            out: String::new(),
            indent: 0,
            first_member: true,
        }
    }

    /// 两遍渲染出完整的编译单元
    fn compilation_unit<F>(
        package: &str,
        own: &ClassName,
        member_types: &BTreeSet<String>,
        body: F,
    ) -> String
    where
        F: Fn(&mut JavaWriter),
    {
        let mut collect = JavaWriter::new(Names::Collect(BTreeSet::new()));
        body(&mut collect);
        let referenced = match collect.names {
            Names::Collect(referenced) => referenced,
            Names::Resolve(_) => BTreeSet::new(),
        };

        let table = ImportTable::build(package, own, referenced, member_types);
        let mut header = String::new();
        if !package.is_empty() {
            header.push_str(&format!("package {};\n\n", package));
        }
        for import in &table.imports {
            header.push_str(&format!("import {};\n", import));
        }
        if !table.imports.is_empty() {
            header.push('\n');
        }

        let mut resolve = JavaWriter::new(Names::Resolve(table));
        body(&mut resolve);
        header + &resolve.out
    }

    /// 渲染拦截子类
    pub fn render_type(generated: &GeneratedType) -> String {
        Self::compilation_unit(
            generated.name.package(),
            &generated.name,
            &generated.member_types,
            |w| w.write_type(generated),
        )
    }

    /// 渲染依赖注入模块
    pub fn render_module(module: &GeneratedModule) -> String {
        Self::compilation_unit(module.name.package(), &module.name, &BTreeSet::new(), |w| {
            w.write_module(module)
        })
    }

    // ========== 基础输出 ==========

    fn line(&mut self, text: &str) {
        for _ in 0..self.indent {
            self.out.push_str(INDENT);
        }
        self.out.push_str(text);
        self.out.push('\n');
    }

    fn indent(&mut self) {
        self.indent += 1;
    }

    fn dedent(&mut self) {
        self.indent = self.indent.saturating_sub(1);
    }

    /// 成员之间空一行
    fn member(&mut self) {
        if !self.first_member {
            self.out.push('\n');
        }
        self.first_member = false;
    }

    // ========== 名称 ==========

    fn class(&mut self, class: &ClassName) -> String {
        match &mut self.names {
            Names::Collect(referenced) => {
                referenced.insert(class.clone());
                class.canonical_name()
            }
            Names::Resolve(table) => table.name(class),
        }
    }

    fn class_str(&mut self, canonical: &str) -> String {
        match ClassName::best_guess(canonical) {
            Ok(class) => self.class(&class),
            Err(_) => canonical.to_string(),
        }
    }

    fn ty(&mut self, ty: &TypeName) -> String {
        match ty {
            TypeName::Void => "void".to_string(),
            TypeName::Primitive(p) => p.keyword().to_string(),
            TypeName::Class(class) => self.class(class),
            TypeName::Parameterized { raw, arguments } => {
                let raw = self.class(raw);
                let arguments: Vec<String> = arguments.iter().map(|a| self.ty(a)).collect();
                format!("{}<{}>", raw, arguments.join(", "))
            }
            TypeName::Array(component) => format!("{}[]", self.ty(component)),
            TypeName::TypeVariable { name, .. } => name.clone(),
            TypeName::Wildcard { upper, lower } => match (upper, lower) {
                (Some(upper), _) => format!("? extends {}", self.ty(upper)),
                (None, Some(lower)) => format!("? super {}", self.ty(lower)),
                (None, None) => "?".to_string(),
            },
        }
    }

    fn type_parameters(&mut self, parameters: &[TypeParameter]) -> String {
        if parameters.is_empty() {
            return String::new();
        }
        let rendered: Vec<String> = parameters
            .iter()
            .map(|p| {
                if p.bounds.is_empty() {
                    p.name.clone()
                } else {
                    let bounds: Vec<String> = p.bounds.iter().map(|b| self.ty(b)).collect();
                    format!("{} extends {}", p.name, bounds.join(" & "))
                }
            })
            .collect();
        format!("<{}> ", rendered.join(", "))
    }

    fn modifiers(modifiers: &BTreeSet<Modifier>) -> String {
        modifiers
            .iter()
            .map(|m| format!("{} ", m.keyword()))
            .collect()
    }

    fn parameters(&mut self, parameters: &[VariableElement], varargs: bool) -> String {
        let last = parameters.len().saturating_sub(1);
        let rendered: Vec<String> = parameters
            .iter()
            .enumerate()
            .map(|(i, p)| {
                let mut text = String::new();
                for annotation in &p.annotations {
                    text.push_str(&self.annotation(annotation));
                    text.push(' ');
                }
                text.push_str(&Self::modifiers(&p.modifiers));
                match (&p.ty, varargs && i == last) {
                    (TypeName::Array(component), true) => {
                        text.push_str(&format!("{}...", self.ty(component)))
                    }
                    (ty, _) => text.push_str(&self.ty(ty)),
                }
                text.push(' ');
                text.push_str(&p.name);
                text
            })
            .collect();
        rendered.join(", ")
    }

    fn throws(&mut self, thrown: &[TypeName]) -> String {
        if thrown.is_empty() {
            return String::new();
        }
        let rendered: Vec<String> = thrown.iter().map(|t| self.ty(t)).collect();
        format!(" throws {}", rendered.join(", "))
    }

    // ========== 注解 ==========

    fn annotation(&mut self, annotation: &AnnotationMirror) -> String {
        let name = self.class(&annotation.annotation_type);
        match annotation.values.as_slice() {
            [] => format!("@{}", name),
            [(member, value)] if member == "value" => {
                format!("@{}({})", name, self.annotation_value(value))
            }
            members => {
                let rendered: Vec<String> = members
                    .iter()
                    .map(|(member, value)| format!("{} = {}", member, self.annotation_value(value)))
                    .collect();
                format!("@{}({})", name, rendered.join(", "))
            }
        }
    }

    fn annotation_value(&mut self, value: &AnnotationValue) -> String {
        match value {
            AnnotationValue::String(s) => string_literal(s),
            AnnotationValue::Char(c) => char_literal(*c),
            AnnotationValue::Bool(b) => b.to_string(),
            AnnotationValue::Int(i) => i.to_string(),
            AnnotationValue::Long(l) => format!("{}L", l),
            AnnotationValue::Float(f) => format!("{:?}f", f),
            AnnotationValue::Double(d) => format!("{:?}", d),
            AnnotationValue::Class(ty) => format!("{}.class", self.ty(&ty.erasure())),
            AnnotationValue::Enum { r#type, constant } => {
                format!("{}.{}", self.class(r#type), constant)
            }
            AnnotationValue::Annotation(nested) => self.annotation(nested),
            AnnotationValue::Array(values) => {
                let rendered: Vec<String> =
                    values.iter().map(|v| self.annotation_value(v)).collect();
                format!("{{{}}}", rendered.join(", "))
            }
        }
    }

    // ========== 拦截子类 ==========

    fn write_type(&mut self, generated: &GeneratedType) {
        for annotation in &generated.annotations {
            let rendered = self.annotation(annotation);
            self.line(&rendered);
        }
        let own = self.class(&generated.name);
        let superclass = self.class(&generated.superclass);
        self.line(&format!(
            "{}class {} extends {} {{",
            Self::modifiers(&generated.modifiers),
            own,
            superclass
        ));
        self.indent();
        self.first_member = true;

        let method_type = self.class_str(METHOD);
        let list_type = self.class_str(LIST);
        let annotation_type = self.class_str(ANNOTATION);
        for cache in &generated.caches {
            self.member();
            self.line(&format!("private static final {} {};", method_type, cache.method_field));
            self.member();
            self.line(&format!(
                "private static final {}<{}> {};",
                list_type, annotation_type, cache.annotations_field
            ));
        }

        if !generated.caches.is_empty() {
            self.member();
            self.write_static_initializer(generated, &own);
        }

        for field in &generated.interceptor_fields {
            self.member();
            let ty = self.class(&field.interceptor_type);
            self.line(&format!("private final {} {};", ty, field.name));
        }

        self.member();
        self.write_constructor(generated);

        for method in &generated.methods {
            self.member();
            self.write_method(method, &own, &generated.invocation_type);
        }

        self.dedent();
        self.line("}");
    }

    fn write_static_initializer(&mut self, generated: &GeneratedType, own: &str) {
        let arrays = self.class_str(ARRAYS);
        let no_such_method = self.class_str(NO_SUCH_METHOD_EXCEPTION);
        let security = self.class_str(SECURITY_EXCEPTION);
        let runtime_exception = self.class_str(RUNTIME_EXCEPTION);

        self.line("static {");
        self.indent();
        self.line("try {");
        self.indent();
        for cache in &generated.caches {
            let mut lookup = vec![string_literal(&cache.method_name)];
            for ty in &cache.parameter_types {
                lookup.push(format!("{}.class", self.ty(ty)));
            }
            self.line(&format!(
                "{} = {}.class.getSuperclass().getDeclaredMethod({});",
                cache.method_field,
                own,
                lookup.join(", ")
            ));
            self.line(&format!(
                "{} = {}.asList({}.getAnnotations());",
                cache.annotations_field, arrays, cache.method_field
            ));
        }
        self.dedent();
        self.line(&format!("}} catch ({} | {} e) {{", no_such_method, security));
        self.indent();
        self.line(&format!("throw new {}(e);", runtime_exception));
        self.dedent();
        self.line("}");
        self.dedent();
        self.line("}");
    }

    fn write_constructor(&mut self, generated: &GeneratedType) {
        let constructor = &generated.constructor;
        for annotation in &constructor.annotations {
            let rendered = self.annotation(annotation);
            self.line(&rendered);
        }
        let type_parameters = self.type_parameters(&constructor.type_parameters);
        let parameters = self.parameters(&constructor.parameters, constructor.varargs);
        let throws = self.throws(&constructor.thrown_types);
        self.line(&format!(
            "{}{}{}({}){} {{",
            Self::modifiers(&constructor.modifiers),
            type_parameters,
            generated.name.simple_name(),
            parameters,
            throws
        ));
        self.indent();
        self.line(&format!("super({});", constructor.super_arguments.join(", ")));
        for field in &constructor.assigned_fields {
            self.line(&format!("this.{} = {};", field, field));
        }
        self.dedent();
        self.line("}");
    }

    fn write_method(&mut self, method: &InterceptedMethod, own: &str, invocation_type: &ClassName) {
        let override_annotation = self.class_str(OVERRIDE_ANNOTATION);
        self.line(&format!("@{}", override_annotation));

        let type_parameters = self.type_parameters(&method.type_parameters);
        let return_type = self.ty(&method.return_type);
        let parameters = self.parameters(&method.parameters, method.varargs);
        let throws = self.throws(&method.thrown_types);
        self.line(&format!(
            "{}{}{} {}({}){} {{",
            Self::modifiers(&method.modifiers),
            type_parameters,
            return_type,
            method.name,
            parameters,
            throws
        ));
        self.indent();

        let arguments: Vec<&str> = method.parameters.iter().map(|p| p.name.as_str()).collect();
        let array = if arguments.is_empty() {
            "{}".to_string()
        } else {
            format!("{{ {} }}", arguments.join(", "))
        };
        let object = self.class_str(OBJECT);
        self.line(&format!(
            "final {}[] {} = new {}[] {};",
            object, method.arguments_var, object, array
        ));

        self.line("try {");
        self.indent();
        let prefix = if method.returns_value() {
            let cast = self.ty(&method.return_type.boxed());
            format!("return ({}) ", cast)
        } else {
            String::new()
        };
        self.write_chain(&method.chain, &prefix, method, own, invocation_type);
        self.dedent();

        // 声明的异常之间可能有继承关系，不能逐个 catch
        let e = &method.exception_var;
        let throwable = self.class_str(THROWABLE);
        self.line(&format!("}} catch ({} {}) {{", throwable, e));
        self.indent();
        for rethrown in &method.rethrown {
            let check = self.ty(&rethrown.erasure());
            let cast = self.ty(rethrown);
            self.line(&format!("if ({} instanceof {}) {{", e, check));
            self.indent();
            self.line(&format!("throw ({}) {};", cast, e));
            self.dedent();
            self.line("}");
        }
        if method.wraps_throwable {
            let runtime_exception = self.class_str(RUNTIME_EXCEPTION);
            self.line(&format!("throw new {}({});", runtime_exception, e));
        } else {
            self.line(&format!("throw {};", e));
        }
        self.dedent();
        self.line("}");

        self.dedent();
        self.line("}");
    }

    /// 渲染一层拦截链，`prefix` 是这一层表达式前的 `return`（以及类型转换）
    fn write_chain(
        &mut self,
        chain: &ProceedChain,
        prefix: &str,
        method: &InterceptedMethod,
        own: &str,
        invocation_type: &ClassName,
    ) {
        match chain {
            ProceedChain::Super { method: name, arguments } => {
                let prefix = if method.returns_value() { "return " } else { "" };
                self.line(&format!(
                    "{}{}.super.{}({});",
                    prefix,
                    own,
                    name,
                    arguments.join(", ")
                ));
            }
            ProceedChain::Intercept {
                interceptor,
                method_cache,
                annotations_cache,
                next,
            } => {
                let invocation = self.class(invocation_type);
                self.line(&format!("{}{}.invoke(new {}(", prefix, interceptor, invocation));
                self.indent();
                self.indent();
                self.line(&format!("{}.this,", own));
                self.line(&format!("{}.{},", own, method_cache));
                self.line(&format!("{},", method.arguments_var));
                self.line(&format!("{}.{}) {{", own, annotations_cache));
                self.dedent();
                self.dedent();

                self.indent();
                let throwable = self.class_str(THROWABLE);
                let override_annotation = self.class_str(OVERRIDE_ANNOTATION);
                self.line(&format!("@{}", override_annotation));
                if method.returns_value() {
                    let object = self.class_str(OBJECT);
                    self.line(&format!("public {} proceed() throws {} {{", object, throwable));
                } else {
                    self.line(&format!("protected void noReturnProceed() throws {} {{", throwable));
                }
                self.indent();
                let inner_prefix = if method.returns_value() { "return " } else { "" };
                self.write_chain(next, inner_prefix, method, own, invocation_type);
                self.dedent();
                self.line("}");
                self.dedent();
                self.line("});");
            }
        }
    }

    // ========== 模块 ==========

    fn write_module(&mut self, module: &GeneratedModule) {
        self.line("/**");
        for line in module.javadoc.lines() {
            if line.is_empty() {
                self.line(" *");
            } else {
                self.line(&format!(" * {}", line));
            }
        }
        self.line(" */");
        for annotation in &module.annotations {
            let rendered = self.annotation(annotation);
            self.line(&rendered);
        }
        self.line(&format!(
            "public abstract class {} {{",
            module.name.simple_name()
        ));
        self.indent();
        self.first_member = true;

        let binds = self.class_str(BINDS_ANNOTATION);
        for binding in &module.bindings {
            self.member();
            let original = self.class(&binding.original);
            let generated = self.class(&binding.generated);
            self.line(&format!("@{}", binds));
            self.line(&format!(
                "abstract {} {}(final {} impl);",
                original, binding.method_name, generated
            ));
        }

        self.dedent();
        self.line("}");
    }
}

/// Java 字符串字面量
fn string_literal(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Java 字符字面量
fn char_literal(c: char) -> String {
    match c {
        '\'' => "'\\''".to_string(),
        '\\' => "'\\\\'".to_string(),
        '\n' => "'\\n'".to_string(),
        '\t' => "'\\t'".to_string(),
        c => format!("'{}'", c),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::spec::ModuleBinding;

    #[test]
    fn test_string_literal_escapes() {
        assert_eq!(string_literal("a\"b\\c\n"), "\"a\\\"b\\\\c\\n\"");
        assert_eq!(char_literal('\''), "'\\''");
    }

    #[test]
    fn test_import_table() {
        let referenced: BTreeSet<ClassName> = [
            ClassName::new("java.lang", "String"),
            ClassName::new("java.util", "List"),
            ClassName::new("test", "Service"),
            ClassName::get("other", &["Holder", "Inner"]),
            ClassName::new("a", "Clash"),
            ClassName::new("b", "Clash"),
        ]
        .into();
        let own = ClassName::new("test", "Interceptor_Service");
        let table = ImportTable::build("test", &own, referenced, &BTreeSet::new());

        let imports: Vec<&str> = table.imports.iter().map(String::as_str).collect();
        assert_eq!(imports, vec!["java.util.List", "other.Holder"]);
        assert_eq!(table.name(&ClassName::new("java.lang", "String")), "String");
        assert_eq!(table.name(&ClassName::get("other", &["Holder", "Inner"])), "Holder.Inner");
        assert_eq!(table.name(&ClassName::new("a", "Clash")), "a.Clash");
        assert_eq!(table.name(&own), "Interceptor_Service");
    }

    #[test]
    fn test_member_types_are_never_short() {
        let referenced: BTreeSet<ClassName> = [
            ClassName::new("java.lang", "Object"),
            ClassName::new("java.lang.reflect", "Method"),
            ClassName::new("java.util", "List"),
        ]
        .into();
        let own = ClassName::new("test", "Interceptor_Service");
        let member_types: BTreeSet<String> = ["Method".to_string()].into();
        let table = ImportTable::build("test", &own, referenced, &member_types);

        let imports: Vec<&str> = table.imports.iter().map(String::as_str).collect();
        assert_eq!(imports, vec!["java.util.List"]);
        assert_eq!(
            table.name(&ClassName::new("java.lang.reflect", "Method")),
            "java.lang.reflect.Method"
        );
        assert_eq!(table.name(&ClassName::new("java.lang", "Object")), "Object");
    }

    #[test]
    fn test_render_module() {
        let module = GeneratedModule {
            name: ClassName::new("test", "InterceptorModule"),
            javadoc: "This class is the default Dagger module for Intercepted Methods.".to_string(),
            annotations: vec![AnnotationMirror::of(ClassName::new("dagger", "Module"))],
            bindings: vec![ModuleBinding {
                method_name: "providesWithoutConstructor".to_string(),
                original: ClassName::new("test", "WithoutConstructor"),
                generated: ClassName::new("test", "Interceptor_WithoutConstructor"),
            }],
        };

        let expected = "\
package test;

import dagger.Binds;
import dagger.Module;

/**
 * This class is the default Dagger module for Intercepted Methods.
 */
@Module
public abstract class InterceptorModule {
  @Binds
  abstract WithoutConstructor providesWithoutConstructor(final Interceptor_WithoutConstructor impl);
}
";
        assert_eq!(JavaWriter::render_module(&module), expected);
    }

    #[test]
    fn test_annotation_rendering() {
        let mut writer = JavaWriter::new(Names::Collect(BTreeSet::new()));
        let named = AnnotationMirror::of(ClassName::new("javax.inject", "Named"))
            .with_value("value", AnnotationValue::String("dep".to_string()));
        assert_eq!(writer.annotation(&named), "@javax.inject.Named(\"dep\")");

        let generated = AnnotationMirror::of(ClassName::new("javax.annotation", "Generated"))
            .with_value("value", AnnotationValue::String("gen".to_string()))
            .with_value(
                "comments",
                AnnotationValue::Array(vec![AnnotationValue::Int(1), AnnotationValue::Long(2)]),
            );
        assert_eq!(
            writer.annotation(&generated),
            "@javax.annotation.Generated(value = \"gen\", comments = {1, 2L})"
        );
    }
}
