mod common;

use chimera_aop_compiler::prelude::*;
use chimera_aop_compiler::{HandlerPolicy, ProcessorError, ValidationPolicy};
use common::*;

#[test]
fn test_without_constructor_matches_expected_source() {
    let outcome = run(
        &fixture("without_constructor.json"),
        &ProcessorOptions::default(),
    );
    assert!(!outcome.messager.has_errors(), "{:?}", outcome.messager.diagnostics());
    assert_eq!(
        outcome.filer.source("test.Interceptor_WithoutConstructor"),
        Some(expected("Interceptor_WithoutConstructor.java").as_str())
    );
}

#[test]
fn test_with_constructor_clones_constructor() {
    let outcome = run(&fixture("with_constructor.json"), &ProcessorOptions::default());
    let source = outcome
        .filer
        .source("test.Interceptor_WithConstructor")
        .expect("interceptor generated");

    assert!(source.contains("import javax.inject.Named;\n"));
    assert!(source.contains(
        "  @Inject\n  public Interceptor_WithConstructor(@Named(\"myDepAnnotation\") final String someDep, \
         final Interceptor $interceptorValidAnnotation, final Interceptor2 $interceptorValidAnnotation2) {\n    \
         super(someDep);\n"
    ));
    assert!(source.contains(
        "doSomeWorkReturnCache$ = Interceptor_WithConstructor.class.getSuperclass()\
         .getDeclaredMethod(\"doSomeWorkReturn\", String.class);"
    ));
    assert!(source.contains("      return (String) $interceptorValidAnnotation.invoke(new AbstractMethodInvocation(\n"));
    assert_eq!(source.matches("private final Interceptor $interceptorValidAnnotation;").count(), 1);
}

#[test]
fn test_default_module_binds_public_classes() {
    let options = ProcessorOptions::default().with_module_package("test");
    let outcome = run(&fixture("without_constructor.json"), &options);
    assert_eq!(
        outcome.report.module,
        Some(ClassName::new("test", "InterceptorModule"))
    );

    let module = outcome.filer.source("test.InterceptorModule").expect("module generated");
    assert!(module.contains(
        "/**\n * This class is the default Dagger module for Intercepted Methods.\n */\n"
    ));
    assert!(module.contains("@Module\npublic abstract class InterceptorModule {\n"));
    assert!(module.contains(
        "  @Binds\n  abstract WithoutConstructor providesWithoutConstructor(final Interceptor_WithoutConstructor impl);\n"
    ));
}

#[test]
fn test_module_skips_package_private_classes() {
    let outcome = run(&fixture("module_visibility.json"), &ProcessorOptions::default());
    assert_eq!(outcome.report.generated.len(), 2);

    let module = outcome
        .filer
        .source("com.chimera.aop.InterceptorModule")
        .expect("module generated");
    assert_eq!(module.matches("@Binds").count(), 1);
    assert!(module.contains("providesPublicService"));
    assert!(!module.contains("providesHiddenService"));

    let warnings: Vec<_> = outcome.messager.warnings().collect();
    assert_eq!(warnings.len(), 1);
    assert_eq!(
        warnings[0].message,
        "Could not create InterceptorModule bind, source class is not visible outside its package!"
    );
    assert_eq!(warnings[0].element.as_deref(), Some("test.HiddenService"));
}

#[test]
fn test_disabled_module_generation() {
    let options = ProcessorOptions::default().with_module_generation_disabled(true);
    let outcome = run(&fixture("without_constructor.json"), &options);
    assert!(outcome.report.module.is_none());
    assert!(outcome.filer.source("com.chimera.aop.InterceptorModule").is_none());
    assert!(outcome.filer.source("test.Interceptor_WithoutConstructor").is_some());
}

#[test]
fn test_multiple_constructors_rejected() {
    let outcome = run(&fixture("multiple_constructors.json"), &ProcessorOptions::default());
    assert!(outcome.messager.has_error_containing("only one constructor"));
    assert!(outcome.filer.sources().is_empty());
    assert_eq!(outcome.report.rejected, 1);
}

#[test]
fn test_not_abstract_rejected() {
    let outcome = run(&fixture("not_abstract.json"), &ProcessorOptions::default());
    assert!(outcome.messager.has_error_containing("must be Abstract"));
    assert!(outcome.filer.sources().is_empty());
}

#[test]
fn test_abstract_methods_follow_validation_policy() {
    let strict = run(&fixture("abstract_method.json"), &ProcessorOptions::default());
    assert!(strict.messager.has_error_containing("cannot have Abstract methods"));
    assert!(strict.report.generated.is_empty());

    let lenient = run(
        &fixture("abstract_method.json"),
        &ProcessorOptions::default().with_validation_policy(ValidationPolicy::Lenient),
    );
    assert!(!lenient.messager.has_errors());
    assert_eq!(
        lenient.report.generated,
        vec![ClassName::new("test", "Interceptor_AbstractMethod")]
    );
}

#[test]
fn test_generation_is_deterministic() {
    let first = run(&fixture("with_constructor.json"), &ProcessorOptions::default());
    let second = run(&fixture("with_constructor.json"), &ProcessorOptions::default());
    assert_eq!(first.filer.sources(), second.filer.sources());
    assert_eq!(first.messager.diagnostics(), second.messager.diagnostics());
}

#[test]
fn test_declared_exception_is_rethrown_before_wrapping() {
    let outcome = run(&fixture("with_constructor.json"), &ProcessorOptions::default());
    let source = outcome
        .filer
        .source("test.Interceptor_WithConstructor")
        .expect("interceptor generated");
    assert!(source.contains(
        "    } catch (Throwable e) {\n      if (e instanceof WithConstructor.MyException) {\n        \
         throw (WithConstructor.MyException) e;\n      }\n      throw new RuntimeException(e);\n    }\n"
    ));
}

#[test]
fn test_related_declared_exceptions_share_one_catch() {
    let outcome = run(&fixture("related_exceptions.json"), &ProcessorOptions::default());
    assert!(!outcome.messager.has_errors(), "{:?}", outcome.messager.diagnostics());
    let source = outcome
        .filer
        .source("test.Interceptor_Reader")
        .expect("interceptor generated");

    assert!(source.contains("import java.io.FileNotFoundException;\nimport java.io.IOException;\n"));
    assert!(source.contains("  public String read() throws IOException, FileNotFoundException {\n"));
    assert!(source.contains(
        "    } catch (Throwable e) {\n\
         \x20     if (e instanceof IOException) {\n\
         \x20       throw (IOException) e;\n\
         \x20     }\n\
         \x20     if (e instanceof FileNotFoundException) {\n\
         \x20       throw (FileNotFoundException) e;\n\
         \x20     }\n\
         \x20     throw new RuntimeException(e);\n\
         \x20   }\n"
    ));
    assert!(!source.contains("catch (IOException"));
    assert!(!source.contains("catch (FileNotFoundException"));
    // 静态初始化块一个，方法体一个
    assert_eq!(source.matches("} catch (").count(), 2);
}

#[test]
fn test_superclass_member_types_are_not_shadowed() {
    let outcome = run(&fixture("shadowing.json"), &ProcessorOptions::default());
    assert!(!outcome.messager.has_errors(), "{:?}", outcome.messager.diagnostics());
    let source = outcome
        .filer
        .source("test.Interceptor_Shadowing")
        .expect("interceptor generated");

    assert!(!source.contains("import java.lang.reflect.Method;"));
    assert!(!source.contains("import java.util.List;"));
    assert!(source.contains("  private static final java.lang.reflect.Method describeCache$;\n"));
    assert!(source.contains(
        "  private static final java.util.List<Annotation> describeAnnotationsCache$;\n"
    ));
    assert!(source.contains("  public String describe(test.Object value) {\n"));
    assert!(source.contains(
        "    final java.lang.Object[] arguments = new java.lang.Object[] { value };\n"
    ));
    assert!(source.contains("        public java.lang.Object proceed() throws Throwable {\n"));
    assert!(source.contains(".getDeclaredMethod(\"describe\", test.Object.class);"));
}

#[test]
fn test_runtime_contract_matches_generated_invocations() {
    let outcome = run(&fixture("without_constructor.json"), &ProcessorOptions::default());
    assert_eq!(outcome.report.runtime.len(), 3);

    let runtime = outcome
        .filer
        .source("com.chimera.aop.AbstractMethodInvocation")
        .expect("runtime emitted");
    assert!(runtime.starts_with("package com.chimera.aop;\n\n"));
    assert!(runtime.contains(
        "  public AbstractMethodInvocation(final Object instance, final Method method, \
         final Object[] arguments, final List<Annotation> annotations) {\n"
    ));
    assert!(runtime.contains("  public Object proceed() throws Throwable {\n"));
    assert!(runtime.contains("  protected void noReturnProceed() throws Throwable {\n"));

    let interceptor = outcome
        .filer
        .source("com.chimera.aop.MethodInterceptor")
        .expect("runtime emitted");
    assert!(interceptor.contains("  Object invoke(MethodInvocation invocation) throws Throwable;\n"));

    // 生成的调用按构造函数的顺序传入 Object、Method、Object[]、List<Annotation>
    let generated = outcome
        .filer
        .source("test.Interceptor_WithoutConstructor")
        .expect("interceptor generated");
    assert!(generated.contains("import com.chimera.aop.AbstractMethodInvocation;\n"));
    assert!(generated.contains("  private static final Method doSomeWorkReturnCache$;\n"));
    assert!(generated.contains(
        "  private static final List<Annotation> doSomeWorkReturnAnnotationsCache$;\n"
    ));
    assert!(generated.contains("    final Object[] arguments = new Object[] {};\n"));
    assert!(generated.contains(
        "new AbstractMethodInvocation(\n\
         \x20         Interceptor_WithoutConstructor.this,\n\
         \x20         Interceptor_WithoutConstructor.doSomeWorkReturnCache$,\n\
         \x20         arguments,\n\
         \x20         Interceptor_WithoutConstructor.doSomeWorkReturnAnnotationsCache$) {\n"
    ));
    assert!(generated.contains("        public Object proceed() throws Throwable {\n"));
    assert!(generated.contains("        protected void noReturnProceed() throws Throwable {\n"));
}

#[test]
fn test_first_annotation_is_outermost() {
    let outcome = run(&fixture("with_constructor.json"), &ProcessorOptions::default());
    let source = outcome
        .filer
        .source("test.Interceptor_WithConstructor")
        .expect("interceptor generated");
    let outer = source
        .find("      $interceptorValidAnnotation.invoke(new AbstractMethodInvocation(\n          Interceptor_WithConstructor.this,\n          Interceptor_WithConstructor.doSomeWorkMultipleAndThrowsCache$")
        .expect("outer layer uses the first annotation");
    let inner = source
        .find("          $interceptorValidAnnotation2.invoke(")
        .expect("inner layer uses the second annotation");
    assert!(outer < inner);
}

#[test]
fn test_no_handlers_reports_error() {
    let mut processor =
        InterceptorProcessor::new(HandlerRegistry::builder().build().expect("empty registry"));
    let options = ProcessorOptions::default();
    let mut messager = CollectingMessager::new();
    let mut filer = MemoryFiler::new();
    let report = processor
        .process(
            &fixture("without_constructor.json"),
            &mut ProcessingEnvironment::new(&options, &mut messager, &mut filer),
        )
        .unwrap();

    assert!(report.generated.is_empty());
    assert_eq!(messager.errors().count(), 1);
    assert!(messager.has_error_containing(
        "No InterceptorHandler registered. Did you forgot to add some interceptor in your dependencies?"
    ));
}

#[test]
fn test_invalid_handler_policy() {
    let fail_fast = HandlerRegistry::builder()
        .register(ValidHandler)
        .register(InvalidHandler)
        .build();
    match fail_fast {
        Err(ProcessorError::InvalidHandler { requirement, .. }) => {
            assert_eq!(requirement, "Retention set to RUNTIME")
        }
        other => panic!("expected an invalid handler error, got {:?}", other.map(|r| r.len())),
    }

    let registry = HandlerRegistry::builder()
        .policy(HandlerPolicy::Lenient)
        .register(ValidHandler)
        .register(InvalidHandler)
        .build()
        .expect("lenient policy drops the invalid handler");
    assert_eq!(registry.len(), 1);

    let mut processor = InterceptorProcessor::new(registry);
    let options = ProcessorOptions::default();
    let mut messager = CollectingMessager::new();
    let mut filer = MemoryFiler::new();
    let report = processor
        .process(
            &fixture("not_abstract.json"),
            &mut ProcessingEnvironment::new(&options, &mut messager, &mut filer),
        )
        .unwrap();
    assert_eq!(report.rejected, 1);
    assert!(messager
        .warnings()
        .any(|w| w.message.contains("must have Retention set to RUNTIME")));
}

#[test]
fn test_directory_filer_writes_sources() {
    let dir = tempfile::tempdir().unwrap();
    let mut processor = InterceptorProcessor::new(registry());
    let options = ProcessorOptions::default().with_module_package("test");
    let mut messager = CollectingMessager::new();
    let mut filer = DirectoryFiler::new(dir.path());
    let report = processor
        .process(
            &fixture("without_constructor.json"),
            &mut ProcessingEnvironment::new(&options, &mut messager, &mut filer),
        )
        .unwrap();

    assert!(report.is_success());
    let written =
        std::fs::read_to_string(dir.path().join("test/Interceptor_WithoutConstructor.java")).unwrap();
    assert_eq!(written, expected("Interceptor_WithoutConstructor.java"));
    assert!(dir.path().join("test/InterceptorModule.java").exists());
}
