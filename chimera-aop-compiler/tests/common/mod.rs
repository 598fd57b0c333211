//! 集成测试共用的处理器和夹具

#![allow(dead_code)]

use chimera_aop_compiler::prelude::*;
use chimera_aop_compiler::{ElementType, RetentionPolicy};
use std::path::PathBuf;

pub const VALID_ANNOTATION: &str = "com.chimera.aop.test.annotation.ValidAnnotation";
pub const VALID_ANNOTATION_2: &str = "com.chimera.aop.test.annotation.ValidAnnotation2";

fn class(name: &str) -> ClassName {
    ClassName::best_guess(name).expect("test class names are valid")
}

#[derive(Default)]
pub struct ValidHandler;

impl InterceptorHandler for ValidHandler {
    fn annotation(&self) -> AnnotationType {
        AnnotationType::method_annotation(class(VALID_ANNOTATION))
    }

    fn interceptor_type(&self) -> ClassName {
        class("com.chimera.aop.test.Interceptor")
    }
}

#[derive(Default)]
pub struct ValidHandler2;

impl InterceptorHandler for ValidHandler2 {
    fn annotation(&self) -> AnnotationType {
        AnnotationType::method_annotation(class(VALID_ANNOTATION_2))
    }

    fn interceptor_type(&self) -> ClassName {
        class("com.chimera.aop.test.Interceptor2")
    }
}

/// 注解没有 `@Retention(RUNTIME)`
#[derive(Default)]
pub struct InvalidHandler;

impl InterceptorHandler for InvalidHandler {
    fn annotation(&self) -> AnnotationType {
        AnnotationType::new(class("com.chimera.aop.test.annotation.InvalidAnnotation"))
            .with_retention(RetentionPolicy::Class)
            .with_targets(vec![ElementType::Method])
    }

    fn interceptor_type(&self) -> ClassName {
        class("com.chimera.aop.test.Interceptor")
    }
}

pub fn registry() -> HandlerRegistry {
    HandlerRegistry::builder()
        .register(ValidHandler)
        .register(ValidHandler2)
        .build()
        .expect("test handlers are valid")
}

pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

pub fn fixture(name: &str) -> RoundEnvironment {
    let json = std::fs::read_to_string(fixture_path(name)).expect("fixture exists");
    RoundEnvironment::from_json(&json).expect("fixture is a valid element model")
}

pub fn expected(name: &str) -> String {
    std::fs::read_to_string(fixture_path("expected").join(name)).expect("expected source exists")
}

/// 一次完整处理的结果
pub struct Outcome {
    pub report: ProcessingReport,
    pub messager: CollectingMessager,
    pub filer: MemoryFiler,
}

pub fn run(round: &RoundEnvironment, options: &ProcessorOptions) -> Outcome {
    let mut processor = InterceptorProcessor::new(registry());
    let mut messager = CollectingMessager::new();
    let mut filer = MemoryFiler::new();
    let report = processor
        .process(
            round,
            &mut ProcessingEnvironment::new(options, &mut messager, &mut filer),
        )
        .expect("processing completes");
    Outcome {
        report,
        messager,
        filer,
    }
}
