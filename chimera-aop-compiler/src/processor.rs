//! 处理器主流程
//!
//! 每一轮处理：
//! 1. 按注册顺序遍历处理器，收集带对应注解的元素并校验
//! 2. 合并为方法绑定，按类分组排序
//! 3. 为每个类生成拦截子类并写出
//! 4. 生成依赖注入模块和运行时类型（都可关闭，都只输出一次）
//! 5. 通知各个处理器它处理过的类
//!
//! 注册表在处理器创建时构建一次，之后所有轮次复用。

use crate::codegen::{runtime_sources, InterceptorGenerator, JavaWriter, ModuleEmitter};
use crate::constants::*;
use crate::diagnostic::{Diagnostic, Messager};
use crate::element::{ClassName, ElementRef, TypeElement};
use crate::error::{render_chain, Result};
use crate::filer::Filer;
use crate::grouping::{BindingCollector, ClassGrouping};
use crate::handler::HandlerRegistry;
use crate::options::ProcessorOptions;
use crate::round::RoundEnvironment;
use crate::validator::{Rejection, Validator};
use std::collections::BTreeSet;

const NO_HANDLERS: &str =
    "No InterceptorHandler registered. Did you forgot to add some interceptor in your dependencies?";

/// 处理器可以访问的宿主能力
pub struct ProcessingEnvironment<'e> {
    pub options: &'e ProcessorOptions,
    pub messager: &'e mut dyn Messager,
    pub filer: &'e mut dyn Filer,
}

impl<'e> ProcessingEnvironment<'e> {
    pub fn new(
        options: &'e ProcessorOptions,
        messager: &'e mut dyn Messager,
        filer: &'e mut dyn Filer,
    ) -> Self {
        Self {
            options,
            messager,
            filer,
        }
    }
}

/// 一轮处理的结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessingReport {
    /// 写出的拦截子类
    pub generated: Vec<ClassName>,

    /// 写出的依赖注入模块
    pub module: Option<ClassName>,

    /// 写出的运行时类型
    pub runtime: Vec<ClassName>,

    /// 生成或写出失败的原始类
    pub failed: Vec<ClassName>,

    /// 被拒绝的元素数量
    pub rejected: usize,

    /// 之前轮次已经生成过的原始类
    pub skipped: Vec<ClassName>,
}

impl ProcessingReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty() && self.rejected == 0
    }
}

/// 拦截子类处理器
pub struct InterceptorProcessor {
    registry: HandlerRegistry,

    /// 已经生成过拦截子类的原始类
    generated: BTreeSet<ClassName>,

    module_generated: bool,
    runtime_generated: bool,
    warnings_reported: bool,
    no_handlers_reported: bool,
}

impl InterceptorProcessor {
    pub fn new(registry: HandlerRegistry) -> Self {
        Self {
            registry,
            generated: BTreeSet::new(),
            module_generated: false,
            runtime_generated: false,
            warnings_reported: false,
            no_handlers_reported: false,
        }
    }

    /// 使用所有通过 `submit_handler!` 注册的处理器
    ///
    /// 同时按选项初始化日志；宿主已经装好全局订阅者时沿用宿主的。
    pub fn discover(options: &ProcessorOptions) -> Result<Self> {
        if let Err(e) = options.logging.clone().init() {
            tracing::debug!("Keeping existing subscriber: {}", e);
        }
        HandlerRegistry::discover(options.handler_policy).map(Self::new)
    }

    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    /// 处理器关心的注解
    pub fn supported_annotations(&self) -> Vec<ClassName> {
        self.registry.annotations()
    }

    /// 处理器识别的选项
    pub fn supported_options() -> &'static [&'static str] {
        &[
            OPTION_DISABLE_MODULE_GENERATION,
            OPTION_DISABLE_RUNTIME_GENERATION,
            OPTION_MODULE_PACKAGE,
            OPTION_RUNTIME_PACKAGE,
            OPTION_VALIDATION_POLICY,
            OPTION_HANDLER_POLICY,
            OPTION_CONFIG_FILE,
            OPTION_LOG_LEVEL,
            OPTION_LOG_FORMAT,
        ]
    }

    /// 处理一轮
    ///
    /// 被拒绝的元素和写出失败的类以诊断信息报告，不会中断这一轮；
    /// 只有分组阶段的内部错误会返回 `Err`。
    pub fn process(
        &mut self,
        round: &RoundEnvironment,
        env: &mut ProcessingEnvironment<'_>,
    ) -> Result<ProcessingReport> {
        let mut report = ProcessingReport::default();
        tracing::info!(
            "Processing round with {} root types",
            round.root_elements().len()
        );

        if !self.warnings_reported {
            for warning in self.registry.warnings() {
                env.messager.warning(warning, None);
            }
            self.warnings_reported = true;
        }

        if self.registry.is_empty() {
            if !self.no_handlers_reported {
                env.messager.error(NO_HANDLERS, None);
                self.no_handlers_reported = true;
            }
            return Ok(report);
        }

        let collector = self.collect(round, env, &mut report);
        let groupings = collector.into_groupings(round)?;

        let generator =
            InterceptorGenerator::new(&self.registry, env.options.runtime_package.as_str());
        let mut processed: Vec<&ClassGrouping<'_>> = Vec::new();
        let mut originals: Vec<ClassName> = Vec::new();
        for grouping in &groupings {
            let original = grouping.class_name().clone();
            if self.generated.contains(&original) {
                tracing::debug!("{} was generated in an earlier round, skipping", original);
                report.skipped.push(original);
                continue;
            }
            processed.push(grouping);

            match Self::write_interceptor(&generator, grouping, &mut *env.filer) {
                Ok(name) => {
                    tracing::info!("Generated {}", name);
                    self.generated.insert(original.clone());
                    originals.push(original);
                    report.generated.push(name);
                }
                Err(error) => {
                    let name = InterceptorGenerator::interceptor_name(&original);
                    env.messager.error(
                        &format!(
                            "Error generating source file for type {}\n{}",
                            name,
                            render_chain(&error)
                        ),
                        Some(ElementRef::Type(grouping.class())),
                    );
                    report.failed.push(original);
                }
            }
        }

        report.module = self.write_module(round, env, &originals);
        if !originals.is_empty() {
            report.runtime = self.write_runtime(env);
        }

        for handler in self.registry.handlers() {
            let annotation = handler.annotation().name;
            let classes: Vec<&TypeElement> = processed
                .iter()
                .filter(|g| g.uses_annotation(&annotation))
                .map(|g| g.class())
                .collect();
            tracing::debug!(
                "Post-processing {} classes with {}",
                classes.len(),
                handler.name()
            );
            handler.post_process(env, &classes);
        }

        tracing::info!(
            "Round finished: {} generated, {} failed, {} rejected",
            report.generated.len(),
            report.failed.len(),
            report.rejected
        );
        Ok(report)
    }

    /// 校验所有带标记注解的元素，收集通过的方法
    fn collect<'r>(
        &self,
        round: &'r RoundEnvironment,
        env: &mut ProcessingEnvironment<'_>,
        report: &mut ProcessingReport,
    ) -> BindingCollector<'r> {
        let validator = Validator::new(env.options.validation_policy);
        let mut collector = BindingCollector::new();

        for handler in self.registry.handlers() {
            let annotation = handler.annotation().name;
            for element in round.elements_annotated_with(&annotation) {
                let checked = validator.validate(round, element).and_then(|method| {
                    match handler.validate_method(method) {
                        Some(message) => Err(Rejection::Handler(message)),
                        None => Ok(method),
                    }
                });

                match checked {
                    Ok(method) => collector.add(method, annotation.clone()),
                    Err(rejection) => {
                        tracing::debug!("Rejected {}: {}", element.location(), rejection);
                        env.messager.print_message(Diagnostic::new(
                            validator.severity(&rejection),
                            rejection.to_string(),
                            Some(element),
                        ));
                        report.rejected += 1;
                    }
                }
            }
        }
        collector
    }

    fn write_interceptor(
        generator: &InterceptorGenerator<'_>,
        grouping: &ClassGrouping<'_>,
        filer: &mut dyn Filer,
    ) -> Result<ClassName> {
        let generated = generator.generate(grouping)?;
        InterceptorGenerator::verify(&generated, grouping.class())?;
        let text = JavaWriter::render_type(&generated);
        filer.create_source_file(&generated.qualified_name(), &text)?;
        Ok(generated.name)
    }

    /// 运行时类型在第一次生成拦截子类的轮次写出一次
    fn write_runtime(&mut self, env: &mut ProcessingEnvironment<'_>) -> Vec<ClassName> {
        if env.options.disable_runtime_generation || self.runtime_generated {
            return Vec::new();
        }
        self.runtime_generated = true;

        let mut written = Vec::new();
        for source in runtime_sources(&env.options.runtime_package) {
            match env
                .filer
                .create_source_file(&source.qualified_name(), &source.text)
            {
                Ok(()) => {
                    tracing::debug!("Generated runtime type {}", source.name);
                    written.push(source.name);
                }
                Err(error) => env.messager.error(
                    &format!(
                        "Error generating source file for type {}\n{}",
                        source.name,
                        render_chain(&error)
                    ),
                    None,
                ),
            }
        }
        written
    }

    /// 模块只在第一次有绑定的轮次写出一次
    fn write_module(
        &mut self,
        round: &RoundEnvironment,
        env: &mut ProcessingEnvironment<'_>,
        originals: &[ClassName],
    ) -> Option<ClassName> {
        if env.options.disable_module_generation || originals.is_empty() {
            return None;
        }

        let emitter = ModuleEmitter::new(env.options.module_package.as_str());
        if self.module_generated {
            env.messager.warning(
                &format!(
                    "{} was generated in an earlier round, no bindings added for {} classes",
                    emitter.module_name(),
                    originals.len()
                ),
                None,
            );
            return None;
        }

        let module = emitter.emit(round, originals, &mut *env.messager)?;
        let text = JavaWriter::render_module(&module);
        match env.filer.create_source_file(&module.qualified_name(), &text) {
            Ok(()) => {
                tracing::info!(
                    "Generated {} with {} bindings",
                    module.name,
                    module.bindings.len()
                );
                self.module_generated = true;
                Some(module.name)
            }
            Err(error) => {
                env.messager.error(
                    &format!(
                        "Error generating source file for type {}\n{}",
                        module.name,
                        render_chain(&error)
                    ),
                    None,
                );
                None
            }
        }
    }
}
