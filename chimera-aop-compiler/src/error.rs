//! 处理器错误
//!
//! 预期内的无效输入（不满足条件的方法、类）不是错误，而是诊断信息，
//! 见 [`crate::validator::Rejection`]。这里只包含让处理器无法继续的情况。

use crate::element::ClassName;

/// 处理器错误
#[derive(Debug, thiserror::Error)]
pub enum ProcessorError {
    /// 标记注解的元数据不满足要求（保留策略、作用目标）
    #[error("{handler} Annotation '{annotation}' must have {requirement}.")]
    InvalidHandler {
        handler: String,
        annotation: ClassName,
        requirement: &'static str,
    },

    /// 同一个注解注册了多个处理器
    #[error("Annotation '{annotation}' is already handled by {existing}, cannot register {rejected}")]
    DuplicateHandler {
        annotation: ClassName,
        existing: String,
        rejected: String,
    },

    /// 方法绑定必须至少带一个标记注解
    #[error("Method binding for {0} has no marker annotation")]
    EmptyBinding(String),

    /// 绑定中的注解没有对应的处理器
    #[error("No InterceptorHandler registered for annotation '{0}'")]
    UnknownAnnotation(ClassName),

    /// 处理器选项无法解析
    #[error("Invalid value '{value}' for option '{key}': {reason}")]
    InvalidOption {
        key: String,
        value: String,
        reason: String,
    },

    /// 配置文件读取或解析失败
    #[error("Failed to load configuration: {0}")]
    Config(String),

    /// 元素模型 JSON 无法解析
    #[error("Invalid element model: {0}")]
    ElementModel(#[from] serde_json::Error),

    /// 文件写入失败
    #[error("Failed to write '{path}'")]
    Filer {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// 同一轮中重复创建同一个文件
    #[error("Attempt to recreate a file for type {0}")]
    FileExists(String),

    /// 生成的反射缓存与父类声明不一致
    #[error("Cache lookup {lookup} does not resolve to a method declared by {superclass}")]
    CacheMismatch { superclass: ClassName, lookup: String },

    /// 日志系统初始化失败
    #[error("Failed to initialize logging: {0}")]
    LoggingInitFailed(String),
}

/// 处理器结果
pub type Result<T> = std::result::Result<T, ProcessorError>;

/// 把错误及其全部 `source()` 链渲染成多行文本
pub fn render_chain(error: &(dyn std::error::Error + 'static)) -> String {
    let mut text = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        text.push_str("\nCaused by: ");
        text.push_str(&cause.to_string());
        source = cause.source();
    }
    text
}
