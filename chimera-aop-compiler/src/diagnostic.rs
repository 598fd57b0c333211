//! 诊断信息（Messager）
//!
//! 校验失败、处理器配置问题、文件写入失败都以诊断信息的形式报告给宿主，
//! 并尽量关联到出问题的元素。

use crate::element::ElementRef;
use std::fmt;

/// 诊断级别
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiagnosticKind {
    Error,
    Warning,
    MandatoryWarning,
    Note,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiagnosticKind::Error => write!(f, "error"),
            DiagnosticKind::Warning => write!(f, "warning"),
            DiagnosticKind::MandatoryWarning => write!(f, "mandatory warning"),
            DiagnosticKind::Note => write!(f, "note"),
        }
    }
}

/// 一条诊断信息
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,

    /// 关联元素的位置描述
    pub element: Option<String>,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, message: impl Into<String>, element: Option<ElementRef<'_>>) -> Self {
        Self {
            kind,
            message: message.into(),
            element: element.map(|e| e.location()),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.element {
            Some(element) => write!(f, "{}: {}: {}", self.kind, element, self.message),
            None => write!(f, "{}: {}", self.kind, self.message),
        }
    }
}

/// 诊断信息的接收方
pub trait Messager {
    fn print_message(&mut self, diagnostic: Diagnostic);

    fn error(&mut self, message: &str, element: Option<ElementRef<'_>>) {
        self.print_message(Diagnostic::new(DiagnosticKind::Error, message, element));
    }

    fn warning(&mut self, message: &str, element: Option<ElementRef<'_>>) {
        self.print_message(Diagnostic::new(DiagnosticKind::Warning, message, element));
    }

    fn note(&mut self, message: &str, element: Option<ElementRef<'_>>) {
        self.print_message(Diagnostic::new(DiagnosticKind::Note, message, element));
    }
}

/// 收集所有诊断信息，供宿主或测试检查
#[derive(Debug, Default)]
pub struct CollectingMessager {
    diagnostics: Vec<Diagnostic>,
}

impl CollectingMessager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.of_kind(DiagnosticKind::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| {
            matches!(
                d.kind,
                DiagnosticKind::Warning | DiagnosticKind::MandatoryWarning
            )
        })
    }

    pub fn has_errors(&self) -> bool {
        self.errors().next().is_some()
    }

    /// 是否有包含指定文本的错误
    pub fn has_error_containing(&self, text: &str) -> bool {
        self.errors().any(|d| d.message.contains(text))
    }

    fn of_kind(&self, kind: DiagnosticKind) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(move |d| d.kind == kind)
    }
}

impl Messager for CollectingMessager {
    fn print_message(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }
}

/// 把诊断信息同时写入 tracing 日志
#[derive(Debug, Default)]
pub struct TracingMessager {
    collected: CollectingMessager,
}

impl TracingMessager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn collected(&self) -> &CollectingMessager {
        &self.collected
    }
}

impl Messager for TracingMessager {
    fn print_message(&mut self, diagnostic: Diagnostic) {
        let element = diagnostic.element.as_deref().unwrap_or("-");
        match diagnostic.kind {
            DiagnosticKind::Error => tracing::error!(element, "{}", diagnostic.message),
            DiagnosticKind::Warning | DiagnosticKind::MandatoryWarning => {
                tracing::warn!(element, "{}", diagnostic.message)
            }
            DiagnosticKind::Note => tracing::info!(element, "{}", diagnostic.message),
        }
        self.collected.print_message(diagnostic);
    }
}
