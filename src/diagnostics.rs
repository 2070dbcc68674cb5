//! 规则诊断信息
//! 规则编写缺陷（形态不可识别、分类缺失、模式无效等）不会中断检测，只记录为诊断并随结果返回

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Mutex;
use serde::Serialize;
use tracing::warn;

/// 诊断类别
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// 字段形态不被该通道支持
    UnrecognizedShape { shape: String },
    /// 分类 ID 在分类表中不存在
    MissingCategory { id: u32 },
    /// 模式编译失败或指令格式错误
    InvalidPattern { pattern: String, reason: String },
    /// implies 指向的技术没有对应规则
    UnknownTechnology { name: String },
}

/// 单条诊断
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Diagnostic {
    pub technology: String,
    pub field: &'static str,
    #[serde(flatten)]
    pub kind: DiagnosticKind,
}

impl Diagnostic {
    pub fn new(technology: &str, field: &'static str, kind: DiagnosticKind) -> Self {
        Self {
            technology: technology.to_string(),
            field,
            kind,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            DiagnosticKind::UnrecognizedShape { shape } => {
                write!(f, "[{}] {} 字段形态不支持：{}", self.technology, self.field, shape)
            }
            DiagnosticKind::MissingCategory { id } => {
                write!(f, "[{}] 分类ID不存在：{}", self.technology, id)
            }
            DiagnosticKind::InvalidPattern { pattern, reason } => write!(
                f,
                "[{}] {} 模式无效：{}（{}）",
                self.technology, self.field, pattern, reason
            ),
            DiagnosticKind::UnknownTechnology { name } => {
                write!(f, "[{}] {} 指向未知技术：{}", self.technology, self.field, name)
            }
        }
    }
}

/// 诊断收集器（去重，首次出现时输出 warn 日志）
#[derive(Debug, Default)]
pub struct DiagnosticSink {
    entries: Mutex<BTreeSet<Diagnostic>>,
}

impl DiagnosticSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, diagnostic: Diagnostic) {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        if !entries.contains(&diagnostic) {
            warn!("规则诊断：{}", diagnostic);
            entries.insert(diagnostic);
        }
    }

    pub fn extend(&self, diagnostics: impl IntoIterator<Item = Diagnostic>) {
        for diagnostic in diagnostics {
            self.record(diagnostic);
        }
    }

    /// 当前全部诊断（有序）
    pub fn snapshot(&self) -> Vec<Diagnostic> {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .cloned()
            .collect()
    }
}
