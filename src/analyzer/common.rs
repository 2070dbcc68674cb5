//! 分析器公共逻辑：匹配执行、结果写入、诊断记录

use tracing::debug;

use crate::compiler::{Match, PatternMatcher};
use crate::detector::store::FingerprintStore;
use crate::diagnostics::{Diagnostic, DiagnosticKind, DiagnosticSink};
use crate::rule::{CategoryRef, Channel, FieldShape, RuleEntry, RuleLibrary, Technology};

/// 一次分发所需的共享上下文
#[derive(Clone, Copy)]
pub struct DispatchContext<'a> {
    pub library: &'a RuleLibrary,
    pub matcher: &'a PatternMatcher,
    pub store: &'a FingerprintStore,
    pub diagnostics: &'a DiagnosticSink,
}

impl<'a> DispatchContext<'a> {
    /// 执行正则匹配，命中则写入结果；无效模式记录诊断
    pub fn run_regexp(&self, entry: &RuleEntry, channel: Channel, pattern: &str, observed: &str) -> bool {
        let compiled = self.matcher.compile(pattern);
        if let Some(err) = compiled.error() {
            self.diagnostics.record(Diagnostic::new(
                &entry.name,
                channel.field_name(),
                DiagnosticKind::InvalidPattern {
                    pattern: pattern.to_string(),
                    reason: err.to_string(),
                },
            ));
            return false;
        }
        let result = compiled.apply(observed);
        self.handle_match(entry, channel, pattern, result)
    }

    /// 执行子串匹配，命中则以置信度100写入
    pub fn run_contains(&self, entry: &RuleEntry, channel: Channel, text: &str, observed: &str) -> bool {
        let result = self.matcher.contains(text, observed);
        self.handle_match(entry, channel, text, result)
    }

    fn handle_match(&self, entry: &RuleEntry, channel: Channel, pattern: &str, result: Match) -> bool {
        if !result.matched {
            return false;
        }
        debug!(
            "[{}]匹配成功 | 技术: {} | 版本: {:?} | 置信度: {} | 规则: {}",
            channel.field_name(),
            entry.name,
            result.version,
            result.confidence,
            pattern
        );
        self.set_finger(entry, result.confidence, result.version);
        true
    }

    /// 存在性命中（置信度固定100，无版本）
    pub fn set_exists(&self, entry: &RuleEntry, channel: Channel, target: &str) {
        debug!(
            "[{}]存在性匹配成功 | 技术: {} | 匹配项: {}",
            channel.field_name(),
            entry.name,
            target
        );
        self.set_finger(entry, 100, String::new());
    }

    /// 按规则元数据构建结果并写入存储
    pub fn set_finger(&self, entry: &RuleEntry, confidence: u8, version: String) {
        let technology = build_technology(self.library, self.diagnostics, &entry.name, Some(entry), confidence, version);
        self.store.set(technology);
    }

    /// 当前通道不支持该字段形态
    pub fn unsupported(&self, entry: &RuleEntry, channel: Channel, shape: &FieldShape) {
        self.unsupported_named(entry, channel.field_name(), shape.kind_name().to_string());
    }

    pub fn unsupported_named(&self, entry: &RuleEntry, field: &'static str, shape: String) {
        self.diagnostics.record(Diagnostic::new(
            &entry.name,
            field,
            DiagnosticKind::UnrecognizedShape { shape },
        ));
    }
}

/// 构建检测结果条目：分类 ID 经分类表映射，缺失时名称为空并记录诊断
pub fn build_technology(
    library: &RuleLibrary,
    diagnostics: &DiagnosticSink,
    name: &str,
    entry: Option<&RuleEntry>,
    confidence: u8,
    version: String,
) -> Technology {
    let Some(entry) = entry else {
        return Technology::from_name(name, confidence, version);
    };
    let rule = &entry.rule;

    let categories = rule
        .cats
        .iter()
        .map(|&id| {
            let name = match library.category(id) {
                Some(cat) => cat.name.clone(),
                None => {
                    diagnostics.record(Diagnostic::new(
                        &entry.name,
                        "cats",
                        DiagnosticKind::MissingCategory { id },
                    ));
                    String::new()
                }
            };
            CategoryRef { id, name }
        })
        .collect();

    Technology {
        name: name.to_string(),
        confidence,
        version,
        icon: rule.icon.clone().unwrap_or_default(),
        website: rule.website.clone().unwrap_or_default(),
        cpe: rule.cpe.clone().unwrap_or_default(),
        categories,
    }
}
