//! 结果解析：excludes 剔除 → implies 推导（单层）→ 图标前缀
//! 在存储快照上执行，不修改存储本身，重复调用结果一致

use std::collections::HashMap;
use tracing::debug;

use crate::analyzer::common::build_technology;
use crate::diagnostics::{Diagnostic, DiagnosticKind, DiagnosticSink};
use crate::rule::{RuleLibrary, Technology};

pub struct Resolver;

impl Resolver {
    pub fn resolve(
        library: &RuleLibrary,
        diagnostics: &DiagnosticSink,
        mut detected: HashMap<String, Technology>,
        icon_url: &str,
    ) -> HashMap<String, Technology> {
        Self::apply_excludes(library, &mut detected);
        Self::apply_implies(library, diagnostics, &mut detected);
        Self::apply_icon_prefix(&mut detected, icon_url);
        detected
    }

    /// 按名称顺序处理，已被剔除的技术不再生效
    fn apply_excludes(library: &RuleLibrary, detected: &mut HashMap<String, Technology>) {
        let mut names: Vec<String> = detected.keys().cloned().collect();
        names.sort();

        for name in names {
            if !detected.contains_key(&name) {
                continue;
            }
            let Some(entry) = library.get(&name) else {
                continue;
            };
            for excluded in &entry.excludes {
                if excluded != &name && detected.remove(excluded).is_some() {
                    debug!("excludes 剔除：{} 排除 {}", name, excluded);
                }
            }
        }
    }

    /// 只展开一层：新推导出的技术不再继续推导
    fn apply_implies(
        library: &RuleLibrary,
        diagnostics: &DiagnosticSink,
        detected: &mut HashMap<String, Technology>,
    ) {
        let mut names: Vec<String> = detected.keys().cloned().collect();
        names.sort();

        let mut implied = Vec::new();
        for name in &names {
            let Some(entry) = library.get(name) else {
                continue;
            };
            for target in &entry.implies {
                implied.push((name.clone(), target.clone()));
            }
        }

        for (source, target) in implied {
            let target_entry = library.get(&target);
            if target_entry.is_none() {
                diagnostics.record(Diagnostic::new(
                    &source,
                    "implies",
                    DiagnosticKind::UnknownTechnology { name: target.clone() },
                ));
            }
            debug!("implies 推导：{} → {}", source, target);
            let technology = build_technology(library, diagnostics, &target, target_entry, 100, String::new());
            detected.insert(target, technology);
        }
    }

    fn apply_icon_prefix(detected: &mut HashMap<String, Technology>, icon_url: &str) {
        for technology in detected.values_mut() {
            if !technology.icon.is_empty() {
                technology.icon = format!("{}{}", icon_url, technology.icon);
            }
        }
    }
}
