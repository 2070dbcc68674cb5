//! 规则数据模型定义
//! 原始规则表支持序列化/反序列化；RuleLibrary 在构建时一次性完成各通道字段的形态归一化

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::shape::{normalize, FieldShape};
use crate::diagnostics::{Diagnostic, DiagnosticKind};

/// 技术分类引用（检测结果中使用）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRef {
    pub id: u32,
    pub name: String,
}

/// 技术检测结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Technology {
    pub name: String,
    pub confidence: u8,
    pub version: String,
    pub icon: String,
    pub website: String,
    pub cpe: String,
    pub categories: Vec<CategoryRef>,
}

impl Technology {
    /// 无规则元数据的空条目
    pub fn from_name(name: impl Into<String>, confidence: u8, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            confidence,
            version: version.into(),
            icon: String::new(),
            website: String::new(),
            cpe: String::new(),
            categories: Vec::new(),
        }
    }
}

impl fmt::Display for Technology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.version.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{} {}", self.name, self.version)
        }
    }
}

/// 技术规则定义（从 Wappalyzer JSON 解析）
///
/// 检测字段与关联字段保持原始 JSON，形态由 [`normalize`] 在 RuleLibrary 构建时确定。
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TechRule {
    #[serde(default)]
    pub cats: Vec<u32>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub cpe: Option<String>,
    #[serde(default)]
    pub saas: Option<bool>,
    #[serde(default)]
    pub oss: Option<bool>,
    #[serde(default)]
    pub pricing: Option<Vec<String>>,

    // 关联规则
    #[serde(default)]
    pub implies: Option<Value>,
    #[serde(default)]
    pub requires: Option<Value>,
    #[serde(rename = "requiresCategory", default)]
    pub requires_category: Option<Value>,
    #[serde(default)]
    pub excludes: Option<Value>,

    // 检测规则
    #[serde(default)]
    pub cookies: Option<Value>,
    #[serde(default)]
    pub dom: Option<Value>,
    #[serde(default)]
    pub dns: Option<Value>,
    #[serde(default)]
    pub js: Option<Value>,
    #[serde(default)]
    pub headers: Option<Value>,
    #[serde(default)]
    pub html: Option<Value>,
    #[serde(default)]
    pub text: Option<Value>,
    #[serde(default)]
    pub css: Option<Value>,
    #[serde(default)]
    pub robots: Option<Value>,
    #[serde(default)]
    pub url: Option<Value>,
    #[serde(default)]
    pub xhr: Option<Value>,
    #[serde(default)]
    pub meta: Option<Value>,
    #[serde(rename = "scriptSrc", default)]
    pub script_src: Option<Value>,
    #[serde(default)]
    pub scripts: Option<Value>,
}

/// 分类规则定义（categories.json）
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CategoryRule {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub groups: Vec<u32>,
    #[serde(default)]
    pub priority: Option<u32>,
}

/// 分组规则定义（groups.json）
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct GroupRule {
    #[serde(default)]
    pub name: String,
}

/// 原始规则表（加载/缓存的序列化单元）
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RuleTables {
    pub tech_rules: HashMap<String, TechRule>,
    pub category_rules: HashMap<String, CategoryRule>,
    #[serde(default)]
    pub group_rules: HashMap<String, GroupRule>,
}

/// 观测通道
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Channel {
    Cookies,
    Dom,
    Dns,
    Js,
    Headers,
    Html,
    Text,
    Css,
    Robots,
    Url,
    Xhr,
    Meta,
    ScriptSrc,
    Scripts,
}

impl Channel {
    pub const ALL: [Channel; 14] = [
        Channel::Cookies,
        Channel::Dom,
        Channel::Dns,
        Channel::Js,
        Channel::Headers,
        Channel::Html,
        Channel::Text,
        Channel::Css,
        Channel::Robots,
        Channel::Url,
        Channel::Xhr,
        Channel::Meta,
        Channel::ScriptSrc,
        Channel::Scripts,
    ];

    /// 规则文件中的字段名
    pub fn field_name(self) -> &'static str {
        match self {
            Channel::Cookies => "cookies",
            Channel::Dom => "dom",
            Channel::Dns => "dns",
            Channel::Js => "js",
            Channel::Headers => "headers",
            Channel::Html => "html",
            Channel::Text => "text",
            Channel::Css => "css",
            Channel::Robots => "robots",
            Channel::Url => "url",
            Channel::Xhr => "xhr",
            Channel::Meta => "meta",
            Channel::ScriptSrc => "scriptSrc",
            Channel::Scripts => "scripts",
        }
    }

    fn raw(self, rule: &TechRule) -> Option<&Value> {
        match self {
            Channel::Cookies => rule.cookies.as_ref(),
            Channel::Dom => rule.dom.as_ref(),
            Channel::Dns => rule.dns.as_ref(),
            Channel::Js => rule.js.as_ref(),
            Channel::Headers => rule.headers.as_ref(),
            Channel::Html => rule.html.as_ref(),
            Channel::Text => rule.text.as_ref(),
            Channel::Css => rule.css.as_ref(),
            Channel::Robots => rule.robots.as_ref(),
            Channel::Url => rule.url.as_ref(),
            Channel::Xhr => rule.xhr.as_ref(),
            Channel::Meta => rule.meta.as_ref(),
            Channel::ScriptSrc => rule.script_src.as_ref(),
            Channel::Scripts => rule.scripts.as_ref(),
        }
    }
}

/// 单条技术规则及其归一化后的字段
#[derive(Debug, Clone)]
pub struct RuleEntry {
    pub name: String,
    pub rule: TechRule,
    shapes: BTreeMap<Channel, FieldShape>,
    pub implies: Vec<String>,
    pub excludes: Vec<String>,
    pub requires: Vec<String>,
    pub requires_category: Vec<String>,
}

impl RuleEntry {
    fn new(name: String, rule: TechRule, diagnostics: &mut Vec<Diagnostic>) -> Self {
        let mut shapes = BTreeMap::new();
        for channel in Channel::ALL {
            let Some(raw) = channel.raw(&rule) else {
                continue;
            };
            match normalize(raw) {
                Some(shape) => {
                    shapes.insert(channel, shape);
                }
                // 字段存在但没有可用形态
                None if !raw.is_null() => diagnostics.push(Diagnostic::new(
                    &name,
                    channel.field_name(),
                    DiagnosticKind::UnrecognizedShape { shape: "nil".to_string() },
                )),
                None => {}
            }
        }

        let implies = relation_names(&name, "implies", rule.implies.as_ref(), diagnostics);
        let excludes = relation_names(&name, "excludes", rule.excludes.as_ref(), diagnostics);
        let requires = relation_names(&name, "requires", rule.requires.as_ref(), diagnostics);
        let requires_category = relation_names(
            &name,
            "requiresCategory",
            rule.requires_category.as_ref(),
            diagnostics,
        );

        Self {
            name,
            rule,
            shapes,
            implies,
            excludes,
            requires,
            requires_category,
        }
    }

    /// 某通道的归一化形态
    pub fn shape(&self, channel: Channel) -> Option<&FieldShape> {
        self.shapes.get(&channel)
    }
}

/// 关联字段（implies / excludes / requires）：字符串或字符串列表，其他形态记录诊断
fn relation_names(
    tech_name: &str,
    field: &'static str,
    value: Option<&Value>,
    diagnostics: &mut Vec<Diagnostic>,
) -> Vec<String> {
    let Some(value) = value else {
        return Vec::new();
    };
    let names = match normalize(value) {
        None => Vec::new(),
        Some(FieldShape::Str(s)) => vec![s],
        Some(FieldShape::StrList(list)) => list,
        // 数值形态（如 requiresCategory 的分类 ID）保留为字符串
        Some(FieldShape::Number(n)) => vec![format_number(n)],
        Some(FieldShape::NumList(list)) => list.into_iter().map(format_number).collect(),
        Some(other) => {
            diagnostics.push(Diagnostic::new(
                tech_name,
                field,
                DiagnosticKind::UnrecognizedShape { shape: other.kind_name().to_string() },
            ));
            Vec::new()
        }
    };
    names
        .iter()
        .map(|n| strip_relation_directives(n))
        .filter(|n| !n.is_empty())
        .collect()
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

/// 去除关联名称上的指令后缀，如 `PHP\;confidence:50`
pub fn strip_relation_directives(name: &str) -> String {
    let cut = name.find(';').unwrap_or(name.len());
    name[..cut].trim_end_matches('\\').trim().to_string()
}

/// 完整规则库（只读，构建后通过 Arc 共享）
#[derive(Debug, Clone, Default)]
pub struct RuleLibrary {
    entries: Vec<RuleEntry>,
    index: HashMap<String, usize>,
    category_rules: HashMap<String, CategoryRule>,
    group_rules: HashMap<String, GroupRule>,
    validation: Vec<Diagnostic>,
}

impl RuleLibrary {
    /// 由原始规则表构建，并完成字段形态归一化与校验
    pub fn new(tables: RuleTables) -> Self {
        let mut validation = Vec::new();
        let mut entries: Vec<RuleEntry> = tables
            .tech_rules
            .into_iter()
            .map(|(name, rule)| RuleEntry::new(name, rule, &mut validation))
            .collect();
        // 按名称排序，保证遍历顺序稳定
        entries.sort_by(|a, b| a.name.cmp(&b.name));

        let index = entries
            .iter()
            .enumerate()
            .map(|(i, entry)| (entry.name.clone(), i))
            .collect();

        validation.sort();
        validation.dedup();

        Self {
            entries,
            index,
            category_rules: tables.category_rules,
            group_rules: tables.group_rules,
            validation,
        }
    }

    /// 从 JSON 文本构建（technologies 为 名称→规则 的对象，categories 为 ID→分类 的对象）
    pub fn from_json(technologies: &str, categories: &str) -> crate::WapResult<Self> {
        let tech_rules = serde_json::from_str(technologies)?;
        let category_rules = serde_json::from_str(categories)?;
        Ok(Self::new(RuleTables {
            tech_rules,
            category_rules,
            group_rules: HashMap::new(),
        }))
    }

    /// 导出原始规则表（用于缓存）
    pub fn to_tables(&self) -> RuleTables {
        RuleTables {
            tech_rules: self
                .entries
                .iter()
                .map(|e| (e.name.clone(), e.rule.clone()))
                .collect(),
            category_rules: self.category_rules.clone(),
            group_rules: self.group_rules.clone(),
        }
    }

    pub fn entries(&self) -> &[RuleEntry] {
        &self.entries
    }

    pub fn get(&self, name: &str) -> Option<&RuleEntry> {
        self.index.get(name).map(|&i| &self.entries[i])
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn category(&self, id: u32) -> Option<&CategoryRule> {
        self.category_rules.get(&id.to_string())
    }

    pub fn category_count(&self) -> usize {
        self.category_rules.len()
    }

    pub fn group(&self, id: u32) -> Option<&GroupRule> {
        self.group_rules.get(&id.to_string())
    }

    pub fn group_count(&self) -> usize {
        self.group_rules.len()
    }

    /// 构建阶段产生的字段形态诊断
    pub fn validation(&self) -> &[Diagnostic] {
        &self.validation
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TECHS: &str = r#"{
        "Nginx": { "cats": [22], "headers": { "Server": "nginx(?:/([\\d.]+))?\\;version:\\1" }, "icon": "Nginx.svg" },
        "WordPress": { "cats": [1, 11], "implies": ["PHP", "MySQL\\;confidence:50"], "meta": { "generator": "^WordPress" } },
        "Broken": { "cats": [1], "html": { "a": 1 }, "excludes": { "x": { "y": "z" } } }
    }"#;
    const CATS: &str = r#"{ "1": { "name": "CMS", "priority": 1, "groups": [3] }, "22": { "name": "Web servers" } }"#;

    #[test]
    fn test_library_from_json() {
        let lib = RuleLibrary::from_json(TECHS, CATS).unwrap();
        assert_eq!(lib.len(), 3);
        assert_eq!(lib.entries()[0].name, "Broken");

        let nginx = lib.get("Nginx").unwrap();
        assert!(matches!(nginx.shape(Channel::Headers), Some(FieldShape::StrMap(_))));
        assert!(nginx.shape(Channel::Html).is_none());

        let wp = lib.get("WordPress").unwrap();
        assert_eq!(wp.implies, vec!["PHP".to_string(), "MySQL".to_string()]);
        assert_eq!(lib.category(1).map(|c| c.name.as_str()), Some("CMS"));
        assert_eq!(lib.category(1).map(|c| c.groups.clone()), Some(vec![3]));
        assert!(lib.category(99).is_none());
    }

    #[test]
    fn test_validation_diagnostics() {
        let lib = RuleLibrary::from_json(TECHS, CATS).unwrap();
        let fields: Vec<&str> = lib.validation().iter().map(|d| d.field).collect();
        assert!(fields.contains(&"html"));
        assert!(fields.contains(&"excludes"));
        assert!(lib.validation().iter().all(|d| d.technology == "Broken"));
    }

    #[test]
    fn test_strip_relation_directives() {
        assert_eq!(strip_relation_directives("PHP\\;confidence:50"), "PHP");
        assert_eq!(strip_relation_directives("Node.js"), "Node.js");
    }

    #[test]
    fn test_tables_round_trip_keeps_rules() {
        let lib = RuleLibrary::from_json(TECHS, CATS).unwrap();
        let rebuilt = RuleLibrary::new(lib.to_tables());
        assert_eq!(rebuilt.len(), lib.len());
        assert_eq!(rebuilt.get("Nginx").and_then(|e| e.rule.icon.clone()), Some("Nginx.svg".into()));
    }
}
