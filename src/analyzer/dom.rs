//! DOM 分析器
//! 三种规则形态：
//! - 字符串 / 字符串列表：逗号分隔的选择器，元素存在且外部HTML非空即命中
//! - 选择器 → {指令 → 值}：exists / text / properties / attributes
//! - 选择器 → {指令 → {名称 → 值}}

use std::collections::BTreeMap;
use tracing::debug;

use crate::analyzer::DispatchContext;
use crate::probe::{attribute_value, Evaluation, PageProbe};
use crate::rule::{Channel, FieldShape, RuleEntry};

const CHANNEL: Channel = Channel::Dom;

/// 拆分逗号分隔的选择器，去除空白与空项
pub fn split_selectors<'a>(selectors: impl IntoIterator<Item = &'a str>) -> Vec<&'a str> {
    selectors
        .into_iter()
        .flat_map(|s| s.split(','))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

/// 构造属性读取表达式：document.querySelector('<sel>')["<prop>"]
pub fn property_expression(selector: &str, property: &str) -> String {
    format!(
        "document.querySelector('{}')[\"{}\"]",
        selector.replace('\\', "\\\\").replace('\'', "\\'"),
        property.replace('\\', "\\\\").replace('"', "\\\"")
    )
}

/// 单个节点的采集结果
struct NodeView {
    attributes: Vec<String>,
    outer_html: String,
}

pub struct DomAnalyzer;

impl DomAnalyzer {
    pub async fn analyze<P: PageProbe>(ctx: &DispatchContext<'_>, probe: &P) {
        for entry in ctx.library.entries() {
            let Some(shape) = entry.shape(CHANNEL) else {
                continue;
            };
            match shape {
                FieldShape::Str(_) | FieldShape::StrList(_) => {
                    let selectors = shape.as_str_list().unwrap_or_default();
                    Self::match_presence(ctx, entry, probe, split_selectors(selectors)).await;
                }
                FieldShape::NestedMap(map) => Self::match_nested(ctx, entry, probe, map).await,
                FieldShape::DeepMap(map) => Self::match_deep(ctx, entry, probe, map).await,
                other => ctx.unsupported(entry, CHANNEL, other),
            }
        }
    }

    async fn match_presence<P: PageProbe>(
        ctx: &DispatchContext<'_>,
        entry: &RuleEntry,
        probe: &P,
        selectors: Vec<&str>,
    ) {
        for selector in selectors {
            let node = match probe.query_selector(selector).await {
                Ok(Some(node)) => node,
                Ok(None) => continue,
                Err(e) => {
                    debug!("DOM查询失败：技术={}，选择器={}，错误={}", entry.name, selector, e);
                    continue;
                }
            };
            match probe.outer_html(&node).await {
                Ok(html) if !html.is_empty() => ctx.set_exists(entry, CHANNEL, selector),
                Ok(_) => {}
                Err(e) => debug!("读取外部HTML失败：选择器={}，错误={}", selector, e),
            }
        }
    }

    /// 查询全部节点并读取属性与外部HTML，任一读取失败的节点被跳过
    async fn collect_nodes<P: PageProbe>(probe: &P, selector: &str) -> Vec<NodeView> {
        let nodes = match probe.query_selector_all(selector).await {
            Ok(nodes) => nodes,
            Err(e) => {
                debug!("DOM查询失败：选择器={}，错误={}", selector, e);
                return Vec::new();
            }
        };

        let mut views = Vec::with_capacity(nodes.len());
        for node in &nodes {
            let attributes = match probe.attributes(node).await {
                Ok(attributes) => attributes,
                Err(e) => {
                    debug!("读取节点属性失败：选择器={}，错误={}", selector, e);
                    continue;
                }
            };
            let outer_html = match probe.outer_html(node).await {
                Ok(html) => html,
                Err(e) => {
                    debug!("读取外部HTML失败：选择器={}，错误={}", selector, e);
                    continue;
                }
            };
            views.push(NodeView { attributes, outer_html });
        }
        views
    }

    /// 属性表达式求值，非 undefined 即存在
    async fn property_defined<P: PageProbe>(probe: &P, selector: &str, property: &str) -> bool {
        match probe.evaluate(&property_expression(selector, property)).await {
            Ok(Evaluation::Value(_)) => true,
            Ok(Evaluation::Undefined) => false,
            Err(e) => {
                debug!("属性求值失败：选择器={}，属性={}，错误={}", selector, property, e);
                false
            }
        }
    }

    async fn match_nested<P: PageProbe>(
        ctx: &DispatchContext<'_>,
        entry: &RuleEntry,
        probe: &P,
        map: &BTreeMap<String, BTreeMap<String, String>>,
    ) {
        for (selector_list, directives) in map {
            for selector in split_selectors([selector_list.as_str()]) {
                for node in Self::collect_nodes(probe, selector).await {
                    for (directive, value) in directives {
                        match directive.as_str() {
                            "exists" => ctx.set_exists(entry, CHANNEL, selector),
                            "text" => {
                                ctx.run_regexp(entry, CHANNEL, value, &node.outer_html);
                            }
                            "properties" => {
                                if Self::property_defined(probe, selector, value).await {
                                    ctx.set_exists(entry, CHANNEL, selector);
                                }
                            }
                            // 单层形态下值为属性名，属性存在即命中
                            "attributes" => {
                                if attribute_value(&node.attributes, value).is_some() {
                                    ctx.set_exists(entry, CHANNEL, selector);
                                }
                            }
                            other => ctx.unsupported_named(entry, CHANNEL.field_name(), format!("directive {}", other)),
                        }
                    }
                }
            }
        }
    }

    async fn match_deep<P: PageProbe>(
        ctx: &DispatchContext<'_>,
        entry: &RuleEntry,
        probe: &P,
        map: &BTreeMap<String, BTreeMap<String, BTreeMap<String, String>>>,
    ) {
        for (selector_list, directives) in map {
            for selector in split_selectors([selector_list.as_str()]) {
                for node in Self::collect_nodes(probe, selector).await {
                    for (directive, values) in directives {
                        match directive.as_str() {
                            "exists" => ctx.set_exists(entry, CHANNEL, selector),
                            "text" => {
                                for pattern in values.values() {
                                    ctx.run_regexp(entry, CHANNEL, pattern, &node.outer_html);
                                }
                            }
                            "properties" => {
                                for property in values.keys() {
                                    if Self::property_defined(probe, selector, property).await {
                                        ctx.set_exists(entry, CHANNEL, selector);
                                    }
                                }
                            }
                            "attributes" => {
                                for (attribute, pattern) in values {
                                    if let Some(observed) = attribute_value(&node.attributes, attribute) {
                                        ctx.run_regexp(entry, CHANNEL, pattern, observed);
                                    }
                                }
                            }
                            other => ctx.unsupported_named(entry, CHANNEL.field_name(), format!("directive {}", other)),
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::common::test_support::Harness;
    use crate::probe::testing::MockPage;

    #[test]
    fn test_split_selectors() {
        assert_eq!(
            split_selectors(["#app, .vue-root ,", "div[data-v]"]),
            vec!["#app", ".vue-root", "div[data-v]"]
        );
    }

    #[test]
    fn test_property_expression_escapes() {
        assert_eq!(
            property_expression("a[href='x']", "_reactRootContainer"),
            r#"document.querySelector('a[href=\'x\']')["_reactRootContainer"]"#
        );
    }

    #[tokio::test]
    async fn test_selector_presence() {
        let h = Harness::new(r##"{ "Vue.js": { "dom": "#app[data-v-app], div[data-server-rendered]" }, "Angular": { "dom": ["[ng-version]"] } }"##);
        let page = MockPage::new().with_node("div[data-server-rendered]", &["data-server-rendered", "true"], "<div data-server-rendered=\"true\"></div>");
        DomAnalyzer::analyze(&h.ctx(), &page).await;

        assert_eq!(h.store.get("Vue.js").map(|t| t.confidence), Some(100));
        assert!(h.store.get("Angular").is_none());
    }

    #[tokio::test]
    async fn test_nested_directives() {
        let h = Harness::new(
            r##"{
                "React": { "dom": { "#root": { "properties": "_reactRootContainer" } } },
                "Bootstrap": { "dom": { "link": { "text": "bootstrap(?:\\.min)?\\.css" } } },
                "Lazy": { "dom": { "img": { "attributes": "loading" } } },
                "Bogus": { "dom": { "img": { "hover": "x" } } }
            }"##,
        );
        let page = MockPage::new()
            .with_node("#root", &["id", "root"], "<div id=\"root\"></div>")
            .with_node("link", &["rel", "stylesheet", "href", "/bootstrap.min.css"], "<link rel=\"stylesheet\" href=\"/bootstrap.min.css\">")
            .with_node("img", &["src", "/a.png", "loading", "lazy"], "<img src=\"/a.png\" loading=\"lazy\">")
            .with_value(&property_expression("#root", "_reactRootContainer"), serde_json::json!({}));
        DomAnalyzer::analyze(&h.ctx(), &page).await;

        assert!(h.store.get("React").is_some());
        assert!(h.store.get("Bootstrap").is_some());
        assert!(h.store.get("Lazy").is_some());
        assert!(h.store.get("Bogus").is_none());
        assert!(h
            .diagnostics
            .snapshot()
            .iter()
            .any(|d| d.technology == "Bogus" && d.field == "dom"));
    }

    #[tokio::test]
    async fn test_deep_attributes_version() {
        let h = Harness::new(
            r##"{ "WordPress": { "dom": { "link[href*='wp-content']": { "attributes": { "href": "/wp-content/themes/[^/]+/style\\.css\\?ver=([\\d.]+)\\;version:\\1" } } } } }"##,
        );
        let page = MockPage::new().with_node(
            "link[href*='wp-content']",
            &["rel", "stylesheet", "href", "/wp-content/themes/t/style.css?ver=6.4.2"],
            "<link>",
        );
        DomAnalyzer::analyze(&h.ctx(), &page).await;
        assert_eq!(h.store.get("WordPress").map(|t| t.version), Some("6.4.2".to_string()));
    }

    #[tokio::test]
    async fn test_probe_failure_skips_selector() {
        let h = Harness::new(r##"{ "A": { "dom": "broken" }, "B": { "dom": "#ok" } }"##);
        let page = MockPage::new()
            .with_failing_selector("broken")
            .with_node("#ok", &[], "<div id=\"ok\"></div>");
        DomAnalyzer::analyze(&h.ctx(), &page).await;
        assert!(h.store.get("A").is_none());
        assert!(h.store.get("B").is_some());
    }
}
