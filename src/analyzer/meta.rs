use crate::analyzer::{Analyzer, DispatchContext};
use crate::rule::{Channel, FieldShape, RuleEntry};

// Meta 分析器
// 观测值为每个 <meta> 元素的扁平属性列表，规则键与值均按字面量在同一列表中查找
pub struct MetaAnalyzer;

impl Analyzer<[Vec<String>]> for MetaAnalyzer {
    const CHANNEL: Channel = Channel::Meta;

    fn match_logic(
        ctx: &DispatchContext<'_>,
        entry: &RuleEntry,
        shape: &FieldShape,
        meta_tags: &[Vec<String>],
    ) {
        let Some(keyed) = shape.as_keyed_patterns() else {
            ctx.unsupported(entry, Self::CHANNEL, shape);
            return;
        };

        for (key, values) in keyed {
            for attributes in meta_tags {
                if !attributes.iter().any(|a| a == key) {
                    continue;
                }
                for value in &values {
                    if attributes.iter().any(|a| a == value) {
                        ctx.set_exists(entry, Self::CHANNEL, key);
                    }
                }
            }
        }
    }
}

impl MetaAnalyzer {
    pub fn analyze(ctx: &DispatchContext<'_>, meta_tags: &[Vec<String>]) {
        <Self as Analyzer<[Vec<String>]>>::analyze(ctx, meta_tags);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::common::test_support::Harness;

    fn attrs(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_literal_presence() {
        let h = Harness::new(
            r#"{
                "Hexo": { "meta": { "generator": "Hexo" } },
                "Ghost": { "meta": { "generator": ["Ghost", "Ghost 5"] } },
                "WordPress": { "meta": { "generator": "^WordPress" } }
            }"#,
        );
        let tags = vec![
            attrs(&["name", "generator", "content", "Ghost"]),
            attrs(&["charset", "utf-8"]),
        ];
        MetaAnalyzer::analyze(&h.ctx(), &tags);

        assert_eq!(h.store.get("Ghost").map(|t| t.confidence), Some(100));
        assert!(h.store.get("Hexo").is_none());
        assert!(h.store.get("WordPress").is_none());
    }
}
