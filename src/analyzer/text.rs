use crate::analyzer::{Analyzer, DispatchContext};
use crate::rule::{Channel, FieldShape, RuleEntry};

// Text 分析器：子串包含判断，不解析指令
pub struct TextAnalyzer;

impl Analyzer<str> for TextAnalyzer {
    const CHANNEL: Channel = Channel::Text;

    fn match_logic(ctx: &DispatchContext<'_>, entry: &RuleEntry, shape: &FieldShape, text: &str) {
        let Some(needles) = shape.as_str_list() else {
            ctx.unsupported(entry, Self::CHANNEL, shape);
            return;
        };
        for needle in needles {
            ctx.run_contains(entry, Self::CHANNEL, needle, text);
        }
    }
}

impl TextAnalyzer {
    pub fn analyze(ctx: &DispatchContext<'_>, text: &str) {
        <Self as Analyzer<str>>::analyze(ctx, text);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::common::test_support::Harness;

    #[test]
    fn test_contains_is_literal() {
        let h = Harness::new(
            r#"{ "Hugo": { "text": "Powered by Hugo" }, "Regexy": { "text": "Power.d" } }"#,
        );
        TextAnalyzer::analyze(&h.ctx(), "<footer>Powered by Hugo</footer>");
        assert_eq!(h.store.get("Hugo").map(|t| t.confidence), Some(100));
        assert!(h.store.get("Regexy").is_none());
    }
}
