use crate::analyzer::{Analyzer, DispatchContext};
use crate::rule::{Channel, FieldShape, RuleEntry};

// Script-SRC 分析器
// 规则模式对每个 <script> 元素扁平属性列表中的每一项执行匹配
pub struct ScriptSrcAnalyzer;

impl Analyzer<[Vec<String>]> for ScriptSrcAnalyzer {
    const CHANNEL: Channel = Channel::ScriptSrc;

    fn match_logic(
        ctx: &DispatchContext<'_>,
        entry: &RuleEntry,
        shape: &FieldShape,
        scripts: &[Vec<String>],
    ) {
        let Some(patterns) = shape.as_str_list() else {
            ctx.unsupported(entry, Self::CHANNEL, shape);
            return;
        };

        for attributes in scripts {
            for item in attributes {
                for pattern in &patterns {
                    ctx.run_regexp(entry, Self::CHANNEL, pattern, item);
                }
            }
        }
    }
}

impl ScriptSrcAnalyzer {
    pub fn analyze(ctx: &DispatchContext<'_>, scripts: &[Vec<String>]) {
        <Self as Analyzer<[Vec<String>]>>::analyze(ctx, scripts);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::common::test_support::Harness;

    #[test]
    fn test_jquery_version_from_src() {
        let h = Harness::new(
            r#"{ "jQuery": { "cats": [59], "scriptSrc": ["jquery(?:-(\\d+\\.\\d+\\.\\d+))[/.-]\\;version:\\1", "/(\\d+\\.\\d+\\.\\d+)/jquery[/.-][^u]\\;version:\\1"] } }"#,
        );
        let scripts = vec![
            vec!["type".to_string(), "text/javascript".to_string()],
            vec!["src".to_string(), "/static/jquery-3.6.0.min.js".to_string()],
        ];
        ScriptSrcAnalyzer::analyze(&h.ctx(), &scripts);
        assert_eq!(h.store.get("jQuery").map(|t| t.version), Some("3.6.0".to_string()));
    }
}
