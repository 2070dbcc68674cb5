use std::collections::HashMap;

use crate::analyzer::{Analyzer, DispatchContext};
use crate::rule::{Channel, FieldShape, RuleEntry};

// Header 分析器：按规则中的头名称精确查找
pub struct HeaderAnalyzer;

impl Analyzer<HashMap<String, String>> for HeaderAnalyzer {
    const CHANNEL: Channel = Channel::Headers;

    fn match_logic(
        ctx: &DispatchContext<'_>,
        entry: &RuleEntry,
        shape: &FieldShape,
        headers: &HashMap<String, String>,
    ) {
        let Some(keyed) = shape.as_keyed_patterns() else {
            ctx.unsupported(entry, Self::CHANNEL, shape);
            return;
        };

        for (header_name, patterns) in keyed {
            let Some(header_value) = headers.get(header_name) else {
                continue;
            };
            for pattern in patterns {
                ctx.run_regexp(entry, Self::CHANNEL, pattern, header_value);
            }
        }
    }
}

impl HeaderAnalyzer {
    pub fn analyze(ctx: &DispatchContext<'_>, headers: &HashMap<String, String>) {
        <Self as Analyzer<HashMap<String, String>>>::analyze(ctx, headers);
    }
}
