//! 文本型通道分析器：robots.txt / 响应体 / 样式表 / 页面URL / XHR URL
//! 字段形态为 字符串 或 字符串列表，逐条正则匹配

use crate::analyzer::{Analyzer, DispatchContext};
use crate::rule::{Channel, FieldShape, RuleEntry};

fn match_pattern_list(
    ctx: &DispatchContext<'_>,
    entry: &RuleEntry,
    channel: Channel,
    shape: &FieldShape,
    observed: &str,
) {
    let Some(patterns) = shape.as_str_list() else {
        ctx.unsupported(entry, channel, shape);
        return;
    };
    for pattern in patterns {
        ctx.run_regexp(entry, channel, pattern, observed);
    }
}

macro_rules! pattern_list_analyzer {
    ($(#[$doc:meta])* $name:ident, $channel:expr) => {
        $(#[$doc])*
        pub struct $name;

        impl Analyzer<str> for $name {
            const CHANNEL: Channel = $channel;

            fn match_logic(ctx: &DispatchContext<'_>, entry: &RuleEntry, shape: &FieldShape, data: &str) {
                match_pattern_list(ctx, entry, Self::CHANNEL, shape, data);
            }
        }

        impl $name {
            pub fn analyze(ctx: &DispatchContext<'_>, data: &str) {
                <Self as Analyzer<str>>::analyze(ctx, data);
            }
        }
    };
}

pattern_list_analyzer!(
    /// robots.txt 分析器
    RobotsAnalyzer,
    Channel::Robots
);
pattern_list_analyzer!(
    /// HTML 响应体分析器
    HtmlAnalyzer,
    Channel::Html
);
pattern_list_analyzer!(
    /// 样式表分析器
    CssAnalyzer,
    Channel::Css
);
pattern_list_analyzer!(
    /// 页面URL分析器
    UrlAnalyzer,
    Channel::Url
);
pattern_list_analyzer!(
    /// XHR 请求URL分析器
    XhrAnalyzer,
    Channel::Xhr
);
