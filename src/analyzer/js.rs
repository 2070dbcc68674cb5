use tracing::debug;

use crate::analyzer::DispatchContext;
use crate::probe::{Evaluation, PageProbe};
use crate::rule::Channel;

const CHANNEL: Channel = Channel::Js;

// JS 分析器：规则键为全局表达式，求值结果非 undefined 即命中（不提取版本）
pub struct JsAnalyzer;

impl JsAnalyzer {
    pub async fn analyze<P: PageProbe>(ctx: &DispatchContext<'_>, probe: &P) {
        for entry in ctx.library.entries() {
            let Some(shape) = entry.shape(CHANNEL) else {
                continue;
            };
            let Some(expressions) = shape.map_keys() else {
                ctx.unsupported(entry, CHANNEL, shape);
                continue;
            };

            for expression in expressions {
                match probe.evaluate(expression).await {
                    Ok(Evaluation::Value(_)) => ctx.set_exists(entry, CHANNEL, expression),
                    Ok(Evaluation::Undefined) => {}
                    Err(e) => debug!("JS求值失败：技术={}，表达式={}，错误={}", entry.name, expression, e),
                }
            }
        }
    }
}
