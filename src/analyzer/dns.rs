use crate::analyzer::{Analyzer, DispatchContext};
use crate::probe::DnsAnswer;
use crate::rule::{Channel, FieldShape, RuleEntry};

// DNS 分析器：只测试应答中实际存在的记录类型
pub struct DnsAnalyzer;

impl Analyzer<DnsAnswer> for DnsAnalyzer {
    const CHANNEL: Channel = Channel::Dns;

    fn match_logic(ctx: &DispatchContext<'_>, entry: &RuleEntry, shape: &FieldShape, answer: &DnsAnswer) {
        let Some(keyed) = shape.as_keyed_patterns() else {
            ctx.unsupported(entry, Self::CHANNEL, shape);
            return;
        };

        for (record_type, patterns) in keyed {
            for record in answer.get(record_type) {
                for pattern in &patterns {
                    ctx.run_regexp(entry, Self::CHANNEL, pattern, record);
                }
            }
        }
    }
}

impl DnsAnalyzer {
    pub fn analyze(ctx: &DispatchContext<'_>, answer: &DnsAnswer) {
        <Self as Analyzer<DnsAnswer>>::analyze(ctx, answer);
    }
}
