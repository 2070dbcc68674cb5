use tracing::debug;

use crate::analyzer::DispatchContext;
use crate::probe::PageProbe;
use crate::rule::Channel;

const CHANNEL: Channel = Channel::Scripts;

// Scripts 分析器：规则脚本在页面中无异常执行完成即命中
pub struct ScriptsAnalyzer;

impl ScriptsAnalyzer {
    pub async fn analyze<P: PageProbe>(ctx: &DispatchContext<'_>, probe: &P) {
        for entry in ctx.library.entries() {
            let Some(shape) = entry.shape(CHANNEL) else {
                continue;
            };
            let Some(scripts) = shape.as_str_list() else {
                ctx.unsupported(entry, CHANNEL, shape);
                continue;
            };

            for script in scripts {
                match probe.evaluate(script).await {
                    Ok(_) => ctx.set_exists(entry, CHANNEL, script),
                    Err(e) => debug!("脚本执行异常：技术={}，错误={}", entry.name, e),
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

    #[tokio::test]
    async fn test_clean_evaluation_matches() {
        let h = Harness::new(
            r#"{
                "Clean": { "scripts": "void 0" },
                "Throws": { "scripts": ["missing()", "alsoMissing()"] },
                "Mixed": { "scripts": ["missing()", "void 1"] }
            }"#,
        );
        let page = MockPage::new()
            .with_exception("missing()")
            .with_exception("alsoMissing()");
        ScriptsAnalyzer::analyze(&h.ctx(), &page).await;

        assert_eq!(h.store.get("Clean").map(|t| t.confidence), Some(100));
        assert!(h.store.get("Throws").is_none());
        assert!(h.store.get("Mixed").is_some());
    }
}
