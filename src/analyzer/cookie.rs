use crate::analyzer::{Analyzer, DispatchContext};
use crate::probe::Cookie;
use crate::rule::{Channel, FieldShape, RuleEntry};

// Cookie 分析器：仅检查名称出现在规则中的 Cookie
pub struct CookieAnalyzer;

impl Analyzer<[Cookie]> for CookieAnalyzer {
    const CHANNEL: Channel = Channel::Cookies;

    fn match_logic(ctx: &DispatchContext<'_>, entry: &RuleEntry, shape: &FieldShape, cookies: &[Cookie]) {
        let Some(keyed) = shape.as_keyed_patterns() else {
            ctx.unsupported(entry, Self::CHANNEL, shape);
            return;
        };

        for (rule_cookie_name, patterns) in keyed {
            for cookie in cookies.iter().filter(|c| c.name == rule_cookie_name) {
                for pattern in &patterns {
                    ctx.run_regexp(entry, Self::CHANNEL, pattern, &cookie.value);
                }
            }
        }
    }
}

impl CookieAnalyzer {
    pub fn analyze(ctx: &DispatchContext<'_>, cookies: &[Cookie]) {
        <Self as Analyzer<[Cookie]>>::analyze(ctx, cookies);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::common::test_support::Harness;

    #[test]
    fn test_cookie_name_gate() {
        let h = Harness::new(
            r#"{
                "Laravel": { "cats": [18], "cookies": { "laravel_session": ".+" } },
                "PHP": { "cats": [27], "cookies": { "PHPSESSID": "" } }
            }"#,
        );
        let cookies = vec![Cookie::new("laravel_session", "eyJpdiI6")];
        CookieAnalyzer::analyze(&h.ctx(), &cookies);

        let laravel = h.store.get("Laravel").unwrap();
        assert_eq!(laravel.confidence, 0);
        assert!(h.store.get("PHP").is_none());
    }

    #[test]
    fn test_cookie_unsupported_shape() {
        let h = Harness::new(r#"{ "Odd": { "cookies": "session" } }"#);
        CookieAnalyzer::analyze(&h.ctx(), &[Cookie::new("session", "1")]);
        assert!(h.store.is_empty());
        assert_eq!(h.diagnostics.snapshot()[0].field, "cookies");
    }
}
