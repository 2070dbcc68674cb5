//! HTML标签提取器
//! 负责从HTML中提取 script、meta 元素的扁平属性列表（名称、值交替）

use std::cell::RefCell;
use html5ever::tokenizer::{
    BufferQueue, Tag, TagKind, Token, TokenSink, TokenSinkResult, Tokenizer, TokenizerOpts
};
use markup5ever::interface::Attribute;
use tendril::StrTendril;

#[derive(Debug, Default, Clone)]
pub struct HtmlExtractor {
    scripts: RefCell<Vec<Vec<String>>>,
    meta_tags: RefCell<Vec<Vec<String>>>,
}

impl TokenSink for HtmlExtractor {
    type Handle = ();

    fn process_token(&self, token: Token, _line: u64) -> TokenSinkResult<()> {
        if let Token::TagToken(Tag {
            kind: TagKind::StartTag,
            name,
            attrs,
            ..
        }) = token
        {
            match name.as_ref() {
                "script" => self.scripts.borrow_mut().push(flatten(&attrs)),
                "meta" => self.meta_tags.borrow_mut().push(flatten(&attrs)),
                _ => {}
            }
        }
        TokenSinkResult::Continue
    }
}

/// 属性扁平化：[名称, 值, 名称, 值, ...]
fn flatten(attrs: &[Attribute]) -> Vec<String> {
    let mut list = Vec::with_capacity(attrs.len() * 2);
    for attr in attrs {
        list.push(attr.name.local.to_string());
        list.push(attr.value.to_string());
    }
    list
}

impl HtmlExtractor {
    /// 创建新的提取器
    pub fn new() -> Self {
        Self::default()
    }

    /// 从HTML字符串提取标签
    pub fn extract(&self, html: &str) -> Self {
        let tokenizer = Tokenizer::new(self.clone(), TokenizerOpts::default());
        let queue = BufferQueue::default();
        queue.push_back(StrTendril::from(html));

        let _ = tokenizer.feed(&queue);
        tokenizer.end();

        tokenizer.sink
    }

    /// 获取提取到的 script 元素属性列表
    pub fn get_scripts(&self) -> Vec<Vec<String>> {
        self.scripts.borrow().clone()
    }

    /// 获取提取到的 meta 元素属性列表
    pub fn get_meta_tags(&self) -> Vec<Vec<String>> {
        self.meta_tags.borrow().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_html_extractor() {
        let html = r#"
            <script src="/jquery.min.js"></script>
            <meta name="generator" content="WordPress 6.0" />
            <meta charset="utf-8">
            <script async src="/vue.global.js"></script>
        "#;

        let result = HtmlExtractor::new().extract(html);

        assert_eq!(
            result.get_scripts(),
            vec![
                vec!["src".to_string(), "/jquery.min.js".to_string()],
                vec!["async".to_string(), String::new(), "src".to_string(), "/vue.global.js".to_string()],
            ]
        );

        assert_eq!(
            result.get_meta_tags(),
            vec![
                vec!["name".to_string(), "generator".to_string(), "content".to_string(), "WordPress 6.0".to_string()],
                vec!["charset".to_string(), "utf-8".to_string()],
            ]
        );
    }
}
