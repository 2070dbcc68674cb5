//! 编译后模式模型
//! 指令解析（`;confidence:` / `;version:`）与正则编译后的结构

use regex::{Regex, RegexBuilder};
use serde::Serialize;
use thiserror::Error;

const CONFIDENCE_DIRECTIVE: &str = ";confidence:";
const VERSION_DIRECTIVE: &str = ";version:";

/// 单次匹配结果
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Match {
    pub matched: bool,
    pub version: String,
    pub confidence: u8,
}

impl Match {
    pub fn hit(version: impl Into<String>, confidence: u8) -> Self {
        Self {
            matched: true,
            version: version.into(),
            confidence,
        }
    }

    pub fn miss(confidence: u8) -> Self {
        Self {
            matched: false,
            version: String::new(),
            confidence,
        }
    }
}

/// 模式错误（规则编写缺陷，仅导致不匹配）
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    #[error("置信度指令缺少数值")]
    MalformedConfidence,
    #[error("正则编译失败：{0}")]
    Compile(String),
}

/// 去除指令后的模式
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedPattern {
    pub regex: String,
    pub confidence: u8,
    pub has_version: bool,
}

/// 定位指令起点，指令前的转义反斜杠一并计入
fn directive_start(text: &str, directive: &str) -> Option<(usize, usize)> {
    let idx = text.find(directive)?;
    let start = if text[..idx].ends_with('\\') { idx - 1 } else { idx };
    Some((start, idx + directive.len()))
}

/// 解析并剥离指令：先置信度，后版本
pub fn parse_directives(raw: &str) -> Result<ParsedPattern, PatternError> {
    let mut text = raw.to_string();

    // 置信度：数字序列，缺失数字视为格式错误
    let mut confidence = 0u8;
    if let Some((start, value_start)) = directive_start(&text, CONFIDENCE_DIRECTIVE) {
        let digits: String = text[value_start..]
            .chars()
            .take_while(|c| c.is_ascii_digit())
            .collect();
        if digits.is_empty() {
            return Err(PatternError::MalformedConfidence);
        }
        confidence = digits.parse::<u32>().unwrap_or(u32::MAX).min(100) as u8;
        text.replace_range(start..value_start + digits.len(), "");
    }

    // 版本：模板延伸到下一个指令分隔符或结尾（含三元后缀）
    let mut has_version = false;
    if let Some((start, value_start)) = directive_start(&text, VERSION_DIRECTIVE) {
        has_version = true;
        let end = text[value_start..]
            .find(';')
            .map(|i| {
                let sep = value_start + i;
                if text[..sep].ends_with('\\') { sep - 1 } else { sep }
            })
            .unwrap_or(text.len());
        text.replace_range(start..end.max(start), "");
    }

    Ok(ParsedPattern {
        regex: text,
        confidence,
        has_version,
    })
}

/// 编译后的模式（失败结果同样缓存，同一模式只编译一次）
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    pub source: String,
    pub confidence: u8,
    pub has_version: bool,
    regex: Result<Regex, PatternError>,
}

impl CompiledPattern {
    pub fn compile(source: &str, case_insensitive: bool) -> Self {
        match parse_directives(source) {
            Ok(parsed) => {
                let regex = RegexBuilder::new(&parsed.regex)
                    .case_insensitive(case_insensitive)
                    .build()
                    .map_err(|e| PatternError::Compile(e.to_string()));
                Self {
                    source: source.to_string(),
                    confidence: parsed.confidence,
                    has_version: parsed.has_version,
                    regex,
                }
            }
            Err(e) => Self {
                source: source.to_string(),
                confidence: 0,
                has_version: false,
                regex: Err(e),
            },
        }
    }

    pub fn error(&self) -> Option<&PatternError> {
        self.regex.as_ref().err()
    }

    /// 对观测值执行匹配，版本仅取第1捕获组
    pub fn apply(&self, observed: &str) -> Match {
        let Ok(regex) = &self.regex else {
            return Match::miss(self.confidence);
        };
        let Some(captures) = regex.captures(observed) else {
            return Match::miss(self.confidence);
        };
        let version = if self.has_version {
            captures.get(1).map(|m| m.as_str()).unwrap_or("")
        } else {
            ""
        };
        Match::hit(version, self.confidence)
    }
}
