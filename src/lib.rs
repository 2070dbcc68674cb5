//! wappalyzer-core - Wappalyzer 指纹匹配引擎

// 导出全局错误类型
pub use self::error::{WappalyzerError, WapResult};

// 导出配置模块
pub use self::config::{GlobalConfig, ConfigManager, CustomConfigBuilder};

// 导出诊断模块
pub use self::diagnostics::{Diagnostic, DiagnosticKind, DiagnosticSink};

// 导出规则模块核心接口
pub use self::rule::{
    normalize, CategoryRef, CategoryRule, Channel, FieldShape, GroupRule, Icon, IconReader,
    RuleCacheManager, RuleEntry, RuleLibrary, RuleLoader, RuleTables, TechRule, Technology,
};

// 导出编译模块核心接口
pub use self::compiler::{CompiledPattern, Match, PatternError, PatternMatcher};

// 导出采集协作方接口
pub use self::probe::{Cookie, DnsAnswer, Evaluation, NetworkEvent, PageProbe, ProbeError, ResourceType};

// 导出提取模块核心接口
pub use self::extractor::HtmlExtractor;

// 导出工具模块核心接口
pub use self::utils::HeaderConverter;

// 导出检测模块核心接口
pub use self::detector::{DetectReport, DetectionSession, TechDetector};

// 导出采集模块核心接口
pub use self::collector::{DnsCollector, HttpCollector, PageCapture};

// 声明所有子模块
pub mod config;
pub mod error;
pub mod diagnostics;
pub mod rule;
pub mod compiler;
pub mod probe;
pub mod analyzer;
pub mod extractor;
pub mod utils;
pub mod detector;
pub mod collector;
