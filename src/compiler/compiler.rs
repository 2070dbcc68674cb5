//! 模式匹配器核心
//! 按原始模式字符串缓存编译结果，多个检测会话共享同一缓存

use std::sync::{Arc, RwLock};
use rustc_hash::FxHashMap;
use tracing::{debug, warn};

use super::pattern::{CompiledPattern, Match};

/// 模式匹配器
#[derive(Debug, Default)]
pub struct PatternMatcher {
    case_insensitive: bool,
    cache: RwLock<FxHashMap<String, Arc<CompiledPattern>>>,
}

impl PatternMatcher {
    pub fn new(case_insensitive: bool) -> Self {
        Self {
            case_insensitive,
            cache: RwLock::new(FxHashMap::default()),
        }
    }

    /// 获取（必要时编译）模式
    pub fn compile(&self, pattern: &str) -> Arc<CompiledPattern> {
        {
            let cache = self.cache.read().unwrap_or_else(|e| e.into_inner());
            if let Some(compiled) = cache.get(pattern) {
                return Arc::clone(compiled);
            }
        }

        let compiled = Arc::new(CompiledPattern::compile(pattern, self.case_insensitive));
        if let Some(err) = compiled.error() {
            warn!("模式无效，按不匹配处理：{}，原因：{}", pattern, err);
        }

        let mut cache = self.cache.write().unwrap_or_else(|e| e.into_inner());
        Arc::clone(
            cache
                .entry(pattern.to_string())
                .or_insert(compiled),
        )
    }

    /// 对观测值执行带指令的正则匹配
    pub fn evaluate(&self, pattern: &str, observed: &str) -> Match {
        self.compile(pattern).apply(observed)
    }

    /// 纯子串包含判断，命中置信度固定为100
    pub fn contains(&self, text: &str, observed: &str) -> Match {
        if observed.contains(text) {
            Match::hit("", 100)
        } else {
            Match::miss(0)
        }
    }

    /// 已缓存的模式数量
    pub fn cached_len(&self) -> usize {
        let len = self.cache.read().unwrap_or_else(|e| e.into_inner()).len();
        debug!("模式缓存条目数：{}", len);
        len
    }
}
