//! 全局配置管理,存储所有可配置项

use std::path::PathBuf;

/// 全局配置
#[derive(Debug, Clone)]
pub struct GlobalConfig {
    // 规则资源目录（包含 src/technologies、src/categories.json 等）
    pub rule_dir: PathBuf,
    // 规则缓存路径
    pub rule_cache_path: PathBuf,
    // 是否读写本地规则缓存
    pub use_cache: bool,
    // 图标URL前缀，结果中的 icon 字段会拼接该前缀
    pub icon_url: String,
    // 超时配置（单位：秒）
    pub http_timeout: u64,
    // 模式是否忽略大小写编译
    pub case_insensitive: bool,
    // 是否启用详细日志
    pub verbose: bool,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            rule_dir: PathBuf::from("wappalyzer"),
            rule_cache_path: PathBuf::from("wappalyzer_rules.mp"),
            use_cache: true,
            icon_url: "/geticon?icon=".to_string(),
            http_timeout: 10,
            case_insensitive: false,
            verbose: false,
        }
    }
}

/// 配置管理器（单例）
pub struct ConfigManager;

impl ConfigManager {
    /// 获取默认配置
    pub fn get_default() -> GlobalConfig {
        GlobalConfig::default()
    }

    /// 自定义配置
    pub fn custom() -> CustomConfigBuilder {
        CustomConfigBuilder::new()
    }
}

/// 配置构建器（便于自定义配置）
#[derive(Debug, Clone, Default)]
pub struct CustomConfigBuilder {
    config: GlobalConfig,
}

impl CustomConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: GlobalConfig::default(),
        }
    }

    pub fn rule_dir(mut self, dir: PathBuf) -> Self {
        self.config.rule_dir = dir;
        self
    }

    pub fn rule_cache_path(mut self, path: PathBuf) -> Self {
        self.config.rule_cache_path = path;
        self
    }

    pub fn use_cache(mut self, use_cache: bool) -> Self {
        self.config.use_cache = use_cache;
        self
    }

    pub fn icon_url(mut self, url: impl Into<String>) -> Self {
        self.config.icon_url = url.into();
        self
    }

    pub fn http_timeout(mut self, timeout: u64) -> Self {
        self.config.http_timeout = timeout;
        self
    }

    pub fn case_insensitive(mut self, enabled: bool) -> Self {
        self.config.case_insensitive = enabled;
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.config.verbose = verbose;
        self
    }

    pub fn build(self) -> GlobalConfig {
        self.config
    }
}
