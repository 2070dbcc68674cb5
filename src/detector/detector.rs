//! 检测器核心：持有共享规则库与模式缓存，按会话分发各通道观测并输出检测结果
use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use super::resolver::Resolver;
use super::store::FingerprintStore;
use crate::analyzer::body::{CssAnalyzer, HtmlAnalyzer, RobotsAnalyzer, UrlAnalyzer, XhrAnalyzer};
use crate::analyzer::cookie::CookieAnalyzer;
use crate::analyzer::dns::DnsAnalyzer;
use crate::analyzer::dom::DomAnalyzer;
use crate::analyzer::header::HeaderAnalyzer;
use crate::analyzer::js::JsAnalyzer;
use crate::analyzer::meta::MetaAnalyzer;
use crate::analyzer::script_src::ScriptSrcAnalyzer;
use crate::analyzer::scripts::ScriptsAnalyzer;
use crate::analyzer::text::TextAnalyzer;
use crate::analyzer::websocket::WebSocketAnalyzer;
use crate::analyzer::DispatchContext;
use crate::compiler::PatternMatcher;
use crate::config::GlobalConfig;
use crate::diagnostics::{Diagnostic, DiagnosticSink};
use crate::error::WapResult;
use crate::probe::{Cookie, DnsAnswer, NetworkEvent, PageProbe, ResourceType};
use crate::rule::{RuleLibrary, RuleLoader, Technology};
use crate::utils::HeaderConverter;

/// 技术检测器
#[derive(Debug, Clone)]
pub struct TechDetector {
    library: Arc<RuleLibrary>,
    matcher: Arc<PatternMatcher>,
    config: GlobalConfig,
}

impl TechDetector {
    /// 创建检测器（优先本地缓存，其次规则目录）
    pub async fn new(config: GlobalConfig) -> WapResult<Self> {
        let library = RuleLoader::load(&config).await?;
        Ok(Self::with_library(library, config))
    }

    /// 使用已构建的规则库创建检测器
    pub fn with_library(library: RuleLibrary, config: GlobalConfig) -> Self {
        if !library.validation().is_empty() {
            warn!("规则库存在 {} 条字段形态诊断", library.validation().len());
        }
        info!(
            "检测器初始化完成，技术规则数：{}，分类数：{}",
            library.len(),
            library.category_count()
        );
        Self {
            library: Arc::new(library),
            matcher: Arc::new(PatternMatcher::new(config.case_insensitive)),
            config,
        }
    }

    /// 使用 JSON 文本规则创建检测器
    pub fn with_rules(technologies: &str, categories: &str, config: GlobalConfig) -> WapResult<Self> {
        let library = RuleLibrary::from_json(technologies, categories)?;
        Ok(Self::with_library(library, config))
    }

    pub fn library(&self) -> &Arc<RuleLibrary> {
        &self.library
    }

    pub fn config(&self) -> &GlobalConfig {
        &self.config
    }

    /// 开启一次独立的检测会话
    pub fn session(&self) -> DetectionSession {
        DetectionSession {
            library: Arc::clone(&self.library),
            matcher: Arc::clone(&self.matcher),
            icon_url: self.config.icon_url.clone(),
            store: FingerprintStore::new(),
            diagnostics: DiagnosticSink::new(),
        }
    }
}

/// 检测报告
#[derive(Debug, Clone, Serialize)]
pub struct DetectReport {
    pub technologies: Vec<Technology>,
    pub diagnostics: Vec<Diagnostic>,
}

/// 检测会话：各通道入口可并发调用，结果在 get_fingerprints 时统一解析
#[derive(Debug)]
pub struct DetectionSession {
    library: Arc<RuleLibrary>,
    matcher: Arc<PatternMatcher>,
    icon_url: String,
    store: FingerprintStore,
    diagnostics: DiagnosticSink,
}

impl DetectionSession {
    fn ctx(&self) -> DispatchContext<'_> {
        DispatchContext {
            library: &self.library,
            matcher: &self.matcher,
            store: &self.store,
            diagnostics: &self.diagnostics,
        }
    }

    pub fn cookies(&self, cookies: &[Cookie]) {
        CookieAnalyzer::analyze(&self.ctx(), cookies);
    }

    pub fn headers(&self, headers: &HashMap<String, String>) {
        HeaderAnalyzer::analyze(&self.ctx(), headers);
    }

    pub fn dns(&self, answer: &DnsAnswer) {
        DnsAnalyzer::analyze(&self.ctx(), answer);
    }

    pub fn robots(&self, body: &str) {
        RobotsAnalyzer::analyze(&self.ctx(), body);
    }

    pub fn html(&self, body: &str) {
        HtmlAnalyzer::analyze(&self.ctx(), body);
    }

    pub fn text(&self, body: &str) {
        TextAnalyzer::analyze(&self.ctx(), body);
    }

    pub fn css(&self, body: &str) {
        CssAnalyzer::analyze(&self.ctx(), body);
    }

    pub fn url(&self, full_url: &str) {
        UrlAnalyzer::analyze(&self.ctx(), full_url);
    }

    pub fn xhr(&self, xhr_url: &str) {
        XhrAnalyzer::analyze(&self.ctx(), xhr_url);
    }

    pub fn websocket(&self, websocket_url: &str) {
        WebSocketAnalyzer::analyze(&self.ctx(), websocket_url);
    }

    /// 每个 <meta> 元素的扁平属性列表
    pub fn meta(&self, meta_tags: &[Vec<String>]) {
        MetaAnalyzer::analyze(&self.ctx(), meta_tags);
    }

    /// 每个 <script> 元素的扁平属性列表
    pub fn script_src(&self, scripts: &[Vec<String>]) {
        ScriptSrcAnalyzer::analyze(&self.ctx(), scripts);
    }

    pub async fn dom<P: PageProbe>(&self, probe: &P) {
        DomAnalyzer::analyze(&self.ctx(), probe).await;
    }

    pub async fn js<P: PageProbe>(&self, probe: &P) {
        JsAnalyzer::analyze(&self.ctx(), probe).await;
    }

    pub async fn scripts<P: PageProbe>(&self, probe: &P) {
        ScriptsAnalyzer::analyze(&self.ctx(), probe).await;
    }

    /// 从页面读取 Cookie 后分发
    pub async fn page_cookies<P: PageProbe>(&self, probe: &P) {
        match probe.cookies().await {
            Ok(cookies) => self.cookies(&cookies),
            Err(e) => debug!("读取Cookie失败：{}", e),
        }
    }

    /// 读取文档HTML（html/text 通道）以及 meta、script 元素属性
    pub async fn page_markup<P: PageProbe>(&self, probe: &P) {
        match probe.document_html().await {
            Ok(html) => {
                self.html(&html);
                self.text(&html);
            }
            Err(e) => debug!("读取文档HTML失败：{}", e),
        }

        let meta_tags = Self::element_attributes(probe, "meta").await;
        self.meta(&meta_tags);
        let scripts = Self::element_attributes(probe, "script").await;
        self.script_src(&scripts);
    }

    async fn element_attributes<P: PageProbe>(probe: &P, selector: &str) -> Vec<Vec<String>> {
        let nodes = match probe.query_selector_all(selector).await {
            Ok(nodes) => nodes,
            Err(e) => {
                debug!("查询 {} 元素失败：{}", selector, e);
                return Vec::new();
            }
        };
        let mut lists = Vec::with_capacity(nodes.len());
        for node in &nodes {
            match probe.attributes(node).await {
                Ok(attributes) => lists.push(attributes),
                Err(e) => debug!("读取 {} 元素属性失败：{}", selector, e),
            }
        }
        lists
    }

    /// 页面动作集：Cookie、文档、DOM、JS、脚本探测并发执行
    pub async fn detect_page<P: PageProbe>(&self, probe: &P) {
        tokio::join!(
            self.page_cookies(probe),
            self.page_markup(probe),
            self.dom(probe),
            self.js(probe),
            self.scripts(probe),
        );
    }

    /// 浏览器网络事件监听
    pub fn observe_network(&self, event: &NetworkEvent) {
        match event {
            NetworkEvent::WebSocketCreated { url } => self.websocket(url),
            NetworkEvent::RequestWillBeSent { resource_type, url } => match resource_type {
                ResourceType::Xhr => self.xhr(url),
                ResourceType::Document => self.url(url),
                _ => {}
            },
            NetworkEvent::ResponseReceived {
                resource_type,
                headers,
                body,
                ..
            } => {
                self.headers(&HeaderConverter::join_values(headers));
                if let (ResourceType::Stylesheet, Some(body)) = (resource_type, body) {
                    self.css(body);
                }
            }
        }
    }

    /// 解析后的检测结果（excludes → implies → 图标前缀），可重复调用
    pub fn get_fingerprints(&self) -> HashMap<String, Technology> {
        Resolver::resolve(
            &self.library,
            &self.diagnostics,
            self.store.snapshot(),
            &self.icon_url,
        )
    }

    /// 规则库校验诊断与本会话诊断（去重、有序）
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        let mut all: Vec<Diagnostic> = self.library.validation().to_vec();
        all.extend(self.diagnostics.snapshot());
        all.sort();
        all.dedup();
        all
    }

    /// 结束会话，输出按名称排序的结果与诊断
    pub fn finish(self) -> DetectReport {
        let mut technologies: Vec<Technology> = self.get_fingerprints().into_values().collect();
        technologies.sort_by(|a, b| a.name.cmp(&b.name));
        DetectReport {
            technologies,
            diagnostics: self.diagnostics(),
        }
    }
}
