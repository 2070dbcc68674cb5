use tracing::debug;

use crate::analyzer::common::build_technology;
use crate::analyzer::DispatchContext;

/// WebSocket 固定技术名称
pub const WEBSOCKET_TECH: &str = "Websocket";

// WebSocket 分析器：与规则字段无关，ws:// 或 wss:// 地址即视为使用了 WebSocket
pub struct WebSocketAnalyzer;

impl WebSocketAnalyzer {
    pub fn analyze(ctx: &DispatchContext<'_>, url: &str) {
        if !(url.starts_with("ws://") || url.starts_with("wss://")) {
            return;
        }
        debug!("[websocket]匹配成功 | 地址: {}", url);
        let entry = ctx.library.get(WEBSOCKET_TECH);
        let technology = build_technology(ctx.library, ctx.diagnostics, WEBSOCKET_TECH, entry, 100, String::new());
        ctx.store.set(technology);
    }
}
