//! 页面采集结果：在线抓取或离线 JSON 文件回放，统一分发至检测会话

use std::collections::BTreeMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::detector::DetectionSession;
use crate::extractor::HtmlExtractor;
use crate::probe::{Cookie, DnsAnswer, NetworkEvent};
use crate::utils::HeaderConverter;

/// 一次页面访问的全部观测
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageCapture {
    pub url: String,
    #[serde(default)]
    pub headers: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub cookies: Vec<Cookie>,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub robots: Option<String>,
    #[serde(default)]
    pub dns: DnsAnswer,
    #[serde(default)]
    pub events: Vec<NetworkEvent>,
}

impl PageCapture {
    /// 从 JSON 文本解析
    pub fn from_json(content: &str) -> crate::WapResult<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// 将全部观测分发至会话的各通道
    pub fn feed(&self, session: &DetectionSession) {
        if !self.url.is_empty() {
            session.url(&self.url);
        }

        if !self.headers.is_empty() {
            session.headers(&HeaderConverter::join_values(&self.headers));
        }

        let mut cookies = self.cookies.clone();
        cookies.extend(HeaderConverter::parse_cookies(&self.headers));
        if !cookies.is_empty() {
            session.cookies(&cookies);
        }

        if !self.body.is_empty() {
            session.html(&self.body);
            session.text(&self.body);

            let extracted = HtmlExtractor::new().extract(&self.body);
            session.meta(&extracted.get_meta_tags());
            session.script_src(&extracted.get_scripts());
        }

        if let Some(robots) = self.robots.as_deref() {
            session.robots(robots);
        }

        if !self.dns.is_empty() {
            session.dns(&self.dns);
        }

        for event in &self.events {
            session.observe_network(event);
        }

        debug!(
            "采集结果分发完成：{}，Cookie 数：{}，网络事件数：{}",
            self.url,
            cookies.len(),
            self.events.len()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ConfigManager, TechDetector};

    const TECHS: &str = r##"{
        "Nginx": { "cats": [22], "headers": { "Server": "nginx(?:/([\\d.]+))?\\;version:\\1" } },
        "Laravel": { "cats": [18], "cookies": { "laravel_session": ".+" }, "implies": "PHP" },
        "PHP": { "cats": [27] },
        "WordPress": { "cats": [1], "meta": { "generator": "WordPress 6.4" }, "scriptSrc": "/wp-includes/" },
        "Disallow Marker": { "robots": "Disallow: /admin" },
        "Google Workspace": { "dns": { "MX": "aspmx\\.l\\.google\\.com" } },
        "Socket.io": { "xhr": "/socket\\.io/" }
    }"##;

    const CATS: &str = r#"{ "1": { "name": "CMS" }, "18": { "name": "Web frameworks" }, "22": { "name": "Web servers" }, "27": { "name": "Programming languages" } }"#;

    #[test]
    fn test_feed_capture() {
        let capture = PageCapture::from_json(r#"{
            "url": "https://example.com/",
            "headers": {
                "Server": ["nginx/1.18.0"],
                "Set-Cookie": ["laravel_session=abc; path=/"]
            },
            "body": "<html><head><meta name=\"generator\" content=\"WordPress 6.4\"><script src=\"/wp-includes/js/jquery.js\"></script></head></html>",
            "robots": "User-agent: *\nDisallow: /admin",
            "dns": { "MX": ["aspmx.l.google.com"] },
            "events": [
                { "event": "request_will_be_sent", "resource_type": "Xhr", "url": "https://example.com/socket.io/?EIO=4" }
            ]
        }"#)
        .unwrap();

        let detector = TechDetector::with_rules(TECHS, CATS, ConfigManager::custom().icon_url("").build()).unwrap();
        let session = detector.session();
        capture.feed(&session);

        let found = session.get_fingerprints();
        for name in ["Nginx", "Laravel", "PHP", "WordPress", "Disallow Marker", "Google Workspace", "Socket.io"] {
            assert!(found.contains_key(name), "missing {}", name);
        }
        assert_eq!(found["Nginx"].version, "1.18.0");
    }

    #[test]
    fn test_minimal_capture() {
        let capture = PageCapture::from_json(r#"{ "url": "https://example.com/" }"#).unwrap();
        assert!(capture.headers.is_empty());
        assert!(capture.dns.is_empty());
        assert!(capture.robots.is_none());
    }
}
