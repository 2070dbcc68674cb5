//! HTTP 采集：抓取页面与 robots.txt

use std::time::Duration;
use reqwest::Client;
use tracing::debug;
use url::Url;

use super::capture::PageCapture;
use crate::config::GlobalConfig;
use crate::error::WapResult;
use crate::utils::HeaderConverter;

const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0 Safari/537.36";

/// robots.txt 地址：去除首尾斜杠后拼接
pub fn robots_url(url: &str) -> String {
    format!("{}/robots.txt", url.trim_matches('/'))
}

/// HTTP 采集器
#[derive(Debug, Clone)]
pub struct HttpCollector {
    client: Client,
}

impl HttpCollector {
    pub fn new(config: &GlobalConfig) -> WapResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.http_timeout))
            .danger_accept_invalid_certs(true)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self { client })
    }

    /// 抓取页面：最终地址、响应头（规范名称）、Set-Cookie 中的 Cookie 与响应体
    pub async fn fetch_page(&self, url: &str) -> WapResult<PageCapture> {
        let target = Url::parse(url)?;
        let response = self.client.get(target).send().await?;

        let final_url = response.url().to_string();
        let status = response.status();
        let headers = HeaderConverter::to_hashmap(response.headers());
        let cookies = HeaderConverter::parse_cookies(&headers);
        let body = response.text().await?;

        debug!(
            "页面抓取完成：{}，状态码：{}，响应头数：{}，响应体：{} 字节",
            final_url,
            status,
            headers.len(),
            body.len()
        );

        Ok(PageCapture {
            url: final_url,
            headers,
            cookies,
            body,
            ..PageCapture::default()
        })
    }

    /// 抓取 robots.txt 内容（不检查状态码）
    pub async fn fetch_robots(&self, url: &str) -> WapResult<String> {
        let target = Url::parse(&robots_url(url))?;
        let body = self.client.get(target).send().await?.text().await?;
        debug!("robots.txt 抓取完成：{} 字节", body.len());
        Ok(body)
    }
}
