//! DNS 采集：查询 MX/TXT/SOA/NS 记录，组装为 DnsAnswer

use std::time::Duration;
use hickory_resolver::config::{ResolverConfig, ResolverOpts};
use hickory_resolver::TokioAsyncResolver;
use tracing::debug;
use url::Url;

use crate::config::GlobalConfig;
use crate::error::{WapResult, WappalyzerError};
use crate::probe::DnsAnswer;

/// 从 URL 中提取主机名
pub fn host_of(url: &str) -> WapResult<String> {
    let parsed = Url::parse(url)?;
    parsed
        .host_str()
        .map(str::to_string)
        .ok_or_else(|| WappalyzerError::InvalidInput(format!("URL 缺少主机名：{}", url)))
}

fn trim_root(name: String) -> String {
    name.trim_end_matches('.').to_string()
}

/// DNS 采集器
pub struct DnsCollector {
    resolver: TokioAsyncResolver,
}

impl DnsCollector {
    pub fn new(config: &GlobalConfig) -> Self {
        let mut opts = ResolverOpts::default();
        opts.timeout = Duration::from_secs(config.http_timeout);
        Self {
            resolver: TokioAsyncResolver::tokio(ResolverConfig::default(), opts),
        }
    }

    /// 查询域名记录，单类记录查询失败时跳过
    pub async fn lookup(&self, domain: &str) -> DnsAnswer {
        let mut answer = DnsAnswer::new();

        match self.resolver.mx_lookup(domain).await {
            Ok(lookup) => {
                for mx in lookup.iter() {
                    answer.push("MX", trim_root(mx.exchange().to_string()));
                }
            }
            Err(e) => debug!("MX 查询失败：{}，{}", domain, e),
        }

        match self.resolver.txt_lookup(domain).await {
            Ok(lookup) => {
                for txt in lookup.iter() {
                    for data in txt.txt_data() {
                        answer.push("TXT", String::from_utf8_lossy(data));
                    }
                }
            }
            Err(e) => debug!("TXT 查询失败：{}，{}", domain, e),
        }

        match self.resolver.soa_lookup(domain).await {
            Ok(lookup) => {
                for soa in lookup.iter() {
                    answer.push("SOA", trim_root(soa.mname().to_string()));
                }
            }
            Err(e) => debug!("SOA 查询失败：{}，{}", domain, e),
        }

        match self.resolver.ns_lookup(domain).await {
            Ok(lookup) => {
                for ns in lookup.iter() {
                    answer.push("NS", trim_root(ns.to_string()));
                }
            }
            Err(e) => debug!("NS 查询失败：{}，{}", domain, e),
        }

        answer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_host_of() {
        assert_eq!(host_of("https://mail.example.com:8443/a?b=1").unwrap(), "mail.example.com");
        assert!(host_of("nonsense").is_err());
    }

    #[test]
    fn test_trim_root() {
        assert_eq!(trim_root("aspmx.l.google.com.".to_string()), "aspmx.l.google.com");
    }
}
