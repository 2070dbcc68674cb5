//! 观测采集：HTTP 抓取、DNS 查询与离线采集文件回放

pub mod capture;
pub mod dns;
pub mod http;

pub use self::capture::PageCapture;
pub use self::dns::DnsCollector;
pub use self::http::{robots_url, HttpCollector};
