//! Header格式转换工具
//! 不同Header格式之间的转换，以及从 Cookie / Set-Cookie 头解析 Cookie

use std::collections::{BTreeMap, HashMap};
use reqwest::header::HeaderMap;
use tracing::warn;

use crate::probe::Cookie;

/// Header转换工具
pub struct HeaderConverter;

impl HeaderConverter {
    /// 将HeaderMap转换为 规范名称 → 值列表
    pub fn to_hashmap(header_map: &HeaderMap) -> BTreeMap<String, Vec<String>> {
        let mut map = BTreeMap::new();
        let mut iter_count = 0;

        for (key, value) in header_map.iter() {
            iter_count += 1;
            if iter_count > 1000 {
                warn!("Header迭代超过1000次，强制终止");
                break;
            }

            let key_str = Self::canonical_name(key.as_str());
            let value_str = String::from_utf8_lossy(value.as_bytes()).into_owned();

            map.entry(key_str).or_insert_with(Vec::new).push(value_str);
        }
        map
    }

    /// 规范化头名称：x-powered-by → X-Powered-By
    pub fn canonical_name(name: &str) -> String {
        name.split('-')
            .map(|part| {
                let mut chars = part.chars();
                match chars.next() {
                    Some(first) => first.to_ascii_uppercase().to_string() + &chars.as_str().to_ascii_lowercase(),
                    None => String::new(),
                }
            })
            .collect::<Vec<_>>()
            .join("-")
    }

    /// 多值头以 "; " 连接为单值
    pub fn join_values(headers: &BTreeMap<String, Vec<String>>) -> HashMap<String, String> {
        headers
            .iter()
            .map(|(key, values)| (key.clone(), values.join("; ")))
            .collect()
    }

    /// 从 Set-Cookie / Cookie 头解析 Cookie（头名称不区分大小写，Cookie 名称保持原样）
    pub fn parse_cookies(headers: &BTreeMap<String, Vec<String>>) -> Vec<Cookie> {
        let mut cookies = Vec::new();

        for (header_name, raw_values) in headers {
            match header_name.to_ascii_lowercase().as_str() {
                // Set-Cookie：每个值只取第一个 name=value 片段
                "set-cookie" => {
                    for raw in raw_values {
                        if let Some(cookie) = raw.split(';').next().and_then(Self::parse_pair) {
                            cookies.push(cookie);
                        }
                    }
                }
                // Cookie：分号分隔的多个 name=value
                "cookie" => {
                    for raw in raw_values {
                        cookies.extend(raw.split(';').filter_map(Self::parse_pair));
                    }
                }
                _ => {}
            }
        }
        cookies
    }

    fn parse_pair(pair: &str) -> Option<Cookie> {
        let (name, value) = pair.split_once('=')?;
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        Some(Cookie::new(name, value.trim()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::{HeaderValue, SERVER, SET_COOKIE};

    #[test]
    fn test_to_hashmap_canonical_names() {
        let mut headers = HeaderMap::new();
        headers.insert(SERVER, HeaderValue::from_static("nginx/1.18.0"));
        headers.append(SET_COOKIE, HeaderValue::from_static("a=1; Path=/"));
        headers.append(SET_COOKIE, HeaderValue::from_static("b=2; HttpOnly"));

        let map = HeaderConverter::to_hashmap(&headers);
        assert_eq!(map["Server"], vec!["nginx/1.18.0".to_string()]);
        assert_eq!(map["Set-Cookie"].len(), 2);
        assert_eq!(
            HeaderConverter::join_values(&map)["Set-Cookie"],
            "a=1; Path=/; b=2; HttpOnly"
        );
    }

    #[test]
    fn test_canonical_name() {
        assert_eq!(HeaderConverter::canonical_name("x-powered-by"), "X-Powered-By");
        assert_eq!(HeaderConverter::canonical_name("SERVER"), "Server");
    }

    #[test]
    fn test_parse_cookies() {
        let headers = BTreeMap::from([
            (
                "Set-Cookie".to_string(),
                vec!["laravel_session=eyJpdiI6; path=/; httponly".to_string()],
            ),
            ("cookie".to_string(), vec!["PHPSESSID=abc; _ga=GA1.2".to_string()]),
        ]);
        let cookies = HeaderConverter::parse_cookies(&headers);
        assert_eq!(
            cookies,
            vec![
                Cookie::new("laravel_session", "eyJpdiI6"),
                Cookie::new("PHPSESSID", "abc"),
                Cookie::new("_ga", "GA1.2"),
            ]
        );
    }
}
