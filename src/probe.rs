//! 页面采集协作方接口
//! 浏览器/网络层不在本库内实现，本模块只定义观测数据类型与异步探针特质

use std::collections::BTreeMap;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 单个 Cookie 观测值
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cookie {
    pub name: String,
    pub value: String,
}

impl Cookie {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// DNS 应答：记录类型（大写，如 MX/TXT/SOA/NS）→ 记录值
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DnsAnswer {
    records: BTreeMap<String, Vec<String>>,
}

impl DnsAnswer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, record_type: &str, value: impl Into<String>) {
        self.records
            .entry(record_type.to_ascii_uppercase())
            .or_default()
            .push(value.into());
    }

    /// 某记录类型的全部值，不存在时为空
    pub fn get(&self, record_type: &str) -> &[String] {
        self.records
            .get(record_type)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.records.values().all(Vec::is_empty)
    }
}

/// 网络资源类型
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResourceType {
    Document,
    Xhr,
    Stylesheet,
    Script,
    Other(String),
}

/// 浏览器网络事件
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum NetworkEvent {
    WebSocketCreated {
        url: String,
    },
    RequestWillBeSent {
        resource_type: ResourceType,
        url: String,
    },
    ResponseReceived {
        resource_type: ResourceType,
        url: String,
        /// 多值响应头保持原顺序，分发时以 "; " 连接
        headers: BTreeMap<String, Vec<String>>,
        #[serde(default)]
        body: Option<String>,
    },
}

/// 脚本表达式求值结果
#[derive(Debug, Clone, PartialEq)]
pub enum Evaluation {
    Value(serde_json::Value),
    Undefined,
}

/// 协作方错误：仅跳过当前观测，不中断检测
#[derive(Debug, Clone, Error)]
pub enum ProbeError {
    #[error("选择器查询失败：{0}")]
    Query(String),
    #[error("属性读取失败：{0}")]
    Attributes(String),
    #[error("脚本执行异常：{0}")]
    Evaluation(String),
    #[error("页面连接已断开")]
    Disconnected,
}

/// 已渲染页面的访问接口
///
/// 所有方法都是挂起点，检测逻辑只在这些调用处让出执行权。
#[async_trait]
pub trait PageProbe: Send + Sync {
    /// 节点句柄
    type Node: Send + Sync;

    /// 页面全部 Cookie
    async fn cookies(&self) -> Result<Vec<Cookie>, ProbeError>;

    /// 当前文档的完整 HTML
    async fn document_html(&self) -> Result<String, ProbeError>;

    /// 第一个匹配选择器的节点
    async fn query_selector(&self, selector: &str) -> Result<Option<Self::Node>, ProbeError>;

    /// 全部匹配选择器的节点
    async fn query_selector_all(&self, selector: &str) -> Result<Vec<Self::Node>, ProbeError>;

    /// 节点外部 HTML
    async fn outer_html(&self, node: &Self::Node) -> Result<String, ProbeError>;

    /// 节点属性的扁平列表：[名称, 值, 名称, 值, ...]
    async fn attributes(&self, node: &Self::Node) -> Result<Vec<String>, ProbeError>;

    /// 在页面中执行表达式，抛出异常时返回 ProbeError::Evaluation
    async fn evaluate(&self, expression: &str) -> Result<Evaluation, ProbeError>;
}

/// 扁平属性列表中查找属性值：返回是否存在以及紧随其后的值
pub fn attribute_value<'a>(attributes: &'a [String], name: &str) -> Option<&'a str> {
    let pos = attributes.iter().position(|a| a == name)?;
    Some(attributes.get(pos + 1).map(String::as_str).unwrap_or(""))
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::{HashMap, HashSet};
    use super::*;

    /// 内存中的页面探针
    #[derive(Debug, Default)]
    pub struct MockPage {
        nodes: HashMap<String, Vec<MockNode>>,
        failing: HashSet<String>,
        values: HashMap<String, serde_json::Value>,
        throwing: HashSet<String>,
        cookies: Vec<Cookie>,
        html: String,
    }

    #[derive(Debug, Clone)]
    pub struct MockNode {
        attributes: Vec<String>,
        outer_html: String,
    }

    impl MockPage {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_node(mut self, selector: &str, attributes: &[&str], outer_html: &str) -> Self {
            self.nodes.entry(selector.to_string()).or_default().push(MockNode {
                attributes: attributes.iter().map(|s| s.to_string()).collect(),
                outer_html: outer_html.to_string(),
            });
            self
        }

        pub fn with_failing_selector(mut self, selector: &str) -> Self {
            self.failing.insert(selector.to_string());
            self
        }

        pub fn with_value(mut self, expression: &str, value: serde_json::Value) -> Self {
            self.values.insert(expression.to_string(), value);
            self
        }

        pub fn with_exception(mut self, expression: &str) -> Self {
            self.throwing.insert(expression.to_string());
            self
        }

        pub fn with_cookie(mut self, name: &str, value: &str) -> Self {
            self.cookies.push(Cookie::new(name, value));
            self
        }

        pub fn with_html(mut self, html: &str) -> Self {
            self.html = html.to_string();
            self
        }
    }

    #[async_trait]
    impl PageProbe for MockPage {
        type Node = MockNode;

        async fn cookies(&self) -> Result<Vec<Cookie>, ProbeError> {
            Ok(self.cookies.clone())
        }

        async fn document_html(&self) -> Result<String, ProbeError> {
            Ok(self.html.clone())
        }

        async fn query_selector(&self, selector: &str) -> Result<Option<MockNode>, ProbeError> {
            if self.failing.contains(selector) {
                return Err(ProbeError::Query(selector.to_string()));
            }
            Ok(self.nodes.get(selector).and_then(|nodes| nodes.first()).cloned())
        }

        async fn query_selector_all(&self, selector: &str) -> Result<Vec<MockNode>, ProbeError> {
            if self.failing.contains(selector) {
                return Err(ProbeError::Query(selector.to_string()));
            }
            Ok(self.nodes.get(selector).cloned().unwrap_or_default())
        }

        async fn outer_html(&self, node: &MockNode) -> Result<String, ProbeError> {
            Ok(node.outer_html.clone())
        }

        async fn attributes(&self, node: &MockNode) -> Result<Vec<String>, ProbeError> {
            Ok(node.attributes.clone())
        }

        async fn evaluate(&self, expression: &str) -> Result<Evaluation, ProbeError> {
            if self.throwing.contains(expression) {
                return Err(ProbeError::Evaluation(format!("ReferenceError: {}", expression)));
            }
            Ok(match self.values.get(expression) {
                Some(value) => Evaluation::Value(value.clone()),
                None => Evaluation::Undefined,
            })
        }
    }
}
