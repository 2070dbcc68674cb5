//! 规则字段形态归一化
//! 规则文件中的字段可能是字符串、数组或多层映射，匹配前统一收敛为有限的几种形态

use std::collections::BTreeMap;
use serde_json::Value;

/// 归一化后的字段形态
#[derive(Debug, Clone, PartialEq)]
pub enum FieldShape {
    /// 单个字符串
    Str(String),
    /// 单个数值
    Number(f64),
    /// 字符串列表
    StrList(Vec<String>),
    /// 数值列表（数组中没有任何字符串元素时）
    NumList(Vec<f64>),
    /// 名称 → 字符串
    StrMap(BTreeMap<String, String>),
    /// 名称 → 字符串列表
    StrListMap(BTreeMap<String, Vec<String>>),
    /// 名称 → (名称 → 字符串)
    NestedMap(BTreeMap<String, BTreeMap<String, String>>),
    /// 名称 → (名称 → (名称 → 字符串))
    DeepMap(BTreeMap<String, BTreeMap<String, BTreeMap<String, String>>>),
}

impl FieldShape {
    /// 形态名称，用于诊断输出
    pub fn kind_name(&self) -> &'static str {
        match self {
            FieldShape::Str(_) => "string",
            FieldShape::Number(_) => "number",
            FieldShape::StrList(_) => "string array",
            FieldShape::NumList(_) => "number array",
            FieldShape::StrMap(_) => "map string string",
            FieldShape::StrListMap(_) => "map string array",
            FieldShape::NestedMap(_) => "map string string string",
            FieldShape::DeepMap(_) => "map string string string string",
        }
    }

    /// 以字符串列表形式取出（Str / StrList），其他形态返回 None
    pub fn as_str_list(&self) -> Option<Vec<&str>> {
        match self {
            FieldShape::Str(s) => Some(vec![s.as_str()]),
            FieldShape::StrList(list) => Some(list.iter().map(String::as_str).collect()),
            _ => None,
        }
    }

    /// 以 名称→模式列表 形式取出（StrMap / StrListMap），其他形态返回 None
    pub fn as_keyed_patterns(&self) -> Option<Vec<(&str, Vec<&str>)>> {
        match self {
            FieldShape::StrMap(map) => Some(
                map.iter()
                    .map(|(k, v)| (k.as_str(), vec![v.as_str()]))
                    .collect(),
            ),
            FieldShape::StrListMap(map) => Some(
                map.iter()
                    .map(|(k, v)| (k.as_str(), v.iter().map(String::as_str).collect()))
                    .collect(),
            ),
            _ => None,
        }
    }

    /// 取出所有映射型形态的一级键
    pub fn map_keys(&self) -> Option<Vec<&str>> {
        match self {
            FieldShape::StrMap(map) => Some(map.keys().map(String::as_str).collect()),
            FieldShape::StrListMap(map) => Some(map.keys().map(String::as_str).collect()),
            FieldShape::NestedMap(map) => Some(map.keys().map(String::as_str).collect()),
            FieldShape::DeepMap(map) => Some(map.keys().map(String::as_str).collect()),
            _ => None,
        }
    }
}

/// 将任意 JSON 值归一化为规范形态
///
/// 返回 None 表示"空"形态：null、布尔值、空对象，以及没有任何可用分桶的对象。
/// 对象的各个值递归归一化后按形态分桶，只返回一个分桶，
/// 优先级为 字符串 > 二层映射 > 三层映射 > 字符串列表，其余分桶的条目被丢弃。
pub fn normalize(value: &Value) -> Option<FieldShape> {
    match value {
        Value::Null | Value::Bool(_) => None,
        Value::String(s) => Some(FieldShape::Str(s.clone())),
        Value::Number(n) => n.as_f64().map(FieldShape::Number),
        Value::Array(items) => Some(normalize_array(items)),
        Value::Object(object) => {
            if object.is_empty() {
                return None;
            }

            let mut str_bucket = BTreeMap::new();
            let mut nested_bucket = BTreeMap::new();
            let mut deep_bucket = BTreeMap::new();
            let mut list_bucket = BTreeMap::new();

            for (key, val) in object {
                match normalize(val) {
                    Some(FieldShape::Str(s)) => {
                        str_bucket.insert(key.clone(), s);
                    }
                    Some(FieldShape::StrMap(m)) => {
                        nested_bucket.insert(key.clone(), m);
                    }
                    Some(FieldShape::NestedMap(m)) => {
                        deep_bucket.insert(key.clone(), m);
                    }
                    Some(FieldShape::StrList(l)) => {
                        list_bucket.insert(key.clone(), l);
                    }
                    // 数值、数值列表、更深层映射在对象中均不可用
                    _ => {}
                }
            }

            if !str_bucket.is_empty() {
                Some(FieldShape::StrMap(str_bucket))
            } else if !nested_bucket.is_empty() {
                Some(FieldShape::NestedMap(nested_bucket))
            } else if !deep_bucket.is_empty() {
                Some(FieldShape::DeepMap(deep_bucket))
            } else if !list_bucket.is_empty() {
                Some(FieldShape::StrListMap(list_bucket))
            } else {
                None
            }
        }
    }
}

/// 数组：字符串元素优先，否则返回数值列表（可能为空）
fn normalize_array(items: &[Value]) -> FieldShape {
    let mut strings = Vec::new();
    let mut numbers = Vec::new();

    for item in items {
        match normalize(item) {
            Some(FieldShape::Str(s)) => strings.push(s),
            Some(FieldShape::Number(n)) => numbers.push(n),
            _ => {}
        }
    }

    if !strings.is_empty() {
        FieldShape::StrList(strings)
    } else {
        FieldShape::NumList(numbers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_scalars() {
        assert_eq!(normalize(&json!("nginx")), Some(FieldShape::Str("nginx".into())));
        assert_eq!(normalize(&json!(3)), Some(FieldShape::Number(3.0)));
        assert_eq!(normalize(&json!(null)), None);
        assert_eq!(normalize(&json!(true)), None);
        assert_eq!(normalize(&json!({})), None);
    }

    #[test]
    fn test_array_partition() {
        assert_eq!(
            normalize(&json!(["a", 1, "b", null])),
            Some(FieldShape::StrList(vec!["a".into(), "b".into()]))
        );
        assert_eq!(normalize(&json!([1, 2])), Some(FieldShape::NumList(vec![1.0, 2.0])));
        assert_eq!(normalize(&json!([])), Some(FieldShape::NumList(vec![])));
    }

    #[test]
    fn test_object_bucket_priority() {
        // 字符串分桶胜出，列表与二层映射被丢弃
        let mixed = json!({
            "Server": "nginx",
            "X-Powered-By": ["PHP", "Express"],
            "div.app": {"exists": ""}
        });
        let Some(FieldShape::StrMap(map)) = normalize(&mixed) else {
            panic!("expected string map");
        };
        assert_eq!(map.len(), 1);
        assert_eq!(map.get("Server").map(String::as_str), Some("nginx"));

        // 无字符串时二层映射胜出于列表
        let nested = json!({
            "#root": {"exists": ""},
            "other": ["a"]
        });
        assert!(matches!(normalize(&nested), Some(FieldShape::NestedMap(m)) if m.len() == 1));

        // 三层映射
        let deep = json!({ "a[href]": { "attributes": { "href": "wp-content" } } });
        let Some(FieldShape::DeepMap(map)) = normalize(&deep) else {
            panic!("expected deep map");
        };
        assert_eq!(map["a[href]"]["attributes"]["href"], "wp-content");

        // 仅列表
        let lists = json!({ "TXT": ["google", "spf"] });
        assert!(matches!(normalize(&lists), Some(FieldShape::StrListMap(_))));
    }

    #[test]
    fn test_object_without_usable_bucket() {
        assert_eq!(normalize(&json!({ "a": 1, "b": [2, 3], "c": null })), None);
        assert_eq!(normalize(&json!({ "a": [] })), None);
    }

    #[test]
    fn test_kind_names_and_accessors() {
        let shape = FieldShape::StrMap(BTreeMap::from([("k".to_string(), "v".to_string())]));
        assert_eq!(shape.kind_name(), "map string string");
        assert_eq!(shape.as_keyed_patterns(), Some(vec![("k", vec!["v"])]));
        assert_eq!(shape.as_str_list(), None);
        assert_eq!(FieldShape::Str("x".into()).as_str_list(), Some(vec!["x"]));
    }
}
