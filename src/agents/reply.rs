//! 模型 JSON 回复解析
//!
//! 模型声明的 schema 不可信：回复可能带 ```json 代码块、前后多余文字，字段可能缺失或类型不对。
//! 这里负责取出 JSON 对象（医生 / 督导用宽松提取，咨询师只接受整体合法的 JSON）和按类型读字段；各 agent 的缺省值集中在各自模块的常量里。

use serde_json::{Map, Value};

pub type JsonObject = Map<String, Value>;

/// 整体解析为 JSON 对象，不做任何提取；正文夹带 `{..}` 的散文视为非 JSON
pub fn parse_strict_json_object(raw: &str) -> Option<JsonObject> {
    match serde_json::from_str::<Value>(raw.trim()) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}

/// 从回复中取出 JSON 对象：先整体解析，失败再尝试 ```json 代码块或首个 `{` 到末个 `}`
pub fn parse_json_object(raw: &str) -> Option<JsonObject> {
    if let Some(map) = parse_strict_json_object(raw) {
        return Some(map);
    }
    let trimmed = raw.trim();

    let candidate = if let Some(start) = trimmed.find("```json") {
        let rest = &trimmed[start + 7..];
        rest.find("```").map(|end| rest[..end].trim()).unwrap_or(rest.trim())
    } else {
        let start = trimmed.find('{')?;
        let end = trimmed.rfind('}')?;
        if end <= start {
            return None;
        }
        &trimmed[start..=end]
    };

    match serde_json::from_str::<Value>(candidate) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}

/// 字符串字段（非字符串视为缺失）
pub fn str_field(obj: &JsonObject, key: &str) -> Option<String> {
    obj.get(key).and_then(Value::as_str).map(String::from)
}

/// 非空字符串字段（去空白后为空视为缺失）
pub fn non_empty_str_field(obj: &JsonObject, key: &str) -> Option<String> {
    str_field(obj, key).filter(|s| !s.trim().is_empty())
}

/// 布尔字段：接受 true/false、数字（0 为 false）与字符串 "true"/"false"，其它视为缺失
pub fn bool_field(obj: &JsonObject, key: &str) -> Option<bool> {
    match obj.get(key)? {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_f64().map(|v| v != 0.0),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

/// 任意 JSON 值转展示字符串：字符串原样，null 为空，其它用 JSON 文本
pub fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_object() {
        let obj = parse_json_object(r#"{"type": "probe", "response": "How long?"}"#).unwrap();
        assert_eq!(str_field(&obj, "type").as_deref(), Some("probe"));
    }

    #[test]
    fn test_parse_fenced_object() {
        let raw = "Here you go:\n```json\n{\"approved\": false, \"reason\": \"jargon\"}\n```";
        let obj = parse_json_object(raw).unwrap();
        assert_eq!(bool_field(&obj, "approved"), Some(false));
        assert_eq!(str_field(&obj, "reason").as_deref(), Some("jargon"));
    }

    #[test]
    fn test_parse_embedded_object() {
        let obj = parse_json_object("Sure! {\"answer\": \"yes\"} Hope that helps").unwrap();
        assert_eq!(str_field(&obj, "answer").as_deref(), Some("yes"));
    }

    #[test]
    fn test_strict_parse_ignores_embedded_object() {
        let raw = "Sure! {\"answer\": \"yes\"} Hope that helps";
        assert!(parse_strict_json_object(raw).is_none());
        assert!(parse_strict_json_object("```json\n{\"a\": 1}\n```").is_none());
        assert!(parse_strict_json_object("[1]").is_none());
        let obj = parse_strict_json_object("  {\"answer\": \"yes\"}\n").unwrap();
        assert_eq!(str_field(&obj, "answer").as_deref(), Some("yes"));
    }

    #[test]
    fn test_parse_rejects_non_objects() {
        assert!(parse_json_object("not json at all").is_none());
        assert!(parse_json_object("[1, 2, 3]").is_none());
        assert!(parse_json_object("} broken {").is_none());
        assert!(parse_json_object("").is_none());
    }

    #[test]
    fn test_bool_field_variants() {
        let obj = parse_json_object(
            r#"{"a": true, "b": "False", "c": 1, "d": null, "e": 0, "f": "nope", "g": [true]}"#,
        )
        .unwrap();
        assert_eq!(bool_field(&obj, "a"), Some(true));
        assert_eq!(bool_field(&obj, "b"), Some(false));
        assert_eq!(bool_field(&obj, "c"), Some(true));
        assert_eq!(bool_field(&obj, "d"), None);
        assert_eq!(bool_field(&obj, "e"), Some(false));
        assert_eq!(bool_field(&obj, "f"), None);
        assert_eq!(bool_field(&obj, "g"), None);
        assert_eq!(bool_field(&obj, "missing"), None);
    }

    #[test]
    fn test_value_to_string() {
        assert_eq!(value_to_string(&Value::String("x".into())), "x");
        assert_eq!(value_to_string(&serde_json::json!(3)), "3");
        assert_eq!(value_to_string(&Value::Null), "");
    }
}
