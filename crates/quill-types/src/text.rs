use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Text component for window titles and item names (simplified JSON text).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextComponent {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub italic: Option<bool>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub extra: Vec<TextComponent>,
}

impl TextComponent {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            italic: None,
            extra: Vec::new(),
        }
    }

    /// Item names are rendered italic by the client unless told otherwise.
    pub fn item_name(text: impl Into<String>) -> Self {
        Self {
            italic: Some(false),
            ..Self::plain(text)
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| r#"{"text":""}"#.to_string())
    }

    /// Concatenated text of this component and all of its children.
    pub fn to_plain(&self) -> String {
        let mut out = self.text.clone();
        for child in &self.extra {
            out.push_str(&child.to_plain());
        }
        out
    }
}

/// Flatten a JSON chat component into its plain text.
///
/// Accepts bare strings, objects with `text`/`translate`/`extra`, and arrays.
/// Input that is not JSON at all is returned unchanged.
pub fn plain_text_from_json(json: &str) -> String {
    match serde_json::from_str::<Value>(json) {
        Ok(value) => {
            let mut out = String::new();
            flatten_into(&value, &mut out);
            out
        }
        Err(_) => json.to_string(),
    }
}

fn flatten_into(value: &Value, out: &mut String) {
    match value {
        Value::String(s) => out.push_str(s),
        Value::Array(items) => items.iter().for_each(|v| flatten_into(v, out)),
        Value::Object(map) => {
            if let Some(Value::String(text)) = map.get("text") {
                out.push_str(text);
            } else if let Some(Value::String(key)) = map.get("translate") {
                out.push_str(key);
            }
            if let Some(Value::Array(extra)) = map.get("extra") {
                extra.iter().for_each(|v| flatten_into(v, out));
            }
        }
        Value::Number(n) => out.push_str(&n.to_string()),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Null => {}
    }
}
