//! Model service response parsing.

use serde::Deserialize;
use serde_json::Value;
use siteintel_core::{AnalysisResult, Error};

/// Raw chat-completions response body.
#[derive(Debug, Deserialize)]
pub struct ChatResponseRaw {
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
pub struct ChatChoice {
    pub message: Option<ChatMessage>,
}

#[derive(Debug, Deserialize)]
pub struct ChatMessage {
    pub content: Option<String>,
}

/// Pull the first generated message's content out of a response body.
pub fn extract_content(body: &str) -> Result<String, Error> {
    let raw: ChatResponseRaw =
        serde_json::from_str(body).map_err(|e| Error::ModelEmptyResponse(format!("unreadable response body: {e}")))?;

    raw.choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message)
        .and_then(|message| message.content)
        .filter(|content| !content.trim().is_empty())
        .ok_or_else(|| Error::ModelEmptyResponse("no content in choices[0].message".into()))
}

/// Parse model content into a report.
///
/// Any syntactically valid JSON is accepted and kept as produced. Only content
/// that does not parse is malformed output.
pub fn parse_report(content: &str) -> Result<AnalysisResult, Error> {
    let document: Value = serde_json::from_str(content)
        .map_err(|e| Error::ModelMalformed(format!("model returned invalid JSON: {e}")))?;

    if !document.is_object() {
        tracing::warn!("model returned a JSON {} instead of an object", json_type(&document));
    }

    Ok(AnalysisResult::new(document))
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
