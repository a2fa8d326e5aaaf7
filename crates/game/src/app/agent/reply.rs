use serde_json::Value;
use tracing::warn;

use super::{AgentReply, Emotion};

/// Reads `{"response_text", "emotion"}` from the model output. Fenced code
/// blocks are unwrapped; anything that is not a JSON object becomes a
/// neutral reply carrying the raw text.
pub(super) fn parse_reply(raw: &str) -> AgentReply {
    let mut candidate = raw.trim();
    if candidate.starts_with("```") {
        if let (Some(first), Some(last)) = (candidate.find('{'), candidate.rfind('}')) {
            if last > first {
                candidate = &candidate[first..=last];
            }
        }
    }

    let object = match serde_json::from_str::<Value>(candidate) {
        Ok(Value::Object(object)) => object,
        _ => {
            warn!(chars = raw.chars().count(), "agent_reply_unparsed");
            return AgentReply {
                text: raw.to_string(),
                emotion: Emotion::Neutre,
            };
        }
    };

    let text = object
        .get("response_text")
        .or_else(|| object.get("texte"))
        .map(|value| match value {
            Value::String(text) => text.clone(),
            other => other.to_string(),
        })
        .unwrap_or_else(|| raw.to_string());
    let emotion = object
        .get("emotion")
        .and_then(Value::as_str)
        .map(Emotion::from_tag)
        .unwrap_or(Emotion::Neutre);

    AgentReply { text, emotion }
}
