use serde_json::json;

use super::{AgentError, ChatBackend, ChatMessage, TurnKind};
use crate::app::gameplay::roster::display_name;

/// Canned replies used when no API key is configured, so dialogue, memory
/// and quest flow still work without network access.
pub(super) struct OfflineChatBackend {
    speaker: String,
}

impl OfflineChatBackend {
    pub(super) fn new(npc_name: &str) -> Self {
        Self {
            speaker: display_name(npc_name),
        }
    }
}

impl ChatBackend for OfflineChatBackend {
    fn complete(&self, messages: &[ChatMessage], turn: TurnKind) -> Result<String, AgentError> {
        let text = match turn {
            TurnKind::FirstMeeting => {
                format!("Bonjour, voyageur. On m'appelle {}. Que puis-je pour toi ?", self.speaker)
            }
            TurnKind::Returning => "Ah, te revoilà. Reprenons où nous en étions.".to_string(),
            TurnKind::Reply => {
                let said = messages
                    .last()
                    .map(|message| message.content.trim())
                    .unwrap_or_default();
                if said.is_empty() {
                    "...".to_string()
                } else {
                    format!("« {said} », dis-tu ? Je vais y réfléchir.")
                }
            }
        };
        Ok(json!({ "response_text": text, "emotion": "neutre" }).to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replies_are_valid_reply_json() {
        let backend = OfflineChatBackend::new("forgeron");
        let raw = backend
            .complete(&[ChatMessage::user("Salut".to_string())], TurnKind::Reply)
            .expect("reply");
        let value: serde_json::Value = serde_json::from_str(&raw).expect("json");
        assert_eq!(value["emotion"], "neutre");
        assert_eq!(value["response_text"], "« Salut », dis-tu ? Je vais y réfléchir.");
    }

    #[test]
    fn first_meeting_names_the_npc() {
        let backend = OfflineChatBackend::new("forgeron");
        let raw = backend.complete(&[], TurnKind::FirstMeeting).expect("reply");
        assert!(raw.contains("Forgeron"));
    }
}
