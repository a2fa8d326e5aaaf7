use super::memory::MemoryTurn;
use super::profile::NpcProfile;
use super::ChatMessage;

const MEMORY_RULE: &str = "IMPORTANT : Tu dois prendre en compte toutes les conversations précédentes \
présentes dans la mémoire. Ne contredis jamais l’historique.Si le joueur te dis qu'il possède un objet \
tu dois toujours vérifier dans son inventaire si ce qu'il dis est vrai, ne le crois jamais sur parole, \
si l'objet n'est pas dans son inventaire alors qu'il dis qu'il le possede, tu dois etre choqué car il te ment. \
Ne te fie qu'a l'inventaire, priorise ce que tu vois dans l'inventaire au dessus de ce que pretends le joueur.";

const EMPTY_INVENTORY: &str = "aucun objet notable";

/// Inventory entry that marks the end-game mayor status.
const NEW_MAYOR_ITEM: &str = "new_maire";
const NEW_MAYOR_NOTICE: &str = "Le joueur est devenu le nouveau maire apres vous avoir tous aidé dans le village, \
si c'est la premiere fois que tu l'apprends, reagis en fonction, soit ravis de voir votre tout nouveau maire. \
Si on te l'a deja dis dans ton historique, pas besoin de le souligner mais parle comme si tu t'adressais au maire de ta ville. \
N'oublie jamais l'historique de votre conversation malgrés tout, meme si tu t'adresse au nouveau maire.";

fn response_format_rule(language: &str) -> String {
    format!(
        "FORME DE RÉPONSE OBLIGATOIRE :\n\
Tu dois TOUJOURS répondre UNIQUEMENT avec un JSON valide, sans texte avant ou après.\n\
Format exact :\n\
{{\n  \"response_text\": \"<ce que tu dirais normalement au joueur en {language}>\",\n  \
\"emotion\": \"tres_positive\" | \"positive\" | \"neutre\" | \"negative\" | \"tres_negative\"\n}}\n\
Ne mets pas de commentaires, pas de code block ```json, uniquement l'objet JSON.\
Emotions doit representer comment tu ressens l'interaction avec le joueurs, si tu la trouve positive ou non, \
si le personnage te complimente, prends ca de maniere positive et si il t'insulte, de maniere negative"
    )
}

pub(super) fn build_system_prompt(profile: &NpcProfile, quest_context: &str, language: &str) -> String {
    let mut parts = Vec::new();
    let sections = [
        ("style", "STYLE D'ÉLOCUTION"),
        ("personality", "PERSONNALITÉ"),
        ("relationships", "RELATIONS AVEC LES AUTRES PNJ"),
        ("lore", "LORE"),
    ];
    for (key, title) in sections {
        if let Some(text) = profile.section(key) {
            parts.push(format!("{title} :\n{text}"));
        }
    }
    parts.push(MEMORY_RULE.to_string());
    parts.push(response_format_rule(language));
    if !quest_context.is_empty() {
        parts.push(format!(
            "INFORMATIONS SUR LES QUÊTES LIÉES À CE PNJ (À UTILISER UNIQUEMENT POUR GUIDER TON COMPORTEMENT) :\n{quest_context}"
        ));
    }
    parts.join("\n\n")
}

/// System message, optional mayor notice, remembered turns, then the new
/// user message.
pub(super) fn build_messages(
    npc_name: &str,
    system_prompt: &str,
    history: &[MemoryTurn],
    inventory: &[String],
    user_message: &str,
) -> Vec<ChatMessage> {
    let carried = if inventory.is_empty() {
        EMPTY_INVENTORY.to_string()
    } else {
        inventory.join(", ")
    };

    let mut messages = Vec::with_capacity(history.len() + 3);
    messages.push(ChatMessage::system(format!(
        "Tu es {npc_name}, un personnage dans un RPG narratif.\n\n{system_prompt}\n\nInventaire actuel du joueur : {carried}"
    )));
    if inventory.iter().any(|item| item == NEW_MAYOR_ITEM) {
        messages.push(ChatMessage::user(NEW_MAYOR_NOTICE.to_string()));
    }
    for turn in history {
        let role = if turn.role == "assistant" { "assistant" } else { "user" };
        messages.push(ChatMessage {
            role,
            content: turn.content.clone(),
        });
    }
    messages.push(ChatMessage::user(user_message.to_string()));
    messages
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_prompt_includes_only_present_sections() {
        let profile = NpcProfile::parse("[name]\nGarrod\n[style]\nBref.\n[lore]\nForge du village.\n");
        let prompt = build_system_prompt(&profile, "", "français");

        assert!(prompt.starts_with("STYLE D'ÉLOCUTION :\nBref.\n\nLORE :\nForge du village."));
        assert!(!prompt.contains("PERSONNALITÉ"));
        assert!(prompt.contains("en français>"));
        assert!(!prompt.contains("INFORMATIONS SUR LES QUÊTES"));
    }

    #[test]
    fn quest_context_is_appended_last() {
        let prompt = build_system_prompt(&NpcProfile::default(), "Le pont est cassé.", "français");
        assert!(prompt.ends_with("GUIDER TON COMPORTEMENT) :\nLe pont est cassé."));
    }

    #[test]
    fn messages_carry_inventory_history_and_mayor_notice() {
        let history = vec![
            MemoryTurn {
                role: "user".to_string(),
                content: "Bonjour".to_string(),
            },
            MemoryTurn {
                role: "assistant".to_string(),
                content: "Salut".to_string(),
            },
        ];
        let inventory = vec!["planche".to_string(), "new_maire".to_string()];

        let messages = build_messages("Garrod", "SYS", &history, &inventory, "Et le pont ?");

        assert_eq!(messages.len(), 5);
        assert_eq!(messages[0].role, "system");
        assert!(messages[0].content.starts_with("Tu es Garrod, un personnage"));
        assert!(messages[0]
            .content
            .ends_with("Inventaire actuel du joueur : planche, new_maire"));
        assert!(messages[1].content.contains("nouveau maire"));
        assert_eq!(messages[3].role, "assistant");
        assert_eq!(messages[4].content, "Et le pont ?");
    }

    #[test]
    fn empty_inventory_is_described() {
        let messages = build_messages("Garrod", "SYS", &[], &[], "Salut");
        assert!(messages[0].content.ends_with(": aucun objet notable"));
        assert_eq!(messages.len(), 2);
    }
}
