use super::{Quest, QuestEvents};
use crate::app::gameplay::inventory::Inventory;

const HEADER: &str =
    "INFORMATIONS INTERNES (NE PAS ÉNONCER TELLES QUELLES) SUR LES QUÊTES LIÉES À CE PNJ.";
const NO_JARGON: &str = "Tu dois t'en servir pour parler de manière naturelle au joueur, \
dans ton style, sans jamais mentionner de termes techniques comme \
'state', 'variable', 'quest_id' ou des compteurs bruts.";
const INVENTORY_IS_TRUTH: &str = "Les informations ci-dessous sur l'inventaire du joueur sont FIABLES. \
Si le joueur prétend posséder un objet alors que ces informations indiquent le contraire, \
tu dois en conclure qu'il ment, se trompe ou exagère, et NE PAS valider la quête.";
const GIVEN_HEADER: &str = "Quête(s) que TU as donnée(s) au joueur :";
const VALIDATED_HEADER: &str =
    "Quête(s) données par un autre PNJ mais que TU dois valider lorsque le joueur vient te voir :";
const JUST_ACTIVATED: &str = "  • Cette quête vient juste d'être lancée dans cette conversation. \
Tu dois expliquer clairement au joueur ce que tu attends de lui : \
quel objet précis il doit récupérer, et pour qui. \
Parle de cette quête de façon explicite (par exemple : lui demander d'aller chercher la planche, \
le camée, le tonnelet, etc.).";
const JUST_COMPLETED: &str = "  • Cette quête vient d'être accomplie maintenant : \
l'inventaire montre que le joueur a tous les objets requis. \
Tu dois réagir comme si tu remarques à cet instant qu'il apporte vraiment l'objet : \
le remercier, reconnaître son effort, et considérer la quête comme résolue.";
const ALREADY_DONE: &str = "  • Cette quête est déjà terminée depuis une visite précédente. \
Le joueur a déjà reçu ce qui lui revenait : ne lui remets rien de nouveau pour elle, \
tu peux simplement t'en souvenir s'il en parle.";
const READY_TO_COMPLETE: &str = "  • Tous les objets requis sont présents dans l'inventaire du joueur à ce moment précis. \
Tu dois le constater dans la conversation (comme s'il te montrait ou t'apportait l'objet), \
le remercier et reconnaître qu'il a rempli sa part du marché.";
const ROLEPLAY_RULE: &str = "IMPORTANT : tu dois parler de ces quêtes de manière ROLEPLAY, adaptée à ta personnalité. \
Ne récite pas cette liste. Utilise seulement les informations utiles pour la situation actuelle. \
Si le joueur dit quelque chose qui contredit ces informations internes (par exemple, il prétend avoir \
un objet qu'il n'a pas), tu dois te fier à ces informations internes et réagir en conséquence.";

fn given_reward_note(reward: &str) -> String {
    format!(
        "  • Tu remets au joueur un objet de récompense : '{reward}'. \
Tu dois le dire clairement dans ta réponse (par exemple : \
'Voici pour toi cet objet en récompense.'), mais sans parler de mécanique de jeu. \
Sauf si votre relation est très mauvaise : dans ce cas tu gardes l'objet."
    )
}

fn validated_reward_note(reward: &str) -> String {
    format!(
        "  • Tu viens de lui remettre la récompense prévue : '{reward}'. \
Mentionne clairement, dans ton style, que tu lui donnes cet objet. \
Sauf si votre relation est très mauvaise : dans ce cas tu ne lui donnes pas l'objet, car tu ne l'apprécies pas."
    )
}

fn push_state_and_progress(lines: &mut Vec<String>, quest: &Quest, inventory: &Inventory) {
    lines.push(format!("  • État actuel : {}.", quest.state.label()));
    let (current, total) = quest.progress(inventory);
    if total > 0 {
        lines.push(format!(
            "  • Progression estimée d'après l'inventaire du joueur : {current} / {total} objet(s) requis."
        ));
    }
}

fn contains(list: &[String], id: &str) -> bool {
    list.iter().any(|entry| entry == id)
}

/// Private briefing injected into the NPC's system prompt. `npc` is the
/// normalized roster key.
pub(super) fn build_quest_prompt(
    quests: &[Quest],
    npc: &str,
    inventory: &Inventory,
    events: &QuestEvents,
) -> String {
    let mut lines = vec![
        HEADER.to_string(),
        NO_JARGON.to_string(),
        INVENTORY_IS_TRUTH.to_string(),
    ];

    let given: Vec<&Quest> = quests.iter().filter(|quest| quest.is_given_by(npc)).collect();
    if !given.is_empty() {
        lines.push(String::new());
        lines.push(GIVEN_HEADER.to_string());
        for quest in given {
            lines.push(format!("- {} : {}", quest.title, quest.description));
            push_state_and_progress(&mut lines, quest, inventory);
            if contains(&events.activated, &quest.id) {
                lines.push(JUST_ACTIVATED.to_string());
            }
            if contains(&events.ready_to_complete, &quest.id) {
                lines.push(JUST_COMPLETED.to_string());
                if let Some(reward) = &quest.reward_item {
                    lines.push(given_reward_note(reward));
                }
            } else if contains(&events.completed, &quest.id) {
                lines.push(ALREADY_DONE.to_string());
            }
        }
    }

    let others: Vec<&Quest> = quests
        .iter()
        .filter(|quest| quest.is_validated_by(npc) && !quest.is_given_by(npc))
        .collect();
    if !others.is_empty() {
        lines.push(String::new());
        lines.push(VALIDATED_HEADER.to_string());
        for quest in others {
            lines.push(format!("- {} : {}", quest.title, quest.description));
            lines.push(format!("  • Donnée par : {}.", quest.giver));
            push_state_and_progress(&mut lines, quest, inventory);
            if contains(&events.ready_to_complete, &quest.id) {
                lines.push(READY_TO_COMPLETE.to_string());
                if let Some(reward) = &quest.reward_item {
                    lines.push(validated_reward_note(reward));
                }
            } else if contains(&events.completed, &quest.id) {
                lines.push(ALREADY_DONE.to_string());
            }
        }
    }

    lines.push(String::new());
    lines.push(ROLEPLAY_RULE.to_string());
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use crate::app::gameplay::quest::{catalog::builtin_catalog, QuestEngine};
    use crate::app::gameplay::inventory::Inventory;
    use crate::app::gameplay::relations::RelationRegistry;

    #[test]
    fn giver_prompt_announces_fresh_quest_with_progress() {
        let mut engine = QuestEngine::new(builtin_catalog());
        let prompt = engine
            .handle_npc_interaction("maire", &Inventory::new())
            .prompt;

        assert!(prompt.starts_with("INFORMATIONS INTERNES"));
        assert!(prompt.contains("- Réparer le vieux pont : Le maire veut commencer"));
        assert!(prompt.contains("  • État actuel : en cours."));
        assert!(prompt.contains(": 0 / 1 objet(s) requis."));
        assert!(prompt.contains("vient juste d'être lancée"));
        assert!(prompt.ends_with("réagir en conséquence."));
    }

    #[test]
    fn validator_prompt_lists_foreign_quest_and_ready_note() {
        let mut engine = QuestEngine::new(builtin_catalog());
        let inventory: Inventory = [("Blé", 3)].into_iter().collect();
        engine.handle_npc_interaction("paysan", &inventory);

        let prompt = engine.handle_npc_interaction("maire", &inventory).prompt;

        assert!(prompt.contains("que TU dois valider"));
        assert!(prompt.contains("  • Donnée par : paysan."));
        assert!(prompt.contains(": 3 / 3 objet(s) requis."));
        assert!(prompt.contains("Tous les objets requis sont présents"));
        assert!(prompt.contains("'fourche'"));
    }

    #[test]
    fn giver_prompt_flags_own_quest_ready_then_already_done() {
        let mut engine = QuestEngine::new(builtin_catalog());
        let mut relations = RelationRegistry::default();
        engine.handle_npc_interaction("maire", &Inventory::new());

        let mut inventory: Inventory = [("planche", 1)].into_iter().collect();
        let ready = engine.handle_npc_interaction("maire", &inventory);
        assert_eq!(ready.events.ready_to_complete, vec!["maire_pont"]);
        assert!(ready.prompt.contains("vient d'être accomplie maintenant"));
        assert!(ready.prompt.contains("Tu remets au joueur un objet de récompense"));
        assert!(!ready.prompt.contains("déjà terminée"));

        engine.finalize_quests_after_dialog("maire", &mut inventory, &mut relations);

        for _ in 0..2 {
            let later = engine.handle_npc_interaction("maire", &inventory).prompt;
            assert!(later.contains("déjà terminée"));
            assert!(!later.contains("vient d'être accomplie maintenant"));
            assert!(!later.contains("Tu remets au joueur"));
        }
    }

    #[test]
    fn npc_without_quests_gets_only_the_standing_rules() {
        let mut engine = QuestEngine::new(builtin_catalog());
        let prompt = engine
            .handle_npc_interaction("voyageur", &Inventory::new())
            .prompt;

        assert!(!prompt.contains("TU as donnée"));
        assert!(!prompt.contains("TU dois valider"));
        assert!(prompt.contains("FIABLES"));
    }
}
