//! Item fetch-quests tied to NPCs.
//!
//! Two hooks drive everything. [`QuestEngine::handle_npc_interaction`] runs
//! when a conversation turn starts: it unlocks the quests the NPC gives and
//! reports, without touching the inventory, which quests the player could
//! hand in. [`QuestEngine::finalize_quests_after_dialog`] runs once the NPC
//! has answered and is the only place quests complete, items are consumed
//! and rewards are granted.

mod catalog;
mod prompt;

use std::collections::BTreeMap;

use tracing::info;

use super::inventory::Inventory;
use super::relations::RelationRegistry;
use super::roster::normalize_npc_name;

pub(crate) use catalog::{load_quest_catalog, validate_catalog, QuestDefinition};
#[cfg(test)]
pub(crate) use catalog::builtin_catalog;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum QuestState {
    Locked,
    Active,
    Completed,
}

impl QuestState {
    pub(crate) fn label(self) -> &'static str {
        match self {
            QuestState::Locked => "non commencée",
            QuestState::Active => "en cours",
            QuestState::Completed => "terminée",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Quest {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) description: String,
    pub(crate) giver: String,
    pub(crate) validator: String,
    pub(crate) requirements: BTreeMap<String, u32>,
    pub(crate) reward_item: Option<String>,
    pub(crate) state: QuestState,
    giver_key: String,
    validator_key: String,
}

impl Quest {
    pub(crate) fn new(definition: QuestDefinition) -> Self {
        let validator = definition
            .validator
            .unwrap_or_else(|| definition.giver.clone());
        Self {
            giver_key: normalize_npc_name(&definition.giver),
            validator_key: normalize_npc_name(&validator),
            id: definition.id,
            title: definition.title,
            description: definition.description,
            giver: definition.giver,
            validator,
            requirements: definition.requirements,
            reward_item: definition.reward_item.filter(|item| !item.is_empty()),
            state: QuestState::Locked,
        }
    }

    /// `(current, total)`: each item counts at most its required quantity.
    pub(crate) fn progress(&self, inventory: &Inventory) -> (u32, u32) {
        self.requirements
            .iter()
            .fold((0, 0), |(current, total), (item, needed)| {
                (
                    current + inventory.count(item).min(*needed),
                    total + needed,
                )
            })
    }

    pub(crate) fn requirements_met(&self, inventory: &Inventory) -> bool {
        self.requirements
            .iter()
            .all(|(item, needed)| inventory.count(item) >= *needed)
    }

    pub(crate) fn is_given_by(&self, npc_key: &str) -> bool {
        self.giver_key == npc_key
    }

    pub(crate) fn is_validated_by(&self, npc_key: &str) -> bool {
        self.validator_key == npc_key
    }
}

/// What one interaction revealed, by quest id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct QuestEvents {
    /// Unlocked by this interaction.
    pub(crate) activated: Vec<String>,
    /// Active, validated here, requirements held right now. Nothing consumed yet.
    pub(crate) ready_to_complete: Vec<String>,
    /// Already completed before this interaction.
    pub(crate) completed: Vec<String>,
}

fn push_unique(list: &mut Vec<String>, id: &str) {
    if !list.iter().any(|existing| existing == id) {
        list.push(id.to_string());
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct QuestInteraction {
    pub(crate) events: QuestEvents,
    /// Private briefing for the NPC's conversational agent.
    pub(crate) prompt: String,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct QuestEngine {
    quests: Vec<Quest>,
}

impl QuestEngine {
    pub(crate) fn new(definitions: Vec<QuestDefinition>) -> Self {
        Self {
            quests: definitions.into_iter().map(Quest::new).collect(),
        }
    }

    pub(crate) fn quests(&self) -> &[Quest] {
        &self.quests
    }

    #[cfg(test)]
    pub(crate) fn quest(&self, id: &str) -> Option<&Quest> {
        self.quests.iter().find(|quest| quest.id == id)
    }

    pub(crate) fn completed_count(&self) -> usize {
        self.quests
            .iter()
            .filter(|quest| quest.state == QuestState::Completed)
            .count()
    }

    /// Unlocks quests this NPC gives and classifies the ones it validates.
    /// Never touches the inventory; a second call unlocks nothing new.
    pub(crate) fn handle_npc_interaction(
        &mut self,
        npc_name: &str,
        inventory: &Inventory,
    ) -> QuestInteraction {
        let npc = normalize_npc_name(npc_name);
        let mut events = QuestEvents::default();

        for quest in self.quests.iter_mut().filter(|quest| quest.is_given_by(&npc)) {
            match quest.state {
                QuestState::Locked => {
                    quest.state = QuestState::Active;
                    info!(quest = %quest.id, npc = %npc, "quest_activated");
                    push_unique(&mut events.activated, &quest.id);
                }
                QuestState::Completed => push_unique(&mut events.completed, &quest.id),
                QuestState::Active => {}
            }
        }

        for quest in self.quests.iter().filter(|quest| quest.is_validated_by(&npc)) {
            match quest.state {
                QuestState::Completed => push_unique(&mut events.completed, &quest.id),
                QuestState::Active if quest.requirements_met(inventory) => {
                    push_unique(&mut events.ready_to_complete, &quest.id)
                }
                _ => {}
            }
        }

        let prompt = prompt::build_quest_prompt(&self.quests, &npc, inventory, &events);
        QuestInteraction { events, prompt }
    }

    /// Completes every active quest this NPC validates whose requirements
    /// are held: consumes the items, then grants the reward unless the
    /// relation is too low (one extra unit at the bonus threshold).
    /// Returns the ids completed by this call.
    pub(crate) fn finalize_quests_after_dialog(
        &mut self,
        npc_name: &str,
        inventory: &mut Inventory,
        relations: &mut RelationRegistry,
    ) -> Vec<String> {
        let npc = normalize_npc_name(npc_name);
        let npc_id = relations.id_for(&npc);
        let relation = relations.get(npc_id).clone();
        let mut completed_now = Vec::new();

        for quest in self.quests.iter_mut().filter(|quest| quest.is_validated_by(&npc)) {
            if quest.state != QuestState::Active || !quest.requirements_met(inventory) {
                continue;
            }
            quest.state = QuestState::Completed;
            completed_now.push(quest.id.clone());
            for (item, needed) in &quest.requirements {
                inventory.remove(item, *needed);
            }
            info!(quest = %quest.id, npc = %npc, "quest_completed");

            let Some(reward) = quest.reward_item.as_deref() else {
                continue;
            };
            if relation.relation_score < relation.min_relation_for_rewards {
                info!(
                    quest = %quest.id,
                    npc = %npc,
                    relation = relation.relation_score,
                    "quest_reward_withheld"
                );
                continue;
            }
            inventory.add(reward, 1);
            if relation.relation_score >= relation.max_relation_bonus {
                inventory.add(reward, 1);
                info!(
                    quest = %quest.id,
                    npc = %npc,
                    reward = %reward,
                    relation = relation.relation_score,
                    "quest_reward_bonus"
                );
            }
        }
        completed_now
    }
}
