use std::collections::HashMap;

use tracing::info;

pub(crate) const DEFAULT_RELATION_SCORE: i32 = 10;
pub(crate) const DEFAULT_MIN_RELATION_FOR_REWARDS: i32 = 5;
pub(crate) const DEFAULT_MAX_RELATION_BONUS: i32 = 25;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct NpcId(usize);

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct NpcRelation {
    pub(crate) name: String,
    pub(crate) relation_score: i32,
    /// Below this, quest rewards are withheld.
    pub(crate) min_relation_for_rewards: i32,
    /// At or above this, quest rewards are doubled.
    pub(crate) max_relation_bonus: i32,
}

impl NpcRelation {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            relation_score: DEFAULT_RELATION_SCORE,
            min_relation_for_rewards: DEFAULT_MIN_RELATION_FOR_REWARDS,
            max_relation_bonus: DEFAULT_MAX_RELATION_BONUS,
        }
    }
}

/// Relation records, one per NPC, keyed by lowercased name. Records are
/// never removed.
#[derive(Debug, Clone, Default)]
pub(crate) struct RelationRegistry {
    records: Vec<NpcRelation>,
    index: HashMap<String, NpcId>,
}

impl RelationRegistry {
    pub(crate) fn with_roster<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
        let mut registry = Self::default();
        for name in names {
            registry.id_for(name);
        }
        registry
    }

    /// Looks the NPC up, creating a default record on first reference.
    pub(crate) fn id_for(&mut self, name: &str) -> NpcId {
        let key = name.to_lowercase();
        if let Some(id) = self.index.get(&key) {
            return *id;
        }
        let id = NpcId(self.records.len());
        self.records.push(NpcRelation::new(name));
        self.index.insert(key, id);
        id
    }

    pub(crate) fn get(&self, id: NpcId) -> &NpcRelation {
        &self.records[id.0]
    }

    pub(crate) fn get_mut(&mut self, id: NpcId) -> &mut NpcRelation {
        &mut self.records[id.0]
    }

    #[cfg(test)]
    pub(crate) fn find(&self, name: &str) -> Option<&NpcRelation> {
        let id = self.index.get(&name.to_lowercase())?;
        Some(self.get(*id))
    }

    pub(crate) fn len(&self) -> usize {
        self.records.len()
    }

    pub(crate) fn adjust(&mut self, id: NpcId, delta: i32) {
        if delta == 0 {
            return;
        }
        let record = self.get_mut(id);
        record.relation_score = record.relation_score.saturating_add(delta);
        info!(
            npc = %record.name,
            delta,
            relation = record.relation_score,
            "relation_adjusted"
        );
    }
}
