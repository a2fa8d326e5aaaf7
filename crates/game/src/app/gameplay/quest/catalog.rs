use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use tracing::warn;

use crate::app::config::load_json_file;
use crate::app::gameplay::roster::normalize_npc_name;
use crate::app::gameplay::world::WorldCatalog;

pub(crate) const QUESTS_FILE: &str = "quests.json";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct QuestDefinition {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) description: String,
    pub(crate) giver: String,
    /// Defaults to the giver.
    #[serde(default)]
    pub(crate) validator: Option<String>,
    pub(crate) requirements: BTreeMap<String, u32>,
    #[serde(default)]
    pub(crate) reward_item: Option<String>,
}

fn quest(
    id: &str,
    title: &str,
    description: &str,
    giver: &str,
    validator: &str,
    requirement: (&str, u32),
    reward: &str,
) -> QuestDefinition {
    QuestDefinition {
        id: id.to_string(),
        title: title.to_string(),
        description: description.to_string(),
        giver: giver.to_string(),
        validator: Some(validator.to_string()),
        requirements: BTreeMap::from([(requirement.0.to_string(), requirement.1)]),
        reward_item: Some(reward.to_string()),
    }
}

/// The village quest line.
pub(crate) fn builtin_catalog() -> Vec<QuestDefinition> {
    vec![
        quest(
            "maire_pont",
            "Réparer le vieux pont",
            "Le maire veut commencer les réparations du vieux pont. Le joueur doit trouver une planche solide",
            "maire",
            "maire",
            ("planche", 1),
            "echarpe",
        ),
        quest(
            "alchimiste_potions",
            "Les potions égarées",
            "Merlin a perdu trois potions dans la ville.",
            "alchimiste",
            "alchimiste",
            ("potion", 3),
            "potion_doree",
        ),
        quest(
            "comptesse_camee",
            "Le camée disparu",
            "La comtesse a perdu un petit bijou de famille.",
            "comptesse",
            "comptesse",
            ("camee", 1),
            "diadem",
        ),
        quest(
            "forgeron_marteau",
            "L'outil égaré",
            "Garrod a perdu son marteau de forgeron.",
            "forgeron",
            "forgeron",
            ("marteau_forgeron", 1),
            "enclume",
        ),
        quest(
            "geolier_cle",
            "La clé enfouie",
            "Le geôlier a perdu une clé rouillée.",
            "geolier",
            "geolier",
            ("cle_rouillee", 1),
            "cle",
        ),
        quest(
            "hotelier_parfum",
            "La chambre parfaite",
            "Un parfum rare est nécessaire pour une chambre.",
            "hotelier",
            "hotelier",
            ("parfum", 1),
            "valise",
        ),
        quest(
            "prisonier_preuve",
            "La preuve froissée",
            "Lanson prétend avoir une preuve de son innocence.",
            "prisonier",
            "prisonier",
            ("papier_preuve", 1),
            "menotte",
        ),
        quest(
            "serveur_tonnelet",
            "Le tonnelet d'essai",
            "Tibo a perdu un tonnelet lors d’un test.",
            "serveur",
            "serveur",
            ("tonnelet", 1),
            "chope",
        ),
        quest(
            "paysan_ble_maire",
            "Le pain du village",
            "Le paysan veut que tu apportes trois blés au maire.",
            "paysan",
            "maire",
            ("Blé", 3),
            "fourche",
        ),
    ]
}

/// `config/quests.json` when present and valid, the built-in catalog otherwise.
pub(crate) fn load_quest_catalog(config_dir: &Path) -> Vec<QuestDefinition> {
    let path = config_dir.join(QUESTS_FILE);
    match load_json_file::<Vec<QuestDefinition>>(&path) {
        Ok(Some(definitions)) => dedupe_ids(definitions),
        Ok(None) => builtin_catalog(),
        Err(error) => {
            warn!(error = %error, "quest_catalog_invalid_using_builtin");
            builtin_catalog()
        }
    }
}

fn dedupe_ids(definitions: Vec<QuestDefinition>) -> Vec<QuestDefinition> {
    let mut kept: Vec<QuestDefinition> = Vec::with_capacity(definitions.len());
    for definition in definitions {
        if kept.iter().any(|existing| existing.id == definition.id) {
            warn!(quest = %definition.id, "quest_catalog_duplicate_id_skipped");
            continue;
        }
        kept.push(definition);
    }
    kept
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum CatalogIssue {
    UnknownItem { quest: String, item: String },
    UnknownNpc { quest: String, npc: String },
}

/// Cross-checks quests against what the maps actually place. Problems are
/// logged and returned; none of them stop the game.
pub(crate) fn validate_catalog(
    definitions: &[QuestDefinition],
    world: &WorldCatalog,
) -> Vec<CatalogIssue> {
    let placed_npcs: Vec<String> = world
        .npc_names
        .iter()
        .map(|name| normalize_npc_name(name))
        .collect();
    let mut issues = Vec::new();

    for definition in definitions {
        for item in definition.requirements.keys() {
            if !world.item_ids.contains(item) {
                warn!(quest = %definition.id, item = %item, "quest_catalog_unknown_item");
                issues.push(CatalogIssue::UnknownItem {
                    quest: definition.id.clone(),
                    item: item.clone(),
                });
            }
        }

        let owners = [Some(&definition.giver), definition.validator.as_ref()];
        for npc in owners.into_iter().flatten() {
            let key = normalize_npc_name(npc);
            let already_reported = issues.iter().any(|issue| {
                matches!(issue, CatalogIssue::UnknownNpc { quest: reported_quest, npc: reported }
                    if reported_quest == &definition.id && normalize_npc_name(reported) == key)
            });
            if already_reported || placed_npcs.contains(&key) {
                continue;
            }
            warn!(quest = %definition.id, npc = %npc, "quest_catalog_unknown_npc");
            issues.push(CatalogIssue::UnknownNpc {
                quest: definition.id.clone(),
                npc: npc.clone(),
            });
        }
    }
    issues
}
