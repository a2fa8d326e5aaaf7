/// Known NPC identities. Map object names and quest owners are matched
/// against these by case-insensitive substring.
pub(crate) struct RosterEntry {
    pub(crate) key: &'static str,
    pub(crate) aliases: &'static [&'static str],
    pub(crate) sprite: &'static str,
}

pub(crate) const ROSTER: &[RosterEntry] = &[
    RosterEntry {
        key: "maire",
        aliases: &[],
        sprite: "npcs/maire",
    },
    RosterEntry {
        key: "alchimiste",
        aliases: &[],
        sprite: "npcs/alchimiste",
    },
    RosterEntry {
        key: "comptesse",
        aliases: &["comtesse"],
        sprite: "npcs/comtesse",
    },
    RosterEntry {
        key: "forgeron",
        aliases: &[],
        sprite: "npcs/forgeron",
    },
    RosterEntry {
        key: "geolier",
        aliases: &[],
        sprite: "npcs/geolier",
    },
    RosterEntry {
        key: "hotelier",
        aliases: &[],
        sprite: "npcs/hotelier",
    },
    RosterEntry {
        key: "paysan",
        aliases: &[],
        sprite: "npcs/paysan",
    },
    RosterEntry {
        key: "prisonier",
        aliases: &[],
        sprite: "npcs/prisonier",
    },
    RosterEntry {
        key: "serveur",
        aliases: &[],
        sprite: "npcs/serveur",
    },
];

pub(crate) fn roster_entry(name: &str) -> Option<&'static RosterEntry> {
    let lowered = name.to_lowercase();
    ROSTER.iter().find(|entry| {
        lowered.contains(entry.key) || entry.aliases.iter().any(|alias| lowered.contains(alias))
    })
}

/// Roster key for a name, or the lowercased name when nothing matches.
pub(crate) fn normalize_npc_name(name: &str) -> String {
    match roster_entry(name) {
        Some(entry) => entry.key.to_string(),
        None => name.to_lowercase(),
    }
}

/// Transcript label: first letter upper-cased.
pub(crate) fn display_name(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_by_substring_and_alias() {
        assert_eq!(normalize_npc_name("Maire_du_village"), "maire");
        assert_eq!(normalize_npc_name("la_comtesse"), "comptesse");
        assert_eq!(normalize_npc_name("Inconnu"), "inconnu");
    }

    #[test]
    fn display_name_capitalizes_first_letter_only() {
        assert_eq!(display_name("maire"), "Maire");
        assert_eq!(display_name("éloi le sage"), "Éloi le sage");
        assert_eq!(display_name(""), "");
    }
}
