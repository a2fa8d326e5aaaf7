use super::geometry::{first_overlap, Rect, Zone};
use super::world::{ItemPickup, MapData, NpcPlacement, TransitionZone};

const TALK_PROMPT: &str = "Parler (E)";
const TRAVEL_PROMPT: &str = "Appuyez sur E";

/// The single interactable the action key would reach this tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Interaction<'a> {
    Talk(&'a NpcPlacement),
    Travel(&'a TransitionZone),
    PickUp(&'a ItemPickup),
}

impl Interaction<'_> {
    pub(crate) fn prompt_text(&self) -> String {
        match self {
            Interaction::Talk(_) => TALK_PROMPT.to_string(),
            Interaction::Travel(_) => TRAVEL_PROMPT.to_string(),
            Interaction::PickUp(item) => format!("Ramasser {} (E)", item.item_id),
        }
    }
}

/// Talk beats travel beats pick up; within a kind the first zone in map
/// order wins. `is_picked` hides pickups already collected.
pub(crate) fn resolve_interaction<'a>(
    player: &Rect,
    map: &'a MapData,
    is_picked: impl Fn(&ItemPickup) -> bool,
) -> Option<Interaction<'a>> {
    if let Some(npc) = first_overlap(player, &map.npcs) {
        return Some(Interaction::Talk(npc));
    }
    if let Some(transition) = first_overlap(player, &map.transitions) {
        return Some(Interaction::Travel(transition));
    }
    map.items
        .iter()
        .filter(|item| !is_picked(item))
        .find(|item| player.overlaps(&item.rect()))
        .map(Interaction::PickUp)
}
