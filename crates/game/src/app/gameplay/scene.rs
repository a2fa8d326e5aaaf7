//! The RPG scene: owns every piece of session state and runs the per-tick
//! order movement, camera, interaction, transition, dialogue.

use std::collections::{HashMap, HashSet};

use engine::{
    DebugRect, DebugRectKind, HudView, InputAction, InputSnapshot, InventoryPanelView,
    InventoryRow, PromptView, RenderableKind, Scene, SceneCommand, SceneWorld, SpriteInstance,
    Vec2,
};
use tracing::{info, warn};

use super::camera::clamped_focus;
use super::dialogue::{DialoguePoll, DialogueSession, FALLBACK_REPLY};
use super::geometry::Rect;
use super::interaction::{resolve_interaction, Interaction};
use super::inventory::Inventory;
use super::map_settings::MapSettingsTable;
use super::movement::{step_player, DirectionInput};
use super::player::Player;
use super::quest::{QuestDefinition, QuestEngine};
use super::relations::RelationRegistry;
use super::roster::{normalize_npc_name, ROSTER};
use super::text_layout::LayoutMetrics;
use super::transition::{PendingTransition, TransitionSequencer};
use super::world::{MapData, MapLoader};
use crate::app::agent::{AgentError, AgentFactory, DispatchMode};
use crate::app::config::{GameConfig, LayoutConfig};

const NPC_PLACEHOLDER_SIZE: Vec2 = Vec2 { x: 32.0, y: 48.0 };
const NPC_PLACEHOLDER_COLOR: [u8; 4] = [180, 120, 60, 255];
const ITEM_PLACEHOLDER_COLOR: [u8; 4] = [230, 200, 40, 255];
const PLAYER_PLACEHOLDER_COLOR: [u8; 4] = [60, 120, 220, 255];
const INVENTORY_TITLE: &str = "Inventaire";
const INVENTORY_EMPTY_LABEL: &str = "Aucun objet";

/// Collaborators and catalogs the scene is built from.
pub(crate) struct SceneServices {
    pub(crate) maps: Box<dyn MapLoader>,
    pub(crate) agents: Box<dyn AgentFactory>,
    pub(crate) map_settings: MapSettingsTable,
    pub(crate) quests: Vec<QuestDefinition>,
    pub(crate) dispatch: DispatchMode,
}

/// What an action press resolved to, detached from the map borrow.
enum PressAction {
    Talk(String),
    Travel(PendingTransition),
    PickUp { object_id: u32, item_id: String },
}

pub(crate) struct RpgScene {
    services: SceneServices,
    start_map: String,
    start_spawn: String,
    debug_collision: bool,
    layout: LayoutConfig,
    window: (u32, u32),
    map: MapData,
    player: Player,
    transition: TransitionSequencer,
    inventory: Inventory,
    quests: QuestEngine,
    relations: RelationRegistry,
    dialogue: Option<DialogueSession>,
    inventory_open: bool,
    /// Object ids collected, per map name.
    picked: HashMap<String, HashSet<u32>>,
}

impl RpgScene {
    pub(crate) fn new(config: &GameConfig, mut services: SceneServices) -> Self {
        let defaults = services.map_settings.lookup(&config.start_map);
        let quests = QuestEngine::new(std::mem::take(&mut services.quests));
        Self {
            start_map: config.start_map.clone(),
            start_spawn: config.start_spawn.clone(),
            debug_collision: config.debug_collision,
            layout: config.layout,
            window: (config.window.width, config.window.height),
            map: MapData::empty(&config.start_map, Vec2::ZERO),
            player: Player::new(Vec2::ZERO, defaults.player_speed, defaults.player_scale),
            transition: TransitionSequencer::new(config.fade_speed),
            inventory: Inventory::new(),
            quests,
            relations: RelationRegistry::with_roster(ROSTER.iter().map(|entry| entry.key)),
            dialogue: None,
            inventory_open: false,
            picked: HashMap::new(),
            services,
        }
    }

    fn layout_metrics(&self) -> LayoutMetrics {
        LayoutMetrics::for_window(self.window, &self.layout)
    }

    fn inventory_snapshot(&self) -> Vec<String> {
        self.inventory.item_ids().map(str::to_string).collect()
    }

    fn is_picked(&self, map_name: &str, object_id: u32) -> bool {
        self.picked
            .get(map_name)
            .is_some_and(|ids| ids.contains(&object_id))
    }

    /// Swaps in a loaded map, re-applies its settings and moves the player
    /// to its spawn.
    fn enter_map(&mut self, mut map: MapData, spawn: &str, world: &mut SceneWorld) {
        let settings = self.services.map_settings.lookup(&map.name);
        self.player.speed = settings.player_speed;
        self.player.scale = settings.player_scale;
        world.camera_mut().set_zoom_clamped(settings.zoom);
        if let Some(position) = map.spawn {
            self.player.teleport(position);
        }
        match map.tilemap.take() {
            Some(tilemap) => world.set_tilemap(tilemap),
            None => world.clear_tilemap(),
        }
        info!(
            map = %map.name,
            spawn = %spawn,
            walls = map.walls.len(),
            npcs = map.npcs.len(),
            items = map.items.len(),
            zoom = settings.zoom,
            "map_loaded"
        );
        self.map = map;
        self.update_camera(world);
    }

    fn update_camera(&self, world: &mut SceneWorld) {
        let zoom = world.camera().effective_zoom();
        let focus = clamped_focus(self.player.position, self.map.world_size, self.window, zoom);
        world.camera_mut().position = focus;
    }

    fn handle_cancel(&mut self) -> SceneCommand {
        if let Some(session) = self.dialogue.take() {
            info!(
                npc = %session.npc_name(),
                abandoned_request = session.is_waiting(),
                "dialogue_closed"
            );
            return SceneCommand::None;
        }
        if self.inventory_open {
            self.inventory_open = false;
            return SceneCommand::None;
        }
        SceneCommand::Quit
    }

    fn can_move(&self) -> bool {
        self.dialogue.is_none() && !self.inventory_open && self.transition.is_idle()
    }

    fn resolve_press(&self) -> Option<PressAction> {
        let hitbox = self.player.hitbox();
        let map_name = self.map.name.as_str();
        let found = resolve_interaction(&hitbox, &self.map, |item| {
            self.is_picked(map_name, item.object_id)
        })?;
        Some(match found {
            Interaction::Talk(npc) => PressAction::Talk(npc.name.clone()),
            Interaction::Travel(zone) => PressAction::Travel(PendingTransition {
                target_map: zone.target_map.clone(),
                target_spawn: zone.target_spawn.clone(),
            }),
            Interaction::PickUp(item) => PressAction::PickUp {
                object_id: item.object_id,
                item_id: item.item_id.clone(),
            },
        })
    }

    fn handle_action_press(&mut self) {
        let Some(action) = self.resolve_press() else {
            return;
        };
        match action {
            PressAction::Talk(npc) => self.open_dialogue(&npc),
            PressAction::Travel(pending) => {
                let target = pending.target_map.clone();
                let spawn = pending.target_spawn.clone();
                if self.transition.start(pending) {
                    info!(from = %self.map.name, to = %target, spawn = %spawn, "map_transition_started");
                }
            }
            PressAction::PickUp { object_id, item_id } => {
                self.inventory.add(&item_id, 1);
                self.picked
                    .entry(self.map.name.clone())
                    .or_default()
                    .insert(object_id);
                info!(
                    map = %self.map.name,
                    item = %item_id,
                    count = self.inventory.count(&item_id),
                    "item_picked_up"
                );
            }
        }
    }

    fn open_dialogue(&mut self, npc_name: &str) {
        let interaction = self.quests.handle_npc_interaction(npc_name, &self.inventory);
        let agent = match self.services.agents.create(npc_name, &interaction.prompt) {
            Ok(agent) => agent,
            Err(error) => {
                warn!(npc = %npc_name, error = %error, "dialogue_open_failed");
                return;
            }
        };
        self.inventory_open = false;
        self.dialogue = Some(DialogueSession::open(
            npc_name,
            agent,
            self.services.dispatch,
            interaction.prompt,
            self.inventory_snapshot(),
        ));
        info!(
            npc = %npc_name,
            activated = interaction.events.activated.len(),
            ready = interaction.events.ready_to_complete.len(),
            "dialogue_opened"
        );
    }

    fn update_dialogue_input(&mut self, input: &InputSnapshot) {
        let metrics = self.layout_metrics();
        let inventory = self.inventory_snapshot();
        let Some(session) = self.dialogue.as_mut() else {
            return;
        };

        session.type_text(input.typed_text());
        for _ in 0..input.press_count(InputAction::Erase) {
            session.erase();
        }
        if input.scroll_steps() != 0 {
            session.scroll_by(input.scroll_steps(), &metrics);
        }
        if input.pressed(InputAction::Submit) {
            if let Some(message) = session.take_submission() {
                let context = self
                    .quests
                    .handle_npc_interaction(session.npc_name(), &self.inventory)
                    .prompt;
                session.request_reply(message, inventory, context);
            }
        }
    }

    /// Applies a finished agent request: finalize, relation drift, then the
    /// NPC line.
    fn poll_dialogue(&mut self) {
        let Some(session) = self.dialogue.as_mut() else {
            return;
        };
        let npc = session.npc_name().to_string();
        match session.poll() {
            DialoguePoll::Idle | DialoguePoll::Waiting => {}
            DialoguePoll::Reply(Ok(reply)) => {
                let completed = self.quests.finalize_quests_after_dialog(
                    &npc,
                    &mut self.inventory,
                    &mut self.relations,
                );
                let npc_id = self.relations.id_for(&normalize_npc_name(&npc));
                self.relations.adjust(npc_id, reply.emotion.relation_delta());
                session.push_npc_line(&reply.text);
                info!(
                    npc = %npc,
                    emotion = ?reply.emotion,
                    completed = completed.len(),
                    "dialogue_reply_received"
                );
            }
            DialoguePoll::Reply(Err(error)) => {
                warn!(npc = %npc, error = %error, "dialogue_request_failed");
                session.push_npc_line(FALLBACK_REPLY);
            }
            DialoguePoll::Lost => {
                warn!(npc = %npc, error = %AgentError::WorkerLost, "dialogue_request_failed");
                self.dialogue = None;
                info!(npc = %npc, "dialogue_closed");
            }
        }
    }

    /// Advances the fade; at full opacity the pending map is loaded. A map
    /// that fails to load leaves the player where they are.
    fn step_transition(&mut self, world: &mut SceneWorld) {
        let Some(pending) = self.transition.step() else {
            return;
        };
        match self
            .services
            .maps
            .load_map(&pending.target_map, &pending.target_spawn)
        {
            Ok(map) => self.enter_map(map, &pending.target_spawn, world),
            Err(error) => warn!(
                from = %self.map.name,
                to = %pending.target_map,
                error = %error,
                "map_transition_aborted"
            ),
        }
    }

    fn build_sprites(&self) -> Vec<SpriteInstance> {
        let mut sprites = Vec::with_capacity(self.map.items.len() + self.map.npcs.len() + 1);
        for item in &self.map.items {
            if self.is_picked(&self.map.name, item.object_id) {
                continue;
            }
            sprites.push(SpriteInstance {
                position: item.rect.center,
                size: item.rect.size,
                scale: item.scale,
                renderable: sprite_or_placeholder(&item.sprite, ITEM_PLACEHOLDER_COLOR),
            });
        }
        for npc in &self.map.npcs {
            sprites.push(SpriteInstance {
                position: npc.position,
                size: NPC_PLACEHOLDER_SIZE,
                scale: npc.scale,
                renderable: sprite_or_placeholder(&npc.sprite, NPC_PLACEHOLDER_COLOR),
            });
        }
        let hitbox = self.player.hitbox();
        sprites.push(SpriteInstance {
            position: self.player.position,
            size: hitbox.size,
            scale: self.player.scale,
            renderable: sprite_or_placeholder(&self.player.sprite_key(), PLAYER_PLACEHOLDER_COLOR),
        });
        sprites
    }

    fn build_debug_rects(&self) -> Vec<DebugRect> {
        fn rect(zone: Rect, kind: DebugRectKind) -> DebugRect {
            DebugRect {
                center: zone.center,
                size: zone.size,
                kind,
            }
        }

        let walls = self.map.walls.iter().map(|wall| rect(wall.rect, DebugRectKind::Wall));
        let transitions = self
            .map
            .transitions
            .iter()
            .map(|zone| rect(zone.rect, DebugRectKind::Transition));
        let items = self
            .map
            .items
            .iter()
            .filter(|item| !self.is_picked(&self.map.name, item.object_id))
            .map(|item| rect(item.rect, DebugRectKind::Item));
        let npcs = self.map.npcs.iter().map(|npc| rect(npc.zone, DebugRectKind::NpcZone));
        walls.chain(transitions).chain(items).chain(npcs).collect()
    }

    /// Hidden while a dialogue is open.
    fn current_prompt(&self) -> Option<PromptView> {
        if self.dialogue.is_some() || !self.transition.is_idle() {
            return None;
        }
        let hitbox = self.player.hitbox();
        let map_name = self.map.name.as_str();
        resolve_interaction(&hitbox, &self.map, |item| self.is_picked(map_name, item.object_id)).map(
            |found| PromptView {
                text: found.prompt_text(),
                anchor: self.player.position,
            },
        )
    }

    fn inventory_panel(&self) -> InventoryPanelView {
        InventoryPanelView {
            title: INVENTORY_TITLE.to_string(),
            empty_label: INVENTORY_EMPTY_LABEL.to_string(),
            rows: self
                .inventory
                .iter()
                .map(|(item, quantity)| InventoryRow {
                    label: item.to_string(),
                    quantity,
                    icon: Some(format!("objet/{item}")),
                })
                .collect(),
        }
    }
}

#[cfg(test)]
impl RpgScene {
    pub(crate) fn map_name(&self) -> &str {
        &self.map.name
    }

    pub(crate) fn player(&self) -> &Player {
        &self.player
    }

    pub(crate) fn inventory(&self) -> &Inventory {
        &self.inventory
    }

    pub(crate) fn quests(&self) -> &QuestEngine {
        &self.quests
    }

    pub(crate) fn relations(&self) -> &RelationRegistry {
        &self.relations
    }

    pub(crate) fn dialogue(&self) -> Option<&DialogueSession> {
        self.dialogue.as_ref()
    }

    pub(crate) fn transition(&self) -> &TransitionSequencer {
        &self.transition
    }

    pub(crate) fn inventory_open(&self) -> bool {
        self.inventory_open
    }
}

fn sprite_or_placeholder(key: &str, color: [u8; 4]) -> RenderableKind {
    if key.is_empty() {
        RenderableKind::Placeholder(color)
    } else {
        RenderableKind::Sprite(key.to_string())
    }
}

impl Scene for RpgScene {
    fn load(&mut self, world: &mut SceneWorld) {
        let start_map = self.start_map.clone();
        let start_spawn = self.start_spawn.clone();
        match self.services.maps.load_map(&start_map, &start_spawn) {
            Ok(map) => self.enter_map(map, &start_spawn, world),
            Err(error) => {
                warn!(map = %start_map, error = %error, "start_map_load_failed");
                world.clear_tilemap();
            }
        }
        info!(
            map = %self.map.name,
            quests = self.quests.quests().len(),
            npcs = self.relations.len(),
            "scene_loaded"
        );
    }

    fn update(
        &mut self,
        _fixed_dt_seconds: f32,
        input: &InputSnapshot,
        world: &mut SceneWorld,
    ) -> SceneCommand {
        let (width, height) = input.window_size();
        if width > 0 && height > 0 {
            self.window = (width, height);
        }

        if input.pressed(InputAction::Cancel) && self.handle_cancel() == SceneCommand::Quit {
            return SceneCommand::Quit;
        }

        if self.dialogue.is_none() && input.pressed(InputAction::ToggleInventory) {
            self.inventory_open = !self.inventory_open;
        }

        if self.can_move() {
            step_player(
                &mut self.player,
                DirectionInput::from_snapshot(input),
                &self.map.walls,
            );
        }
        self.update_camera(world);

        if input.pressed(InputAction::Interact)
            && self.dialogue.is_none()
            && !self.inventory_open
            && self.transition.is_idle()
        {
            self.handle_action_press();
        }

        self.step_transition(world);

        self.update_dialogue_input(input);
        self.poll_dialogue();

        SceneCommand::None
    }

    fn render(&mut self, world: &mut SceneWorld) {
        world.set_sprites(self.build_sprites());
        world.set_debug_rects(if self.debug_collision {
            self.build_debug_rects()
        } else {
            Vec::new()
        });

        let metrics = self.layout_metrics();
        let prompt = self.current_prompt();
        let inventory = self.inventory_open.then(|| self.inventory_panel());
        let dialogue = self.dialogue.as_mut().map(|session| session.panel(&metrics));
        world.set_hud(HudView {
            fade_alpha: self.transition.overlay_alpha(),
            prompt,
            dialogue,
            inventory,
        });
    }

    fn unload(&mut self, world: &mut SceneWorld) {
        if let Some(session) = self.dialogue.take() {
            info!(npc = %session.npc_name(), "dialogue_closed");
        }
        world.clear();
    }

    fn debug_title(&self, _world: &SceneWorld) -> Option<String> {
        Some(format!(
            "{} | quêtes terminées : {}",
            self.map.name,
            self.quests.completed_count()
        ))
    }
}
