use engine::{InputAction, InputSnapshot, Vec2};

use super::geometry::any_overlap;
use super::player::Player;
use super::world::Wall;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct DirectionInput {
    pub(crate) up: bool,
    pub(crate) down: bool,
    pub(crate) left: bool,
    pub(crate) right: bool,
}

impl DirectionInput {
    pub(crate) fn from_snapshot(input: &InputSnapshot) -> Self {
        Self {
            up: input.is_down(InputAction::MoveUp),
            down: input.is_down(InputAction::MoveDown),
            left: input.is_down(InputAction::MoveLeft),
            right: input.is_down(InputAction::MoveRight),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MoveOutcome {
    Idle,
    Moved,
    Blocked,
}

/// Sum of unit steps per held direction, times speed. Diagonals are not
/// normalized.
pub(crate) fn movement_intent(input: DirectionInput, speed: f32) -> Vec2 {
    let mut intent = Vec2::ZERO;
    if input.up {
        intent.y += speed;
    }
    if input.down {
        intent.y -= speed;
    }
    if input.left {
        intent.x -= speed;
    }
    if input.right {
        intent.x += speed;
    }
    intent
}

/// Applies one tick of movement. Any wall overlap after the step restores
/// the previous position on both axes.
pub(crate) fn step_player(player: &mut Player, input: DirectionInput, walls: &[Wall]) -> MoveOutcome {
    player.remember_position();
    player.intent = movement_intent(input, player.speed);
    player.update_animation();
    if player.intent == Vec2::ZERO {
        return MoveOutcome::Idle;
    }

    player.position = player.position + player.intent;
    if any_overlap(&player.hitbox(), walls) {
        player.rollback();
        return MoveOutcome::Blocked;
    }
    MoveOutcome::Moved
}
