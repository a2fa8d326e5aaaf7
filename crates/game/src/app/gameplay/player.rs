use engine::Vec2;

use super::geometry::Rect;

/// Base hitbox side before the per-map player scale.
pub(crate) const PLAYER_BASE_SIZE_PX: f32 = 32.0;
pub(crate) const WALK_FRAME_COUNT: u32 = 4;
/// Distance walked before the walk cycle advances one frame.
const WALK_FRAME_DISTANCE_PX: f32 = 20.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Facing {
    Down,
    Up,
    Left,
    Right,
}

impl Facing {
    fn sprite_stem(self) -> &'static str {
        match self {
            Facing::Down => "front",
            Facing::Up => "back",
            Facing::Left => "left",
            Facing::Right => "right",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Player {
    pub(crate) position: Vec2,
    pub(crate) previous_position: Vec2,
    /// Displacement requested for the current tick.
    pub(crate) intent: Vec2,
    pub(crate) speed: f32,
    pub(crate) scale: f32,
    facing: Facing,
    walk_frame: u32,
    walk_distance: f32,
}

impl Player {
    pub(crate) fn new(position: Vec2, speed: f32, scale: f32) -> Self {
        Self {
            position,
            previous_position: position,
            intent: Vec2::ZERO,
            speed,
            scale,
            facing: Facing::Down,
            walk_frame: 0,
            walk_distance: 0.0,
        }
    }

    pub(crate) fn hitbox(&self) -> Rect {
        Rect::square(self.position, PLAYER_BASE_SIZE_PX * self.scale)
    }

    pub(crate) fn remember_position(&mut self) {
        self.previous_position = self.position;
    }

    pub(crate) fn rollback(&mut self) {
        self.position = self.previous_position;
    }

    /// Places the player without leaving a rollback target behind.
    pub(crate) fn teleport(&mut self, position: Vec2) {
        self.position = position;
        self.previous_position = position;
        self.intent = Vec2::ZERO;
        self.walk_frame = 0;
        self.walk_distance = 0.0;
    }

    #[cfg(test)]
    pub(crate) fn facing(&self) -> Facing {
        self.facing
    }

    #[cfg(test)]
    pub(crate) fn walk_frame(&self) -> u32 {
        self.walk_frame
    }

    /// Horizontal intent decides facing when both axes are held.
    pub(crate) fn update_animation(&mut self) {
        let intent = self.intent;
        if intent.x < 0.0 {
            self.facing = Facing::Left;
        } else if intent.x > 0.0 {
            self.facing = Facing::Right;
        } else if intent.y > 0.0 {
            self.facing = Facing::Up;
        } else if intent.y < 0.0 {
            self.facing = Facing::Down;
        }

        if intent == Vec2::ZERO {
            self.walk_frame = 0;
            self.walk_distance = 0.0;
            return;
        }
        self.walk_distance += intent.x.abs() + intent.y.abs();
        while self.walk_distance >= WALK_FRAME_DISTANCE_PX {
            self.walk_distance -= WALK_FRAME_DISTANCE_PX;
            self.walk_frame = (self.walk_frame + 1) % WALK_FRAME_COUNT;
        }
    }

    pub(crate) fn sprite_key(&self) -> String {
        format!(
            "sprites/player/player_{}_{}",
            self.facing.sprite_stem(),
            self.walk_frame
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_player_faces_down_on_frame_zero() {
        let player = Player::new(Vec2::ZERO, 4.0, 1.0);
        assert_eq!(player.sprite_key(), "sprites/player/player_front_0");
    }

    #[test]
    fn walking_advances_frames_and_wraps() {
        let mut player = Player::new(Vec2::ZERO, 4.0, 1.0);
        player.intent = Vec2::new(0.0, 4.0);
        for _ in 0..5 {
            player.update_animation();
        }
        assert_eq!(player.facing(), Facing::Up);
        assert_eq!(player.walk_frame(), 1);

        for _ in 0..15 {
            player.update_animation();
        }
        assert_eq!(player.walk_frame(), 0, "80 px = four frames = full cycle");

        player.intent = Vec2::ZERO;
        player.update_animation();
        assert_eq!(player.sprite_key(), "sprites/player/player_back_0");
    }

    #[test]
    fn horizontal_intent_wins_facing() {
        let mut player = Player::new(Vec2::ZERO, 4.0, 1.0);
        player.intent = Vec2::new(-4.0, 4.0);
        player.update_animation();
        assert_eq!(player.facing(), Facing::Left);
    }

    #[test]
    fn hitbox_scales_with_player_scale() {
        let player = Player::new(Vec2::new(10.0, 10.0), 4.0, 1.5);
        assert_eq!(player.hitbox().size, Vec2::new(48.0, 48.0));
    }
}
