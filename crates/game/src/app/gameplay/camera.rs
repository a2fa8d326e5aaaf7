use engine::Vec2;

/// Camera focal point keeping the visible area inside the world. An axis
/// where the world is smaller than the view is centred instead.
pub(crate) fn clamped_focus(player: Vec2, world: Vec2, viewport: (u32, u32), zoom: f32) -> Vec2 {
    let zoom = if zoom.is_finite() && zoom > 0.0 { zoom } else { 1.0 };
    let visible = Vec2::new(viewport.0 as f32 / zoom, viewport.1 as f32 / zoom);
    Vec2::new(
        clamp_axis(player.x, world.x, visible.x),
        clamp_axis(player.y, world.y, visible.y),
    )
}

fn clamp_axis(target: f32, world: f32, visible: f32) -> f32 {
    if world < visible {
        return world / 2.0;
    }
    let half = visible / 2.0;
    target.max(half).min(world - half)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn follows_player_inside_bounds() {
        let focus = clamped_focus(
            Vec2::new(1000.0, 700.0),
            Vec2::new(3200.0, 1600.0),
            (1280, 720),
            1.0,
        );
        assert_eq!(focus, Vec2::new(1000.0, 700.0));
    }

    #[test]
    fn clamps_at_world_edges_for_every_position() {
        let world = Vec2::new(3200.0, 1600.0);
        let viewport = (1280, 720);
        for zoom in [1.0_f32, 2.0] {
            let half_w = 640.0 / zoom;
            let half_h = 360.0 / zoom;
            for px in [-50.0_f32, 0.0, 300.0, 1600.0, 3100.0, 4000.0] {
                for py in [-10.0_f32, 100.0, 800.0, 1590.0, 2000.0] {
                    let focus = clamped_focus(Vec2::new(px, py), world, viewport, zoom);
                    assert!(focus.x - half_w >= 0.0 && focus.x + half_w <= world.x);
                    assert!(focus.y - half_h >= 0.0 && focus.y + half_h <= world.y);
                }
            }
        }
    }

    #[test]
    fn small_world_axis_is_centred() {
        let focus = clamped_focus(
            Vec2::new(10.0, 900.0),
            Vec2::new(640.0, 2000.0),
            (1280, 720),
            1.0,
        );
        assert_eq!(focus.x, 320.0);
        assert_eq!(focus.y, 900.0);
    }

    #[test]
    fn zoom_shrinks_visible_area() {
        let focus = clamped_focus(Vec2::new(0.0, 0.0), Vec2::new(1000.0, 600.0), (1280, 720), 2.0);
        assert_eq!(focus, Vec2::new(320.0, 180.0));
    }
}
