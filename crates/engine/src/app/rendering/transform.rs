use crate::app::{Camera2D, Vec2};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

/// World pixels (y up) to screen pixels (y down), camera centred in the viewport.
pub fn world_to_screen_px(world: Vec2, camera: &Camera2D, viewport: Viewport) -> (i32, i32) {
    let (x, y) = world_to_screen_f32(world, camera, viewport);
    (x.round() as i32, y.round() as i32)
}

pub(crate) fn world_to_screen_f32(world: Vec2, camera: &Camera2D, viewport: Viewport) -> (f32, f32) {
    let zoom = camera.effective_zoom();
    let x = (world.x - camera.position.x) * zoom + viewport.width as f32 * 0.5;
    let y = viewport.height as f32 * 0.5 - (world.y - camera.position.y) * zoom;
    (x, y)
}

/// World-space rectangle `(min, max)` currently covered by the viewport.
pub(crate) fn visible_world_bounds(camera: &Camera2D, viewport: Viewport) -> (Vec2, Vec2) {
    let zoom = camera.effective_zoom();
    let half_w = viewport.width as f32 * 0.5 / zoom;
    let half_h = viewport.height as f32 * 0.5 / zoom;
    (
        Vec2::new(camera.position.x - half_w, camera.position.y - half_h),
        Vec2::new(camera.position.x + half_w, camera.position.y + half_h),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const VIEWPORT: Viewport = Viewport {
        width: 800,
        height: 600,
    };

    #[test]
    fn camera_position_maps_to_viewport_center() {
        let camera = Camera2D {
            position: Vec2::new(120.0, 80.0),
            zoom: 2.0,
        };
        assert_eq!(
            world_to_screen_px(Vec2::new(120.0, 80.0), &camera, VIEWPORT),
            (400, 300)
        );
    }

    #[test]
    fn zoom_scales_offsets_and_flips_y() {
        let camera = Camera2D {
            position: Vec2::new(10.0, -5.0),
            zoom: 2.0,
        };
        let (x, y) = world_to_screen_px(Vec2::new(12.0, -4.0), &camera, VIEWPORT);
        assert_eq!((x, y), (404, 298));
    }

    #[test]
    fn visible_bounds_shrink_with_zoom() {
        let camera = Camera2D {
            position: Vec2::new(400.0, 300.0),
            zoom: 2.0,
        };
        let (min, max) = visible_world_bounds(&camera, VIEWPORT);
        assert_eq!(min, Vec2::new(200.0, 150.0));
        assert_eq!(max, Vec2::new(600.0, 450.0));
    }
}
