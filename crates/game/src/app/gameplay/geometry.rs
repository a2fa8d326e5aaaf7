use engine::Vec2;

/// Axis-aligned box in world pixels, y up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Rect {
    pub(crate) center: Vec2,
    pub(crate) size: Vec2,
}

impl Rect {
    pub(crate) const fn new(center: Vec2, size: Vec2) -> Self {
        Self { center, size }
    }

    pub(crate) fn square(center: Vec2, side: f32) -> Self {
        Self::new(center, Vec2::new(side, side))
    }

    /// Touching edges do not count as an overlap.
    pub(crate) fn overlaps(&self, other: &Rect) -> bool {
        let reach_x = (self.size.x + other.size.x) * 0.5;
        let reach_y = (self.size.y + other.size.y) * 0.5;
        (self.center.x - other.center.x).abs() < reach_x
            && (self.center.y - other.center.y).abs() < reach_y
    }
}

pub(crate) trait Zone {
    fn rect(&self) -> Rect;
}

impl Zone for Rect {
    fn rect(&self) -> Rect {
        *self
    }
}

/// Zones overlapping `shape`, in declaration order.
#[cfg(test)]
pub(crate) fn overlapping<'a, Z: Zone>(
    shape: &'a Rect,
    zones: &'a [Z],
) -> impl Iterator<Item = &'a Z> + 'a {
    zones.iter().filter(move |zone| shape.overlaps(&zone.rect()))
}

pub(crate) fn first_overlap<'a, Z: Zone>(shape: &Rect, zones: &'a [Z]) -> Option<&'a Z> {
    zones.iter().find(|zone| shape.overlaps(&zone.rect()))
}

pub(crate) fn any_overlap<Z: Zone>(shape: &Rect, zones: &[Z]) -> bool {
    first_overlap(shape, zones).is_some()
}
