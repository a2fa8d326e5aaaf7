/// Clipped drawing primitives over an RGBA8 frame buffer.
pub(crate) struct Canvas<'a> {
    frame: &'a mut [u8],
    width: u32,
    height: u32,
}

impl<'a> Canvas<'a> {
    pub(crate) fn new(frame: &'a mut [u8], width: u32, height: u32) -> Self {
        Self {
            frame,
            width,
            height,
        }
    }

    pub(crate) fn width(&self) -> u32 {
        self.width
    }

    pub(crate) fn height(&self) -> u32 {
        self.height
    }

    pub(crate) fn clear(&mut self, color: [u8; 4]) {
        for pixel in self.frame.chunks_exact_mut(4) {
            pixel.copy_from_slice(&color);
        }
    }

    fn byte_offset(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return None;
        }
        let pixel = (y as usize)
            .checked_mul(self.width as usize)?
            .checked_add(x as usize)?;
        let offset = pixel.checked_mul(4)?;
        (offset + 4 <= self.frame.len()).then_some(offset)
    }

    pub(crate) fn put_pixel(&mut self, x: i32, y: i32, color: [u8; 4]) {
        if let Some(offset) = self.byte_offset(x, y) {
            self.frame[offset..offset + 4].copy_from_slice(&color);
        }
    }

    /// Source-over blend using `color[3]` as coverage.
    pub(crate) fn blend_pixel(&mut self, x: i32, y: i32, color: [u8; 4]) {
        let alpha = color[3] as u32;
        if alpha == 0 {
            return;
        }
        if alpha == 255 {
            self.put_pixel(x, y, color);
            return;
        }
        let Some(offset) = self.byte_offset(x, y) else {
            return;
        };
        let inverse = 255 - alpha;
        for channel in 0..3 {
            let dst = self.frame[offset + channel] as u32;
            let src = color[channel] as u32;
            self.frame[offset + channel] = ((src * alpha + dst * inverse) / 255) as u8;
        }
        self.frame[offset + 3] = 255;
    }

    fn clip_rect(&self, x: i32, y: i32, w: i32, h: i32) -> Option<(i32, i32, i32, i32)> {
        let start_x = x.max(0);
        let start_y = y.max(0);
        let end_x = x.saturating_add(w).min(self.width as i32);
        let end_y = y.saturating_add(h).min(self.height as i32);
        (end_x > start_x && end_y > start_y).then_some((start_x, start_y, end_x, end_y))
    }

    pub(crate) fn fill_rect(&mut self, x: i32, y: i32, w: i32, h: i32, color: [u8; 4]) {
        let Some((start_x, start_y, end_x, end_y)) = self.clip_rect(x, y, w, h) else {
            return;
        };
        for py in start_y..end_y {
            for px in start_x..end_x {
                self.put_pixel(px, py, color);
            }
        }
    }

    pub(crate) fn blend_rect(&mut self, x: i32, y: i32, w: i32, h: i32, color: [u8; 4]) {
        let Some((start_x, start_y, end_x, end_y)) = self.clip_rect(x, y, w, h) else {
            return;
        };
        for py in start_y..end_y {
            for px in start_x..end_x {
                self.blend_pixel(px, py, color);
            }
        }
    }

    pub(crate) fn outline_rect(
        &mut self,
        x: i32,
        y: i32,
        w: i32,
        h: i32,
        thickness: i32,
        color: [u8; 4],
    ) {
        if w <= 1 || h <= 1 || thickness <= 0 {
            return;
        }
        self.fill_rect(x, y, w, thickness, color);
        self.fill_rect(x, y + h - thickness, w, thickness, color);
        self.fill_rect(x, y, thickness, h, color);
        self.fill_rect(x + w - thickness, y, thickness, h, color);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pixel(frame: &[u8], width: u32, x: u32, y: u32) -> [u8; 4] {
        let offset = ((y * width + x) * 4) as usize;
        [
            frame[offset],
            frame[offset + 1],
            frame[offset + 2],
            frame[offset + 3],
        ]
    }

    #[test]
    fn fill_rect_clips_to_frame_bounds() {
        let mut frame = vec![0u8; 4 * 4 * 4];
        let mut canvas = Canvas::new(&mut frame, 4, 4);
        canvas.fill_rect(-2, 2, 10, 10, [9, 9, 9, 255]);

        assert_eq!(pixel(&frame, 4, 0, 1), [0, 0, 0, 0]);
        assert_eq!(pixel(&frame, 4, 3, 3), [9, 9, 9, 255]);
    }

    #[test]
    fn blend_pixel_mixes_by_alpha() {
        let mut frame = vec![200u8; 4];
        let mut canvas = Canvas::new(&mut frame, 1, 1);
        canvas.blend_pixel(0, 0, [0, 0, 0, 255 / 2]);

        let [r, g, b, a] = pixel(&frame, 1, 0, 0);
        assert!((99..=101).contains(&r));
        assert_eq!((r, g, b, a), (r, r, r, 255));
    }

    #[test]
    fn out_of_bounds_writes_are_ignored() {
        let mut frame = vec![0u8; 4];
        let mut canvas = Canvas::new(&mut frame, 1, 1);
        canvas.put_pixel(1, 0, [1, 1, 1, 1]);
        canvas.put_pixel(-1, 0, [1, 1, 1, 1]);
        canvas.outline_rect(-5, -5, 3, 3, 1, [1, 1, 1, 1]);
        assert_eq!(frame, vec![0u8; 4]);
    }
}
