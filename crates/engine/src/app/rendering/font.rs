//! 3x5 bitmap font for UI text. Each glyph is packed into 15 bits, top row
//! in the highest bits, leftmost column first.

use super::canvas::Canvas;

pub const GLYPH_WIDTH: i32 = 3;
pub const GLYPH_HEIGHT: i32 = 5;
pub const TEXT_SCALE: i32 = 3;
pub const GLYPH_ADVANCE_PX: i32 = (GLYPH_WIDTH + 1) * TEXT_SCALE;

const FIRST_PRINTABLE: u32 = 0x20;

#[rustfmt::skip]
const PRINTABLE_GLYPHS: [u16; 95] = [
    0x0000, 0x2482, 0x5a00, 0x5f7d, 0x7ddf, 0x52a5, 0x2aab, 0x2400,
    0x1491, 0x4494, 0x0aa8, 0x05d0, 0x0014, 0x01c0, 0x0002, 0x12a4,
    0x7b6f, 0x2c97, 0x73e7, 0x73cf, 0x5bc9, 0x79cf, 0x79ef, 0x7292,
    0x7bef, 0x7bcf, 0x0410, 0x0414, 0x1511, 0x0e38, 0x4454, 0x72c2,
    0x7be7, 0x2bed, 0x6bae, 0x7927, 0x6b6e, 0x79a7, 0x79a4, 0x796f,
    0x5bed, 0x7497, 0x726f, 0x5bad, 0x4927, 0x5fed, 0x5ffd, 0x7b6f,
    0x6ba4, 0x7b79, 0x6bad, 0x79cf, 0x7492, 0x5b6f, 0x5b6a, 0x5bfd,
    0x5aad, 0x5a92, 0x72a7, 0x6926, 0x4889, 0x324b, 0x2a00, 0x0007,
    0x4400, 0x0e7f, 0x49ae, 0x0f27, 0x13ef, 0x0fa7, 0x39a4, 0x0f79,
    0x49ad, 0x2092, 0x106a, 0x4bad, 0x4927, 0x0ded, 0x0d6d, 0x0f6f,
    0x0d74, 0x0f79, 0x0d64, 0x0f8f, 0x2e93, 0x0b6f, 0x0b6a, 0x0b7a,
    0x0a95, 0x0b79, 0x0e57, 0x3593, 0x2492, 0x64d6, 0x0780,
];

const FALLBACK_GLYPH: u16 = 0x72c2;

/// Maps Latin-1 letters with diacritics to their base letter so French
/// dialogue stays legible with an ASCII-only font.
pub(crate) fn fold_to_ascii(ch: char) -> char {
    match ch {
        'à' | 'á' | 'â' | 'ä' | 'ã' => 'a',
        'À' | 'Á' | 'Â' | 'Ä' | 'Ã' => 'A',
        'é' | 'è' | 'ê' | 'ë' => 'e',
        'É' | 'È' | 'Ê' | 'Ë' => 'E',
        'î' | 'ï' | 'í' | 'ì' => 'i',
        'Î' | 'Ï' | 'Í' | 'Ì' => 'I',
        'ô' | 'ö' | 'ó' | 'ò' | 'õ' => 'o',
        'Ô' | 'Ö' | 'Ó' | 'Ò' | 'Õ' => 'O',
        'ù' | 'û' | 'ü' | 'ú' => 'u',
        'Ù' | 'Û' | 'Ü' | 'Ú' => 'U',
        'ç' => 'c',
        'Ç' => 'C',
        'œ' => 'o',
        'Œ' => 'O',
        '’' | '‘' => '\'',
        '«' | '»' | '“' | '”' => '"',
        '–' | '—' => '-',
        '…' => '.',
        '\u{a0}' => ' ',
        other => other,
    }
}

fn glyph_bits(ch: char) -> u16 {
    let folded = fold_to_ascii(ch) as u32;
    match folded.checked_sub(FIRST_PRINTABLE) {
        Some(index) if (index as usize) < PRINTABLE_GLYPHS.len() => {
            PRINTABLE_GLYPHS[index as usize]
        }
        _ => FALLBACK_GLYPH,
    }
}

pub(crate) fn text_width_px(text: &str) -> i32 {
    text.chars().count() as i32 * GLYPH_ADVANCE_PX
}

pub(crate) fn draw_text(canvas: &mut Canvas<'_>, mut x: i32, y: i32, text: &str, color: [u8; 4]) {
    for ch in text.chars() {
        draw_glyph(canvas, x, y, glyph_bits(ch), color);
        x += GLYPH_ADVANCE_PX;
    }
}

/// Draws `text` horizontally centred on `center_x`.
pub(crate) fn draw_text_centered(
    canvas: &mut Canvas<'_>,
    center_x: i32,
    y: i32,
    text: &str,
    color: [u8; 4],
) {
    let x = center_x - text_width_px(text) / 2;
    draw_text(canvas, x, y, text, color);
}

fn draw_glyph(canvas: &mut Canvas<'_>, x: i32, y: i32, bits: u16, color: [u8; 4]) {
    if bits == 0 {
        return;
    }
    for row in 0..GLYPH_HEIGHT {
        for col in 0..GLYPH_WIDTH {
            let shift = (GLYPH_HEIGHT - 1 - row) * GLYPH_WIDTH + (GLYPH_WIDTH - 1 - col);
            if bits & (1 << shift) == 0 {
                continue;
            }
            canvas.fill_rect(
                x + col * TEXT_SCALE,
                y + row * TEXT_SCALE,
                TEXT_SCALE,
                TEXT_SCALE,
                color,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn printable_ascii_has_a_glyph_and_space_is_blank() {
        assert_eq!(glyph_bits(' '), 0);
        for code in 0x21u8..=0x7e {
            assert_ne!(glyph_bits(char::from(code)), 0, "char={}", char::from(code));
        }
    }

    #[test]
    fn accented_letters_render_as_their_base_letter() {
        assert_eq!(glyph_bits('é'), glyph_bits('e'));
        assert_eq!(glyph_bits('Ç'), glyph_bits('C'));
        assert_eq!(glyph_bits('’'), glyph_bits('\''));
    }

    #[test]
    fn unknown_characters_use_fallback_glyph() {
        assert_eq!(glyph_bits('漢'), FALLBACK_GLYPH);
        assert_eq!(glyph_bits('\u{7f}'), FALLBACK_GLYPH);
    }

    #[test]
    fn drawing_text_off_screen_never_panics() {
        let mut frame = vec![0u8; 8 * 8 * 4];
        let mut canvas = Canvas::new(&mut frame, 8, 8);
        draw_text(&mut canvas, -20, -3, "Bonjour", [255, 255, 255, 255]);
        draw_text(&mut canvas, 6, 6, "é!", [255, 255, 255, 255]);
        assert!(frame.iter().any(|byte| *byte != 0));
    }

    #[test]
    fn text_width_counts_characters_not_bytes() {
        assert_eq!(text_width_px("Blé"), 3 * GLYPH_ADVANCE_PX);
    }
}
