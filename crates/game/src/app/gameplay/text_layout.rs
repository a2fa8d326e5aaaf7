//! Approximate text layout for the dialogue panel. Widths come from a fixed
//! per-character estimate rather than real glyph metrics.

use std::ops::Range;

use crate::app::config::LayoutConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct LayoutMetrics {
    pub(crate) max_chars: usize,
    pub(crate) visible_lines: usize,
    pub(crate) line_height_px: u32,
}

impl LayoutMetrics {
    pub(crate) fn for_window(window: (u32, u32), config: &LayoutConfig) -> Self {
        let (width, height) = (window.0 as f32, window.1 as f32);
        let box_width = width - 2.0 * config.box_margin_px as f32;
        let wrap_width = box_width - 2.0 * config.text_inset_px as f32;
        let char_width = (config.font_size_px * config.char_width_ratio).max(1.0);
        let max_chars = (wrap_width / char_width).floor().max(1.0) as usize;

        let history_height =
            (height * config.box_height_ratio).floor() as i64 - i64::from(config.input_reserve_px);
        let line_height = config.line_height_px.max(1);
        let visible_lines = (history_height / i64::from(line_height)).max(1) as usize;

        Self {
            max_chars,
            visible_lines,
            line_height_px: line_height,
        }
    }
}

/// Greedy word wrap at `max_chars` characters. Whitespace runs collapse,
/// words longer than a line are split, and empty input gives no lines.
pub(crate) fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for word in text.split_whitespace() {
        let word_len = word.chars().count();
        let separator = usize::from(current_len > 0);

        if current_len + separator + word_len <= max_chars {
            if separator == 1 {
                current.push(' ');
            }
            current.push_str(word);
            current_len += separator + word_len;
            continue;
        }

        if word_len <= max_chars {
            lines.push(std::mem::take(&mut current));
            current.push_str(word);
            current_len = word_len;
            continue;
        }

        // Long word: top up the current line first, then cut full-width pieces.
        let mut rest: Vec<char> = word.chars().collect();
        if current_len > 0 && current_len + 1 < max_chars {
            let take = max_chars - current_len - 1;
            current.push(' ');
            current.extend(rest.drain(..take));
        }
        if !current.is_empty() {
            lines.push(std::mem::take(&mut current));
        }
        let mut pieces = rest.chunks(max_chars).peekable();
        while let Some(piece) = pieces.next() {
            if pieces.peek().is_some() {
                lines.push(piece.iter().collect());
            } else {
                current = piece.iter().collect();
                current_len = piece.len();
            }
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// `"{speaker}: {message}"` per entry, wrapped, each followed by a blank line.
pub(crate) fn wrap_transcript<'a>(
    entries: impl IntoIterator<Item = (&'a str, &'a str)>,
    max_chars: usize,
) -> Vec<String> {
    let mut lines = Vec::new();
    for (speaker, message) in entries {
        lines.extend(wrap_text(&format!("{speaker}: {message}"), max_chars));
        lines.push(String::new());
    }
    lines
}

pub(crate) fn max_scroll(total_lines: usize, visible_lines: usize) -> usize {
    total_lines.saturating_sub(visible_lines)
}

/// Clamps a requested offset (lines up from the newest) into `[0, max_scroll]`.
pub(crate) fn clamp_scroll(requested: i64, total_lines: usize, visible_lines: usize) -> usize {
    let max = max_scroll(total_lines, visible_lines) as i64;
    requested.clamp(0, max) as usize
}

/// Lines to draw: anchored on the newest content, moved up by `scroll`.
pub(crate) fn visible_range(total_lines: usize, visible_lines: usize, scroll: usize) -> Range<usize> {
    let start = total_lines.saturating_sub(visible_lines).saturating_sub(scroll);
    let end = (start + visible_lines).min(total_lines);
    start..end
}
