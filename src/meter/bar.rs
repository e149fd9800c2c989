//! Horizontal bar rendering with eighth-cell resolution.
//!
//! A line looks like `\r  1: 0.734 |██████▍     | `: optional channel index,
//! optional numeric value, then a bar that always fills exactly the columns
//! left over after the prefixes and the closing delimiter.

use std::fmt::Write;

/// Fill levels from blank to full, one step per eighth of a cell.
pub const GLYPHS: [char; 9] = [' ', '▏', '▎', '▍', '▌', '▋', '▊', '▉', '█'];

pub const BLANK: char = GLYPHS[0];
pub const FULL: char = GLYPHS[8];

/// Shown instead of the bars when the terminal has fewer rows than channels.
pub const PLACEHOLDER: &str = ">> Not sufficient space for bars <<";

/// Columns used by the opening delimiter alone: ` |`
const PLAIN_PREFIX_WIDTH: usize = 2;
/// Columns used by the value and opening delimiter: ` 0.000 |`
const VALUE_PREFIX_WIDTH: usize = 8;
/// Digits always given to the channel index, so ` 7:` and `12:` line up.
const MIN_INDEX_DIGITS: usize = 2;
/// Columns used by the closing delimiter: `| `
const SUFFIX: &str = "| ";

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BarOptions {
    pub show_values: bool,
    pub show_index: bool,
}

/// Stateless bar formatter; identical inputs always produce identical lines.
#[derive(Debug, Clone, Copy)]
pub struct BarRenderer {
    options: BarOptions,
    index_digits: usize,
}

impl BarRenderer {
    /// Renderer for `channels` bars. The index prefix is wide enough for
    /// the highest channel number so every line has the same width.
    pub fn new(options: BarOptions, channels: usize) -> Self {
        let highest = channels.saturating_sub(1);
        let digits = highest.checked_ilog10().map_or(1, |log| log as usize + 1);
        Self {
            options,
            index_digits: digits.max(MIN_INDEX_DIGITS),
        }
    }

    /// Columns taken by everything except the bar itself.
    pub fn reserved_width(&self) -> usize {
        let mut reserved = SUFFIX.chars().count();
        reserved += if self.options.show_values {
            VALUE_PREFIX_WIDTH
        } else {
            PLAIN_PREFIX_WIDTH
        };
        if self.options.show_index {
            // leading space, digits, colon
            reserved += self.index_digits + 2;
        }
        reserved
    }

    /// Glyphs available for the bar on a terminal `total_width` columns wide.
    pub fn drawable_width(&self, total_width: u16) -> usize {
        (total_width as usize).saturating_sub(self.reserved_width())
    }

    /// Append one bar line for `channel` to `out`.
    ///
    /// `value` is clamped into `[0, 1]`. The line starts with a carriage
    /// return and carries no trailing newline.
    pub fn render_into(&self, out: &mut String, value: f32, total_width: u16, channel: usize) {
        let value = if value.is_finite() {
            value.clamp(0.0, 1.0)
        } else {
            0.0
        };

        out.push('\r');
        if self.options.show_index {
            let _ = write!(out, " {:>width$}:", channel, width = self.index_digits);
        }
        if self.options.show_values {
            let _ = write!(out, " {:.3} |", value);
        } else {
            out.push_str(" |");
        }

        let width = self.drawable_width(total_width);
        let scaled = width as f32 * value;
        let full_blocks = (scaled as usize).min(width);
        out.extend(std::iter::repeat(FULL).take(full_blocks));

        if full_blocks < width {
            let step = ((scaled - full_blocks as f32) * 8.0) as usize;
            out.push(GLYPHS[step.min(8)]);
            out.extend(std::iter::repeat(BLANK).take(width - full_blocks - 1));
        }

        out.push_str(SUFFIX);
    }

    #[cfg(test)]
    pub fn render(&self, value: f32, total_width: u16, channel: usize) -> String {
        let mut line = String::with_capacity(total_width as usize * 3 + 1);
        self.render_into(&mut line, value, total_width, channel);
        line
    }
}
