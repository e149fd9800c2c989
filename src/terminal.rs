use crate::meter::bar::{BarRenderer, PLACEHOLDER};
use crossterm::{
    cursor::{Hide, MoveToPreviousLine, Show},
    queue,
    style::Print,
    terminal::{size, Clear, ClearType},
};
use std::io::{self, Write};
use tracing::warn;

/// Used when the terminal cannot report its size
pub const FALLBACK_SIZE: (u16, u16) = (80, 24);

/// In-place multi-line bar display.
///
/// Hides the cursor on creation and shows it again exactly once, either via
/// [`TerminalCanvas::restore`] or on drop.
pub struct TerminalCanvas<W: Write> {
    out: W,
    line: String,
    block_rows: u16,
    cursor_hidden: bool,
    size_warned: bool,
}

impl<W: Write> TerminalCanvas<W> {
    pub fn new(mut out: W) -> io::Result<Self> {
        queue!(out, Hide)?;
        out.flush()?;

        Ok(Self {
            out,
            line: String::new(),
            block_rows: 0,
            cursor_hidden: true,
            size_warned: false,
        })
    }

    /// Current terminal size, re-queried on every call.
    pub fn query_size(&mut self) -> (u16, u16) {
        match size() {
            Ok(dims) => dims,
            Err(err) => {
                if !self.size_warned {
                    warn!("terminal size query failed, assuming {:?}: {err}", FALLBACK_SIZE);
                    self.size_warned = true;
                }
                FALLBACK_SIZE
            }
        }
    }

    /// Draw one bar per level and park the cursor back on the first one.
    ///
    /// With fewer rows than levels a single placeholder line is drawn instead.
    pub fn draw_frame(
        &mut self,
        levels: &[f32],
        (width, height): (u16, u16),
        renderer: &BarRenderer,
    ) -> io::Result<()> {
        self.line.clear();

        if (height as usize) < levels.len() {
            self.line.push('\r');
            self.line.push_str(PLACEHOLDER);
            queue!(self.out, Print(&self.line), Clear(ClearType::FromCursorDown))?;
            self.block_rows = 1;
            return self.out.flush();
        }

        for (channel, &level) in levels.iter().enumerate() {
            if channel > 0 {
                self.line.push('\n');
            }
            renderer.render_into(&mut self.line, level, width, channel);
        }
        queue!(self.out, Print(&self.line))?;

        let rows_below = levels.len().saturating_sub(1) as u16;
        if rows_below > 0 {
            queue!(self.out, MoveToPreviousLine(rows_below))?;
        }
        self.block_rows = levels.len() as u16;
        self.out.flush()
    }

    /// Move below the drawn block and show the cursor. Later calls are no-ops.
    pub fn restore(&mut self) -> io::Result<()> {
        if !self.cursor_hidden {
            return Ok(());
        }
        self.cursor_hidden = false;

        for _ in 0..self.block_rows {
            queue!(self.out, Print('\n'))?;
        }
        queue!(self.out, Show)?;
        self.out.flush()
    }

    #[cfg(test)]
    fn output(&self) -> &W {
        &self.out
    }
}

impl<W: Write> Drop for TerminalCanvas<W> {
    fn drop(&mut self) {
        let _ = self.restore();
    }
}
