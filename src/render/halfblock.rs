use crate::render::{Frame, Presenter, begin, downsample, finish};
use std::io::Write;

const UPPER_HALF: char = '\u{2580}';

/// Two canvas rows per terminal row: foreground paints the top half,
/// background the bottom.
pub struct HalfBlockPresenter {
    cells: Vec<[u8; 3]>,
}

impl HalfBlockPresenter {
    pub fn new() -> Self {
        Self { cells: Vec::new() }
    }
}

impl Default for HalfBlockPresenter {
    fn default() -> Self {
        Self::new()
    }
}

impl Presenter for HalfBlockPresenter {
    fn name(&self) -> &'static str {
        "halfblock"
    }

    fn present(&mut self, frame: &Frame<'_>, out: &mut dyn Write) -> anyhow::Result<()> {
        let cols = frame.term_cols as usize;
        let rows = frame.visual_rows as usize;
        if cols == 0 || rows == 0 {
            return Ok(());
        }
        downsample(frame.raster, cols, rows * 2, &mut self.cells);
        if self.cells.len() < cols * rows * 2 {
            return Ok(());
        }

        begin(frame, out)?;
        let mut last_fg = None;
        let mut last_bg = None;
        for row in 0..rows {
            for col in 0..cols {
                let top = self.cells[row * 2 * cols + col];
                let bot = self.cells[(row * 2 + 1) * cols + col];
                if last_fg != Some(top) {
                    write!(out, "\x1b[38;2;{};{};{}m", top[0], top[1], top[2])?;
                    last_fg = Some(top);
                }
                if last_bg != Some(bot) {
                    write!(out, "\x1b[48;2;{};{};{}m", bot[0], bot[1], bot[2])?;
                    last_bg = Some(bot);
                }
                write!(out, "{UPPER_HALF}")?;
            }
            out.write_all(b"\r\n")?;
        }
        finish(frame, out)
    }
}
