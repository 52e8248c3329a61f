use crate::render::{Frame, Presenter, begin, downsample, finish, luma_u8};
use std::io::Write;

// Dark to bright.
const RAMP: &[u8] = b" .,:;irsXA253hMHGS#9B&@";

pub struct AsciiPresenter {
    cells: Vec<[u8; 3]>,
}

impl AsciiPresenter {
    pub fn new() -> Self {
        Self { cells: Vec::new() }
    }
}

impl Default for AsciiPresenter {
    fn default() -> Self {
        Self::new()
    }
}

impl Presenter for AsciiPresenter {
    fn name(&self) -> &'static str {
        "ascii"
    }

    fn present(&mut self, frame: &Frame<'_>, out: &mut dyn Write) -> anyhow::Result<()> {
        let cols = frame.term_cols as usize;
        let rows = frame.visual_rows as usize;
        if cols == 0 || rows == 0 {
            return Ok(());
        }
        downsample(frame.raster, cols, rows, &mut self.cells);
        if self.cells.len() < cols * rows {
            return Ok(());
        }

        begin(frame, out)?;
        let mut last_fg = None;
        for row in self.cells.chunks_exact(cols).take(rows) {
            for &[r, g, b] in row {
                let l = luma_u8(r, g, b) as usize;
                let ch = RAMP[l * (RAMP.len() - 1) / 255];
                if last_fg != Some((r, g, b)) {
                    write!(out, "\x1b[38;2;{};{};{}m", r, g, b)?;
                    last_fg = Some((r, g, b));
                }
                out.write_all(&[ch])?;
            }
            out.write_all(b"\r\n")?;
        }
        finish(frame, out)
    }
}
