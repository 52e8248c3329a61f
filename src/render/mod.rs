mod ascii;
mod halfblock;

pub use ascii::AsciiPresenter;
pub use halfblock::HalfBlockPresenter;

use crate::config::PresenterMode;
use crate::surface::{Raster, Surface};
use std::io::Write;

/// Everything a presenter needs to put one canvas on the terminal.
pub struct Frame<'a> {
    pub term_cols: u16,
    pub visual_rows: u16,
    pub raster: &'a Raster,
    pub status: &'a str,
    pub status_rows: u16,
    pub sync_updates: bool,
}

pub trait Presenter {
    fn name(&self) -> &'static str;
    fn present(&mut self, frame: &Frame<'_>, out: &mut dyn Write) -> anyhow::Result<()>;
}

pub fn make_presenter(mode: PresenterMode) -> Box<dyn Presenter> {
    match mode {
        PresenterMode::HalfBlock => Box::new(HalfBlockPresenter::new()),
        PresenterMode::Ascii => Box::new(AsciiPresenter::new()),
    }
}

/// Box-averages the raster onto a `cols`×`rows` grid of RGB cells.
pub fn downsample(raster: &Raster, cols: usize, rows: usize, out: &mut Vec<[u8; 3]>) {
    out.clear();
    let (w, h) = (raster.width(), raster.height());
    if cols == 0 || rows == 0 || w == 0 || h == 0 {
        return;
    }
    let px = raster.pixels();
    for row in 0..rows {
        let y0 = row * h / rows;
        let y1 = ((row + 1) * h / rows).max(y0 + 1).min(h);
        for col in 0..cols {
            let x0 = col * w / cols;
            let x1 = ((col + 1) * w / cols).max(x0 + 1).min(w);
            let mut acc = [0u32; 3];
            for y in y0..y1 {
                for x in x0..x1 {
                    let i = (y * w + x) * 4;
                    acc[0] += px[i] as u32;
                    acc[1] += px[i + 1] as u32;
                    acc[2] += px[i + 2] as u32;
                }
            }
            let n = ((y1 - y0) * (x1 - x0)).max(1) as u32;
            out.push([(acc[0] / n) as u8, (acc[1] / n) as u8, (acc[2] / n) as u8]);
        }
    }
}

pub(crate) fn luma_u8(r: u8, g: u8, b: u8) -> u8 {
    ((r as u32 * 54 + g as u32 * 183 + b as u32 * 19) >> 8) as u8
}

pub(crate) fn begin(frame: &Frame<'_>, out: &mut dyn Write) -> anyhow::Result<()> {
    if frame.sync_updates {
        out.write_all(b"\x1b[?2026h")?;
    }
    // Home, reset, and no autowrap while full-width rows are painted.
    out.write_all(b"\x1b[H\x1b[0m\x1b[?7l")?;
    Ok(())
}

pub(crate) fn finish(frame: &Frame<'_>, out: &mut dyn Write) -> anyhow::Result<()> {
    let cols = frame.term_cols as usize;
    let mut lines = frame.status.lines();
    for i in 0..frame.status_rows as usize {
        write!(out, "\x1b[{};1H\x1b[0m\x1b[2K", frame.visual_rows as usize + i + 1)?;
        if let Some(line) = lines.next() {
            let clipped: String = line.chars().take(cols).collect();
            out.write_all(clipped.as_bytes())?;
        }
    }
    out.write_all(b"\x1b[?7h")?;
    if frame.sync_updates {
        out.write_all(b"\x1b[?2026l")?;
    }
    out.flush()?;
    Ok(())
}
