use anyhow::Context;
use crossterm::{
    ExecutableCommand, cursor,
    terminal::{self, ClearType},
};
use std::io::{Stdout, Write, stdout};
use tracing::debug;

/// Smallest terminal that fits a two-cell-tall canvas row plus the status row.
pub const MIN_SIZE: (u16, u16) = (4, 2);

/// Ends synchronized output, re-enables autowrap and resets attributes, in
/// case a frame was interrupted between its begin and finish escapes.
pub const RESET_FRAME_STATE: &[u8] = b"\x1b[?2026l\x1b[?7h\x1b[0m";

/// Raw mode and the alternate screen for as long as the guard lives.
pub struct TerminalGuard {
    initial_size: (u16, u16),
}

impl TerminalGuard {
    /// Takes over the terminal and fails if it is too small to present into.
    /// On failure the terminal is restored before the error returns.
    pub fn enter() -> anyhow::Result<Self> {
        terminal::enable_raw_mode().context("enable raw mode")?;
        let mut guard = Self { initial_size: (0, 0) };

        let mut out = stdout();
        out.execute(terminal::EnterAlternateScreen)
            .context("enter alternate screen")?;
        out.execute(terminal::Clear(ClearType::All))
            .context("clear screen")?;
        out.execute(cursor::Hide).context("hide cursor")?;

        guard.initial_size = Self::size()?;
        check_size(guard.initial_size)?;
        debug!(cols = guard.initial_size.0, rows = guard.initial_size.1, "terminal taken over");
        Ok(guard)
    }

    pub fn initial_size(&self) -> (u16, u16) {
        self.initial_size
    }

    pub fn stdout() -> Stdout {
        stdout()
    }

    pub fn size() -> anyhow::Result<(u16, u16)> {
        terminal::size().context("get terminal size")
    }
}

pub fn check_size(size: (u16, u16)) -> anyhow::Result<()> {
    if size.0 < MIN_SIZE.0 || size.1 < MIN_SIZE.1 {
        anyhow::bail!(
            "terminal too small (need at least {}x{}, got {}x{})",
            MIN_SIZE.0,
            MIN_SIZE.1,
            size.0,
            size.1
        );
    }
    Ok(())
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
        let mut out = stdout();
        let _ = out.write_all(RESET_FRAME_STATE);
        let _ = out.flush();
        let _ = out.execute(cursor::Show);
        let _ = out.execute(terminal::LeaveAlternateScreen);
        debug!("terminal restored");
    }
}
