use std::io::{Stdout, stdout};

use anyhow::{Context, Result};
use crossterm::{
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::prelude::*;

pub type Tui = Terminal<CrosstermBackend<Stdout>>;

pub fn init() -> Result<Tui> {
    execute!(stdout(), EnterAlternateScreen).context("Failed to enter alternate screen")?;
    enable_raw_mode().context("Failed to enable raw mode")?;
    let backend = CrosstermBackend::new(stdout());
    Terminal::new(backend).context("Failed to create terminal")
}

pub fn restore() -> Result<()> {
    execute!(stdout(), LeaveAlternateScreen).context("Failed to leave alternate screen")?;
    disable_raw_mode().context("Failed to disable raw mode")?;
    Ok(())
}

/// Puts the terminal back before the default hook prints the panic, and
/// records the panic in the log file.
pub fn install_panic_hook() {
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let _ = restore();
        tracing::error!(%panic_info, "panicked");
        original_hook(panic_info);
    }));
}
