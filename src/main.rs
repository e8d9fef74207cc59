pub mod api;
pub mod app;
pub mod common;
pub mod config;
pub mod event;
pub mod logging;
pub mod pages;
pub mod settings;
pub mod tui;
pub mod ui;

use anyhow::Result;
use api::osf::OsfClient;
use app::App;
use config::Config;
use event::EventHandler;
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env().unwrap_or_else(|e| {
        eprintln!("Failed to load config: {:#}", e);
        std::process::exit(1);
    });

    logging::init_tracing(config.log_path.as_deref());

    let client = match OsfClient::new(config.api.clone(), config.page.clone()) {
        Ok(client) => Some(client),
        Err(e) => {
            tracing::error!(error = %e, "could not create API client");
            None
        }
    };

    let mut terminal = tui::init()?;
    tui::install_panic_hook();

    let mut app = App::new(client, config.api, config.page);

    let tick_rate = Duration::from_millis(250);
    let mut events = EventHandler::new(tick_rate);

    let res = app.run(&mut terminal, &mut events).await;

    tui::restore()?;

    if let Err(err) = res {
        println!("{err:?}");
    }

    Ok(())
}
