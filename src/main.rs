//! Eugene - a terminal chat front-end for local government questions.

use std::io;

use anyhow::{Context, Result};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::{info, warn};

use eugene_chat::app::{mask_api_key, App};
use eugene_chat::config::Config;
use eugene_chat::llm::{LlmConfig, Provider};
use eugene_chat::{input, logging};

fn main() -> Result<()> {
    // A missing .env file is fine
    dotenvy::dotenv().ok();

    let config = Config::load();

    if let Some(path) = logging::default_log_path() {
        if let Err(err) = logging::init(&path) {
            eprintln!("Logging disabled: {:#}", err);
        }
    }
    log_key_detection(&config);

    let runtime = tokio::runtime::Runtime::new().context("starting async runtime")?;
    let _guard = runtime.enter();

    let mut app = App::new_with_config(&config);

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = input::run_app(&mut terminal, &mut app, &config);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("Error: {:?}", err);
    }

    info!("exiting");
    Ok(())
}

/// Record which provider keys were found, masked.
fn log_key_detection(config: &Config) {
    for &provider in Provider::all() {
        let llm = LlmConfig::from_env_and_config(provider, Some(&config.llm));
        if llm.is_configured() {
            info!(
                provider = provider.display_name(),
                key = %mask_api_key(&llm.api_key),
                base = %llm.api_base,
                "API key detected"
            );
        } else {
            warn!(
                provider = provider.display_name(),
                "{} not set",
                provider.env_var_name()
            );
        }
    }
}
