use anyhow::Result;
use crossterm::{
    event::{self, DisableMouseCapture, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::prelude::{CrosstermBackend, Terminal};
use std::io;

use authgate::auth::{AuthClient, AuthFlow, AuthTui};
use authgate::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    env_logger::init();

    let config = Config::load()?;

    // Set up panic hook so a panic never strands the terminal in raw
    // mode with the message swallowed by the alternate screen
    std::panic::set_hook(Box::new(|panic_info| {
        restore_terminal();
        eprintln!("PANIC: {:?}", panic_info);
        if let Some(location) = panic_info.location() {
            eprintln!(
                "PANIC LOCATION: {}:{}:{}",
                location.file(),
                location.line(),
                location.column()
            );
        }
        std::process::exit(1);
    }));

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, DisableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run the application
    let result = run_app(&mut terminal, config).await;

    // Restore terminal
    restore_terminal();
    terminal.show_cursor()?;

    // Handle any errors
    if let Err(err) = result {
        eprintln!("Application error: {:?}", err);
    }

    Ok(())
}

// Safe to call whether or not the terminal was ever switched over;
// also runs inside the panic hook, so it must not fail.
fn restore_terminal() {
    let _ = disable_raw_mode();
    let _ = execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture);
}

async fn run_app<B: ratatui::prelude::Backend>(
    terminal: &mut Terminal<B>,
    config: Config,
) -> Result<()> {
    let client = AuthClient::new(&config.server_url);
    log::info!("Auth server: {}", client.base_url());

    let mut flow = AuthFlow::new(client);
    if let Some(token) = &config.reset_token {
        flow = flow.with_reset_token(token);
    }
    let mut tui = AuthTui::new(flow);

    loop {
        terminal.draw(|f| tui.render(f, f.area()))?;

        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }

            // Handle quit
            if key.modifiers.contains(KeyModifiers::CONTROL)
                && matches!(key.code, KeyCode::Char('c') | KeyCode::Char('q'))
            {
                return Ok(());
            }

            tui.handle_input(key).await?;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn restore_terminal_is_safe_outside_raw_mode() {
        // The panic hook may fire before the terminal was set up.
        restore_terminal();
        restore_terminal();
    }
}
