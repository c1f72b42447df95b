mod action;
mod app;
mod config;
mod controller;
mod error;
mod event;
mod fetcher;
mod icons;
mod reddit;
mod renderer;
mod trigger;
mod tui;
mod types;
mod ui;

use std::panic;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use clap::Parser;
use tokio::sync::mpsc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::action::Action;
use crate::app::App;
use crate::config::Config;
use crate::event::Event;
use crate::reddit::Reddit;
use crate::trigger::TriggerStrategy;
use crate::tui::EventHandler;

#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// Config file to use instead of the default location
    #[arg(long)]
    config: Option<PathBuf>,

    /// Feed host, e.g. https://www.reddit.com
    #[arg(long)]
    base_url: Option<String>,

    /// Posts requested per page
    #[arg(long)]
    page_size: Option<u32>,

    /// How the end of the feed is detected
    #[arg(long, value_enum)]
    trigger: Option<TriggerStrategy>,

    /// Replay one trigger that arrives while a page is loading
    #[arg(long)]
    coalesce: bool,

    /// Ignore load triggers for this long after a failed fetch
    #[arg(long)]
    failure_cooldown_ms: Option<u64>,

    /// Write logs to this file (the terminal is taken over by the UI)
    #[arg(long)]
    log_file: Option<PathBuf>,
}

impl Cli {
    fn apply(&self, mut config: Config) -> Config {
        if let Some(base_url) = &self.base_url {
            config.feed.base_url = base_url.clone();
        }
        if let Some(page_size) = self.page_size {
            config.feed.page_size = page_size;
        }
        if let Some(trigger) = self.trigger {
            config.loading.trigger = trigger;
        }
        if self.coalesce {
            config.loading.coalesce_triggers = true;
        }
        if let Some(ms) = self.failure_cooldown_ms {
            config.loading.failure_cooldown_ms = ms;
        }
        config.normalized()
    }
}

fn init_logging(log_file: Option<&PathBuf>) -> std::io::Result<()> {
    match log_file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)?;
            tracing_subscriber::registry()
                .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_ansi(false)
                        .with_writer(Mutex::new(file)),
                )
                .init();
        }
        None => {
            tracing_subscriber::registry()
                .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("off")))
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    init_logging(cli.log_file.as_ref())?;

    let config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::load(),
    };
    let config = cli.apply(config);

    // Set up panic hook to restore terminal
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        let _ = tui::restore();
        original_hook(panic_info);
    }));

    let reddit = Arc::new(Reddit::new(
        &config.feed.base_url,
        config.feed.page_size,
        &config.feed.user_agent,
    )?);

    tracing::info!(
        base_url = %config.feed.base_url,
        page_size = config.feed.page_size,
        trigger = ?config.loading.trigger,
        "starting feed session"
    );

    // Run the application
    let result = run(reddit, config).await;

    // Restore terminal
    tui::restore()?;

    result
}

async fn run(reddit: Arc<Reddit>, config: Config) -> Result<(), Box<dyn std::error::Error>> {
    // Initialize terminal
    let mut terminal = tui::init()?;

    // Create action channel
    let (action_tx, mut action_rx) = mpsc::unbounded_channel::<Action>();

    let mut app = App::new(
        reddit.clone(),
        reddit,
        config.loading.trigger,
        config.controller_options(),
        config.feed.base_url.clone(),
        action_tx.clone(),
    );

    let size = terminal.size()?;
    app.update(Action::Resize(size.width, size.height));

    // Create event handler
    let tick_rate = Duration::from_millis(250);
    let render_rate = Duration::from_millis(16); // ~60fps
    let mut events = EventHandler::new(tick_rate, render_rate);

    // Main loop
    loop {
        tokio::select! {
            Some(event) = events.next() => {
                if event.is_quit() {
                    break;
                }

                match event {
                    Event::Render => {
                        terminal.draw(|frame| ui::render(frame, &app))?;
                    }
                    _ => {
                        let action = app.handle_event(event);
                        if !matches!(action, Action::None) {
                            action_tx.send(action)?;
                        }
                    }
                }
            }
            Some(action) = action_rx.recv() => {
                app.update(action);
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}
