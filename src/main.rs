use std::fs::{self, File};
use std::panic;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use clap::Parser;
use tokio::sync::mpsc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use issuedash::action::Action;
use issuedash::app::App;
use issuedash::config::Config;
use issuedash::event::Event;
use issuedash::forge::Forge;
use issuedash::github::GitHub;
use issuedash::route::Route;
use issuedash::tui::{self, EventHandler};
use issuedash::ui;

/// Look up GitHub repositories and browse their issues
#[derive(Debug, Parser)]
#[command(name = "issuedash", version, about)]
struct Cli {
    /// Where to start: `owner/repo`, `owner/repo#123` or a path like `/issues/owner/repo`
    target: Option<String>,

    /// GitHub REST API base URL
    #[arg(long, value_name = "URL")]
    api_url: Option<String>,

    /// Config file to use instead of the default location
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

fn log_file() -> Option<File> {
    let dir = dirs::cache_dir()?.join("issuedash");
    fs::create_dir_all(&dir).ok()?;
    File::create(dir.join("issuedash.log")).ok()
}

fn init_logging(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.log_filter()));

    // The terminal is ours while running, so logs only go to a file.
    let Some(file) = log_file() else {
        return;
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(Mutex::new(file))
                .with_ansi(false),
        )
        .init();
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(url) = cli.api_url {
        config.api.base_url = url;
    }
    init_logging(&config);

    let github = GitHub::new(&config.api)?;
    let route = cli
        .target
        .as_deref()
        .map(Route::from_target)
        .unwrap_or(Route::Home);
    tracing::info!(api = %config.api.base_url, %route, "starting");

    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        let _ = tui::restore();
        original_hook(panic_info);
    }));

    let result = run(Arc::new(github), route).await;

    tui::restore()?;

    result
}

async fn run(forge: Arc<dyn Forge>, route: Route) -> Result<(), Box<dyn std::error::Error>> {
    let mut terminal = tui::init()?;

    let (action_tx, mut action_rx) = mpsc::unbounded_channel::<Action>();

    let mut app = App::new(forge, action_tx.clone());
    app.start(route);

    let tick_rate = Duration::from_millis(100);
    let render_rate = Duration::from_millis(16);
    let mut events = EventHandler::new(tick_rate, render_rate);

    loop {
        tokio::select! {
            Some(event) = events.next() => {
                if event.is_quit() {
                    break;
                }

                match event {
                    Event::Render | Event::Resize => {
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
