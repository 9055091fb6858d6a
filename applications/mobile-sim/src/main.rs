/// Soul Mobile Simulator - drive the playback service from a terminal
use clap::Parser;
use soul_mobile_sim::{
    command::{Command, HELP},
    console::{self, Console},
    SimConfig,
};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "soul-mobile-sim")]
#[command(about = "Soul Player Mobile playback on a simulated device", long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "SOUL_CONFIG")]
    config: Option<PathBuf>,

    /// Session file (overrides session.file)
    #[arg(short, long)]
    session: Option<PathBuf>,

    /// Keep the selection in memory only
    #[arg(long)]
    ephemeral: bool,

    /// Tracks for a new playlist; omit to reopen the session file
    tracks: Vec<String>,
}

fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "soul_playback=info,soul_mobile_sim=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let cli = Cli::parse();

    let mut config = SimConfig::load(cli.config.as_deref())?;
    if let Some(session) = cli.session {
        config.session.file = session;
    }
    if cli.ephemeral {
        config.session.ephemeral = true;
    }

    let tracks = cli
        .tracks
        .iter()
        .map(|path| console::track_from_path(path))
        .collect();

    let console = Console::start(&config, tracks)?;
    tracing::info!("Type 'help' for commands");

    // Print observer events as they arrive; ends when the service stops
    let notifications = console.handle().notifications().clone();
    let printer = std::thread::Builder::new()
        .name("soul-sim-events".to_string())
        .spawn(move || {
            for event in notifications.iter() {
                println!("  * {}", console::describe_event(&event));
            }
        })?;

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    for line in stdin.lock().lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        match line.parse::<Command>() {
            Ok(Command::Quit) => break,
            Ok(Command::Help) => println!("{}", HELP),
            Ok(command) => match console.execute(&command) {
                Ok(Some(output)) => println!("{}", output),
                Ok(None) => {}
                Err(e) => println!("error: {}", e),
            },
            Err(e) => println!("{} (try 'help')", e),
        }
        stdout.flush()?;
    }

    console.shutdown()?;
    if printer.join().is_err() {
        tracing::warn!("Event printer panicked");
    }

    Ok(())
}
