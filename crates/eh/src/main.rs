use clap::{Parser, Subcommand};
use eh_core::EventHub;
use eh_db::DbStore;
use eh_serve::AppState;
use eh_serve::config::Config;
use owo_colors::OwoColorize;
use std::path::Path;
use std::process::ExitCode;
use tracing::{error, info};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser)]
#[command(name = "eh", about = "Tech events catalog and booking server")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server.
    Serve,
    /// Print the OpenAPI document.
    Openapi,
    /// List stored events, newest first.
    Events {
        /// Emit JSON instead of a table.
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "eh=info,eh_serve=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Command::Serve => serve().await,
        Command::Openapi => {
            println!("{}", eh_serve::openapi::generate_spec());
            Ok(())
        }
        Command::Events { json } => list_events(json),
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("{} {message}", "error:".red().bold());
            ExitCode::FAILURE
        }
    }
}

async fn serve() -> Result<(), String> {
    let config = Config::load().map_err(|err| err.to_string())?;
    ensure_parent(&config.db_path)?;
    info!(
        db_path = %config.db_path,
        addr = %config.addr(),
        assets = ?config.assets,
        "starting evhub"
    );
    let state = AppState::from_config(config).map_err(|err| err.to_string())?;
    eh_serve::serve(state).await.map_err(|err| {
        error!(error = %err, "server stopped");
        err.to_string()
    })
}

fn list_events(json: bool) -> Result<(), String> {
    let config = Config::load().map_err(|err| err.to_string())?;
    ensure_parent(&config.db_path)?;
    let conn = eh_db::schema::open_and_migrate(&config.db_path).map_err(|err| err.to_string())?;
    let hub = EventHub::new(DbStore::new(conn));
    let events = hub.events().list().map_err(|err| err.to_string())?;

    if json {
        let text = serde_json::to_string_pretty(&events).map_err(|err| err.to_string())?;
        println!("{text}");
        return Ok(());
    }
    if events.is_empty() {
        println!("{}", "No events available yet".dimmed());
        return Ok(());
    }
    for event in &events {
        let bookings = hub
            .bookings()
            .count_for_event(&event.id)
            .map_err(|err| err.to_string())?;
        println!(
            "{}  {}  {} {}  {}  {}",
            event.date.to_string().cyan(),
            event.time.cyan(),
            event.title.bold(),
            format!("({})", event.slug).dimmed(),
            event.mode.to_string().yellow(),
            format!("{bookings} booked").green(),
        );
    }
    Ok(())
}

fn ensure_parent(path: &str) -> Result<(), String> {
    match Path::new(path).parent() {
        Some(parent) if !parent.as_os_str().is_empty() => std::fs::create_dir_all(parent)
            .map_err(|err| format!("failed to create {}: {err}", parent.display())),
        _ => Ok(()),
    }
}
