mod app;
mod config;
mod models;
mod store;
mod sync;
mod ui;

use std::fs::{self, OpenOptions};
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{self, EnterAlternateScreen, LeaveAlternateScreen},
};
use tracing::info;
use tracing_subscriber::EnvFilter;
use tui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};

use crate::app::App;
use crate::config::{Config, Settings, SettingsStore};
use crate::models::Project;
use crate::store::{LoadOutcome, ProjectStore};
use crate::sync::SyncClient;

/// Track R&D projects eligible for the CIR/CII tax credits.
#[derive(Debug, Parser)]
#[command(name = "cir-tracker", version, about)]
struct Cli {
    /// Settings file holding the persisted endpoint
    #[arg(long, value_name = "PATH")]
    settings: Option<PathBuf>,

    /// Use this endpoint for the session without saving it
    #[arg(long, value_name = "URL")]
    endpoint: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Interactive terminal interface (default)
    Tui,
    /// Print all projects
    List,
    /// Print project counts
    Stats,
    /// Show, set or clear the persisted endpoint
    Endpoint {
        /// New endpoint URL
        url: Option<String>,
        /// Switch back to local mode
        #[arg(long, conflicts_with = "url")]
        clear: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load()?;
    init_logging(&config);

    let settings_store = SettingsStore::new(match &cli.settings {
        Some(path) => path.clone(),
        None => config.settings_path()?,
    });
    let settings = settings_store.load()?;

    let session_endpoint = session_endpoint(
        cli.endpoint.as_deref(),
        config.endpoint.as_deref(),
        &settings,
    )?;
    info!(
        settings = %settings_store.path().display(),
        endpoint = session_endpoint.as_deref().unwrap_or("<local>"),
        "starting"
    );
    let store = ProjectStore::new(SyncClient::new(session_endpoint));

    match cli.command.unwrap_or(Command::Tui) {
        Command::Tui => run_tui(App::new(store, settings_store)).await,
        Command::List => print_projects(store).await,
        Command::Stats => print_stats(store).await,
        Command::Endpoint { url, clear } => {
            update_endpoint(&settings_store, settings, url, clear)
        }
    }
}

/// Endpoint for this run. The flag beats the environment, which beats the
/// settings file. Overrides are never written back.
fn session_endpoint(
    flag: Option<&str>,
    env: Option<&str>,
    settings: &Settings,
) -> Result<Option<String>> {
    match flag.or(env) {
        Some(raw) => Ok(Settings::parse_endpoint(raw)?),
        None => Ok(settings.endpoint.clone()),
    }
}

// A log file that cannot be opened leaves the run without logs rather than
// stopping it.
fn init_logging(config: &Config) {
    let path = config.log_file();
    if let Some(parent) = path.parent() {
        let _ = fs::create_dir_all(parent);
    }
    let file = match OpenOptions::new().create(true).append(true).open(&path) {
        Ok(file) => file,
        Err(err) => {
            eprintln!("Logging disabled: could not open {}: {err}", path.display());
            return;
        }
    };

    let filter =
        EnvFilter::try_new(config.log_filter()).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
}

async fn run_tui(mut app: App) -> Result<()> {
    // Setup terminal
    terminal::enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run the main app loop
    let result = run_app(&mut terminal, &mut app).await;

    // Restore terminal
    terminal::disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    // Show any error message
    if let Err(err) = &result {
        println!("Error: {err:#}");
    }

    result
}

async fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()> {
    let mut pending = Some(app.start());

    loop {
        terminal.draw(|f| app.render(f))?;

        // The busy status is on screen before the remote call starts.
        if let Some(command) = pending.take() {
            app.execute(command).await;
            continue;
        }

        if app.should_quit() {
            break;
        }

        if let Some(key) = ui::read_key()? {
            pending = app.handle_key(key);
            if app.should_quit() {
                break;
            }
        }
    }

    Ok(())
}

async fn load_for_print(store: &mut ProjectStore) -> Result<()> {
    if store.load().await.context("could not load projects")? == LoadOutcome::LocalOnly {
        eprintln!("No endpoint configured; local mode keeps no projects between runs.");
    }
    Ok(())
}

async fn print_projects(mut store: ProjectStore) -> Result<()> {
    load_for_print(&mut store).await?;
    print!("{}", format_table(store.projects()));
    Ok(())
}

async fn print_stats(mut store: ProjectStore) -> Result<()> {
    load_for_print(&mut store).await?;
    let stats = store.stats();
    println!("Total:            {}", stats.total);
    println!("CIR potential:    {}", stats.cir_potential);
    println!("CII potential:    {}", stats.cii_potential);
    println!("Well documented:  {}", stats.well_documented);
    Ok(())
}

fn update_endpoint(
    settings_store: &SettingsStore,
    mut settings: Settings,
    url: Option<String>,
    clear: bool,
) -> Result<()> {
    if clear {
        settings.endpoint = None;
    } else if let Some(raw) = url {
        settings.endpoint = Settings::parse_endpoint(&raw)?;
    } else {
        match &settings.endpoint {
            Some(endpoint) => println!("{endpoint}"),
            None => println!("(local mode)"),
        }
        return Ok(());
    }

    settings_store.save(&settings)?;
    match &settings.endpoint {
        Some(endpoint) => println!("Endpoint set to {endpoint}"),
        None => println!("Switched to local mode"),
    }
    Ok(())
}

fn format_table(projects: &[Project]) -> String {
    let headers = ["ID", "SUBJECT", "LEAD", "TYPE", "TEAM", "QUALITY"];
    let rows: Vec<[String; 6]> = projects
        .iter()
        .map(|p| {
            [
                p.id.clone(),
                p.subject.clone(),
                p.lead.clone(),
                p.kind.label().to_string(),
                p.team.clone(),
                p.quality.label().to_string(),
            ]
        })
        .collect();

    let mut widths = headers.map(str::len);
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    let mut push_line = |cells: Vec<&str>| {
        let line: Vec<String> = cells
            .iter()
            .zip(widths)
            .map(|(cell, width)| format!("{cell:<width$}"))
            .collect();
        out.push_str(line.join("  ").trim_end());
        out.push('\n');
    };

    push_line(headers.to_vec());
    for row in &rows {
        push_line(row.iter().map(String::as_str).collect());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ProjectType;

    #[test]
    fn cli_parses_subcommands() {
        let cli = Cli::try_parse_from(["cir-tracker", "--endpoint", "http://x", "stats"]).unwrap();
        assert_eq!(cli.endpoint.as_deref(), Some("http://x"));
        assert!(matches!(cli.command, Some(Command::Stats)));

        let cli = Cli::try_parse_from(["cir-tracker", "endpoint", "--clear"]).unwrap();
        assert!(matches!(cli.command, Some(Command::Endpoint { url: None, clear: true })));

        let both = Cli::try_parse_from(["cir-tracker", "endpoint", "http://x", "--clear"]);
        assert!(both.is_err());
    }

    #[test]
    fn table_aligns_columns() {
        let mut project = Project::with_id("1");
        project.subject = "Algo X".into();
        project.kind = ProjectType::Mixte;

        let table = format_table(&[project]);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("ID  SUBJECT  LEAD  TYPE"));
        assert!(lines[1].starts_with("1   Algo X         Mixte"));
    }

    #[test]
    fn endpoint_command_persists() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("settings.json"));

        let url = Some(" https://api.example.org ".to_string());
        update_endpoint(&store, Settings::default(), url, false).unwrap();
        let saved = store.load().unwrap();
        assert_eq!(saved.endpoint.as_deref(), Some("https://api.example.org"));

        update_endpoint(&store, saved, None, true).unwrap();
        assert!(store.load().unwrap().is_local());
    }

    #[test]
    fn endpoint_flag_beats_env_beats_settings() {
        let persisted = Settings {
            endpoint: Some("https://saved.example.org".into()),
        };

        let flag = Some("https://flag.example.org");
        let env = Some("https://env.example.org");

        let resolved = session_endpoint(flag, env, &persisted).unwrap();
        assert_eq!(resolved.as_deref(), Some("https://flag.example.org"));

        let resolved = session_endpoint(None, env, &persisted).unwrap();
        assert_eq!(resolved.as_deref(), Some("https://env.example.org"));

        let resolved = session_endpoint(None, None, &persisted).unwrap();
        assert_eq!(resolved.as_deref(), Some("https://saved.example.org"));

        assert_eq!(session_endpoint(None, None, &Settings::default()).unwrap(), None);
        assert!(session_endpoint(Some("not a url"), None, &persisted).is_err());
    }

    #[test]
    fn session_override_is_not_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join("settings.json"));
        let persisted = Settings {
            endpoint: Some("https://saved.example.org".into()),
        };
        store.save(&persisted).unwrap();
        let before = fs::read_to_string(store.path()).unwrap();

        let settings = store.load().unwrap();
        let resolved = session_endpoint(Some("https://flag.example.org"), None, &settings).unwrap();
        assert_eq!(resolved.as_deref(), Some("https://flag.example.org"));

        assert_eq!(fs::read_to_string(store.path()).unwrap(), before);
        assert_eq!(store.load().unwrap(), persisted);
    }
}
