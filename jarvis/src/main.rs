//! Jarvis CLI entry point

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use clap::Parser;
use eyre::{Context as _, Result};
use tracing::{error, info};

use jarvis::api::ApiClient;
use jarvis::cli::{AdminCommand, Cli, Command, ListCommand, NewCommand};
use jarvis::commands::{self, Context};
use jarvis::config::{Config, Profile};
use jarvis::editor::{Editor, ProcessEditor};
use jarvis::prompt::ReadlinePrompt;

fn setup_logging(level: Option<&str>) -> Result<()> {
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("jarvis")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    // Logs go to a file; stdout belongs to command output
    let parsed = level.map(|l| l.parse::<tracing::Level>());
    let level = match parsed {
        Some(Ok(level)) => level,
        Some(Err(_)) => {
            eprintln!("Unknown log level {:?}, using info", level.unwrap_or_default());
            tracing::Level::INFO
        }
        None => tracing::Level::INFO,
    };
    let log_file = fs::File::create(log_dir.join("jarvis.log")).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {})", level);
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config_path = Config::resolve_path(cli.config.as_ref())?;

    // --log-level wins over the config file
    let level = cli.log_level.clone().or_else(|| Config::load_log_level(&config_path));
    setup_logging(level.as_deref()).context("Failed to setup logging")?;

    let result = run(cli, &config_path);
    if let Err(e) = &result {
        error!(error = %e, "command failed");
    }
    result
}

fn run(cli: Cli, config_path: &Path) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut prompt = ReadlinePrompt::new();

    // init has to work before there is a config to load
    if let Command::Init = cli.command {
        return commands::init(&mut prompt, &mut out, config_path, &cli.environment);
    }

    let config = Config::load(config_path)?;
    let profile = Profile::new(&config, &cli.environment, config_path)?;
    let client = ApiClient::connect(&profile.base_url).context("Failed to create API client")?;
    let editor = ProcessEditor::new(&profile.editor)?;
    let viewer = profile.viewer.as_deref().map(ProcessEditor::new).transpose()?;

    let mut ctx = Context {
        profile: &profile,
        client: &client,
        editor: &editor,
        viewer: viewer.as_ref().map(|v| v as &dyn Editor),
        prompt: &mut prompt,
        out: &mut out,
    };

    match cli.command {
        Command::New { resource } => match resource {
            NewCommand::Log { event } => commands::new_log(&mut ctx, event.as_deref()),
            NewCommand::Tag { name } => commands::new_tag(&mut ctx, &name),
            NewCommand::Event => commands::new_event(&mut ctx),
        },
        Command::Edit { resource } => commands::edit_resource(&mut ctx, resource.kind(), resource.id()),
        Command::Show { resource } => commands::show_resource(&mut ctx, resource.kind(), resource.id()),
        Command::List { listing } => match listing {
            ListCommand::Logs { tag, search } => commands::list_logs(&mut ctx, tag.as_deref(), search.as_deref()),
            ListCommand::Tags { name, assoc } => commands::list_tags(&mut ctx, name.as_deref(), assoc.as_deref()),
            ListCommand::Events { category, weight } => commands::list_events(&mut ctx, category, weight),
        },
        Command::Summary => commands::summary(&mut ctx),
        Command::Admin { command } => match command {
            AdminCommand::Backup => commands::backup(&mut ctx),
            AdminCommand::Restore { snapshot } => commands::restore(&mut ctx, &snapshot),
            AdminCommand::Migrate { kind, to } => {
                let target = Profile::new(&config, &to, config_path)?;
                let target = ApiClient::connect(&target.base_url).context("Failed to create API client")?;
                commands::migrate(&mut ctx, kind.resource(), &target)
            }
        },
        Command::Init => Ok(()),
    }?;

    out.flush()?;
    Ok(())
}
