//! CLI tool for generating roadmap slides from Linear.

mod deck;
mod http;
mod outbox;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use deck::DeckDocument;
use http::HttpImageFetcher;
use outbox::OutboxNotifier;
use roadmap_core::canvas::Size;
use roadmap_core::outline::{format_outline, outline};
use roadmap_core::{
    send_reminders, sync_roadmap, update_project_slide, Settings, StalePolicy, SyncContext,
};
use roadmap_linear::LinearClient;
use std::path::{Path, PathBuf};

/// Generate roadmap slides from Linear initiatives and projects.
#[derive(Parser, Debug)]
#[command(name = "roadmap-slides")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Deck document to read and update
    #[arg(short, long, global = true, default_value = "deck.json")]
    deck: PathBuf,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create an empty deck document
    Init {
        /// Presentation id (scopes the slide caches)
        #[arg(long)]
        id: String,

        /// Presentation URL used for slide links
        #[arg(long)]
        url: String,

        /// Page width in points
        #[arg(long, default_value = "720")]
        width: f64,

        /// Page height in points
        #[arg(long, default_value = "405")]
        height: f64,

        /// Replace an existing deck document
        #[arg(long)]
        force: bool,
    },

    /// Create or refresh every agenda, initiative and project slide
    Sync {
        #[command(flatten)]
        linear: LinearArgs,

        /// Skip per-project slides regardless of the stored setting
        #[arg(long)]
        without_projects: bool,

        /// Recreate slides that were deleted from the deck
        #[arg(long)]
        recreate_stale: bool,
    },

    /// Redraw the slide of one project
    UpdateProject {
        /// Linear project id
        project_id: String,

        #[command(flatten)]
        linear: LinearArgs,

        /// Recreate the slide if it was deleted from the deck
        #[arg(long)]
        recreate_stale: bool,
    },

    /// Write a reminder email for every project lead
    Email {
        #[command(flatten)]
        linear: LinearArgs,

        /// Directory receiving one HTML file per recipient
        #[arg(short, long, default_value = "outbox")]
        outbox: PathBuf,
    },

    /// Show or change the deck settings
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Print the text of every slide in reading order
    Outline,
}

#[derive(clap::Args, Debug)]
struct LinearArgs {
    /// Linear API key
    #[arg(long, env = "LINEAR_API_KEY", hide_env_values = true)]
    api_key: Option<String>,
}

impl LinearArgs {
    fn client(&self) -> Result<LinearClient> {
        match self.api_key.as_deref().map(str::trim) {
            Some(key) if !key.is_empty() => Ok(LinearClient::new(key)),
            _ => bail!("No Linear API key: pass --api-key or set LINEAR_API_KEY"),
        }
    }
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Print the current settings
    Show,

    /// Change one setting
    Set { key: String, value: String },
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    if args.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    }

    match &args.command {
        Command::Init {
            id,
            url,
            width,
            height,
            force,
        } => init(&args.deck, id, url, Size::new(*width, *height), *force),
        Command::Sync {
            linear,
            without_projects,
            recreate_stale,
        } => sync(&args.deck, linear, *without_projects, *recreate_stale),
        Command::UpdateProject {
            project_id,
            linear,
            recreate_stale,
        } => update_project(&args.deck, linear, project_id, *recreate_stale),
        Command::Email { linear, outbox } => email(&args.deck, linear, outbox),
        Command::Config { action } => config(&args.deck, action),
        Command::Outline => {
            let deck = DeckDocument::load(&args.deck)?;
            println!("{}", format_outline(&outline(&deck.canvas)));
            Ok(())
        }
    }
}

fn stale_policy(recreate: bool) -> StalePolicy {
    if recreate {
        StalePolicy::Recreate
    } else {
        StalePolicy::Fail
    }
}

fn init(path: &Path, id: &str, url: &str, page_size: Size, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!("{} already exists (use --force to replace it)", path.display());
    }
    if !(page_size.width > 0.0 && page_size.height > 0.0) {
        bail!("Page size must be positive");
    }
    let mut deck = DeckDocument::new(id, url, page_size);
    Settings::default()
        .save(&mut deck.properties)
        .context("Failed to store default settings")?;
    deck.save(path)?;
    eprintln!("Created {}", path.display());
    Ok(())
}

fn sync(
    path: &Path,
    linear: &LinearArgs,
    without_projects: bool,
    recreate_stale: bool,
) -> Result<()> {
    let client = linear.client()?;
    let fetcher = HttpImageFetcher::new()?;
    let mut deck = DeckDocument::load(path)?;

    let report = sync_roadmap(
        SyncContext {
            canvas: &mut deck.canvas,
            store: &mut deck.properties,
            fetcher: &fetcher,
            now: Utc::now(),
            stale_policy: stale_policy(recreate_stale),
        },
        &client,
        without_projects.then_some(false),
    )
    .context("Sync failed")?;
    deck.save(path)?;

    eprintln!(
        "Drew {} slides ({} new) for {} initiatives and {} projects",
        report.slides_populated, report.slides_created, report.initiatives, report.projects
    );
    for failure in &report.failures {
        eprintln!(
            "  {} slide for {} failed: {}",
            failure.kind.tag(),
            failure.entity_id,
            failure.error
        );
    }
    if !report.is_success() {
        bail!("{} slides could not be drawn", report.failures.len());
    }
    Ok(())
}

fn update_project(
    path: &Path,
    linear: &LinearArgs,
    project_id: &str,
    recreate_stale: bool,
) -> Result<()> {
    let client = linear.client()?;
    let fetcher = HttpImageFetcher::new()?;
    let mut deck = DeckDocument::load(path)?;

    let page = update_project_slide(
        SyncContext {
            canvas: &mut deck.canvas,
            store: &mut deck.properties,
            fetcher: &fetcher,
            now: Utc::now(),
            stale_policy: stale_policy(recreate_stale),
        },
        &client,
        project_id,
    )
    .with_context(|| format!("Failed to update project {}", project_id))?;
    deck.save(path)?;

    eprintln!("Updated slide {}", page);
    Ok(())
}

fn email(path: &Path, linear: &LinearArgs, outbox_dir: &Path) -> Result<()> {
    let client = linear.client()?;
    let deck = DeckDocument::load(path)?;
    let settings = Settings::load(&deck.properties)?;
    let mut outbox = OutboxNotifier::new(outbox_dir);

    let report = send_reminders(
        &deck.canvas,
        &deck.properties,
        &client,
        &mut outbox,
        Utc::now(),
        &settings.meeting_name,
    )?;

    for written in outbox.written() {
        log::debug!("Reminder written to {}", written.display());
    }
    eprintln!("Wrote {} reminders, {} failed", report.sent, report.failed);
    Ok(())
}

fn config(path: &Path, action: &ConfigAction) -> Result<()> {
    let mut deck = DeckDocument::load(path)?;
    let mut settings = Settings::load(&deck.properties)?;

    match action {
        ConfigAction::Show => {
            println!("{}", serde_json::to_string_pretty(&settings)?);
        }
        ConfigAction::Set { key, value } => {
            settings.set_field(key, value)?;
            settings.save(&mut deck.properties)?;
            deck.save(path)?;
            eprintln!("Set {} = {}", key, value);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_parse_sync_flags() {
        let args = Args::try_parse_from([
            "roadmap-slides",
            "--deck",
            "team.json",
            "sync",
            "--api-key",
            "lin_api_x",
            "--without-projects",
        ])
        .unwrap();
        assert_eq!(args.deck, PathBuf::from("team.json"));
        match args.command {
            Command::Sync {
                linear,
                without_projects,
                recreate_stale,
            } => {
                assert_eq!(linear.api_key.as_deref(), Some("lin_api_x"));
                assert!(without_projects);
                assert!(!recreate_stale);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_blank_api_key_rejected() {
        let linear = LinearArgs {
            api_key: Some("  ".into()),
        };
        assert!(linear.client().is_err());
    }

    #[test]
    fn test_init_and_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deck.json");

        let size = Size::new(720.0, 405.0);
        init(&path, "deck-1", "https://slides.example/deck-1", size, false).unwrap();
        assert!(init(&path, "deck-1", "https://slides.example/deck-1", size, false).is_err());

        config(
            &path,
            &ConfigAction::Set {
                key: "meeting_name".into(),
                value: "Roadmap Review".into(),
            },
        )
        .unwrap();
        let deck = DeckDocument::load(&path).unwrap();
        assert_eq!(Settings::load(&deck.properties).unwrap().meeting_name, "Roadmap Review");

        let rejected = config(
            &path,
            &ConfigAction::Set {
                key: "update_font_size".into(),
                value: "big".into(),
            },
        );
        assert!(rejected.is_err());
    }
}
