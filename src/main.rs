mod auth;
mod config;
mod error;
mod listings;
mod mock;
mod models;
mod prefs;
mod resume;
mod scrape;
mod search;
mod storage;
mod tui;

use anyhow::{Context, Result, anyhow, bail};
use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use std::cell::RefCell;
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::{Arc, Mutex};
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use auth::{AuthSession, RestIdentity};
use config::Config;
use error::AppError;
use listings::{ListingFilter, ListingView};
use models::{AiProvider, JobListing, RemotePreference, SearchParams};
use prefs::{PreferencesStore, SharedStorage};
use scrape::JobBoardScraper;
use storage::LocalStorage;

#[derive(Parser)]
#[command(name = "jobpicker")]
#[command(about = "Job search assistant - search listings, tune preferences, and review your resume")]
struct Cli {
    /// Directory holding local storage and the log file
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search for jobs
    Search {
        /// Role or job title
        role: String,

        /// City, state, or "Remote"
        #[arg(short, long)]
        location: Option<String>,

        /// Only search these platforms (repeatable)
        #[arg(long = "platform")]
        platforms: Vec<String>,

        /// Scrape the live job board instead of generating demo listings
        #[arg(long)]
        live: bool,

        /// Number of demo listings to generate
        #[arg(short, long)]
        count: Option<usize>,

        /// Page to show (1-based)
        #[arg(short, long, default_value = "1")]
        page: usize,

        /// Listings per page
        #[arg(long)]
        per_page: Option<usize>,

        /// Which listings to show
        #[arg(short, long, value_enum, default_value_t = ListingFilter::All)]
        filter: ListingFilter,

        /// Remember this search
        #[arg(long)]
        save: bool,
    },

    /// Manage preferences
    Prefs {
        #[command(subcommand)]
        command: PrefsCommands,
    },

    /// Upload and analyze a resume
    Resume {
        #[command(subcommand)]
        command: ResumeCommands,
    },

    /// Sign in, sign up, or sign out
    Auth {
        #[command(subcommand)]
        command: AuthCommands,
    },

    /// Show automation statistics and recent applications
    Stats,

    /// Open the interactive dashboard
    Dashboard,
}

#[derive(Clone, Copy, ValueEnum)]
enum Switch {
    On,
    Off,
}

impl Switch {
    fn enabled(self) -> bool {
        matches!(self, Switch::On)
    }
}

#[derive(Subcommand)]
enum PrefsCommands {
    /// Show all preferences
    Show,

    /// Turn dark mode on or off
    DarkMode { state: Switch },

    /// Choose the AI provider
    Ai {
        #[arg(value_enum)]
        provider: AiProvider,

        /// Custom API key for the provider
        #[arg(short, long)]
        key: Option<String>,
    },

    /// Set the job search API key (omit to clear)
    ApiKey { key: Option<String> },

    /// Turn auto-apply on or off
    AutoApply { state: Switch },

    /// Hide a company from search results
    Blacklist { company: String },

    /// Show a company again
    Unblacklist { company: String },

    /// Add a preferred location
    Location { location: String },

    /// Remove a preferred location
    Unlocation { location: String },

    /// Which listings to keep by work arrangement
    Remote {
        #[arg(value_enum)]
        preference: RemotePreference,
    },

    /// List saved searches
    Saved,

    /// Forget a saved search by its number
    Forget { number: usize },

    /// Restore defaults
    Reset {
        /// Also wipe the stored session
        #[arg(long)]
        all: bool,
    },
}

#[derive(Subcommand)]
enum ResumeCommands {
    /// Upload a resume PDF
    Upload {
        /// Path to the PDF
        file: PathBuf,

        /// Run the ATS analysis afterwards
        #[arg(short, long)]
        analyze: bool,
    },

    /// Upload a resume PDF and show its ATS analysis
    Analyze {
        /// Path to the PDF
        file: PathBuf,
    },
}

#[derive(Subcommand)]
enum AuthCommands {
    /// Sign in with email and password
    Login {
        email: String,

        /// Read from stdin when omitted
        #[arg(short, long)]
        password: Option<String>,
    },

    /// Create an account
    Signup {
        email: String,

        /// Read from stdin when omitted
        #[arg(short, long)]
        password: Option<String>,

        /// Read from stdin when omitted
        #[arg(short, long)]
        confirm: Option<String>,
    },

    /// Sign out
    Logout,

    /// Show who is signed in
    Status,
}

fn init_tracing(config: &Config) -> Result<()> {
    config.ensure_data_dir()?;
    let log_path = config.log_path();
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("Failed to open log file {}", log_path.display()))?;

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(Mutex::new(file)).with_ansi(false))
        .with(EnvFilter::try_from_env("JOBPICKER_LOG").unwrap_or_else(|_| EnvFilter::new("jobpicker=info")))
        .init();
    Ok(())
}

fn open_storage(config: &Config) -> Result<SharedStorage> {
    let path = config.storage_path();
    let storage = LocalStorage::open(&path)
        .with_context(|| format!("Failed to open local storage at {}", path.display()))?;
    Ok(Rc::new(RefCell::new(storage)))
}

fn open_session(config: &Config, storage: SharedStorage) -> Result<AuthSession> {
    let identity = RestIdentity::new(config).context("Failed to set up identity client")?;
    Ok(AuthSession::open(Arc::new(identity), storage))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = Config::from_env()?;
    if let Some(dir) = &cli.data_dir {
        config = config.with_data_dir(dir);
    }
    init_tracing(&config)?;
    info!(command = ?std::env::args().nth(1), "jobpicker starting");

    let storage = open_storage(&config)?;
    let mut prefs = PreferencesStore::open(storage.clone());

    match cli.command {
        Commands::Search {
            role,
            location,
            platforms,
            live,
            count,
            page,
            per_page,
            filter,
            save,
        } => {
            let mut params = search::new_search(&role, location.as_deref());
            if !platforms.is_empty() {
                let known: Vec<String> = params.platforms.iter().map(|p| p.name.clone()).collect();
                for name in &known {
                    let wanted = platforms.iter().any(|p| p.eq_ignore_ascii_case(name));
                    params.set_platform_enabled(name, wanted);
                }
                for name in platforms.iter().filter(|p| !known.iter().any(|k| k.eq_ignore_ascii_case(p))) {
                    eprintln!("Ignoring unknown platform '{}'.", name);
                }
            }
            params.validate()?;

            if save {
                if prefs.save_search(params.clone())? {
                    println!("Saved search \"{}\".", params.label());
                } else {
                    println!("Search \"{}\" is already saved.", params.label());
                }
            }

            let results = if live {
                println!("Searching {} for \"{}\"...", config.search_url, params.role);
                live_search(&config, &params)?
            } else {
                mock::generate_listings(&params, count.unwrap_or(config.mock_count), &mut rand::thread_rng())
            };

            let mut view = ListingView::new(results);
            let hidden = view.apply_preferences(prefs.get());
            if view.is_empty() {
                println!("No jobs found ({} hidden by preferences).", hidden);
                return Ok(());
            }
            let visible = view.filtered(filter);
            let page = listings::page(&visible, page, per_page.unwrap_or(config.per_page));

            if page.items.is_empty() {
                println!("No jobs found.");
            } else {
                print_listings(page.items);
                println!(
                    "\nPage {}/{} - {} {} job(s){}",
                    page.number,
                    page.total_pages,
                    visible.len(),
                    filter.label(),
                    if hidden > 0 { format!(", {} hidden by preferences", hidden) } else { String::new() }
                );
            }
        }

        Commands::Prefs { command } => match command {
            PrefsCommands::Show => print_preferences(&prefs),

            PrefsCommands::DarkMode { state } => {
                prefs.set_dark_mode(state.enabled())?;
                println!("Dark mode {}.", if state.enabled() { "on" } else { "off" });
            }

            PrefsCommands::Ai { provider, key } => {
                prefs.set_ai_settings(provider, key)?;
                println!("AI provider set to {}.", provider.as_str());
            }

            PrefsCommands::ApiKey { key } => {
                let set = key.as_deref().is_some_and(|k| !k.trim().is_empty());
                prefs.set_job_search_api_key(key)?;
                println!("Job search API key {}.", if set { "saved" } else { "cleared" });
            }

            PrefsCommands::AutoApply { state } => {
                prefs.set_auto_apply(state.enabled())?;
                println!("Auto-apply {}.", if state.enabled() { "on" } else { "off" });
            }

            PrefsCommands::Blacklist { company } => {
                if prefs.blacklist_company(&company)? {
                    println!("'{}' will be hidden from results.", company.trim());
                } else {
                    println!("'{}' is already blacklisted.", company.trim());
                }
            }

            PrefsCommands::Unblacklist { company } => {
                if prefs.unblacklist_company(&company)? {
                    println!("'{}' removed from the blacklist.", company.trim());
                } else {
                    println!("'{}' was not blacklisted.", company.trim());
                }
            }

            PrefsCommands::Location { location } => {
                if prefs.add_preferred_location(&location)? {
                    println!("Added preferred location '{}'.", location.trim());
                } else {
                    println!("'{}' is already a preferred location.", location.trim());
                }
            }

            PrefsCommands::Unlocation { location } => {
                if prefs.remove_preferred_location(&location)? {
                    println!("Removed preferred location '{}'.", location.trim());
                } else {
                    println!("'{}' was not a preferred location.", location.trim());
                }
            }

            PrefsCommands::Remote { preference } => {
                prefs.set_remote_preference(preference)?;
                println!("Remote preference set to {}.", preference.as_str());
            }

            PrefsCommands::Saved => {
                let saved = &prefs.get().saved_searches;
                if saved.is_empty() {
                    println!("No saved searches.");
                } else {
                    for (i, search) in saved.iter().enumerate() {
                        let platforms: Vec<&str> = search.enabled_platforms().map(|p| p.name.as_str()).collect();
                        println!("{:>3}. {} [{}]", i + 1, search.label(), platforms.join(", "));
                    }
                }
            }

            PrefsCommands::Forget { number } => {
                let removed = match number.checked_sub(1) {
                    Some(index) => prefs.remove_saved_search(index)?,
                    None => None,
                };
                match removed {
                    Some(search) => println!("Forgot saved search \"{}\".", search.label()),
                    None => println!("No saved search #{}.", number),
                }
            }

            PrefsCommands::Reset { all } => {
                if all {
                    storage.borrow_mut().clear()?;
                    println!("Cleared {}.", storage.borrow().path().display());
                } else {
                    prefs.reset()?;
                    println!("Preferences restored to defaults.");
                }
            }
        },

        Commands::Resume { command } => {
            let (file, analyze) = match command {
                ResumeCommands::Upload { file, analyze } => (file, analyze),
                ResumeCommands::Analyze { file } => (file, true),
            };

            let uploaded = resume::upload(&file, config.upload_step_delay, |progress| {
                print!("\rUploading... {:>3}%", progress);
                let _ = std::io::stdout().flush();
            });
            println!();

            let resume = match uploaded {
                Ok(resume) => resume,
                Err(e) => {
                    eprintln!("{}", AppError::from(e).user_message());
                    return Ok(());
                }
            };
            println!("Uploaded {} ({} bytes)", resume.name, resume.size_bytes);

            if analyze {
                let analysis = resume::analyze(&resume, &mut rand::thread_rng());
                println!("\nATS score: {}% ({})", analysis.score, resume::score_band(analysis.score));
                println!("Detected keywords: {}", analysis.keywords.join(", "));
                println!("Missing keywords:  {}", analysis.missing_keywords.join(", "));
                println!("\nSuggestions:");
                for suggestion in &analysis.suggestions {
                    println!("  - {}", suggestion);
                }
            }
        }

        Commands::Auth { command } => {
            let mut session = open_session(&config, storage)?;
            let outcome = match command {
                AuthCommands::Login { email, password } => {
                    let password = password.map(Ok).unwrap_or_else(|| read_secret("Password: "))?;
                    session.sign_in(&email, &password).map(|u| format!("Signed in as {}.", u.email))
                }
                AuthCommands::Signup { email, password, confirm } => {
                    let password = password.map(Ok).unwrap_or_else(|| read_secret("Password: "))?;
                    let confirm = confirm.map(Ok).unwrap_or_else(|| read_secret("Confirm password: "))?;
                    session
                        .sign_up(&email, &password, &confirm)
                        .map(|u| format!("Account created for {}.", u.email))
                }
                AuthCommands::Logout => {
                    let was = session.user().map(|u| u.email.clone());
                    session.sign_out();
                    Ok(match was {
                        Some(email) => format!("Signed out {}.", email),
                        None => "Not signed in.".to_string(),
                    })
                }
                AuthCommands::Status => Ok(match session.user() {
                    Some(user) => format!("Signed in as {}.", user.email),
                    None => "Not signed in.".to_string(),
                }),
            };
            match outcome {
                Ok(message) => println!("{}", message),
                Err(e) => eprintln!("{}", AppError::from(e).user_message()),
            }
        }

        Commands::Stats => {
            let stats = mock::automation_stats();
            println!("Total applications:  {}", stats.total_applications);
            println!("Successful:          {}", stats.successful_applications);
            println!("Failed:              {}", stats.failed_applications);
            println!("Average match score: {:.1}%", stats.average_match_score);

            println!("\n{:<14} {:>6}", "PLATFORM", "COUNT");
            println!("{}", "-".repeat(21));
            for (platform, count) in &stats.applications_by_platform {
                println!("{:<14} {:>6}", platform, count);
            }

            println!("\n{:<12} {:>6}", "DAY", "COUNT");
            println!("{}", "-".repeat(19));
            for (day, count) in &stats.applications_by_day {
                println!("{:<12} {:>6}", day, count);
            }

            println!("\n{:<8} {:<10} {:>6} {:<17} {:<20}", "JOB", "STATUS", "MATCH", "WHEN", "ERROR");
            println!("{}", "-".repeat(65));
            for app in mock::recent_applications(Utc::now()) {
                println!(
                    "{:<8} {:<10} {:>5}% {:<17} {:<20}",
                    app.job_id,
                    app.status,
                    app.match_score,
                    app.timestamp.format("%Y-%m-%d %H:%M"),
                    truncate(app.error.as_deref().unwrap_or("-"), 20)
                );
            }

            let notifications = mock::notifications();
            let unread = notifications.iter().filter(|n| n.unread).count();
            println!("\nNotifications ({} unread):", unread);
            for n in notifications {
                println!("  {} {}", if n.unread { "*" } else { " " }, n.message);
            }
        }

        Commands::Dashboard => {
            let session = open_session(&config, storage)?;
            let mut app = tui::App::new(config, prefs, session);
            tui::run_dashboard(&mut app)?;
        }
    }

    Ok(())
}

/// Scrapes the job board. Only valid while its platform is enabled.
fn live_search(config: &Config, params: &SearchParams) -> Result<Vec<JobListing>> {
    if !params.is_enabled(scrape::PLATFORM) {
        bail!(
            "Live search only covers {}; enable it with --platform {}",
            scrape::PLATFORM,
            scrape::PLATFORM.to_lowercase()
        );
    }
    JobBoardScraper::new(config)
        .and_then(|s| s.fetch_listings(&params.role, params.location.as_deref()))
        .map_err(|e| anyhow!(AppError::from(e).user_message()))
}

fn print_listings(jobs: &[JobListing]) {
    println!(
        "{:<3} {:<30} {:<20} {:<18} {:<10} {:>5} {:<20}",
        "", "TITLE", "COMPANY", "LOCATION", "PLATFORM", "MATCH", "SALARY"
    );
    println!("{}", "-".repeat(112));
    for job in jobs {
        let flags = format!(
            "{}{}",
            if job.saved { "*" } else { " " },
            if job.applied { "+" } else { " " }
        );
        let score = job.match_score.map(|s| format!("{}%", s)).unwrap_or_else(|| "-".to_string());
        println!(
            "{:<3} {:<30} {:<20} {:<18} {:<10} {:>5} {:<20}",
            flags,
            truncate(&job.title, 28),
            truncate(&job.company, 18),
            truncate(&job.location, 16),
            job.platform,
            score,
            truncate(job.salary.as_deref().unwrap_or("-"), 20)
        );
    }
}

fn print_preferences(prefs: &PreferencesStore) {
    let p = prefs.get();
    let app = &p.application_preferences;
    let list = |v: &[String]| if v.is_empty() { "-".to_string() } else { v.join(", ") };

    println!("Dark mode:          {}", if p.dark_mode { "on" } else { "off" });
    println!("AI provider:        {}", p.ai_settings.provider.as_str());
    println!("AI API key:         {}", if p.ai_settings.api_key.is_some() { "custom" } else { "default" });
    println!("Job search API key: {}", if p.job_search_api_key.is_some() { "set" } else { "not set" });
    println!("Auto-apply:         {}", if p.auto_apply_enabled { "on" } else { "off" });
    println!("Remote preference:  {}", app.remote_preference.as_str());
    println!("Blacklisted:        {}", list(&app.blacklisted_companies));
    println!("Preferred places:   {}", list(&app.preferred_locations));
    println!("Saved searches:     {}", p.saved_searches.len());
}

fn read_secret(prompt: &str) -> Result<String> {
    eprint!("{}", prompt);
    std::io::stderr().flush()?;
    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read from stdin")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_counts_chars() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("Senior Software Engineer", 10), "Senior ...");
        assert_eq!(truncate("Zürich, Schweiz", 8), "Züric...");
    }

    #[test]
    fn test_cli_parses_search_flags() {
        let cli = Cli::try_parse_from([
            "jobpicker", "search", "Rust Developer", "-l", "Remote", "--platform", "indeed", "--filter", "saved",
        ])
        .unwrap();
        match cli.command {
            Commands::Search { role, location, platforms, filter, page, .. } => {
                assert_eq!(role, "Rust Developer");
                assert_eq!(location.as_deref(), Some("Remote"));
                assert_eq!(platforms, vec!["indeed".to_string()]);
                assert_eq!(filter, ListingFilter::Saved);
                assert_eq!(page, 1);
            }
            _ => panic!("expected search"),
        }
    }

    #[test]
    fn test_cli_global_data_dir_after_subcommand() {
        let cli = Cli::try_parse_from(["jobpicker", "prefs", "dark-mode", "on", "--data-dir", "/tmp/jp"]).unwrap();
        assert_eq!(cli.data_dir, Some(PathBuf::from("/tmp/jp")));
        assert!(matches!(
            cli.command,
            Commands::Prefs { command: PrefsCommands::DarkMode { state: Switch::On } }
        ));
    }

    #[test]
    fn test_cli_validates_enum_values() {
        let cli = Cli::try_parse_from(["jobpicker", "prefs", "ai", "github", "--key", "k"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Prefs { command: PrefsCommands::Ai { provider: AiProvider::GitHub, .. } }
        ));
        let cli = Cli::try_parse_from(["jobpicker", "prefs", "remote", "hybrid"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Prefs { command: PrefsCommands::Remote { preference: RemotePreference::Hybrid } }
        ));

        assert!(Cli::try_parse_from(["jobpicker", "prefs", "ai", "open-ai"]).is_err());
        assert!(Cli::try_parse_from(["jobpicker", "prefs", "remote", "office"]).is_err());
        assert!(Cli::try_parse_from(["jobpicker", "search", "dev", "--filter", "starred"]).is_err());
    }

    #[test]
    fn test_live_search_requires_job_board_platform() {
        let mut config = Config::from_env().unwrap();
        config.search_url = "http://127.0.0.1:9/jobs".to_string();
        let mut params = search::new_search("rust", None);
        params.set_platform_enabled(scrape::PLATFORM, false);

        let err = live_search(&config, &params).unwrap_err();
        assert!(err.to_string().starts_with("Live search only covers Indeed"));
    }

    #[test]
    fn test_live_search_failure_is_an_error() {
        let server = httpmock::MockServer::start();
        server.mock(|when, then| {
            when.method(httpmock::Method::GET).path("/jobs");
            then.status(503);
        });
        let mut config = Config::from_env().unwrap();
        config.search_url = server.url("/jobs");

        let err = live_search(&config, &search::new_search("rust", None)).unwrap_err();
        assert!(err.to_string().contains("503"));
        assert!(err.to_string().contains("try again"));
    }
}
