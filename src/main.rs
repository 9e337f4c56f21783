//! Mood Gardens CLI
//!
//! Command-line client for Mood Gardens:
//! - Sign in and manage the account
//! - Write today's entry and follow its garden
//! - Browse the calendar and entry history
//! - Build share links

use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use moodgarden::account::{self, SettingsForm};
use moodgarden::auth::AuthSession;
use moodgarden::calendar::{MonthView, YearMonth, WEEKDAY_HEADERS};
use moodgarden::config::{generate_default_config, Config};
use moodgarden::entries::{self, EntryFeed, EntryForm, JournalApi, SubmitOutcome};
use moodgarden::garden::{GardenJob, GardenWatcher, StopReason, WatchConfig, WatchEvent, WatchPhase};
use moodgarden::graphql::GraphQlClient;
use moodgarden::period::{format_day_key, Period};
use moodgarden::session_store::SessionStore;
use moodgarden::share::{Cloudinary, ShareTarget, DEFAULT_DOWNLOAD_NAME};

#[derive(Parser)]
#[command(name = "moodgarden")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Write your day, grow a garden")]
#[command(long_about = "Mood Gardens turns a short daily diary entry into a generated garden image.\nWrite entries, follow garden generation and share the results.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// API base URL (overrides config)
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Config file (default: standard locations)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Print JSON instead of text where supported
    #[arg(long, global = true)]
    pub json: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Sign in
    Login {
        #[arg(short, long)]
        email: String,
        #[arg(short, long, env = "MOODGARDEN_PASSWORD")]
        password: String,
    },

    /// Create an account
    Register {
        #[arg(short, long)]
        email: String,
        #[arg(short, long, env = "MOODGARDEN_PASSWORD")]
        password: String,
        /// Display name
        #[arg(short = 'n', long)]
        name: String,
    },

    /// Sign out and forget the session
    Logout,

    /// Show the signed-in user
    Me {
        /// New display name
        #[arg(long)]
        set_name: Option<String>,
    },

    /// Write today's entry and start its garden
    Write {
        /// Entry text
        text: String,
        /// Song that fits the day
        #[arg(long)]
        song_url: Option<String>,
        /// Follow the garden until it is ready
        #[arg(short, long)]
        watch: bool,
    },

    /// Follow a garden job until it finishes
    Watch {
        /// Period (day, week, month, year)
        #[arg(short, long, default_value = "day")]
        period: Period,
        /// Period key (default: current period)
        key: Option<String>,
    },

    /// Show a month of gardens
    Calendar {
        /// Month as YYYY-MM (default: this month)
        #[arg(short, long)]
        month: Option<YearMonth>,
    },

    /// List past entries
    Feed {
        /// Pages of 10 entries to load
        #[arg(long, default_value = "1")]
        pages: u32,
    },

    /// Build share links for a garden image
    Share {
        /// Cloudinary public id of the garden image
        public_id: String,
        /// Target (x, facebook, link)
        #[arg(short, long, default_value = "link")]
        target: ShareTarget,
        /// Text to go with the link
        #[arg(long)]
        text: Option<String>,
    },

    /// Update timezone and day rollover hour
    Settings {
        #[arg(long)]
        timezone: Option<String>,
        /// Hour (0-23) at which a new diary day starts
        #[arg(long, allow_negative_numbers = true)]
        rollover_hour: Option<i64>,
    },

    /// List selectable timezones
    Timezones,

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load_with_env(path)?,
        None => Config::load_default(),
    };
    if let Some(url) = &cli.api_url {
        config.api.base_url = url.clone();
    }
    moodgarden::logging::init(&config.logging)?;

    // Commands that never touch the API
    match &cli.command {
        Commands::Timezones => {
            for tz in account::all_timezones() {
                println!("{}", account::timezone_label(&tz));
            }
            return Ok(());
        }
        Commands::Config { output } => {
            let content = generate_default_config();
            match output {
                Some(path) => {
                    std::fs::write(path, content)?;
                    println!("Config written to {:?}", path);
                }
                None => print!("{}", content),
            }
            return Ok(());
        }
        Commands::Share {
            public_id,
            target,
            text,
        } => {
            print_share_links(&config, public_id, *target, text.as_deref());
            return Ok(());
        }
        _ => {}
    }

    let store = SessionStore::default_location()?;
    let client = Arc::new(GraphQlClient::new(config.api.clone())?);
    client.set_cookies(store.load()?.cookies).await;

    let session = AuthSession::new(client.clone());
    let result = run(&cli, &config, &client, &session).await;

    // Keep whatever session the API left us with, even after a failure
    if session.is_authenticated() {
        store.save(&client.cookies().await)?;
    } else {
        store.clear()?;
    }

    result
}

async fn run(
    cli: &Cli,
    config: &Config,
    client: &Arc<GraphQlClient>,
    session: &AuthSession,
) -> Result<(), Box<dyn std::error::Error>> {
    match &cli.command {
        Commands::Login { email, password } => {
            let user = session.login(email, password).await?;
            println!("Signed in as {}", user.display_name.as_deref().unwrap_or(email));
        }

        Commands::Register {
            email,
            password,
            name,
        } => {
            let user = session.register(email, password, name).await?;
            println!("Welcome, {}!", user.display_name.as_deref().unwrap_or(name));
        }

        Commands::Logout => {
            if let Err(e) = session.logout().await {
                tracing::warn!(error = %e, "Logout request failed");
            }
            println!("Signed out");
        }

        Commands::Me { set_name } => {
            let state = session.refresh().await;
            let Some(mut user) = state.user else {
                return not_signed_in();
            };
            if let Some(name) = set_name {
                user = session.update_display_name(name).await?;
            }

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&user)?);
            } else {
                println!("Id:           {}", user.id);
                println!("Email:        {}", user.email.as_deref().unwrap_or("-"));
                println!("Display name: {}", user.display_name.as_deref().unwrap_or("-"));
                if let Some(created) = &user.created_at {
                    println!("Member since: {}", created);
                }
            }
        }

        Commands::Write {
            text,
            song_url,
            watch,
        } => {
            if !session.refresh().await.is_authenticated() {
                return not_signed_in();
            }

            let mut form = EntryForm::new(text.clone());
            if let Some(url) = song_url {
                form = form.with_song_url(url.clone());
            }

            let outcome = match entries::submit_today(&**client, &form).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    eprintln!("{}", e.status_text());
                    return Err(e.into());
                }
            };
            println!("{}", outcome.status_text());

            if let SubmitOutcome::Started { period_key, .. } = outcome {
                if *watch {
                    watch_garden(config, client, session, Period::Day, period_key).await?;
                } else {
                    println!("Follow it with: moodgarden watch {}", period_key);
                }
            }
        }

        Commands::Watch { period, key } => {
            if !session.refresh().await.is_authenticated() {
                return not_signed_in();
            }

            let key = match key {
                Some(key) => {
                    period.validate_key(key)?;
                    key.clone()
                }
                None if *period == Period::Day => client.current_diary_day_key().await?,
                None => period.current_key(),
            };
            watch_garden(config, client, session, *period, key).await?;
        }

        Commands::Calendar { month } => {
            if !session.refresh().await.is_authenticated() {
                return not_signed_in();
            }

            let month = month.unwrap_or_else(YearMonth::current);
            let view = MonthView::load(&**client, month).await?;

            if cli.json {
                let jobs: Vec<GardenJob> = (1..=month.days_in_month())
                    .filter_map(|d| view.garden_for_day(d))
                    .map(GardenJob::from)
                    .collect();
                println!("{}", serde_json::to_string_pretty(&jobs)?);
            } else {
                print_month(&view);
            }
        }

        Commands::Feed { pages } => {
            if !session.refresh().await.is_authenticated() {
                return not_signed_in();
            }

            let mut feed = EntryFeed::new(client.clone(), session.handle());
            feed.load_initial().await?;
            for _ in 1..*pages {
                if !feed.has_more() {
                    break;
                }
                feed.load_more().await?;
            }

            if cli.json {
                println!("{}", serde_json::to_string_pretty(feed.items())?);
            } else if feed.items().is_empty() {
                println!("No entries yet.");
                println!();
                println!("Write your first one with:");
                println!("  moodgarden write \"How was your day?\"");
            } else {
                for entry in feed.items() {
                    let day = entry
                        .day_key
                        .as_deref()
                        .map(format_day_key)
                        .unwrap_or_else(|| "Unknown day".to_string());
                    let status = entry
                        .garden
                        .as_ref()
                        .map(|g| g.status.as_str())
                        .unwrap_or("no garden");
                    println!("{} [{}]", day, status);
                    println!("  {}", entry.text.as_deref().unwrap_or(""));
                }
                if feed.has_more() {
                    println!();
                    println!("(more with --pages {})", pages + 1);
                }
            }
        }

        Commands::Settings {
            timezone,
            rollover_hour,
        } => {
            if timezone.is_none() && rollover_hour.is_none() {
                eprintln!("Nothing to update: pass --timezone and/or --rollover-hour");
                std::process::exit(1);
            }
            if !session.refresh().await.is_authenticated() {
                return not_signed_in();
            }

            let defaults = SettingsForm::default();
            let form = SettingsForm {
                timezone: timezone.clone().unwrap_or(defaults.timezone),
                day_rollover_hour: rollover_hour.unwrap_or(defaults.day_rollover_hour),
            };
            let saved = account::update_settings(&**client, &session.handle(), &form).await?;
            println!(
                "Settings updated: {}, new day starts at {:02}:00",
                account::timezone_label(&saved.timezone),
                saved.day_rollover_hour
            );
        }

        Commands::Timezones | Commands::Config { .. } | Commands::Share { .. } => {}
    }

    Ok(())
}

fn not_signed_in() -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("Not signed in. Run: moodgarden login --email <email>");
    std::process::exit(1);
}

/// Render a watch until it stops
async fn watch_garden(
    config: &Config,
    client: &Arc<GraphQlClient>,
    session: &AuthSession,
    period: Period,
    key: String,
) -> Result<(), Box<dyn std::error::Error>> {
    let watcher = GardenWatcher::new(
        client.clone(),
        session.handle(),
        WatchConfig::from(&config.watcher),
    );
    let mut handle = watcher.watch(period, key.clone());

    println!("Watching {} garden {}", period, key);
    let mut last_line = String::new();

    let snapshot = loop {
        let snapshot = tokio::select! {
            snapshot = handle.changed() => match snapshot {
                Some(s) => s,
                None => break handle.snapshot(),
            },
            _ = tokio::signal::ctrl_c() => {
                println!();
                handle.cancel();
                break handle.wait_stopped().await;
            }
        };

        let status = snapshot.status.map(|s| s.as_str()).unwrap_or("WAITING");
        let mut line = format!(
            "{:>3}%  {:<16} {}",
            snapshot.percent(),
            snapshot.stage_label(),
            status
        );
        if let Some(error) = &snapshot.error {
            line.push_str(&format!("  (retrying: {})", error));
        }
        if line != last_line {
            print!("\r{:<80}", line);
            std::io::stdout().flush()?;
            last_line = line;
        }

        if snapshot.is_stopped() {
            println!();
            break snapshot;
        }
    };

    while let Some(event) = handle.try_next_event() {
        match event {
            WatchEvent::Ready(garden) => {
                println!("Your garden is ready!");
                if let Some(summary) = &garden.summary {
                    println!("  {}", summary);
                }
                match (&garden.public_id, config.share.cloud_name.is_empty()) {
                    (Some(public_id), false) => {
                        let cld = Cloudinary::new(&config.share.cloud_name);
                        println!("  {}", cld.large_url(public_id));
                    }
                    _ => {
                        if let Some(url) = &garden.image_url {
                            println!("  {}", url);
                        }
                    }
                }
            }
            WatchEvent::Failed(_) => println!("Garden generation failed."),
        }
    }

    match snapshot.phase {
        WatchPhase::Stopped(StopReason::AuthLost) => {
            eprintln!("Session ended while watching. Sign in again to continue.");
        }
        WatchPhase::Stopped(StopReason::TooManyErrors) => {
            eprintln!(
                "Giving up after repeated errors: {}",
                snapshot.error.as_deref().unwrap_or("unknown error")
            );
        }
        _ => {}
    }

    Ok(())
}

fn print_month(view: &MonthView) {
    let month = view.month();
    println!("{:^35}", month.to_string());
    println!(
        "{}",
        WEEKDAY_HEADERS
            .iter()
            .map(|d| format!("{:^5}", d))
            .collect::<String>()
    );

    for week in view.cells().chunks(7) {
        let row: String = week
            .iter()
            .map(|cell| match cell {
                None => "     ".to_string(),
                Some((day, None)) => format!("{:^5}", day),
                Some((day, Some(garden))) => {
                    let mark = match garden.status {
                        moodgarden::GardenStatus::Ready => '*',
                        moodgarden::GardenStatus::Pending => '~',
                        moodgarden::GardenStatus::Failed => '!',
                    };
                    format!("{:^5}", format!("{}{}", day, mark))
                }
            })
            .collect();
        println!("{}", row);
    }

    println!();
    println!("* ready  ~ growing  ! failed");

    let gallery = view.gallery();
    if !gallery.is_empty() {
        println!();
        for item in gallery {
            println!("{}  {}", format_day_key(&item.day_key), item.public_id);
        }
    }
}

fn print_share_links(config: &Config, public_id: &str, target: ShareTarget, text: Option<&str>) {
    if config.share.cloud_name.is_empty() {
        eprintln!("No Cloudinary cloud name configured (set MOODGARDEN_CLOUD_NAME)");
        std::process::exit(1);
    }

    let cld = Cloudinary::new(&config.share.cloud_name);
    let image = cld.share_url(public_id);

    println!("{}", target.link(&image, text));
    if target == ShareTarget::Link {
        println!();
        println!("Large:    {}", cld.large_url(public_id));
        println!("Download: {}", cld.download_url(public_id, DEFAULT_DOWNLOAD_NAME));
    }
}
