mod commands;
mod config;

use clap::{Parser, Subcommand};
use matchmaker_client::{
    JsonFileSavedTrialsStore, JsonFileSessionStore, MatchmakerApi, SavedTrials, SearchClient,
    Session, SessionStore, TrialStatus,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::AppConfig;

#[derive(Parser)]
#[command(name = "matchmaker")]
#[command(about = "Discover and track clinical trials from your terminal")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in with an existing account
    Login {
        email: String,
        password: String,
    },
    /// Create a patient account
    Signup {
        first_name: String,
        last_name: String,
        email: String,
        password: String,
    },
    /// Clear the stored session
    Logout,
    /// Profile snapshot: name, age, headline diagnosis, medication reminder
    Home,
    /// View, create, or edit the medical profile
    Profile {
        #[command(subcommand)]
        action: ProfileAction,
    },
    /// Search clinical trials
    Search {
        /// Free-text condition, treatment, drug...
        query: String,
        /// Filter by recruitment status
        #[arg(long)]
        status: Option<TrialStatus>,
        /// Keep only trials whose location contains this text
        #[arg(long)]
        location_contains: Option<String>,
        /// Result ordering: confidence, title, or distance
        #[arg(long, default_value = "confidence")]
        sort_by: matchmaker_client::SortBy,
        #[arg(long, default_value_t = 10)]
        limit: u32,
    },
    /// Bookmarked trials
    Saved {
        #[command(subcommand)]
        action: Option<SavedAction>,
    },
    /// Notifications feed
    Notifications,
    /// Chat with the clinical assistant
    Chat,
}

#[derive(Subcommand)]
enum ProfileAction {
    /// Render the stored account and profile
    Show,
    /// Create a profile interactively
    Create,
    /// Edit the existing profile; only changed fields are sent
    Edit,
}

#[derive(Subcommand)]
enum SavedAction {
    /// List saved trials
    List,
    /// Remove a saved trial by its list number
    Remove { number: usize },
}

/// Composition-root auth check. Commands that need a session match on this
/// instead of re-reading the store.
pub enum AuthGate {
    Authenticated(Session),
    Anonymous,
}

impl AuthGate {
    fn resolve(store: &dyn SessionStore) -> Self {
        match store.load() {
            Some(session) => Self::Authenticated(session),
            None => Self::Anonymous,
        }
    }
}

/// Everything a command handler needs, wired once at startup
pub struct AppContext {
    pub config: AppConfig,
    pub session_store: Arc<JsonFileSessionStore>,
    pub api: Arc<MatchmakerApi>,
    pub search: SearchClient,
    pub saved: SavedTrials,
    pub gate: AuthGate,
}

impl AppContext {
    fn new(config: AppConfig) -> Self {
        let session_store = Arc::new(JsonFileSessionStore::new(&config.data_dir));
        let saved_store = Arc::new(JsonFileSavedTrialsStore::new(&config.data_dir));
        let api = Arc::new(MatchmakerApi::new(
            config.api_url.clone(),
            session_store.clone(),
        ));
        let gate = AuthGate::resolve(session_store.as_ref());

        Self {
            config,
            session_store,
            search: SearchClient::new(api.clone()),
            saved: SavedTrials::new(saved_store),
            api,
            gate,
        }
    }
}

fn init_tracing() {
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string());
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "matchmaker_cli=info,matchmaker_client=info".into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .json()
                        .with_target(true)
                        .with_level(true),
                )
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
    }
}

#[tokio::main]
async fn main() {
    init_tracing();

    let cli = Cli::parse();
    let ctx = AppContext::new(AppConfig::from_env());

    if let Err(e) = run(cli, ctx).await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli, ctx: AppContext) -> anyhow::Result<()> {
    match cli.command {
        Commands::Login { email, password } => commands::auth::login(&ctx, &email, &password).await,
        Commands::Signup {
            first_name,
            last_name,
            email,
            password,
        } => commands::auth::signup(&ctx, first_name, last_name, email, password).await,
        Commands::Logout => commands::auth::logout(&ctx),
        Commands::Home => commands::home::show(&ctx).await,
        Commands::Profile { action } => match action {
            ProfileAction::Show => commands::profile::show(&ctx).await,
            ProfileAction::Create => commands::profile::create(&ctx).await,
            ProfileAction::Edit => commands::profile::edit(&ctx).await,
        },
        Commands::Search {
            query,
            status,
            location_contains,
            sort_by,
            limit,
        } => {
            let filters = matchmaker_client::SearchFilters {
                status,
                location_contains,
                sort_by,
                limit,
            };
            commands::search::run(&ctx, &query, filters).await
        }
        Commands::Saved { action } => match action.unwrap_or(SavedAction::List) {
            SavedAction::List => commands::saved::list(&ctx),
            SavedAction::Remove { number } => commands::saved::remove(&ctx, number),
        },
        Commands::Notifications => commands::notifications::show(),
        Commands::Chat => commands::chat::repl(&ctx).await,
    }
}
