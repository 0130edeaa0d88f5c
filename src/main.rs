use std::process::ExitCode;
use std::sync::Arc;

use chrono::Local;
use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use eframe::egui;

use forum_chat::common::OutgoingMessage;
use forum_chat::config::{self, AppConfig};
use forum_chat::conversation::{ingest, render_transcript};
use forum_chat::network::{MessagesApi, RestApi};
use forum_chat::storage::models::mask_token;
use forum_chat::storage::{AuthContext, SessionStore};
use forum_chat::ui::ChatApp;
use forum_chat::{ClientError, Result};

#[derive(Parser)]
#[command(
    name = "forum_chat",
    version,
    about = "Direct messages for the forum, on the desktop"
)]
struct Cli {
    /// Path to JSON config file
    #[arg(long, default_value = config::DEFAULT_CONFIG_PATH, value_name = "FILE")]
    config: String,
    #[command(subcommand)]
    mode: Option<Mode>,
}

#[derive(Subcommand)]
enum Mode {
    /// Open the desktop client (default)
    Chat {
        /// Conversation to open on start
        counterpart: Option<String>,
    },
    /// Send one message without opening a window
    Send {
        /// Recipient username
        #[arg(long)]
        to: String,
        message: String,
    },
    /// Print a conversation grouped by day
    History { counterpart: String },
    /// Manage the stored session
    Session {
        #[command(subcommand)]
        action: SessionAction,
    },
    /// Write the effective configuration to the config path
    InitConfig,
}

#[derive(Subcommand)]
enum SessionAction {
    /// Store a username and API token
    Set {
        #[arg(long)]
        username: String,
        #[arg(long)]
        token: String,
    },
    /// Show who is signed in
    Show,
    /// Forget the stored session
    Clear,
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenv().ok();
    env_logger::init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{err}");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let app_config = config::load_config(&cli.config);
    let store = SessionStore::with_path(&app_config.session_db_path)?;

    match cli.mode.unwrap_or(Mode::Chat { counterpart: None }) {
        Mode::Chat { counterpart } => run_chat(app_config, store.load_auth()?, counterpart),
        Mode::Send { to, message } => run_send(&app_config, &store, &to, &message).await,
        Mode::History { counterpart } => run_history(&app_config, &store, &counterpart).await,
        Mode::Session { action } => run_session(&store, action),
        Mode::InitConfig => {
            config::save_config(&cli.config, &app_config)?;
            println!("Wrote {}", cli.config);
            Ok(())
        }
    }
}

fn run_chat(
    app_config: AppConfig,
    auth: Option<AuthContext>,
    counterpart: Option<String>,
) -> Result<()> {
    if auth.is_none() {
        log::warn!("No stored session; conversations will stay empty");
    }

    let api = Arc::new(RestApi::from_config(&app_config)?);
    let runtime = tokio::runtime::Handle::current();
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([960.0, 680.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Forum Messages",
        options,
        Box::new(move |cc| {
            log::info!("Client started against {}", app_config.api_base_url);
            Ok(Box::new(ChatApp::new(
                cc,
                runtime,
                api,
                auth,
                app_config,
                counterpart,
            )))
        }),
    )
    .map_err(|err| ClientError::Ui(err.to_string()))
}

async fn run_send(app_config: &AppConfig, store: &SessionStore, to: &str, message: &str) -> Result<()> {
    let to = to.trim();
    let message = message.trim();
    if to.is_empty() || message.is_empty() {
        return Err(ClientError::InvalidInput(
            "recipient and message must not be empty".to_string(),
        ));
    }

    let auth = store.load_auth()?.ok_or(ClientError::MissingCredentials)?;
    let api = RestApi::from_config(app_config)?;
    let outgoing = OutgoingMessage {
        receiver_username: to.to_string(),
        content: message.to_string(),
    };
    api.send_message(&auth, &outgoing).await?;

    log::info!("Message sent to `{to}`");
    println!("Sent to {to}.");
    Ok(())
}

async fn run_history(app_config: &AppConfig, store: &SessionStore, counterpart: &str) -> Result<()> {
    let counterpart = counterpart.trim();
    if counterpart.is_empty() {
        return Err(ClientError::InvalidInput("counterpart must not be empty".to_string()));
    }

    let auth = store.load_auth()?.ok_or(ClientError::MissingCredentials)?;
    let api = RestApi::from_config(app_config)?;
    let messages = ingest(api.list_conversation(&auth, counterpart).await?);

    print!("{}", render_transcript(&messages, auth.username(), &Local::now()));
    Ok(())
}

fn run_session(store: &SessionStore, action: SessionAction) -> Result<()> {
    match action {
        SessionAction::Set { username, token } => {
            if AuthContext::new(&token, &username).is_none() {
                return Err(ClientError::InvalidInput(
                    "username and token must not be empty".to_string(),
                ));
            }
            store.save_session(&username, &token)?;
            println!("Signed in as {}.", username.trim());
        }
        SessionAction::Show => match store.load_auth()? {
            Some(auth) => println!("{} (token {})", auth.username(), mask_token(auth.token())),
            None => println!("Not signed in."),
        },
        SessionAction::Clear => {
            store.clear_session()?;
            println!("Session cleared.");
        }
    }
    Ok(())
}
