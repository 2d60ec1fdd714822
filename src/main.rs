//! Terminal chat client.
//!
//! `chatline chat` connects to the chat server and relays stdin lines as
//! messages; `chatline login` prints a token obtained from the server's
//! login form.

use clap::{Args, Parser, Subcommand};
use tokio::sync::watch;
use tracing::{info, warn};

use chatline::client::ChatClient;
use chatline::config::{ClientConfig, ConfigError, DEFAULT_ENDPOINT, history_limit_from_env};
use chatline::net::api::{ApiError, AuthClient};
use chatline::net::backoff::BackoffConfig;
use chatline::net::socket::{SessionEnd, run_session, spawn_stdin_lines};
use chatline::term::TerminalView;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("missing chat token; pass --token, set CHAT_TOKEN, or log in with --username/--password")]
    MissingToken,
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("{0}")]
    Api(#[from] ApiError),
    #[error("failed to load .env: {0}")]
    Env(#[from] dotenvy::Error),
    #[error("connection lost and reconnect attempts exhausted")]
    ConnectionLost,
}

#[derive(Parser, Debug)]
#[command(name = "chatline", about = "Terminal client for the WebSocket chat server")]
struct Cli {
    #[arg(long, env = "CHAT_BASE_URL", default_value = "http://localhost:8080")]
    base_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Join the chat room and relay stdin lines.
    Chat(ChatArgs),
    /// Log in and print the chat token.
    Login(Credentials),
}

#[derive(Args, Debug)]
struct ChatArgs {
    #[arg(long, env = "CHAT_WS_URL", default_value = DEFAULT_ENDPOINT)]
    url: String,

    #[arg(long, env = "CHAT_TOKEN", hide_env_values = true, conflicts_with = "username")]
    token: Option<String>,

    #[arg(long, env = "CHAT_NAME", default_value = "")]
    name: String,

    #[arg(long, env = "CHAT_SECONDARY", default_value = "", hide_env_values = true)]
    secondary: String,

    #[command(flatten)]
    login: OptionalCredentials,
}

#[derive(Args, Debug)]
struct Credentials {
    #[arg(long)]
    username: String,

    #[arg(long, env = "CHAT_PASSWORD", hide_env_values = true)]
    password: String,

    /// Register the account before logging in.
    #[arg(long, default_value_t = false)]
    register: bool,
}

#[derive(Args, Debug)]
struct OptionalCredentials {
    #[arg(long, requires = "password")]
    username: Option<String>,

    #[arg(long, env = "CHAT_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    #[arg(long, default_value_t = false, requires = "username")]
    register: bool,
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            return Err(e.into());
        }
    }
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let cli = Cli::parse();
    match cli.command {
        Command::Login(creds) => {
            let token = fetch_token(&cli.base_url, &creds.username, &creds.password, creds.register).await?;
            println!("{token}");
            Ok(())
        }
        Command::Chat(args) => run_chat(&cli.base_url, args).await,
    }
}

async fn run_chat(base_url: &str, args: ChatArgs) -> Result<(), CliError> {
    let token = match (args.token, args.login.username, args.login.password) {
        (Some(token), _, _) => token,
        (None, Some(username), Some(password)) => {
            fetch_token(base_url, &username, &password, args.login.register).await?
        }
        _ => return Err(CliError::MissingToken),
    };

    let config = ClientConfig::new(args.url, token)?
        .with_display_name(args.name)
        .with_secondary(args.secondary)
        .with_history_limit(history_limit_from_env()?)
        .with_reconnect(BackoffConfig::from_env()?);
    config.validate()?;
    config.log_template_values();

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("interrupt received; closing chat");
                if shutdown_tx.send(true).is_err() {
                    warn!("chat session already ended");
                }
            }
            Err(e) => {
                // Dropping the sender would end the session.
                warn!(error = %e, "ctrl-c handler unavailable");
                std::future::pending::<()>().await;
            }
        }
    });

    let mut client = ChatClient::new(config);
    let mut view = TerminalView::new(std::io::stdout(), std::io::stderr());
    let end = run_session(&mut client, &mut view, spawn_stdin_lines(), shutdown_rx).await;
    info!(?end, "chat session ended");

    match end {
        SessionEnd::Shutdown | SessionEnd::InputClosed => Ok(()),
        SessionEnd::GaveUp => Err(CliError::ConnectionLost),
    }
}

async fn fetch_token(base_url: &str, username: &str, password: &str, register: bool) -> Result<String, CliError> {
    let auth = AuthClient::new(base_url)?;
    if register {
        auth.register(username, password).await?;
    }
    let token = auth.login(username, password).await?;
    info!(base_url = %auth.base_url(), %username, "obtained chat token");
    Ok(token)
}
