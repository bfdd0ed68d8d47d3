//! Agent Chat Bridge CLI

use std::sync::Arc;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use agent_chat_bridge::{
    router, AppState, Config, Coordinator, ReplyRelay, SlackClient, SlackConfig, TerminalPort,
    TmuxBridge,
};

#[derive(Parser)]
#[command(name = "acb")]
#[command(about = "Bridge a terminal-multiplexer AI agent session with a team chat channel")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the notification bridge server
    Serve {
        /// Listen port (overrides PORT)
        #[arg(long)]
        port: Option<u16>,
        /// Debounce delay in milliseconds (overrides NOTIFICATION_DELAY)
        #[arg(long)]
        delay_ms: Option<u64>,
        /// Chat channel (overrides SLACK_CHANNEL)
        #[arg(long)]
        channel: Option<String>,
    },
    /// Print the terminal session the bridge would inject into
    Session,
    /// Inject text plus Enter into the resolved session (debug aid)
    Inject {
        /// Text to type into the session
        text: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // RUST_LOG controls verbosity, e.g. RUST_LOG=debug acb serve
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("agent_chat_bridge=info,acb=info"));

    fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .init();

    let cli = Cli::parse();
    let mut config = Config::from_env();

    match cli.command {
        Commands::Serve {
            port,
            delay_ms,
            channel,
        } => {
            if let Some(port) = port {
                config.port = port;
            }
            if let Some(delay_ms) = delay_ms {
                config.delay_ms = delay_ms;
            }
            if let Some(channel) = channel {
                config.channel = channel;
            }
            serve(config).await?;
        }
        Commands::Session => {
            let bridge = TmuxBridge::new(config.session_override);
            match bridge.resolve_session() {
                Some(session) => println!("{}", session),
                None => {
                    println!("none");
                    std::process::exit(1);
                }
            }
        }
        Commands::Inject { text } => {
            let bridge = TmuxBridge::new(config.session_override);
            let session = bridge
                .resolve_session()
                .ok_or_else(|| anyhow!("no tmux/byobu session found"))?;
            bridge.inject(&session, &text)?;
            println!("sent to session: {}", session);
        }
    }

    Ok(())
}

async fn serve(config: Config) -> Result<()> {
    let slack = Arc::new(SlackClient::new(SlackConfig {
        bot_token: config.bot_token.clone(),
        channel: config.channel.clone(),
        ..Default::default()
    })?);

    // An unreachable chat platform at boot is the one fatal failure
    let bot_user_id = slack.connect().await?;

    let coordinator = Arc::new(Coordinator::new(config.delay(), slack.clone()));
    let terminal: Arc<dyn TerminalPort> =
        Arc::new(TmuxBridge::new(config.session_override.clone()));
    let relay = Arc::new(ReplyRelay::new(terminal, coordinator.clone()));

    // names ("#general") cannot be matched against event channel ids; a
    // bare id configured as the channel doubles as the reply filter
    let channel_id = config.channel_id.clone().or_else(|| {
        let looks_like_id = !config.channel.starts_with('#');
        looks_like_id.then(|| config.channel.clone())
    });

    let state = Arc::new(AppState {
        coordinator,
        relay,
        chat: slack,
        bot_user_id: Some(bot_user_id),
        channel_id,
    });

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!(port = config.port, "Notification server listening");
    info!(delay_ms = config.delay_ms, "Debounce delay configured");
    info!(channel = %config.channel, "Chat channel configured");

    axum::serve(listener, router(state)).await?;
    Ok(())
}
