mod config;

use std::sync::Arc;

use {
    clap::Parser,
    secrecy::{ExposeSecret, Secret},
    tracing::info,
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

use {talash_dispatch::LookupClient, talash_sessions::SessionStore, talash_telegram::bot};

#[derive(Parser)]
#[command(
    name = "talash",
    about = "Talash — multi-service identity lookup bot for Telegram"
)]
struct Cli {
    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, default_value_t = false)]
    json_logs: bool,

    /// Config file path (overrides discovery).
    #[arg(long, env = "TALASH_CONFIG")]
    config: Option<std::path::PathBuf>,

    /// Bot token (overrides the config file).
    #[arg(long, env = "TALASH_BOT_TOKEN", hide_env_values = true)]
    token: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_telemetry(&cli);

    let mut app = config::load(cli.config.as_deref())?;
    if let Some(token) = cli.token {
        app.telegram.token = Secret::new(token);
    }
    if app.telegram.token.expose_secret().is_empty() {
        anyhow::bail!("no bot token configured: set telegram.token in talash.toml or TALASH_BOT_TOKEN");
    }

    let sessions = Arc::new(SessionStore::new());
    let lookup = Arc::new(LookupClient::new(app.telegram.lookup_base_url.clone())?);

    let cancel = bot::start_bot(app.telegram, sessions, lookup).await?;
    info!("talash running, press ctrl-c to stop");

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("shutting down");
            cancel.cancel();
        },
        _ = cancel.cancelled() => {},
    }

    Ok(())
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry
            .with(fmt::layer().json().with_target(true).with_thread_ids(false))
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true),
            )
            .init();
    }
}
