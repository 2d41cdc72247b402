use std::process::ExitCode;
use std::sync::Arc;

use tracing::{error, info, warn};

use relaybot::config::{Config, FailurePolicy};
use relaybot::gateway::{self, BotError, CommandParser, Dispatcher, Handler};
use relaybot::readiness::Readiness;
use relaybot::relay::{Client as RelayClient, RelaySettings};
use relaybot::health;

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    let config = match std::env::args().nth(1) {
        Some(path) => Config::load(&path),
        None => Config::from_env(),
    };
    let config = match config {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ ERROR: {e}");
            return ExitCode::FAILURE;
        }
    };

    let _guard = match relaybot::logging::init(config.log_dir.as_deref()) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("❌ ERROR: failed to open log file: {e}");
            return ExitCode::FAILURE;
        }
    };

    info!("🚀 Starting relaybot...");

    let readiness = Readiness::new();
    let listener = match health::bind(config.port).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind health port {}: {e}", config.port);
            return ExitCode::FAILURE;
        }
    };
    let health_task = tokio::spawn(health::serve(listener, readiness.clone()));

    let relay = match RelayClient::new(config.openrouter_api_key.clone(), RelaySettings::from_config(&config)) {
        Ok(client) => client,
        Err(e) => {
            error!("Failed to build HTTP client: {e}");
            return ExitCode::FAILURE;
        }
    };
    if relay.is_configured() {
        info!("Model: {}", relay.model());
    } else {
        warn!("OPENROUTER_API_KEY not set, the ask command will reply with an error");
    }

    let parser = match CommandParser::new(&config.command_prefix) {
        Ok(parser) => parser,
        Err(e) => {
            error!("Invalid command prefix '{}': {e}", config.command_prefix);
            return ExitCode::FAILURE;
        }
    };
    let usage = format!(
        "Usage: `{}ai <prompt>` or `/ai prompt:<your question>`",
        config.command_prefix
    );
    let dispatcher = Arc::new(Dispatcher::new(relay, usage));
    let handler = Handler::new(dispatcher, parser, readiness.clone(), config.register_slash_commands);

    let err = match gateway::discord::run(&config.discord_token, handler).await {
        Ok(()) => {
            info!("Discord client stopped");
            return ExitCode::SUCCESS;
        }
        Err(e) => e,
    };

    match err {
        BotError::InvalidCredential => error!("❌ {err}, check the bot token"),
        _ => error!("❌ {err}"),
    }

    if !readiness.is_ready() {
        warn!("Gateway never reported ready");
    }

    match config.on_gateway_failure {
        FailurePolicy::Exit => return ExitCode::FAILURE,
        FailurePolicy::ServeDown => readiness.mark_down(),
        FailurePolicy::ServeReady => readiness.mark_ready(),
    }
    warn!(
        "Gateway is gone, keeping the health endpoint up ({:?})",
        config.on_gateway_failure
    );

    // Serves forever; only a panic in the task gets us past this
    if let Err(e) = health_task.await {
        error!("Health endpoint stopped: {e}");
    }
    ExitCode::FAILURE
}
