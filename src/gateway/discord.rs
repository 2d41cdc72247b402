//! Discord side of the gateway, using serenity.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use serenity::all::{
    ChannelId, Client, Command as SlashCommand, CommandInteraction, Context,
    CreateInteractionResponse, CreateInteractionResponseFollowup,
    CreateInteractionResponseMessage, CreateMessage, EventHandler, GatewayIntents, Http,
    Interaction, Message, MessageId, Ready, ResumedEvent, ShardId, ShardManager,
};
use serenity::async_trait;
use tracing::{error, info, warn};

use super::command::{self, Command, CommandParser};
use super::{Dispatcher, Relay, Replier};
use crate::readiness::Readiness;

/// Replies in a text channel; the first message references the invoking one.
pub struct ChannelReplier {
    http: Arc<Http>,
    channel_id: ChannelId,
    reply_to: MessageId,
    replied: AtomicBool,
}

impl ChannelReplier {
    pub fn new(http: Arc<Http>, msg: &Message) -> Self {
        Self {
            http,
            channel_id: msg.channel_id,
            reply_to: msg.id,
            replied: AtomicBool::new(false),
        }
    }
}

impl Replier for ChannelReplier {
    async fn send(&self, text: &str) -> Result<(), String> {
        let mut builder = CreateMessage::new().content(text);
        if !self.replied.swap(true, Ordering::AcqRel) {
            builder = builder.reference_message((self.channel_id, self.reply_to));
        }
        self.channel_id
            .send_message(&self.http, builder)
            .await
            .map(|_| ())
            .map_err(|e| format!("Failed to send: {e}"))
    }
}

/// Replies to a slash command: initial response first, followups after.
pub struct InteractionReplier {
    http: Arc<Http>,
    command: CommandInteraction,
    responded: AtomicBool,
}

impl InteractionReplier {
    pub fn new(http: Arc<Http>, command: CommandInteraction) -> Self {
        Self {
            http,
            command,
            responded: AtomicBool::new(false),
        }
    }

    /// Acknowledge now ("bot is thinking"), answer later through followups.
    pub async fn defer(&self) -> Result<(), String> {
        self.command
            .defer(&self.http)
            .await
            .map_err(|e| format!("Failed to defer: {e}"))?;
        self.responded.store(true, Ordering::Release);
        Ok(())
    }
}

impl Replier for InteractionReplier {
    async fn send(&self, text: &str) -> Result<(), String> {
        if self.responded.swap(true, Ordering::AcqRel) {
            self.command
                .create_followup(&self.http, CreateInteractionResponseFollowup::new().content(text))
                .await
                .map(|_| ())
                .map_err(|e| format!("Failed to send followup: {e}"))
        } else {
            let response =
                CreateInteractionResponse::Message(CreateInteractionResponseMessage::new().content(text));
            self.command
                .create_response(&self.http, response)
                .await
                .map_err(|e| format!("Failed to respond: {e}"))
        }
    }
}

pub struct Handler<R> {
    dispatcher: Arc<Dispatcher<R>>,
    parser: CommandParser,
    readiness: Readiness,
    register_slash_commands: bool,
    shard_manager: Arc<OnceLock<Arc<ShardManager>>>,
}

impl<R: Relay> Handler<R> {
    pub fn new(
        dispatcher: Arc<Dispatcher<R>>,
        parser: CommandParser,
        readiness: Readiness,
        register_slash_commands: bool,
    ) -> Self {
        Self {
            dispatcher,
            parser,
            readiness,
            register_slash_commands,
            shard_manager: Arc::new(OnceLock::new()),
        }
    }

    /// Gateway heartbeat latency of the shard that delivered the event.
    async fn latency(&self, shard_id: ShardId) -> Option<Duration> {
        let manager = self.shard_manager.get()?;
        let runners = manager.runners.lock().await;
        runners.get(&shard_id).and_then(|runner| runner.latency)
    }

    async fn handle_slash_command(&self, ctx: &Context, interaction: CommandInteraction) {
        let Some(command) = command::from_interaction(&interaction) else {
            warn!("Unknown slash command: /{}", interaction.data.name);
            return;
        };
        info!("⚡ /{} from {} ({})", interaction.data.name, interaction.user.name, interaction.user.id);

        let replier = InteractionReplier::new(ctx.http.clone(), interaction);
        match command {
            Command::Ping => {
                let latency = self.latency(ctx.shard_id).await;
                self.dispatcher.ping(&replier, latency).await;
            }
            Command::Ask(prompt) => {
                // Unconfigured or empty asks are answered right away
                if self.dispatcher.needs_defer(&prompt)
                    && let Err(e) = replier.defer().await
                {
                    warn!("{e}");
                    return;
                }
                self.dispatcher.ask(&prompt, &replier).await;
            }
        }
    }
}

#[async_trait]
impl<R: Relay + 'static> EventHandler for Handler<R> {
    async fn ready(&self, ctx: Context, ready: Ready) {
        self.readiness.mark_ready();
        info!("✅ Bot is online as {}", ready.user.name);

        if self.register_slash_commands {
            match SlashCommand::set_global_commands(&ctx.http, command::slash_commands()).await {
                Ok(synced) => info!("✅ Synced {} command(s)", synced.len()),
                Err(e) => error!("❌ Error syncing commands: {e}"),
            }
        }
    }

    async fn resume(&self, _ctx: Context, _event: ResumedEvent) {
        info!("🔄 Gateway session resumed");
    }

    async fn message(&self, ctx: Context, msg: Message) {
        if msg.author.bot {
            return;
        }
        let Some(command) = self.parser.parse(&msg.content) else {
            return;
        };
        info!("📨 {:?} from {} ({})", command, msg.author.name, msg.author.id);

        let replier = ChannelReplier::new(ctx.http.clone(), &msg);
        let latency = match command {
            Command::Ping => self.latency(ctx.shard_id).await,
            Command::Ask(ref prompt) => {
                if self.dispatcher.needs_defer(prompt)
                    && let Err(e) = msg.channel_id.broadcast_typing(&ctx.http).await
                {
                    warn!("Failed to start typing: {e}");
                }
                None
            }
        };
        self.dispatcher.handle(command, &replier, latency).await;
    }

    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        if let Interaction::Command(command) = interaction {
            self.handle_slash_command(&ctx, command).await;
        }
    }
}

/// Fatal gateway failures.
#[derive(Debug)]
pub enum BotError {
    /// Discord rejected the token.
    InvalidCredential,
    Client(serenity::Error),
}

impl From<serenity::Error> for BotError {
    fn from(e: serenity::Error) -> Self {
        if is_auth_failure(&e) {
            BotError::InvalidCredential
        } else {
            BotError::Client(e)
        }
    }
}

fn is_auth_failure(e: &serenity::Error) -> bool {
    match e {
        serenity::Error::Gateway(serenity::gateway::GatewayError::InvalidAuthentication) => true,
        serenity::Error::Http(serenity::http::HttpError::UnsuccessfulRequest(resp)) => {
            resp.status_code.as_u16() == 401
        }
        _ => false,
    }
}

impl fmt::Display for BotError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BotError::InvalidCredential => write!(f, "Discord rejected DISCORD_TOKEN"),
            BotError::Client(e) => write!(f, "Discord client error: {e}"),
        }
    }
}

impl std::error::Error for BotError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BotError::InvalidCredential => None,
            BotError::Client(e) => Some(e),
        }
    }
}

/// Connect to Discord and process events until the client stops.
pub async fn run<R: Relay + 'static>(token: &str, handler: Handler<R>) -> Result<(), BotError> {
    let intents =
        GatewayIntents::GUILD_MESSAGES | GatewayIntents::DIRECT_MESSAGES | GatewayIntents::MESSAGE_CONTENT;

    let shard_manager = handler.shard_manager.clone();
    let mut client = Client::builder(token, intents).event_handler(handler).await?;
    // Set once, before any event can ask for it
    let _ = shard_manager.set(client.shard_manager.clone());

    info!("🔌 Connecting to Discord...");
    client.start().await?;
    Ok(())
}
