//! Platform-independent handling of the ping and ask commands.

use std::time::Duration;

use tracing::{info, warn};

use super::split::{MESSAGE_LIMIT, split_message};
use super::{Command, Relay, Replier};

pub struct Dispatcher<R> {
    pub(super) relay: R,
    usage: String,
}

impl<R: Relay> Dispatcher<R> {
    /// `usage` is the hint sent back when the ask command has no prompt.
    pub fn new(relay: R, usage: impl Into<String>) -> Self {
        Self {
            relay,
            usage: usage.into(),
        }
    }

    /// Whether an ask should be acknowledged before the (slow) relay call.
    pub fn needs_defer(&self, prompt: &str) -> bool {
        self.relay.is_configured() && !prompt.trim().is_empty()
    }

    pub async fn handle<P: Replier>(&self, command: Command, replier: &P, latency: Option<Duration>) {
        match command {
            Command::Ping => self.ping(replier, latency).await,
            Command::Ask(prompt) => self.ask(&prompt, replier).await,
        }
    }

    pub async fn ping<P: Replier>(&self, replier: &P, latency: Option<Duration>) {
        if let Err(e) = replier.send(&pong(latency)).await {
            warn!("Failed to send pong: {e}");
        }
    }

    pub async fn ask<P: Replier>(&self, prompt: &str, replier: &P) {
        // Only the emptiness check ignores whitespace; the prompt goes out verbatim
        if prompt.trim().is_empty() {
            if let Err(e) = replier.send(&self.usage).await {
                warn!("Failed to send usage hint: {e}");
            }
            return;
        }

        let reply = match self.relay.relay(prompt).await {
            Ok(completion) => completion,
            Err(e) => {
                if let Err(send_err) = replier.send(&e.user_message()).await {
                    warn!("Failed to send error reply: {send_err}");
                }
                return;
            }
        };

        let chunks = split_message(&reply, MESSAGE_LIMIT);
        if chunks.len() > 1 {
            info!("✂️ Splitting {} char reply into {} messages", reply.chars().count(), chunks.len());
        }
        // Discord rejects blank messages
        for chunk in chunks.into_iter().filter(|c| !c.trim().is_empty()) {
            // Later chunks make no sense without the earlier ones
            if let Err(e) = replier.send(chunk).await {
                warn!("Failed to send reply chunk: {e}");
                return;
            }
        }
    }
}

pub fn pong(latency: Option<Duration>) -> String {
    match latency {
        Some(latency) => format!("🏓 Pong! ({} ms)", latency.as_millis()),
        None => "🏓 Pong!".to_string(),
    }
}
