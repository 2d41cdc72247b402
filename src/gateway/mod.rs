//! Gateway module - bridges Discord commands to the prompt relay.

pub mod command;
pub mod discord;
pub mod dispatch;
pub mod split;


use std::future::Future;

use crate::relay::{self, Error as RelayError};

pub use command::{Command, CommandParser};
pub use discord::{BotError, Handler};
pub use dispatch::Dispatcher;
pub use split::{MESSAGE_LIMIT, split_message};

/// Something that turns a prompt into a completion.
pub trait Relay: Send + Sync {
    fn is_configured(&self) -> bool;

    fn relay(&self, prompt: &str) -> impl Future<Output = Result<String, RelayError>> + Send;
}

impl Relay for relay::Client {
    fn is_configured(&self) -> bool {
        relay::Client::is_configured(self)
    }

    async fn relay(&self, prompt: &str) -> Result<String, RelayError> {
        relay::Client::relay(self, prompt).await
    }
}

/// Where replies for one invocation go.
pub trait Replier: Send + Sync {
    fn send(&self, text: &str) -> impl Future<Output = Result<(), String>> + Send;
}
