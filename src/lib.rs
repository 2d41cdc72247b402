//! Discord bot that relays prompts to OpenRouter, plus a liveness endpoint
//! for uptime monitors.

pub mod config;
pub mod gateway;
pub mod health;
pub mod logging;
pub mod readiness;
pub mod relay;
