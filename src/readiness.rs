//! Readiness flag shared between the gateway and the liveness endpoint.

use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// Process is up, gateway not connected yet.
    Starting,
    /// Gateway reported ready.
    Ready,
    /// Gateway failed fatally; only the liveness endpoint is left.
    Down,
}

impl State {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => State::Ready,
            2 => State::Down,
            _ => State::Starting,
        }
    }
}

/// Cloneable handle to the process readiness state.
///
/// Written by the gateway, read on every liveness request. A stale read only
/// means a briefly outdated status line.
#[derive(Debug, Clone, Default)]
pub struct Readiness {
    state: Arc<AtomicU8>,
}

impl Readiness {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark_ready(&self) {
        self.state.store(State::Ready as u8, Ordering::Release);
    }

    pub fn mark_down(&self) {
        self.state.store(State::Down as u8, Ordering::Release);
    }

    pub fn state(&self) -> State {
        State::from_u8(self.state.load(Ordering::Acquire))
    }

    pub fn is_ready(&self) -> bool {
        self.state() == State::Ready
    }

    pub fn status_line(&self) -> &'static str {
        match self.state() {
            State::Starting => "Bot is starting",
            State::Ready => "Bot is running",
            State::Down => "Bot is down",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_not_ready() {
        let readiness = Readiness::new();
        assert_eq!(readiness.state(), State::Starting);
        assert!(!readiness.is_ready());
        assert_eq!(readiness.status_line(), "Bot is starting");
    }

    #[test]
    fn test_clones_share_state() {
        let readiness = Readiness::new();
        let observer = readiness.clone();
        readiness.mark_ready();
        assert!(observer.is_ready());
        assert_eq!(observer.status_line(), "Bot is running");

        readiness.mark_down();
        assert_eq!(observer.state(), State::Down);
        assert_eq!(observer.status_line(), "Bot is down");
    }
}
