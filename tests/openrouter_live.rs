//! Live smoke test against OpenRouter.
//!
//! Needs OPENROUTER_API_KEY in the environment.
//!
//! Run with: cargo test --features integ_test --test openrouter_live

#[cfg(feature = "integ_test")]
mod tests {
    use std::time::Duration;

    use relaybot::config::{DEFAULT_API_URL, DEFAULT_MODEL};
    use relaybot::relay::{Client, RelaySettings};

    #[tokio::test]
    async fn test_live_completion() {
        let Ok(api_key) = std::env::var("OPENROUTER_API_KEY") else {
            eprintln!("Skipping test: OPENROUTER_API_KEY not set");
            return;
        };

        let client = Client::new(
            Some(api_key),
            RelaySettings {
                api_url: DEFAULT_API_URL.to_string(),
                model: DEFAULT_MODEL.to_string(),
                max_tokens: 20,
                temperature: 0.0,
                timeout: Duration::from_secs(30),
            },
        )
        .expect("Failed to build client");

        let answer = client
            .relay("What is 2+2? Reply with the number only.")
            .await
            .expect("Relay failed");
        println!("Answer: {}", answer);
        assert!(answer.contains('4'), "Expected 4, got: {}", answer);
    }
}
