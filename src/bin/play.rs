//! Terminal client for the star guessing game.

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use stardash::client::{ClientConfig, Frontend, HttpTransport, Phase, SessionController, SessionState};
use stardash::protocol::RoundPublicView;

/// Renders the session to stdout and reads choices from stdin
struct Terminal {
    input: Lines<BufReader<Stdin>>,
    last_phase: Option<Phase>,
}

impl Terminal {
    fn new() -> Self {
        Self {
            input: BufReader::new(tokio::io::stdin()).lines(),
            last_phase: None,
        }
    }
}

#[async_trait]
impl Frontend for Terminal {
    fn render(&mut self, state: &SessionState) {
        if self.last_phase == Some(state.phase) {
            return;
        }
        self.last_phase = Some(state.phase);

        match state.phase {
            Phase::Idle => {}
            Phase::Loading => {
                if !state.last_message.is_empty() {
                    println!("\n{}", state.last_message);
                }
                println!(
                    "Score: {}  ({} right, {} wrong)",
                    state.cumulative_score, state.correct_count, state.incorrect_count
                );
                println!("Loading next round...");
            }
            Phase::Ready => {
                if let Some(round) = &state.current_round {
                    println!(
                        "\nWhich repository has more stars? You have {}s.",
                        round.countdown_duration_ms / 1000
                    );
                    for (i, candidate) in round.candidates.iter().enumerate() {
                        println!("  [{}] {}", i + 1, candidate.name);
                        if !candidate.description.is_empty() {
                            println!("      {}", candidate.description);
                        }
                    }
                }
            }
            Phase::Submitting => println!("Checking..."),
        }
    }

    async fn choose(&mut self, round: &RoundPublicView) -> Option<usize> {
        loop {
            println!("Pick 1-{} (q to quit):", round.candidates.len());

            let line = match self.input.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => return None,
                Err(e) => {
                    tracing::error!("Failed to read input: {}", e);
                    return None;
                }
            };

            let line = line.trim();
            if line.eq_ignore_ascii_case("q") {
                return None;
            }
            match line.parse::<usize>() {
                Ok(n) if (1..=round.candidates.len()).contains(&n) => return Some(n - 1),
                _ => println!("'{}' is not a choice", line),
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    if let Err(e) = dotenvy::dotenv() {
        if !matches!(e, dotenvy::Error::Io(_)) {
            eprintln!("Warning: Failed to load .env file: {}", e);
        }
    }

    // Keep the terminal readable; RUST_LOG opts into more
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "stardash=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = ClientConfig::from_env();
    println!("Playing against {}", config.base_url);

    let transport = HttpTransport::new(config)?;
    let state = SessionController::new(transport, Terminal::new()).run().await;

    println!(
        "\nFinal score: {} ({} right, {} wrong)",
        state.cumulative_score, state.correct_count, state.incorrect_count
    );
    Ok(())
}
