use conquest_engine::{
    driver::RandomDriver,
    error::{GameError, Result},
    game_config::GameConfig,
    session::GameSession,
};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

const MAX_ACTIONS: usize = 50_000;

/// Usage: conquest_engine [seed] [config.json]
#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();
    let seed = match args.get(1) {
        Some(arg) => arg
            .parse()
            .map_err(|_| GameError::invalid(format!("seed must be a number, got '{}'", arg)))?,
        None => 1,
    };
    let config = match args.get(2) {
        Some(path) => GameConfig::load_from_file(path)?,
        None => GameConfig::default_map()?,
    };

    let session = GameSession::spawn(config.into_game(seed)?);
    let mut driver = RandomDriver::new(seed);
    info!("playing seed {}", seed);

    for _ in 0..MAX_ACTIONS {
        let state = session.snapshot().await;
        let Some(action) = driver.next_action(&state) else {
            break;
        };
        let response = session.perform(action).await?;
        for event in &response.events {
            debug!("{:?}", event);
        }
        if let Some(error) = response.error {
            return Err(GameError::illegal(error));
        }
        session.verify_invariants().await?;
    }

    let state = session.snapshot().await;
    match state.winner {
        Some(winner) => info!(
            "{} won in round {}",
            state.players[winner.0].name, state.round
        ),
        None => info!("no winner after {} actions, round {}", MAX_ACTIONS, state.round),
    }
    for player in &state.players {
        info!(
            "{}: {} countries, strength {}, challenges {}{}",
            player.name,
            player.countries_ruled,
            player.strength,
            player.completed_challenges,
            if player.lost { " (eliminated)" } else { "" }
        );
    }
    Ok(())
}
