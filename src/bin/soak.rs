use conquest_engine::{
    driver::{play_to_end, RandomDriver},
    game_config::GameConfig,
};
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::time::Instant;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

struct Args {
    first_seed: u64,
    games: u64,
    max_actions: usize,
}

// Format: soak <first_seed> <games> <max_actions>
lazy_static::lazy_static! {
    static ref ARGS: Args = {
        let args: Vec<String> = std::env::args().collect();
        let arg = |index: usize| args.get(index).and_then(|a| a.parse().ok());

        Args {
            first_seed: arg(1).unwrap_or(0),
            games: arg(2).unwrap_or(200),
            max_actions: arg(3).map(|n: u64| n as usize).unwrap_or(50_000),
        }
    };
}

enum Finish {
    Won(String, usize),
    Unfinished,
    Broken(String),
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("warn,soak=info")),
        )
        .init();

    let config = match GameConfig::default_map() {
        Ok(config) => config,
        Err(e) => {
            error!("default map is unusable: {}", e);
            std::process::exit(1);
        }
    };

    let start = Instant::now();
    let results: Vec<(u64, Finish)> = (ARGS.first_seed..ARGS.first_seed + ARGS.games)
        .collect::<Vec<u64>>()
        .par_iter()
        .map(|&seed| {
            let finish = match config.clone().into_game(seed) {
                Ok(mut game) => {
                    let mut driver = RandomDriver::new(seed);
                    match play_to_end(&mut game, &mut driver, ARGS.max_actions) {
                        Ok(Some(winner)) => {
                            Finish::Won(game.players()[winner.0].name.clone(), game.round())
                        }
                        Ok(None) => Finish::Unfinished,
                        Err(e) => Finish::Broken(e.to_string()),
                    }
                }
                Err(e) => Finish::Broken(e.to_string()),
            };
            (seed, finish)
        })
        .collect();

    let mut wins: BTreeMap<String, usize> = BTreeMap::new();
    let mut rounds = Vec::new();
    let mut unfinished = 0;
    let mut broken = 0;
    for (seed, finish) in &results {
        match finish {
            Finish::Won(name, round) => {
                *wins.entry(name.clone()).or_default() += 1;
                rounds.push(*round);
            }
            Finish::Unfinished => unfinished += 1,
            Finish::Broken(reason) => {
                broken += 1;
                error!("seed {} broke: {}", seed, reason);
            }
        }
    }

    for (name, count) in &wins {
        info!("{} won {} games", name, count);
    }
    if !rounds.is_empty() {
        info!(
            "average game length {:.1} rounds",
            rounds.iter().sum::<usize>() as f64 / rounds.len() as f64
        );
    }
    info!(
        "{} games, {} unfinished, {} broken in {:?}",
        results.len(),
        unfinished,
        broken,
        start.elapsed()
    );

    if broken > 0 {
        std::process::exit(1);
    }
}
