//! A game behind a request queue.
//!
//! Requests are handled one at a time by a worker task that holds the game
//! lock for the whole request, so a batch of actions from one caller (select,
//! act, confirm) never interleaves with another caller's batch.

use crate::error::{GameError, Result};
use crate::event::GameEvent;
use crate::game::{Action, ActionOutcome, Game, GameState};
use crate::game_config::GameConfig;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, Mutex};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct GameResponse {
    pub game_state: GameState,
    /// One outcome per action that went through.
    pub outcomes: Vec<ActionOutcome>,
    /// Everything the game emitted while handling the request.
    pub events: Vec<GameEvent>,
    pub error: Option<String>,
}

impl GameResponse {
    fn success(game: &mut Game, outcomes: Vec<ActionOutcome>) -> Self {
        GameResponse {
            events: game.drain_events(),
            game_state: game.get_game_state(),
            outcomes,
            error: None,
        }
    }

    fn error(game: &mut Game, outcomes: Vec<ActionOutcome>, error: String) -> Self {
        GameResponse {
            events: game.drain_events(),
            game_state: game.get_game_state(),
            outcomes,
            error: Some(error),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

enum Request {
    Perform(Vec<Action>),
    NewGame(Box<GameConfig>, u64),
}

struct RequestWithResponse {
    request: Request,
    response_sender: oneshot::Sender<GameResponse>,
}

#[derive(Debug, Clone)]
pub struct GameSession {
    sender: mpsc::Sender<RequestWithResponse>,
    game: Arc<Mutex<Game>>,
}

impl GameSession {
    /// Starts the worker on the current tokio runtime.
    pub fn spawn(game: Game) -> Self {
        let (sender, receiver) = mpsc::channel::<RequestWithResponse>(100);
        let game = Arc::new(Mutex::new(game));
        tokio::spawn(worker_task(receiver, game.clone()));
        Self { sender, game }
    }

    pub async fn perform(&self, action: Action) -> Result<GameResponse> {
        self.send_request_and_wait(Request::Perform(vec![action])).await
    }

    /// Runs `actions` in order under one lock, stopping at the first error.
    pub async fn perform_all(&self, actions: Vec<Action>) -> Result<GameResponse> {
        self.send_request_and_wait(Request::Perform(actions)).await
    }

    /// Replaces the running game.
    pub async fn new_game(&self, config: GameConfig, seed: u64) -> Result<GameResponse> {
        self.send_request_and_wait(Request::NewGame(Box::new(config), seed))
            .await
    }

    pub async fn snapshot(&self) -> GameState {
        self.game.lock().await.get_game_state()
    }

    pub async fn verify_invariants(&self) -> Result<()> {
        self.game.lock().await.verify_invariants()
    }

    async fn send_request_and_wait(&self, request: Request) -> Result<GameResponse> {
        let (response_sender, response_receiver) = oneshot::channel();
        self.sender
            .send(RequestWithResponse {
                request,
                response_sender,
            })
            .await
            .map_err(|_| GameError::illegal("game session has shut down"))?;

        response_receiver
            .await
            .map_err(|_| GameError::illegal("game session dropped the request"))
    }
}

async fn worker_task(mut receiver: mpsc::Receiver<RequestWithResponse>, game: Arc<Mutex<Game>>) {
    while let Some(RequestWithResponse {
        request,
        response_sender,
    }) = receiver.recv().await
    {
        let mut game = game.lock().await;
        let response = match request {
            Request::Perform(actions) => {
                let mut outcomes = Vec::with_capacity(actions.len());
                let mut error = None;
                for action in actions {
                    match game.perform(action) {
                        Ok(outcome) => outcomes.push(outcome),
                        Err(e) => {
                            error = Some(e.to_string());
                            break;
                        }
                    }
                }
                match error {
                    Some(e) => GameResponse::error(&mut game, outcomes, e),
                    None => GameResponse::success(&mut game, outcomes),
                }
            }
            Request::NewGame(config, seed) => match (*config).into_game(seed) {
                Ok(new_game) => {
                    *game = new_game;
                    GameResponse::success(&mut game, Vec::new())
                }
                Err(e) => GameResponse::error(&mut game, Vec::new(), e.to_string()),
            },
        };
        if response_sender.send(response).is_err() {
            debug!("requester went away before the response was ready");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::turn_phase::TurnPhase;

    fn session(seed: u64) -> GameSession {
        let game = GameConfig::default_map().unwrap().into_game(seed).unwrap();
        GameSession::spawn(game)
    }

    fn first_reinforcement(state: &GameState) -> Action {
        state
            .possible_actions
            .iter()
            .find(|a| matches!(a, Action::Reinforce { .. }))
            .cloned()
            .unwrap()
    }

    #[tokio::test]
    async fn batch_places_and_confirms_in_one_request() {
        let session = session(1);
        let state = session.snapshot().await;
        assert_eq!(state.turn_phase, TurnPhase::Setup);
        let first = state.current_turn;

        let response = session
            .perform_all(vec![first_reinforcement(&state), Action::EndPhase])
            .await
            .unwrap();
        assert!(response.is_ok());
        assert_eq!(response.outcomes.len(), 2);
        assert_ne!(response.game_state.current_turn, first);
        assert!(response
            .events
            .iter()
            .any(|e| matches!(e, GameEvent::TurnStarted { .. })));
        session.verify_invariants().await.unwrap();
    }

    #[tokio::test]
    async fn batch_stops_at_the_first_error() {
        let session = session(2);
        let state = session.snapshot().await;

        let response = session
            .perform_all(vec![Action::EndPhase, first_reinforcement(&state)])
            .await
            .unwrap();
        assert!(response.error.is_some());
        assert!(response.outcomes.is_empty());
        // The reinforcement after the failed confirm never ran.
        assert_eq!(response.game_state, session.snapshot().await);
        assert_eq!(
            response.game_state.players[state.current_turn.0].distributable,
            state.players[state.current_turn.0].distributable
        );
    }

    #[tokio::test]
    async fn concurrent_callers_are_serialised() {
        let session = session(3);
        let state = session.snapshot().await;
        let reinforce = first_reinforcement(&state);

        let (a, b) = tokio::join!(
            session.perform_all(vec![reinforce.clone(), Action::EndPhase]),
            session.perform_all(vec![reinforce, Action::EndPhase]),
        );
        let (a, b) = (a.unwrap(), b.unwrap());
        // Whoever came second acted for the next player and was turned away.
        assert!(a.is_ok() != b.is_ok());
        session.verify_invariants().await.unwrap();
    }

    #[tokio::test]
    async fn new_game_replaces_the_running_one() {
        let session = session(4);
        let state = session.snapshot().await;
        session
            .perform_all(vec![first_reinforcement(&state), Action::EndPhase])
            .await
            .unwrap();

        let response = session
            .new_game(GameConfig::default_map().unwrap(), 4)
            .await
            .unwrap();
        assert!(response.is_ok());
        assert_eq!(response.game_state.current_turn, state.current_turn);
        assert_eq!(response.game_state.players, state.players);
    }
}
