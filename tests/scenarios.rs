use conquest_engine::army::Army;
use conquest_engine::board::Board;
use conquest_engine::combat::{CombatConfig, CombatOutcome};
use conquest_engine::error::GameError;
use conquest_engine::event::GameEvent;
use conquest_engine::game::{Action, ActionOutcome, Game, GameSetup};
use conquest_engine::game_config::{GameConfig, Rules};
use conquest_engine::hazard::HazardKind;
use conquest_engine::link::LinkState;
use conquest_engine::player::{Player, PlayerId, PlayerKind};
use conquest_engine::random::ScriptedRandom;
use conquest_engine::turn_phase::TurnPhase;
use conquest_engine::unit::UnitCatalog;

fn infantry(count: usize, catalog: &UnitCatalog) -> Army {
    let mut army = Army::new();
    for _ in 0..count {
        army.add(catalog.weakest().clone());
    }
    army
}

#[test]
fn selecting_a_foreign_country_first_leaves_both_slots_empty() {
    let mut game = GameConfig::default_map().unwrap().into_game(9).unwrap();
    let current = game.current_player_id();
    let foreign = game
        .board()
        .countries()
        .iter()
        .find(|c| !c.is_ruled_by(current))
        .map(|c| c.name.clone())
        .unwrap();

    assert!(!game.select_country(&foreign).unwrap());
    assert_eq!(game.selection().primary, None);
    assert_eq!(game.selection().secondary, None);
    assert!(matches!(
        game.select_country("Nowhere"),
        Err(GameError::UnknownCountry(_))
    ));
}

#[test]
fn continent_with_an_unruled_country_has_no_ruler() {
    let mut board = Board::new();
    let continent = board.add_continent("Trio", 2, HazardKind::Calm);
    for (name, ruler) in [("One", Some(PlayerId(0))), ("Two", Some(PlayerId(0))), ("Three", None)] {
        let id = board.add_country(name).unwrap();
        board.add_to_continent(continent, id).unwrap();
        board.set_ruler(id, ruler).unwrap();
    }
    assert_eq!(board.continent_ruler(continent), None);
    assert!(!board.is_ruled(continent));

    let three = board.country_id("Three").unwrap();
    board.set_ruler(three, Some(PlayerId(0))).unwrap();
    assert_eq!(board.continent_ruler(continent), Some(PlayerId(0)));
}

#[test]
fn blockade_of_two_rounds_lifts_after_two_round_ends() {
    let catalog = UnitCatalog::standard();
    let mut board = Board::new();
    let a = board.add_country("Port").unwrap();
    let b = board.add_country("Isle").unwrap();
    let link = board.add_neighbour(a, b, LinkState::Open).unwrap();
    board.link_mut(link).unwrap().block(2).unwrap();
    assert!(!board.is_traversable(a, b));

    let mut random = ScriptedRandom::new();
    let first = board.end_round(&catalog, &mut random).unwrap();
    assert!(first.reopened.is_empty());
    assert!(board.link(link).unwrap().is_blocked());

    let second = board.end_round(&catalog, &mut random).unwrap();
    assert_eq!(second.reopened, vec![link]);
    assert!(!board.link(link).unwrap().is_blocked());
    assert_eq!(board.link(link).unwrap().duration(), 0);
}

/// Keep (Red, 4 infantry) borders Gate (Blue, 2 infantry) and Camp (Red, 1).
fn siege(dice: &[u8]) -> Game {
    let catalog = UnitCatalog::standard();
    let mut board = Board::new();
    let keep = board.add_country("Keep").unwrap();
    let gate = board.add_country("Gate").unwrap();
    let camp = board.add_country("Camp").unwrap();
    board.add_neighbour(keep, gate, LinkState::Open).unwrap();
    board.add_neighbour(keep, camp, LinkState::Open).unwrap();
    for (id, size, ruler) in [(keep, 4, 0), (gate, 2, 1), (camp, 1, 0)] {
        let country = board.country_mut(id).unwrap();
        country.army = infantry(size, &catalog);
        country.ruler = Some(PlayerId(ruler));
    }

    let setup = GameSetup {
        board,
        players: vec![
            Player::new(PlayerId(0), "Red", PlayerKind::Human),
            Player::new(PlayerId(1), "Blue", PlayerKind::Human),
        ],
        catalog,
        challenges: Vec::new(),
        rules: Rules {
            initial_strength: 0,
            ..Rules::default()
        },
        combat: CombatConfig::default(),
    };
    Game::new(
        setup,
        Box::new(ScriptedRandom::new().with_dice(dice)),
        Box::new(ScriptedRandom::new()),
    )
    .unwrap()
}

#[test]
fn three_attackers_sweep_two_defenders_in_two_pairs() {
    let mut game = siege(&[4, 6, 5, 2, 3]);
    for action in [
        Action::EndPhase,
        Action::EndPhase,
        Action::Reinforce {
            country: "Camp".to_string(),
            strength: 3,
        },
        Action::EndPhase,
    ] {
        game.perform(action).unwrap();
    }
    assert_eq!(game.turn_phase(), TurnPhase::Attack);

    let outcome = game
        .perform(Action::Attack {
            from: "Keep".to_string(),
            to: "Gate".to_string(),
        })
        .unwrap();
    let ActionOutcome::Combat(report) = outcome else {
        panic!("expected a combat report, got {:?}", outcome);
    };
    assert_eq!(report.attacker_rolls, vec![6, 5, 4]);
    assert_eq!(report.defender_rolls, vec![3, 2]);
    assert_eq!(report.pairs_compared, 2);
    assert_eq!(report.outcome, CombatOutcome::Conquered);

    let gate = game.board().get_country("Gate").unwrap();
    assert_eq!(gate.ruler, Some(PlayerId(0)));
    assert_eq!(gate.army.size(), 4);
    assert_eq!(game.board().get_country("Keep").unwrap().army.size(), 1);
    game.verify_invariants().unwrap();

    let events = game.drain_events();
    assert!(events.contains(&GameEvent::RulerChanged {
        country: "Gate".to_string(),
        old: Some(PlayerId(1)),
        new: Some(PlayerId(0)),
    }));
    assert!(events.contains(&GameEvent::GameWon { player: PlayerId(0) }));
    assert_eq!(game.winner(), Some(PlayerId(0)));
    assert!(game.get_possible_actions().is_empty());
}

#[test]
fn lost_rounds_leave_the_attacker_at_home() {
    // Blue wins both pairs; Red's squad loses two infantry.
    let mut game = siege(&[1, 1, 1, 6, 6]);
    for action in [
        Action::EndPhase,
        Action::EndPhase,
        Action::Reinforce {
            country: "Camp".to_string(),
            strength: 3,
        },
        Action::EndPhase,
    ] {
        game.perform(action).unwrap();
    }

    let outcome = game
        .perform(Action::Attack {
            from: "Keep".to_string(),
            to: "Gate".to_string(),
        })
        .unwrap();
    let ActionOutcome::Combat(report) = outcome else {
        panic!("expected a combat report, got {:?}", outcome);
    };
    assert_eq!(report.outcome, CombatOutcome::Continuing);
    assert_eq!(report.attacker_lost, 2);
    assert_eq!(game.board().get_country("Keep").unwrap().army.size(), 2);
    assert_eq!(game.board().get_country("Gate").unwrap().army.size(), 2);
    assert_eq!(game.players()[0].army.strength(), 6);
    game.verify_invariants().unwrap();
}

#[test]
fn phase_actions_outside_their_phase_are_illegal() {
    let mut game = siege(&[]);
    assert!(matches!(game.attack_round(), Err(GameError::IllegalState(_))));
    assert!(matches!(game.fortify(1), Err(GameError::IllegalState(_))));
    assert!(matches!(game.confirm_combat(), Err(GameError::IllegalState(_))));
    assert!(matches!(game.confirm_movement(), Err(GameError::IllegalState(_))));
    assert!(matches!(game.confirm_reinforcement(), Err(GameError::IllegalState(_))));
    assert!(matches!(game.end_round(), Err(GameError::IllegalState(_))));
    game.verify_invariants().unwrap();
}
