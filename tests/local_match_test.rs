//! Tests for the local match controller.

use tresenraya_core::{
    Difficulty, GameError, LocalMatch, MatchEvent, MatchMode, MatchStatus, Outcome, Position,
    Symbol,
};

fn play(game: &mut LocalMatch, cells: &[usize]) -> Vec<MatchEvent> {
    cells
        .iter()
        .flat_map(|&cell| game.select_cell(cell).expect("Move should be accepted"))
        .collect()
}

#[test]
fn test_two_local_x_opens() {
    let game = LocalMatch::new(MatchMode::TwoLocal);
    assert_eq!(game.turn(), Symbol::X);
    assert_eq!(game.status(), MatchStatus::Active);
}

#[test]
fn test_two_local_top_row_wins_for_x() {
    let mut game = LocalMatch::new(MatchMode::TwoLocal);
    let events = play(&mut game, &[0, 3, 1, 4, 2]);

    assert_eq!(game.status(), MatchStatus::Won(Symbol::X));
    assert_eq!(events.last(), Some(&MatchEvent::Finished(Outcome::Winner(Symbol::X))));
    assert_eq!(game.history(), &[0, 3, 1, 4, 2]);
}

#[test]
fn test_turn_flips_after_each_move() {
    let mut game = LocalMatch::new(MatchMode::TwoLocal);
    let events = game.select_cell(Position::Center.to_index()).unwrap();

    assert_eq!(game.turn(), Symbol::O);
    assert!(events.contains(&MatchEvent::Placed {
        index: 4,
        symbol: Symbol::X
    }));
    assert!(events.contains(&MatchEvent::TurnChanged(Symbol::O)));
}

#[test]
fn test_occupied_cell_is_rejected_and_turn_kept() {
    let mut game = LocalMatch::new(MatchMode::TwoLocal);
    game.select_cell(0).unwrap();

    let err = game.select_cell(0).unwrap_err();
    assert!(matches!(err, GameError::IllegalMove { index: 0, .. }));
    assert_eq!(game.turn(), Symbol::O);
    assert_eq!(game.board().occupied_count(), 1);
}

#[test]
fn test_moves_after_finish_fail() {
    let mut game = LocalMatch::new(MatchMode::TwoLocal);
    play(&mut game, &[0, 3, 1, 4, 2]);
    assert_eq!(game.select_cell(8), Err(GameError::MatchOver));
}

#[test]
fn test_draw_is_reported() {
    let mut game = LocalMatch::new(MatchMode::TwoLocal);
    let events = play(&mut game, &[0, 1, 2, 4, 3, 5, 7, 6, 8]);
    assert_eq!(game.status(), MatchStatus::Drawn);
    assert_eq!(events.last(), Some(&MatchEvent::Finished(Outcome::Draw)));
}

#[test]
fn test_solo_opponent_replies_within_the_same_call() {
    let mut game = LocalMatch::new(MatchMode::SoloVsSearch {
        human: Symbol::X,
        difficulty: Difficulty::Hard,
    });
    let events = game.select_cell(4).unwrap();

    let placements: Vec<_> = events
        .iter()
        .filter_map(|e| match e {
            MatchEvent::Placed { index, symbol } => Some((*index, *symbol)),
            _ => None,
        })
        .collect();
    assert_eq!(placements, vec![(4, Symbol::X), (0, Symbol::O)]);
    assert_eq!(game.turn(), Symbol::X);
}

#[test]
fn test_solo_human_as_o_moves_first() {
    let mut game = LocalMatch::new(MatchMode::SoloVsSearch {
        human: Symbol::O,
        difficulty: Difficulty::Hard,
    });
    assert_eq!(game.turn(), Symbol::O);

    game.select_cell(0).unwrap();
    assert_eq!(game.board().occupied_count(), 2);
    assert_eq!(game.turn(), Symbol::O);
}

#[test]
fn test_solo_hard_never_loses_to_scripted_human() {
    let mut game = LocalMatch::new(MatchMode::SoloVsSearch {
        human: Symbol::X,
        difficulty: Difficulty::Hard,
    });
    while game.status() == MatchStatus::Active {
        let cell = game.board().empty_cells()[0];
        game.select_cell(cell).unwrap();
    }
    assert_ne!(game.status(), MatchStatus::Won(Symbol::X));
}

#[test]
fn test_reset_restores_opening_state() {
    let mut game = LocalMatch::new(MatchMode::TwoLocal);
    play(&mut game, &[0, 3, 1, 4, 2]);

    let events = game.reset();
    assert_eq!(events[0], MatchEvent::Reset);
    assert_eq!(game.status(), MatchStatus::Active);
    assert_eq!(game.turn(), Symbol::X);
    assert_eq!(game.board().occupied_count(), 0);
    assert!(game.history().is_empty());
}
