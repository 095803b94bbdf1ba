//! Tests for the minimax opponent and difficulty policies.

use rand::SeedableRng;
use rand::rngs::StdRng;
use tresenraya_core::{Board, Difficulty, GameError, Outcome, Symbol, best_move, random_move};

fn play_out(mut board: Board, mut turn: Symbol) -> (Board, Outcome) {
    loop {
        if let Some(outcome) = board.terminal() {
            return (board, outcome);
        }
        let index = best_move(&board, turn).expect("Board is not full");
        board = board.apply(index, turn).expect("Search picks legal cells");
        turn = turn.opponent();
    }
}

#[test]
fn test_empty_board_ties_break_to_lowest_index() {
    assert_eq!(best_move(&Board::new(), Symbol::X).unwrap(), 0);
}

#[test]
fn test_takes_immediate_win() {
    let board = Board::new()
        .apply(0, Symbol::X)
        .and_then(|b| b.apply(3, Symbol::O))
        .and_then(|b| b.apply(1, Symbol::X))
        .and_then(|b| b.apply(4, Symbol::O))
        .unwrap();
    assert_eq!(best_move(&board, Symbol::X).unwrap(), 2);
}

#[test]
fn test_converts_a_won_position() {
    let board = Board::new()
        .apply(0, Symbol::X)
        .and_then(|b| b.apply(3, Symbol::O))
        .and_then(|b| b.apply(1, Symbol::X))
        .and_then(|b| b.apply(4, Symbol::O))
        .and_then(|b| b.apply(8, Symbol::X))
        .unwrap();
    let index = best_move(&board, Symbol::O).unwrap();
    let (_, outcome) = play_out(board.apply(index, Symbol::O).unwrap(), Symbol::X);
    assert_eq!(outcome, Outcome::Winner(Symbol::O));
}

#[test]
fn test_blocks_opponent_line() {
    let board = Board::new()
        .apply(0, Symbol::X)
        .and_then(|b| b.apply(4, Symbol::O))
        .and_then(|b| b.apply(1, Symbol::X))
        .unwrap();
    assert_eq!(best_move(&board, Symbol::O).unwrap(), 2);
}

#[test]
fn test_hard_against_hard_always_draws() {
    let (board, outcome) = play_out(Board::new(), Symbol::X);
    assert_eq!(outcome, Outcome::Draw);
    assert!(board.is_full());
}

#[test]
fn test_center_opening_plays_out_to_full_draw() {
    let opening = Board::new().apply(4, Symbol::X).unwrap();
    let (board, outcome) = play_out(opening, Symbol::O);
    assert_eq!(outcome, Outcome::Draw);
    assert_eq!(board.occupied_count(), 9);
}

#[test]
fn test_search_never_loses_from_any_first_move() {
    for first in 0..9 {
        let opening = Board::new().apply(first, Symbol::X).unwrap();
        let (_, outcome) = play_out(opening, Symbol::O);
        assert_ne!(outcome, Outcome::Winner(Symbol::X), "opening {}", first);
    }
}

#[test]
fn test_full_board_has_no_move() {
    let mut board = Board::new();
    let mut turn = Symbol::X;
    for index in [0, 1, 2, 4, 3, 5, 7, 6, 8] {
        board = board.apply(index, turn).unwrap();
        turn = turn.opponent();
    }
    assert!(board.is_full());
    assert_eq!(best_move(&board, turn), Err(GameError::NoLegalMove));

    let mut rng = StdRng::seed_from_u64(1);
    assert_eq!(random_move(&board, &mut rng), Err(GameError::NoLegalMove));
}

#[test]
fn test_random_move_only_picks_empty_cells() {
    let board = Board::new()
        .apply(0, Symbol::X)
        .and_then(|b| b.apply(8, Symbol::O))
        .unwrap();
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..100 {
        let index = random_move(&board, &mut rng).unwrap();
        assert!(board.is_empty(index));
    }
}

#[test]
fn test_medium_mixes_best_and_random_moves() {
    let board = Board::new()
        .apply(0, Symbol::X)
        .and_then(|b| b.apply(3, Symbol::O))
        .and_then(|b| b.apply(1, Symbol::X))
        .and_then(|b| b.apply(4, Symbol::O))
        .unwrap();
    let mut rng = StdRng::seed_from_u64(42);

    let trials = 300;
    let best = (0..trials)
        .filter(|_| Difficulty::Medium.choose_move(&board, Symbol::X, &mut rng).unwrap() == 2)
        .count();

    assert!(best > trials / 2, "best move chosen only {} times", best);
    assert!(best < trials, "medium never strayed from the best move");
}

#[test]
fn test_hard_is_deterministic_and_easy_stays_legal() {
    let board = Board::new().apply(4, Symbol::X).unwrap();
    let mut rng = StdRng::seed_from_u64(9);
    for _ in 0..20 {
        assert_eq!(
            Difficulty::Hard.choose_move(&board, Symbol::O, &mut rng).unwrap(),
            0
        );
        let easy = Difficulty::Easy.choose_move(&board, Symbol::O, &mut rng).unwrap();
        assert!(board.is_empty(easy));
    }
}
