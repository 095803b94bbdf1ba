//! Tests for the board model and the win/draw rules.

use std::collections::HashSet;

use tresenraya_core::rules::LINES;
use tresenraya_core::{Board, Cell, GameError, Outcome, Symbol};

fn board_from(marks: &str) -> Board {
    let mut cells = [Cell::Empty; 9];
    for (i, c) in marks.chars().filter(|c| !c.is_whitespace()).enumerate() {
        cells[i] = match c {
            'X' => Cell::Occupied(Symbol::X),
            'O' => Cell::Occupied(Symbol::O),
            _ => Cell::Empty,
        };
    }
    Board::from_cells(cells)
}

#[test]
fn test_apply_places_symbol_without_touching_original() {
    let empty = Board::new();
    let next = empty.apply(4, Symbol::X).expect("Center is free");

    assert!(empty.is_empty(4));
    assert_eq!(next.get(4), Some(Cell::Occupied(Symbol::X)));
    assert_eq!(next.occupied_count(), 1);
}

#[test]
fn test_apply_rejects_occupied_cell() {
    let board = Board::new().apply(0, Symbol::X).unwrap();
    let err = board.apply(0, Symbol::O).unwrap_err();
    assert!(matches!(err, GameError::IllegalMove { index: 0, .. }));
}

#[test]
fn test_apply_rejects_off_board_index() {
    let err = Board::new().apply(9, Symbol::X).unwrap_err();
    assert!(matches!(err, GameError::IllegalMove { index: 9, .. }));
}

#[test]
fn test_every_line_wins() {
    for line in LINES {
        let mut board = Board::new();
        for index in line {
            board = board.apply(index, Symbol::O).unwrap();
        }
        assert_eq!(board.winner(), Some(Symbol::O), "line {:?}", line);
        assert_eq!(board.terminal(), Some(Outcome::Winner(Symbol::O)));
    }
}

#[test]
fn test_full_board_without_line_is_draw() {
    let board = board_from("XOX XOO OXX");
    assert!(board.is_full());
    assert_eq!(board.winner(), None);
    assert_eq!(board.terminal(), Some(Outcome::Draw));
}

#[test]
fn test_full_board_with_line_is_a_win_not_a_draw() {
    let board = board_from("XXX OOX XOO");
    assert!(board.is_full());
    assert_eq!(board.terminal(), Some(Outcome::Winner(Symbol::X)));
}

#[test]
fn test_ongoing_board_has_no_outcome() {
    let board = board_from("X.. .O. ...");
    assert_eq!(board.terminal(), None);
    assert_eq!(board.terminal(), None);
    assert_eq!(board.empty_cells(), vec![1, 2, 3, 5, 6, 7, 8]);
}

#[test]
fn test_board_serializes_as_nine_nullable_marks() {
    let board = board_from("X.. .O. ...");
    let value = serde_json::to_value(board).unwrap();
    assert_eq!(
        value,
        serde_json::json!(["X", null, null, null, "O", null, null, null, null])
    );
    let back: Board = serde_json::from_value(value).unwrap();
    assert_eq!(back, board);
}

fn completed_lines(board: &Board, symbol: Symbol) -> usize {
    LINES
        .iter()
        .filter(|line| {
            line.iter()
                .all(|&i| board.get(i) == Some(Cell::Occupied(symbol)))
        })
        .count()
}

#[test]
fn test_every_reachable_position_scores_consistently() {
    let mut seen = HashSet::new();
    let mut stack = vec![(Board::new(), Symbol::X)];
    let mut full_boards = 0;

    while let Some((board, to_move)) = stack.pop() {
        if !seen.insert(board) {
            continue;
        }

        let outcome = board.terminal();
        assert_eq!(board.terminal(), outcome, "terminal is stable on {:?}", board);

        if board.is_full() {
            full_boards += 1;
            let x_wins = completed_lines(&board, Symbol::X) > 0;
            let o_wins = completed_lines(&board, Symbol::O) > 0;
            let draw = !x_wins && !o_wins;
            assert_eq!(
                [x_wins, o_wins, draw].iter().filter(|&&b| b).count(),
                1,
                "{:?}",
                board
            );
            let expected = if x_wins {
                Outcome::Winner(Symbol::X)
            } else if o_wins {
                Outcome::Winner(Symbol::O)
            } else {
                Outcome::Draw
            };
            assert_eq!(outcome, Some(expected));
        }
        if outcome.is_some() {
            continue;
        }

        for index in board.empty_cells() {
            let next = board.apply(index, to_move).expect("Cell is empty");
            if let Some(winner) = next.winner() {
                assert_eq!(winner, to_move, "only the mover can complete a line");
                assert!(
                    LINES.iter().any(|line| line.contains(&index)
                        && line
                            .iter()
                            .all(|&i| next.get(i) == Some(Cell::Occupied(to_move)))),
                    "win at {} must come through a line at that cell: {:?}",
                    index,
                    next
                );
            } else {
                assert_eq!(completed_lines(&next, to_move), 0, "{:?}", next);
            }
            stack.push((next, to_move.opponent()));
        }
    }

    assert_eq!(seen.len(), 5478);
    assert!(full_boards > 0);
}
